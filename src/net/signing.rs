//! Public upward parameters and request signatures.
//!
//! Every call carries the client's public parameters merged with the
//! endpoint parameters. When a secret is configured, `sig` is the lowercase
//! hex SHA-256 of the sorted `key=value` pairs joined by `&`, followed by the
//! secret.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

pub const SIGNATURE_KEY: &str = "sig";

#[derive(Debug, Clone, Default)]
pub struct RequestSigner {
    public_params: BTreeMap<String, String>,
    secret: Option<String>,
}

impl RequestSigner {
    pub fn new(public_params: BTreeMap<String, String>, secret: Option<String>) -> Self {
        let secret = secret.filter(|s| !s.trim().is_empty());
        Self {
            public_params,
            secret,
        }
    }

    /// Merge public and request parameters (request wins) and append `sig`.
    pub fn sign(&self, params: &[(&str, String)]) -> Vec<(String, String)> {
        let mut merged = self.public_params.clone();
        for (key, value) in params {
            merged.insert((*key).to_string(), value.clone());
        }
        merged.remove(SIGNATURE_KEY);

        let sig = self
            .secret
            .as_deref()
            .map(|secret| signature(&merged, secret));
        let mut out: Vec<(String, String)> = merged.into_iter().collect();
        if let Some(sig) = sig {
            out.push((SIGNATURE_KEY.to_string(), sig));
        }
        out
    }
}

pub fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn signature(params: &BTreeMap<String, String>, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_query(params).as_bytes());
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}
