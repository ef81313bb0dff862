use super::FetchError;
use crate::config::AppConfig;
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::debug;

/// Executes a GET against the book API and returns the raw body.
pub trait Transport: Send + Sync {
    fn get(&self, path: &str, params: &[(String, String)]) -> Result<String, FetchError>;
}

pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            anyhow::bail!("server.base_url must be an http(s) URL, got {base_url:?}");
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client, base_url })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl Transport for HttpTransport {
    fn get(&self, path: &str, params: &[(String, String)]) -> Result<String, FetchError> {
        let url = self.url_for(path);
        debug!(%url, params = params.len(), "GET");
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .map_err(|err| FetchError::Network(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Network(format!("{url} answered HTTP {status}")));
        }
        response
            .text()
            .map_err(|err| FetchError::Network(err.to_string()))
    }
}
