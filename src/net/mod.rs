//! Book API client: transport, envelope handling and request signing.

mod envelope;
mod error;
mod signing;
mod transport;

pub use envelope::{Envelope, ResponseCode};
pub(crate) use envelope::{parse_bool_field, parse_f64_field, parse_string_field, parse_u64_field};
pub use error::FetchError;
pub use signing::RequestSigner;
pub use transport::{HttpTransport, Transport};

use crate::config::AppConfig;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Cheap to clone; download workers each get their own handle.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    signer: RequestSigner,
    toc_path: String,
    chapter_path: String,
    client_version: String,
    content_type: String,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, config: &AppConfig) -> Self {
        Self {
            transport,
            signer: RequestSigner::new(config.public_params.clone(), config.sign_secret.clone()),
            toc_path: config.toc_path.clone(),
            chapter_path: config.chapter_path.clone(),
            client_version: config.client_version.clone(),
            content_type: config.content_type.clone(),
        }
    }

    /// Fetch the `result` of the table-of-contents endpoint.
    pub fn table_of_contents(&self, book_id: &str) -> Result<Value, FetchError> {
        self.request(&self.toc_path, &[("bookId", book_id.to_string())])
    }

    /// Fetch the `result` of the chapter-content endpoint for one batch.
    pub fn chapter_contents(&self, book_id: &str, chapter_ids: &[String]) -> Result<Value, FetchError> {
        self.request(
            &self.chapter_path,
            &[
                ("bookId", book_id.to_string()),
                ("chapterId", chapter_ids.join(",")),
                ("type", self.content_type.clone()),
                ("version", self.client_version.clone()),
            ],
        )
    }

    fn request(&self, path: &str, params: &[(&str, String)]) -> Result<Value, FetchError> {
        let signed = self.signer.sign(params);
        let body = self.transport.get(path, &signed)?;
        let envelope = Envelope::from_body(&body)?;
        debug!(
            path,
            code = envelope.code.as_str(),
            message = %envelope.message,
            "API response"
        );
        envelope.into_result()
    }
}
