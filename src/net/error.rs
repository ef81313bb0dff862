use thiserror::Error;

/// Failures surfaced by the book API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The request never produced a usable HTTP response.
    #[error("network error: {0}")]
    Network(String),
    /// The server answered with a non-success code or a malformed envelope.
    #[error("server rejected request (code {code}): {message}")]
    Protocol { code: String, message: String },
    /// The envelope was fine but `result` did not have the expected shape.
    #[error("unexpected response shape: {0}")]
    Parse(String),
    #[error("invalid request: {0}")]
    InvalidRequest(&'static str),
}

impl FetchError {
    pub(crate) fn malformed(detail: impl std::fmt::Display) -> Self {
        FetchError::Protocol {
            code: "0".to_string(),
            message: format!("malformed envelope: {detail}"),
        }
    }
}
