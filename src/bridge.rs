//! Messages posted by embedded web pages, turned into navigation intents.

use crate::net::parse_string_field;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationIntent {
    OpenWebView { url: String },
    OpenBookCover { book_id: String },
    OpenForum { forum_id: String },
    OpenThread { forum_id: String, thread_id: String },
    OpenTestPage { content: String },
    CloseWebView,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error("bridge message is not valid JSON: {0}")]
    Malformed(String),
    #[error("unknown bridge method `{0}`")]
    UnknownMethod(String),
    #[error("bridge method `{method}` is missing `{param}`")]
    MissingParam {
        method: &'static str,
        param: &'static str,
    },
}

/// Receives intents; the host decides how to present each destination.
pub trait NavigationRouter {
    fn navigate(&mut self, intent: NavigationIntent);
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    method: String,
    #[serde(default)]
    params: Value,
}

pub fn parse_bridge_message(body: &str) -> Result<NavigationIntent, BridgeError> {
    let raw: RawMessage =
        serde_json::from_str(body).map_err(|err| BridgeError::Malformed(err.to_string()))?;
    let params = &raw.params;

    let intent = match raw.method.as_str() {
        "openWithWebView" => NavigationIntent::OpenWebView {
            url: required(params, "openWithWebView", "urlString")?,
        },
        "openWithBookCover" => NavigationIntent::OpenBookCover {
            book_id: required(params, "openWithBookCover", "bookId")?,
        },
        "openWithForum" => NavigationIntent::OpenForum {
            forum_id: required(params, "openWithForum", "forumId")?,
        },
        "openWithThread" => NavigationIntent::OpenThread {
            forum_id: required(params, "openWithThread", "forumId")?,
            thread_id: required(params, "openWithThread", "threadId")?,
        },
        "openTestVC" => NavigationIntent::OpenTestPage {
            content: parse_string_field(params, "content").unwrap_or_default(),
        },
        "closeWebView" => NavigationIntent::CloseWebView,
        other => return Err(BridgeError::UnknownMethod(other.to_string())),
    };
    debug!(method = %raw.method, "Parsed bridge message");
    Ok(intent)
}

/// Parse and route one message. Rejected messages are logged and dropped.
pub fn dispatch_bridge_message(router: &mut dyn NavigationRouter, body: &str) -> bool {
    match parse_bridge_message(body) {
        Ok(intent) => {
            router.navigate(intent);
            true
        }
        Err(err) => {
            warn!("Ignoring bridge message: {err}");
            false
        }
    }
}

fn required(
    params: &Value,
    method: &'static str,
    param: &'static str,
) -> Result<String, BridgeError> {
    parse_string_field(params, param)
        .filter(|value| !value.trim().is_empty())
        .ok_or(BridgeError::MissingParam { method, param })
}
