//! Response envelope shared by every endpoint: `{code, message, result}`.

use super::FetchError;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    Unknown,
    Success,
    Error,
    Other(String),
}

impl ResponseCode {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "200" => ResponseCode::Success,
            "500" => ResponseCode::Error,
            "0" | "" => ResponseCode::Unknown,
            other => ResponseCode::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ResponseCode::Unknown => "0",
            ResponseCode::Success => "200",
            ResponseCode::Error => "500",
            ResponseCode::Other(code) => code,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Envelope {
    pub code: ResponseCode,
    pub message: String,
    pub result: Option<Value>,
}

impl Envelope {
    pub fn from_body(body: &str) -> Result<Self, FetchError> {
        let value: Value = serde_json::from_str(body).map_err(FetchError::malformed)?;
        let Value::Object(mut map) = value else {
            return Err(FetchError::malformed("top level is not an object"));
        };

        let code = map
            .get("code")
            .and_then(scalar_to_string)
            .map(|raw| ResponseCode::parse(&raw))
            .unwrap_or(ResponseCode::Unknown);
        let message = map
            .get("message")
            .and_then(scalar_to_string)
            .unwrap_or_default();
        let result = map.remove("result").filter(|v| !v.is_null());

        Ok(Envelope {
            code,
            message,
            result,
        })
    }

    /// Unwrap `result`, rejecting the whole envelope on a non-success code.
    pub fn into_result(self) -> Result<Value, FetchError> {
        if self.code != ResponseCode::Success {
            return Err(FetchError::Protocol {
                code: self.code.as_str().to_string(),
                message: self.message,
            });
        }
        self.result
            .ok_or_else(|| FetchError::Parse("envelope has no result".to_string()))
    }
}

/// Ids and codes arrive either as JSON strings or as bare numbers.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn parse_string_field(row: &Value, key: &str) -> Option<String> {
    row.get(key)
        .and_then(scalar_to_string)
        .filter(|s| !s.is_empty())
}

pub(crate) fn parse_u64_field(row: &Value, key: &str) -> Option<u64> {
    row.get(key).and_then(|v| {
        v.as_u64()
            .or_else(|| v.as_i64().map(|n| n.max(0) as u64))
            .or_else(|| v.as_f64().map(|n| n.max(0.0) as u64))
            .or_else(|| v.as_str().and_then(|s| s.trim().parse::<u64>().ok()))
    })
}

pub(crate) fn parse_f64_field(row: &Value, key: &str) -> Option<f64> {
    row.get(key).and_then(|v| {
        v.as_f64()
            .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
    })
}

pub(crate) fn parse_bool_field(row: &Value, key: &str) -> Option<bool> {
    row.get(key).and_then(|v| match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.trim() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    })
}
