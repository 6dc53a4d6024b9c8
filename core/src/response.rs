//! The value an adapter hands back for one HTTP exchange.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::{status, Headers};

/// Marker stored in [`Response::error_mesg`] when the body came from an
/// error path.
pub const SERVER_ERROR: &str = "SERVER_ERROR";

/// An HTTP response described as plain data.
///
/// `body` is whatever the payload parsed to: a JSON value when the bytes were
/// valid JSON, otherwise a `Value::String` holding the raw text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub response_code: u16,
    #[serde(default)]
    pub error_mesg: String,
    #[serde(default)]
    pub body: Value,
    #[serde(default)]
    pub headers: Headers,
}

impl Response {
    pub fn new(response_code: u16, body: Value) -> Self {
        Self {
            response_code,
            error_mesg: String::new(),
            body,
            headers: Headers::new(),
        }
    }

    /// A response whose body was received on an error path.
    pub fn from_error_path(response_code: u16, body: Value) -> Self {
        Self {
            error_mesg: SERVER_ERROR.to_string(),
            ..Self::new(response_code, body)
        }
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn is_success(&self) -> bool {
        self.response_code == status::SUCCESS
    }

    /// Parse a raw payload: JSON when it parses, the text itself otherwise.
    pub fn parse_body(raw: &str) -> Value {
        serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
    }
}
