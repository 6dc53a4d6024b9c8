//! Wire-level vocabulary shared by requests, responses and adapters.
//!
//! # Design
//! Headers and query parameters are plain ordered string maps so a request
//! can be inspected, mutated by interceptors and compared in tests without
//! pulling a transport crate into the model. Header names are matched
//! case-insensitively through [`set_header`] and [`header`]; the map itself
//! keeps whatever casing the caller used.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Header name to value.
pub type Headers = BTreeMap<String, String>;

/// Query parameter name to value.
pub type Parameters = BTreeMap<String, String>;

/// Status codes the pipeline gives special meaning to.
pub mod status {
    /// The only status the service treats as a pass.
    pub const SUCCESS: u16 = 200;
    pub const BAD_REQUEST: u16 = 400;
    /// Returned to callers rather than raised.
    pub const UNAUTHORIZED: u16 = 401;
    /// Returned to callers rather than raised.
    pub const FORBIDDEN: u16 = 403;
    pub const NOT_FOUND: u16 = 404;
    pub const INTERNAL_SERVER_ERROR: u16 = 500;
    /// Reported by native HTTP plugins when no response was received.
    pub const NO_RESPONSE: u16 = 0;
}

pub const CONTENT_TYPE: &str = "Content-Type";
pub const AUTHORIZATION: &str = "Authorization";
pub const USER_TOKEN: &str = "X-Authenticated-User-Token";
pub const CHANNEL_ID: &str = "X-Channel-Id";
pub const APP_ID: &str = "X-App-Id";
pub const DEVICE_ID: &str = "X-Device-Id";

pub const MIME_JSON: &str = "application/json";
pub const MIME_FORM: &str = "application/x-www-form-urlencoded";
pub const MIME_TEXT: &str = "text/plain; charset=utf-8";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
    Put,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Put => "PUT",
        }
    }

    /// Whether the method carries a body (as opposed to query parameters).
    pub fn has_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Patch | HttpMethod::Put)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire encoding for a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Serializer {
    #[default]
    Json,
    UrlEncoded,
    Utf8,
    Raw,
}

impl Serializer {
    /// Content type announced for bodies encoded with this serializer.
    ///
    /// `Raw` bodies go out with whatever content type the caller set.
    pub fn content_type(self) -> Option<&'static str> {
        match self {
            Serializer::Json => Some(MIME_JSON),
            Serializer::UrlEncoded => Some(MIME_FORM),
            Serializer::Utf8 => Some(MIME_TEXT),
            Serializer::Raw => None,
        }
    }
}

/// Insert `value` under `name`, replacing any existing entry whose name
/// differs only in case.
pub fn set_header(headers: &mut Headers, name: &str, value: impl Into<String>) {
    headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value.into());
}

/// Case-insensitive header lookup.
pub fn header<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Overlay `overrides` onto `base`, later names winning case-insensitively.
pub fn merge_headers(base: &Headers, overrides: &Headers) -> Headers {
    let mut merged = base.clone();
    for (name, value) in overrides {
        set_header(&mut merged, name, value.clone());
    }
    merged
}
