//! Body and query-string encoding.
//!
//! Structured bodies are flattened for form encoding the way query-string
//! libraries do it: nested keys use bracket notation (`a[b]=1`) and arrays
//! are indexed (`list[0]=x`). Scalars render as their text; `null` renders as
//! an empty value.

use serde_json::Value;
use url::form_urlencoded;

use crate::http::{Parameters, Serializer};

/// Form-encode a structured value. Strings are assumed to be encoded already
/// and are returned unchanged.
pub fn form_encode(value: &Value) -> String {
    if let Value::String(encoded) = value {
        return encoded.clone();
    }
    let mut pairs = Vec::new();
    flatten(None, value, &mut pairs);
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in &pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

/// Encode query parameters as `k=v&...`.
pub fn query_string(parameters: &Parameters) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(parameters.iter())
        .finish()
}

/// Wire form of a request body, or `None` when there is nothing to send.
///
/// A `Value::String` is sent verbatim whatever the serializer; structured
/// values are encoded as form data for `UrlEncoded` and as JSON text otherwise.
pub fn encode_body(body: &Value, serializer: Serializer) -> Option<String> {
    match body {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        structured => Some(match serializer {
            Serializer::UrlEncoded => form_encode(structured),
            Serializer::Json | Serializer::Utf8 | Serializer::Raw => structured.to_string(),
        }),
    }
}

fn flatten(prefix: Option<String>, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                let key = match &prefix {
                    Some(prefix) => format!("{prefix}[{key}]"),
                    None => key.clone(),
                };
                flatten(Some(key), nested, out);
            }
        }
        Value::Array(items) => {
            for (index, nested) in items.iter().enumerate() {
                let key = match &prefix {
                    Some(prefix) => format!("{prefix}[{index}]"),
                    None => index.to_string(),
                };
                flatten(Some(key), nested, out);
            }
        }
        scalar => {
            if let Some(key) = prefix {
                out.push((key, scalar_text(scalar)));
            }
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
