//! Transport adapters: one verb-level API over interchangeable transports.
//!
//! # Design
//! Every adapter call is fully parameterised. Headers and the body
//! serializer travel with the call instead of living on the adapter, so a
//! single adapter can serve any number of concurrent requests without one
//! call's configuration leaking into another's.
//!
//! Two adapters ship with the crate:
//! - [`FetchAdapter`] speaks HTTP itself through `reqwest` (feature `fetch`).
//! - [`BridgeAdapter`] hands each call to a host-provided
//!   [`NativeHttpPlugin`] and waits for its success or error callback.
//!
//! Both settle a call through [`classify`], so they agree on which statuses
//! come back as responses and which become errors.

pub mod bridge;
#[cfg(feature = "fetch")]
pub mod fetch;

use async_trait::async_trait;
use serde_json::Value;

use crate::encoding::{encode_body, query_string};
use crate::error::ApiError;
use crate::http::{set_header, status, Headers, Parameters, Serializer, CONTENT_TYPE};
use crate::response::Response;

pub use bridge::{
    BridgeAdapter, NativeHttpPlugin, OnError, OnSuccess, PluginFailure, PluginRequest,
    PluginSuccess,
};
#[cfg(feature = "fetch")]
pub use fetch::FetchAdapter;

/// Verb-level HTTP capability.
///
/// `host` and `path` are concatenated as given. GET and DELETE carry query
/// parameters; POST, PATCH and PUT carry a body encoded with `serializer`.
#[async_trait]
pub trait HttpAdapter: Send + Sync {
    async fn get(
        &self,
        host: &str,
        path: &str,
        headers: &Headers,
        parameters: &Parameters,
    ) -> Result<Response, ApiError>;

    async fn post(
        &self,
        host: &str,
        path: &str,
        headers: &Headers,
        body: &Value,
        serializer: Serializer,
    ) -> Result<Response, ApiError>;

    async fn patch(
        &self,
        host: &str,
        path: &str,
        headers: &Headers,
        body: &Value,
        serializer: Serializer,
    ) -> Result<Response, ApiError>;

    async fn put(
        &self,
        host: &str,
        path: &str,
        headers: &Headers,
        body: &Value,
        serializer: Serializer,
    ) -> Result<Response, ApiError>;

    async fn delete(
        &self,
        host: &str,
        path: &str,
        headers: &Headers,
        parameters: &Parameters,
    ) -> Result<Response, ApiError>;
}

/// Settle a received response.
///
/// | status | outcome |
/// |---|---|
/// | 200 | `Ok` |
/// | 401, 403 | `Ok`, left for interceptors and callers to inspect |
/// | other 4xx | [`ApiError::Client`] |
/// | anything else | [`ApiError::Server`] |
pub fn classify(response: Response) -> Result<Response, ApiError> {
    match response.response_code {
        status::SUCCESS | status::UNAUTHORIZED | status::FORBIDDEN => Ok(response),
        code @ 400..=499 => Err(ApiError::Client {
            message: format!("HTTP {code}"),
            response,
        }),
        code => Err(ApiError::Server {
            message: format!("HTTP {code}"),
            response,
        }),
    }
}

/// `host` + `path`, with `parameters` appended as a query string.
#[cfg_attr(not(feature = "fetch"), allow(dead_code))]
pub(crate) fn build_url(
    host: &str,
    path: &str,
    parameters: &Parameters,
) -> Result<String, ApiError> {
    let mut target = format!("{host}{path}");
    if !parameters.is_empty() {
        target.push(if target.contains('?') { '&' } else { '?' });
        target.push_str(&query_string(parameters));
    }
    url::Url::parse(&target)
        .map_err(|e| ApiError::RequestBuild(format!("invalid url {target:?}: {e}")))?;
    Ok(target)
}

/// `headers` with the content type announced by `serializer`; `Raw` keeps
/// whatever the caller set.
pub(crate) fn body_headers(headers: &Headers, serializer: Serializer) -> Headers {
    let mut headers = headers.clone();
    if let Some(content_type) = serializer.content_type() {
        set_header(&mut headers, CONTENT_TYPE, content_type);
    }
    headers
}

/// Wire body and the headers announcing it.
#[cfg_attr(not(feature = "fetch"), allow(dead_code))]
pub(crate) fn prepare_body(
    headers: &Headers,
    body: &Value,
    serializer: Serializer,
) -> (Headers, Option<String>) {
    (body_headers(headers, serializer), encode_body(body, serializer))
}
