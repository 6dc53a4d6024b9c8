//! Adapter over a host-provided, callback-based HTTP plugin.
//!
//! # Design
//! Mobile and embedded hosts usually own the network stack. They expose it
//! as a plugin with a `send_request(request, on_success, on_error)` shape:
//! exactly one of the two callbacks is eventually invoked, possibly from
//! another thread. [`BridgeAdapter`] turns that into a future with a oneshot
//! channel and settles the result through the same status rules as every
//! other adapter. Status 0 on the error callback means no response was
//! received.
//!
//! The plugin receives the URL without a query string; for GET and DELETE the
//! query parameters travel in `data` as a JSON object and the plugin appends
//! them. For body methods `data` is the body, `serializer` tells the plugin
//! how to encode it and the headers already carry the matching content type.

use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::adapter::{body_headers, classify, HttpAdapter};
use crate::error::ApiError;
use crate::http::{status, Headers, HttpMethod, Parameters, Serializer};
use crate::response::Response;

/// What the plugin is asked to send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginRequest {
    pub method: HttpMethod,
    pub url: String,
    pub data: Value,
    pub headers: Headers,
    pub serializer: Serializer,
}

/// Payload of the success callback.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PluginSuccess {
    pub status: u16,
    pub data: String,
    #[serde(default)]
    pub headers: Headers,
}

/// Payload of the error callback.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PluginFailure {
    pub status: u16,
    pub error: String,
    #[serde(default)]
    pub headers: Headers,
}

pub type OnSuccess = Box<dyn FnOnce(PluginSuccess) + Send + 'static>;
pub type OnError = Box<dyn FnOnce(PluginFailure) + Send + 'static>;

/// Host HTTP stack. Implementations must eventually call exactly one of the
/// callbacks, or drop both (reported as a network error).
pub trait NativeHttpPlugin: Send + Sync {
    fn send_request(&self, request: PluginRequest, on_success: OnSuccess, on_error: OnError);
}

enum Settled {
    Success(PluginSuccess),
    Failure(PluginFailure),
}

type Slot = Arc<Mutex<Option<oneshot::Sender<Settled>>>>;

#[derive(Clone)]
pub struct BridgeAdapter {
    plugin: Arc<dyn NativeHttpPlugin>,
}

impl BridgeAdapter {
    pub fn new(plugin: impl NativeHttpPlugin + 'static) -> Self {
        Self {
            plugin: Arc::new(plugin),
        }
    }

    pub fn from_arc(plugin: Arc<dyn NativeHttpPlugin>) -> Self {
        Self { plugin }
    }

    async fn call(&self, request: PluginRequest) -> Result<Response, ApiError> {
        tracing::debug!(method = %request.method, url = %request.url, "native request");

        let (tx, rx) = oneshot::channel();
        let slot: Slot = Arc::new(Mutex::new(Some(tx)));
        let success_slot = Arc::clone(&slot);
        let on_success: OnSuccess = Box::new(move |ok| settle(&success_slot, Settled::Success(ok)));
        let on_error: OnError = Box::new(move |failed| settle(&slot, Settled::Failure(failed)));

        self.plugin.send_request(request, on_success, on_error);

        match rx.await {
            Ok(Settled::Success(ok)) => settle_success(ok),
            Ok(Settled::Failure(failed)) => settle_failure(failed),
            Err(_) => Err(ApiError::Network(
                "native http plugin dropped the request without answering".to_string(),
            )),
        }
    }

    fn request(
        method: HttpMethod,
        host: &str,
        path: &str,
        headers: &Headers,
        data: Value,
        serializer: Serializer,
    ) -> PluginRequest {
        PluginRequest {
            method,
            url: format!("{host}{path}"),
            data,
            headers: headers.clone(),
            serializer,
        }
    }
}

impl fmt::Debug for BridgeAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeAdapter").finish_non_exhaustive()
    }
}

/// First callback wins; later ones find the slot empty.
fn settle(slot: &Slot, outcome: Settled) {
    let sender = slot
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .take();
    if let Some(sender) = sender {
        // The receiver is gone only if the caller stopped waiting.
        let _ = sender.send(outcome);
    }
}

fn settle_success(ok: PluginSuccess) -> Result<Response, ApiError> {
    if ok.status == status::NO_RESPONSE {
        return Err(ApiError::Network("native http plugin reported status 0".to_string()));
    }
    let body = Response::parse_body(&ok.data);
    let response = if ok.status == status::SUCCESS {
        Response::new(ok.status, body)
    } else {
        Response::from_error_path(ok.status, body)
    };
    classify(response.with_headers(ok.headers))
}

fn settle_failure(failed: PluginFailure) -> Result<Response, ApiError> {
    if failed.status == status::NO_RESPONSE {
        tracing::warn!(error = %failed.error, "native transport failed");
        return Err(ApiError::Network(failed.error));
    }
    classify(
        Response::from_error_path(failed.status, Response::parse_body(&failed.error))
            .with_headers(failed.headers),
    )
}

fn parameters_value(parameters: &Parameters) -> Value {
    Value::Object(
        parameters
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

#[async_trait]
impl HttpAdapter for BridgeAdapter {
    async fn get(
        &self,
        host: &str,
        path: &str,
        headers: &Headers,
        parameters: &Parameters,
    ) -> Result<Response, ApiError> {
        let data = parameters_value(parameters);
        self.call(Self::request(HttpMethod::Get, host, path, headers, data, Serializer::Json))
            .await
    }

    async fn post(
        &self,
        host: &str,
        path: &str,
        headers: &Headers,
        body: &Value,
        serializer: Serializer,
    ) -> Result<Response, ApiError> {
        let headers = body_headers(headers, serializer);
        self.call(Self::request(HttpMethod::Post, host, path, &headers, body.clone(), serializer))
            .await
    }

    async fn patch(
        &self,
        host: &str,
        path: &str,
        headers: &Headers,
        body: &Value,
        serializer: Serializer,
    ) -> Result<Response, ApiError> {
        let headers = body_headers(headers, serializer);
        self.call(Self::request(HttpMethod::Patch, host, path, &headers, body.clone(), serializer))
            .await
    }

    async fn put(
        &self,
        host: &str,
        path: &str,
        headers: &Headers,
        body: &Value,
        serializer: Serializer,
    ) -> Result<Response, ApiError> {
        let headers = body_headers(headers, serializer);
        self.call(Self::request(HttpMethod::Put, host, path, &headers, body.clone(), serializer))
            .await
    }

    async fn delete(
        &self,
        host: &str,
        path: &str,
        headers: &Headers,
        parameters: &Parameters,
    ) -> Result<Response, ApiError> {
        let data = parameters_value(parameters);
        self.call(Self::request(HttpMethod::Delete, host, path, headers, data, Serializer::Json))
            .await
    }
}
