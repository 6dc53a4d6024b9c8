//! In-process adapter that performs the HTTP exchange with `reqwest`.
//!
//! A successful (2xx) exchange must carry a JSON document; anything else on
//! that path is reported as [`ApiError::Network`], since the caller cannot
//! tell it apart from a broken intermediary. Error-path bodies are kept as
//! text when they are not JSON.

use async_trait::async_trait;
use serde_json::Value;

use crate::adapter::{build_url, classify, prepare_body, HttpAdapter};
use crate::error::ApiError;
use crate::http::{Headers, HttpMethod, Parameters, Serializer};
use crate::response::Response;

#[derive(Debug, Clone)]
pub struct FetchAdapter {
    client: reqwest::Client,
}

impl FetchAdapter {
    pub fn new() -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ApiError::Network(format!("cannot initialise http client: {e}")))?;
        Ok(Self { client })
    }

    /// Reuse an existing client (connection pool, proxies, timeouts).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn send(
        &self,
        method: HttpMethod,
        url: String,
        headers: &Headers,
        payload: Option<String>,
    ) -> Result<Response, ApiError> {
        tracing::debug!(%method, %url, "fetch");

        let mut builder = self.client.request(to_reqwest(method), &url);
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(payload) = payload {
            builder = builder.body(payload);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_builder() {
                ApiError::RequestBuild(e.to_string())
            } else {
                tracing::warn!(%method, %url, error = %e, "transport failed");
                ApiError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let headers: Headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("failed to read response body: {e}")))?;
        let body = Response::parse_body(&text);

        if status.is_success() {
            if !is_document(&body) {
                return Err(ApiError::Network(format!(
                    "HTTP {} returned a body that is not a JSON document",
                    status.as_u16()
                )));
            }
            return classify(Response::new(status.as_u16(), body).with_headers(headers));
        }
        classify(Response::from_error_path(status.as_u16(), body).with_headers(headers))
    }
}

#[async_trait]
impl HttpAdapter for FetchAdapter {
    async fn get(
        &self,
        host: &str,
        path: &str,
        headers: &Headers,
        parameters: &Parameters,
    ) -> Result<Response, ApiError> {
        let url = build_url(host, path, parameters)?;
        self.send(HttpMethod::Get, url, headers, None).await
    }

    async fn post(
        &self,
        host: &str,
        path: &str,
        headers: &Headers,
        body: &Value,
        serializer: Serializer,
    ) -> Result<Response, ApiError> {
        let url = build_url(host, path, &Parameters::new())?;
        let (headers, payload) = prepare_body(headers, body, serializer);
        self.send(HttpMethod::Post, url, &headers, payload).await
    }

    async fn patch(
        &self,
        host: &str,
        path: &str,
        headers: &Headers,
        body: &Value,
        serializer: Serializer,
    ) -> Result<Response, ApiError> {
        let url = build_url(host, path, &Parameters::new())?;
        let (headers, payload) = prepare_body(headers, body, serializer);
        self.send(HttpMethod::Patch, url, &headers, payload).await
    }

    async fn put(
        &self,
        host: &str,
        path: &str,
        headers: &Headers,
        body: &Value,
        serializer: Serializer,
    ) -> Result<Response, ApiError> {
        let url = build_url(host, path, &Parameters::new())?;
        let (headers, payload) = prepare_body(headers, body, serializer);
        self.send(HttpMethod::Put, url, &headers, payload).await
    }

    async fn delete(
        &self,
        host: &str,
        path: &str,
        headers: &Headers,
        parameters: &Parameters,
    ) -> Result<Response, ApiError> {
        let url = build_url(host, path, parameters)?;
        self.send(HttpMethod::Delete, url, headers, None).await
    }
}

fn to_reqwest(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Put => reqwest::Method::PUT,
    }
}

/// Objects, arrays and `null`; not bare scalars or unparsed text.
fn is_document(body: &Value) -> bool {
    matches!(body, Value::Object(_) | Value::Array(_) | Value::Null)
}
