//! Request value and its builder.
//!
//! # Design
//! A [`Request`] is plain data plus two ordered interceptor lists. It is built
//! through [`RequestBuilder`], whose terminal [`RequestBuilder::build`] is the
//! only place validation happens. After that every field stays public:
//! interceptors receive the request by value and hand back a (possibly
//! changed) one.
//!
//! Interceptor lists only grow. The order in which they were added is the
//! order in which the service runs them.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::http::{set_header, Headers, HttpMethod, Parameters, Serializer};
use crate::interceptor::{RequestInterceptor, ResponseInterceptor};

/// One HTTP call as handed to [`crate::HttpService::fetch`].
#[derive(Clone)]
pub struct Request {
    pub method: HttpMethod,
    pub path: String,
    /// Overrides the configured host for this call only.
    pub host: Option<String>,
    pub serializer: Serializer,
    pub headers: Headers,
    /// Structured value or `Value::String` for a pre-encoded payload.
    pub body: Value,
    pub parameters: Parameters,
    pub with_bearer_token: bool,
    pub with_user_token: bool,
    pub request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
    pub response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
}

impl Request {
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// Rebuild a request from a JSON record carrying any subset of its
    /// fields. The result still has to pass [`RequestBuilder::build`].
    pub fn from_json(json: &str) -> Result<Self, ApiError> {
        let record: RequestRecord = serde_json::from_str(json)
            .map_err(|e| ApiError::RequestBuild(format!("invalid request record: {e}")))?;
        Request::try_from(record)
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        set_header(&mut self.headers, name, value);
    }

    pub fn add_request_interceptor(&mut self, interceptor: Arc<dyn RequestInterceptor>) {
        self.request_interceptors.push(interceptor);
    }

    pub fn add_response_interceptor(&mut self, interceptor: Arc<dyn ResponseInterceptor>) {
        self.response_interceptors.push(interceptor);
    }

    /// Snapshot of the serialisable fields.
    pub fn to_record(&self) -> RequestRecord {
        RequestRecord {
            method: Some(self.method),
            path: Some(self.path.clone()),
            host: self.host.clone(),
            serializer: Some(self.serializer),
            headers: Some(self.headers.clone()),
            body: Some(self.body.clone()),
            parameters: Some(self.parameters.clone()),
            with_bearer_token: Some(self.with_bearer_token),
            with_user_token: Some(self.with_user_token),
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("host", &self.host)
            .field("serializer", &self.serializer)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("parameters", &self.parameters)
            .field("with_bearer_token", &self.with_bearer_token)
            .field("with_user_token", &self.with_user_token)
            .field("request_interceptors", &self.request_interceptors.len())
            .field("response_interceptors", &self.response_interceptors.len())
            .finish()
    }
}

/// Accumulates request fields; [`RequestBuilder::build`] validates them.
#[derive(Clone)]
pub struct RequestBuilder {
    method: Option<HttpMethod>,
    path: Option<String>,
    host: Option<String>,
    serializer: Serializer,
    headers: Headers,
    body: Value,
    parameters: Parameters,
    with_bearer_token: bool,
    with_user_token: bool,
    request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
    response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self {
            method: None,
            path: None,
            host: None,
            serializer: Serializer::default(),
            headers: Headers::new(),
            body: Value::Object(serde_json::Map::new()),
            parameters: Parameters::new(),
            with_bearer_token: false,
            with_user_token: false,
            request_interceptors: Vec::new(),
            response_interceptors: Vec::new(),
        }
    }
}

impl RequestBuilder {
    pub fn with_type(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_serializer(mut self, serializer: Serializer) -> Self {
        self.serializer = serializer;
        self
    }

    /// Replaces the header map.
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Serialise any `Serialize` payload as the body.
    pub fn with_json_body<T: Serialize>(self, body: &T) -> Result<Self, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::RequestBuild(format!("body is not serialisable: {e}")))?;
        Ok(self.with_body(body))
    }

    /// Replaces the query parameter map.
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_bearer_token(mut self, enabled: bool) -> Self {
        self.with_bearer_token = enabled;
        self
    }

    pub fn with_user_token(mut self, enabled: bool) -> Self {
        self.with_user_token = enabled;
        self
    }

    /// Appends; interceptors run in the order they were added.
    pub fn with_request_interceptor(
        mut self,
        interceptor: impl RequestInterceptor + 'static,
    ) -> Self {
        self.request_interceptors.push(Arc::new(interceptor));
        self
    }

    /// Appends; interceptors run in the order they were added.
    pub fn with_response_interceptor(
        mut self,
        interceptor: impl ResponseInterceptor + 'static,
    ) -> Self {
        self.response_interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn build(self) -> Result<Request, ApiError> {
        let path = match self.path {
            Some(path) if !path.is_empty() => path,
            _ => return Err(ApiError::RequestBuild("path is required".to_string())),
        };
        let method = self
            .method
            .ok_or_else(|| ApiError::RequestBuild("type is required".to_string()))?;

        Ok(Request {
            method,
            path,
            host: self.host,
            serializer: self.serializer,
            headers: self.headers,
            body: self.body,
            parameters: self.parameters,
            with_bearer_token: self.with_bearer_token,
            with_user_token: self.with_user_token,
            request_interceptors: self.request_interceptors,
            response_interceptors: self.response_interceptors,
        })
    }
}

/// JSON-compatible projection of a [`Request`]. Every field is optional so a
/// record may carry only part of a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serializer: Option<Serializer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_bearer_token: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_user_token: Option<bool>,
}

impl TryFrom<RequestRecord> for Request {
    type Error = ApiError;

    fn try_from(record: RequestRecord) -> Result<Self, Self::Error> {
        let mut builder = Request::builder();
        if let Some(method) = record.method {
            builder = builder.with_type(method);
        }
        if let Some(path) = record.path {
            builder = builder.with_path(path);
        }
        if let Some(host) = record.host {
            builder = builder.with_host(host);
        }
        if let Some(serializer) = record.serializer {
            builder = builder.with_serializer(serializer);
        }
        if let Some(headers) = record.headers {
            builder = builder.with_headers(headers);
        }
        if let Some(body) = record.body {
            builder = builder.with_body(body);
        }
        if let Some(parameters) = record.parameters {
            builder = builder.with_parameters(parameters);
        }
        if let Some(enabled) = record.with_bearer_token {
            builder = builder.with_bearer_token(enabled);
        }
        if let Some(enabled) = record.with_user_token {
            builder = builder.with_user_token(enabled);
        }
        builder.build()
    }
}
