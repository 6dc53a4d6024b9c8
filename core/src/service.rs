//! The HTTP service every caller funnels requests through.
//!
//! # Design
//! [`HttpService::fetch`] runs one request through a fixed sequence:
//!
//! 1. compute the global headers from the current config;
//! 2. put the token interceptors the request asks for at the front of its own
//!    interceptor list;
//! 3. URL-encode structured bodies when the request's serializer says so;
//! 4. run the global request interceptors, then the request's own;
//! 5. dispatch through the adapter method matching the request type;
//! 6. run the global response interceptors, then the request's own, over the
//!    settled outcome of step 5 (success or error);
//! 7. report any response that is still not a 200 as
//!    [`ApiError::Unsuccessful`].
//!
//! The service keeps no per-call state. Headers and serializer reach the
//! adapter as call arguments, so concurrent `fetch` calls cannot observe
//! each other's configuration.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::adapter::HttpAdapter;
use crate::config::SharedConfig;
use crate::encoding::form_encode;
use crate::error::ApiError;
use crate::http::{
    merge_headers, Headers, HttpMethod, Serializer, APP_ID, CHANNEL_ID, CONTENT_TYPE, DEVICE_ID,
    MIME_JSON,
};
use crate::interceptor::{
    run_request_chain, run_response_chain, BearerTokenInjectRequestInterceptor, RequestInterceptor,
    ResponseInterceptor, UserTokenInjectRequestInterceptor,
};
use crate::request::Request;
use crate::response::Response;

#[derive(Clone)]
pub struct HttpService {
    config: SharedConfig,
    adapter: Arc<dyn HttpAdapter>,
    request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
    response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
}

impl HttpService {
    pub fn new(config: SharedConfig, adapter: Arc<dyn HttpAdapter>) -> Self {
        Self {
            config,
            adapter,
            request_interceptors: Vec::new(),
            response_interceptors: Vec::new(),
        }
    }

    /// Register an interceptor for every request. Global interceptors run
    /// before a request's own, in registration order.
    pub fn with_request_interceptor(
        mut self,
        interceptor: impl RequestInterceptor + 'static,
    ) -> Self {
        self.request_interceptors.push(Arc::new(interceptor));
        self
    }

    /// Register an interceptor for every response. Global interceptors run
    /// before a request's own, in registration order.
    pub fn with_response_interceptor(
        mut self,
        interceptor: impl ResponseInterceptor + 'static,
    ) -> Self {
        self.response_interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    /// Headers attached to every request before its own headers.
    pub fn global_headers(&self) -> Headers {
        let config = self.config.snapshot();
        let mut headers = Headers::new();
        headers.insert(CHANNEL_ID.to_string(), config.channel_id);
        headers.insert(APP_ID.to_string(), config.producer_id);
        headers.insert(DEVICE_ID.to_string(), config.device_id);
        headers.insert("Accept".to_string(), MIME_JSON.to_string());
        headers.insert(CONTENT_TYPE.to_string(), MIME_JSON.to_string());
        headers.insert("Access-Control-Allow-Origin".to_string(), "*".to_string());
        headers
    }

    pub async fn fetch(&self, request: Request) -> Result<Response, ApiError> {
        let mut request = request;
        let global_headers = self.global_headers();

        // Prepending bearer then user leaves the user-token interceptor first.
        if request.with_bearer_token {
            request.request_interceptors.insert(
                0,
                Arc::new(BearerTokenInjectRequestInterceptor::new(self.config.clone())),
            );
        }
        if request.with_user_token {
            request.request_interceptors.insert(
                0,
                Arc::new(UserTokenInjectRequestInterceptor::new(self.config.clone())),
            );
        }

        if request.serializer == Serializer::UrlEncoded && is_structured(&request.body) {
            request.body = Value::String(form_encode(&request.body));
        }

        let chain: Vec<Arc<dyn RequestInterceptor>> = self
            .request_interceptors
            .iter()
            .chain(request.request_interceptors.iter())
            .cloned()
            .collect();
        let request = run_request_chain(&chain, request).await?;

        tracing::debug!(method = %request.method, path = %request.path, "dispatching request");
        let outcome = self.dispatch(&request, &global_headers).await;

        let chain: Vec<Arc<dyn ResponseInterceptor>> = self
            .response_interceptors
            .iter()
            .chain(request.response_interceptors.iter())
            .cloned()
            .collect();
        let response = run_response_chain(&chain, &request, outcome).await?;

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status = response.response_code,
            "request settled"
        );
        if !response.is_success() {
            return Err(ApiError::Unsuccessful(response));
        }
        Ok(response)
    }

    async fn dispatch(
        &self,
        request: &Request,
        global_headers: &Headers,
    ) -> Result<Response, ApiError> {
        let host = match &request.host {
            Some(host) => host.clone(),
            None => self.config.host(),
        };
        let headers = merge_headers(global_headers, &request.headers);
        let adapter = &self.adapter;
        match request.method {
            HttpMethod::Get => {
                adapter
                    .get(&host, &request.path, &headers, &request.parameters)
                    .await
            }
            HttpMethod::Delete => {
                adapter
                    .delete(&host, &request.path, &headers, &request.parameters)
                    .await
            }
            HttpMethod::Post => {
                adapter
                    .post(&host, &request.path, &headers, &request.body, request.serializer)
                    .await
            }
            HttpMethod::Patch => {
                adapter
                    .patch(&host, &request.path, &headers, &request.body, request.serializer)
                    .await
            }
            HttpMethod::Put => {
                adapter
                    .put(&host, &request.path, &headers, &request.body, request.serializer)
                    .await
            }
        }
    }
}

impl fmt::Debug for HttpService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpService")
            .field("config", &self.config)
            .field("request_interceptors", &self.request_interceptors.len())
            .field("response_interceptors", &self.response_interceptors.len())
            .finish_non_exhaustive()
    }
}

fn is_structured(body: &Value) -> bool {
    matches!(body, Value::Object(_) | Value::Array(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{
        BridgeAdapter, NativeHttpPlugin, OnError, OnSuccess, PluginRequest, PluginSuccess,
    };
    use crate::config::ApiConfig;
    use crate::http::{header, Parameters, AUTHORIZATION, MIME_FORM, USER_TOKEN};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// What the service handed to the adapter.
    #[derive(Debug, Clone)]
    struct Sent {
        method: HttpMethod,
        host: String,
        path: String,
        headers: Headers,
        body: Option<Value>,
        parameters: Option<Parameters>,
        serializer: Option<Serializer>,
    }

    /// Records every call and answers with a scripted outcome.
    struct Scripted {
        outcome: Result<Response, ApiError>,
        sent: Arc<Mutex<Vec<Sent>>>,
    }

    impl Scripted {
        fn record(&self, sent: Sent) -> Result<Response, ApiError> {
            self.sent.lock().unwrap().push(sent);
            self.outcome.clone()
        }
    }

    #[async_trait]
    impl HttpAdapter for Scripted {
        async fn get(
            &self,
            host: &str,
            path: &str,
            headers: &Headers,
            parameters: &Parameters,
        ) -> Result<Response, ApiError> {
            self.record(Sent {
                method: HttpMethod::Get,
                host: host.to_string(),
                path: path.to_string(),
                headers: headers.clone(),
                body: None,
                parameters: Some(parameters.clone()),
                serializer: None,
            })
        }

        async fn post(
            &self,
            host: &str,
            path: &str,
            headers: &Headers,
            body: &Value,
            serializer: Serializer,
        ) -> Result<Response, ApiError> {
            self.record(Sent {
                method: HttpMethod::Post,
                host: host.to_string(),
                path: path.to_string(),
                headers: headers.clone(),
                body: Some(body.clone()),
                parameters: None,
                serializer: Some(serializer),
            })
        }

        async fn patch(
            &self,
            host: &str,
            path: &str,
            headers: &Headers,
            body: &Value,
            serializer: Serializer,
        ) -> Result<Response, ApiError> {
            self.record(Sent {
                method: HttpMethod::Patch,
                host: host.to_string(),
                path: path.to_string(),
                headers: headers.clone(),
                body: Some(body.clone()),
                parameters: None,
                serializer: Some(serializer),
            })
        }

        async fn put(
            &self,
            host: &str,
            path: &str,
            headers: &Headers,
            body: &Value,
            serializer: Serializer,
        ) -> Result<Response, ApiError> {
            self.record(Sent {
                method: HttpMethod::Put,
                host: host.to_string(),
                path: path.to_string(),
                headers: headers.clone(),
                body: Some(body.clone()),
                parameters: None,
                serializer: Some(serializer),
            })
        }

        async fn delete(
            &self,
            host: &str,
            path: &str,
            headers: &Headers,
            parameters: &Parameters,
        ) -> Result<Response, ApiError> {
            self.record(Sent {
                method: HttpMethod::Delete,
                host: host.to_string(),
                path: path.to_string(),
                headers: headers.clone(),
                body: None,
                parameters: Some(parameters.clone()),
                serializer: None,
            })
        }
    }

    fn config() -> SharedConfig {
        SharedConfig::new(
            ApiConfig::new("https://api.example.org")
                .with_channel_id("channel-1")
                .with_device_id("device-1")
                .with_producer_id("app.mobile")
                .with_bearer_token("bearer-1")
                .with_user_token("user-1"),
        )
    }

    fn service(outcome: Result<Response, ApiError>) -> (HttpService, Arc<Mutex<Vec<Sent>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let adapter = Scripted {
            outcome,
            sent: sent.clone(),
        };
        (HttpService::new(config(), Arc::new(adapter)), sent)
    }

    fn get(path: &str) -> crate::request::RequestBuilder {
        Request::builder().with_type(HttpMethod::Get).with_path(path)
    }

    fn require_header(
        name: &'static str,
    ) -> impl Fn(Request) -> Result<Request, ApiError> + Send + Sync {
        move |req: Request| {
            if header(&req.headers, name).is_none() {
                return Err(ApiError::RequestBuild(format!("{name} missing")));
            }
            Ok(req)
        }
    }

    struct RecoverTo(u16);

    #[async_trait]
    impl ResponseInterceptor for RecoverTo {
        async fn intercept_response(
            &self,
            _request: &Request,
            response: Response,
        ) -> Result<Response, ApiError> {
            Ok(response)
        }

        async fn intercept_error(
            &self,
            _request: &Request,
            _error: &ApiError,
        ) -> Result<Option<Response>, ApiError> {
            Ok(Some(Response::new(self.0, json!({"recovered": true}))))
        }
    }

    #[tokio::test]
    async fn bearer_request_succeeds_on_200() {
        let (service, sent) = service(Ok(Response::new(200, json!({}))));
        let request = get("/some_path").with_bearer_token(true).build().unwrap();

        let response = service.fetch(request).await.unwrap();
        assert_eq!(response.response_code, 200);

        let sent = sent.lock().unwrap();
        assert_eq!(sent[0].headers[AUTHORIZATION], "Bearer bearer-1");
        assert!(!sent[0].headers.contains_key(USER_TOKEN));
    }

    #[tokio::test]
    async fn client_error_is_propagated_with_response() {
        let failed = Response::from_error_path(400, json!({}));
        let (service, _) = service(Err(ApiError::Client {
            message: "HTTP 400".to_string(),
            response: failed,
        }));

        let err = service.fetch(get("/some_path").build().unwrap()).await.unwrap_err();
        assert_eq!(err.code(), ApiError::HTTP_CLIENT_ERROR);
        assert_eq!(err.response().unwrap().response_code, 400);
    }

    #[tokio::test]
    async fn json_body_reaches_adapter_unmodified() {
        let (service, sent) = service(Ok(Response::new(200, json!({"id": "t-1", "name": "x"}))));
        let request = Request::builder()
            .with_type(HttpMethod::Post)
            .with_path("/v2/topics")
            .with_body(json!({"name": "x"}))
            .build()
            .unwrap();

        let response = service.fetch(request).await.unwrap();
        assert_eq!(response.body, json!({"id": "t-1", "name": "x"}));

        let sent = sent.lock().unwrap();
        assert_eq!(sent[0].method, HttpMethod::Post);
        assert_eq!(sent[0].body, Some(json!({"name": "x"})));
        assert_eq!(sent[0].serializer, Some(Serializer::Json));
        assert!(!sent[0].headers.contains_key(AUTHORIZATION));
    }

    #[tokio::test]
    async fn global_headers_are_attached_and_overridable() {
        let (service, sent) = service(Ok(Response::new(200, json!({}))));
        let mut headers = Headers::new();
        headers.insert("accept".to_string(), "text/csv".to_string());
        service.fetch(get("/p").with_headers(headers).build().unwrap()).await.unwrap();

        let sent = sent.lock().unwrap();
        let headers = &sent[0].headers;
        assert_eq!(headers[CHANNEL_ID], "channel-1");
        assert_eq!(headers[APP_ID], "app.mobile");
        assert_eq!(headers[DEVICE_ID], "device-1");
        assert_eq!(headers[CONTENT_TYPE], MIME_JSON);
        assert_eq!(headers["Access-Control-Allow-Origin"], "*");
        assert_eq!(header(headers, "Accept"), Some("text/csv"));
    }

    #[tokio::test]
    async fn host_override_and_parameters_are_forwarded() {
        let (service, sent) = service(Ok(Response::new(200, json!({}))));
        let mut parameters = Parameters::new();
        parameters.insert("id".to_string(), "42".to_string());
        let request = Request::builder()
            .with_type(HttpMethod::Delete)
            .with_path("/v1/item")
            .with_host("https://other.example.org")
            .with_parameters(parameters.clone())
            .build()
            .unwrap();
        service.fetch(request).await.unwrap();

        service.fetch(get("/v1/item").build().unwrap()).await.unwrap();

        let sent = sent.lock().unwrap();
        assert_eq!(sent[0].method, HttpMethod::Delete);
        assert_eq!(sent[0].host, "https://other.example.org");
        assert_eq!(sent[0].parameters, Some(parameters));
        assert_eq!(sent[1].host, "https://api.example.org");
        assert_eq!(sent[1].path, "/v1/item");
    }

    #[tokio::test]
    async fn urlencoded_body_is_encoded_before_dispatch() {
        let (service, sent) = service(Ok(Response::new(200, json!({}))));
        let request = Request::builder()
            .with_type(HttpMethod::Post)
            .with_path("/oauth/token")
            .with_serializer(Serializer::UrlEncoded)
            .with_body(json!({"a": "1", "b": "2"}))
            .build()
            .unwrap();
        service.fetch(request).await.unwrap();

        let sent = sent.lock().unwrap();
        assert_eq!(sent[0].body, Some(json!("a=1&b=2")));
        assert_eq!(sent[0].serializer, Some(Serializer::UrlEncoded));
    }

    #[tokio::test]
    async fn every_verb_dispatches_to_its_adapter_method() {
        let (service, sent) = service(Ok(Response::new(200, json!({}))));
        let expected = [
            HttpMethod::Get,
            HttpMethod::Post,
            HttpMethod::Patch,
            HttpMethod::Put,
            HttpMethod::Delete,
        ];
        for method in expected {
            let request = Request::builder().with_type(method).with_path("/p").build().unwrap();
            service.fetch(request).await.unwrap();
        }
        let methods: Vec<HttpMethod> = sent.lock().unwrap().iter().map(|s| s.method).collect();
        assert_eq!(methods, expected.to_vec());
    }

    #[tokio::test]
    async fn global_request_interceptor_runs_before_request_interceptor() {
        let (service, sent) = service(Ok(Response::new(200, json!({}))));
        let set_global = |mut req: Request| -> Result<Request, ApiError> {
            req.set_header("X", "global");
            Ok(req)
        };
        let service = service.with_request_interceptor(set_global);
        let request = get("/p").with_request_interceptor(require_header("X")).build().unwrap();

        service.fetch(request).await.unwrap();
        assert_eq!(sent.lock().unwrap()[0].headers["X"], "global");
    }

    #[tokio::test]
    async fn token_interceptors_run_before_custom_ones() {
        let (service, sent) = service(Ok(Response::new(200, json!({}))));
        let request = get("/p")
            .with_bearer_token(true)
            .with_user_token(true)
            .with_request_interceptor(require_header(AUTHORIZATION))
            .with_request_interceptor(require_header(USER_TOKEN))
            .build()
            .unwrap();

        service.fetch(request).await.unwrap();
        let sent = sent.lock().unwrap();
        assert_eq!(sent[0].headers[AUTHORIZATION], "Bearer bearer-1");
        assert_eq!(sent[0].headers[USER_TOKEN], "user-1");
    }

    #[tokio::test]
    async fn custom_interceptor_without_token_flag_fails_the_call() {
        let (service, sent) = service(Ok(Response::new(200, json!({}))));
        let request = get("/p")
            .with_request_interceptor(require_header(AUTHORIZATION))
            .build()
            .unwrap();

        let err = service.fetch(request).await.unwrap_err();
        assert_eq!(err, ApiError::RequestBuild("Authorization missing".to_string()));
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn response_interceptor_can_recover_an_error() {
        let (service, _) = service(Err(ApiError::Server {
            message: "HTTP 500".to_string(),
            response: Response::from_error_path(500, json!("boom")),
        }));
        let request = get("/p").with_response_interceptor(RecoverTo(200)).build().unwrap();

        let response = service.fetch(request).await.unwrap();
        assert_eq!(response.response_code, 200);
        assert_eq!(response.body, json!({"recovered": true}));
    }

    #[tokio::test]
    async fn recovery_to_a_non_200_still_fails() {
        let (service, _) = service(Err(ApiError::Network("offline".to_string())));
        let service = service.with_response_interceptor(RecoverTo(204));

        let err = service.fetch(get("/p").build().unwrap()).await.unwrap_err();
        assert_eq!(err.code(), ApiError::UNSUCCESSFUL_RESPONSE);
        assert_eq!(err.response().unwrap().response_code, 204);
    }

    #[tokio::test]
    async fn soft_auth_failure_is_reported_as_the_response() {
        let unauthorized = Response::from_error_path(401, json!({"message": "Unauthorized"}));
        let (service, _) = service(Ok(unauthorized.clone()));

        let err = service.fetch(get("/p").build().unwrap()).await.unwrap_err();
        assert_eq!(err, ApiError::Unsuccessful(unauthorized));
    }

    #[tokio::test]
    async fn updated_token_is_used_by_the_next_call() {
        let (service, sent) = service(Ok(Response::new(200, json!({}))));
        service.config().set_bearer_token(Some("bearer-2".to_string()));
        service
            .fetch(get("/p").with_bearer_token(true).build().unwrap())
            .await
            .unwrap();
        assert_eq!(sent.lock().unwrap()[0].headers[AUTHORIZATION], "Bearer bearer-2");
    }

    /// Completes every request on its own thread, `/slow` paths last, and
    /// echoes back what it was handed.
    struct OutOfOrder {
        seen: Arc<Mutex<Vec<PluginRequest>>>,
    }

    impl NativeHttpPlugin for OutOfOrder {
        fn send_request(&self, request: PluginRequest, on_success: OnSuccess, _on_error: OnError) {
            self.seen.lock().unwrap().push(request.clone());
            std::thread::spawn(move || {
                if request.url.ends_with("/slow") {
                    std::thread::sleep(std::time::Duration::from_millis(50));
                }
                let echo = json!({
                    "data": request.data,
                    "headers": request.headers,
                    "serializer": request.serializer,
                });
                on_success(PluginSuccess {
                    status: 200,
                    data: echo.to_string(),
                    headers: Headers::new(),
                });
            });
        }
    }

    fn bridged() -> (HttpService, Arc<Mutex<Vec<PluginRequest>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let plugin = OutOfOrder { seen: seen.clone() };
        (HttpService::new(config(), Arc::new(BridgeAdapter::new(plugin))), seen)
    }

    #[tokio::test]
    async fn url_encoded_post_announces_form_content_to_the_plugin() {
        let (service, seen) = bridged();
        let request = Request::builder()
            .with_type(HttpMethod::Post)
            .with_path("/oauth/token")
            .with_serializer(Serializer::UrlEncoded)
            .with_body(json!({"a": "1", "b": "2"}))
            .build()
            .unwrap();
        service.fetch(request).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].data, json!("a=1&b=2"));
        assert_eq!(header(&seen[0].headers, CONTENT_TYPE), Some(MIME_FORM));
        assert_eq!(seen[0].headers[CHANNEL_ID], "channel-1");
    }

    #[tokio::test]
    async fn concurrent_fetches_keep_their_own_configuration() {
        let (service, seen) = bridged();

        let mut slow_headers = Headers::new();
        slow_headers.insert("X-Trace".to_string(), "slow".to_string());
        let slow = Request::builder()
            .with_type(HttpMethod::Post)
            .with_path("/v1/slow")
            .with_headers(slow_headers)
            .with_body(json!({"kind": "json"}))
            .build()
            .unwrap();

        let mut fast_headers = Headers::new();
        fast_headers.insert("X-Trace".to_string(), "fast".to_string());
        let fast = Request::builder()
            .with_type(HttpMethod::Post)
            .with_path("/v1/fast")
            .with_serializer(Serializer::UrlEncoded)
            .with_headers(fast_headers)
            .with_body(json!({"kind": "form"}))
            .build()
            .unwrap();

        let (slow, fast) = tokio::join!(service.fetch(slow), service.fetch(fast));
        let (slow, fast) = (slow.unwrap(), fast.unwrap());

        assert_eq!(slow.body["data"], json!({"kind": "json"}));
        assert_eq!(slow.body["serializer"], "json");
        assert_eq!(slow.body["headers"]["X-Trace"], "slow");
        assert_eq!(slow.body["headers"][CONTENT_TYPE], MIME_JSON);

        assert_eq!(fast.body["data"], "kind=form");
        assert_eq!(fast.body["serializer"], "urlencoded");
        assert_eq!(fast.body["headers"]["X-Trace"], "fast");
        assert_eq!(fast.body["headers"][CONTENT_TYPE], MIME_FORM);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        for sent in seen.iter() {
            let (trace, serializer) = if sent.url.ends_with("/slow") {
                ("slow", Serializer::Json)
            } else {
                ("fast", Serializer::UrlEncoded)
            };
            assert_eq!(sent.headers["X-Trace"], trace);
            assert_eq!(sent.serializer, serializer);
        }
    }
}
