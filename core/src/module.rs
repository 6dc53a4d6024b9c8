//! Composition root: wires config, adapter and service together explicitly.

use std::sync::Arc;

use crate::adapter::{BridgeAdapter, HttpAdapter, NativeHttpPlugin};
use crate::config::{ApiConfig, SharedConfig};
use crate::interceptor::{RequestInterceptor, ResponseInterceptor};
use crate::service::HttpService;

/// Owns the shared config and the [`HttpService`] built on it.
#[derive(Debug, Clone)]
pub struct SdkModule {
    config: SharedConfig,
    http: HttpService,
}

impl SdkModule {
    /// Service over the in-process `reqwest` adapter.
    #[cfg(feature = "fetch")]
    pub fn init(config: ApiConfig) -> Result<Self, crate::error::ApiError> {
        let adapter = crate::adapter::FetchAdapter::new()?;
        Ok(Self::with_adapter(config, Arc::new(adapter)))
    }

    /// Service over a host-provided native HTTP plugin.
    pub fn with_native_plugin(config: ApiConfig, plugin: impl NativeHttpPlugin + 'static) -> Self {
        Self::with_adapter(config, Arc::new(BridgeAdapter::new(plugin)))
    }

    pub fn with_adapter(config: ApiConfig, adapter: Arc<dyn HttpAdapter>) -> Self {
        let config = SharedConfig::new(config);
        tracing::debug!(host = %config.host(), "sdk module initialised");
        let http = HttpService::new(config.clone(), adapter);
        Self { config, http }
    }

    /// Register a global request interceptor.
    pub fn with_request_interceptor(
        mut self,
        interceptor: impl RequestInterceptor + 'static,
    ) -> Self {
        self.http = self.http.with_request_interceptor(interceptor);
        self
    }

    /// Register a global response interceptor.
    pub fn with_response_interceptor(
        mut self,
        interceptor: impl ResponseInterceptor + 'static,
    ) -> Self {
        self.http = self.http.with_response_interceptor(interceptor);
        self
    }

    pub fn http_service(&self) -> &HttpService {
        &self.http
    }

    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    pub fn set_bearer_token(&self, token: Option<String>) {
        self.config.set_bearer_token(token);
    }

    pub fn set_user_token(&self, token: Option<String>) {
        self.config.set_user_token(token);
    }
}
