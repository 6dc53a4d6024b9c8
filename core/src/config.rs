//! Ambient configuration read by the HTTP service on every call.
//!
//! # Design
//! The values are owned by whoever initialises the SDK and may change later
//! (tokens are refreshed, a user logs in). [`SharedConfig`] is a cheap clone
//! handle; the service and the auth interceptors take a snapshot per call and
//! never cache one across calls.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Values the pipeline injects into every request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    /// Default base URL, used when a request carries no host override.
    pub host: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub device_id: String,
    /// Sent as `X-App-Id`.
    #[serde(default)]
    pub producer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_token: Option<String>,
}

impl ApiConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ApiError> {
        serde_json::from_str(json)
            .map_err(|e| ApiError::RequestBuild(format!("invalid api config: {e}")))
    }

    pub fn with_channel_id(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = channel_id.into();
        self
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = device_id.into();
        self
    }

    pub fn with_producer_id(mut self, producer_id: impl Into<String>) -> Self {
        self.producer_id = producer_id.into();
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_user_token(mut self, token: impl Into<String>) -> Self {
        self.user_token = Some(token.into());
        self
    }
}

/// Shared, updatable handle to an [`ApiConfig`].
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<ApiConfig>>,
}

impl SharedConfig {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Copy of the current values.
    pub fn snapshot(&self) -> ApiConfig {
        self.read().clone()
    }

    pub fn host(&self) -> String {
        self.read().host.clone()
    }

    pub fn bearer_token(&self) -> Option<String> {
        self.read().bearer_token.clone()
    }

    pub fn user_token(&self) -> Option<String> {
        self.read().user_token.clone()
    }

    pub fn set_bearer_token(&self, token: Option<String>) {
        self.write().bearer_token = token;
    }

    pub fn set_user_token(&self, token: Option<String>) {
        self.write().user_token = token;
    }

    pub fn update(&self, f: impl FnOnce(&mut ApiConfig)) {
        f(&mut *self.write());
    }

    // A poisoned lock still holds a consistent config: writers only assign
    // whole fields.
    fn read(&self) -> RwLockReadGuard<'_, ApiConfig> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ApiConfig> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl From<ApiConfig> for SharedConfig {
    fn from(config: ApiConfig) -> Self {
        Self::new(config)
    }
}
