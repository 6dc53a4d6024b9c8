//! Interceptors that copy already-obtained tokens into request headers.
//!
//! The service synthesises these for requests built with
//! `with_bearer_token(true)` / `with_user_token(true)`. They read the token
//! from [`SharedConfig`] when they run, so a token updated between two calls
//! is picked up by the second one. A missing token leaves the request as is.

use async_trait::async_trait;

use crate::config::SharedConfig;
use crate::error::ApiError;
use crate::http::{AUTHORIZATION, USER_TOKEN};
use crate::interceptor::RequestInterceptor;
use crate::request::Request;

/// Sets `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct BearerTokenInjectRequestInterceptor {
    config: SharedConfig,
}

impl BearerTokenInjectRequestInterceptor {
    pub fn new(config: SharedConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RequestInterceptor for BearerTokenInjectRequestInterceptor {
    async fn intercept_request(&self, mut request: Request) -> Result<Request, ApiError> {
        match self.config.bearer_token() {
            Some(token) => request.set_header(AUTHORIZATION, format!("Bearer {token}")),
            None => tracing::debug!(path = %request.path, "no bearer token configured"),
        }
        Ok(request)
    }
}

/// Sets `X-Authenticated-User-Token: <token>`.
#[derive(Debug, Clone)]
pub struct UserTokenInjectRequestInterceptor {
    config: SharedConfig,
}

impl UserTokenInjectRequestInterceptor {
    pub fn new(config: SharedConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RequestInterceptor for UserTokenInjectRequestInterceptor {
    async fn intercept_request(&self, mut request: Request) -> Result<Request, ApiError> {
        match self.config.user_token() {
            Some(token) => request.set_header(USER_TOKEN, token),
            None => tracing::debug!(path = %request.path, "no user token configured"),
        }
        Ok(request)
    }
}
