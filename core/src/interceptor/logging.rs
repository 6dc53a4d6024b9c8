//! Optional interceptors that trace traffic through `tracing`.
//!
//! The pipeline itself never logs failures; register these globally (or on a
//! single request) to get one event per request and one per settled outcome.

use async_trait::async_trait;
use tracing::Level;

use crate::error::ApiError;
use crate::interceptor::{RequestInterceptor, ResponseInterceptor};
use crate::request::Request;
use crate::response::Response;

/// Emits one event per outgoing request.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingRequestInterceptor {
    include_headers: bool,
}

impl LoggingRequestInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also record header names (never values).
    pub fn with_header_names(mut self) -> Self {
        self.include_headers = true;
        self
    }
}

#[async_trait]
impl RequestInterceptor for LoggingRequestInterceptor {
    async fn intercept_request(&self, request: Request) -> Result<Request, ApiError> {
        if self.include_headers {
            let names: Vec<&str> = request.headers.keys().map(String::as_str).collect();
            tracing::info!(
                method = %request.method,
                path = %request.path,
                headers = ?names,
                "sending request"
            );
        } else {
            tracing::info!(method = %request.method, path = %request.path, "sending request");
        }
        Ok(request)
    }
}

/// Emits one event per settled outcome; errors are passed on untouched.
#[derive(Debug, Clone, Copy)]
pub struct LoggingResponseInterceptor {
    error_level: Level,
}

impl Default for LoggingResponseInterceptor {
    fn default() -> Self {
        Self {
            error_level: Level::WARN,
        }
    }
}

impl LoggingResponseInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Level used for failed outcomes. Defaults to `WARN`.
    pub fn with_error_level(mut self, level: Level) -> Self {
        self.error_level = level;
        self
    }
}

#[async_trait]
impl ResponseInterceptor for LoggingResponseInterceptor {
    async fn intercept_response(
        &self,
        request: &Request,
        response: Response,
    ) -> Result<Response, ApiError> {
        tracing::info!(
            method = %request.method,
            path = %request.path,
            status = response.response_code,
            "received response"
        );
        Ok(response)
    }

    async fn intercept_error(
        &self,
        request: &Request,
        error: &ApiError,
    ) -> Result<Option<Response>, ApiError> {
        let method = request.method;
        let path = request.path.as_str();
        let code = error.code();
        let status = error.response().map(|r| r.response_code);
        // tracing macros need a constant level.
        match self.error_level {
            Level::ERROR => {
                tracing::error!(%method, path, code, ?status, "request failed")
            }
            Level::INFO => {
                tracing::info!(%method, path, code, ?status, "request failed")
            }
            Level::DEBUG | Level::TRACE => {
                tracing::debug!(%method, path, code, ?status, "request failed")
            }
            _ => {
                tracing::warn!(%method, path, code, ?status, "request failed")
            }
        }
        Ok(None)
    }
}
