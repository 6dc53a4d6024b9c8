//! Request and response interceptors and the ordered chains that run them.
//!
//! # Design
//! Interceptors are two separate capabilities. A [`RequestInterceptor`] takes
//! the request by value and returns the one to send next. A
//! [`ResponseInterceptor`] sees the settled outcome of the dispatch: a
//! response through [`ResponseInterceptor::intercept_response`], or an
//! error through [`ResponseInterceptor::intercept_error`], which may recover
//! by producing a response.
//!
//! Both chains run strictly in sequence. An error raised by any interceptor
//! ends its chain at once. An error arriving from the dispatch instead
//! travels through every interceptor's `intercept_error`, each of which may
//! pass it on, recover from it, or raise its own error in its place.

pub mod auth;
pub mod logging;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::request::Request;
use crate::response::Response;

pub use auth::{BearerTokenInjectRequestInterceptor, UserTokenInjectRequestInterceptor};
pub use logging::{LoggingRequestInterceptor, LoggingResponseInterceptor};

#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    async fn intercept_request(&self, request: Request) -> Result<Request, ApiError>;
}

#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    async fn intercept_response(
        &self,
        request: &Request,
        response: Response,
    ) -> Result<Response, ApiError>;

    /// Called instead of `intercept_response` when the dispatch failed.
    ///
    /// `Ok(None)` passes `error` on to the next interceptor and `Ok(Some(_))`
    /// recovers the call. `Err(_)` raises a new error and ends the chain.
    async fn intercept_error(
        &self,
        _request: &Request,
        _error: &ApiError,
    ) -> Result<Option<Response>, ApiError> {
        Ok(None)
    }
}

/// Plain functions and closures work as request interceptors.
#[async_trait]
impl<F> RequestInterceptor for F
where
    F: Fn(Request) -> Result<Request, ApiError> + Send + Sync,
{
    async fn intercept_request(&self, request: Request) -> Result<Request, ApiError> {
        self(request)
    }
}

/// Run `interceptors` in order, feeding each one's output to the next.
pub async fn run_request_chain(
    interceptors: &[Arc<dyn RequestInterceptor>],
    mut request: Request,
) -> Result<Request, ApiError> {
    for interceptor in interceptors {
        request = interceptor.intercept_request(request).await?;
    }
    Ok(request)
}

/// Run `interceptors` in order over the settled outcome of a dispatch.
pub async fn run_response_chain(
    interceptors: &[Arc<dyn ResponseInterceptor>],
    request: &Request,
    outcome: Result<Response, ApiError>,
) -> Result<Response, ApiError> {
    let mut outcome = outcome;
    for interceptor in interceptors {
        outcome = match outcome {
            Ok(response) => Ok(interceptor.intercept_response(request, response).await?),
            Err(error) => match interceptor.intercept_error(request, &error).await? {
                Some(recovered) => Ok(recovered),
                None => Err(error),
            },
        };
    }
    outcome
}
