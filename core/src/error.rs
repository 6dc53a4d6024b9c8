//! Error types produced by the request pipeline.
//!
//! # Design
//! Four failure kinds come out of building and dispatching a request. Each
//! has a stable [`ApiError::code`] string so callers on the far side of an
//! FFI or logging boundary can discriminate without matching on the enum.
//! `Client` and `Server` keep the response that triggered them.
//!
//! 401 and 403 never become an `ApiError` inside an adapter: they come back
//! as ordinary responses so a response interceptor can react (for example by
//! refreshing a token). The service's final check then reports any response
//! that is still not a 200 as [`ApiError::Unsuccessful`], carrying the
//! response itself unchanged.

use thiserror::Error;

use crate::response::Response;

/// Errors returned by request building, adapters and the HTTP service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// A required request field was missing or malformed.
    #[error("request build failed: {0}")]
    RequestBuild(String),

    /// No HTTP response could be obtained.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered 4xx (other than 401/403).
    #[error("client error: {message}")]
    Client { message: String, response: Response },

    /// The server answered 5xx or an unclassified status.
    #[error("server error: {message}")]
    Server { message: String, response: Response },

    /// The response settled after interceptors without a 200 status.
    #[error("unsuccessful response: HTTP {}", .0.response_code)]
    Unsuccessful(Response),
}

impl ApiError {
    pub const REQUEST_BUILD_ERROR: &'static str = "REQUEST_BUILD_ERROR";
    pub const NETWORK_ERROR: &'static str = "NETWORK_ERROR";
    pub const HTTP_CLIENT_ERROR: &'static str = "HTTP_CLIENT_ERROR";
    pub const HTTP_SERVER_ERROR: &'static str = "HTTP_SERVER_ERROR";
    pub const UNSUCCESSFUL_RESPONSE: &'static str = "UNSUCCESSFUL_RESPONSE";

    /// Stable discriminator for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::RequestBuild(_) => Self::REQUEST_BUILD_ERROR,
            ApiError::Network(_) => Self::NETWORK_ERROR,
            ApiError::Client { .. } => Self::HTTP_CLIENT_ERROR,
            ApiError::Server { .. } => Self::HTTP_SERVER_ERROR,
            ApiError::Unsuccessful(_) => Self::UNSUCCESSFUL_RESPONSE,
        }
    }

    /// The response attached to this error, if the server answered at all.
    pub fn response(&self) -> Option<&Response> {
        match self {
            ApiError::Client { response, .. }
            | ApiError::Server { response, .. }
            | ApiError::Unsuccessful(response) => Some(response),
            ApiError::RequestBuild(_) | ApiError::Network(_) => None,
        }
    }

    pub fn into_response(self) -> Option<Response> {
        match self {
            ApiError::Client { response, .. }
            | ApiError::Server { response, .. }
            | ApiError::Unsuccessful(response) => Some(response),
            ApiError::RequestBuild(_) | ApiError::Network(_) => None,
        }
    }

    /// Only transport failures are worth retrying unchanged; the pipeline
    /// itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}
