//! Client-side HTTP pipeline shared by every backend API caller.
//!
//! # Overview
//! Callers build a [`Request`] and hand it to [`HttpService::fetch`]. The
//! service attaches the global headers, injects tokens, runs the request
//! interceptors, dispatches through an [`HttpAdapter`], runs the response
//! interceptors over whatever came back, and resolves with the final
//! [`Response`] or an [`ApiError`].
//!
//! # Design
//! - Adapters are stateless per call: headers and serializer are arguments.
//! - Two adapters: [`FetchAdapter`] does the HTTP itself via `reqwest`
//!   (feature `fetch`, on by default); [`BridgeAdapter`] delegates to a
//!   host-owned, callback-based [`NativeHttpPlugin`].
//! - Only 200 counts as success. 401/403 come back from adapters as
//!   responses so interceptors can act on them; the service reports them,
//!   like any other non-200 that survives the interceptors, as
//!   [`ApiError::Unsuccessful`].
//! - [`SdkModule`] is the composition root; there is no global state.

pub mod adapter;
pub mod config;
pub mod encoding;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod module;
pub mod request;
pub mod response;
pub mod service;

#[cfg(feature = "fetch")]
pub use adapter::FetchAdapter;
pub use adapter::{BridgeAdapter, HttpAdapter, NativeHttpPlugin};
pub use config::{ApiConfig, SharedConfig};
pub use error::ApiError;
pub use http::{Headers, HttpMethod, Parameters, Serializer};
pub use interceptor::{RequestInterceptor, ResponseInterceptor};
pub use module::SdkModule;
pub use request::{Request, RequestBuilder, RequestRecord};
pub use response::Response;
pub use service::HttpService;
