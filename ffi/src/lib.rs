//! C-ABI wrapper around `csdk-core`.
//!
//! # Overview
//! Exposes the HTTP pipeline through `extern "C"` functions so a host
//! application that owns the network stack (a mobile or desktop shell) can
//! run requests through the shared interceptor chain and error taxonomy.
//! The host plugs its stack in as an [`FfiHostTransport`]; the core's bridge
//! adapter calls it for every request and waits for `csdk_complete`.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Config and requests cross as JSON text (`ApiConfig`, `RequestRecord`);
//!   the response body comes back as JSON text in an `FfiFetchResult`.
//! - `csdk_fetch` blocks the calling thread on a service-owned
//!   current-thread runtime. It must not be called from inside the host's
//!   `send_request` callback.
//! - The C caller owns all returned pointers and must call the matching
//!   `csdk_*_free` function to release them.

pub mod types;
mod transport;

use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use csdk_core::adapter::{PluginFailure, PluginSuccess};
use csdk_core::{ApiConfig, Headers, Request, SdkModule};

use transport::HostPlugin;
use types::*;

// ---------------------------------------------------------------------------
// Service lifecycle
// ---------------------------------------------------------------------------

/// Create an SDK instance from a JSON `ApiConfig` and a host transport.
///
/// Returns null if `config_json` is null or invalid, if
/// `transport.send_request` is null, or if an internal panic occurs.
/// The caller must free the returned pointer with `csdk_service_free`.
#[unsafe(no_mangle)]
pub extern "C" fn csdk_service_new(
    config_json: *const c_char,
    transport: FfiHostTransport,
) -> *mut FfiHttpService {
    catch_unwind(|| {
        let Some(json) = (unsafe { read_str(config_json) }) else {
            return std::ptr::null_mut();
        };
        let config = match ApiConfig::from_json(json) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "rejected sdk config");
                return std::ptr::null_mut();
            }
        };
        let Some(plugin) = HostPlugin::new(transport) else {
            return std::ptr::null_mut();
        };
        let runtime = match tokio::runtime::Builder::new_current_thread().build() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::warn!(error = %e, "cannot start runtime");
                return std::ptr::null_mut();
            }
        };
        let module = SdkModule::with_native_plugin(config, plugin);
        Box::into_raw(Box::new(FfiHttpService { module, runtime }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a service created by `csdk_service_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn csdk_service_free(service: *mut FfiHttpService) {
    if !service.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(service) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// Replace the bearer token. A null `token` clears it. Returns false if
/// `service` is null or `token` is not valid UTF-8.
#[unsafe(no_mangle)]
pub extern "C" fn csdk_set_bearer_token(
    service: *const FfiHttpService,
    token: *const c_char,
) -> bool {
    update_token(service, token, |module, token| module.set_bearer_token(token))
}

/// Replace the user token. A null `token` clears it. Returns false if
/// `service` is null or `token` is not valid UTF-8.
#[unsafe(no_mangle)]
pub extern "C" fn csdk_set_user_token(
    service: *const FfiHttpService,
    token: *const c_char,
) -> bool {
    update_token(service, token, |module, token| module.set_user_token(token))
}

fn update_token(
    service: *const FfiHttpService,
    token: *const c_char,
    apply: impl Fn(&SdkModule, Option<String>),
) -> bool {
    catch_unwind(AssertUnwindSafe(|| {
        if service.is_null() {
            return false;
        }
        let service = unsafe { &*service };
        let token = if token.is_null() {
            None
        } else {
            match unsafe { read_str(token) } {
                Some(token) => Some(token.to_string()),
                None => return false,
            }
        };
        apply(&service.module, token);
        true
    }))
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Fetch
// ---------------------------------------------------------------------------

/// Run a request, given as a JSON `RequestRecord`, through the pipeline.
///
/// Never returns null. The caller must free the result with
/// `csdk_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn csdk_fetch(
    service: *const FfiHttpService,
    request_json: *const c_char,
) -> *mut FfiFetchResult {
    catch_unwind(AssertUnwindSafe(|| {
        if service.is_null() {
            return FfiFetchResult::null_arg("service");
        }
        if request_json.is_null() {
            return FfiFetchResult::null_arg("request_json");
        }
        let service = unsafe { &*service };
        let Some(json) = (unsafe { read_str(request_json) }) else {
            return FfiFetchResult::from_error(csdk_core::ApiError::RequestBuild(
                "request is not valid UTF-8".to_string(),
            ));
        };
        let request = match Request::from_json(json) {
            Ok(request) => request,
            Err(e) => return FfiFetchResult::from_error(e),
        };
        let http = service.module.http_service();
        match service.runtime.block_on(http.fetch(request)) {
            Ok(response) => FfiFetchResult::ok(response),
            Err(e) => FfiFetchResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiFetchResult::panic("panic in csdk_fetch"))
}

/// Settle an in-flight request. Consumes `completion`; calling this twice
/// with the same pointer is undefined behavior.
///
/// `is_error` selects the error callback. `status` 0 on either path means no
/// response was received. `data` is the raw response body (or error text) and
/// may be null. `headers_json` is an optional JSON object of response headers.
#[unsafe(no_mangle)]
pub extern "C" fn csdk_complete(
    completion: *mut FfiCompletion,
    status: u16,
    data: *const c_char,
    headers_json: *const c_char,
    is_error: bool,
) {
    if completion.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let completion = unsafe { Box::from_raw(completion) };
        let data = unsafe { read_str(data) }.unwrap_or_default().to_string();
        let headers: Headers = unsafe { read_str(headers_json) }
            .and_then(|json| serde_json::from_str(json).ok())
            .unwrap_or_default();

        if is_error {
            (completion.on_error)(PluginFailure {
                status,
                error: data,
                headers,
            });
        } else {
            (completion.on_success)(PluginSuccess {
                status,
                data,
                headers,
            });
        }
    }));
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiFetchResult`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn csdk_free_result(result: *mut FfiFetchResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        free_c_string(result.body);
    });
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
