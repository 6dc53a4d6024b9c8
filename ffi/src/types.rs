//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! enums with explicit discriminants. Structured values (config, request
//! records, response bodies) cross the boundary as JSON text. Conversion
//! functions live here to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;

use csdk_core::adapter::{OnError, OnSuccess, PluginRequest};
use csdk_core::{ApiError, HttpMethod, Response, SdkModule, Serializer};

/// Opaque handle to an SDK instance. C callers receive a pointer to this and
/// pass it back into every FFI function.
pub struct FfiHttpService {
    pub(crate) module: SdkModule,
    pub(crate) runtime: tokio::runtime::Runtime,
}

// ---------------------------------------------------------------------------
// Host transport
// ---------------------------------------------------------------------------

/// Called once per request. The host must eventually pass `completion` to
/// `csdk_complete` exactly once, from any thread. `request` is only valid for
/// the duration of the call.
pub type FfiSendRequestFn = extern "C" fn(
    ctx: *mut c_void,
    request: *const FfiPluginRequest,
    completion: *mut FfiCompletion,
);

/// Host-provided HTTP stack.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct FfiHostTransport {
    pub ctx: *mut c_void,
    pub send_request: Option<FfiSendRequestFn>,
}

/// Pending callbacks of one in-flight request. Consumed by `csdk_complete`.
pub struct FfiCompletion {
    pub(crate) on_success: OnSuccess,
    pub(crate) on_error: OnError,
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Patch = 2,
    Delete = 3,
    Put = 4,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Patch => FfiHttpMethod::Patch,
            HttpMethod::Delete => FfiHttpMethod::Delete,
            HttpMethod::Put => FfiHttpMethod::Put,
        }
    }
}

/// How the host should encode `FfiPluginRequest::data`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiSerializer {
    Json = 0,
    UrlEncoded = 1,
    Utf8 = 2,
    Raw = 3,
}

impl From<Serializer> for FfiSerializer {
    fn from(s: Serializer) -> Self {
        match s {
            Serializer::Json => FfiSerializer::Json,
            Serializer::UrlEncoded => FfiSerializer::UrlEncoded,
            Serializer::Utf8 => FfiSerializer::Utf8,
            Serializer::Raw => FfiSerializer::Raw,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// A request handed to the host transport.
///
/// `url` carries no query string. For GET and DELETE, `data` is a JSON object
/// of query parameters. For body methods, `data` is the body: a JSON
/// document, or a JSON string holding an already encoded payload.
#[repr(C)]
pub struct FfiPluginRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub data: *mut c_char,
    pub serializer: FfiSerializer,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
}

impl FfiPluginRequest {
    pub(crate) fn from_core(req: &PluginRequest) -> Self {
        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Vec<FfiHeader> = req
                .headers
                .iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            // Length equals capacity once boxed, so `Drop` can rebuild it.
            Box::into_raw(ffi_headers.into_boxed_slice()) as *mut FfiHeader
        };

        FfiPluginRequest {
            method: req.method.into(),
            url: c_string(&req.url),
            data: c_string(&req.data.to_string()),
            serializer: req.serializer.into(),
            headers,
            headers_len,
        }
    }
}

impl Drop for FfiPluginRequest {
    fn drop(&mut self) {
        free_c_string(self.url);
        free_c_string(self.data);
        if !self.headers.is_null() && self.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    self.headers,
                    self.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                free_c_string(h.key);
                free_c_string(h.value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiFetchResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    NullArg = 1,
    RequestBuild = 2,
    Network = 3,
    HttpClient = 4,
    HttpServer = 5,
    Unsuccessful = 6,
    Panic = 7,
}

/// Result envelope for `csdk_fetch`.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `body` is
/// the response body as JSON text. Errors that carry a response (client,
/// server, unsuccessful) also fill `response_code` and `body`; the others
/// leave `body` null and `response_code` 0.
#[repr(C)]
pub struct FfiFetchResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub response_code: u16,
    pub body: *mut c_char,
}

impl FfiFetchResult {
    pub(crate) fn ok(response: Response) -> *mut Self {
        Box::into_raw(Box::new(FfiFetchResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            response_code: response.response_code,
            body: c_string(&response.body.to_string()),
        }))
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let error_code = match &err {
            ApiError::RequestBuild(_) => FfiErrorCode::RequestBuild,
            ApiError::Network(_) => FfiErrorCode::Network,
            ApiError::Client { .. } => FfiErrorCode::HttpClient,
            ApiError::Server { .. } => FfiErrorCode::HttpServer,
            ApiError::Unsuccessful(_) => FfiErrorCode::Unsuccessful,
        };
        let (response_code, body) = match err.response() {
            Some(response) => (response.response_code, c_string(&response.body.to_string())),
            None => (0, std::ptr::null_mut()),
        };
        Box::into_raw(Box::new(FfiFetchResult {
            error_code,
            error_message: c_string(&err.to_string()),
            response_code,
            body,
        }))
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, &format!("null argument: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, msg)
    }

    fn failure(error_code: FfiErrorCode, msg: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiFetchResult {
            error_code,
            error_message: c_string(msg),
            response_code: 0,
            body: std::ptr::null_mut(),
        }))
    }
}

// ---------------------------------------------------------------------------
// String helpers
// ---------------------------------------------------------------------------

/// Heap-allocated C copy of `s`. Interior NULs would truncate the string on
/// the C side, so such strings become empty.
pub(crate) fn c_string(s: &str) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

pub(crate) fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Borrow a C string as UTF-8. `None` for null or invalid UTF-8.
///
/// # Safety
/// `s` must be null or point to a NUL-terminated string that outlives `'a`.
pub(crate) unsafe fn read_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(s) }.to_str().ok()
}
