//! Adapts a C host transport to the core's `NativeHttpPlugin`.

use csdk_core::adapter::{OnError, OnSuccess, PluginRequest};
use csdk_core::NativeHttpPlugin;

use crate::types::{FfiCompletion, FfiHostTransport, FfiPluginRequest, FfiSendRequestFn};

pub(crate) struct HostPlugin {
    ctx: *mut std::ffi::c_void,
    send_request: FfiSendRequestFn,
}

// The host guarantees `ctx` may be used from whichever thread calls
// `send_request`.
unsafe impl Send for HostPlugin {}
unsafe impl Sync for HostPlugin {}

impl HostPlugin {
    pub(crate) fn new(transport: FfiHostTransport) -> Option<Self> {
        Some(Self {
            ctx: transport.ctx,
            send_request: transport.send_request?,
        })
    }
}

impl NativeHttpPlugin for HostPlugin {
    fn send_request(&self, request: PluginRequest, on_success: OnSuccess, on_error: OnError) {
        let ffi_request = FfiPluginRequest::from_core(&request);
        let completion = Box::into_raw(Box::new(FfiCompletion { on_success, on_error }));

        // `extern "C"` callees cannot unwind into us; a panic there aborts.
        (self.send_request)(self.ctx, &ffi_request, completion);
    }
}
