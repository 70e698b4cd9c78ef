//! Blocking-to-callback transport adapter.

use std::sync::Arc;

use bytes::Bytes;
use tokio::runtime::Handle;

use crate::error::Result;
use crate::transport::{ResponseHandler, Transport};

/// Adapts a blocking transport to the callback invocation style.
///
/// The blocking send runs on the runtime's blocking thread pool via
/// `spawn_blocking`, and the completion callback fires on that worker
/// thread once the response arrives. The blocking style passes straight
/// through to the inner transport.
pub struct AsyncBridge<T> {
    inner: Arc<T>,
    runtime: Handle,
}

impl<T: Transport> AsyncBridge<T> {
    /// Wraps `inner` using the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime. Use
    /// [`AsyncBridge::with_handle`] to supply one explicitly.
    pub fn new(inner: T) -> Self {
        AsyncBridge::with_handle(inner, Handle::current())
    }

    pub fn with_handle(inner: T, runtime: Handle) -> Self {
        AsyncBridge {
            inner: Arc::new(inner),
            runtime,
        }
    }
}

impl<T: Transport> Transport for AsyncBridge<T> {
    fn send_and_receive(&self, request: Bytes) -> Result<Bytes> {
        self.inner.send_and_receive(request)
    }

    fn async_send_and_receive(&self, request: Bytes, on_response: ResponseHandler) {
        let inner = Arc::clone(&self.inner);
        self.runtime.spawn_blocking(move || {
            on_response(inner.send_and_receive(request));
        });
    }
}
