//! Client engine and invocation orchestration.
//!
//! The [`ClientBuilder`] provides a fluent API for configuring the codec,
//! endpoint, and filters. The [`Client`] runs invocations:
//! 1. Serialize the request envelope
//! 2. Run the outbound filter pipeline
//! 3. Exchange bytes through the transport
//! 4. Run the inbound filter pipeline in reverse
//! 5. Scan the response envelope and deliver the outcome
//!
//! # Example
//!
//! ```ignore
//! use callwire_client::{Client, Value};
//! use callwire_client::transport::MemTransport;
//!
//! let client = Client::builder(transport)
//!     .url("pipe:///tmp/calc.sock")
//!     .simple_mode(true)
//!     .build();
//!
//! let sum = client.root().call("add", &[Value::from(1), Value::from(2)])?;
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use bytes::Bytes;
use rmpv::Value;

use crate::codec::{Codec, MsgPackCodec};
use crate::context::InvocationContext;
use crate::error::{CallwireError, Result};
use crate::filter::{decode_all, encode_all, Filter, FilterHandle, FilterPipeline};
use crate::protocol::{parse_response, write_request, CallResult, ResultMode};
use crate::proxy::Proxy;
use crate::transport::Transport;

/// Per-call options.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvokeOptions {
    /// Request argument copy-back from the server.
    pub byref: bool,
    /// How much decoding to apply to the response.
    pub mode: ResultMode,
    /// Overrides the client's simple-mode setting for this call.
    pub simple: Option<bool>,
}

impl InvokeOptions {
    pub fn new() -> Self {
        InvokeOptions::default()
    }

    pub fn byref(mut self, byref: bool) -> Self {
        self.byref = byref;
        self
    }

    pub fn mode(mut self, mode: ResultMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn simple(mut self, simple: bool) -> Self {
        self.simple = Some(simple);
        self
    }
}

/// Completion callback for an asynchronous invocation.
///
/// The shapes differ in how much of the outcome they observe. Errors that
/// a shape cannot observe are escalated to the client's unhandled-error
/// hook instead of being dropped.
pub enum Callback {
    /// Fire-and-forget: runs on successful completion, sees nothing.
    Notify(Box<dyn FnOnce() + Send>),
    /// Sees the result.
    OnResult(Box<dyn FnOnce(CallResult) + Send>),
    /// Sees the result and the (possibly copied-back) arguments.
    OnResultArgs(Box<dyn FnOnce(CallResult, Vec<Value>) + Send>),
    /// Sees everything. The result is `None` when an error is delivered.
    OnResultArgsError(
        Box<dyn FnOnce(Option<CallResult>, Vec<Value>, Option<CallwireError>) + Send>,
    ),
}

impl Callback {
    pub fn notify<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Callback::Notify(Box::new(f))
    }

    pub fn on_result<F>(f: F) -> Self
    where
        F: FnOnce(CallResult) + Send + 'static,
    {
        Callback::OnResult(Box::new(f))
    }

    pub fn on_result_args<F>(f: F) -> Self
    where
        F: FnOnce(CallResult, Vec<Value>) + Send + 'static,
    {
        Callback::OnResultArgs(Box::new(f))
    }

    pub fn on_result_args_error<F>(f: F) -> Self
    where
        F: FnOnce(Option<CallResult>, Vec<Value>, Option<CallwireError>) + Send + 'static,
    {
        Callback::OnResultArgsError(Box::new(f))
    }
}

/// Receives errors no callback shape could observe.
pub type UnhandledErrorHook = Box<dyn Fn(&str, &CallwireError) + Send + Sync>;

/// Shared, transport-independent client state.
///
/// Configuration is "configure then use": setters take effect for calls
/// that start after them, and calls already in flight keep the snapshot
/// they started with.
pub struct ClientCore {
    url: RwLock<String>,
    filters: RwLock<FilterPipeline>,
    simple: AtomicBool,
    codec: Arc<dyn Codec>,
    unhandled: RwLock<Option<UnhandledErrorHook>>,
}

impl ClientCore {
    pub(crate) fn new(url: String, codec: Arc<dyn Codec>, simple: bool, filters: FilterPipeline) -> Self {
        ClientCore {
            url: RwLock::new(url),
            filters: RwLock::new(filters),
            simple: AtomicBool::new(simple),
            codec,
            unhandled: RwLock::new(None),
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Arc<Self> {
        Arc::new(ClientCore::new(
            String::new(),
            Arc::new(MsgPackCodec),
            true,
            FilterPipeline::new(),
        ))
    }

    /// The configured endpoint URL.
    pub fn url(&self) -> String {
        self.url.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set_url(&self, url: impl Into<String>) {
        *self.url.write().unwrap_or_else(PoisonError::into_inner) = url.into();
    }

    /// Whether requests default to simple payloads.
    pub fn simple_mode(&self) -> bool {
        self.simple.load(Ordering::Relaxed)
    }

    pub fn set_simple_mode(&self, simple: bool) {
        self.simple.store(simple, Ordering::Relaxed);
    }

    /// The first registered filter, if any.
    pub fn filter(&self) -> Option<Arc<dyn Filter>> {
        self.filters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .first()
    }

    /// Replaces the whole pipeline with zero or one filter.
    pub fn set_filter(&self, filter: Option<Arc<dyn Filter>>) -> Option<FilterHandle> {
        self.filters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set(filter)
    }

    /// Appends a filter, returning a handle for later removal.
    pub fn add_filter(&self, filter: Arc<dyn Filter>) -> FilterHandle {
        self.filters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add(filter)
    }

    /// Removes a filter by handle. Returns false for unknown handles.
    pub fn remove_filter(&self, handle: FilterHandle) -> bool {
        self.filters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(handle)
    }

    /// Installs the hook that receives otherwise-unobservable errors.
    pub fn set_unhandled_error_hook(&self, hook: Option<UnhandledErrorHook>) {
        *self.unhandled.write().unwrap_or_else(PoisonError::into_inner) = hook;
    }

    pub(crate) fn escalate(&self, name: &str, error: &CallwireError) {
        let hook = self.unhandled.read().unwrap_or_else(PoisonError::into_inner);
        match hook.as_ref() {
            Some(hook) => hook(name, error),
            None => tracing::error!("unhandled error invoking '{}': {}", name, error),
        }
    }

    fn filter_snapshot(&self) -> Vec<Arc<dyn Filter>> {
        self.filters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    /// Builds and filters the outbound request.
    pub(crate) fn do_output(
        &self,
        name: &str,
        args: &[Value],
        options: InvokeOptions,
        context: &mut InvocationContext,
    ) -> Result<Bytes> {
        let simple = options.simple.unwrap_or_else(|| self.simple_mode());
        let request = write_request(self.codec.as_ref(), name, args, options.byref, simple)?;
        tracing::debug!("request for '{}': {} bytes", name, request.len());
        let filters = self.filter_snapshot();
        Ok(encode_all(&filters, Bytes::from(request), context))
    }

    /// Unfilters and scans the inbound response.
    pub(crate) fn do_input(
        &self,
        response: Bytes,
        args: &mut [Value],
        options: InvokeOptions,
        context: &mut InvocationContext,
    ) -> Result<CallResult> {
        let filters = self.filter_snapshot();
        let response = decode_all(&filters, response, context);
        parse_response(self.codec.as_ref(), &response, args, options.mode)
    }
}

/// Client for a callwire server.
///
/// Cloning is cheap and all clones share configuration. Method namespaces
/// are navigated through [`Client::root`] and [`Proxy::extend`].
pub struct Client<T: Transport> {
    core: Arc<ClientCore>,
    transport: Arc<T>,
}

impl<T: Transport> Clone for Client<T> {
    fn clone(&self) -> Self {
        Client {
            core: Arc::clone(&self.core),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport> Client<T> {
    /// Creates a client with the default codec and no filters.
    pub fn new(transport: T, url: impl Into<String>) -> Self {
        Client::builder(transport).url(url).build()
    }

    /// Starts building a client around `transport`.
    pub fn builder(transport: T) -> ClientBuilder<T> {
        ClientBuilder::new(transport)
    }

    /// The shared configuration core.
    pub fn core(&self) -> &Arc<ClientCore> {
        &self.core
    }

    /// A proxy rooted at the empty namespace.
    pub fn root(&self) -> Proxy<T> {
        Proxy::new(self.clone(), String::new())
    }

    /// Points the client at a service, optionally rebasing the namespace.
    ///
    /// An empty `url` keeps the current endpoint. The returned proxy is
    /// rooted at `namespace` when one is given.
    pub fn use_service(&self, url: &str, namespace: Option<&str>) -> Proxy<T> {
        if !url.is_empty() {
            self.core.set_url(url);
        }
        let prefix = match namespace {
            Some(ns) if !ns.is_empty() => format!("{ns}{}", crate::proxy::SEPARATOR),
            _ => String::new(),
        };
        Proxy::new(self.clone(), prefix)
    }

    pub fn set_unhandled_error_hook(&self, hook: Option<UnhandledErrorHook>) {
        self.core.set_unhandled_error_hook(hook);
    }

    pub fn url(&self) -> String {
        self.core.url()
    }

    pub fn set_url(&self, url: impl Into<String>) {
        self.core.set_url(url);
    }

    pub fn simple_mode(&self) -> bool {
        self.core.simple_mode()
    }

    pub fn set_simple_mode(&self, simple: bool) {
        self.core.set_simple_mode(simple);
    }

    /// See [`ClientCore::filter`].
    pub fn filter(&self) -> Option<Arc<dyn Filter>> {
        self.core.filter()
    }

    /// See [`ClientCore::set_filter`].
    pub fn set_filter(&self, filter: Option<Arc<dyn Filter>>) -> Option<FilterHandle> {
        self.core.set_filter(filter)
    }

    /// See [`ClientCore::add_filter`].
    pub fn add_filter(&self, filter: Arc<dyn Filter>) -> FilterHandle {
        self.core.add_filter(filter)
    }

    /// See [`ClientCore::remove_filter`].
    pub fn remove_filter(&self, handle: FilterHandle) -> bool {
        self.core.remove_filter(handle)
    }

    /// Invokes `name` synchronously.
    ///
    /// `args` is updated in place when the server copies arguments back.
    pub fn invoke(
        &self,
        name: &str,
        args: &mut [Value],
        options: InvokeOptions,
    ) -> Result<CallResult> {
        let mut context = InvocationContext::new(Arc::clone(&self.core));
        let request = self.core.do_output(name, args, options, &mut context)?;
        let response = self.transport.send_and_receive(request)?;
        self.core.do_input(response, args, options, &mut context)
    }

    /// Invokes `name` asynchronously, delivering the outcome to `callback`.
    ///
    /// Never fails at the call site: serialization and transport errors are
    /// delivered through the callback, or escalated to the unhandled-error
    /// hook when the callback shape cannot observe them.
    pub fn invoke_async(
        &self,
        name: &str,
        args: Vec<Value>,
        options: InvokeOptions,
        callback: Callback,
    ) {
        let core = Arc::clone(&self.core);
        let mut context = InvocationContext::new(Arc::clone(&self.core));
        let request = match core.do_output(name, &args, options, &mut context) {
            Ok(request) => request,
            Err(err) => {
                dispatch(&core, name, Err(err), args, options, context, callback);
                return;
            }
        };

        let name = name.to_string();
        self.transport.async_send_and_receive(
            request,
            Box::new(move |outcome| {
                dispatch(&core, &name, outcome, args, options, context, callback);
            }),
        );
    }
}

/// Routes an async outcome into the callback shape.
fn dispatch(
    core: &Arc<ClientCore>,
    name: &str,
    outcome: Result<Bytes>,
    mut args: Vec<Value>,
    options: InvokeOptions,
    mut context: InvocationContext,
    callback: Callback,
) {
    match callback {
        Callback::OnResultArgsError(f) => {
            let outcome = outcome
                .and_then(|response| core.do_input(response, &mut args, options, &mut context));
            match outcome {
                Ok(result) => f(Some(result), args, None),
                Err(err) => f(None, args, Some(err)),
            }
        }
        Callback::OnResultArgs(f) => {
            if let Some(result) = settle(core, name, outcome, &mut args, options, &mut context) {
                f(result, args);
            }
        }
        Callback::OnResult(f) => {
            if let Some(result) = settle(core, name, outcome, &mut args, options, &mut context) {
                f(result);
            }
        }
        Callback::Notify(f) => {
            if settle(core, name, outcome, &mut args, options, &mut context).is_some() {
                f();
            }
        }
    }
}

/// Finishes response processing, escalating errors the shape cannot see.
fn settle(
    core: &Arc<ClientCore>,
    name: &str,
    outcome: Result<Bytes>,
    args: &mut [Value],
    options: InvokeOptions,
    context: &mut InvocationContext,
) -> Option<CallResult> {
    match outcome.and_then(|response| core.do_input(response, args, options, context)) {
        Ok(result) => Some(result),
        Err(err) => {
            core.escalate(name, &err);
            None
        }
    }
}

/// Builder for configuring and creating a [`Client`].
pub struct ClientBuilder<T: Transport> {
    transport: T,
    url: String,
    codec: Arc<dyn Codec>,
    simple: bool,
    filters: FilterPipeline,
}

impl<T: Transport> ClientBuilder<T> {
    pub fn new(transport: T) -> Self {
        ClientBuilder {
            transport,
            url: String::new(),
            codec: Arc::new(MsgPackCodec),
            simple: false,
            filters: FilterPipeline::new(),
        }
    }

    /// Sets the endpoint URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Swaps the serialization codec.
    pub fn codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    /// Defaults every call to simple payloads.
    pub fn simple_mode(mut self, simple: bool) -> Self {
        self.simple = simple;
        self
    }

    /// Appends a filter to the pipeline.
    pub fn filter(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filters.add(filter);
        self
    }

    pub fn build(self) -> Client<T> {
        Client {
            core: Arc::new(ClientCore::new(
                self.url,
                self.codec,
                self.simple,
                self.filters,
            )),
            transport: Arc::new(self.transport),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::tags;
    use crate::transport::MemTransport;

    fn result_response(value: &Value) -> Bytes {
        let mut bytes = vec![tags::TAG_RESULT];
        rmpv::encode::write_value(&mut bytes, value).unwrap();
        bytes.push(tags::TAG_END);
        Bytes::from(bytes)
    }

    #[test]
    fn test_builder_defaults() {
        let client = Client::builder(MemTransport::new(|_| Ok(Bytes::from_static(b"z"))))
            .url("mem://test")
            .build();
        assert_eq!(client.core().url(), "mem://test");
        assert!(!client.core().simple_mode());
    }

    #[test]
    fn test_invoke_decodes_result() {
        let client = Client::builder(MemTransport::new(|_| {
            Ok(result_response(&Value::from(7)))
        }))
        .build();

        let result = client
            .invoke("seven", &mut [], InvokeOptions::new())
            .unwrap();
        assert_eq!(result, CallResult::Value(Value::from(7)));
    }

    #[test]
    fn test_invoke_surfaces_transport_error() {
        let client = Client::builder(MemTransport::new(|_| {
            Err(CallwireError::Transport("down".into()))
        }))
        .build();

        let err = client
            .invoke("x", &mut [], InvokeOptions::new())
            .unwrap_err();
        assert!(matches!(err, CallwireError::Transport(_)));
    }

    #[test]
    fn test_use_service_rebases_url_and_namespace() {
        let client = Client::builder(MemTransport::new(|_| Ok(Bytes::from_static(b"z"))))
            .url("mem://old")
            .build();

        let proxy = client.use_service("mem://new", Some("math"));
        assert_eq!(client.core().url(), "mem://new");
        assert_eq!(proxy.prefix(), "math_");

        let proxy = client.use_service("", None);
        assert_eq!(client.core().url(), "mem://new");
        assert_eq!(proxy.prefix(), "");
    }

    #[test]
    fn test_invoke_async_notify_runs() {
        let client = Client::builder(MemTransport::new(|_| Ok(Bytes::from_static(b"z")))).build();

        let (tx, rx) = std::sync::mpsc::channel();
        client.invoke_async(
            "ping",
            Vec::new(),
            InvokeOptions::new(),
            Callback::notify(move || {
                tx.send(()).unwrap();
            }),
        );
        rx.try_recv().unwrap();
    }

    #[test]
    fn test_invoke_async_error_escalates_for_low_shapes() {
        let client = Client::builder(MemTransport::new(|_| {
            Err(CallwireError::Transport("down".into()))
        }))
        .build();

        let (tx, rx) = std::sync::mpsc::channel();
        client.set_unhandled_error_hook(Some(Box::new(move |name, error| {
            tx.send((name.to_string(), error.to_string())).unwrap();
        })));

        client.invoke_async(
            "ping",
            Vec::new(),
            InvokeOptions::new(),
            Callback::on_result(|_| panic!("must not deliver a result")),
        );

        let (name, error) = rx.try_recv().unwrap();
        assert_eq!(name, "ping");
        assert!(error.contains("down"));
    }
}
