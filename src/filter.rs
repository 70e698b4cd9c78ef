//! Bidirectional filter pipeline.
//!
//! Filters see every request after serialization and every response before
//! deserialization. Outbound they run in registration order; inbound they
//! run in reverse, so a filter that wraps data on the way out unwraps it
//! on the way back.

use std::sync::Arc;

use bytes::Bytes;

use crate::context::InvocationContext;

/// A byte-level transform applied around every invocation.
///
/// Filters are infallible: a filter that cannot transform its input should
/// pass it through unchanged or record the problem in the context.
pub trait Filter: Send + Sync {
    /// Transforms an outbound request.
    fn encode(&self, request: Bytes, context: &mut InvocationContext) -> Bytes;

    /// Transforms an inbound response.
    fn decode(&self, response: Bytes, context: &mut InvocationContext) -> Bytes;
}

/// Token identifying a registered filter.
///
/// Returned by [`FilterPipeline::add`] and consumed by
/// [`FilterPipeline::remove`], so the same filter implementation can be
/// registered more than once and removed individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterHandle(u64);

/// Ordered collection of filters.
#[derive(Default)]
pub struct FilterPipeline {
    entries: Vec<(FilterHandle, Arc<dyn Filter>)>,
    next_handle: u64,
}

impl FilterPipeline {
    pub fn new() -> Self {
        FilterPipeline::default()
    }

    /// The first registered filter, if any.
    pub fn first(&self) -> Option<Arc<dyn Filter>> {
        self.entries.first().map(|(_, filter)| Arc::clone(filter))
    }

    /// Replaces the whole pipeline with zero or one filter.
    pub fn set(&mut self, filter: Option<Arc<dyn Filter>>) -> Option<FilterHandle> {
        self.entries.clear();
        filter.map(|f| self.add(f))
    }

    /// Appends a filter and returns its handle.
    pub fn add(&mut self, filter: Arc<dyn Filter>) -> FilterHandle {
        let handle = FilterHandle(self.next_handle);
        self.next_handle += 1;
        self.entries.push((handle, filter));
        handle
    }

    /// Removes the filter registered under `handle`.
    ///
    /// Returns false if the handle was never registered or already removed.
    pub fn remove(&mut self, handle: FilterHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(h, _)| *h != handle);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cheap copy of the current filter list.
    ///
    /// Invocations run against a snapshot so a filter that reconfigures the
    /// client mid-flight cannot deadlock the configuration lock.
    pub(crate) fn snapshot(&self) -> Vec<Arc<dyn Filter>> {
        self.entries
            .iter()
            .map(|(_, filter)| Arc::clone(filter))
            .collect()
    }
}

/// Runs filters over an outbound request in registration order.
pub(crate) fn encode_all(
    filters: &[Arc<dyn Filter>],
    request: Bytes,
    context: &mut InvocationContext,
) -> Bytes {
    filters
        .iter()
        .fold(request, |data, filter| filter.encode(data, context))
}

/// Runs filters over an inbound response in reverse order.
pub(crate) fn decode_all(
    filters: &[Arc<dyn Filter>],
    response: Bytes,
    context: &mut InvocationContext,
) -> Bytes {
    filters
        .iter()
        .rev()
        .fold(response, |data, filter| filter.decode(data, context))
}
