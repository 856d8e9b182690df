//! Testing utilities for Junction.
//!
//! This module provides utilities to make testing middlewares, stacks and
//! handlers easier.
//!
//! # Features
//!
//! - [`OrderLog`] and [`MarkerMiddleware`]: record before/after markers to assert execution order
//! - [`CountingMiddleware`]: counts the calls passing through it
//! - [`RecordingMiddleware`]: records the method names and arguments it sees
//! - [`ShortCircuitMiddleware`]: answers without calling `next`
//! - [`respond_with`]: a terminal step returning a fixed value

use junction_core::{CallContext, Endpoint, MethodResult, Middleware, Next, Params};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

// ============================================================================
// Order Log
// ============================================================================

/// A shared, append-only log of markers.
///
/// # Example
///
/// ```rust,ignore
/// let log = OrderLog::new();
/// let stack = MiddlewareStack::new()
///     .with(MarkerMiddleware::new(log.clone(), 1, 4))
///     .with(MarkerMiddleware::new(log.clone(), 2, 3));
///
/// // ... run a call through the stack ...
///
/// assert_eq!(log.entries(), [1, 2, 3, 4]);
/// ```
pub struct OrderLog<T> {
    entries: Arc<Mutex<Vec<T>>>,
}

impl<T: Clone> OrderLog<T> {
    /// Create an empty log.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Append a marker.
    pub fn push(&self, marker: T) {
        self.entries.lock().push(marker);
    }

    /// Get a copy of the recorded markers.
    pub fn entries(&self) -> Vec<T> {
        self.entries.lock().clone()
    }

    /// Clear all markers.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl<T: Clone> Default for OrderLog<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for OrderLog<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

// ============================================================================
// Marker Middleware
// ============================================================================

/// A middleware that logs one marker before and one after calling `next`.
pub struct MarkerMiddleware<T> {
    log: OrderLog<T>,
    before: T,
    after: T,
}

impl<T> MarkerMiddleware<T> {
    /// Create a marker middleware writing to `log`.
    pub fn new(log: OrderLog<T>, before: T, after: T) -> Self {
        Self { log, before, after }
    }
}

impl<T: Clone + Send + Sync + 'static> Middleware for MarkerMiddleware<T> {
    async fn handle(
        &self,
        ctx: CallContext,
        method: String,
        args: Params,
        next: Next,
    ) -> MethodResult {
        self.log.push(self.before.clone());
        let result = next.run(ctx, method, args).await;
        self.log.push(self.after.clone());
        result
    }
}

// ============================================================================
// Counting Middleware
// ============================================================================

/// A middleware that counts invocations and passes calls through.
///
/// # Example
///
/// ```rust,ignore
/// let counter = CountingMiddleware::new();
/// server.set_middlewares(MiddlewareStack::new().with(counter.clone()));
///
/// server.call(ctx, "test_echo", params).await;
///
/// assert_eq!(counter.count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CountingMiddleware {
    count: Arc<AtomicUsize>,
}

impl CountingMiddleware {
    /// Create a new counting middleware.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current count.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Reset the counter.
    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }
}

impl Middleware for CountingMiddleware {
    async fn handle(
        &self,
        ctx: CallContext,
        method: String,
        args: Params,
        next: Next,
    ) -> MethodResult {
        self.count.fetch_add(1, Ordering::SeqCst);
        next.run(ctx, method, args).await
    }
}

// ============================================================================
// Recording Middleware
// ============================================================================

/// A call observed by a [`RecordingMiddleware`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// The method name as seen by the middleware.
    pub method: String,
    /// The arguments as seen by the middleware.
    pub args: Params,
}

/// A middleware that records every call it sees, then passes it on.
#[derive(Clone, Default)]
pub struct RecordingMiddleware {
    calls: OrderLog<RecordedCall>,
}

impl RecordingMiddleware {
    /// Create a new recording middleware.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the recorded calls.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.entries()
    }

    /// Get the recorded method names.
    pub fn methods(&self) -> Vec<String> {
        self.calls.entries().into_iter().map(|c| c.method).collect()
    }
}

impl Middleware for RecordingMiddleware {
    async fn handle(
        &self,
        ctx: CallContext,
        method: String,
        args: Params,
        next: Next,
    ) -> MethodResult {
        self.calls.push(RecordedCall {
            method: method.clone(),
            args: args.clone(),
        });
        next.run(ctx, method, args).await
    }
}

// ============================================================================
// Short-circuit Middleware
// ============================================================================

/// A middleware that answers every call itself without running `next`.
#[derive(Debug, Clone)]
pub struct ShortCircuitMiddleware {
    result: MethodResult,
}

impl ShortCircuitMiddleware {
    /// Create a middleware that always returns `result`.
    pub fn new(result: MethodResult) -> Self {
        Self { result }
    }
}

impl Middleware for ShortCircuitMiddleware {
    async fn handle(&self, _: CallContext, _: String, _: Params, _: Next) -> MethodResult {
        self.result.clone()
    }
}

// ============================================================================
// Fixed Endpoint
// ============================================================================

/// A terminal step that always succeeds with `value`.
pub fn respond_with(value: Value) -> impl Endpoint {
    move |_ctx: CallContext, _method: String, _args: Params| {
        let value = value.clone();
        async move { MethodResult::ok(value) }
    }
}
