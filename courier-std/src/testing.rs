//! Testing utilities for Courier.
//!
//! Handlers and behaviors that record what happened to them, so tests can
//! assert on invocation counts and ordering.
//!
//! # Features
//!
//! - [`Journal`]: A shared, ordered log of labels
//! - [`JournalBehavior`]: A pipeline behavior that logs before and after `next`
//! - [`RecordingHandler`]: A notification handler that keeps every notification
//! - [`CountingHandler`]: A notification handler that counts invocations
//! - [`FailingHandler`]: A handler that always fails
//! - [`StaticResponder`]: A request handler with a fixed response

use courier_core::{
    BoxError, CancellationToken, Next, Notification, NotificationHandler, PipelineBehavior,
    Request, RequestHandler,
};
use std::{
    marker::PhantomData,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};
use thiserror::Error;

// ============================================================================
// Journal
// ============================================================================

/// A shared, ordered log.
///
/// Clones write to the same log, so one journal can be handed to several
/// handlers to check the order they ran in.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.lock().push(entry.into());
    }

    /// Get a copy of the entries.
    pub fn entries(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// `true` when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// Journal Behavior
// ============================================================================

/// A pipeline behavior that records `"{label}:before"` and `"{label}:after"`
/// around `next`.
///
/// # Example
///
/// ```rust,ignore
/// let journal = Journal::new();
/// let outer = JournalBehavior::new("outer", journal.clone());
///
/// // Register for a request, send it...
///
/// assert_eq!(journal.entries(), ["outer:before", "handler", "outer:after"]);
/// ```
#[derive(Debug, Clone)]
pub struct JournalBehavior {
    label: &'static str,
    journal: Journal,
}

impl JournalBehavior {
    /// Create a behavior writing to `journal`.
    pub fn new(label: &'static str, journal: Journal) -> Self {
        Self { label, journal }
    }
}

impl<R: Request> PipelineBehavior<R> for JournalBehavior {
    async fn handle(
        &self,
        _request: &R,
        next: Next<'_, R>,
        _cancel: &CancellationToken,
    ) -> Result<R::Response, BoxError> {
        self.journal.record(format!("{}:before", self.label));
        let result = next.run().await;
        self.journal.record(format!("{}:after", self.label));
        result
    }
}

// ============================================================================
// Recording Handler
// ============================================================================

/// A notification handler that records every notification it receives.
///
/// Clones share the recording.
pub struct RecordingHandler<N> {
    received: Arc<Mutex<Vec<N>>>,
}

impl<N: Clone> RecordingHandler<N> {
    /// Create a new recording handler.
    pub fn new() -> Self {
        Self {
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get a clone of the received notifications.
    pub fn received(&self) -> Vec<N> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Get the number of received notifications.
    pub fn count(&self) -> usize {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<N: Clone> Default for RecordingHandler<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> Clone for RecordingHandler<N> {
    fn clone(&self) -> Self {
        Self {
            received: Arc::clone(&self.received),
        }
    }
}

impl<N: Notification + Clone> NotificationHandler<N> for RecordingHandler<N> {
    async fn handle(&self, notification: &N, _cancel: &CancellationToken) -> Result<(), BoxError> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification.clone());
        Ok(())
    }
}

// ============================================================================
// Counting Handler
// ============================================================================

/// A notification handler that counts invocations.
///
/// Clones share the counter.
#[derive(Debug, Clone, Default)]
pub struct CountingHandler {
    count: Arc<AtomicUsize>,
}

impl CountingHandler {
    /// Create a new counting handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current count.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl<N: Notification> NotificationHandler<N> for CountingHandler {
    async fn handle(&self, _notification: &N, _cancel: &CancellationToken) -> Result<(), BoxError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Failing Handler
// ============================================================================

/// Error raised by [`FailingHandler`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TestError(pub String);

/// A handler that always fails with [`TestError`].
#[derive(Debug, Clone)]
pub struct FailingHandler {
    message: &'static str,
}

impl FailingHandler {
    /// Create a handler failing with `message`.
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

impl<N: Notification> NotificationHandler<N> for FailingHandler {
    async fn handle(&self, _notification: &N, _cancel: &CancellationToken) -> Result<(), BoxError> {
        Err(Box::new(TestError(self.message.to_owned())))
    }
}

impl<R: Request> RequestHandler<R> for FailingHandler {
    async fn handle(&self, _request: &R, _cancel: &CancellationToken) -> Result<R::Response, BoxError> {
        Err(Box::new(TestError(self.message.to_owned())))
    }
}

// ============================================================================
// Static Responder
// ============================================================================

/// A request handler that answers every request with a clone of one response.
pub struct StaticResponder<R: Request> {
    response: R::Response,
    _request: PhantomData<fn() -> R>,
}

impl<R: Request> StaticResponder<R>
where
    R::Response: Clone,
{
    /// Create a responder answering with `response`.
    pub fn new(response: R::Response) -> Self {
        Self {
            response,
            _request: PhantomData,
        }
    }
}

impl<R: Request> RequestHandler<R> for StaticResponder<R>
where
    R::Response: Clone,
{
    async fn handle(&self, _request: &R, _cancel: &CancellationToken) -> Result<R::Response, BoxError> {
        Ok(self.response.clone())
    }
}
