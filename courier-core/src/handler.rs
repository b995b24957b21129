//! Handler contracts.
//!
//! Each contract comes in two forms. The native form uses `impl Future` in the
//! trait so implementations can be written with plain `async fn`. The `Dyn*`
//! form is object-safe and is what the registry hands out; every native
//! implementation gets it through a blanket impl.

use crate::{
    error::BoxError,
    message::{Notification, Request, StreamRequest},
};
use futures::{future::BoxFuture, stream::BoxStream};
use std::future::Future;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Request handlers
// ============================================================================

/// The single handler answering request `R`.
///
/// # Example
///
/// ```rust,ignore
/// struct PingHandler;
///
/// impl RequestHandler<Ping> for PingHandler {
///     async fn handle(&self, ping: &Ping, _cancel: &CancellationToken) -> Result<Pong, BoxError> {
///         Ok(Pong(ping.0))
///     }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot handle request `{R}`",
    label = "missing `RequestHandler<{R}>` implementation",
    note = "Request handlers must implement `handle` for the request type `{R}`."
)]
pub trait RequestHandler<R: Request>: Send + Sync + 'static {
    /// Produces the response for `request`.
    fn handle(
        &self,
        request: &R,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<R::Response, BoxError>> + Send;
}

/// Dynamic object-safe version of [`RequestHandler`].
pub trait DynRequestHandler<R: Request>: Send + Sync + 'static {
    /// Produces the response for `request` (dynamic dispatch version).
    fn handle_dyn<'a>(
        &'a self,
        request: &'a R,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<R::Response, BoxError>>;
}

impl<R: Request, H: RequestHandler<R>> DynRequestHandler<R> for H {
    fn handle_dyn<'a>(
        &'a self,
        request: &'a R,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<R::Response, BoxError>> {
        Box::pin(self.handle(request, cancel))
    }
}

// ============================================================================
// Notification handlers
// ============================================================================

/// One of any number of handlers reacting to notification `N`.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot handle notification `{N}`",
    label = "missing `NotificationHandler<{N}>` implementation"
)]
pub trait NotificationHandler<N: Notification>: Send + Sync + 'static {
    /// Reacts to `notification`.
    fn handle(
        &self,
        notification: &N,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Dynamic object-safe version of [`NotificationHandler`].
pub trait DynNotificationHandler<N: Notification>: Send + Sync + 'static {
    /// Reacts to `notification` (dynamic dispatch version).
    fn handle_dyn<'a>(
        &'a self,
        notification: &'a N,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), BoxError>>;
}

impl<N: Notification, H: NotificationHandler<N>> DynNotificationHandler<N> for H {
    fn handle_dyn<'a>(
        &'a self,
        notification: &'a N,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), BoxError>> {
        Box::pin(self.handle(notification, cancel))
    }
}

// ============================================================================
// Stream handlers
// ============================================================================

/// The single handler producing the stream for request `R`.
///
/// The stream may borrow the request and the token but not the handler, so the
/// handler can be dropped as soon as the stream is created.
pub trait StreamRequestHandler<R: StreamRequest>: Send + Sync + 'static {
    /// Opens the stream for `request`.
    fn handle<'a>(
        &self,
        request: &'a R,
        cancel: &'a CancellationToken,
    ) -> BoxStream<'a, Result<R::Item, BoxError>>;
}
