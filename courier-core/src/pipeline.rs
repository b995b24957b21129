//! Request pipeline.
//!
//! Behaviors wrap the terminal request handler like middleware. Each one gets a
//! [`Next`] continuation; running it invokes the remaining behaviors and finally
//! the handler. A behavior may inspect or replace the result, or return without
//! running `next` at all.

use crate::{
    error::{BoxError, Cancelled},
    handler::DynRequestHandler,
    message::Request,
};
use futures::future::BoxFuture;
use std::{future::Future, sync::Arc};
use tokio_util::sync::CancellationToken;

/// Middleware around the handler of request `R`.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a pipeline behavior for `{R}`",
    label = "missing `PipelineBehavior<{R}>` implementation"
)]
pub trait PipelineBehavior<R: Request>: Send + Sync + 'static {
    /// Runs around `next`.
    fn handle(
        &self,
        request: &R,
        next: Next<'_, R>,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<R::Response, BoxError>> + Send;
}

/// Dynamic object-safe version of [`PipelineBehavior`].
pub trait DynPipelineBehavior<R: Request>: Send + Sync + 'static {
    /// Runs around `next` (dynamic dispatch version).
    fn handle_dyn<'a>(
        &'a self,
        request: &'a R,
        next: Next<'a, R>,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<R::Response, BoxError>>;
}

impl<R: Request, B: PipelineBehavior<R>> DynPipelineBehavior<R> for B {
    fn handle_dyn<'a>(
        &'a self,
        request: &'a R,
        next: Next<'a, R>,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<R::Response, BoxError>> {
        Box::pin(self.handle(request, next, cancel))
    }
}

/// Continuation handed to a [`PipelineBehavior`].
///
/// A cursor over the behaviors still to run, followed by the handler. It is
/// consumed by [`Next::run`], so every link runs at most once.
pub struct Next<'a, R: Request> {
    request: &'a R,
    behaviors: &'a [Arc<dyn DynPipelineBehavior<R>>],
    handler: &'a dyn DynRequestHandler<R>,
    cancel: &'a CancellationToken,
}

impl<'a, R: Request> Next<'a, R> {
    /// Chain running `behaviors` outermost-first, then `handler`.
    pub fn new(
        request: &'a R,
        behaviors: &'a [Arc<dyn DynPipelineBehavior<R>>],
        handler: &'a dyn DynRequestHandler<R>,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            request,
            behaviors,
            handler,
            cancel,
        }
    }

    /// Behaviors left before the handler.
    pub fn remaining(&self) -> usize {
        self.behaviors.len()
    }

    /// Runs the rest of the chain.
    ///
    /// Fails with [`Cancelled`] without running anything once the token is
    /// cancelled.
    pub async fn run(self) -> Result<R::Response, BoxError> {
        if self.cancel.is_cancelled() {
            return Err(Box::new(Cancelled));
        }
        match self.behaviors.split_first() {
            Some((behavior, rest)) => {
                let next = Next {
                    request: self.request,
                    behaviors: rest,
                    handler: self.handler,
                    cancel: self.cancel,
                };
                behavior.handle_dyn(self.request, next, self.cancel).await
            }
            None => self.handler.handle_dyn(self.request, self.cancel).await,
        }
    }
}

// ============================================================================
// Pre/post processors
// ============================================================================

/// Runs before the handler of request `R`.
pub trait RequestPreProcessor<R: Request>: Send + Sync + 'static {
    /// Inspects the request. An error aborts the dispatch.
    fn process(
        &self,
        request: &R,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Dynamic object-safe version of [`RequestPreProcessor`].
pub trait DynPreProcessor<R: Request>: Send + Sync + 'static {
    /// Inspects the request (dynamic dispatch version).
    fn process_dyn<'a>(
        &'a self,
        request: &'a R,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), BoxError>>;
}

impl<R: Request, P: RequestPreProcessor<R>> DynPreProcessor<R> for P {
    fn process_dyn<'a>(
        &'a self,
        request: &'a R,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), BoxError>> {
        Box::pin(self.process(request, cancel))
    }
}

/// Runs after the handler of request `R` succeeded.
pub trait RequestPostProcessor<R: Request>: Send + Sync + 'static {
    /// Inspects the request and its response. An error replaces the response.
    fn process(
        &self,
        request: &R,
        response: &R::Response,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Dynamic object-safe version of [`RequestPostProcessor`].
pub trait DynPostProcessor<R: Request>: Send + Sync + 'static {
    /// Inspects the request and its response (dynamic dispatch version).
    fn process_dyn<'a>(
        &'a self,
        request: &'a R,
        response: &'a R::Response,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), BoxError>>;
}

impl<R: Request, P: RequestPostProcessor<R>> DynPostProcessor<R> for P {
    fn process_dyn<'a>(
        &'a self,
        request: &'a R,
        response: &'a R::Response,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), BoxError>> {
        Box::pin(self.process(request, response, cancel))
    }
}
