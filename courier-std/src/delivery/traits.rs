use courier_core::{BoxError, BoxFuture, CancellationToken, MediatorError, TypeKey};
use std::future::Future;

/// A pending call to one notification handler.
pub struct HandlerInvocation<'a> {
    handler: TypeKey,
    call: Box<dyn FnOnce() -> BoxFuture<'a, Result<(), BoxError>> + Send + 'a>,
}

impl<'a> HandlerInvocation<'a> {
    /// Invocation of `handler`; nothing runs until [`invoke`](Self::invoke).
    pub fn new<F>(handler: TypeKey, call: F) -> Self
    where
        F: FnOnce() -> BoxFuture<'a, Result<(), BoxError>> + Send + 'a,
    {
        Self {
            handler,
            call: Box::new(call),
        }
    }

    /// Implementation that will run.
    pub fn handler(&self) -> &TypeKey {
        &self.handler
    }

    /// Starts the handler.
    pub fn invoke(self) -> BoxFuture<'a, Result<(), BoxError>> {
        (self.call)()
    }
}

/// Strategy for running the resolved handlers of one notification.
///
/// This abstraction allows different execution models (sequential, parallel,
/// etc.) to be plugged into the publisher.
pub trait DeliveryStrategy: Send + Sync + 'static {
    /// Runs `invocations`, in registry order, sharing `cancel`.
    fn deliver<'a>(
        &'a self,
        invocations: Vec<HandlerInvocation<'a>>,
        cancel: &'a CancellationToken,
    ) -> impl Future<Output = Result<(), MediatorError>> + Send + 'a;
}

/// Object-safe version of [`DeliveryStrategy`].
pub trait DynDeliveryStrategy: Send + Sync + 'static {
    /// Runs `invocations` (dynamic dispatch version).
    fn deliver_dyn<'a>(
        &'a self,
        invocations: Vec<HandlerInvocation<'a>>,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), MediatorError>>;
}

impl<T: DeliveryStrategy> DynDeliveryStrategy for T {
    fn deliver_dyn<'a>(
        &'a self,
        invocations: Vec<HandlerInvocation<'a>>,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), MediatorError>> {
        Box::pin(self.deliver(invocations, cancel))
    }
}
