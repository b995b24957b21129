use super::traits::{DeliveryStrategy, HandlerInvocation};
use courier_core::{CancellationToken, HandlerFailure, MediatorError, PublishError};
use futures::future::join_all;
use tracing::warn;

/// A concurrent delivery strategy.
///
/// Starts every handler at once on the calling task and waits for all of
/// them. There is no ordering between handlers; failures are reported in
/// registry order.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParallelDelivery;

impl DeliveryStrategy for ParallelDelivery {
    async fn deliver<'a>(
        &'a self,
        invocations: Vec<HandlerInvocation<'a>>,
        cancel: &'a CancellationToken,
    ) -> Result<(), MediatorError> {
        if cancel.is_cancelled() {
            return Err(MediatorError::Cancelled);
        }

        let (handlers, calls): (Vec<_>, Vec<_>) = invocations
            .into_iter()
            .map(|invocation| (invocation.handler().clone(), invocation.invoke()))
            .unzip();
        let results = join_all(calls).await;

        let mut failures = Vec::new();
        for (handler, result) in handlers.into_iter().zip(results) {
            let Err(error) = result else { continue };
            if MediatorError::is_cancellation(&error) {
                return Err(MediatorError::Cancelled);
            }
            warn!(%handler, %error, "notification handler failed");
            failures.push(HandlerFailure::new(handler, error));
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(PublishError::new(failures).into())
        }
    }
}
