use super::traits::{DeliveryStrategy, HandlerInvocation};
use courier_core::{CancellationToken, HandlerFailure, MediatorError, PublishError};
use tracing::warn;

/// What sequential delivery does after a handler fails.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMode {
    /// Record the failure and run the remaining handlers.
    #[default]
    Continue,
    /// Stop at the first failure.
    FailFast,
}

/// A sequential delivery strategy.
///
/// Awaits handlers one by one in registry order and checks the cancellation
/// token before each. Failures are collected into a [`PublishError`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialDelivery {
    error_mode: ErrorMode,
}

impl SequentialDelivery {
    /// Sequential delivery with the given error mode.
    pub fn new(error_mode: ErrorMode) -> Self {
        Self { error_mode }
    }

    /// Stops at the first failing handler.
    pub fn fail_fast() -> Self {
        Self::new(ErrorMode::FailFast)
    }
}

impl DeliveryStrategy for SequentialDelivery {
    async fn deliver<'a>(
        &'a self,
        invocations: Vec<HandlerInvocation<'a>>,
        cancel: &'a CancellationToken,
    ) -> Result<(), MediatorError> {
        let mut failures = Vec::new();
        for invocation in invocations {
            if cancel.is_cancelled() {
                return Err(MediatorError::Cancelled);
            }
            let handler = invocation.handler().clone();
            let Err(error) = invocation.invoke().await else {
                continue;
            };
            if MediatorError::is_cancellation(&error) {
                return Err(MediatorError::Cancelled);
            }
            warn!(%handler, %error, "notification handler failed");
            failures.push(HandlerFailure::new(handler, error));
            if self.error_mode == ErrorMode::FailFast {
                break;
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(PublishError::new(failures).into())
        }
    }
}
