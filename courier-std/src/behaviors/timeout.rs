//! Timeout behavior for time-limited requests.

use courier_core::{BoxError, CancellationToken, Next, PipelineBehavior, Request};
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

/// Error returned when the rest of the pipeline did not finish in time.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("request timed out after {0:?}")]
pub struct TimeoutError(pub Duration);

/// A behavior that bounds the time spent in the rest of the pipeline.
///
/// Requires a Tokio runtime with the time driver enabled.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutBehavior {
    duration: Duration,
}

impl TimeoutBehavior {
    /// Create a new timeout behavior.
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl<R: Request> PipelineBehavior<R> for TimeoutBehavior {
    async fn handle(
        &self,
        _request: &R,
        next: Next<'_, R>,
        _cancel: &CancellationToken,
    ) -> Result<R::Response, BoxError> {
        match timeout(self.duration, next.run()).await {
            Ok(result) => result,
            Err(_) => Err(Box::new(TimeoutError(self.duration))),
        }
    }
}
