//! Logging behavior for request observation.

use courier_core::{BoxError, CancellationToken, Next, PipelineBehavior, Request};
use std::{any::type_name, time::Instant};
use tracing::{debug, warn};

/// Logs every request it wraps, with its outcome and duration.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingBehavior;

impl<R: Request> PipelineBehavior<R> for LoggingBehavior {
    async fn handle(
        &self,
        _request: &R,
        next: Next<'_, R>,
        _cancel: &CancellationToken,
    ) -> Result<R::Response, BoxError> {
        let request = type_name::<R>();
        let started = Instant::now();
        debug!(request, "handling request");

        let result = next.run().await;
        match &result {
            Ok(_) => debug!(request, elapsed = ?started.elapsed(), "request handled"),
            Err(error) => warn!(request, %error, elapsed = ?started.elapsed(), "request failed"),
        }
        result
    }
}
