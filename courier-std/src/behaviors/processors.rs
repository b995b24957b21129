//! Behaviors that run pre- and post-processors around the handler.
//!
//! The dispatcher places these outermost in the chain whenever processors are
//! registered for the request.

use courier_core::{
    BoxError, CancellationToken, DynPostProcessor, DynPreProcessor, Next, PipelineBehavior,
    Request,
};
use std::sync::Arc;

/// Runs every pre-processor, in order, before the rest of the pipeline.
pub struct PreProcessorBehavior<R: Request> {
    processors: Vec<Arc<dyn DynPreProcessor<R>>>,
}

impl<R: Request> PreProcessorBehavior<R> {
    /// Wraps the resolved processors.
    pub fn new(processors: Vec<Arc<dyn DynPreProcessor<R>>>) -> Self {
        Self { processors }
    }
}

impl<R: Request> PipelineBehavior<R> for PreProcessorBehavior<R> {
    async fn handle(
        &self,
        request: &R,
        next: Next<'_, R>,
        cancel: &CancellationToken,
    ) -> Result<R::Response, BoxError> {
        for processor in &self.processors {
            processor.process_dyn(request, cancel).await?;
        }
        next.run().await
    }
}

/// Runs every post-processor, in order, after the rest of the pipeline
/// succeeded.
pub struct PostProcessorBehavior<R: Request> {
    processors: Vec<Arc<dyn DynPostProcessor<R>>>,
}

impl<R: Request> PostProcessorBehavior<R> {
    /// Wraps the resolved processors.
    pub fn new(processors: Vec<Arc<dyn DynPostProcessor<R>>>) -> Self {
        Self { processors }
    }
}

impl<R: Request> PipelineBehavior<R> for PostProcessorBehavior<R> {
    async fn handle(
        &self,
        request: &R,
        next: Next<'_, R>,
        cancel: &CancellationToken,
    ) -> Result<R::Response, BoxError> {
        let response = next.run().await?;
        for processor in &self.processors {
            processor.process_dyn(request, &response, cancel).await?;
        }
        Ok(response)
    }
}
