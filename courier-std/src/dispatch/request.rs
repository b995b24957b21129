use super::{resolve_all, resolve_one};
use crate::behaviors::{PostProcessorBehavior, PreProcessorBehavior};
use courier_core::{
    BoxFuture, CancellationToken, ContractShape, DynPipelineBehavior, DynPostProcessor,
    DynPreProcessor, DynRequestHandler, MediatorError, Next, Request, ServiceProvider,
};
use std::{
    any::{Any, type_name},
    sync::Arc,
};
use tracing::{Instrument, debug, debug_span};

/// Routes each request to its single handler through the pipeline.
#[derive(Clone)]
pub struct RequestDispatcher {
    provider: Arc<dyn ServiceProvider>,
}

impl RequestDispatcher {
    /// Dispatcher resolving from `provider`.
    pub fn new(provider: Arc<dyn ServiceProvider>) -> Self {
        Self { provider }
    }

    /// The provider handlers are resolved from.
    pub fn provider(&self) -> &Arc<dyn ServiceProvider> {
        &self.provider
    }

    /// Sends `request` to its handler and returns the response.
    ///
    /// Pre-processors, post-processors and pipeline behaviors registered for
    /// the request run around the handler, outermost first. Errors raised by
    /// handlers and behaviors are returned unchanged in
    /// [`MediatorError::Handler`].
    pub async fn send<R: Request>(
        &self,
        request: &R,
        cancel: &CancellationToken,
    ) -> Result<R::Response, MediatorError> {
        let span = debug_span!("send", request = type_name::<R>());
        self.dispatch(request, cancel).instrument(span).await
    }

    /// Sends a request whose type is only known at runtime.
    ///
    /// The response is boxed; downcast it to the request's response type.
    pub async fn send_dyn(
        &self,
        request: &dyn AnyRequest,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn Any + Send>, MediatorError> {
        request.send_erased(self, cancel).await
    }

    async fn dispatch<R: Request>(
        &self,
        request: &R,
        cancel: &CancellationToken,
    ) -> Result<R::Response, MediatorError> {
        if cancel.is_cancelled() {
            return Err(MediatorError::Cancelled);
        }

        let handler: Arc<dyn DynRequestHandler<R>> = resolve_one(
            &*self.provider,
            &ContractShape::request_handler::<R>(),
            type_name::<R>(),
        )?;
        let behaviors = self.pipeline::<R>()?;
        debug!(behaviors = behaviors.len(), "dispatching request");

        let next = Next::new(request, &behaviors, handler.as_ref(), cancel);
        match cancel.run_until_cancelled(next.run()).await {
            Some(Ok(response)) => Ok(response),
            Some(Err(err)) => Err(MediatorError::from_invocation(err)),
            None => {
                debug!("request cancelled");
                Err(MediatorError::Cancelled)
            }
        }
    }

    fn pipeline<R: Request>(&self) -> Result<Vec<Arc<dyn DynPipelineBehavior<R>>>, MediatorError> {
        let provider = &*self.provider;
        let mut chain: Vec<Arc<dyn DynPipelineBehavior<R>>> = Vec::new();

        let pre: Vec<_> =
            resolve_all::<Arc<dyn DynPreProcessor<R>>>(provider, &ContractShape::pre_processor::<R>())?
                .into_iter()
                .map(|(_, processor)| processor)
                .collect();
        if !pre.is_empty() {
            chain.push(Arc::new(PreProcessorBehavior::new(pre)));
        }

        let post: Vec<_> =
            resolve_all::<Arc<dyn DynPostProcessor<R>>>(provider, &ContractShape::post_processor::<R>())?
                .into_iter()
                .map(|(_, processor)| processor)
                .collect();
        if !post.is_empty() {
            chain.push(Arc::new(PostProcessorBehavior::new(post)));
        }

        chain.extend(
            resolve_all::<Arc<dyn DynPipelineBehavior<R>>>(
                provider,
                &ContractShape::pipeline_behavior::<R>(),
            )?
            .into_iter()
            .map(|(_, behavior)| behavior),
        );
        Ok(chain)
    }
}

/// A request whose concrete type is erased.
///
/// Implemented for every [`Request`]; the contract shape is derived from the
/// runtime type.
pub trait AnyRequest: Send + Sync {
    /// Type name of the request.
    fn request_type(&self) -> &'static str;

    /// Handler shape the request is dispatched to.
    fn contract(&self) -> ContractShape;

    /// Sends the request through `dispatcher`.
    fn send_erased<'a>(
        &'a self,
        dispatcher: &'a RequestDispatcher,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Box<dyn Any + Send>, MediatorError>>;
}

impl<R: Request> AnyRequest for R {
    fn request_type(&self) -> &'static str {
        type_name::<R>()
    }

    fn contract(&self) -> ContractShape {
        ContractShape::request_handler::<R>()
    }

    fn send_erased<'a>(
        &'a self,
        dispatcher: &'a RequestDispatcher,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Box<dyn Any + Send>, MediatorError>> {
        Box::pin(async move {
            let response = dispatcher.send(self, cancel).await?;
            Ok(Box::new(response) as Box<dyn Any + Send>)
        })
    }
}
