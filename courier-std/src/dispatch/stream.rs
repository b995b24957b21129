use super::{RequestDispatcher, resolve_one};
use courier_core::{
    BoxError, BoxStream, CancellationToken, ContractShape, MediatorError, StreamRequest,
    StreamRequestHandler,
};
use futures::{StreamExt, stream};
use std::{any::type_name, sync::Arc};
use tracing::debug;

impl RequestDispatcher {
    /// Opens the stream produced by the handler of `request`.
    ///
    /// The token is checked before every item. Once it is cancelled the stream
    /// yields a single [`MediatorError::Cancelled`] and ends.
    pub fn create_stream<'a, R: StreamRequest>(
        &self,
        request: &'a R,
        cancel: &'a CancellationToken,
    ) -> Result<BoxStream<'a, Result<R::Item, MediatorError>>, MediatorError> {
        if cancel.is_cancelled() {
            return Err(MediatorError::Cancelled);
        }

        let handler: Arc<dyn StreamRequestHandler<R>> = resolve_one(
            &**self.provider(),
            &ContractShape::stream_handler::<R>(),
            type_name::<R>(),
        )?;
        debug!(request = type_name::<R>(), "opening stream");

        let items = handler.handle(request, cancel);
        Ok(guard(items, cancel))
    }
}

fn guard<'a, T: Send + 'a>(
    items: BoxStream<'a, Result<T, BoxError>>,
    cancel: &'a CancellationToken,
) -> BoxStream<'a, Result<T, MediatorError>> {
    stream::unfold(Some(items), move |state| async move {
        let mut items = state?;
        match cancel.run_until_cancelled(items.next()).await {
            Some(Some(Ok(item))) => Some((Ok(item), Some(items))),
            Some(Some(Err(err))) => Some((Err(MediatorError::from_invocation(err)), Some(items))),
            Some(None) => None,
            None => Some((Err(MediatorError::Cancelled), None)),
        }
    })
    .boxed()
}
