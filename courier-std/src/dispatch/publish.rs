use super::resolve_all;
use crate::delivery::{DynDeliveryStrategy, HandlerInvocation, SequentialDelivery};
use courier_core::{
    BoxFuture, CancellationToken, ContractShape, DynNotificationHandler, MediatorError,
    Notification, ServiceProvider,
};
use std::{any::type_name, sync::Arc};
use tracing::{Instrument, debug, debug_span, trace};

/// Fans each notification out to every matching handler.
#[derive(Clone)]
pub struct NotificationPublisher {
    provider: Arc<dyn ServiceProvider>,
    delivery: Arc<dyn DynDeliveryStrategy>,
}

impl NotificationPublisher {
    /// Publisher resolving from `provider` with sequential delivery.
    pub fn new(provider: Arc<dyn ServiceProvider>) -> Self {
        Self::with_delivery(provider, Arc::new(SequentialDelivery::default()))
    }

    /// Publisher resolving from `provider` with a custom delivery strategy.
    pub fn with_delivery(
        provider: Arc<dyn ServiceProvider>,
        delivery: Arc<dyn DynDeliveryStrategy>,
    ) -> Self {
        Self { provider, delivery }
    }

    /// Delivers `notification` to every registered handler.
    ///
    /// Having no handlers is not an error.
    pub async fn publish<N: Notification>(
        &self,
        notification: &N,
        cancel: &CancellationToken,
    ) -> Result<(), MediatorError> {
        let span = debug_span!("publish", notification = type_name::<N>());
        self.fan_out(notification, cancel).instrument(span).await
    }

    /// Publishes a notification whose type is only known at runtime.
    pub async fn publish_dyn(
        &self,
        notification: &dyn AnyNotification,
        cancel: &CancellationToken,
    ) -> Result<(), MediatorError> {
        notification.publish_erased(self, cancel).await
    }

    async fn fan_out<N: Notification>(
        &self,
        notification: &N,
        cancel: &CancellationToken,
    ) -> Result<(), MediatorError> {
        if cancel.is_cancelled() {
            return Err(MediatorError::Cancelled);
        }

        let handlers = resolve_all::<Arc<dyn DynNotificationHandler<N>>>(
            &*self.provider,
            &ContractShape::notification_handler::<N>(),
        )?;
        if handlers.is_empty() {
            trace!("no notification handlers");
            return Ok(());
        }
        debug!(handlers = handlers.len(), "publishing notification");

        let invocations: Vec<HandlerInvocation<'_>> = handlers
            .iter()
            .map(|(instance, handler)| {
                HandlerInvocation::new(instance.implementation().clone(), move || {
                    handler.handle_dyn(notification, cancel)
                })
            })
            .collect();

        match cancel
            .run_until_cancelled(self.delivery.deliver_dyn(invocations, cancel))
            .await
        {
            Some(result) => result,
            None => Err(MediatorError::Cancelled),
        }
    }
}

/// A notification whose concrete type is erased.
///
/// Implemented for every [`Notification`]; the contract shape is derived from
/// the runtime type.
pub trait AnyNotification: Send + Sync {
    /// Type name of the notification.
    fn notification_type(&self) -> &'static str;

    /// Handler shape the notification is delivered to.
    fn contract(&self) -> ContractShape;

    /// Publishes the notification through `publisher`.
    fn publish_erased<'a>(
        &'a self,
        publisher: &'a NotificationPublisher,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), MediatorError>>;
}

impl<N: Notification> AnyNotification for N {
    fn notification_type(&self) -> &'static str {
        type_name::<N>()
    }

    fn contract(&self) -> ContractShape {
        ContractShape::notification_handler::<N>()
    }

    fn publish_erased<'a>(
        &'a self,
        publisher: &'a NotificationPublisher,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), MediatorError>> {
        Box::pin(publisher.publish(self, cancel))
    }
}
