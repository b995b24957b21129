//! The mediator facade.

use courier_core::{
    BoxStream, CancellationToken, ContractShape, MediatorError, Notification, Request,
    ServiceProvider, StreamRequest, TypeDescriptor,
};
use courier_std::{
    AnyNotification, AnyRequest, DynDeliveryStrategy, HandlerRegistry, NotificationPublisher,
    RegistrationConfig, RegistryBuilder, RequestDispatcher,
};
use std::{any::Any, future::Future, sync::Arc};

// ============================================================================
// Sender / Publisher
// ============================================================================

/// Sends requests to their single handler.
pub trait Sender: Send + Sync {
    /// Sends `request` and waits for the response.
    fn send<R: Request>(
        &self,
        request: &R,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<R::Response, MediatorError>> + Send;

    /// Sends a request whose type is only known at runtime.
    fn send_dyn<'a>(
        &'a self,
        request: &'a dyn AnyRequest,
        cancel: &'a CancellationToken,
    ) -> impl Future<Output = Result<Box<dyn Any + Send>, MediatorError>> + Send + 'a;

    /// Opens the item stream answering `request`.
    fn create_stream<'a, R: StreamRequest>(
        &self,
        request: &'a R,
        cancel: &'a CancellationToken,
    ) -> Result<BoxStream<'a, Result<R::Item, MediatorError>>, MediatorError>;
}

/// Publishes notifications to every matching handler.
pub trait Publisher: Send + Sync {
    /// Delivers `notification` to all of its handlers.
    fn publish<N: Notification>(
        &self,
        notification: &N,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), MediatorError>> + Send;

    /// Publishes a notification whose type is only known at runtime.
    fn publish_dyn<'a>(
        &'a self,
        notification: &'a dyn AnyNotification,
        cancel: &'a CancellationToken,
    ) -> impl Future<Output = Result<(), MediatorError>> + Send + 'a;
}

// ============================================================================
// Mediator
// ============================================================================

/// Entry point for sending requests and publishing notifications.
///
/// A mediator holds no handlers of its own. Every call resolves fresh
/// instances from the [`ServiceProvider`] it was built with, so clones are
/// cheap and share everything.
///
/// # Example
///
/// ```rust,ignore
/// let mediator = Mediator::builder()
///     .candidate(Candidate::new(|| PingHandler).request_handler::<Ping>())
///     .build();
///
/// let pong = mediator.send(&Ping, &CancellationToken::new()).await?;
/// ```
#[derive(Clone)]
pub struct Mediator {
    requests: RequestDispatcher,
    notifications: NotificationPublisher,
}

impl Mediator {
    /// Mediator over `provider` with sequential notification delivery.
    pub fn new(provider: Arc<dyn ServiceProvider>) -> Self {
        Self {
            requests: RequestDispatcher::new(Arc::clone(&provider)),
            notifications: NotificationPublisher::new(provider),
        }
    }

    /// Mediator over `provider` delivering notifications with `delivery`.
    pub fn with_delivery(
        provider: Arc<dyn ServiceProvider>,
        delivery: Arc<dyn DynDeliveryStrategy>,
    ) -> Self {
        Self {
            requests: RequestDispatcher::new(Arc::clone(&provider)),
            notifications: NotificationPublisher::with_delivery(provider, delivery),
        }
    }

    /// Starts building a mediator over a fresh [`HandlerRegistry`].
    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::new()
    }

    /// The provider handlers are resolved from.
    pub fn provider(&self) -> &Arc<dyn ServiceProvider> {
        self.requests.provider()
    }

    /// Sends `request` to its handler.
    ///
    /// # Errors
    ///
    /// - [`MediatorError::HandlerNotFound`] when nothing handles the request
    /// - [`MediatorError::HandlerConstruction`] when the handler cannot be built
    /// - [`MediatorError::Handler`] with the handler's own error
    /// - [`MediatorError::Cancelled`] when `cancel` fires first
    pub async fn send<R: Request>(
        &self,
        request: &R,
        cancel: &CancellationToken,
    ) -> Result<R::Response, MediatorError> {
        self.requests.send(request, cancel).await
    }

    /// Sends a request whose type is only known at runtime.
    ///
    /// The response comes back boxed and must be downcast by the caller.
    pub async fn send_dyn(
        &self,
        request: &dyn AnyRequest,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn Any + Send>, MediatorError> {
        self.requests.send_dyn(request, cancel).await
    }

    /// Opens the item stream answering `request`.
    pub fn create_stream<'a, R: StreamRequest>(
        &self,
        request: &'a R,
        cancel: &'a CancellationToken,
    ) -> Result<BoxStream<'a, Result<R::Item, MediatorError>>, MediatorError> {
        self.requests.create_stream(request, cancel)
    }

    /// Delivers `notification` to every handler registered for it.
    ///
    /// Publishing with no handlers succeeds. Handler failures are collected
    /// into one [`MediatorError::Publish`].
    pub async fn publish<N: Notification>(
        &self,
        notification: &N,
        cancel: &CancellationToken,
    ) -> Result<(), MediatorError> {
        self.notifications.publish(notification, cancel).await
    }

    /// Publishes a notification whose type is only known at runtime.
    pub async fn publish_dyn(
        &self,
        notification: &dyn AnyNotification,
        cancel: &CancellationToken,
    ) -> Result<(), MediatorError> {
        self.notifications.publish_dyn(notification, cancel).await
    }
}

impl Sender for Mediator {
    fn send<R: Request>(
        &self,
        request: &R,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<R::Response, MediatorError>> + Send {
        Mediator::send(self, request, cancel)
    }

    fn send_dyn<'a>(
        &'a self,
        request: &'a dyn AnyRequest,
        cancel: &'a CancellationToken,
    ) -> impl Future<Output = Result<Box<dyn Any + Send>, MediatorError>> + Send + 'a {
        Mediator::send_dyn(self, request, cancel)
    }

    fn create_stream<'a, R: StreamRequest>(
        &self,
        request: &'a R,
        cancel: &'a CancellationToken,
    ) -> Result<BoxStream<'a, Result<R::Item, MediatorError>>, MediatorError> {
        Mediator::create_stream(self, request, cancel)
    }
}

impl Publisher for Mediator {
    fn publish<N: Notification>(
        &self,
        notification: &N,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), MediatorError>> + Send {
        Mediator::publish(self, notification, cancel)
    }

    fn publish_dyn<'a>(
        &'a self,
        notification: &'a dyn AnyNotification,
        cancel: &'a CancellationToken,
    ) -> impl Future<Output = Result<(), MediatorError>> + Send + 'a {
        Mediator::publish_dyn(self, notification, cancel)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Collects candidates, scans them into a [`HandlerRegistry`] and wraps the
/// registry in a [`Mediator`].
#[derive(Default)]
pub struct MediatorBuilder {
    registry: RegistryBuilder,
    delivery: Option<Arc<dyn DynDeliveryStrategy>>,
}

impl MediatorBuilder {
    /// Empty builder with the default registration policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the registration policy.
    pub fn config(mut self, config: RegistrationConfig) -> Self {
        self.registry = self.registry.with_config(config);
        self
    }

    /// Adds one candidate to the scan.
    pub fn candidate(mut self, candidate: impl Into<TypeDescriptor>) -> Self {
        self.registry = self.registry.candidate(candidate);
        self
    }

    /// Adds several candidates, in order.
    pub fn candidates<I>(mut self, candidates: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<TypeDescriptor>,
    {
        self.registry = self.registry.candidates(candidates);
        self
    }

    /// Adds a closed shape to specialize open generic handlers for.
    pub fn seed(mut self, shape: ContractShape) -> Self {
        self.registry = self.registry.seed(shape);
        self
    }

    /// Seeds the handler and pipeline shapes of request `R`.
    pub fn seed_request<R: Request>(mut self) -> Self {
        self.registry = self.registry.seed_request::<R>();
        self
    }

    /// Seeds the handler shape of notification `N`.
    pub fn seed_notification<N: Notification>(mut self) -> Self {
        self.registry = self.registry.seed_notification::<N>();
        self
    }

    /// Seeds the handler shape of stream request `R`.
    pub fn seed_stream<R: StreamRequest>(mut self) -> Self {
        self.registry = self.registry.seed_stream::<R>();
        self
    }

    /// Delivers notifications with `delivery` instead of sequentially.
    pub fn delivery(mut self, delivery: impl DynDeliveryStrategy) -> Self {
        self.delivery = Some(Arc::new(delivery));
        self
    }

    /// Adds every candidate submitted with `#[register]`.
    #[cfg(feature = "inventory")]
    pub fn discover(self) -> Self {
        self.candidates(courier_std::discovery::discover())
    }

    /// Builds the registry and the mediator over it.
    pub fn build(self) -> Mediator {
        self.build_with_registry().0
    }

    /// Like [`build`](Self::build), also returning the registry so its
    /// registrations and skipped specializations can be inspected.
    pub fn build_with_registry(self) -> (Mediator, Arc<HandlerRegistry>) {
        let registry = Arc::new(self.registry.build());
        let provider: Arc<dyn ServiceProvider> = registry.clone();
        let mediator = match self.delivery {
            Some(delivery) => Mediator::with_delivery(provider, delivery),
            None => Mediator::new(provider),
        };
        (mediator, registry)
    }
}
