//! Typed construction of [`TypeDescriptor`]s.

use crate::{
    descriptor::{BaseType, CastFn, Component, Constructor, Interface, TypeDescriptor, UpcastFn},
    error::BoxError,
    handler::{
        DynNotificationHandler, DynRequestHandler, NotificationHandler, RequestHandler,
        StreamRequestHandler,
    },
    message::{Notification, Request, StreamRequest},
    pipeline::{
        DynPipelineBehavior, DynPostProcessor, DynPreProcessor, PipelineBehavior,
        RequestPostProcessor, RequestPreProcessor,
    },
    shape::{ContractShape, TypeKey},
};
use std::{any::Any, marker::PhantomData, sync::Arc};

/// Describes Rust type `T` as a registration candidate.
///
/// Each contract method records the shape and how to view a constructed `T`
/// through it, so the registry can hand out typed handlers without knowing `T`.
///
/// # Example
///
/// ```rust,ignore
/// let descriptor = Candidate::new(|| PingHandler)
///     .request_handler::<Ping>()
///     .into_descriptor();
/// ```
pub struct Candidate<T> {
    descriptor: TypeDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Candidate<T> {
    /// Candidate built by an infallible constructor.
    pub fn new<F>(constructor: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::try_new(move || Ok(constructor()))
    }

    /// Candidate built by a fallible constructor.
    pub fn try_new<F>(constructor: F) -> Self
    where
        F: Fn() -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let constructor: Constructor =
            Arc::new(move || constructor().map(|value| Arc::new(value) as Component));
        Self {
            descriptor: TypeDescriptor::concrete(TypeKey::of::<T>()).with_constructor(constructor),
            _marker: PhantomData,
        }
    }

    /// Candidate that declares contracts but is never registered itself.
    ///
    /// Useful as the base of other candidates.
    pub fn abstract_base() -> Self {
        Self {
            descriptor: TypeDescriptor::abstract_type(TypeKey::of::<T>()),
            _marker: PhantomData,
        }
    }

    /// `T` handles request `R`.
    pub fn request_handler<R>(self) -> Self
    where
        R: Request,
        T: RequestHandler<R>,
    {
        self.view(ContractShape::request_handler::<R>(), |this| {
            this as Arc<dyn DynRequestHandler<R>>
        })
    }

    /// `T` handles notification `N`.
    pub fn notification_handler<N>(self) -> Self
    where
        N: Notification,
        T: NotificationHandler<N>,
    {
        self.view(ContractShape::notification_handler::<N>(), |this| {
            this as Arc<dyn DynNotificationHandler<N>>
        })
    }

    /// `T` wraps the handler of request `R`.
    pub fn pipeline_behavior<R>(self) -> Self
    where
        R: Request,
        T: PipelineBehavior<R>,
    {
        self.view(ContractShape::pipeline_behavior::<R>(), |this| {
            this as Arc<dyn DynPipelineBehavior<R>>
        })
    }

    /// `T` runs before the handler of request `R`.
    pub fn pre_processor<R>(self) -> Self
    where
        R: Request,
        T: RequestPreProcessor<R>,
    {
        self.view(ContractShape::pre_processor::<R>(), |this| {
            this as Arc<dyn DynPreProcessor<R>>
        })
    }

    /// `T` runs after the handler of request `R`.
    pub fn post_processor<R>(self) -> Self
    where
        R: Request,
        T: RequestPostProcessor<R>,
    {
        self.view(ContractShape::post_processor::<R>(), |this| {
            this as Arc<dyn DynPostProcessor<R>>
        })
    }

    /// `T` streams items for request `R`.
    pub fn stream_handler<R>(self) -> Self
    where
        R: StreamRequest,
        T: StreamRequestHandler<R>,
    {
        self.view(ContractShape::stream_handler::<R>(), |this| {
            this as Arc<dyn StreamRequestHandler<R>>
        })
    }

    /// Declares `shape` without a runtime view.
    pub fn implements(mut self, shape: ContractShape) -> Self {
        self.descriptor = self.descriptor.implements(shape);
        self
    }

    /// Inherits the contracts of `base`.
    ///
    /// `upcast` turns a constructed `T` into the component `base` expects, so
    /// the views `base` declares keep working on `T`.
    pub fn extends<B, U>(mut self, base: impl Into<TypeDescriptor>, upcast: U) -> Self
    where
        B: Send + Sync + 'static,
        U: Fn(&T) -> Arc<B> + Send + Sync + 'static,
    {
        let upcast: UpcastFn = Arc::new(move |component: &Component| {
            let this = Arc::clone(component).downcast::<T>().ok()?;
            Some(upcast(&*this) as Component)
        });
        self.descriptor = self
            .descriptor
            .with_base(BaseType::new(Arc::new(base.into()), Some(upcast)));
        self
    }

    /// Finishes the descriptor.
    pub fn into_descriptor(self) -> TypeDescriptor {
        self.descriptor
    }

    fn view<V, F>(mut self, shape: ContractShape, convert: F) -> Self
    where
        V: Any + Send + Sync,
        F: Fn(Arc<T>) -> V + Send + Sync + 'static,
    {
        let cast: CastFn = Arc::new(move |component: Component| {
            let this = component.downcast::<T>().ok()?;
            Some(Arc::new(convert(this)) as Component)
        });
        self.descriptor = self.descriptor.with_interface(Interface::with_cast(shape, cast));
        self
    }
}

impl<T: Send + Sync + 'static> From<Candidate<T>> for TypeDescriptor {
    fn from(candidate: Candidate<T>) -> Self {
        candidate.into_descriptor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{message::Message, provider::Instance};
    use tokio_util::sync::CancellationToken;

    struct Ping(u32);
    impl Message for Ping {}
    impl Request for Ping {
        type Response = u32;
    }

    struct Doubler;

    impl RequestHandler<Ping> for Doubler {
        async fn handle(&self, ping: &Ping, _cancel: &CancellationToken) -> Result<u32, BoxError> {
            Ok(ping.0 * 2)
        }
    }

    struct Wrapper {
        inner: Arc<Doubler>,
    }

    fn view(descriptor: &TypeDescriptor) -> Option<Arc<dyn DynRequestHandler<Ping>>> {
        let shape = ContractShape::request_handler::<Ping>();
        let component = descriptor.construct().ok()?;
        let view = descriptor.cast(&shape, component)?;
        Instance::new(descriptor.key().clone(), view).downcast()
    }

    #[test]
    fn views_constructed_components_through_declared_contracts() {
        let descriptor = Candidate::new(|| Doubler).request_handler::<Ping>().into_descriptor();
        let handler = view(&descriptor).unwrap();
        let cancel = CancellationToken::new();
        let response = futures::executor::block_on(handler.handle_dyn(&Ping(21), &cancel)).unwrap();
        assert_eq!(response, 42);
    }

    #[test]
    fn inherited_contracts_go_through_the_upcast() {
        let base = Candidate::<Doubler>::abstract_base().request_handler::<Ping>();
        let descriptor = Candidate::new(|| Wrapper {
            inner: Arc::new(Doubler),
        })
        .extends(base, |w: &Wrapper| Arc::clone(&w.inner))
        .into_descriptor();

        assert!(!descriptor.declares(&ContractShape::request_handler::<Ping>()));
        assert!(view(&descriptor).is_some());
    }

    #[test]
    fn undeclared_contracts_have_no_view() {
        let descriptor = Candidate::new(|| Doubler).into_descriptor();
        assert!(view(&descriptor).is_none());
    }
}
