//! Boundary with the service container.
//!
//! The mediator never builds handlers itself. It asks a [`ServiceProvider`] for
//! instances of a contract shape; registration code fills the container through
//! [`ServiceRegistrar`].

use crate::{
    descriptor::{Component, TypeDescriptor},
    error::ResolveError,
    shape::{ContractShape, TypeKey},
};
use std::{any::Any, fmt, sync::Arc};

/// A component viewed through one contract.
#[derive(Clone)]
pub struct Instance {
    implementation: TypeKey,
    view: Component,
}

impl Instance {
    /// Wraps `view`, the contract view of an `implementation` component.
    pub fn new(implementation: TypeKey, view: Component) -> Self {
        Self {
            implementation,
            view,
        }
    }

    /// Implementation the instance was built from.
    pub fn implementation(&self) -> &TypeKey {
        &self.implementation
    }

    /// Typed view, such as `Arc<dyn DynRequestHandler<R>>`.
    pub fn downcast<V: Any + Clone>(&self) -> Option<V> {
        self.view.downcast_ref::<V>().cloned()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Instance").field(&self.implementation).finish()
    }
}

/// How long a constructed component lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// A new component per resolution.
    #[default]
    Transient,
    /// One component per implementation, shared by every contract it provides.
    Singleton,
}

/// An implementation registered for a contract shape.
#[derive(Debug, Clone)]
pub struct Registration {
    implementation: Arc<TypeDescriptor>,
    lifetime: Lifetime,
}

impl Registration {
    /// Registers `implementation` with `lifetime`.
    pub fn new(implementation: Arc<TypeDescriptor>, lifetime: Lifetime) -> Self {
        Self {
            implementation,
            lifetime,
        }
    }

    /// Transient registration.
    pub fn transient(implementation: Arc<TypeDescriptor>) -> Self {
        Self::new(implementation, Lifetime::Transient)
    }

    /// The implementation descriptor.
    pub fn implementation(&self) -> &Arc<TypeDescriptor> {
        &self.implementation
    }

    /// Identity of the implementation.
    pub fn key(&self) -> &TypeKey {
        self.implementation.key()
    }

    /// Component lifetime.
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }
}

/// Produces instances for contract shapes.
///
/// `resolve` keeps "nothing registered" (`Ok(None)`) apart from "registered but
/// construction failed" (`Err`).
pub trait ServiceProvider: Send + Sync {
    /// The instance that wins for `service`, if one is registered.
    fn resolve(&self, service: &ContractShape) -> Result<Option<Instance>, ResolveError>;

    /// Every instance registered for `service`, in registration order.
    fn resolve_all(&self, service: &ContractShape) -> Result<Vec<Instance>, ResolveError>;
}

impl<P: ServiceProvider + ?Sized> ServiceProvider for Arc<P> {
    fn resolve(&self, service: &ContractShape) -> Result<Option<Instance>, ResolveError> {
        (**self).resolve(service)
    }

    fn resolve_all(&self, service: &ContractShape) -> Result<Vec<Instance>, ResolveError> {
        (**self).resolve_all(service)
    }
}

/// Write side of a service container.
pub trait ServiceRegistrar {
    /// `true` when at least one registration exists for `service`.
    fn contains(&self, service: &ContractShape) -> bool;

    /// Appends a registration.
    fn add(&mut self, service: ContractShape, registration: Registration);

    /// Drops existing registrations for `service` and adds this one.
    fn replace(&mut self, service: ContractShape, registration: Registration);

    /// Appends unless the same implementation is already registered for
    /// `service`. Returns whether it was added.
    fn add_unique(&mut self, service: ContractShape, registration: Registration) -> bool;
}
