//! In-process handler container.

use super::builder::RegistryBuilder;
use courier_core::{
    BoxError, Component, ContractShape, Instance, Lifetime, Registration, ResolveError,
    ServiceProvider, ServiceRegistrar, SpecializationSkipped, TypeDescriptor, TypeKey,
};
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

/// Contract shapes mapped to their registrations.
///
/// Populated once, usually by [`RegistryBuilder::build`], and read-only
/// afterwards. Lookups take no lock; only singleton creation does.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    services: HashMap<ContractShape, Vec<Registration>>,
    singletons: Mutex<HashMap<TypeKey, Component>>,
    skipped: Vec<SpecializationSkipped>,
}

impl HandlerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a registration scan.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Registrations for `service`, in registration order.
    pub fn registrations(&self, service: &ContractShape) -> &[Registration] {
        self.services.get(service).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of registered shapes.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Specializations the builder skipped.
    pub fn skipped(&self) -> &[SpecializationSkipped] {
        &self.skipped
    }

    pub(crate) fn record_skipped(&mut self, skipped: Vec<SpecializationSkipped>) {
        self.skipped.extend(skipped);
    }

    fn activate(
        &self,
        service: &ContractShape,
        registration: &Registration,
    ) -> Result<Instance, ResolveError> {
        let implementation = registration.implementation();
        let component = match registration.lifetime() {
            Lifetime::Transient => implementation.construct(),
            Lifetime::Singleton => self.singleton(implementation),
        }
        .map_err(|source| ResolveError::Construction {
            implementation: implementation.key().clone(),
            source,
        })?;

        let view = implementation
            .cast(service, component)
            .ok_or_else(|| ResolveError::ContractMismatch {
                implementation: implementation.key().clone(),
                contract: service.clone(),
            })?;
        Ok(Instance::new(implementation.key().clone(), view))
    }

    fn singleton(&self, implementation: &TypeDescriptor) -> Result<Component, BoxError> {
        if let Some(component) = self.cached_singletons().get(implementation.key()) {
            return Ok(component.clone());
        }
        // Built unlocked so constructors may resolve from this registry.
        // The first component stored wins a construction race.
        let component = implementation.construct()?;
        Ok(self
            .cached_singletons()
            .entry(implementation.key().clone())
            .or_insert(component)
            .clone())
    }

    fn cached_singletons(&self) -> MutexGuard<'_, HashMap<TypeKey, Component>> {
        self.singletons
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl ServiceProvider for HandlerRegistry {
    fn resolve(&self, service: &ContractShape) -> Result<Option<Instance>, ResolveError> {
        match self.registrations(service).last() {
            Some(registration) => self.activate(service, registration).map(Some),
            None => Ok(None),
        }
    }

    fn resolve_all(&self, service: &ContractShape) -> Result<Vec<Instance>, ResolveError> {
        self.registrations(service)
            .iter()
            .map(|registration| self.activate(service, registration))
            .collect()
    }
}

impl ServiceRegistrar for HandlerRegistry {
    fn contains(&self, service: &ContractShape) -> bool {
        self.services.get(service).is_some_and(|regs| !regs.is_empty())
    }

    fn add(&mut self, service: ContractShape, registration: Registration) {
        self.services.entry(service).or_default().push(registration);
    }

    fn replace(&mut self, service: ContractShape, registration: Registration) {
        self.services.insert(service, vec![registration]);
    }

    fn add_unique(&mut self, service: ContractShape, registration: Registration) -> bool {
        let registrations = self.services.entry(service).or_default();
        if registrations.iter().any(|r| r.key() == registration.key()) {
            return false;
        }
        registrations.push(registration);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::{
        Candidate, CancellationToken, DynRequestHandler, Message, Request, RequestHandler,
    };
    use std::sync::{
        Arc, OnceLock, Weak,
        atomic::{AtomicUsize, Ordering},
    };

    struct Ping;
    impl Message for Ping {}
    impl Request for Ping {
        type Response = usize;
    }

    struct Numbered(usize);

    impl RequestHandler<Ping> for Numbered {
        async fn handle(&self, _: &Ping, _: &CancellationToken) -> Result<usize, BoxError> {
            Ok(self.0)
        }
    }

    fn numbered(counter: Arc<AtomicUsize>) -> Arc<TypeDescriptor> {
        Arc::new(
            Candidate::new(move || Numbered(counter.fetch_add(1, Ordering::SeqCst)))
                .request_handler::<Ping>()
                .into_descriptor(),
        )
    }

    async fn respond(registry: &HandlerRegistry) -> usize {
        let handler: Arc<dyn DynRequestHandler<Ping>> = registry
            .resolve(&ContractShape::request_handler::<Ping>())
            .unwrap()
            .unwrap()
            .downcast()
            .unwrap();
        handler.handle_dyn(&Ping, &CancellationToken::new()).await.unwrap()
    }

    #[tokio::test]
    async fn transient_registrations_construct_per_resolve() {
        let mut registry = HandlerRegistry::new();
        let shape = ContractShape::request_handler::<Ping>();
        registry.add(shape, Registration::transient(numbered(Arc::default())));

        assert_eq!(respond(&registry).await, 0);
        assert_eq!(respond(&registry).await, 1);
    }

    #[tokio::test]
    async fn singleton_registrations_construct_once() {
        let mut registry = HandlerRegistry::new();
        let shape = ContractShape::request_handler::<Ping>();
        registry.add(shape, Registration::new(numbered(Arc::default()), Lifetime::Singleton));

        assert_eq!(respond(&registry).await, 0);
        assert_eq!(respond(&registry).await, 0);
    }

    struct Depth;
    impl Message for Depth {}
    impl Request for Depth {
        type Response = usize;
    }

    struct Nested(usize);

    impl RequestHandler<Depth> for Nested {
        async fn handle(&self, _: &Depth, _: &CancellationToken) -> Result<usize, BoxError> {
            Ok(self.0)
        }
    }

    #[tokio::test]
    async fn singleton_constructors_may_resolve_from_the_registry() {
        let slot: Arc<OnceLock<Weak<HandlerRegistry>>> = Arc::default();
        let lookup = Arc::clone(&slot);
        let nested = Candidate::try_new(move || {
            let registry = lookup
                .get()
                .and_then(Weak::upgrade)
                .ok_or("registry not ready")?;
            registry
                .resolve(&ContractShape::request_handler::<Ping>())?
                .ok_or("no ping handler")?;
            Ok(Nested(1))
        })
        .request_handler::<Depth>()
        .into_descriptor();

        let mut registry = HandlerRegistry::new();
        registry.add(
            ContractShape::request_handler::<Ping>(),
            Registration::new(numbered(Arc::default()), Lifetime::Singleton),
        );
        registry.add(
            ContractShape::request_handler::<Depth>(),
            Registration::new(Arc::new(nested), Lifetime::Singleton),
        );
        let registry = Arc::new(registry);
        assert!(slot.set(Arc::downgrade(&registry)).is_ok());

        let handler: Arc<dyn DynRequestHandler<Depth>> = registry
            .resolve(&ContractShape::request_handler::<Depth>())
            .unwrap()
            .unwrap()
            .downcast()
            .unwrap();
        let depth = handler.handle_dyn(&Depth, &CancellationToken::new()).await.unwrap();

        assert_eq!(depth, 1);
        assert_eq!(respond(&registry).await, 0);
    }

    #[test]
    fn missing_shapes_resolve_to_none() {
        let registry = HandlerRegistry::new();
        let shape = ContractShape::request_handler::<Ping>();
        assert!(registry.resolve(&shape).unwrap().is_none());
        assert!(registry.resolve_all(&shape).unwrap().is_empty());
    }

    #[test]
    fn failing_constructors_are_reported() {
        let mut registry = HandlerRegistry::new();
        let shape = ContractShape::request_handler::<Ping>();
        let broken = Candidate::<Numbered>::try_new(|| Err("database offline".into()))
            .request_handler::<Ping>()
            .into_descriptor();
        registry.add(shape.clone(), Registration::transient(Arc::new(broken)));

        let err = registry.resolve(&shape).unwrap_err();
        assert_eq!(err.implementation(), &TypeKey::of::<Numbered>());
        assert!(matches!(err, ResolveError::Construction { .. }));
    }

    #[test]
    fn add_unique_skips_known_implementations() {
        let mut registry = HandlerRegistry::new();
        let shape = ContractShape::request_handler::<Ping>();
        let descriptor = numbered(Arc::default());

        assert!(registry.add_unique(shape.clone(), Registration::transient(descriptor.clone())));
        assert!(!registry.add_unique(shape.clone(), Registration::transient(descriptor)));
        assert_eq!(registry.registrations(&shape).len(), 1);
    }
}
