//! Registration scan.
//!
//! The builder runs the resolver over every candidate for every configured
//! template and writes the results into a [`ServiceRegistrar`].
//!
//! Single-winner templates keep one implementation per shape. When several
//! candidates close the same shape, those declaring it directly beat those that
//! inherit it, and among the rest the last in scan order wins. Fan-out
//! templates keep every implementation exactly once. Open generic definitions
//! are specialized to every closed shape that was discovered or seeded; a
//! specialization that does not fit is skipped and recorded.

use super::container::HandlerRegistry;
use crate::resolver;
use courier_core::{
    ContractShape, Lifetime, Notification, Registration, Request, ServiceRegistrar,
    SpecializationSkipped, StreamRequest, Template, TypeDescriptor, contracts,
};
use std::sync::Arc;
use tracing::{debug, trace};

/// Which templates to scan for and how to register what is found.
#[derive(Debug, Clone)]
pub struct RegistrationConfig {
    /// Templates admitting one implementation per shape.
    pub single_winner: Vec<Template>,
    /// Templates admitting any number of implementations per shape.
    pub fan_out: Vec<Template>,
    /// Register every single-winner match instead of choosing one.
    pub keep_all: bool,
    /// Lifetime given to every registration.
    pub lifetime: Lifetime,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            single_winner: contracts::single_winner(),
            fan_out: contracts::fan_out(),
            keep_all: false,
            lifetime: Lifetime::Transient,
        }
    }
}

impl RegistrationConfig {
    /// Sets the lifetime of every registration.
    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Keeps every single-winner match.
    pub fn keep_all(mut self, keep_all: bool) -> Self {
        self.keep_all = keep_all;
        self
    }

    /// Scans for an additional single-winner template.
    pub fn with_single_winner(mut self, template: Template) -> Self {
        self.single_winner.push(template);
        self
    }

    /// Scans for an additional fan-out template.
    pub fn with_fan_out(mut self, template: Template) -> Self {
        self.fan_out.push(template);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Policy {
    SingleWinner,
    FanOut,
}

/// Collects candidates and seed shapes, then registers them.
///
/// # Example
///
/// ```rust,ignore
/// let registry = RegistryBuilder::new()
///     .candidate(Candidate::new(|| PingHandler).request_handler::<Ping>())
///     .candidate(Candidate::new(|| Audit).notification_handler::<Pinged>())
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    config: RegistrationConfig,
    candidates: Vec<Arc<TypeDescriptor>>,
    seeds: Vec<ContractShape>,
}

impl RegistryBuilder {
    /// Builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: RegistrationConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &RegistrationConfig {
        &self.config
    }

    /// Adds a candidate. Scan order is insertion order.
    pub fn candidate(mut self, candidate: impl Into<TypeDescriptor>) -> Self {
        self.add_candidate(candidate);
        self
    }

    /// Adds several candidates.
    pub fn candidates<I>(mut self, candidates: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<TypeDescriptor>,
    {
        for candidate in candidates {
            self.add_candidate(candidate);
        }
        self
    }

    /// Adds a candidate in place.
    pub fn add_candidate(&mut self, candidate: impl Into<TypeDescriptor>) {
        self.candidates.push(Arc::new(candidate.into()));
    }

    /// Adds a closed shape known ahead of time, so open generics can be
    /// specialized for it even when no concrete candidate closes it.
    pub fn seed(mut self, shape: ContractShape) -> Self {
        if shape.is_closed() && !self.seeds.contains(&shape) {
            self.seeds.push(shape);
        }
        self
    }

    /// Seeds every request-side shape of `R`.
    pub fn seed_request<R: Request>(self) -> Self {
        self.seed(ContractShape::request_handler::<R>())
            .seed(ContractShape::pipeline_behavior::<R>())
            .seed(ContractShape::pre_processor::<R>())
            .seed(ContractShape::post_processor::<R>())
    }

    /// Seeds the handler shape of notification `N`.
    pub fn seed_notification<N: Notification>(self) -> Self {
        self.seed(ContractShape::notification_handler::<N>())
    }

    /// Seeds the handler shape of stream request `R`.
    pub fn seed_stream<R: StreamRequest>(self) -> Self {
        self.seed(ContractShape::stream_handler::<R>())
    }

    /// Runs the scan into `registrar`, returning the skipped specializations.
    pub fn register_into<S>(&self, registrar: &mut S) -> Vec<SpecializationSkipped>
    where
        S: ServiceRegistrar + ?Sized,
    {
        let seeds = self.pipeline_seeds();
        let mut skipped = Vec::new();
        for template in &self.config.single_winner {
            self.connect(template, Policy::SingleWinner, &seeds, registrar, &mut skipped);
        }
        for template in &self.config.fan_out {
            self.connect(template, Policy::FanOut, &seeds, registrar, &mut skipped);
        }
        skipped
    }

    /// Runs the scan into a fresh [`HandlerRegistry`].
    pub fn build(self) -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        let skipped = self.register_into(&mut registry);
        registry.record_skipped(skipped);
        debug!(
            services = registry.len(),
            skipped = registry.skipped().len(),
            "handler registry built"
        );
        registry
    }

    /// Explicit seeds plus the pipeline shapes of every known request.
    ///
    /// Each closed `RequestHandler<R, S>` also seeds `PipelineBehavior<R, S>`,
    /// `RequestPreProcessor<R>` and `RequestPostProcessor<R, S>`, so open
    /// behaviors wrap requests nothing else mentions.
    fn pipeline_seeds(&self) -> Vec<ContractShape> {
        let handler = contracts::request_handler();
        let mut requests: Vec<ContractShape> = self
            .seeds
            .iter()
            .filter(|s| s.template() == &handler)
            .cloned()
            .collect();
        for candidate in self.candidates.iter().filter(|c| resolver::is_registrable(c)) {
            requests.extend(resolver::find_closed_shapes(candidate, &handler));
        }

        let mut seeds = self.seeds.clone();
        for request in requests {
            let Some(args) = request.closed_args() else {
                continue;
            };
            let derived = [
                ContractShape::closed(contracts::pipeline_behavior(), args.iter().cloned()),
                ContractShape::closed(contracts::pre_processor(), args.iter().take(1).cloned()),
                ContractShape::closed(contracts::post_processor(), args.iter().cloned()),
            ];
            for shape in derived {
                if !seeds.contains(&shape) {
                    seeds.push(shape);
                }
            }
        }
        seeds
    }

    fn connect<S>(
        &self,
        template: &Template,
        policy: Policy,
        seeds: &[ContractShape],
        registrar: &mut S,
        skipped: &mut Vec<SpecializationSkipped>,
    ) where
        S: ServiceRegistrar + ?Sized,
    {
        let mut shapes: Vec<ContractShape> = Vec::new();
        let mut concretions: Vec<(&Arc<TypeDescriptor>, Vec<ContractShape>)> = Vec::new();
        let mut open_definitions: Vec<&TypeDescriptor> = Vec::new();

        for candidate in &self.candidates {
            if candidate.is_generic_definition() {
                if resolver::implements_template(candidate, template) {
                    open_definitions.push(candidate);
                }
                continue;
            }
            if !resolver::is_registrable(candidate) {
                continue;
            }
            let closed = resolver::find_closed_shapes(candidate, template);
            if closed.is_empty() {
                continue;
            }
            for shape in &closed {
                if !shapes.contains(shape) {
                    shapes.push(shape.clone());
                }
            }
            concretions.push((candidate, closed));
        }

        for seed in seeds.iter().filter(|s| s.template() == template) {
            if !shapes.contains(seed) {
                shapes.push(seed.clone());
            }
        }

        for shape in shapes.iter().filter(|s| s.is_closed()) {
            let exact: Vec<&Arc<TypeDescriptor>> = concretions
                .iter()
                .filter(|(_, closed)| closed.contains(shape))
                .map(|(candidate, _)| *candidate)
                .collect();

            match policy {
                Policy::SingleWinner => self.register_single(shape, exact, registrar),
                Policy::FanOut => {
                    for candidate in exact {
                        self.register_fan_out(shape, candidate, registrar);
                    }
                }
            }

            for definition in &open_definitions {
                let closed = match resolver::specialize(definition, shape) {
                    Ok(closed) => closed,
                    Err(skip) => {
                        debug!(%skip, "specialization skipped");
                        skipped.push(skip);
                        continue;
                    }
                };
                match policy {
                    Policy::SingleWinner if registrar.contains(shape) && !self.config.keep_all => {
                        trace!(contract = %shape, implementation = %closed.key(), "shape already handled");
                    }
                    Policy::SingleWinner => {
                        debug!(contract = %shape, implementation = %closed.key(), "registered specialization");
                        registrar.add(shape.clone(), self.registration(&closed));
                    }
                    Policy::FanOut => self.register_fan_out(shape, &closed, registrar),
                }
            }
        }
    }

    fn register_single<S>(
        &self,
        shape: &ContractShape,
        mut exact: Vec<&Arc<TypeDescriptor>>,
        registrar: &mut S,
    ) where
        S: ServiceRegistrar + ?Sized,
    {
        if self.config.keep_all {
            for candidate in exact {
                debug!(contract = %shape, implementation = %candidate.key(), "registered handler");
                registrar.add(shape.clone(), self.registration(candidate));
            }
            return;
        }

        if exact.is_empty() || registrar.contains(shape) {
            return;
        }

        if exact.len() > 1 {
            let direct: Vec<_> = exact.iter().copied().filter(|c| c.declares(shape)).collect();
            if !direct.is_empty() {
                exact = direct;
            }
        }

        for candidate in &exact {
            trace!(contract = %shape, implementation = %candidate.key(), "replacing handler");
            registrar.replace(shape.clone(), self.registration(candidate));
        }
        if let Some(winner) = exact.last() {
            debug!(contract = %shape, implementation = %winner.key(), "registered handler");
        }
    }

    fn register_fan_out<S>(&self, shape: &ContractShape, candidate: &Arc<TypeDescriptor>, registrar: &mut S)
    where
        S: ServiceRegistrar + ?Sized,
    {
        if registrar.add_unique(shape.clone(), self.registration(candidate)) {
            debug!(contract = %shape, implementation = %candidate.key(), "registered handler");
        }
    }

    fn registration(&self, candidate: &Arc<TypeDescriptor>) -> Registration {
        Registration::new(Arc::clone(candidate), self.config.lifetime)
    }
}
