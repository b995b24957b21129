//! Type descriptors.
//!
//! A [`TypeDescriptor`] is what the registration scan sees of a candidate type:
//! whether it can be instantiated, which contract shapes it declares, its base
//! type, and how to build and view it. Rust has no runtime reflection, so
//! descriptors are produced explicitly, usually through
//! [`Candidate`](crate::Candidate) or the `#[register]` attribute.
//!
//! Generic implementations are described by a definition whose shapes mention
//! [`TypeArg::Param`](crate::TypeArg::Param) plus the closed instantiations the
//! program actually monomorphized.

use crate::{
    error::BoxError,
    shape::{ContractShape, TypeKey},
};
use std::{any::Any, borrow::Cow, fmt, sync::Arc};

/// A constructed component, type-erased.
pub type Component = Arc<dyn Any + Send + Sync>;

pub(crate) type Constructor = Arc<dyn Fn() -> Result<Component, BoxError> + Send + Sync>;
pub(crate) type CastFn = Arc<dyn Fn(Component) -> Option<Component> + Send + Sync>;
pub(crate) type UpcastFn = Arc<dyn Fn(&Component) -> Option<Component> + Send + Sync>;

/// Instantiability of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Can be registered and constructed as is.
    Concrete,
    /// Declares contracts but is never registered itself.
    Abstract,
    /// Open generic; registered only through its instantiations.
    GenericDefinition,
}

// ============================================================================
// Generic parameters
// ============================================================================

/// A predicate over type arguments.
#[derive(Clone)]
pub struct Constraint {
    description: Cow<'static, str>,
    check: Arc<dyn Fn(&TypeKey) -> bool + Send + Sync>,
}

impl Constraint {
    /// Constraint backed by an arbitrary predicate.
    pub fn new<F>(description: impl Into<Cow<'static, str>>, check: F) -> Self
    where
        F: Fn(&TypeKey) -> bool + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            check: Arc::new(check),
        }
    }

    /// Accepts only the listed types.
    pub fn one_of(allowed: impl IntoIterator<Item = TypeKey>) -> Self {
        let allowed: Vec<TypeKey> = allowed.into_iter().collect();
        let description = allowed
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" | ");
        Self::new(description, move |key| allowed.contains(key))
    }

    /// Rejects `excluded`.
    pub fn not(excluded: TypeKey) -> Self {
        Self::new(format!("!{excluded}"), move |key| key != &excluded)
    }

    /// Human-readable form used in diagnostics.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// `true` when `argument` satisfies the constraint.
    pub fn allows(&self, argument: &TypeKey) -> bool {
        (self.check)(argument)
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Constraint").field(&self.description).finish()
    }
}

/// A generic parameter and its constraints.
#[derive(Debug, Clone)]
pub struct GenericParam {
    name: Cow<'static, str>,
    constraints: Vec<Constraint>,
}

impl GenericParam {
    /// Unconstrained parameter.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            constraints: Vec::new(),
        }
    }

    /// Adds a constraint.
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared constraints.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// First constraint `argument` violates.
    pub fn violation(&self, argument: &TypeKey) -> Option<&Constraint> {
        self.constraints.iter().find(|c| !c.allows(argument))
    }
}

// ============================================================================
// Interfaces and bases
// ============================================================================

/// A contract shape a type declares, with the view it provides.
#[derive(Clone)]
pub struct Interface {
    shape: ContractShape,
    cast: Option<CastFn>,
}

impl Interface {
    /// Declaration without a runtime view.
    pub fn declared(shape: ContractShape) -> Self {
        Self { shape, cast: None }
    }

    pub(crate) fn with_cast(shape: ContractShape, cast: CastFn) -> Self {
        Self {
            shape,
            cast: Some(cast),
        }
    }

    /// The declared shape.
    pub fn shape(&self) -> &ContractShape {
        &self.shape
    }
}

impl fmt::Debug for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.shape)?;
        if self.cast.is_none() {
            f.write_str(" (declared)")?;
        }
        Ok(())
    }
}

#[derive(Clone)]
pub(crate) struct BaseType {
    descriptor: Arc<TypeDescriptor>,
    upcast: Option<UpcastFn>,
}

impl BaseType {
    pub(crate) fn new(descriptor: Arc<TypeDescriptor>, upcast: Option<UpcastFn>) -> Self {
        Self { descriptor, upcast }
    }
}

// ============================================================================
// Descriptor
// ============================================================================

/// What the registration scan knows about one candidate type.
#[derive(Clone)]
pub struct TypeDescriptor {
    key: TypeKey,
    kind: TypeKind,
    params: Vec<GenericParam>,
    definition: Option<Interface>,
    interfaces: Vec<Interface>,
    base: Option<BaseType>,
    constructor: Option<Constructor>,
    instantiations: Vec<Arc<TypeDescriptor>>,
}

impl TypeDescriptor {
    /// Descriptor with no contracts.
    pub fn declared(key: TypeKey, kind: TypeKind) -> Self {
        Self {
            key,
            kind,
            params: Vec::new(),
            definition: None,
            interfaces: Vec::new(),
            base: None,
            constructor: None,
            instantiations: Vec::new(),
        }
    }

    /// Concrete type without a constructor.
    pub fn concrete(key: TypeKey) -> Self {
        Self::declared(key, TypeKind::Concrete)
    }

    /// Abstract type, usable only as a base.
    pub fn abstract_type(key: TypeKey) -> Self {
        Self::declared(key, TypeKind::Abstract)
    }

    /// Open generic definition named `name`.
    ///
    /// Shapes declared on the definition, and on bases attached to it, refer to
    /// `params` by index through [`TypeArg::Param`](crate::TypeArg::Param).
    pub fn generic(
        name: impl Into<Cow<'static, str>>,
        params: impl IntoIterator<Item = GenericParam>,
    ) -> Self {
        let mut descriptor = Self::declared(TypeKey::named(name), TypeKind::GenericDefinition);
        descriptor.params = params.into_iter().collect();
        descriptor
    }

    /// Declares an interface-like shape.
    pub fn implements(self, shape: ContractShape) -> Self {
        self.with_interface(Interface::declared(shape))
    }

    /// Declares the class-like shape this type specializes.
    pub fn specializes(mut self, shape: ContractShape) -> Self {
        self.definition = Some(Interface::declared(shape));
        self
    }

    /// Sets the base type without a runtime upcast.
    pub fn extends(mut self, base: impl Into<TypeDescriptor>) -> Self {
        self.base = Some(BaseType::new(Arc::new(base.into()), None));
        self
    }

    /// Offers `closed` as the instantiation of this definition for `args`.
    ///
    /// The instantiation is re-keyed as `definition<args>`.
    pub fn instantiate(
        mut self,
        args: impl IntoIterator<Item = TypeKey>,
        closed: impl Into<TypeDescriptor>,
    ) -> Self {
        let mut closed = closed.into();
        closed.key = TypeKey::applied(self.key.clone(), args);
        self.instantiations.push(Arc::new(closed));
        self
    }

    pub(crate) fn with_interface(mut self, interface: Interface) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub(crate) fn with_base(mut self, base: BaseType) -> Self {
        self.base = Some(base);
        self
    }

    pub(crate) fn with_constructor(mut self, constructor: Constructor) -> Self {
        self.constructor = Some(constructor);
        self
    }

    /// Identity.
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    /// Instantiability.
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// `true` for [`TypeKind::Concrete`].
    pub fn is_concrete(&self) -> bool {
        self.kind == TypeKind::Concrete
    }

    /// `true` for [`TypeKind::GenericDefinition`].
    pub fn is_generic_definition(&self) -> bool {
        self.kind == TypeKind::GenericDefinition
    }

    /// Generic parameters of a definition.
    pub fn params(&self) -> &[GenericParam] {
        &self.params
    }

    /// Class-like shape this type specializes.
    pub fn definition(&self) -> Option<&ContractShape> {
        self.definition.as_ref().map(Interface::shape)
    }

    /// Directly declared interface shapes.
    pub fn interfaces(&self) -> impl Iterator<Item = &ContractShape> {
        self.interfaces.iter().map(Interface::shape)
    }

    /// Base type.
    pub fn base(&self) -> Option<&TypeDescriptor> {
        self.base.as_ref().map(|b| &*b.descriptor)
    }

    /// Base chain, nearest first, excluding `self`.
    pub fn ancestors(&self) -> impl Iterator<Item = &TypeDescriptor> {
        std::iter::successors(self.base(), |ty| ty.base())
    }

    /// Instantiation offered for `args`.
    pub fn instantiation(&self, args: &[TypeKey]) -> Option<&Arc<TypeDescriptor>> {
        self.instantiations
            .iter()
            .find(|inst| inst.key.args() == args)
    }

    /// `true` when `shape` is declared on this type itself rather than inherited.
    pub fn declares(&self, shape: &ContractShape) -> bool {
        self.own_interfaces().any(|iface| iface.shape() == shape)
    }

    /// Builds a fresh component.
    pub fn construct(&self) -> Result<Component, BoxError> {
        match &self.constructor {
            Some(constructor) => constructor(),
            None => Err(format!("`{}` has no constructor", self.key).into()),
        }
    }

    /// Views `component` through `shape`, walking up the base chain.
    ///
    /// Returns `None` when neither this type nor an ancestor provides a view for
    /// the shape.
    pub fn cast(&self, shape: &ContractShape, component: Component) -> Option<Component> {
        let own = self
            .own_interfaces()
            .filter(|iface| iface.shape() == shape)
            .find_map(|iface| iface.cast.as_ref());
        if let Some(cast) = own {
            return cast(component);
        }
        let base = self.base.as_ref()?;
        let upcast = base.upcast.as_ref()?;
        base.descriptor.cast(shape, upcast(&component)?)
    }

    /// Folds `other` into `self`.
    ///
    /// Shapes not already declared are appended; missing constructor, base and
    /// definition are taken from `other`.
    pub fn merge(&mut self, other: TypeDescriptor) {
        for iface in other.interfaces {
            if !self.interfaces.iter().any(|own| own.shape == iface.shape) {
                self.interfaces.push(iface);
            }
        }
        if self.constructor.is_none() {
            self.constructor = other.constructor;
        }
        if self.base.is_none() {
            self.base = other.base;
        }
        if self.definition.is_none() {
            self.definition = other.definition;
        }
        self.instantiations.extend(other.instantiations);
    }

    fn own_interfaces(&self) -> impl Iterator<Item = &Interface> {
        self.definition.iter().chain(&self.interfaces)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("params", &self.params)
            .field("definition", &self.definition)
            .field("interfaces", &self.interfaces)
            .field("base", &self.base().map(TypeDescriptor::key))
            .field("instantiations", &self.instantiations.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Template, TypeArg};

    enum Handles {}

    fn handles(arg: &str) -> ContractShape {
        ContractShape::closed(Template::interface::<Handles>("Handles", 1), [TypeKey::named(arg.to_owned())])
    }

    #[test]
    fn declares_distinguishes_inherited_shapes() {
        let base = TypeDescriptor::abstract_type(TypeKey::named("Base")).implements(handles("Ping"));
        let derived = TypeDescriptor::concrete(TypeKey::named("Derived"))
            .implements(handles("Pong"))
            .extends(base);

        assert!(derived.declares(&handles("Pong")));
        assert!(!derived.declares(&handles("Ping")));
        assert_eq!(
            derived.ancestors().map(|a| a.key().to_string()).collect::<Vec<_>>(),
            ["Base"]
        );
    }

    #[test]
    fn instantiations_are_keyed_by_arguments() {
        let open = ContractShape::new(Template::interface::<Handles>("Handles", 1), [TypeArg::param(0)]);
        let generic = TypeDescriptor::generic("Audit", [GenericParam::new("T")])
            .implements(open)
            .instantiate(
                [TypeKey::named("Ping")],
                TypeDescriptor::concrete(TypeKey::named("ignored")).implements(handles("Ping")),
            );

        let inst = generic.instantiation(&[TypeKey::named("Ping")]).unwrap();
        assert_eq!(inst.key().to_string(), "Audit<Ping>");
        assert!(generic.instantiation(&[TypeKey::named("Pong")]).is_none());
    }

    #[test]
    fn constraints_report_first_violation() {
        let param = GenericParam::new("T")
            .with_constraint(Constraint::not(TypeKey::named("Secret")))
            .with_constraint(Constraint::one_of([TypeKey::named("Ping"), TypeKey::named("Secret")]));

        assert!(param.violation(&TypeKey::named("Ping")).is_none());
        assert_eq!(
            param.violation(&TypeKey::named("Secret")).map(Constraint::description),
            Some("!Secret")
        );
        assert_eq!(
            param.violation(&TypeKey::named("Pong")).map(Constraint::description),
            Some("Ping | Secret")
        );
    }

    #[test]
    fn construct_without_constructor_fails() {
        let err = TypeDescriptor::concrete(TypeKey::named("Bare")).construct().unwrap_err();
        assert!(err.to_string().contains("Bare"));
    }
}
