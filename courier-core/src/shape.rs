//! Contract shapes.
//!
//! A [`ContractShape`] is the type-level signature a handler must match: an
//! unbound [`Template`] plus its type arguments. Shapes whose arguments are all
//! bound are *closed* and act as registry keys; shapes that still mention a
//! generic parameter are *open* and only appear on generic definitions.

use crate::message::{Notification, Request, StreamRequest};
use std::{
    any::{TypeId, type_name},
    borrow::Cow,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

// ============================================================================
// Type keys
// ============================================================================

/// Identity of a type taking part in contract matching.
///
/// Keys are cheap to clone. Rust types are compared by [`TypeId`]; the stored
/// name is for display only.
#[derive(Clone)]
pub struct TypeKey(Arc<KeyRepr>);

enum KeyRepr {
    Rust { id: TypeId, name: &'static str },
    Named(Cow<'static, str>),
    Applied { definition: TypeKey, args: Vec<TypeKey> },
}

impl TypeKey {
    /// Key of a Rust type.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self(Arc::new(KeyRepr::Rust {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }))
    }

    /// A language-neutral key identified by name alone.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self(Arc::new(KeyRepr::Named(name.into())))
    }

    /// Key of `definition` closed over `args`.
    pub fn applied(definition: TypeKey, args: impl IntoIterator<Item = TypeKey>) -> Self {
        Self(Arc::new(KeyRepr::Applied {
            definition,
            args: args.into_iter().collect(),
        }))
    }

    /// Generic definition this key was applied from, if any.
    pub fn definition(&self) -> Option<&TypeKey> {
        match &*self.0 {
            KeyRepr::Applied { definition, .. } => Some(definition),
            _ => None,
        }
    }

    /// Type arguments of an applied key. Empty for every other key.
    pub fn args(&self) -> &[TypeKey] {
        match &*self.0 {
            KeyRepr::Applied { args, .. } => args,
            _ => &[],
        }
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        match (&*self.0, &*other.0) {
            (KeyRepr::Rust { id: a, .. }, KeyRepr::Rust { id: b, .. }) => a == b,
            (KeyRepr::Named(a), KeyRepr::Named(b)) => a == b,
            (
                KeyRepr::Applied {
                    definition: da,
                    args: aa,
                },
                KeyRepr::Applied {
                    definition: db,
                    args: ab,
                },
            ) => da == db && aa == ab,
            _ => false,
        }
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &*self.0 {
            KeyRepr::Rust { id, .. } => {
                state.write_u8(0);
                id.hash(state);
            }
            KeyRepr::Named(name) => {
                state.write_u8(1);
                name.hash(state);
            }
            KeyRepr::Applied { definition, args } => {
                state.write_u8(2);
                definition.hash(state);
                args.hash(state);
            }
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            KeyRepr::Rust { name, .. } => f.write_str(name),
            KeyRepr::Named(name) => f.write_str(name),
            KeyRepr::Applied { definition, args } => {
                write!(f, "{definition}<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
        }
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({self})")
    }
}

// ============================================================================
// Templates
// ============================================================================

/// Whether a template is matched against declared interfaces or against the
/// base type chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    /// Matched against the interfaces a candidate declares.
    Interface,
    /// Matched against the specialization a candidate's base type declares.
    Class,
}

/// The unbound form of a contract, such as `RequestHandler<_, _>`.
///
/// Identity comes from a marker type, never from the name.
#[derive(Clone, Copy)]
pub struct Template {
    id: TypeId,
    name: &'static str,
    arity: usize,
    kind: TemplateKind,
}

impl Template {
    /// Template identified by marker `M`.
    pub fn of<M: ?Sized + 'static>(name: &'static str, arity: usize, kind: TemplateKind) -> Self {
        Self {
            id: TypeId::of::<M>(),
            name,
            arity,
            kind,
        }
    }

    /// Interface-like template identified by marker `M`.
    pub fn interface<M: ?Sized + 'static>(name: &'static str, arity: usize) -> Self {
        Self::of::<M>(name, arity, TemplateKind::Interface)
    }

    /// Class-like template identified by marker `M`.
    pub fn class<M: ?Sized + 'static>(name: &'static str, arity: usize) -> Self {
        Self::of::<M>(name, arity, TemplateKind::Class)
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of type arguments.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Matching strategy.
    pub fn kind(&self) -> TemplateKind {
        self.kind
    }
}

impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Template {}

impl Hash for Template {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}

/// Built-in contract templates.
pub mod contracts {
    use super::Template;

    /// Marker for [`request_handler`].
    pub enum RequestHandlerContract {}
    /// Marker for [`notification_handler`].
    pub enum NotificationHandlerContract {}
    /// Marker for [`pipeline_behavior`].
    pub enum PipelineBehaviorContract {}
    /// Marker for [`pre_processor`].
    pub enum PreProcessorContract {}
    /// Marker for [`post_processor`].
    pub enum PostProcessorContract {}
    /// Marker for [`stream_handler`].
    pub enum StreamHandlerContract {}

    /// `RequestHandler<Request, Response>`.
    pub fn request_handler() -> Template {
        Template::interface::<RequestHandlerContract>("RequestHandler", 2)
    }

    /// `NotificationHandler<Notification>`.
    pub fn notification_handler() -> Template {
        Template::interface::<NotificationHandlerContract>("NotificationHandler", 1)
    }

    /// `PipelineBehavior<Request, Response>`.
    pub fn pipeline_behavior() -> Template {
        Template::interface::<PipelineBehaviorContract>("PipelineBehavior", 2)
    }

    /// `RequestPreProcessor<Request>`.
    pub fn pre_processor() -> Template {
        Template::interface::<PreProcessorContract>("RequestPreProcessor", 1)
    }

    /// `RequestPostProcessor<Request, Response>`.
    pub fn post_processor() -> Template {
        Template::interface::<PostProcessorContract>("RequestPostProcessor", 2)
    }

    /// `StreamRequestHandler<Request, Item>`.
    pub fn stream_handler() -> Template {
        Template::interface::<StreamHandlerContract>("StreamRequestHandler", 2)
    }

    /// Templates that admit one handler per shape.
    pub fn single_winner() -> Vec<Template> {
        vec![request_handler(), stream_handler()]
    }

    /// Templates that admit any number of handlers per shape.
    pub fn fan_out() -> Vec<Template> {
        vec![
            notification_handler(),
            pipeline_behavior(),
            pre_processor(),
            post_processor(),
        ]
    }
}

// ============================================================================
// Shapes
// ============================================================================

/// A type argument of a contract shape.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum TypeArg {
    /// A bound type.
    Type(TypeKey),
    /// The n-th generic parameter of the declaring definition.
    Param(usize),
}

impl TypeArg {
    /// Bound argument for Rust type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Type(TypeKey::of::<T>())
    }

    /// Reference to generic parameter `index`.
    pub fn param(index: usize) -> Self {
        Self::Param(index)
    }

    /// The bound type, if any.
    pub fn as_type(&self) -> Option<&TypeKey> {
        match self {
            Self::Type(key) => Some(key),
            Self::Param(_) => None,
        }
    }
}

impl From<TypeKey> for TypeArg {
    fn from(key: TypeKey) -> Self {
        Self::Type(key)
    }
}

impl fmt::Display for TypeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(key) => write!(f, "{key}"),
            Self::Param(index) => write!(f, "T{index}"),
        }
    }
}

impl fmt::Debug for TypeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// A contract template together with its type arguments.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ContractShape {
    template: Template,
    args: Vec<TypeArg>,
}

impl ContractShape {
    /// Shape with arbitrary, possibly open, arguments.
    pub fn new(template: Template, args: impl IntoIterator<Item = TypeArg>) -> Self {
        let args: Vec<_> = args.into_iter().collect();
        debug_assert_eq!(
            args.len(),
            template.arity(),
            "argument count does not match template `{}`",
            template.name()
        );
        Self { template, args }
    }

    /// Shape with every argument bound.
    pub fn closed(template: Template, args: impl IntoIterator<Item = TypeKey>) -> Self {
        Self::new(template, args.into_iter().map(TypeArg::Type))
    }

    /// `RequestHandler<R, R::Response>`.
    pub fn request_handler<R: Request>() -> Self {
        Self::closed(
            contracts::request_handler(),
            [TypeKey::of::<R>(), TypeKey::of::<R::Response>()],
        )
    }

    /// `NotificationHandler<N>`.
    pub fn notification_handler<N: Notification>() -> Self {
        Self::closed(contracts::notification_handler(), [TypeKey::of::<N>()])
    }

    /// `PipelineBehavior<R, R::Response>`.
    pub fn pipeline_behavior<R: Request>() -> Self {
        Self::closed(
            contracts::pipeline_behavior(),
            [TypeKey::of::<R>(), TypeKey::of::<R::Response>()],
        )
    }

    /// `RequestPreProcessor<R>`.
    pub fn pre_processor<R: Request>() -> Self {
        Self::closed(contracts::pre_processor(), [TypeKey::of::<R>()])
    }

    /// `RequestPostProcessor<R, R::Response>`.
    pub fn post_processor<R: Request>() -> Self {
        Self::closed(
            contracts::post_processor(),
            [TypeKey::of::<R>(), TypeKey::of::<R::Response>()],
        )
    }

    /// `StreamRequestHandler<R, R::Item>`.
    pub fn stream_handler<R: StreamRequest>() -> Self {
        Self::closed(
            contracts::stream_handler(),
            [TypeKey::of::<R>(), TypeKey::of::<R::Item>()],
        )
    }

    /// The unbound template.
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Type arguments in declaration order.
    pub fn args(&self) -> &[TypeArg] {
        &self.args
    }

    /// `true` when no argument refers to a generic parameter.
    pub fn is_closed(&self) -> bool {
        self.args.iter().all(|arg| matches!(arg, TypeArg::Type(_)))
    }

    /// The bound arguments of a closed shape.
    pub fn closed_args(&self) -> Option<Vec<TypeKey>> {
        self.args.iter().map(|arg| arg.as_type().cloned()).collect()
    }

    /// Replaces every `Param(i)` with `bindings[i]`.
    ///
    /// Returns `None` when a parameter index has no binding.
    pub fn substitute(&self, bindings: &[TypeKey]) -> Option<Self> {
        let args = self
            .args
            .iter()
            .map(|arg| match arg {
                TypeArg::Type(key) => Some(TypeArg::Type(key.clone())),
                TypeArg::Param(index) => bindings.get(*index).cloned().map(TypeArg::Type),
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            template: self.template,
            args,
        })
    }
}

impl fmt::Display for ContractShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<", self.template.name())?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(">")
    }
}

impl fmt::Debug for ContractShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    enum Marker {}
    enum OtherMarker {}

    #[test]
    fn template_identity_ignores_name() {
        let a = Template::interface::<Marker>("Handler", 1);
        let b = Template::interface::<Marker>("Renamed", 1);
        let c = Template::interface::<OtherMarker>("Handler", 1);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn closed_shapes_compare_by_template_and_arguments() {
        let template = Template::interface::<Marker>("Handler", 1);
        let a = ContractShape::closed(template, [TypeKey::of::<u8>()]);
        let b = ContractShape::closed(template, [TypeKey::of::<u8>()]);
        let c = ContractShape::closed(template, [TypeKey::of::<u16>()]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.is_closed());
    }

    #[test]
    fn substitution_closes_open_shapes() {
        let template = Template::interface::<Marker>("Pair", 2);
        let open = ContractShape::new(template, [TypeArg::param(0), TypeArg::of::<bool>()]);
        assert!(!open.is_closed());
        assert_eq!(open.closed_args(), None);

        let closed = open.substitute(&[TypeKey::of::<String>()]).unwrap();
        assert_eq!(
            closed,
            ContractShape::closed(template, [TypeKey::of::<String>(), TypeKey::of::<bool>()])
        );
        assert!(open.substitute(&[]).is_none());
    }

    #[test]
    fn applied_keys_render_their_arguments() {
        let key = TypeKey::applied(TypeKey::named("Audit"), [TypeKey::named("Ping")]);
        assert_eq!(key.to_string(), "Audit<Ping>");
        assert_eq!(key.definition(), Some(&TypeKey::named("Audit")));
        assert_eq!(key.args(), &[TypeKey::named("Ping")]);
        assert_ne!(key, TypeKey::named("Audit<Ping>"));
    }
}
