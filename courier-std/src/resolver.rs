//! Type-closing resolver.
//!
//! Decides whether a candidate closes an open contract template and with which
//! arguments, and specializes open generic definitions to closed shapes.
//!
//! Matching is structural: templates are compared by identity, never by name.
//! Interface-like templates are matched against the shapes a candidate
//! declares; class-like templates against the specialization its base type
//! declares. Both walk the whole base chain.

use courier_core::{
    ContractShape, SkipReason, SpecializationSkipped, Template, TemplateKind, TypeArg,
    TypeDescriptor, TypeKey,
};
use std::sync::Arc;

/// Every shape of `template` that `candidate` closes, first-seen order, without
/// duplicates.
///
/// For a generic definition the shapes may still mention its parameters.
pub fn find_closed_shapes(candidate: &TypeDescriptor, template: &Template) -> Vec<ContractShape> {
    let mut found = Vec::new();
    let mut current = Some(candidate);
    while let Some(ty) = current {
        match template.kind() {
            TemplateKind::Interface => {
                for shape in ty.interfaces().filter(|s| s.template() == template) {
                    push_unique(&mut found, shape);
                }
            }
            TemplateKind::Class => {
                let specialized = ty.base().and_then(TypeDescriptor::definition);
                if let Some(shape) = specialized.filter(|s| s.template() == template) {
                    push_unique(&mut found, shape);
                }
            }
        }
        current = ty.base();
    }
    found
}

/// `true` when `candidate` closes `template` at least once.
pub fn implements_template(candidate: &TypeDescriptor, template: &Template) -> bool {
    !find_closed_shapes(candidate, template).is_empty()
}

/// `true` when `candidate` may be registered as it is.
pub fn is_registrable(candidate: &TypeDescriptor) -> bool {
    candidate.is_concrete()
}

/// Closes generic `definition` over the arguments of `shape`.
///
/// Each open shape the definition declares for the template is unified with
/// `shape`; the first that unifies decides the outcome. The bound arguments
/// must satisfy every parameter constraint and select an instantiation that
/// is concrete and provides `shape`.
pub fn specialize(
    definition: &TypeDescriptor,
    shape: &ContractShape,
) -> Result<Arc<TypeDescriptor>, SpecializationSkipped> {
    let skip = |reason| SpecializationSkipped {
        definition: definition.key().clone(),
        contract: shape.clone(),
        reason,
    };

    let Some(target) = shape.closed_args() else {
        return Err(skip(SkipReason::OpenContract));
    };

    let mut failure = SkipReason::NotImplemented;
    for open in find_closed_shapes(definition, shape.template()) {
        let bindings = match unify(definition.params().len(), &open, &target) {
            Ok(bindings) => bindings,
            Err(reason) => {
                failure = reason;
                continue;
            }
        };

        for (param, argument) in definition.params().iter().zip(&bindings) {
            if let Some(constraint) = param.violation(argument) {
                return Err(skip(SkipReason::ConstraintRejected {
                    param: param.name().to_owned(),
                    constraint: constraint.description().to_owned(),
                    argument: argument.clone(),
                }));
            }
        }

        let Some(closed) = definition.instantiation(&bindings) else {
            return Err(skip(SkipReason::NoInstantiation(bindings)));
        };
        if !is_registrable(closed) || !find_closed_shapes(closed, shape.template()).contains(shape) {
            return Err(skip(SkipReason::MissingContract(closed.key().clone())));
        }
        return Ok(Arc::clone(closed));
    }
    Err(skip(failure))
}

/// Binds the parameters of `open` positionally against `target`.
fn unify(
    param_count: usize,
    open: &ContractShape,
    target: &[TypeKey],
) -> Result<Vec<TypeKey>, SkipReason> {
    if open.args().len() != target.len() {
        return Err(SkipReason::ArityMismatch {
            expected: open.args().len(),
            found: target.len(),
        });
    }

    let mut slots: Vec<Option<TypeKey>> = vec![None; param_count];
    for (arg, key) in open.args().iter().zip(target) {
        match arg {
            TypeArg::Type(fixed) if fixed != key => {
                return Err(SkipReason::ArgumentMismatch {
                    expected: fixed.clone(),
                    found: key.clone(),
                });
            }
            TypeArg::Type(_) => {}
            TypeArg::Param(index) => {
                let slot = slots
                    .get_mut(*index)
                    .ok_or(SkipReason::UnknownParameter(*index))?;
                match slot.as_ref() {
                    Some(bound) if bound != key => {
                        return Err(SkipReason::ConflictingBinding {
                            param: *index,
                            first: bound.clone(),
                            second: key.clone(),
                        });
                    }
                    Some(_) => {}
                    None => *slot = Some(key.clone()),
                }
            }
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| slot.ok_or(SkipReason::Unbound(index)))
        .collect()
}

fn push_unique(found: &mut Vec<ContractShape>, shape: &ContractShape) {
    if !found.contains(shape) {
        found.push(shape.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::{Constraint, GenericParam, TypeKind};

    enum Handler {}
    enum Repository {}

    fn handler() -> Template {
        Template::interface::<Handler>("Handler", 2)
    }

    fn repository() -> Template {
        Template::class::<Repository>("Repository", 1)
    }

    fn key(name: &'static str) -> TypeKey {
        TypeKey::named(name)
    }

    fn closed(request: &'static str, response: &'static str) -> ContractShape {
        ContractShape::closed(handler(), [key(request), key(response)])
    }

    fn open_handler() -> ContractShape {
        ContractShape::new(handler(), [TypeArg::param(0), TypeArg::Type(key("Unit"))])
    }

    #[test]
    fn finds_interfaces_declared_on_the_candidate() {
        let candidate = TypeDescriptor::concrete(key("Both"))
            .implements(closed("Ping", "Pong"))
            .implements(closed("Query", "Rows"));

        assert_eq!(
            find_closed_shapes(&candidate, &handler()),
            [closed("Ping", "Pong"), closed("Query", "Rows")]
        );
    }

    #[test]
    fn finds_interfaces_inherited_through_the_base_chain() {
        let root = TypeDescriptor::abstract_type(key("Root")).implements(closed("Ping", "Pong"));
        let middle = TypeDescriptor::abstract_type(key("Middle"))
            .implements(closed("Ping", "Pong"))
            .extends(root);
        let leaf = TypeDescriptor::concrete(key("Leaf")).extends(middle);

        assert_eq!(find_closed_shapes(&leaf, &handler()), [closed("Ping", "Pong")]);
    }

    #[test]
    fn ignores_other_templates_with_the_same_name() {
        enum Impostor {}
        let impostor = ContractShape::closed(
            Template::interface::<Impostor>("Handler", 2),
            [key("Ping"), key("Pong")],
        );
        let candidate = TypeDescriptor::concrete(key("Fake")).implements(impostor);

        assert!(!implements_template(&candidate, &handler()));
    }

    #[test]
    fn class_templates_match_the_base_specialization() {
        let users = ContractShape::closed(repository(), [key("User")]);
        let base = TypeDescriptor::abstract_type(key("Repository<User>")).specializes(users.clone());
        let candidate = TypeDescriptor::concrete(key("UserRepository")).extends(base);

        assert_eq!(find_closed_shapes(&candidate, &repository()), [users]);
        assert!(!implements_template(&candidate, &handler()));
    }

    #[test]
    fn only_concrete_candidates_are_registrable() {
        assert!(is_registrable(&TypeDescriptor::concrete(key("A"))));
        assert!(!is_registrable(&TypeDescriptor::abstract_type(key("B"))));
        assert!(!is_registrable(&TypeDescriptor::generic("C", [GenericParam::new("T")])));
        assert_eq!(TypeDescriptor::generic("C", []).kind(), TypeKind::GenericDefinition);
    }

    fn audit(constraint: Option<Constraint>) -> TypeDescriptor {
        let mut param = GenericParam::new("T");
        if let Some(constraint) = constraint {
            param = param.with_constraint(constraint);
        }
        TypeDescriptor::generic("Audit", [param])
            .implements(open_handler())
            .instantiate(
                [key("Ping")],
                TypeDescriptor::concrete(key("ignored")).implements(closed("Ping", "Unit")),
            )
    }

    #[test]
    fn specializes_open_definitions() {
        let closed_ty = specialize(&audit(None), &closed("Ping", "Unit")).unwrap();
        assert_eq!(closed_ty.key().to_string(), "Audit<Ping>");
    }

    #[test]
    fn constraint_rejection_is_reported() {
        let skipped = specialize(&audit(Some(Constraint::not(key("Ping")))), &closed("Ping", "Unit"))
            .unwrap_err();
        assert!(matches!(skipped.reason, SkipReason::ConstraintRejected { .. }));
        assert_eq!(skipped.definition, key("Audit"));
    }

    #[test]
    fn fixed_arguments_must_match() {
        let skipped = specialize(&audit(None), &closed("Ping", "Pong")).unwrap_err();
        assert_eq!(
            skipped.reason,
            SkipReason::ArgumentMismatch {
                expected: key("Unit"),
                found: key("Pong"),
            }
        );
    }

    #[test]
    fn missing_instantiations_are_reported() {
        let skipped = specialize(&audit(None), &closed("Query", "Unit")).unwrap_err();
        assert_eq!(skipped.reason, SkipReason::NoInstantiation(vec![key("Query")]));
    }

    #[test]
    fn repeated_parameters_bind_consistently() {
        let same = ContractShape::new(handler(), [TypeArg::param(0), TypeArg::param(0)]);
        let echo = TypeDescriptor::generic("Echo", [GenericParam::new("T")])
            .implements(same)
            .instantiate(
                [key("Text")],
                TypeDescriptor::concrete(key("ignored")).implements(closed("Text", "Text")),
            );

        assert!(specialize(&echo, &closed("Text", "Text")).is_ok());
        let skipped = specialize(&echo, &closed("Text", "Bytes")).unwrap_err();
        assert!(matches!(skipped.reason, SkipReason::ConflictingBinding { param: 0, .. }));
    }

    #[test]
    fn unused_parameters_cannot_be_bound() {
        let definition = TypeDescriptor::generic("Wide", [GenericParam::new("T"), GenericParam::new("U")])
            .implements(open_handler());
        let skipped = specialize(&definition, &closed("Ping", "Unit")).unwrap_err();
        assert_eq!(skipped.reason, SkipReason::Unbound(1));
    }

    #[test]
    fn open_targets_are_never_specialized() {
        let skipped = specialize(&audit(None), &open_handler()).unwrap_err();
        assert_eq!(skipped.reason, SkipReason::OpenContract);
    }
}
