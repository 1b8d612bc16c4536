//! Type-argument inference for generic method and constructor calls.
//!
//! A reduced form of JLS 18: bounds are collected by matching each formal
//! parameter type against the argument type, then every inference variable
//! is resolved to its equality bound, else the lub of its lower bounds, else
//! the glb of its upper bounds, else the erasure of its declared bound.

use javelin_types::relations::{erasure, glb, instantiate_as_supertype, lub};
use javelin_types::{ResolveError, ResolvedType, Substitution, TypeParamRef, TypeSolver, Wildcard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// `T` must be a supertype of the argument.
    Lower,
    /// `T` must equal the argument.
    Exact,
    /// `T` must be a subtype of the argument.
    Upper,
}

struct Bounds {
    var: TypeParamRef,
    exact: Option<ResolvedType>,
    lower: Vec<ResolvedType>,
    upper: Vec<ResolvedType>,
}

struct Inference<'a> {
    solver: &'a dyn TypeSolver,
    vars: Vec<Bounds>,
}

/// Infers `type_params` from `formals` matched against `actuals`. Entries
/// of `seed`, such as those taken from an assignment target, are used only
/// for variables the arguments leave without any bound.
pub(crate) fn infer(
    solver: &dyn TypeSolver,
    type_params: &[TypeParamRef],
    formals: &[ResolvedType],
    actuals: &[ResolvedType],
    seed: &Substitution,
) -> Result<Substitution, ResolveError> {
    let mut inference = Inference::new(solver, type_params);
    for (formal, actual) in formals.iter().zip(actuals) {
        inference.collect(formal, actual, Position::Lower)?;
    }
    inference.resolve(seed, true)
}

/// What an assignment context says about `type_params` when a value of type
/// `result` flows into `target` (`List<String> l = new ArrayList<>()`).
/// Variables the target leaves open are not mapped.
pub(crate) fn from_target(
    solver: &dyn TypeSolver,
    type_params: &[TypeParamRef],
    result: &ResolvedType,
    target: &ResolvedType,
) -> Result<Substitution, ResolveError> {
    let mut inference = Inference::new(solver, type_params);
    match (result, target) {
        (ResolvedType::TypeVariable(_), _) if !target.is_primitive() => {
            inference.collect(result, target, Position::Upper)?;
        }
        (ResolvedType::Reference(_), ResolvedType::Reference(target_ref)) if !target_ref.is_raw() => {
            let view = instantiate_as_supertype(solver, result, target_ref.decl.as_ref())?;
            if let Some(ResolvedType::Reference(view)) = view {
                for (var_arg, target_arg) in view.args.iter().zip(&target_ref.args) {
                    match target_arg {
                        ResolvedType::Wildcard(Wildcard::Extends(b)) => inference.collect(var_arg, b, Position::Upper)?,
                        ResolvedType::Wildcard(Wildcard::Super(b)) => inference.collect(var_arg, b, Position::Lower)?,
                        ResolvedType::Wildcard(Wildcard::Unbounded) => {}
                        exact => inference.collect(var_arg, exact, Position::Exact)?,
                    }
                }
            }
        }
        _ => {}
    }
    inference.resolve(&Substitution::new(), false)
}

/// Explicit type arguments (`Collections.<String>emptyList()`). `None` when
/// the count does not match.
pub(crate) fn explicit(type_params: &[TypeParamRef], args: &[ResolvedType]) -> Option<Substitution> {
    (type_params.len() == args.len())
        .then(|| Substitution::from_pairs(type_params.iter().cloned(), args.iter().cloned()))
}

impl<'a> Inference<'a> {
    fn new(solver: &'a dyn TypeSolver, type_params: &[TypeParamRef]) -> Self {
        Inference {
            solver,
            vars: type_params
                .iter()
                .map(|tp| Bounds {
                    var: tp.clone(),
                    exact: None,
                    lower: Vec::new(),
                    upper: Vec::new(),
                })
                .collect(),
        }
    }

    fn slot(&mut self, tp: &TypeParamRef) -> Option<&mut Bounds> {
        let origin = tp.origin();
        self.vars.iter_mut().find(|b| b.var.origin() == origin)
    }

    fn boxed(&self, ty: &ResolvedType) -> Result<ResolvedType, ResolveError> {
        match ty {
            ResolvedType::Primitive(p) => Ok(ResolvedType::raw(self.solver.solve_type(p.boxed_name())?)),
            other => Ok(other.clone()),
        }
    }

    fn collect(&mut self, formal: &ResolvedType, actual: &ResolvedType, position: Position) -> Result<(), ResolveError> {
        if actual.is_null() {
            return Ok(());
        }
        match formal {
            ResolvedType::TypeVariable(tp) => {
                let actual = self.boxed(actual)?;
                if let Some(slot) = self.slot(tp) {
                    match position {
                        Position::Lower => slot.lower.push(actual),
                        Position::Upper => slot.upper.push(actual),
                        Position::Exact => {
                            if slot.exact.is_none() {
                                slot.exact = Some(actual);
                            }
                        }
                    }
                }
            }
            ResolvedType::Array(component) => {
                if let Some(actual_component) = actual.array_component() {
                    if actual_component.is_reference_type() {
                        self.collect(component, actual_component, position)?;
                    }
                }
            }
            ResolvedType::Reference(reference) if !reference.args.is_empty() => {
                let actual = self.boxed(actual)?;
                let view = instantiate_as_supertype(self.solver, &actual, reference.decl.as_ref())?;
                let Some(ResolvedType::Reference(view)) = view else {
                    return Ok(());
                };
                if view.is_raw() {
                    return Ok(());
                }
                for (formal_arg, actual_arg) in reference.args.iter().zip(&view.args) {
                    self.collect_argument(formal_arg, actual_arg)?;
                }
            }
            ResolvedType::Wildcard(Wildcard::Extends(bound)) => self.collect(bound, actual, Position::Lower)?,
            ResolvedType::Wildcard(Wildcard::Super(bound)) => self.collect(bound, actual, Position::Upper)?,
            _ => {}
        }
        Ok(())
    }

    /// Type arguments are invariant unless the formal is a wildcard.
    fn collect_argument(&mut self, formal: &ResolvedType, actual: &ResolvedType) -> Result<(), ResolveError> {
        match (formal, actual) {
            (ResolvedType::Wildcard(Wildcard::Extends(f)), ResolvedType::Wildcard(Wildcard::Extends(a))) => {
                self.collect(f, a, Position::Lower)
            }
            (ResolvedType::Wildcard(Wildcard::Super(f)), ResolvedType::Wildcard(Wildcard::Super(a))) => {
                self.collect(f, a, Position::Upper)
            }
            (ResolvedType::Wildcard(_), ResolvedType::Wildcard(_)) => Ok(()),
            (ResolvedType::Wildcard(Wildcard::Extends(f)), a) => self.collect(f, a, Position::Lower),
            (ResolvedType::Wildcard(Wildcard::Super(f)), a) => self.collect(f, a, Position::Upper),
            (ResolvedType::Wildcard(Wildcard::Unbounded), _) => Ok(()),
            (f, ResolvedType::Wildcard(_)) if !f.is_type_variable() => Ok(()),
            (f, a) => self.collect(f, a, Position::Exact),
        }
    }

    /// Without `fallback`, variables with no bound at all stay unmapped.
    fn resolve(self, seed: &Substitution, fallback: bool) -> Result<Substitution, ResolveError> {
        let mut out = Substitution::new();
        for bounds in self.vars {
            let ty = if let Some(exact) = bounds.exact {
                exact
            } else if !bounds.lower.is_empty() {
                lub(self.solver, &bounds.lower)?
            } else if !bounds.upper.is_empty() {
                glb(self.solver, &bounds.upper)?
            } else if let Some(seeded) = seed.get(&bounds.var) {
                seeded.clone()
            } else if fallback {
                erasure(self.solver, &ResolvedType::TypeVariable(bounds.var.clone()))?
            } else {
                continue;
            };
            tracing::trace!(target: "javelin.infer", var = bounds.var.name(), ty = %ty, "inferred");
            out.insert(bounds.var, ty);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use javelin_types::{MemoryTypeSolver, StubTypeDecl};

    use super::*;

    fn solver() -> MemoryTypeSolver {
        MemoryTypeSolver::new()
            .with(StubTypeDecl::class("java.lang.Object").build().unwrap())
            .with(StubTypeDecl::class("java.lang.Number").build().unwrap())
            .with(StubTypeDecl::class("java.lang.Integer").extends("java.lang.Number").build().unwrap())
            .with(StubTypeDecl::class("java.lang.String").build().unwrap())
            .with(
                StubTypeDecl::interface("java.util.Collection")
                    .type_param("E", &[])
                    .build()
                    .unwrap(),
            )
            .with(
                StubTypeDecl::interface("java.util.List")
                    .type_param("E", &[])
                    .implements("java.util.Collection<E>")
                    .build()
                    .unwrap(),
            )
    }

    fn var(name: &str) -> TypeParamRef {
        StubTypeDecl::class("p.G")
            .type_param(name, &[])
            .build()
            .unwrap()
            .type_parameters()
            .remove(0)
    }

    fn named(solver: &MemoryTypeSolver, name: &str, args: Vec<ResolvedType>) -> ResolvedType {
        ResolvedType::reference(solver.solve_type(name).unwrap(), args)
    }

    #[test]
    fn primitive_arguments_are_boxed_and_joined() {
        let solver = solver();
        let t = var("T");
        let formal = ResolvedType::TypeVariable(t.clone());
        let subst = infer(
            &solver,
            &[t.clone()],
            &[formal.clone(), formal],
            &[ResolvedType::Primitive(javelin_types::PrimitiveType::Int), ResolvedType::Null],
            &Substitution::new(),
        )
        .unwrap();
        assert_eq!(subst.get(&t).unwrap().describe(), "java.lang.Integer");
    }

    #[test]
    fn arguments_are_matched_through_supertypes() {
        let solver = solver();
        let t = var("T");
        let formal = named(
            &solver,
            "java.util.Collection",
            vec![ResolvedType::Wildcard(Wildcard::Extends(Box::new(ResolvedType::TypeVariable(t.clone()))))],
        );
        let actual = named(&solver, "java.util.List", vec![named(&solver, "java.lang.String", vec![])]);
        let subst = infer(&solver, &[t.clone()], &[formal], &[actual], &Substitution::new()).unwrap();
        assert_eq!(subst.get(&t).unwrap().describe(), "java.lang.String");
    }

    #[test]
    fn unconstrained_variables_erase() {
        let solver = solver();
        let t = var("T");
        let subst = infer(&solver, &[t.clone()], &[], &[], &Substitution::new()).unwrap();
        assert_eq!(subst.get(&t).unwrap().describe(), "java.lang.Object");

        let mut seed = Substitution::new();
        seed.insert(t.clone(), named(&solver, "java.lang.String", vec![]));
        let subst = infer(&solver, &[t.clone()], &[], &[], &seed).unwrap();
        assert_eq!(subst.get(&t).unwrap().describe(), "java.lang.String");
    }

    #[test]
    fn argument_bounds_win_over_the_target() {
        let solver = solver();
        let t = var("T");
        let formal = ResolvedType::TypeVariable(t.clone());
        let mut seed = Substitution::new();
        seed.insert(t.clone(), named(&solver, "java.lang.Object", vec![]));
        let subst = infer(
            &solver,
            &[t.clone()],
            &[formal],
            &[named(&solver, "java.lang.String", vec![])],
            &seed,
        )
        .unwrap();
        assert_eq!(subst.get(&t).unwrap().describe(), "java.lang.String");
    }

    #[test]
    fn assignment_target_constrains_the_result() {
        let solver = solver();
        let list = solver.solve_type("java.util.List").unwrap();
        let e = list.type_parameters().remove(0);
        let string = named(&solver, "java.lang.String", vec![]);
        let target = named(&solver, "java.util.List", vec![string]);

        let subst = from_target(&solver, &[e.clone()], &list.self_type(), &target).unwrap();
        assert_eq!(subst.get(&e).unwrap().describe(), "java.lang.String");

        let unrelated = var("U");
        let subst = from_target(&solver, &[unrelated.clone()], &list.self_type(), &target).unwrap();
        assert!(subst.get(&unrelated).is_none());
    }

    #[test]
    fn explicit_arguments_must_match_in_number() {
        let t = var("T");
        assert!(explicit(&[t.clone()], &[]).is_none());
        assert!(explicit(&[t], &[ResolvedType::Null]).is_some());
    }
}
