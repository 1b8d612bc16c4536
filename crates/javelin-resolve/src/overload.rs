//! Overload resolution (JLS 15.12.2) over methods or constructors.
//!
//! Applicability is tried in three phases: strict invocation (no boxing, no
//! varargs), loose invocation (boxing and unchecked conversion), then
//! variable-arity invocation. The first phase with an applicable candidate
//! wins, and the most specific candidate of that phase is chosen.

use javelin_types::relations::{is_assignable_by, subtype, type_equals};
use javelin_types::{ResolveError, ResolvedType, Substitution, TypeParamRef, TypeSolver};

use crate::infer;

/// One method or constructor under consideration.
#[derive(Debug, Clone)]
pub(crate) struct Candidate<D> {
    pub(crate) decl: D,
    /// Parameter types as seen through the receiver.
    pub(crate) formals: Vec<ResolvedType>,
    /// Variables to infer from the arguments.
    pub(crate) type_params: Vec<TypeParamRef>,
    pub(crate) variadic: bool,
    pub(crate) is_abstract: bool,
    /// Rendering used in ambiguity reports.
    pub(crate) label: String,
    /// Type arguments implied by the assignment context, used for variables
    /// the arguments leave unconstrained.
    pub(crate) seed: Substitution,
}

/// The chosen candidate and the substitution inferred for its type
/// parameters.
#[derive(Debug, Clone)]
pub(crate) struct Selected<D> {
    pub(crate) decl: D,
    pub(crate) substitution: Substitution,
}

/// A call site.
pub(crate) struct Call<'a> {
    pub(crate) name: &'a str,
    /// Where the call appears, for unsolved-symbol reports.
    pub(crate) context: String,
    pub(crate) args: &'a [ResolvedType],
    pub(crate) explicit_type_args: &'a [ResolvedType],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Strict,
    Loose,
    Variadic,
}

struct Applicable<'c, D> {
    candidate: &'c Candidate<D>,
    substitution: Substitution,
    /// Formals after substitution. In the variable-arity phase the trailing
    /// array is replaced by its element type, repeated to cover every
    /// argument and at least once.
    formals: Vec<ResolvedType>,
    expanded: bool,
}

/// Picks the most specific applicable candidate for `call`.
pub(crate) fn select<D: Clone>(
    solver: &dyn TypeSolver,
    call: &Call<'_>,
    candidates: &[Candidate<D>],
) -> Result<Selected<D>, ResolveError> {
    let _span = tracing::debug_span!(
        target: "javelin.resolve",
        "select_overload",
        name = call.name,
        candidates = candidates.len()
    )
    .entered();

    for phase in [Phase::Strict, Phase::Loose, Phase::Variadic] {
        let mut applicable = Vec::new();
        for candidate in candidates {
            if let Some(found) = applicable_in(solver, call, candidate, phase)? {
                applicable.push(found);
            }
        }
        if applicable.is_empty() {
            continue;
        }
        tracing::trace!(target: "javelin.resolve", ?phase, applicable = applicable.len(), "phase matched");
        return most_specific(solver, call, applicable);
    }

    let rendered = call
        .args
        .iter()
        .map(ResolvedType::describe)
        .collect::<Vec<_>>()
        .join(", ");
    Err(ResolveError::unsolved_symbol(
        format!("{}({rendered})", call.name),
        call.context.clone(),
    ))
}

fn applicable_in<'c, D>(
    solver: &dyn TypeSolver,
    call: &Call<'_>,
    candidate: &'c Candidate<D>,
    phase: Phase,
) -> Result<Option<Applicable<'c, D>>, ResolveError> {
    let arity = candidate.formals.len();
    let formals = match phase {
        Phase::Strict | Phase::Loose => {
            if call.args.len() != arity {
                return Ok(None);
            }
            candidate.formals.clone()
        }
        Phase::Variadic => {
            if !candidate.variadic || call.args.len() + 1 < arity {
                return Ok(None);
            }
            expand_variadic(&candidate.formals, call.args.len().max(arity))
        }
    };

    let substitution = if candidate.type_params.is_empty() {
        Substitution::new()
    } else if !call.explicit_type_args.is_empty() {
        match infer::explicit(&candidate.type_params, call.explicit_type_args) {
            Some(s) => s,
            None => return Ok(None),
        }
    } else {
        infer::infer(solver, &candidate.type_params, &formals, call.args, &candidate.seed)?
    };
    let formals: Vec<ResolvedType> = formals.iter().map(|f| f.substitute(&substitution)).collect();

    let accepts = |formal: &ResolvedType, arg: &ResolvedType| match phase {
        Phase::Strict => subtype(solver, arg, formal).is_yes(),
        Phase::Loose | Phase::Variadic => is_assignable_by(solver, formal, arg).is_yes(),
    };
    if !formals.iter().zip(call.args).all(|(f, a)| accepts(f, a)) {
        return Ok(None);
    }
    Ok(Some(Applicable {
        candidate,
        substitution,
        formals,
        expanded: phase == Phase::Variadic,
    }))
}

/// `m(A, B...)` expanded to `n` positions: `A` followed by `n - 1` copies of
/// `B`.
fn expand_variadic(formals: &[ResolvedType], count: usize) -> Vec<ResolvedType> {
    let Some((last, fixed)) = formals.split_last() else {
        return Vec::new();
    };
    let element = last.array_component().cloned().unwrap_or_else(|| last.clone());
    let mut out = fixed.to_vec();
    while out.len() < count {
        out.push(element.clone());
    }
    out
}

/// `s` is at least as specific as `t` for one parameter position.
fn at_least_as_specific(solver: &dyn TypeSolver, s: &ResolvedType, t: &ResolvedType) -> bool {
    match (s.as_primitive(), t.as_primitive()) {
        (Some(a), Some(b)) => a.widens_to(b),
        (None, None) => subtype(solver, s, t).is_yes(),
        _ => false,
    }
}

/// Variable-arity candidates (JLS 15.12.2.5) are compared position by
/// position with the shorter list padded by its trailing element type, so
/// `m(String...)` beats `m(Object...)` even for `m()`.
fn more_specific<D>(solver: &dyn TypeSolver, a: &Applicable<'_, D>, b: &Applicable<'_, D>) -> bool {
    if a.expanded && b.expanded {
        let len = a.formals.len().max(b.formals.len());
        return (0..len).all(|i| match (padded(&a.formals, i), padded(&b.formals, i)) {
            (Some(s), Some(t)) => at_least_as_specific(solver, s, t),
            _ => false,
        });
    }
    a.formals.len() == b.formals.len()
        && a
            .formals
            .iter()
            .zip(&b.formals)
            .all(|(s, t)| at_least_as_specific(solver, s, t))
}

fn padded(formals: &[ResolvedType], index: usize) -> Option<&ResolvedType> {
    formals.get(index).or_else(|| formals.last())
}

fn same_formals<D>(a: &Applicable<'_, D>, b: &Applicable<'_, D>) -> bool {
    a.formals.len() == b.formals.len() && a.formals.iter().zip(&b.formals).all(|(s, t)| type_equals(s, t))
}

fn most_specific<D: Clone>(
    solver: &dyn TypeSolver,
    call: &Call<'_>,
    applicable: Vec<Applicable<'_, D>>,
) -> Result<Selected<D>, ResolveError> {
    let maximal: Vec<&Applicable<'_, D>> = applicable
        .iter()
        .filter(|m| {
            !applicable.iter().any(|other| {
                !std::ptr::eq(*m, other) && more_specific(solver, other, m) && !more_specific(solver, m, other)
            })
        })
        .collect();

    let chosen = match maximal.as_slice() {
        [] => None,
        [only] => Some(*only),
        [first, rest @ ..] if rest.iter().all(|m| same_formals(first, m)) => {
            // Override-equivalent: a concrete method beats abstract ones.
            Some(
                maximal
                    .iter()
                    .copied()
                    .find(|m| !m.candidate.is_abstract)
                    .unwrap_or(*first),
            )
        }
        _ => None,
    };

    match chosen {
        Some(found) => Ok(Selected {
            decl: found.candidate.decl.clone(),
            substitution: found.substitution.clone(),
        }),
        None => {
            let pool: Vec<&Applicable<'_, D>> = if maximal.is_empty() {
                applicable.iter().collect()
            } else {
                maximal
            };
            Err(ResolveError::AmbiguousMethod {
                name: call.name.to_string(),
                candidates: pool.iter().map(|m| m.candidate.label.clone()).collect(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use javelin_types::{MemoryTypeSolver, PrimitiveType, StubTypeDecl, TypeSolver};

    use super::*;

    fn solver() -> MemoryTypeSolver {
        MemoryTypeSolver::new()
            .with(StubTypeDecl::class("java.lang.Object").build().unwrap())
            .with(StubTypeDecl::class("java.lang.Number").build().unwrap())
            .with(StubTypeDecl::class("java.lang.Integer").extends("java.lang.Number").build().unwrap())
            .with(StubTypeDecl::class("java.lang.Long").extends("java.lang.Number").build().unwrap())
            .with(StubTypeDecl::class("java.lang.String").build().unwrap())
    }

    fn named(solver: &MemoryTypeSolver, name: &str) -> ResolvedType {
        ResolvedType::raw(solver.solve_type(name).unwrap())
    }

    fn candidate(label: &str, formals: Vec<ResolvedType>, variadic: bool) -> Candidate<String> {
        Candidate {
            decl: label.to_string(),
            formals,
            type_params: Vec::new(),
            variadic,
            is_abstract: false,
            label: label.to_string(),
            seed: Substitution::new(),
        }
    }

    fn call(args: &[ResolvedType]) -> Call<'_> {
        Call {
            name: "m",
            context: "p.A".to_string(),
            args,
            explicit_type_args: &[],
        }
    }

    const INT: ResolvedType = ResolvedType::Primitive(PrimitiveType::Int);
    const LONG: ResolvedType = ResolvedType::Primitive(PrimitiveType::Long);

    #[test]
    fn strict_phase_beats_boxing() {
        let solver = solver();
        let candidates = [
            candidate("m(Integer)", vec![named(&solver, "java.lang.Integer")], false),
            candidate("m(long)", vec![LONG], false),
        ];
        let picked = select(&solver, &call(&[INT]), &candidates).unwrap();
        assert_eq!(picked.decl, "m(long)");
    }

    #[test]
    fn most_specific_reference_wins() {
        let solver = solver();
        let candidates = [
            candidate("m(Object)", vec![named(&solver, "java.lang.Object")], false),
            candidate("m(Number)", vec![named(&solver, "java.lang.Number")], false),
            candidate("m(String)", vec![named(&solver, "java.lang.String")], false),
        ];
        let args = [named(&solver, "java.lang.Integer")];
        let picked = select(&solver, &call(&args), &candidates).unwrap();
        assert_eq!(picked.decl, "m(Number)");
    }

    #[test]
    fn null_argument_between_unrelated_types_is_ambiguous() {
        let solver = solver();
        let candidates = [
            candidate("m(String)", vec![named(&solver, "java.lang.String")], false),
            candidate("m(Integer)", vec![named(&solver, "java.lang.Integer")], false),
        ];
        let err = select(&solver, &call(&[ResolvedType::Null]), &candidates).unwrap_err();
        match err {
            ResolveError::AmbiguousMethod { name, candidates } => {
                assert_eq!(name, "m");
                assert_eq!(candidates.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn variadic_phase_is_last() {
        let solver = solver();
        let ints = ResolvedType::array(INT).unwrap();
        let candidates = [
            candidate("m(int...)", vec![ints], true),
            candidate("m(int, int)", vec![INT, INT], false),
        ];
        assert_eq!(select(&solver, &call(&[INT, INT]), &candidates).unwrap().decl, "m(int, int)");
        assert_eq!(select(&solver, &call(&[INT, INT, INT]), &candidates).unwrap().decl, "m(int...)");
        assert_eq!(select(&solver, &call(&[]), &candidates).unwrap().decl, "m(int...)");
    }

    #[test]
    fn empty_variadic_call_prefers_the_narrower_element() {
        let solver = solver();
        let objects = ResolvedType::array(named(&solver, "java.lang.Object")).unwrap();
        let strings = ResolvedType::array(named(&solver, "java.lang.String")).unwrap();
        let forward = [
            candidate("m(Object...)", vec![objects.clone()], true),
            candidate("m(String...)", vec![strings.clone()], true),
        ];
        let backward = [
            candidate("m(String...)", vec![strings], true),
            candidate("m(Object...)", vec![objects], true),
        ];
        assert_eq!(select(&solver, &call(&[]), &forward).unwrap().decl, "m(String...)");
        assert_eq!(select(&solver, &call(&[]), &backward).unwrap().decl, "m(String...)");
    }

    #[test]
    fn no_applicable_candidate_is_unsolved() {
        let solver = solver();
        let candidates = [candidate("m(String)", vec![named(&solver, "java.lang.String")], false)];
        let err = select(&solver, &call(&[INT]), &candidates).unwrap_err();
        assert_eq!(err, ResolveError::unsolved_symbol("m(int)", "p.A"));
    }
}
