//! Subtyping, assignability, erasure, ancestor walks, lub and glb.

use std::collections::{HashSet, VecDeque};

use crate::constant::ConstantValue;
use crate::decl::{ReferenceTypeDecl, TypeDeclRef};
use crate::error::{DeclError, ResolveError};
use crate::primitive::PrimitiveType;
use crate::solver::TypeSolver;
use crate::subst::{substitute, Substitution};
use crate::ty::{ReferenceType, ResolvedType, Wildcard};

const MAX_DEPTH: usize = 32;
const LUB_ARG_DEPTH: usize = 1;

/// Three-valued result: `Unknown` only when a participating declaration could
/// not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Answer {
    Yes,
    No,
    Unknown,
}

impl Answer {
    pub fn is_yes(self) -> bool {
        self == Answer::Yes
    }

    pub fn is_no(self) -> bool {
        self == Answer::No
    }

    pub fn and(self, other: impl FnOnce() -> Answer) -> Answer {
        match self {
            Answer::No => Answer::No,
            Answer::Yes => other(),
            Answer::Unknown => match other() {
                Answer::No => Answer::No,
                _ => Answer::Unknown,
            },
        }
    }

    pub fn or(self, other: impl FnOnce() -> Answer) -> Answer {
        match self {
            Answer::Yes => Answer::Yes,
            Answer::No => other(),
            Answer::Unknown => match other() {
                Answer::Yes => Answer::Yes,
                _ => Answer::Unknown,
            },
        }
    }

    pub fn all<I: IntoIterator<Item = Answer>>(answers: I) -> Answer {
        answers
            .into_iter()
            .fold(Answer::Yes, |acc, a| acc.and(|| a))
    }

    pub fn any<I: IntoIterator<Item = Answer>>(answers: I) -> Answer {
        answers
            .into_iter()
            .fold(Answer::No, |acc, a| acc.or(|| a))
    }
}

impl From<bool> for Answer {
    fn from(value: bool) -> Self {
        if value {
            Answer::Yes
        } else {
            Answer::No
        }
    }
}

pub fn object_type(solver: &dyn TypeSolver) -> Result<ResolvedType, ResolveError> {
    Ok(ResolvedType::raw(solver.java_lang_object()?))
}

fn is_object(ty: &ResolvedType) -> bool {
    ty.is_class_named("java.lang.Object")
}

/// Structural type equality. Class types compare by qualified name so that
/// the same class reached through different providers is one type.
pub fn type_equals(a: &ResolvedType, b: &ResolvedType) -> bool {
    use ResolvedType::*;
    match (a, b) {
        (Reference(x), Reference(y)) => {
            x.decl.qualified_name() == y.decl.qualified_name()
                && x.args.len() == y.args.len()
                && x.args.iter().zip(&y.args).all(|(p, q)| type_equals(p, q))
        }
        (Array(x), Array(y)) => type_equals(x, y),
        (Wildcard(x), Wildcard(y)) => match (x, y) {
            (crate::ty::Wildcard::Unbounded, crate::ty::Wildcard::Unbounded) => true,
            (crate::ty::Wildcard::Extends(p), crate::ty::Wildcard::Extends(q))
            | (crate::ty::Wildcard::Super(p), crate::ty::Wildcard::Super(q)) => type_equals(p, q),
            _ => false,
        },
        (Intersection(x), Intersection(y)) | (Union(x), Union(y)) => {
            x.len() == y.len() && x.iter().all(|p| y.iter().any(|q| type_equals(p, q)))
        }
        _ => a == b,
    }
}

/// `S <: T` (JLS 4.10).
pub fn subtype(solver: &dyn TypeSolver, s: &ResolvedType, t: &ResolvedType) -> Answer {
    subtype_at(solver, s, t, 0)
}

pub fn is_subtype(solver: &dyn TypeSolver, s: &ResolvedType, t: &ResolvedType) -> bool {
    subtype(solver, s, t).is_yes()
}

fn subtype_at(solver: &dyn TypeSolver, s: &ResolvedType, t: &ResolvedType, depth: usize) -> Answer {
    use ResolvedType::*;
    if depth > MAX_DEPTH {
        return Answer::Unknown;
    }
    if type_equals(s, t) {
        return Answer::Yes;
    }
    let next = depth + 1;
    match (s, t) {
        (Void, _) | (_, Void) => Answer::No,
        (Primitive(a), Primitive(b)) => a.widens_to(*b).into(),
        (Primitive(_), _) | (_, Primitive(_)) => Answer::No,
        (Null, _) => Answer::Yes,
        (_, Null) => Answer::No,
        (_, Union(parts)) => Answer::any(parts.iter().map(|p| subtype_at(solver, s, p, next))),
        (Union(parts), _) => Answer::all(parts.iter().map(|p| subtype_at(solver, p, t, next))),
        (_, Intersection(parts)) => {
            Answer::all(parts.iter().map(|p| subtype_at(solver, s, p, next)))
        }
        (Intersection(parts), _) => {
            Answer::any(parts.iter().map(|p| subtype_at(solver, p, t, next)))
        }
        (Wildcard(w), _) => match w {
            crate::ty::Wildcard::Extends(b) => subtype_at(solver, b, t, next),
            _ => is_object(t).into(),
        },
        (_, Wildcard(crate::ty::Wildcard::Super(b))) => subtype_at(solver, s, b, next),
        (_, Wildcard(_)) => Answer::No,
        (_, Reference(_)) if is_object(t) => Answer::Yes,
        (TypeVariable(tp), _) => match tp.bounds(solver) {
            Ok(bounds) if bounds.is_empty() => Answer::No,
            Ok(bounds) => Answer::any(bounds.iter().map(|b| subtype_at(solver, b, t, next))),
            Err(_) => Answer::Unknown,
        },
        (_, TypeVariable(_)) => Answer::No,
        (Array(sc), Array(tc)) => {
            if sc.is_primitive() || tc.is_primitive() {
                type_equals(sc, tc).into()
            } else {
                subtype_at(solver, sc, tc, next)
            }
        }
        (Array(_), Reference(r)) => matches!(
            r.decl.qualified_name().as_str(),
            "java.lang.Cloneable" | "java.io.Serializable"
        )
        .into(),
        (Reference(_), Array(_)) => Answer::No,
        (Reference(_), Reference(tr)) => {
            let inst = match instantiate_as_supertype(solver, s, tr.decl.as_ref()) {
                Ok(Some(inst)) => inst,
                Ok(None) => return Answer::No,
                Err(_) => return Answer::Unknown,
            };
            if tr.args.is_empty() {
                return Answer::Yes;
            }
            let Some(inst) = inst.as_reference() else {
                return Answer::No;
            };
            if inst.args.len() != tr.args.len() {
                return Answer::No;
            }
            Answer::all(
                tr.args
                    .iter()
                    .zip(&inst.args)
                    .map(|(ta, sa)| contains_at(solver, ta, sa, next)),
            )
        }
    }
}

/// Type-argument containment `S <= T` (JLS 4.5.1).
pub fn contains(solver: &dyn TypeSolver, t_arg: &ResolvedType, s_arg: &ResolvedType) -> Answer {
    contains_at(solver, t_arg, s_arg, 0)
}

fn contains_at(
    solver: &dyn TypeSolver,
    t_arg: &ResolvedType,
    s_arg: &ResolvedType,
    depth: usize,
) -> Answer {
    let next = depth + 1;
    match t_arg {
        ResolvedType::Wildcard(Wildcard::Unbounded) => Answer::Yes,
        ResolvedType::Wildcard(Wildcard::Extends(upper)) => match s_arg {
            ResolvedType::Wildcard(Wildcard::Extends(b)) => subtype_at(solver, b, upper, next),
            ResolvedType::Wildcard(_) => is_object(upper).into(),
            other => subtype_at(solver, other, upper, next),
        },
        ResolvedType::Wildcard(Wildcard::Super(lower)) => match s_arg {
            ResolvedType::Wildcard(Wildcard::Super(b)) => subtype_at(solver, lower, b, next),
            ResolvedType::Wildcard(_) => Answer::No,
            other => subtype_at(solver, lower, other, next),
        },
        exact => type_equals(exact, s_arg).into(),
    }
}

/// `T t = s;` without a constant value: subtyping, boxing/unboxing and
/// unchecked conversion.
pub fn is_assignable_by(solver: &dyn TypeSolver, target: &ResolvedType, source: &ResolvedType) -> Answer {
    let direct = subtype(solver, source, target);
    if direct.is_yes() {
        return direct;
    }
    let converted = match (target, source) {
        (ResolvedType::Primitive(t), _) if source.is_reference_type() => {
            match source.unboxed() {
                Some(p) => p.widens_to(*t).into(),
                None => Answer::No,
            }
        }
        (_, ResolvedType::Primitive(s)) if target.is_reference_type() => {
            match solver.try_lookup(s.boxed_name()) {
                Ok(Some(boxed)) => subtype(solver, &ResolvedType::raw(boxed), target),
                Ok(None) | Err(_) => Answer::Unknown,
            }
        }
        (ResolvedType::Reference(tr), ResolvedType::Reference(_)) => {
            match instantiate_as_supertype(solver, source, tr.decl.as_ref()) {
                // Unchecked conversion: raw source to a parameterized target.
                Ok(Some(inst)) => inst.as_reference().is_some_and(|r| r.args.is_empty()).into(),
                Ok(None) => Answer::No,
                Err(_) => Answer::Unknown,
            }
        }
        (ResolvedType::Array(tc), ResolvedType::Array(sc))
            if tc.is_reference_type() && sc.is_reference_type() =>
        {
            is_assignable_by(solver, tc, sc)
        }
        _ => Answer::No,
    };
    direct.or(|| converted)
}

/// Assignment of a compile-time constant: additionally admits narrowing of
/// `int`-like constants into `byte`, `short`, `char` and their wrappers.
pub fn is_assignable_by_constant(
    solver: &dyn TypeSolver,
    target: &ResolvedType,
    source: &ResolvedType,
    value: &ConstantValue,
) -> Answer {
    let plain = is_assignable_by(solver, target, source);
    if plain.is_yes() {
        return plain;
    }
    let narrow = target
        .numeric_view()
        .filter(|p| matches!(p, PrimitiveType::Byte | PrimitiveType::Short | PrimitiveType::Char))
        .is_some_and(|p| source.as_primitive().is_some() && p.admits_constant(value));
    plain.or(|| narrow.into())
}

/// Type erasure (JLS 4.6).
pub fn erasure(solver: &dyn TypeSolver, ty: &ResolvedType) -> Result<ResolvedType, ResolveError> {
    erasure_at(solver, ty, 0)
}

fn erasure_at(solver: &dyn TypeSolver, ty: &ResolvedType, depth: usize) -> Result<ResolvedType, ResolveError> {
    if depth > MAX_DEPTH {
        return object_type(solver);
    }
    let next = depth + 1;
    Ok(match ty {
        ResolvedType::Reference(r) => ResolvedType::raw(r.decl.clone()),
        ResolvedType::Array(c) => ResolvedType::Array(Box::new(erasure_at(solver, c, next)?)),
        ResolvedType::TypeVariable(tp) => match tp.bounds(solver)?.first() {
            Some(first) => erasure_at(solver, first, next)?,
            None => object_type(solver)?,
        },
        ResolvedType::Wildcard(Wildcard::Extends(b)) => erasure_at(solver, b, next)?,
        ResolvedType::Wildcard(_) => object_type(solver)?,
        ResolvedType::Intersection(parts) => {
            let erased = parts
                .iter()
                .map(|p| erasure_at(solver, p, next))
                .collect::<Result<Vec<_>, _>>()?;
            let class_part = erased
                .iter()
                .find(|e| e.type_decl().is_some_and(|d| !d.is_interface()))
                .or_else(|| erased.first());
            match class_part {
                Some(part) => part.clone(),
                None => object_type(solver)?,
            }
        }
        ResolvedType::Union(parts) => erasure_at(solver, &lub(solver, parts)?, next)?,
        other => other.clone(),
    })
}

/// `ty` viewed as an instance of `target`, walking supertypes and applying
/// type-argument substitution. `ArrayList<String>` as `List` is
/// `List<String>`. Raw types stay raw.
pub fn instantiate_as_supertype(
    solver: &dyn TypeSolver,
    ty: &ResolvedType,
    target: &dyn ReferenceTypeDecl,
) -> Result<Option<ResolvedType>, ResolveError> {
    let mut seen = HashSet::new();
    instantiate_inner(solver, ty, &target.qualified_name(), &mut seen)
}

fn instantiate_inner(
    solver: &dyn TypeSolver,
    ty: &ResolvedType,
    target: &str,
    seen_vars: &mut HashSet<crate::decl::DeclOrigin>,
) -> Result<Option<ResolvedType>, ResolveError> {
    match ty {
        ResolvedType::Reference(r) => {
            if r.decl.qualified_name() == target {
                return Ok(Some(ty.clone()));
            }
            Ok(all_ancestors(solver, ty)?
                .into_iter()
                .find(|a| a.qualified_name().as_deref() == Some(target)))
        }
        ResolvedType::Array(_) => {
            if matches!(target, "java.lang.Object" | "java.lang.Cloneable" | "java.io.Serializable") {
                Ok(Some(ResolvedType::raw(solver.solve_type(target)?)))
            } else {
                Ok(None)
            }
        }
        ResolvedType::TypeVariable(tp) => {
            if !seen_vars.insert(tp.origin()) {
                return Ok(None);
            }
            let mut bounds = tp.bounds(solver)?;
            if bounds.is_empty() {
                bounds.push(object_type(solver)?);
            }
            for bound in &bounds {
                if let Some(found) = instantiate_inner(solver, bound, target, seen_vars)? {
                    return Ok(Some(found));
                }
            }
            Ok(None)
        }
        ResolvedType::Wildcard(Wildcard::Extends(b)) => instantiate_inner(solver, b, target, seen_vars),
        ResolvedType::Intersection(parts) => {
            for part in parts {
                if let Some(found) = instantiate_inner(solver, part, target, seen_vars)? {
                    return Ok(Some(found));
                }
            }
            Ok(None)
        }
        _ => Ok(None),
    }
}

/// Every proper supertype of a class type, breadth first, with type arguments
/// substituted. Cycles are cut by qualified name. Interfaces get
/// `java.lang.Object` last.
pub fn all_ancestors(solver: &dyn TypeSolver, ty: &ResolvedType) -> Result<Vec<ResolvedType>, ResolveError> {
    let Some(start) = ty.as_reference() else {
        return Ok(Vec::new());
    };
    let _span = tracing::trace_span!("all_ancestors", ty = %start.decl.qualified_name()).entered();

    let mut out = Vec::new();
    let mut seen = HashSet::from([start.decl.qualified_name()]);
    let mut queue = VecDeque::from([start.clone()]);
    let mut needs_object = false;

    while let Some(current) = queue.pop_front() {
        let raw = current.is_raw();
        let subst = if raw {
            Substitution::new()
        } else {
            Substitution::for_reference(&current)
        };
        if current.decl.is_interface() {
            needs_object = true;
        }
        for ancestor in current.decl.ancestors(solver)? {
            let ancestor = if raw {
                erasure(solver, &ancestor)?
            } else {
                substitute(&ancestor, &subst)
            };
            let ResolvedType::Reference(reference) = ancestor else {
                continue;
            };
            if seen.insert(reference.decl.qualified_name()) {
                out.push(ResolvedType::Reference(reference.clone()));
                queue.push_back(reference);
            }
        }
    }

    if needs_object && !seen.contains("java.lang.Object") {
        if let Some(object) = solver.try_lookup("java.lang.Object")? {
            out.push(ResolvedType::raw(object));
        }
    }
    Ok(out)
}

/// Erased supertype set of `ty`, itself included, in breadth-first order.
fn erased_supertypes(solver: &dyn TypeSolver, ty: &ResolvedType) -> Result<Vec<TypeDeclRef>, ResolveError> {
    Ok(match ty {
        ResolvedType::Reference(r) => {
            let mut out = vec![r.decl.clone()];
            out.extend(
                all_ancestors(solver, &ResolvedType::raw(r.decl.clone()))?
                    .into_iter()
                    .filter_map(|a| a.type_decl().cloned()),
            );
            out
        }
        ResolvedType::Array(_) => ["java.lang.Object", "java.lang.Cloneable", "java.io.Serializable"]
            .into_iter()
            .filter_map(|n| solver.try_lookup(n).ok().flatten())
            .collect(),
        ResolvedType::TypeVariable(tp) => {
            let mut bounds = tp.bounds(solver)?;
            if bounds.is_empty() {
                bounds.push(object_type(solver)?);
            }
            let mut out: Vec<TypeDeclRef> = Vec::new();
            for bound in &bounds {
                for decl in erased_supertypes(solver, bound)? {
                    if !out.iter().any(|d| d.qualified_name() == decl.qualified_name()) {
                        out.push(decl);
                    }
                }
            }
            out
        }
        ResolvedType::Intersection(parts) => {
            let mut out: Vec<TypeDeclRef> = Vec::new();
            for part in parts {
                for decl in erased_supertypes(solver, part)? {
                    if !out.iter().any(|d| d.qualified_name() == decl.qualified_name()) {
                        out.push(decl);
                    }
                }
            }
            out
        }
        _ => Vec::new(),
    })
}

/// Least upper bound (JLS 4.10.4), without infinite-type construction:
/// differing type arguments become `? extends lub(...)` to a small depth and
/// `?` beyond it.
pub fn lub(solver: &dyn TypeSolver, types: &[ResolvedType]) -> Result<ResolvedType, ResolveError> {
    lub_at(solver, types, 0)
}

fn lub_at(solver: &dyn TypeSolver, types: &[ResolvedType], depth: usize) -> Result<ResolvedType, ResolveError> {
    let mut inputs: Vec<ResolvedType> = Vec::with_capacity(types.len());
    for ty in types.iter().filter(|t| !t.is_null()) {
        let ty = match ty {
            ResolvedType::Primitive(p) => ResolvedType::raw(solver.solve_type(p.boxed_name())?),
            other => other.clone(),
        };
        if !inputs.iter().any(|i| type_equals(i, &ty)) {
            inputs.push(ty);
        }
    }
    match inputs.len() {
        0 if types.is_empty() => {
            return Err(DeclError::InvariantViolation("lub of no types".to_string()).into())
        }
        0 => return Ok(ResolvedType::Null),
        1 => return Ok(inputs.remove(0)),
        _ => {}
    }

    // Erased candidates shared by every input, in the first input's order.
    let sets = inputs
        .iter()
        .map(|t| erased_supertypes(solver, t))
        .collect::<Result<Vec<_>, _>>()?;
    let candidates: Vec<TypeDeclRef> = sets[0]
        .iter()
        .filter(|c| {
            let name = c.qualified_name();
            sets[1..]
                .iter()
                .all(|set| set.iter().any(|d| d.qualified_name() == name))
        })
        .cloned()
        .collect();

    // Minimal candidates: drop any candidate that is a proper supertype of another.
    let mut minimal: Vec<TypeDeclRef> = Vec::new();
    for candidate in &candidates {
        let name = candidate.qualified_name();
        let mut dominated = false;
        for other in &candidates {
            if other.qualified_name() == name {
                continue;
            }
            let supers = erased_supertypes(solver, &ResolvedType::raw(other.clone()))?;
            if supers.iter().any(|s| s.qualified_name() == name) {
                dominated = true;
                break;
            }
        }
        if !dominated {
            minimal.push(candidate.clone());
        }
    }
    if minimal.is_empty() {
        return object_type(solver);
    }

    let mut parts = Vec::with_capacity(minimal.len());
    for candidate in &minimal {
        parts.push(parameterize_candidate(solver, &inputs, candidate, depth)?);
    }
    // Classes before interfaces, as intersection types are written.
    parts.sort_by_key(|p| p.type_decl().map_or(true, |d| d.is_interface()));
    Ok(ResolvedType::intersection(parts)?)
}

fn parameterize_candidate(
    solver: &dyn TypeSolver,
    inputs: &[ResolvedType],
    candidate: &TypeDeclRef,
    depth: usize,
) -> Result<ResolvedType, ResolveError> {
    let mut instantiations: Vec<ReferenceType> = Vec::with_capacity(inputs.len());
    for input in inputs {
        match instantiate_as_supertype(solver, input, candidate.as_ref())? {
            Some(ResolvedType::Reference(r)) => instantiations.push(r),
            _ => return Ok(ResolvedType::raw(candidate.clone())),
        }
    }
    if instantiations.iter().any(|r| r.args.is_empty()) {
        return Ok(ResolvedType::raw(candidate.clone()));
    }
    let arity = instantiations[0].args.len();
    if instantiations.iter().any(|r| r.args.len() != arity) {
        return Ok(ResolvedType::raw(candidate.clone()));
    }

    let mut args = Vec::with_capacity(arity);
    for i in 0..arity {
        let column: Vec<ResolvedType> = instantiations.iter().map(|r| r.args[i].clone()).collect();
        if column.iter().all(|a| type_equals(a, &column[0])) {
            args.push(column[0].clone());
        } else if depth < LUB_ARG_DEPTH && column.iter().all(|a| !a.is_wildcard()) {
            let bound = lub_at(solver, &column, depth + 1)?;
            args.push(ResolvedType::Wildcard(Wildcard::Extends(Box::new(bound))));
        } else {
            args.push(ResolvedType::Wildcard(Wildcard::Unbounded));
        }
    }
    Ok(ResolvedType::reference(candidate.clone(), args))
}

/// Greatest lower bound: the intersection of the inputs minus any input that
/// is a supertype of another.
pub fn glb(solver: &dyn TypeSolver, types: &[ResolvedType]) -> Result<ResolvedType, ResolveError> {
    let mut kept: Vec<ResolvedType> = Vec::new();
    for (i, ty) in types.iter().enumerate() {
        let redundant = types.iter().enumerate().any(|(j, other)| {
            if i == j || type_equals(ty, other) {
                // Keep the first of equal duplicates.
                return j < i && type_equals(ty, other);
            }
            is_subtype(solver, other, ty)
        });
        if !redundant {
            kept.push(ty.clone());
        }
    }
    Ok(ResolvedType::intersection(kept)?)
}
