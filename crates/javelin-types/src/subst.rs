use std::fmt;

use crate::decl::TypeParamRef;
use crate::ty::{ReferenceType, ResolvedType, Wildcard};

/// A finite map from type parameters (by declaration identity) to types.
#[derive(Debug, Clone, Default)]
pub struct Substitution {
    entries: Vec<(TypeParamRef, ResolvedType)>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs formals with actuals. Extra formals are left unmapped, which is
    /// how raw uses behave.
    pub fn from_pairs(
        params: impl IntoIterator<Item = TypeParamRef>,
        args: impl IntoIterator<Item = ResolvedType>,
    ) -> Self {
        let mut out = Self::new();
        for (param, arg) in params.into_iter().zip(args) {
            out.insert(param, arg);
        }
        out
    }

    /// The substitution implied by a parameterized type, e.g. `{E -> String}`
    /// for `List<String>`.
    pub fn for_reference(reference: &ReferenceType) -> Self {
        Self::from_pairs(reference.decl.type_parameters(), reference.args.iter().cloned())
    }

    pub fn insert(&mut self, param: TypeParamRef, ty: ResolvedType) {
        let origin = param.origin();
        match self.entries.iter_mut().find(|(p, _)| p.origin() == origin) {
            Some(slot) => slot.1 = ty,
            None => self.entries.push((param, ty)),
        }
    }

    pub fn get(&self, param: &TypeParamRef) -> Option<&ResolvedType> {
        let origin = param.origin();
        self.entries
            .iter()
            .find(|(p, _)| p.origin() == origin)
            .map(|(_, t)| t)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&ResolvedType> {
        self.entries
            .iter()
            .find(|(p, _)| p.name() == name)
            .map(|(_, t)| t)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TypeParamRef, &ResolvedType)> {
        self.entries.iter().map(|(p, t)| (p, t))
    }

    /// Whether no mapped type mentions a mapped parameter, so applying the
    /// substitution twice is the same as applying it once.
    pub fn is_idempotent(&self) -> bool {
        self.entries.iter().all(|(_, ty)| {
            self.entries
                .iter()
                .all(|(p, _)| !mentions(ty, &ResolvedType::TypeVariable(p.clone())))
        })
    }

    /// `self` followed by `other`: `other` is applied to every range type and
    /// its own entries are added where `self` has none.
    pub fn then(&self, other: &Substitution) -> Substitution {
        let mut out = Substitution {
            entries: self
                .entries
                .iter()
                .map(|(p, t)| (p.clone(), substitute(t, other)))
                .collect(),
        };
        for (p, t) in &other.entries {
            if out.get(p).is_none() {
                out.entries.push((p.clone(), t.clone()));
            }
        }
        out
    }
}

impl fmt::Display for Substitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (p, t)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} -> {}", p.name(), t)?;
        }
        f.write_str("}")
    }
}

fn mentions(ty: &ResolvedType, needle: &ResolvedType) -> bool {
    if ty == needle {
        return true;
    }
    match ty {
        ResolvedType::Array(c) => mentions(c, needle),
        ResolvedType::Reference(r) => r.args.iter().any(|a| mentions(a, needle)),
        ResolvedType::Wildcard(Wildcard::Extends(b) | Wildcard::Super(b)) => mentions(b, needle),
        ResolvedType::Intersection(parts) | ResolvedType::Union(parts) => {
            parts.iter().any(|p| mentions(p, needle))
        }
        _ => false,
    }
}

/// Structural rewrite of `ty` replacing mapped type variables. Bounds of type
/// variables are not rewritten (no capture), so self-referential bounds such
/// as `T extends Comparable<T>` terminate.
pub fn substitute(ty: &ResolvedType, subst: &Substitution) -> ResolvedType {
    if subst.is_empty() {
        return ty.clone();
    }
    match ty {
        ResolvedType::TypeVariable(tp) => match subst.get(tp) {
            Some(replacement) => replacement.clone(),
            None => ty.clone(),
        },
        ResolvedType::Array(c) => ResolvedType::Array(Box::new(substitute(c, subst))),
        ResolvedType::Reference(r) => ResolvedType::Reference(ReferenceType {
            decl: r.decl.clone(),
            args: r.args.iter().map(|a| substitute(a, subst)).collect(),
        }),
        ResolvedType::Wildcard(w) => ResolvedType::Wildcard(match w {
            Wildcard::Unbounded => Wildcard::Unbounded,
            Wildcard::Extends(b) => Wildcard::Extends(Box::new(substitute(b, subst))),
            Wildcard::Super(b) => Wildcard::Super(Box::new(substitute(b, subst))),
        }),
        ResolvedType::Intersection(parts) => {
            ResolvedType::Intersection(parts.iter().map(|p| substitute(p, subst)).collect())
        }
        ResolvedType::Union(parts) => {
            ResolvedType::Union(parts.iter().map(|p| substitute(p, subst)).collect())
        }
        ResolvedType::Primitive(_) | ResolvedType::Void | ResolvedType::Null => ty.clone(),
    }
}

impl ResolvedType {
    pub fn substitute(&self, subst: &Substitution) -> ResolvedType {
        substitute(self, subst)
    }
}
