use std::fmt;
use std::hash::{Hash, Hasher};

use crate::decl::{ReferenceTypeDecl, TypeDeclRef, TypeParamRef};
use crate::error::DeclError;
use crate::primitive::PrimitiveType;

/// A resolved type. Values are immutable; substitution builds new ones.
#[derive(Debug, Clone)]
pub enum ResolvedType {
    Primitive(PrimitiveType),
    Void,
    Null,
    Array(Box<ResolvedType>),
    Reference(ReferenceType),
    TypeVariable(TypeParamRef),
    /// Only valid as a type argument of a `Reference`.
    Wildcard(Wildcard),
    Intersection(Vec<ResolvedType>),
    Union(Vec<ResolvedType>),
}

/// A class or interface type with its type arguments. A raw use of a generic
/// declaration has no arguments.
#[derive(Debug, Clone)]
pub struct ReferenceType {
    pub decl: TypeDeclRef,
    pub args: Vec<ResolvedType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Wildcard {
    Unbounded,
    Extends(Box<ResolvedType>),
    Super(Box<ResolvedType>),
}

impl ReferenceType {
    pub fn new(decl: TypeDeclRef, args: Vec<ResolvedType>) -> Self {
        Self { decl, args }
    }

    pub fn qualified_name(&self) -> String {
        self.decl.qualified_name()
    }

    /// A generic declaration used without type arguments.
    pub fn is_raw(&self) -> bool {
        self.args.is_empty() && !self.decl.type_parameters().is_empty()
    }

    /// Binary internal name, e.g. `java/util/Map$Entry`.
    pub fn internal_name(&self) -> String {
        internal_name(self.decl.as_ref())
    }
}

pub(crate) fn internal_name(decl: &dyn ReferenceTypeDecl) -> String {
    let package = decl.package_name();
    let class = decl.class_name().replace('.', "$");
    if package.is_empty() {
        class
    } else {
        format!("{}/{class}", package.replace('.', "/"))
    }
}

impl ResolvedType {
    pub fn reference(decl: TypeDeclRef, args: Vec<ResolvedType>) -> Self {
        ResolvedType::Reference(ReferenceType { decl, args })
    }

    pub fn raw(decl: TypeDeclRef) -> Self {
        ResolvedType::reference(decl, Vec::new())
    }

    /// Arrays of `void` (and of wildcards) do not exist.
    pub fn array(component: ResolvedType) -> Result<Self, DeclError> {
        match component {
            ResolvedType::Void => Err(DeclError::InvariantViolation(
                "array component cannot be void".to_string(),
            )),
            ResolvedType::Wildcard(_) => Err(DeclError::InvariantViolation(
                "array component cannot be a wildcard".to_string(),
            )),
            other => Ok(ResolvedType::Array(Box::new(other))),
        }
    }

    /// Wraps `component` in `dims` array levels.
    pub fn array_of_dims(component: ResolvedType, dims: usize) -> Result<Self, DeclError> {
        (0..dims).try_fold(component, |acc, _| ResolvedType::array(acc))
    }

    /// Flattens nested intersections and drops duplicates; a single part is
    /// returned as is.
    pub fn intersection(parts: Vec<ResolvedType>) -> Result<Self, DeclError> {
        Self::combine(parts, "intersection", |t| match t {
            ResolvedType::Intersection(parts) => Some(parts),
            _ => None,
        })
        .map(|mut parts| {
            if parts.len() == 1 {
                parts.remove(0)
            } else {
                ResolvedType::Intersection(parts)
            }
        })
    }

    pub fn union(parts: Vec<ResolvedType>) -> Result<Self, DeclError> {
        Self::combine(parts, "union", |t| match t {
            ResolvedType::Union(parts) => Some(parts),
            _ => None,
        })
        .map(|mut parts| {
            if parts.len() == 1 {
                parts.remove(0)
            } else {
                ResolvedType::Union(parts)
            }
        })
    }

    fn combine(
        parts: Vec<ResolvedType>,
        what: &str,
        flatten: impl Fn(&ResolvedType) -> Option<&Vec<ResolvedType>>,
    ) -> Result<Vec<ResolvedType>, DeclError> {
        let mut out: Vec<ResolvedType> = Vec::with_capacity(parts.len());
        for part in parts {
            let flat = match flatten(&part) {
                Some(inner) => inner.clone(),
                None => vec![part],
            };
            for p in flat {
                if !out.contains(&p) {
                    out.push(p);
                }
            }
        }
        if out.is_empty() {
            return Err(DeclError::InvariantViolation(format!("empty {what} type")));
        }
        Ok(out)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, ResolvedType::Primitive(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, ResolvedType::Void)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ResolvedType::Null)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, ResolvedType::Array(_))
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, ResolvedType::Wildcard(_))
    }

    pub fn is_type_variable(&self) -> bool {
        matches!(self, ResolvedType::TypeVariable(_))
    }

    /// Class, interface, array, type variable, intersection or union type.
    pub fn is_reference_type(&self) -> bool {
        matches!(
            self,
            ResolvedType::Reference(_)
                | ResolvedType::Array(_)
                | ResolvedType::TypeVariable(_)
                | ResolvedType::Intersection(_)
                | ResolvedType::Union(_)
        )
    }

    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self {
            ResolvedType::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&ReferenceType> {
        match self {
            ResolvedType::Reference(r) => Some(r),
            _ => None,
        }
    }

    pub fn type_decl(&self) -> Option<&TypeDeclRef> {
        self.as_reference().map(|r| &r.decl)
    }

    pub fn qualified_name(&self) -> Option<String> {
        self.type_decl().map(|d| d.qualified_name())
    }

    pub fn is_class_named(&self, qualified: &str) -> bool {
        self.qualified_name().as_deref() == Some(qualified)
    }

    pub fn array_component(&self) -> Option<&ResolvedType> {
        match self {
            ResolvedType::Array(c) => Some(c),
            _ => None,
        }
    }

    pub fn array_dimensions(&self) -> usize {
        match self {
            ResolvedType::Array(c) => 1 + c.array_dimensions(),
            _ => 0,
        }
    }

    /// The primitive a wrapper class unboxes to.
    pub fn unboxed(&self) -> Option<PrimitiveType> {
        self.qualified_name()
            .and_then(|n| PrimitiveType::from_boxed_name(&n))
    }

    /// Primitive view: the primitive itself or the unboxed wrapper.
    pub fn numeric_view(&self) -> Option<PrimitiveType> {
        self.as_primitive().or_else(|| self.unboxed())
    }

    pub fn is_string(&self) -> bool {
        self.is_class_named("java.lang.String")
    }

    pub fn contains_type_variables(&self) -> bool {
        match self {
            ResolvedType::TypeVariable(_) => true,
            ResolvedType::Array(c) => c.contains_type_variables(),
            ResolvedType::Reference(r) => r.args.iter().any(ResolvedType::contains_type_variables),
            ResolvedType::Wildcard(Wildcard::Extends(b) | Wildcard::Super(b)) => {
                b.contains_type_variables()
            }
            ResolvedType::Intersection(parts) | ResolvedType::Union(parts) => {
                parts.iter().any(ResolvedType::contains_type_variables)
            }
            _ => false,
        }
    }

    /// JVM descriptor of an erased type.
    pub fn descriptor(&self) -> Result<String, DeclError> {
        Ok(match self {
            ResolvedType::Primitive(p) => p.descriptor_char().to_string(),
            ResolvedType::Void => "V".to_string(),
            ResolvedType::Array(c) => format!("[{}", c.descriptor()?),
            ResolvedType::Reference(r) => format!("L{};", r.internal_name()),
            other => {
                return Err(DeclError::Unsupported {
                    operation: "descriptor",
                    declaration: other.describe(),
                })
            }
        })
    }

    /// Stable Java-like rendering, e.g. `java.util.Map<K, ? extends V>[]`.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        self.describe_into(&mut out);
        out
    }

    fn describe_into(&self, out: &mut String) {
        match self {
            ResolvedType::Primitive(p) => out.push_str(p.keyword()),
            ResolvedType::Void => out.push_str("void"),
            ResolvedType::Null => out.push_str("null"),
            ResolvedType::Array(c) => {
                c.describe_into(out);
                out.push_str("[]");
            }
            ResolvedType::Reference(r) => {
                out.push_str(&r.decl.qualified_name());
                if !r.args.is_empty() {
                    out.push('<');
                    for (i, arg) in r.args.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        arg.describe_into(out);
                    }
                    out.push('>');
                }
            }
            ResolvedType::TypeVariable(tp) => out.push_str(tp.name()),
            ResolvedType::Wildcard(w) => match w {
                Wildcard::Unbounded => out.push('?'),
                Wildcard::Extends(b) => {
                    out.push_str("? extends ");
                    b.describe_into(out);
                }
                Wildcard::Super(b) => {
                    out.push_str("? super ");
                    b.describe_into(out);
                }
            },
            ResolvedType::Intersection(parts) | ResolvedType::Union(parts) => {
                let sep = if matches!(self, ResolvedType::Union(_)) {
                    " | "
                } else {
                    " & "
                };
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        out.push_str(sep);
                    }
                    part.describe_into(out);
                }
            }
        }
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl PartialEq for ReferenceType {
    fn eq(&self, other: &Self) -> bool {
        self.decl.origin() == other.decl.origin() && self.args == other.args
    }
}

impl Eq for ReferenceType {}

impl PartialEq for ResolvedType {
    fn eq(&self, other: &Self) -> bool {
        use ResolvedType::*;
        match (self, other) {
            (Primitive(a), Primitive(b)) => a == b,
            (Void, Void) | (Null, Null) => true,
            (Array(a), Array(b)) => a == b,
            (Reference(a), Reference(b)) => a == b,
            (TypeVariable(a), TypeVariable(b)) => a.origin() == b.origin(),
            (Wildcard(a), Wildcard(b)) => a == b,
            (Intersection(a), Intersection(b)) | (Union(a), Union(b)) => {
                a.len() == b.len() && a.iter().all(|p| b.contains(p))
            }
            _ => false,
        }
    }
}

impl Eq for ResolvedType {}

impl Hash for ResolvedType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ResolvedType::Primitive(p) => p.hash(state),
            ResolvedType::Array(c) => c.hash(state),
            ResolvedType::Reference(r) => {
                r.decl.origin().hash(state);
                r.args.hash(state);
            }
            ResolvedType::TypeVariable(tp) => tp.origin().hash(state),
            ResolvedType::Wildcard(w) => w.hash(state),
            // Order-insensitive equality; hash only the size.
            ResolvedType::Intersection(parts) | ResolvedType::Union(parts) => {
                parts.len().hash(state)
            }
            ResolvedType::Void | ResolvedType::Null => {}
        }
    }
}
