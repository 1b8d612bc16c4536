//! Static types of expressions (JLS 15).

use javelin_syntax::{BinaryOp, LiteralKind, NodeId, NodeKind, UnaryOp};
use javelin_types::relations::{erasure, instantiate_as_supertype, lub, object_type, type_equals};
use javelin_types::{
    DeclError, FieldDecl, LocalVariableDecl, PrimitiveType, ResolveError, ResolvedType,
    Substitution, TypeDeclRef, ValueDecl, Wildcard,
};

use crate::scopes::{in_header, lenient, Context, TypeName};
use crate::source::{SourceField, SourceLocal, SourceTypeDecl};

/// What a possibly qualified name in expression position denotes.
#[derive(Debug, Clone)]
pub(crate) enum Target {
    /// A value; `decl` is absent for computed values and `array.length`.
    Value {
        decl: Option<ValueDecl>,
        ty: ResolvedType,
    },
    Type(TypeDeclRef),
    Package(String),
}

impl Context<'_> {
    /// The static type of `expr`.
    pub(crate) fn type_of(&self, expr: NodeId) -> Result<ResolvedType, ResolveError> {
        let tree = self.tree();
        let ty = match tree.kind(expr) {
            NodeKind::Literal(kind) => self.literal_type(*kind)?,
            NodeKind::Name { name } => match self.solve_value(expr, name.as_str())? {
                Some(value) => value.ty(self.solver())?,
                None => return Err(ResolveError::unsolved_symbol(name.as_str(), self.describe_scope(expr))),
            },
            NodeKind::FieldAccess { .. } => match self.classify(expr)? {
                Target::Value { ty, .. } => ty,
                Target::Type(decl) => {
                    return Err(ResolveError::unsolved_symbol(decl.qualified_name(), self.describe_scope(expr)))
                }
                Target::Package(name) => return Err(ResolveError::unsolved_symbol(name, self.describe_scope(expr))),
            },
            NodeKind::MethodCall { .. } => self.upper_bound(self.method_call(expr)?.return_type())?,
            NodeKind::New { .. } => self.constructor_call(expr)?.created,
            NodeKind::ArrayCreation { element, dims, .. } => {
                ResolvedType::array_of_dims(self.resolve_type(*element)?, dims.len())?
            }
            NodeKind::ArrayInit { .. } => self.array_init_type(expr)?,
            NodeKind::ArrayAccess { array, .. } => {
                let array_ty = self.upper_bound(&self.type_of(*array)?)?;
                match array_ty.array_component() {
                    Some(component) => component.clone(),
                    None => return Err(self.untypeable(expr)),
                }
            }
            NodeKind::Unary { op, operand } => self.unary_type(expr, *op, *operand)?,
            NodeKind::Binary { op, lhs, rhs } => self.binary_type(expr, *op, *lhs, *rhs)?,
            NodeKind::Cast { ty, .. } => self.resolve_type(*ty)?,
            NodeKind::Conditional {
                then_expr, else_expr, ..
            } => self.conditional_type(*then_expr, *else_expr)?,
            NodeKind::Assign { target, .. } => self.type_of(*target)?,
            NodeKind::InstanceOf { .. } => ResolvedType::Primitive(PrimitiveType::Boolean),
            NodeKind::This { qualifier } => {
                let qualifier = qualifier.as_ref().and_then(|q| q.last()).map(|n| n.as_str());
                self.this_type(expr, qualifier)?
            }
            NodeKind::Super { qualifier } => {
                let qualifier = qualifier.as_ref().and_then(|q| q.last()).map(|n| n.as_str());
                self.super_type(expr, qualifier)?
            }
            NodeKind::ClassLiteral { ty } => self.class_literal_type(*ty)?,
            NodeKind::Paren { expr } => self.type_of(*expr)?,
            other => return Err(DeclError::unsupported("type_of", other.label()).into()),
        };
        tracing::trace!(target: "javelin.expr", node = %expr, ty = %ty, "typed");
        Ok(ty)
    }

    fn untypeable(&self, expr: NodeId) -> ResolveError {
        ResolveError::unsolved_symbol(self.tree().node_text(expr), self.describe_scope(expr))
    }

    fn string_type(&self) -> Result<ResolvedType, ResolveError> {
        Ok(ResolvedType::raw(self.solver().solve_type("java.lang.String")?))
    }

    fn boxed(&self, p: PrimitiveType) -> Result<ResolvedType, ResolveError> {
        Ok(ResolvedType::raw(self.solver().solve_type(p.boxed_name())?))
    }

    /// A wildcard reaching a value position stands for its upper bound.
    pub(crate) fn upper_bound(&self, ty: &ResolvedType) -> Result<ResolvedType, ResolveError> {
        match ty {
            ResolvedType::Wildcard(Wildcard::Extends(bound)) => Ok((**bound).clone()),
            ResolvedType::Wildcard(_) => object_type(self.solver()),
            other => Ok(other.clone()),
        }
    }

    fn literal_type(&self, kind: LiteralKind) -> Result<ResolvedType, ResolveError> {
        Ok(match kind {
            LiteralKind::Int => ResolvedType::Primitive(PrimitiveType::Int),
            LiteralKind::Long => ResolvedType::Primitive(PrimitiveType::Long),
            LiteralKind::Float => ResolvedType::Primitive(PrimitiveType::Float),
            LiteralKind::Double => ResolvedType::Primitive(PrimitiveType::Double),
            LiteralKind::Char => ResolvedType::Primitive(PrimitiveType::Char),
            LiteralKind::True | LiteralKind::False => ResolvedType::Primitive(PrimitiveType::Boolean),
            LiteralKind::String | LiteralKind::TextBlock => self.string_type()?,
            LiteralKind::Null => ResolvedType::Null,
        })
    }

    fn unary_type(&self, expr: NodeId, op: UnaryOp, operand: NodeId) -> Result<ResolvedType, ResolveError> {
        match op {
            UnaryOp::Not => Ok(ResolvedType::Primitive(PrimitiveType::Boolean)),
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => self.type_of(operand),
            UnaryOp::Plus | UnaryOp::Minus | UnaryOp::BitNot => self
                .type_of(operand)?
                .numeric_view()
                .and_then(PrimitiveType::unary_promotion)
                .map(ResolvedType::Primitive)
                .ok_or_else(|| self.untypeable(expr)),
        }
    }

    fn binary_type(&self, expr: NodeId, op: BinaryOp, lhs: NodeId, rhs: NodeId) -> Result<ResolvedType, ResolveError> {
        if matches!(op, BinaryOp::And | BinaryOp::Or) || op.is_relational() {
            return Ok(ResolvedType::Primitive(PrimitiveType::Boolean));
        }
        let left = self.type_of(lhs)?;
        let right = self.type_of(rhs)?;
        if op == BinaryOp::Add && (left.is_string() || right.is_string()) {
            return self.string_type();
        }
        let (l, r) = (left.numeric_view(), right.numeric_view());
        let promoted = match op {
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor
                if l == Some(PrimitiveType::Boolean) && r == Some(PrimitiveType::Boolean) =>
            {
                Some(PrimitiveType::Boolean)
            }
            _ if op.is_shift() => l.and_then(PrimitiveType::unary_promotion),
            _ => l.zip(r).and_then(|(l, r)| PrimitiveType::binary_promotion(l, r)),
        };
        promoted.map(ResolvedType::Primitive).ok_or_else(|| self.untypeable(expr))
    }

    /// JLS 15.25, without the constant-fits-in-narrower-type rule.
    fn conditional_type(&self, then_expr: NodeId, else_expr: NodeId) -> Result<ResolvedType, ResolveError> {
        let a = self.type_of(then_expr)?;
        let b = self.type_of(else_expr)?;
        if type_equals(&a, &b) {
            return Ok(a);
        }
        let (pa, pb) = (a.numeric_view(), b.numeric_view());
        if pa == Some(PrimitiveType::Boolean) && pb == Some(PrimitiveType::Boolean) {
            return Ok(ResolvedType::Primitive(PrimitiveType::Boolean));
        }
        match (&a, &b) {
            (ResolvedType::Null, ResolvedType::Primitive(p)) | (ResolvedType::Primitive(p), ResolvedType::Null) => {
                return self.boxed(*p);
            }
            _ => {}
        }
        if let (Some(x), Some(y)) = (pa, pb) {
            if x.is_numeric() && y.is_numeric() {
                let unified = if x == y {
                    Some(x)
                } else {
                    PrimitiveType::binary_promotion(x, y)
                };
                if let Some(p) = unified {
                    return Ok(ResolvedType::Primitive(p));
                }
            }
        }
        lub(self.solver(), &[a, b])
    }

    fn class_literal_type(&self, ty: NodeId) -> Result<ResolvedType, ResolveError> {
        let class = self.solver().solve_type("java.lang.Class")?;
        let arg = match self.resolve_type(ty)? {
            ResolvedType::Primitive(p) => self.boxed(p)?,
            ResolvedType::Void => match self.solver().try_lookup("java.lang.Void")? {
                Some(void) => ResolvedType::raw(void),
                None => return Ok(ResolvedType::raw(class)),
            },
            other => other,
        };
        Ok(ResolvedType::reference(class, vec![arg]))
    }

    /// `{...}` takes its type from where it appears.
    fn array_init_type(&self, expr: NodeId) -> Result<ResolvedType, ResolveError> {
        let tree = self.tree();
        let Some(parent) = tree.parent(expr) else {
            return Err(self.untypeable(expr));
        };
        match tree.kind(parent) {
            NodeKind::Variable { .. } => match tree.parent(parent).map(|d| tree.kind(d)) {
                Some(NodeKind::Field { .. }) => SourceField::new(self.file().clone(), parent)?.ty(self.solver()),
                Some(NodeKind::LocalVar { .. }) => SourceLocal::new(self.file().clone(), parent)?.ty(self.solver()),
                _ => Err(self.untypeable(expr)),
            },
            NodeKind::ArrayCreation { .. } => self.type_of(parent),
            NodeKind::ArrayInit { .. } => self
                .type_of(parent)?
                .array_component()
                .cloned()
                .ok_or_else(|| self.untypeable(expr)),
            _ => Err(self.untypeable(expr)),
        }
    }

    /// The type a value must have where `expr` appears: a declared
    /// variable, an assignment target, or the enclosing method's result.
    pub(crate) fn assignment_target(&self, expr: NodeId) -> Result<Option<ResolvedType>, ResolveError> {
        let tree = self.tree();
        let Some(parent) = tree.parent(expr) else {
            return Ok(None);
        };
        let target = match tree.kind(parent) {
            NodeKind::Variable { init: Some(init), .. } if *init == expr => {
                match tree.parent(parent).map(|d| (d, tree.kind(d))) {
                    Some((_, NodeKind::Field { .. })) => {
                        lenient(SourceField::new(self.file().clone(), parent)?.ty(self.solver()).map(Some))?
                    }
                    Some((_, NodeKind::LocalVar { ty, .. })) if !matches!(tree.kind(*ty), NodeKind::VarType) => {
                        lenient(SourceLocal::new(self.file().clone(), parent)?.ty(self.solver()).map(Some))?
                    }
                    _ => None,
                }
            }
            NodeKind::Assign { target, value, .. } if *value == expr => lenient(self.type_of(*target).map(Some))?,
            NodeKind::Return { .. } => {
                match tree.find_ancestor(parent, |k| matches!(k, NodeKind::Method(_))).map(|m| tree.kind(m)) {
                    Some(NodeKind::Method(data)) => lenient(self.resolve_type(data.result).map(Some))?,
                    _ => None,
                }
            }
            NodeKind::Paren { .. } => self.assignment_target(parent)?,
            _ => None,
        };
        Ok(target.filter(|t| !t.is_void()))
    }

    // ---- names ----------------------------------------------------------

    /// Classifies a name or field access as a value, a type or a package
    /// prefix (JLS 6.5.2). Other expressions are values.
    pub(crate) fn classify(&self, expr: NodeId) -> Result<Target, ResolveError> {
        let tree = self.tree();
        match tree.kind(expr) {
            NodeKind::Name { name } => {
                if let Some(value) = self.solve_value(expr, name.as_str())? {
                    let ty = value.ty(self.solver())?;
                    return Ok(Target::Value {
                        decl: Some(value),
                        ty,
                    });
                }
                match self.solve_type_name(expr, name.as_str())? {
                    Some(TypeName::Decl(decl)) => Ok(Target::Type(decl)),
                    Some(TypeName::Variable(_)) | None => Ok(Target::Package(name.to_string())),
                }
            }
            NodeKind::FieldAccess { scope, name } => {
                let name = name.as_str();
                match self.classify(*scope)? {
                    Target::Value { ty, .. } => {
                        if ty.is_array() && name == "length" {
                            return Ok(Target::Value {
                                decl: None,
                                ty: ResolvedType::Primitive(PrimitiveType::Int),
                            });
                        }
                        match self.member_field(&ty, name)? {
                            Some((decl, ty)) => Ok(Target::Value {
                                decl: Some(decl),
                                ty,
                            }),
                            None => Err(ResolveError::unsolved_symbol(name, ty.describe())),
                        }
                    }
                    Target::Type(owner) => {
                        if let Some(value) = self.field_of(&owner, name)? {
                            let ty = value.ty(self.solver())?;
                            return Ok(Target::Value {
                                decl: Some(value),
                                ty,
                            });
                        }
                        match lenient(owner.member_type(name, self.solver()))? {
                            Some(member) => Ok(Target::Type(member)),
                            None => Err(ResolveError::unsolved_symbol(name, owner.qualified_name())),
                        }
                    }
                    Target::Package(package) => {
                        let qualified = format!("{package}.{name}");
                        match self.solver().try_lookup(&qualified)? {
                            Some(found) => Ok(Target::Type(found)),
                            None => Ok(Target::Package(qualified)),
                        }
                    }
                }
            }
            _ => Ok(Target::Value {
                decl: None,
                ty: self.type_of(expr)?,
            }),
        }
    }

    /// The declaration a simple name in expression position refers to.
    pub(crate) fn solve_name(&self, node: NodeId) -> Result<ValueDecl, ResolveError> {
        let NodeKind::Name { name } = self.tree().kind(node) else {
            return Err(DeclError::unsupported("solve_name", self.tree().kind(node).label()).into());
        };
        self.solve_value(node, name.as_str())?
            .ok_or_else(|| ResolveError::unsolved_symbol(name.as_str(), self.describe_scope(node)))
    }

    /// The field (or enum constant) a field access selects.
    pub(crate) fn solve_field_access(&self, node: NodeId) -> Result<ValueDecl, ResolveError> {
        match self.classify(node)? {
            Target::Value { decl: Some(decl), .. } => Ok(decl),
            Target::Value { decl: None, .. } => Err(DeclError::unsupported("solve_field_access", "array length").into()),
            Target::Type(decl) => Err(ResolveError::unsolved_symbol(decl.qualified_name(), self.describe_scope(node))),
            Target::Package(name) => Err(ResolveError::unsolved_symbol(name, self.describe_scope(node))),
        }
    }

    /// Types whose members are the members of a value of type `ty`.
    pub(crate) fn member_owners(&self, ty: &ResolvedType) -> Result<Vec<TypeDeclRef>, ResolveError> {
        Ok(match ty {
            ResolvedType::Reference(r) => vec![r.decl.clone()],
            ResolvedType::TypeVariable(tp) => {
                let bounds = tp.bounds(self.solver())?;
                if bounds.is_empty() {
                    vec![self.solver().java_lang_object()?]
                } else {
                    let mut out = Vec::new();
                    for bound in &bounds {
                        out.extend(self.member_owners(bound)?);
                    }
                    out
                }
            }
            ResolvedType::Wildcard(Wildcard::Extends(bound)) => self.member_owners(bound)?,
            ResolvedType::Wildcard(_) | ResolvedType::Array(_) => vec![self.solver().java_lang_object()?],
            ResolvedType::Intersection(parts) => {
                let mut out = Vec::new();
                for part in parts {
                    out.extend(self.member_owners(part)?);
                }
                out
            }
            ResolvedType::Union(parts) => self.member_owners(&lub(self.solver(), parts)?)?,
            ResolvedType::Primitive(_) | ResolvedType::Void | ResolvedType::Null => Vec::new(),
        })
    }

    /// Field `name` of a value of type `receiver`, with its type as seen
    /// through the receiver's type arguments.
    fn member_field(&self, receiver: &ResolvedType, name: &str) -> Result<Option<(ValueDecl, ResolvedType)>, ResolveError> {
        for owner in self.member_owners(receiver)? {
            let Some(value) = self.field_of(&owner, name)? else {
                continue;
            };
            let declared = value.ty(self.solver())?;
            let declaring = match &value {
                ValueDecl::Field(f) => f.declaring_type(),
                ValueDecl::EnumConstant(c) => c.declaring_type(),
                _ => owner.clone(),
            };
            let ty = if value.as_declaration().is_static() {
                declared
            } else {
                self.view_member(receiver, &declaring, &declared)?
            };
            return Ok(Some((value, self.upper_bound(&ty)?)));
        }
        Ok(None)
    }

    /// `ty`, declared in `declaring`, as seen from a value of type
    /// `receiver`: type arguments substituted, or erased for raw receivers.
    pub(crate) fn view_member(
        &self,
        receiver: &ResolvedType,
        declaring: &TypeDeclRef,
        ty: &ResolvedType,
    ) -> Result<ResolvedType, ResolveError> {
        if declaring.type_parameters().is_empty() {
            return Ok(ty.clone());
        }
        match instantiate_as_supertype(self.solver(), receiver, declaring.as_ref())? {
            Some(ResolvedType::Reference(r)) if r.is_raw() => erasure(self.solver(), ty),
            Some(ResolvedType::Reference(r)) => Ok(ty.substitute(&Substitution::for_reference(&r))),
            _ => Ok(ty.clone()),
        }
    }

    // ---- this and super -------------------------------------------------

    /// The class body `at` is in, optionally the enclosing one named
    /// `qualifier`, as a type declaration or an anonymous class's supertype.
    fn enclosing_class(&self, at: NodeId, qualifier: Option<&str>) -> Result<Option<EnclosingClass>, ResolveError> {
        let tree = self.tree();
        for (scope, child) in self.scopes(at) {
            match tree.kind(scope) {
                NodeKind::TypeDecl(data) if !in_header(data, child) => {
                    if qualifier.map_or(true, |q| data.name.as_str() == q) {
                        return Ok(Some(EnclosingClass::Declared(SourceTypeDecl::wrap(self.file(), scope))));
                    }
                }
                NodeKind::New {
                    ty, body: Some(body), ..
                } if qualifier.is_none() && body.contains(&child) => {
                    return Ok(Some(EnclosingClass::Anonymous(self.resolve_type(*ty)?)));
                }
                _ => {}
            }
        }
        Ok(None)
    }

    fn this_type(&self, at: NodeId, qualifier: Option<&str>) -> Result<ResolvedType, ResolveError> {
        match self.enclosing_class(at, qualifier)? {
            Some(EnclosingClass::Declared(decl)) => Ok(decl.self_type()),
            Some(EnclosingClass::Anonymous(created)) => Ok(created),
            None => Err(ResolveError::unsolved_symbol("this", self.describe_scope(at))),
        }
    }

    fn super_type(&self, at: NodeId, qualifier: Option<&str>) -> Result<ResolvedType, ResolveError> {
        let enclosing = match self.enclosing_class(at, qualifier)? {
            Some(found) => found,
            // `Iface.super.m()` names a direct superinterface.
            None => match qualifier.map(|q| self.solve_type_name(at, q)).transpose()?.flatten() {
                Some(TypeName::Decl(iface)) => return Ok(ResolvedType::raw(iface)),
                _ => return Err(ResolveError::unsolved_symbol("super", self.describe_scope(at))),
            },
        };
        match enclosing {
            EnclosingClass::Declared(decl) => match decl.superclass(self.solver())? {
                Some(superclass) => Ok(superclass),
                None => object_type(self.solver()),
            },
            EnclosingClass::Anonymous(created) => {
                if created.type_decl().is_some_and(|d| d.is_interface()) {
                    object_type(self.solver())
                } else {
                    Ok(created)
                }
            }
        }
    }

    // ---- iteration ------------------------------------------------------

    /// The element type of an enhanced `for` over `iterable`: the component
    /// of an array, else the type argument of `Iterable`.
    pub(crate) fn element_type(&self, iterable: NodeId) -> Result<ResolvedType, ResolveError> {
        let ty = self.upper_bound(&self.type_of(iterable)?)?;
        if let Some(component) = ty.array_component() {
            return Ok(component.clone());
        }
        let iterable_decl = self.solver().solve_type("java.lang.Iterable")?;
        match instantiate_as_supertype(self.solver(), &ty, iterable_decl.as_ref())? {
            Some(ResolvedType::Reference(view)) => match view.args.first() {
                Some(arg) => self.upper_bound(arg),
                None => object_type(self.solver()),
            },
            _ => Err(ResolveError::unsolved_symbol(
                format!("{}.iterator()", ty.describe()),
                self.describe_scope(iterable),
            )),
        }
    }
}

enum EnclosingClass {
    Declared(TypeDeclRef),
    Anonymous(ResolvedType),
}

#[cfg(test)]
mod tests {
    use javelin_core::ResolverConfig;
    use javelin_test_utils::{jdk_solver, parse_at_marker};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::file::SourceFile;

    fn type_at(fixture: &str) -> String {
        let (tree, node) = parse_at_marker(fixture, NodeKind::is_expression);
        let file = SourceFile::new(tree, &ResolverConfig::default());
        let solver = jdk_solver();
        Context::new(&file, &solver).type_of(node).unwrap().describe()
    }

    #[test]
    fn literals_and_operators() {
        assert_eq!(type_at("class A { Object o = /*here*/(1 + 2L); }"), "long");
        assert_eq!(type_at("class A { Object o = /*here*/('a' + 'b'); }"), "int");
        assert_eq!(type_at("class A { Object o = /*here*/(\"a\" + 1); }"), "java.lang.String");
        assert_eq!(type_at("class A { Object o = /*here*/(1 << 3L); }"), "int");
        assert_eq!(type_at("class A { Object o = /*here*/((1 < 2) & true); }"), "boolean");
        assert_eq!(type_at("class A { Object o = /*here*/-(byte) 1; }"), "int");
    }

    #[test]
    fn conditionals_unify_their_branches() {
        assert_eq!(type_at("class A { Object o = /*here*/(true ? 1 : 2.0); }"), "double");
        assert_eq!(type_at("class A { Object o = /*here*/(true ? 1 : null); }"), "java.lang.Integer");
        assert_eq!(type_at("class A { Object o = /*here*/(true ? \"s\" : null); }"), "java.lang.String");
    }

    #[test]
    fn class_literals_box_primitives() {
        assert_eq!(type_at("class A { Object o = /*here*/int.class; }"), "java.lang.Class<java.lang.Integer>");
        assert_eq!(type_at("class A { Object o = /*here*/String.class; }"), "java.lang.Class<java.lang.String>");
    }

    #[test]
    fn arrays_and_length() {
        assert_eq!(type_at("class A { int[][] a; Object o = /*here*/(a[0]); }"), "int[]");
        assert_eq!(type_at("class A { String[] a; Object o = /*here*/(a.length); }"), "int");
        assert_eq!(type_at("class A { Object o = /*here*/new String[3][]; }"), "java.lang.String[][]");
    }

    #[test]
    fn this_and_super() {
        assert_eq!(type_at("package p; class A<T> { Object o = /*here*/this; }"), "p.A<T>");
        assert_eq!(type_at("package p; class A extends Exception { Object o = /*here*/(super.getMessage()); }"), "java.lang.String");
    }
}
