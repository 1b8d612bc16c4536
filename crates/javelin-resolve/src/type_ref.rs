//! Source type references (`List<? extends T>[]`, `Map.Entry<K, V>`) to
//! [`ResolvedType`]s, resolving names through the scope chain of the node.

use javelin_syntax::{NodeId, NodeKind, WildcardBound};
use javelin_types::{
    DeclError, LocalVariableDecl, ResolveError, ResolvedType, TypeDeclRef, Wildcard,
};

use crate::scopes::{lenient, Context, TypeName};
use crate::source::{primitive_of, SourceLocal};

impl Context<'_> {
    /// Resolves the type node `node`.
    pub(crate) fn resolve_type(&self, node: NodeId) -> Result<ResolvedType, ResolveError> {
        let tree = self.tree();
        match tree.kind(node) {
            NodeKind::PrimitiveType(keyword) => Ok(ResolvedType::Primitive(primitive_of(*keyword))),
            NodeKind::VoidType => Ok(ResolvedType::Void),
            NodeKind::VarType => self.var_type(node),
            NodeKind::ArrayType { component } => Ok(ResolvedType::array(self.resolve_type(*component)?)?),
            NodeKind::WildcardType { bound } => Ok(ResolvedType::Wildcard(match bound {
                None => Wildcard::Unbounded,
                Some((WildcardBound::Extends, b)) => Wildcard::Extends(Box::new(self.resolve_type(*b)?)),
                Some((WildcardBound::Super, b)) => Wildcard::Super(Box::new(self.resolve_type(*b)?)),
            })),
            NodeKind::UnionType { alternatives } => {
                let parts = alternatives
                    .iter()
                    .map(|&a| self.resolve_type(a))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ResolvedType::union(parts)?)
            }
            NodeKind::IntersectionType { parts } => {
                let parts = parts
                    .iter()
                    .map(|&p| self.resolve_type(p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ResolvedType::intersection(parts)?)
            }
            NodeKind::ClassType { .. } => self.class_type(node),
            other => Err(DeclError::unsupported("resolve_type", other.label()).into()),
        }
    }

    /// `var` takes the type of the variable it declares.
    fn var_type(&self, node: NodeId) -> Result<ResolvedType, ResolveError> {
        let tree = self.tree();
        let var = tree.parent(node).and_then(|parent| match tree.kind(parent) {
            NodeKind::LocalVar { variables, .. } => variables.first().copied(),
            _ => None,
        });
        let Some(var) = var else {
            return Err(DeclError::unsupported("resolve_type", "var outside a local variable declaration").into());
        };
        SourceLocal::new(self.file().clone(), var)?.ty(self.solver())
    }

    fn class_type(&self, node: NodeId) -> Result<ResolvedType, ResolveError> {
        let tree = self.tree();
        let NodeKind::ClassType {
            scope, name, args, ..
        } = tree.kind(node)
        else {
            unreachable!("class_type over {}", tree.kind(node).label());
        };

        let decl = match scope {
            None => match self.solve_type_name(node, name.as_str())? {
                Some(TypeName::Decl(decl)) => decl,
                Some(TypeName::Variable(tp)) => {
                    if let Some(args) = args {
                        return Err(ResolveError::WrongTypeArgumentCount {
                            name: name.to_string(),
                            expected: 0,
                            found: args.len(),
                        });
                    }
                    return Ok(ResolvedType::TypeVariable(tp));
                }
                None => {
                    return Err(ResolveError::unsolved_symbol(name.as_str(), self.describe_scope(node)));
                }
            },
            Some(scope) => self.qualified_class(*scope, name.as_str(), node)?,
        };

        let Some(args) = args.as_ref().filter(|a| !a.is_empty()) else {
            // No arguments written, or the diamond: raw until inferred.
            return Ok(ResolvedType::raw(decl));
        };
        let expected = decl.type_parameters().len();
        if args.len() != expected {
            return Err(ResolveError::WrongTypeArgumentCount {
                name: decl.qualified_name(),
                expected,
                found: args.len(),
            });
        }
        let args = args
            .iter()
            .map(|&a| self.resolve_type(a))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ResolvedType::reference(decl, args))
    }

    /// `Q.Name`: a member type of `Q` when `Q` names a type, otherwise a
    /// package-qualified name.
    fn qualified_class(&self, scope: NodeId, name: &str, node: NodeId) -> Result<TypeDeclRef, ResolveError> {
        let owner = lenient(self.resolve_type(scope).map(Some))?;
        if let Some(owner) = owner.as_ref().and_then(ResolvedType::type_decl) {
            if let Some(member) = lenient(owner.member_type(name, self.solver()))? {
                return Ok(member);
            }
            return Err(ResolveError::unsolved_symbol(name, owner.qualified_name()));
        }
        let dotted = self
            .class_type_path(node)
            .ok_or_else(|| DeclError::unsupported("resolve_type", self.tree().kind(node).label()))?;
        match self.lookup_qualified(&dotted)? {
            Some(found) => Ok(found),
            None => Err(ResolveError::UnsolvedType(dotted)),
        }
    }

    /// Dotted spelling of a possibly qualified class type, without type
    /// arguments.
    pub(crate) fn class_type_path(&self, node: NodeId) -> Option<String> {
        let tree = self.tree();
        let mut parts = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            let NodeKind::ClassType { scope, name, .. } = tree.kind(id) else {
                return None;
            };
            parts.push(name.as_str());
            current = *scope;
        }
        parts.reverse();
        Some(parts.join("."))
    }
}

#[cfg(test)]
mod tests {
    use javelin_core::ResolverConfig;
    use javelin_types::{MemoryTypeSolver, StubTypeDecl};

    use super::*;
    use crate::file::{SourceFile, SourceRef};

    fn solver() -> MemoryTypeSolver {
        MemoryTypeSolver::new()
            .with(StubTypeDecl::class("java.lang.Object").build().unwrap())
            .with(StubTypeDecl::class("java.lang.String").build().unwrap())
            .with(
                StubTypeDecl::interface("java.util.List")
                    .type_param("E", &[])
                    .build()
                    .unwrap(),
            )
            .with(
                StubTypeDecl::interface("java.util.Map")
                    .nested("java.util.Map.Entry")
                    .type_param("K", &[])
                    .type_param("V", &[])
                    .build()
                    .unwrap(),
            )
            .with(
                StubTypeDecl::interface("java.util.Map.Entry")
                    .nested_in("java.util.Map")
                    .type_param("K", &[])
                    .type_param("V", &[])
                    .build()
                    .unwrap(),
            )
    }

    fn field_type(file: &SourceRef, field: &str) -> NodeId {
        let tree = file.tree();
        tree.find_all(|k| matches!(k, NodeKind::Field { .. }))
            .into_iter()
            .find_map(|f| match tree.kind(f) {
                NodeKind::Field { ty, variables, .. }
                    if variables
                        .iter()
                        .any(|&v| matches!(tree.kind(v), NodeKind::Variable { name, .. } if name.as_str() == field)) =>
                {
                    Some(*ty)
                }
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn resolves_generic_and_array_types() {
        let file = SourceFile::parse(
            "import java.util.*; class A<T> { List<? extends T>[] a; java.util.Map.Entry<String, T> b; int[][] c; }",
            &ResolverConfig::default(),
        )
        .unwrap();
        let solver = solver();
        let cx = Context::new(&file, &solver);

        assert_eq!(
            cx.resolve_type(field_type(&file, "a")).unwrap().describe(),
            "java.util.List<? extends T>[]"
        );
        assert_eq!(
            cx.resolve_type(field_type(&file, "b")).unwrap().describe(),
            "java.util.Map.Entry<java.lang.String, T>"
        );
        assert_eq!(cx.resolve_type(field_type(&file, "c")).unwrap().describe(), "int[][]");
    }

    #[test]
    fn wrong_argument_count_is_reported() {
        let file = SourceFile::parse("import java.util.List; class A { List<String, String> a; }", &ResolverConfig::default())
            .unwrap();
        let solver = solver();
        let err = Context::new(&file, &solver)
            .resolve_type(field_type(&file, "a"))
            .unwrap_err();
        assert_eq!(
            err,
            ResolveError::WrongTypeArgumentCount {
                name: "java.util.List".into(),
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn unknown_names_are_unsolved() {
        let file = SourceFile::parse("package p; class A { Missing a; }", &ResolverConfig::default()).unwrap();
        let solver = solver();
        let err = Context::new(&file, &solver)
            .resolve_type(field_type(&file, "a"))
            .unwrap_err();
        assert!(err.is_unsolved());
        assert!(matches!(err, ResolveError::UnsolvedSymbol { ref name, .. } if name == "Missing"));
    }
}
