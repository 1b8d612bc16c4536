use std::fmt;
use std::sync::Arc;

use javelin_core::ResolverConfig;
use javelin_syntax::{NodeId, NodeKind, ParseError, SyntaxTree, TypeDeclKind};
use javelin_types::{
    ConstantValue, ConstructorRef, DeclError, MethodRef, MethodUsage, ResolveError,
    ResolvedDeclaration, ResolvedType, SymbolReference, TypeDeclRef, TypeSolver, ValueDecl,
};

use crate::constant::ConstantEvaluator;
use crate::expr::Target;
use crate::file::{SourceFile, SourceRef};
use crate::scopes::Context;
use crate::source::{
    owner_kind, SourceAnnotationMember, SourceConstructor, SourceEnumConstant, SourceField,
    SourceLocal, SourceMethod, SourceParameter, SourceTypeDecl, SourceTypeParam,
};

/// Entry point for resolving names, types and expressions of parsed source.
///
/// The resolver owns the [`TypeSolver`] every query goes through. Queries
/// that look up a symbol return a [`SymbolReference`]: a name that does not
/// resolve, an ambiguous call, or a malformed type-argument list is an
/// `Unsolved` value. `Err` is reserved for failures callers cannot recover
/// from locally, such as malformed class files or unsupported queries.
#[derive(Clone)]
pub struct SymbolResolver {
    solver: Arc<dyn TypeSolver>,
    config: ResolverConfig,
}

impl fmt::Debug for SymbolResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolResolver")
            .field("solver", &self.solver.label())
            .field("config", &self.config)
            .finish()
    }
}

impl SymbolResolver {
    pub fn new(solver: Arc<dyn TypeSolver>) -> Self {
        Self::with_config(solver, ResolverConfig::default())
    }

    pub fn with_config(solver: Arc<dyn TypeSolver>, config: ResolverConfig) -> Self {
        Self { solver, config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn solver(&self) -> &dyn TypeSolver {
        self.solver.as_ref()
    }

    /// Wraps an already parsed tree with this resolver's implicit imports.
    pub fn load(&self, tree: SyntaxTree) -> SourceRef {
        SourceFile::new(tree, &self.config)
    }

    pub fn parse(&self, text: &str) -> Result<SourceRef, ParseError> {
        SourceFile::parse(text, &self.config)
    }

    fn context<'a>(&'a self, file: &'a SourceRef) -> Context<'a> {
        Context::new(file, self.solver.as_ref())
    }

    /// Resolves a type node in the scope it appears in.
    pub fn resolve_type(&self, file: &SourceRef, node: NodeId) -> Result<ResolvedType, ResolveError> {
        let _span = tracing::debug_span!(target: "javelin.resolve", "resolve_type", node = %node).entered();
        self.context(file).resolve_type(node)
    }

    /// The static type of an expression.
    pub fn resolve_expression(&self, file: &SourceRef, expr: NodeId) -> Result<ResolvedType, ResolveError> {
        let _span = tracing::debug_span!(target: "javelin.resolve", "resolve_expression", node = %expr).entered();
        self.context(file).type_of(expr)
    }

    /// The declaration a use of a name refers to: a simple name, a field
    /// access, a method call, an instance creation or a class type.
    pub fn resolve_symbol(
        &self,
        file: &SourceRef,
        node: NodeId,
    ) -> Result<SymbolReference<ResolvedDeclaration>, ResolveError> {
        let cx = self.context(file);
        let tree = file.tree();
        let _span = tracing::debug_span!(
            target: "javelin.resolve",
            "resolve_symbol",
            node = %node,
            kind = tree.kind(node).label()
        )
        .entered();
        let found = match tree.kind(node) {
            NodeKind::Name { .. } | NodeKind::FieldAccess { .. } => self.named(&cx, node),
            NodeKind::MethodCall { .. } => cx
                .method_call(node)
                .map(|usage| ResolvedDeclaration::Method(usage.declaration().clone())),
            NodeKind::New { .. } => cx
                .constructor_call(node)
                .map(|call| ResolvedDeclaration::Constructor(call.constructor)),
            NodeKind::ClassType { .. } => match cx.resolve_type(node) {
                Ok(ResolvedType::TypeVariable(tp)) => Ok(ResolvedDeclaration::TypeParameter(tp)),
                Ok(ty) => match ty.type_decl() {
                    Some(decl) => Ok(ResolvedDeclaration::Type(decl.clone())),
                    None => Err(DeclError::unsupported("resolve_symbol", ty.describe()).into()),
                },
                Err(err) => Err(err),
            },
            other => Err(DeclError::unsupported("resolve_symbol", other.label()).into()),
        };
        to_reference(found)
    }

    fn named(&self, cx: &Context<'_>, node: NodeId) -> Result<ResolvedDeclaration, ResolveError> {
        match cx.classify(node)? {
            Target::Value { decl: Some(decl), .. } => Ok(decl.into()),
            Target::Value { decl: None, ty } => Err(ResolveError::unsolved_symbol("length", ty.describe())),
            Target::Type(decl) => Ok(ResolvedDeclaration::Type(decl)),
            Target::Package(package) => Err(ResolveError::unsolved_symbol(package, cx.describe_scope(node))),
        }
    }

    /// The type a class type node names.
    pub fn solve_type(&self, file: &SourceRef, node: NodeId) -> Result<SymbolReference<TypeDeclRef>, ResolveError> {
        let found = self.resolve_type(file, node).and_then(|ty| match ty.type_decl() {
            Some(decl) => Ok(decl.clone()),
            None => Err(ResolveError::UnsolvedType(ty.describe())),
        });
        to_reference(found)
    }

    /// The method a call invokes.
    pub fn solve_method_call(&self, file: &SourceRef, call: NodeId) -> Result<SymbolReference<MethodRef>, ResolveError> {
        to_reference(
            self.method_usage(file, call)
                .map(|usage| usage.declaration().clone()),
        )
    }

    /// The invoked method with its signature at the call site: receiver type
    /// arguments and inferred method type arguments substituted.
    pub fn method_usage(&self, file: &SourceRef, call: NodeId) -> Result<MethodUsage, ResolveError> {
        self.context(file).method_call(call)
    }

    /// The constructor an instance creation expression invokes.
    pub fn solve_constructor(&self, file: &SourceRef, new: NodeId) -> Result<SymbolReference<ConstructorRef>, ResolveError> {
        to_reference(self.context(file).constructor_call(new).map(|call| call.constructor))
    }

    /// The field or enum constant a field access selects.
    pub fn solve_field_access(&self, file: &SourceRef, node: NodeId) -> Result<SymbolReference<ValueDecl>, ResolveError> {
        to_reference(self.context(file).solve_field_access(node))
    }

    /// The variable, parameter, field or enum constant a simple name denotes.
    pub fn solve_name(&self, file: &SourceRef, node: NodeId) -> Result<SymbolReference<ValueDecl>, ResolveError> {
        to_reference(self.context(file).solve_name(node))
    }

    /// Wraps a type declaration node.
    pub fn type_declaration(&self, file: &SourceRef, node: NodeId) -> Result<SourceTypeDecl, DeclError> {
        SourceTypeDecl::new(file.clone(), node)
    }

    /// Wraps any declaration node: a type, type parameter, field declarator,
    /// method, constructor, annotation element, parameter, enum constant or
    /// local variable.
    pub fn resolve_declaration(&self, file: &SourceRef, node: NodeId) -> Result<ResolvedDeclaration, DeclError> {
        let tree = file.tree();
        let parent = tree.parent(node);
        match tree.kind(node) {
            NodeKind::TypeDecl(_) => Ok(ResolvedDeclaration::Type(SourceTypeDecl::wrap(file, node))),
            NodeKind::TypeParameter { .. } => Ok(ResolvedDeclaration::TypeParameter(SourceTypeParam::wrap(file, node))),
            NodeKind::Variable { .. } => match parent.map(|p| tree.kind(p)) {
                Some(NodeKind::Field { .. }) => Ok(ResolvedDeclaration::Field(Arc::new(SourceField::new(
                    file.clone(),
                    node,
                )?))),
                _ => Ok(ResolvedDeclaration::Local(Arc::new(SourceLocal::new(file.clone(), node)?))),
            },
            NodeKind::Method(_) if owner_kind(tree, node) == Some(TypeDeclKind::Annotation) => Ok(
                ResolvedDeclaration::AnnotationMember(SourceAnnotationMember::wrap(file, node)),
            ),
            NodeKind::Method(_) => Ok(ResolvedDeclaration::Method(Arc::new(SourceMethod::new(file.clone(), node)?))),
            NodeKind::Constructor(_) => Ok(ResolvedDeclaration::Constructor(Arc::new(SourceConstructor::new(
                file.clone(),
                node,
            )?))),
            NodeKind::Parameter { .. } => match parent.map(|p| tree.kind(p)) {
                Some(NodeKind::Method(_) | NodeKind::Constructor(_)) => {
                    Ok(ResolvedDeclaration::Parameter(SourceParameter::wrap(file, node)))
                }
                _ => Ok(ResolvedDeclaration::Local(Arc::new(SourceLocal::new(file.clone(), node)?))),
            },
            NodeKind::EnumConstant { .. } => Ok(ResolvedDeclaration::EnumConstant(Arc::new(
                SourceEnumConstant::new(file.clone(), node)?,
            ))),
            other => Err(DeclError::unsupported("resolve_declaration", other.label())),
        }
    }

    /// Folds a constant expression. Names are followed to constant variables
    /// of any provider; anything that is not a constant expression yields
    /// `None`.
    pub fn constant_value(&self, file: &SourceRef, expr: NodeId) -> Option<ConstantValue> {
        let cx = self.context(file);
        let mut names = |name: NodeId| match cx.classify(name) {
            Ok(Target::Value { decl: Some(decl), .. }) => decl.constant_value(),
            _ => None,
        };
        ConstantEvaluator::new(file.tree(), &mut names).evaluate(expr)
    }
}

/// Unsolved outcomes become values; everything else stays an error.
fn to_reference<D>(result: Result<D, ResolveError>) -> Result<SymbolReference<D>, ResolveError> {
    match result {
        Ok(decl) => Ok(SymbolReference::Solved(decl)),
        Err(err) if err.is_unsolved() => {
            tracing::debug!(target: "javelin.resolve", error = %err, "unsolved");
            Ok(SymbolReference::Unsolved(err))
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use javelin_types::{Declaration, DeclKind, MemoryTypeSolver, StubTypeDecl};

    use super::*;

    fn resolver() -> SymbolResolver {
        let solver = MemoryTypeSolver::new()
            .with(StubTypeDecl::class("java.lang.Object").build().unwrap())
            .with(StubTypeDecl::class("java.lang.String").build().unwrap());
        SymbolResolver::new(Arc::new(solver))
    }

    #[test]
    fn missing_names_are_unsolved_values() {
        let resolver = resolver();
        let file = resolver.parse("class A { Object f = missing; }").unwrap();
        let name = file.tree().find_all(|k| matches!(k, NodeKind::Name { .. }))[0];
        let found = resolver.resolve_symbol(&file, name).unwrap();
        assert!(!found.is_solved());
        assert!(found.reason().is_some_and(ResolveError::is_unsolved));
    }

    #[test]
    fn unsupported_nodes_are_errors() {
        let resolver = resolver();
        let file = resolver.parse("class A { int f = 1; }").unwrap();
        let literal = file.tree().find_all(|k| matches!(k, NodeKind::Literal(_)))[0];
        assert!(matches!(
            resolver.resolve_symbol(&file, literal),
            Err(ResolveError::Unsupported(_))
        ));
    }

    #[test]
    fn declarations_wrap_by_node_kind() {
        let resolver = resolver();
        let file = resolver
            .parse("class A<T> { int x, y; A(int p) {} void m() { int l = 0; } }")
            .unwrap();
        let tree = file.tree();
        let kinds: Vec<DeclKind> = tree
            .find_all(|k| {
                matches!(
                    k,
                    NodeKind::TypeDecl(_)
                        | NodeKind::TypeParameter { .. }
                        | NodeKind::Variable { .. }
                        | NodeKind::Constructor(_)
                        | NodeKind::Parameter { .. }
                        | NodeKind::Method(_)
                )
            })
            .into_iter()
            .map(|n| resolver.resolve_declaration(&file, n).unwrap().kind())
            .collect();
        assert!(kinds.contains(&DeclKind::Class));
        assert!(kinds.contains(&DeclKind::TypeParameter));
        assert!(kinds.contains(&DeclKind::Field));
        assert!(kinds.contains(&DeclKind::Constructor));
        assert!(kinds.contains(&DeclKind::Parameter));
        assert!(kinds.contains(&DeclKind::Method));
        assert!(kinds.contains(&DeclKind::LocalVariable));

        let y = tree.find_all(|k| matches!(k, NodeKind::Variable { name, .. } if name.as_str() == "y"))[0];
        let field = resolver.resolve_declaration(&file, y).unwrap();
        assert_eq!(field.name(), "y");
        assert_eq!(field.as_declaration().kind(), DeclKind::Field);
    }
}
