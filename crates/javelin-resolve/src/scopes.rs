//! The scope chain of a source position.
//!
//! Lookups walk the syntax tree outward from a node, innermost scope first:
//! block, method or constructor, type declaration (type parameters, then
//! member types and fields), anonymous class body, and finally the
//! compilation unit with its imports, its package and the implicit imports.

use javelin_syntax::{BinaryOp, NodeId, NodeKind, SyntaxTree, TypeDeclData, UnaryOp};
use javelin_types::{
    MethodRef, ResolveError, ResolvedType, TypeDeclRef, TypeParamRef, TypeSolver, ValueDecl,
};

use crate::file::SourceRef;
use crate::source::{SourceLocal, SourceParameter, SourceTypeDecl, SourceTypeParam};

/// What a simple type name denotes.
#[derive(Debug, Clone)]
pub(crate) enum TypeName {
    Decl(TypeDeclRef),
    Variable(TypeParamRef),
}

/// Where the methods named at a call site come from.
#[derive(Debug, Clone, Default)]
pub(crate) struct MethodScope {
    pub(crate) methods: Vec<MethodRef>,
    /// The type whose members were searched, for instance calls.
    pub(crate) receiver: Option<ResolvedType>,
}

/// Treats "not found" failures as an empty answer and lets fatal ones
/// through. Used where a lookup is one option among several.
pub(crate) fn lenient<T: Default>(result: Result<T, ResolveError>) -> Result<T, ResolveError> {
    match result {
        Err(err) if err.is_unsolved() => {
            tracing::trace!(target: "javelin.scope", error = %err, "lookup skipped");
            Ok(T::default())
        }
        other => other,
    }
}

/// A source file paired with the solver used to resolve names in it.
#[derive(Clone, Copy)]
pub(crate) struct Context<'a> {
    file: &'a SourceRef,
    solver: &'a dyn TypeSolver,
}

impl<'a> Context<'a> {
    pub(crate) fn new(file: &'a SourceRef, solver: &'a dyn TypeSolver) -> Self {
        Self { file, solver }
    }

    pub(crate) fn file(&self) -> &'a SourceRef {
        self.file
    }

    pub(crate) fn tree(&self) -> &'a SyntaxTree {
        self.file.tree()
    }

    pub(crate) fn solver(&self) -> &'a dyn TypeSolver {
        self.solver
    }

    /// Human-readable name of the scope at `at`, used in unsolved-symbol
    /// reports.
    pub(crate) fn describe_scope(&self, at: NodeId) -> String {
        match self.enclosing_type(at) {
            Some(ty) => ty.qualified_name(),
            None => {
                let package = self.file.package();
                if package.is_unnamed() {
                    "compilation unit".to_string()
                } else {
                    package.to_dotted()
                }
            }
        }
    }

    /// The innermost type declaration whose body contains `at`.
    pub(crate) fn enclosing_type(&self, at: NodeId) -> Option<TypeDeclRef> {
        let tree = self.tree();
        tree.enclosing_type(at).map(|ty| SourceTypeDecl::wrap(self.file, ty))
    }

    /// Visits the strict ancestors of `at` together with the child through
    /// which each one was reached.
    pub(crate) fn scopes(&self, at: NodeId) -> impl Iterator<Item = (NodeId, NodeId)> + 'a {
        let tree = self.tree();
        let mut child = at;
        tree.ancestors(at).map(move |scope| {
            let reached_through = child;
            child = scope;
            (scope, reached_through)
        })
    }

    // ---- types ----------------------------------------------------------

    /// Resolves a simple type name as seen from `at`.
    pub(crate) fn solve_type_name(&self, at: NodeId, name: &str) -> Result<Option<TypeName>, ResolveError> {
        let tree = self.tree();
        for (scope, child) in self.scopes(at) {
            match tree.kind(scope) {
                NodeKind::Block { stmts } => {
                    for &stmt in stmts {
                        if tree.type_decl(stmt).is_some_and(|d| d.name.as_str() == name) {
                            return Ok(Some(TypeName::Decl(SourceTypeDecl::wrap(self.file, stmt))));
                        }
                        if stmt == child {
                            break;
                        }
                    }
                }
                NodeKind::Method(data) => {
                    if let Some(tp) = self.type_param_named(&data.type_params, name) {
                        return Ok(Some(TypeName::Variable(tp)));
                    }
                }
                NodeKind::Constructor(data) => {
                    if let Some(tp) = self.type_param_named(&data.type_params, name) {
                        return Ok(Some(TypeName::Variable(tp)));
                    }
                }
                NodeKind::TypeDecl(data) => {
                    if let Some(tp) = self.type_param_named(&data.type_params, name) {
                        return Ok(Some(TypeName::Variable(tp)));
                    }
                    if in_header(data, child) {
                        continue;
                    }
                    if let Some(&member) = data
                        .members
                        .iter()
                        .find(|&&m| tree.type_decl(m).is_some_and(|d| d.name.as_str() == name))
                    {
                        return Ok(Some(TypeName::Decl(SourceTypeDecl::wrap(self.file, member))));
                    }
                    let decl = SourceTypeDecl::wrap(self.file, scope);
                    if let Some(inherited) = lenient(decl.member_type(name, self.solver))? {
                        return Ok(Some(TypeName::Decl(inherited)));
                    }
                }
                NodeKind::New {
                    ty, body: Some(body), ..
                } if body.contains(&child) => {
                    if let Some(created) = self.anonymous_supertype(*ty)? {
                        if let Some(found) = lenient(created.member_type(name, self.solver))? {
                            return Ok(Some(TypeName::Decl(found)));
                        }
                    }
                }
                NodeKind::CompilationUnit { .. } => {
                    return Ok(self.solve_in_unit(name)?.map(TypeName::Decl));
                }
                _ => {}
            }
        }
        Ok(None)
    }

    fn type_param_named(&self, params: &[NodeId], name: &str) -> Option<TypeParamRef> {
        let tree = self.tree();
        params
            .iter()
            .find(|&&tp| matches!(tree.kind(tp), NodeKind::TypeParameter { name: n, .. } if n.as_str() == name))
            .map(|&tp| SourceTypeParam::wrap(self.file, tp))
    }

    pub(crate) fn anonymous_supertype(&self, ty: NodeId) -> Result<Option<TypeDeclRef>, ResolveError> {
        let created = lenient(self.resolve_type(ty).map(Some))?;
        Ok(created.and_then(|t| t.type_decl().cloned()))
    }

    /// Compilation-unit scope: the unit's own top-level types, single-type
    /// imports, the package, then the implicit and explicit on-demand imports.
    fn solve_in_unit(&self, name: &str) -> Result<Option<TypeDeclRef>, ResolveError> {
        let tree = self.tree();
        if let Some(top) = tree
            .top_level_types()
            .into_iter()
            .find(|&t| tree.type_decl(t).is_some_and(|d| d.name.as_str() == name))
        {
            return Ok(Some(SourceTypeDecl::wrap(self.file, top)));
        }

        let imports = self.file.imports();
        for import in imports.type_single.iter().filter(|i| i.imported.as_str() == name) {
            if import.is_unqualified() {
                // Types of the unnamed package cannot be imported.
                tracing::debug!(target: "javelin.scope", name, "single-name import ignored");
                continue;
            }
            if let Some(found) = self.lookup_qualified(&import.path.to_dotted())? {
                return Ok(Some(found));
            }
        }

        let package = self.file.package();
        if let Some(found) = self.solver.try_lookup(&package.qualify(name))? {
            return Ok(Some(found));
        }

        // Implicit and explicit on-demand imports form one tier.
        let mut matches: Vec<TypeDeclRef> = Vec::new();
        let on_demand = self
            .file
            .implicit_imports()
            .iter()
            .map(|implicit| format!("{implicit}.{name}"))
            .chain(
                imports
                    .type_star
                    .iter()
                    .map(|import| format!("{}.{name}", import.path.to_dotted())),
            );
        for candidate in on_demand {
            if let Some(found) = self.lookup_qualified(&candidate)? {
                if !matches.iter().any(|m| m.qualified_name() == found.qualified_name()) {
                    matches.push(found);
                }
            }
        }
        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop()),
            _ => {
                tracing::debug!(
                    target: "javelin.scope",
                    name,
                    candidates = matches.len(),
                    "ambiguous on-demand import"
                );
                Ok(None)
            }
        }
    }

    /// A dotted name as a package-qualified type, or as a member type of a
    /// shorter qualified type (`java.util.Map.Entry`).
    pub(crate) fn lookup_qualified(&self, dotted: &str) -> Result<Option<TypeDeclRef>, ResolveError> {
        if let Some(found) = self.solver.try_lookup(dotted)? {
            return Ok(Some(found));
        }
        let Some((outer, inner)) = dotted.rsplit_once('.') else {
            return Ok(None);
        };
        match self.lookup_qualified(outer)? {
            Some(owner) => lenient(owner.member_type(inner, self.solver)),
            None => Ok(None),
        }
    }

    // ---- values ---------------------------------------------------------

    /// Resolves a simple name in expression position.
    pub(crate) fn solve_value(&self, at: NodeId, name: &str) -> Result<Option<ValueDecl>, ResolveError> {
        let tree = self.tree();
        let use_start = tree.span(at).start;
        for (scope, child) in self.scopes(at) {
            let found = match tree.kind(scope) {
                NodeKind::Block { stmts } => {
                    let mut found = None;
                    for &stmt in stmts {
                        if found.is_none() {
                            found = self.local_in(stmt, name, use_start);
                        }
                        if stmt == child {
                            break;
                        }
                    }
                    found
                }
                NodeKind::For { init, cond, body, .. } => {
                    let mut found = init.iter().find_map(|&i| self.local_in(i, name, use_start));
                    if found.is_none() && child == *body {
                        found = cond.and_then(|c| self.binding(c, name, true));
                    }
                    found
                }
                NodeKind::ForEach { var, iterable, .. } if child != *iterable => {
                    self.local_in(*var, name, usize::MAX)
                }
                NodeKind::Catch { param, body } if child == *body => self.param_local(*param, name),
                NodeKind::Try {
                    resources, block, ..
                } => {
                    let visible = if child == *block {
                        resources.len()
                    } else {
                        resources.iter().position(|&r| r == child).unwrap_or(0)
                    };
                    resources[..visible]
                        .iter()
                        .find_map(|&r| self.local_in(r, name, usize::MAX))
                }
                NodeKind::If {
                    cond,
                    then_branch,
                    else_branch,
                } => {
                    if child == *then_branch {
                        self.binding(*cond, name, true)
                    } else if Some(child) == *else_branch {
                        self.binding(*cond, name, false)
                    } else {
                        None
                    }
                }
                NodeKind::While { cond, body } if child == *body => self.binding(*cond, name, true),
                NodeKind::Binary {
                    op: BinaryOp::And,
                    lhs,
                    rhs,
                } if child == *rhs => self.binding(*lhs, name, true),
                NodeKind::Binary {
                    op: BinaryOp::Or,
                    lhs,
                    rhs,
                } if child == *rhs => self.binding(*lhs, name, false),
                NodeKind::Conditional {
                    cond,
                    then_expr,
                    else_expr,
                } => {
                    if child == *then_expr {
                        self.binding(*cond, name, true)
                    } else if child == *else_expr {
                        self.binding(*cond, name, false)
                    } else {
                        None
                    }
                }
                NodeKind::Method(data) => self.formal_param(&data.params, name),
                NodeKind::Constructor(data) => self.formal_param(&data.params, name),
                NodeKind::TypeDecl(data) => {
                    if in_header(data, child) {
                        None
                    } else {
                        self.field_of(&SourceTypeDecl::wrap(self.file, scope), name)?
                    }
                }
                NodeKind::New {
                    ty, body: Some(body), ..
                } if body.contains(&child) => match self.anonymous_supertype(*ty)? {
                    Some(created) => self.field_of(&created, name)?,
                    None => None,
                },
                NodeKind::CompilationUnit { .. } => self.static_import_value(name)?,
                _ => None,
            };
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }

    /// A variable named `name` declared by a local variable statement and
    /// visible at `use_start`.
    fn local_in(&self, stmt: NodeId, name: &str, use_start: usize) -> Option<ValueDecl> {
        let tree = self.tree();
        let NodeKind::LocalVar { variables, .. } = tree.kind(stmt) else {
            return None;
        };
        variables
            .iter()
            .copied()
            .find(|&v| {
                matches!(tree.kind(v), NodeKind::Variable { name: n, .. } if n.as_str() == name)
                    && tree.span(v).start < use_start
            })
            .map(|v| ValueDecl::Local(SourceLocal::wrap(self.file, v, stmt)))
    }

    fn param_local(&self, param: NodeId, name: &str) -> Option<ValueDecl> {
        matches!(self.tree().kind(param), NodeKind::Parameter { name: n, .. } if n.as_str() == name)
            .then(|| ValueDecl::Local(SourceLocal::wrap(self.file, param, param)))
    }

    fn formal_param(&self, params: &[NodeId], name: &str) -> Option<ValueDecl> {
        let tree = self.tree();
        params
            .iter()
            .find(|&&p| matches!(tree.kind(p), NodeKind::Parameter { name: n, .. } if n.as_str() == name))
            .map(|&p| ValueDecl::Parameter(SourceParameter::wrap(self.file, p)))
    }

    /// The pattern variable introduced by `cond` when it evaluates to `when`
    /// (JLS 6.3.1).
    fn binding(&self, cond: NodeId, name: &str, when: bool) -> Option<ValueDecl> {
        let tree = self.tree();
        match tree.kind(cond) {
            NodeKind::InstanceOf {
                binding: Some(binding),
                ..
            } if when => self.param_local(*binding, name),
            NodeKind::Paren { expr } => self.binding(*expr, name, when),
            NodeKind::Unary {
                op: UnaryOp::Not,
                operand,
            } => self.binding(*operand, name, !when),
            NodeKind::Binary {
                op: BinaryOp::And,
                lhs,
                rhs,
            } if when => self
                .binding(*lhs, name, true)
                .or_else(|| self.binding(*rhs, name, true)),
            NodeKind::Binary {
                op: BinaryOp::Or,
                lhs,
                rhs,
            } if !when => self
                .binding(*lhs, name, false)
                .or_else(|| self.binding(*rhs, name, false)),
            _ => None,
        }
    }

    /// A field or enum constant of `decl`, declared or inherited.
    pub(crate) fn field_of(&self, decl: &TypeDeclRef, name: &str) -> Result<Option<ValueDecl>, ResolveError> {
        if let Some(constant) = decl.enum_constants().into_iter().find(|c| c.name() == name) {
            return Ok(Some(ValueDecl::EnumConstant(constant)));
        }
        if let Some(field) = decl.declared_fields().into_iter().find(|f| f.name() == name) {
            return Ok(Some(ValueDecl::Field(field)));
        }
        let inherited = lenient(decl.all_fields(self.solver))?;
        Ok(inherited
            .into_iter()
            .find(|f| f.name() == name)
            .map(ValueDecl::Field))
    }

    /// `import static T.name;` first, then `import static T.*;`.
    fn static_import_value(&self, name: &str) -> Result<Option<ValueDecl>, ResolveError> {
        let imports = self.file.imports();
        for import in imports.static_single.iter().filter(|i| i.member.as_str() == name) {
            if let Some(owner) = self.lookup_qualified(&import.ty.to_dotted())? {
                if let Some(found) = self.static_field(&owner, name)? {
                    return Ok(Some(found));
                }
            }
        }
        for import in &imports.static_star {
            if let Some(owner) = self.lookup_qualified(&import.ty.to_dotted())? {
                if let Some(found) = self.static_field(&owner, name)? {
                    return Ok(Some(found));
                }
            }
        }
        Ok(None)
    }

    fn static_field(&self, owner: &TypeDeclRef, name: &str) -> Result<Option<ValueDecl>, ResolveError> {
        Ok(self.field_of(owner, name)?.filter(|v| v.as_declaration().is_static()))
    }

    // ---- methods --------------------------------------------------------

    /// Methods an unqualified call `name(...)` at `at` may invoke: those of
    /// the innermost enclosing class that has a member of that name, else
    /// the statically imported ones.
    pub(crate) fn method_candidates(&self, at: NodeId, name: &str) -> Result<MethodScope, ResolveError> {
        let tree = self.tree();
        for (scope, child) in self.scopes(at) {
            let owner = match tree.kind(scope) {
                NodeKind::TypeDecl(data) if !in_header(data, child) => {
                    Some(SourceTypeDecl::wrap(self.file, scope))
                }
                NodeKind::New {
                    ty, body: Some(body), ..
                } if body.contains(&child) => self.anonymous_supertype(*ty)?,
                NodeKind::CompilationUnit { .. } => {
                    return Ok(MethodScope {
                        methods: self.static_import_methods(name)?,
                        receiver: None,
                    })
                }
                _ => None,
            };
            let Some(owner) = owner else {
                continue;
            };
            let methods = self.methods_named(&owner, name)?;
            if !methods.is_empty() {
                return Ok(MethodScope {
                    methods,
                    receiver: Some(owner.self_type()),
                });
            }
        }
        Ok(MethodScope::default())
    }

    /// Methods of `decl` named `name`, inherited ones included. When a
    /// supertype cannot be resolved the declared methods still count.
    pub(crate) fn methods_named(&self, decl: &TypeDeclRef, name: &str) -> Result<Vec<MethodRef>, ResolveError> {
        let all = match decl.all_methods(self.solver) {
            Ok(all) => all,
            Err(err) if err.is_unsolved() => {
                tracing::debug!(
                    target: "javelin.scope",
                    ty = %decl.qualified_name(),
                    error = %err,
                    "inherited methods unavailable"
                );
                decl.declared_methods()
            }
            Err(err) => return Err(err),
        };
        Ok(all.into_iter().filter(|m| m.name() == name).collect())
    }

    fn static_import_methods(&self, name: &str) -> Result<Vec<MethodRef>, ResolveError> {
        let imports = self.file.imports();
        let mut out = Vec::new();
        for import in imports.static_single.iter().filter(|i| i.member.as_str() == name) {
            if let Some(owner) = self.lookup_qualified(&import.ty.to_dotted())? {
                out.extend(self.methods_named(&owner, name)?.into_iter().filter(|m| m.is_static()));
            }
        }
        if !out.is_empty() {
            return Ok(out);
        }
        for import in &imports.static_star {
            if let Some(owner) = self.lookup_qualified(&import.ty.to_dotted())? {
                out.extend(self.methods_named(&owner, name)?.into_iter().filter(|m| m.is_static()));
            }
        }
        Ok(out)
    }
}

/// Whether `child` is part of a type declaration's header (type parameters,
/// `extends`, `implements`, `permits`), where member names are not in scope.
pub(crate) fn in_header(data: &TypeDeclData, child: NodeId) -> bool {
    data.type_params.contains(&child)
        || data.extends.contains(&child)
        || data.implements.contains(&child)
        || data.permits.contains(&child)
}

#[cfg(test)]
mod tests {
    use javelin_core::ResolverConfig;
    use javelin_types::{MemoryTypeSolver, StubTypeDecl};

    use super::*;
    use crate::file::SourceFile;

    fn file(text: &str) -> SourceRef {
        SourceFile::parse(text, &ResolverConfig::default()).unwrap()
    }

    fn name_node(file: &SourceRef, name: &str, nth: usize) -> NodeId {
        file.tree()
            .find_all(|k| matches!(k, NodeKind::Name { name: n } if n.as_str() == name))[nth]
    }

    #[test]
    fn locals_are_visible_after_their_declaration() {
        let file = file("class A { void m(int p) { int a = p; a = 1; { int b = a; } } }");
        let solver = MemoryTypeSolver::new();
        let cx = Context::new(&file, &solver);

        let use_of_a = name_node(&file, "a", 0);
        let found = cx.solve_value(use_of_a, "a").unwrap().unwrap();
        assert!(matches!(found, ValueDecl::Local(_)));
        let use_of_p = name_node(&file, "p", 0);
        assert!(matches!(cx.solve_value(use_of_p, "p").unwrap(), Some(ValueDecl::Parameter(_))));
        assert!(cx.solve_value(use_of_p, "b").unwrap().is_none());
    }

    #[test]
    fn pattern_bindings_follow_the_condition() {
        let file = file(
            "class A { void m(Object o) { if (!(o instanceof String s)) { s = null; } else { s = null; } } }",
        );
        let solver = MemoryTypeSolver::new();
        let cx = Context::new(&file, &solver);
        let in_then = name_node(&file, "s", 0);
        let in_else = name_node(&file, "s", 1);
        assert!(cx.solve_value(in_then, "s").unwrap().is_none());
        assert!(matches!(cx.solve_value(in_else, "s").unwrap(), Some(ValueDecl::Local(_))));
    }

    #[test]
    fn type_parameters_shadow_types() {
        let file = file("class A<String> { String s; }");
        let solver = MemoryTypeSolver::new().with(StubTypeDecl::class("java.lang.String").build().unwrap());
        let cx = Context::new(&file, &solver);
        let field_type = file.tree().find_all(|k| matches!(k, NodeKind::ClassType { .. }))[0];
        assert!(matches!(
            cx.solve_type_name(field_type, "String").unwrap(),
            Some(TypeName::Variable(_))
        ));
    }

    #[test]
    fn header_does_not_see_member_types() {
        let file = file("class A extends B { class B {} }");
        let solver = MemoryTypeSolver::new();
        let cx = Context::new(&file, &solver);
        let extends = file.tree().type_by_name("A").and_then(|a| file.tree().type_decl(a)).unwrap().extends[0];
        assert!(cx.solve_type_name(extends, "B").unwrap().is_none());
    }
}
