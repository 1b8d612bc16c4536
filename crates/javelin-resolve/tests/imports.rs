use std::sync::Arc;

use javelin_resolve::{SourceRef, SymbolResolver};
use javelin_syntax::NodeId;
use javelin_syntax::NodeKind;
use javelin_types::{
    Declaration, MemoryTypeSolver, ReferenceTypeDecl, ResolveError, ResolvedDeclaration, StubTypeDecl,
    TypeSolver,
};
use pretty_assertions::assert_eq;

fn resolver(extra: &[&str]) -> SymbolResolver {
    let solver = MemoryTypeSolver::new()
        .with(StubTypeDecl::class("java.lang.Object").build().unwrap())
        .with(StubTypeDecl::class("java.lang.String").build().unwrap());
    for name in extra {
        solver.add(StubTypeDecl::class(name).build().unwrap());
    }
    SymbolResolver::new(Arc::new(solver))
}

/// The first `extends` clause of top-level type `name`.
fn extended(file: &SourceRef, name: &str) -> NodeId {
    let tree = file.tree();
    let node = tree.type_by_name(name).unwrap();
    tree.type_decl(node).unwrap().extends[0]
}

fn superclass_name(resolver: &SymbolResolver, file: &SourceRef) -> Result<String, ResolveError> {
    let tree = file.tree();
    let decl = resolver
        .type_declaration(file, tree.type_by_name("A").unwrap())
        .unwrap();
    let superclass = decl.superclass(resolver.solver())?.unwrap();
    Ok(superclass.describe())
}

#[test]
fn default_package_types_are_visible_from_the_default_package() {
    let resolver = resolver(&["B"]);
    let file = resolver.parse("class A extends B {}").unwrap();

    let ty = resolver.resolve_type(&file, extended(&file, "A")).unwrap();
    assert_eq!(ty.type_decl().unwrap().qualified_name(), "B");
    assert_eq!(superclass_name(&resolver, &file).unwrap(), "B");
}

#[test]
fn importing_a_default_package_type_is_unsolved() {
    let resolver = resolver(&["B"]);
    let file = resolver.parse("package p; import B; class A extends B {}").unwrap();

    let found = resolver.solve_type(&file, extended(&file, "A")).unwrap();
    assert!(!found.is_solved());
    assert!(found.reason().is_some_and(ResolveError::is_unsolved));
    assert!(superclass_name(&resolver, &file).unwrap_err().is_unsolved());
}

#[test]
fn default_package_types_are_invisible_from_named_packages() {
    let resolver = resolver(&["B"]);
    let file = resolver.parse("package p; class A extends B {}").unwrap();

    let found = resolver.solve_type(&file, extended(&file, "A")).unwrap();
    assert_eq!(
        found.reason(),
        Some(&ResolveError::unsolved_symbol("B", "p.A"))
    );
}

#[test]
fn single_type_imports_shadow_on_demand_imports() {
    let resolver = resolver(&["q.B", "r.B"]);
    let file = resolver
        .parse("package p; import q.*; import r.B; class A extends B {}")
        .unwrap();
    let ty = resolver.resolve_type(&file, extended(&file, "A")).unwrap();
    assert_eq!(ty.describe(), "r.B");
}

#[test]
fn ambiguous_on_demand_imports_are_unsolved() {
    let resolver = resolver(&["q.B", "r.B"]);
    let file = resolver
        .parse("package p; import q.*; import r.*; class A extends B {}")
        .unwrap();
    let found = resolver.solve_type(&file, extended(&file, "A")).unwrap();
    assert!(!found.is_solved());
}

#[test]
fn implicit_and_explicit_on_demand_imports_clash() {
    let resolver = resolver(&["q.String"]);
    let file = resolver
        .parse("package p; import q.*; class A extends String {}")
        .unwrap();
    let found = resolver.solve_type(&file, extended(&file, "A")).unwrap();
    assert!(!found.is_solved());

    let file = resolver
        .parse("package p; import java.lang.*; class A extends String {}")
        .unwrap();
    let ty = resolver.resolve_type(&file, extended(&file, "A")).unwrap();
    assert_eq!(ty.describe(), "java.lang.String");
}

#[test]
fn declarations_in_the_unit_shadow_imports() {
    let resolver = resolver(&["q.B"]);
    let file = resolver
        .parse("package p; import q.B; class A extends B {} class B {}")
        .unwrap();
    let ty = resolver.resolve_type(&file, extended(&file, "A")).unwrap();
    assert_eq!(ty.describe(), "p.B");
}

#[test]
fn same_package_types_are_visible_without_import() {
    let resolver = resolver(&["p.B"]);
    let file = resolver.parse("package p; class A extends B {}").unwrap();
    let ty = resolver.resolve_type(&file, extended(&file, "A")).unwrap();
    assert_eq!(ty.describe(), "p.B");
}

#[test]
fn type_parameters_shadow_types_of_the_same_name() {
    let resolver = resolver(&["p.T"]);
    let file = resolver
        .parse("package p; class A<T> { T value; }")
        .unwrap();
    let tree = file.tree();
    let field_type = tree
        .find_all(|k| matches!(k, NodeKind::Field { .. }))
        .into_iter()
        .find_map(|f| match tree.kind(f) {
            NodeKind::Field { ty, .. } => Some(*ty),
            _ => None,
        })
        .unwrap();
    match resolver.resolve_symbol(&file, field_type).unwrap().into_declaration() {
        Some(ResolvedDeclaration::TypeParameter(tp)) => assert_eq!(tp.name(), "T"),
        other => panic!("expected a type parameter, got {other:?}"),
    }
}

#[test]
fn qualified_names_resolve_without_imports() {
    let resolver = resolver(&["q.B"]);
    let file = resolver.parse("package p; class A extends q.B {}").unwrap();
    let ty = resolver.resolve_type(&file, extended(&file, "A")).unwrap();
    assert_eq!(ty.describe(), "q.B");
    assert!(resolver.solver().has_type("q.B"));
}

#[test]
fn implicit_imports_come_from_the_configuration() {
    let solver = MemoryTypeSolver::new()
        .with(StubTypeDecl::class("java.lang.Object").build().unwrap())
        .with(StubTypeDecl::class("java.util.List").build().unwrap());
    let config =
        javelin_core::ResolverConfig::from_toml_str("implicit_imports = [\"java.lang\", \"java.util\"]").unwrap();
    let resolver = SymbolResolver::with_config(Arc::new(solver), config);
    let file = resolver.parse("class A extends List {}").unwrap();
    let ty = resolver.resolve_type(&file, extended(&file, "A")).unwrap();
    assert_eq!(ty.describe(), "java.util.List");
}
