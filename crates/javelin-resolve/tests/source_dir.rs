use std::sync::Arc;

use javelin_core::ResolverConfig;
use javelin_resolve::{SourceDirTypeSolver, SymbolResolver};
use javelin_test_utils::{jdk_solver_with, temp_dir, write_sources};
use javelin_types::{Declaration, ReferenceTypeDecl, ResolveError, TypeSolver};
use pretty_assertions::assert_eq;

#[test]
fn types_are_found_by_path_and_nesting() {
    let dir = temp_dir();
    write_sources(
        dir.path(),
        &[
            ("p/Outer.java", "package p; public class Outer { public static class Inner {} }"),
            ("Top.java", "class Top {}"),
        ],
    );
    let solver = SourceDirTypeSolver::new(dir.path(), ResolverConfig::default());

    let outer = solver.solve_type("p.Outer").unwrap();
    assert_eq!(outer.qualified_name(), "p.Outer");
    let inner = solver.solve_type("p.Outer.Inner").unwrap();
    assert_eq!(inner.name(), "Inner");
    assert!(inner.is_static());
    assert_eq!(solver.solve_type("Top").unwrap().qualified_name(), "Top");
    assert!(solver.try_lookup("p.Missing").unwrap().is_none());
    assert_eq!(solver.known_types().unwrap(), ["Top", "p.Outer"]);
}

#[test]
fn lookups_return_the_same_declaration() {
    let dir = temp_dir();
    write_sources(dir.path(), &[("p/A.java", "package p; class A {}")]);
    let solver = SourceDirTypeSolver::new(dir.path(), ResolverConfig::default());
    let first = solver.solve_type("p.A").unwrap();
    let second = solver.solve_type("p.A").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn misplaced_files_are_ignored() {
    let dir = temp_dir();
    write_sources(dir.path(), &[("p/A.java", "package q; class A {}")]);
    let solver = SourceDirTypeSolver::new(dir.path(), ResolverConfig::default());
    assert!(solver.try_lookup("p.A").unwrap().is_none());
    assert!(solver.try_lookup("q.A").unwrap().is_none());
}

#[test]
fn unparsable_files_are_fatal() {
    let dir = temp_dir();
    write_sources(dir.path(), &[("p/A.java", "package p; class A {")]);
    let solver = SourceDirTypeSolver::new(dir.path(), ResolverConfig::default());
    assert!(matches!(
        solver.try_lookup("p.A"),
        Err(ResolveError::Source { .. })
    ));
}

#[test]
fn source_types_resolve_against_each_other_and_the_jdk() {
    let dir = temp_dir();
    write_sources(
        dir.path(),
        &[
            ("p/Base.java", "package p; public class Base<T> { public T item; }"),
            ("p/Child.java", "package p; public class Child extends Base<String> {}"),
        ],
    );
    let source = Arc::new(SourceDirTypeSolver::new(dir.path(), ResolverConfig::default()));
    let resolver = SymbolResolver::new(Arc::new(jdk_solver_with(vec![source as Arc<dyn TypeSolver>])));

    let child = resolver.solver().solve_type("p.Child").unwrap();
    assert_eq!(
        child.superclass(resolver.solver()).unwrap().unwrap().describe(),
        "p.Base<java.lang.String>"
    );
    let ancestors: Vec<String> = child
        .all_ancestors(resolver.solver())
        .unwrap()
        .iter()
        .map(|t| t.describe())
        .collect();
    assert!(ancestors.contains(&"java.lang.Object".to_string()));

    let file = resolver
        .parse("package p; class User { Object o = new Child().item; }")
        .unwrap();
    let init = file
        .tree()
        .find_all(|k| matches!(k, javelin_syntax::NodeKind::FieldAccess { .. }))[0];
    assert_eq!(
        resolver.resolve_expression(&file, init).unwrap().describe(),
        "java.lang.String"
    );
}
