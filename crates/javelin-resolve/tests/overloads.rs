use std::sync::Arc;

use javelin_resolve::SymbolResolver;
use javelin_syntax::NodeKind;
use javelin_test_utils::{extract_marker, jdk_solver, node_at, parse_unit};
use javelin_types::{MethodLikeDecl, MethodRef, ResolveError, SymbolReference};
use pretty_assertions::assert_eq;

/// Resolves the call marked `/*here*/` and renders the chosen signature.
fn solve(fixture: &str) -> SymbolReference<MethodRef> {
    let resolver = SymbolResolver::new(Arc::new(jdk_solver()));
    let (text, offset) = extract_marker(fixture, "here");
    let file = resolver.load(parse_unit(&text));
    let call = node_at(file.tree(), offset, |k| matches!(k, NodeKind::MethodCall { .. }));
    resolver.solve_method_call(&file, call).unwrap()
}

fn chosen(fixture: &str) -> String {
    let resolver = SymbolResolver::new(Arc::new(jdk_solver()));
    match solve(fixture) {
        SymbolReference::Solved(method) => method.signature(resolver.solver()).unwrap(),
        SymbolReference::Unsolved(err) => panic!("unsolved: {err}"),
    }
}

#[test]
fn fixed_arity_beats_variadic() {
    assert_eq!(
        chosen("class A { void m(int a, int b) {} void m(int... xs) {} void t() { /*here*/m(1, 2); } }"),
        "m(int, int)"
    );
}

#[test]
fn variadic_applies_when_nothing_else_does() {
    assert_eq!(
        chosen("class A { void m(int... xs) {} void t() { /*here*/m(1, 2); } }"),
        "m(int[])"
    );
    assert_eq!(
        chosen("class A { void m(int... xs) {} void t() { /*here*/m(); } }"),
        "m(int[])"
    );
}

#[test]
fn empty_variadic_calls_pick_the_most_specific_element_type() {
    assert_eq!(
        chosen("class A { void m(Object... xs) {} void m(String... xs) {} void t() { /*here*/m(); } }"),
        "m(java.lang.String[])"
    );
    assert_eq!(
        chosen("class A { void m(String... xs) {} void m(Object... xs) {} void t() { /*here*/m(); } }"),
        "m(java.lang.String[])"
    );
}

#[test]
fn fixed_arity_beats_object_varargs() {
    assert_eq!(
        chosen("class A { void m(Object... xs) {} void m(int a, int b, int c) {} void t() { /*here*/m(1, 2, 3); } }"),
        "m(int, int, int)"
    );
}

#[test]
fn widening_beats_boxing() {
    assert_eq!(
        chosen("class A { void m(long x) {} void m(Integer x) {} void t() { /*here*/m(1); } }"),
        "m(long)"
    );
    assert_eq!(
        chosen("class A { void m(Object x) {} void m(String x) {} void t() { /*here*/m(\"s\"); } }"),
        "m(java.lang.String)"
    );
}

#[test]
fn boxing_applies_in_the_second_phase() {
    assert_eq!(
        chosen("class A { void m(Integer x) {} void m(String x) {} void t() { /*here*/m(1); } }"),
        "m(java.lang.Integer)"
    );
}

#[test]
fn ambiguous_calls_are_unsolved_with_a_marker() {
    let found = solve("class A { void m(Integer x) {} void m(String x) {} void t() { /*here*/m(null); } }");
    assert!(found.is_ambiguous());
    match found.reason() {
        Some(ResolveError::AmbiguousMethod { name, candidates }) => {
            assert_eq!(name, "m");
            assert_eq!(candidates.len(), 2);
        }
        other => panic!("expected ambiguity, got {other:?}"),
    }
}

#[test]
fn missing_methods_are_unsolved() {
    let found = solve("class A { void m(String x) {} void t() { /*here*/m(1); } }");
    assert!(!found.is_solved());
    assert!(!found.is_ambiguous());
}

#[test]
fn inherited_and_library_methods_take_part() {
    assert_eq!(
        chosen("class B { void m(Object o) {} } class A extends B { void m(String s) {} void t() { /*here*/m(1); } }"),
        "m(java.lang.Object)"
    );
    assert_eq!(
        chosen("class A { void t(StringBuilder sb) { /*here*/sb.append('c'); } }"),
        "append(char)"
    );
}

#[test]
fn static_imports_contribute_candidates() {
    assert_eq!(
        chosen("import static java.lang.Math.max; class A { void t() { /*here*/max(1, 2L); } }"),
        "max(long, long)"
    );
}
