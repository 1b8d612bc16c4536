use std::sync::Arc;

use javelin_resolve::SymbolResolver;
use javelin_syntax::NodeKind;
use javelin_test_utils::{extract_marker, jdk_solver, node_at, parse_unit};
use javelin_types::{MethodUsage, ResolveError};
use pretty_assertions::assert_eq;

fn usage_at(fixture: &str) -> Result<MethodUsage, ResolveError> {
    let resolver = SymbolResolver::new(Arc::new(jdk_solver()));
    let (text, offset) = extract_marker(fixture, "here");
    let file = resolver.load(parse_unit(&text));
    let call = node_at(file.tree(), offset, |k| matches!(k, NodeKind::MethodCall { .. }));
    resolver.method_usage(&file, call)
}

fn returns(fixture: &str) -> String {
    usage_at(fixture).unwrap().return_type().describe()
}

fn call_type(fixture: &str) -> String {
    let resolver = SymbolResolver::new(Arc::new(jdk_solver()));
    let (text, offset) = extract_marker(fixture, "here");
    let file = resolver.load(parse_unit(&text));
    let call = node_at(file.tree(), offset, |k| matches!(k, NodeKind::MethodCall { .. }));
    resolver.resolve_expression(&file, call).unwrap().describe()
}

fn created(fixture: &str) -> String {
    let resolver = SymbolResolver::new(Arc::new(jdk_solver()));
    let (text, offset) = extract_marker(fixture, "here");
    let file = resolver.load(parse_unit(&text));
    let new = node_at(file.tree(), offset, |k| matches!(k, NodeKind::New { .. }));
    resolver.resolve_expression(&file, new).unwrap().describe()
}

#[test]
fn source_generic_methods_infer_from_arguments() {
    assert_eq!(
        returns("class A { <T> T id(T t) { return t; } void m() { /*here*/id(\"s\"); } }"),
        "java.lang.String"
    );
    assert_eq!(
        returns("class A { <T extends Number> T first(T a, T b) { return a; } void m() { /*here*/first(1, 2); } }"),
        "java.lang.Integer"
    );
}

#[test]
fn arguments_take_precedence_over_the_assignment_target() {
    let id = "class A { <T> T id(T t) { return t; } void m() { Object o = /*here*/id(\"s\"); } }";
    assert_eq!(returns(id), "java.lang.String");
    assert_eq!(call_type(id), "java.lang.String");

    let max = "class A { <T extends Comparable<T>> T max(T a, T b) { return a; } void m() { Object o = /*here*/max(1, 2); } }";
    assert_eq!(returns(max), "java.lang.Integer");
    assert_eq!(call_type(max), "java.lang.Integer");
}

#[test]
fn explicit_type_arguments_win() {
    assert_eq!(
        returns("import java.util.*; class A { Object o = /*here*/Collections.<Integer>emptyList(); }"),
        "java.util.List<java.lang.Integer>"
    );
}

#[test]
fn explicit_type_arguments_must_match_in_number() {
    let err = usage_at("import java.util.*; class A { Object o = /*here*/Collections.<Integer, String>emptyList(); }")
        .unwrap_err();
    assert!(err.is_unsolved());
}

#[test]
fn receiver_arguments_reach_inherited_members() {
    assert_eq!(
        returns("import java.util.*; class A { void m(ArrayList<String> xs) { /*here*/xs.get(0); } }"),
        "java.lang.String"
    );
    assert_eq!(
        returns("class Base<T> { T get() { return null; } } class Sub extends Base<Integer> {} class A { void m(Sub s) { /*here*/s.get(); } }"),
        "java.lang.Integer"
    );
}

#[test]
fn constructors_infer_diamond_arguments() {
    assert_eq!(
        created("import java.util.*; class A { List<Integer> xs = /*here*/new ArrayList<>(); }"),
        "java.util.ArrayList<java.lang.Integer>"
    );
    assert_eq!(
        created("import java.util.*; class A { void m(List<String> src) { Object o = /*here*/new ArrayList<>(src); } }"),
        "java.util.ArrayList<java.lang.String>"
    );
}

#[test]
fn anonymous_classes_have_their_supertype() {
    assert_eq!(
        created("class A { Object r = /*here*/new Runnable() { public void run() {} }; }"),
        "java.lang.Runnable"
    );
}

#[test]
fn malformed_type_argument_counts_are_reported() {
    let resolver = SymbolResolver::new(Arc::new(jdk_solver()));
    let file = resolver
        .parse("import java.util.*; class A { Map<String> m; }")
        .unwrap();
    let field_type = file
        .tree()
        .find_all(|k| matches!(k, NodeKind::ClassType { name, .. } if name.as_str() == "Map"))[0];
    let found = resolver.solve_type(&file, field_type).unwrap();
    assert_eq!(
        found.reason(),
        Some(&ResolveError::WrongTypeArgumentCount {
            name: "java.util.Map".into(),
            expected: 2,
            found: 1,
        })
    );
}
