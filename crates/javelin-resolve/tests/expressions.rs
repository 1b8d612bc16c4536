use std::sync::Arc;

use javelin_resolve::SymbolResolver;
use javelin_syntax::NodeKind;
use javelin_test_utils::{extract_marker, jdk_solver, node_at, parse_unit};
use javelin_types::{DeclKind, ResolvedDeclaration};
use pretty_assertions::assert_eq;

fn resolver() -> SymbolResolver {
    SymbolResolver::new(Arc::new(jdk_solver()))
}

/// Type of the smallest expression starting at `/*here*/`.
fn type_at(fixture: &str) -> String {
    let resolver = resolver();
    let (text, offset) = extract_marker(fixture, "here");
    let file = resolver.load(parse_unit(&text));
    let expr = node_at(file.tree(), offset, NodeKind::is_expression);
    match resolver.resolve_expression(&file, expr) {
        Ok(ty) => ty.describe(),
        Err(err) => panic!("{err}"),
    }
}

fn symbol_at(fixture: &str) -> ResolvedDeclaration {
    let resolver = resolver();
    let (text, offset) = extract_marker(fixture, "here");
    let file = resolver.load(parse_unit(&text));
    let node = node_at(file.tree(), offset, |k| {
        matches!(k, NodeKind::Name { .. } | NodeKind::FieldAccess { .. })
    });
    match resolver.resolve_symbol(&file, node).unwrap().into_result() {
        Ok(decl) => decl,
        Err(err) => panic!("{err}"),
    }
}

#[test]
fn var_locals_take_the_initializer_type() {
    assert_eq!(
        type_at("import java.util.*; class A { void m() { var l = new ArrayList<String>(); Object o = /*here*/l; } }"),
        "java.util.ArrayList<java.lang.String>"
    );
    assert_eq!(
        type_at("class A { void m() { var n = 1L + 2; Object o = /*here*/n; } }"),
        "long"
    );
}

#[test]
fn for_each_variables_take_the_element_type() {
    assert_eq!(
        type_at("import java.util.*; class A { void m(List<String> xs) { for (var x : xs) { Object o = /*here*/x; } } }"),
        "java.lang.String"
    );
    assert_eq!(
        type_at("class A { void m(int[][] grid) { for (int[] row : grid) { Object o = /*here*/row; } } }"),
        "int[]"
    );
}

#[test]
fn pattern_bindings_are_in_scope_where_they_match() {
    assert_eq!(
        type_at("class A { void m(Object o) { if (o instanceof String s) { Object x = /*here*/s; } } }"),
        "java.lang.String"
    );
    assert_eq!(
        type_at("class A { void m(Object o) { if (!(o instanceof String s)) { return; } else { Object x = /*here*/s; } } }"),
        "java.lang.String"
    );
}

#[test]
fn operators_follow_numeric_promotion() {
    assert_eq!(type_at("class A { Object o = /*here*/('a' + 1); }"), "int");
    assert_eq!(type_at("class A { void m(short s) { Object o = /*here*/(s += 1); } }"), "short");
    assert_eq!(type_at("class A { Object o = /*here*/(1 + 2.0f); }"), "float");
    assert_eq!(type_at("class A { Object o = /*here*/(\"a\" + 1); }"), "java.lang.String");
    assert_eq!(type_at("class A { Object o = /*here*/(1L << 2); }"), "long");
    assert_eq!(type_at("class A { Object o = /*here*/(1 < 2); }"), "boolean");
}

#[test]
fn fields_and_methods_of_generic_receivers_are_substituted() {
    assert_eq!(
        type_at("class Box<T> { T value; } class A { void m(Box<String> b) { Object o = /*here*/(b.value); } }"),
        "java.lang.String"
    );
    assert_eq!(
        type_at("import java.util.*; class A { void m(List<? extends Number> xs) { Object o = /*here*/(xs.get(0)); } }"),
        "java.lang.Number"
    );
}

#[test]
fn static_members_are_reached_through_imports_and_types() {
    assert_eq!(
        type_at("import static java.lang.Math.PI; class A { Object o = /*here*/PI; }"),
        "double"
    );
    assert_eq!(
        type_at("import static java.lang.Math.*; class A { Object o = /*here*/abs(1L); }"),
        "long"
    );
    assert_eq!(
        type_at("class A { Object o = /*here*/(Integer.MAX_VALUE); }"),
        "int"
    );
}

#[test]
fn qualified_this_names_the_enclosing_instance() {
    assert_eq!(
        type_at("package p; class Outer { class Inner { Object o = /*here*/Outer.this; } }"),
        "p.Outer"
    );
}

#[test]
fn names_resolve_to_their_declarations() {
    let local = symbol_at("class A { void m() { int count = 0; Object o = /*here*/count; } }");
    assert_eq!(local.kind(), DeclKind::LocalVariable);
    assert_eq!(local.name(), "count");

    let param = symbol_at("class A { void m(int width) { Object o = /*here*/width; } }");
    assert_eq!(param.kind(), DeclKind::Parameter);

    let field = symbol_at("class A { int size; void m() { Object o = /*here*/size; } }");
    assert_eq!(field.kind(), DeclKind::Field);

    let constant = symbol_at("enum E { ONE; static Object o = /*here*/ONE; }");
    assert_eq!(constant.kind(), DeclKind::EnumConstant);

    let ty = symbol_at("class A { Object o = /*here*/String.valueOf(1); }");
    assert_eq!(ty.kind(), DeclKind::Class);
    assert_eq!(ty.name(), "String");
}

#[test]
fn locals_shadow_fields() {
    let decl = symbol_at("class A { int n; void m() { int n = 1; Object o = /*here*/n; } }");
    assert_eq!(decl.kind(), DeclKind::LocalVariable);
}
