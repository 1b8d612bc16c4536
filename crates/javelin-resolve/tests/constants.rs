use std::sync::Arc;

use javelin_resolve::{SourceRef, SymbolResolver};
use javelin_syntax::{NodeId, NodeKind};
use javelin_test_utils::jdk_solver;
use javelin_types::{ConstantValue, FieldDecl, ResolvedDeclaration};
use pretty_assertions::assert_eq;

fn resolver() -> SymbolResolver {
    SymbolResolver::new(Arc::new(jdk_solver()))
}

fn variable(file: &SourceRef, name: &str) -> NodeId {
    file.tree()
        .find_all(|k| matches!(k, NodeKind::Variable { name: n, .. } if n.as_str() == name))[0]
}

fn field_constant(resolver: &SymbolResolver, file: &SourceRef, name: &str) -> Option<ConstantValue> {
    match resolver.resolve_declaration(file, variable(file, name)).unwrap() {
        ResolvedDeclaration::Field(field) => field.constant_value(),
        other => panic!("{name} is not a field: {other:?}"),
    }
}

fn initializer(file: &SourceRef, name: &str) -> NodeId {
    match file.tree().kind(variable(file, name)) {
        NodeKind::Variable { init: Some(init), .. } => *init,
        other => panic!("{name} has no initializer: {other:?}"),
    }
}

#[test]
fn static_final_fields_fold_their_initializer() {
    let resolver = resolver();
    let file = resolver
        .parse("class C { static final int X = 1 + 2; static int Y = 1 + 2; final int Z = 1 + 2; }")
        .unwrap();
    assert_eq!(field_constant(&resolver, &file, "X"), Some(ConstantValue::Int(3)));
    assert_eq!(field_constant(&resolver, &file, "Y"), None);
    assert_eq!(field_constant(&resolver, &file, "Z"), None);
}

#[test]
fn constants_refer_to_constants_of_the_same_unit() {
    let resolver = resolver();
    let file = resolver
        .parse(
            "class C {
                static final int X = 2;
                static final long Y = X * 3L;
                static final String S = \"n=\" + X;
                static final int LOOP = LOOP + 1;
            }",
        )
        .unwrap();
    assert_eq!(field_constant(&resolver, &file, "Y"), Some(ConstantValue::Long(6)));
    assert_eq!(
        field_constant(&resolver, &file, "S"),
        Some(ConstantValue::String("n=2".into()))
    );
    assert_eq!(field_constant(&resolver, &file, "LOOP"), None);
}

#[test]
fn initializers_are_converted_to_the_declared_type() {
    let resolver = resolver();
    let file = resolver
        .parse(
            "class C {
                static final byte B = 10;
                static final double D = 1;
                static final char CH = 'a' + 1;
                static final byte CAST = (byte) 300;
            }",
        )
        .unwrap();
    assert_eq!(field_constant(&resolver, &file, "B"), Some(ConstantValue::Byte(10)));
    assert_eq!(field_constant(&resolver, &file, "D"), Some(ConstantValue::Double(1.0)));
    assert_eq!(field_constant(&resolver, &file, "CH"), Some(ConstantValue::Char('b' as u16)));
    assert_eq!(field_constant(&resolver, &file, "CAST"), Some(ConstantValue::Byte(44)));
}

#[test]
fn evaluation_failures_are_absent() {
    let resolver = resolver();
    let file = resolver
        .parse(
            "class C {
                static final int DIV = 1 / 0;
                static final String CALL = String.valueOf(1);
                static final Object BOXED = 1;
                static final int[] ARRAY = {1};
            }",
        )
        .unwrap();
    for name in ["DIV", "CALL", "BOXED", "ARRAY"] {
        assert_eq!(field_constant(&resolver, &file, name), None, "{name}");
    }
}

#[test]
fn interface_fields_are_implicitly_constant() {
    let resolver = resolver();
    let file = resolver.parse("interface I { int SIZE = 4 << 2; }").unwrap();
    assert_eq!(field_constant(&resolver, &file, "SIZE"), Some(ConstantValue::Int(16)));
}

#[test]
fn expressions_fold_through_other_providers() {
    let resolver = resolver();
    let file = resolver
        .parse(
            "class C {
                static final int X = 1;
                int a = Integer.MAX_VALUE - X;
                long b = java.lang.Long.MIN_VALUE;
                boolean c = X > 0 && !false;
                int d = unknown + 1;
            }",
        )
        .unwrap();
    assert_eq!(
        resolver.constant_value(&file, initializer(&file, "a")),
        Some(ConstantValue::Int(i32::MAX - 1))
    );
    assert_eq!(
        resolver.constant_value(&file, initializer(&file, "b")),
        Some(ConstantValue::Long(i64::MIN))
    );
    assert_eq!(
        resolver.constant_value(&file, initializer(&file, "c")),
        Some(ConstantValue::Boolean(true))
    );
    assert_eq!(resolver.constant_value(&file, initializer(&file, "d")), None);
}
