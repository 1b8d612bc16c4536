use std::sync::Arc;

use javelin_bytecode::ClassDirTypeSolver;
use javelin_resolve::{SourceRef, SymbolResolver};
use javelin_syntax::NodeKind;
use javelin_test_utils::classfile_builder::{ACC_PUBLIC, ACC_VARARGS};
use javelin_test_utils::{jdk_solver, jdk_solver_with, temp_dir, write_class_dir, ClassFileBuilder, MethodSpec};
use javelin_types::{
    AnnotationMemberDecl, ConstructorDecl, DeclKind, Declaration, EnumConstantDecl, FieldDecl,
    MethodDecl, MethodLikeDecl, ReferenceTypeDecl, ResolvedDeclaration, TypeDeclRef, TypeSolver,
};
use pretty_assertions::assert_eq;

fn resolver() -> SymbolResolver {
    SymbolResolver::new(Arc::new(jdk_solver()))
}

fn top_level(resolver: &SymbolResolver, file: &SourceRef, name: &str) -> TypeDeclRef {
    let node = file.tree().type_by_name(name).unwrap();
    resolver.type_declaration(file, node).unwrap().to_ref()
}

#[test]
fn every_declarator_is_a_distinct_field_of_its_type() {
    let resolver = resolver();
    let file = resolver
        .parse("package p; class A { int x, y[]; String s; }")
        .unwrap();
    let a = top_level(&resolver, &file, "A");
    let fields = a.declared_fields();
    assert_eq!(
        fields.iter().map(|f| f.name()).collect::<Vec<_>>(),
        ["x", "y", "s"]
    );
    assert_ne!(fields[0].origin(), fields[1].origin());
    assert_eq!(fields[1].ty(resolver.solver()).unwrap().describe(), "int[]");

    for field in &fields {
        let owner = field.declaring_type();
        assert_eq!(owner.qualified_name(), "p.A");
        assert!(owner
            .declared_fields()
            .iter()
            .any(|f| f.origin() == field.origin()));
    }
}

#[test]
fn member_types_resolve_in_the_declaration_scope() {
    let resolver = resolver();
    let file = resolver
        .parse(
            "package p;
             import java.util.List;
             class Outer<T> {
                 class Inner { List<T> items; }
             }",
        )
        .unwrap();
    let outer = top_level(&resolver, &file, "Outer");
    let inner = outer.member_type("Inner", resolver.solver()).unwrap().unwrap();
    assert_eq!(inner.qualified_name(), "p.Outer.Inner");
    assert_eq!(
        inner.containing_type(resolver.solver()).unwrap().unwrap().qualified_name(),
        "p.Outer"
    );
    let items = inner.declared_fields().remove(0);
    assert_eq!(items.ty(resolver.solver()).unwrap().describe(), "java.util.List<T>");
}

#[test]
fn source_and_bytecode_descriptors_agree() {
    let dir = temp_dir();
    write_class_dir(
        dir.path(),
        &[ClassFileBuilder::new("q/Lib").method(
            MethodSpec::new("m", "(ILjava/util/List;[Ljava/lang/String;)Ljava/lang/Object;")
                .signature("<T:Ljava/lang/Object;>(ILjava/util/List<TT;>;[Ljava/lang/String;)TT;")
                .access(ACC_PUBLIC | ACC_VARARGS),
        )],
    );
    let solver = jdk_solver_with(vec![Arc::new(ClassDirTypeSolver::new(dir.path(), true)) as Arc<dyn TypeSolver>]);
    let resolver = SymbolResolver::new(Arc::new(solver));
    let file = resolver
        .parse("package p; import java.util.List; class A { <T> T m(int a, List<T> b, String... c) { return null; } }")
        .unwrap();

    let source = top_level(&resolver, &file, "A").declared_methods().remove(0);
    let compiled = resolver
        .solver()
        .solve_type("q.Lib")
        .unwrap()
        .declared_methods()
        .into_iter()
        .find(|m| m.name() == "m")
        .unwrap();
    let expected = "(ILjava/util/List;[Ljava/lang/String;)Ljava/lang/Object;";
    assert_eq!(source.method_descriptor(resolver.solver()).unwrap(), expected);
    assert_eq!(compiled.method_descriptor(resolver.solver()).unwrap(), expected);
    assert!(source.is_variadic());
    assert!(compiled.is_variadic());
}

#[test]
fn constructors_default_when_none_is_declared() {
    let resolver = resolver();
    let file = resolver
        .parse("class A {} class B { B(int x) throws Exception {} }")
        .unwrap();
    let a = top_level(&resolver, &file, "A").constructors();
    assert_eq!(a.len(), 1);
    assert_eq!(a[0].param_count(), 0);
    assert_eq!(a[0].method_descriptor(resolver.solver()).unwrap(), "()V");

    let b = top_level(&resolver, &file, "B").constructors();
    assert_eq!(b.len(), 1);
    assert_eq!(b[0].signature(resolver.solver()).unwrap(), "B(int)");
    assert_eq!(
        b[0].thrown_types(resolver.solver()).unwrap()[0].describe(),
        "java.lang.Exception"
    );
}

#[test]
fn enum_constants_have_their_enum_type() {
    let resolver = resolver();
    let file = resolver
        .parse("package p; enum Color { RED, GREEN { }; int shade; }")
        .unwrap();
    let color = top_level(&resolver, &file, "Color");
    let constants = color.enum_constants();
    assert_eq!(constants.len(), 2);
    assert_eq!(constants[0].ty(resolver.solver()).unwrap().describe(), "p.Color");
    assert_eq!(constants[1].declaring_type().qualified_name(), "p.Color");
    assert_eq!(
        color.declared_fields().iter().map(|f| f.name()).collect::<Vec<_>>(),
        ["shade"]
    );
    assert_eq!(
        color.superclass(resolver.solver()).unwrap().unwrap().describe(),
        "java.lang.Enum<p.Color>"
    );
}

#[test]
fn annotation_elements_report_defaults() {
    let resolver = resolver();
    let file = resolver
        .parse("@interface Tag { String value(); int weight() default 1; }")
        .unwrap();
    let tag = top_level(&resolver, &file, "Tag");
    assert_eq!(tag.kind(), DeclKind::Annotation);
    let members = tag.annotation_members();
    assert_eq!(members.len(), 2);
    assert!(!members[0].has_default_value());
    assert!(members[1].has_default_value());
    assert_eq!(members[1].ty(resolver.solver()).unwrap().describe(), "int");

    let method = file.tree().find_all(|k| matches!(k, NodeKind::Method(_)))[0];
    assert!(matches!(
        resolver.resolve_declaration(&file, method).unwrap(),
        ResolvedDeclaration::AnnotationMember(_)
    ));
}

#[test]
fn interface_members_carry_implicit_modifiers() {
    let resolver = resolver();
    let file = resolver
        .parse("interface I { int X = 1; void m(); default void d() {} static void s() {} }")
        .unwrap();
    let i = top_level(&resolver, &file, "I");
    let x = i.declared_fields().remove(0);
    assert!(x.is_static());
    let methods = i.declared_methods();
    assert!(methods[0].is_abstract());
    assert!(!methods[1].is_abstract());
    assert!(methods[1].is_default_method());
    assert!(methods[2].is_static());
}

#[test]
fn cyclic_hierarchies_terminate() {
    let resolver = resolver();
    let file = resolver.parse("class A extends B {} class B extends A {}").unwrap();
    let a = top_level(&resolver, &file, "A");
    // Every ancestor is listed once; the cycle is cut rather than followed.
    let ancestors = a.all_ancestors(resolver.solver()).unwrap();
    assert!(ancestors.iter().any(|t| t.describe() == "B"));
    assert!(ancestors.len() <= 3);
}
