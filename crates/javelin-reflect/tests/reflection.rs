use std::sync::Arc;

use javelin_core::access_flags::{ACC_PUBLIC, ACC_STATIC};
use javelin_core::ModifierSet;
use javelin_reflect::{
    BootstrapRuntime, HostClassBuilder, HostRuntime, MethodBuilder, ReflectionEnumConstant, ReflectionMethod,
    ReflectionTypeDecl, ReflectionTypeSolver,
};
use javelin_types::relations::is_subtype;
use javelin_types::{
    AnnotationMemberDecl, ConstantValue, DeclError, DeclKind, Declaration, EnumConstantDecl,
    FieldDecl, MethodDecl, MethodLikeDecl, ParameterDecl, ReferenceTypeDecl, ResolvedType,
    TypeParameterDecl, TypeSolver,
};
use pretty_assertions::assert_eq;

fn runtime_with_app_classes() -> BootstrapRuntime {
    BootstrapRuntime::new()
        .with(
            HostClassBuilder::enumeration("app.Color")
                .enum_constant("RED")
                .enum_constant("GREEN")
                .field("hex", "java.lang.String", ACC_PUBLIC)
                .static_method("values", "app.Color[]", &[])
                .build()
                .unwrap(),
        )
        .with(
            HostClassBuilder::class("app.Box")
                .type_param("T", &["java.lang.Number"])
                .member_class("app.Box$Lid")
                .method(
                    MethodBuilder::new("put", "void", &["T"])
                        .param_names(&["value"])
                        .throws("java.lang.IllegalStateException"),
                )
                .method(MethodBuilder::new("get", "java.lang.Object", &[]).bridge())
                .build()
                .unwrap(),
        )
        .with(
            HostClassBuilder::class("app.Box$Lid")
                .modifiers(ACC_PUBLIC)
                .declared_in("app.Box")
                .simple_method("contents", "T", &[])
                .build()
                .unwrap(),
        )
}

fn solver() -> ReflectionTypeSolver {
    ReflectionTypeSolver::new(Arc::new(runtime_with_app_classes()), true)
}

#[test]
fn bootstrap_has_the_core_types() {
    let solver = ReflectionTypeSolver::bootstrap();
    for name in [
        "java.lang.Object",
        "java.lang.String",
        "java.lang.Enum",
        "java.lang.Record",
        "java.lang.annotation.Annotation",
        "java.util.ArrayList",
        "java.io.PrintStream",
    ] {
        assert!(solver.has_type(name), "{name}");
    }
    let object = solver.solve_type("java.lang.Object").unwrap();
    assert!(object.superclass(&solver).unwrap().is_none());
    assert!(object.is_java_lang_object());
}

#[test]
fn classification_follows_the_host() {
    let solver = solver();
    assert_eq!(solver.solve_type("java.lang.String").unwrap().kind(), DeclKind::Class);
    assert_eq!(solver.solve_type("java.util.List").unwrap().kind(), DeclKind::Interface);
    assert_eq!(solver.solve_type("app.Color").unwrap().kind(), DeclKind::Enum);
    assert_eq!(solver.solve_type("java.lang.Override").unwrap().kind(), DeclKind::Annotation);
}

#[test]
fn lookups_are_stable_by_identity() {
    let solver = solver();
    let first = solver.solve_type("java.util.Map.Entry").unwrap();
    let second = solver.solve_type("java.util.Map.Entry").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(first.same_declaration(second.as_ref()));
    assert_eq!(first.qualified_name(), "java.util.Map.Entry");
    assert_eq!(first.name(), "Entry");
    assert_eq!(first.package_name(), "java.util");
    assert_eq!(first.class_name(), "Map.Entry");
    assert!(first.is_static());
}

#[test]
fn jre_only_solver_leaves_application_classes_alone() {
    let runtime = Arc::new(runtime_with_app_classes());
    let restricted = ReflectionTypeSolver::jre_only(runtime.clone(), true);
    assert!(restricted.try_lookup("app.Color").unwrap().is_none());
    assert!(restricted.try_lookup("java.lang.String").unwrap().is_some());
    let open = ReflectionTypeSolver::new(runtime, true);
    assert!(open.try_lookup("app.Color").unwrap().is_some());
}

#[test]
fn bridge_methods_never_become_declarations() {
    let solver = solver();
    let string = solver.solve_type("java.lang.String").unwrap();
    let compare: Vec<_> = string
        .declared_methods()
        .into_iter()
        .filter(|m| m.name() == "compareTo")
        .collect();
    assert_eq!(compare.len(), 1);
    assert_eq!(compare[0].method_descriptor(&solver).unwrap(), "(Ljava/lang/String;)I");

    let bridge_index = string_method_index(&solver, "java.lang.String", |m| m.bridge);
    let host = ReflectionTypeDecl::new(host_class(&solver, "java.lang.String"), solver.provider());
    assert!(matches!(
        ReflectionMethod::new(&host, bridge_index),
        Err(DeclError::InvariantViolation(_))
    ));
}

fn host_class(solver: &ReflectionTypeSolver, name: &str) -> Arc<javelin_reflect::HostClass> {
    solver.runtime().class_for_name(name).unwrap()
}

fn string_method_index(
    solver: &ReflectionTypeSolver,
    class: &str,
    pred: impl Fn(&javelin_reflect::HostMethod) -> bool,
) -> usize {
    host_class(solver, class).methods.iter().position(pred).unwrap()
}

#[test]
fn variadic_parameters_and_names() {
    let solver = solver();
    let arrays = solver.solve_type("java.util.Arrays").unwrap();
    let as_list = arrays
        .declared_methods()
        .into_iter()
        .find(|m| m.name() == "asList")
        .unwrap();
    assert!(as_list.is_variadic());
    assert!(as_list.is_static());
    let param = as_list.param(0).unwrap();
    assert!(param.is_variadic());
    assert!(param.has_name());
    assert_eq!(param.name(), "a");
    assert_eq!(param.ty(&solver).unwrap().describe(), "T[]");
    assert_eq!(as_list.return_type(&solver).unwrap().describe(), "java.util.List<T>");

    let string = solver.solve_type("java.lang.String").unwrap();
    let format = string
        .declared_methods()
        .into_iter()
        .find(|m| m.name() == "format")
        .unwrap();
    let names: Vec<String> = format.params().iter().map(|p| p.name().to_string()).collect();
    assert_eq!(names, vec!["arg0", "arg1"]);
    assert!(!format.param(0).unwrap().has_name());
    assert!(!format.param(0).unwrap().is_variadic());
    assert!(format.param(1).unwrap().is_variadic());
    assert!(format.param(2).is_none());
}

#[test]
fn generic_members_bind_to_their_declarations() {
    let solver = solver();
    let boxed = solver.solve_type("app.Box").unwrap();
    let put = boxed
        .declared_methods()
        .into_iter()
        .find(|m| m.name() == "put")
        .unwrap();
    let ty = put.param(0).unwrap().ty(&solver).unwrap();
    let ResolvedType::TypeVariable(tv) = &ty else {
        panic!("expected a type variable, got {ty}");
    };
    assert_eq!(tv.qualified_name(), "app.Box.T");
    assert_eq!(tv.bounds(&solver).unwrap()[0].describe(), "java.lang.Number");
    assert_eq!(put.method_descriptor(&solver).unwrap(), "(Ljava/lang/Number;)V");
    assert_eq!(put.thrown_types(&solver).unwrap()[0].describe(), "java.lang.IllegalStateException");
    assert_eq!(boxed.declared_methods().len(), 1);

    // Type variables of the enclosing class are visible to member classes.
    let lid = solver.solve_type("app.Box.Lid").unwrap();
    assert!(lid.containing_type(&solver).unwrap().unwrap().same_declaration(boxed.as_ref()));
    let contents = lid.declared_methods().pop().unwrap();
    assert_eq!(contents.return_type(&solver).unwrap().describe(), "T");
    assert_eq!(boxed.nested_types(&solver).unwrap().len(), 1);
}

#[test]
fn supertypes_carry_type_arguments() {
    let solver = solver();
    let list = solver.solve_type("java.util.ArrayList").unwrap();
    let ancestors: Vec<String> = list
        .ancestors(&solver)
        .unwrap()
        .iter()
        .map(ResolvedType::describe)
        .collect();
    assert_eq!(
        ancestors,
        vec![
            "java.util.AbstractList<E>",
            "java.util.List<E>",
            "java.lang.Cloneable",
            "java.io.Serializable",
        ]
    );

    let string = ResolvedType::raw(solver.solve_type("java.lang.String").unwrap());
    let comparable = ResolvedType::reference(
        solver.solve_type("java.lang.Comparable").unwrap(),
        vec![string.clone()],
    );
    assert!(is_subtype(&solver, &string, &comparable));
}

#[test]
fn enum_constants_are_checked_at_construction() {
    let solver = solver();
    let color = solver.solve_type("app.Color").unwrap();
    let names: Vec<String> = color.enum_constants().iter().map(|c| c.name().to_string()).collect();
    assert_eq!(names, vec!["RED", "GREEN"]);
    let fields: Vec<String> = color.declared_fields().iter().map(|f| f.name().to_string()).collect();
    assert_eq!(fields, vec!["hex"]);

    let red = color.enum_constants().remove(0);
    assert_eq!(red.ty(&solver).unwrap().describe(), "app.Color");

    let host = ReflectionTypeDecl::new(host_class(&solver, "app.Color"), solver.provider());
    assert!(ReflectionEnumConstant::new(&host, "GREEN").is_ok());
    assert!(matches!(
        ReflectionEnumConstant::new(&host, "hex"),
        Err(DeclError::InvariantViolation(_))
    ));
}

#[test]
fn static_final_constants_are_exposed() {
    let solver = solver();
    let integer = solver.solve_type("java.lang.Integer").unwrap();
    let max = integer.get_field("MAX_VALUE", &solver).unwrap();
    assert_eq!(max.constant_value(), Some(ConstantValue::Int(i32::MAX)));
    assert!(max.modifiers().contains(ModifierSet::STATIC | ModifierSet::FINAL));

    let system = solver.solve_type("java.lang.System").unwrap();
    let out = system.get_field("out", &solver).unwrap();
    assert_eq!(out.constant_value(), None);
    assert_eq!(out.ty(&solver).unwrap().describe(), "java.io.PrintStream");
}

#[test]
fn default_methods_and_annotation_elements() {
    let solver = solver();
    let map = solver.solve_type("java.util.Map").unwrap();
    let get_or_default = map
        .declared_methods()
        .into_iter()
        .find(|m| m.name() == "getOrDefault")
        .unwrap();
    assert!(get_or_default.is_default_method());
    assert!(!get_or_default.is_abstract());
    let get = map.declared_methods().into_iter().find(|m| m.name() == "get").unwrap();
    assert!(get.is_abstract());

    let deprecated = solver.solve_type("java.lang.Deprecated").unwrap();
    let members = deprecated.annotation_members();
    assert_eq!(members.len(), 2);
    assert!(members.iter().all(|m| m.has_default_value()));
    let suppress = solver.solve_type("java.lang.SuppressWarnings").unwrap();
    let value = suppress.annotation_members().remove(0);
    assert!(!value.has_default_value());
    assert_eq!(value.ty(&solver).unwrap().describe(), "java.lang.String[]");

    let runnable = solver.solve_type("java.lang.Runnable").unwrap();
    assert_eq!(runnable.annotations()[0].name, "java.lang.FunctionalInterface");
}

#[test]
fn static_helper_flags_survive() {
    let class = HostClassBuilder::class("p.Util")
        .method(MethodBuilder::new("twice", "int", &["int"]).modifiers(ACC_PUBLIC | ACC_STATIC))
        .build()
        .unwrap();
    let solver = ReflectionTypeSolver::new(Arc::new(BootstrapRuntime::empty().with(class)), false);
    let util = solver.solve_type("p.Util").unwrap();
    let twice = util.declared_methods().remove(0);
    assert!(twice.is_static());
    assert_eq!(twice.signature(&solver).unwrap(), "twice(int)");
}
