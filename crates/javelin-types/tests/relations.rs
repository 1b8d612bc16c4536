use javelin_core::ModifierSet;
use javelin_types::relations::{
    all_ancestors, erasure, glb, instantiate_as_supertype, is_assignable_by,
    is_assignable_by_constant, is_subtype, lub, subtype, type_equals,
};
use javelin_types::{
    Answer, ConstantValue, Declaration, FieldDecl, MemoryTypeSolver, MethodDecl, MethodLikeDecl,
    PrimitiveType, ReferenceTypeDecl, ResolvedType, StubTypeDecl, Substitution, TypeSolver,
    Wildcard,
};
use pretty_assertions::assert_eq;

fn jdk() -> MemoryTypeSolver {
    let solver = MemoryTypeSolver::new();
    let decls = [
        StubTypeDecl::class("java.lang.Object")
            .method("hashCode", &[], "int")
            .method("toString", &[], "java.lang.String"),
        StubTypeDecl::interface("java.io.Serializable"),
        StubTypeDecl::interface("java.lang.Cloneable"),
        StubTypeDecl::interface("java.lang.CharSequence").method("length", &[], "int"),
        StubTypeDecl::interface("java.lang.Comparable")
            .type_param("T", &[])
            .method("compareTo", &["T"], "int"),
        StubTypeDecl::class("java.lang.Number")
            .modifiers(ModifierSet::PUBLIC | ModifierSet::ABSTRACT)
            .implements("java.io.Serializable"),
        StubTypeDecl::class("java.lang.Integer")
            .extends("java.lang.Number")
            .implements("java.lang.Comparable<java.lang.Integer>"),
        StubTypeDecl::class("java.lang.Long")
            .extends("java.lang.Number")
            .implements("java.lang.Comparable<java.lang.Long>"),
        StubTypeDecl::class("java.lang.Byte")
            .extends("java.lang.Number")
            .implements("java.lang.Comparable<java.lang.Byte>"),
        StubTypeDecl::class("java.lang.String")
            .implements("java.io.Serializable")
            .implements("java.lang.Comparable<java.lang.String>")
            .implements("java.lang.CharSequence"),
        StubTypeDecl::interface("java.util.Collection")
            .type_param("E", &[])
            .method("size", &[], "int")
            .method("add", &["E"], "boolean"),
        StubTypeDecl::interface("java.util.List")
            .type_param("E", &[])
            .extends("java.util.Collection<E>")
            .method("get", &["int"], "E")
            .method("size", &[], "int"),
        StubTypeDecl::class("java.util.ArrayList")
            .type_param("E", &[])
            .implements("java.util.List<E>")
            .method("size", &[], "int")
            .constructor(&[]),
        StubTypeDecl::class("p.Sorted")
            .type_param("T", &["java.lang.Comparable<T>"])
            .field("first", "T"),
    ];
    for decl in decls {
        solver.add(decl.build().unwrap());
    }
    solver
}

fn raw(solver: &dyn TypeSolver, name: &str) -> ResolvedType {
    ResolvedType::raw(solver.solve_type(name).unwrap())
}

fn generic(solver: &dyn TypeSolver, name: &str, args: Vec<ResolvedType>) -> ResolvedType {
    ResolvedType::reference(solver.solve_type(name).unwrap(), args)
}

fn extends(bound: ResolvedType) -> ResolvedType {
    ResolvedType::Wildcard(Wildcard::Extends(Box::new(bound)))
}

fn super_(bound: ResolvedType) -> ResolvedType {
    ResolvedType::Wildcard(Wildcard::Super(Box::new(bound)))
}

#[test]
fn primitive_widening_follows_the_language_table() {
    let s = jdk();
    let p = ResolvedType::Primitive;
    assert!(is_subtype(&s, &p(PrimitiveType::Byte), &p(PrimitiveType::Short)));
    assert!(is_subtype(&s, &p(PrimitiveType::Char), &p(PrimitiveType::Int)));
    assert!(is_subtype(&s, &p(PrimitiveType::Long), &p(PrimitiveType::Float)));
    assert!(!is_subtype(&s, &p(PrimitiveType::Char), &p(PrimitiveType::Short)));
    assert!(!is_subtype(&s, &p(PrimitiveType::Int), &p(PrimitiveType::Byte)));
    assert!(!is_subtype(&s, &p(PrimitiveType::Boolean), &p(PrimitiveType::Int)));
}

#[test]
fn null_and_void() {
    let s = jdk();
    let string = raw(&s, "java.lang.String");
    assert!(is_subtype(&s, &ResolvedType::Null, &string));
    assert!(is_subtype(&s, &ResolvedType::Null, &ResolvedType::Null));
    assert!(!is_subtype(&s, &string, &ResolvedType::Null));
    assert!(is_subtype(&s, &ResolvedType::Void, &ResolvedType::Void));
    assert!(!is_subtype(&s, &ResolvedType::Void, &raw(&s, "java.lang.Object")));
    assert!(!is_subtype(&s, &ResolvedType::Null, &ResolvedType::Void));
}

#[test]
fn arrays_are_covariant_for_references_only() {
    let s = jdk();
    let arr = |t: ResolvedType| ResolvedType::array(t).unwrap();
    let strings = arr(raw(&s, "java.lang.String"));
    let objects = arr(raw(&s, "java.lang.Object"));
    let ints = arr(ResolvedType::Primitive(PrimitiveType::Int));
    let longs = arr(ResolvedType::Primitive(PrimitiveType::Long));

    assert!(is_subtype(&s, &strings, &objects));
    assert!(!is_subtype(&s, &objects, &strings));
    assert!(!is_subtype(&s, &ints, &longs));
    assert!(is_subtype(&s, &ints, &raw(&s, "java.lang.Object")));
    assert!(is_subtype(&s, &ints, &raw(&s, "java.lang.Cloneable")));
    assert!(is_subtype(&s, &strings, &raw(&s, "java.io.Serializable")));
    assert!(!is_subtype(&s, &ints, &raw(&s, "java.lang.Comparable")));
}

#[test]
fn array_of_void_is_rejected() {
    assert!(ResolvedType::array(ResolvedType::Void).is_err());
}

#[test]
fn generic_subtyping_substitutes_along_the_supertype_chain() {
    let s = jdk();
    let string = raw(&s, "java.lang.String");
    let integer = raw(&s, "java.lang.Integer");
    let array_list = generic(&s, "java.util.ArrayList", vec![string.clone()]);

    assert!(is_subtype(&s, &array_list, &generic(&s, "java.util.List", vec![string.clone()])));
    assert!(is_subtype(&s, &array_list, &generic(&s, "java.util.Collection", vec![string.clone()])));
    assert!(!is_subtype(&s, &array_list, &generic(&s, "java.util.List", vec![integer.clone()])));
    assert!(is_subtype(&s, &array_list, &raw(&s, "java.util.List")));
}

#[test]
fn wildcard_containment() {
    let s = jdk();
    let integer = raw(&s, "java.lang.Integer");
    let number = raw(&s, "java.lang.Number");
    let list = |arg| generic(&s, "java.util.List", vec![arg]);

    let ints = list(integer.clone());
    assert!(is_subtype(&s, &ints, &list(extends(number.clone()))));
    assert!(is_subtype(&s, &ints, &list(ResolvedType::Wildcard(Wildcard::Unbounded))));
    assert!(!is_subtype(&s, &ints, &list(number.clone())));
    assert!(is_subtype(&s, &list(number.clone()), &list(super_(integer.clone()))));
    assert!(!is_subtype(&s, &list(integer.clone()), &list(super_(number.clone()))));
    assert!(is_subtype(
        &s,
        &list(extends(integer.clone())),
        &list(extends(number.clone()))
    ));
    assert!(is_subtype(
        &s,
        &generic(&s, "java.util.ArrayList", vec![integer]),
        &generic(&s, "java.util.Collection", vec![extends(raw(&s, "java.io.Serializable"))])
    ));
}

#[test]
fn subtyping_is_reflexive_and_transitive() {
    let s = jdk();
    let string = raw(&s, "java.lang.String");
    let corpus = vec![
        ResolvedType::Primitive(PrimitiveType::Byte),
        ResolvedType::Primitive(PrimitiveType::Int),
        ResolvedType::Primitive(PrimitiveType::Double),
        raw(&s, "java.lang.Object"),
        raw(&s, "java.lang.Integer"),
        raw(&s, "java.lang.Number"),
        raw(&s, "java.io.Serializable"),
        string.clone(),
        generic(&s, "java.lang.Comparable", vec![string.clone()]),
        generic(&s, "java.util.ArrayList", vec![string.clone()]),
        generic(&s, "java.util.List", vec![string.clone()]),
        generic(&s, "java.util.Collection", vec![string.clone()]),
        generic(&s, "java.util.Collection", vec![extends(raw(&s, "java.lang.Object"))]),
        ResolvedType::array(string.clone()).unwrap(),
        ResolvedType::array(raw(&s, "java.lang.Object")).unwrap(),
        ResolvedType::Null,
    ];
    for a in &corpus {
        assert!(is_subtype(&s, a, a), "{a} is not a subtype of itself");
        for b in &corpus {
            if !is_subtype(&s, a, b) {
                continue;
            }
            for c in &corpus {
                if is_subtype(&s, b, c) {
                    assert!(is_subtype(&s, a, c), "{a} <: {b} <: {c} but not {a} <: {c}");
                }
            }
        }
    }
}

#[test]
fn unresolved_ancestors_make_the_answer_unknown() {
    let s = jdk();
    s.add(
        StubTypeDecl::class("p.Orphan")
            .extends("p.Missing")
            .build()
            .unwrap(),
    );
    let orphan = raw(&s, "p.Orphan");
    assert_eq!(subtype(&s, &orphan, &raw(&s, "java.util.List")), Answer::Unknown);
    // Object is a supertype of every reference type whatever the hierarchy.
    assert_eq!(subtype(&s, &orphan, &raw(&s, "java.lang.Object")), Answer::Yes);
    assert_eq!(
        subtype(&s, &ResolvedType::Primitive(PrimitiveType::Int), &orphan),
        Answer::No
    );
}

#[test]
fn assignability_adds_boxing_and_unchecked_conversion() {
    let s = jdk();
    let int = ResolvedType::Primitive(PrimitiveType::Int);
    let long = ResolvedType::Primitive(PrimitiveType::Long);
    let integer = raw(&s, "java.lang.Integer");

    assert!(is_assignable_by(&s, &int, &integer).is_yes());
    assert!(is_assignable_by(&s, &long, &integer).is_yes());
    assert!(is_assignable_by(&s, &raw(&s, "java.lang.Object"), &int).is_yes());
    assert!(is_assignable_by(&s, &raw(&s, "java.lang.Number"), &int).is_yes());
    assert!(!is_assignable_by(&s, &raw(&s, "java.lang.Long"), &int).is_yes());

    let list_of_string = generic(&s, "java.util.List", vec![raw(&s, "java.lang.String")]);
    assert!(is_assignable_by(&s, &list_of_string, &raw(&s, "java.util.ArrayList")).is_yes());
    assert!(is_assignable_by(&s, &raw(&s, "java.util.List"), &list_of_string).is_yes());
}

#[test]
fn constants_narrow_into_small_integral_types() {
    let s = jdk();
    let int = ResolvedType::Primitive(PrimitiveType::Int);
    let byte = ResolvedType::Primitive(PrimitiveType::Byte);
    let char_ = ResolvedType::Primitive(PrimitiveType::Char);

    assert!(!is_assignable_by(&s, &byte, &int).is_yes());
    assert!(is_assignable_by_constant(&s, &byte, &int, &ConstantValue::Int(10)).is_yes());
    assert!(!is_assignable_by_constant(&s, &byte, &int, &ConstantValue::Int(300)).is_yes());
    assert!(is_assignable_by_constant(&s, &char_, &int, &ConstantValue::Int(65)).is_yes());
    assert!(!is_assignable_by_constant(&s, &char_, &int, &ConstantValue::Int(-1)).is_yes());
    assert!(is_assignable_by_constant(&s, &raw(&s, "java.lang.Byte"), &int, &ConstantValue::Int(1))
        .is_yes());
}

#[test]
fn erasure_of_bounded_variables_and_arrays() {
    let s = jdk();
    let sorted = s.solve_type("p.Sorted").unwrap();
    let first = sorted.declared_fields()[0].ty(&s).unwrap();
    assert!(first.is_type_variable());
    assert_eq!(erasure(&s, &first).unwrap().describe(), "java.lang.Comparable");

    let lists = ResolvedType::array(generic(&s, "java.util.List", vec![raw(&s, "java.lang.String")]))
        .unwrap();
    assert_eq!(erasure(&s, &lists).unwrap().describe(), "java.util.List[]");
    assert_eq!(erasure(&s, &lists).unwrap().descriptor().unwrap(), "[Ljava/util/List;");
}

#[test]
fn self_referential_bounds_terminate() {
    let s = jdk();
    let sorted = s.solve_type("p.Sorted").unwrap();
    let t = ResolvedType::TypeVariable(sorted.type_parameters()[0].clone());
    let comparable_t = generic(&s, "java.lang.Comparable", vec![t.clone()]);
    assert!(is_subtype(&s, &t, &comparable_t));
    assert!(is_subtype(&s, &t, &raw(&s, "java.lang.Object")));
    assert!(!is_subtype(&s, &t, &raw(&s, "java.lang.String")));
}

#[test]
fn ancestors_are_breadth_first_and_substituted() {
    let s = jdk();
    let array_list = generic(&s, "java.util.ArrayList", vec![raw(&s, "java.lang.String")]);
    let names: Vec<String> = all_ancestors(&s, &array_list)
        .unwrap()
        .iter()
        .map(ResolvedType::describe)
        .collect();
    assert_eq!(
        names,
        vec![
            "java.lang.Object",
            "java.util.List<java.lang.String>",
            "java.util.Collection<java.lang.String>",
        ]
    );

    let list = raw(&s, "java.util.List");
    let names: Vec<String> = all_ancestors(&s, &list)
        .unwrap()
        .iter()
        .map(ResolvedType::describe)
        .collect();
    assert_eq!(names, vec!["java.util.Collection", "java.lang.Object"]);
}

#[test]
fn instantiate_views_a_type_as_its_supertype() {
    let s = jdk();
    let collection = s.solve_type("java.util.Collection").unwrap();
    let array_list = generic(&s, "java.util.ArrayList", vec![raw(&s, "java.lang.Integer")]);
    let viewed = instantiate_as_supertype(&s, &array_list, collection.as_ref())
        .unwrap()
        .unwrap();
    assert_eq!(viewed.describe(), "java.util.Collection<java.lang.Integer>");

    let string = s.solve_type("java.lang.String").unwrap();
    assert!(instantiate_as_supertype(&s, &array_list, string.as_ref())
        .unwrap()
        .is_none());
}

#[test]
fn lub_combines_minimal_shared_supertypes() {
    let s = jdk();
    let string = raw(&s, "java.lang.String");
    let array_list = generic(&s, "java.util.ArrayList", vec![string.clone()]);
    let list = generic(&s, "java.util.List", vec![string.clone()]);

    assert!(type_equals(&lub(&s, &[array_list.clone(), list.clone()]).unwrap(), &list));
    assert!(type_equals(
        &lub(&s, &[string.clone(), ResolvedType::Null]).unwrap(),
        &string
    ));
    assert!(type_equals(
        &lub(&s, &[ResolvedType::Primitive(PrimitiveType::Int), raw(&s, "java.lang.Integer")])
            .unwrap(),
        &raw(&s, "java.lang.Integer")
    ));

    let numbers = lub(&s, &[raw(&s, "java.lang.Integer"), raw(&s, "java.lang.Long")]).unwrap();
    assert_eq!(
        numbers.describe(),
        "java.lang.Number & java.lang.Comparable<? extends java.lang.Number & java.lang.Comparable<?>>"
    );
    assert!(lub(&s, &[]).is_err());
}

#[test]
fn glb_drops_redundant_supertypes() {
    let s = jdk();
    let string = raw(&s, "java.lang.String");
    let array_list = generic(&s, "java.util.ArrayList", vec![string.clone()]);
    let list = generic(&s, "java.util.List", vec![string.clone()]);
    let glb_type = glb(&s, &[list, array_list.clone()]).unwrap();
    assert!(type_equals(&glb_type, &array_list));

    let both = glb(&s, &[raw(&s, "java.io.Serializable"), raw(&s, "java.lang.CharSequence")]).unwrap();
    assert_eq!(both.describe(), "java.io.Serializable & java.lang.CharSequence");
}

#[test]
fn substitution_is_idempotent_when_its_range_is_closed() {
    let s = jdk();
    let list = s.solve_type("java.util.List").unwrap();
    let e = list.type_parameters()[0].clone();
    let list_of_e = list.self_type();

    let sigma = Substitution::from_pairs([e.clone()], [raw(&s, "java.lang.String")]);
    assert!(sigma.is_idempotent());
    let once = list_of_e.substitute(&sigma);
    assert_eq!(once.substitute(&sigma), once);
    assert_eq!(once.describe(), "java.util.List<java.lang.String>");

    let looping = Substitution::from_pairs([e.clone()], [list_of_e.clone()]);
    assert!(!looping.is_idempotent());
}

#[test]
fn inherited_methods_are_hidden_by_overrides() {
    let s = jdk();
    let array_list = s.solve_type("java.util.ArrayList").unwrap();
    let methods = array_list.all_methods(&s).unwrap();
    let sizes: Vec<_> = methods.iter().filter(|m| m.name() == "size").collect();
    assert_eq!(sizes.len(), 1);
    assert!(sizes[0].declaring_type().same_declaration(array_list.as_ref()));
    assert!(methods.iter().any(|m| m.name() == "get"));
    assert!(methods.iter().any(|m| m.name() == "hashCode"));

    let add = methods.iter().find(|m| m.name() == "add").unwrap();
    assert_eq!(add.method_descriptor(&s).unwrap(), "(Ljava/lang/Object;)Z");
}
