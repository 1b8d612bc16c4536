use javelin_classfile::{
    BaseType, ClassFile, ClassStub, ConstantPoolValue, Error, FieldType, ReturnType,
    TypeSignature,
};
use javelin_test_utils::classfile_builder::*;
use pretty_assertions::assert_eq;

#[test]
fn parses_members_and_attributes() {
    let bytes = ClassFileBuilder::new("p/Box")
        .signature("<T:Ljava/lang/Object;>Ljava/lang/Object;Ljava/lang/Comparable<Lp/Box<TT;>;>;")
        .interface("java/lang/Comparable")
        .annotation("Ljava/lang/Deprecated;")
        .field(
            FieldSpec::new("MAX", "J")
                .access(ACC_PUBLIC | ACC_STATIC | ACC_FINAL)
                .constant(Constant::Long(1 << 40)),
        )
        .field(FieldSpec::new("value", "Ljava/lang/Object;").signature("TT;"))
        .method(
            MethodSpec::new("read", "(I[Ljava/lang/String;)V")
                .access(ACC_PUBLIC | ACC_VARARGS)
                .throws("java/io/IOException")
                .parameter_names(&["count", "names"]),
        )
        .build();

    let class = ClassFile::parse(&bytes).unwrap();
    assert_eq!(class.this_class, "p/Box");
    assert_eq!(class.binary_name(), "p.Box");
    assert_eq!(class.super_class.as_deref(), Some("java/lang/Object"));
    assert_eq!(class.interfaces, vec!["java/lang/Comparable".to_string()]);
    assert_eq!(class.runtime_visible_annotations.len(), 1);
    assert_eq!(
        class.runtime_visible_annotations[0].type_internal_name(),
        Some("java/lang/Deprecated")
    );

    let stub = ClassStub::from_classfile(&class).unwrap();
    let sig = stub.signature.as_ref().unwrap();
    assert_eq!(sig.type_parameters[0].name, "T");

    let max = &stub.fields[0];
    assert_eq!(max.parsed_descriptor, FieldType::Base(BaseType::Long));
    assert_eq!(max.constant_value, Some(ConstantPoolValue::Long(1 << 40)));

    let value = &stub.fields[1];
    assert_eq!(value.signature, Some(TypeSignature::TypeVariable("T".to_string())));
    assert_eq!(value.constant_value, None);

    let read = &stub.methods[0];
    assert_eq!(read.parsed_descriptor.return_type, ReturnType::Void);
    assert_eq!(read.exceptions, vec!["java/io/IOException".to_string()]);
    assert_eq!(
        read.parameter_names,
        vec![Some("count".to_string()), Some("names".to_string())]
    );
}

#[test]
fn string_and_float_constants() {
    let bytes = ClassFileBuilder::new("K")
        .super_class(Some("java/lang/Object"))
        .field(
            FieldSpec::new("NAME", "Ljava/lang/String;")
                .access(ACC_STATIC | ACC_FINAL)
                .constant(Constant::String("javelin".to_string())),
        )
        .field(
            FieldSpec::new("HALF", "F")
                .access(ACC_STATIC | ACC_FINAL)
                .constant(Constant::Float(0.5)),
        )
        .build();
    let stub = ClassStub::parse(&bytes).unwrap();
    assert_eq!(
        stub.fields[0].constant_value,
        Some(ConstantPoolValue::String("javelin".to_string()))
    );
    assert_eq!(stub.fields[1].constant_value, Some(ConstantPoolValue::Float(0.5)));
}

#[test]
fn inner_class_entries() {
    let bytes = ClassFileBuilder::new("p/Outer$Inner")
        .inner_class("p/Outer$Inner", Some("p/Outer"), Some("Inner"), ACC_PUBLIC | ACC_STATIC)
        .build();
    let stub = ClassStub::parse(&bytes).unwrap();
    let own = stub.own_inner_class_entry().unwrap();
    assert_eq!(own.outer_class.as_deref(), Some("p/Outer"));
    assert_eq!(own.inner_name.as_deref(), Some("Inner"));
}

#[test]
fn object_has_no_super_class() {
    let bytes = ClassFileBuilder::new("java/lang/Object").super_class(None).build();
    let class = ClassFile::parse(&bytes).unwrap();
    assert_eq!(class.super_class, None);
}

#[test]
fn malformed_input_is_an_error() {
    assert_eq!(ClassFile::parse(&[0, 1, 2, 3]).unwrap_err(), Error::InvalidMagic(0x0001_0203));

    let bytes = ClassFileBuilder::new("p/A").build();
    let truncated = &bytes[..bytes.len() - 3];
    assert_eq!(ClassFile::parse(truncated).unwrap_err(), Error::UnexpectedEof);

    let mut trailing = bytes.clone();
    trailing.push(0);
    assert!(matches!(
        ClassFile::parse(&trailing),
        Err(Error::TrailingBytes(_))
    ));
}

#[test]
fn bad_descriptor_surfaces_from_stub() {
    let bytes = ClassFileBuilder::new("p/A")
        .field(FieldSpec::new("f", "Q"))
        .build();
    let class = ClassFile::parse(&bytes).unwrap();
    assert_eq!(
        class.stub().unwrap_err(),
        Error::InvalidDescriptor("Q".to_string())
    );
}
