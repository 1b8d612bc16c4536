use crate::annotation::Annotation;
use crate::classfile::{ClassFile, ClassMember, InnerClassInfo};
use crate::constant_pool::ConstantPoolValue;
use crate::descriptor::{parse_field_descriptor, parse_method_descriptor, FieldType, MethodDescriptor};
use crate::error::Result;
use crate::signature::{
    parse_class_signature, parse_field_signature, parse_method_signature, ClassSignature,
    FieldTypeSignature, MethodSignature,
};

/// A class file with every descriptor and signature already parsed.
#[derive(Debug, Clone)]
pub struct ClassStub {
    pub internal_name: String,
    pub access_flags: u16,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub signature: Option<ClassSignature>,
    pub annotations: Vec<Annotation>,
    pub inner_classes: Vec<InnerClassInfo>,
    pub fields: Vec<FieldStub>,
    pub methods: Vec<MethodStub>,
}

#[derive(Debug, Clone)]
pub struct FieldStub {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub parsed_descriptor: FieldType,
    pub signature: Option<FieldTypeSignature>,
    pub constant_value: Option<ConstantPoolValue>,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone)]
pub struct MethodStub {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub parsed_descriptor: MethodDescriptor,
    pub signature: Option<MethodSignature>,
    /// Internal names from the `Exceptions` attribute.
    pub exceptions: Vec<String>,
    /// Names from `MethodParameters`; empty when the attribute is absent.
    pub parameter_names: Vec<Option<String>>,
    pub has_default_value: bool,
    pub annotations: Vec<Annotation>,
}

impl ClassStub {
    pub fn from_classfile(class: &ClassFile) -> Result<Self> {
        let signature = class
            .signature
            .as_deref()
            .map(parse_class_signature)
            .transpose()?;

        let fields = class
            .fields
            .iter()
            .map(|f| {
                Ok(FieldStub {
                    access_flags: f.access_flags,
                    name: f.name.clone(),
                    descriptor: f.descriptor.clone(),
                    parsed_descriptor: parse_field_descriptor(&f.descriptor)?,
                    signature: f.signature.as_deref().map(parse_field_signature).transpose()?,
                    constant_value: f.constant_value.clone(),
                    annotations: member_annotations(f),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let methods = class
            .methods
            .iter()
            .map(|m| {
                Ok(MethodStub {
                    access_flags: m.access_flags,
                    name: m.name.clone(),
                    descriptor: m.descriptor.clone(),
                    parsed_descriptor: parse_method_descriptor(&m.descriptor)?,
                    signature: m.signature.as_deref().map(parse_method_signature).transpose()?,
                    exceptions: m.exceptions.clone(),
                    parameter_names: m.parameters.iter().map(|p| p.name.clone()).collect(),
                    has_default_value: m.has_annotation_default,
                    annotations: member_annotations(m),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut annotations = class.runtime_visible_annotations.clone();
        annotations.extend(class.runtime_invisible_annotations.iter().cloned());

        Ok(ClassStub {
            internal_name: class.this_class.clone(),
            access_flags: class.access_flags,
            super_class: class.super_class.clone(),
            interfaces: class.interfaces.clone(),
            signature,
            annotations,
            inner_classes: class.inner_classes.clone(),
            fields,
            methods,
        })
    }

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        ClassStub::from_classfile(&ClassFile::parse(bytes)?)
    }

    /// The `InnerClasses` entry describing this class itself, if it is nested.
    pub fn own_inner_class_entry(&self) -> Option<&InnerClassInfo> {
        self.inner_classes
            .iter()
            .find(|ic| ic.inner_class == self.internal_name)
    }
}

fn member_annotations(member: &ClassMember) -> Vec<Annotation> {
    let mut annotations = member.runtime_visible_annotations.clone();
    annotations.extend(member.runtime_invisible_annotations.iter().cloned());
    annotations
}

impl ClassFile {
    pub fn stub(&self) -> Result<ClassStub> {
        ClassStub::from_classfile(self)
    }
}
