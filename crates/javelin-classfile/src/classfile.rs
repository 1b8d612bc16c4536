use crate::annotation::Annotation;
use crate::constant_pool::{ConstantPool, ConstantPoolValue};
use crate::error::{Error, Result};
use crate::reader::Reader;

const MAGIC: u32 = 0xCAFE_BABE;

#[derive(Debug, Clone)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub access_flags: u16,
    pub this_class: String,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<ClassMember>,
    pub methods: Vec<ClassMember>,
    pub signature: Option<String>,
    pub runtime_visible_annotations: Vec<Annotation>,
    pub runtime_invisible_annotations: Vec<Annotation>,
    pub inner_classes: Vec<InnerClassInfo>,
}

/// A field or method. Attributes that only apply to one of the two stay empty
/// for the other.
#[derive(Debug, Clone)]
pub struct ClassMember {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub constant_value: Option<ConstantPoolValue>,
    pub exceptions: Vec<String>,
    pub parameters: Vec<MethodParameter>,
    /// Set on annotation-type elements that declare a `default`.
    pub has_annotation_default: bool,
    pub runtime_visible_annotations: Vec<Annotation>,
    pub runtime_invisible_annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerClassInfo {
    pub inner_class: String,
    pub outer_class: Option<String>,
    pub inner_name: Option<String>,
    pub access_flags: u16,
}

/// An entry of the `MethodParameters` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodParameter {
    pub name: Option<String>,
    pub access_flags: u16,
}

impl ClassFile {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let magic = reader.read_u4()?;
        if magic != MAGIC {
            return Err(Error::InvalidMagic(magic));
        }

        let minor_version = reader.read_u2()?;
        let major_version = reader.read_u2()?;
        let cp = ConstantPool::parse(&mut reader)?;

        let access_flags = reader.read_u2()?;
        let this_class = cp.get_class_name(reader.read_u2()?)?;
        let super_class = match reader.read_u2()? {
            0 => None,
            idx => Some(cp.get_class_name(idx)?),
        };

        let interfaces_count = reader.read_u2()? as usize;
        let interfaces = (0..interfaces_count)
            .map(|_| cp.get_class_name(reader.read_u2()?))
            .collect::<Result<Vec<_>>>()?;

        let fields = parse_members(&mut reader, &cp)?;
        let methods = parse_members(&mut reader, &cp)?;
        let attrs = parse_attributes(&mut reader, &cp)?;
        reader.ensure_empty("class file")?;

        tracing::trace!(
            target: "javelin.classfile",
            class = %this_class,
            fields = fields.len(),
            methods = methods.len(),
            "parsed class file"
        );

        Ok(Self {
            minor_version,
            major_version,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            signature: attrs.signature,
            runtime_visible_annotations: attrs.runtime_visible_annotations,
            runtime_invisible_annotations: attrs.runtime_invisible_annotations,
            inner_classes: attrs.inner_classes,
        })
    }

    /// Binary name with `.` package separators, e.g. `java.util.Map$Entry`.
    pub fn binary_name(&self) -> String {
        self.this_class.replace('/', ".")
    }
}

fn parse_members(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Vec<ClassMember>> {
    let count = reader.read_u2()? as usize;
    let mut members = Vec::with_capacity(count);
    for _ in 0..count {
        let access_flags = reader.read_u2()?;
        let name = cp.get_utf8(reader.read_u2()?)?.to_string();
        let descriptor = cp.get_utf8(reader.read_u2()?)?.to_string();
        let attrs = parse_attributes(reader, cp)?;
        members.push(ClassMember {
            access_flags,
            name,
            descriptor,
            signature: attrs.signature,
            constant_value: attrs.constant_value,
            exceptions: attrs.exceptions,
            parameters: attrs.parameters,
            has_annotation_default: attrs.has_annotation_default,
            runtime_visible_annotations: attrs.runtime_visible_annotations,
            runtime_invisible_annotations: attrs.runtime_invisible_annotations,
        });
    }
    Ok(members)
}

#[derive(Default)]
struct ParsedAttributes {
    signature: Option<String>,
    constant_value: Option<ConstantPoolValue>,
    exceptions: Vec<String>,
    parameters: Vec<MethodParameter>,
    has_annotation_default: bool,
    runtime_visible_annotations: Vec<Annotation>,
    runtime_invisible_annotations: Vec<Annotation>,
    inner_classes: Vec<InnerClassInfo>,
}

fn parse_attributes(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<ParsedAttributes> {
    let count = reader.read_u2()? as usize;
    let mut parsed = ParsedAttributes::default();
    for _ in 0..count {
        let name = cp.get_utf8(reader.read_u2()?)?;
        let length = reader.read_u4()? as usize;
        let mut sub = Reader::new(reader.read_bytes(length)?);

        match name {
            "Signature" => {
                parsed.signature = Some(cp.get_utf8(sub.read_u2()?)?.to_string());
            }
            "ConstantValue" => {
                parsed.constant_value = Some(cp.get_constant_value(sub.read_u2()?)?);
            }
            "Exceptions" => {
                let n = sub.read_u2()? as usize;
                for _ in 0..n {
                    parsed.exceptions.push(cp.get_class_name(sub.read_u2()?)?);
                }
            }
            "MethodParameters" => {
                let n = sub.read_u1()? as usize;
                for _ in 0..n {
                    let name = match sub.read_u2()? {
                        0 => None,
                        idx => Some(cp.get_utf8(idx)?.to_string()),
                    };
                    let access_flags = sub.read_u2()?;
                    parsed.parameters.push(MethodParameter { name, access_flags });
                }
            }
            // Only the presence of a default matters; the value is not decoded.
            "AnnotationDefault" => {
                parsed.has_annotation_default = true;
                continue;
            }
            "RuntimeVisibleAnnotations" => {
                parsed
                    .runtime_visible_annotations
                    .extend(Annotation::parse_list(&mut sub, cp)?);
            }
            "RuntimeInvisibleAnnotations" => {
                parsed
                    .runtime_invisible_annotations
                    .extend(Annotation::parse_list(&mut sub, cp)?);
            }
            "InnerClasses" => {
                let n = sub.read_u2()? as usize;
                for _ in 0..n {
                    let inner_class = cp.get_class_name(sub.read_u2()?)?;
                    let outer_class = match sub.read_u2()? {
                        0 => None,
                        idx => Some(cp.get_class_name(idx)?),
                    };
                    let inner_name = match sub.read_u2()? {
                        0 => None,
                        idx => Some(cp.get_utf8(idx)?.to_string()),
                    };
                    let access_flags = sub.read_u2()?;
                    parsed.inner_classes.push(InnerClassInfo {
                        inner_class,
                        outer_class,
                        inner_name,
                        access_flags,
                    });
                }
            }
            // Code, LineNumberTable, ... carry nothing the resolver needs.
            _ => continue,
        }
        sub.ensure_empty(attribute_label(name))?;
    }
    Ok(parsed)
}

fn attribute_label(name: &str) -> &'static str {
    match name {
        "Signature" => "Signature",
        "ConstantValue" => "ConstantValue",
        "Exceptions" => "Exceptions",
        "MethodParameters" => "MethodParameters",
        "RuntimeVisibleAnnotations" => "RuntimeVisibleAnnotations",
        "RuntimeInvisibleAnnotations" => "RuntimeInvisibleAnnotations",
        "InnerClasses" => "InnerClasses",
        _ => "attribute",
    }
}
