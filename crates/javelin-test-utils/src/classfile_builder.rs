//! A minimal class-file writer so bytecode tests don't need `javac`.
//!
//! Only the attributes the reader understands are emitted; method bodies are
//! never written (every method is stub-only, as in an `abstract`/`native`
//! declaration).

use std::collections::HashMap;

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_PRIVATE: u16 = 0x0002;
pub const ACC_PROTECTED: u16 = 0x0004;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;
pub const ACC_SUPER: u16 = 0x0020;
pub const ACC_BRIDGE: u16 = 0x0040;
pub const ACC_VARARGS: u16 = 0x0080;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;
pub const ACC_SYNTHETIC: u16 = 0x1000;
pub const ACC_ANNOTATION: u16 = 0x2000;
pub const ACC_ENUM: u16 = 0x4000;

/// A `ConstantValue` payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    descriptor: String,
    access: u16,
    signature: Option<String>,
    constant: Option<Constant>,
}

impl FieldSpec {
    pub fn new(name: &str, descriptor: &str) -> Self {
        Self {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            access: ACC_PUBLIC,
            signature: None,
            constant: None,
        }
    }

    pub fn access(mut self, access: u16) -> Self {
        self.access = access;
        self
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_string());
        self
    }

    pub fn constant(mut self, value: Constant) -> Self {
        self.constant = Some(value);
        self
    }
}

#[derive(Debug, Clone)]
pub struct MethodSpec {
    name: String,
    descriptor: String,
    access: u16,
    signature: Option<String>,
    exceptions: Vec<String>,
    parameter_names: Vec<String>,
    default_value: Option<Constant>,
}

impl MethodSpec {
    pub fn new(name: &str, descriptor: &str) -> Self {
        Self {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            access: ACC_PUBLIC,
            signature: None,
            exceptions: Vec::new(),
            parameter_names: Vec::new(),
            default_value: None,
        }
    }

    pub fn access(mut self, access: u16) -> Self {
        self.access = access;
        self
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_string());
        self
    }

    pub fn throws(mut self, internal_name: &str) -> Self {
        self.exceptions.push(internal_name.to_string());
        self
    }

    pub fn parameter_names(mut self, names: &[&str]) -> Self {
        self.parameter_names = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Emits an `AnnotationDefault` attribute (annotation-type elements only).
    pub fn default_value(mut self, value: Constant) -> Self {
        self.default_value = Some(value);
        self
    }
}

#[derive(Debug, Clone)]
struct InnerClassSpec {
    inner: String,
    outer: Option<String>,
    simple_name: Option<String>,
    access: u16,
}

/// Builds a class file for `internal_name` (e.g. `p/Outer$Inner`).
#[derive(Debug, Clone)]
pub struct ClassFileBuilder {
    internal_name: String,
    access: u16,
    super_class: Option<String>,
    interfaces: Vec<String>,
    signature: Option<String>,
    annotations: Vec<String>,
    fields: Vec<FieldSpec>,
    methods: Vec<MethodSpec>,
    inner_classes: Vec<InnerClassSpec>,
}

impl ClassFileBuilder {
    pub fn new(internal_name: &str) -> Self {
        Self {
            internal_name: internal_name.to_string(),
            access: ACC_PUBLIC | ACC_SUPER,
            super_class: Some("java/lang/Object".to_string()),
            interfaces: Vec::new(),
            signature: None,
            annotations: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            inner_classes: Vec::new(),
        }
    }

    pub fn internal_name(&self) -> &str {
        &self.internal_name
    }

    pub fn access(mut self, access: u16) -> Self {
        self.access = access;
        self
    }

    pub fn super_class(mut self, internal_name: Option<&str>) -> Self {
        self.super_class = internal_name.map(str::to_string);
        self
    }

    pub fn interface(mut self, internal_name: &str) -> Self {
        self.interfaces.push(internal_name.to_string());
        self
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_string());
        self
    }

    /// Adds a marker annotation (no elements) by descriptor, e.g. `Ljava/lang/Deprecated;`.
    pub fn annotation(mut self, descriptor: &str) -> Self {
        self.annotations.push(descriptor.to_string());
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodSpec) -> Self {
        self.methods.push(method);
        self
    }

    pub fn inner_class(
        mut self,
        inner: &str,
        outer: Option<&str>,
        simple_name: Option<&str>,
        access: u16,
    ) -> Self {
        self.inner_classes.push(InnerClassSpec {
            inner: inner.to_string(),
            outer: outer.map(str::to_string),
            simple_name: simple_name.map(str::to_string),
            access,
        });
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut cp = PoolWriter::default();
        let mut body = Vec::new();

        put_u2(&mut body, self.access);
        put_u2(&mut body, cp.class(&self.internal_name));
        let super_index = self.super_class.as_deref().map_or(0, |s| cp.class(s));
        put_u2(&mut body, super_index);
        put_u2(&mut body, self.interfaces.len() as u16);
        for iface in &self.interfaces {
            put_u2(&mut body, cp.class(iface));
        }

        put_u2(&mut body, self.fields.len() as u16);
        for field in &self.fields {
            put_u2(&mut body, field.access);
            put_u2(&mut body, cp.utf8(&field.name));
            put_u2(&mut body, cp.utf8(&field.descriptor));
            let mut attrs = Vec::new();
            if let Some(sig) = &field.signature {
                attrs.push(signature_attr(&mut cp, sig));
            }
            if let Some(value) = &field.constant {
                let index = cp.constant(value);
                attrs.push(attr(&mut cp, "ConstantValue", index.to_be_bytes().to_vec()));
            }
            put_attributes(&mut body, attrs);
        }

        put_u2(&mut body, self.methods.len() as u16);
        for method in &self.methods {
            put_u2(&mut body, method.access);
            put_u2(&mut body, cp.utf8(&method.name));
            put_u2(&mut body, cp.utf8(&method.descriptor));
            let mut attrs = Vec::new();
            if let Some(sig) = &method.signature {
                attrs.push(signature_attr(&mut cp, sig));
            }
            if !method.exceptions.is_empty() {
                let mut info = Vec::new();
                put_u2(&mut info, method.exceptions.len() as u16);
                for exc in &method.exceptions {
                    put_u2(&mut info, cp.class(exc));
                }
                attrs.push(attr(&mut cp, "Exceptions", info));
            }
            if !method.parameter_names.is_empty() {
                let mut info = vec![method.parameter_names.len() as u8];
                for name in &method.parameter_names {
                    put_u2(&mut info, cp.utf8(name));
                    put_u2(&mut info, 0);
                }
                attrs.push(attr(&mut cp, "MethodParameters", info));
            }
            if let Some(value) = &method.default_value {
                let (tag, index) = match value {
                    Constant::Int(_) => (b'I', cp.constant(value)),
                    Constant::Long(_) => (b'J', cp.constant(value)),
                    Constant::Float(_) => (b'F', cp.constant(value)),
                    Constant::Double(_) => (b'D', cp.constant(value)),
                    Constant::String(s) => (b's', cp.utf8(s)),
                };
                let mut info = vec![tag];
                put_u2(&mut info, index);
                attrs.push(attr(&mut cp, "AnnotationDefault", info));
            }
            put_attributes(&mut body, attrs);
        }

        let mut attrs = Vec::new();
        if let Some(sig) = &self.signature {
            attrs.push(signature_attr(&mut cp, sig));
        }
        if !self.annotations.is_empty() {
            let mut info = Vec::new();
            put_u2(&mut info, self.annotations.len() as u16);
            for desc in &self.annotations {
                put_u2(&mut info, cp.utf8(desc));
                put_u2(&mut info, 0);
            }
            attrs.push(attr(&mut cp, "RuntimeVisibleAnnotations", info));
        }
        if !self.inner_classes.is_empty() {
            let mut info = Vec::new();
            put_u2(&mut info, self.inner_classes.len() as u16);
            for ic in &self.inner_classes {
                put_u2(&mut info, cp.class(&ic.inner));
                put_u2(&mut info, ic.outer.as_deref().map_or(0, |o| cp.class(o)));
                put_u2(&mut info, ic.simple_name.as_deref().map_or(0, |n| cp.utf8(n)));
                put_u2(&mut info, ic.access);
            }
            attrs.push(attr(&mut cp, "InnerClasses", info));
        }
        put_attributes(&mut body, attrs);

        let mut out = Vec::with_capacity(body.len() + cp.bytes.len() + 10);
        out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        put_u2(&mut out, 0);
        put_u2(&mut out, 61);
        put_u2(&mut out, cp.next_index);
        out.extend_from_slice(&cp.bytes);
        out.extend_from_slice(&body);
        out
    }
}

struct PoolWriter {
    bytes: Vec<u8>,
    next_index: u16,
    utf8: HashMap<String, u16>,
    classes: HashMap<String, u16>,
}

impl Default for PoolWriter {
    fn default() -> Self {
        Self {
            bytes: Vec::new(),
            next_index: 1,
            utf8: HashMap::new(),
            classes: HashMap::new(),
        }
    }
}

impl PoolWriter {
    fn push(&mut self, entry: &[u8], slots: u16) -> u16 {
        let index = self.next_index;
        self.bytes.extend_from_slice(entry);
        self.next_index += slots;
        index
    }

    fn utf8(&mut self, s: &str) -> u16 {
        if let Some(&index) = self.utf8.get(s) {
            return index;
        }
        // Fixture strings are plain ASCII/BMP text; standard UTF-8 matches the
        // modified encoding for them as long as there is no NUL.
        let mut entry = vec![1];
        put_u2(&mut entry, s.len() as u16);
        entry.extend_from_slice(s.as_bytes());
        let index = self.push(&entry, 1);
        self.utf8.insert(s.to_string(), index);
        index
    }

    fn class(&mut self, internal_name: &str) -> u16 {
        if let Some(&index) = self.classes.get(internal_name) {
            return index;
        }
        let name = self.utf8(internal_name);
        let mut entry = vec![7];
        put_u2(&mut entry, name);
        let index = self.push(&entry, 1);
        self.classes.insert(internal_name.to_string(), index);
        index
    }

    fn constant(&mut self, value: &Constant) -> u16 {
        match value {
            Constant::Int(v) => {
                let mut entry = vec![3];
                entry.extend_from_slice(&v.to_be_bytes());
                self.push(&entry, 1)
            }
            Constant::Float(v) => {
                let mut entry = vec![4];
                entry.extend_from_slice(&v.to_bits().to_be_bytes());
                self.push(&entry, 1)
            }
            Constant::Long(v) => {
                let mut entry = vec![5];
                entry.extend_from_slice(&v.to_be_bytes());
                self.push(&entry, 2)
            }
            Constant::Double(v) => {
                let mut entry = vec![6];
                entry.extend_from_slice(&v.to_bits().to_be_bytes());
                self.push(&entry, 2)
            }
            Constant::String(s) => {
                let utf8 = self.utf8(s);
                let mut entry = vec![8];
                put_u2(&mut entry, utf8);
                self.push(&entry, 1)
            }
        }
    }
}

fn put_u2(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn attr(cp: &mut PoolWriter, name: &str, info: Vec<u8>) -> (u16, Vec<u8>) {
    (cp.utf8(name), info)
}

fn signature_attr(cp: &mut PoolWriter, signature: &str) -> (u16, Vec<u8>) {
    let index = cp.utf8(signature);
    attr(cp, "Signature", index.to_be_bytes().to_vec())
}

fn put_attributes(out: &mut Vec<u8>, attrs: Vec<(u16, Vec<u8>)>) {
    put_u2(out, attrs.len() as u16);
    for (name, info) in attrs {
        put_u2(out, name);
        out.extend_from_slice(&(info.len() as u32).to_be_bytes());
        out.extend_from_slice(&info);
    }
}
