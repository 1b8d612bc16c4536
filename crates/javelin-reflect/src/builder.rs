//! Text-driven construction of [`HostClass`] values.

use javelin_core::access_flags::{ACC_ABSTRACT, ACC_FINAL, ACC_PUBLIC, ACC_STATIC};
use javelin_types::ConstantValue;
use smol_str::SmolStr;

use crate::host::{
    HostClass, HostClassKind, HostField, HostMethod, HostParam, HostType, HostTypeError,
    HostTypeVar,
};

#[derive(Debug, Clone)]
struct TypeVarSpec {
    name: String,
    bounds: Vec<String>,
}

impl TypeVarSpec {
    fn build(&self) -> Result<HostTypeVar, HostTypeError> {
        Ok(HostTypeVar {
            name: self.name.as_str().into(),
            bounds: parse_all(&self.bounds)?,
        })
    }
}

fn parse_all(texts: &[String]) -> Result<Vec<HostType>, HostTypeError> {
    texts.iter().map(|t| HostType::parse(t)).collect()
}

/// A method (or constructor) under construction. Parameter text ending in
/// `...` marks the method variadic.
#[derive(Debug, Clone)]
pub struct MethodBuilder {
    name: String,
    modifiers: u16,
    type_params: Vec<TypeVarSpec>,
    params: Vec<(Option<String>, String)>,
    return_type: String,
    exceptions: Vec<String>,
    synthetic: bool,
    bridge: bool,
    has_default_value: bool,
    annotations: Vec<String>,
}

impl MethodBuilder {
    pub fn new(name: &str, return_type: &str, params: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            modifiers: ACC_PUBLIC,
            type_params: Vec::new(),
            params: params.iter().map(|p| (None, p.to_string())).collect(),
            return_type: return_type.to_string(),
            exceptions: Vec::new(),
            synthetic: false,
            bridge: false,
            has_default_value: false,
            annotations: Vec::new(),
        }
    }

    pub fn constructor(params: &[&str]) -> Self {
        Self::new("<init>", "void", params)
    }

    pub fn modifiers(mut self, modifiers: u16) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn type_param(mut self, name: &str, bounds: &[&str]) -> Self {
        self.type_params.push(TypeVarSpec {
            name: name.to_string(),
            bounds: bounds.iter().map(|b| b.to_string()).collect(),
        });
        self
    }

    /// Names parameters in order; the class was compiled with `-parameters`.
    pub fn param_names(mut self, names: &[&str]) -> Self {
        for (param, name) in self.params.iter_mut().zip(names) {
            param.0 = Some(name.to_string());
        }
        self
    }

    pub fn throws(mut self, ty: &str) -> Self {
        self.exceptions.push(ty.to_string());
        self
    }

    pub fn synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    pub fn bridge(mut self) -> Self {
        self.bridge = true;
        self.synthetic = true;
        self
    }

    pub fn with_default_value(mut self) -> Self {
        self.has_default_value = true;
        self
    }

    pub fn annotation(mut self, name: &str) -> Self {
        self.annotations.push(name.to_string());
        self
    }

    fn build(&self, in_interface: bool) -> Result<HostMethod, HostTypeError> {
        let mut varargs = false;
        let mut params = Vec::with_capacity(self.params.len());
        for (index, (name, text)) in self.params.iter().enumerate() {
            let ty = match text.strip_suffix("...") {
                Some(component) if index + 1 == self.params.len() => {
                    varargs = true;
                    HostType::Array(Box::new(HostType::parse(component)?))
                }
                _ => HostType::parse(text)?,
            };
            params.push(HostParam {
                name: name.as_deref().map(SmolStr::new),
                ty,
            });
        }
        let mut modifiers = self.modifiers;
        if in_interface && modifiers & ACC_STATIC == 0 && !self.has_body() {
            modifiers |= ACC_ABSTRACT;
        }
        Ok(HostMethod {
            name: self.name.as_str().into(),
            modifiers,
            type_params: self
                .type_params
                .iter()
                .map(TypeVarSpec::build)
                .collect::<Result<_, _>>()?,
            params,
            return_type: HostType::parse(&self.return_type)?,
            exceptions: parse_all(&self.exceptions)?,
            varargs,
            synthetic: self.synthetic,
            bridge: self.bridge,
            default_method: in_interface && self.has_body() && modifiers & ACC_STATIC == 0,
            has_default_value: self.has_default_value,
            annotations: self.annotations.iter().map(|a| a.as_str().into()).collect(),
        })
    }

    /// Interface methods marked `final` in the builder stand for `default`
    /// methods; the bit is cleared when built.
    fn has_body(&self) -> bool {
        self.modifiers & ACC_FINAL != 0
    }
}

/// Builds a [`HostClass`]. Every type is written as text; see
/// [`HostType::parse`].
#[derive(Debug, Clone)]
pub struct HostClassBuilder {
    name: String,
    kind: HostClassKind,
    modifiers: u16,
    type_params: Vec<TypeVarSpec>,
    superclass: Option<String>,
    interfaces: Vec<String>,
    declaring_class: Option<String>,
    member_classes: Vec<String>,
    fields: Vec<(String, u16, String, Option<ConstantValue>, bool)>,
    methods: Vec<MethodBuilder>,
    constructors: Vec<MethodBuilder>,
    annotations: Vec<String>,
}

impl HostClassBuilder {
    fn new(name: &str, kind: HostClassKind) -> Self {
        let (modifiers, superclass) = match kind {
            HostClassKind::Class => (ACC_PUBLIC, Some("java.lang.Object".to_string())),
            HostClassKind::Enum => (ACC_PUBLIC | ACC_FINAL, Some(format!("java.lang.Enum<{name}>"))),
            HostClassKind::Interface | HostClassKind::Annotation => (ACC_PUBLIC | ACC_ABSTRACT, None),
        };
        let interfaces = match kind {
            HostClassKind::Annotation => vec!["java.lang.annotation.Annotation".to_string()],
            _ => Vec::new(),
        };
        Self {
            name: name.to_string(),
            kind,
            modifiers,
            type_params: Vec::new(),
            superclass,
            interfaces,
            declaring_class: None,
            member_classes: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn class(name: &str) -> Self {
        Self::new(name, HostClassKind::Class)
    }

    pub fn interface(name: &str) -> Self {
        Self::new(name, HostClassKind::Interface)
    }

    pub fn enumeration(name: &str) -> Self {
        Self::new(name, HostClassKind::Enum)
    }

    pub fn annotation_type(name: &str) -> Self {
        Self::new(name, HostClassKind::Annotation)
    }

    pub fn modifiers(mut self, modifiers: u16) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn type_param(mut self, name: &str, bounds: &[&str]) -> Self {
        self.type_params.push(TypeVarSpec {
            name: name.to_string(),
            bounds: bounds.iter().map(|b| b.to_string()).collect(),
        });
        self
    }

    /// `None` only for `java.lang.Object`.
    pub fn superclass(mut self, ty: Option<&str>) -> Self {
        self.superclass = ty.map(str::to_string);
        self
    }

    pub fn implements(mut self, ty: &str) -> Self {
        self.interfaces.push(ty.to_string());
        self
    }

    pub fn declared_in(mut self, outer: &str) -> Self {
        self.declaring_class = Some(outer.to_string());
        self
    }

    pub fn member_class(mut self, binary_name: &str) -> Self {
        self.member_classes.push(binary_name.to_string());
        self
    }

    pub fn field(mut self, name: &str, ty: &str, modifiers: u16) -> Self {
        self.fields
            .push((name.to_string(), modifiers, ty.to_string(), None, false));
        self
    }

    /// A `public static final` constant.
    pub fn constant(mut self, name: &str, ty: &str, value: ConstantValue) -> Self {
        self.fields.push((
            name.to_string(),
            ACC_PUBLIC | ACC_STATIC | ACC_FINAL,
            ty.to_string(),
            Some(value),
            false,
        ));
        self
    }

    pub fn enum_constant(mut self, name: &str) -> Self {
        let ty = self.name.clone();
        self.fields.push((
            name.to_string(),
            ACC_PUBLIC | ACC_STATIC | ACC_FINAL,
            ty,
            None,
            true,
        ));
        self
    }

    pub fn method(mut self, method: MethodBuilder) -> Self {
        self.methods.push(method);
        self
    }

    /// Shorthand for a plain public instance method.
    pub fn simple_method(self, name: &str, return_type: &str, params: &[&str]) -> Self {
        self.method(MethodBuilder::new(name, return_type, params))
    }

    pub fn static_method(self, name: &str, return_type: &str, params: &[&str]) -> Self {
        self.method(MethodBuilder::new(name, return_type, params).modifiers(ACC_PUBLIC | ACC_STATIC))
    }

    pub fn constructor(mut self, params: &[&str]) -> Self {
        self.constructors.push(MethodBuilder::constructor(params));
        self
    }

    pub fn constructor_with(mut self, constructor: MethodBuilder) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// An annotation-type element.
    pub fn element(self, name: &str, ty: &str, has_default: bool) -> Self {
        let mut element = MethodBuilder::new(name, ty, &[]).modifiers(ACC_PUBLIC | ACC_ABSTRACT);
        element.has_default_value = has_default;
        self.method(element)
    }

    pub fn annotation(mut self, name: &str) -> Self {
        self.annotations.push(name.to_string());
        self
    }

    pub fn build(&self) -> Result<HostClass, HostTypeError> {
        let in_interface = matches!(
            self.kind,
            HostClassKind::Interface | HostClassKind::Annotation
        );
        let fields = self
            .fields
            .iter()
            .map(|(name, modifiers, ty, constant, enum_constant)| {
                Ok(HostField {
                    name: name.as_str().into(),
                    modifiers: *modifiers,
                    ty: HostType::parse(ty)?,
                    constant: constant.clone(),
                    enum_constant: *enum_constant,
                    synthetic: false,
                })
            })
            .collect::<Result<Vec<_>, HostTypeError>>()?;
        let methods = self
            .methods
            .iter()
            .map(|m| {
                let mut built = m.build(in_interface)?;
                if built.default_method {
                    built.modifiers &= !ACC_FINAL;
                }
                Ok(built)
            })
            .collect::<Result<Vec<_>, HostTypeError>>()?;

        Ok(HostClass {
            name: self.name.as_str().into(),
            kind: self.kind,
            modifiers: self.modifiers,
            type_params: self
                .type_params
                .iter()
                .map(TypeVarSpec::build)
                .collect::<Result<_, _>>()?,
            superclass: self.superclass.as_deref().map(HostType::parse).transpose()?,
            interfaces: parse_all(&self.interfaces)?,
            declaring_class: self.declaring_class.as_deref().map(SmolStr::new),
            member_classes: self.member_classes.iter().map(|m| m.as_str().into()).collect(),
            fields,
            methods,
            constructors: self
                .constructors
                .iter()
                .map(|c| c.build(false))
                .collect::<Result<_, _>>()?,
            annotations: self.annotations.iter().map(|a| a.as_str().into()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_ellipsis_marks_varargs() {
        let class = HostClassBuilder::class("p.Util")
            .method(
                MethodBuilder::new("of", "java.util.List<T>", &["T..."])
                    .modifiers(ACC_PUBLIC | ACC_STATIC)
                    .type_param("T", &[]),
            )
            .build()
            .unwrap();
        let of = &class.methods[0];
        assert!(of.varargs);
        assert_eq!(of.params[0].ty.to_string(), "T[]");
        assert_eq!(class.method_descriptor(of), "([Ljava/lang/Object;)Ljava/util/List;");
    }

    #[test]
    fn interface_methods_are_abstract_unless_default() {
        let class = HostClassBuilder::interface("p.Shape")
            .simple_method("area", "double", &[])
            .method(MethodBuilder::new("describe", "java.lang.String", &[]).modifiers(ACC_PUBLIC | ACC_FINAL))
            .build()
            .unwrap();
        assert_ne!(class.methods[0].modifiers & ACC_ABSTRACT, 0);
        assert!(!class.methods[0].default_method);
        assert!(class.methods[1].default_method);
        assert_eq!(class.methods[1].modifiers & (ACC_FINAL | ACC_ABSTRACT), 0);
    }
}
