//! The host runtime's view of its loaded classes, mirroring what
//! `java.lang.Class` and `java.lang.reflect` expose.
//!
//! Class names are binary names (`java.util.Map$Entry`). Modifiers are the
//! `java.lang.reflect.Modifier` bits, which coincide with the JVM access flags.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use javelin_types::{ConstantValue, PrimitiveType};
use smol_str::SmolStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("bad host type `{text}`: {message}")]
pub struct HostTypeError {
    pub text: String,
    pub message: String,
}

/// A generic type as reported by the host (`getGenericReturnType` and friends).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostType {
    Primitive(PrimitiveType),
    Void,
    /// A class, parameterized when `args` is non-empty.
    Class { name: SmolStr, args: Vec<HostType> },
    TypeVariable(SmolStr),
    Wildcard {
        upper: Option<Box<HostType>>,
        lower: Option<Box<HostType>>,
    },
    Array(Box<HostType>),
}

impl HostType {
    pub fn class(name: &str) -> Self {
        HostType::Class {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Parses Java-like text. Dotted names are classes; bare identifiers that
    /// are not primitive keywords are type variables.
    pub fn parse(text: &str) -> Result<Self, HostTypeError> {
        let mut parser = Parser {
            text,
            chars: text.char_indices().peekable(),
        };
        let ty = parser.ty()?;
        parser.skip_ws();
        match parser.chars.peek() {
            None => Ok(ty),
            Some(&(at, _)) => Err(parser.error(format!("unexpected input at {at}"))),
        }
    }

    /// Binary name of the erased class, given the bounds of type variables in
    /// scope. Unbounded variables erase to `java.lang.Object`.
    pub fn erased_descriptor(&self, bound_of: &dyn Fn(&str) -> Option<HostType>) -> String {
        let mut out = String::new();
        self.erased_into(bound_of, &mut out, 0);
        out
    }

    fn erased_into(&self, bound_of: &dyn Fn(&str) -> Option<HostType>, out: &mut String, depth: usize) {
        match self {
            HostType::Primitive(p) => out.push(p.descriptor_char()),
            HostType::Void => out.push('V'),
            HostType::Class { name, .. } => {
                out.push('L');
                out.push_str(&name.replace('.', "/"));
                out.push(';');
            }
            HostType::TypeVariable(name) => match bound_of(name) {
                Some(bound) if depth < 8 => bound.erased_into(bound_of, out, depth + 1),
                _ => out.push_str("Ljava/lang/Object;"),
            },
            HostType::Wildcard { upper, .. } => match upper {
                Some(upper) => upper.erased_into(bound_of, out, depth),
                None => out.push_str("Ljava/lang/Object;"),
            },
            HostType::Array(component) => {
                out.push('[');
                component.erased_into(bound_of, out, depth);
            }
        }
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostType::Primitive(p) => f.write_str(p.keyword()),
            HostType::Void => f.write_str("void"),
            HostType::Class { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            HostType::TypeVariable(name) => f.write_str(name),
            HostType::Wildcard { upper, lower } => match (upper, lower) {
                (Some(upper), _) => write!(f, "? extends {upper}"),
                (None, Some(lower)) => write!(f, "? super {lower}"),
                (None, None) => f.write_str("?"),
            },
            HostType::Array(component) => write!(f, "{component}[]"),
        }
    }
}

struct Parser<'a> {
    text: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl Parser<'_> {
    fn error(&self, message: impl Into<String>) -> HostTypeError {
        HostTypeError {
            text: self.text.to_string(),
            message: message.into(),
        }
    }

    fn skip_ws(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        self.chars.next_if(|&(_, c)| c == expected).is_some()
    }

    fn ident(&mut self) -> Result<String, HostTypeError> {
        self.skip_ws();
        let mut out = String::new();
        while let Some((_, c)) = self
            .chars
            .next_if(|&(_, c)| c.is_alphanumeric() || matches!(c, '_' | '$' | '.'))
        {
            out.push(c);
        }
        if out.is_empty() {
            return Err(self.error("expected a name"));
        }
        Ok(out)
    }

    fn ty(&mut self) -> Result<HostType, HostTypeError> {
        let mut ty = if self.eat('?') {
            self.wildcard()?
        } else {
            let name = self.ident()?;
            if name == "void" {
                HostType::Void
            } else if let Some(p) = PrimitiveType::from_keyword(&name) {
                HostType::Primitive(p)
            } else if name.contains('.') {
                let mut args = Vec::new();
                if self.eat('<') {
                    loop {
                        args.push(self.ty()?);
                        if self.eat('>') {
                            break;
                        }
                        if !self.eat(',') {
                            return Err(self.error("expected `,` or `>`"));
                        }
                    }
                }
                HostType::Class {
                    name: name.into(),
                    args,
                }
            } else {
                HostType::TypeVariable(name.into())
            }
        };
        while self.eat('[') {
            if !self.eat(']') {
                return Err(self.error("expected `]`"));
            }
            ty = HostType::Array(Box::new(ty));
        }
        Ok(ty)
    }

    fn wildcard(&mut self) -> Result<HostType, HostTypeError> {
        self.skip_ws();
        let keyword = match self.chars.peek() {
            Some(&(_, c)) if c.is_alphabetic() => self.ident()?,
            _ => {
                return Ok(HostType::Wildcard {
                    upper: None,
                    lower: None,
                })
            }
        };
        let bound = Some(Box::new(self.ty()?));
        match keyword.as_str() {
            "extends" => Ok(HostType::Wildcard {
                upper: bound,
                lower: None,
            }),
            "super" => Ok(HostType::Wildcard {
                upper: None,
                lower: bound,
            }),
            other => Err(self.error(format!("unexpected `{other}` after `?`"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostClassKind {
    Class,
    Interface,
    Enum,
    Annotation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTypeVar {
    pub name: SmolStr,
    pub bounds: Vec<HostType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostField {
    pub name: SmolStr,
    pub modifiers: u16,
    pub ty: HostType,
    /// Compile-time constant of a `static final` field.
    pub constant: Option<ConstantValue>,
    pub enum_constant: bool,
    pub synthetic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostParam {
    /// `None` when the class was compiled without parameter names.
    pub name: Option<SmolStr>,
    pub ty: HostType,
}

/// A method or constructor (`<init>`, returning `void`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostMethod {
    pub name: SmolStr,
    pub modifiers: u16,
    pub type_params: Vec<HostTypeVar>,
    pub params: Vec<HostParam>,
    pub return_type: HostType,
    pub exceptions: Vec<HostType>,
    pub varargs: bool,
    pub synthetic: bool,
    pub bridge: bool,
    pub default_method: bool,
    /// Annotation-type elements only.
    pub has_default_value: bool,
    pub annotations: Vec<SmolStr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostClass {
    pub name: SmolStr,
    pub kind: HostClassKind,
    pub modifiers: u16,
    pub type_params: Vec<HostTypeVar>,
    pub superclass: Option<HostType>,
    pub interfaces: Vec<HostType>,
    /// Binary name of the enclosing class for member classes.
    pub declaring_class: Option<SmolStr>,
    pub member_classes: Vec<SmolStr>,
    pub fields: Vec<HostField>,
    pub methods: Vec<HostMethod>,
    pub constructors: Vec<HostMethod>,
    pub annotations: Vec<SmolStr>,
}

impl HostClass {
    pub fn simple_name(&self) -> &str {
        let name = self.name.as_str();
        let after_package = name.rsplit_once('.').map_or(name, |(_, s)| s);
        match &self.declaring_class {
            Some(_) => after_package.rsplit_once('$').map_or(after_package, |(_, s)| s),
            None => after_package,
        }
    }

    pub fn package_name(&self) -> &str {
        self.name.rsplit_once('.').map_or("", |(p, _)| p)
    }

    /// `java.util.Map.Entry` for `java.util.Map$Entry`.
    pub fn canonical_name(&self) -> String {
        match &self.declaring_class {
            Some(_) => {
                let package = self.package_name();
                let rest = if package.is_empty() {
                    self.name.as_str()
                } else {
                    &self.name[package.len() + 1..]
                };
                let rest = rest.replace('$', ".");
                if package.is_empty() {
                    rest
                } else {
                    format!("{package}.{rest}")
                }
            }
            None => self.name.to_string(),
        }
    }

    /// The erased JVM descriptor of `method`, as `TypeUtils.getMethodDescriptor`
    /// would render it.
    pub fn method_descriptor(&self, method: &HostMethod) -> String {
        let bound_of = |name: &str| {
            method
                .type_params
                .iter()
                .chain(&self.type_params)
                .find(|tv| tv.name == name)
                .and_then(|tv| tv.bounds.first().cloned())
        };
        let mut out = String::from("(");
        for param in &method.params {
            out.push_str(&param.ty.erased_descriptor(&bound_of));
        }
        out.push(')');
        out.push_str(&method.return_type.erased_descriptor(&bound_of));
        out
    }
}

/// The running program's class registry.
pub trait HostRuntime: Send + Sync {
    /// `Class.forName` by binary name, without initialization.
    fn class_for_name(&self, name: &str) -> Option<Arc<HostClass>>;

    fn class_names(&self) -> Vec<SmolStr>;

    fn describe(&self) -> &str {
        "host"
    }
}

/// A runtime whose classes are plain data: the bootstrap JDK plus anything
/// the embedding application registers.
#[derive(Default)]
pub struct BootstrapRuntime {
    classes: HashMap<SmolStr, Arc<HostClass>>,
}

impl BootstrapRuntime {
    /// The bootstrap JDK subset.
    pub fn new() -> Self {
        let mut runtime = Self::empty();
        for class in crate::bootstrap::classes() {
            match class {
                Ok(class) => runtime.insert(class),
                Err(err) => tracing::error!(target: "javelin.reflect", error = %err, "bad bootstrap class"),
            }
        }
        runtime
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, class: HostClass) {
        self.classes.insert(class.name.clone(), Arc::new(class));
    }

    pub fn with(mut self, class: HostClass) -> Self {
        self.insert(class);
        self
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl HostRuntime for BootstrapRuntime {
    fn class_for_name(&self, name: &str) -> Option<Arc<HostClass>> {
        self.classes.get(name).cloned()
    }

    fn class_names(&self) -> Vec<SmolStr> {
        let mut names: Vec<SmolStr> = self.classes.keys().cloned().collect();
        names.sort();
        names
    }

    fn describe(&self) -> &str {
        "bootstrap"
    }
}

impl fmt::Debug for BootstrapRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapRuntime")
            .field("classes", &self.classes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_generic_text() {
        let ty = HostType::parse("java.util.Map<K, ? extends java.util.List<V[]>>").unwrap();
        assert_eq!(ty.to_string(), "java.util.Map<K, ? extends java.util.List<V[]>>");
        assert_eq!(HostType::parse("int[][]").unwrap().to_string(), "int[][]");
        assert_eq!(
            HostType::parse("? super T").unwrap(),
            HostType::Wildcard {
                upper: None,
                lower: Some(Box::new(HostType::TypeVariable("T".into()))),
            }
        );
        assert!(HostType::parse("java.util.List<").is_err());
        assert!(HostType::parse("? within T").is_err());
    }

    #[test]
    fn erasure_follows_first_bound() {
        let bound = |name: &str| (name == "T").then(|| HostType::parse("java.lang.Comparable<T>").unwrap());
        let ty = HostType::parse("T[]").unwrap();
        assert_eq!(ty.erased_descriptor(&bound), "[Ljava/lang/Comparable;");
        let free = HostType::parse("U").unwrap();
        assert_eq!(free.erased_descriptor(&bound), "Ljava/lang/Object;");
    }
}
