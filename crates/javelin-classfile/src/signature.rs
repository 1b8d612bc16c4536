//! Generic signatures (JVMS §4.7.9.1).

use crate::descriptor::BaseType;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSignature {
    Base(BaseType),
    Array(Box<TypeSignature>),
    Class(ClassTypeSignature),
    TypeVariable(String),
}

/// Field signatures never carry a base type, but share the representation.
pub type FieldTypeSignature = TypeSignature;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassTypeSignature {
    /// Internal package prefix, e.g. `java/util`. Empty for the unnamed package.
    pub package: String,
    /// Outermost class first; nested classes follow as `.Inner` segments.
    pub segments: Vec<SimpleClassTypeSignature>,
}

impl ClassTypeSignature {
    /// Binary internal name: `java/util/Map$Entry`.
    pub fn internal_name(&self) -> String {
        let mut out = self.package.clone();
        if !out.is_empty() {
            out.push('/');
        }
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push('$');
            }
            out.push_str(&seg.name);
        }
        out
    }

    /// Type arguments of the innermost segment.
    pub fn type_arguments(&self) -> &[TypeArgument] {
        self.segments
            .last()
            .map(|s| s.type_arguments.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimpleClassTypeSignature {
    pub name: String,
    pub type_arguments: Vec<TypeArgument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeArgument {
    Any,
    Exact(Box<TypeSignature>),
    Extends(Box<TypeSignature>),
    Super(Box<TypeSignature>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeParameter {
    pub name: String,
    pub class_bound: Option<TypeSignature>,
    pub interface_bounds: Vec<TypeSignature>,
}

impl TypeParameter {
    pub fn bounds(&self) -> impl Iterator<Item = &TypeSignature> {
        self.class_bound.iter().chain(self.interface_bounds.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub super_class: ClassTypeSignature,
    pub interfaces: Vec<ClassTypeSignature>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub parameters: Vec<TypeSignature>,
    /// `None` for `void`.
    pub return_type: Option<TypeSignature>,
    pub throws: Vec<TypeSignature>,
}

pub fn parse_class_signature(sig: &str) -> Result<ClassSignature> {
    let mut p = SigParser::new(sig);
    let type_parameters = p.type_parameters()?;
    let super_class = p.class_type()?;
    let mut interfaces = Vec::new();
    while !p.at_end() {
        interfaces.push(p.class_type()?);
    }
    Ok(ClassSignature {
        type_parameters,
        super_class,
        interfaces,
    })
}

pub fn parse_field_signature(sig: &str) -> Result<FieldTypeSignature> {
    let mut p = SigParser::new(sig);
    let ty = p.reference_type()?;
    p.finish()?;
    Ok(ty)
}

pub fn parse_method_signature(sig: &str) -> Result<MethodSignature> {
    let mut p = SigParser::new(sig);
    let type_parameters = p.type_parameters()?;
    p.expect(b'(')?;
    let mut parameters = Vec::new();
    while !p.eat(b')') {
        parameters.push(p.type_signature()?);
    }
    let return_type = if p.eat(b'V') {
        None
    } else {
        Some(p.type_signature()?)
    };
    let mut throws = Vec::new();
    while p.eat(b'^') {
        throws.push(p.reference_type()?);
    }
    p.finish()?;
    Ok(MethodSignature {
        type_parameters,
        parameters,
        return_type,
        throws,
    })
}

struct SigParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> SigParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn error(&self) -> Error {
        Error::InvalidSignature(self.input.to_string())
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, b: u8) -> Result<()> {
        if self.eat(b) {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn finish(&self) -> Result<()> {
        if self.at_end() {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn identifier(&mut self) -> Result<&'a str> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b'.' | b';' | b'[' | b'/' | b'<' | b'>' | b':') {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error());
        }
        Ok(&self.input[start..self.pos])
    }

    fn type_parameters(&mut self) -> Result<Vec<TypeParameter>> {
        let mut params = Vec::new();
        if !self.eat(b'<') {
            return Ok(params);
        }
        loop {
            let name = self.identifier()?.to_string();
            self.expect(b':')?;
            let class_bound = match self.peek() {
                Some(b'L' | b'T' | b'[') => Some(self.reference_type()?),
                _ => None,
            };
            let mut interface_bounds = Vec::new();
            while self.eat(b':') {
                interface_bounds.push(self.reference_type()?);
            }
            params.push(TypeParameter {
                name,
                class_bound,
                interface_bounds,
            });
            if self.eat(b'>') {
                break;
            }
        }
        Ok(params)
    }

    fn type_signature(&mut self) -> Result<TypeSignature> {
        if let Some(base) = self.peek().and_then(BaseType::from_code) {
            self.pos += 1;
            return Ok(TypeSignature::Base(base));
        }
        self.reference_type()
    }

    fn reference_type(&mut self) -> Result<TypeSignature> {
        match self.peek() {
            Some(b'L') => Ok(TypeSignature::Class(self.class_type()?)),
            Some(b'T') => {
                self.pos += 1;
                let name = self.identifier()?.to_string();
                self.expect(b';')?;
                Ok(TypeSignature::TypeVariable(name))
            }
            Some(b'[') => {
                self.pos += 1;
                Ok(TypeSignature::Array(Box::new(self.type_signature()?)))
            }
            _ => Err(self.error()),
        }
    }

    fn class_type(&mut self) -> Result<ClassTypeSignature> {
        self.expect(b'L')?;
        let mut package = String::new();
        let mut name = self.identifier()?;
        while self.eat(b'/') {
            if !package.is_empty() {
                package.push('/');
            }
            package.push_str(name);
            name = self.identifier()?;
        }

        let mut segments = vec![SimpleClassTypeSignature {
            name: name.to_string(),
            type_arguments: self.type_arguments()?,
        }];
        while self.eat(b'.') {
            let name = self.identifier()?.to_string();
            segments.push(SimpleClassTypeSignature {
                name,
                type_arguments: self.type_arguments()?,
            });
        }
        self.expect(b';')?;
        Ok(ClassTypeSignature { package, segments })
    }

    fn type_arguments(&mut self) -> Result<Vec<TypeArgument>> {
        let mut args = Vec::new();
        if !self.eat(b'<') {
            return Ok(args);
        }
        while !self.eat(b'>') {
            let arg = if self.eat(b'*') {
                TypeArgument::Any
            } else if self.eat(b'+') {
                TypeArgument::Extends(Box::new(self.reference_type()?))
            } else if self.eat(b'-') {
                TypeArgument::Super(Box::new(self.reference_type()?))
            } else {
                TypeArgument::Exact(Box::new(self.reference_type()?))
            };
            args.push(arg);
        }
        if args.is_empty() {
            return Err(self.error());
        }
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn class(package: &str, name: &str, args: Vec<TypeArgument>) -> ClassTypeSignature {
        ClassTypeSignature {
            package: package.to_string(),
            segments: vec![SimpleClassTypeSignature {
                name: name.to_string(),
                type_arguments: args,
            }],
        }
    }

    #[test]
    fn class_signature_with_self_referential_bound() {
        let sig = parse_class_signature(
            "<E:Ljava/lang/Enum<TE;>;>Ljava/lang/Object;Ljava/lang/Comparable<TE;>;",
        )
        .unwrap();
        assert_eq!(sig.type_parameters.len(), 1);
        let e = &sig.type_parameters[0];
        assert_eq!(e.name, "E");
        assert_eq!(
            e.class_bound,
            Some(TypeSignature::Class(class(
                "java/lang",
                "Enum",
                vec![TypeArgument::Exact(Box::new(TypeSignature::TypeVariable(
                    "E".to_string()
                )))]
            )))
        );
        assert_eq!(sig.super_class.internal_name(), "java/lang/Object");
        assert_eq!(sig.interfaces[0].internal_name(), "java/lang/Comparable");
    }

    #[test]
    fn interface_only_bound_leaves_class_bound_empty() {
        let sig = parse_method_signature("<T::Ljava/lang/Comparable<-TT;>;>(Ljava/util/List<+TT;>;)TT;")
            .unwrap();
        let t = &sig.type_parameters[0];
        assert_eq!(t.class_bound, None);
        assert_eq!(t.interface_bounds.len(), 1);
        assert_eq!(sig.return_type, Some(TypeSignature::TypeVariable("T".to_string())));
        let TypeSignature::Class(list) = &sig.parameters[0] else {
            panic!("expected class type");
        };
        assert!(matches!(list.type_arguments()[0], TypeArgument::Extends(_)));
    }

    #[test]
    fn method_signature_with_void_and_throws() {
        let sig = parse_method_signature("([I*)V^Ljava/io/IOException;^TX;");
        assert!(sig.is_err());

        let sig = parse_method_signature("<X:Ljava/lang/Exception;>([IZ)V^Ljava/io/IOException;^TX;")
            .unwrap();
        assert_eq!(sig.return_type, None);
        assert_eq!(
            sig.parameters,
            vec![
                TypeSignature::Array(Box::new(TypeSignature::Base(BaseType::Int))),
                TypeSignature::Base(BaseType::Boolean),
            ]
        );
        assert_eq!(sig.throws.len(), 2);
    }

    #[test]
    fn nested_class_segments() {
        let ty = parse_field_signature("Ljava/util/Map<TK;TV;>.Entry<TK;TV;>;").unwrap();
        let TypeSignature::Class(c) = ty else {
            panic!("expected class type");
        };
        assert_eq!(c.internal_name(), "java/util/Map$Entry");
        assert_eq!(c.segments[0].type_arguments.len(), 2);
        assert_eq!(c.type_arguments().len(), 2);
    }

    #[test]
    fn default_package_class() {
        let ty = parse_field_signature("LFoo<*>;").unwrap();
        assert_eq!(ty, TypeSignature::Class(class("", "Foo", vec![TypeArgument::Any])));
    }
}
