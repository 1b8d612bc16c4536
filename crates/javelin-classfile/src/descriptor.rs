use std::fmt;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl BaseType {
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            b'B' => BaseType::Byte,
            b'C' => BaseType::Char,
            b'D' => BaseType::Double,
            b'F' => BaseType::Float,
            b'I' => BaseType::Int,
            b'J' => BaseType::Long,
            b'S' => BaseType::Short,
            b'Z' => BaseType::Boolean,
            _ => return None,
        })
    }

    pub fn code(self) -> char {
        match self {
            BaseType::Byte => 'B',
            BaseType::Char => 'C',
            BaseType::Double => 'D',
            BaseType::Float => 'F',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Short => 'S',
            BaseType::Boolean => 'Z',
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            BaseType::Byte => "byte",
            BaseType::Char => "char",
            BaseType::Double => "double",
            BaseType::Float => "float",
            BaseType::Int => "int",
            BaseType::Long => "long",
            BaseType::Short => "short",
            BaseType::Boolean => "boolean",
        }
    }
}

/// An erased field type. Object names are in internal (`/`-separated) form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Base(BaseType),
    Object(String),
    Array(Box<FieldType>),
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Base(b) => write!(f, "{}", b.code()),
            FieldType::Object(name) => write!(f, "L{name};"),
            FieldType::Array(component) => write!(f, "[{component}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReturnType {
    Void,
    Type(FieldType),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    pub params: Vec<FieldType>,
    pub return_type: ReturnType,
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for p in &self.params {
            write!(f, "{p}")?;
        }
        f.write_str(")")?;
        match &self.return_type {
            ReturnType::Void => f.write_str("V"),
            ReturnType::Type(t) => write!(f, "{t}"),
        }
    }
}

pub fn parse_field_descriptor(desc: &str) -> Result<FieldType> {
    let invalid = || Error::InvalidDescriptor(desc.to_string());
    let (ty, rest) = field_type(desc).ok_or_else(invalid)?;
    if !rest.is_empty() {
        return Err(invalid());
    }
    Ok(ty)
}

pub fn parse_method_descriptor(desc: &str) -> Result<MethodDescriptor> {
    let invalid = || Error::InvalidDescriptor(desc.to_string());
    let mut rest = desc.strip_prefix('(').ok_or_else(invalid)?;

    let mut params = Vec::new();
    loop {
        if let Some(after) = rest.strip_prefix(')') {
            rest = after;
            break;
        }
        let (param, after) = field_type(rest).ok_or_else(invalid)?;
        params.push(param);
        rest = after;
    }

    let return_type = match rest {
        "V" => ReturnType::Void,
        _ => ReturnType::Type(parse_field_descriptor(rest).map_err(|_| invalid())?),
    };
    Ok(MethodDescriptor {
        params,
        return_type,
    })
}

fn field_type(input: &str) -> Option<(FieldType, &str)> {
    let first = *input.as_bytes().first()?;
    if let Some(base) = BaseType::from_code(first) {
        return Some((FieldType::Base(base), &input[1..]));
    }
    match first {
        b'L' => {
            let end = input.find(';')?;
            let name = &input[1..end];
            if name.is_empty() {
                return None;
            }
            Some((FieldType::Object(name.to_string()), &input[end + 1..]))
        }
        b'[' => {
            let (component, rest) = field_type(&input[1..])?;
            Some((FieldType::Array(Box::new(component)), rest))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_descriptor_primitives_and_arrays() {
        assert_eq!(parse_field_descriptor("J").unwrap(), FieldType::Base(BaseType::Long));
        let nested = parse_field_descriptor("[[Ljava/util/List;").unwrap();
        assert_eq!(
            nested,
            FieldType::Array(Box::new(FieldType::Array(Box::new(FieldType::Object(
                "java/util/List".to_string()
            )))))
        );
        assert_eq!(nested.to_string(), "[[Ljava/util/List;");
    }

    #[test]
    fn method_descriptor_params_and_return() {
        let desc = parse_method_descriptor("(I[Ljava/lang/String;)V").unwrap();
        assert_eq!(desc.params.len(), 2);
        assert_eq!(desc.return_type, ReturnType::Void);
        assert_eq!(desc.to_string(), "(I[Ljava/lang/String;)V");
    }

    #[test]
    fn malformed_descriptors_are_rejected() {
        for bad in ["", "L;", "Ljava/lang/String", "Q", "II"] {
            assert!(parse_field_descriptor(bad).is_err(), "{bad}");
        }
        for bad in ["I)V", "(I", "(I)", "(I)VV"] {
            assert!(parse_method_descriptor(bad).is_err(), "{bad}");
        }
    }
}
