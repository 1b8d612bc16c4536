use crate::constant_pool::{ConstantPool, CpInfo};
use crate::error::{Error, Result};
use crate::reader::Reader;

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Field descriptor of the annotation interface, e.g. `Ljava/lang/Deprecated;`.
    pub type_descriptor: String,
    pub elements: Vec<(String, ElementValue)>,
}

impl Annotation {
    /// Internal name of the annotation interface, when the descriptor is a class type.
    pub fn type_internal_name(&self) -> Option<&str> {
        self.type_descriptor
            .strip_prefix('L')
            .and_then(|rest| rest.strip_suffix(';'))
    }

    pub(crate) fn parse(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Self> {
        let type_descriptor = cp.get_utf8(reader.read_u2()?)?.to_string();
        let count = reader.read_u2()? as usize;
        let mut elements = Vec::with_capacity(count);
        for _ in 0..count {
            let name = cp.get_utf8(reader.read_u2()?)?.to_string();
            elements.push((name, ElementValue::parse(reader, cp)?));
        }
        Ok(Self {
            type_descriptor,
            elements,
        })
    }

    pub(crate) fn parse_list(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Vec<Self>> {
        let count = reader.read_u2()? as usize;
        (0..count).map(|_| Annotation::parse(reader, cp)).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Const(ConstValue),
    Enum {
        type_descriptor: String,
        const_name: String,
    },
    /// Return descriptor of a class literal, e.g. `Ljava/lang/String;` or `V`.
    Class(String),
    Annotation(Box<Annotation>),
    Array(Vec<ElementValue>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Byte(i8),
    Char(char),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    String(String),
}

impl ElementValue {
    fn parse(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Self> {
        let tag = reader.read_u1()?;
        let value = match tag {
            b'B' | b'C' | b'I' | b'S' | b'Z' => {
                let (index, entry) = constant(reader, cp)?;
                let CpInfo::Integer(v) = *entry else {
                    return Err(mismatch(index, "Integer", entry));
                };
                ElementValue::Const(match tag {
                    b'B' => ConstValue::Byte(v as i8),
                    b'C' => ConstValue::Char(
                        char::from_u32(v as u32).ok_or(Error::MalformedAttribute("annotation"))?,
                    ),
                    b'S' => ConstValue::Short(v as i16),
                    b'Z' => ConstValue::Boolean(v != 0),
                    _ => ConstValue::Int(v),
                })
            }
            b'J' => {
                let (index, entry) = constant(reader, cp)?;
                let CpInfo::Long(v) = *entry else {
                    return Err(mismatch(index, "Long", entry));
                };
                ElementValue::Const(ConstValue::Long(v))
            }
            b'F' => {
                let (index, entry) = constant(reader, cp)?;
                let CpInfo::Float(v) = *entry else {
                    return Err(mismatch(index, "Float", entry));
                };
                ElementValue::Const(ConstValue::Float(v))
            }
            b'D' => {
                let (index, entry) = constant(reader, cp)?;
                let CpInfo::Double(v) = *entry else {
                    return Err(mismatch(index, "Double", entry));
                };
                ElementValue::Const(ConstValue::Double(v))
            }
            b's' => ElementValue::Const(ConstValue::String(
                cp.get_string_constant(reader.read_u2()?)?,
            )),
            b'e' => {
                let type_descriptor = cp.get_utf8(reader.read_u2()?)?.to_string();
                let const_name = cp.get_utf8(reader.read_u2()?)?.to_string();
                ElementValue::Enum {
                    type_descriptor,
                    const_name,
                }
            }
            b'c' => ElementValue::Class(cp.get_utf8(reader.read_u2()?)?.to_string()),
            b'@' => ElementValue::Annotation(Box::new(Annotation::parse(reader, cp)?)),
            b'[' => {
                let count = reader.read_u2()? as usize;
                let values = (0..count)
                    .map(|_| ElementValue::parse(reader, cp))
                    .collect::<Result<Vec<_>>>()?;
                ElementValue::Array(values)
            }
            _ => return Err(Error::MalformedAttribute("annotation")),
        };
        Ok(value)
    }
}

fn constant<'cp>(reader: &mut Reader<'_>, cp: &'cp ConstantPool) -> Result<(u16, &'cp CpInfo)> {
    let index = reader.read_u2()?;
    Ok((index, cp.get(index)?))
}

fn mismatch(index: u16, expected: &'static str, found: &CpInfo) -> Error {
    Error::ConstantPoolTypeMismatch {
        index,
        expected,
        found: found.kind(),
    }
}
