use std::fmt;

use crate::primitive::PrimitiveType;

/// A compile-time constant in the domain of primitive and `String` values.
///
/// `Char` holds a UTF-16 code unit, so lone surrogates are representable.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Boolean(bool),
    Char(u16),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
}

impl ConstantValue {
    /// `None` for `String`.
    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        Some(match self {
            ConstantValue::Boolean(_) => PrimitiveType::Boolean,
            ConstantValue::Char(_) => PrimitiveType::Char,
            ConstantValue::Byte(_) => PrimitiveType::Byte,
            ConstantValue::Short(_) => PrimitiveType::Short,
            ConstantValue::Int(_) => PrimitiveType::Int,
            ConstantValue::Long(_) => PrimitiveType::Long,
            ConstantValue::Float(_) => PrimitiveType::Float,
            ConstantValue::Double(_) => PrimitiveType::Double,
            ConstantValue::String(_) => return None,
        })
    }

    /// Value of a constant whose type promotes to `int`.
    pub fn as_int_like(&self) -> Option<i64> {
        match *self {
            ConstantValue::Char(c) => Some(c as i64),
            ConstantValue::Byte(v) => Some(v as i64),
            ConstantValue::Short(v) => Some(v as i64),
            ConstantValue::Int(v) => Some(v as i64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            ConstantValue::Long(v) => Some(v),
            _ => self.as_int_like(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            ConstantValue::Float(v) => Some(v as f64),
            ConstantValue::Double(v) => Some(v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            ConstantValue::Boolean(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConstantValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Casting conversion to a primitive type with Java's truncation and
    /// saturation rules. Returns `None` for conversions Java rejects
    /// (`boolean` <-> numeric, `String` -> primitive).
    pub fn cast_to(&self, target: PrimitiveType) -> Option<ConstantValue> {
        if let ConstantValue::Boolean(b) = *self {
            return (target == PrimitiveType::Boolean).then_some(ConstantValue::Boolean(b));
        }
        if target == PrimitiveType::Boolean || self.primitive_type().is_none() {
            return None;
        }

        let value = match (self, target) {
            (ConstantValue::Float(_) | ConstantValue::Double(_), _) => {
                let f = self.as_f64()?;
                match target {
                    PrimitiveType::Float => ConstantValue::Float(f as f32),
                    PrimitiveType::Double => ConstantValue::Double(f),
                    PrimitiveType::Long => ConstantValue::Long(f as i64),
                    // Narrowing from floating point goes through `int` (JLS 5.1.3).
                    _ => return ConstantValue::Int(f as i32).cast_to(target),
                }
            }
            _ => {
                let v = self.as_i64()?;
                match target {
                    PrimitiveType::Byte => ConstantValue::Byte(v as i8),
                    PrimitiveType::Short => ConstantValue::Short(v as i16),
                    PrimitiveType::Char => ConstantValue::Char(v as u16),
                    PrimitiveType::Int => ConstantValue::Int(v as i32),
                    PrimitiveType::Long => ConstantValue::Long(v),
                    PrimitiveType::Float => ConstantValue::Float(v as f32),
                    PrimitiveType::Double => ConstantValue::Double(v as f64),
                    PrimitiveType::Boolean => return None,
                }
            }
        };
        Some(value)
    }

    /// String conversion as performed by `+` concatenation (JLS 5.1.11).
    pub fn to_java_string(&self) -> String {
        match self {
            ConstantValue::Boolean(b) => b.to_string(),
            ConstantValue::Char(c) => String::from_utf16_lossy(&[*c]),
            ConstantValue::Byte(v) => v.to_string(),
            ConstantValue::Short(v) => v.to_string(),
            ConstantValue::Int(v) => v.to_string(),
            ConstantValue::Long(v) => v.to_string(),
            ConstantValue::Float(v) => java_float_string(*v as f64, true),
            ConstantValue::Double(v) => java_float_string(*v, false),
            ConstantValue::String(s) => s.clone(),
        }
    }
}

/// `Double.toString`/`Float.toString`: plain decimal for magnitudes in
/// `[1e-3, 1e7)`, otherwise computerized scientific notation (`1.0E10`).
fn java_float_string(v: f64, single: bool) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let magnitude = v.abs();
    if v == 0.0 || (1e-3..1e7).contains(&magnitude) {
        let s = if single {
            (v as f32).to_string()
        } else {
            v.to_string()
        };
        return if s.contains('.') { s } else { format!("{s}.0") };
    }
    let s = if single {
        format!("{:e}", v as f32)
    } else {
        format!("{v:e}")
    };
    let (mantissa, exponent) = s.split_once('e').unwrap_or((s.as_str(), "0"));
    if mantissa.contains('.') {
        format!("{mantissa}E{exponent}")
    } else {
        format!("{mantissa}.0E{exponent}")
    }
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Char(c) => match char::from_u32(*c as u32) {
                Some(ch) => write!(f, "'{}'", ch.escape_default()),
                None => write!(f, "'\\u{c:04x}'"),
            },
            ConstantValue::Long(v) => write!(f, "{v}L"),
            ConstantValue::Float(_) => write!(f, "{}f", self.to_java_string()),
            ConstantValue::String(s) => write!(f, "{s:?}"),
            other => f.write_str(&other.to_java_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrowing_casts_follow_java() {
        assert_eq!(
            ConstantValue::Int(300).cast_to(PrimitiveType::Byte),
            Some(ConstantValue::Byte(44))
        );
        assert_eq!(
            ConstantValue::Double(1e20).cast_to(PrimitiveType::Int),
            Some(ConstantValue::Int(i32::MAX))
        );
        assert_eq!(
            ConstantValue::Double(f64::NAN).cast_to(PrimitiveType::Long),
            Some(ConstantValue::Long(0))
        );
        assert_eq!(
            ConstantValue::Float(-1.5).cast_to(PrimitiveType::Char),
            Some(ConstantValue::Char(0xFFFF))
        );
        assert_eq!(
            ConstantValue::Char(b'A' as u16).cast_to(PrimitiveType::Int),
            Some(ConstantValue::Int(65))
        );
    }

    #[test]
    fn boolean_and_string_do_not_convert() {
        assert_eq!(ConstantValue::Boolean(true).cast_to(PrimitiveType::Int), None);
        assert_eq!(ConstantValue::Int(1).cast_to(PrimitiveType::Boolean), None);
        assert_eq!(ConstantValue::String("1".into()).cast_to(PrimitiveType::Int), None);
    }

    #[test]
    fn string_conversion() {
        assert_eq!(ConstantValue::Double(1.0).to_java_string(), "1.0");
        assert_eq!(ConstantValue::Float(2.5).to_java_string(), "2.5");
        assert_eq!(ConstantValue::Char(b'x' as u16).to_java_string(), "x");
        assert_eq!(ConstantValue::Long(7).to_string(), "7L");
    }

    #[test]
    fn large_and_small_magnitudes_use_scientific_notation() {
        assert_eq!(ConstantValue::Double(1e10).to_java_string(), "1.0E10");
        assert_eq!(ConstantValue::Double(0.0001).to_java_string(), "1.0E-4");
        assert_eq!(ConstantValue::Double(-1.25e-5).to_java_string(), "-1.25E-5");
        assert_eq!(ConstantValue::Double(1e7).to_java_string(), "1.0E7");
        assert_eq!(ConstantValue::Double(9999999.0).to_java_string(), "9999999.0");
        assert_eq!(ConstantValue::Double(0.001).to_java_string(), "0.001");
        assert_eq!(ConstantValue::Float(1.5e8).to_java_string(), "1.5E8");
        assert_eq!(ConstantValue::Double(-0.0).to_java_string(), "-0.0");
    }
}
