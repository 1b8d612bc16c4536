use std::fmt;

use crate::constant::ConstantValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

const BOXES: [(PrimitiveType, &str); 8] = [
    (PrimitiveType::Boolean, "java.lang.Boolean"),
    (PrimitiveType::Byte, "java.lang.Byte"),
    (PrimitiveType::Short, "java.lang.Short"),
    (PrimitiveType::Char, "java.lang.Character"),
    (PrimitiveType::Int, "java.lang.Integer"),
    (PrimitiveType::Long, "java.lang.Long"),
    (PrimitiveType::Float, "java.lang.Float"),
    (PrimitiveType::Double, "java.lang.Double"),
];

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 8] = [
        PrimitiveType::Boolean,
        PrimitiveType::Byte,
        PrimitiveType::Short,
        PrimitiveType::Char,
        PrimitiveType::Int,
        PrimitiveType::Long,
        PrimitiveType::Float,
        PrimitiveType::Double,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Char => "char",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.keyword() == keyword)
    }

    pub fn descriptor_char(self) -> char {
        match self {
            PrimitiveType::Boolean => 'Z',
            PrimitiveType::Byte => 'B',
            PrimitiveType::Short => 'S',
            PrimitiveType::Char => 'C',
            PrimitiveType::Int => 'I',
            PrimitiveType::Long => 'J',
            PrimitiveType::Float => 'F',
            PrimitiveType::Double => 'D',
        }
    }

    /// Qualified name of the wrapper class.
    pub fn boxed_name(self) -> &'static str {
        BOXES[self as usize].1
    }

    pub fn from_boxed_name(name: &str) -> Option<Self> {
        BOXES.iter().find(|(_, n)| *n == name).map(|(p, _)| *p)
    }

    pub fn is_numeric(self) -> bool {
        self != PrimitiveType::Boolean
    }

    pub fn is_integral(self) -> bool {
        matches!(
            self,
            PrimitiveType::Byte
                | PrimitiveType::Short
                | PrimitiveType::Char
                | PrimitiveType::Int
                | PrimitiveType::Long
        )
    }

    /// Identity or widening primitive conversion (JLS 5.1.2).
    pub fn widens_to(self, target: PrimitiveType) -> bool {
        use PrimitiveType::*;
        if self == target {
            return true;
        }
        match self {
            Byte => matches!(target, Short | Int | Long | Float | Double),
            Short | Char => matches!(target, Int | Long | Float | Double),
            Int => matches!(target, Long | Float | Double),
            Long => matches!(target, Float | Double),
            Float => target == Double,
            Double | Boolean => false,
        }
    }

    /// Unary numeric promotion (JLS 5.6). `None` for `boolean`.
    pub fn unary_promotion(self) -> Option<PrimitiveType> {
        match self {
            PrimitiveType::Boolean => None,
            PrimitiveType::Byte | PrimitiveType::Short | PrimitiveType::Char => {
                Some(PrimitiveType::Int)
            }
            other => Some(other),
        }
    }

    /// Binary numeric promotion (JLS 5.6). `None` if either side is `boolean`.
    pub fn binary_promotion(a: PrimitiveType, b: PrimitiveType) -> Option<PrimitiveType> {
        let (a, b) = (a.unary_promotion()?, b.unary_promotion()?);
        Some(if a == PrimitiveType::Double || b == PrimitiveType::Double {
            PrimitiveType::Double
        } else if a == PrimitiveType::Float || b == PrimitiveType::Float {
            PrimitiveType::Float
        } else if a == PrimitiveType::Long || b == PrimitiveType::Long {
            PrimitiveType::Long
        } else {
            PrimitiveType::Int
        })
    }

    /// Whether an `int` compile-time constant may be narrowed to `self` (JLS 5.2).
    pub fn admits_constant(self, value: &ConstantValue) -> bool {
        let Some(v) = value.as_int_like() else {
            return false;
        };
        match self {
            PrimitiveType::Byte => i8::try_from(v).is_ok(),
            PrimitiveType::Short => i16::try_from(v).is_ok(),
            PrimitiveType::Char => u16::try_from(v).is_ok(),
            _ => false,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widening_table() {
        use PrimitiveType::*;
        assert!(Byte.widens_to(Short));
        assert!(Char.widens_to(Int));
        assert!(!Char.widens_to(Short));
        assert!(!Short.widens_to(Char));
        assert!(Long.widens_to(Float));
        assert!(!Double.widens_to(Float));
        assert!(!Boolean.widens_to(Int));
    }

    #[test]
    fn boxing_round_trip() {
        for p in PrimitiveType::ALL {
            assert_eq!(PrimitiveType::from_boxed_name(p.boxed_name()), Some(p));
        }
        assert_eq!(PrimitiveType::Char.boxed_name(), "java.lang.Character");
        assert_eq!(PrimitiveType::from_boxed_name("java.lang.String"), None);
    }

    #[test]
    fn promotions() {
        use PrimitiveType::*;
        assert_eq!(Byte.unary_promotion(), Some(Int));
        assert_eq!(PrimitiveType::binary_promotion(Char, Long), Some(Long));
        assert_eq!(PrimitiveType::binary_promotion(Int, Float), Some(Float));
        assert_eq!(PrimitiveType::binary_promotion(Boolean, Int), None);
    }

    #[test]
    fn constant_narrowing_ranges() {
        assert!(PrimitiveType::Byte.admits_constant(&ConstantValue::Int(127)));
        assert!(!PrimitiveType::Byte.admits_constant(&ConstantValue::Int(128)));
        assert!(PrimitiveType::Char.admits_constant(&ConstantValue::Int(65535)));
        assert!(!PrimitiveType::Char.admits_constant(&ConstantValue::Int(-1)));
        assert!(!PrimitiveType::Short.admits_constant(&ConstantValue::Long(1)));
    }
}
