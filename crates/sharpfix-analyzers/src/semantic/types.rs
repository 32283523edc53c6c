//! Static types as the binder sees them.
//!
//! Only what the detectors need is modelled: the built-in value types and
//! `string`/`object`, named source types, arrays, nullables and tuples.
//! Everything else is [`Type::Unknown`], which never compares equal to a
//! known type.

use std::fmt;

/// A built-in type with a C# keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Primitive {
    Bool,
    Byte,
    SByte,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Char,
    Float,
    Double,
    Decimal,
    String,
    Object,
}

/// (primitive, keyword, framework name)
const PRIMITIVE_NAMES: &[(Primitive, &str, &str)] = &[
    (Primitive::Bool, "bool", "Boolean"),
    (Primitive::Byte, "byte", "Byte"),
    (Primitive::SByte, "sbyte", "SByte"),
    (Primitive::Short, "short", "Int16"),
    (Primitive::UShort, "ushort", "UInt16"),
    (Primitive::Int, "int", "Int32"),
    (Primitive::UInt, "uint", "UInt32"),
    (Primitive::Long, "long", "Int64"),
    (Primitive::ULong, "ulong", "UInt64"),
    (Primitive::Char, "char", "Char"),
    (Primitive::Float, "float", "Single"),
    (Primitive::Double, "double", "Double"),
    (Primitive::Decimal, "decimal", "Decimal"),
    (Primitive::String, "string", "String"),
    (Primitive::Object, "object", "Object"),
];

impl Primitive {
    pub fn keyword(self) -> &'static str {
        PRIMITIVE_NAMES
            .iter()
            .find(|(p, _, _)| *p == self)
            .map(|(_, keyword, _)| *keyword)
            .unwrap_or("object")
    }

    pub fn framework_name(self) -> &'static str {
        PRIMITIVE_NAMES
            .iter()
            .find(|(p, _, _)| *p == self)
            .map(|(_, _, name)| *name)
            .unwrap_or("Object")
    }

    pub fn from_keyword(keyword: &str) -> Option<Primitive> {
        PRIMITIVE_NAMES
            .iter()
            .find(|(_, k, _)| *k == keyword)
            .map(|(p, _, _)| *p)
    }

    /// `Int32` or `System.Int32`.
    pub fn from_framework_name(name: &str) -> Option<Primitive> {
        let name = name.strip_prefix("global::").unwrap_or(name);
        let name = name.strip_prefix("System.").unwrap_or(name);
        PRIMITIVE_NAMES
            .iter()
            .find(|(_, _, n)| *n == name)
            .map(|(p, _, _)| *p)
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, Primitive::Bool | Primitive::String | Primitive::Object)
    }

    fn is_signed_integral(self) -> bool {
        matches!(
            self,
            Primitive::SByte | Primitive::Short | Primitive::Int | Primitive::Long
        )
    }

    /// Implicit numeric conversion from `self` to `to`, identity excluded.
    fn widens_to(self, to: Primitive) -> bool {
        use Primitive::*;
        let targets: &[Primitive] = match self {
            SByte => &[Short, Int, Long, Float, Double, Decimal],
            Byte => &[Short, UShort, Int, UInt, Long, ULong, Float, Double, Decimal],
            Short => &[Int, Long, Float, Double, Decimal],
            UShort => &[Int, UInt, Long, ULong, Float, Double, Decimal],
            Int => &[Long, Float, Double, Decimal],
            UInt => &[Long, ULong, Float, Double, Decimal],
            Long | ULong => &[Float, Double, Decimal],
            Char => &[UShort, Int, UInt, Long, ULong, Float, Double, Decimal],
            Float => &[Double],
            _ => &[],
        };
        targets.contains(&to)
    }
}

/// The static type of an expression or declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Primitive(Primitive),
    Void,
    /// The type of the `null` literal.
    Null,
    /// A named type by its qualified name. Source types use the name of
    /// their declaration; types the model does not know keep the written
    /// name.
    Named(String),
    Array(Box<Type>),
    Nullable(Box<Type>),
    Tuple(Vec<Type>),
    Unknown,
}

impl Type {
    pub const INT: Type = Type::Primitive(Primitive::Int);
    pub const BOOL: Type = Type::Primitive(Primitive::Bool);
    pub const STRING: Type = Type::Primitive(Primitive::String);
    pub const OBJECT: Type = Type::Primitive(Primitive::Object);

    pub fn is_known(&self) -> bool {
        match self {
            Type::Unknown => false,
            Type::Array(inner) | Type::Nullable(inner) => inner.is_known(),
            Type::Tuple(items) => items.iter().all(Type::is_known),
            _ => true,
        }
    }

    pub fn as_primitive(&self) -> Option<Primitive> {
        match self {
            Type::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    /// True for types whose values can be `null` without `?`.
    fn is_reference_like(&self) -> bool {
        matches!(
            self,
            Type::Primitive(Primitive::String)
                | Type::Primitive(Primitive::Object)
                | Type::Named(_)
                | Type::Array(_)
                | Type::Nullable(_)
        )
    }

    /// Implicit conversion from `self` to `to`, identity included.
    ///
    /// Unknown types convert both ways so that code the model cannot type
    /// does not rule a candidate out.
    pub fn converts_to(&self, to: &Type) -> bool {
        if self == to || !self.is_known() || !to.is_known() {
            return true;
        }
        match (self, to) {
            (_, Type::Primitive(Primitive::Object)) => *self != Type::Void,
            (Type::Null, target) => target.is_reference_like(),
            (Type::Primitive(from), Type::Primitive(target)) => from.widens_to(*target),
            (from, Type::Nullable(inner)) => from.converts_to(inner),
            (Type::Tuple(from), Type::Tuple(target)) => {
                from.len() == target.len()
                    && from.iter().zip(target).all(|(f, t)| f.converts_to(t))
            }
            _ => false,
        }
    }

    /// Result type of an arithmetic operator applied to `self` and `other`.
    pub fn binary_numeric_promotion(&self, other: &Type) -> Type {
        use Primitive::*;
        let (Some(a), Some(b)) = (self.as_primitive(), other.as_primitive()) else {
            return Type::Unknown;
        };
        if !a.is_numeric() || !b.is_numeric() {
            return Type::Unknown;
        }
        let either = |p: Primitive| a == p || b == p;
        let promoted = if either(Decimal) {
            if either(Float) || either(Double) {
                return Type::Unknown;
            }
            Decimal
        } else if either(Double) {
            Double
        } else if either(Float) {
            Float
        } else if either(ULong) {
            if a.is_signed_integral() || b.is_signed_integral() {
                return Type::Unknown;
            }
            ULong
        } else if either(Long) {
            Long
        } else if either(UInt) {
            if a.is_signed_integral() || b.is_signed_integral() {
                Long
            } else {
                UInt
            }
        } else {
            Int
        };
        Type::Primitive(promoted)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(p) => f.write_str(p.keyword()),
            Type::Void => f.write_str("void"),
            Type::Null => f.write_str("null"),
            Type::Named(name) => f.write_str(name),
            Type::Array(inner) => write!(f, "{}[]", inner),
            Type::Nullable(inner) => write!(f, "{}?", inner),
            Type::Tuple(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
            Type::Unknown => f.write_str("?"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod names {
        use super::*;

        #[test]
        fn aliases_normalize_to_keywords() {
            assert_eq!(Primitive::from_framework_name("Int32"), Some(Primitive::Int));
            assert_eq!(
                Primitive::from_framework_name("System.Int32"),
                Some(Primitive::Int)
            );
            assert_eq!(Primitive::from_keyword("double"), Some(Primitive::Double));
            assert_eq!(Primitive::from_framework_name("Int128"), None);
            assert_eq!(Type::Primitive(Primitive::Float).to_string(), "float");
        }

        #[test]
        fn display_uses_keywords() {
            let t = Type::Array(Box::new(Type::Nullable(Box::new(Type::INT))));
            assert_eq!(t.to_string(), "int?[]");
            let t = Type::Tuple(vec![Type::INT, Type::STRING]);
            assert_eq!(t.to_string(), "(int, string)");
        }
    }

    mod conversions {
        use super::*;

        #[test]
        fn implicit_numeric_conversions() {
            let int = Type::INT;
            let double = Type::Primitive(Primitive::Double);
            let long = Type::Primitive(Primitive::Long);
            assert!(int.converts_to(&long));
            assert!(int.converts_to(&double));
            assert!(!double.converts_to(&int));
            assert!(!long.converts_to(&int));
            assert!(int.converts_to(&Type::OBJECT));
        }

        #[test]
        fn null_converts_to_reference_types_only() {
            assert!(Type::Null.converts_to(&Type::STRING));
            assert!(Type::Null.converts_to(&Type::Named("C".into())));
            assert!(!Type::Null.converts_to(&Type::INT));
            assert!(Type::Null.converts_to(&Type::Nullable(Box::new(Type::INT))));
        }

        #[test]
        fn unknown_is_lenient() {
            assert!(Type::Unknown.converts_to(&Type::INT));
            assert!(Type::INT.converts_to(&Type::Unknown));
        }

        #[test]
        fn numeric_promotion() {
            let double = Type::Primitive(Primitive::Double);
            let uint = Type::Primitive(Primitive::UInt);
            assert_eq!(double.binary_numeric_promotion(&Type::INT), double);
            assert_eq!(
                Type::Primitive(Primitive::Short).binary_numeric_promotion(&Type::INT),
                Type::INT
            );
            assert_eq!(
                uint.binary_numeric_promotion(&Type::INT),
                Type::Primitive(Primitive::Long)
            );
            assert_eq!(
                Type::Primitive(Primitive::Decimal)
                    .binary_numeric_promotion(&double),
                Type::Unknown
            );
            assert_eq!(Type::STRING.binary_numeric_promotion(&Type::INT), Type::Unknown);
        }
    }
}
