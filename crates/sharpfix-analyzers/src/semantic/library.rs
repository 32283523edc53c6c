//! Metadata for the library types the analyzers know without source.

use crate::semantic::types::{Primitive, Type};

/// A static library method: name, parameter types and return type.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryMethod {
    pub name: String,
    pub parameters: Vec<Type>,
    pub return_type: Type,
}

/// A library type with static methods only.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryType {
    pub namespace: &'static str,
    pub name: &'static str,
    pub methods: Vec<LibraryMethod>,
}

/// Every primitive a conversion accepts.
const CONVERTIBLE: &[Primitive] = &[
    Primitive::Bool,
    Primitive::Byte,
    Primitive::Char,
    Primitive::Decimal,
    Primitive::Double,
    Primitive::Float,
    Primitive::Int,
    Primitive::Long,
    Primitive::Object,
    Primitive::SByte,
    Primitive::Short,
    Primitive::String,
    Primitive::UInt,
    Primitive::ULong,
    Primitive::UShort,
];

/// `System.Convert.ToX` and the primitive each one returns.
const CONVERSIONS: &[(&str, Primitive)] = &[
    ("ToBoolean", Primitive::Bool),
    ("ToByte", Primitive::Byte),
    ("ToChar", Primitive::Char),
    ("ToDecimal", Primitive::Decimal),
    ("ToDouble", Primitive::Double),
    ("ToInt16", Primitive::Short),
    ("ToInt32", Primitive::Int),
    ("ToInt64", Primitive::Long),
    ("ToSByte", Primitive::SByte),
    ("ToSingle", Primitive::Float),
    ("ToString", Primitive::String),
    ("ToUInt16", Primitive::UShort),
    ("ToUInt32", Primitive::UInt),
    ("ToUInt64", Primitive::ULong),
];

/// `System.Convert`: one overload of each conversion per convertible
/// primitive.
pub fn system_convert() -> LibraryType {
    let methods = CONVERSIONS
        .iter()
        .flat_map(|&(name, returns)| {
            CONVERTIBLE.iter().map(move |&from| LibraryMethod {
                name: name.to_string(),
                parameters: vec![Type::Primitive(from)],
                return_type: Type::Primitive(returns),
            })
        })
        .collect();
    LibraryType {
        namespace: "System",
        name: "Convert",
        methods,
    }
}

/// All library types, in registration order.
pub fn library_types() -> Vec<LibraryType> {
    vec![system_convert()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_has_an_overload_per_primitive() {
        let convert = system_convert();
        let to_int32: Vec<_> = convert
            .methods
            .iter()
            .filter(|m| m.name == "ToInt32")
            .collect();
        assert_eq!(to_int32.len(), CONVERTIBLE.len());
        assert!(to_int32
            .iter()
            .all(|m| m.return_type == Type::INT && m.parameters.len() == 1));
        assert!(to_int32
            .iter()
            .any(|m| m.parameters[0] == Type::STRING));
    }

    #[test]
    fn convert_lives_in_system() {
        let types = library_types();
        assert_eq!(types.len(), 1);
        assert_eq!(types[0].namespace, "System");
        assert_eq!(types[0].name, "Convert");
    }
}
