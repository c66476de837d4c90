//! Closed vocabulary of field kinds the runtime understands

use serde::Serialize;
use std::fmt;

/// Field type tag, in the order of the runtime header's `StructFieldType`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeTag {
    #[serde(rename = "TYPE_INT")]
    Int,
    #[serde(rename = "TYPE_LONG")]
    Long,
    #[serde(rename = "TYPE_SHORT")]
    Short,
    #[serde(rename = "TYPE_FLOAT")]
    Float,
    #[serde(rename = "TYPE_DOUBLE")]
    Double,
    #[serde(rename = "TYPE_CSTRING")]
    CString,
    #[serde(rename = "TYPE_STRUCT")]
    Struct,
    #[serde(rename = "TYPE_ENUM")]
    Enum,
}

impl TypeTag {
    pub const ALL: [TypeTag; 8] = [
        TypeTag::Int,
        TypeTag::Long,
        TypeTag::Short,
        TypeTag::Float,
        TypeTag::Double,
        TypeTag::CString,
        TypeTag::Struct,
        TypeTag::Enum,
    ];

    /// Map a canonical, unqualified type spelling to its tag.
    ///
    /// Struct and enum types are classified by kind rather than by name,
    /// so only the scalar vocabulary is recognised here.
    pub fn from_type_name(name: &str) -> Option<TypeTag> {
        match name {
            "int" | "signed" | "signed int" | "unsigned" | "unsigned int" | "int32_t"
            | "uint32_t" => Some(TypeTag::Int),
            "short" | "unsigned short" | "int16_t" | "uint16_t" => Some(TypeTag::Short),
            "long" | "unsigned long" | "long long" | "unsigned long long" | "int64_t"
            | "uint64_t" => Some(TypeTag::Long),
            "float" => Some(TypeTag::Float),
            "double" => Some(TypeTag::Double),
            "char *" | "cstring" => Some(TypeTag::CString),
            _ => None,
        }
    }

    /// The C enumerator for this tag, e.g. `TYPE_CSTRING`
    pub fn c_enumerator(self) -> &'static str {
        match self {
            TypeTag::Int => "TYPE_INT",
            TypeTag::Long => "TYPE_LONG",
            TypeTag::Short => "TYPE_SHORT",
            TypeTag::Float => "TYPE_FLOAT",
            TypeTag::Double => "TYPE_DOUBLE",
            TypeTag::CString => "TYPE_CSTRING",
            TypeTag::Struct => "TYPE_STRUCT",
            TypeTag::Enum => "TYPE_ENUM",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.c_enumerator())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_vocabulary() {
        assert_eq!(TypeTag::from_type_name("int"), Some(TypeTag::Int));
        assert_eq!(TypeTag::from_type_name("unsigned int"), Some(TypeTag::Int));
        assert_eq!(TypeTag::from_type_name("uint16_t"), Some(TypeTag::Short));
        assert_eq!(TypeTag::from_type_name("long long"), Some(TypeTag::Long));
        assert_eq!(TypeTag::from_type_name("double"), Some(TypeTag::Double));
        assert_eq!(TypeTag::from_type_name("char *"), Some(TypeTag::CString));
    }

    #[test]
    fn test_unknown_spellings_are_rejected() {
        for name in ["char", "_Bool", "long double", "void *", "int *", "size_t", "struct Vec3d"] {
            assert_eq!(TypeTag::from_type_name(name), None, "{name}");
        }
    }

    #[test]
    fn test_enumerators_follow_header_order() {
        let names: Vec<_> = TypeTag::ALL.iter().map(|t| t.c_enumerator()).collect();
        assert_eq!(
            names,
            vec![
                "TYPE_INT",
                "TYPE_LONG",
                "TYPE_SHORT",
                "TYPE_FLOAT",
                "TYPE_DOUBLE",
                "TYPE_CSTRING",
                "TYPE_STRUCT",
                "TYPE_ENUM",
            ]
        );
    }
}
