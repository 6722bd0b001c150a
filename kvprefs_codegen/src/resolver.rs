use crate::model::TypeRef;
use std::fmt;

/// Encodings the storage engine supports natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoragePrimitive {
    Boolean,
    Integer,
    Long,
    Float,
    Double,
    ByteSequence,
    Text,
    TextSet,
}

impl StoragePrimitive {
    /// Kinds whose absence is reported by the engine itself (`None`).
    pub fn is_existence_checked(self) -> bool {
        matches!(self, Self::ByteSequence | Self::Text | Self::TextSet)
    }

    /// Kinds detected as absent through a reserved fallback value.
    pub fn uses_sentinel(self) -> bool {
        matches!(self, Self::Integer | Self::Long | Self::Float | Self::Double)
    }

    /// Suffix of the engine's `decode_*`/`encode_*` methods.
    pub fn method_suffix(self) -> &'static str {
        match self {
            Self::Boolean => "bool",
            Self::Integer => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::ByteSequence => "bytes",
            Self::Text => "string",
            Self::TextSet => "string_set",
        }
    }
}

impl fmt::Display for StoragePrimitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Boolean => "Boolean",
            Self::Integer => "Integer",
            Self::Long => "Long",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::ByteSequence => "ByteSequence",
            Self::Text => "Text",
            Self::TextSet => "TextSet",
        };
        f.write_str(name)
    }
}

/// Maps a declared type onto a storage primitive, ignoring nullability.
pub fn resolve(ty: &TypeRef) -> Option<StoragePrimitive> {
    let name = ty.name()?;
    let args = ty.args();
    match (name, args) {
        ("bool", []) => Some(StoragePrimitive::Boolean),
        ("i32", []) => Some(StoragePrimitive::Integer),
        ("i64", []) => Some(StoragePrimitive::Long),
        ("f32", []) => Some(StoragePrimitive::Float),
        ("f64", []) => Some(StoragePrimitive::Double),
        ("String", []) => Some(StoragePrimitive::Text),
        ("Vec", [element]) if !element.nullable && element.key() == "u8" => {
            Some(StoragePrimitive::ByteSequence)
        }
        ("HashSet" | "BTreeSet", [element]) if !element.nullable && element.key() == "String" => {
            Some(StoragePrimitive::TextSet)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve_str(text: &str) -> Option<StoragePrimitive> {
        resolve(&TypeRef::from_type(&syn::parse_str(text).unwrap()))
    }

    #[test]
    fn scalar_and_sequence_types() {
        assert_eq!(resolve_str("bool"), Some(StoragePrimitive::Boolean));
        assert_eq!(resolve_str("i32"), Some(StoragePrimitive::Integer));
        assert_eq!(resolve_str("Option<i64>"), Some(StoragePrimitive::Long));
        assert_eq!(resolve_str("f32"), Some(StoragePrimitive::Float));
        assert_eq!(resolve_str("f64"), Some(StoragePrimitive::Double));
        assert_eq!(resolve_str("Vec<u8>"), Some(StoragePrimitive::ByteSequence));
        assert_eq!(resolve_str("std::string::String"), Some(StoragePrimitive::Text));
    }

    #[test]
    fn only_text_sets_map_to_text_set() {
        assert_eq!(resolve_str("HashSet<String>"), Some(StoragePrimitive::TextSet));
        assert_eq!(resolve_str("std::collections::BTreeSet<String>"), Some(StoragePrimitive::TextSet));
        assert_eq!(resolve_str("HashSet<i32>"), None);
        assert_eq!(resolve_str("HashSet<Option<String>>"), None);
    }

    #[test]
    fn everything_else_has_no_mapping() {
        assert_eq!(resolve_str("u32"), None);
        assert_eq!(resolve_str("Vec<i32>"), None);
        assert_eq!(resolve_str("chrono::NaiveDate"), None);
    }
}
