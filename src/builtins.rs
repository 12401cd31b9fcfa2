//! Built-in scalar types and reserved words.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuiltInScalar {
    Int,
    BigInt,
    Float,
    Decimal,
    String,
    Bool,
    DateTime,
    Date,
    Time,
    Bytes,
}

/// Canonical name and accepted aliases for every built-in scalar.
static SCALARS: &[(BuiltInScalar, &str, &[&str])] = &[
    (BuiltInScalar::Int, "int", &["Int"]),
    (BuiltInScalar::BigInt, "bigint", &["BigInt"]),
    (BuiltInScalar::Float, "float", &["Float"]),
    (BuiltInScalar::Decimal, "decimal", &["Decimal"]),
    (BuiltInScalar::String, "string", &["String"]),
    (BuiltInScalar::Bool, "bool", &["Bool", "Boolean"]),
    (BuiltInScalar::DateTime, "datetime", &["DateTime"]),
    (BuiltInScalar::Date, "date", &["Date"]),
    (BuiltInScalar::Time, "time", &["Time"]),
    (BuiltInScalar::Bytes, "bytes", &["Bytes"]),
];

/// Literal keywords that can never name a declaration.
pub static RESERVED_WORDS: &[&str] = &["true", "false", "null"];

impl BuiltInScalar {
    pub const ALL: [BuiltInScalar; 10] = [
        BuiltInScalar::Int,
        BuiltInScalar::BigInt,
        BuiltInScalar::Float,
        BuiltInScalar::Decimal,
        BuiltInScalar::String,
        BuiltInScalar::Bool,
        BuiltInScalar::DateTime,
        BuiltInScalar::Date,
        BuiltInScalar::Time,
        BuiltInScalar::Bytes,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        SCALARS
            .iter()
            .find(|(_, canonical, aliases)| *canonical == name || aliases.contains(&name))
            .map(|(scalar, _, _)| *scalar)
    }

    pub fn name(self) -> &'static str {
        SCALARS
            .iter()
            .find(|(scalar, _, _)| *scalar == self)
            .map(|(_, name, _)| *name)
            .unwrap_or("unknown")
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            BuiltInScalar::Int | BuiltInScalar::BigInt | BuiltInScalar::Float | BuiltInScalar::Decimal
        )
    }

    pub fn is_integer(self) -> bool {
        matches!(self, BuiltInScalar::Int | BuiltInScalar::BigInt)
    }

    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            BuiltInScalar::DateTime | BuiltInScalar::Date | BuiltInScalar::Time
        )
    }
}

impl fmt::Display for BuiltInScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn is_builtin_type_name(name: &str) -> bool {
    BuiltInScalar::from_name(name).is_some()
}

pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(BuiltInScalar::from_name("int"), Some(BuiltInScalar::Int));
        assert_eq!(BuiltInScalar::from_name("DateTime"), Some(BuiltInScalar::DateTime));
        assert_eq!(BuiltInScalar::from_name("Boolean"), Some(BuiltInScalar::Bool));
        assert_eq!(BuiltInScalar::from_name("User"), None);
    }

    #[test]
    fn test_names_round_trip() {
        for scalar in BuiltInScalar::ALL {
            assert_eq!(BuiltInScalar::from_name(scalar.name()), Some(scalar));
        }
    }

    #[test]
    fn test_reserved() {
        assert!(is_reserved_word("null"));
        assert!(!is_reserved_word("nil"));
        assert!(is_builtin_type_name("bytes"));
    }
}
