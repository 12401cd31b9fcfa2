//! SQL dialects a schema can be lowered to.

use std::fmt;
use std::str::FromStr;

/// SQL dialect variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// PostgreSQL
    #[default]
    Postgres,
    /// SQLite
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dialect {0:?}, expected postgres or sqlite")]
pub struct UnknownDialect(pub String);

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "sqlite" => Ok(Self::Sqlite),
            _ => Err(UnknownDialect(s.to_string())),
        }
    }
}

crate::eval::from_value_by_name!(Dialect, "backend name");

impl Dialect {
    pub fn name(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Longest identifier the database accepts. Generated constraint names
    /// are truncated to it.
    pub fn max_identifier_length(self) -> usize {
        63
    }

    /// Whether enums are real database types rather than text columns.
    pub fn supports_enums(self) -> bool {
        matches!(self, Self::Postgres)
    }

    pub fn supports_scalar_lists(self) -> bool {
        matches!(self, Self::Postgres)
    }

    /// Whether index algorithms other than BTree can be requested.
    pub fn supports_index_algorithms(self) -> bool {
        matches!(self, Self::Postgres)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!("postgres".parse::<Dialect>(), Ok(Dialect::Postgres));
        assert_eq!("PostgreSQL".parse::<Dialect>(), Ok(Dialect::Postgres));
        assert_eq!("sqlite".parse::<Dialect>(), Ok(Dialect::Sqlite));
        assert!("mysql".parse::<Dialect>().is_err());
    }

    #[test]
    fn test_capabilities() {
        assert!(Dialect::Postgres.supports_enums());
        assert!(!Dialect::Sqlite.supports_enums());
        assert!(!Dialect::Sqlite.supports_scalar_lists());
        assert_eq!(Dialect::default(), Dialect::Postgres);
    }
}
