//! Scalar to SQL type mapping and native type definitions.

use super::Dialect;
use crate::builtins::BuiltInScalar;

/// Default column type for a built-in scalar.
pub fn default_sql_type(scalar: BuiltInScalar, dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Postgres => map_postgres_type(scalar),
        Dialect::Sqlite => map_sqlite_type(scalar),
    }
}

fn map_postgres_type(scalar: BuiltInScalar) -> &'static str {
    match scalar {
        BuiltInScalar::Int => "INTEGER",
        BuiltInScalar::BigInt => "BIGINT",
        BuiltInScalar::Float => "DOUBLE PRECISION",
        BuiltInScalar::Decimal => "DECIMAL(65,30)",
        BuiltInScalar::String => "TEXT",
        BuiltInScalar::Bool => "BOOLEAN",
        BuiltInScalar::DateTime => "TIMESTAMP(3)",
        BuiltInScalar::Date => "DATE",
        BuiltInScalar::Time => "TIME(3)",
        BuiltInScalar::Bytes => "BYTEA",
    }
}

fn map_sqlite_type(scalar: BuiltInScalar) -> &'static str {
    match scalar {
        BuiltInScalar::Int | BuiltInScalar::BigInt => "INTEGER",
        BuiltInScalar::Float => "REAL",
        BuiltInScalar::Decimal => "DECIMAL",
        BuiltInScalar::String => "TEXT",
        BuiltInScalar::Bool => "BOOLEAN",
        BuiltInScalar::DateTime => "DATETIME",
        BuiltInScalar::Date => "DATE",
        BuiltInScalar::Time => "TIME",
        BuiltInScalar::Bytes => "BLOB",
    }
}

/// A native type usable as `@db.<name>(args)`.
#[derive(Debug)]
pub struct NativeTypeSpec {
    pub name: &'static str,
    pub sql_name: &'static str,
    /// Accepted argument counts.
    pub arities: &'static [usize],
    /// Scalars the native type can store.
    pub scalars: &'static [BuiltInScalar],
}

impl NativeTypeSpec {
    pub fn render(&self, args: &[String]) -> String {
        if args.is_empty() {
            self.sql_name.to_string()
        } else {
            format!("{}({})", self.sql_name, args.join(","))
        }
    }

    pub fn supports(&self, scalar: BuiltInScalar) -> bool {
        self.scalars.contains(&scalar)
    }
}

use BuiltInScalar as S;

macro_rules! native {
    ($name:literal, $sql:literal, [$($n:literal),*], [$($s:ident),*]) => {
        NativeTypeSpec {
            name: $name,
            sql_name: $sql,
            arities: &[$($n),*],
            scalars: &[$(S::$s),*],
        }
    };
}

static POSTGRES_NATIVE_TYPES: &[NativeTypeSpec] = &[
    native!("Text", "TEXT", [0], [String]),
    native!("Char", "CHAR", [0, 1], [String]),
    native!("VarChar", "VARCHAR", [0, 1], [String]),
    native!("Bit", "BIT", [0, 1], [String]),
    native!("VarBit", "VARBIT", [0, 1], [String]),
    native!("Uuid", "UUID", [0], [String]),
    native!("Xml", "XML", [0], [String]),
    native!("Inet", "INET", [0], [String]),
    native!("Citext", "CITEXT", [0], [String]),
    native!("Json", "JSON", [0], [String]),
    native!("JsonB", "JSONB", [0], [String]),
    native!("Boolean", "BOOLEAN", [0], [Bool]),
    native!("SmallInt", "SMALLINT", [0], [Int]),
    native!("Integer", "INTEGER", [0], [Int]),
    native!("Oid", "OID", [0], [Int]),
    native!("BigInt", "BIGINT", [0], [BigInt]),
    native!("Real", "REAL", [0], [Float]),
    native!("DoublePrecision", "DOUBLE PRECISION", [0], [Float]),
    native!("Decimal", "DECIMAL", [0, 2], [Decimal]),
    native!("Money", "MONEY", [0], [Decimal]),
    native!("Timestamp", "TIMESTAMP", [0, 1], [DateTime]),
    native!("Timestamptz", "TIMESTAMPTZ", [0, 1], [DateTime]),
    native!("Date", "DATE", [0], [DateTime, Date]),
    native!("Time", "TIME", [0, 1], [DateTime, Time]),
    native!("Timetz", "TIMETZ", [0, 1], [DateTime, Time]),
    native!("ByteA", "BYTEA", [0], [Bytes]),
];

static SQLITE_NATIVE_TYPES: &[NativeTypeSpec] = &[
    native!("Text", "TEXT", [0], [String]),
    native!("Integer", "INTEGER", [0], [Int, BigInt, Bool]),
    native!("Real", "REAL", [0], [Float]),
    native!("Numeric", "NUMERIC", [0, 2], [Decimal]),
    native!("Blob", "BLOB", [0], [Bytes]),
];

pub fn native_types(dialect: Dialect) -> &'static [NativeTypeSpec] {
    match dialect {
        Dialect::Postgres => POSTGRES_NATIVE_TYPES,
        Dialect::Sqlite => SQLITE_NATIVE_TYPES,
    }
}

pub fn find_native_type(dialect: Dialect, name: &str) -> Option<&'static NativeTypeSpec> {
    native_types(dialect).iter().find(|t| t.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_types() {
        assert_eq!(default_sql_type(S::Float, Dialect::Postgres), "DOUBLE PRECISION");
        assert_eq!(default_sql_type(S::DateTime, Dialect::Postgres), "TIMESTAMP(3)");
        assert_eq!(default_sql_type(S::Bytes, Dialect::Postgres), "BYTEA");
    }

    #[test]
    fn test_sqlite_types() {
        assert_eq!(default_sql_type(S::BigInt, Dialect::Sqlite), "INTEGER");
        assert_eq!(default_sql_type(S::Bytes, Dialect::Sqlite), "BLOB");
    }

    #[test]
    fn test_native_types() {
        let varchar = find_native_type(Dialect::Postgres, "VarChar").unwrap();
        assert!(varchar.supports(S::String));
        assert!(!varchar.supports(S::Int));
        assert_eq!(varchar.render(&["32".into()]), "VARCHAR(32)");
        assert!(find_native_type(Dialect::Sqlite, "VarChar").is_none());
        assert_eq!(
            find_native_type(Dialect::Postgres, "Decimal").unwrap().arities,
            &[0, 2]
        );
    }
}
