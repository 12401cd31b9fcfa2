//! Database schema produced by lowering: the input of DDL rendering and of
//! the JSON output.

use serde::Serialize;

use super::Dialect;
use crate::db::types::{IndexAlgorithm, ReferentialAction, SortOrder};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlSchema {
    pub dialect: Dialect,
    pub enums: Vec<EnumType>,
    /// Model tables in declaration order, then join tables.
    pub tables: Vec<Table>,
}

impl SqlSchema {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn foreign_key_count(&self) -> usize {
        self.tables.iter().map(|t| t.foreign_keys.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumType {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub primary_key: Option<PrimaryKey>,
    pub indexes: Vec<Index>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub arity: ColumnArity,
    pub default: Option<ColumnDefault>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum ColumnType {
    /// Built-in or native SQL type, e.g. `VARCHAR(32)`.
    Sql(String),
    /// A type created with `CREATE TYPE ... AS ENUM`.
    Enum(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnArity {
    Required,
    Nullable,
    List,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ColumnDefault {
    /// A SQL literal, already quoted.
    Value(String),
    Now,
    Autoincrement,
    Uuid,
    Cuid,
    DbGenerated(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrimaryKey {
    pub name: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Index {
    pub name: String,
    pub unique: bool,
    pub columns: Vec<IndexColumn>,
    pub algorithm: IndexAlgorithm,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexColumn {
    pub name: String,
    pub sort: Option<SortOrder>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForeignKey {
    pub name: String,
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    pub on_delete: ReferentialAction,
    pub on_update: ReferentialAction,
}
