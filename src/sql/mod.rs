//! Lowering to database schemas and DDL rendering.

mod dialect;
mod lift;
mod render;
mod schema;
pub mod types;

pub use dialect::{Dialect, UnknownDialect};
pub use lift::lift;
pub use render::render;
pub use schema::{
    Column, ColumnArity, ColumnDefault, ColumnType, EnumType, ForeignKey, Index, IndexColumn,
    PrimaryKey, SqlSchema, Table,
};
