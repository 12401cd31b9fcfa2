pub mod ast;
pub mod builtins;
pub mod config;
pub mod db;
pub mod diagnostics;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod sql;
pub mod validate;

use std::path::PathBuf;

use tracing::{debug, debug_span};
use wasm_bindgen::prelude::*;

use ast::SchemaAst;
use config::CompileOptions;
use db::ParserDatabase;
use diagnostics::Diagnostics;
use span::{FileId, SourceFile};
use sql::SqlSchema;

/// Errors raised outside of the schema itself.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("the schema has {0} error(s)")]
    HasErrors(usize),
    #[error("invalid variable {0:?}, expected KEY=VALUE")]
    InvalidVariable(String),
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot serialize the schema: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result of compiling one set of source files.
pub struct Compilation {
    pub files: Vec<SourceFile>,
    /// `None` when name resolution failed.
    pub db: Option<ParserDatabase>,
    pub diagnostics: Diagnostics,
}

impl Compilation {
    pub fn has_errors(&self) -> bool {
        self.db.is_none() || self.diagnostics.has_errors()
    }

    pub fn render_diagnostics(&self) -> String {
        self.diagnostics.render(&self.files)
    }

    /// Lower the schema. Refused while there are errors.
    pub fn lift(&self) -> Result<SqlSchema, CompileError> {
        match &self.db {
            Some(db) if !self.diagnostics.has_errors() => Ok(sql::lift(db)),
            _ => Err(CompileError::HasErrors(self.diagnostics.error_count().max(1))),
        }
    }
}

/// Compile a single in-memory schema with default options.
pub fn compile(source: &str) -> Compilation {
    compile_files(
        vec![SourceFile::new("schema.ksl", source)],
        &CompileOptions::new(),
    )
}

/// Compile several files as one schema.
pub fn compile_files(files: Vec<SourceFile>, options: &CompileOptions) -> Compilation {
    let _span = debug_span!("compile", files = files.len()).entered();

    let mut diagnostics = Diagnostics::new();
    let mut tops = Vec::new();
    for (i, file) in files.iter().enumerate() {
        let (file_tops, diags) = parser::parse(&file.contents, FileId(i as u32));
        tops.extend(file_tops);
        diagnostics.extend(diags);
    }

    let db = ParserDatabase::new(SchemaAst { tops }, options, &mut diagnostics);
    if let Some(db) = &db {
        validate::validate(db, &mut diagnostics);
    }

    debug!(
        diagnostics = diagnostics.len(),
        errors = diagnostics.error_count(),
        "compiled"
    );
    Compilation {
        files,
        db,
        diagnostics,
    }
}

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Compile KSL source to DDL, or return the rendered diagnostics.
#[wasm_bindgen(js_name = "kslToSql")]
pub fn ksl_to_sql(source: &str) -> Result<String, String> {
    let compilation = compile(source);
    match compilation.lift() {
        Ok(schema) => Ok(sql::render(&schema)),
        Err(CompileError::HasErrors(_)) => Err(compilation.render_diagnostics()),
        Err(err) => Err(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::sql::{ColumnType, Dialect};

    const SHOP: &str = r#"
enum Status {
  DRAFT
  LIVE
}

model Product {
  id     int    @id
  sku    string
  region string
  status Status @default(DRAFT)

  @@unique([region, sku])
}
"#;

    #[test]
    fn test_compile_is_deterministic() {
        let first = compile(SHOP);
        let second = compile(SHOP);
        assert_eq!(first.diagnostics, second.diagnostics);
        assert_eq!(first.lift().unwrap(), second.lift().unwrap());
    }

    #[test]
    fn test_duplicate_model_names() {
        let compilation = compile("model User {\n  id int @id\n}\nmodel User {\n  id int @id\n}\n");
        let duplicates: Vec<_> = compilation.diagnostics.with_summary("Duplicate name").collect();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].subject.start.line, 4);

        let renamed = compile("model User {\n  id int @id\n}\nmodel Account {\n  id int @id\n}\n");
        assert!(!renamed.has_errors(), "{}", renamed.render_diagnostics());
    }

    #[test]
    fn test_lift_single_model() {
        let schema = compile(SHOP).lift().unwrap();
        assert_eq!(schema.tables.len(), 1);

        let table = &schema.tables[0];
        assert_eq!(table.columns.len(), 4);
        assert_eq!(
            table.column("status").unwrap().column_type,
            ColumnType::Enum("Status".into())
        );
        assert_eq!(table.indexes.len(), 1);
        let index = &table.indexes[0];
        assert_eq!(index.name, "Product_region_sku_key");
        assert!(index.unique);
        let columns: Vec<_> = index.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(columns, vec!["region", "sku"]);
        assert_eq!(schema.foreign_key_count(), 0);
    }

    #[test]
    fn test_name_errors_stop_the_pipeline() {
        let compilation = compile("model A {\n  id int @id\n}\nenum A {\n  X\n}\n");
        assert!(compilation.db.is_none());
        assert!(compilation.has_errors());
        assert!(matches!(compilation.lift(), Err(CompileError::HasErrors(_))));
    }

    #[test]
    fn test_compile_files_with_options() {
        let files = vec![
            SourceFile::new("user.ksl", "model User {\n  id int @id\n  posts Post[]\n}\n"),
            SourceFile::new(
                "post.ksl",
                "model Post {\n  id int @id\n  userId int\n  user User @ref(fields: [userId], references: [id])\n}\n",
            ),
        ];
        let options = CompileOptions::new().with_dialect(Dialect::Sqlite);
        let compilation = compile_files(files, &options);
        assert!(!compilation.has_errors(), "{}", compilation.render_diagnostics());

        let schema = compilation.lift().unwrap();
        assert_eq!(schema.dialect, Dialect::Sqlite);
        assert_eq!(schema.foreign_key_count(), 1);
    }

    #[test]
    fn test_ignored_foreign_key_column_is_rejected() {
        let src = "model User {\n  id int @id\n  posts Post[]\n}\nmodel Post {\n  id int @id\n  authorId int @ignore\n  author User @ref(fields: [authorId], references: [id])\n}\n";
        let compilation = compile(src);
        assert!(compilation.has_errors());
        assert!(matches!(compilation.lift(), Err(CompileError::HasErrors(1))));
    }

    #[test]
    fn test_ksl_to_sql() {
        let ddl = ksl_to_sql("model A {\n  id int @id\n}\n").unwrap();
        assert!(ddl.contains("CREATE TABLE \"A\""));

        let err = ksl_to_sql("model A {\n  id int @id\n  b B\n}\n").unwrap_err();
        assert!(err.contains("error:"), "{err}");
    }
}
