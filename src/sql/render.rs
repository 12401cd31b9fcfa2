//! DDL rendering of a lowered schema.

use super::schema::{
    Column, ColumnArity, ColumnDefault, ColumnType, EnumType, ForeignKey, Index, SqlSchema, Table,
};
use super::Dialect;
use crate::db::types::{IndexAlgorithm, SortOrder};

/// Render `schema` as DDL statements for its dialect.
pub fn render(schema: &SqlSchema) -> String {
    let dialect = schema.dialect;
    let mut output = String::new();

    if dialect.supports_enums() {
        for enm in &schema.enums {
            output.push_str("-- CreateEnum\n");
            render_enum(&mut output, enm);
            output.push('\n');
        }
    }

    for table in &schema.tables {
        output.push_str("-- CreateTable\n");
        render_table(&mut output, table, dialect);
        output.push('\n');
    }

    for table in &schema.tables {
        for index in &table.indexes {
            output.push_str("-- CreateIndex\n");
            render_index(&mut output, &table.name, index, dialect);
            output.push('\n');
        }
    }

    // SQLite cannot add constraints to an existing table.
    if dialect == Dialect::Postgres {
        for table in &schema.tables {
            for fk in &table.foreign_keys {
                output.push_str("-- AddForeignKey\n");
                output.push_str(&format!(
                    "ALTER TABLE {} ADD {};\n",
                    quote_ident(&table.name),
                    foreign_key_clause(fk)
                ));
                output.push('\n');
            }
        }
    }

    let trimmed = output.trim_end().len();
    output.truncate(trimmed);
    output.push('\n');
    output
}

fn render_enum(output: &mut String, enm: &EnumType) {
    let values: Vec<String> = enm.values.iter().map(|v| quote_string(v)).collect();
    output.push_str(&format!(
        "CREATE TYPE {} AS ENUM ({});\n",
        quote_ident(&enm.name),
        values.join(", ")
    ));
}

fn render_table(output: &mut String, table: &Table, dialect: Dialect) {
    let inline_pk = inline_primary_key(table, dialect);

    let columns: Vec<String> = table
        .columns
        .iter()
        .map(|column| {
            let inline = inline_pk == Some(column.name.as_str());
            format!("    {}", render_column(column, dialect, inline))
        })
        .collect();

    let mut constraints = Vec::new();
    if let Some(pk) = table.primary_key.as_ref().filter(|_| inline_pk.is_none()) {
        constraints.push(format!(
            "    CONSTRAINT {} PRIMARY KEY ({})",
            quote_ident(&pk.name),
            column_list(&pk.columns)
        ));
    }
    if dialect == Dialect::Sqlite {
        for fk in &table.foreign_keys {
            constraints.push(format!("    {}", foreign_key_clause(fk)));
        }
    }

    output.push_str(&format!("CREATE TABLE {} (\n", quote_ident(&table.name)));
    output.push_str(&columns.join(",\n"));
    if !constraints.is_empty() {
        output.push_str(",\n\n");
        output.push_str(&constraints.join(",\n"));
    }
    output.push_str("\n);\n");
}

/// The column rendered as `PRIMARY KEY AUTOINCREMENT` on SQLite.
fn inline_primary_key(table: &Table, dialect: Dialect) -> Option<&str> {
    if dialect != Dialect::Sqlite {
        return None;
    }
    let [column] = table.primary_key.as_ref()?.columns.as_slice() else {
        return None;
    };
    table
        .column(column)
        .filter(|c| c.default == Some(ColumnDefault::Autoincrement))
        .map(|c| c.name.as_str())
}

fn render_column(column: &Column, dialect: Dialect, inline_pk: bool) -> String {
    let mut line = format!("{} ", quote_ident(&column.name));
    match &column.column_type {
        ColumnType::Sql(sql) => line.push_str(sql),
        ColumnType::Enum(name) => line.push_str(&quote_ident(name)),
    }
    match column.arity {
        ColumnArity::Required => line.push_str(" NOT NULL"),
        ColumnArity::Nullable => {}
        ColumnArity::List => line.push_str("[]"),
    }
    if inline_pk {
        line.push_str(" PRIMARY KEY AUTOINCREMENT");
    } else if let Some(default) = &column.default {
        line.push_str(&default_clause(default, dialect));
    }
    line
}

fn default_clause(default: &ColumnDefault, dialect: Dialect) -> String {
    match default {
        ColumnDefault::Value(value) => format!(" DEFAULT {value}"),
        ColumnDefault::Now => " DEFAULT CURRENT_TIMESTAMP".to_string(),
        ColumnDefault::Autoincrement if dialect == Dialect::Postgres => {
            " GENERATED BY DEFAULT AS IDENTITY".to_string()
        }
        ColumnDefault::DbGenerated(Some(sql)) => format!(" DEFAULT ({sql})"),
        // Generated by clients.
        ColumnDefault::Uuid | ColumnDefault::Cuid => String::new(),
        ColumnDefault::Autoincrement | ColumnDefault::DbGenerated(None) => String::new(),
    }
}

fn render_index(output: &mut String, table: &str, index: &Index, dialect: Dialect) {
    let columns: Vec<String> = index
        .columns
        .iter()
        .map(|column| match column.sort {
            Some(SortOrder::Desc) => format!("{} DESC", quote_ident(&column.name)),
            Some(SortOrder::Asc) => format!("{} ASC", quote_ident(&column.name)),
            None => quote_ident(&column.name),
        })
        .collect();
    let using = if dialect.supports_index_algorithms() && index.algorithm != IndexAlgorithm::BTree {
        format!(" USING {} ", index.algorithm.sql_name())
    } else {
        String::new()
    };
    output.push_str(&format!(
        "CREATE {}INDEX {} ON {}{using}({});\n",
        if index.unique { "UNIQUE " } else { "" },
        quote_ident(&index.name),
        quote_ident(table),
        columns.join(", ")
    ));
}

fn foreign_key_clause(fk: &ForeignKey) -> String {
    format!(
        "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({}) ON DELETE {} ON UPDATE {}",
        quote_ident(&fk.name),
        column_list(&fk.columns),
        quote_ident(&fk.referenced_table),
        column_list(&fk.referenced_columns),
        fk.on_delete.sql(),
        fk.on_update.sql()
    )
}

fn column_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub(super) fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::compile;

    fn ddl(src: &str) -> String {
        let compilation = compile(src);
        assert!(!compilation.has_errors(), "{}", compilation.render_diagnostics());
        render(&compilation.lift().unwrap())
    }

    #[test]
    fn test_render_postgres() {
        let result = ddl(r#"
enum Role {
  USER
  ADMIN
}

model User {
  id    int    @id @default(autoincrement())
  email string @unique
  role  Role   @default(USER)
  tags  string[]
  posts Post[]
}

model Post {
  id       int    @id
  title    string
  authorId int
  author   User   @ref(fields: [authorId], references: [id], onDelete: Cascade)

  @@index([title(sort: Desc)], type: Hash)
}
"#);
        assert!(result.contains("CREATE TYPE \"Role\" AS ENUM ('USER', 'ADMIN');"));
        assert!(result.contains("\"id\" INTEGER NOT NULL GENERATED BY DEFAULT AS IDENTITY,"));
        assert!(result.contains("\"role\" \"Role\" NOT NULL DEFAULT 'USER',"));
        assert!(result.contains("\"tags\" TEXT[],"));
        assert!(result.contains("CONSTRAINT \"User_pkey\" PRIMARY KEY (\"id\")"));
        assert!(result.contains("CREATE UNIQUE INDEX \"User_email_key\" ON \"User\"(\"email\");"));
        assert!(result.contains(
            "CREATE INDEX \"Post_title_idx\" ON \"Post\" USING HASH (\"title\" DESC);"
        ));
        assert!(result.contains(
            "ALTER TABLE \"Post\" ADD CONSTRAINT \"Post_authorId_fkey\" FOREIGN KEY (\"authorId\") REFERENCES \"User\"(\"id\") ON DELETE CASCADE ON UPDATE CASCADE;"
        ));
        assert!(result.ends_with(";\n"));
    }

    #[test]
    fn test_render_table_layout() {
        let result = ddl("model A {\n  id int @id\n  name string?\n}\n");
        assert_eq!(
            result,
            "-- CreateTable\nCREATE TABLE \"A\" (\n    \"id\" INTEGER NOT NULL,\n    \"name\" TEXT,\n\n    CONSTRAINT \"A_pkey\" PRIMARY KEY (\"id\")\n);\n"
        );
    }

    #[test]
    fn test_render_sqlite() {
        let result = ddl(r#"@backend(sqlite)
model User {
  id    int    @id @default(autoincrement())
  posts Post[]
}

model Post {
  id       int   @id @default(autoincrement())
  authorId int?
  author   User? @ref(fields: [authorId], references: [id])
  @@index([authorId], type: BTree)
}
"#);
        assert!(result.contains("\"id\" INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,"));
        assert!(result.contains(
            "CONSTRAINT \"Post_authorId_fkey\" FOREIGN KEY (\"authorId\") REFERENCES \"User\"(\"id\") ON DELETE SET NULL ON UPDATE CASCADE\n);"
        ));
        assert!(result.contains("CREATE INDEX \"Post_authorId_idx\" ON \"Post\"(\"authorId\");"));
        assert!(!result.contains("ALTER TABLE"));
        assert!(!result.contains("PRIMARY KEY (\"id\")"));
    }

    #[test]
    fn test_render_defaults() {
        let result = ddl(
            "model A {\n  id string @id @default(uuid())\n  at datetime @default(now())\n  n int @default(dbgenerated(\"1 + 1\"))\n  flag bool @default(false)\n}\n",
        );
        assert!(result.contains("\"id\" TEXT NOT NULL,"));
        assert!(result.contains("\"at\" TIMESTAMP(3) NOT NULL DEFAULT CURRENT_TIMESTAMP,"));
        assert!(result.contains("\"n\" INTEGER NOT NULL DEFAULT (1 + 1),"));
        assert!(result.contains("\"flag\" BOOLEAN NOT NULL DEFAULT FALSE,"));
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
        assert_eq!(quote_string("it's"), "'it''s'");
    }
}
