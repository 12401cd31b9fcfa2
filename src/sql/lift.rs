//! Lowering of a validated `ParserDatabase` into a `SqlSchema`.

use base64::Engine;
use tracing::{debug, debug_span};

use super::schema::{
    Column, ColumnArity, ColumnDefault, ColumnType, EnumType, ForeignKey, Index, IndexColumn,
    PrimaryKey, SqlSchema, Table,
};
use super::render::quote_string;
use super::types::{default_sql_type, find_native_type};
use super::Dialect;
use crate::ast::{Expr, FieldArity};
use crate::builtins::BuiltInScalar;
use crate::db::types::{IndexAlgorithm, ReferentialAction, ScalarFieldType};
use crate::db::{
    EnumWalker, ImplicitManyToManyWalker, InlineRelationWalker, ModelWalker, ParserDatabase,
    RefinedRelation, ScalarFieldWalker,
};
use crate::eval::{EvalContext, Value};

/// Lower the database. It must have passed validation.
pub fn lift(db: &ParserDatabase) -> SqlSchema {
    let _span = debug_span!("lift", dialect = %db.dialect()).entered();

    let mut schema = SqlSchema {
        dialect: db.dialect(),
        enums: db.walk_enums().map(lift_enum).collect(),
        tables: db
            .walk_models()
            .filter(|m| !m.is_ignored())
            .map(lift_model)
            .collect(),
    };

    for relation in db.walk_relations().filter(|r| !r.is_ignored()) {
        if let RefinedRelation::ImplicitManyToMany(m2m) = relation.refine() {
            schema.tables.push(join_table(m2m));
        }
    }

    debug!(
        enums = schema.enums.len(),
        tables = schema.tables.len(),
        foreign_keys = schema.foreign_key_count(),
        "lowered schema"
    );
    schema
}

fn lift_enum(enm: EnumWalker<'_>) -> EnumType {
    EnumType {
        name: enm.database_name().to_string(),
        values: enm.values().map(|v| v.database_name().to_string()).collect(),
    }
}

fn lift_model(model: ModelWalker<'_>) -> Table {
    let columns = model
        .scalar_fields()
        .filter(|f| !f.is_ignored())
        .map(lift_column)
        .collect();

    let primary_key = model.primary_key().map(|pk| PrimaryKey {
        name: pk.constraint_name(),
        columns: pk
            .fields()
            .map(|(field, _)| field.database_name().to_string())
            .collect(),
    });

    let indexes = model
        .indexes()
        .map(|index| Index {
            name: index.constraint_name(),
            unique: index.is_unique(),
            columns: index
                .fields()
                .map(|(field, sort)| IndexColumn {
                    name: field.database_name().to_string(),
                    sort,
                })
                .collect(),
            algorithm: index.algorithm(),
        })
        .collect();

    let foreign_keys = model.foreign_keys().map(lift_foreign_key).collect();

    Table {
        name: model.database_name().to_string(),
        columns,
        primary_key,
        indexes,
        foreign_keys,
    }
}

fn lift_column(field: ScalarFieldWalker<'_>) -> Column {
    Column {
        name: field.database_name().to_string(),
        column_type: column_type(field),
        arity: match field.arity() {
            FieldArity::Required => ColumnArity::Required,
            FieldArity::Optional => ColumnArity::Nullable,
            FieldArity::List => ColumnArity::List,
        },
        default: field
            .default_value()
            .and_then(|default| lift_default(field, &default.value)),
    }
}

fn column_type(field: ScalarFieldWalker<'_>) -> ColumnType {
    let dialect = field.db.dialect();
    match field.field_type() {
        ScalarFieldType::Enum(enum_id) if dialect.supports_enums() => {
            ColumnType::Enum(field.db.walk(enum_id).database_name().to_string())
        }
        ScalarFieldType::Enum(_) => {
            ColumnType::Sql(default_sql_type(BuiltInScalar::String, dialect).to_string())
        }
        ScalarFieldType::BuiltIn(scalar) => ColumnType::Sql(match field.native_type() {
            Some(native) => match find_native_type(dialect, &native.name) {
                Some(spec) => spec.render(&native.args),
                None => panic!("native type {} is not known by {dialect}", native.name),
            },
            None => default_sql_type(scalar, dialect).to_string(),
        }),
    }
}

fn lift_default(field: ScalarFieldWalker<'_>, expr: &Expr) -> Option<ColumnDefault> {
    if let Expr::Call { name, args, .. } = expr {
        return match name.name.as_str() {
            "autoincrement" => Some(ColumnDefault::Autoincrement),
            "now" => Some(ColumnDefault::Now),
            "uuid" => Some(ColumnDefault::Uuid),
            "cuid" => Some(ColumnDefault::Cuid),
            "dbgenerated" => Some(ColumnDefault::DbGenerated(args.first().and_then(
                |arg| match &arg.value {
                    Expr::Str(sql, _) => Some(sql.clone()),
                    _ => None,
                },
            ))),
            other => panic!("unknown default function {other}()"),
        };
    }

    let value = match EvalContext::new(field.db.variables()).eval(expr) {
        Ok(value) => value,
        Err(diag) => panic!("default of {} did not evaluate: {}", field.name(), diag.detail),
    };
    if value == Value::Null {
        return None;
    }
    Some(ColumnDefault::Value(sql_literal(field, &value)))
}

fn sql_literal(field: ScalarFieldWalker<'_>, value: &Value) -> String {
    let dialect = field.db.dialect();
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Number(n) => n.to_string(),
        Value::List(items) => {
            let items: Vec<String> = items.iter().map(|item| sql_literal(field, item)).collect();
            format!("ARRAY[{}]", items.join(", "))
        }
        Value::String(s) => match field.field_type() {
            ScalarFieldType::Enum(enum_id) => {
                let enm = field.db.walk(enum_id);
                match enm.find_value(s) {
                    Some(value) => quote_string(value.database_name()),
                    None => panic!("{s} is not a value of enum {}", enm.name()),
                }
            }
            ScalarFieldType::BuiltIn(BuiltInScalar::Bytes) => bytes_literal(s, dialect),
            ScalarFieldType::BuiltIn(_) => quote_string(s),
        },
        Value::Object(_) | Value::Function { .. } => {
            panic!("{} is not a column default", value.type_name())
        }
    }
}

fn bytes_literal(encoded: &str, dialect: Dialect) -> String {
    let bytes = match base64::engine::general_purpose::STANDARD.decode(encoded) {
        Ok(bytes) => bytes,
        Err(err) => panic!("bytes default is not base64: {err}"),
    };
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    match dialect {
        Dialect::Postgres => format!("'\\x{hex}'"),
        Dialect::Sqlite => format!("X'{hex}'"),
    }
}

fn lift_foreign_key(inline: InlineRelationWalker<'_>) -> ForeignKey {
    ForeignKey {
        name: inline.constraint_name(),
        columns: inline
            .referencing_fields()
            .iter()
            .map(|f| f.database_name().to_string())
            .collect(),
        referenced_table: inline.referenced_model().database_name().to_string(),
        referenced_columns: inline
            .referenced_fields()
            .iter()
            .map(|f| f.database_name().to_string())
            .collect(),
        on_delete: inline.on_delete(),
        on_update: inline.on_update(),
    }
}

fn join_table(m2m: ImplicitManyToManyWalker<'_>) -> Table {
    let name = m2m.table_name();
    let (column_a, fk_a) = join_column(m2m, "A", m2m.model_a());
    let (column_b, fk_b) = join_column(m2m, "B", m2m.model_b());

    let index = |name: String, unique: bool, columns: &[&str]| Index {
        name,
        unique,
        columns: columns
            .iter()
            .map(|column| IndexColumn {
                name: column.to_string(),
                sort: None,
            })
            .collect(),
        algorithm: IndexAlgorithm::BTree,
    };

    Table {
        indexes: vec![
            index(m2m.unique_index_name(), true, &["A", "B"]),
            index(m2m.index_name(), false, &["B"]),
        ],
        name,
        columns: vec![column_a, column_b],
        primary_key: None,
        foreign_keys: vec![fk_a, fk_b],
    }
}

fn join_column(
    m2m: ImplicitManyToManyWalker<'_>,
    column: &str,
    model: ModelWalker<'_>,
) -> (Column, ForeignKey) {
    let Some(id) = model.primary_key().and_then(|pk| pk.fields().next()) else {
        panic!("model {} of a many-to-many relation has no id", model.name());
    };
    let (id, _) = id;

    let column_def = Column {
        name: column.to_string(),
        column_type: column_type(id),
        arity: ColumnArity::Required,
        default: None,
    };
    let foreign_key = ForeignKey {
        name: m2m.foreign_key_name(column),
        columns: vec![column.to_string()],
        referenced_table: model.database_name().to_string(),
        referenced_columns: vec![id.database_name().to_string()],
        on_delete: ReferentialAction::Cascade,
        on_update: ReferentialAction::Cascade,
    };
    (column_def, foreign_key)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::compile;
    use crate::db::types::SortOrder;

    fn lower(src: &str) -> SqlSchema {
        let compilation = compile(src);
        assert!(!compilation.has_errors(), "{}", compilation.render_diagnostics());
        compilation.lift().unwrap()
    }

    const BLOG: &str = r#"
enum Role {
  USER
  ADMIN  @map("admin")
}

model User {
  id        int      @id @default(autoincrement())
  email     string   @unique
  name      string?  @db.VarChar(64)
  role      Role     @default(ADMIN)
  tags      string[]
  createdAt datetime @default(now())
  posts     Post[]
}

model Post {
  id       int     @id
  title    string  @default("it's new")
  authorId int?
  author   User?   @ref(fields: [authorId], references: [id])
  tags     Tag[]

  @@map("posts")
  @@index([title(sort: Desc)], type: Hash)
}

model Tag {
  id    string @id @default(uuid())
  posts Post[]
}
"#;

    #[test]
    fn test_lift_tables() {
        let schema = lower(BLOG);
        let names: Vec<_> = schema.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["User", "posts", "Tag", "_PostToTag"]);
        assert_eq!(
            schema.enums,
            vec![EnumType {
                name: "Role".into(),
                values: vec!["USER".into(), "admin".into()],
            }]
        );

        let user = schema.table("User").unwrap();
        let columns: Vec<_> = user.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(columns, vec!["id", "email", "name", "role", "tags", "createdAt"]);
        assert_eq!(
            user.primary_key,
            Some(PrimaryKey {
                name: "User_pkey".into(),
                columns: vec!["id".into()],
            })
        );
        assert_eq!(user.indexes.len(), 1);
        assert_eq!(user.indexes[0].name, "User_email_key");
        assert!(user.indexes[0].unique);
        assert!(user.foreign_keys.is_empty());
    }

    #[test]
    fn test_lift_columns() {
        let schema = lower(BLOG);
        let user = schema.table("User").unwrap();

        let id = user.column("id").unwrap();
        assert_eq!(id.column_type, ColumnType::Sql("INTEGER".into()));
        assert_eq!(id.default, Some(ColumnDefault::Autoincrement));

        let name = user.column("name").unwrap();
        assert_eq!(name.column_type, ColumnType::Sql("VARCHAR(64)".into()));
        assert_eq!(name.arity, ColumnArity::Nullable);

        let role = user.column("role").unwrap();
        assert_eq!(role.column_type, ColumnType::Enum("Role".into()));
        assert_eq!(role.default, Some(ColumnDefault::Value("'admin'".into())));

        assert_eq!(user.column("tags").unwrap().arity, ColumnArity::List);
        assert_eq!(user.column("createdAt").unwrap().default, Some(ColumnDefault::Now));

        let posts = schema.table("posts").unwrap();
        assert_eq!(
            posts.column("title").unwrap().default,
            Some(ColumnDefault::Value("'it''s new'".into()))
        );
    }

    #[test]
    fn test_lift_foreign_keys_and_indexes() {
        let schema = lower(BLOG);
        let posts = schema.table("posts").unwrap();
        assert_eq!(
            posts.foreign_keys,
            vec![ForeignKey {
                name: "posts_authorId_fkey".into(),
                columns: vec!["authorId".into()],
                referenced_table: "User".into(),
                referenced_columns: vec!["id".into()],
                on_delete: ReferentialAction::SetNull,
                on_update: ReferentialAction::Cascade,
            }]
        );
        assert_eq!(
            posts.indexes,
            vec![Index {
                name: "posts_title_idx".into(),
                unique: false,
                columns: vec![IndexColumn {
                    name: "title".into(),
                    sort: Some(SortOrder::Desc),
                }],
                algorithm: IndexAlgorithm::Hash,
            }]
        );
    }

    #[test]
    fn test_lift_join_table() {
        let schema = lower(BLOG);
        let join = schema.table("_PostToTag").unwrap();
        assert_eq!(join.column("A").unwrap().column_type, ColumnType::Sql("INTEGER".into()));
        assert_eq!(join.column("B").unwrap().column_type, ColumnType::Sql("TEXT".into()));
        let indexes: Vec<_> = join.indexes.iter().map(|i| (i.name.as_str(), i.unique)).collect();
        assert_eq!(
            indexes,
            vec![("_PostToTag_AB_unique", true), ("_PostToTag_B_index", false)]
        );
        let fks: Vec<_> = join
            .foreign_keys
            .iter()
            .map(|fk| (fk.name.as_str(), fk.referenced_table.as_str(), fk.on_delete))
            .collect();
        assert_eq!(
            fks,
            vec![
                ("_PostToTag_A_fkey", "posts", ReferentialAction::Cascade),
                ("_PostToTag_B_fkey", "Tag", ReferentialAction::Cascade),
            ]
        );
    }

    #[test]
    fn test_lift_sqlite() {
        let schema = lower(
            "@backend(sqlite)\nenum Role {\n  USER\n}\nmodel A {\n  id int @id\n  role Role @default(USER)\n  data bytes @default(\"aGk=\")\n}\n",
        );
        assert_eq!(schema.dialect, Dialect::Sqlite);
        let table = schema.table("A").unwrap();
        assert_eq!(table.column("role").unwrap().column_type, ColumnType::Sql("TEXT".into()));
        assert_eq!(
            table.column("data").unwrap().default,
            Some(ColumnDefault::Value("X'6869'".into()))
        );
    }

    #[test]
    fn test_ignored_models_are_skipped() {
        let schema = lower("model A {\n  id int @id\n}\nmodel B {\n  id int @id\n  @@ignore\n}\n");
        assert_eq!(schema.tables.len(), 1);
    }

    #[test]
    fn test_lift_is_deterministic() {
        assert_eq!(lower(BLOG), lower(BLOG));
    }
}
