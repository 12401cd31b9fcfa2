//! Annotation resolution: turns `@...` and `@@...` annotations into the
//! records of `TypesContext`.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::ids::{AnnotId, AnnotOwner, ModelFieldId};
use super::names::NamesContext;
use super::specs::{
    self, AnnotationSpec, ENUM_ANNOTATIONS, ENUM_VALUE_ANNOTATIONS, MODEL_ANNOTATIONS,
    RELATION_FIELD_ANNOTATIONS, SCALAR_FIELD_ANNOTATIONS,
};
use super::types::*;
use crate::ast::{Annotation, Arg, Enum, EnumId, Expr, Field, FieldId, Model, ModelId, SchemaAst};
use crate::diagnostics::Diagnostics;
use crate::eval::{EvalContext, FromValue, Value};

struct Context<'a, 'e> {
    ast: &'a SchemaAst,
    names: &'a NamesContext,
    types: &'a mut TypesContext,
    eval: &'a EvalContext<'e>,
    diags: &'a mut Diagnostics,
}

pub(super) fn resolve(
    ast: &SchemaAst,
    names: &NamesContext,
    types: &mut TypesContext,
    eval: &EvalContext<'_>,
    diags: &mut Diagnostics,
) {
    let mut ctx = Context {
        ast,
        names,
        types,
        eval,
        diags,
    };

    for (model_id, model) in ast.iter_models() {
        ctx.resolve_model(model_id, model);
    }
    for (enum_id, e) in ast.iter_enums() {
        ctx.resolve_enum(enum_id, e);
    }
    for (_, block) in ast.iter_blocks() {
        let mut seen = BTreeSet::new();
        for property in &block.properties {
            if !seen.insert(property.key.name.as_str()) {
                ctx.diags.error(
                    "Duplicate property",
                    format!("Property \"{}\" is already set.", property.key.name),
                    property.key.span,
                );
            }
        }
    }

    ctx.collect_relation_names();
    debug!(
        relation_groups = ctx.types.relation_names.len(),
        "resolved annotations"
    );
}

impl Context<'_, '_> {
    /// Evaluates an optional argument, reporting failures.
    fn eval_arg<T: FromValue>(&mut self, arg: Option<&Arg>) -> Option<T> {
        let arg = arg?;
        match self.eval.eval_as::<T>(&arg.value) {
            Ok(v) => Some(v),
            Err(diag) => {
                self.diags.push(diag);
                None
            }
        }
    }

    /// Reports a repeated singular annotation. Returns false if `annot`
    /// should be skipped.
    fn visit(
        &mut self,
        annot: &Annotation,
        spec: Option<&AnnotationSpec>,
        visited: &mut BTreeSet<String>,
    ) -> bool {
        let singular = spec.is_some_and(|s| s.singular);
        if !visited.insert(annot.name.name.clone()) && singular {
            self.diags.error(
                "Duplicate annotation",
                format!(
                    "Annotation \"{}\" is specified more than once.",
                    annot.name.name
                ),
                annot.span,
            );
            return false;
        }
        true
    }

    fn resolve_model(&mut self, model_id: ModelId, model: &Model) {
        let mut attrs = ModelAnnotations::default();
        let mut mapped_names = BTreeSet::new();

        for (field_id, field) in model.iter_fields() {
            let id = ModelFieldId(model_id, field_id);
            if let Some(scalar) = self.types.scalar_fields.get(&id).cloned() {
                let scalar =
                    self.visit_scalar_field(id, model, field, scalar, &mut attrs, &mut mapped_names);
                self.types.scalar_fields.insert(id, scalar);
            } else if let Some(relation) = self.types.relation_fields.get(&id).cloned() {
                let relation = self.visit_relation_field(id, field, relation);
                self.types.relation_fields.insert(id, relation);
            }
        }

        let mut visited = BTreeSet::new();
        for (index, annot) in model.annotations.iter().enumerate() {
            let source = AnnotId::new(AnnotOwner::Model(model_id), index);
            let name = annot.name.name.as_str();
            let spec = specs::find(MODEL_ANNOTATIONS, name);
            if !self.visit(annot, spec, &mut visited) {
                continue;
            }
            let Some(spec) = spec else {
                self.diags.error(
                    "Invalid annotation",
                    format!(
                        "The model \"{}\" cannot be annotated with \"@@{}\".",
                        model.name.name, name
                    ),
                    annot.span,
                );
                continue;
            };
            let Some(args) = specs::check_args(spec, &annot.args, annot.span, self.diags) else {
                continue;
            };

            match name {
                "ignore" => attrs.is_ignored = true,
                "map" => attrs.mapped_name = self.eval_arg(args.get("name")),
                "id" => {
                    if attrs.primary_key.is_some() {
                        self.diags.error(
                            "Invalid annotation",
                            format!(
                                "The model \"{}\" cannot have both an @id field and an @@id annotation.",
                                model.name.name
                            ),
                            annot.span,
                        );
                        continue;
                    }
                    let fields = args
                        .get("fields")
                        .map(|arg| self.resolve_field_refs(&arg.value, model_id))
                        .unwrap_or_default();
                    attrs.primary_key = Some(IdAnnotation {
                        fields,
                        name: self.eval_arg(args.get("name")),
                        mapped_name: self.eval_arg(args.get("map")),
                        source_field: None,
                        source,
                    });
                }
                "unique" | "index" => {
                    let fields = args
                        .get("fields")
                        .map(|arg| self.resolve_field_refs(&arg.value, model_id))
                        .unwrap_or_default();
                    attrs.indexes.push(IndexAnnotation {
                        kind: if name == "unique" {
                            IndexKind::Unique
                        } else {
                            IndexKind::Normal
                        },
                        fields,
                        name: self.eval_arg(args.get("name")),
                        mapped_name: self.eval_arg(args.get("map")),
                        algorithm: self.eval_arg(args.get("type")),
                        source_field: None,
                        source,
                    });
                }
                _ => {}
            }
        }

        self.validate_id_field_arity(model, &attrs);
        self.types.model_annotations.insert(model_id, attrs);
    }

    fn validate_id_field_arity(&mut self, model: &Model, attrs: &ModelAnnotations) {
        if attrs.is_ignored {
            return;
        }
        let Some(field_id) = attrs.primary_key.as_ref().and_then(|pk| pk.source_field) else {
            return;
        };
        let field = &model[field_id];
        if !field.arity().is_required() {
            self.diags.error(
                "Invalid ID field",
                format!(
                    "The ID field \"{}\" cannot be repeated or optional.",
                    field.name.name
                ),
                field.span,
            );
        }
    }

    fn visit_scalar_field(
        &mut self,
        id: ModelFieldId,
        model: &Model,
        field: &Field,
        mut scalar: ScalarField,
        attrs: &mut ModelAnnotations,
        mapped_names: &mut BTreeSet<String>,
    ) -> ScalarField {
        let mut visited = BTreeSet::new();

        for (index, annot) in field.annotations.iter().enumerate() {
            let source = AnnotId::new(AnnotOwner::Field(id), index);
            let name = annot.name.name.as_str();

            if let Some(native) = name.strip_prefix("db.") {
                self.visit_native_type(field, annot, native, &mut scalar);
                continue;
            }

            let spec = specs::find(SCALAR_FIELD_ANNOTATIONS, name);
            if !self.visit(annot, spec, &mut visited) {
                continue;
            }
            let Some(spec) = spec else {
                if name == "ref" {
                    self.diags.error(
                        "Invalid annotation",
                        format!(
                            "The field \"{}\" is a scalar field and cannot be annotated with \"@ref\".",
                            field.name.name
                        ),
                        annot.span,
                    );
                } else {
                    self.diags.error(
                        "Unknown annotation",
                        format!("Annotation \"{name}\" is not a known annotation for this field."),
                        annot.span,
                    );
                }
                continue;
            };
            let Some(args) = specs::check_args(spec, &annot.args, annot.span, self.diags) else {
                continue;
            };

            match name {
                "id" => {
                    if attrs.primary_key.is_some() {
                        self.diags.error(
                            "Invalid annotation",
                            "At most one field must be marked as the id field with the `@id` annotation.",
                            annot.span,
                        );
                        continue;
                    }
                    let sort = self.eval_arg(args.get("sort"));
                    attrs.primary_key = Some(IdAnnotation {
                        fields: vec![FieldRef {
                            model_id: id.model(),
                            field_id: id.field(),
                            sort,
                        }],
                        name: self.eval_arg(args.get("name")),
                        mapped_name: self.eval_arg(args.get("map")),
                        source_field: Some(id.field()),
                        source,
                    });
                }
                "unique" => {
                    let sort = self.eval_arg(args.get("sort"));
                    attrs.indexes.push(IndexAnnotation {
                        kind: IndexKind::Unique,
                        fields: vec![FieldRef {
                            model_id: id.model(),
                            field_id: id.field(),
                            sort,
                        }],
                        name: self.eval_arg(args.get("name")),
                        mapped_name: self.eval_arg(args.get("map")),
                        algorithm: self.eval_arg(args.get("type")),
                        source_field: Some(id.field()),
                        source,
                    });
                }
                "default" => {
                    if let Some(value) = args.get("value") {
                        scalar.default = Some(DefaultAnnotation {
                            value: value.value.clone(),
                            mapped_name: self.eval_arg(args.get("map")),
                            span: annot.span,
                        });
                    }
                }
                "map" => {
                    let Some(mapped) = self.eval_arg::<String>(args.get("name")) else {
                        continue;
                    };
                    let shadowed = self
                        .names
                        .model_fields
                        .get(&(id.model(), mapped.clone()))
                        .is_some_and(|other| *other != id.field());
                    if mapped_names.contains(&mapped) {
                        self.diags.error(
                            "Duplicate mapped name",
                            format!(
                                "The mapped name \"{mapped}\" is already mapped by another field of model \"{}\".",
                                model.name.name
                            ),
                            annot.span,
                        );
                    } else if shadowed {
                        self.diags.error(
                            "Duplicate mapped name",
                            format!("The mapped name \"{mapped}\" is already used by another field."),
                            annot.span,
                        );
                    } else {
                        scalar.mapped_name = Some(mapped.clone());
                    }
                    mapped_names.insert(mapped);
                }
                "ignore" => scalar.is_ignored = true,
                _ => {}
            }
        }

        scalar
    }

    fn visit_native_type(
        &mut self,
        field: &Field,
        annot: &Annotation,
        native: &str,
        scalar: &mut ScalarField,
    ) {
        let problem = if scalar.field_type.as_builtin().is_none() {
            Some(format!(
                "The field \"{}\" is not a built-in scalar field and cannot be annotated with \"@{}\".",
                field.name.name, annot.name.name
            ))
        } else if scalar.native_type.is_some() {
            Some(format!(
                "The field \"{}\" is already annotated with a native type.",
                field.name.name
            ))
        } else if native.contains('.') {
            Some(format!(
                "The annotation \"{}\" is not a valid native type.",
                annot.name.name
            ))
        } else {
            None
        };
        if let Some(problem) = problem {
            self.diags.error("Invalid annotation", problem, annot.span);
            return;
        }

        let mut args = Vec::with_capacity(annot.args.len());
        for arg in &annot.args {
            match self.eval.eval(&arg.value) {
                Ok(Value::Number(n)) => args.push(n.to_string()),
                Ok(Value::String(s)) => args.push(s),
                Ok(other) => self.diags.error(
                    "Invalid native type",
                    format!(
                        "Native type arguments must be numbers or strings, found {}.",
                        other.type_name()
                    ),
                    arg.span,
                ),
                Err(diag) => self.diags.push(diag),
            }
        }

        scalar.native_type = Some(NativeTypeAnnotation {
            name: native.to_string(),
            args,
            span: annot.span,
        });
    }

    fn visit_relation_field(
        &mut self,
        id: ModelFieldId,
        field: &Field,
        mut relation: RelationField,
    ) -> RelationField {
        let mut visited = BTreeSet::new();

        for (index, annot) in field.annotations.iter().enumerate() {
            let name = annot.name.name.as_str();
            let spec = specs::find(RELATION_FIELD_ANNOTATIONS, name);
            if !self.visit(annot, spec, &mut visited) {
                continue;
            }
            let Some(spec) = spec else {
                if matches!(name, "unique" | "default" | "id" | "map") || name.starts_with("db.") {
                    self.diags.error(
                        "Invalid annotation",
                        format!(
                            "The field \"{}\" is a relation field and cannot be annotated with \"@{name}\".",
                            field.name.name
                        ),
                        annot.span,
                    );
                } else {
                    self.diags.error(
                        "Unknown annotation",
                        format!("Annotation \"{name}\" is not a known annotation for this field."),
                        annot.span,
                    );
                }
                continue;
            };
            let Some(args) = specs::check_args(spec, &annot.args, annot.span, self.diags) else {
                continue;
            };

            match name {
                "ref" => {
                    relation.annotation = Some(AnnotId::new(AnnotOwner::Field(id), index));
                    relation.name = self.eval_arg(args.get("name"));
                    relation.fields = args
                        .get("fields")
                        .map(|arg| self.resolve_field_refs(&arg.value, id.model()));
                    relation.references = args
                        .get("references")
                        .map(|arg| self.resolve_field_refs(&arg.value, relation.referenced_model));
                    relation.on_delete = self.ref_action(args.get("onDelete"));
                    relation.on_update = self.ref_action(args.get("onUpdate"));
                    relation.mapped_name = self.eval_arg(args.get("map"));
                }
                "ignore" => relation.is_ignored = true,
                _ => {}
            }
        }

        relation
    }

    fn ref_action(&mut self, arg: Option<&Arg>) -> Option<RefAction> {
        let span = arg?.value.span();
        self.eval_arg::<ReferentialAction>(arg)
            .map(|action| RefAction { action, span })
    }

    /// Resolves a `fields` / `references` argument: a list or a single item,
    /// each item a field name or `name(sort: Desc)`. Order is preserved.
    fn resolve_field_refs(&mut self, expr: &Expr, model_id: ModelId) -> Vec<FieldRef> {
        let items: Vec<&Expr> = match expr {
            Expr::List(items, _) => items.iter().collect(),
            other => vec![other],
        };
        let ast = self.ast;
        let model = &ast[model_id];

        let mut refs: Vec<FieldRef> = Vec::new();
        for item in items {
            let Some((name, sort)) = self.decode_field_ref(item) else {
                continue;
            };
            let Some(&field_id) = self.names.model_fields.get(&(model_id, name.clone())) else {
                self.diags.error(
                    "Unknown field",
                    format!(
                        "Field \"{name}\" does not exist in model \"{}\".",
                        model.name.name
                    ),
                    item.span(),
                );
                continue;
            };
            if !self
                .types
                .scalar_fields
                .contains_key(&ModelFieldId(model_id, field_id))
            {
                self.diags.error(
                    "Invalid field",
                    "The argument fields must refer only to scalar fields.",
                    item.span(),
                );
                continue;
            }
            if refs.iter().any(|r| r.field_id == field_id) {
                self.diags.error(
                    "Duplicate field",
                    format!("Field \"{name}\" is referenced multiple times."),
                    item.span(),
                );
                continue;
            }
            refs.push(FieldRef {
                model_id,
                field_id,
                sort,
            });
        }
        refs
    }

    fn decode_field_ref(&mut self, expr: &Expr) -> Option<(String, Option<SortOrder>)> {
        match expr {
            Expr::Ident(ident) => Some((ident.name.clone(), None)),
            Expr::Str(s, _) => Some((s.clone(), None)),
            Expr::Call { name, args, .. } => {
                let mut sort = None;
                let mut seen_sort = false;
                for arg in args {
                    match arg.name.as_ref().map(|n| n.name.as_str()) {
                        Some("sort") if seen_sort => self.diags.error(
                            "Duplicate sort argument",
                            "The sort argument is specified more than once.",
                            arg.span,
                        ),
                        Some("sort") => {
                            seen_sort = true;
                            sort = self.eval_arg(Some(arg));
                        }
                        other => self.diags.error(
                            "Invalid field reference argument",
                            format!(
                                "Invalid field reference argument \"{}\".",
                                other.unwrap_or("")
                            ),
                            arg.span,
                        ),
                    }
                }
                Some((name.name.clone(), sort))
            }
            Expr::List(items, span) => match items.as_slice() {
                [] => None,
                [single] => self.decode_field_ref(single),
                _ => {
                    self.diags.error(
                        "Invalid argument",
                        "Expected a single reference field.",
                        *span,
                    );
                    None
                }
            },
            other => {
                self.diags.error(
                    "Invalid field reference",
                    format!("Expected a field name, found {}.", other.describe()),
                    other.span(),
                );
                None
            }
        }
    }

    fn resolve_enum(&mut self, enum_id: EnumId, e: &Enum) {
        let mut attrs = EnumAnnotations::default();

        for (index, value) in e.values.iter().enumerate() {
            let mut visited = BTreeSet::new();
            for annot in &value.annotations {
                let spec = specs::find(ENUM_VALUE_ANNOTATIONS, &annot.name.name);
                if !self.visit(annot, spec, &mut visited) {
                    continue;
                }
                let Some(spec) = spec else {
                    self.diags.error(
                        "Invalid annotation",
                        format!(
                            "The enum value \"{}\" cannot be annotated with \"@{}\".",
                            value.name.name, annot.name.name
                        ),
                        annot.span,
                    );
                    continue;
                };
                let Some(args) = specs::check_args(spec, &annot.args, annot.span, self.diags)
                else {
                    continue;
                };
                let Some(mapped) = self.eval_arg::<String>(args.get("name")) else {
                    continue;
                };

                let shadowed = self
                    .names
                    .enum_values
                    .get(&(enum_id, mapped.clone()))
                    .is_some_and(|other| *other != index as u32);
                if attrs.mapped_values.values().any(|v| *v == mapped) || shadowed {
                    self.diags.error(
                        "Duplicate mapped name",
                        format!(
                            "The mapped name \"{mapped}\" is already used by another value of enum \"{}\".",
                            e.name.name
                        ),
                        annot.span,
                    );
                    continue;
                }
                attrs.mapped_values.insert(index as u32, mapped);
            }
        }

        let mut visited = BTreeSet::new();
        for annot in &e.annotations {
            let spec = specs::find(ENUM_ANNOTATIONS, &annot.name.name);
            if !self.visit(annot, spec, &mut visited) {
                continue;
            }
            let Some(spec) = spec else {
                self.diags.error(
                    "Invalid annotation",
                    format!(
                        "The enum \"{}\" cannot be annotated with \"@@{}\".",
                        e.name.name, annot.name.name
                    ),
                    annot.span,
                );
                continue;
            };
            if let Some(args) = specs::check_args(spec, &annot.args, annot.span, self.diags) {
                attrs.mapped_name = self.eval_arg(args.get("name"));
            }
        }

        self.types.enum_annotations.insert(enum_id, attrs);
    }

    fn collect_relation_names(&mut self) {
        let mut groups: BTreeMap<RelationIdentifier, Vec<FieldId>> = BTreeMap::new();
        for (id, rf) in &self.types.relation_fields {
            let model_name = &self.ast[id.model()].name.name;
            let related_name = &self.ast[rf.referenced_model].name.name;
            let name = match &rf.name {
                Some(explicit) => RelationName::Explicit(explicit.clone()),
                None => RelationName::generated(model_name, related_name),
            };
            groups
                .entry(RelationIdentifier {
                    model: id.model(),
                    related: rf.referenced_model,
                    name,
                })
                .or_default()
                .push(id.field());
        }
        self.types.relation_names = groups;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TopId;
    use crate::db::{names, types};
    use crate::parser::parse;
    use crate::span::FileId;

    fn resolve_src(src: &str) -> (TypesContext, Diagnostics) {
        let (tops, parse_diags) = parse(src, FileId(0));
        assert!(parse_diags.is_empty(), "{parse_diags:?}");
        let ast = SchemaAst { tops };
        let mut diags = Diagnostics::new();
        let names = names::resolve(&ast, &mut diags);
        let mut types = types::resolve_field_types(&ast, &names, &mut diags);
        let vars = BTreeMap::new();
        let eval = EvalContext::new(&vars);
        resolve(&ast, &names, &mut types, &eval, &mut diags);
        (types, diags)
    }

    fn model(n: u32) -> ModelId {
        ModelId(TopId(n))
    }

    #[test]
    fn test_field_level_annotations() {
        let src = r#"model User {
  id    int    @id @default(autoincrement())
  email string @unique(map: "user_email") @map("email_address")
  bio   string? @db.VarChar(280)
  tmp   string @ignore
}"#;
        let (types, diags) = resolve_src(src);
        assert!(diags.is_empty(), "{diags:?}");
        let attrs = &types.model_annotations[&model(0)];
        let pk = attrs.primary_key.as_ref().unwrap();
        assert_eq!(pk.source_field, Some(FieldId(0)));
        assert_eq!(attrs.indexes.len(), 1);
        assert_eq!(attrs.indexes[0].mapped_name.as_deref(), Some("user_email"));

        let email = &types.scalar_fields[&ModelFieldId(model(0), FieldId(1))];
        assert_eq!(email.mapped_name.as_deref(), Some("email_address"));
        let bio = &types.scalar_fields[&ModelFieldId(model(0), FieldId(2))];
        let native = bio.native_type.as_ref().unwrap();
        assert_eq!(native.name, "VarChar");
        assert_eq!(native.args, vec!["280".to_string()]);
        assert!(types.scalar_fields[&ModelFieldId(model(0), FieldId(3))].is_ignored);
    }

    #[test]
    fn test_model_level_annotations() {
        let src = r#"model Post {
  a int
  b string
  c string?
  @@id([a, b(sort: Desc)], name: "pk")
  @@index([c], type: Hash)
  @@unique(fields: [b, c])
  @@map("posts")
}"#;
        let (types, diags) = resolve_src(src);
        assert!(diags.is_empty(), "{diags:?}");
        let attrs = &types.model_annotations[&model(0)];
        let pk = attrs.primary_key.as_ref().unwrap();
        assert_eq!(pk.fields.len(), 2);
        assert_eq!(pk.fields[1].sort, Some(SortOrder::Desc));
        assert_eq!(pk.name.as_deref(), Some("pk"));
        assert_eq!(attrs.indexes[0].algorithm, Some(IndexAlgorithm::Hash));
        assert_eq!(attrs.indexes[0].kind, IndexKind::Normal);
        assert_eq!(attrs.indexes[1].kind, IndexKind::Unique);
        assert_eq!(attrs.mapped_name.as_deref(), Some("posts"));
    }

    #[test]
    fn test_relation_annotation() {
        let src = r#"model User {
  id    int @id
  posts Post[]
}
model Post {
  id       int  @id
  authorId int
  author   User @ref(fields: [authorId], references: [id], onDelete: Cascade, map: "fk_author")
}"#;
        let (types, diags) = resolve_src(src);
        assert!(diags.is_empty(), "{diags:?}");
        let rf = &types.relation_fields[&ModelFieldId(model(1), FieldId(2))];
        assert_eq!(rf.fields.as_ref().unwrap()[0].field_id, FieldId(1));
        assert_eq!(rf.references.as_ref().unwrap()[0].model_id, model(0));
        assert_eq!(rf.on_delete.unwrap().action, ReferentialAction::Cascade);
        assert_eq!(rf.mapped_name.as_deref(), Some("fk_author"));
        assert!(rf.annotation.is_some());
        assert_eq!(types.relation_names.len(), 2);
    }

    #[test]
    fn test_annotation_errors() {
        let src = r#"model A {
  id   int    @id @id
  b    string @ref
  c    B      @unique
  d    int    @color
  e    int    @default(1, 2)
  f    int?   @map("b")
  @@id([id])
  @@color
}
model B {
  id int @id
}"#;
        let (_, diags) = resolve_src(src);
        let summaries: Vec<_> = diags.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(
            summaries,
            vec![
                "Duplicate annotation",
                "Invalid annotation",
                "Invalid annotation",
                "Unknown annotation",
                "Duplicate argument",
                "Duplicate mapped name",
                "Invalid annotation",
                "Invalid annotation",
            ]
        );
    }

    #[test]
    fn test_field_ref_errors() {
        let src = r#"model A {
  id int
  b  B
  @@index([missing, b, id, id])
}
model B {
  id int @id
}"#;
        let (_, diags) = resolve_src(src);
        let summaries: Vec<_> = diags.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(
            summaries,
            vec!["Unknown field", "Invalid field", "Duplicate field"]
        );
    }

    #[test]
    fn test_optional_id_field() {
        let (_, diags) = resolve_src("model A {\n  id int? @id\n}\n");
        assert_eq!(diags.with_summary("Invalid ID field").count(), 1);
    }

    #[test]
    fn test_enum_mappings() {
        let src = "enum Role {\n  ADMIN @map(\"admin\")\n  USER @map(\"admin\")\n  GUEST @map(\"ADMIN\")\n  @@map(\"roles\")\n}\n";
        let (types, diags) = resolve_src(src);
        assert_eq!(diags.with_summary("Duplicate mapped name").count(), 2);
        let attrs = &types.enum_annotations[&EnumId(TopId(0))];
        assert_eq!(attrs.mapped_name.as_deref(), Some("roles"));
        assert_eq!(attrs.mapped_values.get(&0).map(String::as_str), Some("admin"));
    }

    #[test]
    fn test_duplicate_block_property() {
        let (_, diags) = resolve_src("backend main {\n  url = \"a\"\n  url = \"b\"\n}\n");
        assert_eq!(diags.with_summary("Duplicate property").count(), 1);
    }

    #[test]
    fn test_unsuitable_value() {
        let (_, diags) = resolve_src("model A {\n  id int @id(sort: Sideways)\n}\n");
        assert_eq!(diags.with_summary("Unsuitable value type").count(), 1);
    }
}
