//! Name resolution. Builds the lookup tables for every namespace and reports
//! invalid or duplicate names.

use std::collections::BTreeMap;

use tracing::debug;

use crate::ast::{BlockId, EnumId, FieldId, Ident, ModelId, SchemaAst, Top, TopId};
use crate::builtins::{is_builtin_type_name, is_reserved_word};
use crate::diagnostics::Diagnostics;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamesContext {
    /// Models and enums.
    pub tops: BTreeMap<String, TopId>,
    /// Blocks, scoped by kind.
    pub blocks: BTreeMap<(String, String), BlockId>,
    pub model_fields: BTreeMap<(ModelId, String), FieldId>,
    pub enum_values: BTreeMap<(EnumId, String), u32>,
}

fn article(kind: &str) -> &'static str {
    if kind.starts_with(['a', 'e', 'i', 'o', 'u']) {
        "an"
    } else {
        "a"
    }
}

fn validate_name(ident: &Ident, kind: &str, diags: &mut Diagnostics) {
    let name = &ident.name;
    let problem = if name.is_empty() {
        format!("The {kind} name cannot be empty.")
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("The {kind} name \"{name}\" cannot start with a digit.")
    } else if name.contains('-') {
        format!("The {kind} name \"{name}\" cannot contain a dash.")
    } else if is_reserved_word(name) {
        format!("\"{name}\" is a reserved word and cannot be used as {} {kind} name.", article(kind))
    } else if is_builtin_type_name(name) {
        format!(
            "\"{name}\" is a built-in scalar type and cannot be used as {} {kind} name.",
            article(kind)
        )
    } else {
        return;
    };
    diags.error("Invalid name", problem, ident.span);
}

/// Resolves all names of the schema. Any error reported here stops the
/// pipeline.
pub fn resolve(ast: &SchemaAst, diags: &mut Diagnostics) -> NamesContext {
    let mut names = NamesContext::default();

    for (top_id, top) in ast.iter_tops() {
        match top {
            Top::Model(model) => {
                validate_name(&model.name, "model", diags);
                insert_type_name(ast, &mut names, top_id, &model.name, "model", diags);

                let model_id = ModelId(top_id);
                for (field_id, field) in model.iter_fields() {
                    validate_name(&field.name, "field", diags);
                    let key = (model_id, field.name.name.clone());
                    if names.model_fields.contains_key(&key) {
                        diags.error(
                            "Duplicate name",
                            format!(
                                "Field \"{}\" is already defined in model \"{}\".",
                                field.name.name, model.name.name
                            ),
                            field.name.span,
                        );
                    } else {
                        names.model_fields.insert(key, field_id);
                    }
                }
            }
            Top::Enum(e) => {
                validate_name(&e.name, "enum", diags);
                insert_type_name(ast, &mut names, top_id, &e.name, "enum", diags);

                let enum_id = EnumId(top_id);
                for (index, value) in e.values.iter().enumerate() {
                    validate_name(&value.name, "enum value", diags);
                    let key = (enum_id, value.name.name.clone());
                    if names.enum_values.contains_key(&key) {
                        diags.error(
                            "Duplicate name",
                            format!(
                                "Value \"{}\" is already defined in enum \"{}\".",
                                value.name.name, e.name.name
                            ),
                            value.name.span,
                        );
                    } else {
                        names.enum_values.insert(key, index as u32);
                    }
                }
            }
            Top::Block(block) => {
                validate_name(&block.name, &block.kind.name, diags);
                let key = (block.kind.name.clone(), block.name.name.clone());
                if names.blocks.contains_key(&key) {
                    diags.error(
                        "Duplicate name",
                        format!(
                            "The {kind} \"{name}\" cannot be defined because {a} {kind} with that name already exists.",
                            kind = block.kind.name,
                            name = block.name.name,
                            a = article(&block.kind.name),
                        ),
                        block.name.span,
                    );
                } else {
                    names.blocks.insert(key, BlockId(top_id));
                }
            }
            Top::Directive(_) => {}
        }
    }

    debug!(
        types = names.tops.len(),
        blocks = names.blocks.len(),
        fields = names.model_fields.len(),
        "resolved names"
    );
    names
}

fn insert_type_name(
    ast: &SchemaAst,
    names: &mut NamesContext,
    top_id: TopId,
    ident: &Ident,
    kind: &str,
    diags: &mut Diagnostics,
) {
    match names.tops.get(&ident.name) {
        Some(existing) => {
            let existing_kind = ast[*existing].kind();
            diags.error(
                "Duplicate name",
                format!(
                    "The {kind} \"{}\" cannot be defined because {} {existing_kind} with that name already exists.",
                    ident.name,
                    article(existing_kind),
                ),
                ident.span,
            );
        }
        None => {
            names.tops.insert(ident.name.clone(), top_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::span::FileId;

    fn resolve_src(src: &str) -> (NamesContext, Diagnostics) {
        let (tops, parse_diags) = parse(src, FileId(0));
        assert!(parse_diags.is_empty(), "{parse_diags:?}");
        let ast = SchemaAst { tops };
        let mut diags = Diagnostics::new();
        let names = resolve(&ast, &mut diags);
        (names, diags)
    }

    #[test]
    fn test_duplicate_model() {
        let (_, diags) = resolve_src("model User {\n}\nmodel User {\n}\n");
        assert_eq!(diags.len(), 1);
        let d = diags.iter().next().unwrap();
        assert_eq!(d.summary, "Duplicate name");
        assert_eq!(d.subject.start.line, 3);
        assert_eq!(
            d.detail,
            "The model \"User\" cannot be defined because a model with that name already exists."
        );
    }

    #[test]
    fn test_model_and_enum_share_namespace() {
        let (_, diags) = resolve_src("enum Role {\n  A\n}\nmodel Role {\n}\n");
        let d = diags.iter().next().unwrap();
        assert!(d.detail.contains("an enum with that name"));
    }

    #[test]
    fn test_field_namespaces_are_per_model() {
        let (names, diags) =
            resolve_src("model A {\n  id int\n}\nmodel B {\n  id int\n  id string\n}\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(names.model_fields.len(), 2);
    }

    #[test]
    fn test_blocks_are_scoped_by_kind() {
        let (names, diags) = resolve_src("backend main {\n}\nquery main {\n}\nquery main {\n}\n");
        assert_eq!(diags.with_summary("Duplicate name").count(), 1);
        assert_eq!(names.blocks.len(), 2);
    }

    #[test]
    fn test_invalid_names() {
        let src = "model 2fa {\n}\nmodel my-model {\n}\nmodel string {\n}\nenum E {\n  null\n}\n";
        let (_, diags) = resolve_src(src);
        assert_eq!(diags.with_summary("Invalid name").count(), 4);
    }

    #[test]
    fn test_builtin_names_rejected_everywhere() {
        let src = "model A {\n  id int\n  int int\n  date date\n}\nenum E {\n  String\n}\nquery bytes {\n}\n";
        let (_, diags) = resolve_src(src);
        let details: Vec<_> = diags.with_summary("Invalid name").map(|d| d.detail.as_str()).collect();
        assert_eq!(
            details,
            vec![
                "\"int\" is a built-in scalar type and cannot be used as a field name.",
                "\"date\" is a built-in scalar type and cannot be used as a field name.",
                "\"String\" is a built-in scalar type and cannot be used as an enum value name.",
                "\"bytes\" is a built-in scalar type and cannot be used as a query name.",
            ]
        );
    }
}
