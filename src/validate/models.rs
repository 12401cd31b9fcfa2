use std::collections::BTreeMap;

use crate::ast::{Annotation, Expr};
use crate::db::types::IndexAlgorithm;
use crate::db::ModelWalker;

use super::ValidationContext;

pub(super) fn has_unique_criteria(model: ModelWalker<'_>, ctx: &mut ValidationContext<'_>) {
    if model.is_ignored() || model.has_strict_unique_criteria() {
        return;
    }

    let loose: Vec<String> = model
        .unique_criterias()
        .filter(|c| !c.is_strict())
        .map(|c| format!("- {}", c.describe()))
        .collect();

    let mut detail = String::from(
        "Each model must have at least one unique criteria that has only required fields. \
         Either mark a single field with @id, @unique or add a multi field criterion with \
         @@id([]) or @@unique([]) to the model.",
    );
    if !loose.is_empty() {
        detail.push_str(
            " The following unique criterias were not considered as they contain fields that are not required:\n",
        );
        detail.push_str(&loose.join("\n"));
    }

    ctx.error(
        "Model has no unique criteria",
        detail,
        model.ast_model().name.span,
    );
}

pub(super) fn primary_key_fields_are_required(
    model: ModelWalker<'_>,
    ctx: &mut ValidationContext<'_>,
) {
    let Some(pk) = model.primary_key() else {
        return;
    };
    // Field level `@id` arity is checked while resolving the annotation.
    if pk.is_field_level() || model.is_ignored() {
        return;
    }
    for (field, _) in pk.fields() {
        if !field.arity().is_required() {
            ctx.error(
                "Invalid ID field",
                format!(
                    "The ID definition refers to the optional field \"{}\". ID definitions must reference only required fields.",
                    field.name()
                ),
                pk.span(),
            );
        }
    }
}

/// The `fields` argument of a block annotation.
fn fields_arg(annotation: &Annotation) -> Option<&Expr> {
    annotation
        .args
        .iter()
        .find(|arg| arg.name.as_ref().is_none_or(|name| name.name == "fields"))
        .map(|arg| &arg.value)
}

pub(super) fn fields_lists_are_not_empty(model: ModelWalker<'_>, ctx: &mut ValidationContext<'_>) {
    let db = ctx.db;
    let sources = model
        .primary_key()
        .filter(|pk| !pk.is_field_level())
        .map(|pk| pk.source())
        .into_iter()
        .chain(
            model
                .indexes()
                .filter(|idx| idx.annotation().source_field.is_none())
                .map(|idx| idx.source()),
        );

    for source in sources {
        let annotation = db.annotation(source);
        if let Some(Expr::List(items, span)) = fields_arg(annotation) {
            if !items.is_empty() {
                continue;
            }
            ctx.error(
                "Invalid annotation",
                format!(
                    "The fields argument of \"@@{}\" must not be empty.",
                    annotation.name.name
                ),
                *span,
            );
        }
    }
}

/// Ignored fields have no column, so no key or index may use them.
pub(super) fn index_fields_are_not_ignored(
    model: ModelWalker<'_>,
    ctx: &mut ValidationContext<'_>,
) {
    if model.is_ignored() {
        return;
    }
    let db = ctx.db;
    let keys = model
        .primary_key()
        .map(|pk| (pk.source(), pk.span(), pk.fields().collect::<Vec<_>>()))
        .into_iter()
        .chain(
            model
                .indexes()
                .map(|idx| (idx.source(), idx.span(), idx.fields().collect())),
        );

    for (source, span, fields) in keys {
        let annotation = db.annotation(source);
        let prefix = if annotation.is_block { "@@" } else { "@" };
        for (field, _) in fields.into_iter().filter(|(f, _)| f.is_ignored()) {
            ctx.error(
                "Invalid annotation",
                format!(
                    "The \"{prefix}{}\" annotation refers to the ignored field \"{}\". Fields of primary keys and indexes must not be ignored.",
                    annotation.name.name,
                    field.name()
                ),
                span,
            );
        }
    }
}

pub(super) fn index_names_are_unique(model: ModelWalker<'_>, ctx: &mut ValidationContext<'_>) {
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    let names = model
        .primary_key()
        .and_then(|pk| Some((pk.name()?, pk.span())))
        .into_iter()
        .chain(
            model
                .indexes()
                .filter_map(|idx| Some((idx.name()?, idx.span()))),
        );

    for (name, span) in names {
        let count = seen.entry(name).or_default();
        *count += 1;
        if *count > 1 {
            ctx.error(
                "Invalid index name",
                format!(
                    "The given custom name \"{name}\" has to be unique on the model. Please provide a different name for the name argument."
                ),
                span,
            );
        }
    }
}

pub(super) fn index_algorithms_are_supported(
    model: ModelWalker<'_>,
    ctx: &mut ValidationContext<'_>,
) {
    let dialect = ctx.db.dialect();
    if dialect.supports_index_algorithms() {
        return;
    }
    for index in model.indexes() {
        match index.annotation().algorithm {
            None | Some(IndexAlgorithm::BTree) => {}
            Some(algorithm) => ctx.error(
                "Invalid annotation",
                format!(
                    "The index algorithm \"{algorithm:?}\" is not supported by the {dialect} backend."
                ),
                index.span(),
            ),
        }
    }
}

pub(super) fn table_name_is_unique(model: ModelWalker<'_>, ctx: &mut ValidationContext<'_>) {
    if model.is_ignored() {
        return;
    }
    let table = model.database_name();
    let Some(first) = ctx
        .db
        .walk_models()
        .find(|other| !other.is_ignored() && other.database_name() == table)
    else {
        return;
    };
    if first == model {
        return;
    }
    ctx.error(
        "Duplicate table name",
        format!(
            "The model \"{}\" cannot be mapped to the table \"{table}\" because the model \"{}\" already uses it.",
            model.name(),
            first.name()
        ),
        model.ast_model().name.span,
    );
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::super::test_support::*;

    #[test]
    fn test_loose_unique_criterias_are_listed() {
        let diags = check("model A {\n  a int? @unique\n  b int?\n  c int?\n  @@unique([b, c])\n}\n");
        let found: Vec<_> = diags.with_summary("Model has no unique criteria").collect();
        assert_eq!(found.len(), 1);
        assert!(found[0].detail.ends_with(
            "not required:\n- a\n- b, c"
        ));
        assert_eq!(found[0].subject.start.line, 1);
    }

    #[rstest]
    #[case::id("model A {\n  id int @id\n}\n")]
    #[case::unique("model A {\n  email string @unique\n}\n")]
    #[case::compound("model A {\n  a int\n  b int\n  @@unique([a, b])\n}\n")]
    #[case::ignored("model A {\n  a int\n  @@ignore\n}\n")]
    fn test_models_with_strict_criteria(#[case] src: &str) {
        let diags = check(src);
        assert_eq!(summaries(&diags), Vec::<&str>::new());
    }

    #[test]
    fn test_optional_compound_id() {
        let diags = check("model A {\n  a int\n  b int?\n  @@id([a, b])\n}\n");
        assert!(summaries(&diags).contains(&"Invalid ID field"));
    }

    #[test]
    fn test_empty_fields_list() {
        let diags = check("model A {\n  id int @id\n  @@index([])\n}\n");
        assert_eq!(summaries(&diags), vec!["Invalid annotation"]);
        assert_eq!(
            diags.iter().next().unwrap().detail,
            "The fields argument of \"@@index\" must not be empty."
        );
    }

    #[test]
    fn test_duplicate_index_client_names() {
        let diags = check(
            "model A {\n  id int @id\n  a int\n  b int\n  @@index([a], name: \"lookup\")\n  @@index([b], name: \"lookup\")\n}\n",
        );
        assert_eq!(summaries(&diags), vec!["Invalid index name"]);
    }

    #[test]
    fn test_duplicate_table_names() {
        let diags = check(
            "model A {\n  id int @id\n  @@map(\"things\")\n}\nmodel B {\n  id int @id\n  @@map(\"things\")\n}\n",
        );
        let found: Vec<_> = diags.with_summary("Duplicate table name").collect();
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].detail,
            "The model \"B\" cannot be mapped to the table \"things\" because the model \"A\" already uses it."
        );
    }

    #[test]
    fn test_index_algorithm_on_sqlite() {
        let diags = check("@backend(sqlite)\nmodel A {\n  id int @id\n  a int\n  @@index([a], type: Hash)\n}\n");
        assert_eq!(summaries(&diags), vec!["Invalid annotation"]);

        let diags = check("model A {\n  id int @id\n  a int\n  @@index([a], type: Hash)\n}\n");
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[rstest]
    #[case::field_id(
        "model A {\n  id int @id @ignore\n  x  int @unique\n}\n",
        "The \"@id\" annotation refers to the ignored field \"id\". Fields of primary keys and indexes must not be ignored."
    )]
    #[case::compound_id(
        "model A {\n  a int\n  b int @ignore\n  @@id([a, b])\n}\n",
        "The \"@@id\" annotation refers to the ignored field \"b\". Fields of primary keys and indexes must not be ignored."
    )]
    #[case::field_unique(
        "model A {\n  id int @id\n  x  int @unique @ignore\n}\n",
        "The \"@unique\" annotation refers to the ignored field \"x\". Fields of primary keys and indexes must not be ignored."
    )]
    #[case::index(
        "model A {\n  id int @id\n  x  int @ignore\n  @@index([x])\n}\n",
        "The \"@@index\" annotation refers to the ignored field \"x\". Fields of primary keys and indexes must not be ignored."
    )]
    fn test_keys_on_ignored_fields(#[case] src: &str, #[case] detail: &str) {
        let diags = check(src);
        let details: Vec<_> = diags
            .with_summary("Invalid annotation")
            .map(|d| d.detail.as_str())
            .collect();
        assert_eq!(details, vec![detail]);
    }

    #[test]
    fn test_ignored_fields_outside_keys() {
        let diags = check("model A {\n  id int @id\n  x  int @ignore\n  @@ignore\n}\nmodel B {\n  id int @id\n  y  int @ignore\n}\n");
        assert_eq!(summaries(&diags), Vec::<&str>::new());
    }
}
