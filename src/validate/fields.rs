use crate::db::{FieldWalker, ScalarFieldWalker};

use super::ValidationContext;

/// A field may not share its name with a custom index or primary key name
/// of its model.
pub(super) fn name_does_not_clash_with_index_names(
    field: FieldWalker<'_>,
    ctx: &mut ValidationContext<'_>,
) {
    let model = field.model();
    let name = field.name();

    let primary_key = model
        .primary_key()
        .filter(|pk| pk.name() == Some(name))
        .map(|pk| ("@@id", pk.span()));
    let indexes = model
        .indexes()
        .filter(|idx| idx.name() == Some(name))
        .map(|idx| {
            let annotation = if idx.is_unique() { "@@unique" } else { "@@index" };
            (annotation, idx.span())
        });

    for (annotation, span) in primary_key.into_iter().chain(indexes) {
        ctx.error(
            "Invalid index name",
            format!(
                "The custom name \"{name}\" specified for the {annotation} annotation is already used as a name for a field. Please choose a different name."
            ),
            span,
        );
    }
}

pub(super) fn scalar_list_is_supported(
    field: ScalarFieldWalker<'_>,
    ctx: &mut ValidationContext<'_>,
) {
    let dialect = ctx.db.dialect();
    if field.arity().is_list() && !dialect.supports_scalar_lists() {
        ctx.error(
            "Invalid field type",
            format!(
                "The field \"{}\" is a list, but scalar lists are not supported by the {dialect} backend.",
                field.name()
            ),
            field.ast_field().field_type.span,
        );
    }
}
