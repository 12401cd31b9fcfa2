//! Relation field and relation shape checks.

use crate::db::types::{RefAction, ReferentialAction, RelationIdentifier};
use crate::db::{
    ImplicitManyToManyWalker, InlineRelationWalker, ModelWalker, RefinedRelation,
    RelationFieldWalker, RelationWalker, ScalarFieldWalker,
};

use super::{quoted_list, ValidationContext};

const INVALID: &str = "Invalid relation";

/// `Model.field`.
fn qualified(field: RelationFieldWalker<'_>) -> String {
    format!("{}.{}", field.model().name(), field.name())
}

fn names<'a>(fields: &[ScalarFieldWalker<'a>]) -> Vec<&'a str> {
    fields.iter().map(|f| f.name()).collect()
}

/// Relation fields sharing model, related model and relation name must be
/// told apart by an explicit name.
pub(super) fn ambiguity(field: RelationFieldWalker<'_>, ctx: &mut ValidationContext<'_>) {
    let model = field.model();
    let related = field.related_model();
    let name = field.relation_name();
    let identifier = RelationIdentifier {
        model: model.id,
        related: related.id,
        name: name.clone(),
    };
    let Some(group) = ctx.db.types().relation_names.get(&identifier) else {
        return;
    };
    if group.len() < 2 {
        return;
    }

    let model_ast = model.ast_model();
    let fields = quoted_list(group.iter().map(|id| model_ast[*id].name.name.as_str()));
    let is_self_relation = field.is_self_relation();

    let message = match (name.is_explicit(), is_self_relation, group.len()) {
        (true, true, 2) => return,
        (false, true, 2) => format!(
            "Ambiguous self relation detected. The fields {fields} in model \"{}\" both refer to \"{}\".\nIf they are part of the same relation, add the same relation name for them with `@ref(<name>)`.",
            model.name(),
            related.name()
        ),
        (false, true, _) => format!(
            "Unnamed self relation detected. The fields {fields} in model \"{}\" have no relation name. Please provide a relation name for one of them by adding @ref(<name>).",
            model.name()
        ),
        (true, true, _) => format!(
            "Wrongly named self relation detected. The fields {fields} in model \"{}\" have the same relation name. At most two relation fields can belong to the same relation and therefore have the same name. Please assign a different relation name to one of them.",
            model.name()
        ),
        (false, false, _) => format!(
            "Ambiguous relation detected. The fields {fields} in model \"{}\" both refer to \"{}\". Please provide different relation names for them by adding @ref(<name>).",
            model.name(),
            related.name()
        ),
        (true, false, _) => format!(
            "Wrongly named relation detected. The fields {fields} in model \"{}\" both use the same relation name. Please provide different relation names for them through @ref(<name>).",
            model.name()
        ),
    };

    ctx.ambiguous.insert(field.model_field_id());
    ctx.error("Ambiguous relation detected", message, field.ast_field().span);
}

pub(super) fn ignored_related_model(field: RelationFieldWalker<'_>, ctx: &mut ValidationContext<'_>) {
    let related = field.related_model();
    if !related.is_ignored() || field.is_ignored() || field.model().is_ignored() {
        return;
    }
    ctx.error(
        "Invalid relation field",
        format!(
            "The relation field \"{}\" on model \"{}\" must specify the @ignore annotation, because the model \"{}\" it is pointing to is marked ignored.",
            field.name(),
            field.model().name(),
            related.name()
        ),
        field.ast_field().span,
    );
}

pub(super) fn referenced_fields_are_not_ignored(
    field: RelationFieldWalker<'_>,
    ctx: &mut ValidationContext<'_>,
) {
    if field.is_ignored() || field.model().is_ignored() {
        return;
    }
    let arguments = [("fields", field.fields()), ("references", field.references())];
    for (argument, scalars) in arguments {
        for scalar in scalars.unwrap_or_default().into_iter().filter(|f| f.is_ignored()) {
            ctx.error(
                INVALID,
                format!(
                    "The {argument} argument of {} refers to the ignored field \"{}.{}\".",
                    qualified(field),
                    scalar.model().name(),
                    scalar.name()
                ),
                field.annotation_span(),
            );
        }
    }
}

pub(super) fn relation(relation: RelationWalker<'_>, ctx: &mut ValidationContext<'_>) {
    if relation.is_ignored()
        || relation
            .relation_fields()
            .any(|f| ctx.ambiguous.contains(&f.model_field_id()))
    {
        return;
    }

    match relation.refine() {
        RefinedRelation::ImplicitManyToMany(m2m) => many_to_many(m2m, ctx),
        RefinedRelation::Inline(inline) => {
            if !opposite_is_present(inline, ctx) {
                return;
            }
            let errors_before = ctx.diags.error_count();
            common(inline, ctx);
            if inline.is_one_to_one() {
                one_to_one(inline, ctx, errors_before);
            } else {
                one_to_many(inline, ctx);
            }
        }
    }
}

fn opposite_is_present(inline: InlineRelationWalker<'_>, ctx: &mut ValidationContext<'_>) -> bool {
    if inline.is_both_sided() {
        return true;
    }
    let Some(field) = inline.forward_field().or(inline.back_field()) else {
        return false;
    };
    ctx.error(
        INVALID,
        format!(
            "The relation field \"{}\" is missing an opposite relation field on the model \"{}\".",
            qualified(field),
            field.related_model().name()
        ),
        field.ast_field().span,
    );
    false
}

fn has_arguments(field: RelationFieldWalker<'_>) -> bool {
    let rf = field.relation_field();
    rf.fields.is_some() || rf.references.is_some()
}

/// The side declaring `fields` or `references`.
fn defining_field(inline: InlineRelationWalker<'_>) -> Option<RelationFieldWalker<'_>> {
    inline
        .forward_field()
        .filter(|f| has_arguments(*f))
        .or_else(|| inline.back_field().filter(|f| has_arguments(*f)))
}

/// Describes how to make `fields` unique on `model`.
fn unique_hint(model: ModelWalker<'_>, fields: &[&str]) -> String {
    match fields {
        [single] => format!(
            "a `@unique` annotation to the field \"{single}\" in the model \"{}\"",
            model.name()
        ),
        _ => format!(
            "an `@@unique([{}])` annotation to the model \"{}\"",
            fields.join(", "),
            model.name()
        ),
    }
}

fn is_unique_criteria(model: ModelWalker<'_>, fields: &[ScalarFieldWalker<'_>]) -> bool {
    let ids: Vec<_> = fields.iter().map(|f| f.model_field_id()).collect();
    model.unique_criterias().any(|c| c.contains_exactly(&ids))
}

fn common(inline: InlineRelationWalker<'_>, ctx: &mut ValidationContext<'_>) {
    let Some(field) = defining_field(inline) else {
        return;
    };
    let span = field.annotation_span();
    let fields = field.fields().unwrap_or_default();
    let references = field.references().unwrap_or_default();
    let related = field.related_model();

    if !references.is_empty() && !is_unique_criteria(related, &references) {
        ctx.error(
            INVALID,
            format!(
                "The argument `references` must refer to a unique criteria in the related model. Consider adding {}.",
                unique_hint(related, &names(&references))
            ),
            span,
        );
    }

    if field.relation_field().fields.is_some()
        && field.relation_field().references.is_some()
        && fields.len() != references.len()
    {
        ctx.error(
            INVALID,
            "You must specify the same number of fields in `fields` and `references`.",
            span,
        );
    }

    if field.arity().is_required() && fields.iter().any(|f| f.is_optional()) {
        ctx.error(
            INVALID,
            format!(
                "The relation field \"{}\" uses the scalar fields {}. At least one of those fields is optional. Hence the relation field must be optional as well.",
                field.name(),
                names(&fields).join(", ")
            ),
            span,
        );
    }

    for (referencing, referenced) in fields.iter().zip(&references) {
        if referencing.field_type() != referenced.field_type() {
            ctx.error(
                INVALID,
                format!(
                    "The type of the field \"{}\" in the model \"{}\" is not matching the type of the referenced field \"{}\" in model \"{}\".",
                    referencing.name(),
                    referencing.model().name(),
                    referenced.name(),
                    referenced.model().name()
                ),
                span,
            );
        }
    }

    if fields.iter().any(|f| f.arity().is_required()) {
        let rf = field.relation_field();
        for (argument, action) in [("onDelete", rf.on_delete), ("onUpdate", rf.on_update)] {
            if let Some(RefAction {
                action: ReferentialAction::SetNull,
                span,
            }) = action
            {
                ctx.error(
                    INVALID,
                    format!(
                        "The {argument} referential action of a relation must not be set to SetNull when a referenced field is required."
                    ),
                    span,
                );
            }
        }
    }
}

fn one_to_one(inline: InlineRelationWalker<'_>, ctx: &mut ValidationContext<'_>, errors_before: usize) {
    let (Some(forward), Some(back)) = (inline.forward_field(), inline.back_field()) else {
        return;
    };
    let forward_rf = forward.relation_field();
    let back_rf = back.relation_field();

    if !has_arguments(forward) && !has_arguments(back) {
        ctx.error(
            INVALID,
            format!(
                "The relation fields \"{}\" and \"{}\" do not provide the fields and references arguments. Provide them on one side of the one-to-one relation with @ref(fields: [...], references: [...]).",
                qualified(forward),
                qualified(back)
            ),
            forward.ast_field().span,
        );
        return;
    }

    let both_fields = forward_rf.fields.is_some() && back_rf.fields.is_some();
    let both_references = forward_rf.references.is_some() && back_rf.references.is_some();
    if both_fields || both_references {
        let message = format!(
            "The relation fields \"{}\" and \"{}\" both provide the fields or references argument in the @ref annotation. You have to provide it only on one of the two fields.",
            qualified(forward),
            qualified(back)
        );
        ctx.error(INVALID, message.clone(), forward.annotation_span());
        ctx.error(INVALID, message, back.annotation_span());
    }

    if forward.has_referential_actions() && back.has_referential_actions() {
        let message = format!(
            "The relation fields \"{}\" and \"{}\" both provide the onDelete or onUpdate argument in the @ref annotation. You have to provide it only on the field that also provides the fields argument.",
            qualified(forward),
            qualified(back)
        );
        ctx.error(INVALID, message.clone(), forward.annotation_span());
        ctx.error(INVALID, message, back.annotation_span());
    } else if back.has_referential_actions() && !has_arguments(back) {
        ctx.error(
            INVALID,
            format!(
                "The relation field \"{}\" provides the onDelete or onUpdate argument, but the relation is defined on the field \"{}\". Move the referential actions there.",
                qualified(back),
                qualified(forward)
            ),
            back.annotation_span(),
        );
    }

    if let Some(defining) = defining_field(inline) {
        let fields = defining.fields().unwrap_or_default();
        if !fields.is_empty() && !is_unique_criteria(defining.model(), &fields) {
            ctx.error(
                INVALID,
                format!(
                    "A one-to-one relation must use unique fields on the defining side. Either add {}, or change the relation to one-to-many.",
                    unique_hint(defining.model(), &names(&fields))
                ),
                defining.annotation_span(),
            );
        }
    }

    if ctx.diags.error_count() > errors_before {
        return;
    }

    let mixed = |a: RelationFieldWalker<'_>, b: RelationFieldWalker<'_>| {
        a.relation_field().fields.is_some() && b.relation_field().references.is_some()
    };
    if mixed(forward, back) || mixed(back, forward) {
        let (with_fields, with_references) = if mixed(forward, back) {
            (forward, back)
        } else {
            (back, forward)
        };
        ctx.error(
            INVALID,
            format!(
                "The relation field \"{}\" defines the fields argument, and the field \"{}\" the references argument. Both arguments must be set on the same side.",
                qualified(with_fields),
                qualified(with_references)
            ),
            with_fields.annotation_span(),
        );
        return;
    }

    if back.arity().is_required() && forward.arity().is_required() {
        ctx.error(
            INVALID,
            format!(
                "The relation field \"{}\" is required. This is not valid because it's not possible to enforce this constraint on the database level. Please change the field type from \"{}\" to \"{}?\" to fix this.",
                qualified(back),
                back.related_model().name(),
                back.related_model().name()
            ),
            back.ast_field().span,
        );
        return;
    }

    if forward.arity().is_required() && has_arguments(back) {
        ctx.error(
            INVALID,
            format!(
                "The relation field \"{}\" defines the fields and/or references argument. You must set them on the required side of the relation \"{}\" in order for the constraints to be enforced. Alternatively, you can change this field to be required and the other optional.",
                qualified(back),
                qualified(forward)
            ),
            back.annotation_span(),
        );
    }
}

fn one_to_many(inline: InlineRelationWalker<'_>, ctx: &mut ValidationContext<'_>) {
    let (Some(forward), Some(back)) = (inline.forward_field(), inline.back_field()) else {
        return;
    };
    let forward_rf = forward.relation_field();

    if forward_rf.fields.is_none() || forward_rf.references.is_none() {
        ctx.error(
            INVALID,
            format!(
                "The relation field \"{}\" must specify the fields and references arguments in the @ref annotation.",
                qualified(forward)
            ),
            forward.annotation_span(),
        );
    }

    if has_arguments(back) {
        ctx.error(
            INVALID,
            format!(
                "The relation field \"{}\" must not specify the fields or references argument in the @ref annotation. Provide them on the field \"{}\" instead.",
                qualified(back),
                qualified(forward)
            ),
            back.annotation_span(),
        );
    }

    if back.has_referential_actions() {
        ctx.error(
            INVALID,
            format!(
                "The relation field \"{}\" must not specify the onDelete or onUpdate argument in the @ref annotation. Provide them on the field \"{}\" instead.",
                qualified(back),
                qualified(forward)
            ),
            back.annotation_span(),
        );
    }
}

fn many_to_many(m2m: ImplicitManyToManyWalker<'_>, ctx: &mut ValidationContext<'_>) {
    for field in [m2m.field_a(), m2m.field_b()] {
        let related = field.related_model();
        let id_field = related
            .primary_key()
            .map(|pk| pk.fields().map(|(f, _)| f).collect::<Vec<_>>())
            .filter(|fields| fields.len() == 1)
            .and_then(|mut fields| fields.pop());

        let Some(id_field) = id_field else {
            ctx.error(
                INVALID,
                format!(
                    "The relation field \"{}\" on model \"{}\" references \"{}\" which does not have an @id field. Models without @id cannot be part of a many to many relation. Use an explicit intermediate model to represent this relationship.",
                    field.name(),
                    field.model().name(),
                    related.name()
                ),
                field.ast_field().span,
            );
            continue;
        };

        if let Some(references) = field.references() {
            if references.len() != 1 || references[0] != id_field {
                let wrong: Vec<&str> = references
                    .iter()
                    .filter(|r| **r != id_field)
                    .map(|r| r.name())
                    .collect();
                ctx.error(
                    INVALID,
                    format!(
                        "Implicit many-to-many relations must always reference the id field of the related model. Change the argument `references` to use the id field of the related model \"{}\". But it is referencing the following fields that are not the id: {}",
                        related.name(),
                        wrong.join(", ")
                    ),
                    field.annotation_span(),
                );
            }
        }

        if field.relation_field().fields.is_some() {
            ctx.error(
                INVALID,
                format!(
                    "The relation field \"{}\" on model \"{}\" must not specify the fields argument in the @ref annotation. Implicit many-to-many relations do not hold foreign keys on either side.",
                    field.name(),
                    field.model().name()
                ),
                field.annotation_span(),
            );
        }

        let rf = field.relation_field();
        for action in [rf.on_delete, rf.on_update].into_iter().flatten() {
            ctx.error(
                INVALID,
                "Referential actions on implicit many-to-many relations are not supported.",
                action.span,
            );
        }
    }
}
