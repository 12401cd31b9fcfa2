//! Validator suite. Each validator inspects one walker and only appends
//! diagnostics; none of them stops the suite.

mod constraints;
mod defaults;
mod fields;
mod models;
mod native_types;
mod relations;

use std::collections::BTreeSet;

use tracing::debug;

use crate::db::{
    FieldWalker, ModelFieldId, ModelWalker, ParserDatabase, RelationFieldWalker, RelationWalker,
    ScalarFieldWalker,
};
use crate::diagnostics::Diagnostics;
use crate::span::Span;

use constraints::ConstraintNamespace;
pub use constraints::{ConstraintKind, ConstraintScope};

type ModelValidator = fn(ModelWalker<'_>, &mut ValidationContext<'_>);
type FieldValidator = fn(FieldWalker<'_>, &mut ValidationContext<'_>);
type ScalarFieldValidator = fn(ScalarFieldWalker<'_>, &mut ValidationContext<'_>);
type RelationFieldValidator = fn(RelationFieldWalker<'_>, &mut ValidationContext<'_>);
type RelationValidator = fn(RelationWalker<'_>, &mut ValidationContext<'_>);

const MODEL_VALIDATORS: &[ModelValidator] = &[
    models::has_unique_criteria,
    models::primary_key_fields_are_required,
    models::fields_lists_are_not_empty,
    models::index_fields_are_not_ignored,
    models::index_names_are_unique,
    models::index_algorithms_are_supported,
    models::table_name_is_unique,
    constraints::model_constraint_names,
];

const FIELD_VALIDATORS: &[FieldValidator] = &[fields::name_does_not_clash_with_index_names];

const SCALAR_FIELD_VALIDATORS: &[ScalarFieldValidator] = &[
    fields::scalar_list_is_supported,
    defaults::default_value,
    native_types::native_type,
    constraints::default_constraint_name,
];

const RELATION_FIELD_VALIDATORS: &[RelationFieldValidator] = &[
    relations::ambiguity,
    relations::ignored_related_model,
    relations::referenced_fields_are_not_ignored,
];

const RELATION_VALIDATORS: &[RelationValidator] = &[relations::relation];

pub(crate) struct ValidationContext<'db> {
    pub db: &'db ParserDatabase,
    pub diags: Diagnostics,
    pub constraint_names: ConstraintNamespace,
    /// Relation fields reported as ambiguous.
    pub ambiguous: BTreeSet<ModelFieldId>,
}

impl ValidationContext<'_> {
    pub fn error(&mut self, summary: &str, detail: impl Into<String>, span: Span) {
        self.diags.error(summary, detail, span);
    }
}

/// Runs every validator over `db` and appends the findings to `diags`.
pub fn validate(db: &ParserDatabase, diags: &mut Diagnostics) {
    let mut ctx = ValidationContext {
        db,
        diags: Diagnostics::new(),
        constraint_names: ConstraintNamespace::build(db),
        ambiguous: BTreeSet::new(),
    };

    for model in db.walk_models() {
        for validator in MODEL_VALIDATORS {
            validator(model, &mut ctx);
        }
        for field in model.fields() {
            for validator in FIELD_VALIDATORS {
                validator(field, &mut ctx);
            }
        }
        for field in model.scalar_fields() {
            for validator in SCALAR_FIELD_VALIDATORS {
                validator(field, &mut ctx);
            }
        }
        for field in model.relation_fields() {
            for validator in RELATION_FIELD_VALIDATORS {
                validator(field, &mut ctx);
            }
        }
    }

    for relation in db.walk_relations() {
        for validator in RELATION_VALIDATORS {
            validator(relation, &mut ctx);
        }
    }

    debug!(
        errors = ctx.diags.error_count(),
        "validated {} models",
        db.walk_models().count()
    );
    diags.extend(ctx.diags);
}

/// `"a" and "b"`, `"a", "b" and "c"`.
pub(crate) fn quoted_list<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let names: Vec<String> = names.into_iter().map(|n| format!("\"{n}\"")).collect();
    match names.as_slice() {
        [] => String::new(),
        [one] => one.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::ast::SchemaAst;
    use crate::config::CompileOptions;
    use crate::db::ParserDatabase;
    use crate::diagnostics::Diagnostics;
    use crate::parser::parse;
    use crate::span::FileId;

    /// Diagnostics of resolution plus validation.
    pub fn check(src: &str) -> Diagnostics {
        check_with(src, &CompileOptions::new())
    }

    pub fn check_with(src: &str, options: &CompileOptions) -> Diagnostics {
        let (tops, mut diags) = parse(src, FileId(0));
        assert!(diags.is_empty(), "{diags:?}");
        let db = ParserDatabase::new(SchemaAst { tops }, options, &mut diags)
            .expect("names resolve");
        super::validate(&db, &mut diags);
        diags
    }

    pub fn summaries(diags: &Diagnostics) -> Vec<&str> {
        diags.iter().map(|d| d.summary.as_str()).collect()
    }
}
