//! Constraint name uniqueness.

use std::collections::BTreeMap;
use std::fmt;

use crate::ast::ModelId;
use crate::db::{ModelWalker, ParserDatabase, RefinedRelation, ScalarFieldWalker};
use crate::span::Span;
use crate::sql::Dialect;

use super::ValidationContext;

/// Database objects that carry a constraint name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    PrimaryKey,
    Index,
    ForeignKey,
    Default,
}

/// A namespace in which a constraint name must be unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConstraintScope {
    GlobalKeyIndex,
    GlobalPrimaryKeyIndex,
    ModelKeyIndex,
    ModelPrimaryKeyIndex,
    GlobalForeignKey,
    ModelPrimaryKeyForeignKey,
    GlobalPrimaryKeyForeignKeyDefault,
}

impl ConstraintScope {
    pub fn is_model_scope(self) -> bool {
        matches!(
            self,
            ConstraintScope::ModelKeyIndex
                | ConstraintScope::ModelPrimaryKeyIndex
                | ConstraintScope::ModelPrimaryKeyForeignKey
        )
    }

    /// Scopes a constraint kind takes part in on `dialect`.
    pub fn for_kind(kind: ConstraintKind, dialect: Dialect) -> &'static [ConstraintScope] {
        use ConstraintKind::*;
        use ConstraintScope::*;

        match (dialect, kind) {
            (Dialect::Postgres, PrimaryKey) => &[GlobalPrimaryKeyIndex, ModelPrimaryKeyForeignKey],
            (Dialect::Postgres, Index) => &[GlobalPrimaryKeyIndex],
            (Dialect::Postgres, ForeignKey) => &[ModelPrimaryKeyForeignKey],
            (Dialect::Sqlite, Index) => &[GlobalKeyIndex],
            (Dialect::Sqlite, PrimaryKey | ForeignKey) => &[],
            (_, Default) => &[],
        }
    }

    fn describe(self, model: &str) -> String {
        match self {
            ConstraintScope::GlobalKeyIndex => {
                "indexes and unique constraints across all models".to_string()
            }
            ConstraintScope::GlobalPrimaryKeyIndex => {
                "primary keys, indexes and unique constraints across all models".to_string()
            }
            ConstraintScope::ModelKeyIndex => {
                format!("indexes and unique constraints on model \"{model}\"")
            }
            ConstraintScope::ModelPrimaryKeyIndex => {
                format!("primary key, indexes and unique constraints on model \"{model}\"")
            }
            ConstraintScope::GlobalForeignKey => "foreign keys across all models".to_string(),
            ConstraintScope::ModelPrimaryKeyForeignKey => {
                format!("primary key and foreign keys on model \"{model}\"")
            }
            ConstraintScope::GlobalPrimaryKeyForeignKeyDefault => {
                "primary keys, foreign keys and default constraints across all models".to_string()
            }
        }
    }
}

impl fmt::Display for ConstraintScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

type NamespaceKey = (ConstraintScope, Option<ModelId>, String);

/// How often each constraint name occurs per scope.
#[derive(Debug)]
pub(crate) struct ConstraintNamespace {
    counts: BTreeMap<NamespaceKey, usize>,
    dialect: Dialect,
}

impl ConstraintNamespace {
    pub fn build(db: &ParserDatabase) -> Self {
        let mut namespace = Self {
            counts: BTreeMap::new(),
            dialect: db.dialect(),
        };

        for model in db.walk_models().filter(|m| !m.is_ignored()) {
            if let Some(pk) = model.primary_key() {
                namespace.add(ConstraintKind::PrimaryKey, model.id, pk.constraint_name());
            }
            for index in model.indexes() {
                namespace.add(ConstraintKind::Index, model.id, index.constraint_name());
            }
            for field in model.scalar_fields().filter(|f| !f.is_ignored()) {
                if let Some(name) = field.default_constraint_name() {
                    namespace.add(ConstraintKind::Default, model.id, name);
                }
            }
            for inline in model.foreign_keys() {
                namespace.add(ConstraintKind::ForeignKey, model.id, inline.constraint_name());
            }
        }

        for relation in db.walk_relations().filter(|r| !r.is_ignored()) {
            let RefinedRelation::ImplicitManyToMany(m2m) = relation.refine() else {
                continue;
            };
            namespace.add_join_table(ConstraintKind::Index, m2m.unique_index_name());
            namespace.add_join_table(ConstraintKind::Index, m2m.index_name());
            namespace.add_join_table(ConstraintKind::ForeignKey, m2m.foreign_key_name("A"));
            namespace.add_join_table(ConstraintKind::ForeignKey, m2m.foreign_key_name("B"));
        }

        namespace
    }

    fn add(&mut self, kind: ConstraintKind, model: ModelId, name: String) {
        for &scope in ConstraintScope::for_kind(kind, self.dialect) {
            let model = scope.is_model_scope().then_some(model);
            *self.counts.entry((scope, model, name.clone())).or_default() += 1;
        }
    }

    /// Join tables are not models, so only the global scopes see their names.
    fn add_join_table(&mut self, kind: ConstraintKind, name: String) {
        for &scope in ConstraintScope::for_kind(kind, self.dialect) {
            if !scope.is_model_scope() {
                *self.counts.entry((scope, None, name.clone())).or_default() += 1;
            }
        }
    }

    /// Scopes in which `name` occurs more than once.
    fn clashes(&self, kind: ConstraintKind, model: ModelId, name: &str) -> Vec<ConstraintScope> {
        ConstraintScope::for_kind(kind, self.dialect)
            .iter()
            .copied()
            .filter(|scope| {
                let model = scope.is_model_scope().then_some(model);
                self.counts
                    .get(&(*scope, model, name.to_string()))
                    .is_some_and(|count| *count > 1)
            })
            .collect()
    }
}

/// Reports `name` once for every scope in which it is taken more than once.
fn check(
    ctx: &mut ValidationContext<'_>,
    kind: ConstraintKind,
    model: ModelWalker<'_>,
    name: &str,
    span: Span,
) {
    for scope in ctx.constraint_names.clashes(kind, model.id, name) {
        ctx.error(
            "Duplicate constraint name",
            format!(
                "The constraint name \"{name}\" is not unique for {}.",
                scope.describe(model.name())
            ),
            span,
        );
    }
}

pub(super) fn model_constraint_names(model: ModelWalker<'_>, ctx: &mut ValidationContext<'_>) {
    if model.is_ignored() {
        return;
    }
    if let Some(pk) = model.primary_key() {
        check(ctx, ConstraintKind::PrimaryKey, model, &pk.constraint_name(), pk.span());
    }
    for index in model.indexes() {
        check(ctx, ConstraintKind::Index, model, &index.constraint_name(), index.span());
    }
    for inline in model.foreign_keys() {
        let span = inline
            .forward_field()
            .map_or(model.ast_model().span, |f| f.annotation_span());
        check(ctx, ConstraintKind::ForeignKey, model, &inline.constraint_name(), span);
    }
}

pub(super) fn default_constraint_name(field: ScalarFieldWalker<'_>, ctx: &mut ValidationContext<'_>) {
    if field.is_ignored() || field.model().is_ignored() {
        return;
    }
    let (Some(name), Some(default)) = (field.default_constraint_name(), field.default_value())
    else {
        return;
    };
    check(ctx, ConstraintKind::Default, field.model(), &name, default.span);
}
