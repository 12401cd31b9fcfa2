use crate::ast::FieldArity;
use crate::db::ids::{
    InlineRelationId, ManyToManyRelationId, ModelFieldId, RelationFieldId, RelationId,
};
use crate::db::relations::{Relation, RelationType};
use crate::db::types::{RefAction, ReferentialAction, RelationName};

use super::{constraint_name, ModelWalker, RelationFieldWalker, ScalarFieldWalker, Walker};

pub type RelationWalker<'db> = Walker<'db, RelationId>;
pub type InlineRelationWalker<'db> = Walker<'db, InlineRelationId>;
pub type ImplicitManyToManyWalker<'db> = Walker<'db, ManyToManyRelationId>;

pub enum RefinedRelation<'db> {
    Inline(InlineRelationWalker<'db>),
    ImplicitManyToMany(ImplicitManyToManyWalker<'db>),
}

impl<'db> RelationWalker<'db> {
    pub fn get(self) -> &'db Relation {
        self.db.relations.get(self.id)
    }

    pub fn name(self) -> &'db RelationName {
        &self.get().name
    }

    pub fn model_a(self) -> ModelWalker<'db> {
        self.walk(self.get().model_a)
    }

    pub fn model_b(self) -> ModelWalker<'db> {
        self.walk(self.get().model_b)
    }

    pub fn refine(self) -> RefinedRelation<'db> {
        if self.get().is_many_to_many() {
            RefinedRelation::ImplicitManyToMany(self.walk(ManyToManyRelationId(self.id)))
        } else {
            RefinedRelation::Inline(self.walk(InlineRelationId(self.id)))
        }
    }

    pub fn relation_fields(self) -> impl Iterator<Item = RelationFieldWalker<'db>> {
        self.get()
            .fields()
            .into_iter()
            .map(move |id| self.walk(RelationFieldId(id)))
    }

    pub fn is_ignored(self) -> bool {
        self.relation_fields().any(|f| f.is_ignored())
            || self.model_a().is_ignored()
            || self.model_b().is_ignored()
    }
}

impl<'db> InlineRelationWalker<'db> {
    pub fn relation(self) -> RelationWalker<'db> {
        self.walk(self.id.0)
    }

    pub fn get(self) -> &'db Relation {
        self.relation().get()
    }

    /// The model carrying the foreign key.
    pub fn referencing_model(self) -> ModelWalker<'db> {
        self.relation().model_a()
    }

    pub fn referenced_model(self) -> ModelWalker<'db> {
        self.relation().model_b()
    }

    pub fn forward_field(self) -> Option<RelationFieldWalker<'db>> {
        self.get()
            .forward_field()
            .map(|id| self.walk(RelationFieldId(id)))
    }

    pub fn back_field(self) -> Option<RelationFieldWalker<'db>> {
        self.get()
            .back_field()
            .map(|id| self.walk(RelationFieldId(id)))
    }

    pub fn is_one_to_one(self) -> bool {
        self.get().is_one_to_one()
    }

    pub fn is_both_sided(self) -> bool {
        matches!(
            self.get().relation_type,
            RelationType::OneToOneBoth { .. } | RelationType::OneToManyBoth { .. }
        )
    }

    /// Fields of `@ref(fields:)` on either side.
    pub fn referencing_fields(self) -> Vec<ScalarFieldWalker<'db>> {
        self.forward_field()
            .and_then(|f| f.fields())
            .unwrap_or_default()
    }

    pub fn referenced_fields(self) -> Vec<ScalarFieldWalker<'db>> {
        self.forward_field()
            .and_then(|f| f.references())
            .unwrap_or_default()
    }

    /// Whether a foreign key is lowered for this relation.
    pub fn has_foreign_key(self) -> bool {
        self.forward_field()
            .is_some_and(|f| f.relation_field().fields.is_some())
    }

    /// `onDelete`, defaulting to `Restrict` for a required forward field
    /// and `SetNull` otherwise.
    pub fn on_delete(self) -> ReferentialAction {
        let forward = self.forward_field();
        match forward.and_then(|f| f.relation_field().on_delete) {
            Some(RefAction { action, .. }) => action,
            None if forward.is_some_and(|f| f.arity() == FieldArity::Required) => {
                ReferentialAction::Restrict
            }
            None => ReferentialAction::SetNull,
        }
    }

    pub fn on_update(self) -> ReferentialAction {
        self.forward_field()
            .and_then(|f| f.relation_field().on_update)
            .map(|a| a.action)
            .unwrap_or(ReferentialAction::Cascade)
    }

    /// `map:` of `@ref` or `{table}_{columns}_fkey`.
    pub fn constraint_name(self) -> String {
        let forward = self.forward_field();
        if let Some(name) = forward.and_then(|f| f.relation_field().mapped_name.clone()) {
            return name;
        }
        let fields = self.referencing_fields();
        let columns: Vec<&str> = fields.iter().map(|f| f.database_name()).collect();
        constraint_name(
            self.referencing_model().database_name(),
            &columns,
            "fkey",
            self.db.dialect().max_identifier_length(),
        )
    }
}

impl<'db> ImplicitManyToManyWalker<'db> {
    pub fn relation(self) -> RelationWalker<'db> {
        self.walk(self.id.0)
    }

    pub fn model_a(self) -> ModelWalker<'db> {
        self.relation().model_a()
    }

    pub fn model_b(self) -> ModelWalker<'db> {
        self.relation().model_b()
    }

    pub fn field_a(self) -> RelationFieldWalker<'db> {
        self.side(true)
    }

    pub fn field_b(self) -> RelationFieldWalker<'db> {
        self.side(false)
    }

    fn side(self, a: bool) -> RelationFieldWalker<'db> {
        let relation = self.relation().get();
        let RelationType::ImplicitManyToMany { field_a, field_b } = relation.relation_type else {
            panic!("relation {:?} is not many-to-many", self.id.0);
        };
        let id = if a {
            ModelFieldId(relation.model_a, field_a)
        } else {
            ModelFieldId(relation.model_b, field_b)
        };
        self.walk(RelationFieldId(id))
    }

    /// `_{relationName}`.
    pub fn table_name(self) -> String {
        format!("_{}", self.relation().name())
    }

    pub fn unique_index_name(self) -> String {
        format!("{}_AB_unique", self.table_name())
    }

    pub fn index_name(self) -> String {
        format!("{}_B_index", self.table_name())
    }

    /// Foreign key of the join column `A` or `B`.
    pub fn foreign_key_name(self, column: &str) -> String {
        format!("{}_{column}_fkey", self.table_name())
    }
}
