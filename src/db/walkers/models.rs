use crate::ast::{FieldId, Model, ModelId};
use crate::db::ids::{IndexId, ModelFieldId, PrimaryKeyId, RelationFieldId, ScalarFieldId};
use crate::db::types::ModelAnnotations;

use super::{
    FieldWalker, IndexWalker, InlineRelationWalker, PrimaryKeyWalker, RefinedRelation,
    RelationFieldWalker, RelationWalker, ScalarFieldWalker, Walker,
};

pub type ModelWalker<'db> = Walker<'db, ModelId>;

impl<'db> ModelWalker<'db> {
    pub fn ast_model(self) -> &'db Model {
        &self.db.ast[self.id]
    }

    pub fn name(self) -> &'db str {
        &self.ast_model().name.name
    }

    /// Table name: the `@@map` name or the model name.
    pub fn database_name(self) -> &'db str {
        self.annotations()
            .mapped_name
            .as_deref()
            .unwrap_or_else(|| self.name())
    }

    pub fn annotations(self) -> &'db ModelAnnotations {
        &self.db.types.model_annotations[&self.id]
    }

    pub fn is_ignored(self) -> bool {
        self.annotations().is_ignored
    }

    pub fn fields(self) -> impl Iterator<Item = FieldWalker<'db>> {
        let id = self.id;
        self.ast_model()
            .iter_fields()
            .map(move |(field_id, _)| self.walk(ModelFieldId(id, field_id)))
    }

    pub fn find_field(self, name: &str) -> Option<FieldWalker<'db>> {
        let field_id = self.db.names.model_fields.get(&(self.id, name.to_string()))?;
        Some(self.walk(ModelFieldId(self.id, *field_id)))
    }

    pub fn scalar_fields(self) -> impl Iterator<Item = ScalarFieldWalker<'db>> {
        let id = self.id;
        self.db
            .types
            .scalar_fields
            .range(ModelFieldId(id, FieldId(0))..=ModelFieldId(id, FieldId(u32::MAX)))
            .map(move |(field, _)| self.walk(ScalarFieldId(*field)))
    }

    pub fn relation_fields(self) -> impl Iterator<Item = RelationFieldWalker<'db>> {
        let id = self.id;
        self.db
            .types
            .relation_fields
            .range(ModelFieldId(id, FieldId(0))..=ModelFieldId(id, FieldId(u32::MAX)))
            .map(move |(field, _)| self.walk(RelationFieldId(*field)))
    }

    pub fn primary_key(self) -> Option<PrimaryKeyWalker<'db>> {
        self.annotations()
            .primary_key
            .as_ref()
            .map(|_| self.walk(PrimaryKeyId(self.id)))
    }

    /// `@unique`, `@@unique` and `@@index`, in declaration order.
    pub fn indexes(self) -> impl Iterator<Item = IndexWalker<'db>> {
        let id = self.id;
        (0..self.annotations().indexes.len()).map(move |i| self.walk(IndexId(id, i as u32)))
    }

    /// Primary key first, then unique indexes.
    pub fn unique_criterias(self) -> impl Iterator<Item = UniqueCriteria<'db>> {
        let primary_key = self.primary_key().map(|pk| UniqueCriteria {
            fields: pk.fields().map(|(f, _)| f).collect(),
            is_primary_key: true,
        });
        let uniques = self.indexes().filter(|idx| idx.is_unique()).map(|idx| UniqueCriteria {
            fields: idx.fields().map(|(f, _)| f).collect(),
            is_primary_key: false,
        });
        primary_key.into_iter().chain(uniques)
    }

    pub fn has_strict_unique_criteria(self) -> bool {
        self.unique_criterias()
            .any(|c| c.is_strict() && !c.fields.is_empty())
    }

    /// Relations in which this model takes part.
    pub fn relations(self) -> impl Iterator<Item = RelationWalker<'db>> {
        let id = self.id;
        self.db
            .walk_relations()
            .filter(move |rel| rel.get().model_a == id || rel.get().model_b == id)
    }

    /// Inline relations whose foreign key lives on this model, in field
    /// order.
    pub fn foreign_keys(self) -> impl Iterator<Item = InlineRelationWalker<'db>> {
        self.relation_fields()
            .filter(|f| !f.is_ignored())
            .filter_map(|field| {
                let RefinedRelation::Inline(inline) = field.relation()?.refine() else {
                    return None;
                };
                let owns_key = inline.forward_field() == Some(field) && inline.has_foreign_key();
                owns_key.then_some(inline)
            })
    }
}

/// Fields that together identify a row.
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueCriteria<'db> {
    pub fields: Vec<ScalarFieldWalker<'db>>,
    pub is_primary_key: bool,
}

impl UniqueCriteria<'_> {
    /// All fields are required.
    pub fn is_strict(&self) -> bool {
        self.fields.iter().all(|f| f.ast_field().arity().is_required())
    }

    pub fn contains_exactly(&self, fields: &[ModelFieldId]) -> bool {
        self.fields.len() == fields.len()
            && self.fields.iter().all(|f| fields.contains(&f.model_field_id()))
    }

    /// Field names, e.g. `email, tenantId`.
    pub fn describe(&self) -> String {
        self.fields
            .iter()
            .map(|f| f.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
