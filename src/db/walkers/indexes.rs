use crate::db::ids::{AnnotId, IndexId, PrimaryKeyId, ScalarFieldId};
use crate::db::types::{FieldRef, IdAnnotation, IndexAlgorithm, IndexAnnotation, IndexKind};
use crate::span::Span;

use super::{constraint_name, IndexField, ModelWalker, Walker};

pub type IndexWalker<'db> = Walker<'db, IndexId>;
pub type PrimaryKeyWalker<'db> = Walker<'db, PrimaryKeyId>;

fn index_fields<'db>(
    walker: Walker<'db, impl Copy>,
    refs: &'db [FieldRef],
) -> impl Iterator<Item = IndexField<'db>> {
    refs.iter()
        .map(move |r| (walker.walk(ScalarFieldId(r.id())), r.sort))
}

impl<'db> IndexWalker<'db> {
    pub fn annotation(self) -> &'db IndexAnnotation {
        &self.model().annotations().indexes[self.id.1 as usize]
    }

    pub fn model(self) -> ModelWalker<'db> {
        self.walk(self.id.0)
    }

    pub fn is_unique(self) -> bool {
        self.annotation().kind == IndexKind::Unique
    }

    pub fn fields(self) -> impl Iterator<Item = IndexField<'db>> {
        index_fields(self, &self.annotation().fields)
    }

    /// Client name from `name:`.
    pub fn name(self) -> Option<&'db str> {
        self.annotation().name.as_deref()
    }

    pub fn algorithm(self) -> IndexAlgorithm {
        self.annotation().algorithm.unwrap_or_default()
    }

    pub fn source(self) -> AnnotId {
        self.annotation().source
    }

    pub fn span(self) -> Span {
        self.db.annotation(self.source()).span
    }

    /// `map:` or `{table}_{columns}_key` / `{table}_{columns}_idx`.
    pub fn constraint_name(self) -> String {
        if let Some(name) = &self.annotation().mapped_name {
            return name.clone();
        }
        let columns: Vec<&str> = self.fields().map(|(f, _)| f.database_name()).collect();
        let suffix = if self.is_unique() { "key" } else { "idx" };
        constraint_name(
            self.model().database_name(),
            &columns,
            suffix,
            self.db.dialect().max_identifier_length(),
        )
    }
}

impl<'db> PrimaryKeyWalker<'db> {
    pub fn annotation(self) -> &'db IdAnnotation {
        match &self.model().annotations().primary_key {
            Some(pk) => pk,
            None => panic!("model {:?} has no primary key", self.id.0),
        }
    }

    pub fn model(self) -> ModelWalker<'db> {
        self.walk(self.id.0)
    }

    pub fn fields(self) -> impl Iterator<Item = IndexField<'db>> {
        index_fields(self, &self.annotation().fields)
    }

    pub fn name(self) -> Option<&'db str> {
        self.annotation().name.as_deref()
    }

    /// Declared with `@id` on a field rather than `@@id`.
    pub fn is_field_level(self) -> bool {
        self.annotation().source_field.is_some()
    }

    pub fn source(self) -> AnnotId {
        self.annotation().source
    }

    pub fn span(self) -> Span {
        self.db.annotation(self.source()).span
    }

    /// `map:` or `{table}_pkey`.
    pub fn constraint_name(self) -> String {
        match &self.annotation().mapped_name {
            Some(name) => name.clone(),
            None => constraint_name(
                self.model().database_name(),
                &[],
                "pkey",
                self.db.dialect().max_identifier_length(),
            ),
        }
    }
}
