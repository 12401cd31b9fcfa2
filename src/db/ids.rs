use crate::ast::{EnumId, FieldId, ModelId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelFieldId(pub ModelId, pub FieldId);

impl ModelFieldId {
    pub fn model(self) -> ModelId {
        self.0
    }

    pub fn field(self) -> FieldId {
        self.1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EnumValueId(pub EnumId, pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelationId(pub u32);

/// A model field known to be a scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScalarFieldId(pub ModelFieldId);

/// A model field known to be a relation field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelationFieldId(pub ModelFieldId);

/// Index of an `@unique`, `@@unique` or `@@index` within its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexId(pub ModelId, pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PrimaryKeyId(pub ModelId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InlineRelationId(pub RelationId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ManyToManyRelationId(pub RelationId);

/// Node owning a resolved annotation that later passes point back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnnotOwner {
    Model(ModelId),
    Field(ModelFieldId),
}

/// Position of an annotation in its owner's annotation list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnnotId {
    pub owner: AnnotOwner,
    pub index: u32,
}

impl AnnotId {
    pub fn new(owner: AnnotOwner, index: usize) -> Self {
        Self {
            owner,
            index: index as u32,
        }
    }
}
