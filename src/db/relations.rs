//! Relation inference: pairs relation fields across models and classifies
//! each relation's cardinality.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

use super::ids::{ModelFieldId, RelationId};
use super::types::{FieldRef, IndexKind, RelationField, RelationName, TypesContext};
use crate::ast::{Field, FieldId, ModelId, SchemaAst};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationType {
    /// `field_a` on `model_a` and `field_b` on `model_b` are both lists.
    ImplicitManyToMany { field_a: FieldId, field_b: FieldId },
    /// Forward side only, with unique `fields`.
    OneToOneForward { field: FieldId },
    OneToOneBoth { field_a: FieldId, field_b: FieldId },
    /// Forward side only.
    OneToManyForward { field: FieldId },
    /// List side only. The field lives on `model_b`.
    OneToManyBack { field: FieldId },
    OneToManyBoth { field_a: FieldId, field_b: FieldId },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub name: RelationName,
    pub model_a: ModelId,
    pub model_b: ModelId,
    pub relation_type: RelationType,
}

impl Relation {
    /// The side carrying the foreign key, if any.
    pub fn forward_field(&self) -> Option<ModelFieldId> {
        match self.relation_type {
            RelationType::OneToOneForward { field } | RelationType::OneToManyForward { field } => {
                Some(ModelFieldId(self.model_a, field))
            }
            RelationType::OneToOneBoth { field_a, .. }
            | RelationType::OneToManyBoth { field_a, .. } => {
                Some(ModelFieldId(self.model_a, field_a))
            }
            RelationType::ImplicitManyToMany { .. } | RelationType::OneToManyBack { .. } => None,
        }
    }

    pub fn back_field(&self) -> Option<ModelFieldId> {
        match self.relation_type {
            RelationType::OneToManyBack { field } => Some(ModelFieldId(self.model_b, field)),
            RelationType::OneToOneBoth { field_b, .. }
            | RelationType::OneToManyBoth { field_b, .. } => {
                Some(ModelFieldId(self.model_b, field_b))
            }
            RelationType::ImplicitManyToMany { .. }
            | RelationType::OneToOneForward { .. }
            | RelationType::OneToManyForward { .. } => None,
        }
    }

    pub fn fields(&self) -> Vec<ModelFieldId> {
        match self.relation_type {
            RelationType::ImplicitManyToMany { field_a, field_b } => vec![
                ModelFieldId(self.model_a, field_a),
                ModelFieldId(self.model_b, field_b),
            ],
            _ => self
                .forward_field()
                .into_iter()
                .chain(self.back_field())
                .collect(),
        }
    }

    pub fn has_field(&self, id: ModelFieldId) -> bool {
        self.fields().contains(&id)
    }

    pub fn is_many_to_many(&self) -> bool {
        matches!(self.relation_type, RelationType::ImplicitManyToMany { .. })
    }

    pub fn is_one_to_one(&self) -> bool {
        matches!(
            self.relation_type,
            RelationType::OneToOneForward { .. } | RelationType::OneToOneBoth { .. }
        )
    }

    pub fn is_one_to_many(&self) -> bool {
        matches!(
            self.relation_type,
            RelationType::OneToManyForward { .. }
                | RelationType::OneToManyBack { .. }
                | RelationType::OneToManyBoth { .. }
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationsContext {
    relations: Vec<Relation>,
    /// Relation of each relation field. The first relation claiming a field
    /// keeps it.
    fields: BTreeMap<ModelFieldId, RelationId>,
}

impl RelationsContext {
    pub fn get(&self, id: RelationId) -> &Relation {
        &self.relations[id.0 as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (RelationId, &Relation)> {
        self.relations
            .iter()
            .enumerate()
            .map(|(i, r)| (RelationId(i as u32), r))
    }

    pub fn relation_of(&self, field: ModelFieldId) -> Option<RelationId> {
        self.fields.get(&field).copied()
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    fn push(&mut self, relation: Relation) {
        let id = RelationId(self.relations.len() as u32);
        for field in relation.fields() {
            self.fields.entry(field).or_insert(id);
        }
        self.relations.push(relation);
    }
}

struct Evidence<'a> {
    id: ModelFieldId,
    field: &'a Field,
    relation_field: &'a RelationField,
    model_name: &'a str,
    is_self_relation: bool,
    opposite: Option<Opposite<'a>>,
}

struct Opposite<'a> {
    model_name: &'a str,
    field: &'a Field,
    relation_field: &'a RelationField,
}

impl Evidence<'_> {
    fn qualified_self(&self) -> String {
        format!("{}.{}", self.model_name, self.field.name.name)
    }

    /// `Model.field` of this side and the opposite side.
    fn qualified_names(&self, opposite: &Opposite<'_>) -> (String, String) {
        (
            self.qualified_self(),
            format!("{}.{}", opposite.model_name, opposite.field.name.name),
        )
    }
}

pub(super) fn infer(ast: &SchemaAst, types: &TypesContext) -> RelationsContext {
    let mut ctx = RelationsContext::default();

    for (&id, rf) in &types.relation_fields {
        let evidence = gather_evidence(ast, types, id, rf);
        let Some(relation_type) = relation_type(types, &evidence) else {
            trace!(field = %evidence.qualified_self(), "skipped relation side");
            continue;
        };

        let (model_a, model_b) = match relation_type {
            RelationType::OneToManyBack { .. } => (rf.referenced_model, id.model()),
            _ => (id.model(), rf.referenced_model),
        };
        let name = match &rf.name {
            Some(name) => RelationName::Explicit(name.clone()),
            None => RelationName::generated(
                &ast[id.model()].name.name,
                &ast[rf.referenced_model].name.name,
            ),
        };

        trace!(field = %evidence.qualified_self(), relation = %name, ?relation_type, "inferred relation");
        ctx.push(Relation {
            name,
            model_a,
            model_b,
            relation_type,
        });
    }

    debug!(relations = ctx.len(), "inferred relations");
    ctx
}

fn gather_evidence<'a>(
    ast: &'a SchemaAst,
    types: &'a TypesContext,
    id: ModelFieldId,
    rf: &'a RelationField,
) -> Evidence<'a> {
    let model = &ast[id.model()];
    let related = &ast[rf.referenced_model];
    let is_self_relation = id.model() == rf.referenced_model;

    let opposite = related.iter_fields().find_map(|(field_id, field)| {
        if is_self_relation && field_id == id.field() {
            return None;
        }
        let orf = types
            .relation_fields
            .get(&ModelFieldId(rf.referenced_model, field_id))?;
        (orf.referenced_model == id.model() && orf.name == rf.name).then_some(Opposite {
            model_name: &related.name.name,
            field,
            relation_field: orf,
        })
    });

    Evidence {
        id,
        field: &model[id.field()],
        relation_field: rf,
        model_name: &model.name.name,
        is_self_relation,
        opposite,
    }
}

fn relation_type(types: &TypesContext, evidence: &Evidence<'_>) -> Option<RelationType> {
    let field = evidence.field.arity();
    let this = evidence.id.field();

    let Some(opposite) = &evidence.opposite else {
        if field.is_list() {
            return Some(RelationType::OneToManyBack { field: this });
        }
        return Some(if fields_are_unique(types, evidence.relation_field) {
            RelationType::OneToOneForward { field: this }
        } else {
            RelationType::OneToManyForward { field: this }
        });
    };

    let other = opposite.field.arity();
    let that = opposite.relation_field.field_id;
    let (this_name, that_name) = evidence.qualified_names(opposite);
    let both = |field_a, field_b| RelationType::OneToOneBoth { field_a, field_b };

    if field.is_list() && other.is_list() {
        if evidence.model_name > opposite.model_name {
            return None;
        }
        if evidence.is_self_relation && evidence.field.name.name > opposite.field.name.name {
            return None;
        }
        return Some(RelationType::ImplicitManyToMany {
            field_a: this,
            field_b: that,
        });
    }

    if field.is_list() {
        return None;
    }
    if other.is_list() {
        return Some(RelationType::OneToManyBoth {
            field_a: this,
            field_b: that,
        });
    }

    match (field.is_required(), other.is_required()) {
        (true, false) => Some(both(this, that)),
        (false, true) => None,
        _ => {
            let has_fields = evidence.relation_field.fields.is_some();
            let opposite_has_fields = opposite.relation_field.fields.is_some();
            match (has_fields, opposite_has_fields) {
                (true, false) => Some(both(this, that)),
                (false, true) => None,
                _ => (this_name < that_name).then(|| both(this, that)),
            }
        }
    }
}

/// Whether the relation's `fields` exactly form the primary key or a unique
/// index of its model.
fn fields_are_unique(types: &TypesContext, rf: &RelationField) -> bool {
    let Some(fields) = rf.fields.as_ref().filter(|f| !f.is_empty()) else {
        return false;
    };
    let Some(attrs) = types.model_annotations.get(&rf.model_id) else {
        return false;
    };
    let wanted: BTreeSet<FieldId> = fields.iter().map(|f| f.field_id).collect();
    let same = |refs: &[FieldRef]| {
        refs.len() == wanted.len() && refs.iter().all(|r| wanted.contains(&r.field_id))
    };

    attrs.primary_key.as_ref().is_some_and(|pk| same(&pk.fields))
        || attrs
            .indexes
            .iter()
            .any(|idx| idx.kind == IndexKind::Unique && same(&idx.fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TopId;
    use crate::db::{annotations, names, types};
    use crate::diagnostics::Diagnostics;
    use crate::eval::EvalContext;
    use crate::parser::parse;
    use crate::span::FileId;

    fn infer_src(src: &str) -> RelationsContext {
        let (tops, parse_diags) = parse(src, FileId(0));
        assert!(parse_diags.is_empty(), "{parse_diags:?}");
        let ast = SchemaAst { tops };
        let mut diags = Diagnostics::new();
        let names = names::resolve(&ast, &mut diags);
        let mut types = types::resolve_field_types(&ast, &names, &mut diags);
        let vars = BTreeMap::new();
        annotations::resolve(&ast, &names, &mut types, &EvalContext::new(&vars), &mut diags);
        infer(&ast, &types)
    }

    fn model(n: u32) -> ModelId {
        ModelId(TopId(n))
    }

    #[test]
    fn test_one_to_many_both_sides() {
        let rels = infer_src(
            r#"model User {
  id    int    @id
  posts Post[]
}
model Post {
  id       int  @id
  authorId int
  author   User @ref(fields: [authorId], references: [id])
}"#,
        );
        assert_eq!(rels.len(), 1);
        let (_, rel) = rels.iter().next().unwrap();
        assert_eq!(rel.model_a, model(1));
        assert_eq!(rel.model_b, model(0));
        assert_eq!(
            rel.relation_type,
            RelationType::OneToManyBoth {
                field_a: FieldId(2),
                field_b: FieldId(1)
            }
        );
        assert_eq!(rel.name.as_str(), "PostToUser");
        assert!(!rel.name.is_explicit());
    }

    #[test]
    fn test_back_side_only() {
        let rels = infer_src("model User {\n  id int @id\n  posts Post[]\n}\nmodel Post {\n  id int @id\n}\n");
        let (_, rel) = rels.iter().next().unwrap();
        assert_eq!(rel.relation_type, RelationType::OneToManyBack { field: FieldId(1) });
        assert_eq!(rel.model_a, model(1));
        assert_eq!(rel.model_b, model(0));
        assert_eq!(rel.back_field(), Some(ModelFieldId(model(0), FieldId(1))));
    }

    #[test]
    fn test_forward_only_unique_fields() {
        let rels = infer_src(
            r#"model Profile {
  id     int  @id
  userId int  @unique
  user   User @ref(fields: [userId], references: [id])
}
model User {
  id int @id
}"#,
        );
        let (_, rel) = rels.iter().next().unwrap();
        assert_eq!(rel.relation_type, RelationType::OneToOneForward { field: FieldId(2) });
    }

    #[test]
    fn test_one_to_one_optional_sides() {
        let rels = infer_src(
            r#"model User {
  id      int      @id
  profile Profile?
}
model Profile {
  id     int   @id
  userId int?  @unique
  user   User? @ref(fields: [userId], references: [id])
}"#,
        );
        assert_eq!(rels.len(), 1);
        let (_, rel) = rels.iter().next().unwrap();
        assert_eq!(rel.model_a, model(1));
        assert_eq!(
            rel.relation_type,
            RelationType::OneToOneBoth {
                field_a: FieldId(2),
                field_b: FieldId(1)
            }
        );
    }

    #[test]
    fn test_many_to_many_created_once() {
        let rels = infer_src(
            "model Post {\n  id int @id\n  tags Tag[]\n}\nmodel Tag {\n  id int @id\n  posts Post[]\n}\n",
        );
        assert_eq!(rels.len(), 1);
        let (_, rel) = rels.iter().next().unwrap();
        assert!(rel.is_many_to_many());
        assert_eq!(rel.model_a, model(0));
        assert_eq!(rel.fields().len(), 2);
    }

    #[test]
    fn test_self_relation_pairs_distinct_fields() {
        let rels = infer_src(
            r#"model Node {
  id       int    @id
  parentId int?
  parent   Node?  @ref("tree", fields: [parentId], references: [id])
  children Node[] @ref("tree")
}"#,
        );
        assert_eq!(rels.len(), 1);
        let (_, rel) = rels.iter().next().unwrap();
        assert_eq!(rel.name, RelationName::Explicit("tree".into()));
        assert_eq!(
            rel.relation_type,
            RelationType::OneToManyBoth {
                field_a: FieldId(2),
                field_b: FieldId(3)
            }
        );
    }

    #[test]
    fn test_every_relation_field_is_claimed() {
        let rels = infer_src(
            "model A {\n  id int @id\n  b1 B?\n  b2 B?\n}\nmodel B {\n  id int @id\n}\n",
        );
        assert_eq!(rels.len(), 2);
        assert!(rels.relation_of(ModelFieldId(model(0), FieldId(1))).is_some());
        assert!(rels.relation_of(ModelFieldId(model(0), FieldId(2))).is_some());
    }
}
