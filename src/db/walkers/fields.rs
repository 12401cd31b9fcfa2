use crate::ast::{Field, FieldArity};
use crate::builtins::BuiltInScalar;
use crate::db::ids::{ModelFieldId, RelationFieldId, ScalarFieldId};
use crate::db::types::{
    DefaultAnnotation, FieldRef, NativeTypeAnnotation, RelationField, RelationName,
    ScalarField, ScalarFieldType, SortOrder,
};
use crate::span::Span;

use super::{constraint_name, ModelWalker, RelationWalker, Walker};

pub type FieldWalker<'db> = Walker<'db, ModelFieldId>;
pub type ScalarFieldWalker<'db> = Walker<'db, ScalarFieldId>;
pub type RelationFieldWalker<'db> = Walker<'db, RelationFieldId>;

pub enum RefinedField<'db> {
    Scalar(ScalarFieldWalker<'db>),
    Relation(RelationFieldWalker<'db>),
}

impl<'db> FieldWalker<'db> {
    pub fn ast_field(self) -> &'db Field {
        &self.db.ast[self.id.model()][self.id.field()]
    }

    pub fn name(self) -> &'db str {
        &self.ast_field().name.name
    }

    pub fn model(self) -> ModelWalker<'db> {
        self.walk(self.id.model())
    }

    /// `None` when the field type did not resolve.
    pub fn refine(self) -> Option<RefinedField<'db>> {
        if self.db.types.scalar_fields.contains_key(&self.id) {
            Some(RefinedField::Scalar(self.walk(ScalarFieldId(self.id))))
        } else if self.db.types.relation_fields.contains_key(&self.id) {
            Some(RefinedField::Relation(self.walk(RelationFieldId(self.id))))
        } else {
            None
        }
    }
}

impl<'db> ScalarFieldWalker<'db> {
    pub fn scalar_field(self) -> &'db ScalarField {
        &self.db.types.scalar_fields[&self.id.0]
    }

    pub fn model_field_id(self) -> ModelFieldId {
        self.id.0
    }

    pub fn ast_field(self) -> &'db Field {
        self.walk(self.id.0).ast_field()
    }

    pub fn name(self) -> &'db str {
        &self.ast_field().name.name
    }

    pub fn model(self) -> ModelWalker<'db> {
        self.walk(self.id.0.model())
    }

    pub fn arity(self) -> FieldArity {
        self.ast_field().arity()
    }

    pub fn is_optional(self) -> bool {
        self.arity().is_optional()
    }

    /// Column name: the `@map` name or the field name.
    pub fn database_name(self) -> &'db str {
        self.scalar_field()
            .mapped_name
            .as_deref()
            .unwrap_or_else(|| self.name())
    }

    pub fn field_type(self) -> ScalarFieldType {
        self.scalar_field().field_type
    }

    pub fn scalar_type(self) -> Option<BuiltInScalar> {
        self.field_type().as_builtin()
    }

    pub fn is_ignored(self) -> bool {
        self.scalar_field().is_ignored
    }

    pub fn native_type(self) -> Option<&'db NativeTypeAnnotation> {
        self.scalar_field().native_type.as_ref()
    }

    pub fn default_value(self) -> Option<&'db DefaultAnnotation> {
        self.scalar_field().default.as_ref()
    }

    /// Name of the default constraint: its `map:` or `{table}_{column}_df`.
    pub fn default_constraint_name(self) -> Option<String> {
        let default = self.default_value()?;
        Some(match &default.mapped_name {
            Some(name) => name.clone(),
            None => constraint_name(
                self.model().database_name(),
                &[self.database_name()],
                "df",
                self.db.dialect().max_identifier_length(),
            ),
        })
    }
}

impl<'db> RelationFieldWalker<'db> {
    pub fn relation_field(self) -> &'db RelationField {
        &self.db.types.relation_fields[&self.id.0]
    }

    pub fn model_field_id(self) -> ModelFieldId {
        self.id.0
    }

    pub fn ast_field(self) -> &'db Field {
        self.walk(self.id.0).ast_field()
    }

    pub fn name(self) -> &'db str {
        &self.ast_field().name.name
    }

    pub fn model(self) -> ModelWalker<'db> {
        self.walk(self.id.0.model())
    }

    pub fn related_model(self) -> ModelWalker<'db> {
        self.walk(self.relation_field().referenced_model)
    }

    pub fn arity(self) -> FieldArity {
        self.ast_field().arity()
    }

    pub fn is_ignored(self) -> bool {
        self.relation_field().is_ignored
    }

    pub fn is_self_relation(self) -> bool {
        self.id.0.model() == self.relation_field().referenced_model
    }

    /// Explicit name, or `{A}To{B}` from the sorted model names.
    pub fn relation_name(self) -> RelationName {
        match &self.relation_field().name {
            Some(name) => RelationName::Explicit(name.clone()),
            None => RelationName::generated(self.model().name(), self.related_model().name()),
        }
    }

    pub fn relation(self) -> Option<RelationWalker<'db>> {
        self.db
            .relations
            .relation_of(self.id.0)
            .map(|id| self.walk(id))
    }

    /// `fields:` of `@ref`, as scalar field walkers.
    pub fn fields(self) -> Option<Vec<ScalarFieldWalker<'db>>> {
        self.relation_field()
            .fields
            .as_ref()
            .map(|refs| self.scalar_fields_of(refs))
    }

    /// `references:` of `@ref`, as scalar fields of the related model.
    pub fn references(self) -> Option<Vec<ScalarFieldWalker<'db>>> {
        self.relation_field()
            .references
            .as_ref()
            .map(|refs| self.scalar_fields_of(refs))
    }

    fn scalar_fields_of(self, refs: &[FieldRef]) -> Vec<ScalarFieldWalker<'db>> {
        refs.iter().map(|r| self.walk(ScalarFieldId(r.id()))).collect()
    }

    /// Span of the `@ref` annotation, or of the field.
    pub fn annotation_span(self) -> Span {
        match self.relation_field().annotation {
            Some(id) => self.db.annotation(id).span,
            None => self.ast_field().span,
        }
    }

    pub fn has_referential_actions(self) -> bool {
        let rf = self.relation_field();
        rf.on_delete.is_some() || rf.on_update.is_some()
    }
}

/// A field of an index or primary key with its sort order.
pub type IndexField<'db> = (ScalarFieldWalker<'db>, Option<SortOrder>);

#[cfg(test)]
mod tests {
    use crate::ast::SchemaAst;
    use crate::config::CompileOptions;
    use crate::db::{ParserDatabase, RefinedField};
    use crate::diagnostics::Diagnostics;
    use crate::parser::parse;
    use crate::span::FileId;

    fn db(src: &str) -> ParserDatabase {
        let (tops, mut diags): (_, Diagnostics) = parse(src, FileId(0));
        let db = ParserDatabase::new(SchemaAst { tops }, &CompileOptions::new(), &mut diags);
        assert!(diags.is_empty(), "{diags:?}");
        db.unwrap()
    }

    #[test]
    fn test_scalar_field_names() {
        let db = db("model User {\n  id int @id\n  email string @map(\"email_address\") @default(\"x\")\n  @@map(\"users\")\n}\n");
        let user = db.find_model("User").unwrap();
        let email = user.scalar_fields().nth(1).unwrap();
        assert_eq!(email.name(), "email");
        assert_eq!(email.database_name(), "email_address");
        assert_eq!(
            email.default_constraint_name().as_deref(),
            Some("users_email_address_df")
        );
        assert!(matches!(
            user.find_field("email").unwrap().refine(),
            Some(RefinedField::Scalar(_))
        ));
    }

    #[test]
    fn test_relation_field_accessors() {
        let db = db(r#"model User {
  id    int    @id
  posts Post[]
}
model Post {
  id       int  @id
  authorId int
  author   User @ref(fields: [authorId], references: [id])
}"#);
        let post = db.find_model("Post").unwrap();
        let author = post.relation_fields().next().unwrap();
        assert_eq!(author.related_model().name(), "User");
        assert_eq!(author.relation_name().as_str(), "PostToUser");
        assert_eq!(author.fields().unwrap()[0].name(), "authorId");
        assert_eq!(author.references().unwrap()[0].model().name(), "User");
        assert!(author.relation().is_some());
        assert!(!author.is_self_relation());
    }
}
