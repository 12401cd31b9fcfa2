//! Field type resolution and the records produced by type and annotation
//! resolution.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use super::ids::{AnnotId, ModelFieldId};
use super::names::NamesContext;
use crate::ast::{EnumId, Expr, FieldId, ModelId, SchemaAst, Top};
use crate::builtins::BuiltInScalar;
use crate::diagnostics::Diagnostics;
use crate::eval::from_value_by_name;
use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScalarFieldType {
    BuiltIn(BuiltInScalar),
    Enum(EnumId),
}

impl ScalarFieldType {
    pub fn as_builtin(self) -> Option<BuiltInScalar> {
        match self {
            ScalarFieldType::BuiltIn(scalar) => Some(scalar),
            ScalarFieldType::Enum(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NativeTypeAnnotation {
    /// Name without the `db.` prefix.
    pub name: String,
    pub args: Vec<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DefaultAnnotation {
    pub value: Expr,
    pub mapped_name: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    pub model_id: ModelId,
    pub field_id: FieldId,
    pub field_type: ScalarFieldType,
    pub native_type: Option<NativeTypeAnnotation>,
    pub default: Option<DefaultAnnotation>,
    pub mapped_name: Option<String>,
    pub is_ignored: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Asc" => Ok(SortOrder::Asc),
            "Desc" => Ok(SortOrder::Desc),
            _ => Err(()),
        }
    }
}

from_value_by_name!(SortOrder, "sort order (Asc or Desc)");

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize)]
pub enum IndexAlgorithm {
    #[default]
    BTree,
    Hash,
    Gist,
    Gin,
    SpGist,
    Brin,
}

impl IndexAlgorithm {
    pub fn sql_name(self) -> &'static str {
        match self {
            IndexAlgorithm::BTree => "BTREE",
            IndexAlgorithm::Hash => "HASH",
            IndexAlgorithm::Gist => "GIST",
            IndexAlgorithm::Gin => "GIN",
            IndexAlgorithm::SpGist => "SPGIST",
            IndexAlgorithm::Brin => "BRIN",
        }
    }
}

impl FromStr for IndexAlgorithm {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BTree" => Ok(IndexAlgorithm::BTree),
            "Hash" => Ok(IndexAlgorithm::Hash),
            "Gist" => Ok(IndexAlgorithm::Gist),
            "Gin" => Ok(IndexAlgorithm::Gin),
            "SpGist" => Ok(IndexAlgorithm::SpGist),
            "Brin" => Ok(IndexAlgorithm::Brin),
            _ => Err(()),
        }
    }
}

from_value_by_name!(
    IndexAlgorithm,
    "index algorithm (BTree, Hash, Gist, Gin, SpGist or Brin)"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub enum ReferentialAction {
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl ReferentialAction {
    pub fn sql(self) -> &'static str {
        match self {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl FromStr for ReferentialAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NoAction" => Ok(ReferentialAction::NoAction),
            "Restrict" => Ok(ReferentialAction::Restrict),
            "Cascade" => Ok(ReferentialAction::Cascade),
            "SetNull" => Ok(ReferentialAction::SetNull),
            "SetDefault" => Ok(ReferentialAction::SetDefault),
            _ => Err(()),
        }
    }
}

from_value_by_name!(
    ReferentialAction,
    "referential action (NoAction, Restrict, Cascade, SetNull or SetDefault)"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefAction {
    pub action: ReferentialAction,
    pub span: Span,
}

/// A field named in `fields`, `references` or an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldRef {
    pub model_id: ModelId,
    pub field_id: FieldId,
    pub sort: Option<SortOrder>,
}

impl FieldRef {
    pub fn id(self) -> ModelFieldId {
        ModelFieldId(self.model_id, self.field_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationField {
    pub model_id: ModelId,
    pub field_id: FieldId,
    pub referenced_model: ModelId,
    /// Explicit relation name from `@ref(name)`.
    pub name: Option<String>,
    pub fields: Option<Vec<FieldRef>>,
    pub references: Option<Vec<FieldRef>>,
    pub on_delete: Option<RefAction>,
    pub on_update: Option<RefAction>,
    /// Foreign key constraint name from `@ref(map:)`.
    pub mapped_name: Option<String>,
    pub is_ignored: bool,
    pub annotation: Option<AnnotId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Normal,
    Unique,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexAnnotation {
    pub kind: IndexKind,
    pub fields: Vec<FieldRef>,
    /// Client name from `name:`.
    pub name: Option<String>,
    /// Database name from `map:`.
    pub mapped_name: Option<String>,
    pub algorithm: Option<IndexAlgorithm>,
    /// Set for field-level `@unique`.
    pub source_field: Option<FieldId>,
    pub source: AnnotId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdAnnotation {
    pub fields: Vec<FieldRef>,
    pub name: Option<String>,
    pub mapped_name: Option<String>,
    /// Set for field-level `@id`.
    pub source_field: Option<FieldId>,
    pub source: AnnotId,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelAnnotations {
    pub primary_key: Option<IdAnnotation>,
    pub indexes: Vec<IndexAnnotation>,
    pub mapped_name: Option<String>,
    pub is_ignored: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumAnnotations {
    pub mapped_name: Option<String>,
    /// Keyed by value index.
    pub mapped_values: BTreeMap<u32, String>,
}

/// Relation fields sharing a model, a related model and a relation name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelationIdentifier {
    pub model: ModelId,
    pub related: ModelId,
    pub name: RelationName,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelationName {
    Explicit(String),
    Generated(String),
}

impl RelationName {
    /// `"{A}To{B}"` with the model names in lexicographic order.
    pub fn generated(model_a: &str, model_b: &str) -> Self {
        if model_a < model_b {
            RelationName::Generated(format!("{model_a}To{model_b}"))
        } else {
            RelationName::Generated(format!("{model_b}To{model_a}"))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RelationName::Explicit(name) | RelationName::Generated(name) => name,
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, RelationName::Explicit(_))
    }
}

impl fmt::Display for RelationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypesContext {
    pub scalar_fields: BTreeMap<ModelFieldId, ScalarField>,
    pub relation_fields: BTreeMap<ModelFieldId, RelationField>,
    pub model_annotations: BTreeMap<ModelId, ModelAnnotations>,
    pub enum_annotations: BTreeMap<EnumId, EnumAnnotations>,
    pub relation_names: BTreeMap<RelationIdentifier, Vec<FieldId>>,
}

/// Classifies every model field as scalar or relation field.
pub(super) fn resolve_field_types(
    ast: &SchemaAst,
    names: &NamesContext,
    diags: &mut Diagnostics,
) -> TypesContext {
    let mut ctx = TypesContext::default();

    for (model_id, model) in ast.iter_models() {
        for (field_id, field) in model.iter_fields() {
            let id = ModelFieldId(model_id, field_id);
            let type_name = &field.field_type.name;

            if let Some(scalar) = BuiltInScalar::from_name(&type_name.name) {
                ctx.scalar_fields.insert(
                    id,
                    ScalarField::new(model_id, field_id, ScalarFieldType::BuiltIn(scalar)),
                );
                continue;
            }

            match names.tops.get(&type_name.name).map(|top| (top, &ast[*top])) {
                Some((top, Top::Enum(_))) => {
                    ctx.scalar_fields.insert(
                        id,
                        ScalarField::new(model_id, field_id, ScalarFieldType::Enum(EnumId(*top))),
                    );
                }
                Some((top, Top::Model(_))) => {
                    ctx.relation_fields.insert(
                        id,
                        RelationField::new(model_id, field_id, ModelId(*top)),
                    );
                }
                _ => diags.error(
                    "Type not found",
                    format!(
                        "Type \"{}\" is neither a built-in type, nor refers to another model or enum.",
                        type_name.name
                    ),
                    type_name.span,
                ),
            }
        }
    }

    debug!(
        scalar_fields = ctx.scalar_fields.len(),
        relation_fields = ctx.relation_fields.len(),
        "resolved field types"
    );
    ctx
}

impl ScalarField {
    fn new(model_id: ModelId, field_id: FieldId, field_type: ScalarFieldType) -> Self {
        Self {
            model_id,
            field_id,
            field_type,
            native_type: None,
            default: None,
            mapped_name: None,
            is_ignored: false,
        }
    }
}

impl RelationField {
    fn new(model_id: ModelId, field_id: FieldId, referenced_model: ModelId) -> Self {
        Self {
            model_id,
            field_id,
            referenced_model,
            name: None,
            fields: None,
            references: None,
            on_delete: None,
            on_update: None,
            mapped_name: None,
            is_ignored: false,
            annotation: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::names;
    use crate::parser::parse;
    use crate::span::FileId;

    #[test]
    fn test_field_classification() {
        let src = "model A {\n  id int\n  role Role\n  b B\n  c Missing\n}\nmodel B {\n  id int\n}\nenum Role {\n  X\n}\n";
        let (tops, _) = parse(src, FileId(0));
        let ast = SchemaAst { tops };
        let mut diags = Diagnostics::new();
        let names = names::resolve(&ast, &mut diags);
        let types = resolve_field_types(&ast, &names, &mut diags);

        let a = ModelId(crate::ast::TopId(0));
        assert_eq!(
            types.scalar_fields[&ModelFieldId(a, FieldId(0))].field_type,
            ScalarFieldType::BuiltIn(BuiltInScalar::Int)
        );
        assert!(matches!(
            types.scalar_fields[&ModelFieldId(a, FieldId(1))].field_type,
            ScalarFieldType::Enum(_)
        ));
        assert!(types.relation_fields.contains_key(&ModelFieldId(a, FieldId(2))));
        assert_eq!(diags.with_summary("Type not found").count(), 1);
    }

    #[test]
    fn test_generated_relation_name_is_ordered() {
        assert_eq!(
            RelationName::generated("User", "Post"),
            RelationName::Generated("PostToUser".into())
        );
        assert_eq!(RelationName::generated("A", "A").as_str(), "AToA");
    }

    #[test]
    fn test_keyword_enums() {
        assert_eq!("SetNull".parse(), Ok(ReferentialAction::SetNull));
        assert_eq!("SpGist".parse(), Ok(IndexAlgorithm::SpGist));
        assert!("Sideways".parse::<SortOrder>().is_err());
    }
}
