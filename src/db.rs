//! The resolved schema: the syntax tree together with the name, type and
//! relation contexts computed over it.

mod annotations;
pub mod ids;
pub mod names;
pub mod relations;
pub mod specs;
pub mod types;
pub mod walkers;

use std::collections::BTreeMap;

use tracing::{debug, debug_span};

use crate::ast::{Annotation, BlockId, EnumId, ModelId, SchemaAst};
use crate::config::{self, CompileOptions, Config};
use crate::diagnostics::Diagnostics;
use crate::eval::{EvalContext, Value};
use crate::sql::Dialect;

pub use ids::*;
use names::NamesContext;
use relations::RelationsContext;
use types::TypesContext;
pub use walkers::*;

/// Immutable result of resolving a `SchemaAst`. Validation and lowering read
/// it through walkers.
#[derive(Debug)]
pub struct ParserDatabase {
    ast: SchemaAst,
    names: NamesContext,
    types: TypesContext,
    relations: RelationsContext,
    config: Config,
    variables: BTreeMap<String, Value>,
}

impl ParserDatabase {
    /// Runs name, type and annotation resolution and relation inference.
    ///
    /// Returns `None` when name resolution reported errors. Problems found by
    /// later passes are recorded in `diags` and the database is still built.
    pub fn new(ast: SchemaAst, options: &CompileOptions, diags: &mut Diagnostics) -> Option<Self> {
        let _span = debug_span!("resolve", tops = ast.tops.len()).entered();

        let errors_before = diags.error_count();
        let names = names::resolve(&ast, diags);
        if diags.error_count() > errors_before {
            debug!("name resolution failed, stopping");
            return None;
        }

        let eval = EvalContext::new(&options.variables);
        let config = config::resolve_directives(&ast, &eval, options, diags);
        let mut types = types::resolve_field_types(&ast, &names, diags);
        annotations::resolve(&ast, &names, &mut types, &eval, diags);
        let relations = relations::infer(&ast, &types);

        Some(Self {
            ast,
            names,
            types,
            relations,
            config,
            variables: options.variables.clone(),
        })
    }

    pub fn ast(&self) -> &SchemaAst {
        &self.ast
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dialect(&self) -> Dialect {
        self.config.dialect()
    }

    /// Values for `$name` references, used when defaults are validated.
    pub fn variables(&self) -> &BTreeMap<String, Value> {
        &self.variables
    }

    pub fn names(&self) -> &NamesContext {
        &self.names
    }

    pub fn types(&self) -> &TypesContext {
        &self.types
    }

    pub fn relations(&self) -> &RelationsContext {
        &self.relations
    }

    pub fn walk<I>(&self, id: I) -> Walker<'_, I> {
        Walker { db: self, id }
    }

    pub fn walk_models(&self) -> impl Iterator<Item = ModelWalker<'_>> {
        self.ast.iter_models().map(|(id, _)| self.walk(id))
    }

    pub fn walk_enums(&self) -> impl Iterator<Item = EnumWalker<'_>> {
        self.ast.iter_enums().map(|(id, _)| self.walk(id))
    }

    pub fn walk_blocks(&self) -> impl Iterator<Item = BlockWalker<'_>> {
        self.ast.iter_blocks().map(|(id, _)| self.walk(id))
    }

    pub fn walk_relations(&self) -> impl Iterator<Item = RelationWalker<'_>> {
        self.relations.iter().map(|(id, _)| self.walk(id))
    }

    pub fn find_model(&self, name: &str) -> Option<ModelWalker<'_>> {
        let top = *self.names.tops.get(name)?;
        self.ast[top].as_model().map(|_| self.walk(ModelId(top)))
    }

    pub fn find_enum(&self, name: &str) -> Option<EnumWalker<'_>> {
        let top = *self.names.tops.get(name)?;
        self.ast[top].as_enum().map(|_| self.walk(EnumId(top)))
    }

    pub fn find_block(&self, kind: &str, name: &str) -> Option<BlockWalker<'_>> {
        let id: BlockId = *self.names.blocks.get(&(kind.to_string(), name.to_string()))?;
        Some(self.walk(id))
    }

    pub fn annotation(&self, id: AnnotId) -> &Annotation {
        let annotations = match id.owner {
            AnnotOwner::Model(model) => &self.ast[model].annotations,
            AnnotOwner::Field(field) => &self.ast[field.model()][field.field()].annotations,
        };
        &annotations[id.index as usize]
    }
}
