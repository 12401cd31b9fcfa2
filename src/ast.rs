//! Parse tree of a KSL schema. All top-level declarations of every source
//! file live in one arena, `SchemaAst::tops`, addressed by `TopId`.

use std::ops::Index;

use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TopId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelId(pub TopId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EnumId(pub TopId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub TopId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DirectiveId(pub TopId);

/// Index of a field within its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaAst {
    pub tops: Vec<Top>,
}

impl SchemaAst {
    pub fn iter_tops(&self) -> impl Iterator<Item = (TopId, &Top)> {
        self.tops
            .iter()
            .enumerate()
            .map(|(i, top)| (TopId(i as u32), top))
    }

    pub fn iter_models(&self) -> impl Iterator<Item = (ModelId, &Model)> {
        self.iter_tops()
            .filter_map(|(id, top)| top.as_model().map(|m| (ModelId(id), m)))
    }

    pub fn iter_enums(&self) -> impl Iterator<Item = (EnumId, &Enum)> {
        self.iter_tops()
            .filter_map(|(id, top)| top.as_enum().map(|e| (EnumId(id), e)))
    }

    pub fn iter_blocks(&self) -> impl Iterator<Item = (BlockId, &Block)> {
        self.iter_tops()
            .filter_map(|(id, top)| top.as_block().map(|b| (BlockId(id), b)))
    }

    pub fn iter_directives(&self) -> impl Iterator<Item = (DirectiveId, &Directive)> {
        self.iter_tops()
            .filter_map(|(id, top)| top.as_directive().map(|d| (DirectiveId(id), d)))
    }
}

impl Index<TopId> for SchemaAst {
    type Output = Top;

    fn index(&self, id: TopId) -> &Top {
        &self.tops[id.0 as usize]
    }
}

impl Index<ModelId> for SchemaAst {
    type Output = Model;

    fn index(&self, id: ModelId) -> &Model {
        match &self[id.0] {
            Top::Model(model) => model,
            other => panic!("{:?} is a {}, not a model", id, other.kind()),
        }
    }
}

impl Index<EnumId> for SchemaAst {
    type Output = Enum;

    fn index(&self, id: EnumId) -> &Enum {
        match &self[id.0] {
            Top::Enum(e) => e,
            other => panic!("{:?} is a {}, not an enum", id, other.kind()),
        }
    }
}

impl Index<BlockId> for SchemaAst {
    type Output = Block;

    fn index(&self, id: BlockId) -> &Block {
        match &self[id.0] {
            Top::Block(b) => b,
            other => panic!("{:?} is a {}, not a block", id, other.kind()),
        }
    }
}

impl Index<DirectiveId> for SchemaAst {
    type Output = Directive;

    fn index(&self, id: DirectiveId) -> &Directive {
        match &self[id.0] {
            Top::Directive(d) => d,
            other => panic!("{:?} is a {}, not a directive", id, other.kind()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Top {
    Model(Model),
    Enum(Enum),
    Block(Block),
    Directive(Directive),
}

impl Top {
    pub fn kind(&self) -> &'static str {
        match self {
            Top::Model(_) => "model",
            Top::Enum(_) => "enum",
            Top::Block(_) => "block",
            Top::Directive(_) => "directive",
        }
    }

    /// Declared name. Directives are anonymous.
    pub fn name(&self) -> Option<&Ident> {
        match self {
            Top::Model(m) => Some(&m.name),
            Top::Enum(e) => Some(&e.name),
            Top::Block(b) => Some(&b.name),
            Top::Directive(_) => None,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Top::Model(m) => m.span,
            Top::Enum(e) => e.span,
            Top::Block(b) => b.span,
            Top::Directive(d) => d.span,
        }
    }

    pub fn as_model(&self) -> Option<&Model> {
        match self {
            Top::Model(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&Enum> {
        match self {
            Top::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Top::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_directive(&self) -> Option<&Directive> {
        match self {
            Top::Directive(d) => Some(d),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub name: Ident,
    pub fields: Vec<Field>,
    /// `@@` annotations.
    pub annotations: Vec<Annotation>,
    pub documentation: Option<String>,
    pub span: Span,
}

impl Model {
    pub fn iter_fields(&self) -> impl Iterator<Item = (FieldId, &Field)> {
        self.fields
            .iter()
            .enumerate()
            .map(|(i, f)| (FieldId(i as u32), f))
    }
}

impl Index<FieldId> for Model {
    type Output = Field;

    fn index(&self, id: FieldId) -> &Field {
        &self.fields[id.0 as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldArity {
    Required,
    Optional,
    List,
}

impl FieldArity {
    pub fn is_required(self) -> bool {
        self == FieldArity::Required
    }

    pub fn is_optional(self) -> bool {
        self == FieldArity::Optional
    }

    pub fn is_list(self) -> bool {
        self == FieldArity::List
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldType {
    pub name: Ident,
    pub arity: FieldArity,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: Ident,
    pub field_type: FieldType,
    pub annotations: Vec<Annotation>,
    pub documentation: Option<String>,
    pub span: Span,
}

impl Field {
    pub fn arity(&self) -> FieldArity {
        self.field_type.arity
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enum {
    pub name: Ident,
    pub values: Vec<EnumValue>,
    pub annotations: Vec<Annotation>,
    pub documentation: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub name: Ident,
    pub annotations: Vec<Annotation>,
    pub documentation: Option<String>,
    pub span: Span,
}

/// Generic named property bag, e.g. `backend settings { url = "..." }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: Ident,
    pub name: Ident,
    pub properties: Vec<Property>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: Ident,
    pub value: Expr,
    pub span: Span,
}

/// Top-level `@name(args)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub name: Ident,
    pub args: Vec<Arg>,
    pub span: Span,
}

/// `@name(args)` on a field or enum value, `@@name(args)` on a model or enum.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Possibly dotted, e.g. `db.VarChar`.
    pub name: Ident,
    pub args: Vec<Arg>,
    pub is_block: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub name: Option<Ident>,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal as written.
    Number(String, Span),
    Str(String, Span),
    Heredoc {
        strip_indent: bool,
        lines: Vec<String>,
        span: Span,
    },
    Bool(bool, Span),
    Null(Span),
    /// Bare (possibly dotted) identifier.
    Ident(Ident),
    Call {
        name: Ident,
        args: Vec<Arg>,
        span: Span,
    },
    List(Vec<Expr>, Span),
    Object(Vec<(Ident, Expr)>, Span),
    Var(Ident),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Number(_, span)
            | Expr::Str(_, span)
            | Expr::Bool(_, span)
            | Expr::Null(span)
            | Expr::List(_, span)
            | Expr::Object(_, span)
            | Expr::Heredoc { span, .. }
            | Expr::Call { span, .. } => *span,
            Expr::Ident(ident) | Expr::Var(ident) => ident.span,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Expr::Number(..) => "number",
            Expr::Str(..) | Expr::Heredoc { .. } => "string",
            Expr::Bool(..) => "boolean",
            Expr::Null(_) => "null",
            Expr::Ident(_) => "identifier",
            Expr::Call { .. } => "function call",
            Expr::List(..) => "list",
            Expr::Object(..) => "object",
            Expr::Var(_) => "variable",
        }
    }

    pub fn as_call(&self) -> Option<(&Ident, &[Arg])> {
        match self {
            Expr::Call { name, args, .. } => Some((name, args)),
            _ => None,
        }
    }
}
