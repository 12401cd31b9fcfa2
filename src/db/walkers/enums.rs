use crate::ast::{Block, BlockId, Enum, EnumId, EnumValue, Property};
use crate::db::ids::EnumValueId;
use crate::db::types::EnumAnnotations;

use super::Walker;

pub type EnumWalker<'db> = Walker<'db, EnumId>;
pub type EnumValueWalker<'db> = Walker<'db, EnumValueId>;
pub type BlockWalker<'db> = Walker<'db, BlockId>;

impl<'db> EnumWalker<'db> {
    pub fn ast_enum(self) -> &'db Enum {
        &self.db.ast[self.id]
    }

    pub fn name(self) -> &'db str {
        &self.ast_enum().name.name
    }

    pub fn annotations(self) -> &'db EnumAnnotations {
        &self.db.types.enum_annotations[&self.id]
    }

    /// Type name: the `@@map` name or the enum name.
    pub fn database_name(self) -> &'db str {
        self.annotations()
            .mapped_name
            .as_deref()
            .unwrap_or_else(|| self.name())
    }

    pub fn values(self) -> impl Iterator<Item = EnumValueWalker<'db>> {
        let id = self.id;
        (0..self.ast_enum().values.len()).map(move |i| self.walk(EnumValueId(id, i as u32)))
    }

    pub fn find_value(self, name: &str) -> Option<EnumValueWalker<'db>> {
        let index = self.db.names.enum_values.get(&(self.id, name.to_string()))?;
        Some(self.walk(EnumValueId(self.id, *index)))
    }
}

impl<'db> EnumValueWalker<'db> {
    pub fn ast_value(self) -> &'db EnumValue {
        &self.db.ast[self.id.0].values[self.id.1 as usize]
    }

    pub fn name(self) -> &'db str {
        &self.ast_value().name.name
    }

    /// The `@map` name or the value name.
    pub fn database_name(self) -> &'db str {
        self.walk(self.id.0)
            .annotations()
            .mapped_values
            .get(&self.id.1)
            .map(String::as_str)
            .unwrap_or_else(|| self.name())
    }
}

impl<'db> BlockWalker<'db> {
    pub fn ast_block(self) -> &'db Block {
        &self.db.ast[self.id]
    }

    pub fn kind(self) -> &'db str {
        &self.ast_block().kind.name
    }

    pub fn name(self) -> &'db str {
        &self.ast_block().name.name
    }

    pub fn properties(self) -> impl Iterator<Item = &'db Property> {
        self.ast_block().properties.iter()
    }

    pub fn property(self, key: &str) -> Option<&'db Property> {
        self.properties().find(|p| p.key.name == key)
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Expr, SchemaAst};
    use crate::config::CompileOptions;
    use crate::db::ParserDatabase;
    use crate::diagnostics::Diagnostics;
    use crate::parser::parse;
    use crate::span::FileId;

    #[test]
    fn test_enum_and_block_walkers() {
        let src = "enum Role {\n  ADMIN @map(\"admin\")\n  USER\n  @@map(\"role\")\n}\nbackend main {\n  url = \"postgres://\"\n}\n";
        let (tops, _) = parse(src, FileId(0));
        let mut diags = Diagnostics::new();
        let db = ParserDatabase::new(SchemaAst { tops }, &CompileOptions::new(), &mut diags).unwrap();
        assert!(diags.is_empty(), "{diags:?}");

        let role = db.walk_enums().next().unwrap();
        assert_eq!(role.database_name(), "role");
        let names: Vec<_> = role.values().map(|v| v.database_name()).collect();
        assert_eq!(names, vec!["admin", "USER"]);
        assert_eq!(role.find_value("USER").unwrap().name(), "USER");

        let block = db.walk_blocks().next().unwrap();
        assert_eq!(block.kind(), "backend");
        assert!(matches!(
            &block.property("url").unwrap().value,
            Expr::Str(s, _) if s == "postgres://"
        ));
    }
}
