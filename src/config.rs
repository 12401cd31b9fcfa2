//! Compilation options and the backend configuration declared in the schema.

use std::collections::BTreeMap;

use crate::ast::SchemaAst;
use crate::db::specs::{self, DIRECTIVES};
use crate::diagnostics::Diagnostics;
use crate::eval::{EvalContext, Value};
use crate::span::Span;
use crate::sql::Dialect;
use crate::CompileError;

/// Host-provided settings for one compilation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompileOptions {
    /// Dialect used when the schema has no `@backend` directive.
    pub dialect: Dialect,
    /// Values for `$name` references.
    pub variables: BTreeMap<String, Value>,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables
            .insert(name.into(), Value::String(value.into()));
        self
    }
}

/// Parses a `KEY=VALUE` variable assignment.
pub fn parse_variable(s: &str) -> Result<(String, String), CompileError> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(CompileError::InvalidVariable(s.to_string())),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backend {
    pub dialect: Dialect,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config {
    pub backend: Option<Backend>,
    pub default_dialect: Dialect,
}

impl Config {
    /// Dialect of the `@backend` directive, or the default one.
    pub fn dialect(&self) -> Dialect {
        self.backend
            .map(|b| b.dialect)
            .unwrap_or(self.default_dialect)
    }
}

/// Resolves top-level directives into a `Config`.
pub(crate) fn resolve_directives(
    ast: &SchemaAst,
    eval: &EvalContext<'_>,
    options: &CompileOptions,
    diags: &mut Diagnostics,
) -> Config {
    let mut config = Config {
        backend: None,
        default_dialect: options.dialect,
    };
    let mut seen_backend = false;

    for (_, directive) in ast.iter_directives() {
        let Some(spec) = specs::find(DIRECTIVES, &directive.name.name) else {
            diags.error(
                "Invalid directive",
                format!("Directive \"{}\" is not a known directive.", directive.name.name),
                directive.span,
            );
            continue;
        };

        if spec.singular && seen_backend {
            diags.error(
                "Duplicate directive",
                format!("Directive \"{}\" is already set.", directive.name.name),
                directive.span,
            );
            continue;
        }
        seen_backend = true;

        let Some(args) = specs::check_args(spec, &directive.args, directive.span, diags) else {
            continue;
        };
        let Some(arg) = args.get("name") else {
            continue;
        };

        let name = match eval.eval_as::<String>(&arg.value) {
            Ok(name) => name,
            Err(diag) => {
                diags.push(diag);
                continue;
            }
        };
        match name.parse::<Dialect>() {
            Ok(dialect) => {
                config.backend = Some(Backend {
                    dialect,
                    span: directive.span,
                })
            }
            Err(_) => diags.error(
                "Unknown backend",
                format!(
                    "Backend \"{name}\" is not supported. Expected one of: postgres, postgresql, sqlite."
                ),
                arg.value.span(),
            ),
        }
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::span::FileId;

    fn resolve(src: &str, options: &CompileOptions) -> (Config, Diagnostics) {
        let (tops, parse_diags) = parse(src, FileId(0));
        assert!(parse_diags.is_empty());
        let ast = SchemaAst { tops };
        let eval = EvalContext::new(&options.variables);
        let mut diags = Diagnostics::new();
        let config = resolve_directives(&ast, &eval, options, &mut diags);
        (config, diags)
    }

    #[test]
    fn test_backend_directive() {
        let (config, diags) = resolve("@backend(sqlite)\n", &CompileOptions::new());
        assert!(diags.is_empty());
        assert_eq!(config.dialect(), Dialect::Sqlite);
    }

    #[test]
    fn test_default_dialect() {
        let options = CompileOptions::new().with_dialect(Dialect::Sqlite);
        let (config, _) = resolve("", &options);
        assert!(config.backend.is_none());
        assert_eq!(config.dialect(), Dialect::Sqlite);
    }

    #[test]
    fn test_backend_from_variable() {
        let options = CompileOptions::new().with_variable("db", "postgresql");
        let (config, diags) = resolve("@backend($db)\n", &options);
        assert!(diags.is_empty());
        assert_eq!(config.dialect(), Dialect::Postgres);
    }

    #[test]
    fn test_directive_errors() {
        let src = "@backend(mysql)\n@backend(sqlite)\n@color(red)\n";
        let (_, diags) = resolve(src, &CompileOptions::new());
        let summaries: Vec<_> = diags.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(
            summaries,
            vec!["Unknown backend", "Duplicate directive", "Invalid directive"]
        );
    }

    #[test]
    fn test_parse_variable() {
        assert_eq!(
            parse_variable("region=eu=west").unwrap(),
            ("region".to_string(), "eu=west".to_string())
        );
        assert!(parse_variable("novalue").is_err());
        assert!(parse_variable("=x").is_err());
    }
}
