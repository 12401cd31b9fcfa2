//! Expression evaluation into typed values.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::ast::{Arg, Expr};
use crate::diagnostics::Diagnostic;
use crate::span::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Decimal),
    String(String),
    List(Vec<Value>),
    Object(Vec<(String, Value)>),
    Function {
        name: String,
        args: Vec<(Option<String>, Value)>,
    },
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Object(_) => "object",
            Value::Function { .. } => "function",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Object(entries) => {
                f.write_str("{ ")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k} = {v}")?;
                }
                f.write_str(" }")
            }
            Value::Function { name, args } => {
                write!(f, "{name}(")?;
                for (i, (k, v)) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if let Some(k) = k {
                        write!(f, "{k}: ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Conversion from an evaluated value into a statically known type.
pub trait FromValue: Sized {
    /// Type name used in "Unsuitable value type" diagnostics.
    const EXPECTED: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    const EXPECTED: &'static str = "any";

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "string";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromValue for Decimal {
    const EXPECTED: &'static str = "number";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "integer";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) if n.fract().is_zero() => n.to_i64(),
            _ => None,
        }
    }
}

/// Lists convert element-wise; a single value becomes a one-element list.
impl<T: FromValue> FromValue for Vec<T> {
    const EXPECTED: &'static str = "list";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => items.iter().map(T::from_value).collect(),
            other => T::from_value(other).map(|v| vec![v]),
        }
    }
}

/// Implements `FromValue` for a keyword enum that parses from its name.
macro_rules! from_value_by_name {
    ($ty:ty, $expected:literal) => {
        impl $crate::eval::FromValue for $ty {
            const EXPECTED: &'static str = $expected;

            fn from_value(value: &$crate::eval::Value) -> Option<Self> {
                value.as_str().and_then(|s| s.parse().ok())
            }
        }
    };
}
pub(crate) use from_value_by_name;

/// Evaluates expressions against the compilation's variables.
pub struct EvalContext<'a> {
    variables: &'a BTreeMap<String, Value>,
}

impl<'a> EvalContext<'a> {
    pub fn new(variables: &'a BTreeMap<String, Value>) -> Self {
        Self { variables }
    }

    pub fn eval(&self, expr: &Expr) -> Result<Value, Diagnostic> {
        match expr {
            Expr::Number(text, span) => parse_number(text)
                .map(Value::Number)
                .ok_or_else(|| {
                    Diagnostic::error(
                        "Invalid number",
                        format!("{text} is not a valid number."),
                        *span,
                    )
                }),
            Expr::Str(s, _) => Ok(Value::String(s.clone())),
            Expr::Heredoc {
                strip_indent,
                lines,
                ..
            } => Ok(Value::String(heredoc_text(lines, *strip_indent))),
            Expr::Bool(b, _) => Ok(Value::Bool(*b)),
            Expr::Null(_) => Ok(Value::Null),
            Expr::Ident(ident) => Ok(Value::String(ident.name.clone())),
            Expr::Call { name, args, .. } => Ok(Value::Function {
                name: name.name.clone(),
                args: self.eval_args(args)?,
            }),
            Expr::List(items, _) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Expr::Object(entries, _) => entries
                .iter()
                .map(|(key, value)| Ok((key.name.clone(), self.eval(value)?)))
                .collect::<Result<Vec<_>, Diagnostic>>()
                .map(Value::Object),
            Expr::Var(ident) => self.variables.get(&ident.name).cloned().ok_or_else(|| {
                Diagnostic::error(
                    "Unknown variable",
                    format!("There is no variable named \"{}\".", ident.name),
                    ident.span,
                )
            }),
        }
    }

    fn eval_args(&self, args: &[Arg]) -> Result<Vec<(Option<String>, Value)>, Diagnostic> {
        args.iter()
            .map(|arg| {
                let name = arg.name.as_ref().map(|n| n.name.clone());
                Ok((name, self.eval(&arg.value)?))
            })
            .collect()
    }

    /// Evaluates `expr` and converts it to `T`.
    pub fn eval_as<T: FromValue>(&self, expr: &Expr) -> Result<T, Diagnostic> {
        let value = self.eval(expr)?;
        convert(&value, expr.span())
    }
}

pub fn convert<T: FromValue>(value: &Value, span: Span) -> Result<T, Diagnostic> {
    T::from_value(value).ok_or_else(|| {
        Diagnostic::error(
            "Unsuitable value type",
            format!(
                "Expected a value of type {}, but got {} {}.",
                T::EXPECTED,
                value.type_name(),
                value
            ),
            span,
        )
    })
}

/// Parses a numeric literal exactly.
pub fn parse_number(text: &str) -> Option<Decimal> {
    if text.contains(['e', 'E']) {
        Decimal::from_scientific(text).ok()
    } else {
        Decimal::from_str(text).ok()
    }
}

fn heredoc_text(lines: &[String], strip_indent: bool) -> String {
    let indent = if strip_indent {
        lines
            .iter()
            .filter(|l| !l.trim().is_empty())
            .map(|l| l.len() - l.trim_start().len())
            .min()
            .unwrap_or(0)
    } else {
        0
    };

    let mut out = String::new();
    for line in lines {
        out.push_str(line.get(indent..).unwrap_or_else(|| line.trim_start()));
        out.push('\n');
    }
    out
}
