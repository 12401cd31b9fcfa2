//! `@default` value checks.

use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveTime};
use rust_decimal::prelude::ToPrimitive;

use crate::ast::{Arg, Expr, Ident};
use crate::builtins::BuiltInScalar;
use crate::db::types::ScalarFieldType;
use crate::db::ScalarFieldWalker;
use crate::eval::{EvalContext, Value};
use crate::span::Span;

use super::ValidationContext;

const INVALID: &str = "Invalid default value";

pub(super) fn default_value(field: ScalarFieldWalker<'_>, ctx: &mut ValidationContext<'_>) {
    let Some(default) = field.default_value() else {
        return;
    };

    if let Expr::Call { name, args, span } = &default.value {
        default_function(field, name, args, *span, ctx);
        return;
    }

    if let (Some(scalar), Some(ident)) = (field.scalar_type(), bare_ident(&default.value)) {
        ctx.error(INVALID, expected(scalar), ident.span);
        return;
    }

    let value = match EvalContext::new(ctx.db.variables()).eval(&default.value) {
        Ok(value) => value,
        Err(diag) => {
            ctx.diags.push(diag);
            return;
        }
    };
    let span = default.value.span();

    if field.arity().is_list() {
        let Value::List(items) = &value else {
            ctx.error(INVALID, "Default value for list fields must be a list.", span);
            return;
        };
        for item in items {
            check_value(field, item, span, ctx);
        }
    } else {
        check_value(field, &value, span, ctx);
    }
}

/// A bare identifier, directly or inside a list.
fn bare_ident(expr: &Expr) -> Option<&Ident> {
    match expr {
        Expr::Ident(ident) => Some(ident),
        Expr::List(items, _) => items.iter().find_map(bare_ident),
        _ => None,
    }
}

fn expected(scalar: BuiltInScalar) -> String {
    let expected = match scalar {
        BuiltInScalar::Int => "a 32-bit integer",
        BuiltInScalar::BigInt => "a 64-bit integer",
        BuiltInScalar::Float | BuiltInScalar::Decimal => "a number",
        BuiltInScalar::String => "a string",
        BuiltInScalar::Bool => "true or false",
        BuiltInScalar::DateTime => "a string in RFC3339 layout",
        BuiltInScalar::Date => "a string in YYYY-MM-DD layout",
        BuiltInScalar::Time => "a string in HH:MM:SS.sss format",
        BuiltInScalar::Bytes => "a base64-encoded string",
    };
    format!("Default value for {scalar} fields must be {expected}.")
}

fn check_value(
    field: ScalarFieldWalker<'_>,
    value: &Value,
    span: Span,
    ctx: &mut ValidationContext<'_>,
) {
    match field.field_type() {
        ScalarFieldType::Enum(enum_id) => {
            let enm = ctx.db.walk(enum_id);
            let known = value.as_str().and_then(|name| enm.find_value(name));
            if known.is_none() {
                ctx.error(
                    INVALID,
                    format!("The default value {value} is not a valid enum value."),
                    span,
                );
            }
        }
        ScalarFieldType::BuiltIn(scalar) => {
            if !is_valid_literal(scalar, value) {
                ctx.error(INVALID, expected(scalar), span);
            }
        }
    }
}

fn is_valid_literal(scalar: BuiltInScalar, value: &Value) -> bool {
    match (scalar, value) {
        (BuiltInScalar::Int, Value::Number(n)) => n.fract().is_zero() && n.to_i32().is_some(),
        (BuiltInScalar::BigInt, Value::Number(n)) => n.fract().is_zero() && n.to_i64().is_some(),
        (BuiltInScalar::Float | BuiltInScalar::Decimal, Value::Number(_)) => true,
        (BuiltInScalar::Bool, Value::Bool(_)) => true,
        (BuiltInScalar::String, Value::String(_)) => true,
        (BuiltInScalar::Bytes, Value::String(s)) => {
            base64::engine::general_purpose::STANDARD.decode(s).is_ok()
        }
        (BuiltInScalar::DateTime, Value::String(s)) => DateTime::parse_from_rfc3339(s).is_ok(),
        (BuiltInScalar::Date, Value::String(s)) => NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok(),
        (BuiltInScalar::Time, Value::String(s)) => {
            NaiveTime::parse_from_str(s, "%H:%M:%S%.f").is_ok()
        }
        _ => false,
    }
}

fn default_function(
    field: ScalarFieldWalker<'_>,
    name: &Ident,
    args: &[Arg],
    span: Span,
    ctx: &mut ValidationContext<'_>,
) {
    let scalar = field.scalar_type();
    let type_name = match field.field_type() {
        ScalarFieldType::BuiltIn(scalar) => scalar.name(),
        ScalarFieldType::Enum(enum_id) => ctx.db.walk(enum_id).name(),
    };

    let fits = match name.name.as_str() {
        "autoincrement" => scalar.is_some_and(BuiltInScalar::is_integer),
        "now" => scalar.is_some_and(BuiltInScalar::is_temporal),
        "uuid" | "cuid" => scalar == Some(BuiltInScalar::String),
        "dbgenerated" => {
            let valid_args = match args {
                [] => true,
                [arg] => arg.name.is_none() && matches!(arg.value, Expr::Str(..)),
                _ => false,
            };
            if !valid_args {
                ctx.error(
                    INVALID,
                    "The function dbgenerated() takes at most one string argument.",
                    span,
                );
            }
            return;
        }
        other => {
            ctx.error(
                INVALID,
                format!("The function \"{other}\" is not a known default value function."),
                name.span,
            );
            return;
        }
    };

    if !fits || field.arity().is_list() {
        ctx.error(
            INVALID,
            format!(
                "The function {}() cannot be used as default value for a field of type {type_name}{}.",
                name.name,
                if field.arity().is_list() { "[]" } else { "" }
            ),
            span,
        );
    } else if !args.is_empty() {
        ctx.error(
            INVALID,
            format!("The function {}() takes no arguments.", name.name),
            span,
        );
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::super::test_support::*;
    use crate::config::CompileOptions;

    fn model(field: &str) -> String {
        format!("model A {{\n  id int @id\n  {field}\n}}\nenum Role {{\n  USER\n  ADMIN\n}}\n")
    }

    fn invalid_defaults(field: &str) -> usize {
        check(&model(field)).with_summary("Invalid default value").count()
    }

    #[rstest]
    #[case::int("age int @default(5)", 0)]
    #[case::int_from_string("age int @default(\"x\")", 1)]
    #[case::int_fraction("age int @default(1.5)", 1)]
    #[case::int_max("n int @default(2147483647)", 0)]
    #[case::int_overflow("n int @default(3000000000)", 1)]
    #[case::int_far_overflow("n int @default(99999999999999999999)", 1)]
    #[case::bigint("n bigint @default(3000000000)", 0)]
    #[case::bigint_overflow("n bigint @default(99999999999999999999)", 1)]
    #[case::float("ratio float @default(1.5)", 0)]
    #[case::decimal("price decimal @default(10.25)", 0)]
    #[case::bool("flag bool @default(true)", 0)]
    #[case::bool_from_number("flag bool @default(1)", 1)]
    #[case::string("name string @default(\"anon\")", 0)]
    #[case::string_ident("name string @default(anon)", 1)]
    #[case::bytes("data bytes @default(\"aGVsbG8=\")", 0)]
    #[case::bytes_invalid("data bytes @default(\"not base64!\")", 1)]
    #[case::datetime("at datetime @default(\"2024-01-02T03:04:05Z\")", 0)]
    #[case::datetime_invalid("at datetime @default(\"2024-01-02\")", 1)]
    #[case::date("on date @default(\"2024-01-02\")", 0)]
    #[case::date_invalid("on date @default(\"01/02/2024\")", 1)]
    #[case::time("at time @default(\"12:30:00.000\")", 0)]
    #[case::time_invalid("at time @default(\"noon\")", 1)]
    #[case::enum_value("role Role @default(ADMIN)", 0)]
    #[case::enum_unknown("role Role @default(OWNER)", 1)]
    #[case::list("tags string[] @default([\"a\", \"b\"])", 0)]
    #[case::list_scalar("tags string[] @default(\"a\")", 1)]
    #[case::list_element("scores int[] @default([1, \"two\"])", 1)]
    fn test_literal_defaults(#[case] field: &str, #[case] errors: usize) {
        assert_eq!(invalid_defaults(field), errors);
    }

    #[rstest]
    #[case::autoincrement("n int @default(autoincrement())", 0)]
    #[case::autoincrement_on_string("s string @default(autoincrement())", 1)]
    #[case::now("at datetime @default(now())", 0)]
    #[case::now_on_date("on date @default(now())", 0)]
    #[case::now_on_int("n int @default(now())", 1)]
    #[case::uuid("key string @default(uuid())", 0)]
    #[case::cuid("key string @default(cuid())", 0)]
    #[case::uuid_args("key string @default(uuid(4))", 1)]
    #[case::dbgenerated("n int @default(dbgenerated(\"nextval('seq')\"))", 0)]
    #[case::dbgenerated_empty("n int @default(dbgenerated())", 0)]
    #[case::dbgenerated_number("n int @default(dbgenerated(1))", 1)]
    #[case::unknown("n int @default(random())", 1)]
    fn test_function_defaults(#[case] field: &str, #[case] errors: usize) {
        assert_eq!(invalid_defaults(field), errors);
    }

    #[test]
    fn test_messages() {
        let diags = check(&model("age int @default(\"x\")"));
        assert_eq!(
            diags.iter().map(|d| d.detail.as_str()).collect::<Vec<_>>(),
            vec!["Default value for int fields must be a 32-bit integer."]
        );

        let diags = check(&model("role Role @default(OWNER)"));
        assert_eq!(
            diags.iter().next().unwrap().detail,
            "The default value \"OWNER\" is not a valid enum value."
        );
    }

    #[test]
    fn test_variable_defaults() {
        let options = CompileOptions::new().with_variable("greeting", "hi");
        let diags = check_with(&model("name string @default($greeting)"), &options);
        assert!(diags.is_empty(), "{diags:?}");

        let diags = check_with(&model("age int @default($greeting)"), &options);
        assert_eq!(summaries(&diags), vec!["Invalid default value"]);
    }
}
