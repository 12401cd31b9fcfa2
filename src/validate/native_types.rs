use crate::db::ScalarFieldWalker;
use crate::sql::types::find_native_type;

use super::ValidationContext;

pub(super) fn native_type(field: ScalarFieldWalker<'_>, ctx: &mut ValidationContext<'_>) {
    let Some(native) = field.native_type() else {
        return;
    };
    let dialect = ctx.db.dialect();

    let Some(spec) = find_native_type(dialect, &native.name) else {
        ctx.error(
            "Unknown native type",
            format!(
                "The native type \"{}\" is not known by the {dialect} backend.",
                native.name
            ),
            native.span,
        );
        return;
    };

    if !spec.arities.contains(&native.args.len()) {
        let expected: Vec<String> = spec.arities.iter().map(ToString::to_string).collect();
        ctx.error(
            "Invalid native type",
            format!(
                "The native type \"{}\" takes {} arguments, but received {}.",
                spec.name,
                expected.join(" or "),
                native.args.len()
            ),
            native.span,
        );
    }

    for arg in &native.args {
        if arg.parse::<u32>().is_err() {
            ctx.error(
                "Invalid native type",
                format!(
                    "The argument \"{arg}\" of the native type \"{}\" must be a non-negative integer.",
                    spec.name
                ),
                native.span,
            );
        }
    }

    if let Some(scalar) = field.scalar_type() {
        if !spec.supports(scalar) {
            ctx.error(
                "Invalid native type",
                format!(
                    "The native type \"{}\" is not compatible with fields of type {scalar}.",
                    spec.name
                ),
                native.span,
            );
        }
    }
}
