//! Static table of annotations: their arguments, which argument may be
//! passed positionally, which are required, and whether the annotation may
//! be repeated.

use std::collections::BTreeMap;

use crate::ast::Arg;
use crate::diagnostics::Diagnostics;
use crate::span::Span;

#[derive(Debug)]
pub struct ArgSpec {
    pub name: &'static str,
    pub required: bool,
}

#[derive(Debug)]
pub struct AnnotationSpec {
    pub name: &'static str,
    /// Argument receiving an unnamed value.
    pub default_arg: Option<&'static str>,
    pub args: &'static [ArgSpec],
    pub singular: bool,
}

impl AnnotationSpec {
    fn arg(&self, name: &str) -> Option<&ArgSpec> {
        self.args.iter().find(|a| a.name == name)
    }
}

const fn opt(name: &'static str) -> ArgSpec {
    ArgSpec {
        name,
        required: false,
    }
}

const fn req(name: &'static str) -> ArgSpec {
    ArgSpec {
        name,
        required: true,
    }
}

pub static SCALAR_FIELD_ANNOTATIONS: &[AnnotationSpec] = &[
    AnnotationSpec {
        name: "id",
        default_arg: Some("name"),
        args: &[opt("name"), opt("map"), opt("sort")],
        singular: true,
    },
    AnnotationSpec {
        name: "unique",
        default_arg: Some("name"),
        args: &[opt("name"), opt("map"), opt("sort"), opt("type")],
        singular: true,
    },
    AnnotationSpec {
        name: "default",
        default_arg: Some("value"),
        args: &[req("value"), opt("map")],
        singular: true,
    },
    AnnotationSpec {
        name: "map",
        default_arg: Some("name"),
        args: &[req("name")],
        singular: true,
    },
    AnnotationSpec {
        name: "ignore",
        default_arg: None,
        args: &[],
        singular: true,
    },
];

pub static RELATION_FIELD_ANNOTATIONS: &[AnnotationSpec] = &[
    AnnotationSpec {
        name: "ref",
        default_arg: Some("name"),
        args: &[
            opt("name"),
            opt("fields"),
            opt("references"),
            opt("onDelete"),
            opt("onUpdate"),
            opt("map"),
        ],
        singular: true,
    },
    AnnotationSpec {
        name: "ignore",
        default_arg: None,
        args: &[],
        singular: true,
    },
];

pub static MODEL_ANNOTATIONS: &[AnnotationSpec] = &[
    AnnotationSpec {
        name: "id",
        default_arg: Some("fields"),
        args: &[req("fields"), opt("name"), opt("map")],
        singular: true,
    },
    AnnotationSpec {
        name: "unique",
        default_arg: Some("fields"),
        args: &[req("fields"), opt("name"), opt("map"), opt("type")],
        singular: false,
    },
    AnnotationSpec {
        name: "index",
        default_arg: Some("fields"),
        args: &[req("fields"), opt("name"), opt("map"), opt("type")],
        singular: false,
    },
    AnnotationSpec {
        name: "map",
        default_arg: Some("name"),
        args: &[req("name")],
        singular: true,
    },
    AnnotationSpec {
        name: "ignore",
        default_arg: None,
        args: &[],
        singular: true,
    },
];

pub static ENUM_ANNOTATIONS: &[AnnotationSpec] = &[AnnotationSpec {
    name: "map",
    default_arg: Some("name"),
    args: &[req("name")],
    singular: true,
}];

pub static ENUM_VALUE_ANNOTATIONS: &[AnnotationSpec] = &[AnnotationSpec {
    name: "map",
    default_arg: Some("name"),
    args: &[req("name")],
    singular: true,
}];

pub static DIRECTIVES: &[AnnotationSpec] = &[AnnotationSpec {
    name: "backend",
    default_arg: Some("name"),
    args: &[req("name")],
    singular: true,
}];

pub fn find(specs: &'static [AnnotationSpec], name: &str) -> Option<&'static AnnotationSpec> {
    specs.iter().find(|s| s.name == name)
}

/// Arguments of one annotation keyed by their resolved name.
#[derive(Debug)]
pub struct CheckedArgs<'a> {
    args: BTreeMap<&'static str, &'a Arg>,
}

impl<'a> CheckedArgs<'a> {
    pub fn get(&self, name: &str) -> Option<&'a Arg> {
        self.args.get(name).copied()
    }
}

/// Matches `args` against `spec`. Returns `None` when any argument is
/// invalid, duplicated or missing.
pub fn check_args<'a>(
    spec: &'static AnnotationSpec,
    args: &'a [Arg],
    subject: Span,
    diags: &mut Diagnostics,
) -> Option<CheckedArgs<'a>> {
    let mut checked: BTreeMap<&'static str, &'a Arg> = BTreeMap::new();
    let mut valid = true;

    for arg in args {
        let resolved = match &arg.name {
            Some(name) => spec.arg(&name.name),
            None => spec.default_arg.and_then(|d| spec.arg(d)),
        };

        let Some(arg_spec) = resolved else {
            let detail = match &arg.name {
                Some(name) => format!("Argument \"{}\" is not expected here.", name.name),
                None => "Unnamed argument is not expected here.".to_string(),
            };
            diags.error("Invalid argument", detail, arg.span);
            valid = false;
            continue;
        };

        if checked.contains_key(arg_spec.name) {
            diags.error(
                "Duplicate argument",
                format!("Argument \"{}\" is already set.", arg_spec.name),
                arg.span,
            );
            valid = false;
            continue;
        }
        checked.insert(arg_spec.name, arg);
    }

    for arg_spec in spec.args {
        if arg_spec.required && !checked.contains_key(arg_spec.name) {
            diags.error(
                "Missing argument",
                format!("Argument \"{}\" is required.", arg_spec.name),
                subject,
            );
            valid = false;
        }
    }

    valid.then_some(CheckedArgs { args: checked })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::span::FileId;

    fn annotation_args(src: &str) -> (Vec<Arg>, Span) {
        let (tops, diags) = parse(src, FileId(0));
        assert!(diags.is_empty());
        let model = tops[0].as_model().unwrap();
        let annot = &model.fields[0].annotations[0];
        (annot.args.clone(), annot.span)
    }

    #[test]
    fn test_positional_default_arg() {
        let (args, span) = annotation_args("model A {\n  a int @default(5)\n}");
        let spec = find(SCALAR_FIELD_ANNOTATIONS, "default").unwrap();
        let mut diags = Diagnostics::new();
        let checked = check_args(spec, &args, span, &mut diags).unwrap();
        assert!(checked.get("value").is_some());
        assert!(diags.is_empty());
    }

    #[test]
    fn test_invalid_and_duplicate_args() {
        let (args, span) =
            annotation_args("model A {\n  a int @map(\"x\", name: \"y\", color: red)\n}");
        let spec = find(SCALAR_FIELD_ANNOTATIONS, "map").unwrap();
        let mut diags = Diagnostics::new();
        assert!(check_args(spec, &args, span, &mut diags).is_none());
        let summaries: Vec<_> = diags.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(summaries, vec!["Duplicate argument", "Invalid argument"]);
    }

    #[test]
    fn test_missing_arg() {
        let (args, span) = annotation_args("model A {\n  a int @default(map: \"df\")\n}");
        let spec = find(SCALAR_FIELD_ANNOTATIONS, "default").unwrap();
        let mut diags = Diagnostics::new();
        assert!(check_args(spec, &args, span, &mut diags).is_none());
        assert_eq!(diags.with_summary("Missing argument").count(), 1);
    }

    #[test]
    fn test_unnamed_arg_without_default() {
        let (args, span) = annotation_args("model A {\n  a int @ignore(true)\n}");
        let spec = find(SCALAR_FIELD_ANNOTATIONS, "ignore").unwrap();
        let mut diags = Diagnostics::new();
        assert!(check_args(spec, &args, span, &mut diags).is_none());
        let d = diags.iter().next().unwrap();
        assert_eq!(d.detail, "Unnamed argument is not expected here.");
    }
}
