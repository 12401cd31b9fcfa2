//! Diagnostics collected over a whole compilation.

use std::fmt::{self, Write};

use unicode_width::UnicodeWidthStr;

use crate::span::{SourceFile, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    pub subject: Span,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>, subject: Span) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            subject,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>, subject: Span) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            subject,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Render the diagnostic with the offending source line underlined.
    pub fn render(&self, files: &[SourceFile]) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_snippet(&mut out, files);
        out
    }

    fn write_snippet(&self, out: &mut String, files: &[SourceFile]) -> fmt::Result {
        writeln!(out, "{}: {}", self.severity, self.summary)?;

        let Some(file) = files.get(self.subject.file.0 as usize) else {
            if !self.detail.is_empty() {
                writeln!(out, "  = {}", self.detail)?;
            }
            return Ok(());
        };

        let start = self.subject.start;
        let gutter = start.line.to_string().len();
        writeln!(
            out,
            "{:gutter$}--> {}:{}:{}",
            "", file.name, start.line, start.column
        )?;

        match file.line(start.line) {
            Some(text) => {
                let prefix: String = text.chars().take(start.column.saturating_sub(1)).collect();
                let underlined: String = if self.subject.end.line == start.line {
                    text.chars()
                        .skip(start.column.saturating_sub(1))
                        .take(self.subject.end.column.saturating_sub(start.column))
                        .collect()
                } else {
                    text.chars().skip(start.column.saturating_sub(1)).collect()
                };
                let offset = UnicodeWidthStr::width(prefix.as_str());
                let carets = UnicodeWidthStr::width(underlined.as_str()).max(1);

                writeln!(out, "{:gutter$} |", "")?;
                writeln!(out, "{} | {}", start.line, text)?;
                write!(out, "{:gutter$} | {:offset$}{}", "", "", "^".repeat(carets))?;
                if self.detail.is_empty() {
                    out.push('\n');
                } else {
                    writeln!(out, " {}", self.detail)?;
                }
            }
            None => {
                if !self.detail.is_empty() {
                    writeln!(out, "{:gutter$} = {}", "", self.detail)?;
                }
            }
        }

        Ok(())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.summary)?;
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        write!(f, " ({})", self.subject)
    }
}

/// Append-only list of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn error(&mut self, summary: impl Into<String>, detail: impl Into<String>, subject: Span) {
        self.push(Diagnostic::error(summary, detail, subject));
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.0.iter().filter(|d| d.is_error()).count()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    /// Diagnostics whose summary equals `summary`.
    pub fn with_summary<'a>(&'a self, summary: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.0.iter().filter(move |d| d.summary == summary)
    }

    pub fn render(&self, files: &[SourceFile]) -> String {
        self.0
            .iter()
            .map(|d| d.render(files))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Vec<Diagnostic>> for Diagnostics {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self(diagnostics)
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::{FileId, Pos};

    fn span(line: usize, start: usize, end: usize) -> Span {
        Span::new(
            FileId(0),
            Pos { line, column: start, byte: 0 },
            Pos { line, column: end, byte: 0 },
        )
    }

    #[test]
    fn test_has_errors() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::warning("Careful", "", span(1, 1, 2)));
        assert!(!diags.has_errors());
        diags.error("Broken", "", span(1, 1, 2));
        assert!(diags.has_errors());
        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn test_render_points_at_span() {
        let files = vec![SourceFile::new("schema.ksl", "model User {\n}\n")];
        let diag = Diagnostic::error("Duplicate name", "Already defined.", span(1, 7, 11));
        let rendered = diag.render(&files);
        assert_eq!(
            rendered,
            "error: Duplicate name\n --> schema.ksl:1:7\n  |\n1 | model User {\n  |       ^^^^ Already defined.\n"
        );
    }

    #[test]
    fn test_render_wide_chars() {
        let files = vec![SourceFile::new("s.ksl", "model ユーザー {")];
        let diag = Diagnostic::error("Oops", "", span(1, 7, 11));
        let rendered = diag.render(&files);
        let caret_line = rendered.lines().last().unwrap();
        assert_eq!(caret_line, "  |       ^^^^^^^^");
    }
}
