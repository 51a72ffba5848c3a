//! Document-scoped diagnostics.
//!
//! Resolution never aborts on an expected problem with a single document. Each
//! problem becomes a [`Diagnostic`] carrying the document's provenance and a
//! human-readable message, and is accumulated into a flat [`Diagnostics`] list
//! attached to the overall result. Whether the run as a whole fails is a caller
//! policy ([`Diagnostics::is_failure`]).

use colored::Colorize;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use super::document::Provenance;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// The pipeline stage a diagnostic originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Reading a source failed (reported by loaders).
    Load,
    /// The metadata block is malformed.
    Parse,
    /// A metadata field is missing, has the wrong type or an unknown value.
    Validation,
    /// Inheritance or include resolution failed.
    Resolution,
    /// A `when:` expression could not be parsed or evaluated.
    Condition,
    /// A platform template block is malformed.
    Template,
    /// A resolved document could not be rendered into output form.
    Generation,
}

impl ErrorCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Load => "load",
            ErrorCategory::Parse => "parse",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Resolution => "resolution",
            ErrorCategory::Condition => "condition",
            ErrorCategory::Template => "template",
            ErrorCategory::Generation => "generation",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One problem found while processing a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub category: ErrorCategory,
    /// Name of the source the offending document came from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Path of the offending document, relative to its source root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// 1-based line inside the document, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// 1-based column inside the document, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            severity,
            category,
            source: None,
            path: None,
            line: None,
            column: None,
            message: message.into(),
        }
    }

    pub fn error(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, category, message)
    }

    pub fn warning(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, category, message)
    }

    /// Attach the originating source and path.
    #[must_use]
    pub fn with_provenance(mut self, provenance: &Provenance) -> Self {
        self.source = Some(provenance.source.clone());
        self.path = Some(provenance.path.clone());
        self
    }

    /// Attach a 1-based line/column position.
    #[must_use]
    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// The `source:path:line:col` prefix used when printing.
    pub fn location(&self) -> Option<String> {
        let path = self.path.as_ref()?;
        let mut location = match &self.source {
            Some(source) => format!("{}:{}", source, path.display()),
            None => path.display().to_string(),
        };
        if let Some(line) = self.line {
            location.push_str(&format!(":{line}"));
            if let Some(column) = self.column {
                location.push_str(&format!(":{column}"));
            }
        }
        Some(location)
    }

    /// Render with terminal colors, for CLI output.
    pub fn colored(&self) -> String {
        let label = match self.severity {
            Severity::Error => format!("error[{}]", self.category).red().bold(),
            Severity::Warning => format!("warning[{}]", self.category).yellow().bold(),
        };
        match self.location() {
            Some(location) => format!("{label} {}: {}", location.dimmed(), self.message),
            None => format!("{label}: {}", self.message),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match self.location() {
            Some(location) => {
                write!(f, "{severity}[{}] {location}: {}", self.category, self.message)
            }
            None => write!(f, "{severity}[{}]: {}", self.category, self.message),
        }
    }
}

/// A flat, insertion-ordered list of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::debug!("recorded {}", diagnostic);
        self.0.push(diagnostic);
    }

    pub fn append(&mut self, other: Diagnostics) {
        for diagnostic in other.0 {
            self.push(diagnostic);
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Whether a run with these diagnostics should be reported as failed.
    ///
    /// Errors always fail; warnings fail only in strict mode.
    pub fn is_failure(&self, strict: bool) -> bool {
        self.has_errors() || (strict && !self.is_empty())
    }

    /// Diagnostics concerning one category, for tests and reporting.
    pub fn in_category(&self, category: ErrorCategory) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(move |d| d.category == category)
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        for diagnostic in iter {
            self.push(diagnostic);
        }
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<T: IntoIterator<Item = Diagnostic>>(iter: T) -> Self {
        let mut diagnostics = Self::new();
        diagnostics.extend(iter);
        diagnostics
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
