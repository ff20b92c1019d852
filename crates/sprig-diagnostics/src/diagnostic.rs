//! Diagnostic types for transformer errors, warnings, and hints.

use crate::span::{Label, Span};
use serde::{Deserialize, Serialize};

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Informational hint (a call was recognised but deliberately skipped,
    /// or the rewrite produced something worth double-checking)
    Hint,
    /// Warning (transform succeeded but the output may misbehave)
    Warning,
    /// Error (the file could not be transformed)
    Error,
}

impl Severity {
    /// Get the string representation for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Hint => "hint",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // Parse failures (P001-P099)
    /// Syntax error during parsing
    ParseError,

    // Capture analysis (C001-C099)
    /// Call recognised but structurally ineligible for auto-capture
    /// (callable is not a function-like node, or it declares parameters)
    IneligibleCall,
    /// Call has no enclosing function; auto-injection skipped
    NoEnclosingFunction,
    /// An outer reference collides with a reserved identifier and was not
    /// captured
    ReservedNameCapture,

    // Rewriting (R001-R099)
    /// A return expression that cannot host child slots was wrapped in a
    /// fragment; the value will render as visible text
    NonElementReturn,

    // Internal errors (I001-I099)
    /// Internal transformer error
    InternalError,
}

impl DiagnosticCode {
    /// Get the code string (e.g., "C001").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParseError => "P001",

            Self::IneligibleCall => "C001",
            Self::NoEnclosingFunction => "C002",
            Self::ReservedNameCapture => "C003",

            Self::NonElementReturn => "R001",

            Self::InternalError => "I001",
        }
    }

    /// Get the default severity for this code.
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::ParseError | Self::InternalError => Severity::Error,

            Self::IneligibleCall
            | Self::NoEnclosingFunction
            | Self::ReservedNameCapture
            | Self::NonElementReturn => Severity::Hint,
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A transformer diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Unique code
    pub code: DiagnosticCode,
    /// Severity level
    pub severity: Severity,
    /// Short message (single line)
    pub message: String,
    /// Longer explanation (optional)
    pub help: Option<String>,
    /// Primary span (where the issue is)
    pub span: Span,
    /// Additional labels (related locations)
    pub labels: Vec<Label>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> DiagnosticBuilder {
        DiagnosticBuilder::new(code, Severity::Error, message)
    }

    /// Create a new warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> DiagnosticBuilder {
        DiagnosticBuilder::new(code, Severity::Warning, message)
    }

    /// Create a new hint diagnostic.
    pub fn hint(code: DiagnosticCode, message: impl Into<String>) -> DiagnosticBuilder {
        DiagnosticBuilder::new(code, Severity::Hint, message)
    }

    /// Create a diagnostic with the code's default severity.
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> DiagnosticBuilder {
        DiagnosticBuilder::new(code, code.default_severity(), message)
    }

    /// Check if this is an error.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Check if this is a warning.
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    /// Check if this is a hint.
    pub fn is_hint(&self) -> bool {
        self.severity == Severity::Hint
    }
}

/// Builder for constructing diagnostics fluently.
pub struct DiagnosticBuilder {
    inner: Diagnostic,
}

impl DiagnosticBuilder {
    /// Create a new diagnostic builder.
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            inner: Diagnostic {
                code,
                severity,
                message: message.into(),
                help: None,
                span: Span::DUMMY,
                labels: Vec::new(),
            },
        }
    }

    /// Set the primary span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.inner.span = span;
        self
    }

    /// Add a secondary label.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.inner.labels.push(Label::new(span, message));
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.inner.help = Some(help.into());
        self
    }

    /// Build the diagnostic.
    pub fn build(self) -> Diagnostic {
        self.inner
    }
}

/// Collection of diagnostics with summary statistics.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    /// All diagnostics
    pub items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create a new empty collection.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// Extend with multiple diagnostics.
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.items.extend(diagnostics);
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.is_error())
    }

    /// Count errors.
    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|d| d.is_error()).count()
    }

    /// Count warnings.
    pub fn warning_count(&self) -> usize {
        self.items.iter().filter(|d| d.is_warning()).count()
    }

    /// Count hints.
    pub fn hint_count(&self) -> usize {
        self.items.iter().filter(|d| d.is_hint()).count()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of diagnostics.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Iterate over diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::FileId;

    #[test]
    fn test_builder() {
        let diag = Diagnostic::hint(DiagnosticCode::NoEnclosingFunction, "call at module scope")
            .with_span(Span::new(FileId(0), 10, 24))
            .with_help("move the call into a component function")
            .build();

        assert_eq!(diag.code.as_str(), "C002");
        assert!(diag.is_hint());
        assert_eq!(diag.span.len(), 14);
    }

    #[test]
    fn test_default_severities() {
        assert_eq!(
            DiagnosticCode::ParseError.default_severity(),
            Severity::Error
        );
        assert_eq!(
            DiagnosticCode::NonElementReturn.default_severity(),
            Severity::Hint
        );
    }

    #[test]
    fn test_counts() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::new(DiagnosticCode::ParseError, "bad syntax").build());
        diags.push(Diagnostic::new(DiagnosticCode::IneligibleCall, "has parameters").build());

        assert!(diags.has_errors());
        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.hint_count(), 1);
        assert_eq!(diags.warning_count(), 0);
    }
}
