//! Diagnostic Infrastructure
//!
//! Collecting and formatting the problems the translation passes find.
//! Passes never abort on source-level problems; they record a diagnostic
//! into a shared [`DiagnosticBag`] and keep going. A single consumer drains
//! the bag after the pipeline completes.
//!
//! # Components
//!
//! - `Diagnostic` - A single message with location and severity
//! - `DiagnosticBag` - An append-only collection for one translation run
//! - `Severity` - Error, Warning, or Info

use crate::span::Span;
use serde::Serialize;
use std::fmt;

// =============================================================================
// Severity
// =============================================================================

/// The severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info = 3,
    /// A warning
    Warning = 2,
    /// An error (highest severity)
    Error = 1,
}

impl Severity {
    /// Get the severity name for display.
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }

    /// Check if this is an error.
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// Diagnostic
// =============================================================================

/// A diagnostic message with file, location, and severity.
#[derive(Clone, Debug, Serialize)]
pub struct Diagnostic {
    /// The file the diagnostic points into
    pub file_name: String,
    /// Location within the file
    pub span: Span,
    /// Severity level
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(
        file_name: impl Into<String>,
        span: Span,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            file_name: file_name.into(),
            span,
            severity,
            message: message.into(),
        }
    }

    /// Format this diagnostic against the source text it points into.
    ///
    /// Produces `file:line:col - severity: message` with 1-based line and
    /// column numbers.
    pub fn format(&self, source: &str) -> String {
        let (line, col) = line_col(source, self.span.start);
        format!(
            "{}:{}:{} - {}: {}",
            self.file_name,
            line + 1,
            col + 1,
            self.severity,
            self.message
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} - {}: {}",
            self.file_name, self.span, self.severity, self.message
        )
    }
}

/// Compute 0-based (line, column) for a byte offset in `text`.
///
/// Columns count UTF-16 code units for editor and source-map compatibility.
pub fn line_col(text: &str, pos: u32) -> (u32, u32) {
    let pos = (pos as usize).min(text.len());
    let mut line = 0u32;
    let mut line_start = 0usize;
    for (i, b) in text.as_bytes()[..pos].iter().enumerate() {
        if *b == b'\n' {
            line += 1;
            line_start = i + 1;
        }
    }
    let col = text[line_start..pos]
        .chars()
        .map(|c| c.len_utf16() as u32)
        .sum();
    (line, col)
}

// =============================================================================
// DiagnosticBag
// =============================================================================

/// An append-only collection of diagnostics for a translation run.
#[derive(Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        DiagnosticBag::default()
    }

    /// Record an error.
    pub fn error(&mut self, file_name: impl Into<String>, span: Span, message: impl Into<String>) {
        self.diagnostics
            .push(Diagnostic::new(file_name, span, Severity::Error, message));
    }

    /// Record a warning.
    pub fn warning(
        &mut self,
        file_name: impl Into<String>,
        span: Span,
        message: impl Into<String>,
    ) {
        self.diagnostics
            .push(Diagnostic::new(file_name, span, Severity::Warning, message));
    }

    /// Append an already-built diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Move all diagnostics from `other` into this bag.
    pub fn absorb(&mut self, other: DiagnosticBag) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Whether any error-severity diagnostic was recorded.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity.is_error())
    }

    /// Number of recorded diagnostics.
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Whether the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Iterate over recorded diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Drain the bag into a plain vector.
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bag_collects_and_reports_errors() {
        let mut bag = DiagnosticBag::new();
        assert!(!bag.has_errors());
        bag.warning("a.ts", Span::new(0, 1), "odd");
        assert!(!bag.has_errors());
        bag.error("a.ts", Span::new(2, 3), "bad");
        assert!(bag.has_errors());
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn test_format_line_col() {
        let source = "let a = 1;\nlet b = 2;\n";
        let d = Diagnostic::new("t.ts", Span::new(15, 16), Severity::Error, "boom");
        assert_eq!(d.format(source), "t.ts:2:5 - error: boom");
    }

    #[test]
    fn test_line_col_at_eof() {
        let source = "x\ny";
        assert_eq!(line_col(source, 3), (1, 1));
        assert_eq!(line_col(source, 99), (1, 1));
    }
}
