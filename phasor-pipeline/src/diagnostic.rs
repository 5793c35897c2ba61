//! Diagnostic types and the sink that counts them.
//!
//! Every phase consults the error count held by [`Diagnostics`] before and
//! after doing work, so the counters only ever go up.

use phasor_core::Phase;
use serde::Serialize;

/// Severity level for a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// An error. Any error stops later phases unless a stop override is set.
    Error,
    /// A warning. Becomes an error under `werror`.
    Warning,
    /// Informational message, never counted.
    Note,
}

impl Severity {
    /// Returns true if this is an error severity.
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }

    /// Returns true if this is a warning severity.
    pub fn is_warning(&self) -> bool {
        matches!(self, Severity::Warning)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// Which part of the compiler produced a diagnostic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Reported by a phase about the program being compiled.
    #[default]
    Compile,
    /// An annotation processor failed.
    Processing,
    /// The compiler itself failed.
    Internal,
}

/// A diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// Where the diagnostic comes from.
    pub category: Category,
    /// The phase that produced this diagnostic, when known.
    pub phase: Option<Phase>,
    /// The diagnostic message.
    pub message: String,
    /// Optional location, usually the origin of a source unit.
    pub location: Option<String>,
}

impl Diagnostic {
    fn with_severity(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            category: Category::Compile,
            phase: None,
            message: message.into(),
            location: None,
        }
    }

    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Error, message)
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Warning, message)
    }

    /// Create a new note diagnostic.
    pub fn note(message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Note, message)
    }

    /// Add a location to this diagnostic.
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Record the phase that produced this diagnostic.
    pub fn in_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Set the category.
    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(loc) = &self.location {
            write!(f, "{}: ", loc)?;
        }
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Collects diagnostics and keeps monotonic error and warning counts.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    errors: usize,
    warnings: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Note => {}
        }
        self.entries.push(diagnostic);
    }

    /// Record an error with just a message.
    pub fn error(&mut self, message: impl Into<String>) {
        self.report(Diagnostic::error(message));
    }

    /// Record a warning with just a message.
    pub fn warning(&mut self, message: impl Into<String>) {
        self.report(Diagnostic::warning(message));
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings > 0
    }

    /// All diagnostics in report order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Get all error diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.severity.is_error())
    }

    /// Get all warning diagnostics.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.severity.is_warning())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_error() {
        let diag = Diagnostic::error("incompatible types").in_phase(Phase::Attr);
        assert!(diag.severity.is_error());
        assert_eq!(diag.phase, Some(Phase::Attr));
        assert_eq!(diag.category, Category::Compile);
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::warning("deprecated supertype").at("src/Sub.toml");
        assert_eq!(diag.to_string(), "src/Sub.toml: warning: deprecated supertype");
        assert_eq!(Diagnostic::error("boom").to_string(), "error: boom");
    }

    #[test]
    fn test_counts() {
        let mut log = Diagnostics::new();
        log.error("first");
        log.warning("second");
        log.report(Diagnostic::note("third"));

        assert_eq!(log.error_count(), 1);
        assert_eq!(log.warning_count(), 1);
        assert_eq!(log.len(), 3);
        assert!(log.has_errors());
        assert_eq!(log.errors().count(), 1);
        assert_eq!(log.warnings().count(), 1);
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Error.to_string(), "error");
        assert_eq!(Severity::Warning.to_string(), "warning");
        assert_eq!(Severity::Note.to_string(), "note");
    }
}
