//! The CompileError type for wrapping compilation diagnostics.
//!
//! [`CompileError`] wraps one or more [`Diagnostic`]s that stopped a
//! compilation: a single lexical or syntax diagnostic, or every semantic
//! and type diagnostic the analyzer found.

use std::fmt;

use crate::error::{Diagnostic, render};

/// A type alias for `Result<T, Diagnostic>`.
pub type Result<T> = std::result::Result<T, Diagnostic>;

/// Error type for the compilation pipeline.
///
/// `Display` renders the full plain-text report.
#[derive(Debug, Clone)]
pub struct CompileError {
    diagnostics: Vec<Diagnostic>,
}

impl CompileError {
    /// Create a new compile error from diagnostics.
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// Get all diagnostics in this error.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Whether more than one diagnostic is carried.
    pub fn is_aggregate(&self) -> bool {
        self.diagnostics.len() > 1
    }

    /// Resolve every diagnostic's location against `source`.
    pub fn located(self, source: &str) -> Self {
        Self {
            diagnostics: self
                .diagnostics
                .into_iter()
                .map(|d| d.locate(source))
                .collect(),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render::render_all(&self.diagnostics))
    }
}

impl std::error::Error for CompileError {}

impl From<Diagnostic> for CompileError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
        }
    }
}

impl From<Vec<Diagnostic>> for CompileError {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_compile_error_from_diagnostic() {
        let diag = Diagnostic::syntax("test error").with_code(ErrorCode::E100);
        let err: CompileError = diag.into();

        assert_eq!(err.diagnostics().len(), 1);
        assert!(!err.is_aggregate());
        assert_eq!(err.diagnostics()[0].message(), "test error");
    }

    #[test]
    fn test_compile_error_from_vec() {
        let diags = vec![Diagnostic::semantic("error 1"), Diagnostic::semantic("error 2")];
        let err: CompileError = diags.into();

        assert_eq!(err.diagnostics().len(), 2);
        assert!(err.is_aggregate());
    }

    #[test]
    fn test_compile_error_display_single() {
        let err: CompileError = Diagnostic::semantic("Dataset 'x' has not been loaded or created").into();

        assert_eq!(
            err.to_string(),
            "Semantic Error:\n    Dataset 'x' has not been loaded or created"
        );
    }
}
