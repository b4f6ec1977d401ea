//! Error adapter for converting NoetaError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI.
//!
//! # Multi-Error Support
//!
//! Semantic analysis can reject a program with several diagnostics at once;
//! each one is rendered as its own report.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, GraphicalReportHandler, LabeledSpan, SourceSpan};

use noeta::{NoetaError, config::DiagnosticStyle};
use noeta_parser::error::Diagnostic;

/// Adapter for a single noeta diagnostic.
pub struct DiagnosticAdapter<'a> {
    diag: &'a Diagnostic,
    /// Source code for displaying snippets
    src: &'a str,
}

impl<'a> DiagnosticAdapter<'a> {
    pub fn new(diag: &'a Diagnostic, src: &'a str) -> Self {
        Self { diag, src }
    }
}

impl fmt::Debug for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticAdapter")
            .field("diag", &self.diag)
            .finish()
    }
}

impl fmt::Display for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diag.message())
    }
}

impl std::error::Error for DiagnosticAdapter<'_> {}

impl MietteDiagnostic for DiagnosticAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .code()
            .map(|c| Box::new(c) as Box<dyn fmt::Display>)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match (self.diag.help(), self.diag.suggestion()) {
            (Some(help), Some(suggestion)) => Some(Box::new(format!(
                "{help}\nDid you mean '{suggestion}'?"
            ))),
            (None, Some(suggestion)) => {
                Some(Box::new(format!("Did you mean '{suggestion}'?")))
            }
            (Some(help), None) => Some(Box::new(help)),
            (None, None) => None,
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let labels = self.diag.labels();
        if labels.is_empty() {
            return None;
        }

        Some(Box::new(labels.iter().map(|label| {
            let span: SourceSpan = label.span().into();
            let message = Some(label.message().to_string());
            if label.is_primary() {
                LabeledSpan::new_primary_with_span(message, span)
            } else {
                LabeledSpan::new_with_span(message, span)
            }
        })))
    }
}

/// Adapter for [`NoetaError`] variants without source locations.
pub struct ErrorAdapter<'a>(pub &'a NoetaError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            NoetaError::Io(_) => "noeta::io",
            NoetaError::Config(_) => "noeta::config",
            NoetaError::Compile { .. } => return None,
        };
        Some(Box::new(code))
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A rich diagnostic with source location information.
    Diagnostic(DiagnosticAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Diagnostic(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Diagnostic(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Diagnostic(d) => d.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Diagnostic(d) => d.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Convert a [`NoetaError`] into a list of reportable errors, one per
/// diagnostic for compile errors.
pub fn to_reportables(err: &NoetaError) -> Vec<Reportable<'_>> {
    match err {
        NoetaError::Compile { err: compile_err, src } => compile_err
            .diagnostics()
            .iter()
            .map(|d| Reportable::Diagnostic(DiagnosticAdapter::new(d, src)))
            .collect(),
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}

/// Render `err` for the terminal in the requested style.
///
/// The plain style uses the compiler's own text format, one block per
/// diagnostic with location, source line and caret.
pub fn render(err: &NoetaError, style: DiagnosticStyle) -> Vec<String> {
    match style {
        DiagnosticStyle::Plain => vec![err.to_string()],
        DiagnosticStyle::Fancy => {
            let reporter = GraphicalReportHandler::new();
            to_reportables(err)
                .iter()
                .map(|reportable| {
                    let mut writer = String::new();
                    match reporter.render_report(&mut writer, reportable) {
                        Ok(()) => writer,
                        Err(_) => reportable.to_string(),
                    }
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use noeta_parser::{
        Span,
        error::{CompileError, ErrorCode},
    };

    use super::*;

    #[test]
    fn test_single_diagnostic() {
        let diag = Diagnostic::semantic("Dataset 'x' has not been loaded or created")
            .with_code(ErrorCode::E200)
            .with_label(Span::new(7..8), "undefined dataset")
            .with_help("No datasets have been loaded yet");
        let err = NoetaError::new_compile_error(CompileError::from(diag), "select x");

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);

        match &reportables[0] {
            Reportable::Diagnostic(d) => {
                assert_eq!(d.to_string(), "Dataset 'x' has not been loaded or created");
                assert_eq!(
                    d.code().map(|c| c.to_string()),
                    Some("E200".to_string())
                );
            }
            Reportable::Error(_) => panic!("Expected Diagnostic"),
        }
    }

    #[test]
    fn test_multiple_diagnostics() {
        let diags = vec![
            Diagnostic::semantic("first error").with_label(Span::new(0..5), "first"),
            Diagnostic::semantic("second error").with_label(Span::new(10..15), "second"),
            Diagnostic::type_error("third error").with_label(Span::new(20..25), "third"),
        ];
        let err = NoetaError::new_compile_error(CompileError::from(diags), "source code here...");

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 3);
        assert_eq!(reportables[0].to_string(), "first error");
        assert_eq!(reportables[1].to_string(), "second error");
        assert_eq!(reportables[2].to_string(), "third error");
    }

    #[test]
    fn test_non_compile_error() {
        let err = NoetaError::Config("bad value".to_string());

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);
        match &reportables[0] {
            Reportable::Error(e) => {
                assert_eq!(e.to_string(), "Configuration error: bad value");
                assert_eq!(e.code().map(|c| c.to_string()), Some("noeta::config".into()));
            }
            Reportable::Diagnostic(_) => panic!("Expected Error"),
        }
    }

    #[test]
    fn test_suggestion_joins_help() {
        let diag = Diagnostic::semantic("Dataset 'sale' has not been loaded or created")
            .with_help("Available datasets: sales")
            .with_suggestion("sales");
        let adapter = DiagnosticAdapter::new(&diag, "select sale");

        let help = adapter.help().map(|h| h.to_string());
        assert_eq!(
            help.as_deref(),
            Some("Available datasets: sales\nDid you mean 'sales'?")
        );
    }

    #[test]
    fn test_primary_flag_on_labels() {
        let diag = Diagnostic::semantic("error with labels")
            .with_label(Span::new(0..5), "primary")
            .with_secondary_label(Span::new(10..15), "secondary");

        let adapter = DiagnosticAdapter::new(&diag, "some source code");

        let labels: Vec<_> = adapter.labels().expect("labels").collect();
        assert_eq!(labels.len(), 2);
        assert!(labels[0].primary());
        assert!(!labels[1].primary());
    }

    #[test]
    fn test_render_styles() {
        let source = "select x";
        let diag = Diagnostic::semantic("Dataset 'x' has not been loaded or created")
            .with_code(ErrorCode::E200)
            .with_label(Span::new(7..8), "undefined dataset")
            .locate(source);
        let err = NoetaError::new_compile_error(CompileError::from(diag), source);

        let plain = render(&err, DiagnosticStyle::Plain);
        assert_eq!(plain.len(), 1);
        assert!(plain[0].contains("Dataset 'x' has not been loaded or created"));

        let fancy = render(&err, DiagnosticStyle::Fancy);
        assert_eq!(fancy.len(), 1);
        assert!(fancy[0].contains("undefined dataset"));
    }
}
