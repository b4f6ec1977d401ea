//! The core diagnostic type for the Noeta error system.
//!
//! A [`Diagnostic`] represents a single problem with its category, optional
//! error code, labeled source spans, help text and suggested fix.

use std::fmt;

use crate::{
    error::{Category, error_code::ErrorCode, label::Label},
    span::{Position, Span, source_line},
};

/// Where a diagnostic points, resolved against the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceContext {
    position: Position,
    length: usize,
    source_line: Option<String>,
}

impl SourceContext {
    pub fn new(position: Position, length: usize, source_line: Option<String>) -> Self {
        Self {
            position,
            length: length.max(1),
            source_line,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Number of characters the caret underline covers (at least one).
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn source_line(&self) -> Option<&str> {
        self.source_line.as_deref()
    }
}

/// A rich diagnostic message with source location information.
///
/// # Example
///
/// ```text
/// Semantic Error at line 2, column 8:
///        2 | select sale with price as r
///                   ^^^^
///     Dataset 'sale' has not been loaded or created
///
/// Hint: Available datasets: sales
/// Did you mean: sales
/// ```
#[derive(Debug, Clone)]
pub struct Diagnostic {
    category: Category,
    code: Option<ErrorCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
    suggestion: Option<String>,
    context: Option<SourceContext>,
}

impl Diagnostic {
    /// Create a diagnostic in the given category.
    pub fn new(category: Category, message: impl Into<String>) -> Self {
        Self {
            category,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
            suggestion: None,
            context: None,
        }
    }

    /// Create a lexical diagnostic.
    pub fn lexical(message: impl Into<String>) -> Self {
        Self::new(Category::Lexical, message)
    }

    /// Create a syntax diagnostic.
    ///
    /// ```
    /// # use noeta_parser::error::{Diagnostic, ErrorCode};
    /// # use noeta_parser::Span;
    /// let diag = Diagnostic::syntax("Expected string value, got number in load")
    ///     .with_code(ErrorCode::E100)
    ///     .with_label(Span::new(5..7), "unexpected token");
    /// assert_eq!(diag.to_string(), "syntax error[E100]: Expected string value, got number in load");
    /// ```
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(Category::Syntax, message)
    }

    /// Create a semantic diagnostic.
    pub fn semantic(message: impl Into<String>) -> Self {
        Self::new(Category::Semantic, message)
    }

    /// Create a type diagnostic.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(Category::Type, message)
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn suggestion(&self) -> Option<&str> {
        self.suggestion.as_deref()
    }

    /// The resolved location, available once [`Diagnostic::locate`] ran.
    pub fn context(&self) -> Option<&SourceContext> {
        self.context.as_ref()
    }

    /// Span of the first primary label.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|label| label.is_primary())
            .map(Label::span)
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Add a primary label to this diagnostic.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    /// Add a secondary label to this diagnostic.
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Set the literal fix offered to the user.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Set the suggestion if one is available.
    pub fn with_optional_suggestion(mut self, suggestion: Option<String>) -> Self {
        if suggestion.is_some() {
            self.suggestion = suggestion;
        }
        self
    }

    /// Resolve the primary label against `source`.
    ///
    /// Fills in line, column, caret length and the offending source line.
    /// Diagnostics without a primary label, or that were already located,
    /// are returned unchanged.
    pub fn locate(mut self, source: &str) -> Self {
        if self.context.is_some() {
            return self;
        }
        let Some(span) = self.primary_span() else {
            return self;
        };

        let position = Position::from_offset(source, span.start());
        let line = source_line(source, position.line);
        let length = source
            .get(span.start()..span.end())
            .map(|text| text.split('\n').next().unwrap_or_default().chars().count())
            .unwrap_or(1);

        self.context = Some(SourceContext::new(
            position,
            length,
            line.map(str::to_string),
        ));
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "syntax error[E100]: message" or "syntax error: message"
        write!(f, "{}", self.category)?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Diagnostic {}
