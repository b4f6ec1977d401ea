//! Diagnostic categories.
//!
//! The category names the compiler phase responsible for a diagnostic and
//! fixes the order in which grouped reports list them.

use std::fmt;

/// The phase a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Raised by the lexer; aborts compilation.
    Lexical,
    /// Raised by the parser; aborts compilation.
    Syntax,
    /// Undefined datasets and columns.
    Semantic,
    /// Column type mismatches found in type-check mode.
    Type,
    /// Reserved for problems detected while running generated code.
    Runtime,
}

impl Category {
    /// All categories in report order.
    pub const ALL: [Category; 5] = [
        Category::Lexical,
        Category::Syntax,
        Category::Semantic,
        Category::Type,
        Category::Runtime,
    ];

    /// Heading used in rendered reports, e.g. `Syntax Error`.
    pub fn title(&self) -> &'static str {
        match self {
            Category::Lexical => "Lexical Error",
            Category::Syntax => "Syntax Error",
            Category::Semantic => "Semantic Error",
            Category::Type => "Type Error",
            Category::Runtime => "Runtime Error",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Lexical => write!(f, "lexical error"),
            Category::Syntax => write!(f, "syntax error"),
            Category::Semantic => write!(f, "semantic error"),
            Category::Type => write!(f, "type error"),
            Category::Runtime => write!(f, "runtime error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_titles_and_order() {
        assert_eq!(Category::Syntax.title(), "Syntax Error");
        assert!(Category::Lexical < Category::Semantic);
        assert_eq!(Category::ALL.first(), Some(&Category::Lexical));
    }
}
