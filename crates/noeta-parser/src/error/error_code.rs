//! Error codes for the Noeta diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Lexer errors
//! - `E1xx` - Parser errors
//! - `E2xx` - Semantic errors
//! - `E3xx` - Type errors

use std::fmt;

use crate::error::Category;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer Errors (E0xx)
    // =========================================================================
    /// Unterminated string literal.
    ///
    /// A string was opened with a quote but not closed on the same line.
    E001,

    /// Unexpected character.
    ///
    /// A character was encountered that is not part of the language.
    E002,

    /// Invalid numeric literal.
    ///
    /// A run of digits and dots such as `1.2.3` does not form a number.
    E003,

    // =========================================================================
    // Parser Errors (E1xx)
    // =========================================================================
    /// Unexpected token.
    ///
    /// The parser encountered a token it did not expect at this position.
    E100,

    /// Unexpected end of input.
    ///
    /// The input ended before the statement was complete.
    E101,

    /// Unknown statement.
    ///
    /// A statement must begin with a statement keyword such as `load`.
    E102,

    /// Invalid parameter value.
    ///
    /// A parameter was given a value of the wrong shape, e.g. a string
    /// where an integer is required.
    E103,

    /// Unknown parameter.
    ///
    /// The statement does not accept a parameter with this name.
    E104,

    /// Missing parameter.
    ///
    /// A parameter the statement requires was not supplied.
    E105,

    /// Result alias not allowed.
    ///
    /// Display statements print their output and cannot be bound with `as`.
    E106,

    // =========================================================================
    // Semantic Errors (E2xx)
    // =========================================================================
    /// Undefined dataset.
    ///
    /// An alias was referenced before any statement defined it.
    E200,

    /// Undefined column.
    ///
    /// A column was referenced that the dataset's known schema lacks.
    E201,

    // =========================================================================
    // Type Errors (E3xx)
    // =========================================================================
    /// Column type mismatch.
    ///
    /// An operation was applied to a column whose known type it cannot handle.
    E300,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Lexer errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            // Parser errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
            ErrorCode::E105 => "E105",
            ErrorCode::E106 => "E106",
            // Semantic errors
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            // Type errors
            ErrorCode::E300 => "E300",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Lexer errors
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E003 => "invalid numeric literal",
            // Parser errors
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "unexpected end of input",
            ErrorCode::E102 => "unknown statement",
            ErrorCode::E103 => "invalid parameter value",
            ErrorCode::E104 => "unknown parameter",
            ErrorCode::E105 => "missing parameter",
            ErrorCode::E106 => "result alias not allowed",
            // Semantic errors
            ErrorCode::E200 => "undefined dataset",
            ErrorCode::E201 => "undefined column",
            // Type errors
            ErrorCode::E300 => "column type mismatch",
        }
    }

    /// The category every diagnostic with this code belongs to.
    pub fn category(&self) -> Category {
        match self {
            ErrorCode::E001 | ErrorCode::E002 | ErrorCode::E003 => Category::Lexical,
            ErrorCode::E100
            | ErrorCode::E101
            | ErrorCode::E102
            | ErrorCode::E103
            | ErrorCode::E104
            | ErrorCode::E105
            | ErrorCode::E106 => Category::Syntax,
            ErrorCode::E200 | ErrorCode::E201 => Category::Semantic,
            ErrorCode::E300 => Category::Type,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E001.to_string(), "E001");
        assert_eq!(ErrorCode::E100.to_string(), "E100");
        assert_eq!(ErrorCode::E200.to_string(), "E200");
        assert_eq!(ErrorCode::E300.to_string(), "E300");
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::E001.description(), "unterminated string literal");
        assert_eq!(ErrorCode::E200.description(), "undefined dataset");
        assert_eq!(ErrorCode::E105.description(), "missing parameter");
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::E002.category(), Category::Lexical);
        assert_eq!(ErrorCode::E106.category(), Category::Syntax);
        assert_eq!(ErrorCode::E201.category(), Category::Semantic);
        assert_eq!(ErrorCode::E300.category(), Category::Type);
    }
}
