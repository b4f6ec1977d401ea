//! Token types produced by the [`lexer`](super::lexer).

use std::fmt;

use crate::{
    keyword::Keyword,
    span::{Position, Span},
};

/// Token types for the Noeta language
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    Keyword(Keyword),

    // Literals
    Identifier(&'src str),
    StringLiteral(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),

    // Operators
    EqualEqual,   // ==
    NotEqual,     // !=
    LessEqual,    // <=
    GreaterEqual, // >=
    Less,         // <
    Greater,      // >
    Equals,       // =
    Plus,         // +
    Minus,        // -
    Star,         // *
    StarStar,     // **
    Slash,        // /
    Percent,      // %
    Dot,          // .

    // Punctuation
    LeftParen,    // (
    RightParen,   // )
    LeftBrace,    // {
    RightBrace,   // }
    LeftBracket,  // [
    RightBracket, // ]
    Colon,        // :
    Comma,        // ,

    Newline,
    Eof,
}

impl Token<'_> {
    /// Whether this token is the given keyword.
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self, Token::Keyword(k) if *k == keyword)
    }

    /// The phrase used for this token in syntax error messages.
    pub fn description(&self) -> String {
        match self {
            Token::Keyword(k) => format!("\"{}\" keyword", k.as_str()),
            Token::Identifier(_) => "dataset or column name".to_string(),
            Token::StringLiteral(_) => "string value".to_string(),
            Token::Integer(_) | Token::Float(_) => "number".to_string(),
            Token::Boolean(_) => "boolean value".to_string(),
            Token::Newline => "newline".to_string(),
            Token::Eof => "end of file".to_string(),
            other => format!("\"{other}\""),
        }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Keyword(k) => write!(f, "{}", k.as_str()),
            Token::Identifier(name) => write!(f, "{name}"),
            Token::StringLiteral(s) => write!(f, "\"{s}\""),
            Token::Integer(n) => write!(f, "{n}"),
            Token::Float(n) => write!(f, "{n}"),
            Token::Boolean(b) => write!(f, "{b}"),
            Token::EqualEqual => write!(f, "=="),
            Token::NotEqual => write!(f, "!="),
            Token::LessEqual => write!(f, "<="),
            Token::GreaterEqual => write!(f, ">="),
            Token::Less => write!(f, "<"),
            Token::Greater => write!(f, ">"),
            Token::Equals => write!(f, "="),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::StarStar => write!(f, "**"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Dot => write!(f, "."),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::Colon => write!(f, ":"),
            Token::Comma => write!(f, ","),
            Token::Newline => write!(f, "\\n"),
            Token::Eof => write!(f, "<eof>"),
        }
    }
}

/// A token with its byte span and line/column position.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken<'src> {
    pub token: Token<'src>,
    pub span: Span,
    pub position: Position,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token<'src>, span: Span, position: Position) -> Self {
        Self {
            token,
            span,
            position,
        }
    }
}

impl<'src> std::ops::Deref for PositionedToken<'src> {
    type Target = Token<'src>;

    fn deref(&self) -> &Self::Target {
        &self.token
    }
}

impl fmt::Display for PositionedToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.token, self.position)
    }
}
