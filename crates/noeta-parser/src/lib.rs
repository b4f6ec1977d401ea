//! # Noeta Parser
//!
//! Front end of the Noeta data language: lexer, parser, semantic analyzer
//! and the diagnostics they produce.
//!
//! ## Usage
//!
//! ```
//! # use noeta_parser::{Analyzer, parse, significant_tokens, tokenize};
//! # use noeta_core::SymbolTable;
//! let source = r#"
//!     load "sales.csv" as sales
//!     filter sales where price > 100 as expensive
//!     describe expensive
//! "#;
//!
//! let tokens = significant_tokens(tokenize(source)?);
//! let program = parse(&tokens)?;
//! assert_eq!(program.len(), 3);
//!
//! let mut table = SymbolTable::new();
//! let diagnostics = Analyzer::new(&mut table).with_source(source).analyze(&program);
//! assert!(diagnostics.is_empty());
//! assert!(table.exists("expensive"));
//! # Ok::<(), noeta_parser::error::Diagnostic>(())
//! ```

pub mod analyze;
pub mod ast;
pub mod error;
pub mod keyword;
pub mod lexer;
pub mod parser;
#[cfg(test)]
mod parser_tests;
mod span;
pub mod tokens;

pub use analyze::{Analyzer, NoProbe, SchemaProbe};
pub use lexer::{significant_tokens, tokenize};
pub use parser::parse;
pub use span::{Position, Span, Spanned, source_line};
