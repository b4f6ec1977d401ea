//! Error and diagnostic system for the Noeta compiler.
//!
//! This module provides an error handling system with:
//! - Error categories matching the compiler phase that raised them
//! - Error codes for documentation and searchability
//! - Labeled spans and a resolved source context for rendering
//! - Similarity suggestions for misspelled names
//! - Diagnostic collector for accumulating multiple errors
//!
//! # Overview
//!
//! The error system is built around the [`Diagnostic`] type. Lexical and
//! syntax diagnostics stop compilation immediately; semantic and type
//! diagnostics accumulate. Whatever was produced is returned wrapped in a
//! [`CompileError`], whose `Display` is the rendered report.
//!
//! # Example
//!
//! ```
//! # use noeta_parser::error::{Diagnostic, ErrorCode};
//! # use noeta_parser::Span;
//!
//! let diag = Diagnostic::semantic("Dataset 'sale' has not been loaded or created")
//!     .with_code(ErrorCode::E200)
//!     .with_label(Span::new(7..11), "undefined dataset")
//!     .with_help("Available datasets: sales")
//!     .with_suggestion("sales")
//!     .locate("select sale with price");
//!
//! assert_eq!(diag.context().map(|c| c.position().column), Some(8));
//! ```

mod category;
mod collector;
mod compile_error;
mod diagnostic;
mod error_code;
mod label;
pub mod render;
pub mod suggest;

pub(crate) use collector::DiagnosticCollector;

pub use category::Category;
pub use compile_error::{CompileError, Result};
pub use diagnostic::{Diagnostic, SourceContext};
pub use error_code::ErrorCode;
pub use label::Label;
