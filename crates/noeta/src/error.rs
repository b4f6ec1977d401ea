//! Error types for Noeta operations.
//!
//! [`NoetaError`] wraps everything that can go wrong between reading a
//! program and handing back generated Python.

use std::io;

use thiserror::Error;

use noeta_parser::error::CompileError;

/// The main error type for Noeta operations.
///
/// # Diagnostic Variants
///
/// The `Compile` variant carries every diagnostic that stopped compilation
/// together with the source text they point into, so callers can render
/// them with snippets.
#[derive(Debug, Error)]
pub enum NoetaError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{err}")]
    Compile { err: CompileError, src: String },
}

impl NoetaError {
    /// Create a new `Compile` error with the associated source code.
    pub fn new_compile_error(err: CompileError, src: impl Into<String>) -> Self {
        Self::Compile {
            err,
            src: src.into(),
        }
    }
}
