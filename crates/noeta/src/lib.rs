//! Noeta - a small language for tabular data analysis.
//!
//! A Noeta program is a list of statements such as `load`, `filter`,
//! `groupby` or `boxplot`. This crate compiles one into a standalone Python
//! program built on pandas, numpy, matplotlib and seaborn.
//!
//! Compilation runs four phases: lexing, parsing, semantic analysis against a
//! [`SymbolTable`] of known datasets, and code generation. Each phase stops
//! the pipeline on error; analysis reports every problem it finds in one go.
//!
//! ```
//! let python = noeta::compile("load \"sales.csv\" as sales\ndescribe sales", false, None)?;
//! assert!(python.contains("sales = pd.read_csv('sales.csv')"));
//! assert!(python.contains("print(sales.describe())"));
//! # Ok::<(), noeta::CompileError>(())
//! ```

pub mod codegen;
pub mod config;

mod error;
mod probe;

pub use noeta_core::{ColumnInfo, DataType, DatasetInfo, RuntimeValue, SymbolTable};
pub use noeta_parser::{
    NoProbe, SchemaProbe,
    error::{Category, CompileError, Diagnostic, ErrorCode},
};

pub use error::NoetaError;
pub use probe::FileProbe;

use std::{fs, path::Path};

use log::{debug, info, trace};

use noeta_parser::{Analyzer, ast::Program, parse, significant_tokens, tokenize};

use codegen::CodeGenerator;
use config::{AppConfig, CodegenConfig};

/// Compile Noeta source into Python with default settings.
///
/// With `type_check`, data files named by `load` are probed for their schema
/// and column references are checked against it. When `table` is
/// given, datasets from earlier compilations are visible and the aliases
/// defined here are added to it; otherwise a fresh table is used and dropped.
///
/// # Errors
///
/// Returns the lexical or syntax diagnostic that stopped parsing, or every
/// semantic diagnostic found during analysis. All diagnostics carry their
/// line, column and source line.
pub fn compile(
    source: &str,
    type_check: bool,
    table: Option<&mut SymbolTable>,
) -> Result<String, CompileError> {
    let probe = FileProbe::default();
    let program = front_end(source, type_check, &probe, table)?;
    Ok(CodeGenerator::new(&CodegenConfig::default()).generate(&program))
}

/// Lex, parse and analyze `source`, returning the validated program.
fn front_end(
    source: &str,
    type_check: bool,
    probe: &dyn SchemaProbe,
    table: Option<&mut SymbolTable>,
) -> Result<Program, CompileError> {
    let located = |diagnostic: Diagnostic| CompileError::from(diagnostic).located(source);

    let tokens = significant_tokens(tokenize(source).map_err(located)?);
    trace!(tokens = tokens.len(); "Tokenized source");

    let program = parse(&tokens).map_err(located)?;
    debug!(statements = program.len(); "Parsed program");

    let mut fresh = SymbolTable::new();
    let table = table.unwrap_or(&mut fresh);
    let diagnostics = Analyzer::new(table)
        .with_source(source)
        .with_probe(probe)
        .with_type_check(type_check)
        .analyze(&program);
    if !diagnostics.is_empty() {
        debug!(count = diagnostics.len(); "Analysis failed");
        return Err(CompileError::new(diagnostics).located(source));
    }

    Ok(program)
}

/// Configurable front door to the compiler.
///
/// Unlike [`compile`], a `Compiler` takes its type checking, plot styling
/// and probe settings from an [`AppConfig`], and the schema probe can be
/// replaced.
///
/// # Examples
///
/// ```
/// use noeta::{Compiler, NoProbe, SymbolTable, config::AppConfig};
///
/// let compiler = Compiler::new(AppConfig::default()).with_probe(Box::new(NoProbe));
/// let mut table = SymbolTable::new();
///
/// compiler.compile("load \"sales.csv\" as sales", Some(&mut table))?;
/// assert!(table.exists("sales"));
///
/// // Later programs see datasets defined by earlier ones.
/// let python = compiler.compile("head sales n=3", Some(&mut table))?;
/// assert!(python.contains("sales.head(3)"));
/// # Ok::<(), noeta::NoetaError>(())
/// ```
pub struct Compiler {
    config: AppConfig,
    probe: Box<dyn SchemaProbe>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl Compiler {
    /// Create a compiler that probes data files as `config` describes.
    pub fn new(config: AppConfig) -> Self {
        let probe = Box::new(FileProbe::new(config.probe().sample_rows()));
        Self { config, probe }
    }

    /// Replace the schema probe.
    pub fn with_probe(mut self, probe: Box<dyn SchemaProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Compile `source` into Python.
    ///
    /// # Errors
    ///
    /// Returns [`NoetaError::Compile`] carrying the diagnostics and the
    /// source they point into.
    pub fn compile(
        &self,
        source: &str,
        table: Option<&mut SymbolTable>,
    ) -> Result<String, NoetaError> {
        info!(type_check = self.config.compile().type_check(); "Compiling program");

        let program = front_end(
            source,
            self.config.compile().type_check(),
            self.probe.as_ref(),
            table,
        )
        .map_err(|err| NoetaError::new_compile_error(err, source))?;

        let python = CodeGenerator::new(self.config.codegen()).generate(&program);
        info!(statements = program.len(); "Program compiled");
        Ok(python)
    }

    /// Read a `.noeta` file and compile it.
    ///
    /// # Errors
    ///
    /// Returns [`NoetaError::Io`] when the file cannot be read, otherwise
    /// the same errors as [`Compiler::compile`].
    pub fn compile_file(
        &self,
        path: impl AsRef<Path>,
        table: Option<&mut SymbolTable>,
    ) -> Result<String, NoetaError> {
        let path = path.as_ref();
        debug!(path = path.display().to_string(); "Reading source file");
        let source = fs::read_to_string(path)?;
        self.compile(&source, table)
    }
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
