//! Command-line argument definitions for the Noeta CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control the input programs, the output path,
//! configuration file selection, analysis strictness and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Noeta compiler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Noeta programs, compiled in order against one session
    #[arg(required = true, help = "Paths to the input .noeta files")]
    pub inputs: Vec<String>,

    /// Path to the output Python file; standard output when omitted
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Check column types against the operations applied to them
    #[arg(long)]
    pub type_check: bool,

    /// JSON file of runtime bindings to seed the session with
    #[arg(long)]
    pub bindings: Option<String>,

    /// Print diagnostics as plain text instead of rich reports
    #[arg(long)]
    pub plain: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
