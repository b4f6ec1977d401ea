//! CLI logic for the Noeta compiler.
//!
//! Compiles one or more `.noeta` programs into a single Python script.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use indexmap::IndexMap;
use log::{debug, info};
use serde::Deserialize;

use noeta::{
    Compiler, NoetaError,
    config::{AppConfig, DiagnosticStyle},
};
use noeta_core::{RuntimeValue, SymbolTable};

/// Runtime bindings keyed by variable name, as exported by a host session.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
struct Bindings(IndexMap<String, RuntimeValue>);

/// Load the configuration and apply command-line overrides.
///
/// # Errors
///
/// Returns `NoetaError::Config` when an explicit configuration file is
/// missing or invalid.
pub fn resolve_config(args: &Args) -> Result<AppConfig, NoetaError> {
    let mut config = config::load_config(args.config.as_ref())?;

    if args.type_check {
        config.set_type_check(true);
    }
    if args.plain {
        config.set_diagnostic_style(DiagnosticStyle::Plain);
    }

    debug!(config:?; "Resolved configuration");
    Ok(config)
}

fn load_bindings(path: impl AsRef<Path>) -> Result<Bindings, NoetaError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|err| {
        NoetaError::Config(format!(
            "Invalid bindings file {}: {err}",
            path.display()
        ))
    })
}

/// Run the Noeta CLI application
///
/// Every input is compiled against one session symbol table, so later
/// programs can use datasets defined by earlier ones. The generated scripts
/// are concatenated in input order and written to the output file, or to
/// standard output when none is given.
///
/// # Errors
///
/// Returns `NoetaError` for:
/// - File I/O errors
/// - Invalid bindings files
/// - Compilation errors in any input
pub fn run(args: &Args, config: &AppConfig) -> Result<(), NoetaError> {
    let mut table = SymbolTable::new();

    if let Some(path) = &args.bindings {
        let Bindings(bindings) = load_bindings(path)?;
        let registered = table.reconcile(bindings);
        info!(path = path.as_str(), registered = registered.len(); "Seeded session from bindings");
    }

    let compiler = Compiler::new(config.clone());
    let mut scripts = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        info!(input_path = input.as_str(); "Compiling program");
        scripts.push(compiler.compile_file(input, Some(&mut table))?);
    }
    let python = scripts.join("\n");

    match &args.output {
        Some(output) => {
            fs::write(output, python)?;
            info!(output_file = output.as_str(); "Python script written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(python.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use noeta_core::DataType;

    use super::*;

    fn args(inputs: &[&str]) -> Args {
        Args {
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            output: None,
            config: None,
            type_check: false,
            bindings: None,
            plain: false,
            log_level: "off".to_string(),
        }
    }

    #[test]
    fn test_cli_overrides() {
        let mut args = args(&["a.noeta"]);
        args.type_check = true;
        args.plain = true;
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "[compile]\ntype_check = false").expect("Failed to write config");
        args.config = Some(file.path().to_string_lossy().to_string());

        let config = resolve_config(&args).expect("Config should resolve");
        assert!(config.compile().type_check());
        assert_eq!(config.diagnostics().style(), DiagnosticStyle::Plain);
    }

    #[test]
    fn test_bindings_file() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        write!(
            file,
            r#"{{"frame": {{"kind": "table", "columns": {{"amount": "float64", "region": "object"}}}}, "n": {{"kind": "other"}}}}"#
        )
        .expect("Failed to write bindings");

        let Bindings(bindings) = load_bindings(file.path()).expect("Bindings should load");
        assert_eq!(bindings.len(), 2);

        let mut table = SymbolTable::new();
        assert_eq!(table.reconcile(bindings), vec!["frame".to_string()]);
        let frame = table.lookup("frame").expect("frame is registered");
        assert_eq!(
            frame.column("amount").map(|c| c.dtype()),
            Some(DataType::Numeric)
        );
    }

    #[test]
    fn test_invalid_bindings_file() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        write!(file, "[1, 2]").expect("Failed to write bindings");

        let err = load_bindings(file.path()).expect_err("Not an object");
        assert!(matches!(err, NoetaError::Config(message) if message.contains("Invalid bindings")));
    }
}
