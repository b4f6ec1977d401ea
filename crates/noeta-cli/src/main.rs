//! Noeta CLI entry point.

use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use noeta::config::DiagnosticStyle;
use noeta_cli::{Args, error_adapter::render};

fn main() {
    // Install miette's pretty panic hook early for better panic reports
    miette::set_panic_hook();

    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?; "Starting Noeta");
    debug!(args:?; "Parsed arguments");

    // Configuration errors are reported before the configured style is known
    let config = match noeta_cli::resolve_config(&args) {
        Ok(config) => config,
        Err(err) => {
            for report in render(&err, DiagnosticStyle::Fancy) {
                error!("{report}");
            }
            process::exit(1);
        }
    };

    if let Err(err) = noeta_cli::run(&args, &config) {
        for report in render(&err, config.diagnostics().style()) {
            error!("{report}");
        }
        process::exit(1);
    }

    info!("Completed successfully");
}
