//! Configuration types for Noeta compilation.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from a
//! TOML file; every section and field falls back to its default when absent.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining every section.
//! - [`CompileConfig`] - Analyzer behaviour such as type checking.
//! - [`CodegenConfig`] - Plot styling emitted into the generated program.
//! - [`ProbeConfig`] - How much of a data file the schema probe reads.
//! - [`DiagnosticsConfig`] - How diagnostics are rendered.
//!
//! # Example
//!
//! ```
//! # use noeta::config::AppConfig;
//! let config = AppConfig::default();
//! assert!(!config.compile().type_check());
//! assert_eq!(config.codegen().plot_style(), "seaborn-v0_8-darkgrid");
//! assert_eq!(config.probe().sample_rows(), 100);
//! ```

use serde::Deserialize;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Analyzer settings.
    #[serde(default)]
    compile: CompileConfig,

    /// Generated code settings.
    #[serde(default)]
    codegen: CodegenConfig,

    /// Schema probe settings.
    #[serde(default)]
    probe: ProbeConfig,

    /// Diagnostic rendering settings.
    #[serde(default)]
    diagnostics: DiagnosticsConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(
        compile: CompileConfig,
        codegen: CodegenConfig,
        probe: ProbeConfig,
        diagnostics: DiagnosticsConfig,
    ) -> Self {
        Self {
            compile,
            codegen,
            probe,
            diagnostics,
        }
    }

    /// Returns the compile configuration.
    pub fn compile(&self) -> &CompileConfig {
        &self.compile
    }

    /// Returns the code generation configuration.
    pub fn codegen(&self) -> &CodegenConfig {
        &self.codegen
    }

    /// Returns the probe configuration.
    pub fn probe(&self) -> &ProbeConfig {
        &self.probe
    }

    /// Returns the diagnostics configuration.
    pub fn diagnostics(&self) -> &DiagnosticsConfig {
        &self.diagnostics
    }

    /// Turns type checking on or off, overriding the file setting.
    pub fn set_type_check(&mut self, type_check: bool) {
        self.compile.type_check = type_check;
    }

    /// Overrides the diagnostic rendering style.
    pub fn set_diagnostic_style(&mut self, style: DiagnosticStyle) {
        self.diagnostics.style = style;
    }
}

/// Analyzer settings.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CompileConfig {
    /// Probe loaded files and check column types.
    #[serde(default)]
    type_check: bool,
}

impl CompileConfig {
    pub fn new(type_check: bool) -> Self {
        Self { type_check }
    }

    /// Whether type-check mode is enabled.
    pub fn type_check(&self) -> bool {
        self.type_check
    }
}

/// Plot styling written into the preamble of programs that draw.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CodegenConfig {
    plot_style: String,
    palette: String,
    figure_width: f64,
    figure_height: f64,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            plot_style: "seaborn-v0_8-darkgrid".to_string(),
            palette: "husl".to_string(),
            figure_width: 10.0,
            figure_height: 6.0,
        }
    }
}

impl CodegenConfig {
    /// Creates a new [`CodegenConfig`].
    ///
    /// # Arguments
    ///
    /// * `plot_style` - Name passed to `plt.style.use`.
    /// * `palette` - Name passed to `sns.set_palette`.
    /// * `figure_width` - Default figure width in inches.
    /// * `figure_height` - Default figure height in inches.
    pub fn new(
        plot_style: impl Into<String>,
        palette: impl Into<String>,
        figure_width: f64,
        figure_height: f64,
    ) -> Self {
        Self {
            plot_style: plot_style.into(),
            palette: palette.into(),
            figure_width,
            figure_height,
        }
    }

    pub fn plot_style(&self) -> &str {
        &self.plot_style
    }

    pub fn palette(&self) -> &str {
        &self.palette
    }

    pub fn figure_width(&self) -> f64 {
        self.figure_width
    }

    pub fn figure_height(&self) -> f64 {
        self.figure_height
    }
}

/// Limits for the file schema probe.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    sample_rows: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { sample_rows: 100 }
    }
}

impl ProbeConfig {
    pub fn new(sample_rows: usize) -> Self {
        Self { sample_rows }
    }

    /// Maximum number of data rows (or JSON records) inspected per file.
    pub fn sample_rows(&self) -> usize {
        self.sample_rows
    }
}

/// How diagnostics are presented to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticStyle {
    /// Graphical reports with source snippets.
    #[default]
    Fancy,
    /// The plain text report of [`noeta_parser::error::render`].
    Plain,
}

/// Diagnostic rendering settings.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DiagnosticsConfig {
    #[serde(default)]
    style: DiagnosticStyle,
}

impl DiagnosticsConfig {
    pub fn new(style: DiagnosticStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> DiagnosticStyle {
        self.style
    }
}
