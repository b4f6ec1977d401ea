//! Python code generation.
//!
//! [`CodeGenerator`] walks a validated [`Program`] and emits one template per
//! statement. A statement with `as r` binds its value and prints a one-line
//! report; without an alias the value is printed under a title. Imports are
//! collected as statements need them and written sorted at the top.

mod expr;
mod python;
mod statements;

use std::collections::BTreeSet;

use indexmap::IndexSet;
use log::{debug, trace};

use noeta_parser::ast::{ColumnTarget, Program, Statement};

use crate::config::CodegenConfig;

pub(crate) const PANDAS: &str = "import pandas as pd";
pub(crate) const NUMPY: &str = "import numpy as np";
pub(crate) const PYPLOT: &str = "import matplotlib.pyplot as plt";
pub(crate) const SEABORN: &str = "import seaborn as sns";
pub(crate) const STATS: &str = "from scipy import stats";
pub(crate) const SQLALCHEMY: &str = "from sqlalchemy import create_engine";

/// Turns a [`Program`] into Python source.
///
/// # Examples
///
/// ```
/// # use noeta::{codegen::CodeGenerator, config::CodegenConfig};
/// # use noeta_parser::{parse, significant_tokens, tokenize};
/// let tokens = significant_tokens(tokenize("load \"sales.csv\" as sales")?);
/// let program = parse(&tokens)?;
///
/// let code = CodeGenerator::new(&CodegenConfig::default()).generate(&program);
/// assert!(code.starts_with("import pandas as pd"));
/// assert!(code.contains("sales = pd.read_csv('sales.csv')"));
/// # Ok::<(), noeta_parser::error::Diagnostic>(())
/// ```
#[derive(Debug)]
pub struct CodeGenerator<'a> {
    config: &'a CodegenConfig,
    imports: BTreeSet<&'static str>,
    lines: Vec<String>,
    symbols: IndexSet<String>,
    has_plot: bool,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(config: &'a CodegenConfig) -> Self {
        Self {
            config,
            imports: BTreeSet::new(),
            lines: Vec::new(),
            symbols: IndexSet::new(),
            has_plot: false,
        }
    }

    /// Generate the complete Python program.
    pub fn generate(mut self, program: &Program) -> String {
        self.imports.insert(PANDAS);

        for statement in &program.statements {
            trace!(keyword = statement.keyword().as_str(); "Generating statement");
            self.statement(statement);
        }

        debug!(
            lines = self.lines.len(),
            imports = self.imports.len(),
            bound = self.symbols.len(),
            plots = self.has_plot;
            "Code generated"
        );

        self.finish()
    }

    fn finish(self) -> String {
        let mut out = String::new();
        for import in &self.imports {
            out.push_str(import);
            out.push('\n');
        }

        if self.has_plot {
            out.push_str("\n# Configure visualization settings\n");
            out.push_str(&format!(
                "plt.style.use({})\n",
                python::string(self.config.plot_style())
            ));
            out.push_str(&format!(
                "sns.set_palette({})\n",
                python::string(self.config.palette())
            ));
            out.push_str(&format!(
                "plt.rcParams['figure.figsize'] = ({}, {})\n",
                python::float(self.config.figure_width()),
                python::float(self.config.figure_height())
            ));
        }

        if !self.lines.is_empty() {
            out.push('\n');
            out.push_str(&self.lines.join("\n"));
            out.push('\n');
        }

        if self.has_plot {
            out.push_str("\n# Display plots\n");
            out.push_str("plt.tight_layout()\n");
            out.push_str("try:\n");
            out.push_str("    get_ipython()\n");
            out.push_str("except NameError:\n");
            out.push_str("    plt.show()\n");
        }

        out
    }

    fn import(&mut self, import: &'static str) {
        self.imports.insert(import);
    }

    fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    fn plot(&mut self) {
        self.import(PYPLOT);
        self.import(SEABORN);
        self.has_plot = true;
    }

    /// Bind `value` to the statement's alias and print `report(alias)`, or
    /// print `value` under `title` when there is no alias.
    fn bind(
        &mut self,
        statement: &Statement,
        value: String,
        title: &str,
        report: impl FnOnce(&str) -> String,
    ) {
        match statement.result_name() {
            Some(result) => {
                self.line(format!("{result} = {value}"));
                self.line(format!("print({})", report(result)));
                self.symbols.insert(result.to_string());
            }
            None => {
                self.line(format!("print({})", python::string(&format!("\n{title}:"))));
                self.line(format!("print({value})"));
            }
        }
    }

    /// `bind` with the common "n rows" report.
    fn bind_rows(&mut self, statement: &Statement, value: String, title: &str, verb: &str) {
        let source = statement
            .sources()
            .first()
            .map(|name| name.inner().clone())
            .unwrap_or_default();
        self.bind(statement, value, title, |result| {
            let text = python::fstring_text(&format!("{verb} {source}:"));
            format!("f'{text} {{len({result})}} rows'")
        });
    }

    /// Replace the target column in a copy of its dataset.
    fn replace_column(&mut self, statement: &Statement, target: &ColumnTarget, value: String, verb: &str) {
        let column = target.column();
        self.assign_column(statement, target.source(), column, value, &format!("{verb} {column}"));
    }

    /// Add `<column>_<suffix>` to a copy of the target's dataset.
    fn derive_column(&mut self, statement: &Statement, target: &ColumnTarget, suffix: &str, value: String) {
        let column = format!("{}_{suffix}", target.column());
        let verb = format!("Added {column}");
        self.assign_column(statement, target.source(), &column, value, &verb);
    }

    fn assign_column(&mut self, statement: &Statement, source: &str, column: &str, value: String, verb: &str) {
        let assigned = format!("{source}.assign(**{{{}: {value}}})", python::string(column));
        self.bind(statement, assigned, verb, |result| {
            python::string(&format!("{verb} in {result}"))
        });
    }

    /// Print a display-only value under a title.
    fn show(&mut self, title: impl AsRef<str>, value: impl Into<String>) {
        self.line(format!(
            "print({})",
            python::string(&format!("\n{}:", title.as_ref()))
        ));
        self.line(format!("print({})", value.into()));
    }
}

#[cfg(test)]
mod tests;
