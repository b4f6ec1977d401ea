//! Plain-text rendering of diagnostics.
//!
//! [`render`] produces the single-diagnostic report, [`render_all`] the
//! grouped report used when a compilation produced several diagnostics.
//! Both are pure functions of the (located) diagnostics.

use crate::error::{Category, Diagnostic, SourceContext};

const RULE_WIDTH: usize = 60;

/// Render one diagnostic.
///
/// ```text
/// Syntax Error at line 1, column 14:
///        1 | select sales 123 as result
///                         ^^^
///     Expected dataset or column name, got number in select
///
/// Hint: ...
/// Did you mean: ...
/// ```
pub fn render(diagnostic: &Diagnostic) -> String {
    let mut lines = Vec::new();
    let title = diagnostic.category().title();

    match diagnostic.context() {
        Some(context) => {
            let position = context.position();
            lines.push(format!(
                "{title} at line {}, column {}:",
                position.line, position.column
            ));
            push_source_excerpt(&mut lines, context);
        }
        None => lines.push(format!("{title}:")),
    }

    lines.push(format!("    {}", diagnostic.message()));

    if let Some(help) = diagnostic.help() {
        lines.push(String::new());
        lines.push(format!("Hint: {help}"));
    }
    if let Some(suggestion) = diagnostic.suggestion() {
        lines.push(format!("Did you mean: {suggestion}"));
    }

    lines.join("\n")
}

/// Render a batch of diagnostics grouped by category.
///
/// A batch of one renders exactly like [`render`]; an empty batch renders
/// as an empty string.
pub fn render_all(diagnostics: &[Diagnostic]) -> String {
    match diagnostics {
        [] => String::new(),
        [single] => render(single),
        _ => render_grouped(diagnostics),
    }
}

fn render_grouped(diagnostics: &[Diagnostic]) -> String {
    let mut lines = vec![
        format!("Found {} errors in compilation:", diagnostics.len()),
        String::new(),
    ];

    let mut number = 1;
    for category in Category::ALL {
        let group: Vec<&Diagnostic> = diagnostics
            .iter()
            .filter(|d| d.category() == category)
            .collect();
        if group.is_empty() {
            continue;
        }

        lines.push(format!("\n{}s ({}):", category.title(), group.len()));
        lines.push("-".repeat(RULE_WIDTH));

        for diagnostic in group {
            lines.push(format!("\n[Error {number}]"));
            if let Some(context) = diagnostic.context() {
                let position = context.position();
                lines.push(format!(
                    "  Line {}, column {}:",
                    position.line, position.column
                ));
                push_source_excerpt(&mut lines, context);
            }
            lines.push(format!("    {}", diagnostic.message()));
            if let Some(help) = diagnostic.help() {
                lines.push(format!("  Hint: {help}"));
            }
            if let Some(suggestion) = diagnostic.suggestion() {
                lines.push(format!("  Did you mean: {suggestion}"));
            }
            number += 1;
        }
    }

    lines.push(String::new());
    lines.push("=".repeat(RULE_WIDTH));
    let plural = if diagnostics.len() == 1 { "" } else { "s" };
    lines.push(format!("Total: {} error{plural} found", diagnostics.len()));

    lines.join("\n")
}

/// Push the numbered source line and the caret underline.
fn push_source_excerpt(lines: &mut Vec<String>, context: &SourceContext) {
    let Some(source_line) = context.source_line() else {
        return;
    };

    let number = format!("{:4}", context.position().line);
    lines.push(format!("    {number} | {source_line}"));

    let indent = 4 + number.len() + 3 + context.position().column.saturating_sub(1);
    lines.push(format!(
        "{}{}",
        " ".repeat(indent),
        "^".repeat(context.length())
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorCode, span::Span};

    fn undefined_dataset(source: &str, start: usize, name: &str) -> Diagnostic {
        Diagnostic::semantic(format!("Dataset '{name}' has not been loaded or created"))
            .with_code(ErrorCode::E200)
            .with_label(Span::new(start..start + name.len()), "undefined dataset")
            .with_help("Available datasets: sales")
            .with_suggestion("sales")
            .locate(source)
    }

    #[test]
    fn test_render_single() {
        let source = "load \"s.csv\" as sales\nselect sale with price";
        let rendered = render(&undefined_dataset(source, 29, "sale"));

        let expected = [
            "Semantic Error at line 2, column 8:",
            "       2 | select sale with price",
            "                  ^^^^",
            "    Dataset 'sale' has not been loaded or created",
            "",
            "Hint: Available datasets: sales",
            "Did you mean: sales",
        ]
        .join("\n");
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_render_without_context() {
        let rendered = render(&Diagnostic::syntax("Unexpected end of file"));
        assert_eq!(rendered, "Syntax Error:\n    Unexpected end of file");
    }

    #[test]
    fn test_render_all_single_matches_render() {
        let diag = Diagnostic::semantic("x");
        assert_eq!(render_all(std::slice::from_ref(&diag)), render(&diag));
        assert_eq!(render_all(&[]), "");
    }

    #[test]
    fn test_render_grouped() {
        let source = "select a with x\nselect b with y";
        let diagnostics = vec![
            Diagnostic::type_error("Column 'x' has type string, expected numeric")
                .with_label(Span::new(14..15), "here")
                .locate(source),
            undefined_dataset(source, 7, "a"),
            undefined_dataset(source, 23, "b"),
        ];

        let rendered = render_all(&diagnostics);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "Found 3 errors in compilation:");
        assert!(rendered.contains("\nSemantic Errors (2):\n"));
        assert!(rendered.contains("\nType Errors (1):\n"));
        assert!(rendered.contains(&"-".repeat(60)));
        // Semantic errors are listed before type errors and numbering
        // continues across sections.
        let semantic = rendered.find("Semantic Errors").unwrap();
        let type_section = rendered.find("Type Errors").unwrap();
        assert!(semantic < type_section);
        assert!(rendered.contains("[Error 3]\n  Line 1, column 15:"));
        assert!(rendered.contains("  Hint: Available datasets: sales"));
        assert!(rendered.contains("  Did you mean: sales"));
        assert!(rendered.ends_with(&format!("{}\nTotal: 3 errors found", "=".repeat(60))));
    }
}
