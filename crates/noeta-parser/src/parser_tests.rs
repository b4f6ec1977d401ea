//! Unit tests for the statement parser
//!
//! These tests drive the full lexer and parser over Noeta source and check
//! the resulting statements and syntax diagnostics.

use crate::{
    ast::{FileFormat, FillSpec, MapSpec, Program, Statement, StatementKind, Value},
    error::{Category, Diagnostic, ErrorCode},
    lexer, parser,
    span::Span,
};

/// Helper function to lex and parse a source string
fn parse_source(source: &str) -> Result<Program, Diagnostic> {
    let tokens = lexer::tokenize(source)?;
    parser::parse(&lexer::significant_tokens(tokens))
}

/// Helper function to parse a source string and assert success
fn assert_parses(source: &str) -> Program {
    match parse_source(source) {
        Ok(program) => program,
        Err(e) => panic!("Expected parsing to succeed, but got error: {e}"),
    }
}

/// Helper function to parse a single statement
fn parse_one(source: &str) -> Statement {
    let program = assert_parses(source);
    assert_eq!(program.len(), 1, "Expected exactly one statement");
    program.statements.into_iter().next().unwrap()
}

/// Helper function to parse a source string and assert a syntax error
fn assert_syntax_error(source: &str, code: ErrorCode) -> Diagnostic {
    match parse_source(source) {
        Ok(_) => panic!("Expected parsing to fail, but it succeeded"),
        Err(diagnostic) => {
            assert_eq!(diagnostic.category(), Category::Syntax);
            assert_eq!(
                diagnostic.code(),
                Some(code),
                "unexpected diagnostic: {diagnostic}"
            );
            diagnostic
        }
    }
}

#[cfg(test)]
mod program_tests {
    use super::*;

    #[test]
    fn test_empty_program() {
        assert!(assert_parses("").is_empty());
        assert!(assert_parses("\n  # only a comment\n").is_empty());
    }

    #[test]
    fn test_statements_on_separate_lines() {
        let program = assert_parses(
            r#"
            load "sales.csv" as sales
            filter sales where price > 100 as expensive
            describe expensive
            "#,
        );
        assert_eq!(program.len(), 3);
        let lines: Vec<usize> = program.statements.iter().map(|s| s.position.line).collect();
        assert_eq!(lines, vec![2, 3, 4]);
    }

    #[test]
    fn test_statements_without_line_breaks() {
        let program = assert_parses("load \"a.csv\" as a head a n=3 as b describe b");
        assert_eq!(program.len(), 3);
        assert_eq!(program.statements[1].result_name(), Some("b"));
    }

    #[test]
    fn test_position_is_leading_keyword() {
        let statement = parse_one("\n    head sales as top");
        assert_eq!(statement.position.line, 2);
        assert_eq!(statement.position.column, 5);
        assert_eq!(statement.span, Span::new(5..22));
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let statement = parse_one("LOAD Csv \"data.txt\" AS data");
        assert!(matches!(
            statement.kind,
            StatementKind::Load {
                format: FileFormat::Csv,
                ..
            }
        ));
    }
}

#[cfg(test)]
mod io_tests {
    use super::*;

    #[test]
    fn test_load_format_from_extension() {
        let statement = parse_one("load \"records.json\" as records");
        match statement.kind {
            StatementKind::Load { format, path, .. } => {
                assert_eq!(format, FileFormat::Json);
                assert_eq!(path.inner(), "records.json");
            }
            other => panic!("expected Load, got {other:?}"),
        }
    }

    #[test]
    fn test_load_options_pass_through() {
        let statement = parse_one("load csv \"data.csv\" sep=\";\" header=0 as data");
        match statement.kind {
            StatementKind::Load { options, .. } => {
                let keys: Vec<&str> = options.iter().map(|(k, _)| k.inner().as_str()).collect();
                assert_eq!(keys, vec!["sep", "header"]);
            }
            other => panic!("expected Load, got {other:?}"),
        }
    }

    #[test]
    fn test_load_sql() {
        let statement =
            parse_one("load sql \"SELECT * FROM orders\" from \"sqlite:///shop.db\" as orders");
        match statement.kind {
            StatementKind::LoadSql {
                query, connection, ..
            } => {
                assert_eq!(query.inner(), "SELECT * FROM orders");
                assert_eq!(connection.inner(), "sqlite:///shop.db");
            }
            other => panic!("expected LoadSql, got {other:?}"),
        }
    }

    #[test]
    fn test_save_format() {
        let statement = parse_one("save sales to \"out.parquet\"");
        assert!(matches!(
            statement.kind,
            StatementKind::Save {
                format: FileFormat::Parquet,
                ..
            }
        ));

        let statement = parse_one("save sales to \"out.dat\" format=json index=false");
        match statement.kind {
            StatementKind::Save {
                format, options, ..
            } => {
                assert_eq!(format, FileFormat::Json);
                assert_eq!(options.len(), 1);
            }
            other => panic!("expected Save, got {other:?}"),
        }
    }

    #[test]
    fn test_save_unknown_format() {
        let d = assert_syntax_error("save sales to \"out\" format=\"xml\"", ErrorCode::E103);
        assert_eq!(d.help(), Some("Valid values: csv, json, excel, parquet"));
    }
}

#[cfg(test)]
mod selection_tests {
    use super::*;

    fn selected(source: &str) -> Vec<String> {
        match parse_one(source).kind {
            StatementKind::Select { columns, .. } => {
                columns.into_iter().map(|c| c.into_inner()).collect()
            }
            other => panic!("expected Select, got {other:?}"),
        }
    }

    #[test]
    fn test_select_column_list_forms() {
        let expected = vec!["a".to_string(), "b c".to_string()];
        assert_eq!(selected("select s {a, \"b c\"} as r"), expected);
        assert_eq!(selected("select s with [a, \"b c\"] as r"), expected);
        assert_eq!(selected("select s columns a, \"b c\" as r"), expected);
        assert_eq!(selected("select s a, \"b c\" as r"), expected);
    }

    #[test]
    fn test_keyword_column_names() {
        assert_eq!(selected("select s columns length, json as r"), vec!["length", "json"]);
    }

    #[test]
    fn test_head_default() {
        assert!(matches!(
            parse_one("head s as h").kind,
            StatementKind::Head { n: 5, .. }
        ));
        assert!(matches!(
            parse_one("tail s with n=10 as t").kind,
            StatementKind::Tail { n: 10, .. }
        ));
    }

    #[test]
    fn test_rename_mapping() {
        match parse_one("rename s mapping={old: new, \"a b\": c} as r").kind {
            StatementKind::Rename { mapping, .. } => {
                let pairs: Vec<(&str, &str)> = mapping
                    .iter()
                    .map(|(o, n)| (o.inner().as_str(), n.inner().as_str()))
                    .collect();
                assert_eq!(pairs, vec![("old", "new"), ("a b", "c")]);
            }
            other => panic!("expected Rename, got {other:?}"),
        }
    }
}

#[cfg(test)]
mod filtering_tests {
    use super::*;

    #[test]
    fn test_filter_where_and_bracket_forms() {
        let a = parse_one("filter s where price > 10 and region == \"east\" as r");
        let b = parse_one("filter s [price > 10 and region == \"east\"] as r");
        assert_eq!(a, b);
    }

    #[test]
    fn test_filter_between() {
        match parse_one("filter_between s column price min=1 max=9.5 as r").kind {
            StatementKind::FilterBetween { target, min, max } => {
                assert_eq!(target.column(), "price");
                assert_eq!(min.inner(), &Value::Integer(1));
                assert_eq!(max.inner(), &Value::Float(9.5));
            }
            other => panic!("expected FilterBetween, got {other:?}"),
        }
    }

    #[test]
    fn test_sort_keys() {
        match parse_one("sort s by price desc, region as r").kind {
            StatementKind::Sort { keys, .. } => {
                let keys: Vec<(&str, bool)> = keys
                    .iter()
                    .map(|k| (k.column.inner().as_str(), k.descending))
                    .collect();
                assert_eq!(keys, vec![("price", true), ("region", false)]);
            }
            other => panic!("expected Sort, got {other:?}"),
        }
    }

    #[test]
    fn test_sample_flag() {
        assert!(matches!(
            parse_one("sample s n=10 random as r").kind,
            StatementKind::Sample {
                n: 10,
                random: true,
                ..
            }
        ));
    }

    #[test]
    fn test_keyword_flag() {
        // `normalize` is also a statement keyword.
        let program = assert_parses(
            "value_counts s column c normalize\nvalue_counts s column c normalize ascending as v\nnormalize s columns c as n",
        );
        assert_eq!(program.len(), 3);
        assert!(matches!(
            program.statements[0].kind,
            StatementKind::ValueCounts {
                normalize: true,
                ascending: false,
                ..
            }
        ));
        assert!(matches!(
            program.statements[1].kind,
            StatementKind::ValueCounts {
                normalize: true,
                ascending: true,
                ..
            }
        ));
        assert!(matches!(program.statements[2].kind, StatementKind::Normalize { .. }));
    }

    #[test]
    fn test_keyword_flag_before_next_statement() {
        let program = assert_parses("describe s\nnormalize s columns c as n");
        assert_eq!(program.len(), 2);
        assert!(matches!(program.statements[1].kind, StatementKind::Normalize { .. }));
    }

    #[test]
    fn test_drop_duplicates_keep() {
        match parse_one("drop_duplicates s subset=[a, b] keep=last as r").kind {
            StatementKind::DropDuplicates { subset, keep, .. } => {
                assert_eq!(subset.len(), 2);
                assert_eq!(keep, crate::ast::Keep::Last);
            }
            other => panic!("expected DropDuplicates, got {other:?}"),
        }
    }
}

#[cfg(test)]
mod combining_tests {
    use super::*;

    #[test]
    fn test_join() {
        let statement = parse_one("join orders with customers on customer_id as j");
        let sources: Vec<&str> = statement.sources().iter().map(|s| s.inner().as_str()).collect();
        assert_eq!(sources, vec!["orders", "customers"]);
        assert_eq!(statement.columns().len(), 2);
    }

    #[test]
    fn test_merge_parameters() {
        match parse_one("merge a with b left_on=id right_on=key how=left suffixes=[\"_a\", \"_b\"] as m").kind {
            StatementKind::Merge {
                on,
                how,
                left_on,
                right_on,
                suffixes,
                ..
            } => {
                assert!(on.is_none());
                assert_eq!(how.inner(), "left");
                assert_eq!(left_on.map(|n| n.into_inner()), Some("id".to_string()));
                assert_eq!(right_on.map(|n| n.into_inner()), Some("key".to_string()));
                assert_eq!(suffixes, Some(("_a".to_string(), "_b".to_string())));
            }
            other => panic!("expected Merge, got {other:?}"),
        }
    }

    #[test]
    fn test_merge_invalid_how() {
        let d = assert_syntax_error("merge a with b how=sideways", ErrorCode::E103);
        assert!(d.message().contains("sideways"));
    }

    #[test]
    fn test_invalid_choice_suggests_value() {
        let d = assert_syntax_error("merge a with b on id how=lefft as m", ErrorCode::E103);
        assert_eq!(d.suggestion(), Some("left"));
    }

    #[test]
    fn test_concat_lists() {
        match parse_one("concat_vertical [a, b, c] as all_rows").kind {
            StatementKind::ConcatVertical {
                sources,
                ignore_index,
            } => {
                assert_eq!(sources.len(), 3);
                assert!(ignore_index);
            }
            other => panic!("expected ConcatVertical, got {other:?}"),
        }
        match parse_one("concat_horizontal a, b as wide").kind {
            StatementKind::ConcatHorizontal { sources } => assert_eq!(sources.len(), 2),
            other => panic!("expected ConcatHorizontal, got {other:?}"),
        }
    }
}

#[cfg(test)]
mod grouping_tests {
    use super::*;

    #[test]
    fn test_groupby_compute_block() {
        match parse_one("groupby sales by region, year compute {sum: price, mean: quantity} as g").kind {
            StatementKind::Groupby {
                by, aggregations, ..
            } => {
                assert_eq!(by.len(), 2);
                let aggs: Vec<(&str, &str)> = aggregations
                    .iter()
                    .map(|a| (a.function.inner().as_str(), a.column.inner().as_str()))
                    .collect();
                assert_eq!(aggs, vec![("sum", "price"), ("mean", "quantity")]);
            }
            other => panic!("expected Groupby, got {other:?}"),
        }
    }

    #[test]
    fn test_groupby_unknown_aggregate() {
        let d = assert_syntax_error("groupby s by a agg {summ: price} as g", ErrorCode::E103);
        assert_eq!(d.suggestion(), Some("sum"));
    }

    #[test]
    fn test_filter_groups() {
        match parse_one("filter_groups s by region where count > 2 as f").kind {
            StatementKind::FilterGroups { condition, .. } => {
                assert_eq!(condition.to_string(), "(count > 2)");
            }
            other => panic!("expected FilterGroups, got {other:?}"),
        }
    }

    #[test]
    fn test_rolling_defaults() {
        match parse_one("rolling_mean s column price window=3 as r").kind {
            StatementKind::RollingMean(rolling) => {
                assert_eq!(rolling.window, 3);
                assert_eq!(rolling.min_periods, 1);
            }
            other => panic!("expected RollingMean, got {other:?}"),
        }
    }

    #[test]
    fn test_rolling_window_must_be_positive() {
        assert_syntax_error("rolling_sum s column price window=0 as r", ErrorCode::E103);
    }
}

#[cfg(test)]
mod apply_tests {
    use super::*;

    #[test]
    fn test_mutate_assignments() {
        match parse_one("mutate s with total = price * quantity, tax = total * 0.2 as m").kind {
            StatementKind::Mutate { assignments, .. } => {
                let rendered: Vec<String> = assignments
                    .iter()
                    .map(|a| format!("{} = {}", a.column.inner(), a.expr))
                    .collect();
                assert_eq!(
                    rendered,
                    vec!["total = (price * quantity)", "tax = (total * 0.2)"]
                );
            }
            other => panic!("expected Mutate, got {other:?}"),
        }
    }

    #[test]
    fn test_apply_row_into() {
        match parse_one("apply_row s transform price * quantity into=\"revenue\" as r").kind {
            StatementKind::ApplyRow {
                transform, into, ..
            } => {
                assert_eq!(transform.to_string(), "(price * quantity)");
                assert_eq!(into.inner(), "revenue");
            }
            other => panic!("expected ApplyRow, got {other:?}"),
        }
    }

    #[test]
    fn test_map_forms() {
        assert!(matches!(
            parse_one("map s column grade mapping={a: 4, b: 3} as m").kind,
            StatementKind::Map {
                spec: MapSpec::Mapping(_),
                ..
            }
        ));
        assert!(matches!(
            parse_one("map s column price transform value * 2 as m").kind,
            StatementKind::Map {
                spec: MapSpec::Transform(_),
                ..
            }
        ));
    }

    #[test]
    fn test_fillna_needs_value_or_method() {
        assert!(matches!(
            parse_one("fillna s column price value=0 as f").kind,
            StatementKind::Fillna {
                fill: FillSpec::Value(_),
                ..
            }
        ));
        let d = assert_syntax_error("fillna s column price as f", ErrorCode::E105);
        assert!(d.message().contains("'value'"));
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_unknown_statement_suggests_keyword() {
        let d = assert_syntax_error("selct sales with price", ErrorCode::E102);
        assert_eq!(d.message(), "Unexpected token: selct");
        assert_eq!(d.suggestion(), Some("select"));
    }

    #[test]
    fn test_unknown_statement_without_suggestion() {
        let d = assert_syntax_error("42", ErrorCode::E102);
        assert_eq!(d.suggestion(), None);
    }

    #[test]
    fn test_mismatch_names_statement() {
        let d = assert_syntax_error("filter s price > 1", ErrorCode::E100);
        assert_eq!(
            d.message(),
            "Expected \"where\" and a condition, got dataset or column name in filter"
        );
        assert_eq!(d.primary_span(), Some(Span::new(9..14)));
    }

    #[test]
    fn test_unexpected_end_of_file() {
        let d = assert_syntax_error("join a with", ErrorCode::E101);
        assert_eq!(
            d.message(),
            "Unexpected end of file in join. Expected dataset name"
        );
        assert_eq!(
            d.help(),
            Some("The file ended before the join statement was complete")
        );
        assert_eq!(d.primary_span(), Some(Span::new(11..11)));
    }

    #[test]
    fn test_missing_parameter() {
        let d = assert_syntax_error("filter_between s column price min=1 as r", ErrorCode::E105);
        assert_eq!(d.message(), "Missing parameter 'max' for filter_between");
        assert_eq!(d.primary_span(), Some(Span::new(0..14)));
    }

    #[test]
    fn test_unknown_parameter() {
        let d = assert_syntax_error("head s m=5 as h", ErrorCode::E104);
        assert_eq!(d.suggestion(), Some("n"));
    }

    #[test]
    fn test_wrongly_typed_parameter() {
        assert_syntax_error("head s n=\"five\" as h", ErrorCode::E103);
    }

    #[test]
    fn test_display_statement_rejects_alias() {
        let d = assert_syntax_error("describe s as d", ErrorCode::E106);
        assert_eq!(d.help(), Some("Remove `as d` from the describe statement"));
        assert_eq!(d.primary_span(), Some(Span::new(14..15)));

        let keyword = d.labels().iter().find(|label| !label.is_primary());
        assert_eq!(keyword.map(|label| label.span()), Some(Span::new(0..8)));
    }

    #[test]
    fn test_incomplete_construct_is_marked() {
        let d = assert_syntax_error("select s columns [a, b", ErrorCode::E101);
        assert_eq!(d.primary_span(), Some(Span::new(22..22)));

        let secondary: Vec<_> = d.labels().iter().filter(|label| !label.is_primary()).collect();
        assert_eq!(secondary.len(), 1);
        assert_eq!(secondary[0].span(), Span::new(18..22));
        assert_eq!(secondary[0].message(), "incomplete part of select");
    }

    #[test]
    fn test_first_error_aborts() {
        // The second statement is also wrong but is never reached.
        let d = assert_syntax_error("head s n=0\nselct s", ErrorCode::E103);
        assert!(d.message().contains("'n'"));
    }
}

#[cfg(test)]
mod property_tests {
    use proptest::prelude::*;

    use super::*;

    const STATEMENTS: &[&str] = &[
        "load \"data.csv\" as d",
        "head d n=3 as h",
        "filter d where price between 1 and 5 as f",
        "describe d",
        "mutate d with x = a + b * 2 as m",
        "groupby d by region compute {sum: price} as g",
        "sort d by price desc as s",
    ];

    proptest! {
        /// A single-line statement parses to exactly one statement located
        /// at its leading keyword.
        #[test]
        fn check_single_statement_position(
            index in 0..STATEMENTS.len(),
            indent in 0usize..8,
            blank_lines in 0usize..3,
        ) {
            let source = format!("{}{}{}", "\n".repeat(blank_lines), " ".repeat(indent), STATEMENTS[index]);
            let program = parse_source(&source).expect("statement should parse");
            prop_assert_eq!(program.len(), 1);
            let statement = &program.statements[0];
            prop_assert_eq!(statement.position.line, blank_lines + 1);
            prop_assert_eq!(statement.position.column, indent + 1);
        }

        /// Parsing is deterministic.
        #[test]
        fn check_parse_is_deterministic(indices in prop::collection::vec(0..STATEMENTS.len(), 1..6)) {
            let source: Vec<&str> = indices.iter().map(|&i| STATEMENTS[i]).collect();
            let source = source.join("\n");
            let first = parse_source(&source).expect("program should parse");
            let second = parse_source(&source).expect("program should parse");
            prop_assert_eq!(first.len(), indices.len());
            prop_assert_eq!(first, second);
        }
    }
}
