use noeta_core::SymbolTable;
use noeta_parser::{
    Analyzer,
    ast::{ConditionKind, FileFormat, Program, StatementKind},
    error::{Category, ErrorCode},
    keyword::Keyword,
    parse, significant_tokens, tokenize,
};

fn parse_source(source: &str) -> Program {
    let tokens = significant_tokens(tokenize(source).expect("Failed to tokenize"));
    parse(&tokens).expect("Failed to parse")
}

#[test]
fn test_pipeline_program() {
    let source = r#"
        # quarterly revenue
        load csv "sales.csv" sep=";" as sales
        filter sales where price > 10 and region in ["north", "south"] as picked
        sort picked by price desc, region as ordered
        groupby ordered by region compute {sum: price, count: order_id} as totals
    "#;

    let program = parse_source(source);
    assert_eq!(program.len(), 4);

    let load = &program.statements[0];
    assert_eq!(load.result_name(), Some("sales"));
    assert_eq!(load.position.line, 3);
    match &load.kind {
        StatementKind::Load {
            format,
            path,
            options,
        } => {
            assert_eq!(*format, FileFormat::Csv);
            assert_eq!(path.inner(), "sales.csv");
            assert_eq!(options.len(), 1);
            assert_eq!(options[0].0.inner(), "sep");
        }
        other => panic!("Expected Load, got {other:?}"),
    }

    match &program.statements[1].kind {
        StatementKind::Filter { source, condition } => {
            assert_eq!(source.inner(), "sales");
            assert!(matches!(condition.kind, ConditionKind::And(_, _)));
        }
        other => panic!("Expected Filter, got {other:?}"),
    }

    match &program.statements[2].kind {
        StatementKind::Sort { keys, .. } => {
            assert_eq!(keys.len(), 2);
            assert!(keys[0].descending);
            assert!(!keys[1].descending);
        }
        other => panic!("Expected Sort, got {other:?}"),
    }

    let groupby = &program.statements[3];
    assert_eq!(groupby.keyword(), Keyword::Groupby);
    match &groupby.kind {
        StatementKind::Groupby {
            by, aggregations, ..
        } => {
            assert_eq!(by.len(), 1);
            let functions: Vec<_> = aggregations
                .iter()
                .map(|a| a.function.inner().as_str())
                .collect();
            assert_eq!(functions, vec!["sum", "count"]);
        }
        other => panic!("Expected Groupby, got {other:?}"),
    }
}

#[test]
fn test_analysis_tracks_aliases() {
    let source = "load \"a.csv\" as a\n\
                  mutate a total = price * qty as b\n\
                  join a with b on id as c\n\
                  describe c";

    let program = parse_source(source);
    let mut table = SymbolTable::new();
    let diagnostics = Analyzer::new(&mut table)
        .with_source(source)
        .analyze(&program);

    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    for name in ["a", "b", "c"] {
        assert!(table.exists(name), "{name} should be defined");
    }
}

#[test]
fn test_analysis_collects_every_error() {
    let source = "load \"a.csv\" as a\n\
                  head missing n=2\n\
                  join a with other on id as c\n\
                  describe c";

    let program = parse_source(source);
    let mut table = SymbolTable::new();
    let diagnostics = Analyzer::new(&mut table)
        .with_source(source)
        .analyze(&program);

    // The failed join never defines `c`, so `describe c` is reported too.
    assert_eq!(diagnostics.len(), 3);
    assert!(diagnostics.iter().all(|d| d.category() == Category::Semantic));
    assert!(diagnostics.iter().all(|d| d.code() == Some(ErrorCode::E200)));
    assert!(!table.exists("c"));
    assert_eq!(
        diagnostics.iter().filter_map(|d| d.context()).map(|c| c.position().line).collect::<Vec<_>>(),
        vec![2, 3, 4]
    );
}

#[test]
fn test_display_statement_rejects_alias() {
    let tokens = significant_tokens(tokenize("describe sales as d").expect("Failed to tokenize"));
    let err = parse(&tokens).expect_err("describe cannot bind a result");

    assert_eq!(err.category(), Category::Syntax);
    assert_eq!(err.code(), Some(ErrorCode::E106));
}

#[test]
fn test_missing_required_parameter() {
    let tokens = significant_tokens(
        tokenize("rolling_mean s column price as r").expect("Failed to tokenize"),
    );
    let err = parse(&tokens).expect_err("window is required");

    assert_eq!(err.code(), Some(ErrorCode::E105));
    assert!(err.message().contains("window"));
}
