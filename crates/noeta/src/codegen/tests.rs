use noeta_parser::{parse, significant_tokens, tokenize};

use super::*;

fn generate(source: &str) -> String {
    let tokens = significant_tokens(tokenize(source).expect("Failed to tokenize"));
    let program = parse(&tokens).expect("Failed to parse");
    CodeGenerator::new(&CodegenConfig::default()).generate(&program)
}

fn imports(code: &str) -> Vec<&str> {
    code.lines()
        .take_while(|line| line.starts_with("import ") || line.starts_with("from "))
        .collect()
}

#[test]
fn test_load_with_alias_reports_shape() {
    let code = generate("load \"sales.csv\" as sales");
    assert_eq!(imports(&code), vec![PANDAS]);
    assert!(code.contains("sales = pd.read_csv('sales.csv')\n"));
    assert!(code.contains(
        "print(f'Loaded sales: {len(sales)} rows, {len(sales.columns)} columns')"
    ));
    assert!(!code.contains("plt."));
}

#[test]
fn test_load_options_pass_through() {
    let code = generate("load \"data.csv\" with sep=\";\" as data");
    assert!(code.contains("data = pd.read_csv('data.csv', sep=';')"));

    let code = generate("load json \"events.json\" as events");
    assert!(code.contains("events = pd.read_json('events.json')"));
}

#[test]
fn test_filter_and_sort() {
    let code = generate(
        "load \"sales.csv\" as sales\n\
         filter sales where price > 100 as expensive\n\
         sort expensive by price desc, region as ranked",
    );
    assert!(code.contains("expensive = sales[sales['price'] > 100].copy()"));
    assert!(code.contains(
        "ranked = expensive.sort_values(by=['price', 'region'], ascending=[False, True])"
    ));
}

#[test]
fn test_display_without_alias() {
    let code = generate("load \"sales.csv\" as sales\nhead sales n=3");
    assert!(code.contains("print('\\nFirst Rows:')\nprint(sales.head(3))"));
}

#[test]
fn test_groupby_named_aggregations() {
    let code = generate(
        "load \"sales.csv\" as sales\n\
         groupby sales by region compute {sum: amount, mean: price} as totals",
    );
    assert!(code.contains(
        "totals = sales.groupby(['region']).agg(**{'amount_sum': ('amount', 'sum'), \
         'price_mean': ('price', 'mean')}).reset_index()"
    ));
}

#[test]
fn test_quoted_column_names_stay_valid_python() {
    let code = generate(
        "load \"people.csv\" as d\n\
         upper d column \"o'brien\" as r\n\
         unique d column \"it's\"\n\
         groupby d by \"{team}\" as g",
    );
    assert!(code.contains("r = d.assign(**{'o\\'brien': d['o\\'brien'].str.upper()})"));
    assert!(code.contains("print('Uppercased o\\'brien in r')"));
    assert!(code.contains("print('\\nUnique values in it\\'s:')"));
    assert!(code.contains("print(f'Grouped d by {{team}}: {len(g)} groups')"));
}

#[test]
fn test_groupby_without_aggregations_counts() {
    let code = generate("load \"sales.csv\" as sales\ngroupby sales by region as counts");
    assert!(code.contains("counts = sales.groupby(['region']).size().reset_index(name='count')"));
}

#[test]
fn test_mutate_uses_numpy_only_when_needed() {
    let code = generate("load \"s.csv\" as s\nmutate s with total = price * qty as t");
    assert!(code.contains("t = s.assign(**{'total': lambda df: df['price'] * df['qty']})"));
    assert!(!code.contains("import numpy"));

    let code = generate(
        "load \"s.csv\" as s\nmutate s with tier = \"hi\" where price > 10 else \"lo\" as t",
    );
    assert!(imports(&code).contains(&NUMPY));
}

#[test]
fn test_derived_columns_follow_suffixes() {
    let code = generate("load \"s.csv\" as s\nextract_year s column created as y");
    assert!(code.contains(
        "y = s.assign(**{'created_year': pd.to_datetime(s['created']).dt.year})"
    ));
    assert!(code.contains("print('Added created_year in y')"));

    let code = generate("load \"s.csv\" as s\ncumsum s column amount as c");
    assert!(code.contains("c = s.assign(**{'amount_cumsum': s['amount'].cumsum()})"));
}

#[test]
fn test_column_transform_replaces_in_place() {
    let code = generate("load \"s.csv\" as s\nupper s column name as u");
    assert!(code.contains("u = s.assign(**{'name': s['name'].str.upper()})"));
    assert!(code.contains("print('Uppercased name in u')"));
}

#[test]
fn test_plot_adds_preamble_and_display_block() {
    let code = generate("load \"s.csv\" as s\nboxplot s columns price");
    assert_eq!(
        imports(&code),
        vec![PYPLOT, PANDAS, SEABORN],
        "imports are sorted"
    );
    assert!(code.contains("plt.style.use('seaborn-v0_8-darkgrid')"));
    assert!(code.contains("sns.set_palette('husl')"));
    assert!(code.contains("plt.rcParams['figure.figsize'] = (10.0, 6.0)"));
    assert!(code.ends_with(
        "plt.tight_layout()\ntry:\n    get_ipython()\nexcept NameError:\n    plt.show()\n"
    ));
}

#[test]
fn test_plot_settings_come_from_config() {
    let tokens = significant_tokens(
        tokenize("load \"s.csv\" as s\nheatmap s columns a, b").expect("Failed to tokenize"),
    );
    let program = parse(&tokens).expect("Failed to parse");
    let config = CodegenConfig::new("ggplot", "deep", 8.0, 4.5);
    let code = CodeGenerator::new(&config).generate(&program);

    assert!(code.contains("plt.style.use('ggplot')"));
    assert!(code.contains("sns.set_palette('deep')"));
    assert!(code.contains("plt.rcParams['figure.figsize'] = (8.0, 4.5)"));
    assert!(code.contains("sns.heatmap(s[['a', 'b']].corr(), annot=True, cmap='coolwarm', center=0)"));
}

#[test]
fn test_hypothesis_imports_scipy() {
    let code = generate(
        "load \"a.csv\" as a\nload \"b.csv\" as b\nhypothesis a vs b columns score test=ttest",
    );
    assert!(imports(&code).contains(&STATS));
    assert!(code.contains("stats.ttest_ind(a['score'].dropna(), b['score'].dropna())"));
}

#[test]
fn test_save_defaults() {
    let code = generate("load \"s.csv\" as s\nsave s to \"out.csv\"");
    assert!(code.contains("s.to_csv('out.csv', index=False)"));
    assert!(code.contains("print('Saved s to', 'out.csv')"));
}

#[test]
fn test_generation_is_deterministic() {
    let source = "load \"s.csv\" as s\n\
                  select s columns a, b as t\n\
                  describe t\n\
                  pie t values=a labels=b";
    assert_eq!(generate(source), generate(source));
}

#[test]
fn test_empty_program() {
    assert_eq!(generate(""), format!("{PANDAS}\n"));
}
