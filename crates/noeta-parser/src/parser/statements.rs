//! One routine per statement keyword.
//!
//! [`dispatch`] is called with the leading keyword already consumed. Most
//! statements share the `source clause*` shape and differ only in their
//! parameter contract; the handful with their own grammar (`load`, `sort`,
//! `mutate`, the two-dataset statements) have dedicated routines.

use super::{
    IResult, Input,
    clauses::{ParamBag, skip_with},
    column_list, column_name,
    condition::condition,
    cut_err, dataset_name, eat, eat_keyword, expect, expect_keyword,
    expression::expression,
    invalid, string_literal, value,
};
use crate::{
    ast::{
        Aggregation, Assignment, ColumnTarget, DateOffset, Expanding, FileFormat, FillSpec, MapSpec,
        Name, Pair, Rolling, SortKey, StatementKind, Value, WindowOffset,
    },
    error::{Diagnostic, ErrorCode},
    keyword::Keyword,
    span::{Span, Spanned},
    tokens::Token,
};

/// Functions accepted in a `compute {func: column}` block.
const AGGREGATES: &[&str] = &[
    "sum", "mean", "median", "min", "max", "count", "std", "var", "first", "last", "nunique",
];
/// Tie-breaking methods for `rank` and `window_rank`.
const RANK_METHODS: &[&str] = &["average", "min", "max", "first", "dense"];
/// Units for date differences.
const TIME_UNITS: &[&str] = &["days", "hours", "minutes", "seconds", "weeks"];
/// Components `extract_date` can pull out of a datetime column.
const DATE_PARTS: &[&str] = &[
    "year",
    "month",
    "day",
    "hour",
    "minute",
    "second",
    "dayofweek",
    "dayofyear",
    "weekofyear",
    "quarter",
];
/// Target types for `astype`.
const DTYPES: &[&str] = &[
    "int", "int64", "float", "float64", "str", "string", "bool", "boolean", "datetime", "category",
    "object", "numeric",
];
/// Type names for `select_by_type`.
const TYPE_NAMES: &[&str] = &[
    "numeric", "number", "int", "integer", "float", "string", "str", "object", "datetime", "date",
    "bool", "boolean", "category",
];

/// Whether a statement only displays or saves, and so takes no `as`.
pub(super) fn is_display(keyword: Keyword) -> bool {
    use Keyword as K;
    matches!(
        keyword,
        K::Save
            | K::ExportPlot
            | K::Compare
            | K::Describe
            | K::Summary
            | K::Info
            | K::Unique
            | K::ValueCounts
            | K::Show
            | K::Outliers
            | K::Quantile
            | K::Hypothesis
            | K::CountNa
            | K::CountDuplicates
            | K::AssertUnique
            | K::AssertNoNulls
            | K::AssertRange
            | K::Any
            | K::All
            | K::CountTrue
            | K::Boxplot
            | K::Heatmap
            | K::Pairplot
            | K::Timeseries
            | K::Pie
    )
}

/// Lift a contract diagnostic into a parser error.
fn check<T>(result: Result<T, Diagnostic>) -> IResult<T> {
    result.map_err(invalid)
}

/// `source clause*` with the given parameter contract.
fn source<'src>(
    input: &mut Input<'src>,
    keyword: Keyword,
    anchor: Span,
    allowed: &[&str],
) -> IResult<(Name, ParamBag)> {
    let source = dataset_name(input)?;
    let bag = ParamBag::read(input, keyword, anchor)?;
    check(bag.allow(allowed))?;
    Ok((source, bag))
}

/// `source column c clause*`; `column` is implied in the contract.
fn target<'src>(
    input: &mut Input<'src>,
    keyword: Keyword,
    anchor: Span,
    extra: &[&str],
) -> IResult<(ColumnTarget, ParamBag)> {
    let mut allowed = vec!["column"];
    allowed.extend_from_slice(extra);
    let (source, bag) = self::source(input, keyword, anchor, &allowed)?;
    let column = check(bag.require_column("column"))?;
    Ok((ColumnTarget::new(source, column), bag))
}

/// `source column c` with no other parameters.
fn column_only<'src>(input: &mut Input<'src>, keyword: Keyword, anchor: Span) -> IResult<ColumnTarget> {
    target(input, keyword, anchor, &[]).map(|(target, _)| target)
}

/// Exactly one column, given as `key=c` or a one-element list.
fn one_column(bag: &ParamBag, key: &str) -> Result<Option<Name>, Diagnostic> {
    let mut columns = bag.columns(key)?;
    match columns.len() {
        0 => Ok(None),
        1 => Ok(columns.pop()),
        _ => Err(Diagnostic::syntax(format!(
            "Expected a single column for '{key}', got {}",
            columns.len()
        ))
        .with_code(ErrorCode::E103)
        .with_label(
            columns[1].span().union(columns[columns.len() - 1].span()),
            "extra columns",
        )
        .with_help(format!("'{key}' takes one column name"))),
    }
}

/// Like [`one_column`], but the column must be present.
fn require_one_column(bag: &ParamBag, key: &str) -> Result<Name, Diagnostic> {
    match one_column(bag, key)? {
        Some(name) => Ok(name),
        None => bag.require_column(key),
    }
}

/// `a with b`
fn pair<'src>(input: &mut Input<'src>) -> IResult<Pair> {
    let left = dataset_name(input)?;
    expect_keyword(input, Keyword::With, "\"with\" and a second dataset")?;
    let right = dataset_name(input)?;
    Ok(Pair { left, right })
}

/// `[a, b, ...]` or `a, b, ...`
fn dataset_list<'src>(input: &mut Input<'src>) -> IResult<Vec<Name>> {
    let bracketed = eat(input, |t| matches!(t, Token::LeftBracket)).is_some();
    let mut names = vec![dataset_name(input)?];
    while eat(input, |t| matches!(t, Token::Comma)).is_some() {
        names.push(dataset_name(input)?);
    }
    if bracketed {
        expect(
            input,
            |t| matches!(t, Token::RightBracket),
            "closing bracket ]",
        )?;
    }
    Ok(names)
}

/// Parse the body of the statement introduced by `keyword`.
///
/// `anchor` is the keyword's span, where missing parameters are reported.
/// Statements fall into a few shapes:
///
/// - `keyword source clause*`: every parameter lives in the [`ParamBag`]
///   and the arm only checks the contract;
/// - `keyword source column c clause*`: column transforms, read through
///   [`target`] or [`column_only`];
/// - `keyword a with b clause*`: the two-dataset statements, read through
///   [`pair`];
/// - anything else (`load`, `save`, `filter`, `sort`, `groupby`, `mutate`)
///   has a dedicated routine below.
///
/// The result alias is not read here; the caller handles `as` for every
/// statement alike.
pub(super) fn dispatch<'src>(
    input: &mut Input<'src>,
    keyword: Keyword,
    anchor: Span,
) -> IResult<StatementKind> {
    use Keyword as K;
    use StatementKind as S;

    let kw = keyword;
    let kind = match keyword {
        // I/O: `load`, `save` and `export_plot "path" [width=..] [height=..]`
        K::Load => load(input, anchor)?,
        K::Save => save(input, anchor)?,
        K::ExportPlot => {
            let path = string_literal(input, "file path")?;
            let bag = ParamBag::read(input, kw, anchor)?;
            check(bag.allow(&["width", "height"]))?;
            S::ExportPlot {
                path,
                width: check(bag.number("width"))?,
                height: check(bag.number("height"))?,
            }
        }

        // Selection
        K::Select => {
            let source = dataset_name(input)?;
            skip_with(input);
            let _ = eat_keyword(input, K::Columns);
            let columns = column_list(input)?;
            S::Select { source, columns }
        }
        K::SelectByType => {
            let (source, bag) = self::source(input, kw, anchor, &["type"])?;
            S::SelectByType {
                source,
                dtype: check(bag.require_choice("type", TYPE_NAMES))?,
            }
        }
        K::Head | K::Tail => {
            let (source, bag) = self::source(input, kw, anchor, &["n"])?;
            let n = check(bag.positive_or("n", 5))?;
            if kw == K::Head {
                S::Head { source, n }
            } else {
                S::Tail { source, n }
            }
        }
        K::Iloc => {
            let (source, bag) = self::source(input, kw, anchor, &["rows", "columns"])?;
            S::Iloc {
                source,
                rows: check(bag.require_value("rows"))?,
                columns: bag.value("columns"),
            }
        }
        K::Loc => {
            let (source, bag) = self::source(input, kw, anchor, &["rows", "columns"])?;
            S::Loc {
                source,
                rows: check(bag.require_value("rows"))?,
                columns: check(bag.columns("columns"))?,
            }
        }
        K::Rename => {
            let (source, bag) = self::source(input, kw, anchor, &["mapping"])?;
            S::Rename {
                source,
                mapping: check(bag.require_renames("mapping"))?,
            }
        }
        K::Reorder => {
            let (source, bag) = self::source(input, kw, anchor, &["order"])?;
            S::Reorder {
                source,
                order: check(bag.require_columns("order"))?,
            }
        }

        // Filtering. Row conditions use the condition grammar; the
        // shortcuts take bounds or patterns as parameters.
        K::Filter => filter(input)?,
        K::FilterBetween => {
            let (target, bag) = target(input, kw, anchor, &["min", "max"])?;
            S::FilterBetween {
                target,
                min: check(bag.require_value("min"))?,
                max: check(bag.require_value("max"))?,
            }
        }
        K::FilterIsin => {
            let (target, bag) = target(input, kw, anchor, &["values"])?;
            S::FilterIsin {
                target,
                values: check(bag.require_list("values"))?,
            }
        }
        K::FilterContains | K::FilterStartswith | K::FilterEndswith | K::FilterRegex => {
            let (target, bag) = target(input, kw, anchor, &["pattern"])?;
            let pattern = check(bag.require_text("pattern"))?;
            match kw {
                K::FilterContains => S::FilterContains { target, pattern },
                K::FilterStartswith => S::FilterStartswith { target, pattern },
                K::FilterEndswith => S::FilterEndswith { target, pattern },
                _ => S::FilterRegex { target, pattern },
            }
        }
        K::FilterNull => S::FilterNull(column_only(input, kw, anchor)?),
        K::FilterNotnull => S::FilterNotnull(column_only(input, kw, anchor)?),
        K::FilterDuplicates | K::DropDuplicates => {
            let (source, bag) = self::source(input, kw, anchor, &["subset", "columns", "keep"])?;
            let mut subset = check(bag.columns("subset"))?;
            subset.extend(check(bag.columns("columns"))?);
            let keep = check(bag.keep("keep"))?;
            if kw == K::FilterDuplicates {
                S::FilterDuplicates {
                    source,
                    subset,
                    keep,
                }
            } else {
                S::DropDuplicates {
                    source,
                    subset,
                    keep,
                }
            }
        }
        K::Sort => sort(input)?,
        K::Sample => {
            let (source, bag) = self::source(input, kw, anchor, &["n", "random"])?;
            S::Sample {
                source,
                n: check(bag.positive_or("n", 5))?,
                random: check(bag.flag("random"))?,
            }
        }

        // Combining: `a with b` pairs, or dataset lists for the concats.
        K::Join => {
            let pair = pair(input)?;
            let bag = ParamBag::read(input, kw, anchor)?;
            check(bag.allow(&["on"]))?;
            S::Join {
                pair,
                on: check(bag.require_column("on"))?,
            }
        }
        K::Merge => {
            let pair = pair(input)?;
            let bag = ParamBag::read(input, kw, anchor)?;
            check(bag.allow(&["on", "how", "left_on", "right_on", "suffixes"]))?;
            let suffixes = match bag.get("suffixes") {
                None => None,
                Some(found) => Some(suffix_pair(found)?),
            };
            S::Merge {
                pair,
                on: check(bag.column("on"))?,
                how: check(bag.choice("how", &["inner", "left", "right", "outer", "cross"], "inner"))?,
                left_on: check(bag.column("left_on"))?,
                right_on: check(bag.column("right_on"))?,
                suffixes,
            }
        }
        K::ConcatVertical => {
            let sources = dataset_list(input)?;
            let bag = ParamBag::read(input, kw, anchor)?;
            check(bag.allow(&["ignore_index"]))?;
            S::ConcatVertical {
                sources,
                ignore_index: check(bag.bool_or("ignore_index", true))?,
            }
        }
        K::ConcatHorizontal => S::ConcatHorizontal {
            sources: dataset_list(input)?,
        },
        K::Union => S::Union(pair(input)?),
        K::Intersection => S::Intersection(pair(input)?),
        K::Difference => S::Difference(pair(input)?),
        K::Compare => S::Compare(pair(input)?),

        // Grouping, windows and cumulative transforms
        K::Groupby => groupby(input, anchor)?,
        K::FilterGroups => {
            let (source, bag) = self::source(input, kw, anchor, &["by"])?;
            let by = check(bag.require_columns("by"))?;
            expect_keyword(input, K::Where, "\"where\" and a group condition")?;
            S::FilterGroups {
                source,
                by,
                condition: expression(input)?,
            }
        }
        K::GroupTransform => {
            let (target, bag) = target(input, kw, anchor, &["by", "function"])?;
            S::GroupTransform {
                target,
                by: check(bag.require_columns("by"))?,
                function: check(bag.require_choice("function", AGGREGATES))?,
            }
        }
        K::WindowRank => {
            let (target, bag) = target(input, kw, anchor, &["by", "method", "ascending"])?;
            S::WindowRank {
                target,
                by: check(bag.columns("by"))?,
                method: check(bag.choice("method", RANK_METHODS, "min"))?,
                ascending: check(bag.bool_or("ascending", true))?,
            }
        }
        K::WindowLag | K::WindowLead => {
            let (target, bag) = target(input, kw, anchor, &["by", "periods", "fill_value"])?;
            let offset = WindowOffset {
                target,
                by: check(bag.columns("by"))?,
                periods: check(bag.positive_or("periods", 1))?,
                fill_value: bag.value("fill_value"),
            };
            if kw == K::WindowLag {
                S::WindowLag(offset)
            } else {
                S::WindowLead(offset)
            }
        }
        K::RollingMean | K::RollingSum | K::RollingStd | K::RollingMin | K::RollingMax => {
            let (rolling, _) = rolling(input, kw, anchor, &[])?;
            match kw {
                K::RollingMean => S::RollingMean(rolling),
                K::RollingSum => S::RollingSum(rolling),
                K::RollingStd => S::RollingStd(rolling),
                K::RollingMin => S::RollingMin(rolling),
                _ => S::RollingMax(rolling),
            }
        }
        K::Rolling => {
            let (rolling, bag) = rolling(input, kw, anchor, &["function"])?;
            S::RollingApply {
                rolling,
                function: check(bag.require_choice("function", AGGREGATES))?,
            }
        }
        K::ExpandingMean | K::ExpandingSum | K::ExpandingMin | K::ExpandingMax => {
            let (target, bag) = target(input, kw, anchor, &["min_periods"])?;
            let expanding = Expanding {
                target,
                min_periods: check(bag.positive_or("min_periods", 1))?,
            };
            match kw {
                K::ExpandingMean => S::ExpandingMean(expanding),
                K::ExpandingSum => S::ExpandingSum(expanding),
                K::ExpandingMin => S::ExpandingMin(expanding),
                _ => S::ExpandingMax(expanding),
            }
        }
        K::Resample => {
            let (target, bag) = target(input, kw, anchor, &["rule", "aggfunc"])?;
            S::Resample {
                target,
                rule: check(bag.require_text("rule"))?,
                aggfunc: check(bag.choice("aggfunc", AGGREGATES, "sum"))?,
            }
        }
        K::Cumsum => S::Cumsum(column_only(input, kw, anchor)?),
        K::Cummax => S::Cummax(column_only(input, kw, anchor)?),
        K::Cummin => S::Cummin(column_only(input, kw, anchor)?),
        K::Cumprod => S::Cumprod(column_only(input, kw, anchor)?),
        K::PctChange | K::Diff => {
            let (target, bag) = target(input, kw, anchor, &["periods"])?;
            let periods = check(bag.integer_or("periods", 1))?;
            if kw == K::PctChange {
                S::PctChange { target, periods }
            } else {
                S::Diff { target, periods }
            }
        }
        K::Shift => {
            let (target, bag) = target(input, kw, anchor, &["periods", "fill_value"])?;
            S::Shift {
                target,
                periods: check(bag.integer_or("periods", 1))?,
                fill_value: bag.value("fill_value"),
            }
        }

        // Reshaping. `index`, `columns` and `values` each name one column.
        K::Pivot => {
            let (source, bag) = self::source(input, kw, anchor, &["index", "columns", "values"])?;
            S::Pivot {
                source,
                index: check(require_one_column(&bag, "index"))?,
                columns: check(require_one_column(&bag, "columns"))?,
                values: check(require_one_column(&bag, "values"))?,
            }
        }
        K::PivotTable => {
            let (source, bag) = self::source(
                input,
                kw,
                anchor,
                &["index", "columns", "values", "aggfunc", "fill_value"],
            )?;
            S::PivotTable {
                source,
                index: check(require_one_column(&bag, "index"))?,
                columns: check(require_one_column(&bag, "columns"))?,
                values: check(require_one_column(&bag, "values"))?,
                aggfunc: check(bag.choice("aggfunc", AGGREGATES, "mean"))?,
                fill_value: bag.value("fill_value"),
            }
        }
        K::Melt => {
            let (source, bag) = self::source(
                input,
                kw,
                anchor,
                &["id_vars", "value_vars", "var_name", "value_name"],
            )?;
            S::Melt {
                source,
                id_vars: check(bag.require_columns("id_vars"))?,
                value_vars: check(bag.columns("value_vars"))?,
                var_name: check(bag.text_or("var_name", "variable"))?,
                value_name: check(bag.text_or("value_name", "value"))?,
            }
        }
        K::Stack => {
            let (source, bag) = self::source(input, kw, anchor, &["level"])?;
            S::Stack {
                source,
                level: check(bag.integer_or("level", -1))?,
            }
        }
        K::Unstack => {
            let (source, bag) = self::source(input, kw, anchor, &["level", "fill_value"])?;
            S::Unstack {
                source,
                level: check(bag.integer_or("level", -1))?,
                fill_value: bag.value("fill_value"),
            }
        }
        K::Transpose => {
            let (source, _) = self::source(input, kw, anchor, &[])?;
            S::Transpose { source }
        }
        K::Crosstab => {
            let (source, bag) =
                self::source(input, kw, anchor, &["rows", "columns", "values", "aggfunc"])?;
            S::Crosstab {
                source,
                rows: check(require_one_column(&bag, "rows"))?,
                columns: check(require_one_column(&bag, "columns"))?,
                values: check(one_column(&bag, "values"))?,
                aggfunc: check(bag.choice("aggfunc", AGGREGATES, "count"))?,
            }
        }
        K::OneHotEncode => S::OneHotEncode(column_only(input, kw, anchor)?),
        K::Split => {
            let (target, bag) = target(input, kw, anchor, &["delimiter"])?;
            S::Split {
                target,
                delimiter: check(bag.text_or("delimiter", " "))?,
            }
        }

        // Index
        K::SetIndex => {
            let (target, bag) = target(input, kw, anchor, &["drop"])?;
            S::SetIndex {
                target,
                drop: check(bag.bool_or("drop", true))?,
            }
        }
        K::ResetIndex => {
            let (source, bag) = self::source(input, kw, anchor, &["drop"])?;
            S::ResetIndex {
                source,
                drop: check(bag.flag("drop"))?,
            }
        }
        K::SortIndex => {
            let (source, bag) = self::source(input, kw, anchor, &["ascending"])?;
            S::SortIndex {
                source,
                ascending: check(bag.bool_or("ascending", true))?,
            }
        }
        K::Reindex => {
            let (source, bag) = self::source(input, kw, anchor, &["index"])?;
            S::Reindex {
                source,
                index: check(bag.require_list("index"))?,
            }
        }
        K::SetMultiindex => {
            let (source, bag) = self::source(input, kw, anchor, &["columns"])?;
            S::SetMultiindex {
                source,
                columns: check(bag.require_columns("columns"))?,
            }
        }

        // Apply, map, mutate. `transform <expr>` parses a full expression.
        K::Mutate => mutate(input)?,
        K::Apply => {
            let (source, bag) = self::source(input, kw, anchor, &["columns"])?;
            let columns = check(bag.columns("columns"))?;
            S::Apply {
                source,
                columns,
                transform: transform(input)?,
            }
        }
        K::ApplyRow => {
            let source = dataset_name(input)?;
            let transform = transform(input)?;
            let bag = ParamBag::read(input, kw, anchor)?;
            check(bag.allow(&["into"]))?;
            S::ApplyRow {
                source,
                transform,
                into: check(bag.text_or("into", "applied"))?,
            }
        }
        K::ApplyColumn => {
            let target = column_only(input, kw, anchor)?;
            S::ApplyColumn {
                target,
                transform: transform(input)?,
            }
        }
        K::Applymap => {
            let source = dataset_name(input)?;
            skip_with(input);
            S::Applymap {
                source,
                transform: transform(input)?,
            }
        }
        K::Map => {
            let (target, bag) = target(input, kw, anchor, &["mapping"])?;
            let spec = match check(bag.mapping("mapping"))? {
                Some(mapping) => MapSpec::Mapping(mapping),
                None => MapSpec::Transform(transform(input)?),
            };
            S::Map { target, spec }
        }
        K::MapValues => {
            let (target, bag) = target(input, kw, anchor, &["mapping"])?;
            S::MapValues {
                target,
                mapping: check(bag.require_mapping("mapping"))?,
            }
        }
        K::Assign => {
            let (target, bag) = target(input, kw, anchor, &["value"])?;
            S::Assign {
                target,
                value: check(bag.require_value("value"))?,
            }
        }

        // Math transforms replace the target column.
        K::Round => {
            let (target, bag) = target(input, kw, anchor, &["decimals"])?;
            S::Round {
                target,
                decimals: check(bag.integer_or("decimals", 0))?,
            }
        }
        K::Abs => S::Abs(column_only(input, kw, anchor)?),
        K::Sqrt => S::Sqrt(column_only(input, kw, anchor)?),
        K::Power => {
            let (target, bag) = target(input, kw, anchor, &["exponent"])?;
            S::Power {
                target,
                exponent: check(bag.number_or("exponent", 2.0))?,
            }
        }
        K::Log => {
            let (target, bag) = target(input, kw, anchor, &["base"])?;
            S::Log {
                target,
                base: check(bag.number("base"))?,
            }
        }
        K::Ceil => S::Ceil(column_only(input, kw, anchor)?),
        K::Floor => S::Floor(column_only(input, kw, anchor)?),

        // String transforms
        K::Upper => S::Upper(column_only(input, kw, anchor)?),
        K::Lower => S::Lower(column_only(input, kw, anchor)?),
        K::Strip => S::Strip(column_only(input, kw, anchor)?),
        K::Lstrip | K::Rstrip => {
            let (target, bag) = target(input, kw, anchor, &["chars"])?;
            let chars = check(bag.text("chars"))?;
            if kw == K::Lstrip {
                S::Lstrip { target, chars }
            } else {
                S::Rstrip { target, chars }
            }
        }
        K::Title => S::Title(column_only(input, kw, anchor)?),
        K::Capitalize => S::Capitalize(column_only(input, kw, anchor)?),
        K::Replace => {
            let (target, bag) = target(input, kw, anchor, &["old", "new"])?;
            S::Replace {
                target,
                old: check(bag.require_value("old"))?,
                new: check(bag.require_value("new"))?,
            }
        }

        // Datetime transforms
        K::ParseDatetime => {
            let (target, bag) = target(input, kw, anchor, &["format"])?;
            S::ParseDatetime {
                target,
                format: check(bag.text("format"))?,
            }
        }
        K::DateAdd | K::DateSubtract => {
            let (target, bag) = target(input, kw, anchor, &["value", "unit"])?;
            let offset = DateOffset {
                target,
                value: check(bag.require_integer("value"))?,
                unit: check(bag.choice("unit", TIME_UNITS, "days"))?,
            };
            if kw == K::DateAdd {
                S::DateAdd(offset)
            } else {
                S::DateSubtract(offset)
            }
        }

        // Type transforms
        K::Astype => {
            let (target, bag) = target(input, kw, anchor, &["dtype"])?;
            S::Astype {
                target,
                dtype: check(bag.require_choice("dtype", DTYPES))?,
            }
        }
        K::ToNumeric => {
            let (target, bag) = target(input, kw, anchor, &["errors"])?;
            S::ToNumeric {
                target,
                errors: check(bag.choice("errors", &["raise", "coerce", "ignore"], "raise"))?,
            }
        }
        K::LabelEncode => S::LabelEncode(column_only(input, kw, anchor)?),
        K::OrdinalEncode => {
            let (target, bag) = target(input, kw, anchor, &["order"])?;
            S::OrdinalEncode {
                target,
                order: check(bag.require_list("order"))?,
            }
        }

        // Scaling
        K::StandardScale => S::StandardScale(column_only(input, kw, anchor)?),
        K::MinmaxScale => S::MinmaxScale(column_only(input, kw, anchor)?),
        K::RobustScale => S::RobustScale(column_only(input, kw, anchor)?),
        K::MaxabsScale => S::MaxabsScale(column_only(input, kw, anchor)?),
        K::Normalize => {
            let (source, bag) = self::source(input, kw, anchor, &["columns", "method"])?;
            S::Normalize {
                source,
                columns: check(bag.require_columns("columns"))?,
                method: check(bag.choice("method", &["zscore", "minmax"], "zscore"))?,
            }
        }

        // Missing data. `fillna` takes either `value` or `method`.
        K::FillForward | K::FillBackward => {
            let (source, bag) = self::source(input, kw, anchor, &["column"])?;
            let column = check(bag.column("column"))?;
            if kw == K::FillForward {
                S::FillForward { source, column }
            } else {
                S::FillBackward { source, column }
            }
        }
        K::FillMean => S::FillMean(column_only(input, kw, anchor)?),
        K::FillMedian => S::FillMedian(column_only(input, kw, anchor)?),
        K::FillMode => S::FillMode(column_only(input, kw, anchor)?),
        K::Interpolate => {
            let (source, bag) = self::source(input, kw, anchor, &["column", "method"])?;
            S::Interpolate {
                source,
                column: check(bag.column("column"))?,
                method: check(bag.choice(
                    "method",
                    &["linear", "time", "index", "nearest", "pad", "polynomial", "spline"],
                    "linear",
                ))?,
            }
        }
        K::Dropna => {
            let (source, bag) = self::source(input, kw, anchor, &["columns"])?;
            S::Dropna {
                source,
                columns: check(bag.columns("columns"))?,
            }
        }
        K::Fillna => {
            let (source, bag) = self::source(input, kw, anchor, &["column", "value", "method"])?;
            let fill = if bag.has("value") {
                FillSpec::Value(check(bag.require_value("value"))?)
            } else if bag.has("method") {
                FillSpec::Method(check(bag.require_choice(
                    "method",
                    &["ffill", "bfill", "forward", "backward"],
                ))?)
            } else {
                return Err(invalid(
                    Diagnostic::syntax("Missing parameter 'value' for fillna")
                        .with_code(ErrorCode::E105)
                        .with_label(anchor, "'value' or 'method' is required")
                        .with_help("Add `value=<value>` or `method=\"ffill\"` to the fillna statement"),
                ));
            };
            S::Fillna {
                source,
                column: check(bag.column("column"))?,
                fill,
            }
        }

        // Derived columns
        K::Concat => {
            let (source, bag) = self::source(input, kw, anchor, &["columns", "separator"])?;
            S::Concat {
                source,
                columns: check(bag.require_columns("columns"))?,
                separator: check(bag.text_or("separator", ""))?,
            }
        }
        K::Substring => {
            let (target, bag) = target(input, kw, anchor, &["start", "end"])?;
            S::Substring {
                target,
                start: check(bag.require_integer("start"))?,
                end: check(bag.integer("end"))?,
            }
        }
        K::Length => S::Length(column_only(input, kw, anchor)?),
        K::ExtractRegex => {
            let (target, bag) = target(input, kw, anchor, &["pattern", "group"])?;
            S::ExtractRegex {
                target,
                pattern: check(bag.require_text("pattern"))?,
                group: check(bag.integer_or("group", 0))?,
            }
        }
        K::Find => {
            let (target, bag) = target(input, kw, anchor, &["substring"])?;
            S::Find {
                target,
                substring: check(bag.require_text("substring"))?,
            }
        }
        K::FormatDatetime => {
            let (target, bag) = target(input, kw, anchor, &["format"])?;
            S::FormatDatetime {
                target,
                format: check(bag.require_text("format"))?,
            }
        }
        K::Extract => {
            let (target, bag) = target(input, kw, anchor, &["part"])?;
            S::Extract {
                target,
                part: check(bag.require_choice("part", DATE_PARTS))?,
            }
        }
        K::ExtractYear => S::ExtractYear(column_only(input, kw, anchor)?),
        K::ExtractMonth => S::ExtractMonth(column_only(input, kw, anchor)?),
        K::ExtractDay => S::ExtractDay(column_only(input, kw, anchor)?),
        K::ExtractHour => S::ExtractHour(column_only(input, kw, anchor)?),
        K::ExtractMinute => S::ExtractMinute(column_only(input, kw, anchor)?),
        K::ExtractSecond => S::ExtractSecond(column_only(input, kw, anchor)?),
        K::ExtractDayofweek => S::ExtractDayofweek(column_only(input, kw, anchor)?),
        K::ExtractDayofyear => S::ExtractDayofyear(column_only(input, kw, anchor)?),
        K::ExtractWeekofyear => S::ExtractWeekofyear(column_only(input, kw, anchor)?),
        K::ExtractQuarter => S::ExtractQuarter(column_only(input, kw, anchor)?),
        K::DateDiff => {
            let (source, bag) = self::source(input, kw, anchor, &["start", "end", "unit"])?;
            S::DateDiff {
                source,
                start: check(bag.require_column("start"))?,
                end: check(bag.require_column("end"))?,
                unit: check(bag.choice("unit", TIME_UNITS, "days"))?,
            }
        }
        K::TargetEncode => {
            let (target, bag) = target(input, kw, anchor, &["target"])?;
            S::TargetEncode {
                target,
                target_column: check(bag.require_column("target"))?,
            }
        }
        K::Binning => {
            let (target, bag) = target(input, kw, anchor, &["bins"])?;
            S::Binning {
                target,
                bins: check(bag.require_positive("bins"))?,
            }
        }
        K::Qcut => {
            let (target, bag) = target(input, kw, anchor, &["q", "labels"])?;
            S::Qcut {
                target,
                q: check(bag.require_positive("q"))?,
                labels: check(bag.list("labels"))?,
            }
        }
        K::Cut => {
            let (target, bag) = target(input, kw, anchor, &["bins", "labels", "include_lowest"])?;
            S::Cut {
                target,
                bins: check(bag.require_value("bins"))?,
                labels: check(bag.list("labels"))?,
                include_lowest: check(bag.flag("include_lowest"))?,
            }
        }
        K::Rank => {
            let (target, bag) = target(input, kw, anchor, &["method", "ascending", "pct"])?;
            S::Rank {
                target,
                method: check(bag.choice("method", RANK_METHODS, "average"))?,
                ascending: check(bag.bool_or("ascending", true))?,
                pct: check(bag.flag("pct"))?,
            }
        }
        K::Isnull => S::Isnull(column_only(input, kw, anchor)?),
        K::Notnull => S::Notnull(column_only(input, kw, anchor)?),
        K::Duplicated => {
            let (source, bag) = self::source(input, kw, anchor, &["columns", "keep"])?;
            S::Duplicated {
                source,
                columns: check(bag.columns("columns"))?,
                keep: check(bag.keep("keep"))?,
            }
        }

        // Display statements print and never bind a result.
        K::Describe => {
            let (source, bag) = self::source(input, kw, anchor, &["columns"])?;
            S::Describe {
                source,
                columns: check(bag.columns("columns"))?,
            }
        }
        K::Summary => {
            let (source, _) = self::source(input, kw, anchor, &[])?;
            S::Summary { source }
        }
        K::Info => {
            let (source, _) = self::source(input, kw, anchor, &[])?;
            S::Info { source }
        }
        K::Unique => S::Unique(column_only(input, kw, anchor)?),
        K::ValueCounts => {
            let (target, bag) = target(input, kw, anchor, &["normalize", "ascending"])?;
            S::ValueCounts {
                target,
                normalize: check(bag.flag("normalize"))?,
                ascending: check(bag.flag("ascending"))?,
            }
        }
        K::Show => {
            let (source, bag) = self::source(input, kw, anchor, &["n"])?;
            S::Show {
                source,
                n: check(bag.integer("n"))?,
            }
        }
        K::Outliers => {
            let (source, bag) = self::source(input, kw, anchor, &["columns", "method"])?;
            S::Outliers {
                source,
                columns: check(bag.require_columns("columns"))?,
                method: check(bag.choice("method", &["iqr", "zscore"], "iqr"))?,
            }
        }
        K::Quantile => {
            let (target, bag) = target(input, kw, anchor, &["q"])?;
            let q = check(bag.require_number("q"))?;
            if !(0.0..=1.0).contains(&q) {
                let found = check(bag.require_value("q"))?;
                return Err(invalid(
                    Diagnostic::syntax(format!(
                        "Invalid value for 'q' in quantile: {q} is outside 0 to 1"
                    ))
                    .with_code(ErrorCode::E103)
                    .with_label(found.span(), "expected a fraction between 0 and 1"),
                ));
            }
            S::Quantile { target, q }
        }
        K::Hypothesis => {
            let left = dataset_name(input)?;
            expect_keyword(input, K::Vs, "\"vs\" and a second dataset")?;
            let right = dataset_name(input)?;
            let bag = ParamBag::read(input, kw, anchor)?;
            check(bag.allow(&["columns", "test"]))?;
            S::Hypothesis {
                pair: Pair { left, right },
                columns: check(bag.require_columns("columns"))?,
                test: check(bag.choice("test", &["ttest", "mannwhitney", "ks"], "ttest"))?,
            }
        }
        K::CountNa => {
            let (source, _) = self::source(input, kw, anchor, &[])?;
            S::CountNa { source }
        }
        K::CountDuplicates => {
            let (source, bag) = self::source(input, kw, anchor, &["columns"])?;
            S::CountDuplicates {
                source,
                columns: check(bag.columns("columns"))?,
            }
        }
        K::AssertUnique => S::AssertUnique(column_only(input, kw, anchor)?),
        K::AssertNoNulls => S::AssertNoNulls(column_only(input, kw, anchor)?),
        K::AssertRange => {
            let (target, bag) = target(input, kw, anchor, &["min", "max"])?;
            let min = check(bag.number("min"))?;
            let max = check(bag.number("max"))?;
            if min.is_none() && max.is_none() {
                return Err(invalid(
                    Diagnostic::syntax("Missing parameter 'min' for assert_range")
                        .with_code(ErrorCode::E105)
                        .with_label(anchor, "'min' or 'max' is required")
                        .with_help("Add `min=<number>`, `max=<number>` or both"),
                ));
            }
            S::AssertRange { target, min, max }
        }
        K::Any => S::Any(column_only(input, kw, anchor)?),
        K::All => S::All(column_only(input, kw, anchor)?),
        K::CountTrue => S::CountTrue(column_only(input, kw, anchor)?),

        // Visualisation
        K::Boxplot => {
            let (source, bag) = self::source(input, kw, anchor, &["columns", "column", "by"])?;
            let mut columns = check(bag.columns("columns"))?;
            if columns.is_empty() {
                columns = vec![check(bag.require_column("column"))?];
            }
            S::Boxplot {
                source,
                columns,
                by: check(one_column(&bag, "by"))?,
            }
        }
        K::Heatmap | K::Pairplot => {
            let (source, bag) = self::source(input, kw, anchor, &["columns"])?;
            let columns = check(bag.require_columns("columns"))?;
            if kw == K::Heatmap {
                S::Heatmap { source, columns }
            } else {
                S::Pairplot { source, columns }
            }
        }
        K::Timeseries => {
            let (source, bag) = self::source(input, kw, anchor, &["x", "y"])?;
            S::Timeseries {
                source,
                x: check(bag.require_column("x"))?,
                y: check(bag.require_column("y"))?,
            }
        }
        K::Pie => {
            let (source, bag) = self::source(input, kw, anchor, &["values", "labels"])?;
            S::Pie {
                source,
                values: check(bag.require_column("values"))?,
                labels: check(bag.require_column("labels"))?,
            }
        }

        // Reserved words never reach here: the caller only dispatches
        // statement keywords.
        other => {
            return Err(invalid(
                Diagnostic::syntax(format!("Unexpected token: {}", other.as_str()))
                    .with_code(ErrorCode::E102)
                    .with_label(anchor, "not a statement"),
            ));
        }
    };
    Ok(kind)
}

/// `load [format] "path" [options]` or `load sql "query" from "connection"`.
fn load<'src>(input: &mut Input<'src>, anchor: Span) -> IResult<StatementKind> {
    if eat_keyword(input, Keyword::Sql).is_some() {
        let query = string_literal(input, "SQL query string")?;
        expect_keyword(input, Keyword::From, "\"from\" and a connection string")?;
        let connection = string_literal(input, "connection string")?;
        let bag = ParamBag::read(input, Keyword::Load, anchor)?;
        return Ok(StatementKind::LoadSql {
            query,
            connection,
            options: bag.options(),
        });
    }

    let keyword_format = super::peek(input)
        .and_then(|t| match t.token {
            Token::Keyword(k) => FileFormat::from_keyword(k),
            _ => None,
        });
    if keyword_format.is_some() {
        let _ = eat(input, |_| true);
    }

    let path = string_literal(input, "file path")?;
    let format = keyword_format.unwrap_or_else(|| FileFormat::from_path(path.inner()));
    let bag = ParamBag::read(input, Keyword::Load, anchor)?;
    Ok(StatementKind::Load {
        format,
        path,
        options: bag.options(),
    })
}

/// `save source to "path" [format=..] [options]`
fn save<'src>(input: &mut Input<'src>, anchor: Span) -> IResult<StatementKind> {
    let source = dataset_name(input)?;
    expect_keyword(input, Keyword::To, "\"to\" and a file path")?;
    let path = string_literal(input, "file path")?;
    let bag = ParamBag::read(input, Keyword::Save, anchor)?;

    let format = match check(bag.text("format"))? {
        None => FileFormat::from_path(path.inner()),
        Some(name) => match FileFormat::from_name(name.inner()) {
            Some(format) => format,
            None => {
                return Err(invalid(
                    Diagnostic::syntax(format!(
                        "Invalid value '{}' for 'format' in save",
                        name.inner()
                    ))
                    .with_code(ErrorCode::E103)
                    .with_label(name.span(), "unsupported format")
                    .with_help("Valid values: csv, json, excel, parquet"),
                ));
            }
        },
    };

    let options = bag
        .options()
        .into_iter()
        .filter(|(key, _)| key.inner() != "format")
        .collect();
    Ok(StatementKind::Save {
        source,
        path,
        format,
        options,
    })
}

/// `filter source where condition` or `filter source [condition]`.
fn filter<'src>(input: &mut Input<'src>) -> IResult<StatementKind> {
    let source = dataset_name(input)?;
    if eat(input, |t| matches!(t, Token::LeftBracket)).is_some() {
        let condition = cut_err(input, condition)?;
        expect(
            input,
            |t| matches!(t, Token::RightBracket),
            "closing bracket ]",
        )?;
        return Ok(StatementKind::Filter { source, condition });
    }
    expect_keyword(input, Keyword::Where, "\"where\" and a condition")?;
    Ok(StatementKind::Filter {
        source,
        condition: condition(input)?,
    })
}

/// `sort source by c [asc|desc], ...`
fn sort<'src>(input: &mut Input<'src>) -> IResult<StatementKind> {
    let source = dataset_name(input)?;
    expect_keyword(input, Keyword::By, "\"by\" and sort columns")?;

    let mut keys = Vec::new();
    loop {
        let column = column_name(input)?;
        let descending = if eat_keyword(input, Keyword::Desc).is_some() {
            true
        } else {
            let _ = eat_keyword(input, Keyword::Asc);
            false
        };
        keys.push(SortKey { column, descending });
        if eat(input, |t| matches!(t, Token::Comma)).is_none() {
            break;
        }
    }
    Ok(StatementKind::Sort { source, keys })
}

/// `groupby source by cols [compute|agg {func: column, ...}]`
fn groupby<'src>(input: &mut Input<'src>, anchor: Span) -> IResult<StatementKind> {
    let (source, bag) = self::source(input, Keyword::Groupby, anchor, &["by"])?;
    let by = check(bag.require_columns("by"))?;

    let mut aggregations = Vec::new();
    if eat_keyword(input, Keyword::Compute).is_some() || eat_keyword(input, Keyword::Agg).is_some() {
        let block = cut_err(input, value)?;
        let Value::Map(entries) = block.inner() else {
            return Err(invalid(
                Diagnostic::syntax(format!(
                    "Expected an aggregation block {{function: column}}, got {}",
                    block.kind_name()
                ))
                .with_code(ErrorCode::E100)
                .with_label(block.span(), "expected {function: column, ...}"),
            ));
        };
        for (function, column) in entries {
            if !AGGREGATES.contains(&function.inner().as_str()) {
                return Err(invalid(
                    Diagnostic::syntax(format!(
                        "Invalid aggregation function '{}'",
                        function.inner()
                    ))
                    .with_code(ErrorCode::E103)
                    .with_label(function.span(), "unsupported aggregation")
                    .with_help(format!("Valid values: {}", AGGREGATES.join(", ")))
                    .with_optional_suggestion(crate::error::suggest::nearest(
                        function.inner(),
                        AGGREGATES.iter().copied(),
                    )),
                ));
            }
            let column = match column.inner() {
                Value::Ident(name) | Value::String(name) => {
                    Spanned::new(name.clone(), column.span())
                }
                other => {
                    return Err(invalid(
                        Diagnostic::syntax(format!(
                            "Expected a column name for '{}', got {}",
                            function.inner(),
                            other.kind_name()
                        ))
                        .with_code(ErrorCode::E103)
                        .with_label(column.span(), "expected a column name"),
                    ));
                }
            };
            aggregations.push(Aggregation {
                function: function.clone(),
                column,
            });
        }
    }

    Ok(StatementKind::Groupby {
        source,
        by,
        aggregations,
    })
}

/// `mutate source [with] name = expr, ...`
fn mutate<'src>(input: &mut Input<'src>) -> IResult<StatementKind> {
    let source = dataset_name(input)?;
    skip_with(input);

    let mut assignments = Vec::new();
    loop {
        let column = column_name(input)?;
        expect(input, |t| matches!(t, Token::Equals), "= and an expression")?;
        let expr = expression(input)?;
        assignments.push(Assignment { column, expr });
        if eat(input, |t| matches!(t, Token::Comma)).is_none() {
            break;
        }
    }
    Ok(StatementKind::Mutate {
        source,
        assignments,
    })
}

/// `transform <expression>`
fn transform<'src>(input: &mut Input<'src>) -> IResult<crate::ast::Expr> {
    expect_keyword(input, Keyword::Transform, "\"transform\" and an expression")?;
    expression(input)
}

/// `column c window=n [min_periods=m]` plus any extra parameters.
fn rolling<'src>(
    input: &mut Input<'src>,
    keyword: Keyword,
    anchor: Span,
    extra: &[&str],
) -> IResult<(Rolling, ParamBag)> {
    let mut allowed = vec!["window", "min_periods"];
    allowed.extend_from_slice(extra);
    let (target, bag) = target(input, keyword, anchor, &allowed)?;
    let rolling = Rolling {
        target,
        window: check(bag.require_positive("window"))?,
        min_periods: check(bag.positive_or("min_periods", 1))?,
    };
    Ok((rolling, bag))
}

/// `suffixes=["_l", "_r"]`
fn suffix_pair(found: &Spanned<Value>) -> IResult<(String, String)> {
    if let Some([left, right]) = found.as_list() {
        if let (Some(left), Some(right)) = (left.as_text(), right.as_text()) {
            return Ok((left.to_string(), right.to_string()));
        }
    }
    Err(invalid(
        Diagnostic::syntax(format!(
            "Invalid value for 'suffixes' in merge: expected two strings, got {}",
            found.kind_name()
        ))
        .with_code(ErrorCode::E103)
        .with_label(found.span(), "expected [\"_left\", \"_right\"]"),
    ))
}
