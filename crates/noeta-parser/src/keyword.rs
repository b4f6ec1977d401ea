//! The keyword table.
//!
//! Keywords are matched case-insensitively. Statement keywords start a
//! statement and may also name columns; clause keywords are reserved.

macro_rules! keywords {
    (
        statements { $($stmt:ident => $stmt_text:literal,)* }
        reserved { $($kw:ident => $kw_text:literal,)* }
    ) => {
        /// A reserved or statement-leading word.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Keyword {
            $($stmt,)*
            $($kw,)*
        }

        impl Keyword {
            /// Every keyword that can start a statement, in table order.
            pub const STATEMENTS: &'static [Keyword] = &[$(Keyword::$stmt,)*];

            fn lookup(word: &str) -> Option<Self> {
                match word {
                    $($stmt_text => Some(Keyword::$stmt),)*
                    $($kw_text => Some(Keyword::$kw),)*
                    _ => None,
                }
            }

            /// The canonical lowercase spelling.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Keyword::$stmt => $stmt_text,)*
                    $(Keyword::$kw => $kw_text,)*
                }
            }

            /// Whether this keyword starts a statement.
            pub fn is_statement(&self) -> bool {
                matches!(self, $(Keyword::$stmt)|*)
            }
        }
    };
}

keywords! {
    statements {
        Load => "load",
        Save => "save",
        ExportPlot => "export_plot",
        Select => "select",
        SelectByType => "select_by_type",
        Head => "head",
        Tail => "tail",
        Iloc => "iloc",
        Loc => "loc",
        Rename => "rename",
        Reorder => "reorder",
        Filter => "filter",
        FilterBetween => "filter_between",
        FilterIsin => "filter_isin",
        FilterContains => "filter_contains",
        FilterStartswith => "filter_startswith",
        FilterEndswith => "filter_endswith",
        FilterRegex => "filter_regex",
        FilterNull => "filter_null",
        FilterNotnull => "filter_notnull",
        FilterDuplicates => "filter_duplicates",
        Sort => "sort",
        Sample => "sample",
        Join => "join",
        Merge => "merge",
        ConcatVertical => "concat_vertical",
        ConcatHorizontal => "concat_horizontal",
        Union => "union",
        Intersection => "intersection",
        Difference => "difference",
        Compare => "compare",
        Groupby => "groupby",
        FilterGroups => "filter_groups",
        GroupTransform => "group_transform",
        WindowRank => "window_rank",
        WindowLag => "window_lag",
        WindowLead => "window_lead",
        RollingMean => "rolling_mean",
        RollingSum => "rolling_sum",
        RollingStd => "rolling_std",
        RollingMin => "rolling_min",
        RollingMax => "rolling_max",
        ExpandingMean => "expanding_mean",
        ExpandingSum => "expanding_sum",
        ExpandingMin => "expanding_min",
        ExpandingMax => "expanding_max",
        Rolling => "rolling",
        Resample => "resample",
        Cumsum => "cumsum",
        Cummax => "cummax",
        Cummin => "cummin",
        Cumprod => "cumprod",
        PctChange => "pct_change",
        Diff => "diff",
        Shift => "shift",
        Pivot => "pivot",
        PivotTable => "pivot_table",
        Melt => "melt",
        Stack => "stack",
        Unstack => "unstack",
        Transpose => "transpose",
        Crosstab => "crosstab",
        OneHotEncode => "one_hot_encode",
        Split => "split",
        SetIndex => "set_index",
        ResetIndex => "reset_index",
        SortIndex => "sort_index",
        Reindex => "reindex",
        SetMultiindex => "set_multiindex",
        Mutate => "mutate",
        Apply => "apply",
        ApplyRow => "apply_row",
        ApplyColumn => "apply_column",
        Applymap => "applymap",
        Map => "map",
        MapValues => "map_values",
        Assign => "assign",
        Round => "round",
        Abs => "abs",
        Sqrt => "sqrt",
        Power => "power",
        Log => "log",
        Ceil => "ceil",
        Floor => "floor",
        Upper => "upper",
        Lower => "lower",
        Strip => "strip",
        Lstrip => "lstrip",
        Rstrip => "rstrip",
        Title => "title",
        Capitalize => "capitalize",
        Replace => "replace",
        ParseDatetime => "parse_datetime",
        DateAdd => "date_add",
        DateSubtract => "date_subtract",
        Astype => "astype",
        ToNumeric => "to_numeric",
        LabelEncode => "label_encode",
        OrdinalEncode => "ordinal_encode",
        StandardScale => "standard_scale",
        MinmaxScale => "minmax_scale",
        RobustScale => "robust_scale",
        MaxabsScale => "maxabs_scale",
        Normalize => "normalize",
        FillForward => "fill_forward",
        FillBackward => "fill_backward",
        FillMean => "fill_mean",
        FillMedian => "fill_median",
        FillMode => "fill_mode",
        Interpolate => "interpolate",
        Dropna => "dropna",
        Fillna => "fillna",
        DropDuplicates => "drop_duplicates",
        Concat => "concat",
        Substring => "substring",
        Length => "length",
        ExtractRegex => "extract_regex",
        Find => "find",
        FormatDatetime => "format_datetime",
        Extract => "extract",
        ExtractYear => "extract_year",
        ExtractMonth => "extract_month",
        ExtractDay => "extract_day",
        ExtractHour => "extract_hour",
        ExtractMinute => "extract_minute",
        ExtractSecond => "extract_second",
        ExtractDayofweek => "extract_dayofweek",
        ExtractDayofyear => "extract_dayofyear",
        ExtractWeekofyear => "extract_weekofyear",
        ExtractQuarter => "extract_quarter",
        DateDiff => "date_diff",
        TargetEncode => "target_encode",
        Binning => "binning",
        Qcut => "qcut",
        Cut => "cut",
        Rank => "rank",
        Isnull => "isnull",
        Notnull => "notnull",
        Duplicated => "duplicated",
        Describe => "describe",
        Summary => "summary",
        Info => "info",
        Unique => "unique",
        ValueCounts => "value_counts",
        Show => "show",
        Outliers => "outliers",
        Quantile => "quantile",
        Hypothesis => "hypothesis",
        CountNa => "count_na",
        CountDuplicates => "count_duplicates",
        AssertUnique => "assert_unique",
        AssertNoNulls => "assert_no_nulls",
        AssertRange => "assert_range",
        Any => "any",
        All => "all",
        CountTrue => "count_true",
        Boxplot => "boxplot",
        Heatmap => "heatmap",
        Pairplot => "pairplot",
        Timeseries => "timeseries",
        Pie => "pie",
    }
    reserved {
        Csv => "csv",
        Json => "json",
        Excel => "excel",
        Parquet => "parquet",
        Sql => "sql",
        As => "as",
        By => "by",
        With => "with",
        On => "on",
        From => "from",
        To => "to",
        Where => "where",
        And => "and",
        Or => "or",
        Not => "not",
        In => "in",
        Between => "between",
        Contains => "contains",
        StartsWith => "starts_with",
        EndsWith => "ends_with",
        Matches => "matches",
        Is => "is",
        Null => "null",
        Column => "column",
        Columns => "columns",
        Compute => "compute",
        Agg => "agg",
        Asc => "asc",
        Desc => "desc",
        Vs => "vs",
        Else => "else",
        Transform => "transform",
    }
}

impl Keyword {
    /// Resolve a word against the keyword table, ignoring case.
    ///
    /// `none` is accepted as a spelling of `null`.
    pub fn from_word(word: &str) -> Option<Self> {
        let lower = word.to_ascii_lowercase();
        if lower == "none" {
            return Some(Keyword::Null);
        }
        Self::lookup(&lower)
    }

    /// Whether this keyword names a file format.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            Keyword::Csv | Keyword::Json | Keyword::Excel | Keyword::Parquet | Keyword::Sql
        )
    }

    /// Whether the word may stand for a column or parameter value.
    ///
    /// Statement and format keywords may; reserved clause words may not.
    pub fn is_name_like(&self) -> bool {
        self.is_statement() || self.is_format()
    }
}
