//! Abstract syntax tree for Noeta programs.
//!
//! A [`Program`] is an ordered list of [`Statement`]s. Each statement holds a
//! [`StatementKind`] with one variant per statement keyword; variants carry
//! the source aliases they read, the columns they touch and their typed
//! parameters. Every name keeps its source span so later phases can point at
//! it.

mod expr;
mod value;

use std::fmt;

use crate::{
    keyword::Keyword,
    span::{Position, Span, Spanned},
};

pub use expr::{
    BinaryOp, CompareOp, Condition, ConditionKind, Expr, ExprKind, Literal, MatchKind, UnaryOp,
};
pub use value::Value;

/// A dataset alias or column name together with its span.
pub type Name = Spanned<String>;

/// A string parameter together with its span.
pub type Text = Spanned<String>;

/// Pass-through keyword arguments, in source order.
pub type Options = Vec<(Name, Spanned<Value>)>;

/// A parsed program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// One statement with its location and optional result alias.
#[derive(Debug, Clone)]
pub struct Statement {
    pub kind: StatementKind,
    /// Position of the leading keyword.
    pub position: Position,
    pub span: Span,
    /// Alias declared with `as`.
    pub result: Option<Name>,
}

impl PartialEq for Statement {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.result == other.result
    }
}

impl Statement {
    pub fn new(kind: StatementKind, position: Position, span: Span, result: Option<Name>) -> Self {
        Self {
            kind,
            position,
            span,
            result,
        }
    }

    /// The statement keyword.
    pub fn keyword(&self) -> Keyword {
        self.kind.keyword()
    }

    /// Dataset aliases the statement reads, in source order.
    pub fn sources(&self) -> Vec<&Name> {
        self.kind.sources()
    }

    /// Columns the statement reads, paired with the alias they belong to.
    pub fn columns(&self) -> Vec<ColumnRef<'_>> {
        self.kind.columns()
    }

    pub fn result_name(&self) -> Option<&str> {
        self.result.as_ref().map(|name| name.inner().as_str())
    }
}

/// A column reference resolved against a particular source alias.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnRef<'a> {
    pub source: &'a Name,
    pub column: &'a Name,
}

/// On-disk formats understood by `load` and `save`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FileFormat {
    #[default]
    Csv,
    Json,
    Excel,
    Parquet,
}

impl FileFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Json => "json",
            FileFormat::Excel => "excel",
            FileFormat::Parquet => "parquet",
        }
    }

    /// Guesses the format from a path's extension, defaulting to CSV.
    pub fn from_path(path: &str) -> Self {
        let lowered = path.to_lowercase();
        if lowered.ends_with(".json") {
            FileFormat::Json
        } else if lowered.ends_with(".xlsx") || lowered.ends_with(".xls") {
            FileFormat::Excel
        } else if lowered.ends_with(".parquet") {
            FileFormat::Parquet
        } else {
            FileFormat::Csv
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "csv" => Some(FileFormat::Csv),
            "json" => Some(FileFormat::Json),
            "excel" | "xlsx" | "xls" => Some(FileFormat::Excel),
            "parquet" => Some(FileFormat::Parquet),
            _ => None,
        }
    }

    pub(crate) fn from_keyword(keyword: Keyword) -> Option<Self> {
        match keyword {
            Keyword::Csv => Some(FileFormat::Csv),
            Keyword::Json => Some(FileFormat::Json),
            Keyword::Excel => Some(FileFormat::Excel),
            Keyword::Parquet => Some(FileFormat::Parquet),
            _ => None,
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `source column c`
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnTarget {
    pub source: Name,
    pub column: Name,
}

impl ColumnTarget {
    pub fn new(source: Name, column: Name) -> Self {
        Self { source, column }
    }

    pub fn source(&self) -> &str {
        self.source.inner()
    }

    pub fn column(&self) -> &str {
        self.column.inner()
    }
}

/// Which duplicate to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Keep {
    #[default]
    First,
    Last,
    /// Drop every duplicate.
    None,
}

impl Keep {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "first" => Some(Keep::First),
            "last" => Some(Keep::Last),
            "none" | "false" => Some(Keep::None),
            _ => None,
        }
    }
}

/// One key of a `sort` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub column: Name,
    pub descending: bool,
}

/// `func: column` inside a `groupby ... compute {..}` block.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub function: Name,
    pub column: Name,
}

/// `name = expr` inside `mutate`.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: Name,
    pub expr: Expr,
}

/// Right-hand side of `map`.
#[derive(Debug, Clone, PartialEq)]
pub enum MapSpec {
    Transform(Expr),
    Mapping(Vec<(Spanned<Value>, Spanned<Value>)>),
}

/// Fill source for `fillna`.
#[derive(Debug, Clone, PartialEq)]
pub enum FillSpec {
    Value(Spanned<Value>),
    Method(Text),
}

/// Parameters of the `rolling_*` family.
#[derive(Debug, Clone, PartialEq)]
pub struct Rolling {
    pub target: ColumnTarget,
    pub window: i64,
    pub min_periods: i64,
}

/// Parameters of the `expanding_*` family.
#[derive(Debug, Clone, PartialEq)]
pub struct Expanding {
    pub target: ColumnTarget,
    pub min_periods: i64,
}

/// Parameters shared by `window_lag` and `window_lead`.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowOffset {
    pub target: ColumnTarget,
    pub by: Vec<Name>,
    pub periods: i64,
    pub fill_value: Option<Spanned<Value>>,
}

/// Parameters shared by `date_add` and `date_subtract`.
#[derive(Debug, Clone, PartialEq)]
pub struct DateOffset {
    pub target: ColumnTarget,
    pub value: i64,
    pub unit: Text,
}

/// Two datasets combined with `a with b`.
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    pub left: Name,
    pub right: Name,
}

/// Every statement Noeta knows, one variant per keyword.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    // I/O
    Load {
        format: FileFormat,
        path: Text,
        options: Options,
    },
    LoadSql {
        query: Text,
        connection: Text,
        options: Options,
    },
    Save {
        source: Name,
        path: Text,
        format: FileFormat,
        options: Options,
    },
    ExportPlot {
        path: Text,
        width: Option<f64>,
        height: Option<f64>,
    },

    // Selection
    Select {
        source: Name,
        columns: Vec<Name>,
    },
    SelectByType {
        source: Name,
        dtype: Text,
    },
    Head {
        source: Name,
        n: i64,
    },
    Tail {
        source: Name,
        n: i64,
    },
    Iloc {
        source: Name,
        rows: Spanned<Value>,
        columns: Option<Spanned<Value>>,
    },
    Loc {
        source: Name,
        rows: Spanned<Value>,
        columns: Vec<Name>,
    },
    Rename {
        source: Name,
        mapping: Vec<(Name, Name)>,
    },
    Reorder {
        source: Name,
        order: Vec<Name>,
    },

    // Filtering
    Filter {
        source: Name,
        condition: Condition,
    },
    FilterBetween {
        target: ColumnTarget,
        min: Spanned<Value>,
        max: Spanned<Value>,
    },
    FilterIsin {
        target: ColumnTarget,
        values: Vec<Spanned<Value>>,
    },
    FilterContains {
        target: ColumnTarget,
        pattern: Text,
    },
    FilterStartswith {
        target: ColumnTarget,
        pattern: Text,
    },
    FilterEndswith {
        target: ColumnTarget,
        pattern: Text,
    },
    FilterRegex {
        target: ColumnTarget,
        pattern: Text,
    },
    FilterNull(ColumnTarget),
    FilterNotnull(ColumnTarget),
    FilterDuplicates {
        source: Name,
        subset: Vec<Name>,
        keep: Keep,
    },
    Sort {
        source: Name,
        keys: Vec<SortKey>,
    },
    Sample {
        source: Name,
        n: i64,
        random: bool,
    },

    // Combining
    Join {
        pair: Pair,
        on: Name,
    },
    Merge {
        pair: Pair,
        on: Option<Name>,
        how: Text,
        left_on: Option<Name>,
        right_on: Option<Name>,
        suffixes: Option<(String, String)>,
    },
    ConcatVertical {
        sources: Vec<Name>,
        ignore_index: bool,
    },
    ConcatHorizontal {
        sources: Vec<Name>,
    },
    Union(Pair),
    Intersection(Pair),
    Difference(Pair),
    Compare(Pair),

    // Grouping and windows
    Groupby {
        source: Name,
        by: Vec<Name>,
        aggregations: Vec<Aggregation>,
    },
    FilterGroups {
        source: Name,
        by: Vec<Name>,
        condition: Expr,
    },
    GroupTransform {
        target: ColumnTarget,
        by: Vec<Name>,
        function: Text,
    },
    WindowRank {
        target: ColumnTarget,
        by: Vec<Name>,
        method: Text,
        ascending: bool,
    },
    WindowLag(WindowOffset),
    WindowLead(WindowOffset),
    RollingMean(Rolling),
    RollingSum(Rolling),
    RollingStd(Rolling),
    RollingMin(Rolling),
    RollingMax(Rolling),
    ExpandingMean(Expanding),
    ExpandingSum(Expanding),
    ExpandingMin(Expanding),
    ExpandingMax(Expanding),
    RollingApply {
        rolling: Rolling,
        function: Text,
    },
    Resample {
        target: ColumnTarget,
        rule: Text,
        aggfunc: Text,
    },
    Cumsum(ColumnTarget),
    Cummax(ColumnTarget),
    Cummin(ColumnTarget),
    Cumprod(ColumnTarget),
    PctChange {
        target: ColumnTarget,
        periods: i64,
    },
    Diff {
        target: ColumnTarget,
        periods: i64,
    },
    Shift {
        target: ColumnTarget,
        periods: i64,
        fill_value: Option<Spanned<Value>>,
    },

    // Reshaping
    Pivot {
        source: Name,
        index: Name,
        columns: Name,
        values: Name,
    },
    PivotTable {
        source: Name,
        index: Name,
        columns: Name,
        values: Name,
        aggfunc: Text,
        fill_value: Option<Spanned<Value>>,
    },
    Melt {
        source: Name,
        id_vars: Vec<Name>,
        value_vars: Vec<Name>,
        var_name: Text,
        value_name: Text,
    },
    Stack {
        source: Name,
        level: i64,
    },
    Unstack {
        source: Name,
        level: i64,
        fill_value: Option<Spanned<Value>>,
    },
    Transpose {
        source: Name,
    },
    Crosstab {
        source: Name,
        rows: Name,
        columns: Name,
        values: Option<Name>,
        aggfunc: Text,
    },
    OneHotEncode(ColumnTarget),
    Split {
        target: ColumnTarget,
        delimiter: Text,
    },

    // Index
    SetIndex {
        target: ColumnTarget,
        drop: bool,
    },
    ResetIndex {
        source: Name,
        drop: bool,
    },
    SortIndex {
        source: Name,
        ascending: bool,
    },
    Reindex {
        source: Name,
        index: Vec<Spanned<Value>>,
    },
    SetMultiindex {
        source: Name,
        columns: Vec<Name>,
    },

    // Apply, map, mutate
    Mutate {
        source: Name,
        assignments: Vec<Assignment>,
    },
    Apply {
        source: Name,
        columns: Vec<Name>,
        transform: Expr,
    },
    ApplyRow {
        source: Name,
        transform: Expr,
        into: Text,
    },
    ApplyColumn {
        target: ColumnTarget,
        transform: Expr,
    },
    Applymap {
        source: Name,
        transform: Expr,
    },
    Map {
        target: ColumnTarget,
        spec: MapSpec,
    },
    MapValues {
        target: ColumnTarget,
        mapping: Vec<(Spanned<Value>, Spanned<Value>)>,
    },
    Assign {
        target: ColumnTarget,
        value: Spanned<Value>,
    },

    // Math transforms
    Round {
        target: ColumnTarget,
        decimals: i64,
    },
    Abs(ColumnTarget),
    Sqrt(ColumnTarget),
    Power {
        target: ColumnTarget,
        exponent: f64,
    },
    Log {
        target: ColumnTarget,
        base: Option<f64>,
    },
    Ceil(ColumnTarget),
    Floor(ColumnTarget),

    // String transforms
    Upper(ColumnTarget),
    Lower(ColumnTarget),
    Strip(ColumnTarget),
    Lstrip {
        target: ColumnTarget,
        chars: Option<Text>,
    },
    Rstrip {
        target: ColumnTarget,
        chars: Option<Text>,
    },
    Title(ColumnTarget),
    Capitalize(ColumnTarget),
    Replace {
        target: ColumnTarget,
        old: Spanned<Value>,
        new: Spanned<Value>,
    },

    // Datetime transforms
    ParseDatetime {
        target: ColumnTarget,
        format: Option<Text>,
    },
    DateAdd(DateOffset),
    DateSubtract(DateOffset),

    // Type transforms
    Astype {
        target: ColumnTarget,
        dtype: Text,
    },
    ToNumeric {
        target: ColumnTarget,
        errors: Text,
    },
    LabelEncode(ColumnTarget),
    OrdinalEncode {
        target: ColumnTarget,
        order: Vec<Spanned<Value>>,
    },

    // Scaling
    StandardScale(ColumnTarget),
    MinmaxScale(ColumnTarget),
    RobustScale(ColumnTarget),
    MaxabsScale(ColumnTarget),
    Normalize {
        source: Name,
        columns: Vec<Name>,
        method: Text,
    },

    // Missing data
    FillForward {
        source: Name,
        column: Option<Name>,
    },
    FillBackward {
        source: Name,
        column: Option<Name>,
    },
    FillMean(ColumnTarget),
    FillMedian(ColumnTarget),
    FillMode(ColumnTarget),
    Interpolate {
        source: Name,
        column: Option<Name>,
        method: Text,
    },
    Dropna {
        source: Name,
        columns: Vec<Name>,
    },
    Fillna {
        source: Name,
        column: Option<Name>,
        fill: FillSpec,
    },
    DropDuplicates {
        source: Name,
        subset: Vec<Name>,
        keep: Keep,
    },

    // Derived columns
    Concat {
        source: Name,
        columns: Vec<Name>,
        separator: Text,
    },
    Substring {
        target: ColumnTarget,
        start: i64,
        end: Option<i64>,
    },
    Length(ColumnTarget),
    ExtractRegex {
        target: ColumnTarget,
        pattern: Text,
        group: i64,
    },
    Find {
        target: ColumnTarget,
        substring: Text,
    },
    FormatDatetime {
        target: ColumnTarget,
        format: Text,
    },
    Extract {
        target: ColumnTarget,
        part: Text,
    },
    ExtractYear(ColumnTarget),
    ExtractMonth(ColumnTarget),
    ExtractDay(ColumnTarget),
    ExtractHour(ColumnTarget),
    ExtractMinute(ColumnTarget),
    ExtractSecond(ColumnTarget),
    ExtractDayofweek(ColumnTarget),
    ExtractDayofyear(ColumnTarget),
    ExtractWeekofyear(ColumnTarget),
    ExtractQuarter(ColumnTarget),
    DateDiff {
        source: Name,
        start: Name,
        end: Name,
        unit: Text,
    },
    TargetEncode {
        target: ColumnTarget,
        target_column: Name,
    },
    Binning {
        target: ColumnTarget,
        bins: i64,
    },
    Qcut {
        target: ColumnTarget,
        q: i64,
        labels: Vec<Spanned<Value>>,
    },
    Cut {
        target: ColumnTarget,
        bins: Spanned<Value>,
        labels: Vec<Spanned<Value>>,
        include_lowest: bool,
    },
    Rank {
        target: ColumnTarget,
        method: Text,
        ascending: bool,
        pct: bool,
    },
    Isnull(ColumnTarget),
    Notnull(ColumnTarget),
    Duplicated {
        source: Name,
        columns: Vec<Name>,
        keep: Keep,
    },

    // Display
    Describe {
        source: Name,
        columns: Vec<Name>,
    },
    Summary {
        source: Name,
    },
    Info {
        source: Name,
    },
    Unique(ColumnTarget),
    ValueCounts {
        target: ColumnTarget,
        normalize: bool,
        ascending: bool,
    },
    Show {
        source: Name,
        n: Option<i64>,
    },
    Outliers {
        source: Name,
        columns: Vec<Name>,
        method: Text,
    },
    Quantile {
        target: ColumnTarget,
        q: f64,
    },
    Hypothesis {
        pair: Pair,
        columns: Vec<Name>,
        test: Text,
    },
    CountNa {
        source: Name,
    },
    CountDuplicates {
        source: Name,
        columns: Vec<Name>,
    },
    AssertUnique(ColumnTarget),
    AssertNoNulls(ColumnTarget),
    AssertRange {
        target: ColumnTarget,
        min: Option<f64>,
        max: Option<f64>,
    },
    Any(ColumnTarget),
    All(ColumnTarget),
    CountTrue(ColumnTarget),

    // Visualisation
    Boxplot {
        source: Name,
        columns: Vec<Name>,
        by: Option<Name>,
    },
    Heatmap {
        source: Name,
        columns: Vec<Name>,
    },
    Pairplot {
        source: Name,
        columns: Vec<Name>,
    },
    Timeseries {
        source: Name,
        x: Name,
        y: Name,
    },
    Pie {
        source: Name,
        values: Name,
        labels: Name,
    },
}

impl StatementKind {
    /// The keyword that introduces this statement.
    pub fn keyword(&self) -> Keyword {
        use StatementKind as S;
        match self {
            S::Load { .. } | S::LoadSql { .. } => Keyword::Load,
            S::Save { .. } => Keyword::Save,
            S::ExportPlot { .. } => Keyword::ExportPlot,
            S::Select { .. } => Keyword::Select,
            S::SelectByType { .. } => Keyword::SelectByType,
            S::Head { .. } => Keyword::Head,
            S::Tail { .. } => Keyword::Tail,
            S::Iloc { .. } => Keyword::Iloc,
            S::Loc { .. } => Keyword::Loc,
            S::Rename { .. } => Keyword::Rename,
            S::Reorder { .. } => Keyword::Reorder,
            S::Filter { .. } => Keyword::Filter,
            S::FilterBetween { .. } => Keyword::FilterBetween,
            S::FilterIsin { .. } => Keyword::FilterIsin,
            S::FilterContains { .. } => Keyword::FilterContains,
            S::FilterStartswith { .. } => Keyword::FilterStartswith,
            S::FilterEndswith { .. } => Keyword::FilterEndswith,
            S::FilterRegex { .. } => Keyword::FilterRegex,
            S::FilterNull(_) => Keyword::FilterNull,
            S::FilterNotnull(_) => Keyword::FilterNotnull,
            S::FilterDuplicates { .. } => Keyword::FilterDuplicates,
            S::Sort { .. } => Keyword::Sort,
            S::Sample { .. } => Keyword::Sample,
            S::Join { .. } => Keyword::Join,
            S::Merge { .. } => Keyword::Merge,
            S::ConcatVertical { .. } => Keyword::ConcatVertical,
            S::ConcatHorizontal { .. } => Keyword::ConcatHorizontal,
            S::Union(_) => Keyword::Union,
            S::Intersection(_) => Keyword::Intersection,
            S::Difference(_) => Keyword::Difference,
            S::Compare(_) => Keyword::Compare,
            S::Groupby { .. } => Keyword::Groupby,
            S::FilterGroups { .. } => Keyword::FilterGroups,
            S::GroupTransform { .. } => Keyword::GroupTransform,
            S::WindowRank { .. } => Keyword::WindowRank,
            S::WindowLag(_) => Keyword::WindowLag,
            S::WindowLead(_) => Keyword::WindowLead,
            S::RollingMean(_) => Keyword::RollingMean,
            S::RollingSum(_) => Keyword::RollingSum,
            S::RollingStd(_) => Keyword::RollingStd,
            S::RollingMin(_) => Keyword::RollingMin,
            S::RollingMax(_) => Keyword::RollingMax,
            S::ExpandingMean(_) => Keyword::ExpandingMean,
            S::ExpandingSum(_) => Keyword::ExpandingSum,
            S::ExpandingMin(_) => Keyword::ExpandingMin,
            S::ExpandingMax(_) => Keyword::ExpandingMax,
            S::RollingApply { .. } => Keyword::Rolling,
            S::Resample { .. } => Keyword::Resample,
            S::Cumsum(_) => Keyword::Cumsum,
            S::Cummax(_) => Keyword::Cummax,
            S::Cummin(_) => Keyword::Cummin,
            S::Cumprod(_) => Keyword::Cumprod,
            S::PctChange { .. } => Keyword::PctChange,
            S::Diff { .. } => Keyword::Diff,
            S::Shift { .. } => Keyword::Shift,
            S::Pivot { .. } => Keyword::Pivot,
            S::PivotTable { .. } => Keyword::PivotTable,
            S::Melt { .. } => Keyword::Melt,
            S::Stack { .. } => Keyword::Stack,
            S::Unstack { .. } => Keyword::Unstack,
            S::Transpose { .. } => Keyword::Transpose,
            S::Crosstab { .. } => Keyword::Crosstab,
            S::OneHotEncode(_) => Keyword::OneHotEncode,
            S::Split { .. } => Keyword::Split,
            S::SetIndex { .. } => Keyword::SetIndex,
            S::ResetIndex { .. } => Keyword::ResetIndex,
            S::SortIndex { .. } => Keyword::SortIndex,
            S::Reindex { .. } => Keyword::Reindex,
            S::SetMultiindex { .. } => Keyword::SetMultiindex,
            S::Mutate { .. } => Keyword::Mutate,
            S::Apply { .. } => Keyword::Apply,
            S::ApplyRow { .. } => Keyword::ApplyRow,
            S::ApplyColumn { .. } => Keyword::ApplyColumn,
            S::Applymap { .. } => Keyword::Applymap,
            S::Map { .. } => Keyword::Map,
            S::MapValues { .. } => Keyword::MapValues,
            S::Assign { .. } => Keyword::Assign,
            S::Round { .. } => Keyword::Round,
            S::Abs(_) => Keyword::Abs,
            S::Sqrt(_) => Keyword::Sqrt,
            S::Power { .. } => Keyword::Power,
            S::Log { .. } => Keyword::Log,
            S::Ceil(_) => Keyword::Ceil,
            S::Floor(_) => Keyword::Floor,
            S::Upper(_) => Keyword::Upper,
            S::Lower(_) => Keyword::Lower,
            S::Strip(_) => Keyword::Strip,
            S::Lstrip { .. } => Keyword::Lstrip,
            S::Rstrip { .. } => Keyword::Rstrip,
            S::Title(_) => Keyword::Title,
            S::Capitalize(_) => Keyword::Capitalize,
            S::Replace { .. } => Keyword::Replace,
            S::ParseDatetime { .. } => Keyword::ParseDatetime,
            S::DateAdd(_) => Keyword::DateAdd,
            S::DateSubtract(_) => Keyword::DateSubtract,
            S::Astype { .. } => Keyword::Astype,
            S::ToNumeric { .. } => Keyword::ToNumeric,
            S::LabelEncode(_) => Keyword::LabelEncode,
            S::OrdinalEncode { .. } => Keyword::OrdinalEncode,
            S::StandardScale(_) => Keyword::StandardScale,
            S::MinmaxScale(_) => Keyword::MinmaxScale,
            S::RobustScale(_) => Keyword::RobustScale,
            S::MaxabsScale(_) => Keyword::MaxabsScale,
            S::Normalize { .. } => Keyword::Normalize,
            S::FillForward { .. } => Keyword::FillForward,
            S::FillBackward { .. } => Keyword::FillBackward,
            S::FillMean(_) => Keyword::FillMean,
            S::FillMedian(_) => Keyword::FillMedian,
            S::FillMode(_) => Keyword::FillMode,
            S::Interpolate { .. } => Keyword::Interpolate,
            S::Dropna { .. } => Keyword::Dropna,
            S::Fillna { .. } => Keyword::Fillna,
            S::DropDuplicates { .. } => Keyword::DropDuplicates,
            S::Concat { .. } => Keyword::Concat,
            S::Substring { .. } => Keyword::Substring,
            S::Length(_) => Keyword::Length,
            S::ExtractRegex { .. } => Keyword::ExtractRegex,
            S::Find { .. } => Keyword::Find,
            S::FormatDatetime { .. } => Keyword::FormatDatetime,
            S::Extract { .. } => Keyword::Extract,
            S::ExtractYear(_) => Keyword::ExtractYear,
            S::ExtractMonth(_) => Keyword::ExtractMonth,
            S::ExtractDay(_) => Keyword::ExtractDay,
            S::ExtractHour(_) => Keyword::ExtractHour,
            S::ExtractMinute(_) => Keyword::ExtractMinute,
            S::ExtractSecond(_) => Keyword::ExtractSecond,
            S::ExtractDayofweek(_) => Keyword::ExtractDayofweek,
            S::ExtractDayofyear(_) => Keyword::ExtractDayofyear,
            S::ExtractWeekofyear(_) => Keyword::ExtractWeekofyear,
            S::ExtractQuarter(_) => Keyword::ExtractQuarter,
            S::DateDiff { .. } => Keyword::DateDiff,
            S::TargetEncode { .. } => Keyword::TargetEncode,
            S::Binning { .. } => Keyword::Binning,
            S::Qcut { .. } => Keyword::Qcut,
            S::Cut { .. } => Keyword::Cut,
            S::Rank { .. } => Keyword::Rank,
            S::Isnull(_) => Keyword::Isnull,
            S::Notnull(_) => Keyword::Notnull,
            S::Duplicated { .. } => Keyword::Duplicated,
            S::Describe { .. } => Keyword::Describe,
            S::Summary { .. } => Keyword::Summary,
            S::Info { .. } => Keyword::Info,
            S::Unique(_) => Keyword::Unique,
            S::ValueCounts { .. } => Keyword::ValueCounts,
            S::Show { .. } => Keyword::Show,
            S::Outliers { .. } => Keyword::Outliers,
            S::Quantile { .. } => Keyword::Quantile,
            S::Hypothesis { .. } => Keyword::Hypothesis,
            S::CountNa { .. } => Keyword::CountNa,
            S::CountDuplicates { .. } => Keyword::CountDuplicates,
            S::AssertUnique(_) => Keyword::AssertUnique,
            S::AssertNoNulls(_) => Keyword::AssertNoNulls,
            S::AssertRange { .. } => Keyword::AssertRange,
            S::Any(_) => Keyword::Any,
            S::All(_) => Keyword::All,
            S::CountTrue(_) => Keyword::CountTrue,
            S::Boxplot { .. } => Keyword::Boxplot,
            S::Heatmap { .. } => Keyword::Heatmap,
            S::Pairplot { .. } => Keyword::Pairplot,
            S::Timeseries { .. } => Keyword::Timeseries,
            S::Pie { .. } => Keyword::Pie,
        }
    }

    /// The single-column target, for statements shaped `s column c`.
    pub fn target(&self) -> Option<&ColumnTarget> {
        use StatementKind as S;
        match self {
            S::FilterBetween { target, .. }
            | S::FilterIsin { target, .. }
            | S::FilterContains { target, .. }
            | S::FilterStartswith { target, .. }
            | S::FilterEndswith { target, .. }
            | S::FilterRegex { target, .. }
            | S::GroupTransform { target, .. }
            | S::WindowRank { target, .. }
            | S::Resample { target, .. }
            | S::PctChange { target, .. }
            | S::Diff { target, .. }
            | S::Shift { target, .. }
            | S::Split { target, .. }
            | S::SetIndex { target, .. }
            | S::ApplyColumn { target, .. }
            | S::Map { target, .. }
            | S::MapValues { target, .. }
            | S::Assign { target, .. }
            | S::Round { target, .. }
            | S::Power { target, .. }
            | S::Log { target, .. }
            | S::Lstrip { target, .. }
            | S::Rstrip { target, .. }
            | S::Replace { target, .. }
            | S::ParseDatetime { target, .. }
            | S::Astype { target, .. }
            | S::ToNumeric { target, .. }
            | S::OrdinalEncode { target, .. }
            | S::Substring { target, .. }
            | S::ExtractRegex { target, .. }
            | S::Find { target, .. }
            | S::FormatDatetime { target, .. }
            | S::Extract { target, .. }
            | S::TargetEncode { target, .. }
            | S::Binning { target, .. }
            | S::Qcut { target, .. }
            | S::Cut { target, .. }
            | S::Rank { target, .. }
            | S::ValueCounts { target, .. }
            | S::Quantile { target, .. }
            | S::AssertRange { target, .. } => Some(target),
            S::FilterNull(target)
            | S::FilterNotnull(target)
            | S::Cumsum(target)
            | S::Cummax(target)
            | S::Cummin(target)
            | S::Cumprod(target)
            | S::OneHotEncode(target)
            | S::Abs(target)
            | S::Sqrt(target)
            | S::Ceil(target)
            | S::Floor(target)
            | S::Upper(target)
            | S::Lower(target)
            | S::Strip(target)
            | S::Title(target)
            | S::Capitalize(target)
            | S::LabelEncode(target)
            | S::StandardScale(target)
            | S::MinmaxScale(target)
            | S::RobustScale(target)
            | S::MaxabsScale(target)
            | S::FillMean(target)
            | S::FillMedian(target)
            | S::FillMode(target)
            | S::Length(target)
            | S::ExtractYear(target)
            | S::ExtractMonth(target)
            | S::ExtractDay(target)
            | S::ExtractHour(target)
            | S::ExtractMinute(target)
            | S::ExtractSecond(target)
            | S::ExtractDayofweek(target)
            | S::ExtractDayofyear(target)
            | S::ExtractWeekofyear(target)
            | S::ExtractQuarter(target)
            | S::Isnull(target)
            | S::Notnull(target)
            | S::Unique(target)
            | S::AssertUnique(target)
            | S::AssertNoNulls(target)
            | S::Any(target)
            | S::All(target)
            | S::CountTrue(target) => Some(target),
            S::WindowLag(offset) | S::WindowLead(offset) => Some(&offset.target),
            S::RollingMean(rolling)
            | S::RollingSum(rolling)
            | S::RollingStd(rolling)
            | S::RollingMin(rolling)
            | S::RollingMax(rolling)
            | S::RollingApply { rolling, .. } => Some(&rolling.target),
            S::ExpandingMean(expanding)
            | S::ExpandingSum(expanding)
            | S::ExpandingMin(expanding)
            | S::ExpandingMax(expanding) => Some(&expanding.target),
            S::DateAdd(offset) | S::DateSubtract(offset) => Some(&offset.target),
            _ => None,
        }
    }

    /// Dataset aliases read by the statement, in source order.
    pub fn sources(&self) -> Vec<&Name> {
        use StatementKind as S;
        if let Some(target) = self.target() {
            return vec![&target.source];
        }
        match self {
            S::Load { .. } | S::LoadSql { .. } | S::ExportPlot { .. } => Vec::new(),
            S::Join { pair, .. }
            | S::Merge { pair, .. }
            | S::Union(pair)
            | S::Intersection(pair)
            | S::Difference(pair)
            | S::Compare(pair)
            | S::Hypothesis { pair, .. } => vec![&pair.left, &pair.right],
            S::ConcatVertical { sources, .. } | S::ConcatHorizontal { sources } => {
                sources.iter().collect()
            }
            S::Save { source, .. }
            | S::Select { source, .. }
            | S::SelectByType { source, .. }
            | S::Head { source, .. }
            | S::Tail { source, .. }
            | S::Iloc { source, .. }
            | S::Loc { source, .. }
            | S::Rename { source, .. }
            | S::Reorder { source, .. }
            | S::Filter { source, .. }
            | S::FilterDuplicates { source, .. }
            | S::Sort { source, .. }
            | S::Sample { source, .. }
            | S::Groupby { source, .. }
            | S::FilterGroups { source, .. }
            | S::Pivot { source, .. }
            | S::PivotTable { source, .. }
            | S::Melt { source, .. }
            | S::Stack { source, .. }
            | S::Unstack { source, .. }
            | S::Transpose { source }
            | S::Crosstab { source, .. }
            | S::ResetIndex { source, .. }
            | S::SortIndex { source, .. }
            | S::Reindex { source, .. }
            | S::SetMultiindex { source, .. }
            | S::Mutate { source, .. }
            | S::Apply { source, .. }
            | S::ApplyRow { source, .. }
            | S::Applymap { source, .. }
            | S::Normalize { source, .. }
            | S::FillForward { source, .. }
            | S::FillBackward { source, .. }
            | S::Interpolate { source, .. }
            | S::Dropna { source, .. }
            | S::Fillna { source, .. }
            | S::DropDuplicates { source, .. }
            | S::Concat { source, .. }
            | S::DateDiff { source, .. }
            | S::Duplicated { source, .. }
            | S::Describe { source, .. }
            | S::Summary { source }
            | S::Info { source }
            | S::Show { source, .. }
            | S::Outliers { source, .. }
            | S::CountNa { source }
            | S::CountDuplicates { source, .. }
            | S::Boxplot { source, .. }
            | S::Heatmap { source, .. }
            | S::Pairplot { source, .. }
            | S::Timeseries { source, .. }
            | S::Pie { source, .. } => vec![source],
            // Every remaining variant has a column target, handled above.
            _ => Vec::new(),
        }
    }

    /// Columns the statement reads, each paired with its dataset alias.
    ///
    /// Columns the statement creates (`mutate` assignments, the `assign`
    /// target) are not listed. A `join` key is listed against both sides.
    pub fn columns(&self) -> Vec<ColumnRef<'_>> {
        use StatementKind as S;
        match self {
            S::Assign { .. } => Vec::new(),
            S::GroupTransform { target, by, .. }
            | S::WindowRank { target, by, .. }
            | S::WindowLag(WindowOffset { target, by, .. })
            | S::WindowLead(WindowOffset { target, by, .. }) => {
                let mut refs = column_refs(&target.source, by);
                refs.push(ColumnRef::new(&target.source, &target.column));
                refs
            }
            S::TargetEncode {
                target,
                target_column,
            } => column_refs(&target.source, [&target.column, target_column]),
            _ if self.target().is_some() => self
                .target()
                .map(|target| vec![ColumnRef::new(&target.source, &target.column)])
                .unwrap_or_default(),
            S::Select { source, columns }
            | S::Loc {
                source, columns, ..
            }
            | S::FilterDuplicates {
                source,
                subset: columns,
                ..
            }
            | S::SetMultiindex { source, columns }
            | S::Apply {
                source, columns, ..
            }
            | S::Normalize {
                source, columns, ..
            }
            | S::Dropna { source, columns }
            | S::DropDuplicates {
                source,
                subset: columns,
                ..
            }
            | S::Concat {
                source, columns, ..
            }
            | S::Duplicated {
                source, columns, ..
            }
            | S::Describe { source, columns }
            | S::Outliers {
                source, columns, ..
            }
            | S::CountDuplicates { source, columns }
            | S::Heatmap { source, columns }
            | S::Pairplot { source, columns }
            | S::Reorder {
                source,
                order: columns,
            } => column_refs(source, columns),
            S::Rename { source, mapping } => {
                column_refs(source, mapping.iter().map(|(old, _)| old))
            }
            S::Filter { source, condition } => column_refs(source, condition.columns()),
            S::Sort { source, keys } => column_refs(source, keys.iter().map(|key| &key.column)),
            S::Groupby {
                source,
                by,
                aggregations,
            } => {
                let mut refs = column_refs(source, by);
                refs.extend(
                    aggregations
                        .iter()
                        .map(|aggregation| ColumnRef::new(source, &aggregation.column)),
                );
                refs
            }
            S::FilterGroups { source, by, .. } => column_refs(source, by),
            S::Join { pair, on } => vec![
                ColumnRef::new(&pair.left, on),
                ColumnRef::new(&pair.right, on),
            ],
            S::Merge {
                pair,
                on,
                left_on,
                right_on,
                ..
            } => {
                let mut refs = Vec::new();
                if let Some(on) = on {
                    refs.push(ColumnRef::new(&pair.left, on));
                    refs.push(ColumnRef::new(&pair.right, on));
                }
                if let Some(left_on) = left_on {
                    refs.push(ColumnRef::new(&pair.left, left_on));
                }
                if let Some(right_on) = right_on {
                    refs.push(ColumnRef::new(&pair.right, right_on));
                }
                refs
            }
            S::Hypothesis { pair, columns, .. } => {
                let mut refs = column_refs(&pair.left, columns);
                refs.extend(column_refs(&pair.right, columns));
                refs
            }
            S::Pivot {
                source,
                index,
                columns,
                values,
            }
            | S::PivotTable {
                source,
                index,
                columns,
                values,
                ..
            } => column_refs(source, [index, columns, values]),
            S::Melt {
                source,
                id_vars,
                value_vars,
                ..
            } => column_refs(source, id_vars.iter().chain(value_vars)),
            S::Crosstab {
                source,
                rows,
                columns,
                values,
                ..
            } => column_refs(source, [rows, columns].into_iter().chain(values)),
            S::FillForward { source, column }
            | S::FillBackward { source, column }
            | S::Interpolate { source, column, .. }
            | S::Fillna { source, column, .. } => column_refs(source, column),
            S::DateDiff {
                source, start, end, ..
            } => column_refs(source, [start, end]),
            S::Boxplot {
                source,
                columns,
                by,
            } => column_refs(source, columns.iter().chain(by)),
            S::Timeseries { source, x, y } => column_refs(source, [x, y]),
            S::Pie {
                source,
                values,
                labels,
            } => column_refs(source, [values, labels]),
            _ => Vec::new(),
        }
    }
}

impl<'a> ColumnRef<'a> {
    pub fn new(source: &'a Name, column: &'a Name) -> Self {
        Self { source, column }
    }
}

fn column_refs<'a>(
    source: &'a Name,
    columns: impl IntoIterator<Item = &'a Name>,
) -> Vec<ColumnRef<'a>> {
    columns
        .into_iter()
        .map(|column| ColumnRef::new(source, column))
        .collect()
}
