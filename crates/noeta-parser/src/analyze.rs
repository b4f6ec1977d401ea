//! Semantic analysis of a parsed program.
//!
//! The [`Analyzer`] walks statements in order against a [`SymbolTable`]:
//!
//! 1. every source alias must be defined (E200);
//! 2. every column read from a dataset with a known schema must exist (E201);
//! 3. in type-check mode, typed operations must see columns of the right
//!    type (E300);
//! 4. a statement with no diagnostics registers its result alias with the
//!    schema its effect produces.
//!
//! Analysis never stops early; every diagnostic is returned in encounter
//! order.

use indexmap::IndexMap;
use log::{debug, trace};

use noeta_core::{ColumnInfo, DataType, DatasetInfo, SymbolTable};

use crate::{
    ast::{ColumnTarget, DateOffset, FileFormat, Name, Program, Statement, StatementKind, Value},
    error::{Diagnostic, DiagnosticCollector, ErrorCode, suggest},
};

/// Source of column schemas for `load` statements.
///
/// Implementations must not fail: any problem reading the file yields an
/// empty map, which the analyzer treats as an unknown schema.
pub trait SchemaProbe {
    fn probe(&self, path: &str, format: FileFormat) -> IndexMap<String, ColumnInfo>;
}

/// A probe that never knows anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProbe;

impl SchemaProbe for NoProbe {
    fn probe(&self, _path: &str, _format: FileFormat) -> IndexMap<String, ColumnInfo> {
        IndexMap::new()
    }
}

/// Column type a typed operation needs.
fn required_type(kind: &StatementKind) -> Option<(DataType, &ColumnTarget)> {
    use StatementKind as S;
    match kind {
        S::Round { target, .. }
        | S::Abs(target)
        | S::Sqrt(target)
        | S::Power { target, .. }
        | S::Log { target, .. }
        | S::Ceil(target)
        | S::Floor(target)
        | S::StandardScale(target)
        | S::MinmaxScale(target)
        | S::RobustScale(target)
        | S::MaxabsScale(target)
        | S::FillMean(target)
        | S::FillMedian(target) => Some((DataType::Numeric, target)),
        S::Upper(target)
        | S::Lower(target)
        | S::Strip(target)
        | S::Lstrip { target, .. }
        | S::Rstrip { target, .. }
        | S::Title(target)
        | S::Capitalize(target)
        | S::Replace { target, .. }
        | S::FilterContains { target, .. }
        | S::FilterStartswith { target, .. }
        | S::FilterEndswith { target, .. }
        | S::FilterRegex { target, .. } => Some((DataType::String, target)),
        _ => None,
    }
}

/// Result schema of a statement, before it is named.
enum Effect {
    /// Copy of the source's columns.
    Preserve(String),
    /// Explicit columns.
    Columns(Vec<ColumnInfo>),
    Unknown,
}

pub struct Analyzer<'a> {
    table: &'a mut SymbolTable,
    source: Option<&'a str>,
    probe: &'a dyn SchemaProbe,
    type_check: bool,
}

impl<'a> Analyzer<'a> {
    pub fn new(table: &'a mut SymbolTable) -> Self {
        Self {
            table,
            source: None,
            probe: &NoProbe,
            type_check: false,
        }
    }

    /// Locate diagnostics against `source` as they are produced.
    pub fn with_source(mut self, source: &'a str) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_probe(mut self, probe: &'a dyn SchemaProbe) -> Self {
        self.probe = probe;
        self
    }

    /// Enable column type checks and schema probing of loaded files.
    pub fn with_type_check(mut self, type_check: bool) -> Self {
        self.type_check = type_check;
        self
    }

    // ============================================================================
    // Main Entry Methods
    // ============================================================================

    /// Analyze every statement, registering results as it goes.
    pub fn analyze(&mut self, program: &Program) -> Vec<Diagnostic> {
        let mut collector = DiagnosticCollector::new();

        for statement in &program.statements {
            let before = collector.len();
            trace!(keyword = statement.keyword().as_str(); "Analyzing statement");

            let missing = self.check_sources(statement, &mut collector);
            self.check_columns(statement, &missing, &mut collector);
            if self.type_check && missing.is_empty() {
                self.check_types(statement, &mut collector);
            }

            if collector.len() == before {
                self.register(statement);
            }
        }

        debug!(
            statements = program.len(),
            diagnostics = collector.len();
            "Analyzed program"
        );
        let diagnostics = collector.into_diagnostics();
        match self.source {
            Some(source) => diagnostics.into_iter().map(|d| d.locate(source)).collect(),
            None => diagnostics,
        }
    }

    // ============================================================================
    // Checks
    // ============================================================================

    /// Report undefined aliases, returning their names.
    fn check_sources(
        &self,
        statement: &Statement,
        collector: &mut DiagnosticCollector,
    ) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for alias in statement.sources() {
            if self.table.exists(alias.inner()) || missing.contains(alias.inner()) {
                continue;
            }
            collector.emit(self.undefined_dataset(alias));
            missing.push(alias.inner().clone());
        }
        missing
    }

    fn check_columns(
        &self,
        statement: &Statement,
        missing: &[String],
        collector: &mut DiagnosticCollector,
    ) {
        let mut reported: Vec<(&str, &str)> = Vec::new();
        for reference in statement.columns() {
            let source = reference.source.inner().as_str();
            let column = reference.column.inner().as_str();
            if missing.iter().any(|m| m == source) || reported.contains(&(source, column)) {
                continue;
            }
            let Some(info) = self.table.lookup(source) else {
                continue;
            };
            if info.is_known() && !info.has_column(column) {
                collector.emit(undefined_column(reference.column, info));
                reported.push((source, column));
            }
        }
    }

    fn check_types(&self, statement: &Statement, collector: &mut DiagnosticCollector) {
        let Some((expected, target)) = required_type(&statement.kind) else {
            return;
        };
        let Some(column) = self
            .table
            .lookup(target.source())
            .and_then(|info| info.column(target.column()))
        else {
            return;
        };
        let actual = column.dtype();
        if actual.is_known() && actual != expected {
            collector.emit(
                Diagnostic::type_error(format!(
                    "Column '{}' has type {actual}, expected {expected}",
                    target.column()
                ))
                .with_code(ErrorCode::E300)
                .with_label(target.column.span(), format!("{actual} column"))
                .with_help(format!(
                    "'{}' works on {expected} columns",
                    statement.keyword().as_str()
                )),
            );
        }
    }

    fn undefined_dataset(&self, alias: &Name) -> Diagnostic {
        let names = self.table.all_names();
        let help = if names.is_empty() {
            "No datasets have been loaded yet".to_string()
        } else {
            format!("Available datasets: {}", names.join(", "))
        };

        Diagnostic::semantic(format!(
            "Dataset '{}' has not been loaded or created",
            alias.inner()
        ))
        .with_code(ErrorCode::E200)
        .with_label(alias.span(), "undefined dataset")
        .with_help(help)
        .with_optional_suggestion(suggest::nearest(alias.inner(), names))
    }

    // ============================================================================
    // Result Registration
    // ============================================================================

    fn register(&mut self, statement: &Statement) {
        let Some(result) = statement.result_name() else {
            return;
        };
        let keyword = statement.keyword().as_str();
        let (effect, provenance) = match &statement.kind {
            StatementKind::Load { path, format, .. } => {
                (self.load_effect(path, *format), path.inner().clone())
            }
            kind => {
                let provenance = match kind.sources().first() {
                    Some(source) => format!("{keyword} {}", source.inner()),
                    None => keyword.to_string(),
                };
                (self.effect(kind), provenance)
            }
        };

        let info = match effect {
            Effect::Preserve(source) => match self.table.lookup(&source) {
                Some(info) => info.derive(result, provenance),
                None => DatasetInfo::new(result, provenance),
            },
            Effect::Columns(columns) => DatasetInfo::new(result, provenance).with_columns(columns),
            Effect::Unknown => DatasetInfo::new(result, provenance),
        };
        debug!(
            name = result,
            keyword = keyword,
            columns = info.column_count();
            "Registered result"
        );
        self.table.define(info);
    }

    fn load_effect(&self, path: &Name, format: FileFormat) -> Effect {
        if !self.type_check {
            return Effect::Unknown;
        }
        let columns = self.probe.probe(path.inner(), format);
        trace!(path = path.inner().as_str(), columns = columns.len(); "Probed schema");
        Effect::Columns(columns.into_values().collect())
    }

    fn known(&self, source: &str) -> Option<&DatasetInfo> {
        self.table.lookup(source).filter(|info| info.is_known())
    }

    fn column_type(&self, target: &ColumnTarget) -> DataType {
        self.table
            .lookup(target.source())
            .and_then(|info| info.column(target.column()))
            .map(ColumnInfo::dtype)
            .unwrap_or(DataType::Unknown)
    }

    /// Keep only the named columns, in the order given.
    fn project<'n>(&self, source: &str, names: impl IntoIterator<Item = &'n Name>) -> Effect {
        let Some(info) = self.known(source) else {
            return Effect::Unknown;
        };
        Effect::Columns(
            names
                .into_iter()
                .filter_map(|name| info.column(name.inner()).cloned())
                .collect(),
        )
    }

    /// Drop the named columns.
    fn project_away<'n>(&self, source: &str, names: impl IntoIterator<Item = &'n Name>) -> Effect {
        let Some(info) = self.known(source) else {
            return Effect::Unknown;
        };
        let dropped: Vec<&str> = names.into_iter().map(|n| n.inner().as_str()).collect();
        Effect::Columns(
            info.columns()
                .filter(|column| !dropped.contains(&column.name()))
                .cloned()
                .collect(),
        )
    }

    /// Source columns plus new ones; a new column replaces one of the same
    /// name in place.
    fn extend(&self, source: &str, added: Vec<(String, DataType)>) -> Effect {
        let Some(info) = self.known(source) else {
            return Effect::Unknown;
        };
        let mut columns: IndexMap<String, ColumnInfo> = info
            .columns()
            .map(|column| (column.name().to_string(), column.clone()))
            .collect();
        for (name, dtype) in added {
            columns.insert(name.clone(), ColumnInfo::new(name, dtype).with_nullable(true));
        }
        Effect::Columns(columns.into_values().collect())
    }

    fn extend_target(&self, target: &ColumnTarget, suffix: &str, dtype: DataType) -> Effect {
        self.extend(
            target.source(),
            vec![(format!("{}_{suffix}", target.column()), dtype)],
        )
    }

    /// Source columns with one column's type replaced.
    fn retype(&self, target: &ColumnTarget, dtype: DataType) -> Effect {
        self.extend(target.source(), vec![(target.column().to_string(), dtype)])
    }

    fn effect(&self, kind: &StatementKind) -> Effect {
        use StatementKind as S;

        let preserve = |source: &Name| Effect::Preserve(source.inner().clone());

        match kind {
            S::Load { .. } | S::LoadSql { .. } => Effect::Unknown,

            // Selection
            S::Select { source, columns } => self.project(source, columns),
            S::Head { source, .. } | S::Tail { source, .. } => preserve(source),
            S::Iloc {
                source, columns, ..
            } => match columns {
                Some(_) => Effect::Unknown,
                None => preserve(source),
            },
            S::Loc {
                source, columns, ..
            } => {
                if columns.is_empty() {
                    preserve(source)
                } else {
                    self.project(source, columns)
                }
            }
            S::Rename { source, mapping } => match self.known(source) {
                Some(info) => Effect::Columns(
                    info.columns()
                        .map(|column| {
                            match mapping.iter().find(|(old, _)| old.inner() == column.name()) {
                                Some((_, new)) => column.renamed(new.inner().as_str()),
                                None => column.clone(),
                            }
                        })
                        .collect(),
                ),
                None => Effect::Unknown,
            },
            S::Reorder { source, order } => self.project(source, order),
            S::SelectByType { .. } => Effect::Unknown,

            // Filtering
            S::Filter { source, .. }
            | S::FilterDuplicates { source, .. }
            | S::Sort { source, .. }
            | S::Sample { source, .. } => preserve(source),
            S::FilterBetween { target, .. }
            | S::FilterIsin { target, .. }
            | S::FilterContains { target, .. }
            | S::FilterStartswith { target, .. }
            | S::FilterEndswith { target, .. }
            | S::FilterRegex { target, .. }
            | S::FilterNull(target)
            | S::FilterNotnull(target) => preserve(&target.source),

            // Combining
            S::Join { .. } | S::Merge { .. } => Effect::Unknown,
            S::ConcatVertical { sources, .. } => {
                let Some((first, rest)) = sources.split_first() else {
                    return Effect::Unknown;
                };
                let Some(head) = self.known(first) else {
                    return Effect::Unknown;
                };
                let mut expected = head.column_names();
                expected.sort_unstable();
                let agree = rest.iter().all(|source| {
                    self.known(source).is_some_and(|info| {
                        let mut names = info.column_names();
                        names.sort_unstable();
                        names == expected
                    })
                });
                if agree {
                    preserve(first)
                } else {
                    Effect::Unknown
                }
            }
            S::ConcatHorizontal { sources } => {
                let mut columns: IndexMap<String, ColumnInfo> = IndexMap::new();
                for source in sources {
                    let Some(info) = self.known(source) else {
                        return Effect::Unknown;
                    };
                    for column in info.columns() {
                        columns
                            .entry(column.name().to_string())
                            .or_insert_with(|| column.clone());
                    }
                }
                Effect::Columns(columns.into_values().collect())
            }
            S::Union(pair) | S::Intersection(pair) | S::Difference(pair) => preserve(&pair.left),

            // Grouping and windows
            S::Groupby { .. } | S::Resample { .. } => Effect::Unknown,
            S::FilterGroups { source, .. } => preserve(source),
            S::GroupTransform {
                target, function, ..
            } => {
                let dtype = match function.inner().as_str() {
                    "first" | "last" | "min" | "max" => self.column_type(target),
                    _ => DataType::Numeric,
                };
                self.extend_target(target, function.inner(), dtype)
            }
            S::WindowRank { target, .. } => self.extend_target(target, "rank", DataType::Numeric),
            S::WindowLag(offset) => self.extend_target(
                &offset.target,
                &format!("lag{}", offset.periods),
                self.column_type(&offset.target),
            ),
            S::WindowLead(offset) => self.extend_target(
                &offset.target,
                &format!("lead{}", offset.periods),
                self.column_type(&offset.target),
            ),
            S::RollingMean(rolling) => self.extend_target(&rolling.target, "rolling_mean", DataType::Numeric),
            S::RollingSum(rolling) => self.extend_target(&rolling.target, "rolling_sum", DataType::Numeric),
            S::RollingStd(rolling) => self.extend_target(&rolling.target, "rolling_std", DataType::Numeric),
            S::RollingMin(rolling) => self.extend_target(&rolling.target, "rolling_min", DataType::Numeric),
            S::RollingMax(rolling) => self.extend_target(&rolling.target, "rolling_max", DataType::Numeric),
            S::RollingApply { rolling, function } => self.extend_target(
                &rolling.target,
                &format!("rolling_{}", function.inner()),
                DataType::Numeric,
            ),
            S::ExpandingMean(expanding) => self.extend_target(&expanding.target, "expanding_mean", DataType::Numeric),
            S::ExpandingSum(expanding) => self.extend_target(&expanding.target, "expanding_sum", DataType::Numeric),
            S::ExpandingMin(expanding) => self.extend_target(&expanding.target, "expanding_min", DataType::Numeric),
            S::ExpandingMax(expanding) => self.extend_target(&expanding.target, "expanding_max", DataType::Numeric),
            S::Cumsum(target) => self.extend_target(target, "cumsum", DataType::Numeric),
            S::Cummax(target) => self.extend_target(target, "cummax", DataType::Numeric),
            S::Cummin(target) => self.extend_target(target, "cummin", DataType::Numeric),
            S::Cumprod(target) => self.extend_target(target, "cumprod", DataType::Numeric),
            S::PctChange { target, .. } => self.extend_target(target, "pct_change", DataType::Numeric),
            S::Diff { target, .. } => self.extend_target(target, "diff", DataType::Numeric),
            S::Shift { target, .. } => {
                self.extend_target(target, "shifted", self.column_type(target))
            }

            // Reshaping
            S::Pivot { .. }
            | S::PivotTable { .. }
            | S::Melt { .. }
            | S::Stack { .. }
            | S::Unstack { .. }
            | S::Transpose { .. }
            | S::Crosstab { .. }
            | S::OneHotEncode(_)
            | S::Split { .. } => Effect::Unknown,

            // Index
            S::SetIndex { target, drop } => {
                if *drop {
                    self.project_away(target.source(), [&target.column])
                } else {
                    preserve(&target.source)
                }
            }
            S::ResetIndex { source, drop } => {
                if *drop {
                    preserve(source)
                } else {
                    Effect::Unknown
                }
            }
            S::SortIndex { source, .. } | S::Reindex { source, .. } => preserve(source),
            S::SetMultiindex { source, columns } => self.project_away(source, columns),

            // Apply, map, mutate
            S::Mutate {
                source,
                assignments,
            } => self.extend(
                source,
                assignments
                    .iter()
                    .map(|a| (a.column.inner().clone(), DataType::Unknown))
                    .collect(),
            ),
            S::Apply { source, .. } | S::Applymap { source, .. } => preserve(source),
            S::ApplyRow { source, into, .. } => {
                self.extend(source, vec![(into.inner().clone(), DataType::Unknown)])
            }
            S::ApplyColumn { target, .. } | S::Map { target, .. } | S::MapValues { target, .. } => {
                preserve(&target.source)
            }
            S::Assign { target, value } => {
                let dtype = match value.inner() {
                    Value::Integer(_) | Value::Float(_) => DataType::Numeric,
                    Value::String(_) => DataType::String,
                    Value::Boolean(_) => DataType::Boolean,
                    _ => DataType::Unknown,
                };
                self.extend(target.source(), vec![(target.column().to_string(), dtype)])
            }

            // Column transforms
            S::Round { target, .. }
            | S::Abs(target)
            | S::Sqrt(target)
            | S::Power { target, .. }
            | S::Log { target, .. }
            | S::Ceil(target)
            | S::Floor(target)
            | S::Upper(target)
            | S::Lower(target)
            | S::Strip(target)
            | S::Lstrip { target, .. }
            | S::Rstrip { target, .. }
            | S::Title(target)
            | S::Capitalize(target)
            | S::Replace { target, .. }
            | S::DateAdd(DateOffset { target, .. })
            | S::DateSubtract(DateOffset { target, .. })
            | S::StandardScale(target)
            | S::MinmaxScale(target)
            | S::RobustScale(target)
            | S::MaxabsScale(target)
            | S::FillMean(target)
            | S::FillMedian(target)
            | S::FillMode(target) => preserve(&target.source),
            S::ParseDatetime { target, .. } => self.retype(target, DataType::Datetime),
            S::Astype { target, dtype } => {
                self.retype(target, DataType::from_runtime_dtype(dtype.inner()))
            }
            S::ToNumeric { target, .. }
            | S::LabelEncode(target)
            | S::OrdinalEncode { target, .. } => self.retype(target, DataType::Numeric),
            S::Normalize { source, .. }
            | S::FillForward { source, .. }
            | S::FillBackward { source, .. }
            | S::Interpolate { source, .. }
            | S::Dropna { source, .. }
            | S::Fillna { source, .. }
            | S::DropDuplicates { source, .. } => preserve(source),

            // Derived columns
            S::Concat { source, .. } => {
                self.extend(source, vec![("concatenated".to_string(), DataType::String)])
            }
            S::Substring { target, .. } => self.extend_target(target, "substring", DataType::String),
            S::Length(target) => self.extend_target(target, "length", DataType::Numeric),
            S::ExtractRegex { target, .. } => self.extend_target(target, "extracted", DataType::String),
            S::Find { target, .. } => self.extend_target(target, "find", DataType::Numeric),
            S::FormatDatetime { target, .. } => self.extend_target(target, "formatted", DataType::String),
            S::Extract { target, part } => self.extend_target(target, part.inner(), DataType::Numeric),
            S::ExtractYear(target) => self.extend_target(target, "year", DataType::Numeric),
            S::ExtractMonth(target) => self.extend_target(target, "month", DataType::Numeric),
            S::ExtractDay(target) => self.extend_target(target, "day", DataType::Numeric),
            S::ExtractHour(target) => self.extend_target(target, "hour", DataType::Numeric),
            S::ExtractMinute(target) => self.extend_target(target, "minute", DataType::Numeric),
            S::ExtractSecond(target) => self.extend_target(target, "second", DataType::Numeric),
            S::ExtractDayofweek(target) => self.extend_target(target, "dayofweek", DataType::Numeric),
            S::ExtractDayofyear(target) => self.extend_target(target, "dayofyear", DataType::Numeric),
            S::ExtractWeekofyear(target) => self.extend_target(target, "weekofyear", DataType::Numeric),
            S::ExtractQuarter(target) => self.extend_target(target, "quarter", DataType::Numeric),
            S::DateDiff { source, .. } => {
                self.extend(source, vec![("date_diff".to_string(), DataType::Numeric)])
            }
            S::TargetEncode { target, .. } => self.extend_target(target, "encoded", DataType::Numeric),
            S::Binning { target, .. } => self.extend_target(target, "binned", DataType::Unknown),
            S::Qcut { target, .. } => self.extend_target(target, "qcut", DataType::Unknown),
            S::Cut { target, .. } => self.extend_target(target, "cut", DataType::Unknown),
            S::Rank { target, .. } => self.extend_target(target, "rank", DataType::Numeric),
            S::Isnull(target) => self.extend_target(target, "isnull", DataType::Boolean),
            S::Notnull(target) => self.extend_target(target, "notnull", DataType::Boolean),
            S::Duplicated { source, .. } => {
                self.extend(source, vec![("is_duplicate".to_string(), DataType::Boolean)])
            }

            // Display statements never carry a result alias.
            S::Save { .. }
            | S::ExportPlot { .. }
            | S::Compare(_)
            | S::Describe { .. }
            | S::Summary { .. }
            | S::Info { .. }
            | S::Unique(_)
            | S::ValueCounts { .. }
            | S::Show { .. }
            | S::Outliers { .. }
            | S::Quantile { .. }
            | S::Hypothesis { .. }
            | S::CountNa { .. }
            | S::CountDuplicates { .. }
            | S::AssertUnique(_)
            | S::AssertNoNulls(_)
            | S::AssertRange { .. }
            | S::Any(_)
            | S::All(_)
            | S::CountTrue(_)
            | S::Boxplot { .. }
            | S::Heatmap { .. }
            | S::Pairplot { .. }
            | S::Timeseries { .. }
            | S::Pie { .. } => Effect::Unknown,
        }
    }
}

fn undefined_column(column: &Name, dataset: &DatasetInfo) -> Diagnostic {
    let names = dataset.column_names();
    Diagnostic::semantic(format!(
        "Column '{}' does not exist in dataset '{}'",
        column.inner(),
        dataset.name()
    ))
    .with_code(ErrorCode::E201)
    .with_label(column.span(), "unknown column")
    .with_help(format!("Available columns: {}", names.join(", ")))
    .with_optional_suggestion(suggest::nearest(column.inner(), names))
}
