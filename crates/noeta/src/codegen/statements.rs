//! One template per statement kind.

use noeta_parser::ast::{
    ColumnTarget, DateOffset, Expanding, Expr, FileFormat, FillSpec, Keep, MapSpec, Name, Pair, Rolling,
    Statement, StatementKind, Value, WindowOffset,
};

use super::{
    CodeGenerator, NUMPY, SQLALCHEMY, STATS,
    expr::{self, ExprRenderer, Mode},
    python,
};

fn keep(keep: Keep) -> &'static str {
    match keep {
        Keep::First => "'first'",
        Keep::Last => "'last'",
        Keep::None => "False",
    }
}

/// `subset=[..]`, or `subset=None` for every column.
fn subset(columns: &[Name]) -> String {
    if columns.is_empty() {
        "None".to_string()
    } else {
        python::names(columns)
    }
}

fn select_dtype(type_name: &str) -> &'static str {
    match type_name {
        "numeric" | "number" => "number",
        "int" | "integer" => "int",
        "float" => "float",
        "string" | "str" | "object" => "object",
        "datetime" | "date" => "datetime",
        "bool" | "boolean" => "bool",
        _ => "category",
    }
}

/// Seconds per unit for `date_diff` in anything but days.
fn unit_seconds(unit: &str) -> Option<u32> {
    match unit {
        "seconds" => Some(1),
        "minutes" => Some(60),
        "hours" => Some(3_600),
        "weeks" => Some(604_800),
        _ => None,
    }
}

impl CodeGenerator<'_> {
    pub(super) fn statement(&mut self, statement: &Statement) {
        use StatementKind as S;

        match &statement.kind {
            // I/O
            S::Load {
                format,
                path,
                options,
            } => {
                let reader = match format {
                    FileFormat::Csv => "read_csv",
                    FileFormat::Json => "read_json",
                    FileFormat::Excel => "read_excel",
                    FileFormat::Parquet => "read_parquet",
                };
                let mut args = vec![python::string(path)];
                let options = python::kwargs(&python::with_options(Vec::new(), options));
                if !options.is_empty() {
                    args.push(options);
                }
                let value = format!("pd.{reader}({})", args.join(", "));
                self.bind(statement, value, "Loaded Data", |result| {
                    format!(
                        "f'Loaded {result}: {{len({result})}} rows, {{len({result}.columns)}} columns'"
                    )
                });
            }
            S::LoadSql {
                query,
                connection,
                options,
            } => {
                self.import(SQLALCHEMY);
                self.line(format!("_engine = create_engine({})", python::string(connection)));
                let args = python::with_options(vec![("con".into(), "_engine".into())], options);
                let value = format!("pd.read_sql({}, {})", python::string(query), python::kwargs(&args));
                self.bind(statement, value, "Query Result", |result| {
                    format!("f'Loaded {result}: {{len({result})}} rows from SQL'")
                });
            }
            S::Save {
                source,
                path,
                format,
                options,
            } => {
                let (writer, defaults) = match format {
                    FileFormat::Csv => ("to_csv", vec![("index", "False")]),
                    FileFormat::Json => ("to_json", vec![("orient", "'records'"), ("indent", "2")]),
                    FileFormat::Excel => ("to_excel", vec![("index", "False")]),
                    FileFormat::Parquet => ("to_parquet", vec![("index", "False")]),
                };
                let defaults = defaults
                    .into_iter()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect();
                let args = python::with_options(defaults, options);
                self.line(format!(
                    "{source}.{writer}({}, {})",
                    python::string(path),
                    python::kwargs(&args)
                ));
                self.line(format!("print('Saved {source} to', {})", python::string(path)));
            }
            S::ExportPlot {
                path,
                width,
                height,
            } => {
                self.import(super::PYPLOT);
                if let (Some(width), Some(height)) = (width, height) {
                    self.line(format!(
                        "plt.gcf().set_size_inches({} / 100, {} / 100)",
                        python::float(*width),
                        python::float(*height)
                    ));
                }
                self.line(format!(
                    "plt.savefig({}, dpi=100, bbox_inches='tight')",
                    python::string(path)
                ));
                self.line(format!("print('Exported plot to', {})", python::string(path)));
            }

            // Selection
            S::Select { source, columns } => {
                let value = format!("{source}[{}].copy()", python::names(columns));
                self.bind(statement, value, "Selected Columns", |result| {
                    format!("f'Selected {{len({result}.columns)}} columns from {source}'")
                });
            }
            S::SelectByType { source, dtype } => {
                let value = format!(
                    "{source}.select_dtypes(include={})",
                    python::string(select_dtype(dtype))
                );
                self.bind(statement, value, "Selected Columns", |result| {
                    format!("f'Selected {{len({result}.columns)}} {dtype} columns from {source}'")
                });
            }
            S::Head { source, n } => {
                self.bind_rows(statement, format!("{source}.head({n})"), "First Rows", "Took head of");
            }
            S::Tail { source, n } => {
                self.bind_rows(statement, format!("{source}.tail({n})"), "Last Rows", "Took tail of");
            }
            S::Iloc {
                source,
                rows,
                columns,
            } => {
                let value = match columns {
                    Some(columns) => format!(
                        "{source}.iloc[{}, {}]",
                        python::position(rows),
                        python::position(columns)
                    ),
                    None => format!("{source}.iloc[{}]", python::position(rows)),
                };
                self.bind_rows(statement, value, "Selected Rows", "Selected rows by position from");
            }
            S::Loc {
                source,
                rows,
                columns,
            } => {
                let value = if columns.is_empty() {
                    format!("{source}.loc[{}]", python::value(rows))
                } else {
                    format!(
                        "{source}.loc[{}, {}]",
                        python::value(rows),
                        python::names(columns)
                    )
                };
                self.bind_rows(statement, value, "Selected Rows", "Selected rows by label from");
            }
            S::Rename { source, mapping } => {
                let mapping = python::dict(
                    mapping
                        .iter()
                        .map(|(old, new)| (python::string(old), python::string(new))),
                );
                let value = format!("{source}.rename(columns={mapping})");
                self.bind(statement, value, "Renamed Columns", |result| {
                    format!("f'Renamed columns of {source}: {{list({result}.columns)}}'")
                });
            }
            S::Reorder { source, order } => {
                let value = format!("{source}[{}].copy()", python::names(order));
                self.bind(statement, value, "Reordered Columns", |result| {
                    format!("f'Reordered columns of {source}: {{list({result}.columns)}}'")
                });
            }

            // Filtering
            S::Filter { source, condition } => {
                let mask = expr::condition(source, condition);
                self.filter(statement, source, mask);
            }
            S::FilterBetween { target, min, max } => {
                let mask = format!(
                    "{}.between({}, {})",
                    column(target),
                    python::value(min),
                    python::value(max)
                );
                self.filter(statement, &target.source, mask);
            }
            S::FilterIsin { target, values } => {
                let mask = format!("{}.isin({})", column(target), python::values(values));
                self.filter(statement, &target.source, mask);
            }
            S::FilterContains { target, pattern } => {
                let mask = format!(
                    "{}.str.contains({}, regex=False, na=False)",
                    column(target),
                    python::string(pattern)
                );
                self.filter(statement, &target.source, mask);
            }
            S::FilterStartswith { target, pattern } => {
                let mask = format!(
                    "{}.str.startswith({}, na=False)",
                    column(target),
                    python::string(pattern)
                );
                self.filter(statement, &target.source, mask);
            }
            S::FilterEndswith { target, pattern } => {
                let mask = format!(
                    "{}.str.endswith({}, na=False)",
                    column(target),
                    python::string(pattern)
                );
                self.filter(statement, &target.source, mask);
            }
            S::FilterRegex { target, pattern } => {
                let mask = format!(
                    "{}.str.contains({}, regex=True, na=False)",
                    column(target),
                    python::string(pattern)
                );
                self.filter(statement, &target.source, mask);
            }
            S::FilterNull(target) => {
                let mask = format!("{}.isna()", column(target));
                self.filter(statement, &target.source, mask);
            }
            S::FilterNotnull(target) => {
                let mask = format!("{}.notna()", column(target));
                self.filter(statement, &target.source, mask);
            }
            S::FilterDuplicates {
                source,
                subset: columns,
                keep: which,
            } => {
                let mask = format!(
                    "{source}.duplicated(subset={}, keep={})",
                    subset(columns),
                    keep(*which)
                );
                self.filter(statement, source, mask);
            }
            S::Sort { source, keys } => {
                let by = python::list(keys.iter().map(|key| python::string(&key.column)));
                let ascending = python::list(
                    keys.iter()
                        .map(|key| python::boolean(!key.descending).to_string()),
                );
                let value = format!("{source}.sort_values(by={by}, ascending={ascending})");
                let columns = keys
                    .iter()
                    .map(|key| key.column.inner().as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                self.bind(statement, value, "Sorted Result", |_| {
                    python::string(&format!("Sorted {source} by {columns}"))
                });
            }
            S::Sample { source, n, random } => {
                let value = if *random {
                    format!("{source}.sample(n={n}, random_state=42)")
                } else {
                    format!("{source}.head({n})")
                };
                self.bind_rows(statement, value, "Sampled Rows", "Sampled");
            }

            // Combining
            S::Join { pair, on } => {
                let value = format!(
                    "pd.merge({}, {}, on={}, how='inner')",
                    pair.left,
                    pair.right,
                    python::string(on)
                );
                self.bind_pair(statement, pair, value, "Joined Result", "Joined");
            }
            S::Merge {
                pair,
                on,
                how,
                left_on,
                right_on,
                suffixes,
            } => {
                let mut args = vec![("how".to_string(), python::string(how))];
                if let Some(on) = on {
                    args.push(("on".into(), python::string(on)));
                }
                if let Some(left_on) = left_on {
                    args.push(("left_on".into(), python::string(left_on)));
                }
                if let Some(right_on) = right_on {
                    args.push(("right_on".into(), python::string(right_on)));
                }
                if let Some((left, right)) = suffixes {
                    args.push((
                        "suffixes".into(),
                        format!("({}, {})", python::string(left), python::string(right)),
                    ));
                }
                let value = format!(
                    "pd.merge({}, {}, {})",
                    pair.left,
                    pair.right,
                    python::kwargs(&args)
                );
                self.bind_pair(statement, pair, value, "Merged Result", "Merged");
            }
            S::ConcatVertical {
                sources,
                ignore_index,
            } => {
                let frames = join_names(sources);
                let value = format!(
                    "pd.concat([{frames}], axis=0, ignore_index={})",
                    python::boolean(*ignore_index)
                );
                self.bind(statement, value, "Concatenated Result", |result| {
                    format!("f'Stacked {frames}: {{len({result})}} rows'")
                });
            }
            S::ConcatHorizontal { sources } => {
                let frames = join_names(sources);
                let value = format!("pd.concat([{frames}], axis=1)");
                self.bind(statement, value, "Concatenated Result", |result| {
                    format!("f'Placed side by side {frames}: {{len({result}.columns)}} columns'")
                });
            }
            S::Union(pair) => {
                let value = format!(
                    "pd.concat([{}, {}]).drop_duplicates().reset_index(drop=True)",
                    pair.left, pair.right
                );
                self.bind_pair(statement, pair, value, "Union Result", "Union of");
            }
            S::Intersection(pair) => {
                let value = format!("pd.merge({}, {}, how='inner')", pair.left, pair.right);
                self.bind_pair(statement, pair, value, "Intersection Result", "Intersection of");
            }
            S::Difference(pair) => {
                let value = format!(
                    "{}.merge({}, how='left', indicator=True).query(\"_merge == 'left_only'\").drop(columns='_merge')",
                    pair.left, pair.right
                );
                self.bind_pair(statement, pair, value, "Difference Result", "Difference of");
            }
            S::Compare(pair) => {
                self.show(
                    format!("Comparison of {} and {}", pair.left, pair.right),
                    format!("{}.compare({})", pair.left, pair.right),
                );
            }

            // Grouping and windows
            S::Groupby {
                source,
                by,
                aggregations,
            } => {
                let grouped = format!("{source}.groupby({})", python::names(by));
                let value = if aggregations.is_empty() {
                    format!("{grouped}.size().reset_index(name='count')")
                } else {
                    let named = python::dict(aggregations.iter().map(|aggregation| {
                        let function = aggregation.function.inner();
                        (
                            python::string(&format!("{}_{function}", aggregation.column)),
                            format!(
                                "({}, {})",
                                python::string(&aggregation.column),
                                python::string(function)
                            ),
                        )
                    }));
                    format!("{grouped}.agg(**{named}).reset_index()")
                };
                let keys = by
                    .iter()
                    .map(|name| name.inner().as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                self.bind(statement, value, "Grouped Result", |result| {
                    let text = python::fstring_text(&format!("Grouped {source} by {keys}:"));
                    format!("f'{text} {{len({result})}} groups'")
                });
            }
            S::FilterGroups {
                source,
                by,
                condition,
            } => {
                let mut renderer = ExprRenderer::new(Mode::Group);
                let predicate = renderer.render(condition);
                self.needs_numpy(&renderer);
                let value = format!(
                    "{source}.groupby({}).filter(lambda g: {predicate})",
                    python::names(by)
                );
                self.bind_rows(statement, value, "Filtered Groups", "Kept groups of");
            }
            S::GroupTransform {
                target,
                by,
                function,
            } => {
                let value = format!(
                    "{}.groupby({})[{}].transform({})",
                    target.source,
                    python::names(by),
                    python::string(target.column()),
                    python::string(function)
                );
                self.derive_column(statement, target, function, value);
            }
            S::WindowRank {
                target,
                by,
                method,
                ascending,
            } => {
                let value = format!(
                    "{}.rank(method={}, ascending={})",
                    grouped_column(target, by),
                    python::string(method),
                    python::boolean(*ascending)
                );
                self.derive_column(statement, target, "rank", value);
            }
            S::WindowLag(offset) => self.window_offset(statement, offset, "lag", offset.periods),
            S::WindowLead(offset) => self.window_offset(statement, offset, "lead", -offset.periods),
            S::RollingMean(rolling) => self.rolling(statement, rolling, "mean"),
            S::RollingSum(rolling) => self.rolling(statement, rolling, "sum"),
            S::RollingStd(rolling) => self.rolling(statement, rolling, "std"),
            S::RollingMin(rolling) => self.rolling(statement, rolling, "min"),
            S::RollingMax(rolling) => self.rolling(statement, rolling, "max"),
            S::RollingApply { rolling, function } => self.rolling(statement, rolling, function),
            S::ExpandingMean(expanding) => self.expanding(statement, expanding, "mean"),
            S::ExpandingSum(expanding) => self.expanding(statement, expanding, "sum"),
            S::ExpandingMin(expanding) => self.expanding(statement, expanding, "min"),
            S::ExpandingMax(expanding) => self.expanding(statement, expanding, "max"),
            S::Resample {
                target,
                rule,
                aggfunc,
            } => {
                let value = format!(
                    "{}.resample({}, on={}).agg({}).reset_index()",
                    target.source,
                    python::string(rule),
                    python::string(target.column()),
                    python::string(aggfunc)
                );
                self.bind_rows(statement, value, "Resampled Result", "Resampled");
            }
            S::Cumsum(target) => self.derive_column(statement, target, "cumsum", format!("{}.cumsum()", column(target))),
            S::Cummax(target) => self.derive_column(statement, target, "cummax", format!("{}.cummax()", column(target))),
            S::Cummin(target) => self.derive_column(statement, target, "cummin", format!("{}.cummin()", column(target))),
            S::Cumprod(target) => self.derive_column(statement, target, "cumprod", format!("{}.cumprod()", column(target))),
            S::PctChange { target, periods } => {
                let value = format!("{}.pct_change(periods={periods})", column(target));
                self.derive_column(statement, target, "pct_change", value);
            }
            S::Diff { target, periods } => {
                let value = format!("{}.diff(periods={periods})", column(target));
                self.derive_column(statement, target, "diff", value);
            }
            S::Shift {
                target,
                periods,
                fill_value,
            } => {
                let value = match fill_value {
                    Some(fill) => format!(
                        "{}.shift(periods={periods}, fill_value={})",
                        column(target),
                        python::value(fill)
                    ),
                    None => format!("{}.shift(periods={periods})", column(target)),
                };
                self.derive_column(statement, target, "shifted", value);
            }

            // Reshaping
            S::Pivot {
                source,
                index,
                columns,
                values,
            } => {
                let value = format!(
                    "{source}.pivot(index={}, columns={}, values={})",
                    python::string(index),
                    python::string(columns),
                    python::string(values)
                );
                self.bind_shape(statement, value, "Pivoted Result", "Pivoted");
            }
            S::PivotTable {
                source,
                index,
                columns,
                values,
                aggfunc,
                fill_value,
            } => {
                let mut args = vec![
                    ("index".to_string(), python::string(index)),
                    ("columns".to_string(), python::string(columns)),
                    ("values".to_string(), python::string(values)),
                    ("aggfunc".to_string(), python::string(aggfunc)),
                ];
                if let Some(fill) = fill_value {
                    args.push(("fill_value".into(), python::value(fill)));
                }
                let value = format!("pd.pivot_table({source}, {})", python::kwargs(&args));
                self.bind_shape(statement, value, "Pivot Table", "Pivoted");
            }
            S::Melt {
                source,
                id_vars,
                value_vars,
                var_name,
                value_name,
            } => {
                let mut args = vec![("id_vars".to_string(), python::names(id_vars))];
                if !value_vars.is_empty() {
                    args.push(("value_vars".into(), python::names(value_vars)));
                }
                args.push(("var_name".into(), python::string(var_name)));
                args.push(("value_name".into(), python::string(value_name)));
                let value = format!("{source}.melt({})", python::kwargs(&args));
                self.bind_shape(statement, value, "Melted Result", "Melted");
            }
            S::Stack { source, level } => {
                let value = format!("{source}.stack(level={level})");
                self.bind_shape(statement, value, "Stacked Result", "Stacked");
            }
            S::Unstack {
                source,
                level,
                fill_value,
            } => {
                let value = match fill_value {
                    Some(fill) => format!(
                        "{source}.unstack(level={level}, fill_value={})",
                        python::value(fill)
                    ),
                    None => format!("{source}.unstack(level={level})"),
                };
                self.bind_shape(statement, value, "Unstacked Result", "Unstacked");
            }
            S::Transpose { source } => {
                self.bind_shape(statement, format!("{source}.T"), "Transposed Result", "Transposed");
            }
            S::Crosstab {
                source,
                rows,
                columns,
                values,
                aggfunc,
            } => {
                let mut args = vec![
                    python::column(source, rows),
                    python::column(source, columns),
                ];
                if let Some(values) = values {
                    args.push(format!("values={}", python::column(source, values)));
                    args.push(format!("aggfunc={}", python::string(aggfunc)));
                }
                let value = format!("pd.crosstab({})", args.join(", "));
                self.bind_shape(statement, value, "Cross Tabulation", "Cross-tabulated");
            }
            S::OneHotEncode(target) => {
                let value = format!(
                    "pd.get_dummies({}, columns=[{}], prefix={})",
                    target.source,
                    python::string(target.column()),
                    python::string(target.column())
                );
                self.bind_shape(statement, value, "One-Hot Encoded Result", "Encoded");
            }
            S::Split { target, delimiter } => {
                let value = format!(
                    "{}.join({}.str.split({}, expand=True).add_prefix({}))",
                    target.source,
                    column(target),
                    python::string(delimiter),
                    python::string(&format!("{}_", target.column()))
                );
                self.bind_shape(statement, value, "Split Result", "Split");
            }

            // Index
            S::SetIndex { target, drop } => {
                let value = format!(
                    "{}.set_index({}, drop={})",
                    target.source,
                    python::string(target.column()),
                    python::boolean(*drop)
                );
                self.bind_rows(statement, value, "Indexed Result", "Set index of");
            }
            S::ResetIndex { source, drop } => {
                let value = format!("{source}.reset_index(drop={})", python::boolean(*drop));
                self.bind_rows(statement, value, "Reset Index Result", "Reset index of");
            }
            S::SortIndex { source, ascending } => {
                let value = format!("{source}.sort_index(ascending={})", python::boolean(*ascending));
                self.bind_rows(statement, value, "Sorted By Index", "Sorted index of");
            }
            S::Reindex { source, index } => {
                let value = format!("{source}.reindex({})", python::values(index));
                self.bind_rows(statement, value, "Reindexed Result", "Reindexed");
            }
            S::SetMultiindex { source, columns } => {
                let value = format!("{source}.set_index({})", python::names(columns));
                self.bind_rows(statement, value, "Indexed Result", "Set multi-index of");
            }

            // Apply, map, mutate
            S::Mutate {
                source,
                assignments,
            } => {
                let mut renderer = ExprRenderer::new(Mode::Vectorised { frame: "df" });
                let columns = python::dict(assignments.iter().map(|assignment| {
                    (
                        python::string(&assignment.column),
                        format!("lambda df: {}", renderer.render(&assignment.expr)),
                    )
                }));
                self.needs_numpy(&renderer);
                let value = format!("{source}.assign(**{columns})");
                let count = assignments.len();
                self.bind(statement, value, "Mutated Result", |result| {
                    format!("'Added or updated {count} columns in {result}'")
                });
            }
            S::Apply {
                source,
                columns,
                transform,
            } => {
                let function = self.element_lambda(transform);
                if columns.is_empty() {
                    let value = format!("{source}.map({function})");
                    self.bind_rows(statement, value, "Applied Result", "Applied transform to");
                } else {
                    let updates = python::dict(columns.iter().map(|name| {
                        (
                            python::string(name),
                            format!("{}.apply({function})", python::column(source, name)),
                        )
                    }));
                    let value = format!("{source}.assign(**{updates})");
                    self.bind_rows(statement, value, "Applied Result", "Applied transform to");
                }
            }
            S::ApplyRow {
                source,
                transform,
                into,
            } => {
                let mut renderer = ExprRenderer::new(Mode::Row);
                let body = renderer.render(transform);
                self.needs_numpy(&renderer);
                let value = format!("{source}.apply(lambda row: {body}, axis=1)");
                self.assign_column(statement, source, into, value, &format!("Added {into}"));
            }
            S::ApplyColumn { target, transform } => {
                let function = self.element_lambda(transform);
                let value = format!("{}.apply({function})", column(target));
                self.replace_column(statement, target, value, "Applied transform to");
            }
            S::Applymap { source, transform } => {
                let function = self.element_lambda(transform);
                self.bind_rows(statement, format!("{source}.map({function})"), "Applied Result", "Applied transform to");
            }
            S::Map { target, spec } => {
                let value = match spec {
                    MapSpec::Transform(transform) => {
                        let function = self.element_lambda(transform);
                        format!("{}.map({function})", column(target))
                    }
                    MapSpec::Mapping(pairs) => {
                        format!("{}.map({})", column(target), python::mapping(pairs))
                    }
                };
                self.replace_column(statement, target, value, "Mapped");
            }
            S::MapValues { target, mapping } => {
                let value = format!("{}.replace({})", column(target), python::mapping(mapping));
                self.replace_column(statement, target, value, "Mapped values of");
            }
            S::Assign { target, value } => {
                self.replace_column(statement, target, python::value(value), "Assigned");
            }

            // Math transforms
            S::Round { target, decimals } => {
                let value = format!("{}.round({decimals})", column(target));
                self.replace_column(statement, target, value, "Rounded");
            }
            S::Abs(target) => {
                self.replace_column(statement, target, format!("{}.abs()", column(target)), "Took absolute value of");
            }
            S::Sqrt(target) => self.numpy_column(statement, target, "sqrt", "Took square root of"),
            S::Power { target, exponent } => {
                self.import(NUMPY);
                let value = format!("np.power({}, {})", column(target), python::float(*exponent));
                self.replace_column(statement, target, value, "Raised");
            }
            S::Log { target, base } => {
                self.import(NUMPY);
                let series = column(target);
                let value = match base {
                    None => format!("np.log({series})"),
                    Some(base) if *base == 10.0 => format!("np.log10({series})"),
                    Some(base) if *base == 2.0 => format!("np.log2({series})"),
                    Some(base) => format!("np.log({series}) / np.log({})", python::float(*base)),
                };
                self.replace_column(statement, target, value, "Took logarithm of");
            }
            S::Ceil(target) => self.numpy_column(statement, target, "ceil", "Took ceiling of"),
            S::Floor(target) => self.numpy_column(statement, target, "floor", "Took floor of"),

            // String transforms
            S::Upper(target) => self.string_method(statement, target, "upper()", "Uppercased"),
            S::Lower(target) => self.string_method(statement, target, "lower()", "Lowercased"),
            S::Strip(target) => self.string_method(statement, target, "strip()", "Stripped"),
            S::Lstrip { target, chars } => {
                let call = format!("lstrip({})", chars.as_ref().map(|c| python::string(c)).unwrap_or_default());
                self.string_method(statement, target, &call, "Stripped");
            }
            S::Rstrip { target, chars } => {
                let call = format!("rstrip({})", chars.as_ref().map(|c| python::string(c)).unwrap_or_default());
                self.string_method(statement, target, &call, "Stripped");
            }
            S::Title(target) => self.string_method(statement, target, "title()", "Title-cased"),
            S::Capitalize(target) => self.string_method(statement, target, "capitalize()", "Capitalized"),
            S::Replace { target, old, new } => {
                let value = match (old.inner(), new.inner()) {
                    (Value::String(_), Value::String(_)) => format!(
                        "{}.str.replace({}, {}, regex=False)",
                        column(target),
                        python::value(old),
                        python::value(new)
                    ),
                    _ => format!(
                        "{}.replace({}, {})",
                        column(target),
                        python::value(old),
                        python::value(new)
                    ),
                };
                self.replace_column(statement, target, value, "Replaced values in");
            }

            // Datetime transforms
            S::ParseDatetime { target, format } => {
                let value = match format {
                    Some(format) => format!(
                        "pd.to_datetime({}, format={})",
                        column(target),
                        python::string(format)
                    ),
                    None => format!("pd.to_datetime({})", column(target)),
                };
                self.replace_column(statement, target, value, "Parsed dates in");
            }
            S::DateAdd(offset) => self.date_offset(statement, offset, "+", "Shifted dates in"),
            S::DateSubtract(offset) => self.date_offset(statement, offset, "-", "Shifted dates in"),

            // Type transforms
            S::Astype { target, dtype } => {
                let value = format!("{}.astype({})", column(target), python::string(dtype));
                self.replace_column(statement, target, value, "Converted");
            }
            S::ToNumeric { target, errors } => {
                let value = format!(
                    "pd.to_numeric({}, errors={})",
                    column(target),
                    python::string(errors)
                );
                self.replace_column(statement, target, value, "Converted");
            }
            S::LabelEncode(target) => {
                let value = format!("{}.astype('category').cat.codes", column(target));
                self.replace_column(statement, target, value, "Label-encoded");
            }
            S::OrdinalEncode { target, order } => {
                let codes = python::dict(
                    order
                        .iter()
                        .enumerate()
                        .map(|(code, item)| (python::value(item), code.to_string())),
                );
                let value = format!("{}.map({codes})", column(target));
                self.replace_column(statement, target, value, "Ordinal-encoded");
            }

            // Scaling
            S::StandardScale(target) => {
                let value = scaled(&column(target), "zscore");
                self.replace_column(statement, target, value, "Standardized");
            }
            S::MinmaxScale(target) => {
                let value = scaled(&column(target), "minmax");
                self.replace_column(statement, target, value, "Min-max scaled");
            }
            S::RobustScale(target) => {
                let value = scaled(&column(target), "robust");
                self.replace_column(statement, target, value, "Robust scaled");
            }
            S::MaxabsScale(target) => {
                let value = scaled(&column(target), "maxabs");
                self.replace_column(statement, target, value, "Max-abs scaled");
            }
            S::Normalize {
                source,
                columns,
                method,
            } => {
                let updates = python::dict(columns.iter().map(|name| {
                    (python::string(name), scaled(&python::column(source, name), method))
                }));
                let value = format!("{source}.assign(**{updates})");
                let count = columns.len();
                self.bind(statement, value, "Normalized Result", |result| {
                    format!("'Normalized {count} columns with {method} in {result}'")
                });
            }

            // Missing data
            S::FillForward { source, column } => {
                self.fill_whole_or_column(statement, source, column.as_ref(), "ffill()", "Forward filled")
            }
            S::FillBackward { source, column } => {
                self.fill_whole_or_column(statement, source, column.as_ref(), "bfill()", "Backward filled")
            }
            S::FillMean(target) => {
                let series = column(target);
                let value = format!("{series}.fillna({series}.mean())");
                self.replace_column(statement, target, value, "Filled missing values of");
            }
            S::FillMedian(target) => {
                let series = column(target);
                let value = format!("{series}.fillna({series}.median())");
                self.replace_column(statement, target, value, "Filled missing values of");
            }
            S::FillMode(target) => {
                let series = column(target);
                let value = format!("{series}.fillna({series}.mode().iloc[0])");
                self.replace_column(statement, target, value, "Filled missing values of");
            }
            S::Interpolate {
                source,
                column,
                method,
            } => {
                let call = format!("interpolate(method={})", python::string(method));
                self.fill_whole_or_column(statement, source, column.as_ref(), &call, "Interpolated");
            }
            S::Dropna { source, columns } => {
                let value = if columns.is_empty() {
                    format!("{source}.dropna()")
                } else {
                    format!("{source}.dropna(subset={})", python::names(columns))
                };
                self.bind_rows(statement, value, "Rows Without Missing Values", "Dropped missing rows from");
            }
            S::Fillna {
                source,
                column,
                fill,
            } => {
                let call = match fill {
                    FillSpec::Value(value) => format!("fillna({})", python::value(value)),
                    FillSpec::Method(method) => match method.inner().as_str() {
                        "bfill" | "backward" => "bfill()".to_string(),
                        _ => "ffill()".to_string(),
                    },
                };
                self.fill_whole_or_column(statement, source, column.as_ref(), &call, "Filled missing values in");
            }
            S::DropDuplicates {
                source,
                subset: columns,
                keep: which,
            } => {
                let value = format!(
                    "{source}.drop_duplicates(subset={}, keep={})",
                    subset(columns),
                    keep(*which)
                );
                self.bind_rows(statement, value, "Deduplicated Result", "Dropped duplicates from");
            }

            // Derived columns
            S::Concat {
                source,
                columns,
                separator,
            } => {
                let value = format!(
                    "{source}[{}].astype(str).agg({}.join, axis=1)",
                    python::names(columns),
                    python::string(separator)
                );
                self.assign_column(statement, source, "concatenated", value, "Added concatenated");
            }
            S::Substring { target, start, end } => {
                let end = end.map(|end| end.to_string()).unwrap_or_default();
                let value = format!("{}.str[{start}:{end}]", column(target));
                self.derive_column(statement, target, "substring", value);
            }
            S::Length(target) => {
                self.derive_column(statement, target, "length", format!("{}.str.len()", column(target)));
            }
            S::ExtractRegex {
                target,
                pattern,
                group,
            } => {
                let value = format!(
                    "{}.str.extract({}, expand=True)[{group}]",
                    column(target),
                    python::string(pattern)
                );
                self.derive_column(statement, target, "extracted", value);
            }
            S::Find { target, substring } => {
                let value = format!("{}.str.find({})", column(target), python::string(substring));
                self.derive_column(statement, target, "find", value);
            }
            S::FormatDatetime { target, format } => {
                let value = format!(
                    "pd.to_datetime({}).dt.strftime({})",
                    column(target),
                    python::string(format)
                );
                self.derive_column(statement, target, "formatted", value);
            }
            S::Extract { target, part } => self.date_part(statement, target, part),
            S::ExtractYear(target) => self.date_part(statement, target, "year"),
            S::ExtractMonth(target) => self.date_part(statement, target, "month"),
            S::ExtractDay(target) => self.date_part(statement, target, "day"),
            S::ExtractHour(target) => self.date_part(statement, target, "hour"),
            S::ExtractMinute(target) => self.date_part(statement, target, "minute"),
            S::ExtractSecond(target) => self.date_part(statement, target, "second"),
            S::ExtractDayofweek(target) => self.date_part(statement, target, "dayofweek"),
            S::ExtractDayofyear(target) => self.date_part(statement, target, "dayofyear"),
            S::ExtractWeekofyear(target) => self.date_part(statement, target, "weekofyear"),
            S::ExtractQuarter(target) => self.date_part(statement, target, "quarter"),
            S::DateDiff {
                source,
                start,
                end,
                unit,
            } => {
                let delta = format!(
                    "(pd.to_datetime({}) - pd.to_datetime({}))",
                    python::column(source, end),
                    python::column(source, start)
                );
                let value = match unit_seconds(unit) {
                    Some(seconds) => format!("{delta}.dt.total_seconds() / {seconds}"),
                    None => format!("{delta}.dt.days"),
                };
                self.assign_column(statement, source, "date_diff", value, "Added date_diff");
            }
            S::TargetEncode {
                target,
                target_column,
            } => {
                let value = format!(
                    "{}.groupby({})[{}].transform('mean')",
                    target.source,
                    python::string(target.column()),
                    python::string(target_column)
                );
                self.derive_column(statement, target, "encoded", value);
            }
            S::Binning { target, bins } => {
                let value = format!("pd.cut({}, bins={bins})", column(target));
                self.derive_column(statement, target, "binned", value);
            }
            S::Qcut { target, q, labels } => {
                let value = if labels.is_empty() {
                    format!("pd.qcut({}, q={q})", column(target))
                } else {
                    format!(
                        "pd.qcut({}, q={q}, labels={})",
                        column(target),
                        python::values(labels)
                    )
                };
                self.derive_column(statement, target, "qcut", value);
            }
            S::Cut {
                target,
                bins,
                labels,
                include_lowest,
            } => {
                let mut args = vec![column(target), format!("bins={}", python::value(bins))];
                if !labels.is_empty() {
                    args.push(format!("labels={}", python::values(labels)));
                }
                if *include_lowest {
                    args.push("include_lowest=True".to_string());
                }
                let value = format!("pd.cut({})", args.join(", "));
                self.derive_column(statement, target, "cut", value);
            }
            S::Rank {
                target,
                method,
                ascending,
                pct,
            } => {
                let value = format!(
                    "{}.rank(method={}, ascending={}, pct={})",
                    column(target),
                    python::string(method),
                    python::boolean(*ascending),
                    python::boolean(*pct)
                );
                self.derive_column(statement, target, "rank", value);
            }
            S::Isnull(target) => {
                self.derive_column(statement, target, "isnull", format!("{}.isna()", column(target)));
            }
            S::Notnull(target) => {
                self.derive_column(statement, target, "notnull", format!("{}.notna()", column(target)));
            }
            S::Duplicated {
                source,
                columns,
                keep: which,
            } => {
                let value = format!(
                    "{source}.duplicated(subset={}, keep={})",
                    subset(columns),
                    keep(*which)
                );
                self.assign_column(statement, source, "is_duplicate", value, "Added is_duplicate");
            }

            // Display
            S::Describe { source, columns } => {
                if columns.is_empty() {
                    self.show(format!("Descriptive Statistics for {source}"), format!("{source}.describe()"));
                } else {
                    self.show(
                        format!("Descriptive Statistics for {source}"),
                        format!("{source}[{}].describe()", python::names(columns)),
                    );
                }
            }
            S::Summary { source } => {
                self.line(format!("print('\\nDataset Summary for {source}:')"));
                self.line(format!("print(f'Shape: {{{source}.shape}}')"));
                self.line(format!("print(f'Columns: {{list({source}.columns)}}')"));
                self.show("Data types", format!("{source}.dtypes"));
                self.show("Missing values", format!("{source}.isna().sum()"));
            }
            S::Info { source } => {
                self.line(format!("print('\\nDataset Info for {source}:')"));
                self.line(format!("{source}.info()"));
            }
            S::Unique(target) => {
                self.line(format!("_unique = {}.unique()", column(target)));
                self.show(format!("Unique values in {}", target.column()), "_unique");
                self.line("print(f'Count: {len(_unique)}')");
            }
            S::ValueCounts {
                target,
                normalize,
                ascending,
            } => {
                self.show(
                    format!("Value counts for {}", target.column()),
                    format!(
                        "{}.value_counts(normalize={}, ascending={})",
                        column(target),
                        python::boolean(*normalize),
                        python::boolean(*ascending)
                    ),
                );
            }
            S::Show { source, n } => match n {
                Some(n) => self.show(format!("{source} (first {n} rows)"), format!("{source}.head({n})")),
                None => self.show(source.inner(), source.inner().clone()),
            },
            S::Outliers {
                source,
                columns,
                method,
            } => self.outliers(source, columns, method),
            S::Quantile { target, q } => {
                self.line(format!(
                    "_quantile = {}.quantile({})",
                    column(target),
                    python::float(*q)
                ));
                let text = python::fstring_text(&format!("{q} quantile of {}:", target.column()));
                self.line(format!("print(f'{text} {{_quantile:.4f}}')"));
            }
            S::Hypothesis {
                pair,
                columns,
                test,
            } => self.hypothesis(pair, columns, test),
            S::CountNa { source } => {
                self.show(format!("Missing values per column in {source}"), format!("{source}.isna().sum()"));
            }
            S::CountDuplicates { source, columns } => {
                let value = if columns.is_empty() {
                    format!("{source}.duplicated().sum()")
                } else {
                    format!("{source}.duplicated(subset={}).sum()", python::names(columns))
                };
                self.line(format!("print('Duplicate rows in {source}:', {value})"));
            }
            S::AssertUnique(target) => {
                let (source, name) = (target.source(), target.column());
                self.line(format!(
                    "assert {}.is_unique, {}",
                    column(target),
                    python::string(&format!("Column {name} in {source} has duplicate values"))
                ));
                self.line(format!(
                    "print({})",
                    python::string(&format!("Assertion passed: {name} is unique"))
                ));
            }
            S::AssertNoNulls(target) => {
                let (source, name) = (target.source(), target.column());
                self.line(format!(
                    "assert {}.notna().all(), {}",
                    column(target),
                    python::string(&format!("Column {name} in {source} has missing values"))
                ));
                self.line(format!(
                    "print({})",
                    python::string(&format!("Assertion passed: {name} has no missing values"))
                ));
            }
            S::AssertRange { target, min, max } => {
                let series = column(target);
                let check = match (min, max) {
                    (Some(min), Some(max)) => format!(
                        "{series}.between({}, {}).all()",
                        python::float(*min),
                        python::float(*max)
                    ),
                    (Some(min), None) => format!("({series} >= {}).all()", python::float(*min)),
                    (None, Some(max)) => format!("({series} <= {}).all()", python::float(*max)),
                    // The parser requires at least one bound.
                    (None, None) => format!("{series}.notna().all()"),
                };
                let name = target.column();
                self.line(format!(
                    "assert {check}, {}",
                    python::string(&format!("Column {name} has values out of range"))
                ));
                self.line(format!(
                    "print({})",
                    python::string(&format!("Assertion passed: {name} is within range"))
                ));
            }
            S::Any(target) => {
                let label = python::string(&format!("Any {}:", target.column()));
                self.line(format!("print({label}, {}.any())", column(target)));
            }
            S::All(target) => {
                let label = python::string(&format!("All {}:", target.column()));
                self.line(format!("print({label}, {}.all())", column(target)));
            }
            S::CountTrue(target) => {
                let label = python::string(&format!("True values in {}:", target.column()));
                self.line(format!("print({label}, int({}.sum()))", column(target)));
            }

            // Visualisation
            S::Boxplot { source, columns, by } => {
                self.plot();
                self.line("plt.figure()");
                match by {
                    Some(by) if columns.len() == 1 => self.line(format!(
                        "{source}.boxplot(column={}, by={})",
                        python::string(&columns[0]),
                        python::string(by)
                    )),
                    _ => self.line(format!("{source}[{}].boxplot()", python::names(columns))),
                }
                self.line("plt.title('Box Plot')");
                self.line("plt.xticks(rotation=45)");
            }
            S::Heatmap { source, columns } => {
                self.plot();
                self.line("plt.figure()");
                self.line(format!(
                    "sns.heatmap({source}[{}].corr(), annot=True, cmap='coolwarm', center=0)",
                    python::names(columns)
                ));
                self.line("plt.title('Correlation Heatmap')");
            }
            S::Pairplot { source, columns } => {
                self.plot();
                self.line(format!("_pairplot = sns.pairplot({source}[{}])", python::names(columns)));
                self.line("_pairplot.fig.suptitle('Pair Plot', y=1.02)");
            }
            S::Timeseries { source, x, y } => {
                self.plot();
                self.line("plt.figure()");
                self.line(format!(
                    "plt.plot({}, {})",
                    python::column(source, x),
                    python::column(source, y)
                ));
                self.line(format!("plt.xlabel({})", python::string(x)));
                self.line(format!("plt.ylabel({})", python::string(y)));
                self.line("plt.title('Time Series Plot')");
                self.line("plt.xticks(rotation=45)");
                self.line("plt.grid(True, alpha=0.3)");
            }
            S::Pie {
                source,
                values,
                labels,
            } => {
                self.plot();
                self.line("plt.figure()");
                self.line(format!(
                    "plt.pie({}, labels={}, autopct='%1.1f%%')",
                    python::column(source, values),
                    python::column(source, labels)
                ));
                self.line("plt.title('Pie Chart')");
            }
        }
    }

    fn filter(&mut self, statement: &Statement, source: &str, mask: String) {
        let value = format!("{source}[{mask}].copy()");
        self.bind(statement, value, "Filtered Result", |result| {
            format!("f'Filtered {source}: {{len({result})}} rows match condition'")
        });
    }

    fn bind_pair(&mut self, statement: &Statement, pair: &Pair, value: String, title: &str, verb: &str) {
        let (left, right) = (pair.left.inner(), pair.right.inner());
        self.bind(statement, value, title, |result| {
            format!("f'{verb} {left} and {right}: {{len({result})}} rows'")
        });
    }

    /// Bind a reshaped table and report its new shape.
    fn bind_shape(&mut self, statement: &Statement, value: String, title: &str, verb: &str) {
        let source = statement
            .sources()
            .first()
            .map(|name| name.inner().clone())
            .unwrap_or_default();
        self.bind(statement, value, title, |result| {
            format!("f'{verb} {source}: shape {{{result}.shape}}'")
        });
    }

    fn needs_numpy(&mut self, renderer: &ExprRenderer<'_>) {
        if renderer.uses_numpy() {
            self.import(NUMPY);
        }
    }

    /// `lambda x: ...` for element-wise transforms.
    fn element_lambda(&mut self, transform: &Expr) -> String {
        let mut renderer = ExprRenderer::new(Mode::Element);
        let body = renderer.render(transform);
        self.needs_numpy(&renderer);
        format!("lambda {}: {body}", expr::element_parameter(transform))
    }

    fn numpy_column(&mut self, statement: &Statement, target: &ColumnTarget, function: &str, verb: &str) {
        self.import(NUMPY);
        let value = format!("np.{function}({})", column(target));
        self.replace_column(statement, target, value, verb);
    }

    fn string_method(&mut self, statement: &Statement, target: &ColumnTarget, call: &str, verb: &str) {
        let value = format!("{}.str.{call}", column(target));
        self.replace_column(statement, target, value, verb);
    }

    fn window_offset(&mut self, statement: &Statement, offset: &WindowOffset, kind: &str, shift: i64) {
        let series = grouped_column(&offset.target, &offset.by);
        let value = match &offset.fill_value {
            Some(fill) => format!("{series}.shift({shift}, fill_value={})", python::value(fill)),
            None => format!("{series}.shift({shift})"),
        };
        let suffix = format!("{kind}{}", offset.periods);
        self.derive_column(statement, &offset.target, &suffix, value);
    }

    fn rolling(&mut self, statement: &Statement, rolling: &Rolling, function: &str) {
        let value = format!(
            "{}.rolling(window={}, min_periods={}).{}",
            column(&rolling.target),
            rolling.window,
            rolling.min_periods,
            window_call(function)
        );
        self.derive_column(statement, &rolling.target, &format!("rolling_{function}"), value);
    }

    fn expanding(&mut self, statement: &Statement, expanding: &Expanding, function: &str) {
        let value = format!(
            "{}.expanding(min_periods={}).{function}()",
            column(&expanding.target),
            expanding.min_periods
        );
        self.derive_column(statement, &expanding.target, &format!("expanding_{function}"), value);
    }

    fn date_offset(&mut self, statement: &Statement, offset: &DateOffset, op: &str, verb: &str) {
        let value = format!(
            "pd.to_datetime({}) {op} pd.Timedelta({}={})",
            column(&offset.target),
            offset.unit,
            offset.value
        );
        self.replace_column(statement, &offset.target, value, verb);
    }

    fn date_part(&mut self, statement: &Statement, target: &ColumnTarget, part: &str) {
        let accessor = match part {
            "weekofyear" => "isocalendar().week".to_string(),
            other => other.to_string(),
        };
        let value = format!("pd.to_datetime({}).dt.{accessor}", column(target));
        self.derive_column(statement, target, part, value);
    }

    /// Apply `call` to one column, or to the whole table when no column is named.
    fn fill_whole_or_column(
        &mut self,
        statement: &Statement,
        source: &Name,
        column: Option<&Name>,
        call: &str,
        verb: &str,
    ) {
        match column {
            Some(column) => {
                let value = format!("{}.{call}", python::column(source, column));
                self.assign_column(statement, source, column, value, &format!("{verb} {column}"));
            }
            None => {
                self.bind_rows(statement, format!("{source}.{call}"), &format!("{verb} Result"), verb);
            }
        }
    }

    fn outliers(&mut self, source: &Name, columns: &[Name], method: &str) {
        let columns = python::names(columns);
        match method {
            "zscore" => {
                self.import(NUMPY);
                self.import(STATS);
                self.line(format!("for _col in {columns}:"));
                self.line(format!(
                    "    _z = np.abs(stats.zscore({source}[_col].dropna()))"
                ));
                self.line("    print(f'Outliers in {_col} (|z| > 3): {int((_z > 3).sum())} values')");
            }
            _ => {
                self.line(format!("for _col in {columns}:"));
                self.line(format!("    _q1 = {source}[_col].quantile(0.25)"));
                self.line(format!("    _q3 = {source}[_col].quantile(0.75)"));
                self.line("    _iqr = _q3 - _q1");
                self.line(format!(
                    "    _outliers = {source}[({source}[_col] < _q1 - 1.5 * _iqr) | ({source}[_col] > _q3 + 1.5 * _iqr)]"
                ));
                self.line("    print(f'Outliers in {_col}: {len(_outliers)} rows')");
            }
        }
    }

    fn hypothesis(&mut self, pair: &Pair, columns: &[Name], test: &str) {
        self.import(STATS);
        let function = match test {
            "mannwhitney" => "mannwhitneyu",
            "ks" => "ks_2samp",
            _ => "ttest_ind",
        };
        for name in columns {
            self.line(format!(
                "_stat, _p_value = stats.{function}({}.dropna(), {}.dropna())",
                python::column(&pair.left, name),
                python::column(&pair.right, name)
            ));
            let text = python::fstring_text(&format!("{test} for {name}:"));
            self.line(format!(
                "print(f'{text} statistic={{_stat:.4f}}, p-value={{_p_value:.4f}}')"
            ));
        }
    }
}

/// `source['column']` for a column target.
fn column(target: &ColumnTarget) -> String {
    python::column(target.source(), target.column())
}

/// The target column, grouped by `by` when any keys are given.
fn grouped_column(target: &ColumnTarget, by: &[Name]) -> String {
    if by.is_empty() {
        column(target)
    } else {
        format!(
            "{}.groupby({})[{}]",
            target.source,
            python::names(by),
            python::string(target.column())
        )
    }
}

fn join_names(names: &[Name]) -> String {
    names
        .iter()
        .map(|name| name.inner().as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Method call on a rolling window; anything but a plain reduction goes
/// through `agg`.
fn window_call(function: &str) -> String {
    match function {
        "mean" | "sum" | "std" | "min" | "max" | "median" | "var" | "count" => format!("{function}()"),
        other => format!("agg({})", python::string(other)),
    }
}

/// Column-wise scaling expression for `series`.
fn scaled(series: &str, method: &str) -> String {
    match method {
        "minmax" => format!("({series} - {series}.min()) / ({series}.max() - {series}.min())"),
        "robust" => format!(
            "({series} - {series}.median()) / ({series}.quantile(0.75) - {series}.quantile(0.25))"
        ),
        "maxabs" => format!("{series} / {series}.abs().max()"),
        _ => format!("({series} - {series}.mean()) / {series}.std()"),
    }
}
