//! Rendering of expressions and conditions as Python.
//!
//! The same [`Expr`] tree renders differently depending on where it ends up:
//!
//! - [`Mode::Vectorised`]: whole-column arithmetic over a frame. Names become
//!   `frame['col']`, logic becomes `& | ~` and conditionals `np.where`.
//! - [`Mode::Element`]: the body of `lambda x: ...` applied per value.
//! - [`Mode::Row`]: the body of `lambda row: ...` applied with `axis=1`.
//! - [`Mode::Group`]: the body of `lambda g: ...` handed to
//!   `groupby(..).filter`; `count` is the group size and aggregate calls
//!   reduce a column of the group.

use noeta_parser::ast::{
    BinaryOp, Condition, ConditionKind, Expr, ExprKind, Literal, MatchKind, UnaryOp,
};

use super::python;

/// How identifiers and operators are spelled.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Mode<'a> {
    Vectorised { frame: &'a str },
    Element,
    Row,
    Group,
}

/// Aggregates that reduce a group column in [`Mode::Group`].
const GROUP_AGGREGATES: &[&str] = &[
    "sum", "mean", "median", "min", "max", "std", "var", "count", "nunique", "first", "last",
];

/// Renders expressions, remembering whether numpy was needed.
#[derive(Debug)]
pub(crate) struct ExprRenderer<'a> {
    mode: Mode<'a>,
    uses_numpy: bool,
}

impl<'a> ExprRenderer<'a> {
    pub(crate) fn new(mode: Mode<'a>) -> Self {
        Self {
            mode,
            uses_numpy: false,
        }
    }

    pub(crate) fn uses_numpy(&self) -> bool {
        self.uses_numpy
    }

    /// Render without redundant outer parentheses.
    pub(crate) fn render(&mut self, expr: &Expr) -> String {
        let rendered = self.node(expr);
        match expr.kind {
            ExprKind::Binary { .. } => strip_parens(rendered),
            _ => rendered,
        }
    }

    fn node(&mut self, expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Literal(literal) => literal_text(literal),
            ExprKind::Identifier(name) => self.identifier(name),
            ExprKind::Unary { op, operand } => {
                let operand = self.node(operand);
                match (op, self.mode) {
                    (UnaryOp::Neg, _) => format!("(-{operand})"),
                    (UnaryOp::Not, Mode::Vectorised { .. }) => format!("(~{operand})"),
                    (UnaryOp::Not, _) => format!("(not {operand})"),
                }
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.node(left);
                let right = self.node(right);
                format!("({left} {} {right})", self.operator(*op))
            }
            ExprKind::Call { function, args } => self.call(function, args),
            ExprKind::Conditional {
                condition,
                then,
                otherwise,
            } => {
                let condition = self.render(condition);
                let then = self.render(then);
                let otherwise = self.render(otherwise);
                match self.mode {
                    Mode::Vectorised { .. } => {
                        self.uses_numpy = true;
                        format!("np.where({condition}, {then}, {otherwise})")
                    }
                    _ => format!("({then} if {condition} else {otherwise})"),
                }
            }
        }
    }

    fn identifier(&self, name: &str) -> String {
        match self.mode {
            Mode::Vectorised { frame } => python::column(frame, name),
            Mode::Element => name.to_string(),
            Mode::Row => python::column("row", name),
            Mode::Group if name == "count" => "len(g)".to_string(),
            Mode::Group => python::column("g", name),
        }
    }

    fn operator(&self, op: BinaryOp) -> &'static str {
        match (op, self.mode) {
            (BinaryOp::And, Mode::Vectorised { .. }) => "&",
            (BinaryOp::Or, Mode::Vectorised { .. }) => "|",
            _ => op.symbol(),
        }
    }

    fn call(&mut self, function: &str, args: &[Expr]) -> String {
        if let Mode::Group = self.mode {
            if let [arg] = args {
                if let ExprKind::Identifier(column) = &arg.kind {
                    if GROUP_AGGREGATES.contains(&function) {
                        return format!("{}.{function}()", python::column("g", column));
                    }
                }
            }
        }

        let rendered: Vec<String> = args.iter().map(|arg| self.render(arg)).collect();
        let joined = rendered.join(", ");

        match self.mode {
            Mode::Vectorised { .. } => match (function, rendered.as_slice()) {
                ("len" | "length", [series]) => format!("{series}.str.len()"),
                ("upper" | "lower" | "strip" | "title" | "capitalize", [series]) => {
                    format!("{series}.str.{function}()")
                }
                ("str", [series]) => format!("{series}.astype(str)"),
                ("int", [series]) => format!("{series}.astype(int)"),
                ("float", [series]) => format!("{series}.astype(float)"),
                ("isnull" | "isna", [series]) => format!("{series}.isna()"),
                ("notnull" | "notna", [series]) => format!("{series}.notna()"),
                ("fillna", [series, fill]) => format!("{series}.fillna({fill})"),
                _ => {
                    self.uses_numpy = true;
                    format!("np.{function}({joined})")
                }
            },
            _ => match (function, rendered.as_slice()) {
                ("upper" | "lower" | "strip" | "title" | "capitalize", [text]) => {
                    format!("str({text}).{function}()")
                }
                ("sqrt" | "log" | "exp" | "log10" | "log2" | "ceil" | "floor", _) => {
                    self.uses_numpy = true;
                    format!("np.{function}({joined})")
                }
                _ => format!("{function}({joined})"),
            },
        }
    }
}

/// The parameter name for an element-wise lambda: the first identifier in
/// the expression, or `x` when there is none.
pub(crate) fn element_parameter(expr: &Expr) -> String {
    expr.identifiers()
        .first()
        .map_or_else(|| "x".to_string(), |name| name.to_string())
}

fn literal_text(literal: &Literal) -> String {
    match literal {
        Literal::Integer(n) => n.to_string(),
        Literal::Float(n) => python::float(*n),
        Literal::String(text) => python::string(text),
        Literal::Boolean(b) => python::boolean(*b).to_string(),
        Literal::Null => "None".to_string(),
    }
}

fn strip_parens(rendered: String) -> String {
    match rendered
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
    {
        Some(inner) => inner.to_string(),
        None => rendered,
    }
}

/// Render a row predicate as a boolean mask over `frame`.
pub(crate) fn condition(frame: &str, condition: &Condition) -> String {
    match &condition.kind {
        ConditionKind::Compare { column, op, value } => {
            format!(
                "{} {} {}",
                python::column(frame, column),
                op.symbol(),
                python::value(value)
            )
        }
        ConditionKind::Between { column, low, high } => format!(
            "{}.between({}, {})",
            python::column(frame, column),
            python::value(low),
            python::value(high)
        ),
        ConditionKind::In { column, values } => format!(
            "{}.isin({})",
            python::column(frame, column),
            python::values(values)
        ),
        ConditionKind::Match {
            column,
            kind,
            pattern,
        } => {
            let method = match kind {
                MatchKind::Contains => "contains",
                MatchKind::StartsWith => "startswith",
                MatchKind::EndsWith => "endswith",
                MatchKind::Matches => "match",
            };
            format!(
                "{}.str.{method}({}, na=False)",
                python::column(frame, column),
                python::value(pattern)
            )
        }
        ConditionKind::IsNull { column, negated } => {
            let method = if *negated { "notna" } else { "isna" };
            format!("{}.{method}()", python::column(frame, column))
        }
        ConditionKind::And(left, right) => format!(
            "({}) & ({})",
            self::condition(frame, left),
            self::condition(frame, right)
        ),
        ConditionKind::Or(left, right) => format!(
            "({}) | ({})",
            self::condition(frame, left),
            self::condition(frame, right)
        ),
        ConditionKind::Not(inner) => format!("~({})", self::condition(frame, inner)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noeta_parser::{ast::StatementKind, parse, significant_tokens, tokenize};

    fn mutate_expr(source: &str) -> Expr {
        let program = format!("mutate t with out = {source}");
        let tokens = significant_tokens(tokenize(&program).expect("Failed to tokenize"));
        let program = parse(&tokens).expect("Failed to parse");
        match &program.statements[0].kind {
            StatementKind::Mutate { assignments, .. } => assignments[0].expr.clone(),
            other => panic!("Expected mutate, got {other:?}"),
        }
    }

    fn filter_condition(source: &str) -> Condition {
        let program = format!("filter t where {source}");
        let tokens = significant_tokens(tokenize(&program).expect("Failed to tokenize"));
        let program = parse(&tokens).expect("Failed to parse");
        match &program.statements[0].kind {
            StatementKind::Filter { condition, .. } => condition.clone(),
            other => panic!("Expected filter, got {other:?}"),
        }
    }

    fn render(source: &str, mode: Mode<'_>) -> String {
        ExprRenderer::new(mode).render(&mutate_expr(source))
    }

    #[test]
    fn test_vectorised_mode() {
        let mode = Mode::Vectorised { frame: "df" };
        assert_eq!(render("price * qty", mode), "df['price'] * df['qty']");
        assert_eq!(
            render("price > 10 and not flag", mode),
            "(df['price'] > 10) & (~df['flag'])"
        );
    }

    #[test]
    fn test_vectorised_conditional_uses_numpy() {
        let mut renderer = ExprRenderer::new(Mode::Vectorised { frame: "df" });
        let rendered = renderer.render(&mutate_expr("\"high\" where price > 100 else \"low\""));
        assert_eq!(rendered, "np.where(df['price'] > 100, 'high', 'low')");
        assert!(renderer.uses_numpy());
    }

    #[test]
    fn test_vectorised_string_calls() {
        let mode = Mode::Vectorised { frame: "df" };
        assert_eq!(render("upper(name)", mode), "df['name'].str.upper()");
        assert_eq!(render("len(name) + 1", mode), "df['name'].str.len() + 1");
    }

    #[test]
    fn test_element_and_row_modes() {
        assert_eq!(render("x * 2 + 1", Mode::Element), "(x * 2) + 1");
        assert_eq!(
            render("1 where x > 0 else 0", Mode::Element),
            "(1 if x > 0 else 0)"
        );
        assert_eq!(render("price * qty", Mode::Row), "row['price'] * row['qty']");
    }

    #[test]
    fn test_group_mode() {
        assert_eq!(
            render("count > 5 and sum(amount) > 100", Mode::Group),
            "(len(g) > 5) and (g['amount'].sum() > 100)"
        );
    }

    #[test]
    fn test_element_parameter() {
        assert_eq!(element_parameter(&mutate_expr("value * 2")), "value");
        assert_eq!(element_parameter(&mutate_expr("1 + 2")), "x");
    }

    #[test]
    fn test_conditions() {
        assert_eq!(
            condition("sales", &filter_condition("price > 100")),
            "sales['price'] > 100"
        );
        assert_eq!(
            condition(
                "sales",
                &filter_condition("price between 10 and 20 and region in [\"north\", \"south\"]")
            ),
            "(sales['price'].between(10, 20)) & (sales['region'].isin(['north', 'south']))"
        );
        assert_eq!(
            condition("sales", &filter_condition("not name contains \"x\"")),
            "~(sales['name'].str.contains('x', na=False))"
        );
        assert_eq!(
            condition("sales", &filter_condition("email is not null")),
            "sales['email'].notna()"
        );
    }
}
