//! Expression and condition trees.
//!
//! Expressions are the free-form right-hand sides of `mutate`, `apply`,
//! `map` and friends. Conditions are the row predicates of `filter`.

use std::fmt;

use crate::{
    ast::{Name, Value},
    span::{Span, Spanned},
};


/// A literal inside an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl BinaryOp {
    /// The operator as written in Noeta source.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Or => "or",
            BinaryOp::And => "and",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Identifier(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        function: Name,
        args: Vec<Expr>,
    },
    /// `then where condition else otherwise`
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

/// An expression node with the span it covers.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        let span = left.span.union(right.span);
        Self::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    /// Names of every identifier in the tree, in source order.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_identifiers(&mut names);
        names
    }

    fn collect_identifiers<'a>(&'a self, names: &mut Vec<&'a str>) {
        match &self.kind {
            ExprKind::Literal(_) => {}
            ExprKind::Identifier(name) => names.push(name),
            ExprKind::Unary { operand, .. } => operand.collect_identifiers(names),
            ExprKind::Binary { left, right, .. } => {
                left.collect_identifiers(names);
                right.collect_identifiers(names);
            }
            ExprKind::Call { args, .. } => {
                for arg in args {
                    arg.collect_identifiers(names);
                }
            }
            ExprKind::Conditional {
                condition,
                then,
                otherwise,
            } => {
                then.collect_identifiers(names);
                condition.collect_identifiers(names);
                otherwise.collect_identifiers(names);
            }
        }
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

/// Fully parenthesised rendering, handy for checking precedence.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Literal(Literal::Integer(n)) => write!(f, "{n}"),
            ExprKind::Literal(Literal::Float(n)) => write!(f, "{n}"),
            ExprKind::Literal(Literal::String(s)) => write!(f, "\"{s}\""),
            ExprKind::Literal(Literal::Boolean(b)) => write!(f, "{b}"),
            ExprKind::Literal(Literal::Null) => write!(f, "null"),
            ExprKind::Identifier(name) => write!(f, "{name}"),
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand,
            } => write!(f, "(-{operand})"),
            ExprKind::Unary {
                op: UnaryOp::Not,
                operand,
            } => write!(f, "(not {operand})"),
            ExprKind::Binary { op, left, right } => {
                write!(f, "({left} {} {right})", op.symbol())
            }
            ExprKind::Call { function, args } => {
                write!(f, "{function}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            ExprKind::Conditional {
                condition,
                then,
                otherwise,
            } => write!(f, "({then} where {condition} else {otherwise})"),
        }
    }
}

/// Comparison operators allowed in conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// String predicates available in conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Contains,
    StartsWith,
    EndsWith,
    Matches,
}

impl MatchKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            MatchKind::Contains => "contains",
            MatchKind::StartsWith => "starts_with",
            MatchKind::EndsWith => "ends_with",
            MatchKind::Matches => "matches",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConditionKind {
    Compare {
        column: Name,
        op: CompareOp,
        value: Spanned<Value>,
    },
    Between {
        column: Name,
        low: Spanned<Value>,
        high: Spanned<Value>,
    },
    In {
        column: Name,
        values: Vec<Spanned<Value>>,
    },
    Match {
        column: Name,
        kind: MatchKind,
        pattern: Spanned<Value>,
    },
    IsNull {
        column: Name,
        negated: bool,
    },
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
}

/// A row predicate with the span it covers.
#[derive(Debug, Clone)]
pub struct Condition {
    pub kind: ConditionKind,
    pub span: Span,
}

impl Condition {
    pub fn new(kind: ConditionKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Every column the condition reads, in source order.
    pub fn columns(&self) -> Vec<&Name> {
        let mut columns = Vec::new();
        self.collect_columns(&mut columns);
        columns
    }

    fn collect_columns<'a>(&'a self, columns: &mut Vec<&'a Name>) {
        match &self.kind {
            ConditionKind::Compare { column, .. }
            | ConditionKind::Between { column, .. }
            | ConditionKind::In { column, .. }
            | ConditionKind::Match { column, .. }
            | ConditionKind::IsNull { column, .. } => columns.push(column),
            ConditionKind::And(left, right) | ConditionKind::Or(left, right) => {
                left.collect_columns(columns);
                right.collect_columns(columns);
            }
            ConditionKind::Not(inner) => inner.collect_columns(columns),
        }
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

/// Fully parenthesised rendering of the predicate tree.
impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ConditionKind::Compare { column, op, value } => {
                write!(f, "{column} {} {value}", op.symbol())
            }
            ConditionKind::Between { column, low, high } => {
                write!(f, "{column} between {low} and {high}")
            }
            ConditionKind::In { column, values } => {
                write!(f, "{column} in [")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "]")
            }
            ConditionKind::Match {
                column,
                kind,
                pattern,
            } => write!(f, "{column} {} {pattern}", kind.keyword()),
            ConditionKind::IsNull { column, negated } => {
                if *negated {
                    write!(f, "{column} is not null")
                } else {
                    write!(f, "{column} is null")
                }
            }
            ConditionKind::And(left, right) => write!(f, "({left} and {right})"),
            ConditionKind::Or(left, right) => write!(f, "({left} or {right})"),
            ConditionKind::Not(inner) => write!(f, "(not {inner})"),
        }
    }
}
