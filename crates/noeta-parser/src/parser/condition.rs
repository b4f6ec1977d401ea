//! Row predicates for `filter ... where`.
//!
//! ```text
//! condition := or_cond
//! or_cond   := and_cond ("or" and_cond)*
//! and_cond  := not_cond ("and" not_cond)*
//! not_cond  := "not" not_cond | atom
//! atom      := "(" condition ")"
//!            | column "between" value "and" value
//!            | column "in" "[" value, ... "]"
//!            | column ("contains" | "starts_with" | "ends_with" | "matches") value
//!            | column "is" ["not"] "null"
//!            | column cmp value
//! ```
//!
//! A single `=` is accepted as equality.

use winnow::{Parser as _, token::any};

use super::{
    Context, IResult, Input, column_name, cut_err, eat, eat_keyword, expect, expect_keyword,
    invalid, value,
};
use crate::{
    ast::{CompareOp, Condition, ConditionKind, MatchKind, Value},
    error::{Diagnostic, ErrorCode},
    keyword::Keyword,
    span::Spanned,
    tokens::{PositionedToken, Token},
};

pub(super) fn condition<'src>(input: &mut Input<'src>) -> IResult<Condition> {
    or_condition(input)
}

fn or_condition<'src>(input: &mut Input<'src>) -> IResult<Condition> {
    let mut left = and_condition(input)?;
    while eat_keyword(input, Keyword::Or).is_some() {
        let right = cut_err(input, and_condition)?;
        let span = left.span.union(right.span);
        left = Condition::new(ConditionKind::Or(Box::new(left), Box::new(right)), span);
    }
    Ok(left)
}

fn and_condition<'src>(input: &mut Input<'src>) -> IResult<Condition> {
    let mut left = not_condition(input)?;
    while eat_keyword(input, Keyword::And).is_some() {
        let right = cut_err(input, not_condition)?;
        let span = left.span.union(right.span);
        left = Condition::new(ConditionKind::And(Box::new(left), Box::new(right)), span);
    }
    Ok(left)
}

fn not_condition<'src>(input: &mut Input<'src>) -> IResult<Condition> {
    if let Some(not) = eat_keyword(input, Keyword::Not) {
        let inner = cut_err(input, not_condition)?;
        let span = not.union(inner.span);
        return Ok(Condition::new(ConditionKind::Not(Box::new(inner)), span));
    }
    atom(input)
}

fn atom<'src>(input: &mut Input<'src>) -> IResult<Condition> {
    if let Some(open) = eat(input, |t| matches!(t, Token::LeftParen)) {
        return cut_err(input, |input| {
            let inner = condition(input)?;
            let close = expect(
                input,
                |t| matches!(t, Token::RightParen),
                "closing parenthesis )",
            )?;
            Ok(Condition::new(inner.kind, open.union(close)))
        });
    }

    let column = column_name(input)?;
    cut_err(input, |input| {
        if eat_keyword(input, Keyword::Between).is_some() {
            let low = value(input)?;
            expect_keyword(input, Keyword::And, "\"and\" between the bounds")?;
            let high = value(input)?;
            let span = column.span().union(high.span());
            return Ok(Condition::new(
                ConditionKind::Between { column, low, high },
                span,
            ));
        }

        if eat_keyword(input, Keyword::In).is_some() {
            let list = value_list(input)?;
            let span = column.span().union(list.span());
            let values = match list.into_inner() {
                Value::List(values) => values,
                other => vec![Spanned::new(other, span)],
            };
            return Ok(Condition::new(ConditionKind::In { column, values }, span));
        }

        if let Some(kind) = match_kind(input) {
            let pattern = value(input)?;
            let span = column.span().union(pattern.span());
            return Ok(Condition::new(
                ConditionKind::Match {
                    column,
                    kind,
                    pattern,
                },
                span,
            ));
        }

        if eat_keyword(input, Keyword::Is).is_some() {
            let negated = eat_keyword(input, Keyword::Not).is_some();
            let null = expect_keyword(input, Keyword::Null, "\"null\"")?;
            let span = column.span().union(null);
            return Ok(Condition::new(ConditionKind::IsNull { column, negated }, span));
        }

        let op = compare_op(input)?;
        let operand = value(input)?;
        let span = column.span().union(operand.span());
        Ok(Condition::new(
            ConditionKind::Compare {
                column,
                op,
                value: operand,
            },
            span,
        ))
    })
}

/// The bracketed list after `in`.
fn value_list<'src>(input: &mut Input<'src>) -> IResult<Spanned<Value>> {
    let list = value(input)?;
    if matches!(list.inner(), Value::List(_)) {
        Ok(list)
    } else {
        Err(invalid(
            Diagnostic::syntax(format!(
                "Expected a list of values after \"in\", got {}",
                list.kind_name()
            ))
            .with_code(ErrorCode::E100)
            .with_label(list.span(), "expected [value, ...]")
            .with_help("Write the candidates as a list, for example `in [\"a\", \"b\"]`"),
        ))
    }
}

fn match_kind(input: &mut Input<'_>) -> Option<MatchKind> {
    [
        (Keyword::Contains, MatchKind::Contains),
        (Keyword::StartsWith, MatchKind::StartsWith),
        (Keyword::EndsWith, MatchKind::EndsWith),
        (Keyword::Matches, MatchKind::Matches),
    ]
    .into_iter()
    .find_map(|(keyword, kind)| eat_keyword(input, keyword).map(|_| kind))
}

fn compare_op<'src>(input: &mut Input<'src>) -> IResult<CompareOp> {
    any.verify_map(|token: &PositionedToken<'_>| match token.token {
        Token::EqualEqual | Token::Equals => Some(CompareOp::Eq),
        Token::NotEqual => Some(CompareOp::Ne),
        Token::Less => Some(CompareOp::Lt),
        Token::LessEqual => Some(CompareOp::Le),
        Token::Greater => Some(CompareOp::Gt),
        Token::GreaterEqual => Some(CompareOp::Ge),
        _ => None,
    })
    .context(Context::Label("comparison operator"))
    .parse_next(input)
}

#[cfg(test)]
mod tests {
    use winnow::stream::TokenSlice;

    use super::*;
    use crate::lexer::{significant_tokens, tokenize};

    fn parse_condition(source: &str) -> Condition {
        let tokens = significant_tokens(tokenize(source).expect("Failed to tokenize input"));
        let mut slice = TokenSlice::new(&tokens);
        condition(&mut slice).expect("Failed to parse condition")
    }

    #[test]
    fn test_comparison() {
        let cond = parse_condition("price > 100");
        assert_eq!(cond.to_string(), "price > 100");

        let cond = parse_condition("region = \"east\"");
        assert_eq!(cond.to_string(), "region == \"east\"");
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let cond = parse_condition("a > 1 and b < 2 or c == 3");
        assert_eq!(cond.to_string(), "((a > 1 and b < 2) or c == 3)");
    }

    #[test]
    fn test_not_and_parentheses() {
        let cond = parse_condition("not (a > 1 or b < 2)");
        assert_eq!(cond.to_string(), "(not (a > 1 or b < 2))");
    }

    #[test]
    fn test_between_consumes_its_own_and() {
        let cond = parse_condition("price between 10 and 20 and region in [\"a\", \"b\"]");
        match &cond.kind {
            ConditionKind::And(left, right) => {
                assert!(matches!(left.kind, ConditionKind::Between { .. }));
                match &right.kind {
                    ConditionKind::In { column, values } => {
                        assert_eq!(column.inner(), "region");
                        assert_eq!(values.len(), 2);
                    }
                    other => panic!("expected In, got {other:?}"),
                }
            }
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn test_string_matches_and_null_checks() {
        let cond = parse_condition("name starts_with \"A\" or email is not null");
        assert_eq!(
            cond.to_string(),
            "(name starts_with \"A\" or email is not null)"
        );
        let columns: Vec<&str> = cond.columns().iter().map(|c| c.inner().as_str()).collect();
        assert_eq!(columns, vec!["name", "email"]);
    }

    #[test]
    fn test_missing_operator_fails() {
        let tokens = significant_tokens(tokenize("price 100").unwrap());
        let mut slice = TokenSlice::new(&tokens);
        assert!(condition(&mut slice).is_err());
    }
}
