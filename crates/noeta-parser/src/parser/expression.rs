//! Free-form expressions for `mutate`, `apply`, `map` and `filter_groups`.
//!
//! Lowest to highest precedence:
//!
//! ```text
//! expression     := or_expr ["where" or_expr "else" expression]
//! or_expr        := and_expr ("or" and_expr)*
//! and_expr       := comparison ("and" comparison)*
//! comparison     := additive [cmp additive]
//! additive       := multiplicative (("+" | "-") multiplicative)*
//! multiplicative := power (("*" | "/" | "%") power)*
//! power          := unary ["**" power]
//! unary          := ("-" | "not") unary | primary
//! primary        := literal | name | name "(" args ")" | "(" expression ")"
//! ```
//!
//! Comparisons do not chain and `**` associates to the right.

use winnow::{Parser as _, stream::Stream, token::any};

use super::{Context, IResult, Input, cut_err, eat, eat_keyword, expect, expect_keyword};
use crate::{
    ast::{BinaryOp, Expr, ExprKind, Literal, UnaryOp},
    keyword::Keyword,
    span::Spanned,
    tokens::{PositionedToken, Token},
};

pub(super) fn expression<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    let then = or_expr(input)?;
    if eat_keyword(input, Keyword::Where).is_none() {
        return Ok(then);
    }

    cut_err(input, |input| {
        let condition = or_expr(input)?;
        expect_keyword(input, Keyword::Else, "\"else\" branch")?;
        let otherwise = expression(input)?;
        let span = then.span.union(otherwise.span);
        Ok(Expr::new(
            ExprKind::Conditional {
                condition: Box::new(condition),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            },
            span,
        ))
    })
}

/// Parse `operand (op operand)*` folding to the left.
fn left_assoc<'src>(
    input: &mut Input<'src>,
    operand: fn(&mut Input<'src>) -> IResult<Expr>,
    operator: fn(&Token<'_>) -> Option<BinaryOp>,
) -> IResult<Expr> {
    let mut left = operand(input)?;
    loop {
        let checkpoint = input.checkpoint();
        let op = match input.next_token().and_then(|t| operator(&t.token)) {
            Some(op) => op,
            None => {
                input.reset(&checkpoint);
                return Ok(left);
            }
        };
        let right = cut_err(input, operand)?;
        left = Expr::binary(op, left, right);
    }
}

fn or_expr<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    left_assoc(input, and_expr, |t| t.is_keyword(Keyword::Or).then_some(BinaryOp::Or))
}

fn and_expr<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    left_assoc(input, comparison, |t| {
        t.is_keyword(Keyword::And).then_some(BinaryOp::And)
    })
}

fn comparison_op(token: &Token<'_>) -> Option<BinaryOp> {
    match token {
        Token::EqualEqual => Some(BinaryOp::Eq),
        Token::NotEqual => Some(BinaryOp::Ne),
        Token::Less => Some(BinaryOp::Lt),
        Token::LessEqual => Some(BinaryOp::Le),
        Token::Greater => Some(BinaryOp::Gt),
        Token::GreaterEqual => Some(BinaryOp::Ge),
        _ => None,
    }
}

fn comparison<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    let left = additive(input)?;
    let checkpoint = input.checkpoint();
    match input.next_token().and_then(|t| comparison_op(&t.token)) {
        Some(op) => {
            let right = cut_err(input, additive)?;
            Ok(Expr::binary(op, left, right))
        }
        None => {
            input.reset(&checkpoint);
            Ok(left)
        }
    }
}

fn additive<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    left_assoc(input, multiplicative, |t| match t {
        Token::Plus => Some(BinaryOp::Add),
        Token::Minus => Some(BinaryOp::Sub),
        _ => None,
    })
}

fn multiplicative<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    left_assoc(input, power, |t| match t {
        Token::Star => Some(BinaryOp::Mul),
        Token::Slash => Some(BinaryOp::Div),
        Token::Percent => Some(BinaryOp::Mod),
        _ => None,
    })
}

fn power<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    let base = unary(input)?;
    if eat(input, |t| matches!(t, Token::StarStar)).is_none() {
        return Ok(base);
    }
    let exponent = cut_err(input, power)?;
    Ok(Expr::binary(BinaryOp::Pow, base, exponent))
}

fn unary<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    let op = if let Some(span) = eat(input, |t| matches!(t, Token::Minus)) {
        Some((UnaryOp::Neg, span))
    } else {
        eat_keyword(input, Keyword::Not).map(|span| (UnaryOp::Not, span))
    };

    match op {
        Some((op, span)) => {
            let operand = cut_err(input, unary)?;
            let span = span.union(operand.span);
            Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ))
        }
        None => primary(input),
    }
}

fn primary<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    if let Some(open) = eat(input, |t| matches!(t, Token::LeftParen)) {
        return cut_err(input, |input| {
            let inner = expression(input)?;
            let close = expect(
                input,
                |t| matches!(t, Token::RightParen),
                "closing parenthesis )",
            )?;
            Ok(Expr::new(inner.kind, open.union(close)))
        });
    }

    let atom = any
        .verify_map(|token: &PositionedToken<'_>| {
            let kind = match &token.token {
                Token::Integer(n) => ExprKind::Literal(Literal::Integer(*n)),
                Token::Float(n) => ExprKind::Literal(Literal::Float(*n)),
                Token::StringLiteral(s) => ExprKind::Literal(Literal::String(s.clone())),
                Token::Boolean(b) => ExprKind::Literal(Literal::Boolean(*b)),
                Token::Keyword(Keyword::Null) => ExprKind::Literal(Literal::Null),
                Token::Identifier(name) => ExprKind::Identifier(name.to_string()),
                Token::Keyword(k) if k.is_name_like() => ExprKind::Identifier(k.as_str().to_string()),
                _ => return None,
            };
            Some(Expr::new(kind, token.span))
        })
        .context(Context::Label("expression"))
        .parse_next(input)?;

    let ExprKind::Identifier(name) = &atom.kind else {
        return Ok(atom);
    };
    if eat(input, |t| matches!(t, Token::LeftParen)).is_none() {
        return Ok(atom);
    }

    let function = Spanned::new(name.clone(), atom.span);
    cut_err(input, |input| {
        let mut args = Vec::new();
        while !super::at(input, |t| matches!(t, Token::RightParen)) {
            args.push(expression(input)?);
            if eat(input, |t| matches!(t, Token::Comma)).is_none() {
                break;
            }
        }
        let close = expect(
            input,
            |t| matches!(t, Token::RightParen),
            "closing parenthesis )",
        )?;
        let span = function.span().union(close);
        Ok(Expr::new(ExprKind::Call { function, args }, span))
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use winnow::stream::TokenSlice;

    use super::*;
    use crate::lexer::{significant_tokens, tokenize};

    fn parse_expr(source: &str) -> Expr {
        let tokens = significant_tokens(tokenize(source).expect("Failed to tokenize input"));
        let mut slice = TokenSlice::new(&tokens);
        expression(&mut slice).expect("Failed to parse expression")
    }

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(parse_expr("1 + 2 * 3 ** 2").to_string(), "(1 + (2 * (3 ** 2)))");
        assert_eq!(parse_expr("(1 + 2) * 3").to_string(), "((1 + 2) * 3)");
        assert_eq!(parse_expr("a - b - c").to_string(), "((a - b) - c)");
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(parse_expr("2 ** 3 ** 2").to_string(), "(2 ** (3 ** 2))");
    }

    #[test]
    fn test_logical_precedence() {
        assert_eq!(
            parse_expr("a > 1 and b < 2 or c == 3").to_string(),
            "(((a > 1) and (b < 2)) or (c == 3))"
        );
        assert_eq!(parse_expr("not x and y").to_string(), "((not x) and y)");
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(parse_expr("-price * 2").to_string(), "((-price) * 2)");
    }

    #[test]
    fn test_conditional() {
        let expr = parse_expr("\"high\" where price > 100 else \"low\"");
        assert_eq!(expr.to_string(), "(\"high\" where (price > 100) else \"low\")");
    }

    #[test]
    fn test_calls() {
        let expr = parse_expr("round(price * 1.1, 2) + len(name)");
        assert_eq!(expr.to_string(), "(round((price * 1.1), 2) + len(name))");
        assert_eq!(expr.identifiers(), vec!["price", "name"]);
    }

    #[test]
    fn test_keyword_names_are_identifiers() {
        let expr = parse_expr("sum(value) > 10");
        assert_eq!(expr.to_string(), "(sum(value) > 10)");
    }

    #[test]
    fn test_comparison_does_not_chain() {
        let tokens = significant_tokens(tokenize("a < b < c").unwrap());
        let mut slice = TokenSlice::new(&tokens);
        let expr = expression(&mut slice).unwrap();
        assert_eq!(expr.to_string(), "(a < b)");
        // The second `<` is left for the caller.
        assert!(matches!(slice.next_token().map(|t| &t.token), Some(Token::Less)));
    }

    proptest! {
        /// Sums and products of literals keep their usual grouping.
        #[test]
        fn check_mixed_arithmetic(a in 0i64..1000, b in 0i64..1000, c in 0i64..1000) {
            let source = format!("{a} + {b} * {c}");
            prop_assert_eq!(parse_expr(&source).to_string(), format!("({a} + ({b} * {c}))"));
        }
    }
}
