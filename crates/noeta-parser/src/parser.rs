//! Parser for Noeta source tokens.
//!
//! This module turns the newline-free token stream from the
//! [`lexer`](super::lexer) into a [`Program`]. Statements are dispatched on
//! their leading keyword; each statement routine reads its source alias,
//! its clauses and an optional `as <alias>`. The public entry point is
//! [`parse`].
//!
//! The first failure aborts parsing with a syntax [`Diagnostic`].

mod clauses;
mod condition;
mod expression;
mod statements;

use log::debug;
use winnow::{
    Parser as _,
    error::{AddContext, ContextError, ErrMode},
    stream::{Stream, TokenSlice},
    token::any,
};

use crate::{
    ast::{Name, Program, Statement, StatementKind, Text, Value},
    error::{Diagnostic, ErrorCode, suggest},
    keyword::Keyword,
    span::{Span, Spanned},
    tokens::{PositionedToken, Token},
};

/// Context type for parser errors
#[derive(Debug, Clone)]
pub(crate) enum Context {
    /// Human phrase for what was expected at the failure point
    Label(&'static str),
    /// Keyword of the statement being parsed
    Statement(&'static str),
    /// Remaining token count (`eof_offset()`) at error start position
    StartOffset(usize),
    /// A fully formed diagnostic raised by a parameter contract
    Invalid(Box<Diagnostic>),
}

type Input<'src> = NoetaTokenSlice<'src>;
type IResult<O> = std::result::Result<O, ErrMode<ContextError<Context>>>;
/// Type alias for winnow TokenSlice with our positioned tokens
type NoetaTokenSlice<'src> = TokenSlice<'src, PositionedToken<'src>>;

/// Run `f`, turning any failure into a cut that remembers where it began.
fn cut_err<'src, O, F>(input: &mut Input<'src>, f: F) -> IResult<O>
where
    F: FnOnce(&mut Input<'src>) -> IResult<O>,
{
    let start_remaining = input.eof_offset();

    match f(input) {
        Ok(o) => Ok(o),
        Err(ErrMode::Backtrack(e)) | Err(ErrMode::Cut(e)) => Err(ErrMode::Cut(push_context(
            e,
            Context::StartOffset(start_remaining),
        ))),
        Err(e) => Err(e),
    }
}

/// Wrap a contract diagnostic so it survives to [`convert_error`] untouched.
fn invalid(diagnostic: Diagnostic) -> ErrMode<ContextError<Context>> {
    ErrMode::Cut(push_context(
        ContextError::new(),
        Context::Invalid(Box::new(diagnostic)),
    ))
}

/// Attach `context` to an error.
///
/// `ContextError` ignores the stream position, so an empty slice stands in
/// for the real input.
fn push_context(error: ContextError<Context>, context: Context) -> ContextError<Context> {
    let empty: &[PositionedToken<'_>] = &[];
    let stream = TokenSlice::new(empty);
    error.add_context(&stream, &stream.checkpoint(), context)
}

/// Look at the next token without consuming it.
fn peek<'src>(input: &mut Input<'src>) -> Option<&'src PositionedToken<'src>> {
    let checkpoint = input.checkpoint();
    let token = input.next_token();
    input.reset(&checkpoint);
    token
}

/// Look two tokens ahead without consuming anything.
fn peek_second<'src>(input: &mut Input<'src>) -> Option<&'src PositionedToken<'src>> {
    let checkpoint = input.checkpoint();
    let _ = input.next_token();
    let token = input.next_token();
    input.reset(&checkpoint);
    token
}

fn at(input: &mut Input<'_>, predicate: impl Fn(&Token<'_>) -> bool) -> bool {
    peek(input).is_some_and(|t| predicate(&t.token))
}

/// Consume the next token if it matches.
fn eat(input: &mut Input<'_>, predicate: impl Fn(&Token<'_>) -> bool) -> Option<Span> {
    let checkpoint = input.checkpoint();
    match input.next_token() {
        Some(token) if predicate(&token.token) => Some(token.span),
        _ => {
            input.reset(&checkpoint);
            None
        }
    }
}

fn eat_keyword(input: &mut Input<'_>, keyword: Keyword) -> Option<Span> {
    eat(input, |t| t.is_keyword(keyword))
}

/// Require a token matching `predicate`, described as `label` on failure.
fn expect<'src>(
    input: &mut Input<'src>,
    predicate: impl Fn(&Token<'_>) -> bool,
    label: &'static str,
) -> IResult<Span> {
    any.verify_map(|token: &PositionedToken<'_>| predicate(&token.token).then_some(token.span))
        .context(Context::Label(label))
        .parse_next(input)
}

fn expect_keyword<'src>(
    input: &mut Input<'src>,
    keyword: Keyword,
    label: &'static str,
) -> IResult<Span> {
    expect(input, |t| t.is_keyword(keyword), label)
}

/// Parse a dataset alias.
fn dataset_name<'src>(input: &mut Input<'src>) -> IResult<Name> {
    any.verify_map(|token: &PositionedToken<'_>| match &token.token {
        Token::Identifier(name) => Some(Spanned::new(name.to_string(), token.span)),
        _ => None,
    })
    .context(Context::Label("dataset name"))
    .parse_next(input)
}

/// Text of a token that may stand for a column name.
///
/// Statement and format keywords double as column names (`count`,
/// `json`); quoted names may contain spaces.
fn name_text(token: &Token<'_>) -> Option<String> {
    match token {
        Token::Identifier(name) => Some(name.to_string()),
        Token::StringLiteral(s) => Some(s.clone()),
        Token::Keyword(k) if k.is_name_like() => Some(k.as_str().to_string()),
        _ => None,
    }
}

/// Parse a column name.
fn column_name<'src>(input: &mut Input<'src>) -> IResult<Name> {
    any.verify_map(|token: &PositionedToken<'_>| {
        name_text(&token.token).map(|name| Spanned::new(name, token.span))
    })
    .context(Context::Label("column name"))
    .parse_next(input)
}

/// Parse a quoted string.
fn string_literal<'src>(input: &mut Input<'src>, label: &'static str) -> IResult<Text> {
    any.verify_map(|token: &PositionedToken<'_>| match &token.token {
        Token::StringLiteral(s) => Some(Spanned::new(s.clone(), token.span)),
        _ => None,
    })
    .context(Context::Label(label))
    .parse_next(input)
}

/// Parse a column list: `{a, b}`, `[a, "b"]` or the natural `a, b`.
fn column_list<'src>(input: &mut Input<'src>) -> IResult<Vec<Name>> {
    let close = if eat(input, |t| matches!(t, Token::LeftBrace)).is_some() {
        Some((
            (|t: &Token<'_>| matches!(t, Token::RightBrace)) as fn(&Token<'_>) -> bool,
            "closing brace }",
        ))
    } else if eat(input, |t| matches!(t, Token::LeftBracket)).is_some() {
        Some((
            (|t: &Token<'_>| matches!(t, Token::RightBracket)) as fn(&Token<'_>) -> bool,
            "closing bracket ]",
        ))
    } else {
        None
    };

    let mut names = Vec::new();
    match close {
        Some((is_close, close_label)) => {
            cut_err(input, |input| {
                while !at(input, is_close) {
                    names.push(column_name(input)?);
                    if eat(input, |t| matches!(t, Token::Comma)).is_none() {
                        break;
                    }
                }
                expect(input, is_close, close_label)?;
                Ok(())
            })?;
        }
        None => {
            names.push(column_name(input)?);
            while eat(input, |t| matches!(t, Token::Comma)).is_some() {
                names.push(cut_err(input, column_name)?);
            }
        }
    }
    Ok(names)
}

/// Parse a parameter value: string, number, boolean, `null`, bare word,
/// `[..]` list or `{..}` map. Lists and maps may be empty and tolerate a
/// trailing comma.
fn value<'src>(input: &mut Input<'src>) -> IResult<Spanned<Value>> {
    if let Some(open) = eat(input, |t| matches!(t, Token::LeftBracket)) {
        return cut_err(input, |input| {
            let mut items = Vec::new();
            while !at(input, |t| matches!(t, Token::RightBracket)) {
                items.push(value(input)?);
                if eat(input, |t| matches!(t, Token::Comma)).is_none() {
                    break;
                }
            }
            let close = expect(
                input,
                |t| matches!(t, Token::RightBracket),
                "closing bracket ]",
            )?;
            Ok(Spanned::new(Value::List(items), open.union(close)))
        });
    }

    if let Some(open) = eat(input, |t| matches!(t, Token::LeftBrace)) {
        return cut_err(input, |input| {
            let mut entries = Vec::new();
            while !at(input, |t| matches!(t, Token::RightBrace)) {
                let key = map_key(input)?;
                expect(input, |t| matches!(t, Token::Colon), "colon :")?;
                entries.push((key, value(input)?));
                if eat(input, |t| matches!(t, Token::Comma)).is_none() {
                    break;
                }
            }
            let close = expect(
                input,
                |t| matches!(t, Token::RightBrace),
                "closing brace }",
            )?;
            Ok(Spanned::new(Value::Map(entries), open.union(close)))
        });
    }

    if let Some(minus) = eat(input, |t| matches!(t, Token::Minus)) {
        return any
            .verify_map(|token: &PositionedToken<'_>| match token.token {
                Token::Integer(n) => Some(Spanned::new(Value::Integer(-n), minus.union(token.span))),
                Token::Float(n) => Some(Spanned::new(Value::Float(-n), minus.union(token.span))),
                _ => None,
            })
            .context(Context::Label("number"))
            .parse_next(input);
    }

    any.verify_map(|token: &PositionedToken<'_>| {
        let value = match &token.token {
            Token::StringLiteral(s) => Value::String(s.clone()),
            Token::Integer(n) => Value::Integer(*n),
            Token::Float(n) => Value::Float(*n),
            Token::Boolean(b) => Value::Boolean(*b),
            Token::Keyword(Keyword::Null) => Value::Null,
            Token::Identifier(name) => Value::Ident(name.to_string()),
            Token::Keyword(k) if k.is_name_like() => Value::Ident(k.as_str().to_string()),
            _ => return None,
        };
        Some(Spanned::new(value, token.span))
    })
    .context(Context::Label("value"))
    .parse_next(input)
}

/// Map keys are strings, bare words or numbers.
fn map_key<'src>(input: &mut Input<'src>) -> IResult<Spanned<String>> {
    any.verify_map(|token: &PositionedToken<'_>| {
        let key = match &token.token {
            Token::Integer(n) => n.to_string(),
            Token::Float(n) => n.to_string(),
            Token::Boolean(b) => b.to_string(),
            other => name_text(other)?,
        };
        Some(Spanned::new(key, token.span))
    })
    .context(Context::Label("mapping key"))
    .parse_next(input)
}

/// Parse an optional `as <alias>`.
fn result_alias<'src>(input: &mut Input<'src>) -> IResult<Option<Name>> {
    if eat_keyword(input, Keyword::As).is_none() {
        return Ok(None);
    }
    cut_err(input, dataset_name).map(Some)
}

/// Parse one statement starting at the current token.
fn statement<'src>(input: &mut Input<'src>) -> IResult<(StatementKind, Option<Name>)> {
    let leading = any
        .context(Context::Label("statement"))
        .parse_next(input)?;

    let keyword = match &leading.token {
        Token::Keyword(k) if k.is_statement() => *k,
        other => return Err(invalid(unknown_statement(other, leading.span))),
    };
    let statement_name = keyword.as_str();
    let in_statement =
        |e: ErrMode<ContextError<Context>>| e.map(|e| push_context(e, Context::Statement(statement_name)));

    let kind = cut_err(input, |input| statements::dispatch(input, keyword, leading.span))
        .map_err(in_statement)?;
    let result = result_alias(input).map_err(in_statement)?;

    if let Some(alias) = &result {
        if statements::is_display(keyword) {
            return Err(invalid(
                Diagnostic::syntax(format!(
                    "'{statement_name}' does not produce a dataset and cannot be assigned to '{}'",
                    alias.inner()
                ))
                .with_code(ErrorCode::E106)
                .with_label(alias.span(), "result alias not allowed here")
                .with_secondary_label(leading.span, "display-only statement")
                .with_help(format!(
                    "Remove `as {}` from the {statement_name} statement",
                    alias.inner()
                )),
            ));
        }
    }

    Ok((kind, result))
}

/// The diagnostic for a token that cannot start a statement.
fn unknown_statement(token: &Token<'_>, span: Span) -> Diagnostic {
    let suggestion = match token {
        Token::Identifier(word) => {
            suggest::nearest(word, Keyword::STATEMENTS.iter().map(|k| k.as_str()))
        }
        _ => None,
    };
    let help = match &suggestion {
        Some(keyword) => format!("'{keyword}' is a statement keyword with a similar spelling"),
        None => "Statements start with a keyword such as load, select or filter".to_string(),
    };

    Diagnostic::syntax(format!("Unexpected token: {token}"))
        .with_code(ErrorCode::E102)
        .with_label(span, "not a statement")
        .with_help(help)
        .with_optional_suggestion(suggestion)
}

/// Convert a winnow error into a diagnostic.
fn convert_error(
    error: ErrMode<ContextError<Context>>,
    tokens: &[PositionedToken],
    current_remaining: usize,
) -> Diagnostic {
    let e = match error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e,
        ErrMode::Incomplete(_) => ContextError::new(),
    };

    if let Some(diagnostic) = e.context().find_map(|ctx| match ctx {
        Context::Invalid(diagnostic) => Some(diagnostic.as_ref().clone()),
        _ => None,
    }) {
        return diagnostic;
    }

    let statement = e
        .context()
        .find_map(|ctx| match ctx {
            Context::Statement(name) => Some(*name),
            _ => None,
        })
        .unwrap_or("program");
    let expected = e
        .context()
        .find_map(|ctx| match ctx {
            Context::Label(label) => Some(*label),
            _ => None,
        })
        .unwrap_or("a complete statement");

    let index = tokens.len().saturating_sub(current_remaining);
    // Where the innermost committed construct began.
    let started = e.context().find_map(|ctx| match ctx {
        Context::StartOffset(remaining) => Some(tokens.len().saturating_sub(*remaining)),
        _ => None,
    });

    let diagnostic = match tokens.get(index) {
        Some(found) if !matches!(found.token, Token::Eof) => Diagnostic::syntax(format!(
            "Expected {expected}, got {} in {statement}",
            found.description()
        ))
        .with_code(ErrorCode::E100)
        .with_label(found.span, format!("expected {expected}")),
        _ => {
            let end = tokens[..index.min(tokens.len())]
                .iter()
                .rev()
                .find(|t| !matches!(t.token, Token::Eof))
                .map(|t| t.span.end())
                .unwrap_or(0);
            Diagnostic::syntax(format!(
                "Unexpected end of file in {statement}. Expected {expected}"
            ))
            .with_code(ErrorCode::E101)
            .with_label(Span::new(end..end), "input ends here")
            .with_help(format!(
                "The file ended before the {statement} statement was complete"
            ))
        }
    };

    match started.and_then(|start| consumed_span(tokens, start, index)) {
        Some(span) => diagnostic.with_secondary_label(span, format!("incomplete part of {statement}")),
        None => diagnostic,
    }
}

/// Span of the tokens consumed between `start` and the failure at `index`.
fn consumed_span(tokens: &[PositionedToken<'_>], start: usize, index: usize) -> Option<Span> {
    let consumed = tokens.get(start..index.min(tokens.len()))?;
    let mut significant = consumed.iter().filter(|t| !matches!(t.token, Token::Eof));
    let first = significant.next()?;
    let last = significant.last().unwrap_or(first);
    Some(first.span.union(last.span))
}

/// Parse a program from significant tokens.
///
/// `tokens` must end with [`Token::Eof`] and contain no newlines; see
/// [`significant_tokens`](crate::lexer::significant_tokens).
///
/// # Errors
///
/// Returns the first syntax error as a [`Diagnostic`].
pub fn parse(tokens: &[PositionedToken<'_>]) -> Result<Program, Diagnostic> {
    let mut input = TokenSlice::new(tokens);
    let mut statements = Vec::new();

    loop {
        match peek(&mut input) {
            None => break,
            Some(token) if matches!(token.token, Token::Eof) => break,
            Some(_) => {}
        }

        let first = tokens.len() - input.eof_offset();
        let (kind, result) = match statement(&mut input) {
            Ok(parsed) => parsed,
            Err(e) => {
                let current_remaining = input.eof_offset();
                return Err(convert_error(e, tokens, current_remaining));
            }
        };
        let last = tokens.len() - input.eof_offset();

        let leading = &tokens[first];
        let span = tokens[first..last]
            .last()
            .map(|t| leading.span.union(t.span))
            .unwrap_or(leading.span);
        statements.push(Statement::new(kind, leading.position, span, result));
    }

    debug!(statements = statements.len(); "Parsed program");
    Ok(Program::new(statements))
}
