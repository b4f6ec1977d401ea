//! Lexical analyzer for Noeta source text.
//!
//! The lexer converts source text into a stream of [`Token`]s for parsing.
//! Whitespace and `#` comments are skipped; newlines are kept as tokens so
//! callers can see line structure, and are dropped by
//! [`significant_tokens`] before parsing. The stream always ends with
//! [`Token::Eof`].
//!
//! Lexing stops at the first malformed token.

use winnow::{
    Parser as _,
    combinator::{alt, cut_err, not, opt, preceded, repeat, terminated},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{literal, none_of, take_while},
};

use crate::{
    error::{Diagnostic, ErrorCode},
    keyword::Keyword,
    span::{Position, Span},
    tokens::{PositionedToken, Token},
};

/// Rich diagnostic information for lexer errors.
///
/// Attached to winnow errors via `.context()` so the failure can be turned
/// into a [`Diagnostic`] with code, message, help and span.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    code: ErrorCode,
    message: &'static str,
    help: Option<&'static str>,
    /// The error span covers from `start` to the error position.
    start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = ModalResult<O, ContextError<LexerDiagnostic>>;

/// Parse a string literal. `\"` is the only escape; other backslashes are
/// kept as written. Strings end at the closing quote and may not span lines.
fn string_literal<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let string_char = alt(("\\\"".value('"'), none_of(['"', '\n', '\r'])));
    let string_content = repeat(0.., string_char).fold(String::new, |mut acc, ch| {
        acc.push(ch);
        acc
    });

    let start_pos = input.current_token_start();
    '"'.parse_next(input)?;

    cut_err(terminated(string_content, '"'))
        .context(LexerDiagnostic {
            code: ErrorCode::E001,
            message: "Unterminated string literal",
            help: Some("Add a closing `\"` before the end of the line"),
            start: start_pos,
        })
        .parse_next(input)
        .map(Token::StringLiteral)
}

/// Parse a numeric literal: a digit followed by digits and dots.
fn number_literal<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let start_pos = input.current_token_start();

    let text = (
        take_while(1, |c: char| c.is_ascii_digit()),
        take_while(0.., |c: char| c.is_ascii_digit() || c == '.'),
    )
        .take()
        .parse_next(input)?;

    if let Ok(n) = text.parse::<i64>() {
        return Ok(Token::Integer(n));
    }
    if !text.ends_with('.') {
        if let Ok(n) = text.parse::<f64>() {
            return Ok(Token::Float(n));
        }
    }

    Err(ErrMode::Cut(ContextError::new().add_context(
        input,
        &input.checkpoint(),
        LexerDiagnostic {
            code: ErrorCode::E003,
            message: "Invalid numeric literal",
            help: Some("Numbers are written as `42` or `3.14`"),
            start: start_pos,
        },
    )))
}

/// Parse `#` comments up to (not including) the end of the line.
fn comment(input: &mut Input<'_>) -> IResult<()> {
    preceded('#', take_while(0.., |c| c != '\n'))
        .void()
        .parse_next(input)
}

/// Parse a word and classify it as keyword, boolean or identifier.
fn word<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    (
        take_while(1, |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .map(|text: &'a str| {
            if text.eq_ignore_ascii_case("true") {
                Token::Boolean(true)
            } else if text.eq_ignore_ascii_case("false") {
                Token::Boolean(false)
            } else if let Some(keyword) = Keyword::from_word(text) {
                Token::Keyword(keyword)
            } else {
                Token::Identifier(text)
            }
        })
        .parse_next(input)
}

/// Parse multi-character operators (longest first)
fn multi_char_operator<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        literal("==").value(Token::EqualEqual),
        literal("!=").value(Token::NotEqual),
        literal("<=").value(Token::LessEqual),
        literal(">=").value(Token::GreaterEqual),
        literal("**").value(Token::StarStar),
    ))
    .parse_next(input)
}

/// Parse single character tokens
fn single_char_token<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        alt((
            '<'.value(Token::Less),
            '>'.value(Token::Greater),
            '='.value(Token::Equals),
            '+'.value(Token::Plus),
            '-'.value(Token::Minus),
            '*'.value(Token::Star),
            '/'.value(Token::Slash),
            '%'.value(Token::Percent),
            '.'.value(Token::Dot),
        )),
        alt((
            '('.value(Token::LeftParen),
            ')'.value(Token::RightParen),
            '{'.value(Token::LeftBrace),
            '}'.value(Token::RightBrace),
            '['.value(Token::LeftBracket),
            ']'.value(Token::RightBracket),
            ':'.value(Token::Colon),
            ','.value(Token::Comma),
        )),
    ))
    .parse_next(input)
}

/// Parse a newline, accepting `\r\n`.
fn newline<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    (opt('\r'), '\n').value(Token::Newline).parse_next(input)
}

/// Skip whitespace (other than newlines) and comments.
fn trivia(input: &mut Input<'_>) -> IResult<()> {
    repeat(
        0..,
        alt((
            take_while(1.., |c: char| c.is_whitespace() && c != '\n' && c != '\r').void(),
            ('\r', not('\n')).void(),
            comment,
        )),
    )
    .parse_next(input)
}

/// Parse the next significant token, returning it with its byte span.
fn spanned_token<'a>(input: &mut Input<'a>) -> IResult<(Token<'a>, Span)> {
    let start_pos = input.current_token_start();

    let token = alt((
        newline,             // Must come before any single char
        string_literal,      // Must come before any single char
        number_literal,      // Must come before words
        word,                // Keywords, booleans, identifiers
        multi_char_operator, // Must come before single char operators
        single_char_token,   // Single character tokens
    ))
    .parse_next(input)?;

    let end_pos = input.current_token_start();
    Ok((token, Span::new(start_pos..end_pos)))
}

/// Lexer state: tokens produced so far and the current line bookkeeping.
struct Lexer<'a> {
    source: &'a str,
    tokens: Vec<PositionedToken<'a>>,
    line: usize,
    line_start: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            line: 1,
            line_start: 0,
        }
    }

    /// Position of a byte offset on the current line.
    fn position(&self, offset: usize) -> Position {
        let column = self
            .source
            .get(self.line_start..offset)
            .map_or(0, |text| text.chars().count())
            + 1;
        Position::new(self.line, column)
    }

    fn tokenize(mut self) -> Result<Vec<PositionedToken<'a>>, Diagnostic> {
        let mut input = LocatingSlice::new(self.source);

        loop {
            trivia(&mut input).map_err(|e| self.convert_err_mode(e, input.current_token_start()))?;
            if input.is_empty() {
                break;
            }

            match spanned_token(&mut input) {
                Ok((token, span)) => {
                    let position = self.position(span.start());
                    let is_newline = matches!(token, Token::Newline);
                    self.tokens.push(PositionedToken::new(token, span, position));
                    if is_newline {
                        self.line += 1;
                        self.line_start = span.end();
                    }
                }
                Err(e) => {
                    let error_pos = input.current_token_start();
                    return Err(self.convert_err_mode(e, error_pos));
                }
            }
        }

        let end = self.source.len();
        let position = self.position(end);
        self.tokens
            .push(PositionedToken::new(Token::Eof, Span::new(end..end), position));
        Ok(self.tokens)
    }

    /// Convert an ErrMode and error position to a Diagnostic.
    ///
    /// Extracts `LexerDiagnostic` from the error context for rich error info.
    /// Falls back to E002 (unexpected character) when no token matched.
    fn convert_err_mode(
        &self,
        err: ErrMode<ContextError<LexerDiagnostic>>,
        error_pos: usize,
    ) -> Diagnostic {
        let context_error = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
            ErrMode::Incomplete(_) => ContextError::new(),
        };

        if let Some(LexerDiagnostic {
            code,
            message,
            help,
            start,
        }) = context_error.context().next()
        {
            let span = Span::new(*start..error_pos);
            let mut diag = Diagnostic::lexical(*message)
                .with_code(*code)
                .with_label(span, code.description());
            if let Some(h) = help {
                diag = diag.with_help(*h);
            }
            return diag;
        }

        self.unexpected_character(error_pos)
    }

    /// E002 naming the character at `error_pos`, spanning all of its bytes.
    fn unexpected_character(&self, error_pos: usize) -> Diagnostic {
        let ch = self
            .source
            .get(error_pos..)
            .and_then(|rest| rest.chars().next())
            .unwrap_or(' ');
        let span = Span::new(error_pos..error_pos + ch.len_utf8());

        Diagnostic::lexical(format!("Unexpected character '{ch}'"))
            .with_code(ErrorCode::E002)
            .with_label(span, ErrorCode::E002.description())
            .with_help("This character is not valid in Noeta syntax")
    }
}

/// Tokenize source text.
///
/// # Returns
///
/// - `Ok(tokens)` - every token, newlines included, ending with [`Token::Eof`]
/// - `Err(Diagnostic)` - the first lexical error, with its span
pub fn tokenize(source: &str) -> Result<Vec<PositionedToken<'_>>, Diagnostic> {
    Lexer::new(source).tokenize()
}

/// Drop newline tokens, keeping everything the parser consumes.
pub fn significant_tokens(tokens: Vec<PositionedToken<'_>>) -> Vec<PositionedToken<'_>> {
    tokens
        .into_iter()
        .filter(|t| !matches!(t.token, Token::Newline))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token<'_>> {
        tokenize(input)
            .expect("tokenize")
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    fn single(input: &str) -> Token<'_> {
        let tokens = kinds(input);
        assert_eq!(tokens.len(), 2, "expected one token plus Eof for {input:?}");
        tokens.into_iter().next().unwrap()
    }

    fn error_code(input: &str) -> ErrorCode {
        tokenize(input)
            .expect_err("expected lexer error")
            .code()
            .expect("code")
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(single("load"), Token::Keyword(Keyword::Load));
        assert_eq!(single("LOAD"), Token::Keyword(Keyword::Load));
        assert_eq!(single("Filter_Between"), Token::Keyword(Keyword::FilterBetween));
        assert_eq!(single("None"), Token::Keyword(Keyword::Null));
    }

    #[test]
    fn test_identifiers_and_booleans() {
        assert_eq!(single("sales"), Token::Identifier("sales"));
        assert_eq!(single("_tmp1"), Token::Identifier("_tmp1"));
        assert_eq!(single("loaded"), Token::Identifier("loaded"));
        assert_eq!(single("True"), Token::Boolean(true));
        assert_eq!(single("false"), Token::Boolean(false));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(single("42"), Token::Integer(42));
        assert_eq!(single("3.5"), Token::Float(3.5));
        assert_eq!(single("0.001"), Token::Float(0.001));
        assert_eq!(
            kinds("10abc"),
            vec![Token::Integer(10), Token::Identifier("abc"), Token::Eof]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("== != <= >= < > = + - * ** / % ."),
            vec![
                Token::EqualEqual,
                Token::NotEqual,
                Token::LessEqual,
                Token::GreaterEqual,
                Token::Less,
                Token::Greater,
                Token::Equals,
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::StarStar,
                Token::Slash,
                Token::Percent,
                Token::Dot,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            kinds("( ) { } [ ] : ,"),
            vec![
                Token::LeftParen,
                Token::RightParen,
                Token::LeftBrace,
                Token::RightBrace,
                Token::LeftBracket,
                Token::RightBracket,
                Token::Colon,
                Token::Comma,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            single("\"data/sales.csv\""),
            Token::StringLiteral("data/sales.csv".to_string())
        );
        assert_eq!(single("\"\""), Token::StringLiteral(String::new()));
        assert_eq!(
            single(r#""say \"hi\"""#),
            Token::StringLiteral("say \"hi\"".to_string())
        );
        assert_eq!(
            single(r#""C:\data\x.csv""#),
            Token::StringLiteral(r"C:\data\x.csv".to_string())
        );
    }

    #[test]
    fn test_comments_and_newlines() {
        let tokens = kinds("load \"a.csv\" as a # trailing\n\n# full line\ndescribe a\r\n");
        assert_eq!(
            tokens,
            vec![
                Token::Keyword(Keyword::Load),
                Token::StringLiteral("a.csv".to_string()),
                Token::Keyword(Keyword::As),
                Token::Identifier("a"),
                Token::Newline,
                Token::Newline,
                Token::Newline,
                Token::Keyword(Keyword::Describe),
                Token::Identifier("a"),
                Token::Newline,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("load \"a.csv\" as a\n  describe a").unwrap();

        assert_eq!(tokens[0].position, Position::new(1, 1));
        assert_eq!(tokens[1].position, Position::new(1, 6));
        assert_eq!(tokens[1].span, Span::new(5..12));
        assert_eq!(tokens[3].position, Position::new(1, 17));
        // tokens[4] is the newline
        assert_eq!(tokens[5].position, Position::new(2, 3));
        assert_eq!(tokens[6].position, Position::new(2, 12));
        assert_eq!(tokens.last().map(|t| t.position), Some(Position::new(2, 13)));
    }

    #[test]
    fn test_significant_tokens_drop_newlines() {
        let tokens = significant_tokens(tokenize("a\nb\n").unwrap());
        let kinds: Vec<_> = tokens.iter().map(|t| t.token.clone()).collect();
        assert_eq!(
            kinds,
            vec![Token::Identifier("a"), Token::Identifier("b"), Token::Eof]
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(kinds(""), vec![Token::Eof]);
        assert_eq!(kinds("   # only a comment"), vec![Token::Eof]);
    }

    mod lexer_error_tests {
        use super::*;

        #[test]
        fn test_unterminated_string() {
            assert_eq!(error_code("\"unterminated"), ErrorCode::E001);
            assert_eq!(error_code("load \"a.csv\nas a"), ErrorCode::E001);
        }

        #[test]
        fn test_unterminated_string_span_starts_at_quote() {
            let diag = tokenize("foo \"hello world\nbar").unwrap_err();
            let span = diag.primary_span().unwrap();
            assert_eq!(span.start(), 4);
            assert_eq!(span.end(), 16);
            assert_eq!(diag.message(), "Unterminated string literal");
        }

        #[test]
        fn test_unexpected_character() {
            let diag = tokenize("select a $ b").unwrap_err();
            assert_eq!(diag.code(), Some(ErrorCode::E002));
            assert_eq!(diag.message(), "Unexpected character '$'");
            assert_eq!(diag.help(), Some("This character is not valid in Noeta syntax"));
            assert_eq!(diag.primary_span(), Some(Span::new(9..10)));
        }

        #[test]
        fn test_unexpected_multibyte_character() {
            let diag = tokenize("a → b").unwrap_err();
            assert_eq!(diag.message(), "Unexpected character '→'");
            assert_eq!(diag.primary_span().map(|s| s.len()), Some('→'.len_utf8()));
        }

        #[test]
        fn test_invalid_numbers() {
            assert_eq!(error_code("1.2.3"), ErrorCode::E003);
            assert_eq!(error_code("10."), ErrorCode::E003);
        }

        #[test]
        fn test_first_error_wins() {
            let diag = tokenize("@ \"open").unwrap_err();
            assert_eq!(diag.code(), Some(ErrorCode::E002));
        }
    }
}
