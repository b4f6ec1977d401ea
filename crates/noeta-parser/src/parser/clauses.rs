//! The shared clause reader and parameter contracts.
//!
//! Most statements follow `keyword source clause* [as alias]`. Clauses are
//! read into a [`ParamBag`] keyed by parameter name:
//!
//! - `column c` stores `column`, `columns a, b` stores `columns`,
//!   `by a, b` stores `by` and `on c` stores `on`;
//! - `name = value` stores `name`;
//! - a known flag word such as `random` or `normalize` stores `true`;
//! - `with` is optional sugar and is skipped.
//!
//! Each statement routine then pulls typed values out of the bag. The
//! accessors raise E103 for values of the wrong shape and E105 for missing
//! required parameters; [`ParamBag::allow`] raises E104 for names the
//! statement does not know.

use indexmap::IndexMap;
use winnow::stream::Stream;

use super::{IResult, Input, column_list, column_name, cut_err, eat, peek, peek_second, value};
use crate::{
    ast::{Keep, Name, Options, Text, Value},
    error::{Diagnostic, ErrorCode, suggest},
    keyword::Keyword,
    span::{Span, Spanned},
    tokens::Token,
};

/// Bare words accepted as boolean flags.
const FLAGS: &[&str] = &[
    "random",
    "normalize",
    "ascending",
    "ignore_index",
    "pct",
    "drop",
    "include_lowest",
];

fn is_flag(word: &str) -> bool {
    FLAGS.contains(&word.to_ascii_lowercase().as_str())
}

/// A flag word that is also a statement keyword, such as `normalize`, starts
/// a new statement only when a dataset name follows it.
fn starts_statement(input: &mut Input<'_>) -> bool {
    match peek_second(input).map(|t| &t.token) {
        Some(Token::Identifier(next)) => !is_flag(next),
        _ => false,
    }
}

#[derive(Debug, Clone)]
struct Param {
    key: Span,
    value: Spanned<Value>,
}

/// Parameters collected from a statement's clauses.
#[derive(Debug, Clone)]
pub(super) struct ParamBag {
    statement: Keyword,
    /// Span of the statement keyword, where missing parameters are reported.
    anchor: Span,
    entries: IndexMap<String, Param>,
}

impl ParamBag {
    pub(super) fn new(statement: Keyword, anchor: Span) -> Self {
        Self {
            statement,
            anchor,
            entries: IndexMap::new(),
        }
    }

    /// Read clauses until a token that cannot start one.
    pub(super) fn read(input: &mut Input<'_>, statement: Keyword, anchor: Span) -> IResult<Self> {
        let mut bag = Self::new(statement, anchor);
        bag.read_more(input)?;
        Ok(bag)
    }

    /// Continue reading clauses into an existing bag.
    pub(super) fn read_more(&mut self, input: &mut Input<'_>) -> IResult<()> {
        loop {
            let Some(token) = peek(input) else {
                return Ok(());
            };

            // `name = value` wins over clause keywords, so `by=..` and
            // `columns=..` are ordinary parameters.
            let is_assignment = peek_second(input).is_some_and(|t| matches!(t.token, Token::Equals));
            let word = match &token.token {
                Token::Identifier(name) => Some(name.to_string()),
                Token::Keyword(k) => Some(k.as_str().to_string()),
                _ => None,
            };

            if let (Some(key), true) = (word, is_assignment) {
                let _ = input.next_token();
                let _ = input.next_token();
                let value = cut_err(input, value)?;
                self.insert(key, token.span, value);
                continue;
            }

            match &token.token {
                Token::Keyword(Keyword::With) => {
                    let _ = input.next_token();
                }
                Token::Keyword(Keyword::Column) | Token::Keyword(Keyword::On) => {
                    let _ = input.next_token();
                    let name = cut_err(input, column_name)?;
                    let key = if token.is_keyword(Keyword::On) {
                        "on"
                    } else {
                        "column"
                    };
                    self.insert(key.to_string(), token.span, name_value(name));
                }
                Token::Keyword(Keyword::Columns) | Token::Keyword(Keyword::By) => {
                    let _ = input.next_token();
                    let names = cut_err(input, column_list)?;
                    let key = if token.is_keyword(Keyword::By) {
                        "by"
                    } else {
                        "columns"
                    };
                    self.insert(key.to_string(), token.span, names_value(names, token.span));
                }
                Token::Identifier(name) if is_flag(name) => {
                    let _ = input.next_token();
                    self.insert(
                        name.to_ascii_lowercase(),
                        token.span,
                        Spanned::new(Value::Boolean(true), token.span),
                    );
                }
                Token::Keyword(keyword) if is_flag(keyword.as_str()) && !starts_statement(input) => {
                    let _ = input.next_token();
                    self.insert(
                        keyword.as_str().to_string(),
                        token.span,
                        Spanned::new(Value::Boolean(true), token.span),
                    );
                }
                _ => return Ok(()),
            }
        }
    }

    pub(super) fn insert(&mut self, key: String, key_span: Span, value: Spanned<Value>) {
        self.entries.insert(
            key,
            Param {
                key: key_span,
                value,
            },
        );
    }

    /// Reject any parameter not in `allowed`.
    pub(super) fn allow(&self, allowed: &[&str]) -> Result<(), Diagnostic> {
        for (key, param) in &self.entries {
            if allowed.contains(&key.as_str()) {
                continue;
            }
            let statement = self.statement.as_str();
            let help = if allowed.is_empty() {
                format!("The {statement} statement takes no parameters")
            } else {
                format!("Valid parameters for {statement}: {}", allowed.join(", "))
            };
            return Err(Diagnostic::syntax(format!(
                "Unknown parameter '{key}' for {statement}"
            ))
            .with_code(ErrorCode::E104)
            .with_label(param.key, "unknown parameter")
            .with_help(help)
            .with_optional_suggestion(suggest::nearest(key, allowed.iter().copied())));
        }
        Ok(())
    }

    pub(super) fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub(super) fn get(&self, key: &str) -> Option<&Spanned<Value>> {
        self.entries.get(key).map(|param| &param.value)
    }

    fn missing(&self, key: &str) -> Diagnostic {
        let statement = self.statement.as_str();
        let help = match key {
            "column" => format!("Add `column <name>` to the {statement} statement"),
            "columns" => format!("Add `columns <name>, <name>` to the {statement} statement"),
            "by" => format!("Add `by <name>` to the {statement} statement"),
            "on" => format!("Add `on <name>` to the {statement} statement"),
            _ => format!("Add `{key}=<value>` to the {statement} statement"),
        };
        Diagnostic::syntax(format!(
            "Missing parameter '{key}' for {statement}"
        ))
        .with_code(ErrorCode::E105)
        .with_label(self.anchor, format!("'{key}' is required"))
        .with_help(help)
    }

    fn wrong_shape(&self, key: &str, expected: &str, found: &Spanned<Value>) -> Diagnostic {
        Diagnostic::syntax(format!(
            "Invalid value for '{key}' in {}: expected {expected}, got {}",
            self.statement.as_str(),
            found.kind_name()
        ))
        .with_code(ErrorCode::E103)
        .with_label(found.span(), format!("expected {expected}"))
    }

    fn require<T>(&self, key: &str, found: Option<T>) -> Result<T, Diagnostic> {
        found.ok_or_else(|| self.missing(key))
    }

    pub(super) fn value(&self, key: &str) -> Option<Spanned<Value>> {
        self.get(key).cloned()
    }

    pub(super) fn require_value(&self, key: &str) -> Result<Spanned<Value>, Diagnostic> {
        self.require(key, self.value(key))
    }

    /// A flag or boolean parameter, `false` when absent.
    pub(super) fn flag(&self, key: &str) -> Result<bool, Diagnostic> {
        self.bool_or(key, false)
    }

    pub(super) fn bool_or(&self, key: &str, default: bool) -> Result<bool, Diagnostic> {
        match self.get(key) {
            None => Ok(default),
            Some(found) => match found.inner() {
                Value::Boolean(b) => Ok(*b),
                _ => Err(self.wrong_shape(key, "true or false", found)),
            },
        }
    }

    pub(super) fn integer(&self, key: &str) -> Result<Option<i64>, Diagnostic> {
        self.get(key)
            .map(|found| {
                found
                    .as_integer()
                    .ok_or_else(|| self.wrong_shape(key, "an integer", found))
            })
            .transpose()
    }

    pub(super) fn integer_or(&self, key: &str, default: i64) -> Result<i64, Diagnostic> {
        Ok(self.integer(key)?.unwrap_or(default))
    }

    pub(super) fn require_integer(&self, key: &str) -> Result<i64, Diagnostic> {
        let found = self.integer(key)?;
        self.require(key, found)
    }

    /// A positive integer such as a row count or window size.
    pub(super) fn positive_or(&self, key: &str, default: i64) -> Result<i64, Diagnostic> {
        let n = self.integer_or(key, default)?;
        match self.get(key) {
            Some(found) if n <= 0 => Err(self.wrong_shape(key, "a positive integer", found)),
            _ => Ok(n),
        }
    }

    pub(super) fn require_positive(&self, key: &str) -> Result<i64, Diagnostic> {
        self.require_value(key)?;
        self.positive_or(key, 1)
    }

    pub(super) fn number(&self, key: &str) -> Result<Option<f64>, Diagnostic> {
        self.get(key)
            .map(|found| {
                found
                    .as_number()
                    .ok_or_else(|| self.wrong_shape(key, "a number", found))
            })
            .transpose()
    }

    pub(super) fn number_or(&self, key: &str, default: f64) -> Result<f64, Diagnostic> {
        Ok(self.number(key)?.unwrap_or(default))
    }

    pub(super) fn require_number(&self, key: &str) -> Result<f64, Diagnostic> {
        let found = self.number(key)?;
        self.require(key, found)
    }

    /// A string or bare word.
    pub(super) fn text(&self, key: &str) -> Result<Option<Text>, Diagnostic> {
        self.get(key)
            .map(|found| {
                found
                    .as_text()
                    .map(|text| Spanned::new(text.to_string(), found.span()))
                    .ok_or_else(|| self.wrong_shape(key, "a string", found))
            })
            .transpose()
    }

    pub(super) fn text_or(&self, key: &str, default: &str) -> Result<Text, Diagnostic> {
        Ok(self
            .text(key)?
            .unwrap_or_else(|| Spanned::new(default.to_string(), self.anchor)))
    }

    pub(super) fn require_text(&self, key: &str) -> Result<Text, Diagnostic> {
        let found = self.text(key)?;
        self.require(key, found)
    }

    /// A string restricted to one of `allowed`.
    pub(super) fn choice(
        &self,
        key: &str,
        allowed: &[&str],
        default: &str,
    ) -> Result<Text, Diagnostic> {
        let text = self.text_or(key, default)?;
        if allowed.contains(&text.inner().as_str()) {
            return Ok(text);
        }
        Err(Diagnostic::syntax(format!(
            "Invalid value '{}' for '{key}' in {}",
            text.inner(),
            self.statement.as_str()
        ))
        .with_code(ErrorCode::E103)
        .with_label(text.span(), "unsupported value")
        .with_help(format!("Valid values: {}", allowed.join(", ")))
        .with_optional_suggestion(suggest::nearest(text.inner(), allowed.iter().copied())))
    }

    pub(super) fn require_choice(&self, key: &str, allowed: &[&str]) -> Result<Text, Diagnostic> {
        self.require_value(key)?;
        self.choice(key, allowed, "")
    }

    /// A single column name.
    pub(super) fn column(&self, key: &str) -> Result<Option<Name>, Diagnostic> {
        self.get(key)
            .map(|found| match found.inner() {
                Value::Ident(name) | Value::String(name) => {
                    Ok(Spanned::new(name.clone(), found.span()))
                }
                _ => Err(self.wrong_shape(key, "a column name", found)),
            })
            .transpose()
    }

    pub(super) fn require_column(&self, key: &str) -> Result<Name, Diagnostic> {
        let found = self.column(key)?;
        self.require(key, found)
    }

    /// A list of column names. A single name counts as a list of one.
    pub(super) fn columns(&self, key: &str) -> Result<Vec<Name>, Diagnostic> {
        let Some(found) = self.get(key) else {
            return Ok(Vec::new());
        };
        match found.inner() {
            Value::Ident(name) | Value::String(name) => {
                Ok(vec![Spanned::new(name.clone(), found.span())])
            }
            Value::List(items) => items
                .iter()
                .map(|item| match item.inner() {
                    Value::Ident(name) | Value::String(name) => {
                        Ok(Spanned::new(name.clone(), item.span()))
                    }
                    _ => Err(self.wrong_shape(key, "a column name", item)),
                })
                .collect(),
            _ => Err(self.wrong_shape(key, "a list of column names", found)),
        }
    }

    pub(super) fn require_columns(&self, key: &str) -> Result<Vec<Name>, Diagnostic> {
        let columns = self.columns(key)?;
        if columns.is_empty() {
            return Err(self.missing(key));
        }
        Ok(columns)
    }

    /// A list of values. A single value counts as a list of one.
    pub(super) fn list(&self, key: &str) -> Result<Vec<Spanned<Value>>, Diagnostic> {
        Ok(match self.get(key) {
            None => Vec::new(),
            Some(found) => match found.inner() {
                Value::List(items) => items.clone(),
                Value::Map(_) => return Err(self.wrong_shape(key, "a list", found)),
                _ => vec![found.clone()],
            },
        })
    }

    pub(super) fn require_list(&self, key: &str) -> Result<Vec<Spanned<Value>>, Diagnostic> {
        self.require_value(key)?;
        self.list(key)
    }

    /// A `{key: value}` mapping, with keys kept as values.
    pub(super) fn mapping(
        &self,
        key: &str,
    ) -> Result<Option<Vec<(Spanned<Value>, Spanned<Value>)>>, Diagnostic> {
        self.get(key)
            .map(|found| match found.inner() {
                Value::Map(entries) => Ok(entries
                    .iter()
                    .map(|(k, v)| {
                        (
                            Spanned::new(Value::String(k.inner().clone()), k.span()),
                            v.clone(),
                        )
                    })
                    .collect()),
                _ => Err(self.wrong_shape(key, "a mapping {key: value}", found)),
            })
            .transpose()
    }

    pub(super) fn require_mapping(
        &self,
        key: &str,
    ) -> Result<Vec<(Spanned<Value>, Spanned<Value>)>, Diagnostic> {
        let found = self.mapping(key)?;
        self.require(key, found)
    }

    /// A `{old: new}` mapping of column names.
    pub(super) fn require_renames(&self, key: &str) -> Result<Vec<(Name, Name)>, Diagnostic> {
        let found = self.require_value(key)?;
        match found.inner() {
            Value::Map(entries) => entries
                .iter()
                .map(|(old, new)| match new.inner() {
                    Value::Ident(name) | Value::String(name) => {
                        Ok((old.clone(), Spanned::new(name.clone(), new.span())))
                    }
                    _ => Err(self.wrong_shape(key, "a column name", new)),
                })
                .collect(),
            _ => Err(self.wrong_shape(key, "a mapping {old: new}", &found)),
        }
    }

    pub(super) fn keep(&self, key: &str) -> Result<Keep, Diagnostic> {
        if let Some(Value::Boolean(false)) = self.get(key).map(|found| found.inner()) {
            return Ok(Keep::None);
        }
        let text = self.choice(key, &["first", "last", "none"], "first")?;
        Ok(Keep::from_name(text.inner()).unwrap_or_default())
    }

    /// Every parameter, in source order, for pass-through to the runtime.
    pub(super) fn options(&self) -> Options {
        self.entries
            .iter()
            .map(|(key, param)| (Spanned::new(key.clone(), param.key), param.value.clone()))
            .collect()
    }
}

fn name_value(name: Name) -> Spanned<Value> {
    let span = name.span();
    Spanned::new(Value::Ident(name.into_inner()), span)
}

fn names_value(names: Vec<Name>, keyword: Span) -> Spanned<Value> {
    let span = names
        .iter()
        .fold(keyword, |span, name| span.union(name.span()));
    Spanned::new(Value::List(names.into_iter().map(name_value).collect()), span)
}

/// Skip an optional `with` before parameters.
pub(super) fn skip_with(input: &mut Input<'_>) {
    let _ = eat(input, |t| t.is_keyword(Keyword::With));
}
