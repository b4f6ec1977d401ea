//! Python literal rendering.

use noeta_parser::{
    Spanned,
    ast::{Name, Options, Value},
};

/// A single-quoted Python string literal.
pub(crate) fn string(text: &str) -> String {
    format!("'{}'", escape(text))
}

/// Literal text inside a single-quoted f-string; braces are doubled.
pub(crate) fn fstring_text(text: &str) -> String {
    escape(text).replace('{', "{{").replace('}', "}}")
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

/// Python float syntax; always carries a decimal point or exponent.
pub(crate) fn float(value: f64) -> String {
    if value.is_nan() {
        "float('nan')".to_string()
    } else if value.is_infinite() {
        if value > 0.0 {
            "float('inf')".to_string()
        } else {
            "float('-inf')".to_string()
        }
    } else {
        format!("{value:?}")
    }
}

pub(crate) fn boolean(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

/// A parameter value as a Python literal. Bare words become strings.
pub(crate) fn value(value: &Value) -> String {
    match value {
        Value::String(text) | Value::Ident(text) => string(text),
        Value::Integer(n) => n.to_string(),
        Value::Float(n) => float(*n),
        Value::Boolean(b) => boolean(*b).to_string(),
        Value::Null => "None".to_string(),
        Value::List(items) => list(items.iter().map(|item| self::value(item))),
        Value::Map(entries) => dict(
            entries
                .iter()
                .map(|(key, item)| (string(key), self::value(item))),
        ),
    }
}

/// `[a, b, ...]` from already rendered items.
pub(crate) fn list(items: impl IntoIterator<Item = String>) -> String {
    format!("[{}]", items.into_iter().collect::<Vec<_>>().join(", "))
}

/// `{k: v, ...}` from already rendered pairs.
pub(crate) fn dict(entries: impl IntoIterator<Item = (String, String)>) -> String {
    let body = entries
        .into_iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{body}}}")
}

/// `['a', 'b']` from column names.
pub(crate) fn names(names: &[Name]) -> String {
    list(names.iter().map(|name| string(name)))
}

pub(crate) fn values(items: &[Spanned<Value>]) -> String {
    list(items.iter().map(|item| value(item)))
}

/// `{old: new, ...}` from literal pairs.
pub(crate) fn mapping(pairs: &[(Spanned<Value>, Spanned<Value>)]) -> String {
    dict(pairs.iter().map(|(from, to)| (value(from), value(to))))
}

/// Keyword arguments, `key=value` joined by commas.
pub(crate) fn kwargs(args: &[(String, String)]) -> String {
    args.iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Merge pass-through options over defaults. Options win on equal keys and
/// keep their source order after the defaults.
pub(crate) fn with_options(defaults: Vec<(String, String)>, options: &Options) -> Vec<(String, String)> {
    let mut args = defaults;
    for (key, item) in options {
        let rendered = value(item);
        match args.iter_mut().find(|(existing, _)| existing.as_str() == key.inner().as_str()) {
            Some(slot) => slot.1 = rendered,
            None => args.push((key.inner().clone(), rendered)),
        }
    }
    args
}

/// `frame['column']`
pub(crate) fn column(frame: &str, column: &str) -> String {
    format!("{frame}[{}]", string(column))
}

/// Row or column selector for `iloc`: a two-integer list is a slice.
pub(crate) fn position(selector: &Value) -> String {
    if let Value::List(items) = selector {
        if let [start, end] = items.as_slice() {
            if let (Some(start), Some(end)) = (start.as_integer(), end.as_integer()) {
                return format!("{start}:{end}");
            }
        }
    }
    value(selector)
}

#[cfg(test)]
mod tests {
    use noeta_parser::Span;

    use super::*;

    fn spanned(value: Value) -> Spanned<Value> {
        Spanned::new(value, Span::default())
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(string("plain"), "'plain'");
        assert_eq!(string("it's"), "'it\\'s'");
        assert_eq!(string("C:\\data\n"), "'C:\\\\data\\n'");
    }

    #[test]
    fn test_fstring_text_doubles_braces() {
        assert_eq!(fstring_text("by {team}"), "by {{team}}");
        assert_eq!(fstring_text("o'brien"), "o\\'brien");
    }

    #[test]
    fn test_numbers() {
        assert_eq!(float(2.0), "2.0");
        assert_eq!(float(0.25), "0.25");
        assert_eq!(float(f64::INFINITY), "float('inf')");
        assert_eq!(value(&Value::Integer(-3)), "-3");
    }

    #[test]
    fn test_nested_values() {
        let map = Value::Map(vec![(
            Spanned::new("a".to_string(), Span::default()),
            spanned(Value::List(vec![
                spanned(Value::Boolean(true)),
                spanned(Value::Null),
                spanned(Value::Ident("x".into())),
            ])),
        )]);
        assert_eq!(value(&map), "{'a': [True, None, 'x']}");
    }

    #[test]
    fn test_options_override_defaults() {
        let options: Options = vec![
            (
                Spanned::new("index".to_string(), Span::default()),
                spanned(Value::Boolean(true)),
            ),
            (
                Spanned::new("sep".to_string(), Span::default()),
                spanned(Value::String(";".into())),
            ),
        ];
        let args = with_options(vec![("index".into(), "False".into())], &options);
        assert_eq!(kwargs(&args), "index=True, sep=';'");
    }

    #[test]
    fn test_position_slices() {
        let slice = Value::List(vec![spanned(Value::Integer(0)), spanned(Value::Integer(10))]);
        assert_eq!(position(&slice), "0:10");
        assert_eq!(position(&Value::Integer(3)), "3");
        let picks = Value::List(vec![
            spanned(Value::Integer(1)),
            spanned(Value::Integer(3)),
            spanned(Value::Integer(5)),
        ]);
        assert_eq!(position(&picks), "[1, 3, 5]");
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    /// Undo the escapes `string` applies, failing on anything else.
    fn unescape(literal: &str) -> Option<String> {
        let body = literal.strip_prefix('\'')?.strip_suffix('\'')?;
        let mut out = String::new();
        let mut chars = body.chars();
        while let Some(ch) = chars.next() {
            match ch {
                '\\' => out.push(match chars.next()? {
                    '\\' => '\\',
                    '\'' => '\'',
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    _ => return None,
                }),
                '\'' | '\n' | '\r' => return None,
                _ => out.push(ch),
            }
        }
        Some(out)
    }

    fn check_string_literal(text: &str) -> Result<(), TestCaseError> {
        let literal = string(text);
        prop_assert!(!literal.contains('\n'));
        let back = unescape(&literal);
        prop_assert_eq!(back.as_deref(), Some(text));
        Ok(())
    }

    proptest! {
        #[test]
        fn string_literal_round_trip(text in "\\PC{0,24}|[a-z'\\\\\n\t]{0,12}") {
            check_string_literal(&text)?;
        }

        #[test]
        fn float_keeps_a_decimal_point(value in -1.0e6f64..1.0e6) {
            let rendered = float(value);
            prop_assert!(rendered.contains('.') || rendered.contains('e'));
            prop_assert_eq!(rendered.parse::<f64>().ok(), Some(value));
        }
    }
}
