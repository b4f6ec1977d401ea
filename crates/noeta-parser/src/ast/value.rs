//! Literal parameter values.

use std::fmt;

use crate::span::Spanned;

/// A literal as written in a statement parameter, list or map.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
    /// A bare word. Depending on the statement this names a column, a
    /// function or an enumerated option.
    Ident(String),
    List(Vec<Spanned<Value>>),
    /// Key/value pairs in source order.
    Map(Vec<(Spanned<String>, Spanned<Value>)>),
}

impl Value {
    /// Short name of the value's shape, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Float(_) => "number",
            Value::Boolean(_) => "boolean",
            Value::Null => "null",
            Value::Ident(_) => "name",
            Value::List(_) => "list",
            Value::Map(_) => "mapping",
        }
    }

    /// Text of a string or bare word.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Ident(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Integers widen to floats.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Spanned<Value>]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "\"{s}\""),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Null => write!(f, "null"),
            Value::Ident(name) => write!(f, "{name}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    fn spanned(value: Value) -> Spanned<Value> {
        Spanned::new(value, Span::default())
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Integer(3).as_number(), Some(3.0));
        assert_eq!(Value::Float(0.5).as_integer(), None);
        assert_eq!(Value::Ident("price".into()).as_text(), Some("price"));
        assert_eq!(Value::Boolean(true).as_bool(), Some(true));
        assert_eq!(Value::Null.kind_name(), "null");
    }

    #[test]
    fn test_display() {
        let list = Value::List(vec![
            spanned(Value::Integer(1)),
            spanned(Value::String("a".into())),
        ]);
        assert_eq!(list.to_string(), "[1, \"a\"]");

        let map = Value::Map(vec![(
            Spanned::new("old".to_string(), Span::default()),
            spanned(Value::Ident("new".into())),
        )]);
        assert_eq!(map.to_string(), "{old: new}");
    }
}
