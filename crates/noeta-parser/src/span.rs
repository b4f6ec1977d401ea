//! Source locations.
//!
//! [`Span`] is a byte range into the source text, [`Position`] is the
//! human-facing line/column pair, and [`Spanned`] attaches a span to a value.

use std::{fmt, ops::Deref};

/// A byte range in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    /// Create a new span from a byte range.
    pub fn new(range: std::ops::Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end.max(range.start),
        }
    }

    /// Get the start offset of the span
    pub fn start(&self) -> usize {
        self.start
    }

    /// Get the end offset of the span
    pub fn end(&self) -> usize {
        self.end
    }

    /// Get the length of the span
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if the span is empty
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Create a union of two spans (encompassing both)
    pub fn union(&self, other: Span) -> Span {
        Self::new(self.start.min(other.start)..self.end.max(other.end))
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        miette::SourceSpan::new(span.start().into(), span.len())
    }
}

impl From<&Span> for miette::SourceSpan {
    fn from(span: &Span) -> Self {
        miette::SourceSpan::new(span.start().into(), span.len())
    }
}

/// A 1-based line and column. Columns count characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Compute the position of a byte offset in `source`.
    ///
    /// Offsets past the end resolve to the position just after the last
    /// character.
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let offset = floor_char_boundary(source, offset);
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = source[line_start..offset].chars().count() + 1;
        Self { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Return the full text of the 1-based `line` in `source`, without the line
/// terminator.
pub fn source_line(source: &str, line: usize) -> Option<&str> {
    source
        .split('\n')
        .nth(line.checked_sub(1)?)
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
}

fn floor_char_boundary(source: &str, offset: usize) -> usize {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// A value with the span it was parsed from.
///
/// Equality compares only the wrapped value so that trees built from
/// different sources can be compared structurally.
#[derive(Debug, Clone, Default)]
pub struct Spanned<T> {
    value: T,
    span: Span,
}

impl<T> Spanned<T> {
    /// Create a new spanned value from a value and span information
    pub fn new(value: T, span: Span) -> Self {
        Self { value, span }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn inner(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    /// Transform the wrapped value, keeping the span.
    pub fn map<U, F>(self, f: F) -> Spanned<U>
    where
        F: FnOnce(T) -> U,
    {
        Spanned {
            value: f(self.value),
            span: self.span,
        }
    }
}

impl<T> Deref for Spanned<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T: PartialEq> PartialEq for Spanned<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: fmt::Display> fmt::Display for Spanned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_union() {
        let a = Span::new(4..8);
        let b = Span::new(10..12);
        assert_eq!(a.union(b), Span::new(4..12));
        assert_eq!(b.union(a), Span::new(4..12));
        assert_eq!(a.union(b).len(), 8);
    }

    #[test]
    fn test_position_from_offset() {
        let source = "load \"a.csv\" as a\nselect a with x";
        assert_eq!(Position::from_offset(source, 0), Position::new(1, 1));
        assert_eq!(Position::from_offset(source, 5), Position::new(1, 6));
        assert_eq!(Position::from_offset(source, 18), Position::new(2, 1));
        assert_eq!(Position::from_offset(source, 25), Position::new(2, 8));
        assert_eq!(
            Position::from_offset(source, source.len() + 10),
            Position::new(2, 16)
        );
    }

    #[test]
    fn test_position_counts_characters() {
        let source = "\"é\" x";
        assert_eq!(Position::from_offset(source, 5), Position::new(1, 5));
    }

    #[test]
    fn test_source_line() {
        let source = "first\r\nsecond\nthird";
        assert_eq!(source_line(source, 1), Some("first"));
        assert_eq!(source_line(source, 3), Some("third"));
        assert_eq!(source_line(source, 0), None);
        assert_eq!(source_line(source, 4), None);
    }

    #[test]
    fn test_spanned_equality_ignores_span() {
        let a = Spanned::new("sales", Span::new(0..5));
        let b = Spanned::new("sales", Span::new(10..15));
        assert_eq!(a, b);
        assert_eq!(a.map(str::len).into_inner(), 5);
    }
}
