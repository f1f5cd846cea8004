//! Source text, line/column mapping, and source positions.
//!
//! A [`SourcePosition`] names a range inside one resource (a file path or a
//! URL). Errors that travel through inclusions and module imports carry a
//! [`PositionStack`]: the outermost import site first, the innermost
//! location last.

use std::fmt;
use std::sync::Arc;

use crate::span::Span;

/// Line and column information for a position in a source file.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineCol {
    /// 1-indexed line number.
    pub line: u32,
    /// 1-indexed column number (in UTF-8 bytes).
    pub column: u32,
}

impl LineCol {
    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The text of one resource together with its line table.
#[derive(Clone)]
pub struct SourceFile {
    name: Arc<str>,
    source: Arc<str>,
    /// Byte offsets of line starts. The first element is always 0.
    line_starts: Vec<u32>,
}

impl SourceFile {
    pub fn new(name: impl Into<Arc<str>>, source: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        let source = source.into();
        let line_starts = Self::compute_line_starts(&source);
        Self {
            name,
            source,
            line_starts,
        }
    }

    fn compute_line_starts(source: &str) -> Vec<u32> {
        let mut starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                starts.push((i + 1) as u32);
            }
        }
        starts
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Converts a byte offset to a 1-indexed line/column.
    pub fn line_col(&self, offset: u32) -> LineCol {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };
        let line_start = self.line_starts[line];
        LineCol {
            line: (line + 1) as u32,
            column: offset.saturating_sub(line_start) + 1,
        }
    }

    /// Returns the source text for a given span, clamped to the file.
    pub fn span_text(&self, span: Span) -> &str {
        let len = self.source.len();
        let start = (span.start as usize).min(len);
        let end = (span.end as usize).min(len).max(start);
        self.source.get(start..end).unwrap_or("")
    }

    /// Builds the position of `span` inside this file.
    pub fn position(&self, span: Span) -> SourcePosition {
        SourcePosition {
            source_name: self.name.clone(),
            start: self.line_col(span.start),
            end: self.line_col(span.end),
            span,
        }
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("name", &self.name)
            .field("len", &self.source.len())
            .field("lines", &self.line_starts.len())
            .finish()
    }
}

/// A range inside a named resource.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct SourcePosition {
    pub source_name: Arc<str>,
    pub start: LineCol,
    pub end: LineCol,
    pub span: Span,
}

impl SourcePosition {
    pub fn new(source_name: impl Into<Arc<str>>, start: LineCol, end: LineCol, span: Span) -> Self {
        Self {
            source_name: source_name.into(),
            start,
            end,
            span,
        }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source_name, self.start)
    }
}

/// Import/inclusion sites followed by the innermost location.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct PositionStack(Vec<SourcePosition>);

impl PositionStack {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn single(position: SourcePosition) -> Self {
        Self(vec![position])
    }

    pub fn push(&mut self, position: SourcePosition) {
        self.0.push(position);
    }

    /// Returns a new stack with `outer` placed before every entry of `self`.
    pub fn prefixed_with(&self, outer: &PositionStack) -> PositionStack {
        let mut entries = outer.0.clone();
        entries.extend(self.0.iter().cloned());
        PositionStack(entries)
    }

    pub fn entries(&self) -> &[SourcePosition] {
        &self.0
    }

    /// The innermost position, where the error actually happened.
    pub fn innermost(&self) -> Option<&SourcePosition> {
        self.0.last()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<SourcePosition>> for PositionStack {
    fn from(entries: Vec<SourcePosition>) -> Self {
        Self(entries)
    }
}

impl fmt::Display for PositionStack {
    /// Writes `name:line:col: ` for each entry.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for position in &self.0 {
            write!(f, "{}: ", position)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        let file = SourceFile::new("/main.ix", "manifest {}\nimport ./dep.ix\n");
        assert_eq!(file.line_col(0), LineCol::new(1, 1));
        assert_eq!(file.line_col(12), LineCol::new(2, 1));
        assert_eq!(file.line_col(19), LineCol::new(2, 8));
        assert_eq!(file.line_count(), 3);
    }

    #[test]
    fn test_span_text_is_clamped() {
        let file = SourceFile::new("a", "abc");
        assert_eq!(file.span_text(Span::new(1, 2)), "b");
        assert_eq!(file.span_text(Span::new(2, 40)), "c");
        assert_eq!(file.span_text(Span::new(40, 50)), "");
    }

    #[test]
    fn test_position_stack_display() {
        let outer = SourceFile::new("/main.ix", "manifest {}\nimport lib ./lib.ix {}");
        let inner = SourceFile::new("/lib.ix", "manifest {}\n; a =");

        let mut stack = PositionStack::single(outer.position(Span::new(12, 34)));
        stack.push(inner.position(Span::new(14, 17)));

        assert_eq!(stack.len(), 2);
        assert_eq!(stack.to_string(), "/main.ix:2:1: /lib.ix:2:3: ");
        assert_eq!(stack.innermost().map(|p| p.span), Some(Span::new(14, 17)));
    }

    #[test]
    fn test_prefixed_with() {
        let file = SourceFile::new("/b.ix", "x");
        let inner = PositionStack::single(file.position(Span::new(0, 1)));
        let outer = PositionStack::single(SourceFile::new("/a.ix", "y").position(Span::new(0, 1)));
        let combined = inner.prefixed_with(&outer);
        assert_eq!(combined.entries()[0].source_name.as_ref(), "/a.ix");
        assert_eq!(combined.entries()[1].source_name.as_ref(), "/b.ix");
    }
}
