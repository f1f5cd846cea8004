//! Byte spans into source text.

use std::fmt;

/// A half-open byte range `[start, end)` within a single source file.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Creates a new span.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Creates a span from `usize` offsets, saturating at `u32::MAX`.
    #[inline]
    pub fn from_usize(start: usize, end: usize) -> Self {
        let clamp = |v: usize| u32::try_from(v).unwrap_or(u32::MAX);
        Self::new(clamp(start), clamp(end))
    }

    /// An empty span at offset 0.
    #[inline]
    pub const fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }

    /// Returns a span covering both `self` and `other`.
    #[inline]
    pub fn to(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Returns true if `other` lies entirely within `self`.
    #[inline]
    pub const fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns true if `self` ends exactly where `other` starts.
    #[inline]
    pub const fn is_adjacent_to(&self, other: Span) -> bool {
        self.end == other.start
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_to() {
        let a = Span::new(2, 5);
        let b = Span::new(7, 9);
        assert_eq!(a.to(&b), Span::new(2, 9));
        assert_eq!(b.to(&a), Span::new(2, 9));
    }

    #[test]
    fn test_span_contains() {
        let outer = Span::new(0, 10);
        assert!(outer.contains(Span::new(3, 4)));
        assert!(outer.contains(outer));
        assert!(!outer.contains(Span::new(8, 11)));
    }

    #[test]
    fn test_span_adjacency() {
        assert!(Span::new(0, 3).is_adjacent_to(Span::new(3, 4)));
        assert!(!Span::new(0, 3).is_adjacent_to(Span::new(4, 5)));
    }
}
