//! Source positions.
//!
//! The external parser attaches a [`Span`] to every syntax node; diagnostics
//! carry it back to the host as `line:col`.

use std::fmt;

/// Start position and byte length of a source construct.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Span {
    /// 1-based line.
    pub line: u32,
    /// 1-based byte column.
    pub col: u32,
    /// Byte length.
    pub len: u32,
}

impl Span {
    #[inline]
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        Self { line, col, len }
    }

    /// An empty span at `line:col`.
    #[inline]
    pub fn point(line: u32, col: u32) -> Self {
        Self::new(line, col, 0)
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    /// The smallest span covering both, anchored at the earlier start.
    ///
    /// Across lines the column information is meaningless, so the lengths
    /// are added instead.
    pub fn merge(self, other: Span) -> Span {
        let (first, second) = if other < self { (other, self) } else { (self, other) };
        if first.line != second.line {
            return Span::new(first.line, first.col, first.len + second.len);
        }
        let end = (first.col + first.len).max(second.col + second.len);
        Span::new(first.line, first.col, end - first.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_line_and_column() {
        assert_eq!(Span::new(3, 15, 5).to_string(), "3:15");
        assert_eq!(format!("{:?}", Span::point(7, 2)), "7:2");
    }

    #[test]
    fn orders_by_position() {
        assert!(Span::new(1, 9, 1) < Span::new(2, 1, 1));
        assert!(Span::new(2, 1, 1) < Span::new(2, 3, 1));
    }

    #[test]
    fn merge_covers_both_on_one_line() {
        let merged = Span::new(1, 10, 3).merge(Span::new(1, 5, 3));
        assert_eq!(merged, Span::new(1, 5, 8));
    }

    #[test]
    fn merge_across_lines_keeps_the_first_start() {
        let merged = Span::new(3, 10, 5).merge(Span::new(1, 5, 10));
        assert_eq!(merged, Span::new(1, 5, 15));
    }
}
