use std::fmt;

/// A position in source text.
///
/// `row` is zero-based; `column` counts bytes from the start of the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    pub const ZERO: Point = Point { row: 0, column: 0 };
    pub const MAX: Point = Point {
        row: usize::MAX,
        column: usize::MAX,
    };

    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// The point reached after walking over `text` starting from `self`.
    pub fn advance(self, text: &[u8]) -> Self {
        let mut point = self;
        for &byte in text {
            if byte == b'\n' {
                point.row += 1;
                point.column = 0;
            } else {
                point.column += 1;
            }
        }
        point
    }

    /// The point of `offset` within `source`, clamped to the buffer length.
    pub fn at_offset(source: &[u8], offset: usize) -> Self {
        Point::ZERO.advance(&source[..offset.min(source.len())])
    }
}

impl From<tree_sitter::Point> for Point {
    fn from(point: tree_sitter::Point) -> Self {
        Self::new(point.row, point.column)
    }
}

impl From<Point> for tree_sitter::Point {
    fn from(point: Point) -> Self {
        tree_sitter::Point::new(point.row, point.column)
    }
}

impl From<(usize, usize)> for Point {
    fn from((row, column): (usize, usize)) -> Self {
        Self::new(row, column)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}
