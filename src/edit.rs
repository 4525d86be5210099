use crate::errors::{CanopyError, Result};
use crate::point::Point;
use std::ops::Range;

/// A source rewrite expressed in both bytes and points.
///
/// Bytes `[start_byte, old_end_byte)` of the old source were replaced by
/// bytes `[start_byte, new_end_byte)` of the new source. Trees use this to
/// decide which subtrees a reparse may reuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "TextEdit does nothing until passed to Tree::edit"]
pub struct TextEdit {
    pub start_byte: usize,
    pub old_end_byte: usize,
    pub new_end_byte: usize,
    pub start_point: Point,
    pub old_end_point: Point,
    pub new_end_point: Point,
}

impl TextEdit {
    /// Describe replacing `range` of `source` with `replacement`.
    ///
    /// Points are derived by counting newlines, so callers only supply bytes.
    pub fn replace(source: &[u8], range: Range<usize>, replacement: &[u8]) -> Result<Self> {
        if range.start > range.end || range.end > source.len() {
            return Err(CanopyError::InvalidEdit {
                start_byte: range.start,
                old_end_byte: range.end,
                new_end_byte: range.start + replacement.len(),
            });
        }

        let start_point = Point::at_offset(source, range.start);
        let old_end_point = start_point.advance(&source[range.clone()]);
        let new_end_point = start_point.advance(replacement);

        Ok(Self {
            start_byte: range.start,
            old_end_byte: range.end,
            new_end_byte: range.start + replacement.len(),
            start_point,
            old_end_point,
            new_end_point,
        })
    }

    /// Describe inserting `text` at `offset`.
    pub fn insert(source: &[u8], offset: usize, text: &[u8]) -> Result<Self> {
        Self::replace(source, offset..offset, text)
    }

    /// Describe deleting `range`.
    pub fn delete(source: &[u8], range: Range<usize>) -> Result<Self> {
        Self::replace(source, range, b"")
    }

    /// Check that both end offsets lie at or after the start, and that the
    /// points are ordered the same way as the bytes.
    pub fn validate(&self) -> Result<()> {
        let ordered = self.old_end_byte >= self.start_byte
            && self.new_end_byte >= self.start_byte
            && self.old_end_point >= self.start_point
            && self.new_end_point >= self.start_point;
        if ordered {
            Ok(())
        } else {
            Err(CanopyError::InvalidEdit {
                start_byte: self.start_byte,
                old_end_byte: self.old_end_byte,
                new_end_byte: self.new_end_byte,
            })
        }
    }

    /// Produce the new source by splicing `replacement` into `source`.
    ///
    /// `replacement` must be the text this edit was derived from.
    pub fn apply(&self, source: &[u8], replacement: &[u8]) -> Result<Vec<u8>> {
        self.validate()?;
        let inserted = self.new_end_byte - self.start_byte;
        if self.old_end_byte > source.len() || inserted != replacement.len() {
            return Err(CanopyError::InvalidEdit {
                start_byte: self.start_byte,
                old_end_byte: self.old_end_byte,
                new_end_byte: self.new_end_byte,
            });
        }

        let mut out = Vec::with_capacity(source.len() - (self.old_end_byte - self.start_byte) + inserted);
        out.extend_from_slice(&source[..self.start_byte]);
        out.extend_from_slice(replacement);
        out.extend_from_slice(&source[self.old_end_byte..]);
        Ok(out)
    }

    pub(crate) fn to_input_edit(self) -> tree_sitter::InputEdit {
        tree_sitter::InputEdit {
            start_byte: self.start_byte,
            old_end_byte: self.old_end_byte,
            new_end_byte: self.new_end_byte,
            start_position: self.start_point.into(),
            old_end_position: self.old_end_point.into(),
            new_end_position: self.new_end_point.into(),
        }
    }
}
