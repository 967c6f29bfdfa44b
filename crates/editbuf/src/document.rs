//! The mutable text buffer and its derived line index.
//!
//! A [`Document`] is an ordered sequence of chars with a derived ordered
//! sequence of lines, both backed by a single rope so that line boundaries
//! are consistent with delimiter positions by construction. Every mutation
//! goes through the rope, which keeps offset and line bookkeeping in one
//! place and makes insert/delete/replace atomic with respect to the index.
//!
//! All offsets are char offsets (Unicode scalar values). Locations are
//! 1-based in both line and column.

use crate::error::DocumentError;
use crate::line_ending::{LineEnding, normalize_to_lf};
use crate::segment::TextSegment;
use ropey::Rope;

/// A 1-based (line, column) location in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column in chars within the line. Column `length + 1` is the
    /// caret position after the last char of the line.
    pub column: usize,
}

impl Location {
    /// Create a new location.
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.line, self.column)
    }
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.line
            .cmp(&other.line)
            .then_with(|| self.column.cmp(&other.column))
    }
}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// A lightweight view over one document line.
///
/// Recomputed on demand from the buffer; never stored. The bookmarked flag
/// and any attached line markers live in the marker store, keyed by the
/// line number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentLine {
    /// 1-based line number.
    pub line_number: usize,
    /// Char offset of the first char of the line.
    pub offset: usize,
    /// Length in chars, excluding the delimiter.
    pub length: usize,
    /// Delimiter length in chars (0 for the last line, 1 otherwise; text is
    /// LF-normalized on load).
    pub delimiter_length: usize,
}

impl DocumentLine {
    /// The line's content as a segment (delimiter excluded).
    pub fn segment(&self) -> TextSegment {
        TextSegment::new(self.offset, self.length)
    }

    /// Exclusive end offset of the line content (delimiter excluded).
    pub fn end_offset(&self) -> usize {
        self.offset + self.length
    }

    /// Exclusive end offset including the delimiter.
    pub fn end_offset_including_delimiter(&self) -> usize {
        self.offset + self.length + self.delimiter_length
    }
}

/// The mutable text buffer with a derived line index.
pub struct Document {
    rope: Rope,
    line_ending: LineEnding,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self {
            rope: Rope::new(),
            line_ending: LineEnding::Lf,
        }
    }

    /// Build a document from source text.
    ///
    /// CRLF and lone CR are normalized to LF; the detected line ending is
    /// retained for [`text_for_saving`](Self::text_for_saving).
    pub fn from_text(text: &str) -> Self {
        let line_ending = LineEnding::detect_in_text(text);
        Self {
            rope: Rope::from_str(&normalize_to_lf(text)),
            line_ending,
        }
    }

    /// Total length in chars.
    pub fn len(&self) -> usize {
        self.rope.len_chars()
    }

    /// Whether the document holds no text.
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Total line count. An empty document has one (empty) line.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// The preferred line ending for saving this document.
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Override the preferred line ending for saving this document.
    pub fn set_line_ending(&mut self, line_ending: LineEnding) {
        self.line_ending = line_ending;
    }

    /// The complete (LF-normalized) text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// The complete text converted to the preferred line ending for saving.
    pub fn text_for_saving(&self) -> String {
        self.line_ending.apply_to_text(&self.rope.to_string())
    }

    /// The char at `offset`, or a bounds error when no char exists there.
    pub fn get_char_at(&self, offset: usize) -> Result<char, DocumentError> {
        if offset >= self.rope.len_chars() {
            return Err(DocumentError::OffsetOutOfRange {
                offset,
                length: self.rope.len_chars(),
            });
        }
        Ok(self.rope.char(offset))
    }

    /// The text covered by `segment`.
    pub fn get_text_at(&self, segment: TextSegment) -> Result<String, DocumentError> {
        self.check_segment(segment)?;
        Ok(self
            .rope
            .slice(segment.offset..segment.end_offset())
            .to_string())
    }

    /// Map a char offset to a 1-based location.
    ///
    /// Total over `[0, len]`; `len` itself maps to the caret position after
    /// the final char.
    pub fn offset_to_location(&self, offset: usize) -> Result<Location, DocumentError> {
        if offset > self.rope.len_chars() {
            return Err(DocumentError::OffsetOutOfRange {
                offset,
                length: self.rope.len_chars(),
            });
        }
        let line_idx = self.rope.char_to_line(offset);
        let column = offset - self.rope.line_to_char(line_idx);
        Ok(Location::new(line_idx + 1, column + 1))
    }

    /// Map a 1-based location back to a char offset.
    ///
    /// The line must be in `[1, line_count]` and the column in
    /// `[1, line length + 1]`.
    pub fn location_to_offset(&self, location: Location) -> Result<usize, DocumentError> {
        let line = self.line_or_err(location.line)?;
        let max_column = line.length + 1;
        if location.column == 0 || location.column > max_column {
            return Err(DocumentError::ColumnOutOfRange {
                line: location.line,
                column: location.column,
                max_column,
            });
        }
        Ok(line.offset + location.column - 1)
    }

    /// The line with the given 1-based number, or `None` when it does not
    /// exist (e.g. a stale reference after a large delete).
    pub fn get_line(&self, line_number: usize) -> Option<DocumentLine> {
        if line_number == 0 || line_number > self.rope.len_lines() {
            return None;
        }
        let line_idx = line_number - 1;
        let offset = self.rope.line_to_char(line_idx);
        let end_with_delimiter = if line_idx + 1 < self.rope.len_lines() {
            self.rope.line_to_char(line_idx + 1)
        } else {
            self.rope.len_chars()
        };
        let delimiter_length = usize::from(line_idx + 1 < self.rope.len_lines());
        Some(DocumentLine {
            line_number,
            offset,
            length: end_with_delimiter - offset - delimiter_length,
            delimiter_length,
        })
    }

    /// The text of the given 1-based line, delimiter excluded.
    pub fn get_line_text(&self, line_number: usize) -> Option<String> {
        let line = self.get_line(line_number)?;
        Some(self.rope.slice(line.offset..line.end_offset()).to_string())
    }

    /// Insert `text` at `offset`, returning the applied length in chars.
    ///
    /// Inserted text is LF-normalized to keep the delimiter invariant.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<usize, DocumentError> {
        if offset > self.rope.len_chars() {
            return Err(DocumentError::OffsetOutOfRange {
                offset,
                length: self.rope.len_chars(),
            });
        }
        let normalized = normalize_to_lf(text);
        self.rope.insert(offset, &normalized);
        Ok(normalized.chars().count())
    }

    /// Remove the chars covered by `segment`, returning the removed length.
    pub fn remove(&mut self, segment: TextSegment) -> Result<usize, DocumentError> {
        self.check_segment(segment)?;
        self.rope.remove(segment.offset..segment.end_offset());
        Ok(segment.length)
    }

    /// Replace the chars covered by `segment` with `text`, returning the
    /// applied (inserted) length in chars.
    pub fn replace(&mut self, segment: TextSegment, text: &str) -> Result<usize, DocumentError> {
        self.check_segment(segment)?;
        self.rope.remove(segment.offset..segment.end_offset());
        let normalized = normalize_to_lf(text);
        self.rope.insert(segment.offset, &normalized);
        Ok(normalized.chars().count())
    }

    /// Clamp a location to the nearest valid caret position.
    pub fn clamp_location(&self, location: Location) -> Location {
        let line = location.line.clamp(1, self.line_count());
        // Line is in range, so get_line cannot fail.
        let max_column = self.get_line(line).map_or(1, |l| l.length + 1);
        Location::new(line, location.column.clamp(1, max_column))
    }

    fn line_or_err(&self, line_number: usize) -> Result<DocumentLine, DocumentError> {
        self.get_line(line_number)
            .ok_or(DocumentError::LineOutOfRange {
                line: line_number,
                line_count: self.rope.len_lines(),
            })
    }

    fn check_segment(&self, segment: TextSegment) -> Result<(), DocumentError> {
        if segment.end_offset() > self.rope.len_chars() {
            return Err(DocumentError::RangeOutOfRange {
                offset: segment.offset,
                end: segment.end_offset(),
                length: self.rope.len_chars(),
            });
        }
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document() {
        let doc = Document::new();
        assert_eq!(doc.len(), 0);
        assert_eq!(doc.line_count(), 1);
        assert!(doc.is_empty());
    }

    #[test]
    fn test_offset_to_location() {
        let doc = Document::from_text("abc\ndef");

        assert_eq!(doc.offset_to_location(0).unwrap(), Location::new(1, 1));
        assert_eq!(doc.offset_to_location(2).unwrap(), Location::new(1, 3));
        assert_eq!(doc.offset_to_location(3).unwrap(), Location::new(1, 4));
        assert_eq!(doc.offset_to_location(4).unwrap(), Location::new(2, 1));
        assert_eq!(doc.offset_to_location(7).unwrap(), Location::new(2, 4));
        assert!(doc.offset_to_location(8).is_err());
    }

    #[test]
    fn test_location_to_offset() {
        let doc = Document::from_text("abc\ndef");

        assert_eq!(doc.location_to_offset(Location::new(1, 1)).unwrap(), 0);
        assert_eq!(doc.location_to_offset(Location::new(1, 4)).unwrap(), 3);
        assert_eq!(doc.location_to_offset(Location::new(2, 1)).unwrap(), 4);
        assert!(doc.location_to_offset(Location::new(3, 1)).is_err());
        assert!(doc.location_to_offset(Location::new(1, 5)).is_err());
        assert!(doc.location_to_offset(Location::new(1, 0)).is_err());
    }

    #[test]
    fn test_roundtrip_all_offsets() {
        let doc = Document::from_text("first\nsecond\n\nlast");
        for offset in 0..=doc.len() {
            let location = doc.offset_to_location(offset).unwrap();
            assert_eq!(doc.location_to_offset(location).unwrap(), offset);
        }
    }

    #[test]
    fn test_insert_remaps_following_lines() {
        let mut doc = Document::from_text("abc\ndef");
        assert_eq!(doc.insert(1, "X").unwrap(), 1);
        assert_eq!(doc.text(), "aXbc\ndef");

        // The 'd' moved to offset 5 but is still line 2, column 1.
        assert_eq!(doc.get_char_at(5).unwrap(), 'd');
        assert_eq!(doc.offset_to_location(5).unwrap(), Location::new(2, 1));
    }

    #[test]
    fn test_get_line() {
        let doc = Document::from_text("abc\ndef\n");

        let first = doc.get_line(1).unwrap();
        assert_eq!(first.offset, 0);
        assert_eq!(first.length, 3);
        assert_eq!(first.delimiter_length, 1);

        // Trailing newline yields an empty final line without a delimiter.
        let last = doc.get_line(3).unwrap();
        assert_eq!(last.offset, 8);
        assert_eq!(last.length, 0);
        assert_eq!(last.delimiter_length, 0);

        assert!(doc.get_line(0).is_none());
        assert!(doc.get_line(4).is_none());
    }

    #[test]
    fn test_get_line_text() {
        let doc = Document::from_text("abc\ndef");
        assert_eq!(doc.get_line_text(1).unwrap(), "abc");
        assert_eq!(doc.get_line_text(2).unwrap(), "def");
        assert!(doc.get_line_text(3).is_none());
    }

    #[test]
    fn test_remove_and_replace() {
        let mut doc = Document::from_text("hello beautiful world");

        assert_eq!(doc.remove(TextSegment::new(6, 10)).unwrap(), 10);
        assert_eq!(doc.text(), "hello world");

        assert_eq!(doc.replace(TextSegment::new(0, 5), "goodbye").unwrap(), 7);
        assert_eq!(doc.text(), "goodbye world");
    }

    #[test]
    fn test_bounds_errors_leave_text_unchanged() {
        let mut doc = Document::from_text("abc");

        assert!(doc.insert(4, "x").is_err());
        assert!(doc.remove(TextSegment::new(2, 5)).is_err());
        assert!(doc.replace(TextSegment::new(0, 4), "y").is_err());
        assert!(doc.get_text_at(TextSegment::new(3, 1)).is_err());
        assert_eq!(doc.text(), "abc");
    }

    #[test]
    fn test_crlf_normalized_and_tracked() {
        let doc = Document::from_text("one\r\ntwo");
        assert_eq!(doc.text(), "one\ntwo");
        assert_eq!(doc.line_ending(), LineEnding::Crlf);
        assert_eq!(doc.text_for_saving(), "one\r\ntwo");
    }

    #[test]
    fn test_inserted_text_normalized() {
        let mut doc = Document::from_text("ab");
        assert_eq!(doc.insert(1, "x\r\ny").unwrap(), 4);
        assert_eq!(doc.text(), "ax\nyb");
    }

    #[test]
    fn test_clamp_location() {
        let doc = Document::from_text("abc\nde");
        assert_eq!(doc.clamp_location(Location::new(9, 9)), Location::new(2, 3));
        assert_eq!(doc.clamp_location(Location::new(0, 0)), Location::new(1, 1));
        assert_eq!(doc.clamp_location(Location::new(1, 2)), Location::new(1, 2));
    }

    #[test]
    fn test_cjk_offsets_are_chars() {
        let doc = Document::from_text("你好\n世界");
        assert_eq!(doc.len(), 5);
        assert_eq!(doc.offset_to_location(3).unwrap(), Location::new(2, 1));
        assert_eq!(doc.get_char_at(3).unwrap(), '世');
    }
}
