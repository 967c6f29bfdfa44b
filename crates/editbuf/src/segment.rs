//! Text segments: half-open `(offset, length)` ranges in character offsets.

/// A half-open range of text addressed by char offset and char length.
///
/// Segments are the addressing unit for edits and for range-attached markers.
/// `offset` and `length` are counts of Unicode scalar values (`char`), never
/// bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextSegment {
    /// Start offset in chars.
    pub offset: usize,
    /// Length in chars (may be zero).
    pub length: usize,
}

impl TextSegment {
    /// Create a new segment.
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    /// Create a segment from half-open start/end offsets.
    ///
    /// Swaps the endpoints if `end < start`.
    pub fn from_bounds(start: usize, end: usize) -> Self {
        let (start, end) = if end < start { (end, start) } else { (start, end) };
        Self {
            offset: start,
            length: end - start,
        }
    }

    /// Exclusive end offset.
    pub fn end_offset(&self) -> usize {
        self.offset + self.length
    }

    /// Whether the segment covers zero chars.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Whether `offset` falls inside the segment (half-open).
    pub fn contains(&self, offset: usize) -> bool {
        self.offset <= offset && offset < self.end_offset()
    }

    /// Whether two segments overlap by at least one char.
    pub fn overlaps(&self, other: &TextSegment) -> bool {
        self.offset < other.end_offset() && other.offset < self.end_offset()
    }
}
