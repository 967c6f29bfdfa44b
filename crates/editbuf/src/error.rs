//! Typed bounds errors for document queries and mutations.
//!
//! These cover the recoverable half of the error taxonomy: out-of-range
//! offsets, lines, and columns are reported to the caller and never corrupt
//! buffer state. Contract violations (ending a session on an empty stack,
//! attaching a marker kind to the wrong anchor) are caller bugs and panic
//! instead.

use thiserror::Error;

/// A bounds error raised by document queries and mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// A char offset falls outside `[0, length]`.
    #[error("offset {offset} is outside the document (length {length})")]
    OffsetOutOfRange {
        /// The offending offset.
        offset: usize,
        /// Document length in chars at the time of the call.
        length: usize,
    },
    /// A `(offset, length)` range extends past the end of the document.
    #[error("range {offset}..{end} is outside the document (length {length})")]
    RangeOutOfRange {
        /// Range start offset.
        offset: usize,
        /// Exclusive range end offset.
        end: usize,
        /// Document length in chars at the time of the call.
        length: usize,
    },
    /// A 1-based line number falls outside `[1, line_count]`.
    #[error("line {line} is outside the document (1..={line_count})")]
    LineOutOfRange {
        /// The offending line number.
        line: usize,
        /// Document line count at the time of the call.
        line_count: usize,
    },
    /// A 1-based column falls outside `[1, line length + 1]`.
    #[error("column {column} is outside line {line} (1..={max_column})")]
    ColumnOutOfRange {
        /// Line the column was resolved against.
        line: usize,
        /// The offending column.
        column: usize,
        /// Largest valid column on that line (line length + 1).
        max_column: usize,
    },
}
