//! Notification events consumed by the hosting GUI layer.

use crate::document::Location;
use crate::segment::TextSegment;

/// A notification emitted by the editor to its subscribers.
///
/// Events fire synchronously on the calling (UI) thread, after the state
/// change they describe has been applied. Subscribers receive a shared
/// reference and must not call back into the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// Text was spliced: `removed` chars were replaced by `inserted` chars
    /// at `offset`.
    TextChanged {
        /// Char offset of the splice.
        offset: usize,
        /// Number of removed chars.
        removed: usize,
        /// Number of inserted chars.
        inserted: usize,
    },
    /// A single line's content changed without altering the line count.
    LineChanged {
        /// 1-based line number.
        line: usize,
    },
    /// `count` lines were inserted starting below `line`.
    LinesInserted {
        /// 1-based line number of the edit.
        line: usize,
        /// Number of new lines.
        count: usize,
    },
    /// `count` lines were removed below `line`.
    LinesRemoved {
        /// 1-based line number of the edit.
        line: usize,
        /// Number of removed lines.
        count: usize,
    },
    /// The caret moved. Deferred while an undo group is open and replayed
    /// once after the outermost close.
    CaretMoved {
        /// The new caret location.
        location: Location,
    },
    /// The selection changed (set, extended, or cleared).
    SelectionChanged,
    /// The outermost undo group opened.
    BeginAtomicUndo,
    /// The outermost undo group closed.
    EndAtomicUndo,
    /// The host view should repaint. Emitted after marker changes; `segment`
    /// is the affected range for range markers, `None` for line markers and
    /// whole-store changes.
    RedrawRequested {
        /// Affected range, if known.
        segment: Option<TextSegment>,
    },
}

/// Subscriber callback type for [`EditorEvent`] notifications.
pub type EventCallback = Box<dyn FnMut(&EditorEvent) + Send>;
