#![warn(missing_docs)]
//! editbuf - Headless Text-Buffer and Edit-Session Kernel
//!
//! # Overview
//!
//! `editbuf` is the editing core of a code editor with the view layer cut
//! away: a text buffer with line/offset mapping, text-anchored markers, a
//! stack of modal edit sessions, grouped undo/redo, and a keystroke routing
//! pipeline. The host supplies rendering and raw key events; the kernel
//! supplies every editing decision in between.
//!
//! # Core Features
//!
//! - **Rope-Backed Buffer**: O(log n) edits and line/offset mapping
//! - **Text-Segment Markers**: folds, diagnostics, links, and bookmarks that
//!   survive edits by splice remapping
//! - **Edit Sessions**: stackable modal behaviors (snippet placeholders,
//!   rename links) that intercept keystrokes before and after the default
//!   action
//! - **Grouped Undo**: nestable atomic groups with a clean-state watermark
//!   for modified-flag tracking
//! - **Keystroke Pipeline**: session hooks, an extension chain, and default
//!   edit actions in a fixed, predictable order
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  TextEditor (key routing & mutation API)    │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Sessions, Extensions, Undo Coordinator     │  ← Editing Behavior
//! ├─────────────────────────────────────────────┤
//! │  Marker Store (segment & line anchors)      │  ← Annotations
//! ├─────────────────────────────────────────────┤
//! │  Document (rope, line/offset mapping)       │  ← Text Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use editbuf::{EditKey, Location, Modifiers, TextEditor};
//!
//! let mut editor = TextEditor::from_text("fn main() {}\n");
//!
//! // Type at the caret through the keystroke pipeline.
//! editor.set_caret(Location::new(1, 12));
//! editor.key_press(EditKey::Char('!'), Modifiers::none());
//! assert_eq!(editor.get_line(1).unwrap().length, 13);
//!
//! // Every default edit is one undo step.
//! assert!(editor.undo());
//! assert_eq!(editor.text(), "fn main() {}\n");
//! ```
//!
//! # Module Description
//!
//! - [`document`] - rope-backed buffer with 1-based line/column mapping
//! - [`segment`] - half-open char ranges
//! - [`markers`] - marker store with splice remapping
//! - [`session`] - edit session trait and session stack
//! - [`undo`] - grouped undo/redo coordination
//! - [`keys`] / [`extension`] - key events and the extension chain
//! - [`editor`] - the [`TextEditor`] aggregate and routing pipeline
//!
//! # Threading
//!
//! The kernel is single-threaded by design: all mutation happens on the
//! host's UI thread. Event callbacks are `Send` so a host can forward
//! notifications across threads; the editor itself is never shared.

pub mod document;
pub mod editor;
pub mod error;
pub mod events;
pub mod extension;
pub mod keys;
pub mod line_ending;
pub mod markers;
pub mod options;
pub mod segment;
pub mod session;
pub mod undo;

pub use document::{Document, DocumentLine, Location};
pub use editor::{TextEditor, UndoGroup};
pub use error::DocumentError;
pub use events::{EditorEvent, EventCallback};
pub use extension::KeyExtension;
pub use keys::{EditKey, Modifiers};
pub use line_ending::LineEnding;
pub use markers::{AnchorClass, Marker, MarkerAnchor, MarkerId, MarkerKind, MarkerStore};
pub use options::EditorOptions;
pub use segment::TextSegment;
pub use session::{EditSession, SessionOutcome};
pub use undo::UndoCoordinator;
