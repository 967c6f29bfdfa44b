//! The host-facing editor kernel.
//!
//! [`TextEditor`] aggregates the document, marker store, session stack, and
//! undo coordinator behind one mutation surface. Every text splice flows
//! through a single internal path that updates the line index and markers,
//! remaps the caret and selection, records undo, and emits notification
//! events — so the pieces can never drift apart.
//!
//! All operations run on a single logical (UI) thread. The editor owns its
//! document exclusively; a split-pane host shares the document by routing
//! both panes through the same `TextEditor`, never by cloning it.

use crate::document::{Document, DocumentLine, Location};
use crate::error::DocumentError;
use crate::events::{EditorEvent, EventCallback};
use crate::extension::KeyExtension;
use crate::keys::{EditKey, Modifiers};
use crate::line_ending::normalize_to_lf;
use crate::markers::{Marker, MarkerAnchor, MarkerId, MarkerKind, MarkerStore};
use crate::options::EditorOptions;
use crate::segment::TextSegment;
use crate::session::{EditSession, SessionStack};
use crate::undo::{TextEdit, UndoCoordinator};
use std::cmp::Ordering;
use tracing::{debug, warn};

/// The text editor kernel: buffer, markers, sessions, undo, and keystroke
/// routing, with notification events for the hosting view.
pub struct TextEditor {
    document: Document,
    markers: MarkerStore,
    sessions: SessionStack,
    undo: UndoCoordinator,
    options: EditorOptions,
    extensions: Vec<Box<dyn KeyExtension>>,
    callbacks: Vec<EventCallback>,
    caret: Location,
    selection: Option<TextSegment>,
    caret_notification_pending: bool,
    inline_search_close_hook: Option<Box<dyn FnMut() + Send>>,
}

impl TextEditor {
    /// Create an editor over the given text with explicit options.
    pub fn with_options(text: &str, options: EditorOptions) -> Self {
        Self {
            document: Document::from_text(text),
            markers: MarkerStore::new(),
            sessions: SessionStack::new(),
            undo: UndoCoordinator::new(options.max_undo_steps),
            options,
            extensions: Vec::new(),
            callbacks: Vec::new(),
            caret: Location::new(1, 1),
            selection: None,
            caret_notification_pending: false,
            inline_search_close_hook: None,
        }
    }

    /// Create an editor over the given text with default options.
    pub fn from_text(text: &str) -> Self {
        Self::with_options(text, EditorOptions::default())
    }

    /// Create an empty editor with default options.
    pub fn new() -> Self {
        Self::from_text("")
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The underlying document (read-only; mutation goes through the
    /// editor so markers, undo, and events stay consistent).
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The marker store (read-only; mutation goes through the editor).
    pub fn markers(&self) -> &MarkerStore {
        &self.markers
    }

    /// Current options.
    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// Replace the options.
    pub fn set_options(&mut self, options: EditorOptions) {
        self.options = options;
    }

    /// The complete (LF-normalized) text.
    pub fn text(&self) -> String {
        self.document.text()
    }

    /// Total length in chars.
    pub fn len(&self) -> usize {
        self.document.len()
    }

    /// Whether the document holds no text.
    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }

    /// Total line count.
    pub fn line_count(&self) -> usize {
        self.document.line_count()
    }

    /// The text covered by `segment`.
    pub fn get_text_at(&self, segment: TextSegment) -> Result<String, DocumentError> {
        self.document.get_text_at(segment)
    }

    /// The char at `offset`.
    pub fn get_char_at(&self, offset: usize) -> Result<char, DocumentError> {
        self.document.get_char_at(offset)
    }

    /// Map a char offset to a 1-based location.
    pub fn offset_to_location(&self, offset: usize) -> Result<Location, DocumentError> {
        self.document.offset_to_location(offset)
    }

    /// Map a 1-based location to a char offset.
    pub fn location_to_offset(&self, location: Location) -> Result<usize, DocumentError> {
        self.document.location_to_offset(location)
    }

    /// The line with the given 1-based number, if it exists.
    pub fn get_line(&self, line_number: usize) -> Option<DocumentLine> {
        self.document.get_line(line_number)
    }

    // ------------------------------------------------------------------
    // Caret & selection
    // ------------------------------------------------------------------

    /// Current caret location (always a valid caret position).
    pub fn caret(&self) -> Location {
        self.caret
    }

    /// Current caret position as a char offset.
    pub fn caret_offset(&self) -> usize {
        self.document
            .location_to_offset(self.caret)
            .expect("caret location is kept valid")
    }

    /// Move the caret, clamping to the nearest valid location.
    ///
    /// The caret-moved notification fires immediately, unless an undo group
    /// is open — then it is deferred and replayed once after the outermost
    /// close.
    pub fn set_caret(&mut self, location: Location) {
        let clamped = self.document.clamp_location(location);
        if clamped != self.caret {
            self.caret = clamped;
            self.note_caret_moved();
        }
    }

    /// Current selection, if any.
    pub fn selection(&self) -> Option<TextSegment> {
        self.selection
    }

    /// Set the selection, clamping to document bounds. An empty segment
    /// clears the selection.
    pub fn set_selection(&mut self, segment: TextSegment) {
        let end = segment.end_offset().min(self.document.len());
        let offset = segment.offset.min(end);
        let clamped = TextSegment::from_bounds(offset, end);
        let new = if clamped.is_empty() { None } else { Some(clamped) };
        if new != self.selection {
            self.selection = new;
            self.emit(EditorEvent::SelectionChanged);
        }
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        if self.selection.take().is_some() {
            self.emit(EditorEvent::SelectionChanged);
        }
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Subscribe to notification events.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&EditorEvent) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Install the host hook invoked when a consumed Escape should also
    /// close an active inline search UI.
    pub fn set_inline_search_close_hook<F>(&mut self, hook: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.inline_search_close_hook = Some(Box::new(hook));
    }

    fn emit(&mut self, event: EditorEvent) {
        for callback in &mut self.callbacks {
            callback(&event);
        }
    }

    fn note_caret_moved(&mut self) {
        if self.undo.is_group_open() {
            self.caret_notification_pending = true;
        } else {
            let location = self.caret;
            self.emit(EditorEvent::CaretMoved { location });
        }
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Insert `text` at `offset`, returning the applied length in chars.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<usize, DocumentError> {
        self.splice(offset, 0, text, true)
    }

    /// Remove the chars covered by `segment`, returning the removed length.
    pub fn remove(&mut self, segment: TextSegment) -> Result<usize, DocumentError> {
        self.splice(segment.offset, segment.length, "", true)?;
        Ok(segment.length)
    }

    /// Replace the chars covered by `segment` with `text`, returning the
    /// applied (inserted) length in chars.
    pub fn replace(&mut self, segment: TextSegment, text: &str) -> Result<usize, DocumentError> {
        self.splice(segment.offset, segment.length, text, true)
    }

    /// Replace the entire text (reload path).
    ///
    /// All edit sessions are unwound and all markers dropped — their anchors
    /// no longer exist. Recorded as a single undoable step.
    pub fn replace_all_text(&mut self, text: &str) {
        debug!(
            sessions_unwound = self.sessions.depth(),
            markers_dropped = self.markers.len(),
            "replacing entire document text"
        );
        self.sessions.unwind();
        self.markers.clear();
        self.clear_selection();
        self.emit(EditorEvent::RedrawRequested { segment: None });

        let whole = TextSegment::new(0, self.document.len());
        self.splice(whole.offset, whole.length, text, true)
            .expect("whole-document range is valid");
    }

    /// The single internal splice path: replaces `remove_len` chars at
    /// `offset` with `insert` and keeps every dependent structure in step.
    fn splice(
        &mut self,
        offset: usize,
        remove_len: usize,
        insert: &str,
        record: bool,
    ) -> Result<usize, DocumentError> {
        let length = self.document.len();
        let end = offset.saturating_add(remove_len);
        if end > length {
            return Err(if remove_len == 0 {
                DocumentError::OffsetOutOfRange { offset, length }
            } else {
                DocumentError::RangeOutOfRange {
                    offset,
                    end,
                    length,
                }
            });
        }

        let removed_segment = TextSegment::new(offset, remove_len);
        let removed_text = self
            .document
            .get_text_at(removed_segment)
            .expect("range checked above");
        let edit_line = self
            .document
            .offset_to_location(offset)
            .expect("offset checked above")
            .line;
        let caret_before = self.caret;
        let caret_offset_before = self.caret_offset();
        let selection_before = self.selection;

        let inserted_text = normalize_to_lf(insert);
        let applied = self
            .document
            .replace(removed_segment, &inserted_text)
            .expect("range checked above");

        let removed_breaks = removed_text.matches('\n').count();
        let inserted_breaks = inserted_text.matches('\n').count();
        self.markers
            .update_for_deletion(removed_segment, edit_line, removed_breaks);
        self.markers
            .update_for_insertion(offset, applied, edit_line, inserted_breaks);

        // Caret and selection follow standard splice semantics: positions
        // before the edit stay, positions after shift by the net delta, and
        // positions inside the removed range collapse to the splice end.
        let caret_offset_after =
            remap_offset(caret_offset_before, offset, remove_len, applied);
        let new_caret = self
            .document
            .offset_to_location(caret_offset_after)
            .expect("remapped caret is in range");
        if new_caret != self.caret {
            self.caret = new_caret;
            self.note_caret_moved();
        }

        if let Some(selection) = selection_before {
            let start = remap_offset(selection.offset, offset, remove_len, applied);
            let end = remap_offset(selection.end_offset(), offset, remove_len, applied);
            let remapped = TextSegment::from_bounds(start, end);
            let new = if remapped.is_empty() { None } else { Some(remapped) };
            if new != self.selection {
                self.selection = new;
                self.emit(EditorEvent::SelectionChanged);
            }
        }

        if record {
            self.undo.record(
                TextEdit {
                    offset,
                    removed: removed_text,
                    inserted: inserted_text,
                },
                caret_before,
                self.caret,
            );
        }

        self.emit(EditorEvent::TextChanged {
            offset,
            removed: remove_len,
            inserted: applied,
        });
        let line_event = match inserted_breaks.cmp(&removed_breaks) {
            Ordering::Greater => EditorEvent::LinesInserted {
                line: edit_line,
                count: inserted_breaks - removed_breaks,
            },
            Ordering::Less => EditorEvent::LinesRemoved {
                line: edit_line,
                count: removed_breaks - inserted_breaks,
            },
            Ordering::Equal => EditorEvent::LineChanged { line: edit_line },
        };
        self.emit(line_event);

        Ok(applied)
    }

    // ------------------------------------------------------------------
    // Undo
    // ------------------------------------------------------------------

    /// Open an undo group, returning a guard that closes it when dropped
    /// (on every exit path).
    ///
    /// The outermost open emits [`EditorEvent::BeginAtomicUndo`]; nested
    /// opens only deepen. While any group is open, edits coalesce into one
    /// undoable step and caret-moved notifications are buffered, replayed
    /// at most once after the outermost close.
    pub fn open_undo_group(&mut self) -> UndoGroup<'_> {
        self.begin_undo_group_internal();
        UndoGroup { editor: self }
    }

    fn begin_undo_group_internal(&mut self) {
        if self.undo.begin_group() {
            self.emit(EditorEvent::BeginAtomicUndo);
        }
    }

    fn end_undo_group_internal(&mut self) {
        if self.undo.end_group() {
            self.emit(EditorEvent::EndAtomicUndo);
            if std::mem::take(&mut self.caret_notification_pending) {
                let location = self.caret;
                self.emit(EditorEvent::CaretMoved { location });
            }
        }
    }

    /// Undo the newest undo group. Returns `false` when there is nothing
    /// to undo.
    ///
    /// # Panics
    ///
    /// Panics when called while an undo group is open; that is a caller
    /// bug.
    pub fn undo(&mut self) -> bool {
        assert!(
            !self.undo.is_group_open(),
            "undo called while an undo group is open"
        );
        let Some(steps) = self.undo.take_undo_group() else {
            return false;
        };
        self.begin_undo_group_internal();
        for step in &steps {
            self.splice(step.edit.offset, step.edit.inserted_len(), &step.edit.removed, false)
                .expect("undo step matches document state");
        }
        let caret = steps.last().expect("group is nonempty").caret_before;
        self.set_caret(caret);
        self.undo.store_redo_group(steps);
        self.end_undo_group_internal();
        true
    }

    /// Redo the newest undone group. Returns `false` when there is nothing
    /// to redo.
    ///
    /// # Panics
    ///
    /// Panics when called while an undo group is open.
    pub fn redo(&mut self) -> bool {
        assert!(
            !self.undo.is_group_open(),
            "redo called while an undo group is open"
        );
        let Some(steps) = self.undo.take_redo_group() else {
            return false;
        };
        self.begin_undo_group_internal();
        for step in &steps {
            self.splice(step.edit.offset, step.edit.removed_len(), &step.edit.inserted, false)
                .expect("redo step matches document state");
        }
        let caret = steps.last().expect("group is nonempty").caret_after;
        self.set_caret(caret);
        self.undo.restore_undo_group(steps);
        self.end_undo_group_internal();
        true
    }

    /// Whether an undo step is available.
    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    /// Whether a redo step is available.
    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    /// Number of recorded edits on the undo stack.
    pub fn undo_depth(&self) -> usize {
        self.undo.undo_depth()
    }

    /// Number of recorded edits on the redo stack.
    pub fn redo_depth(&self) -> usize {
        self.undo.redo_depth()
    }

    /// Whether the buffer matches its last marked-clean state.
    pub fn is_clean(&self) -> bool {
        self.undo.is_clean()
    }

    /// Mark the current state as clean (e.g. after saving).
    pub fn mark_clean(&mut self) {
        self.undo.mark_clean();
    }

    // ------------------------------------------------------------------
    // Markers
    // ------------------------------------------------------------------

    /// Add a marker and request a redraw from the host.
    ///
    /// # Panics
    ///
    /// Panics when the kind's anchor class does not match the anchor (see
    /// [`MarkerStore::add`]).
    pub fn add_marker(&mut self, anchor: MarkerAnchor, kind: MarkerKind) -> MarkerId {
        let id = self.markers.add(anchor, kind);
        let segment = self.markers.get(id).and_then(Marker::segment);
        self.emit(EditorEvent::RedrawRequested { segment });
        id
    }

    /// Remove a marker and request a redraw. Idempotent: returns `false`
    /// (and emits nothing) when the marker is not present.
    pub fn remove_marker(&mut self, id: MarkerId) -> bool {
        let segment = self.markers.get(id).and_then(Marker::segment);
        if self.markers.remove(id) {
            self.emit(EditorEvent::RedrawRequested { segment });
            true
        } else {
            false
        }
    }

    /// Segment markers whose range contains `offset`, in insertion order.
    pub fn markers_at(&self, offset: usize) -> impl Iterator<Item = &Marker> {
        self.markers.markers_at(offset)
    }

    /// Segment markers whose range overlaps `segment`, in insertion order.
    pub fn markers_in(&self, segment: TextSegment) -> impl Iterator<Item = &Marker> {
        self.markers.markers_in(segment)
    }

    /// Fold markers whose range contains `offset`.
    pub fn foldings_containing(&self, offset: usize) -> impl Iterator<Item = &Marker> {
        self.markers.foldings_containing(offset)
    }

    /// Fold markers whose range overlaps `segment`.
    pub fn foldings_in(&self, segment: TextSegment) -> impl Iterator<Item = &Marker> {
        self.markers.foldings_in(segment)
    }

    /// Collapse or expand a fold marker, requesting a redraw on success.
    pub fn set_fold_collapsed(&mut self, id: MarkerId, collapsed: bool) -> bool {
        if self.markers.set_fold_collapsed(id, collapsed) {
            let segment = self.markers.get(id).and_then(Marker::segment);
            self.emit(EditorEvent::RedrawRequested { segment });
            true
        } else {
            false
        }
    }

    /// Set or clear the bookmark flag on a line, requesting a redraw.
    pub fn set_bookmarked(&mut self, line: usize, value: bool) {
        if self.markers.is_bookmarked(line) != value {
            self.markers.set_bookmarked(line, value);
            self.emit(EditorEvent::RedrawRequested { segment: None });
        }
    }

    /// Whether the given line carries a bookmark.
    pub fn is_bookmarked(&self, line: usize) -> bool {
        self.markers.is_bookmarked(line)
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    /// Start an edit session: fires its `session_started` hook, then pushes
    /// it as the new current session.
    pub fn start_session(&mut self, mut session: Box<dyn EditSession>) {
        session.session_started(self);
        self.sessions.push(session);
    }

    /// End (pop and drop) the current session.
    ///
    /// # Panics
    ///
    /// Panics when no session is active; that is a caller bug.
    pub fn end_session(&mut self) {
        drop(self.sessions.pop());
    }

    /// The current (top) session, if any.
    pub fn current_session(&self) -> Option<&dyn EditSession> {
        self.sessions.current()
    }

    /// Number of active sessions.
    pub fn session_depth(&self) -> usize {
        self.sessions.depth()
    }

    // ------------------------------------------------------------------
    // Extensions & key routing
    // ------------------------------------------------------------------

    /// Append a keystroke extension to the end of the chain.
    pub fn add_extension(&mut self, extension: Box<dyn KeyExtension>) {
        self.extensions.push(extension);
    }

    /// Route one keystroke through the pipeline.
    ///
    /// Order: current session's `before_*` hook, then the extension chain,
    /// then the default edit action (wrapped in an undo group unless
    /// [`EditorOptions::generate_format_undo_steps`] is off), then the
    /// session's `after_*` hook when the before hook did not handle the
    /// key. Returns whether any stage consumed or applied the keystroke.
    pub fn key_press(&mut self, key: EditKey, modifiers: Modifiers) -> bool {
        let chord = modifiers.is_chord();
        let handled = if chord { false } else { self.run_session_before(key) };

        let consumed_by_chain = if handled {
            false
        } else {
            self.offer_to_extensions(key, modifiers)
        };

        if (handled || consumed_by_chain) && key == EditKey::Escape {
            if let Some(hook) = self.inline_search_close_hook.as_mut() {
                hook();
            }
        }

        if handled {
            return true;
        }

        let applied = if consumed_by_chain {
            false
        } else {
            self.apply_default_action(key, modifiers)
        };

        if !chord {
            self.run_session_after(key);
        }

        consumed_by_chain || applied
    }

    fn run_session_before(&mut self, key: EditKey) -> bool {
        let Some(mut session) = self.sessions.take_current() else {
            return false;
        };
        let depth = self.sessions.depth();
        let outcome = match key {
            EditKey::Return => Some(session.before_return(self)),
            EditKey::Backspace => Some(session.before_backspace(self)),
            EditKey::Delete => Some(session.before_delete(self)),
            EditKey::Char(ch) => Some(session.before_type(self, ch)),
            EditKey::Escape => None,
        };
        match outcome {
            Some(outcome) => {
                if !outcome.end_session {
                    self.sessions.restore(depth, session);
                }
                outcome.handled
            }
            None => {
                self.sessions.restore(depth, session);
                false
            }
        }
    }

    fn run_session_after(&mut self, key: EditKey) {
        let Some(mut session) = self.sessions.take_current() else {
            return;
        };
        let depth = self.sessions.depth();
        let outcome = match key {
            EditKey::Return => Some(session.after_return(self)),
            EditKey::Backspace => Some(session.after_backspace(self)),
            EditKey::Delete => Some(session.after_delete(self)),
            EditKey::Char(ch) => Some(session.after_type(self, ch)),
            EditKey::Escape => None,
        };
        let end = outcome.is_some_and(|o| o.end_session);
        if !end {
            self.sessions.restore(depth, session);
        }
    }

    fn offer_to_extensions(&mut self, key: EditKey, modifiers: Modifiers) -> bool {
        if self.extensions.is_empty() {
            return false;
        }
        // Detach the chain so extensions can borrow the editor mutably.
        let mut chain = std::mem::take(&mut self.extensions);
        let mut consumed = false;
        for extension in &mut chain {
            match extension.key_press(self, key, modifiers) {
                Ok(true) => {
                    consumed = true;
                    break;
                }
                Ok(false) => {}
                Err(error) => {
                    // An extension failure must never abort a keystroke.
                    warn!(
                        extension = extension.name(),
                        %error,
                        "key extension failed; treating keystroke as not consumed"
                    );
                }
            }
        }
        let added_during_dispatch = std::mem::replace(&mut self.extensions, chain);
        self.extensions.extend(added_during_dispatch);
        consumed
    }

    fn apply_default_action(&mut self, key: EditKey, modifiers: Modifiers) -> bool {
        if modifiers.is_chord() {
            return false;
        }
        if self.options.generate_format_undo_steps {
            self.begin_undo_group_internal();
            let applied = self.default_edit(key);
            self.end_undo_group_internal();
            applied
        } else {
            self.default_edit(key)
        }
    }

    fn default_edit(&mut self, key: EditKey) -> bool {
        match key {
            EditKey::Char(ch) => {
                let mut buffer = [0u8; 4];
                self.type_text(ch.encode_utf8(&mut buffer));
                true
            }
            EditKey::Return => {
                self.type_text("\n");
                true
            }
            EditKey::Backspace => self.delete_backward(),
            EditKey::Delete => self.delete_forward(),
            EditKey::Escape => {
                let had_selection = self.selection.is_some();
                self.clear_selection();
                had_selection
            }
        }
    }

    /// Insert text at the caret (replacing the selection, if any) and move
    /// the caret past it. Used by the default keystroke actions; also
    /// useful for sessions and extensions that emit text.
    pub fn type_text(&mut self, text: &str) {
        if let Some(selection) = self.selection {
            self.clear_selection();
            let applied = self
                .splice(selection.offset, selection.length, text, true)
                .expect("selection is kept in bounds");
            self.set_caret_to_offset(selection.offset + applied);
        } else {
            let offset = self.caret_offset();
            let applied = self
                .splice(offset, 0, text, true)
                .expect("caret offset is kept in bounds");
            self.set_caret_to_offset(offset + applied);
        }
    }

    fn delete_backward(&mut self) -> bool {
        if let Some(selection) = self.selection {
            self.clear_selection();
            self.splice(selection.offset, selection.length, "", true)
                .expect("selection is kept in bounds");
            self.set_caret_to_offset(selection.offset);
            return true;
        }
        let offset = self.caret_offset();
        if offset == 0 {
            return false;
        }
        let start = self.previous_grapheme_start(offset);
        self.splice(start, offset - start, "", true)
            .expect("grapheme boundary is in bounds");
        self.set_caret_to_offset(start);
        true
    }

    fn delete_forward(&mut self) -> bool {
        if let Some(selection) = self.selection {
            self.clear_selection();
            self.splice(selection.offset, selection.length, "", true)
                .expect("selection is kept in bounds");
            self.set_caret_to_offset(selection.offset);
            return true;
        }
        let offset = self.caret_offset();
        if offset == self.document.len() {
            return false;
        }
        let end = self.next_grapheme_end(offset);
        self.splice(offset, end - offset, "", true)
            .expect("grapheme boundary is in bounds");
        true
    }

    fn set_caret_to_offset(&mut self, offset: usize) {
        let location = self
            .document
            .offset_to_location(offset)
            .expect("offset produced by a completed splice");
        self.set_caret(location);
    }

    /// Start offset of the grapheme cluster ending at `offset`.
    /// Caller guarantees `offset > 0`.
    fn previous_grapheme_start(&self, offset: usize) -> usize {
        use unicode_segmentation::UnicodeSegmentation;

        let location = self
            .document
            .offset_to_location(offset)
            .expect("caret offset is kept valid");
        let line = self
            .document
            .get_line(location.line)
            .expect("caret line exists");
        if offset == line.offset {
            // At a line start the previous char is the delimiter.
            return offset - 1;
        }
        let prefix = self
            .document
            .get_text_at(TextSegment::from_bounds(line.offset, offset))
            .expect("line prefix is in bounds");
        let last = prefix
            .graphemes(true)
            .next_back()
            .expect("prefix is nonempty");
        offset - last.chars().count()
    }

    /// End offset of the grapheme cluster starting at `offset`.
    /// Caller guarantees `offset < len`.
    fn next_grapheme_end(&self, offset: usize) -> usize {
        use unicode_segmentation::UnicodeSegmentation;

        let location = self
            .document
            .offset_to_location(offset)
            .expect("caret offset is kept valid");
        let line = self
            .document
            .get_line(location.line)
            .expect("caret line exists");
        if offset >= line.end_offset() {
            // At a line end the next char is the delimiter.
            return offset + 1;
        }
        let rest = self
            .document
            .get_text_at(TextSegment::from_bounds(offset, line.end_offset()))
            .expect("line suffix is in bounds");
        let first = rest.graphemes(true).next().expect("suffix is nonempty");
        offset + first.chars().count()
    }
}

impl Default for TextEditor {
    fn default() -> Self {
        Self::new()
    }
}

/// Remap a position through a splice: positions before the edit stay,
/// positions after shift by the net delta, positions inside the removed
/// range collapse to the splice end.
fn remap_offset(position: usize, offset: usize, removed: usize, inserted: usize) -> usize {
    if position <= offset {
        position
    } else if position >= offset + removed {
        position - removed + inserted
    } else {
        offset + inserted
    }
}

/// RAII guard for an open undo group; closes the group when dropped.
///
/// Dereferences to the editor so grouped edits read naturally:
///
/// ```
/// use editbuf::TextEditor;
///
/// let mut editor = TextEditor::new();
/// {
///     let mut group = editor.open_undo_group();
///     group.insert(0, "(").unwrap();
///     group.insert(1, ")").unwrap();
/// }
/// assert!(editor.undo());
/// assert_eq!(editor.text(), "");
/// ```
pub struct UndoGroup<'a> {
    editor: &'a mut TextEditor,
}

impl std::ops::Deref for UndoGroup<'_> {
    type Target = TextEditor;

    fn deref(&self) -> &TextEditor {
        self.editor
    }
}

impl std::ops::DerefMut for UndoGroup<'_> {
    fn deref_mut(&mut self) -> &mut TextEditor {
        self.editor
    }
}

impl Drop for UndoGroup<'_> {
    fn drop(&mut self) {
        self.editor.end_undo_group_internal();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_reports_applied_length() {
        let mut editor = TextEditor::new();
        assert_eq!(editor.insert(0, "hello").unwrap(), 5);
        assert_eq!(editor.text(), "hello");
        assert!(editor.insert(99, "x").is_err());
    }

    #[test]
    fn test_remove_reports_removed_length() {
        let mut editor = TextEditor::from_text("hello world");
        assert_eq!(editor.remove(TextSegment::new(5, 6)).unwrap(), 6);
        assert_eq!(editor.text(), "hello");
    }

    #[test]
    fn test_caret_follows_edits() {
        let mut editor = TextEditor::from_text("abc\ndef");
        editor.set_caret(Location::new(2, 2));

        // Insertion before the caret shifts it right by the net delta.
        editor.insert(0, "xx").unwrap();
        assert_eq!(editor.caret(), Location::new(2, 2));
        assert_eq!(editor.caret_offset(), 7);

        // Deleting the line break pulls the caret onto line 1.
        editor.remove(TextSegment::new(5, 1)).unwrap();
        assert_eq!(editor.caret(), Location::new(1, 7));
    }

    #[test]
    fn test_selection_remaps_and_collapses() {
        let mut editor = TextEditor::from_text("abcdef");
        editor.set_selection(TextSegment::new(2, 2));

        editor.insert(0, "x").unwrap();
        assert_eq!(editor.selection(), Some(TextSegment::new(3, 2)));

        // Deleting the selected range collapses the selection.
        editor.remove(TextSegment::new(3, 2)).unwrap();
        assert_eq!(editor.selection(), None);
    }

    #[test]
    fn test_type_text_replaces_selection() {
        let mut editor = TextEditor::from_text("hello world");
        editor.set_selection(TextSegment::new(6, 5));
        editor.type_text("there");
        assert_eq!(editor.text(), "hello there");
        assert_eq!(editor.caret_offset(), 11);
        assert_eq!(editor.selection(), None);
    }

    #[test]
    fn test_backspace_deletes_grapheme() {
        let mut editor = TextEditor::from_text("ae\u{301}");
        editor.set_caret(Location::new(1, 3));

        assert!(editor.key_press(EditKey::Backspace, Modifiers::none()));
        assert_eq!(editor.text(), "a");
    }

    #[test]
    fn test_backspace_joins_lines() {
        let mut editor = TextEditor::from_text("ab\ncd");
        editor.set_caret(Location::new(2, 1));

        assert!(editor.key_press(EditKey::Backspace, Modifiers::none()));
        assert_eq!(editor.text(), "abcd");
        assert_eq!(editor.caret(), Location::new(1, 3));
    }

    #[test]
    fn test_backspace_at_start_is_noop() {
        let mut editor = TextEditor::from_text("ab");
        assert!(!editor.key_press(EditKey::Backspace, Modifiers::none()));
        assert_eq!(editor.text(), "ab");
    }

    #[test]
    fn test_delete_forward() {
        let mut editor = TextEditor::from_text("ab\ncd");
        editor.set_caret(Location::new(1, 3));

        assert!(editor.key_press(EditKey::Delete, Modifiers::none()));
        assert_eq!(editor.text(), "abcd");

        editor.set_caret(Location::new(1, 5));
        assert!(!editor.key_press(EditKey::Delete, Modifiers::none()));
    }

    #[test]
    fn test_typing_generates_undo_steps() {
        let mut editor = TextEditor::from_text("");
        editor.key_press(EditKey::Char('a'), Modifiers::none());
        editor.key_press(EditKey::Char('b'), Modifiers::none());
        assert_eq!(editor.text(), "ab");

        assert!(editor.undo());
        assert_eq!(editor.text(), "a");
        assert!(editor.undo());
        assert_eq!(editor.text(), "");
        assert!(!editor.undo());
    }

    #[test]
    fn test_chord_does_not_insert_text() {
        let mut editor = TextEditor::new();
        let modifiers = Modifiers {
            ctrl: true,
            ..Modifiers::default()
        };
        assert!(!editor.key_press(EditKey::Char('c'), modifiers));
        assert_eq!(editor.text(), "");
    }

    #[test]
    fn test_undo_redo_restores_text_and_caret() {
        let mut editor = TextEditor::from_text("abc");
        editor.set_caret(Location::new(1, 4));
        editor.type_text("d");
        assert_eq!(editor.text(), "abcd");

        assert!(editor.undo());
        assert_eq!(editor.text(), "abc");
        assert_eq!(editor.caret(), Location::new(1, 4));

        assert!(editor.redo());
        assert_eq!(editor.text(), "abcd");
        assert_eq!(editor.caret(), Location::new(1, 5));
    }

    #[test]
    fn test_clean_tracking_through_editor() {
        let mut editor = TextEditor::from_text("abc");
        assert!(editor.is_clean());

        editor.insert(3, "!").unwrap();
        assert!(!editor.is_clean());

        editor.undo();
        assert!(editor.is_clean());
    }

    #[test]
    fn test_replace_all_text_unwinds_sessions_and_markers() {
        struct Inert;
        impl EditSession for Inert {}

        let mut editor = TextEditor::from_text("abc");
        editor.start_session(Box::new(Inert));
        editor.add_marker(
            MarkerAnchor::Segment(TextSegment::new(0, 2)),
            MarkerKind::Underline,
        );

        editor.replace_all_text("xyz\n123");
        assert_eq!(editor.text(), "xyz\n123");
        assert_eq!(editor.session_depth(), 0);
        assert!(editor.markers().is_empty());

        // The replacement itself is one undo step.
        assert!(editor.undo());
        assert_eq!(editor.text(), "abc");
    }

    #[test]
    #[should_panic(expected = "no active session")]
    fn test_end_session_without_session_panics() {
        let mut editor = TextEditor::new();
        editor.end_session();
    }
}
