//! Undo bookkeeping: edit records, group coalescing, and clean-state
//! tracking.
//!
//! The coordinator demarcates atomic multi-edit operations. While a group is
//! open (see [`TextEditor::open_undo_group`](crate::TextEditor::open_undo_group)),
//! every recorded edit shares one group id and undoes/redoes as a single
//! step. Groups nest; only the outermost open/close is observable to the
//! host. The caret-notification deferral that accompanies a group lives in
//! the editor, which owns the event surface.

use crate::document::Location;

/// One recorded text splice: `removed` was replaced by `inserted` at
/// `offset`. Offsets are pre-edit char offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TextEdit {
    pub offset: usize,
    pub removed: String,
    pub inserted: String,
}

impl TextEdit {
    pub fn removed_len(&self) -> usize {
        self.removed.chars().count()
    }

    pub fn inserted_len(&self) -> usize {
        self.inserted.chars().count()
    }
}

/// One undoable step: an edit plus the caret on either side of it.
#[derive(Debug, Clone)]
pub(crate) struct UndoStep {
    pub group_id: usize,
    pub edit: TextEdit,
    pub caret_before: Location,
    pub caret_after: Location,
}

/// Coordinates undo groups and owns the undo/redo stacks.
///
/// Clean tracking uses `undo_stack.len()` as the saved position in the
/// linear history; when the redo stack is non-empty the clean index may lie
/// beyond the undo stack, and clearing redo makes it unreachable.
pub struct UndoCoordinator {
    undo_stack: Vec<UndoStep>,
    redo_stack: Vec<UndoStep>,
    max_undo: usize,
    clean_index: Option<usize>,
    next_group_id: usize,
    open_group_id: Option<usize>,
    group_depth: usize,
}

impl UndoCoordinator {
    /// Create a coordinator with a bounded undo depth.
    pub fn new(max_undo: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_undo,
            clean_index: Some(0),
            next_group_id: 0,
            open_group_id: None,
            group_depth: 0,
        }
    }

    /// Whether any undo group is currently open.
    pub fn is_group_open(&self) -> bool {
        self.group_depth > 0
    }

    /// Current nesting depth of open groups.
    pub fn group_depth(&self) -> usize {
        self.group_depth
    }

    /// Whether an undo step is available.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether a redo step is available.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of recorded edits on the undo stack.
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of recorded edits on the redo stack.
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Whether the buffer matches its last marked-clean state.
    pub fn is_clean(&self) -> bool {
        self.clean_index == Some(self.undo_stack.len())
    }

    /// Mark the current history position as clean (e.g. after saving).
    pub fn mark_clean(&mut self) {
        self.clean_index = Some(self.undo_stack.len());
    }

    /// Open a (possibly nested) group. Returns `true` for the outermost
    /// open.
    pub(crate) fn begin_group(&mut self) -> bool {
        self.group_depth += 1;
        if self.group_depth == 1 {
            let id = self.fresh_group_id();
            self.open_group_id = Some(id);
            true
        } else {
            false
        }
    }

    /// Close a group. Returns `true` for the outermost close.
    ///
    /// # Panics
    ///
    /// Panics when no group is open; unbalanced closes are a caller bug.
    pub(crate) fn end_group(&mut self) -> bool {
        assert!(self.group_depth > 0, "undo group closed while none is open");
        self.group_depth -= 1;
        if self.group_depth == 0 {
            self.open_group_id = None;
            true
        } else {
            false
        }
    }

    /// Record an applied edit on the undo stack, clearing redo history.
    pub(crate) fn record(&mut self, edit: TextEdit, caret_before: Location, caret_after: Location) {
        self.clear_redo_and_adjust_clean();

        if self.undo_stack.len() >= self.max_undo && !self.undo_stack.is_empty() {
            self.undo_stack.remove(0);
            self.clean_index = match self.clean_index {
                Some(0) | None => None,
                Some(idx) => Some(idx - 1),
            };
        }

        let group_id = match self.open_group_id {
            Some(id) => id,
            None => self.fresh_group_id(),
        };

        self.undo_stack.push(UndoStep {
            group_id,
            edit,
            caret_before,
            caret_after,
        });
    }

    /// Pop the newest undo group. Steps come back in reverse-chronological
    /// order, ready to be inverted front to back.
    pub(crate) fn take_undo_group(&mut self) -> Option<Vec<UndoStep>> {
        Self::take_group(&mut self.undo_stack)
    }

    /// Pop the newest redo group. Steps come back in chronological order,
    /// ready to be reapplied front to back.
    pub(crate) fn take_redo_group(&mut self) -> Option<Vec<UndoStep>> {
        Self::take_group(&mut self.redo_stack)
    }

    /// Park an undone group on the redo stack (in the order produced by
    /// [`take_undo_group`](Self::take_undo_group)).
    pub(crate) fn store_redo_group(&mut self, steps: Vec<UndoStep>) {
        self.redo_stack.extend(steps);
    }

    /// Return a redone group to the undo stack (in the order produced by
    /// [`take_redo_group`](Self::take_redo_group)), without clearing redo.
    pub(crate) fn restore_undo_group(&mut self, steps: Vec<UndoStep>) {
        self.undo_stack.extend(steps);
    }

    fn take_group(stack: &mut Vec<UndoStep>) -> Option<Vec<UndoStep>> {
        let group_id = stack.last()?.group_id;
        let mut steps = Vec::new();
        while stack.last().is_some_and(|s| s.group_id == group_id) {
            steps.push(stack.pop().expect("checked"));
        }
        Some(steps)
    }

    fn fresh_group_id(&mut self) -> usize {
        let id = self.next_group_id;
        self.next_group_id = self.next_group_id.wrapping_add(1);
        id
    }

    fn clear_redo_and_adjust_clean(&mut self) {
        if self.redo_stack.is_empty() {
            return;
        }
        // A clean point inside the cleared redo area becomes unreachable.
        if self
            .clean_index
            .is_some_and(|idx| idx > self.undo_stack.len())
        {
            self.clean_index = None;
        }
        self.redo_stack.clear();
    }
}
