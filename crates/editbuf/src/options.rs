//! Editor configuration.
//!
//! An explicit options struct passed in at construction, in place of the
//! ambient global option singletons common in desktop editors. Hosts change
//! options through the editor, never through hidden shared state.

/// Configuration for a [`TextEditor`](crate::TextEditor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorOptions {
    /// Wrap each default-handled keystroke in its own undo group so that
    /// composite actions (auto-insert, reformat) coalesce into one undoable
    /// step. When disabled, raw default handling runs unwrapped.
    pub generate_format_undo_steps: bool,
    /// Bound on the number of recorded edits kept on the undo stack.
    pub max_undo_steps: usize,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            generate_format_undo_steps: true,
            max_undo_steps: 1024,
        }
    }
}
