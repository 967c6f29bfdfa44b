//! The pluggable keystroke extension chain.
//!
//! Extensions are an ordered list of polymorphic handlers consulted after
//! the current edit session but before default text input. The first
//! extension that reports it consumed the key stops the chain. A failing
//! extension must never abort a keystroke: the editor catches the error at
//! the routing boundary, logs it, and treats the key as not consumed.

use crate::editor::TextEditor;
use crate::keys::{EditKey, Modifiers};

/// A pluggable keystroke handler.
pub trait KeyExtension {
    /// A short name used in trace logs.
    fn name(&self) -> &'static str {
        "extension"
    }

    /// Offer a keystroke to this extension.
    ///
    /// Returns `Ok(true)` when the key was consumed, `Ok(false)` to pass it
    /// on. An `Err` is logged by the routing pipeline and treated as
    /// `Ok(false)`.
    fn key_press(
        &mut self,
        editor: &mut TextEditor,
        key: EditKey,
        modifiers: Modifiers,
    ) -> anyhow::Result<bool>;
}
