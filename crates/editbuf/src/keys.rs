//! Keystroke classification for the routing pipeline.

/// A keystroke as classified by the routing pipeline.
///
/// Hosts translate toolkit key events into this enum; everything that is not
/// one of the structural keys arrives as [`EditKey::Char`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    /// The Return/Enter key.
    Return,
    /// The Backspace key.
    Backspace,
    /// The forward Delete key.
    Delete,
    /// The Escape key.
    Escape,
    /// A printable char.
    Char(char),
}

/// Modifier state accompanying a keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    /// Control key held.
    pub ctrl: bool,
    /// Alt/Meta key held.
    pub alt: bool,
    /// Shift key held.
    pub shift: bool,
}

impl Modifiers {
    /// No modifiers held.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether any modifier other than Shift is held. Chorded keys are
    /// offered to extensions but never fall through to text input.
    pub fn is_chord(&self) -> bool {
        self.ctrl || self.alt
    }
}
