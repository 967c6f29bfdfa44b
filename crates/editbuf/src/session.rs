//! Modal edit sessions.
//!
//! An [`EditSession`] is a stack frame representing a modal input-intercepting
//! mode (template text-link editing, insertion-cursor mode, and the like).
//! Sessions nest: starting a session while one is active pushes on top, and
//! only the top session is consulted per keystroke — lower frames stay inert
//! until the ones above them end.

use crate::editor::TextEditor;
use tracing::debug;

/// What a session hook decided about a keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOutcome {
    /// The keystroke was consumed. Only meaningful from `before_*` hooks;
    /// a handled keystroke skips the default action and the `after_*` hook.
    pub handled: bool,
    /// End this session after the hook returns.
    ///
    /// This is the supported way for a session to end itself: a hook must
    /// not call [`TextEditor::end_session`] on its own frame, because that
    /// frame is detached from the stack while the hook runs.
    pub end_session: bool,
}

impl SessionOutcome {
    /// Not handled; session continues.
    pub fn pass() -> Self {
        Self {
            handled: false,
            end_session: false,
        }
    }

    /// Handled; session continues.
    pub fn handled() -> Self {
        Self {
            handled: true,
            end_session: false,
        }
    }

    /// Not handled; end this session.
    pub fn end() -> Self {
        Self {
            handled: false,
            end_session: true,
        }
    }

    /// Handled; end this session.
    pub fn handled_and_end() -> Self {
        Self {
            handled: true,
            end_session: true,
        }
    }
}

/// A modal editing mode that can intercept keystrokes before and after the
/// default edit actions.
///
/// Each hook receives the hosting editor; the session's own frame is
/// detached from the stack for the duration of the call, so hooks may edit
/// text, move the caret, or even start a nested session. `after_*` hooks run
/// only when the keystroke was not already handled by the `before_*` hook.
pub trait EditSession {
    /// A short name used in trace logs.
    fn name(&self) -> &'static str {
        "session"
    }

    /// Invoked once when the session is pushed onto the stack.
    fn session_started(&mut self, _editor: &mut TextEditor) {}

    /// Runs before the default Return action.
    fn before_return(&mut self, _editor: &mut TextEditor) -> SessionOutcome {
        SessionOutcome::pass()
    }

    /// Runs before the default Backspace action.
    fn before_backspace(&mut self, _editor: &mut TextEditor) -> SessionOutcome {
        SessionOutcome::pass()
    }

    /// Runs before the default Delete action.
    fn before_delete(&mut self, _editor: &mut TextEditor) -> SessionOutcome {
        SessionOutcome::pass()
    }

    /// Runs before a printable char is typed.
    fn before_type(&mut self, _editor: &mut TextEditor, _ch: char) -> SessionOutcome {
        SessionOutcome::pass()
    }

    /// Runs after the default Return action (unless handled before).
    fn after_return(&mut self, _editor: &mut TextEditor) -> SessionOutcome {
        SessionOutcome::pass()
    }

    /// Runs after the default Backspace action (unless handled before).
    fn after_backspace(&mut self, _editor: &mut TextEditor) -> SessionOutcome {
        SessionOutcome::pass()
    }

    /// Runs after the default Delete action (unless handled before).
    fn after_delete(&mut self, _editor: &mut TextEditor) -> SessionOutcome {
        SessionOutcome::pass()
    }

    /// Runs after a printable char was typed (unless handled before).
    fn after_type(&mut self, _editor: &mut TextEditor, _ch: char) -> SessionOutcome {
        SessionOutcome::pass()
    }
}

/// The LIFO stack of active edit sessions.
pub struct SessionStack {
    frames: Vec<Box<dyn EditSession>>,
}

impl SessionStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Push a frame. The caller fires `session_started`.
    pub(crate) fn push(&mut self, session: Box<dyn EditSession>) {
        debug!(session = session.name(), depth = self.frames.len() + 1, "session started");
        self.frames.push(session);
    }

    /// Pop and return the current frame.
    ///
    /// # Panics
    ///
    /// Panics when the stack is empty; ending a session that was never
    /// started is a caller bug.
    pub(crate) fn pop(&mut self) -> Box<dyn EditSession> {
        let session = self
            .frames
            .pop()
            .expect("end_session called with no active session");
        debug!(session = session.name(), depth = self.frames.len(), "session ended");
        session
    }

    /// Detach the current frame for hook dispatch, if any.
    pub(crate) fn take_current(&mut self) -> Option<Box<dyn EditSession>> {
        self.frames.pop()
    }

    /// Re-attach a frame detached by [`take_current`](Self::take_current) at
    /// its original depth, below any frames pushed during the hook.
    pub(crate) fn restore(&mut self, depth: usize, session: Box<dyn EditSession>) {
        let index = depth.min(self.frames.len());
        self.frames.insert(index, session);
    }

    /// The current (top) session.
    pub fn current(&self) -> Option<&dyn EditSession> {
        self.frames.last().map(|s| s.as_ref())
    }

    /// Number of active sessions.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether any session is active.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Pop every frame in LIFO order.
    ///
    /// Recovery action for wholesale text replacement — not a failure, so
    /// this is legal on an empty stack.
    pub(crate) fn unwind(&mut self) {
        while !self.frames.is_empty() {
            self.pop();
        }
    }
}

impl Default for SessionStack {
    fn default() -> Self {
        Self::new()
    }
}
