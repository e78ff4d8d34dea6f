//! The shipped Linux `CursorContext`: always `Unknown`.
//!
//! This is intended behavior, not a stub. Wayland compositors that lack a
//! remote-input portal — the entire premise of this client — give no
//! process-external way to read the live cursor position, so the dispatcher
//! always falls back to its own integrated relative-delta tracking.

use crate::application::cursor::{CursorContext, CursorPosition};

#[derive(Debug, Default, Clone, Copy)]
pub struct NullCursorContext;

impl CursorContext for NullCursorContext {
    fn current(&self) -> CursorPosition {
        CursorPosition::Unknown
    }
}
