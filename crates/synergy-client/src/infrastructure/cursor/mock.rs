//! Test double for [`CursorContext`] with a settable fixed position.

use std::sync::Mutex;

use crate::application::cursor::{CursorContext, CursorPosition};

pub struct MockCursorContext {
    position: Mutex<CursorPosition>,
}

impl MockCursorContext {
    pub fn new(position: CursorPosition) -> Self {
        MockCursorContext {
            position: Mutex::new(position),
        }
    }

    pub fn set(&self, position: CursorPosition) {
        *self.position.lock().unwrap() = position;
    }
}

impl CursorContext for MockCursorContext {
    fn current(&self) -> CursorPosition {
        *self.position.lock().unwrap()
    }
}
