use crate::types::{InputEvent, KeyCode};

/// Synthesizes keystrokes into the OS input stream and reports toggle-key state.
pub trait InputDispatcher: Send + Sync {
    fn key_down(&self, code: KeyCode);
    fn key_up(&self, code: KeyCode);

    /// Down followed by up.
    fn key_press(&self, code: KeyCode) {
        self.key_down(code);
        self.key_up(code);
    }

    /// Whether a toggle key (Caps Lock, Shift, Hangul) is currently in effect.
    fn is_toggle_active(&self, code: KeyCode) -> bool;

    fn dispatch(&self, event: InputEvent) {
        match event {
            InputEvent::KeyDown(code) => self.key_down(code),
            InputEvent::KeyUp(code) => self.key_up(code),
            InputEvent::KeyPress(code) => self.key_press(code),
        }
    }
}
