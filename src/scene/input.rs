//! Polled pointer input passed explicitly to the camera and renderer.

use crate::util::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}

impl PointerButton {
    fn slot(self) -> usize {
        match self {
            PointerButton::Left => 0,
            PointerButton::Right => 1,
            PointerButton::Middle => 2,
        }
    }
}

/// Source of pointer state for one frame.
pub trait InputSource {
    /// Pointer position in window pixels.
    fn pointer_position(&self) -> Vec2;
    /// Whether `button` is currently held.
    fn button_state(&self, button: PointerButton) -> bool;
    /// Scroll accumulated since the last `begin_frame`.
    fn scroll_delta(&self) -> f32;
}

/// Plain polled input state fed by a window layer (or a test).
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pointer: Vec2,
    buttons: [bool; 3],
    scroll: f32,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset per-frame deltas. Call once per frame after consumers have read them.
    pub fn begin_frame(&mut self) {
        self.scroll = 0.0;
    }

    pub fn set_pointer(&mut self, position: Vec2) {
        self.pointer = position;
    }

    pub fn set_button(&mut self, button: PointerButton, down: bool) {
        self.buttons[button.slot()] = down;
    }

    pub fn add_scroll(&mut self, delta: f32) {
        self.scroll += delta;
    }
}

impl InputSource for InputState {
    fn pointer_position(&self) -> Vec2 {
        self.pointer
    }

    fn button_state(&self, button: PointerButton) -> bool {
        self.buttons[button.slot()]
    }

    fn scroll_delta(&self) -> f32 {
        self.scroll
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_resets_per_frame() {
        let mut input = InputState::new();
        input.add_scroll(1.5);
        input.add_scroll(0.5);
        assert_eq!(input.scroll_delta(), 2.0);
        input.set_button(PointerButton::Right, true);
        input.set_pointer(Vec2::new(10.0, 20.0));

        input.begin_frame();
        assert_eq!(input.scroll_delta(), 0.0);
        // Held buttons and pointer survive the frame boundary.
        assert!(input.button_state(PointerButton::Right));
        assert!(!input.button_state(PointerButton::Left));
        assert_eq!(input.pointer_position(), Vec2::new(10.0, 20.0));
    }
}
