//! Keyboard state
//!
//! Key events from either platform are mapped onto the four bound directions;
//! the held set is sampled once per frame into a `FrameInput`.

use crate::sim::FrameInput;

/// A bound direction key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Map a DOM `KeyboardEvent.code` value
    pub fn from_dom_code(code: &str) -> Option<Self> {
        match code {
            "ArrowLeft" => Some(Direction::Left),
            "ArrowRight" => Some(Direction::Right),
            "ArrowUp" => Some(Direction::Up),
            "ArrowDown" => Some(Direction::Down),
            _ => None,
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_key_code(key: winit::keyboard::KeyCode) -> Option<Self> {
        use winit::keyboard::KeyCode;

        match key {
            KeyCode::ArrowLeft => Some(Direction::Left),
            KeyCode::ArrowRight => Some(Direction::Right),
            KeyCode::ArrowUp => Some(Direction::Up),
            KeyCode::ArrowDown => Some(Direction::Down),
            _ => None,
        }
    }
}

/// Tracks which bound keys are held
#[derive(Debug, Default)]
pub struct InputHandler {
    current: FrameInput,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, direction: Direction, pressed: bool) {
        match direction {
            Direction::Left => self.current.left = pressed,
            Direction::Right => self.current.right = pressed,
            Direction::Up => self.current.up = pressed,
            Direction::Down => self.current.down = pressed,
        }
    }

    /// Process a DOM key event. Returns true if the key is bound, so the
    /// caller can suppress the browser default (page scrolling).
    pub fn process_dom_code(&mut self, code: &str, pressed: bool) -> bool {
        match Direction::from_dom_code(code) {
            Some(direction) => {
                self.set(direction, pressed);
                true
            }
            None => false,
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn process_key(
        &mut self,
        key: winit::keyboard::PhysicalKey,
        state: winit::event::ElementState,
    ) {
        use winit::keyboard::PhysicalKey;

        if let PhysicalKey::Code(code) = key {
            if let Some(direction) = Direction::from_key_code(code) {
                self.set(direction, state.is_pressed());
            }
        }
    }

    /// Snapshot for this frame
    pub fn current(&self) -> FrameInput {
        self.current
    }

    /// Release everything (window lost focus)
    pub fn reset(&mut self) {
        self.current = FrameInput::default();
    }
}
