//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Input events (winit key codes natively, DOM `KeyboardEvent.code` on web)
//! - Focus loss, which releases every held key

pub mod input;

pub use input::{Direction, InputHandler};
