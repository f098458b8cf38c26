//! WebGPU rendering module
//!
//! Sprites and the tiled background are textured quads built on the CPU
//! each frame (`sprites`). The score overlay is tessellated by egui (`hud`)
//! into the same vertex format and drawn last.

pub mod hud;
pub mod pipeline;
pub mod sprites;
pub mod vertex;

pub use hud::{Hud, HudFrame};
pub use pipeline::{RenderError, RenderState};
pub use sprites::{FrameLayout, SpriteBatch, TextureSlot, build_frame};
