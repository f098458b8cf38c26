//! Simulation module
//!
//! All gameplay logic lives here, free of rendering and platform code:
//! - Round state owned by one value, rebuilt on restart
//! - Seeded RNG per round
//! - Variable timestep supplied by the caller

pub mod anim;
pub mod collision;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod timer;

#[cfg(test)]
pub(crate) mod test_support;

pub use anim::{AnimKey, AnimationClip, AnimationSet, Animator, ClipError};
pub use collision::{Aabb, BoundsContact};
pub use spawn::spawn_projectile;
pub use state::{
    Body, EntitySizes, GamePhase, Player, Projectile, Round, Score, TileLayer, Viewport,
};
pub use tick::{FrameInput, apply_movement, frame_update, step_physics, sweep_offscreen};
pub use timer::RepeatingTimer;
