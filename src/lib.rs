//! Fireball Dodge - sidestep falling fireballs, score when they leave the screen
//!
//! Core modules:
//! - `sim`: Round state, physics step, timers, animation (no rendering or platform dependencies)
//! - `scene`: Scene interface and the director that drives it frame by frame
//! - `assets`: Sprite/image loading and validation
//! - `renderer`: WebGPU sprite pipeline and HUD text
//! - `platform`: Keyboard state and viewport
//! - `tuning`: Data-driven game balance

pub mod assets;
pub mod platform;
pub mod renderer;
pub mod scene;
pub mod sim;
pub mod tuning;

pub use scene::{DodgeScene, Scene, SceneDirector};
pub use tuning::Tuning;

/// Game configuration constants (defaults for `Tuning`)
pub mod consts {
    /// Delay between projectile spawns
    pub const SPAWN_INTERVAL_MS: f64 = 1000.0;

    /// Projectile defaults
    pub const PROJECTILE_SPEED: f32 = 200.0;
    pub const PROJECTILE_SCALE: f32 = 0.1;

    /// Player defaults
    pub const PLAYER_SPEED: f32 = 200.0;
    pub const PLAYER_SCALE: f32 = 6.0;
    /// Distance of the player spawn point above the bottom edge
    pub const PLAYER_SPAWN_OFFSET: f32 = 100.0;

    /// Player sprite sheet frame size (square, pixels)
    pub const FRAME_SIZE: u32 = 32;
    pub const RUN_FRAME_RATE: f32 = 8.0;
    pub const IDLE_FRAME_RATE: f32 = 1.0;

    /// Raw score added per projectile that leaves the screen
    pub const SCORE_INCREMENT: u64 = 3;
    /// Display multiplier applied to the raw score
    pub const SCORE_MULTIPLIER: u64 = 37;
    pub const SCORE_PREFIX: &str = "Score: ";
    pub const SCORE_TEXT_POS: (f32, f32) = (16.0, 16.0);
    pub const SCORE_TEXT_SIZE: f32 = 32.0;

    /// Largest frame delta fed to the simulation (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;
}
