//! Game balance and presentation constants
//!
//! Defaults come from `crate::consts`. Native builds may override any field
//! with a `tuning.json` file in the working directory.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Native file name for tuning overrides
pub const TUNING_FILE: &str = "tuning.json";

/// Tunable gameplay values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Spawning ===
    /// Delay between projectile spawns (ms)
    pub spawn_interval_ms: f64,
    /// Projectile fall speed (pixels/s)
    pub projectile_speed: f32,
    pub projectile_scale: f32,

    // === Player ===
    /// Horizontal speed while an arrow key is held (pixels/s)
    pub player_speed: f32,
    pub player_scale: f32,
    /// Spawn height above the bottom edge (pixels)
    pub player_spawn_offset: f32,

    // === Animation ===
    /// Sprite sheet frame size (pixels)
    pub frame_size: u32,
    pub run_frame_rate: f32,
    pub idle_frame_rate: f32,

    // === Score ===
    pub score_increment: u64,
    pub score_multiplier: u64,
    pub score_text_pos: (f32, f32),
    /// Glyph height (pixels)
    pub score_text_size: f32,

    // === Loop ===
    /// Largest frame delta fed to the simulation (seconds)
    pub max_frame_dt: f32,
    /// Outline every physics body
    pub debug_bodies: bool,
    /// Directory the `assets/` paths are resolved against
    pub asset_root: String,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            spawn_interval_ms: SPAWN_INTERVAL_MS,
            projectile_speed: PROJECTILE_SPEED,
            projectile_scale: PROJECTILE_SCALE,

            player_speed: PLAYER_SPEED,
            player_scale: PLAYER_SCALE,
            player_spawn_offset: PLAYER_SPAWN_OFFSET,

            frame_size: FRAME_SIZE,
            run_frame_rate: RUN_FRAME_RATE,
            idle_frame_rate: IDLE_FRAME_RATE,

            score_increment: SCORE_INCREMENT,
            score_multiplier: SCORE_MULTIPLIER,
            score_text_pos: SCORE_TEXT_POS,
            score_text_size: SCORE_TEXT_SIZE,

            max_frame_dt: MAX_FRAME_DT,
            debug_bodies: false,
            asset_root: ".".to_string(),
        }
    }
}

impl Tuning {
    /// Parse overrides; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::validated)
    }

    /// Replace values the loop cannot run with by their defaults
    pub fn validated(mut self) -> Self {
        if !(self.max_frame_dt.is_finite() && self.max_frame_dt > 0.0) {
            log::warn!(
                "max_frame_dt must be a positive number of seconds, got {}; using {}",
                self.max_frame_dt,
                MAX_FRAME_DT
            );
            self.max_frame_dt = MAX_FRAME_DT;
        }
        self
    }

    /// Load overrides from `tuning.json` (native only)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::load_from(std::path::Path::new(TUNING_FILE))
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: &std::path::Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(_) => {
                log::info!("No {} found, using default tuning", path.display());
                return Self::default();
            }
        };

        match Self::from_json(&json) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(e) => {
                log::warn!("Ignoring malformed {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Web builds always use the compiled-in defaults
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "score_multiplier": 10, "debug_bodies": true }"#)
            .unwrap();
        assert_eq!(tuning.score_multiplier, 10);
        assert!(tuning.debug_bodies);
        assert_eq!(tuning.score_increment, 3);
        assert_eq!(tuning.spawn_interval_ms, 1000.0);
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(Tuning::from_json("{ score_multiplier: }").is_err());
    }

    #[test]
    fn test_non_positive_max_frame_dt_falls_back() {
        let tuning = Tuning::from_json(r#"{ "max_frame_dt": -0.5 }"#).unwrap();
        assert_eq!(tuning.max_frame_dt, MAX_FRAME_DT);

        let tuning = Tuning::from_json(r#"{ "max_frame_dt": 0.0 }"#).unwrap();
        assert_eq!(tuning.max_frame_dt, MAX_FRAME_DT);

        let tuning = Tuning::from_json(r#"{ "max_frame_dt": 0.25 }"#).unwrap();
        assert_eq!(tuning.max_frame_dt, 0.25);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let tuning = Tuning::load_from(std::path::Path::new("definitely/not/here.json"));
        assert_eq!(tuning, Tuning::default());
    }
}
