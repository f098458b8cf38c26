//! Shared fixtures for simulation tests

use glam::Vec2;

use super::anim::{AnimKey, AnimationClip, AnimationSet};
use super::state::{EntitySizes, Round, Viewport};
use crate::tuning::Tuning;

/// 32x32 player frames, 100x100 projectile image (10x10 at default scale)
pub(crate) fn sizes() -> EntitySizes {
    EntitySizes {
        player: Vec2::splat(32.0),
        projectile: Vec2::splat(100.0),
    }
}

/// `run` and `idle` on a two-frame sheet
pub(crate) fn player_clips() -> AnimationSet {
    let mut set = AnimationSet::new();
    set.register(AnimKey::Run, AnimationClip::from_range(0, 1, 8.0), 2)
        .expect("run clip fits a two-frame sheet");
    set.register(AnimKey::Idle, AnimationClip::from_range(0, 0, 1.0), 2)
        .expect("idle clip fits a two-frame sheet");
    set
}

pub(crate) fn round_with(tuning: &Tuning, width: f32, height: f32, seed: u64) -> Round {
    Round::new(
        1,
        Viewport::new(width, height),
        sizes(),
        player_clips(),
        tuning,
        seed,
    )
}
