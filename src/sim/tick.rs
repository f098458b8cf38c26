//! Per-frame simulation steps
//!
//! The director runs these in order each frame: spawn timer, `step_physics`,
//! collision dispatch, `frame_update`, animation.

use super::anim::AnimKey;
use super::state::{Player, Round};
use crate::tuning::Tuning;

/// Held state of the four bound directional keys for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    /// Bound but not consumed by gameplay
    pub up: bool,
    /// Bound but not consumed by gameplay
    pub down: bool,
}

/// Movement policy: left wins over right; neither means stop.
/// Vertical velocity is left alone.
pub fn apply_movement(player: &mut Player, input: &FrameInput, speed: f32) {
    if input.left {
        player.body.vel.x = -speed;
        player.animator.play(AnimKey::Run);
    } else if input.right {
        player.body.vel.x = speed;
        player.animator.play(AnimKey::Run);
    } else {
        player.body.vel.x = 0.0;
        player.animator.play(AnimKey::Idle);
    }
}

/// Score and destroy every active projectile below the bottom edge.
///
/// Mark first, then remove, so the collection is never mutated while it is
/// being walked. Returns how many projectiles were scored.
pub fn sweep_offscreen(round: &mut Round) -> u32 {
    let bottom = round.viewport.height;
    let mut scored = 0;

    for projectile in round.projectiles.iter_mut() {
        if projectile.active && projectile.body.pos.y > bottom {
            projectile.active = false;
            round.score.record_exit();
            scored += 1;
            log::trace!("Projectile {} left the screen", projectile.id);
        }
    }

    if scored > 0 {
        round.projectiles.retain(|p| p.active);
        log::debug!("{}", round.score.text());
    }
    scored
}

/// Integrate bodies, clamp the player to the world, then test the player
/// against every active projectile. Returns the first overlapping projectile.
pub fn step_physics(round: &mut Round, dt: f32) -> Option<u32> {
    round.elapsed += dt;

    let world = round.viewport.bounds();
    round.player.body.integrate(dt);
    round.player.body.clamp_to_world(&world);

    for projectile in round.projectiles.iter_mut().filter(|p| p.active) {
        projectile.body.integrate(dt);
        projectile.body.clamp_to_world(&world);
    }

    let player_box = round.player.body.bounds();
    round
        .active_projectiles()
        .find(|p| p.body.bounds().overlaps(&player_box))
        .map(|p| p.id)
}

/// The per-frame gameplay update: movement policy then off-screen sweep.
/// Returns the number of projectiles scored this frame.
pub fn frame_update(round: &mut Round, input: &FrameInput, tuning: &Tuning) -> u32 {
    apply_movement(&mut round.player, input, tuning.player_speed);
    sweep_offscreen(round)
}
