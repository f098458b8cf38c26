//! Projectile spawner, run on every spawn timer tick

use glam::Vec2;
use rand::Rng;

use super::state::{Body, Projectile, Round};
use crate::tuning::Tuning;

/// Create one projectile at a random integer x in [0, width], y = 0, falling
/// at `projectile_speed`. Returns its ID.
pub fn spawn_projectile(round: &mut Round, tuning: &Tuning) -> u32 {
    let max_x = round.viewport.width.max(0.0).floor() as u32;
    let x = round.rng.random_range(0..=max_x) as f32;

    let id = round.next_entity_id();
    let mut body = Body::new(
        Vec2::new(x, 0.0),
        round.sizes.projectile,
        tuning.projectile_scale,
    );
    body.vel = Vec2::new(0.0, tuning.projectile_speed);

    round.projectiles.push(Projectile {
        id,
        body,
        active: true,
    });
    log::debug!("Spawned projectile {} at x={}", id, x);
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::test_support::round_with;
    use proptest::prelude::*;

    #[test]
    fn test_spawn_defaults() {
        let tuning = Tuning::default();
        let mut round = round_with(&tuning, 800.0, 600.0, 1);
        let id = spawn_projectile(&mut round, &tuning);

        assert_eq!(round.projectiles.len(), 1);
        let p = &round.projectiles[0];
        assert_eq!(p.id, id);
        assert!(p.active);
        assert_eq!(p.body.pos.y, 0.0);
        assert_eq!(p.body.pos.x.fract(), 0.0);
        assert_eq!(p.body.vel, Vec2::new(0.0, 200.0));
        assert_eq!(p.body.scale, 0.1);
        assert!(!p.body.collide_world_bounds);
    }

    #[test]
    fn test_ids_are_unique() {
        let tuning = Tuning::default();
        let mut round = round_with(&tuning, 800.0, 600.0, 1);
        let a = spawn_projectile(&mut round, &tuning);
        let b = spawn_projectile(&mut round, &tuning);
        assert_ne!(a, b);
    }

    proptest! {
        #[test]
        fn spawn_x_within_viewport(width in 1.0f32..4000.0, seed in any::<u64>()) {
            let tuning = Tuning::default();
            let mut round = round_with(&tuning, width, 600.0, seed);
            for _ in 0..16 {
                spawn_projectile(&mut round, &tuning);
            }
            for p in &round.projectiles {
                prop_assert!(p.body.pos.x >= 0.0);
                prop_assert!(p.body.pos.x <= width);
                prop_assert_eq!(p.body.pos.y, 0.0);
            }
        }
    }
}
