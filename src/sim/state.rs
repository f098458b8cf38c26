//! Round state and core simulation types
//!
//! Everything a round owns lives in `Round`; a restart throws it away and
//! builds a fresh one.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::anim::{AnimKey, AnimationSet, Animator};
use super::collision::{Aabb, BoundsContact, clamp_center};
use super::timer::RepeatingTimer;
use crate::consts::SCORE_PREFIX;
use crate::tuning::Tuning;

/// Current phase of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Player was hit; the director restarts before the next frame
    GameOver,
}

/// Drawable area in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// World bounds used for clamping
    pub fn bounds(&self) -> Aabb {
        Aabb::new(Vec2::ZERO, Vec2::new(self.width, self.height))
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

/// Kinematic body shared by the player and projectiles
#[derive(Debug, Clone)]
pub struct Body {
    /// Center position
    pub pos: Vec2,
    pub vel: Vec2,
    /// Unscaled source size (sheet frame or image)
    pub size: Vec2,
    pub scale: f32,
    /// Keep the body inside the world rectangle
    pub collide_world_bounds: bool,
}

impl Body {
    pub fn new(pos: Vec2, size: Vec2, scale: f32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            size,
            scale,
            collide_world_bounds: false,
        }
    }

    pub fn display_size(&self) -> Vec2 {
        self.size * self.scale
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.pos, self.display_size())
    }

    pub fn integrate(&mut self, dt: f32) {
        self.pos += self.vel * dt;
    }

    /// Push the body back inside `world`, zeroing velocity on the blocked axis
    pub fn clamp_to_world(&mut self, world: &Aabb) -> BoundsContact {
        if !self.collide_world_bounds {
            return BoundsContact::default();
        }

        let (pos, contact) = clamp_center(self.pos, self.display_size(), world);
        self.pos = pos;
        if contact.horizontal {
            self.vel.x = 0.0;
        }
        if contact.vertical {
            self.vel.y = 0.0;
        }
        contact
    }
}

/// The player sprite
#[derive(Debug, Clone)]
pub struct Player {
    pub body: Body,
    pub animator: Animator,
}

/// A falling projectile
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: u32,
    pub body: Body,
    /// Cleared when the projectile is destroyed; inactive entries are removed
    /// at the end of the sweep that cleared them
    pub active: bool,
}

/// Raw score plus its derived display text
#[derive(Debug, Clone)]
pub struct Score {
    raw: u64,
    exits: u32,
    increment: u64,
    multiplier: u64,
    text: String,
}

impl Score {
    pub fn new(increment: u64, multiplier: u64) -> Self {
        Self {
            raw: 0,
            exits: 0,
            increment,
            multiplier,
            text: format!("{}0", SCORE_PREFIX),
        }
    }

    pub fn raw(&self) -> u64 {
        self.raw
    }

    /// Projectiles scored this round
    pub fn exits(&self) -> u32 {
        self.exits
    }

    /// Value shown to the player: always derived from the running raw counter
    pub fn displayed(&self) -> u64 {
        self.raw.saturating_mul(self.multiplier)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// A projectile left the screen
    pub fn record_exit(&mut self) {
        self.raw = self.raw.saturating_add(self.increment);
        self.exits += 1;
        self.text = format!("{}{}", SCORE_PREFIX, self.displayed());
    }
}

/// Unscaled source sizes for the bodies, taken from the loaded images
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntitySizes {
    /// One player sheet frame
    pub player: Vec2,
    pub projectile: Vec2,
}

/// Background tiled from the top-left corner over `size`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileLayer {
    pub origin: Vec2,
    pub size: Vec2,
}

/// Complete state of one round
#[derive(Debug, Clone)]
pub struct Round {
    /// 1-based round counter
    pub number: u32,
    pub phase: GamePhase,
    pub viewport: Viewport,
    pub background: TileLayer,
    pub player: Player,
    /// Active projectiles, unordered
    pub projectiles: Vec<Projectile>,
    pub score: Score,
    pub spawn_timer: RepeatingTimer,
    /// Clips registered on the player sheet for this round
    pub animations: AnimationSet,
    /// Round time in seconds
    pub elapsed: f32,
    pub(crate) rng: Pcg32,
    pub(crate) sizes: EntitySizes,
    next_id: u32,
}

impl Round {
    /// Build a fresh round: player at its spawn point, no projectiles, score 0
    pub fn new(
        number: u32,
        viewport: Viewport,
        sizes: EntitySizes,
        animations: AnimationSet,
        tuning: &Tuning,
        seed: u64,
    ) -> Self {
        let spawn = Self::player_spawn(viewport, tuning);
        let mut body = Body::new(spawn, sizes.player, tuning.player_scale);
        body.collide_world_bounds = true;

        let mut animator = Animator::default();
        animator.play(AnimKey::Idle);

        Self {
            number,
            phase: GamePhase::Playing,
            viewport,
            background: TileLayer {
                origin: Vec2::ZERO,
                size: viewport.size(),
            },
            player: Player { body, animator },
            projectiles: Vec::new(),
            score: Score::new(tuning.score_increment, tuning.score_multiplier),
            spawn_timer: RepeatingTimer::new(tuning.spawn_interval_ms),
            animations,
            elapsed: 0.0,
            rng: Pcg32::seed_from_u64(seed),
            sizes,
            next_id: 1,
        }
    }

    /// Horizontal center, `player_spawn_offset` above the bottom edge
    pub fn player_spawn(viewport: Viewport, tuning: &Tuning) -> Vec2 {
        Vec2::new(
            viewport.width / 2.0,
            viewport.height - tuning.player_spawn_offset,
        )
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn sizes(&self) -> EntitySizes {
        self.sizes
    }

    pub fn active_projectiles(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.iter().filter(|p| p.active)
    }

    /// Apply a new surface size; the background follows it
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.background.size = viewport.size();
    }

    /// Player sheet frame currently shown
    pub fn player_frame(&self) -> u32 {
        self.player.animator.frame(&self.animations)
    }

    /// Advance sprite animations
    pub fn animate(&mut self, dt: f32) {
        self.player.animator.advance(dt, &self.animations);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::test_support::sizes;

    #[test]
    fn test_new_round() {
        let tuning = Tuning::default();
        let round = Round::new(
            1,
            Viewport::new(800.0, 600.0),
            sizes(),
            AnimationSet::new(),
            &tuning,
            7,
        );
        assert_eq!(round.phase, GamePhase::Playing);
        assert_eq!(round.player.body.pos, Vec2::new(400.0, 500.0));
        assert_eq!(round.player.body.display_size(), Vec2::splat(192.0));
        assert!(round.player.body.collide_world_bounds);
        assert!(round.projectiles.is_empty());
        assert_eq!(round.score.text(), "Score: 0");
        assert_eq!(round.background.origin, Vec2::ZERO);
        assert_eq!(round.background.size, Vec2::new(800.0, 600.0));
        assert_eq!(round.player.animator.current(), Some(AnimKey::Idle));
    }

    #[test]
    fn test_score_text_tracks_raw() {
        let mut score = Score::new(3, 37);
        score.record_exit();
        assert_eq!(score.raw(), 3);
        assert_eq!(score.text(), "Score: 111");
        score.record_exit();
        assert_eq!(score.raw(), 6);
        assert_eq!(score.exits(), 2);
        assert_eq!(score.text(), "Score: 222");
    }

    #[test]
    fn test_body_clamp_zeroes_blocked_velocity() {
        let world = Viewport::new(800.0, 600.0).bounds();
        let mut body = Body::new(Vec2::new(790.0, 300.0), Vec2::splat(32.0), 1.0);
        body.vel = Vec2::new(200.0, 50.0);
        body.collide_world_bounds = true;

        let contact = body.clamp_to_world(&world);
        assert!(contact.horizontal);
        assert_eq!(body.pos.x, 784.0);
        assert_eq!(body.vel, Vec2::new(0.0, 50.0));
    }

    #[test]
    fn test_unbounded_body_is_not_clamped() {
        let world = Viewport::new(800.0, 600.0).bounds();
        let mut body = Body::new(Vec2::new(400.0, 900.0), Vec2::splat(10.0), 1.0);
        assert!(!body.clamp_to_world(&world).any());
        assert_eq!(body.pos.y, 900.0);
    }

    #[test]
    fn test_set_viewport_resizes_background() {
        let tuning = Tuning::default();
        let mut round = Round::new(
            1,
            Viewport::new(800.0, 600.0),
            sizes(),
            AnimationSet::new(),
            &tuning,
            7,
        );
        round.set_viewport(Viewport::new(1024.0, 768.0));
        assert_eq!(round.background.size, Vec2::new(1024.0, 768.0));
    }
}
