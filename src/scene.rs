//! Scene interface and the director that drives it
//!
//! A `Scene` supplies the game's handlers; `SceneDirector` plays the engine:
//! it owns the current `Round`, runs timers and physics, dispatches
//! collisions and restarts the round when the scene ends it.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;

use crate::assets::{AssetError, AssetKey, LoadedAssets, TextureFilter};
use crate::sim::{
    AnimKey, AnimationClip, AnimationSet, EntitySizes, FrameInput, GamePhase, Round, Viewport,
    frame_update, spawn_projectile, step_physics,
};
use crate::tuning::Tuning;

/// Game callbacks, invoked on the director's single thread
pub trait Scene {
    /// Once, after assets are loaded and before the first round
    fn on_load(&mut self, assets: &mut LoadedAssets) -> Result<(), AssetError>;

    /// Build the state for a new round (first start and every restart)
    fn on_round_start(&mut self, number: u32, viewport: Viewport) -> Round;

    /// Spawn timer fired
    fn on_spawn_timer(&mut self, round: &mut Round);

    /// Once per rendered frame, after physics
    fn on_frame(&mut self, round: &mut Round, input: &FrameInput, dt: f32);

    /// First physics step in which the player overlaps `projectile`
    fn on_collision(&mut self, round: &mut Round, projectile: u32);
}

/// What happened during one director frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub spawned: u32,
    pub scored: u32,
    /// A collision ended the round and a fresh one was started
    pub restarted: bool,
}

/// Drives a `Scene` one frame at a time
pub struct SceneDirector<S: Scene> {
    scene: S,
    round: Round,
    viewport: Viewport,
    rounds_started: u32,
    max_dt: f32,
}

impl<S: Scene> SceneDirector<S> {
    /// Run `on_load`, then start the first round
    pub fn start(
        mut scene: S,
        assets: &mut LoadedAssets,
        viewport: Viewport,
        max_dt: f32,
    ) -> Result<Self, AssetError> {
        scene.on_load(assets)?;
        let round = scene.on_round_start(1, viewport);
        Ok(Self {
            scene,
            round,
            viewport,
            rounds_started: 1,
            max_dt,
        })
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn rounds_started(&self) -> u32 {
        self.rounds_started
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Surface size changed; no handler runs
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.round.set_viewport(viewport);
    }

    /// Advance one rendered frame of `dt` seconds
    pub fn frame(&mut self, input: &FrameInput, dt: f32) -> FrameReport {
        // max(0.0) also maps a NaN limit to zero
        let dt = if dt.is_finite() {
            dt.max(0.0).min(self.max_dt.max(0.0))
        } else {
            0.0
        };
        let mut report = FrameReport::default();

        // Timers
        let fires = self.round.spawn_timer.advance(f64::from(dt) * 1000.0);
        for _ in 0..fires {
            self.scene.on_spawn_timer(&mut self.round);
        }
        report.spawned = fires;

        // Physics + collision watcher
        if let Some(projectile) = step_physics(&mut self.round, dt) {
            self.scene.on_collision(&mut self.round, projectile);
        }
        if self.round.phase == GamePhase::GameOver {
            self.restart();
            report.restarted = true;
            return report;
        }

        let before = self.round.score.exits();
        self.scene.on_frame(&mut self.round, input, dt);
        report.scored = self.round.score.exits() - before;

        self.round.animate(dt);
        report
    }

    /// Discard the round and run the initializer again
    fn restart(&mut self) {
        self.rounds_started += 1;
        self.round = self.scene.on_round_start(self.rounds_started, self.viewport);
    }
}

/// The dodge game
pub struct DodgeScene {
    tuning: Tuning,
    sizes: Option<EntitySizes>,
    clips: AnimationSet,
    seeds: Pcg32,
}

impl DodgeScene {
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        Self {
            tuning,
            sizes: None,
            clips: AnimationSet::new(),
            seeds: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }
}

impl Scene for DodgeScene {
    fn on_load(&mut self, assets: &mut LoadedAssets) -> Result<(), AssetError> {
        assets.set_filter(AssetKey::Player, TextureFilter::Nearest);

        let grid = assets.player_grid();
        let frames = grid.frame_count();
        let mut clips = AnimationSet::new();
        clips.register(
            AnimKey::Run,
            AnimationClip::from_range(0, 1, self.tuning.run_frame_rate),
            frames,
        )?;
        clips.register(
            AnimKey::Idle,
            AnimationClip::from_range(0, 0, self.tuning.idle_frame_rate),
            frames,
        )?;
        self.clips = clips;

        self.sizes = Some(EntitySizes {
            player: grid.frame_size(),
            projectile: assets.get(AssetKey::Projectile).size(),
        });
        log::info!("Player sheet has {} frames", frames);
        Ok(())
    }

    fn on_round_start(&mut self, number: u32, viewport: Viewport) -> Round {
        let sizes = self.sizes.unwrap_or(EntitySizes {
            player: glam::Vec2::splat(self.tuning.frame_size as f32),
            projectile: glam::Vec2::ZERO,
        });
        let seed = self.seeds.next_u64();
        log::info!(
            "Round {} started ({}x{})",
            number,
            viewport.width,
            viewport.height
        );
        Round::new(number, viewport, sizes, self.clips.clone(), &self.tuning, seed)
    }

    fn on_spawn_timer(&mut self, round: &mut Round) {
        spawn_projectile(round, &self.tuning);
    }

    fn on_frame(&mut self, round: &mut Round, input: &FrameInput, _dt: f32) {
        frame_update(round, input, &self.tuning);
    }

    fn on_collision(&mut self, round: &mut Round, projectile: u32) {
        log::info!("Game Over!");
        log::debug!(
            "Round {} ended by projectile {} after {:.1}s with {}",
            round.number,
            projectile,
            round.elapsed,
            round.score.text()
        );
        round.phase = GamePhase::GameOver;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ClipError;
    use glam::Vec2;
    use image::RgbaImage;

    fn assets(player_width: u32) -> LoadedAssets {
        LoadedAssets::from_images(
            RgbaImage::new(player_width, 32),
            RgbaImage::new(100, 100),
            RgbaImage::new(16, 16),
            32,
        )
        .unwrap()
    }

    fn director() -> SceneDirector<DodgeScene> {
        let tuning = Tuning::default();
        let mut assets = assets(64);
        SceneDirector::start(
            DodgeScene::new(tuning.clone(), 42),
            &mut assets,
            Viewport::new(800.0, 600.0),
            tuning.max_frame_dt,
        )
        .unwrap()
    }

    const LEFT: FrameInput = FrameInput {
        left: true,
        right: false,
        up: false,
        down: false,
    };

    #[test]
    fn test_start_builds_first_round() {
        let tuning = Tuning::default();
        let mut assets = assets(64);
        let director = SceneDirector::start(
            DodgeScene::new(tuning, 1),
            &mut assets,
            Viewport::new(800.0, 600.0),
            0.1,
        )
        .unwrap();

        assert_eq!(assets.get(AssetKey::Player).filter, TextureFilter::Nearest);
        assert_eq!(assets.get(AssetKey::Tile).filter, TextureFilter::Linear);

        let round = director.round();
        assert_eq!(round.number, 1);
        assert_eq!(round.player.body.pos, Vec2::new(400.0, 500.0));
        assert_eq!(round.sizes().projectile, Vec2::splat(100.0));
        assert_eq!(round.animations.len(), 2);
        assert_eq!(round.score.text(), "Score: 0");
    }

    #[test]
    fn test_on_load_rejects_single_frame_sheet() {
        let mut assets = assets(32);
        let result = SceneDirector::start(
            DodgeScene::new(Tuning::default(), 1),
            &mut assets,
            Viewport::new(800.0, 600.0),
            0.1,
        );
        assert!(matches!(
            result,
            Err(AssetError::Clip(ClipError::FrameOutOfRange { frame: 1, .. }))
        ));
    }

    #[test]
    fn test_spawn_timer_fires_on_first_frame() {
        let mut director = director();
        let report = director.frame(&FrameInput::default(), 0.016);
        assert_eq!(report.spawned, 1);
        assert_eq!(director.round().projectiles.len(), 1);

        let mut spawned = 0;
        for _ in 0..62 {
            spawned += director.frame(&FrameInput::default(), 0.016).spawned;
        }
        assert_eq!(spawned, 1);
        assert_eq!(director.round().projectiles.len(), 2);
    }

    #[test]
    fn test_four_spawns_by_3500ms() {
        let tuning = Tuning::default();
        let mut assets = assets(64);
        // Tall enough that nothing reaches the player in 3.5 s
        let mut director = SceneDirector::start(
            DodgeScene::new(tuning.clone(), 3),
            &mut assets,
            Viewport::new(800.0, 2000.0),
            tuning.max_frame_dt,
        )
        .unwrap();

        let mut spawned = 0;
        for _ in 0..35 {
            let report = director.frame(&FrameInput::default(), 0.1);
            assert!(!report.restarted);
            spawned += report.spawned;
        }
        assert_eq!(spawned, 4);
        assert_eq!(director.round().projectiles.len(), 4);
        for p in &director.round().projectiles {
            assert!(p.body.pos.x >= 0.0 && p.body.pos.x <= 800.0);
        }
    }

    #[test]
    fn test_negative_max_dt_runs_frames() {
        let tuning = Tuning {
            max_frame_dt: -0.5,
            ..Tuning::default()
        };
        let mut assets = assets(64);
        let mut director = SceneDirector::start(
            DodgeScene::new(tuning.clone(), 1),
            &mut assets,
            Viewport::new(800.0, 600.0),
            tuning.max_frame_dt,
        )
        .unwrap();

        let report = director.frame(&LEFT, 0.016);
        assert_eq!(report.spawned, 1);
        assert_eq!(director.round().elapsed, 0.0);

        director.max_dt = f32::NAN;
        director.frame(&LEFT, 0.016);
        assert_eq!(director.round().elapsed, 0.0);
    }

    #[test]
    fn test_collision_restarts_round() {
        let mut director = director();
        let tuning = director.scene().tuning().clone();
        director.frame(&LEFT, 0.05);
        director.round.score.record_exit();

        let id = spawn_projectile(&mut director.round, &tuning);
        let hit = director
            .round
            .projectiles
            .iter_mut()
            .find(|p| p.id == id)
            .unwrap();
        hit.body.pos = director.round.player.body.pos;

        let report = director.frame(&LEFT, 0.016);
        assert!(report.restarted);
        assert_eq!(director.rounds_started(), 2);

        let round = director.round();
        assert_eq!(round.number, 2);
        assert_eq!(round.phase, GamePhase::Playing);
        assert!(round.projectiles.is_empty());
        assert_eq!(round.score.text(), "Score: 0");
        assert_eq!(round.player.body.pos, Vec2::new(400.0, 500.0));
        // The restart frame skips the per-frame handler
        assert_eq!(round.player.body.vel, Vec2::ZERO);
        assert_eq!(round.spawn_timer.fired(), 0);
    }

    #[test]
    fn test_report_counts_exits() {
        let mut director = director();
        let tuning = director.scene().tuning().clone();
        spawn_projectile(&mut director.round, &tuning);
        director.round.projectiles[0].body.pos = Vec2::new(0.0, 10_000.0);

        let report = director.frame(&FrameInput::default(), 0.016);
        assert_eq!(report.scored, 1);
        assert!(!report.restarted);
        assert_eq!(director.round().score.text(), "Score: 111");
    }

    #[test]
    fn test_frame_dt_is_clamped() {
        let mut director = director();
        director.frame(&FrameInput::default(), 5.0);
        assert!((director.round().elapsed - 0.1).abs() < 1e-6);

        director.frame(&FrameInput::default(), f32::NAN);
        director.frame(&FrameInput::default(), -1.0);
        assert!((director.round().elapsed - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_resize_applies_now_and_to_restarts() {
        let mut director = director();
        director.resize(Viewport::new(1024.0, 768.0));
        assert_eq!(director.round().viewport, Viewport::new(1024.0, 768.0));
        assert_eq!(director.round().player.body.pos, Vec2::new(400.0, 500.0));

        director.restart();
        assert_eq!(director.round().player.body.pos, Vec2::new(512.0, 668.0));
    }

    #[test]
    fn test_rounds_use_distinct_seeds() {
        let mut director = director();
        director.restart();
        let tuning = director.scene().tuning().clone();
        let mut xs = Vec::new();
        for _ in 0..2 {
            for _ in 0..8 {
                spawn_projectile(&mut director.round, &tuning);
            }
            xs.push(
                director
                    .round()
                    .projectiles
                    .iter()
                    .map(|p| p.body.pos.x)
                    .collect::<Vec<_>>(),
            );
            director.restart();
        }
        assert_ne!(xs[0], xs[1]);
    }
}
