//! CPU-side sprite batching
//!
//! Turns a `Round` into pixel-space quads grouped by texture. Draw order:
//! background, player, projectiles, debug outlines. The score text is drawn
//! on top by `hud`.

use std::ops::Range;

use glam::Vec2;

use super::vertex::{Vertex, colors};
use crate::assets::{AssetKey, SheetGrid};
use crate::sim::{Aabb, Round};
use crate::tuning::Tuning;

/// Outline thickness for debug bodies (pixels)
const DEBUG_LINE: f32 = 2.0;

/// Texture a quad samples from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSlot {
    Tile,
    Player,
    Projectile,
    /// 1x1 white, for debug outlines
    Solid,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 4] = [
        TextureSlot::Tile,
        TextureSlot::Player,
        TextureSlot::Projectile,
        TextureSlot::Solid,
    ];

    pub fn index(&self) -> usize {
        match self {
            TextureSlot::Tile => 0,
            TextureSlot::Player => 1,
            TextureSlot::Projectile => 2,
            TextureSlot::Solid => 3,
        }
    }

    pub fn asset(&self) -> Option<AssetKey> {
        match self {
            TextureSlot::Tile => Some(AssetKey::Tile),
            TextureSlot::Player => Some(AssetKey::Player),
            TextureSlot::Projectile => Some(AssetKey::Projectile),
            TextureSlot::Solid => None,
        }
    }
}

/// A run of vertices drawn with one texture bound
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub slot: TextureSlot,
    pub vertices: Range<u32>,
}

#[derive(Debug, Default)]
pub struct SpriteBatch {
    pub vertices: Vec<Vertex>,
    pub draws: Vec<DrawCall>,
}

impl SpriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.draws.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Append a textured quad (two triangles); consecutive quads with the
    /// same texture share a draw call
    pub fn push_quad(
        &mut self,
        slot: TextureSlot,
        min: Vec2,
        max: Vec2,
        uv_min: Vec2,
        uv_max: Vec2,
        color: [f32; 4],
    ) {
        let start = self.vertices.len() as u32;
        let tl = Vertex::new(min.x, min.y, uv_min.x, uv_min.y, color);
        let tr = Vertex::new(max.x, min.y, uv_max.x, uv_min.y, color);
        let bl = Vertex::new(min.x, max.y, uv_min.x, uv_max.y, color);
        let br = Vertex::new(max.x, max.y, uv_max.x, uv_max.y, color);
        self.vertices.extend_from_slice(&[tl, bl, tr, tr, bl, br]);
        let end = self.vertices.len() as u32;

        match self.draws.last_mut() {
            Some(last) if last.slot == slot && last.vertices.end == start => {
                last.vertices.end = end;
            }
            _ => self.draws.push(DrawCall {
                slot,
                vertices: start..end,
            }),
        }
    }

    /// Solid rectangle
    pub fn push_rect(&mut self, min: Vec2, size: Vec2, color: [f32; 4]) {
        self.push_quad(
            TextureSlot::Solid,
            min,
            min + size,
            Vec2::ZERO,
            Vec2::ONE,
            color,
        );
    }

    /// Rectangle outline drawn inside `bounds`
    pub fn push_outline(&mut self, bounds: &Aabb, thickness: f32, color: [f32; 4]) {
        let size = bounds.size();
        let t = thickness.min(size.x / 2.0).min(size.y / 2.0).max(0.0);
        self.push_rect(bounds.min, Vec2::new(size.x, t), color);
        self.push_rect(
            Vec2::new(bounds.min.x, bounds.max.y - t),
            Vec2::new(size.x, t),
            color,
        );
        self.push_rect(
            Vec2::new(bounds.min.x, bounds.min.y + t),
            Vec2::new(t, size.y - 2.0 * t),
            color,
        );
        self.push_rect(
            Vec2::new(bounds.max.x - t, bounds.min.y + t),
            Vec2::new(t, size.y - 2.0 * t),
            color,
        );
    }
}

/// Texture facts the batcher needs, captured once after load
#[derive(Debug, Clone, Copy)]
pub struct FrameLayout {
    pub player_grid: SheetGrid,
    /// Background tile size in pixels
    pub tile_size: Vec2,
}

/// Rebuild `batch` for the current round
pub fn build_frame(batch: &mut SpriteBatch, round: &Round, layout: &FrameLayout, tuning: &Tuning) {
    batch.clear();

    // Background: one quad, tile repeated through UVs > 1
    let bg = round.background;
    let tile = layout.tile_size.max(Vec2::ONE);
    batch.push_quad(
        TextureSlot::Tile,
        bg.origin,
        bg.origin + bg.size,
        Vec2::ZERO,
        bg.size / tile,
        colors::WHITE,
    );

    let player = round.player.body.bounds();
    let (uv_min, uv_max) = layout.player_grid.frame_uv(round.player_frame());
    batch.push_quad(
        TextureSlot::Player,
        player.min,
        player.max,
        uv_min,
        uv_max,
        colors::WHITE,
    );

    for projectile in round.active_projectiles() {
        let bounds = projectile.body.bounds();
        batch.push_quad(
            TextureSlot::Projectile,
            bounds.min,
            bounds.max,
            Vec2::ZERO,
            Vec2::ONE,
            colors::WHITE,
        );
    }

    if tuning.debug_bodies {
        batch.push_outline(&player, DEBUG_LINE, colors::DEBUG_PLAYER);
        for projectile in round.active_projectiles() {
            batch.push_outline(
                &projectile.body.bounds(),
                DEBUG_LINE,
                colors::DEBUG_PROJECTILE,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::spawn_projectile;
    use crate::sim::test_support::round_with;

    fn layout() -> FrameLayout {
        FrameLayout {
            player_grid: SheetGrid::new(64, 32, 32, 32).unwrap(),
            tile_size: Vec2::splat(16.0),
        }
    }

    #[test]
    fn test_quads_merge_by_texture() {
        let mut batch = SpriteBatch::new();
        batch.push_rect(Vec2::ZERO, Vec2::ONE, colors::WHITE);
        batch.push_rect(Vec2::ONE, Vec2::ONE, colors::WHITE);
        batch.push_quad(
            TextureSlot::Tile,
            Vec2::ZERO,
            Vec2::ONE,
            Vec2::ZERO,
            Vec2::ONE,
            colors::WHITE,
        );
        assert_eq!(batch.vertices.len(), 18);
        assert_eq!(
            batch.draws,
            vec![
                DrawCall {
                    slot: TextureSlot::Solid,
                    vertices: 0..12
                },
                DrawCall {
                    slot: TextureSlot::Tile,
                    vertices: 12..18
                },
            ]
        );
    }

    #[test]
    fn test_frame_draw_order() {
        let tuning = Tuning::default();
        let mut round = round_with(&tuning, 800.0, 600.0, 1);
        spawn_projectile(&mut round, &tuning);
        spawn_projectile(&mut round, &tuning);

        let mut batch = SpriteBatch::new();
        build_frame(&mut batch, &round, &layout(), &tuning);

        let slots: Vec<_> = batch.draws.iter().map(|d| d.slot).collect();
        assert_eq!(
            slots,
            vec![
                TextureSlot::Tile,
                TextureSlot::Player,
                TextureSlot::Projectile
            ]
        );
        assert_eq!(batch.draws[2].vertices.len(), 12);
    }

    #[test]
    fn test_background_repeats_tile() {
        let tuning = Tuning::default();
        let round = round_with(&tuning, 800.0, 600.0, 1);
        let mut batch = SpriteBatch::new();
        build_frame(&mut batch, &round, &layout(), &tuning);

        let br = batch.vertices[5];
        assert_eq!(br.position, [800.0, 600.0]);
        assert_eq!(br.uv, [50.0, 37.5]);
    }

    #[test]
    fn test_player_uses_current_frame() {
        let tuning = Tuning::default();
        let mut round = round_with(&tuning, 800.0, 600.0, 1);
        round.player.animator.play(crate::sim::AnimKey::Run);
        round.animate(0.13);
        assert_eq!(round.player_frame(), 1);

        let mut batch = SpriteBatch::new();
        build_frame(&mut batch, &round, &layout(), &tuning);
        let start = batch.draws[1].vertices.start as usize;
        let tl = batch.vertices[start];
        assert_eq!(tl.uv, [0.5, 0.0]);
        assert_eq!(tl.position, [304.0, 404.0]);
    }

    #[test]
    fn test_debug_outlines() {
        let mut tuning = Tuning::default();
        let round = round_with(&tuning, 800.0, 600.0, 1);
        let mut plain = SpriteBatch::new();
        build_frame(&mut plain, &round, &layout(), &tuning);

        tuning.debug_bodies = true;
        let mut debug = SpriteBatch::new();
        build_frame(&mut debug, &round, &layout(), &tuning);
        // Four edges of the player outline
        assert_eq!(debug.vertices.len(), plain.vertices.len() + 4 * 6);
        assert_eq!(debug.draws.last().map(|d| d.slot), Some(TextureSlot::Solid));
    }
}
