//! Score overlay
//!
//! egui lays out and tessellates the text; the resulting meshes are flattened
//! into the same pixel-space `Vertex` format the sprites use, so the wgpu
//! pipeline draws them without egui-wgpu.

use std::ops::Range;

use egui::{Align2, Color32, FontId, LayerId, Order, RawInput, Rect, TextureId, TexturesDelta};

use super::vertex::Vertex;
use crate::sim::Viewport;
use crate::tuning::Tuning;

/// A run of HUD vertices drawn with one egui texture
#[derive(Debug, Clone, PartialEq)]
pub struct HudDraw {
    pub texture: TextureId,
    pub vertices: Range<u32>,
}

/// One frame of overlay output
#[derive(Debug, Default)]
pub struct HudFrame {
    pub vertices: Vec<Vertex>,
    pub draws: Vec<HudDraw>,
    /// Font atlas uploads to apply before drawing, frees after
    pub textures: TexturesDelta,
}

impl HudFrame {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

pub struct Hud {
    ctx: egui::Context,
    max_texture_side: Option<usize>,
}

impl Hud {
    pub fn new(max_texture_side: Option<usize>) -> Self {
        Self {
            ctx: egui::Context::default(),
            max_texture_side,
        }
    }

    /// Lay out `text` at the tuned position and size
    pub fn build(&self, text: &str, viewport: Viewport, tuning: &Tuning) -> HudFrame {
        let raw = RawInput {
            screen_rect: Some(Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(viewport.width.max(1.0), viewport.height.max(1.0)),
            )),
            max_texture_side: self.max_texture_side,
            ..Default::default()
        };

        let (x, y) = tuning.score_text_pos;
        let output = self.ctx.run(raw, |ctx| {
            ctx.layer_painter(LayerId::new(Order::Foreground, egui::Id::new("score")))
                .text(
                    egui::pos2(x, y),
                    Align2::LEFT_TOP,
                    text,
                    FontId::proportional(tuning.score_text_size),
                    Color32::WHITE,
                );
        });

        let primitives = self.ctx.tessellate(output.shapes, output.pixels_per_point);
        let mut frame = HudFrame {
            textures: output.textures_delta,
            ..Default::default()
        };
        for primitive in primitives {
            if let egui::epaint::Primitive::Mesh(mesh) = primitive.primitive {
                frame.push_mesh(&mesh);
            }
        }
        frame
    }
}

impl HudFrame {
    /// Expand an indexed egui mesh into a triangle list
    fn push_mesh(&mut self, mesh: &egui::Mesh) {
        let start = self.vertices.len() as u32;
        self.vertices.extend(mesh.indices.iter().filter_map(|&i| {
            let v = mesh.vertices.get(i as usize)?;
            Some(Vertex::new(
                v.pos.x,
                v.pos.y,
                v.uv.x,
                v.uv.y,
                egui::Rgba::from(v.color).to_array(),
            ))
        }));
        let end = self.vertices.len() as u32;
        if end == start {
            return;
        }

        match self.draws.last_mut() {
            Some(last) if last.texture == mesh.texture_id && last.vertices.end == start => {
                last.vertices.end = end;
            }
            _ => self.draws.push(HudDraw {
                texture: mesh.texture_id,
                vertices: start..end,
            }),
        }
    }
}
