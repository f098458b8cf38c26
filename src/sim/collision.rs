//! Axis-aligned bounding boxes and world-bound clamping
//!
//! Screen coordinates: origin top-left, +y points down.

use glam::Vec2;

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Rectangle of `size` centered on `center`
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Strict overlap test; boxes that only share an edge do not overlap
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

/// Which world edges a body was pushed back from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoundsContact {
    pub horizontal: bool,
    pub vertical: bool,
}

impl BoundsContact {
    pub fn any(&self) -> bool {
        self.horizontal || self.vertical
    }
}

/// Clamp a body center so that a box of `size` stays inside `world`.
///
/// If the box is larger than the world on an axis, it is centered on that axis.
pub fn clamp_center(center: Vec2, size: Vec2, world: &Aabb) -> (Vec2, BoundsContact) {
    let half = size * 0.5;
    let mut contact = BoundsContact::default();
    let mut out = center;

    let (lo_x, hi_x) = (world.min.x + half.x, world.max.x - half.x);
    if lo_x > hi_x {
        out.x = world.center().x;
        contact.horizontal = center.x != out.x;
    } else if center.x < lo_x {
        out.x = lo_x;
        contact.horizontal = true;
    } else if center.x > hi_x {
        out.x = hi_x;
        contact.horizontal = true;
    }

    let (lo_y, hi_y) = (world.min.y + half.y, world.max.y - half.y);
    if lo_y > hi_y {
        out.y = world.center().y;
        contact.vertical = center.y != out.y;
    } else if center.y < lo_y {
        out.y = lo_y;
        contact.vertical = true;
    } else if center.y > hi_y {
        out.y = hi_y;
        contact.vertical = true;
    }

    (out, contact)
}
