//! Draw hooks for an external renderer
//!
//! The simulation only ever calls into a `Canvas`; it never reads anything
//! back. Every method defaults to a no-op, so a headless build just passes
//! `NullCanvas`.

use glam::Vec2;

use crate::sim::mana::Color;

/// Linear RGBA color
pub type Rgba = [f32; 4];

pub const WALL: Rgba = [0.55, 0.55, 0.6, 1.0];
pub const HAZARD: Rgba = [0.9, 0.35, 0.1, 0.6];
pub const ENTITY: Rgba = [0.9, 0.9, 0.9, 1.0];
pub const EFFECT: Rgba = [1.0, 0.85, 0.3, 0.8];

/// Render target for simulation state
pub trait Canvas {
    fn circle(&mut self, _center: Vec2, _radius: f32, _color: Rgba) {}

    fn line(&mut self, _from: Vec2, _to: Vec2, _color: Rgba) {}

    fn polygon(&mut self, _verts: &[Vec2], _color: Rgba) {}
}

/// Canvas that draws nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCanvas;

impl Canvas for NullCanvas {}

/// Display color for a mana color, scaled by how full the source is
pub fn mana_rgba(color: Color, fill: f32) -> Rgba {
    let a = fill.clamp(0.0, 1.0);
    match color {
        Color::Red => [1.0, 0.2, 0.2, a],
        Color::Green => [0.2, 1.0, 0.3, a],
        Color::Blue => [0.3, 0.4, 1.0, a],
    }
}
