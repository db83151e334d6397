use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{Behavior, Phase};
use crate::render::{Canvas, EFFECT};
use crate::sim::entity::Gid;
use crate::sim::game::Game;
use crate::sim::mana::Mana;
use crate::sim::stats::Condition;

/// Area damage-over-time with a radius that grows every tick
///
/// Lives in the world process list rather than on an entity, and never
/// takes mana.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explosion {
    /// Entity that caused it
    pub source: Gid,
    pub pos: Vec2,
    pub radius: f32,
    /// Radius added each tick
    pub growth: f32,
    /// Damage per tick to everything inside
    pub damage: f32,
    pub frames: u32,
}

impl Explosion {
    /// Explosion that reaches `max_radius` on its last tick
    pub fn new(source: Gid, pos: Vec2, max_radius: f32, damage: f32, frames: u32) -> Self {
        let growth = if frames > 0 {
            max_radius / frames as f32
        } else {
            0.0
        };
        Self {
            source,
            pos,
            radius: 0.0,
            growth,
            damage,
            frames,
        }
    }
}

impl Condition for Explosion {
    fn terminated(&self) -> bool {
        self.frames == 0
    }
}

impl Behavior for Explosion {
    fn supply(&mut self, offer: Mana) -> Mana {
        offer
    }

    fn think(&mut self, game: &mut Game) {
        if self.frames == 0 {
            return;
        }
        self.frames -= 1;
        self.radius += self.growth;

        let hits: Vec<Gid> = game
            .ents
            .iter()
            .filter(|e| e.alive() && e.pos.distance(self.pos) < self.radius + e.stats.size())
            .map(|e| e.gid)
            .collect();
        for gid in hits {
            game.apply_damage(gid, self.damage);
        }
    }

    fn kill(&mut self) {
        self.frames = 0;
    }

    fn phase(&self) -> Phase {
        if self.frames == 0 {
            Phase::Complete
        } else {
            Phase::Running
        }
    }

    fn draw(&self, _game: &Game, canvas: &mut dyn Canvas) {
        canvas.circle(self.pos, self.radius, EFFECT);
    }
}
