use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{Behavior, Phase};
use crate::render::{Canvas, EFFECT};
use crate::sim::entity::Gid;
use crate::sim::game::Game;
use crate::sim::mana::Mana;
use crate::sim::stats::Condition;

/// Radial knockback around the owner, paid for every tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Burst {
    pub owner: Gid,
    /// Cost per tick
    pub continual: Mana,
    /// Ticks left
    pub frames: u32,
    /// Push at the owner's position; falls off linearly to zero at `radius`
    pub force: f32,
    pub radius: f32,
}

impl Burst {
    pub fn new(owner: Gid, continual: Mana, frames: u32, force: f32, radius: f32) -> Self {
        Self {
            owner,
            continual,
            frames,
            force,
            radius,
        }
    }
}

impl Condition for Burst {
    fn terminated(&self) -> bool {
        self.frames == 0
    }
}

impl Behavior for Burst {
    fn request(&self) -> Mana {
        self.continual
    }

    fn supply(&mut self, offer: Mana) -> Mana {
        // Any short color ends the burst on the spot
        if !offer.covers(&self.continual) {
            self.frames = 0;
            return offer;
        }
        offer.saturating_sub(&self.continual)
    }

    fn think(&mut self, game: &mut Game) {
        if self.frames == 0 {
            return;
        }
        self.frames -= 1;

        let Some(center) = game.ent(self.owner).map(|e| e.pos) else {
            self.frames = 0;
            return;
        };

        let pushes: Vec<(Gid, Vec2)> = game
            .ents
            .iter()
            .filter(|e| e.gid != self.owner && e.alive() && !e.is_fixed())
            .filter_map(|e| {
                let d = e.pos - center;
                let dist = d.length();
                if dist >= self.radius || dist < 1.0e-6 {
                    return None;
                }
                let falloff = 1.0 - dist / self.radius;
                Some((e.gid, d / dist * self.force * falloff))
            })
            .collect();

        for (gid, force) in pushes {
            game.apply_force(gid, force);
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

    fn draw(&self, game: &Game, canvas: &mut dyn Canvas) {
        if let Some(ent) = game.ent(self.owner) {
            canvas.circle(ent.pos, self.radius, EFFECT);
        }
    }
}
