use serde::{Deserialize, Serialize};

use super::{Behavior, Phase};
use crate::render::{Canvas, mana_rgba};
use crate::sim::entity::Gid;
use crate::sim::game::Game;
use crate::sim::mana::{Color, Mana};
use crate::sim::stats::Condition;

/// Damage buffer bought in whole charges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shield {
    pub owner: Gid,
    /// Mana spent per charge
    pub charge_cost: Mana,
    /// Buffer gained per charge
    pub charge: f32,
    pub max_buffer: f32,
    pub buffer: f32,
    /// Ticks left
    pub frames: u32,
}

impl Shield {
    pub fn new(owner: Gid, charge_cost: Mana, charge: f32, max_buffer: f32, frames: u32) -> Self {
        Self {
            owner,
            charge_cost,
            charge,
            max_buffer,
            buffer: 0.0,
            frames,
        }
    }
}

impl Condition for Shield {
    fn modify_damage(&mut self, damage: f32) -> f32 {
        let absorbed = damage.clamp(0.0, self.buffer);
        self.buffer -= absorbed;
        damage - absorbed
    }

    fn terminated(&self) -> bool {
        self.frames == 0
    }
}

impl Behavior for Shield {
    fn request(&self) -> Mana {
        if self.charge <= 0.0 {
            return Mana::ZERO;
        }
        let charges = ((self.max_buffer - self.buffer) / self.charge).floor().max(0.0);
        self.charge_cost * charges
    }

    fn supply(&mut self, mut offer: Mana) -> Mana {
        if self.charge <= 0.0 {
            return offer;
        }
        if self.charge_cost.is_zero() {
            self.buffer = self.max_buffer;
            return offer;
        }
        // Whole charges that fit under the cap and that the offer can pay for
        let room = ((self.max_buffer - self.buffer) / self.charge).floor();
        let affordable = self
            .charge_cost
            .0
            .iter()
            .zip(offer.0.iter())
            .filter(|(cost, _)| **cost > 0.0)
            .map(|(cost, have)| (have / cost).floor())
            .fold(f32::INFINITY, f32::min);
        let charges = room.min(affordable);
        if charges >= 1.0 {
            offer = offer.saturating_sub(&(self.charge_cost * charges));
            self.buffer = (self.buffer + self.charge * charges).min(self.max_buffer);
        }
        offer
    }

    fn think(&mut self, _game: &mut Game) {
        self.frames = self.frames.saturating_sub(1);
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
            let fill = if self.max_buffer > 0.0 {
                self.buffer / self.max_buffer
            } else {
                0.0
            };
            canvas.circle(ent.pos, ent.stats.size() + 5.0, mana_rgba(Color::Green, fill));
        }
    }
}
