use serde::{Deserialize, Serialize};

use super::{Behavior, Phase, paid_up, pay};
use crate::facing;
use crate::render::{Canvas, mana_rgba};
use crate::sim::entity::Gid;
use crate::sim::game::Game;
use crate::sim::mana::{Color, Mana};
use crate::sim::stats::Condition;

/// Teleport along the owner's facing once fully paid and a short delay passes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blink {
    pub owner: Gid,
    pub cost: Mana,
    pub paid: Mana,
    /// Ticks to wait after the cost is covered
    pub delay: u32,
    pub dist: f32,
    done: bool,
}

impl Blink {
    pub fn new(owner: Gid, cost: Mana, dist: f32, delay: u32) -> Self {
        Self {
            owner,
            cost,
            paid: Mana::ZERO,
            delay,
            dist,
            done: false,
        }
    }

    pub fn charged(&self) -> bool {
        paid_up(&self.paid, &self.cost)
    }
}

impl Condition for Blink {
    fn terminated(&self) -> bool {
        self.done
    }
}

impl Behavior for Blink {
    fn request(&self) -> Mana {
        if self.charged() {
            return Mana::ZERO;
        }
        self.cost.saturating_sub(&self.paid)
    }

    fn supply(&mut self, mut offer: Mana) -> Mana {
        pay(&mut self.paid, &self.cost, &mut offer);
        offer
    }

    fn think(&mut self, game: &mut Game) {
        if !self.charged() {
            return;
        }
        if self.delay > 0 {
            self.delay -= 1;
            return;
        }
        self.done = true;

        let Some((dest, size)) = game
            .ent(self.owner)
            .map(|e| (e.pos + facing(e.angle) * self.dist, e.stats.size()))
        else {
            return;
        };
        if !game.is_open(dest, size) {
            log::debug!("blink for {} fizzled at blocked destination {dest}", self.owner);
            return;
        }
        if let Some(ent) = game.ent_mut(self.owner) {
            ent.pos = dest;
        }
    }

    fn kill(&mut self) {
        self.done = true;
    }

    fn phase(&self) -> Phase {
        if self.done {
            Phase::Complete
        } else {
            Phase::Running
        }
    }

    fn draw(&self, game: &Game, canvas: &mut dyn Canvas) {
        let Some(ent) = game.ent(self.owner) else {
            return;
        };
        let total = self.cost.magnitude();
        let fill = if total > 0.0 {
            self.paid.magnitude() / total
        } else {
            1.0
        };
        let dest = ent.pos + facing(ent.angle) * self.dist;
        let color = Color::ALL
            .into_iter()
            .max_by(|a, b| self.cost[*a].total_cmp(&self.cost[*b]))
            .unwrap_or(Color::Blue);
        canvas.circle(dest, ent.stats.size(), mana_rgba(color, fill));
    }
}
