use serde::{Deserialize, Serialize};

use super::{Behavior, Phase};
use crate::consts::DRAIN_RETENTION;
use crate::render::{Canvas, mana_rgba};
use crate::sim::entity::Gid;
use crate::sim::game::Game;
use crate::sim::mana::Mana;
use crate::sim::stats::Condition;

/// Most charge units a drain can absorb in one tick
pub const MAX_UNITS_PER_TICK: f32 = 1.0;

/// Accumulates fractional "charge" that discrete-trigger abilities spend
///
/// `unit` is the cost of one whole charge. Each supply converts as many
/// fractional units as the scarcest required color allows. Stored charge
/// leaks by `DRAIN_RETENTION` every tick whether or not it is spent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiDrain {
    pub owner: Gid,
    pub unit: Mana,
    pub stored: f32,
    killed: bool,
}

impl MultiDrain {
    pub fn new(owner: Gid, unit: Mana) -> Self {
        Self {
            owner,
            unit,
            stored: 0.0,
            killed: false,
        }
    }

    /// Spend `amount` of charge if strictly more than that is stored
    pub fn consume(&mut self, amount: f32) -> bool {
        if self.killed || self.stored <= amount {
            return false;
        }
        self.stored -= amount;
        true
    }
}

impl Condition for MultiDrain {
    fn terminated(&self) -> bool {
        self.killed
    }
}

impl Behavior for MultiDrain {
    fn request(&self) -> Mana {
        self.unit * MAX_UNITS_PER_TICK
    }

    fn supply(&mut self, offer: Mana) -> Mana {
        let units = self
            .unit
            .iter()
            .filter(|&(_, u)| u > 0.0)
            .map(|(color, u)| offer[color] / u)
            .reduce(f32::min);

        let Some(units) = units else {
            return offer;
        };
        let units = units.clamp(0.0, MAX_UNITS_PER_TICK);
        self.stored += units;
        offer.saturating_sub(&(self.unit * units))
    }

    fn think(&mut self, _game: &mut Game) {
        self.stored *= DRAIN_RETENTION;
    }

    fn kill(&mut self) {
        self.killed = true;
    }

    fn phase(&self) -> Phase {
        if self.killed {
            Phase::Complete
        } else {
            Phase::Running
        }
    }

    fn draw(&self, game: &Game, canvas: &mut dyn Canvas) {
        let Some(ent) = game.ent(self.owner) else {
            return;
        };
        let color = self
            .unit
            .iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(c, _)| c);
        if let Some(color) = color {
            let r = ent.stats.size() + 3.0;
            canvas.circle(ent.pos, r, mana_rgba(color, self.stored));
        }
    }
}
