use serde::{Deserialize, Serialize};

use super::{Behavior, Phase};
use crate::render::{Canvas, EFFECT};
use crate::sim::entity::Gid;
use crate::sim::game::Game;
use crate::sim::mana::Mana;
use crate::sim::stats::{Attributes, Condition};

/// Continuous acceleration boost paid for every tick
///
/// The boost is a condition on `max_acc`, so it disappears from the owner's
/// sheet the moment the process stops being live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nitro {
    pub owner: Gid,
    /// Cost per tick
    pub continual: Mana,
    /// Added to the owner's max acceleration
    pub inc: f32,
    killed: bool,
}

impl Nitro {
    pub fn new(owner: Gid, continual: Mana, inc: f32) -> Self {
        Self {
            owner,
            continual,
            inc,
            killed: false,
        }
    }
}

impl Condition for Nitro {
    fn modify_base(&self, attrs: &mut Attributes) {
        if !self.killed {
            attrs.max_acc += self.inc;
        }
    }

    fn terminated(&self) -> bool {
        self.killed
    }
}

impl Behavior for Nitro {
    fn request(&self) -> Mana {
        self.continual
    }

    fn supply(&mut self, offer: Mana) -> Mana {
        if !offer.covers(&self.continual) {
            self.killed = true;
            return offer;
        }
        offer.saturating_sub(&self.continual)
    }

    fn think(&mut self, _game: &mut Game) {}

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
        if let Some(ent) = game.ent(self.owner) {
            let tail = ent.pos - crate::facing(ent.angle) * (ent.stats.size() + 6.0);
            canvas.line(ent.pos, tail, EFFECT);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::mana::Color;

    #[test]
    fn test_starved_nitro_ends_immediately() {
        let mut nitro = Nitro::new(1, Mana::of(Color::Red, 50.0), 0.2);
        let rest = nitro.supply(Mana::of(Color::Red, 10.0));
        assert_eq!(rest, Mana::of(Color::Red, 10.0));
        assert_eq!(nitro.phase(), Phase::Complete);
    }

    #[test]
    fn test_funded_nitro_consumes_continual() {
        let mut nitro = Nitro::new(1, Mana::of(Color::Red, 50.0), 0.2);
        let rest = nitro.supply(Mana::new(80.0, 5.0, 0.0));
        assert_eq!(rest, Mana::new(30.0, 5.0, 0.0));
        assert_eq!(nitro.phase(), Phase::Running);

        let mut attrs = Attributes::default();
        let before = attrs.max_acc;
        nitro.modify_base(&mut attrs);
        assert!((attrs.max_acc - before - 0.2).abs() < 0.0001);
    }
}
