use serde::{Deserialize, Serialize};

use super::{Behavior, Phase, paid_up, pay};
use crate::facing;
use crate::render::{Canvas, EFFECT};
use crate::sim::entity::Gid;
use crate::sim::game::Game;
use crate::sim::geom::Segment;
use crate::sim::mana::Mana;
use crate::sim::stats::Condition;

/// Ticks a fired bolt stays visible
const BOLT_LINGER: u32 = 10;

/// Charges a one-shot cost, then strikes along the owner's facing
///
/// The bolt stops at the first wall it meets and damages every other
/// entity whose body touches it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lightning {
    pub owner: Gid,
    pub cost: Mana,
    pub paid: Mana,
    pub range: f32,
    /// Half-width of the bolt
    pub width: f32,
    pub damage: f32,
    /// Set once fired
    pub bolt: Option<Segment>,
    linger: u32,
    killed: bool,
}

impl Lightning {
    pub fn new(owner: Gid, cost: Mana, range: f32, width: f32, damage: f32) -> Self {
        Self {
            owner,
            cost,
            paid: Mana::ZERO,
            range,
            width,
            damage,
            bolt: None,
            linger: 0,
            killed: false,
        }
    }

    fn fire(&mut self, game: &mut Game) {
        let Some((start, angle)) = game.ent(self.owner).map(|e| (e.pos, e.angle)) else {
            self.killed = true;
            return;
        };
        let end = game.cast_ray(start, facing(angle), self.range);
        let bolt = Segment::new(start, end);

        let hits: Vec<Gid> = game
            .ents
            .iter()
            .filter(|e| e.gid != self.owner && e.alive())
            .filter(|e| bolt.distance_to_point(e.pos) <= self.width + e.stats.size())
            .map(|e| e.gid)
            .collect();
        log::debug!("lightning from {} hit {} entities", self.owner, hits.len());
        for gid in hits {
            game.apply_damage(gid, self.damage);
        }

        self.bolt = Some(bolt);
        self.linger = BOLT_LINGER;
    }
}

impl Condition for Lightning {
    fn terminated(&self) -> bool {
        self.phase() == Phase::Complete
    }
}

impl Behavior for Lightning {
    fn request(&self) -> Mana {
        if self.bolt.is_some() {
            Mana::ZERO
        } else {
            self.cost.saturating_sub(&self.paid)
        }
    }

    fn supply(&mut self, mut offer: Mana) -> Mana {
        if self.bolt.is_none() {
            pay(&mut self.paid, &self.cost, &mut offer);
        }
        offer
    }

    fn think(&mut self, game: &mut Game) {
        if self.bolt.is_some() {
            self.linger = self.linger.saturating_sub(1);
        } else if paid_up(&self.paid, &self.cost) {
            self.fire(game);
        }
    }

    fn kill(&mut self) {
        self.killed = true;
    }

    fn phase(&self) -> Phase {
        if self.killed || (self.bolt.is_some() && self.linger == 0) {
            Phase::Complete
        } else {
            Phase::Running
        }
    }

    fn draw(&self, _game: &Game, canvas: &mut dyn Canvas) {
        if let Some(bolt) = &self.bolt {
            canvas.line(bolt.p, bolt.q, EFFECT);
        }
    }
}
