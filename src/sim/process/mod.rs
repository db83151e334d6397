//! Running ability effects
//!
//! A process is the live, multi-tick instance of an activated ability. Every
//! variant is offered mana, thinks once per tick, can be killed, reports a
//! monotonic phase, and doubles as a condition on its owner's stat sheet.
//!
//! The set of variants is closed: `Process` is an enum, and each variant's
//! struct implements `Behavior` in full.

mod blink;
mod burst;
mod drain;
mod explosion;
mod lightning;
mod moonfire;
mod nitro;
mod shield;

pub use blink::Blink;
pub use burst::Burst;
pub use drain::{MAX_UNITS_PER_TICK, MultiDrain};
pub use explosion::Explosion;
pub use lightning::Lightning;
pub use moonfire::Moonfire;
pub use nitro::Nitro;
pub use shield::Shield;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::game::Game;
use super::mana::Mana;
use super::stats::{Attributes, Condition};
use crate::render::Canvas;

/// Lifecycle of a process
///
/// Transitions only move forward: `Ui -> Running -> Complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting on a targeting gesture
    Ui,
    Running,
    Complete,
}

/// The contract every process variant implements
pub trait Behavior: Condition {
    /// Largest intake that would be useful this tick
    fn request(&self) -> Mana {
        Mana::ZERO
    }

    /// Consume part of `offer` and hand back the rest
    fn supply(&mut self, offer: Mana) -> Mana;

    /// Advance one tick
    fn think(&mut self, game: &mut Game);

    /// Force-terminate; idempotent
    fn kill(&mut self);

    fn phase(&self) -> Phase;

    fn draw(&self, _game: &Game, _canvas: &mut dyn Canvas) {}
}

/// Shortfall still counted as paid, to absorb float rounding
pub(crate) const PAY_TOLERANCE: f32 = 1.0e-4;

/// Move up to `cost - paid` from `offer` into `paid`
pub(crate) fn pay(paid: &mut Mana, cost: &Mana, offer: &mut Mana) {
    let want = cost.saturating_sub(paid);
    *paid += offer.take(&want);
}

/// True once a one-shot cost is paid, up to rounding
pub(crate) fn paid_up(paid: &Mana, cost: &Mana) -> bool {
    paid.covers_within(cost, PAY_TOLERANCE)
}

/// A live ability effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Process {
    Blink(Blink),
    Burst(Burst),
    Nitro(Nitro),
    Shield(Shield),
    MultiDrain(MultiDrain),
    Lightning(Lightning),
    Explosion(Explosion),
    Moonfire(Moonfire),
}

macro_rules! each_variant {
    ($value:expr, $p:ident => $body:expr) => {
        match $value {
            Process::Blink($p) => $body,
            Process::Burst($p) => $body,
            Process::Nitro($p) => $body,
            Process::Shield($p) => $body,
            Process::MultiDrain($p) => $body,
            Process::Lightning($p) => $body,
            Process::Explosion($p) => $body,
            Process::Moonfire($p) => $body,
        }
    };
}

impl Process {
    pub fn name(&self) -> &'static str {
        match self {
            Process::Blink(_) => "blink",
            Process::Burst(_) => "burst",
            Process::Nitro(_) => "nitro",
            Process::Shield(_) => "shield",
            Process::MultiDrain(_) => "multi-drain",
            Process::Lightning(_) => "lightning",
            Process::Explosion(_) => "explosion",
            Process::Moonfire(_) => "moonfire",
        }
    }

    pub fn phase(&self) -> Phase {
        each_variant!(self, p => p.phase())
    }

    pub fn complete(&self) -> bool {
        self.phase() == Phase::Complete
    }

    pub fn request(&self) -> Mana {
        if self.complete() {
            return Mana::ZERO;
        }
        each_variant!(self, p => p.request())
    }

    /// Offer mana; the result never exceeds `offer` in any color
    pub fn supply(&mut self, offer: Mana) -> Mana {
        let offer = offer.non_negative();
        if self.complete() {
            return offer;
        }
        let rest = each_variant!(self, p => p.supply(offer));
        rest.non_negative().min(&offer)
    }

    pub fn think(&mut self, game: &mut Game) {
        if self.complete() {
            return;
        }
        each_variant!(self, p => p.think(game));
        if self.complete() {
            log::debug!("{} process completed at tick {}", self.name(), game.tick);
        }
    }

    pub fn kill(&mut self) {
        each_variant!(self, p => p.kill());
    }

    pub fn draw(&self, game: &Game, canvas: &mut dyn Canvas) {
        if !self.complete() {
            each_variant!(self, p => p.draw(game, canvas));
        }
    }

    /// Lock in a target for a process waiting in `Phase::Ui`
    pub fn set_target(&mut self, pos: Vec2) -> bool {
        match self {
            Process::Moonfire(m) => m.set_target(pos),
            _ => false,
        }
    }

    pub fn as_drain(&self) -> Option<&MultiDrain> {
        match self {
            Process::MultiDrain(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_drain_mut(&mut self) -> Option<&mut MultiDrain> {
        match self {
            Process::MultiDrain(d) => Some(d),
            _ => None,
        }
    }
}

impl Condition for Process {
    fn modify_base(&self, attrs: &mut Attributes) {
        if !self.complete() {
            each_variant!(self, p => p.modify_base(attrs));
        }
    }

    fn modify_damage(&mut self, damage: f32) -> f32 {
        if self.complete() {
            return damage;
        }
        each_variant!(self, p => p.modify_damage(damage))
    }

    fn cause_damage(&self) -> f32 {
        if self.complete() {
            return 0.0;
        }
        each_variant!(self, p => p.cause_damage())
    }

    fn terminated(&self) -> bool {
        self.complete()
    }
}
