//! Input events applied to the game at tick boundaries
//!
//! Events are small serializable commands from players, scripted creeps or
//! the network engine. An event naming an entity that no longer exists (or
//! never did) is ignored.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ability;
use super::entity::Gid;
use super::game::Game;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Add to this tick's forward acceleration
    Accelerate { gid: Gid, amount: f32 },
    /// Add to this tick's turn
    Turn { gid: Gid, amount: f32 },
    /// Toggle the ability in `slot`
    Activate { gid: Gid, slot: u32 },
    /// Spend a charge from the multi-drain ability in `slot`
    Trigger { gid: Gid, slot: u32 },
    /// Lock in the target of a process waiting on one
    Target { gid: Gid, slot: u32, pos: Vec2 },
}

impl Event {
    /// Entity the event is addressed to
    pub fn gid(&self) -> Gid {
        match *self {
            Event::Accelerate { gid, .. }
            | Event::Turn { gid, .. }
            | Event::Activate { gid, .. }
            | Event::Trigger { gid, .. }
            | Event::Target { gid, .. } => gid,
        }
    }
}

impl Game {
    /// Apply one event; unknown or dead entities make it a no-op
    pub fn apply(&mut self, event: &Event) {
        let gid = event.gid();
        if !self.ent(gid).is_some_and(|e| e.alive()) {
            log::debug!("tick {}: ignoring {event:?} for missing entity", self.tick);
            return;
        }

        match *event {
            Event::Accelerate { amount, .. } => {
                if let Some(ent) = self.ent_mut(gid) {
                    ent.delta.speed += amount;
                }
            }
            Event::Turn { amount, .. } => {
                if let Some(ent) = self.ent_mut(gid) {
                    ent.delta.angle += amount;
                }
            }
            Event::Activate { slot, .. } => ability::activate(self, gid, slot),
            Event::Trigger { slot, .. } => ability::trigger(self, gid, slot),
            Event::Target { slot, pos, .. } => {
                let targeted = self
                    .ent_mut(gid)
                    .and_then(|ent| ent.processes.get_mut(&slot))
                    .is_some_and(|p| p.set_target(pos));
                if !targeted {
                    log::debug!("tick {}: entity {gid} slot {slot} is not waiting for a target", self.tick);
                }
            }
        }
    }
}
