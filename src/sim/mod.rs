//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed tick only
//! - Seeded RNG only, stored in the game state
//! - Stable iteration order (entities by gid, slots by `BTreeMap`)
//! - No rendering or platform dependencies beyond the `Canvas` hooks

pub mod ability;
pub mod entity;
pub mod event;
pub mod game;
pub mod geom;
pub mod mana;
pub mod mana_source;
pub mod process;
pub mod snapshot;
pub mod stats;

pub use ability::{Ability, AbilityRegistry};
pub use entity::{ControlPoint, Entity, EntityKind, Gid, Mine};
pub use event::Event;
pub use game::Game;
pub use geom::{Polygon, Segment};
pub use mana::{Color, Mana};
pub use mana_source::{ManaSource, Node};
pub use process::{Phase, Process};
pub use snapshot::{RenderEnt, decode, encode, merge};
pub use stats::{Attributes, Condition, Stats};
