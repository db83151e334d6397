//! Mana Arena - deterministic simulation core for a 2D mana-arena battle game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (mana economy, processes, physics, tick loop)
//! - `net`: Lock-step engine driving the simulation from an event log
//! - `config`: Data-driven arena and ability configuration
//! - `render`: Draw hooks for an external renderer (no-ops by default)
//! - `error`: Configuration, snapshot and engine errors

pub mod config;
pub mod error;
pub mod net;
pub mod render;
pub mod sim;

pub use config::{AbilitySpec, GameConfig};
pub use error::{ConfigError, EngineError, SnapshotError};
pub use net::{Engine, SharedEngine};
pub use sim::{AbilityRegistry, Event, Game, Gid};

use glam::Vec2;

/// Simulation constants
pub mod consts {
    /// Nominal simulation rate (ticks per second)
    pub const TICKS_PER_SECOND: u32 = 60;

    /// Retention factor applied to multi-drain charge every tick
    pub const DRAIN_RETENTION: f32 = 0.98;

    /// Distance a movement segment is started behind the entity to avoid tunneling
    pub const SWEEP_BACKOFF: f32 = 0.1;

    /// Default entity radius
    pub const ENTITY_RADIUS: f32 = 15.0;

    /// Mass used for entities that never move
    pub const FIXED_MASS: f32 = 1.0e9;
}

/// Wrap an angle into [0, 2π)
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    use std::f32::consts::TAU;
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Signed shortest angular difference `to - from`, in [-π, π)
#[inline]
pub fn angle_delta(from: f32, to: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    (to - from + PI).rem_euclid(TAU) - PI
}

/// Unit vector pointing along `angle`
#[inline]
pub fn facing(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}
