//! Whole-game copies for rollback, binary snapshots, and render interpolation

use glam::Vec2;

use super::entity::Gid;
use super::game::Game;
use crate::error::SnapshotError;
use crate::{angle_delta, wrap_angle};

/// Interpolated pose of one entity, for drawing only
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderEnt {
    pub gid: Gid,
    pub pos: Vec2,
    pub angle: f32,
}

impl Game {
    /// Fully independent deep copy, RNG state included
    pub fn copy(&self) -> Game {
        self.clone()
    }

    /// Make `self` equal to `other`, reusing existing allocations
    pub fn overwrite_with(&mut self, other: &Game) {
        self.config.clone_from(&other.config);

        let source = &mut self.mana_source;
        source.rows = other.mana_source.rows;
        source.cols = other.mana_source.cols;
        source.drain_range = other.mana_source.drain_range;
        source.max_drain = other.mana_source.max_drain;
        source.nodes.clone_from(&other.mana_source.nodes);

        self.rng.clone_from(&other.rng);
        self.ents.clone_from(&other.ents);
        self.processes.clone_from(&other.processes);
        self.tick = other.tick;
        self.next_id = other.next_id;
        self.loadout.clone_from(&other.loadout);
    }
}

/// Interpolate between two snapshots for drawing
///
/// `frac` 0 gives `a`, 1 gives `b`. Only entities present in both are
/// returned. Neither snapshot is touched.
pub fn merge(a: &Game, b: &Game, frac: f32) -> Vec<RenderEnt> {
    let frac = frac.clamp(0.0, 1.0);
    b.ents
        .iter()
        .filter_map(|to| {
            let from = a.ent(to.gid)?;
            Some(RenderEnt {
                gid: to.gid,
                pos: from.pos.lerp(to.pos, frac),
                angle: wrap_angle(from.angle + angle_delta(from.angle, to.angle) * frac),
            })
        })
        .collect()
}

/// Serialize the whole game to bytes
pub fn encode(game: &Game) -> Result<Vec<u8>, SnapshotError> {
    Ok(bincode::serde::encode_to_vec(game, bincode::config::standard())?)
}

/// Rebuild a game from `encode` output
pub fn decode(bytes: &[u8]) -> Result<Game, SnapshotError> {
    let (game, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
    Ok(game)
}
