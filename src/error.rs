//! Error types for config loading, snapshots and the lock-step engine
//!
//! The tick loop itself never fails; these only surface at construction
//! time or when moving whole game states across a boundary.

use thiserror::Error;

/// Invalid arena or ability configuration; nothing is defaulted
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ability `{ability}` is missing parameter `{param}`")]
    MissingParam { ability: String, param: &'static str },

    #[error("ability `{ability}` parameter `{param}` = {value} is out of range ({expected})")]
    InvalidParam {
        ability: String,
        param: &'static str,
        value: f32,
        /// Allowed range, for humans
        expected: &'static str,
    },

    /// No maker registered under this name
    #[error("unknown ability `{0}`")]
    UnknownAbility(String),

    #[error("invalid arena: {0}")]
    InvalidArena(String),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failure to move a game state in or out of its binary form
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot encode failed: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("snapshot decode failed: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}

/// Rejected input to the lock-step engine
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Stamped for a tick older than every retained snapshot
    #[error("event for tick {tick} is too old to replay (oldest replayable tick is {oldest})")]
    TooLate { tick: u64, oldest: u64 },
}
