//! Arena, physics and ability configuration
//!
//! Loaded from JSON at startup. Everything here is static for the lifetime of
//! a game; a bad value is rejected up front rather than patched at runtime.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sim::geom::Polygon;
use crate::sim::stats::Attributes;

/// Terrain that hurts whatever stands in it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub poly: Polygon,
    /// Damage per tick while inside
    pub damage: f32,
}

/// Arena bounds and static geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaConfig {
    pub width: f32,
    pub height: f32,
    /// Solid wall polygons
    #[serde(default)]
    pub walls: Vec<Polygon>,
    #[serde(default)]
    pub hazards: Vec<Hazard>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 1024.0,
            walls: vec![
                Polygon::rect(Vec2::new(300.0, 450.0), Vec2::new(420.0, 570.0)),
                Polygon::rect(Vec2::new(604.0, 450.0), Vec2::new(724.0, 570.0)),
            ],
            hazards: vec![Hazard {
                poly: Polygon::rect(Vec2::new(472.0, 80.0), Vec2::new(552.0, 160.0)),
                damage: 2.0,
            }],
        }
    }
}

/// Movement tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// Velocity retained per tick when moving straight ahead, in (0, 1]
    pub friction: f32,
    /// Half-width of the random velocity nudge added each tick
    pub jitter: f32,
    /// Extra clearance kept between an entity and a wall
    pub collision_epsilon: f32,
    /// Entities closer than this push each other apart
    pub repulsion_radius: f32,
    pub repulsion_force: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            friction: 0.97,
            jitter: 0.001,
            collision_epsilon: 0.1,
            repulsion_radius: 30.0,
            repulsion_force: 300.0,
        }
    }
}

/// Mana node grid layout and drain tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeGridConfig {
    pub rows: usize,
    pub cols: usize,
    pub min_capacity: f32,
    pub max_capacity: f32,
    /// Fraction of capacity regenerated per tick
    pub regen_fraction: f32,
    /// Nodes farther than this from an entity cannot be drained by it
    pub drain_range: f32,
    /// Most a node yields per tick to an entity standing on it
    pub max_drain: f32,
}

impl Default for NodeGridConfig {
    fn default() -> Self {
        Self {
            rows: 32,
            cols: 32,
            min_capacity: 100.0,
            max_capacity: 300.0,
            regen_fraction: 0.002,
            drain_range: 150.0,
            max_drain: 20.0,
        }
    }
}

/// An ability bound to a control slot, resolved through the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilitySpec {
    pub slot: u32,
    pub name: String,
    #[serde(default)]
    pub params: BTreeMap<String, f32>,
}

impl AbilitySpec {
    pub fn new(slot: u32, name: &str, params: &[(&str, f32)]) -> Self {
        Self {
            slot,
            name: name.to_string(),
            params: params.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }
}

/// Complete game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for the shared simulation RNG
    pub seed: u64,
    pub arena: ArenaConfig,
    pub physics: PhysicsConfig,
    pub nodes: NodeGridConfig,
    /// Base attributes for players and creeps
    pub player: Attributes,
    /// Abilities every player starts with
    pub loadout: Vec<AbilitySpec>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            arena: ArenaConfig::default(),
            physics: PhysicsConfig::default(),
            nodes: NodeGridConfig::default(),
            player: Attributes::default(),
            loadout: default_loadout(),
        }
    }
}

/// Colors are given as indices: 0 red, 1 green, 2 blue
fn default_loadout() -> Vec<AbilitySpec> {
    vec![
        AbilitySpec::new(0, "nitro", &[("color", 0.0), ("continual", 20.0), ("inc", 0.1)]),
        AbilitySpec::new(
            1,
            "burst",
            &[("color", 0.0), ("continual", 40.0), ("frames", 30.0), ("force", 200.0), ("radius", 150.0)],
        ),
        AbilitySpec::new(
            2,
            "shield",
            &[("color", 1.0), ("cost", 50.0), ("charge", 25.0), ("max", 200.0), ("frames", 600.0)],
        ),
        AbilitySpec::new(3, "blink", &[("color", 2.0), ("cost", 300.0), ("dist", 150.0), ("delay", 10.0)]),
        AbilitySpec::new(
            4,
            "lightning",
            &[("color", 0.0), ("cost", 400.0), ("range", 500.0), ("width", 8.0), ("damage", 120.0)],
        ),
        AbilitySpec::new(
            5,
            "moonfire",
            &[("color", 2.0), ("cost", 500.0), ("radius", 60.0), ("damage", 4.0), ("frames", 60.0)],
        ),
        AbilitySpec::new(
            6,
            "mine",
            &[("color", 1.0), ("unit", 300.0), ("damage", 6.0), ("trigger", 30.0), ("blast", 80.0), ("arm", 60.0)],
        ),
        AbilitySpec::new(
            7,
            "fire",
            &[("color", 0.0), ("unit", 200.0), ("damage", 3.0), ("radius", 50.0), ("reach", 80.0), ("frames", 30.0)],
        ),
        AbilitySpec::new(8, "pull", &[("color", 2.0), ("unit", 150.0), ("force", 250.0), ("radius", 200.0)]),
    ]
}

impl GameConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject arena data the simulation cannot run on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bad = |msg: String| Err(ConfigError::InvalidArena(msg));

        if !(self.arena.width > 0.0 && self.arena.height > 0.0) {
            return bad(format!(
                "dimensions must be positive, got {}x{}",
                self.arena.width, self.arena.height
            ));
        }
        if let Some(i) = self.arena.walls.iter().position(Polygon::is_degenerate) {
            return bad(format!("wall {i} is degenerate"));
        }
        if let Some(i) = self.arena.hazards.iter().position(|h| h.poly.is_degenerate()) {
            return bad(format!("hazard {i} is degenerate"));
        }

        let physics = &self.physics;
        if !(physics.friction > 0.0 && physics.friction <= 1.0) {
            return bad(format!("friction must be in (0, 1], got {}", physics.friction));
        }
        if physics.jitter < 0.0 || physics.collision_epsilon < 0.0 {
            return bad("jitter and collision epsilon must be non-negative".to_string());
        }
        if physics.repulsion_radius < 0.0 {
            return bad(format!("negative repulsion radius {}", physics.repulsion_radius));
        }

        let nodes = &self.nodes;
        if nodes.rows == 0 || nodes.cols == 0 {
            return bad("node grid is empty".to_string());
        }
        if !(nodes.min_capacity >= 0.0 && nodes.min_capacity <= nodes.max_capacity) {
            return bad(format!(
                "node capacity range {}..{} is invalid",
                nodes.min_capacity, nodes.max_capacity
            ));
        }
        if !(0.0..=1.0).contains(&nodes.regen_fraction) {
            return bad(format!("regen fraction {} outside [0, 1]", nodes.regen_fraction));
        }
        if !(nodes.drain_range > 0.0) || nodes.max_drain < 0.0 {
            return bad("drain range must be positive and max drain non-negative".to_string());
        }

        let attrs = &self.player;
        if !(attrs.max_health > 0.0 && attrs.mass > 0.0 && attrs.size > 0.0) {
            return bad("player health, mass and size must be positive".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = GameConfig::default();
        let json = config.to_json().unwrap();
        let back = GameConfig::from_json(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = GameConfig::from_json(r#"{ "seed": 42 }"#).unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.nodes, NodeGridConfig::default());
    }

    #[test]
    fn test_bad_friction_rejected() {
        let mut config = GameConfig::default();
        config.physics.friction = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidArena(_))));
    }

    #[test]
    fn test_degenerate_wall_rejected() {
        let mut config = GameConfig::default();
        config
            .arena
            .walls
            .push(Polygon::new(vec![Vec2::ZERO, Vec2::new(1.0, 1.0)]));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            GameConfig::from_json("{ seed: "),
            Err(ConfigError::Parse(_))
        ));
    }
}
