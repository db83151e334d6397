//! Per-entity attribute sheet and the condition stack that modifies it
//!
//! Conditions are not stored here. Every tick the modified sheet is rebuilt
//! from the base sheet by folding in whatever conditions are alive, so a
//! condition that goes away leaves no trace.

use serde::{Deserialize, Serialize};

/// Mutable attribute values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    pub max_health: f32,
    pub mass: f32,
    /// Maximum forward acceleration per tick
    pub max_acc: f32,
    /// Maximum turn per tick (radians)
    pub max_turn: f32,
    /// Collision radius
    pub size: f32,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            max_health: 1000.0,
            mass: 750.0,
            max_acc: 0.3,
            max_turn: 0.07,
            size: crate::consts::ENTITY_RADIUS,
        }
    }
}

/// A temporary modifier on an entity's stat sheet
pub trait Condition {
    /// Adjust the attribute sheet for this tick
    fn modify_base(&self, _attrs: &mut Attributes) {}

    /// Filter incoming damage, returning what is left to apply
    fn modify_damage(&mut self, damage: f32) -> f32 {
        damage
    }

    /// Damage this condition deals to its bearer each tick
    fn cause_damage(&self) -> f32 {
        0.0
    }

    /// Once true the condition is dropped and never applied again
    fn terminated(&self) -> bool;
}

/// Base and condition-modified attributes plus current health
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    base: Attributes,
    modified: Attributes,
    health: f32,
}

impl Stats {
    pub fn new(base: Attributes) -> Self {
        Self {
            base,
            modified: base,
            health: base.max_health,
        }
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn max_acc(&self) -> f32 {
        self.modified.max_acc
    }

    pub fn max_turn(&self) -> f32 {
        self.modified.max_turn
    }

    pub fn mass(&self) -> f32 {
        self.modified.mass
    }

    pub fn size(&self) -> f32 {
        self.modified.size
    }

    /// Rebuild the modified sheet from scratch using the live conditions
    ///
    /// Returns the total damage the conditions cause this tick; the caller
    /// routes it through `apply_damage` so mitigation still applies.
    pub fn reapply<'a, I>(&mut self, conditions: I) -> f32
    where
        I: IntoIterator<Item = &'a dyn Condition>,
    {
        self.modified = self.base;
        let mut caused = 0.0;
        for cond in conditions {
            if cond.terminated() {
                continue;
            }
            cond.modify_base(&mut self.modified);
            caused += cond.cause_damage();
        }
        self.modified.max_acc = self.modified.max_acc.max(0.0);
        self.modified.max_turn = self.modified.max_turn.max(0.0);
        self.modified.mass = self.modified.mass.max(1.0);
        self.health = self.health.min(self.modified.max_health);
        caused
    }

    /// Subtract already-mitigated damage; health never drops below zero
    pub fn apply_damage(&mut self, damage: f32) {
        if damage > 0.0 {
            self.health = (self.health - damage).max(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Haste {
        acc: f32,
        done: bool,
    }

    impl Condition for Haste {
        fn modify_base(&self, attrs: &mut Attributes) {
            attrs.max_acc += self.acc;
        }

        fn cause_damage(&self) -> f32 {
            1.0
        }

        fn terminated(&self) -> bool {
            self.done
        }
    }

    #[test]
    fn test_reapply_starts_from_base() {
        let mut stats = Stats::new(Attributes::default());
        let base_acc = stats.max_acc();
        let haste = Haste { acc: 0.5, done: false };

        let caused = stats.reapply([&haste as &dyn Condition]);
        assert!((stats.max_acc() - base_acc - 0.5).abs() < 0.0001);
        assert!((caused - 1.0).abs() < 0.0001);

        // Applying twice does not stack
        stats.reapply([&haste as &dyn Condition]);
        assert!((stats.max_acc() - base_acc - 0.5).abs() < 0.0001);
    }

    #[test]
    fn test_terminated_condition_ignored() {
        let mut stats = Stats::new(Attributes::default());
        let base_acc = stats.max_acc();
        let haste = Haste { acc: 0.5, done: true };
        let caused = stats.reapply([&haste as &dyn Condition]);
        assert!((stats.max_acc() - base_acc).abs() < 0.0001);
        assert!(caused.abs() < 0.0001);
    }

    #[test]
    fn test_damage_clamps_at_zero() {
        let mut stats = Stats::new(Attributes::default());
        stats.apply_damage(5000.0);
        assert!(stats.health().abs() < 0.0001);
        assert!(!stats.alive());
        stats.apply_damage(-10.0);
        assert!(stats.health().abs() < 0.0001);
    }
}
