//! Abilities: the per-slot controllers that turn input into processes
//!
//! Abilities are resolved by name through an `AbilityRegistry` built at
//! startup. Parameters are static configuration, so anything missing or out
//! of range is a `ConfigError` when the ability is built, never at runtime.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{EntityKind, Gid, Mine};
use super::game::Game;
use super::mana::{Color, Mana};
use super::process::{
    Blink, Burst, Explosion, Lightning, Moonfire, MultiDrain, Nitro, Phase, Process, Shield,
};
use crate::config::AbilitySpec;
use crate::error::ConfigError;
use crate::facing;

/// Raw ability parameters by name
pub type Params = BTreeMap<String, f32>;

/// Builds an ability from its configured name and parameters
pub type AbilityMaker = fn(&str, &Params) -> Result<Ability, ConfigError>;

/// Charge spent by one discrete trigger
pub const TRIGGER_COST: f32 = 1.0;

/// Ticks the fire ability's explosion lasts
const FIRE_FRAMES_DEFAULT: u32 = 30;

/// Ticks a mine's explosion takes to reach full size
pub const MINE_BLAST_FRAMES: u32 = 20;

/// A configured ability bound to one control slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Ability {
    Blink {
        cost: Mana,
        dist: f32,
        delay: u32,
    },
    Burst {
        continual: Mana,
        frames: u32,
        force: f32,
        radius: f32,
    },
    Nitro {
        continual: Mana,
        inc: f32,
    },
    Shield {
        cost: Mana,
        charge: f32,
        max: f32,
        frames: u32,
    },
    Lightning {
        cost: Mana,
        range: f32,
        width: f32,
        damage: f32,
    },
    Moonfire {
        cost: Mana,
        radius: f32,
        damage: f32,
        frames: u32,
    },
    /// Lays a proximity mine per charge
    Mine {
        unit: Mana,
        damage: f32,
        trigger: f32,
        blast: f32,
        arm: u32,
    },
    /// Sets off an explosion in front of the owner per charge
    Fire {
        unit: Mana,
        damage: f32,
        radius: f32,
        reach: f32,
        frames: u32,
    },
    /// Pulls everything nearby toward the owner whenever a charge is ready
    Pull {
        unit: Mana,
        force: f32,
        radius: f32,
    },
}

impl Ability {
    pub fn name(&self) -> &'static str {
        match self {
            Ability::Blink { .. } => "blink",
            Ability::Burst { .. } => "burst",
            Ability::Nitro { .. } => "nitro",
            Ability::Shield { .. } => "shield",
            Ability::Lightning { .. } => "lightning",
            Ability::Moonfire { .. } => "moonfire",
            Ability::Mine { .. } => "mine",
            Ability::Fire { .. } => "fire",
            Ability::Pull { .. } => "pull",
        }
    }

    /// Abilities whose process starts in `Phase::Ui`
    pub fn needs_target(&self) -> bool {
        matches!(self, Ability::Moonfire { .. })
    }

    /// Start a fresh process for `owner`
    pub fn spawn(&self, owner: Gid) -> Process {
        match *self {
            Ability::Blink { cost, dist, delay } => Process::Blink(Blink::new(owner, cost, dist, delay)),
            Ability::Burst {
                continual,
                frames,
                force,
                radius,
            } => Process::Burst(Burst::new(owner, continual, frames, force, radius)),
            Ability::Nitro { continual, inc } => Process::Nitro(Nitro::new(owner, continual, inc)),
            Ability::Shield {
                cost,
                charge,
                max,
                frames,
            } => Process::Shield(Shield::new(owner, cost, charge, max, frames)),
            Ability::Lightning {
                cost,
                range,
                width,
                damage,
            } => Process::Lightning(Lightning::new(owner, cost, range, width, damage)),
            Ability::Moonfire {
                cost,
                radius,
                damage,
                frames,
            } => Process::Moonfire(Moonfire::new(owner, cost, radius, damage, frames)),
            Ability::Mine { unit, .. } | Ability::Fire { unit, .. } | Ability::Pull { unit, .. } => {
                Process::MultiDrain(MultiDrain::new(owner, unit))
            }
        }
    }
}

/// Reads and range-checks parameters for one ability
struct ParamReader<'a> {
    ability: &'a str,
    params: &'a Params,
}

impl<'a> ParamReader<'a> {
    fn new(ability: &'a str, params: &'a Params) -> Self {
        Self { ability, params }
    }

    fn get(&self, param: &'static str) -> Result<f32, ConfigError> {
        let value = self
            .params
            .get(param)
            .copied()
            .ok_or_else(|| ConfigError::MissingParam {
                ability: self.ability.to_string(),
                param,
            })?;
        if !value.is_finite() {
            return Err(self.invalid(param, value, "a finite number"));
        }
        Ok(value)
    }

    fn invalid(&self, param: &'static str, value: f32, expected: &'static str) -> ConfigError {
        ConfigError::InvalidParam {
            ability: self.ability.to_string(),
            param,
            value,
            expected,
        }
    }

    fn positive(&self, param: &'static str) -> Result<f32, ConfigError> {
        let value = self.get(param)?;
        if value <= 0.0 {
            return Err(self.invalid(param, value, "> 0"));
        }
        Ok(value)
    }

    fn non_negative(&self, param: &'static str) -> Result<f32, ConfigError> {
        let value = self.get(param)?;
        if value < 0.0 {
            return Err(self.invalid(param, value, ">= 0"));
        }
        Ok(value)
    }

    /// A whole number of ticks
    fn ticks(&self, param: &'static str) -> Result<u32, ConfigError> {
        let value = self.non_negative(param)?;
        if value.fract() != 0.0 || value > u32::MAX as f32 {
            return Err(self.invalid(param, value, "a whole number of ticks"));
        }
        Ok(value as u32)
    }

    /// `amount` of the color named by the `color` parameter
    fn cost(&self, amount: &'static str) -> Result<Mana, ConfigError> {
        let index = self.get("color")?;
        let color = if index.fract() == 0.0 && index >= 0.0 {
            Color::from_index(index as usize)
        } else {
            None
        };
        let color = color.ok_or_else(|| self.invalid("color", index, "0 (red), 1 (green) or 2 (blue)"))?;
        Ok(Mana::of(color, self.non_negative(amount)?))
    }
}

fn make_blink(name: &str, params: &Params) -> Result<Ability, ConfigError> {
    let p = ParamReader::new(name, params);
    Ok(Ability::Blink {
        cost: p.cost("cost")?,
        dist: p.positive("dist")?,
        delay: p.ticks("delay")?,
    })
}

fn make_burst(name: &str, params: &Params) -> Result<Ability, ConfigError> {
    let p = ParamReader::new(name, params);
    Ok(Ability::Burst {
        continual: p.cost("continual")?,
        frames: p.ticks("frames")?,
        force: p.non_negative("force")?,
        radius: p.positive("radius")?,
    })
}

fn make_nitro(name: &str, params: &Params) -> Result<Ability, ConfigError> {
    let p = ParamReader::new(name, params);
    Ok(Ability::Nitro {
        continual: p.cost("continual")?,
        inc: p.non_negative("inc")?,
    })
}

fn make_shield(name: &str, params: &Params) -> Result<Ability, ConfigError> {
    let p = ParamReader::new(name, params);
    let charge = p.positive("charge")?;
    let max = p.positive("max")?;
    if max < charge {
        return Err(p.invalid("max", max, ">= charge"));
    }
    Ok(Ability::Shield {
        cost: p.cost("cost")?,
        charge,
        max,
        frames: p.ticks("frames")?,
    })
}

fn make_lightning(name: &str, params: &Params) -> Result<Ability, ConfigError> {
    let p = ParamReader::new(name, params);
    Ok(Ability::Lightning {
        cost: p.cost("cost")?,
        range: p.positive("range")?,
        width: p.non_negative("width")?,
        damage: p.non_negative("damage")?,
    })
}

fn make_moonfire(name: &str, params: &Params) -> Result<Ability, ConfigError> {
    let p = ParamReader::new(name, params);
    Ok(Ability::Moonfire {
        cost: p.cost("cost")?,
        radius: p.positive("radius")?,
        damage: p.non_negative("damage")?,
        frames: p.ticks("frames")?,
    })
}

fn make_mine(name: &str, params: &Params) -> Result<Ability, ConfigError> {
    let p = ParamReader::new(name, params);
    Ok(Ability::Mine {
        unit: p.cost("unit")?,
        damage: p.non_negative("damage")?,
        trigger: p.positive("trigger")?,
        blast: p.positive("blast")?,
        arm: p.ticks("arm")?,
    })
}

fn make_fire(name: &str, params: &Params) -> Result<Ability, ConfigError> {
    let p = ParamReader::new(name, params);
    let frames = if params.contains_key("frames") {
        p.ticks("frames")?
    } else {
        FIRE_FRAMES_DEFAULT
    };
    Ok(Ability::Fire {
        unit: p.cost("unit")?,
        damage: p.non_negative("damage")?,
        radius: p.positive("radius")?,
        reach: p.non_negative("reach")?,
        frames,
    })
}

fn make_pull(name: &str, params: &Params) -> Result<Ability, ConfigError> {
    let p = ParamReader::new(name, params);
    Ok(Ability::Pull {
        unit: p.cost("unit")?,
        force: p.non_negative("force")?,
        radius: p.positive("radius")?,
    })
}

/// Name to constructor table for abilities
#[derive(Debug, Clone, Default)]
pub struct AbilityRegistry {
    makers: BTreeMap<String, AbilityMaker>,
}

impl AbilityRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in ability
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("blink", make_blink);
        registry.register("burst", make_burst);
        registry.register("nitro", make_nitro);
        registry.register("shield", make_shield);
        registry.register("lightning", make_lightning);
        registry.register("moonfire", make_moonfire);
        registry.register("mine", make_mine);
        registry.register("fire", make_fire);
        registry.register("pull", make_pull);
        registry
    }

    /// Add or replace the maker for `name`
    pub fn register(&mut self, name: &str, maker: AbilityMaker) {
        self.makers.insert(name.to_string(), maker);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.makers.contains_key(name)
    }

    pub fn make(&self, spec: &AbilitySpec) -> Result<Ability, ConfigError> {
        let maker = self
            .makers
            .get(&spec.name)
            .ok_or_else(|| ConfigError::UnknownAbility(spec.name.clone()))?;
        maker(&spec.name, &spec.params)
    }
}

/// Toggle the process in `slot` for entity `gid`
///
/// A live process in the slot is killed; otherwise the slot's ability spawns
/// a new one. Starting a targeted ability first kills any other process of
/// this entity still waiting for a target.
pub(crate) fn activate(game: &mut Game, gid: Gid, slot: u32) {
    let Some(ent) = game.ent_mut(gid) else {
        log::debug!("activate ignored: no entity {gid}");
        return;
    };
    let Some(ability) = ent.abilities.get(&slot).cloned() else {
        log::debug!("activate ignored: entity {gid} has no ability in slot {slot}");
        return;
    };

    if ent.processes.get(&slot).is_some_and(|p| !p.complete()) {
        ent.kill_process(slot);
        return;
    }

    if ability.needs_target() {
        let waiting: Vec<u32> = ent
            .processes
            .iter()
            .filter(|(_, p)| p.phase() == Phase::Ui)
            .map(|(s, _)| *s)
            .collect();
        for s in waiting {
            ent.kill_process(s);
        }
    }

    log::debug!("entity {gid} activated {} in slot {slot}", ability.name());
    ent.processes.insert(slot, ability.spawn(gid));
    ent.reapply_conditions();
}

/// Spend one charge of the multi-drain process in `slot` on its effect
pub(crate) fn trigger(game: &mut Game, gid: Gid, slot: u32) {
    let Some(ent) = game.ent_mut(gid) else {
        log::debug!("trigger ignored: no entity {gid}");
        return;
    };
    let Some(ability) = ent.abilities.get(&slot).cloned() else {
        return;
    };
    let charged = ent
        .processes
        .get_mut(&slot)
        .and_then(Process::as_drain_mut)
        .is_some_and(|drain| drain.consume(TRIGGER_COST));
    if !charged {
        log::debug!("trigger ignored: entity {gid} slot {slot} not charged");
        return;
    }

    let (pos, angle) = (ent.pos, ent.angle);
    match ability {
        Ability::Mine {
            damage,
            trigger,
            blast,
            arm,
            ..
        } => {
            let mine = Mine {
                owner: gid,
                arm,
                trigger,
                blast,
                damage,
            };
            game.add_ent(EntityKind::Mine(mine), pos);
        }
        Ability::Fire {
            damage,
            radius,
            reach,
            frames,
            ..
        } => {
            let at = pos + facing(angle) * reach;
            game.processes
                .push(Process::Explosion(Explosion::new(gid, at, radius, damage, frames)));
        }
        Ability::Pull { force, radius, .. } => pull(game, gid, pos, force, radius),
        _ => {}
    }
}

/// Per-tick ability upkeep: pull abilities pulse whenever a charge is ready
pub(crate) fn think(game: &mut Game) {
    let mut pulses: Vec<(Gid, Vec2, f32, f32)> = Vec::new();
    for ent in game.ents.iter_mut().filter(|e| e.alive()) {
        for (slot, ability) in &ent.abilities {
            let Ability::Pull { force, radius, .. } = *ability else {
                continue;
            };
            let fired = ent
                .processes
                .get_mut(slot)
                .and_then(Process::as_drain_mut)
                .is_some_and(|drain| drain.consume(TRIGGER_COST));
            if fired {
                pulses.push((ent.gid, ent.pos, force, radius));
            }
        }
    }
    for (gid, pos, force, radius) in pulses {
        pull(game, gid, pos, force, radius);
    }
}

fn pull(game: &mut Game, owner: Gid, center: Vec2, force: f32, radius: f32) {
    let pulls: Vec<(Gid, Vec2)> = game
        .ents
        .iter()
        .filter(|e| e.gid != owner && e.alive() && !e.is_fixed())
        .filter_map(|e| {
            let d = center - e.pos;
            let dist = d.length();
            (dist < radius && dist > 1.0e-6).then(|| (e.gid, d / dist * force))
        })
        .collect();
    for (gid, f) in pulls {
        game.apply_force(gid, f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, params: &[(&str, f32)]) -> AbilitySpec {
        AbilitySpec::new(0, name, params)
    }

    #[test]
    fn test_builtins_cover_default_loadout() {
        let registry = AbilityRegistry::with_builtins();
        for spec in crate::config::GameConfig::default().loadout {
            assert!(registry.make(&spec).is_ok(), "{} failed", spec.name);
        }
    }

    #[test]
    fn test_unknown_ability() {
        let registry = AbilityRegistry::with_builtins();
        assert!(matches!(
            registry.make(&spec("teleport", &[])),
            Err(ConfigError::UnknownAbility(name)) if name == "teleport"
        ));
        assert!(AbilityRegistry::new().make(&spec("blink", &[])).is_err());
    }

    #[test]
    fn test_missing_param() {
        let registry = AbilityRegistry::with_builtins();
        let result = registry.make(&spec("nitro", &[("color", 0.0), ("inc", 0.1)]));
        assert!(matches!(
            result,
            Err(ConfigError::MissingParam { param: "continual", .. })
        ));
    }

    #[test]
    fn test_out_of_range_params() {
        let registry = AbilityRegistry::with_builtins();
        let bad_color = registry.make(&spec("nitro", &[("color", 3.0), ("continual", 1.0), ("inc", 0.1)]));
        assert!(matches!(bad_color, Err(ConfigError::InvalidParam { param: "color", .. })));

        let bad_frames = registry.make(&spec(
            "burst",
            &[("color", 0.0), ("continual", 1.0), ("frames", 2.5), ("force", 1.0), ("radius", 1.0)],
        ));
        assert!(matches!(bad_frames, Err(ConfigError::InvalidParam { param: "frames", .. })));

        let bad_radius = registry.make(&spec(
            "pull",
            &[("color", 2.0), ("unit", 1.0), ("force", 1.0), ("radius", -4.0)],
        ));
        assert!(matches!(bad_radius, Err(ConfigError::InvalidParam { param: "radius", .. })));
    }

    #[test]
    fn test_custom_maker() {
        fn always_nitro(_: &str, _: &Params) -> Result<Ability, ConfigError> {
            Ok(Ability::Nitro {
                continual: Mana::ZERO,
                inc: 1.0,
            })
        }
        let mut registry = AbilityRegistry::new();
        registry.register("boost", always_nitro);
        assert!(registry.contains("boost"));
        assert_eq!(registry.make(&spec("boost", &[])).unwrap().name(), "nitro");
    }

    #[test]
    fn test_drain_abilities_spawn_multi_drain() {
        let registry = AbilityRegistry::with_builtins();
        let mine = registry
            .make(&spec(
                "mine",
                &[("color", 1.0), ("unit", 300.0), ("damage", 1.0), ("trigger", 20.0), ("blast", 50.0), ("arm", 10.0)],
            ))
            .unwrap();
        match mine.spawn(4) {
            Process::MultiDrain(drain) => {
                assert_eq!(drain.owner, 4);
                assert_eq!(drain.unit, Mana::of(Color::Green, 300.0));
            }
            other => panic!("unexpected process {}", other.name()),
        }
    }

    fn game_with_charge(slot: u32, stored: f32) -> (Game, Gid, Gid) {
        let mut game = Game::new(
            crate::config::GameConfig::default(),
            &AbilityRegistry::with_builtins(),
        )
        .unwrap();
        let owner = game.add_player(Vec2::new(100.0, 100.0));
        let other = game.add_player(Vec2::new(150.0, 100.0));
        if let Some(ent) = game.ent_mut(owner) {
            let unit = Mana::of(Color::Blue, 150.0);
            let mut drain = MultiDrain::new(owner, unit);
            drain.stored = stored;
            ent.processes.insert(slot, Process::MultiDrain(drain));
        }
        (game, owner, other)
    }

    fn stored(game: &Game, gid: Gid, slot: u32) -> f32 {
        game.ent(gid).unwrap().processes[&slot].as_drain().unwrap().stored
    }

    #[test]
    fn test_pull_pulses_when_charged() {
        let (mut game, owner, other) = game_with_charge(8, 1.5);
        think(&mut game);
        assert!(game.ent(other).unwrap().vel.x < 0.0);
        assert!(game.ent(owner).unwrap().vel.length() < 1.0e-6);
        assert!((stored(&game, owner, 8) - 0.5).abs() < 1.0e-5);

        // Not enough left for a second pulse
        let vel = game.ent(other).unwrap().vel;
        think(&mut game);
        assert_eq!(game.ent(other).unwrap().vel, vel);
    }

    #[test]
    fn test_fire_trigger_spawns_explosion_ahead() {
        let (mut game, owner, _) = game_with_charge(7, 1.5);
        trigger(&mut game, owner, 7);
        assert_eq!(game.processes.len(), 1);
        match &game.processes[0] {
            Process::Explosion(e) => {
                assert_eq!(e.source, owner);
                assert!((e.pos - Vec2::new(180.0, 100.0)).length() < 0.001);
            }
            other => panic!("unexpected process {}", other.name()),
        }

        // One charge was spent; what is left cannot pay for another
        trigger(&mut game, owner, 7);
        assert_eq!(game.processes.len(), 1);
        assert!((stored(&game, owner, 7) - 0.5).abs() < 1.0e-5);
    }
}
