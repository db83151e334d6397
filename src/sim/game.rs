//! Root game state and the per-tick orchestrator
//!
//! `Game::think` is the single entry point that advances the world. Its step
//! order is fixed and no step sees results from a later one:
//! 1. Tick counter
//! 2. Ability upkeep
//! 3. Each living entity: processes, conditions, kind logic, movement
//! 4. World-level processes
//! 5. Compaction to living entities
//! 6. Pairwise repulsion
//! 7. Mana distribution
//! 8. Node regeneration

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ability::{self, Ability, AbilityRegistry, MINE_BLAST_FRAMES};
use super::entity::{ControlPoint, Entity, EntityKind, Gid};
use super::geom::Segment;
use super::mana_source::ManaSource;
use super::process::{Explosion, Process};
use super::stats::Attributes;
use crate::config::GameConfig;
use crate::consts::{ENTITY_RADIUS, FIXED_MASS};
use crate::error::ConfigError;
use crate::render::{Canvas, HAZARD, WALL, mana_rgba};

/// Body radius of a laid mine
pub const MINE_SIZE: f32 = 6.0;

/// Complete simulation state (deterministic, serializable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub config: GameConfig,
    pub mana_source: ManaSource,
    /// Shared simulation RNG; part of the state so replays match
    pub rng: Pcg32,
    /// Live entities, sorted by gid
    pub ents: Vec<Entity>,
    /// Processes not bound to any entity
    pub processes: Vec<Process>,
    /// Ticks simulated so far
    pub tick: u64,
    pub(crate) next_id: Gid,
    /// Abilities handed to every new player or creep
    pub(crate) loadout: Vec<(u32, Ability)>,
}

impl Game {
    /// Validate the config, resolve the loadout and generate the node grid
    pub fn new(config: GameConfig, registry: &AbilityRegistry) -> Result<Self, ConfigError> {
        config.validate()?;
        let loadout = config
            .loadout
            .iter()
            .map(|spec| Ok((spec.slot, registry.make(spec)?)))
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let mut rng = Pcg32::seed_from_u64(config.seed);
        let mana_source =
            ManaSource::generate(&config.nodes, config.arena.width, config.arena.height, &mut rng);
        log::info!(
            "Arena {}x{}: {} walls, {} hazards, {}x{} nodes, seed {}",
            config.arena.width,
            config.arena.height,
            config.arena.walls.len(),
            config.arena.hazards.len(),
            mana_source.rows,
            mana_source.cols,
            config.seed
        );

        Ok(Self {
            config,
            mana_source,
            rng,
            ents: Vec::new(),
            processes: Vec::new(),
            tick: 0,
            next_id: 1,
            loadout,
        })
    }

    /// Highest gid handed out so far plus one
    pub fn next_id(&self) -> Gid {
        self.next_id
    }

    /// Add an entity with the next gid
    pub fn add_ent(&mut self, kind: EntityKind, pos: Vec2) -> Gid {
        let gid = self.next_id;
        self.next_id += 1;

        let attrs = match &kind {
            EntityKind::Player | EntityKind::Creep => self.config.player,
            EntityKind::ControlPoint(_) => fixed_attrs(ENTITY_RADIUS),
            EntityKind::Mine(_) => fixed_attrs(MINE_SIZE),
        };
        let mut ent = Entity::new(gid, kind, pos, attrs);
        if ent.draws_mana() {
            ent.abilities = self.loadout.iter().cloned().collect();
        }
        log::debug!("added entity {gid} at {pos}");
        // Gids only increase, so pushing keeps the list sorted
        self.ents.push(ent);
        gid
    }

    pub fn add_player(&mut self, pos: Vec2) -> Gid {
        let gid = self.add_ent(EntityKind::Player, pos);
        log::info!("player {gid} joined at {pos}");
        gid
    }

    pub fn add_creep(&mut self, pos: Vec2) -> Gid {
        self.add_ent(EntityKind::Creep, pos)
    }

    pub fn add_control_point(&mut self, pos: Vec2, radius: f32) -> Gid {
        self.add_ent(EntityKind::ControlPoint(ControlPoint::new(radius)), pos)
    }

    fn index_of(&self, gid: Gid) -> Option<usize> {
        self.ents.binary_search_by_key(&gid, |e| e.gid).ok()
    }

    pub fn ent(&self, gid: Gid) -> Option<&Entity> {
        self.index_of(gid).map(|i| &self.ents[i])
    }

    pub fn ent_mut(&mut self, gid: Gid) -> Option<&mut Entity> {
        self.index_of(gid).map(|i| &mut self.ents[i])
    }

    pub fn apply_force(&mut self, gid: Gid, force: Vec2) {
        if let Some(ent) = self.ent_mut(gid) {
            ent.apply_force(force);
        }
    }

    pub fn apply_damage(&mut self, gid: Gid, damage: f32) {
        if let Some(ent) = self.ent_mut(gid) {
            ent.apply_damage(damage);
        }
    }

    /// True if a body of radius `size` fits at `pos`
    pub fn is_open(&self, pos: Vec2, size: f32) -> bool {
        let arena = &self.config.arena;
        if pos.x < size || pos.y < size || pos.x > arena.width - size || pos.y > arena.height - size {
            return false;
        }
        arena
            .walls
            .iter()
            .all(|wall| !wall.contains(pos) && wall.edges().all(|e| e.distance_to_point(pos) >= size))
    }

    /// End point of a ray of length `range`, stopped at the first wall
    pub fn cast_ray(&self, start: Vec2, dir: Vec2, range: f32) -> Vec2 {
        let ray = Segment::new(start, start + dir.normalize_or_zero() * range);
        self.config
            .arena
            .walls
            .iter()
            .flat_map(|wall| wall.edges())
            .filter_map(|edge| ray.intersect(&edge))
            .min_by(|a, b| a.distance_squared(start).total_cmp(&b.distance_squared(start)))
            .unwrap_or(ray.q)
    }

    /// Advance the simulation by one tick
    pub fn think(&mut self) {
        self.tick += 1;

        ability::think(self);

        // Entities are only appended during a tick, so indices stay valid
        let mut i = 0;
        while i < self.ents.len() {
            if self.ents[i].alive() {
                self.think_ent(i);
            }
            i += 1;
        }

        let mut world = std::mem::take(&mut self.processes);
        for process in &mut world {
            process.think(self);
        }
        world.retain(|p| !p.complete());
        world.append(&mut self.processes);
        self.processes = world;

        let before = self.ents.len();
        self.ents.retain(Entity::alive);
        if self.ents.len() < before {
            log::debug!("tick {}: removed {} dead entities", self.tick, before - self.ents.len());
        }

        self.repel();
        self.distribute_mana();
        self.mana_source.think();
    }

    fn think_ent(&mut self, i: usize) {
        // Processes think against the whole game, so lift them out first
        let mut processes = std::mem::take(&mut self.ents[i].processes);
        for process in processes.values_mut() {
            process.think(self);
        }
        processes.retain(|_, p| !p.complete());

        let ent = &mut self.ents[i];
        processes.append(&mut ent.processes);
        ent.processes = processes;
        ent.reapply_conditions();

        self.think_kind(i);

        let Game {
            ents, config, rng, ..
        } = self;
        let ent = &mut ents[i];
        if ent.is_fixed() || !ent.alive() {
            return;
        }
        ent.integrate(&config.arena, &config.physics, rng);
        let r = ent.stats.size();
        ent.pos = ent
            .pos
            .max(Vec2::splat(r))
            .min(Vec2::new(config.arena.width - r, config.arena.height - r));
    }

    fn think_kind(&mut self, i: usize) {
        let (gid, pos) = (self.ents[i].gid, self.ents[i].pos);
        match self.ents[i].kind.clone() {
            EntityKind::ControlPoint(mut cp) => {
                let mut inside = self
                    .ents
                    .iter()
                    .filter(|e| e.alive() && e.draws_mana())
                    .filter(|e| e.pos.distance(pos) < cp.radius + e.stats.size())
                    .map(|e| e.gid);
                let occupant = match (inside.next(), inside.next()) {
                    (Some(only), None) => Some(only),
                    _ => None,
                };
                cp.think(occupant);
                self.ents[i].kind = EntityKind::ControlPoint(cp);
            }
            EntityKind::Mine(mut mine) => {
                if !mine.armed() {
                    mine.arm -= 1;
                    self.ents[i].kind = EntityKind::Mine(mine);
                    return;
                }
                let tripped = self.ents.iter().any(|e| {
                    e.gid != gid
                        && e.gid != mine.owner
                        && e.alive()
                        && !e.is_fixed()
                        && e.pos.distance(pos) < mine.trigger + e.stats.size()
                });
                if tripped {
                    log::debug!("mine {gid} tripped at tick {}", self.tick);
                    self.processes.push(Process::Explosion(Explosion::new(
                        gid,
                        pos,
                        mine.blast,
                        mine.damage,
                        MINE_BLAST_FRAMES,
                    )));
                    self.ents[i].destroy();
                }
            }
            EntityKind::Player | EntityKind::Creep => {}
        }
    }

    /// Push apart every pair of movable entities closer than the repulsion radius
    fn repel(&mut self) {
        let radius = self.config.physics.repulsion_radius;
        let strength = self.config.physics.repulsion_force;
        let n = self.ents.len();
        let mut forces = vec![Vec2::ZERO; n];

        for i in 0..n {
            if self.ents[i].is_fixed() {
                continue;
            }
            for j in (i + 1)..n {
                if self.ents[j].is_fixed() {
                    continue;
                }
                let d = self.ents[j].pos - self.ents[i].pos;
                let dist = d.length();
                if dist >= radius || dist < 1.0e-6 {
                    continue;
                }
                let push = d / dist * (strength / dist);
                forces[i] -= push;
                forces[j] += push;
            }
        }

        for (ent, force) in self.ents.iter_mut().zip(forces) {
            ent.apply_force(force);
        }
    }

    /// Offer node mana to every drawing entity and debit what they used
    fn distribute_mana(&mut self) {
        let drawers: Vec<usize> = self
            .ents
            .iter()
            .enumerate()
            .filter(|(_, e)| e.alive() && e.draws_mana())
            .map(|(i, _)| i)
            .collect();
        let positions: Vec<Vec2> = drawers.iter().map(|&i| self.ents[i].pos).collect();

        let Game {
            ents,
            mana_source,
            rng,
            ..
        } = self;
        mana_source.distribute(&positions, rng, |k, offer| ents[drawers[k]].supply(offer));
    }

    /// Hand the whole state to a renderer; never mutates anything
    pub fn draw(&self, canvas: &mut dyn Canvas) {
        for node in &self.mana_source.nodes {
            let fill = if node.capacity > 0.0 {
                node.amt / node.capacity
            } else {
                0.0
            };
            canvas.circle(node.pos, 4.0, mana_rgba(node.color, fill));
        }
        for wall in &self.config.arena.walls {
            canvas.polygon(&wall.verts, WALL);
        }
        for hazard in &self.config.arena.hazards {
            canvas.polygon(&hazard.poly.verts, HAZARD);
        }
        for ent in &self.ents {
            ent.draw(canvas);
            for process in ent.processes.values() {
                process.draw(self, canvas);
            }
        }
        for process in &self.processes {
            process.draw(self, canvas);
        }
    }
}

fn fixed_attrs(size: f32) -> Attributes {
    Attributes {
        max_health: 1.0,
        mass: FIXED_MASS,
        max_acc: 0.0,
        max_turn: 0.0,
        size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ArenaConfig, NodeGridConfig};
    use crate::render::Rgba;
    use crate::sim::geom::Polygon;
    use crate::sim::mana::{Color, Mana};
    use crate::sim::process::{MultiDrain, Nitro};

    fn test_game() -> Game {
        let config = GameConfig {
            arena: ArenaConfig {
                width: 500.0,
                height: 500.0,
                walls: vec![Polygon::rect(Vec2::new(300.0, 0.0), Vec2::new(320.0, 500.0))],
                hazards: Vec::new(),
            },
            nodes: NodeGridConfig {
                rows: 5,
                cols: 5,
                ..NodeGridConfig::default()
            },
            ..GameConfig::default()
        };
        Game::new(config, &AbilityRegistry::with_builtins()).unwrap()
    }

    #[test]
    fn test_new_rejects_unknown_ability() {
        let mut config = GameConfig::default();
        config.loadout.push(crate::config::AbilitySpec::new(9, "warp", &[]));
        assert!(matches!(
            Game::new(config, &AbilityRegistry::with_builtins()),
            Err(ConfigError::UnknownAbility(_))
        ));
    }

    #[test]
    fn test_gids_increase_and_lookup() {
        let mut game = test_game();
        let a = game.add_player(Vec2::new(50.0, 50.0));
        let b = game.add_creep(Vec2::new(100.0, 50.0));
        let c = game.add_control_point(Vec2::new(200.0, 200.0), 40.0);
        assert!(a < b && b < c);
        assert_eq!(game.next_id(), c + 1);
        assert_eq!(game.ent(b).map(|e| e.gid), Some(b));
        assert!(game.ent(999).is_none());
        assert_eq!(game.ent(a).map(|e| e.abilities.len()), Some(9));
        assert_eq!(game.ent(c).map(|e| e.abilities.len()), Some(0));
    }

    #[test]
    fn test_dead_entities_compacted() {
        let mut game = test_game();
        let a = game.add_player(Vec2::new(50.0, 50.0));
        let b = game.add_player(Vec2::new(150.0, 150.0));
        if let Some(ent) = game.ent_mut(a) {
            ent.destroy();
        }
        game.think();
        assert!(game.ent(a).is_none());
        assert!(game.ent(b).is_some());
        assert_eq!(game.tick, 1);
    }

    #[test]
    fn test_positions_clamped_to_arena() {
        let mut game = test_game();
        let a = game.add_player(Vec2::new(5.0, 5.0));
        game.think();
        let ent = game.ent(a).unwrap();
        assert!(ent.pos.x >= ent.stats.size() - 0.0001);
        assert!(ent.pos.y >= ent.stats.size() - 0.0001);
    }

    #[test]
    fn test_repulsion_pushes_apart() {
        let mut game = test_game();
        let a = game.add_player(Vec2::new(100.0, 100.0));
        let b = game.add_player(Vec2::new(110.0, 100.0));
        game.think();
        assert!(game.ent(a).unwrap().vel.x < 0.0);
        assert!(game.ent(b).unwrap().vel.x > 0.0);
    }

    #[test]
    fn test_cast_ray_stops_at_wall() {
        let game = test_game();
        let end = game.cast_ray(Vec2::new(100.0, 250.0), Vec2::X, 1000.0);
        assert!((end.x - 300.0).abs() < 0.001);
        let free = game.cast_ray(Vec2::new(100.0, 250.0), Vec2::NEG_X, 50.0);
        assert!((free.x - 50.0).abs() < 0.001);
    }

    #[test]
    fn test_is_open() {
        let game = test_game();
        assert!(game.is_open(Vec2::new(100.0, 100.0), 15.0));
        assert!(!game.is_open(Vec2::new(310.0, 100.0), 15.0));
        assert!(!game.is_open(Vec2::new(290.0, 100.0), 15.0));
        assert!(!game.is_open(Vec2::new(5.0, 100.0), 15.0));
    }

    #[test]
    fn test_starved_process_removed_next_tick() {
        let mut game = test_game();
        let a = game.add_player(Vec2::new(100.0, 100.0));
        if let Some(ent) = game.ent_mut(a) {
            let nitro = Nitro::new(a, Mana::of(Color::Red, 1.0e6), 0.5);
            ent.processes.insert(0, Process::Nitro(nitro));
        }
        game.think();
        assert!(game.ent(a).unwrap().processes[&0].complete());
        game.think();
        assert!(game.ent(a).unwrap().processes.is_empty());
    }

    #[test]
    fn test_mine_trips_and_explodes() {
        let mut game = test_game();
        let owner = game.add_player(Vec2::new(50.0, 400.0));
        let victim = game.add_player(Vec2::new(200.0, 200.0));
        let mine = game.add_ent(
            EntityKind::Mine(crate::sim::entity::Mine {
                owner,
                arm: 0,
                trigger: 30.0,
                blast: 60.0,
                damage: 5.0,
            }),
            Vec2::new(200.0, 210.0),
        );
        let before = game.ent(victim).unwrap().stats.health();
        game.think();
        assert!(game.ent(mine).is_none());
        assert!(game.ent(victim).unwrap().stats.health() < before);
    }

    #[test]
    fn test_drain_debits_claimed_node() {
        let mut game = test_game();
        let node = game.mana_source.nodes[6].clone();
        let a = game.add_player(node.pos);
        if let Some(ent) = game.ent_mut(a) {
            let drain = MultiDrain::new(a, Mana::of(node.color, 100.0));
            ent.processes.insert(6, Process::MultiDrain(drain));
        }
        game.think();

        let drain = game.ent(a).unwrap().processes[&6].as_drain().unwrap();
        assert!(drain.stored > 0.19);
        assert!(game.mana_source.nodes[6].amt < node.amt);
    }

    #[derive(Default)]
    struct Counter {
        circles: usize,
        polygons: usize,
    }

    impl Canvas for Counter {
        fn circle(&mut self, _center: Vec2, _radius: f32, _color: Rgba) {
            self.circles += 1;
        }

        fn polygon(&mut self, _verts: &[Vec2], _color: Rgba) {
            self.polygons += 1;
        }
    }

    #[test]
    fn test_draw_visits_everything() {
        let mut game = test_game();
        game.add_player(Vec2::new(100.0, 100.0));
        let mut canvas = Counter::default();
        let before = game.clone();
        game.draw(&mut canvas);
        assert_eq!(canvas.circles, 25 + 1);
        assert_eq!(canvas.polygons, 1);
        assert_eq!(game, before);
    }
}
