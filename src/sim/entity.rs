//! Arena entities and their per-tick physics
//!
//! Every entity shares one base (position, velocity, facing, stat sheet,
//! process and ability slots); `EntityKind` carries what differs. Copying an
//! entity is a plain `Clone`, so no kind can be dropped from a snapshot.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ability::Ability;
use super::geom::{Polygon, Segment};
use super::mana::Mana;
use super::process::Process;
use super::stats::{Attributes, Condition, Stats};
use crate::config::{ArenaConfig, PhysicsConfig};
use crate::consts::{FIXED_MASS, SWEEP_BACKOFF};
use crate::render::{Canvas, ENTITY};
use crate::{facing, wrap_angle};

/// Globally unique entity id, assigned in increasing order
pub type Gid = u32;

/// Capture progress gained (or lost) per tick
pub const CAPTURE_RATE: f32 = 1.0 / 180.0;

/// Pending control input for this tick; cleared after integration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Delta {
    pub speed: f32,
    pub angle: f32,
}

/// Immovable capture zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub radius: f32,
    /// Whose capture is in progress
    pub holder: Option<Gid>,
    /// Capture progress in `[0, 1]`
    pub progress: f32,
    /// Set once a holder reaches full progress
    pub controller: Option<Gid>,
}

impl ControlPoint {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            holder: None,
            progress: 0.0,
            controller: None,
        }
    }

    /// Advance capture given the single occupant, if there is exactly one
    pub fn think(&mut self, occupant: Option<Gid>) {
        match occupant {
            Some(gid) if self.holder.is_none() || self.holder == Some(gid) => {
                self.holder = Some(gid);
                self.progress = (self.progress + CAPTURE_RATE).min(1.0);
                if self.progress >= 1.0 && self.controller != Some(gid) {
                    log::info!("control point captured by {gid}");
                    self.controller = Some(gid);
                }
            }
            Some(gid) => {
                // Wear down the current holder before capture can start
                self.progress -= CAPTURE_RATE;
                if self.progress <= 0.0 {
                    self.progress = 0.0;
                    self.holder = Some(gid);
                    self.controller = None;
                }
            }
            None => {
                if self.controller.is_none() {
                    self.progress = (self.progress - CAPTURE_RATE).max(0.0);
                    if self.progress <= 0.0 {
                        self.holder = None;
                    }
                }
            }
        }
    }
}

/// Proximity mine laid by the mine ability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mine {
    pub owner: Gid,
    /// Ticks until armed
    pub arm: u32,
    /// Distance at which a passing entity sets it off
    pub trigger: f32,
    /// Final radius of the resulting explosion
    pub blast: f32,
    /// Explosion damage per tick
    pub damage: f32,
}

impl Mine {
    pub fn armed(&self) -> bool {
        self.arm == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    /// Scripted opponent, driven by the same events as a player
    Creep,
    ControlPoint(ControlPoint),
    Mine(Mine),
}

/// An arena entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub gid: Gid,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Facing, in `[0, 2π)`
    pub angle: f32,
    pub delta: Delta,
    pub stats: Stats,
    /// Live processes by ability slot
    pub processes: BTreeMap<u32, Process>,
    pub abilities: BTreeMap<u32, Ability>,
}

impl Entity {
    pub fn new(gid: Gid, kind: EntityKind, pos: Vec2, attrs: Attributes) -> Self {
        Self {
            gid,
            kind,
            pos,
            vel: Vec2::ZERO,
            angle: 0.0,
            delta: Delta::default(),
            stats: Stats::new(attrs),
            processes: BTreeMap::new(),
            abilities: BTreeMap::new(),
        }
    }

    pub fn alive(&self) -> bool {
        self.stats.alive()
    }

    /// Players and creeps compete for node mana
    pub fn draws_mana(&self) -> bool {
        matches!(self.kind, EntityKind::Player | EntityKind::Creep)
    }

    /// Fixed entities never move and take no repulsion
    pub fn is_fixed(&self) -> bool {
        matches!(self.kind, EntityKind::ControlPoint(_) | EntityKind::Mine(_))
    }

    pub fn mass(&self) -> f32 {
        if self.is_fixed() {
            FIXED_MASS
        } else {
            self.stats.mass()
        }
    }

    pub fn apply_force(&mut self, force: Vec2) {
        if !self.is_fixed() {
            self.vel += force / self.mass();
        }
    }

    /// Route damage through every live process, then onto the stat sheet
    ///
    /// Control points cannot be damaged.
    pub fn apply_damage(&mut self, damage: f32) {
        if matches!(self.kind, EntityKind::ControlPoint(_)) {
            return;
        }
        let mut remaining = damage;
        for process in self.processes.values_mut() {
            remaining = process.modify_damage(remaining);
        }
        self.stats.apply_damage(remaining);
    }

    /// Drop health to zero; the entity is removed at the next compaction
    pub fn destroy(&mut self) {
        self.stats.apply_damage(self.stats.health());
    }

    /// Offer mana to each process in slot order, returning what nobody took
    pub fn supply(&mut self, offer: Mana) -> Mana {
        let mut rest = offer;
        for process in self.processes.values_mut() {
            rest = process.supply(rest);
        }
        rest
    }

    /// Rebuild the modified stat sheet from the live processes and apply
    /// whatever damage they cause
    pub fn reapply_conditions(&mut self) {
        let caused = self
            .stats
            .reapply(self.processes.values().map(|p| p as &dyn Condition));
        if caused > 0.0 {
            self.apply_damage(caused);
        }
    }

    /// Kill the process in `slot`; its standing modifiers are gone on return
    pub fn kill_process(&mut self, slot: u32) -> bool {
        let Some(process) = self.processes.get_mut(&slot) else {
            return false;
        };
        process.kill();
        log::debug!("entity {} killed {} in slot {slot}", self.gid, process.name());
        self.reapply_conditions();
        true
    }

    /// Move one tick: clamp input, hazards, friction, walls, jitter, turn
    pub fn integrate(&mut self, arena: &ArenaConfig, physics: &PhysicsConfig, rng: &mut Pcg32) {
        let max_acc = self.stats.max_acc();
        let max_turn = self.stats.max_turn();
        self.delta.speed = self.delta.speed.clamp(-max_acc, max_acc);
        self.delta.angle = self.delta.angle.clamp(-max_turn, max_turn);

        for hazard in &arena.hazards {
            if hazard.poly.contains(self.pos) {
                self.apply_damage(hazard.damage);
            }
        }

        let dir = facing(self.angle);
        self.vel += dir * self.delta.speed;
        let slip = match self.vel.try_normalize() {
            Some(v) => dir.perp_dot(v).abs(),
            None => 0.0,
        };
        self.vel *= physics.friction.powf(1.0 + 3.0 * slip);

        self.sweep(&arena.walls, physics.collision_epsilon);

        let j = physics.jitter;
        let jitter_x = (rng.random::<f32>() - 0.5) * 2.0 * j;
        let jitter_y = (rng.random::<f32>() - 0.5) * 2.0 * j;
        self.vel += Vec2::new(jitter_x, jitter_y);

        self.angle = wrap_angle(self.angle + self.delta.angle);
        self.delta = Delta::default();
    }

    /// Move along `vel`, stopping `epsilon` short of any wall
    fn sweep(&mut self, walls: &[Polygon], epsilon: f32) {
        let radius = self.stats.size();
        let mut target = self.pos + self.vel;
        let back = self.vel.normalize_or_zero() * SWEEP_BACKOFF;

        for wall in walls {
            for i in 0..wall.verts.len() {
                if !wall.is_front_facing(i, self.pos) {
                    continue;
                }
                let n = wall.outward_normal(i);
                if n.dot(target - self.pos) >= 0.0 {
                    continue;
                }
                let edge = wall.edge(i);
                let blocker = edge.translated(n * radius);
                let path = Segment::new(self.pos - back, target);
                if let Some(hit) = path.intersect(&blocker) {
                    let along = edge.dir().normalize_or_zero();
                    let slide = along * along.dot(target - hit);
                    target = hit + n * epsilon + slide;
                }
            }

            for &vert in &wall.verts {
                let d = target - vert;
                let dist = d.length();
                if dist < radius + epsilon {
                    let out = if dist > 1.0e-6 {
                        d / dist
                    } else {
                        -self.vel.normalize_or_zero()
                    };
                    target = vert + out * (radius + epsilon);
                }
            }
        }

        self.vel = target - self.pos;
        self.pos = target;
    }

    pub fn draw(&self, canvas: &mut dyn Canvas) {
        match &self.kind {
            EntityKind::ControlPoint(cp) => canvas.circle(self.pos, cp.radius, ENTITY),
            _ => {
                canvas.circle(self.pos, self.stats.size(), ENTITY);
                canvas.line(self.pos, self.pos + facing(self.angle) * self.stats.size(), ENTITY);
            }
        }
    }
}
