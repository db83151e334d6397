use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{Behavior, Phase, paid_up, pay};
use crate::render::{Canvas, mana_rgba};
use crate::sim::entity::Gid;
use crate::sim::game::Game;
use crate::sim::mana::{Color, Mana};
use crate::sim::stats::Condition;

/// Click-to-target area damage
///
/// Starts in `Phase::Ui` ignoring mana until a target is locked in, then
/// charges its cost and burns everything around the target for `frames`
/// ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Moonfire {
    pub owner: Gid,
    pub phase: Phase,
    pub target: Option<Vec2>,
    pub cost: Mana,
    pub paid: Mana,
    pub radius: f32,
    /// Damage per tick
    pub damage: f32,
    pub frames: u32,
}

impl Moonfire {
    pub fn new(owner: Gid, cost: Mana, radius: f32, damage: f32, frames: u32) -> Self {
        Self {
            owner,
            phase: Phase::Ui,
            target: None,
            cost,
            paid: Mana::ZERO,
            radius,
            damage,
            frames,
        }
    }

    /// Leave the UI phase; ignored in any other phase
    pub fn set_target(&mut self, pos: Vec2) -> bool {
        if self.phase != Phase::Ui {
            return false;
        }
        self.target = Some(pos);
        self.phase = Phase::Running;
        true
    }
}

impl Condition for Moonfire {
    fn terminated(&self) -> bool {
        self.phase == Phase::Complete
    }
}

impl Behavior for Moonfire {
    fn request(&self) -> Mana {
        match self.phase {
            Phase::Running => self.cost.saturating_sub(&self.paid),
            _ => Mana::ZERO,
        }
    }

    fn supply(&mut self, mut offer: Mana) -> Mana {
        if self.phase == Phase::Running {
            pay(&mut self.paid, &self.cost, &mut offer);
        }
        offer
    }

    fn think(&mut self, game: &mut Game) {
        if self.phase != Phase::Running || !paid_up(&self.paid, &self.cost) {
            return;
        }
        let Some(target) = self.target else {
            self.phase = Phase::Complete;
            return;
        };

        let hits: Vec<Gid> = game
            .ents
            .iter()
            .filter(|e| e.gid != self.owner && e.alive())
            .filter(|e| e.pos.distance(target) < self.radius + e.stats.size())
            .map(|e| e.gid)
            .collect();
        for gid in hits {
            game.apply_damage(gid, self.damage);
        }

        self.frames = self.frames.saturating_sub(1);
        if self.frames == 0 {
            self.phase = Phase::Complete;
        }
    }

    fn kill(&mut self) {
        self.phase = Phase::Complete;
    }

    fn phase(&self) -> Phase {
        self.phase
    }

    fn draw(&self, _game: &Game, canvas: &mut dyn Canvas) {
        if let Some(target) = self.target {
            let total = self.cost.magnitude();
            let fill = if total > 0.0 {
                self.paid.magnitude() / total
            } else {
                1.0
            };
            canvas.circle(target, self.radius, mana_rgba(Color::Blue, fill));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ui_phase_ignores_mana() {
        let mut moonfire = Moonfire::new(1, Mana::of(Color::Blue, 100.0), 50.0, 1.0, 10);
        let offer = Mana::of(Color::Blue, 500.0);
        assert_eq!(moonfire.supply(offer), offer);
        assert_eq!(moonfire.phase(), Phase::Ui);
        assert_eq!(moonfire.request(), Mana::ZERO);
    }

    #[test]
    fn test_target_moves_to_running_once() {
        let mut moonfire = Moonfire::new(1, Mana::of(Color::Blue, 100.0), 50.0, 1.0, 10);
        assert!(moonfire.set_target(Vec2::new(10.0, 10.0)));
        assert_eq!(moonfire.phase(), Phase::Running);
        assert!(!moonfire.set_target(Vec2::new(99.0, 99.0)));
        assert_eq!(moonfire.target, Some(Vec2::new(10.0, 10.0)));

        let rest = moonfire.supply(Mana::of(Color::Blue, 60.0));
        assert!(rest.is_zero());
        assert!((moonfire.paid[Color::Blue] - 60.0).abs() < 0.001);
    }

    #[test]
    fn test_kill_from_ui_is_terminal() {
        let mut moonfire = Moonfire::new(1, Mana::of(Color::Blue, 100.0), 50.0, 1.0, 10);
        moonfire.kill();
        assert_eq!(moonfire.phase(), Phase::Complete);
        assert!(!moonfire.set_target(Vec2::ZERO));
        assert_eq!(moonfire.phase(), Phase::Complete);
    }
}
