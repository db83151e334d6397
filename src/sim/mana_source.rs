//! Regenerating mana node grid and competitive drain
//!
//! Each tick every node is claimed by at most one entity: the drawer with
//! the highest rate at that node. Claimed nodes are offered to their holder,
//! and only what the holder's processes actually consume is debited.

use glam::Vec2;
use rand::Rng;
use rand::seq::SliceRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::mana::{Color, Mana, NUM_COLORS};
use crate::config::NodeGridConfig;

/// A single mana-producing grid cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub pos: Vec2,
    pub color: Color,
    /// Current amount, always within `0..=capacity`
    pub amt: f32,
    pub capacity: f32,
    /// Amount regenerated per tick
    pub regen: f32,
}

impl Node {
    /// Regenerate one tick's worth
    pub fn think(&mut self) {
        self.amt = (self.amt + self.regen).min(self.capacity);
    }
}

/// The node grid covering the arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManaSource {
    pub rows: usize,
    pub cols: usize,
    /// Row-major
    pub nodes: Vec<Node>,
    pub drain_range: f32,
    pub max_drain: f32,
}

impl ManaSource {
    /// Lay out a `rows x cols` grid over the arena with random colors and capacities
    pub fn generate(cfg: &NodeGridConfig, width: f32, height: f32, rng: &mut Pcg32) -> Self {
        let cell = Vec2::new(width / cfg.cols as f32, height / cfg.rows as f32);
        let mut nodes = Vec::with_capacity(cfg.rows * cfg.cols);
        for row in 0..cfg.rows {
            for col in 0..cfg.cols {
                let color = Color::from_index(rng.random_range(0..NUM_COLORS)).unwrap_or(Color::Red);
                let capacity = if cfg.max_capacity > cfg.min_capacity {
                    rng.random_range(cfg.min_capacity..cfg.max_capacity)
                } else {
                    cfg.min_capacity
                };
                nodes.push(Node {
                    pos: Vec2::new((col as f32 + 0.5) * cell.x, (row as f32 + 0.5) * cell.y),
                    color,
                    amt: capacity,
                    capacity,
                    regen: capacity * cfg.regen_fraction,
                });
            }
        }

        Self {
            rows: cfg.rows,
            cols: cfg.cols,
            nodes,
            drain_range: cfg.drain_range,
            max_drain: cfg.max_drain,
        }
    }

    /// Drain strength at `dist`; 1 on top of a node, 0 at or beyond range
    pub fn rate(&self, dist: f32) -> f32 {
        if dist >= self.drain_range {
            return 0.0;
        }
        let f = 1.0 - dist / self.drain_range;
        f * f
    }

    /// What node `index` can give a drawer standing at `pos` this tick
    pub fn offer(&self, index: usize, pos: Vec2) -> Mana {
        let node = &self.nodes[index];
        let rate = self.rate(node.pos.distance(pos));
        Mana::of(node.color, node.amt.min(self.max_drain * rate))
    }

    /// For each node, the index into `drawers` of the sole rights-holder
    ///
    /// The drawer with the highest rate wins. Drawers are visited in order
    /// with a strict comparison, so ties go to the earliest one.
    pub fn priorities(&self, drawers: &[Vec2]) -> Vec<Option<usize>> {
        self.nodes
            .iter()
            .map(|node| {
                let mut best: Option<(usize, f32)> = None;
                for (i, pos) in drawers.iter().enumerate() {
                    let rate = self.rate(node.pos.distance(*pos));
                    if rate <= 0.0 {
                        continue;
                    }
                    if best.is_none_or(|(_, r)| rate > r) {
                        best = Some((i, rate));
                    }
                }
                best.map(|(i, _)| i)
            })
            .collect()
    }

    /// Run the offer/settle protocol for one tick
    ///
    /// `supply(i, offer)` hands drawer `i` everything its claimed nodes can
    /// give and returns what went unused. Every drawer is offered, even with
    /// nothing claimed. Returns the amount debited per drawer.
    pub fn distribute<F>(&mut self, drawers: &[Vec2], rng: &mut Pcg32, mut supply: F) -> Vec<Mana>
    where
        F: FnMut(usize, Mana) -> Mana,
    {
        let mut claims: Vec<Vec<usize>> = vec![Vec::new(); drawers.len()];
        for (node, holder) in self.priorities(drawers).into_iter().enumerate() {
            if let Some(i) = holder {
                claims[i].push(node);
            }
        }

        let mut order: Vec<usize> = (0..drawers.len()).collect();
        order.shuffle(rng);

        let mut debited = vec![Mana::ZERO; drawers.len()];
        for i in order {
            let claimed = &mut claims[i];
            claimed.shuffle(rng);

            let offers: Vec<Mana> = claimed.iter().map(|&n| self.offer(n, drawers[i])).collect();
            let mut candidate = Mana::ZERO;
            for offer in &offers {
                candidate += *offer;
            }

            let rest = supply(i, candidate);
            let mut used = candidate.saturating_sub(&rest);

            // Settle in the same order the offer was built
            for (&n, offer) in claimed.iter().zip(offers.iter()) {
                let debit = used.take(offer);
                let node = &mut self.nodes[n];
                node.amt = (node.amt - debit[node.color]).max(0.0);
                debited[i] += debit;
            }
        }
        debited
    }

    /// Regenerate every node
    pub fn think(&mut self) {
        for node in &mut self.nodes {
            node.think();
        }
    }

    /// Total mana currently held by all nodes
    pub fn total(&self) -> Mana {
        let mut total = Mana::ZERO;
        for node in &self.nodes {
            total[node.color] += node.amt;
        }
        total
    }
}
