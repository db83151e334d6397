//! Multi-colored mana quantities
//!
//! Mana is a fixed-arity vector, one non-negative amount per color. Every
//! operation that removes mana clamps at zero.

use std::ops::{Add, AddAssign, Index, IndexMut, Mul};

use serde::{Deserialize, Serialize};

/// Number of mana colors
pub const NUM_COLORS: usize = 3;

/// A mana color
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Color {
    Red,
    Green,
    Blue,
}

impl Color {
    pub const ALL: [Color; NUM_COLORS] = [Color::Red, Color::Green, Color::Blue];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }
}

/// An amount of mana per color
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Mana(pub [f32; NUM_COLORS]);

impl Mana {
    pub const ZERO: Mana = Mana([0.0; NUM_COLORS]);

    pub fn new(red: f32, green: f32, blue: f32) -> Self {
        Mana([red.max(0.0), green.max(0.0), blue.max(0.0)])
    }

    /// Mana of a single color
    pub fn of(color: Color, amount: f32) -> Self {
        let mut m = Mana::ZERO;
        m[color] = amount.max(0.0);
        m
    }

    /// Sum of all components
    pub fn magnitude(&self) -> f32 {
        self.0.iter().sum()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&c| c <= 0.0)
    }

    /// True if every component is at least the matching component of `need`
    pub fn covers(&self, need: &Mana) -> bool {
        self.0.iter().zip(need.0.iter()).all(|(have, want)| have >= want)
    }

    /// Like `covers`, allowing each component to fall short by `tolerance`
    pub fn covers_within(&self, need: &Mana, tolerance: f32) -> bool {
        self.0.iter().zip(need.0.iter()).all(|(have, want)| *have >= *want - tolerance)
    }

    /// Component-wise subtraction, clamped at zero
    pub fn saturating_sub(&self, other: &Mana) -> Mana {
        let mut out = *self;
        for (c, o) in out.0.iter_mut().zip(other.0.iter()) {
            *c = (*c - o).max(0.0);
        }
        out
    }

    /// Component-wise minimum
    pub fn min(&self, other: &Mana) -> Mana {
        let mut out = *self;
        for (c, o) in out.0.iter_mut().zip(other.0.iter()) {
            *c = c.min(*o);
        }
        out
    }

    /// Copy with every negative component raised to zero
    pub fn non_negative(&self) -> Mana {
        Mana(self.0.map(|c| c.max(0.0)))
    }

    /// Take up to `want` out of `self`, returning what was taken
    pub fn take(&mut self, want: &Mana) -> Mana {
        let taken = self.min(want);
        *self = self.saturating_sub(&taken);
        taken
    }

    pub fn iter(&self) -> impl Iterator<Item = (Color, f32)> + '_ {
        Color::ALL.iter().map(move |&c| (c, self[c]))
    }
}

impl Index<Color> for Mana {
    type Output = f32;

    fn index(&self, color: Color) -> &f32 {
        &self.0[color.index()]
    }
}

impl IndexMut<Color> for Mana {
    fn index_mut(&mut self, color: Color) -> &mut f32 {
        &mut self.0[color.index()]
    }
}

impl Add for Mana {
    type Output = Mana;

    fn add(mut self, rhs: Mana) -> Mana {
        self += rhs;
        self
    }
}

impl AddAssign for Mana {
    fn add_assign(&mut self, rhs: Mana) {
        for (c, o) in self.0.iter_mut().zip(rhs.0.iter()) {
            *c += o;
        }
    }
}

impl Mul<f32> for Mana {
    type Output = Mana;

    fn mul(self, k: f32) -> Mana {
        let k = k.max(0.0);
        Mana(self.0.map(|c| c * k))
    }
}
