//! Output types handed to the renderer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Add, Sub};

/// 2D position/vector on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance_to(self, other: Self) -> f64 {
        (other - self).length()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Position {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Position {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

/// Position and velocity of one node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Kinematics {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

impl Kinematics {
    pub fn at(position: Position) -> Self {
        Self {
            x: position.x,
            y: position.y,
            vx: 0.0,
            vy: 0.0,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    pub fn speed(&self) -> f64 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }
}

/// Maps node names to positions.
pub type Layout = BTreeMap<String, Position>;

/// Why a `run` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Energy stayed under the threshold for the settle window.
    Converged,
    /// The tick budget ran out first.
    TickCap,
}

/// Result of a blocking `run`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalLayout {
    pub positions: Layout,
    /// Total ticks the simulation has advanced, across every call.
    pub ticks: usize,
    /// Energy after the last tick.
    pub energy: f64,
    pub outcome: RunOutcome,
}

impl FinalLayout {
    pub fn converged(&self) -> bool {
        self.outcome == RunOutcome::Converged
    }

    /// Distance between two named nodes, if both are present.
    pub fn distance(&self, a: &str, b: &str) -> Option<f64> {
        let pa = self.positions.get(a)?;
        let pb = self.positions.get(b)?;
        Some(pa.distance_to(*pb))
    }
}
