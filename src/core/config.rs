//! Simulation tuning — defaults, RON loading, and validation.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::schema::relationship::RelationshipKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid simulation config: {0}")]
    Invalid(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Canvas size. The centering force pulls toward its midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

/// How nodes are seeded before the first tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Placement {
    /// Uniformly inside `bounds`, drawn from the seeded RNG.
    #[default]
    Random,
    /// Golden-angle spiral around the canvas center. Ignores the seed.
    Phyllotaxis,
}

/// Cooling rate that takes alpha from 1.0 to 0.001 in 300 ticks.
pub const DEFAULT_ALPHA_DECAY: f64 = 0.022_762_779_044_189_33;

/// Tuning for the force simulation. Every field is optional in RON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub bounds: Bounds,
    /// Separation the link force pulls connected nodes toward.
    pub link_distance: f64,
    /// Spring stiffness along edges.
    pub link_strength: f64,
    /// Multiplier on `link_strength` per relationship kind tag. Kinds not
    /// listed use 1.0. A negative multiplier turns the spring around.
    pub kind_strengths: FxHashMap<String, f64>,
    /// Many-body charge. Negative values repel.
    pub repulsion_strength: f64,
    /// Fraction of the centroid's offset from the canvas center removed
    /// each tick.
    pub center_strength: f64,
    /// Fraction of velocity kept from one tick to the next.
    pub velocity_decay: f64,
    /// Floor on the distance used in force magnitudes.
    pub min_distance: f64,
    pub alpha_decay: f64,
    pub alpha_target: f64,
    /// Consecutive ticks energy must stay under the threshold before
    /// `run` reports convergence.
    pub settle_ticks: usize,
    pub placement: Placement,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            bounds: Bounds::default(),
            link_distance: 50.0,
            link_strength: 0.1,
            kind_strengths: FxHashMap::default(),
            // Keeps a lone spring within 4% of link_distance at link_strength 0.1.
            repulsion_strength: -10.0,
            center_strength: 1.0,
            velocity_decay: 0.9,
            min_distance: 1.0,
            alpha_decay: DEFAULT_ALPHA_DECAY,
            alpha_target: 0.0,
            settle_ticks: 5,
            placement: Placement::Random,
            seed: 42,
        }
    }
}

impl SimulationConfig {
    /// Load a config from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<SimulationConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a config from a RON string and validate it.
    pub fn parse_ron(input: &str) -> Result<SimulationConfig, ConfigError> {
        let config: SimulationConfig = ron::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Link strength for an edge of the given kind.
    pub fn strength_for(&self, kind: &RelationshipKind) -> f64 {
        let multiplier = self.kind_strengths.get(kind.tag()).copied().unwrap_or(1.0);
        self.link_strength * multiplier
    }

    /// Reject values that would let a non-finite number reach a position.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("bounds.width", self.bounds.width),
            ("bounds.height", self.bounds.height),
            ("link_distance", self.link_distance),
            ("link_strength", self.link_strength),
            ("repulsion_strength", self.repulsion_strength),
            ("center_strength", self.center_strength),
            ("velocity_decay", self.velocity_decay),
            ("min_distance", self.min_distance),
            ("alpha_decay", self.alpha_decay),
            ("alpha_target", self.alpha_target),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!("{name} must be finite")));
            }
        }
        for (kind, value) in &self.kind_strengths {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "kind_strengths[{kind}] must be finite"
                )));
            }
        }

        if self.bounds.width <= 0.0 || self.bounds.height <= 0.0 {
            return Err(ConfigError::Invalid("bounds must be positive".to_string()));
        }
        if self.link_distance < 0.0 {
            return Err(ConfigError::Invalid(
                "link_distance must not be negative".to_string(),
            ));
        }
        if !(self.velocity_decay > 0.0 && self.velocity_decay < 1.0) {
            return Err(ConfigError::Invalid(
                "velocity_decay must be in (0, 1)".to_string(),
            ));
        }
        if self.min_distance <= 0.0 {
            return Err(ConfigError::Invalid(
                "min_distance must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.alpha_decay) {
            return Err(ConfigError::Invalid(
                "alpha_decay must be in [0, 1)".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.alpha_target) {
            return Err(ConfigError::Invalid(
                "alpha_target must be in [0, 1]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.center_strength) {
            return Err(ConfigError::Invalid(
                "center_strength must be in [0, 1]".to_string(),
            ));
        }
        if self.settle_ticks == 0 {
            return Err(ConfigError::Invalid(
                "settle_ticks must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
