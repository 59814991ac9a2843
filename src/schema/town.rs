use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use super::npc::Npc;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One town's fixture as the tracker loads it.
///
/// Only the NPC list feeds the relationship web. Events, rumours,
/// sacrifices and factions belong to other views and are skipped here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TownData {
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub npcs: Vec<Npc>,
}

impl TownData {
    /// Load a town fixture from a JSON file.
    pub fn load_json(path: &Path) -> Result<TownData, FixtureError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_json(&contents)
    }

    /// Parse a town fixture from a JSON string.
    pub fn parse_json(input: &str) -> Result<TownData, FixtureError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Number of relationship records across all NPCs.
    pub fn relationship_count(&self) -> usize {
        self.npcs.iter().map(|n| n.relationships.len()).sum()
    }
}

/// File stem a town's fixture is stored under: "Bryn Shander" -> "bryn_shander".
pub fn fixture_stem(town: &str) -> String {
    town.trim().to_lowercase().replace(' ', "_")
}
