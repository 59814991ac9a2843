use serde::{Deserialize, Serialize};
use std::fmt;

/// The flavour of a relationship between two NPCs.
///
/// Fixtures carry this as a free-form string under `"type"`; the two kinds
/// the tracker colours specially get their own variants and everything else
/// is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RelationshipKind {
    Rivalry,
    Alliance,
    Other(String),
}

impl RelationshipKind {
    /// Returns the tag string for this kind (e.g., "rivalry").
    pub fn tag(&self) -> &str {
        match self {
            Self::Rivalry => "rivalry",
            Self::Alliance => "alliance",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for RelationshipKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "rivalry" => Self::Rivalry,
            "alliance" => Self::Alliance,
            _ => Self::Other(tag),
        }
    }
}

impl From<&str> for RelationshipKind {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<RelationshipKind> for String {
    fn from(kind: RelationshipKind) -> Self {
        match kind {
            RelationshipKind::Other(tag) => tag,
            known => known.tag().to_string(),
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A typed, directional edge from the owning NPC to another NPC, by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub target: String,
    #[serde(rename = "type")]
    pub kind: RelationshipKind,
}

impl Relationship {
    pub fn new(target: impl Into<String>, kind: impl Into<RelationshipKind>) -> Self {
        Self {
            target: target.into(),
            kind: kind.into(),
        }
    }
}
