use serde::{Deserialize, Serialize};

use super::relationship::{Relationship, RelationshipKind};

/// What an NPC does in town. Only the renderer looks at this.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Speaker,
    Merchant,
    Other(String),
}

impl Role {
    pub fn label(&self) -> &str {
        match self {
            Self::Speaker => "Speaker",
            Self::Merchant => "Merchant",
            Self::Other(label) => label,
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for Role {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Speaker" => Self::Speaker,
            "Merchant" => Self::Merchant,
            _ => Self::Other(label),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(label) => label,
            known => known.label().to_string(),
        }
    }
}

/// A tracked non-player character as it appears in a town fixture.
///
/// `motivation` and `secret` are opaque to the layout engine; they ride
/// along so a tooltip layer can show them next to the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub motivation: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl Npc {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: Role::default(),
            motivation: String::new(),
            secret: String::new(),
            relationships: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Adds a relationship from this NPC to `target`.
    pub fn relates_to(
        mut self,
        target: impl Into<String>,
        kind: impl Into<RelationshipKind>,
    ) -> Self {
        self.relationships.push(Relationship::new(target, kind));
        self
    }

    /// Returns true if this NPC has a relationship pointing at `name`.
    pub fn relates_to_name(&self, name: &str) -> bool {
        self.relationships.iter().any(|r| r.target == name)
    }
}
