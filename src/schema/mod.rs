//! Input records: NPCs, their relationships, and the town fixtures they
//! arrive in.

pub mod npc;
pub mod relationship;
pub mod town;
