//! Relationship Web — force-directed layout for NPC relationship graphs.
//!
//! Turns a town's NPC list into a validated node/edge graph and runs a
//! seeded physics simulation over it, handing per-node positions to
//! whatever renderer sits downstream.

pub mod core;
pub mod schema;
