//! Graph model and force-directed layout engine.

pub mod config;
pub mod forces;
pub mod graph;
pub mod layout;
pub mod simulation;
