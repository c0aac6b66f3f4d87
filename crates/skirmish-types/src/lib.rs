//! Shared type definitions for the Skirmish simulation.
//!
//! This crate is the single source of truth for the small vocabulary used
//! across the Skirmish workspace: agent identifiers, the closed set of agent
//! kinds, and grid geometry.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for agent identifiers
//! - [`enums`] -- The [`Kind`] enumeration and its roster codes
//! - [`geometry`] -- Grid positions, displacements, and bounds

pub mod enums;
pub mod geometry;
pub mod ids;

// Re-export all public types at crate root for convenience.
pub use enums::Kind;
pub use geometry::{Bounds, Displacement, Position};
pub use ids::AgentId;
