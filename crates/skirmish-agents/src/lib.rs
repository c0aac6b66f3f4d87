//! Agent state, combat rules, and fight observers for the Skirmish simulation.
//!
//! This crate contains everything that operates on a single agent or a single
//! pair of agents without touching the queue or the scheduling loops. It sits
//! between `skirmish-types` (the vocabulary) and `skirmish-core` (the
//! detection loop, fight queue, and workers).
//!
//! # Modules
//!
//! - [`agent`] -- The shared, lock-free [`Agent`] record
//! - [`error`] -- Error types for agent and combat operations
//! - [`observer`] -- [`FightObserver`] trait and the logging observer
//! - [`rules`] -- [`OutcomeResolver`] trait and the default [`RuleTable`]

pub mod agent;
pub mod error;
pub mod observer;
pub mod rules;

pub use agent::Agent;
pub use error::{AgentError, CombatError};
pub use observer::{FightObserver, LogObserver, notify_resolved};
pub use rules::{OutcomeResolver, RuleTable, beats};
