//! Fight queue, detection loop, fight workers, and orchestration for the
//! Skirmish simulation.
//!
//! The simulation runs two kinds of concurrent loops over one shared roster
//! of agents. The detection loop moves every live agent once per tick and
//! enqueues a fight for every pair standing within the attacker's aggression
//! range. Fight workers drain that queue in the background, re-check that
//! both sides are still alive, resolve the encounter, and apply the death.
//! Detection never waits for resolution.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `skirmish-config.yaml` into
//!   strongly-typed structs.
//! - [`control`] -- Shared stop flag, run bounds, and end reason.
//! - [`detection`] -- The move-then-detect tick loop (producer).
//! - [`event`] -- [`FightEvent`], one pending encounter.
//! - [`movement`] -- [`MovementPolicy`] and its random and fixed variants.
//! - [`queue`] -- [`FightQueue`], the notified FIFO between the loops.
//! - [`render`] -- Console grid snapshot of the roster.
//! - [`roster`] -- Seeding and the count-prefixed roster file format.
//! - [`runner`] -- [`Simulation`], the coordinator that owns the queue and
//!   the tasks.
//! - [`worker`] -- [`FightWorker`], the resolution loop (consumer).
//!
//! [`FightEvent`]: event::FightEvent
//! [`MovementPolicy`]: movement::MovementPolicy
//! [`FightQueue`]: queue::FightQueue
//! [`Simulation`]: runner::Simulation
//! [`FightWorker`]: worker::FightWorker

pub mod config;
pub mod control;
pub mod detection;
pub mod event;
pub mod movement;
pub mod queue;
pub mod render;
pub mod roster;
pub mod runner;
pub mod worker;
