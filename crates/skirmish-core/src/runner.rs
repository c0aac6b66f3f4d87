//! Simulation coordinator.
//!
//! [`Simulation`] owns the fight queue, the shared roster and the run
//! control, and injects them into the tasks it spawns:
//!
//! - one [`DetectionLoop`] (producer),
//! - `combat.workers` [`FightWorker`]s (consumers),
//! - a supervisor loop on the calling task that watches the run bounds.
//!
//! The run ends when the tick limit is hit (detection finishes it), the
//! real-time limit is hit, at most one kind is left alive (if enabled), or
//! someone outside calls [`SimulationControl::finish`] /
//! [`SimulationControl::request_stop`]. Every task is joined before
//! [`Simulation::run`] returns; events still queued at that point are
//! reported, not resolved.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use skirmish_agents::{Agent, OutcomeResolver};
use skirmish_types::{AgentId, Kind, Position};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::{ConfigError, SimulationConfig};
use crate::control::{SimulationControl, SimulationEndReason};
use crate::detection::DetectionLoop;
use crate::movement::MovementPolicy;
use crate::queue::FightQueue;
use crate::worker::{FightWorker, WorkerStats, WorkerStatsSnapshot};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The configuration failed validation.
    #[error("configuration error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// A spawned task panicked or was cancelled.
    #[error("task join error: {message}")]
    Join {
        /// Description of the join failure.
        message: String,
    },
}

impl From<tokio::task::JoinError> for RunnerError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Join {
            message: err.to_string(),
        }
    }
}

/// A live agent at the end of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Survivor {
    /// The agent's identifier.
    pub id: AgentId,
    /// The agent's kind.
    pub kind: Kind,
    /// Where the agent stood when the run ended.
    pub position: Position,
}

impl Survivor {
    fn of(agent: &Agent) -> Self {
        Self {
            id: agent.id(),
            kind: agent.kind(),
            position: agent.position(),
        }
    }
}

/// Result of the simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// Wall-clock time the run started.
    pub started_at: DateTime<Utc>,
    /// Wall-clock seconds the run lasted.
    pub elapsed_seconds: u64,
    /// Total number of detection ticks executed.
    pub total_ticks: u64,
    /// Fight worker counters across all workers.
    pub stats: WorkerStatsSnapshot,
    /// Agents still alive, in roster order.
    pub survivors: Vec<Survivor>,
    /// Events left in the queue at shutdown.
    pub pending_events: usize,
}

/// Number of distinct kinds among live agents.
pub fn alive_kind_count(agents: &[Arc<Agent>]) -> usize {
    agents
        .iter()
        .filter(|agent| agent.is_alive())
        .map(|agent| agent.kind())
        .collect::<BTreeSet<_>>()
        .len()
}

/// One configured simulation run.
pub struct Simulation<M> {
    config: SimulationConfig,
    agents: Arc<[Arc<Agent>]>,
    queue: Arc<FightQueue>,
    control: Arc<SimulationControl>,
    resolver: Arc<dyn OutcomeResolver>,
    stats: Arc<WorkerStats>,
    movement: M,
}

impl<M: MovementPolicy + 'static> Simulation<M> {
    /// Assemble a run over `agents`.
    ///
    /// Observers must already be attached to the agents; the roster is
    /// fixed from here on.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Config`] if `config` fails validation.
    pub fn new(
        config: SimulationConfig,
        agents: Vec<Agent>,
        resolver: Arc<dyn OutcomeResolver>,
        movement: M,
    ) -> Result<Self, RunnerError> {
        config.validate()?;
        let control = Arc::new(SimulationControl::new(&config.simulation));
        Ok(Self {
            config,
            agents: agents.into_iter().map(Arc::new).collect(),
            queue: Arc::new(FightQueue::new()),
            control,
            resolver,
            stats: Arc::new(WorkerStats::default()),
            movement,
        })
    }

    /// Shared run control, for outer surfaces that want to stop the run.
    pub fn control(&self) -> Arc<SimulationControl> {
        Arc::clone(&self.control)
    }

    /// The shared roster.
    pub fn agents(&self) -> Arc<[Arc<Agent>]> {
        Arc::clone(&self.agents)
    }

    /// The fight queue.
    pub fn queue(&self) -> Arc<FightQueue> {
        Arc::clone(&self.queue)
    }

    /// Run until a termination condition is met, then join every task.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Join`] if a detection or worker task panicked.
    pub async fn run(self) -> Result<SimulationResult, RunnerError> {
        let Self {
            config,
            agents,
            queue,
            control,
            resolver,
            stats,
            movement,
        } = self;

        info!(
            agents = agents.len(),
            workers = config.combat.workers,
            max_ticks = control.max_ticks(),
            max_real_time_seconds = control.max_real_time_seconds(),
            tick_interval_ms = config.world.tick_interval_ms,
            "Simulation starting"
        );

        let detection: JoinHandle<u64> = tokio::spawn(
            DetectionLoop::new(
                Arc::clone(&agents),
                Arc::clone(&queue),
                config.kinds,
                config.world.bounds(),
                movement,
                config.world.tick_interval(),
            )
            .run(Arc::clone(&control)),
        );

        let workers: Vec<JoinHandle<()>> = (0..config.combat.workers)
            .map(|_| {
                let worker = FightWorker::new(
                    Arc::clone(&queue),
                    Arc::clone(&resolver),
                    Arc::clone(&stats),
                    config.combat.idle_wait(),
                    config.combat.max_retries,
                );
                tokio::spawn(worker.run(Arc::clone(&control)))
            })
            .collect();

        supervise(&config, &agents, &control).await;
        control.request_stop();

        let total_ticks = detection.await?;
        for worker in workers {
            worker.await?;
        }

        let end_reason = control
            .end_reason()
            .await
            .unwrap_or(SimulationEndReason::OperatorStop);

        Ok(SimulationResult {
            end_reason,
            started_at: control.started_at(),
            elapsed_seconds: control.elapsed_seconds(),
            total_ticks,
            stats: stats.snapshot(),
            survivors: agents
                .iter()
                .filter(|agent| agent.is_alive())
                .map(|agent| Survivor::of(agent))
                .collect(),
            pending_events: queue.len().await,
        })
    }
}

/// Watch the run bounds that no single loop owns.
async fn supervise(config: &SimulationConfig, agents: &[Arc<Agent>], control: &SimulationControl) {
    let interval = config.combat.idle_wait();
    loop {
        if control.is_stop_requested() {
            return;
        }
        if control.time_limit_reached() {
            info!(
                max_seconds = control.max_real_time_seconds(),
                elapsed = control.elapsed_seconds(),
                "Real-time limit reached"
            );
            control.finish(SimulationEndReason::MaxRealTimeReached).await;
            return;
        }
        if config.simulation.stop_when_one_kind_left {
            let kinds = alive_kind_count(agents);
            if kinds <= 1 {
                info!(kinds, "No opposing kinds left");
                control.finish(SimulationEndReason::LastKindStanding).await;
                return;
            }
        }
        if control.sleep_or_stop(interval).await {
            return;
        }
    }
}

/// Log the simulation end sequence.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        started_at = %result.started_at,
        elapsed_seconds = result.elapsed_seconds,
        total_ticks = result.total_ticks,
        survivors = result.survivors.len(),
        pending_events = result.pending_events,
        "Simulation ended"
    );
    info!(
        resolved = result.stats.resolved,
        kills = result.stats.kills,
        moot = result.stats.moot,
        retried = result.stats.retried,
        abandoned = result.stats.abandoned,
        "Fight statistics"
    );
    if result.survivors.is_empty() {
        warn!("Simulation ended with no survivors");
    }
    for survivor in &result.survivors {
        info!(
            agent_id = %survivor.id,
            kind = %survivor.kind,
            position = %survivor.position,
            "Survivor"
        );
    }
}
