//! The fight worker: the consumer side of the pipeline.
//!
//! Each iteration takes one event off the [`FightQueue`] and settles it:
//!
//! 1. If either participant is already dead the event is moot and is
//!    dropped without touching any state.
//! 2. Both participants' combat locks are taken, lowest [`AgentId`] first,
//!    and liveness is checked again under the locks. Holding both locks
//!    means neither side can die from another worker's fight while this one
//!    is being decided.
//! 3. The defender accepts the attack. A win flips the defender's alive flag
//!    (exactly once) and notifies the observers of both sides.
//! 4. A resolver fault puts the same pair back on the queue, up to the
//!    configured retry budget. A resolver panic is caught per event and
//!    counts as a fault; an observer panic is logged and the death stands.
//!
//! A fault in one event never ends the loop; only a stop request does.
//!
//! [`AgentId`]: skirmish_types::AgentId

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::FutureExt;
use serde::Serialize;
use skirmish_agents::{OutcomeResolver, notify_resolved};
use tracing::{debug, info, warn};

use crate::control::SimulationControl;
use crate::event::FightEvent;
use crate::queue::FightQueue;

/// What happened to one dequeued event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// One side was already dead; nothing changed.
    Moot,
    /// The defender survived the attack.
    Survived,
    /// The defender died.
    Killed,
    /// The resolver faulted and the event went back on the queue.
    Retried {
        /// Attempt count carried by the re-queued event.
        attempts: u32,
    },
    /// The resolver faulted and the retry budget is spent; the event is gone.
    Abandoned {
        /// Attempts made before giving up.
        attempts: u32,
    },
}

/// Counters shared by every worker of a run.
#[derive(Debug, Default)]
pub struct WorkerStats {
    resolved: AtomicU64,
    kills: AtomicU64,
    moot: AtomicU64,
    retried: AtomicU64,
    abandoned: AtomicU64,
}

/// Point-in-time copy of [`WorkerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerStatsSnapshot {
    /// Events that reached a verdict (kill or survival).
    pub resolved: u64,
    /// Verdicts that ended in a death.
    pub kills: u64,
    /// Events discarded because a participant was already dead.
    pub moot: u64,
    /// Events re-queued after a resolver fault.
    pub retried: u64,
    /// Events dropped after exhausting their retries.
    pub abandoned: u64,
}

impl WorkerStats {
    /// Count one outcome.
    pub fn record(&self, resolution: Resolution) {
        let bump = |counter: &AtomicU64| {
            counter.fetch_add(1, Ordering::Relaxed);
        };
        match resolution {
            Resolution::Moot => bump(&self.moot),
            Resolution::Survived => bump(&self.resolved),
            Resolution::Killed => {
                bump(&self.resolved);
                bump(&self.kills);
            }
            Resolution::Retried { .. } => bump(&self.retried),
            Resolution::Abandoned { .. } => bump(&self.abandoned),
        }
    }

    /// Read all counters.
    pub fn snapshot(&self) -> WorkerStatsSnapshot {
        WorkerStatsSnapshot {
            resolved: self.resolved.load(Ordering::Relaxed),
            kills: self.kills.load(Ordering::Relaxed),
            moot: self.moot.load(Ordering::Relaxed),
            retried: self.retried.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
        }
    }
}

/// Drains the fight queue and applies outcomes.
pub struct FightWorker {
    queue: Arc<FightQueue>,
    resolver: Arc<dyn OutcomeResolver>,
    stats: Arc<WorkerStats>,
    idle_wait: Duration,
    /// Re-queues allowed per event (0 = unlimited).
    max_retries: u32,
}

impl FightWorker {
    /// Create a worker over `queue`, resolving with `resolver`.
    pub fn new(
        queue: Arc<FightQueue>,
        resolver: Arc<dyn OutcomeResolver>,
        stats: Arc<WorkerStats>,
        idle_wait: Duration,
        max_retries: u32,
    ) -> Self {
        Self {
            queue,
            resolver,
            stats,
            idle_wait,
            max_retries,
        }
    }

    /// Settle one event and record the outcome.
    ///
    /// A resolver panic is contained here and handled like a resolver fault.
    pub async fn resolve(&self, event: FightEvent) -> Resolution {
        let pending = event.clone();
        let resolution = match AssertUnwindSafe(self.settle(event)).catch_unwind().await {
            Ok(resolution) => resolution,
            Err(payload) => {
                let reason = panic_reason(payload.as_ref());
                self.retry_or_abandon(pending, &reason).await
            }
        };
        self.stats.record(resolution);
        resolution
    }

    async fn settle(&self, event: FightEvent) -> Resolution {
        if event.is_moot() {
            debug!(
                attacker = %event.attacker().id(),
                defender = %event.defender().id(),
                "Moot fight discarded"
            );
            return Resolution::Moot;
        }

        let verdict = {
            let attacker = event.attacker();
            let defender = event.defender();
            let (first, second) = if attacker.id() <= defender.id() {
                (attacker, defender)
            } else {
                (defender, attacker)
            };
            let _first_guard = first.lock_combat().await;
            let _second_guard = second.lock_combat().await;

            if event.is_moot() {
                return Resolution::Moot;
            }

            match defender.accept(attacker, self.resolver.as_ref()) {
                Ok(true) => {
                    if defender.mark_dead() {
                        let notified = std::panic::catch_unwind(AssertUnwindSafe(|| {
                            notify_resolved(attacker, defender, true)
                        }));
                        if let Err(payload) = notified {
                            warn!(
                                attacker = %attacker.id(),
                                defender = %defender.id(),
                                error = %panic_reason(payload.as_ref()),
                                "Fight observer panicked"
                            );
                        }
                        return Resolution::Killed;
                    }
                    return Resolution::Moot;
                }
                Ok(false) => return Resolution::Survived,
                Err(err) => err,
            }
        };

        self.retry_or_abandon(event, &verdict.to_string()).await
    }

    /// Put a faulted event back on the queue, or drop it once the retry
    /// budget is spent.
    async fn retry_or_abandon(&self, event: FightEvent, error: &str) -> Resolution {
        let attempts = event.attempts();
        if self.max_retries > 0 && attempts >= self.max_retries {
            warn!(
                attacker = %event.attacker().id(),
                defender = %event.defender().id(),
                attempts,
                error,
                "Fight abandoned after repeated resolver faults"
            );
            return Resolution::Abandoned { attempts };
        }

        debug!(
            attacker = %event.attacker().id(),
            defender = %event.defender().id(),
            attempts,
            error,
            "Resolver fault, re-queueing fight"
        );
        let retry = event.retried();
        let attempts = retry.attempts();
        self.queue.push(retry).await;
        Resolution::Retried { attempts }
    }

    /// Run one worker iteration: take an event (waiting up to the idle
    /// interval if the queue is empty) and settle it.
    ///
    /// Returns `None` when there was nothing to do.
    pub async fn run_once(&self, control: &SimulationControl) -> Option<Resolution> {
        let event = self.queue.pop_or_wait(control, self.idle_wait).await?;
        Some(self.resolve(event).await)
    }

    /// Drain the queue until `control` requests a stop.
    ///
    /// Events still queued at shutdown stay in the queue.
    pub async fn run(self, control: Arc<SimulationControl>) {
        info!(
            idle_wait_ms = self.idle_wait.as_millis(),
            max_retries = self.max_retries,
            "Fight worker started"
        );
        while !control.is_stop_requested() {
            let _ = self.run_once(&control).await;
        }
        info!("Fight worker stopped");
    }
}

/// Best-effort text of a caught panic payload.
fn panic_reason(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|msg| (*msg).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic with a non-string payload".to_owned())
}
