//! Shared control state for a running simulation.
//!
//! One [`SimulationControl`] is created per run and shared (via [`Arc`])
//! between the runner, the detection loop, every fight worker, and whatever
//! outer surface wants to stop the run (Ctrl-C in the engine binary). It is
//! the cancellation token of the simulation: every loop checks it at each
//! tick or idle-wait boundary and every sleep races against it.
//!
//! # Architecture
//!
//! Hot-path fields are atomics so the loops never take a lock to ask "should
//! I stop?". Waiters park on a [`Notify`]; [`SimulationControl::stopped`]
//! registers interest before re-checking the flag, so a stop issued between
//! the check and the wait is never missed.
//!
//! [`Arc`]: std::sync::Arc

use std::pin::pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, Notify};

use crate::config::SimulationBoundsConfig;

/// Reason why the simulation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SimulationEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// Reached the configured `max_real_time_seconds` limit.
    MaxRealTimeReached,
    /// An operator (or signal handler) asked for a stop.
    OperatorStop,
    /// At most one kind is still alive, so no further kill is possible.
    LastKindStanding,
}

/// Shared run control: stop flag, tick counter, bounds, and end reason.
#[derive(Debug)]
pub struct SimulationControl {
    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Wakes every loop parked in [`SimulationControl::stopped`].
    stop_notify: Notify,

    /// Number of completed detection ticks.
    ticks: AtomicU64,

    /// Wall-clock time when the simulation started.
    started_at: DateTime<Utc>,

    /// Maximum number of ticks (0 = unlimited).
    max_ticks: u64,

    /// Maximum wall-clock seconds (0 = unlimited).
    max_real_time_seconds: u64,

    /// Reason the simulation ended, if it has. First writer wins.
    end_reason: Mutex<Option<SimulationEndReason>>,
}

impl SimulationControl {
    /// Create control state from the configured bounds.
    pub fn new(bounds: &SimulationBoundsConfig) -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            stop_notify: Notify::new(),
            ticks: AtomicU64::new(0),
            started_at: Utc::now(),
            max_ticks: bounds.max_ticks,
            max_real_time_seconds: bounds.max_real_time_seconds,
            end_reason: Mutex::new(None),
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean stop and wake every waiting loop.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.stop_notify.notify_waiters();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Record `reason` (unless one is already recorded) and request a stop.
    pub async fn finish(&self, reason: SimulationEndReason) {
        {
            let mut guard = self.end_reason.lock().await;
            if guard.is_none() {
                *guard = Some(reason);
            }
        }
        self.request_stop();
    }

    /// The reason the simulation ended, if it has.
    pub async fn end_reason(&self) -> Option<SimulationEndReason> {
        *self.end_reason.lock().await
    }

    /// Resolve once a stop has been requested.
    pub async fn stopped(&self) {
        loop {
            let mut notified = pin!(self.stop_notify.notified());
            notified.as_mut().enable();
            if self.is_stop_requested() {
                return;
            }
            notified.await;
        }
    }

    /// Sleep for `duration`, waking early on stop.
    ///
    /// Returns `true` if the sleep was cut short (or a stop was already
    /// pending).
    pub async fn sleep_or_stop(&self, duration: Duration) -> bool {
        tokio::select! {
            () = self.stopped() => true,
            () = tokio::time::sleep(duration) => self.is_stop_requested(),
        }
    }

    // -----------------------------------------------------------------------
    // Ticks and boundaries
    // -----------------------------------------------------------------------

    /// Count one completed tick and return the new total.
    pub fn record_tick(&self) -> u64 {
        self.ticks
            .fetch_add(1, Ordering::AcqRel)
            .saturating_add(1)
    }

    /// Number of completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Returns `true` if `max_ticks > 0` and `current_tick >= max_ticks`.
    pub const fn tick_limit_reached(&self, current_tick: u64) -> bool {
        self.max_ticks > 0 && current_tick >= self.max_ticks
    }

    /// Returns `true` if `max_real_time_seconds > 0` and that many seconds
    /// have elapsed since start.
    pub fn time_limit_reached(&self) -> bool {
        if self.max_real_time_seconds == 0 {
            return false;
        }
        self.elapsed_seconds() >= self.max_real_time_seconds
    }

    /// Return the wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Return elapsed seconds since simulation start.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        // `num_seconds` can be negative if clocks are weird; treat as 0.
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }

    /// Get the configured max ticks.
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// Get the configured max real-time seconds.
    pub const fn max_real_time_seconds(&self) -> u64 {
        self.max_real_time_seconds
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn bounds(max_ticks: u64, max_real_time_seconds: u64) -> SimulationBoundsConfig {
        SimulationBoundsConfig {
            max_ticks,
            max_real_time_seconds,
            stop_when_one_kind_left: true,
        }
    }

    #[test]
    fn tick_limit() {
        let control = SimulationControl::new(&bounds(3, 0));
        assert!(!control.tick_limit_reached(2));
        assert!(control.tick_limit_reached(3));

        let unlimited = SimulationControl::new(&bounds(0, 0));
        assert!(!unlimited.tick_limit_reached(u64::MAX));
        assert!(!unlimited.time_limit_reached());
    }

    #[test]
    fn record_tick_counts() {
        let control = SimulationControl::new(&bounds(0, 0));
        assert_eq!(control.record_tick(), 1);
        assert_eq!(control.record_tick(), 2);
        assert_eq!(control.ticks(), 2);
    }

    #[tokio::test]
    async fn first_end_reason_wins() {
        let control = SimulationControl::new(&bounds(0, 0));
        assert_eq!(control.end_reason().await, None);
        control.finish(SimulationEndReason::MaxTicksReached).await;
        control.finish(SimulationEndReason::OperatorStop).await;
        assert!(control.is_stop_requested());
        assert_eq!(
            control.end_reason().await,
            Some(SimulationEndReason::MaxTicksReached)
        );
    }

    #[tokio::test]
    async fn stopped_returns_when_already_stopped() {
        let control = SimulationControl::new(&bounds(0, 0));
        control.request_stop();
        control.stopped().await;
        assert!(control.sleep_or_stop(Duration::from_secs(3600)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_wakes_a_sleeper() {
        let control = Arc::new(SimulationControl::new(&bounds(0, 0)));
        let sleeper = {
            let control = Arc::clone(&control);
            tokio::spawn(async move { control.sleep_or_stop(Duration::from_secs(3600)).await })
        };
        tokio::task::yield_now().await;
        control.request_stop();
        let interrupted = sleeper.await;
        assert!(matches!(interrupted, Ok(true)));
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_completes_without_stop() {
        let control = SimulationControl::new(&bounds(0, 0));
        assert!(!control.sleep_or_stop(Duration::from_millis(5)).await);
    }
}
