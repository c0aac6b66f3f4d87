//! The fight queue shared by the detection loop and the fight workers.
//!
//! An unbounded FIFO behind an async mutex. `push` and `pop_if_any` hold
//! the lock only long enough to touch the deque, so producers never wait on
//! consumers and vice versa. Every push also stores a wake-up permit on a
//! [`Notify`], which lets an idle worker sleep until there is work instead of
//! polling on a fixed interval.
//!
//! There is no backpressure: if detection outpaces resolution the queue
//! grows. Moot events are cheap to discard, so in practice the backlog
//! drains as agents die.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};

use crate::control::SimulationControl;
use crate::event::FightEvent;

/// Thread-safe FIFO of pending fights.
#[derive(Debug, Default)]
pub struct FightQueue {
    events: Mutex<VecDeque<FightEvent>>,
    available: Notify,
}

impl FightQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and wake one waiting consumer.
    pub async fn push(&self, event: FightEvent) {
        self.events.lock().await.push_back(event);
        self.available.notify_one();
    }

    /// Append a batch of events under a single lock acquisition and wake
    /// every waiting consumer.
    ///
    /// Returns the number of events appended.
    pub async fn push_all(&self, batch: Vec<FightEvent>) -> usize {
        let count = batch.len();
        if count == 0 {
            return 0;
        }
        self.events.lock().await.extend(batch);
        // wake everyone parked now, and leave a permit for a consumer that
        // is between its empty pop and its wait
        self.available.notify_waiters();
        self.available.notify_one();
        count
    }

    /// Remove and return the oldest event, or `None` if the queue is empty.
    ///
    /// Never waits for an event to arrive.
    pub async fn pop_if_any(&self) -> Option<FightEvent> {
        self.events.lock().await.pop_front()
    }

    /// Pop an event, waiting up to `idle` for one to arrive when empty.
    ///
    /// The wait ends early when something is pushed or when `control`
    /// requests a stop. Returns `None` if the queue is still empty after
    /// the wait.
    pub async fn pop_or_wait(
        &self,
        control: &SimulationControl,
        idle: Duration,
    ) -> Option<FightEvent> {
        if let Some(event) = self.pop_if_any().await {
            return Some(event);
        }
        tokio::select! {
            () = self.available.notified() => {}
            () = tokio::time::sleep(idle) => {}
            () = control.stopped() => return None,
        }
        self.pop_if_any().await
    }

    /// Number of pending events.
    pub async fn len(&self) -> usize {
        self.events.lock().await.len()
    }

    /// Whether no events are pending.
    pub async fn is_empty(&self) -> bool {
        self.events.lock().await.is_empty()
    }
}
