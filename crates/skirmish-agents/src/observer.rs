//! Fight observers.
//!
//! Agents carry a list of [`FightObserver`]s. When a fight ends in a kill,
//! the worker calls [`notify_resolved`], which reports the fight once to
//! every distinct observer registered on either participant. Observers are
//! compared by pointer, so one shared observer subscribed on both agents
//! hears about the fight exactly once.

use std::sync::Arc;

use tracing::info;

use crate::agent::Agent;

/// A listener for resolved fights.
///
/// Implementations must return quickly; they run on the fight worker.
pub trait FightObserver: Send + Sync {
    /// Called after a fight between `attacker` and `defender` is resolved.
    fn on_fight(&self, attacker: &Agent, defender: &Agent, attacker_won: bool);
}

/// Observer that reports every kill through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl FightObserver for LogObserver {
    fn on_fight(&self, attacker: &Agent, defender: &Agent, attacker_won: bool) {
        if attacker_won {
            info!(
                attacker = %attacker.id(),
                attacker_kind = %attacker.kind(),
                attacker_position = %attacker.position(),
                defender = %defender.id(),
                defender_kind = %defender.kind(),
                defender_position = %defender.position(),
                "Murder"
            );
        }
    }
}

/// Notify every distinct observer of either participant, once each.
///
/// Returns the number of observers notified.
pub fn notify_resolved(attacker: &Agent, defender: &Agent, attacker_won: bool) -> usize {
    let mut seen: Vec<&Arc<dyn FightObserver>> = Vec::new();
    for observer in attacker.observers().iter().chain(defender.observers()) {
        if seen.iter().any(|known| Arc::ptr_eq(*known, observer)) {
            continue;
        }
        observer.on_fight(attacker, defender, attacker_won);
        seen.push(observer);
    }
    seen.len()
}
