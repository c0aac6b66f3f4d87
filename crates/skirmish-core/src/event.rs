//! Pending encounters.
//!
//! A [`FightEvent`] holds shared references to both participants so it can
//! outlive the detection scan that created it and sit in the queue for as
//! long as it takes a worker to reach it.

use std::sync::Arc;

use skirmish_agents::{Agent, AgentError};

/// An encounter between two agents awaiting resolution.
#[derive(Debug, Clone)]
pub struct FightEvent {
    attacker: Arc<Agent>,
    defender: Arc<Agent>,
    /// How many times this encounter has been re-queued after a fault.
    attempts: u32,
}

impl FightEvent {
    /// Create an encounter in which `attacker` attacks `defender`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::SelfEncounter`] if both sides are the same agent.
    pub fn new(attacker: Arc<Agent>, defender: Arc<Agent>) -> Result<Self, AgentError> {
        if Arc::ptr_eq(&attacker, &defender) || attacker.id() == defender.id() {
            return Err(AgentError::SelfEncounter {
                agent_id: attacker.id(),
            });
        }
        Ok(Self {
            attacker,
            defender,
            attempts: 0,
        })
    }

    /// The attacking agent.
    pub fn attacker(&self) -> &Arc<Agent> {
        &self.attacker
    }

    /// The defending agent.
    pub fn defender(&self) -> &Arc<Agent> {
        &self.defender
    }

    /// Number of earlier attempts that ended in a resolver fault.
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether either participant is already dead.
    pub fn is_moot(&self) -> bool {
        !self.attacker.is_alive() || !self.defender.is_alive()
    }

    /// Whether `other` pairs the same attacker with the same defender.
    pub fn same_pair(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.attacker, &other.attacker) && Arc::ptr_eq(&self.defender, &other.defender)
    }

    /// The same encounter, one attempt later.
    #[must_use]
    pub fn retried(self) -> Self {
        Self {
            attacker: self.attacker,
            defender: self.defender,
            attempts: self.attempts.saturating_add(1),
        }
    }
}
