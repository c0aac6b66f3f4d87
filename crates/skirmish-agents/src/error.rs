//! Error types for the skirmish-agents crate.
//!
//! Normal simulation outcomes (a defender surviving, a fight turning out to
//! be moot) are not errors. These types cover the genuine faults: pairing an
//! agent with itself, and a resolver that cannot produce an outcome.

use skirmish_types::{AgentId, Kind};

/// Errors raised while building agent relationships.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// An encounter was requested between an agent and itself.
    #[error("agent {agent_id} cannot fight itself")]
    SelfEncounter {
        /// The agent that appeared on both sides.
        agent_id: AgentId,
    },
}

/// Errors raised while resolving a fight.
///
/// A resolver fault is treated as transient: the fight worker puts the
/// encounter back on the queue and tries again later.
#[derive(Debug, thiserror::Error)]
pub enum CombatError {
    /// The resolver could not decide the outcome this time.
    #[error("resolver fault for {attacker} attacking {defender}: {reason}")]
    ResolverFault {
        /// Kind of the attacking agent.
        attacker: Kind,
        /// Kind of the defending agent.
        defender: Kind,
        /// Description of the fault.
        reason: String,
    },
}
