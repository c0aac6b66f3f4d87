//! Combat outcome rules.
//!
//! Who wins a fight depends only on the two kinds involved. The default
//! [`RuleTable`] is a three-way cycle: dragons eat elves, elves shoot knights
//! errant, knights errant slay dragons. Same-kind fights and the reverse
//! direction of every pair leave the defender standing.
//!
//! Resolution goes through the [`OutcomeResolver`] trait so the fight worker
//! can be driven by alternative rule sets, including ones that fail.

use skirmish_types::Kind;

use crate::error::CombatError;

/// Decides the outcome of an attack from the kinds of both participants.
pub trait OutcomeResolver: Send + Sync {
    /// Return `Ok(true)` if `attacker` defeats `defender`.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError`] when the outcome cannot be determined. The
    /// caller treats this as a transient fault and retries the encounter.
    fn resolve(&self, attacker: Kind, defender: Kind) -> Result<bool, CombatError>;
}

/// The built-in, infallible rule table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleTable;

impl OutcomeResolver for RuleTable {
    fn resolve(&self, attacker: Kind, defender: Kind) -> Result<bool, CombatError> {
        Ok(beats(attacker, defender))
    }
}

/// Whether `attacker` wins against `defender` under the built-in rules.
pub const fn beats(attacker: Kind, defender: Kind) -> bool {
    match attacker {
        Kind::Dragon => matches!(defender, Kind::Elf),
        Kind::Elf => matches!(defender, Kind::KnightErrant),
        Kind::KnightErrant => matches!(defender, Kind::Dragon),
    }
}
