//! The shared agent record.
//!
//! Agents are created once, wrapped in [`Arc`], and then read concurrently
//! by the detection loop, the fight workers, and the renderer. Their two
//! mutable fields are atomics:
//!
//! - `alive` flips from `true` to `false` exactly once via compare-and-swap
//!   in [`Agent::mark_dead`]. Nothing ever sets it back.
//! - `position` packs both coordinates into one `AtomicU64` so readers never
//!   see `x` from one move and `y` from another. Only the detection loop
//!   writes it.
//!
//! The `combat` mutex is not part of the agent's data. Fight workers hold it
//! for both participants while an encounter is re-validated, resolved, and
//! applied, so two workers never resolve fights against the same agent at
//! the same time.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use skirmish_types::{AgentId, Bounds, Displacement, Kind, Position};
use tokio::sync::{Mutex, MutexGuard};

use crate::error::CombatError;
use crate::observer::FightObserver;
use crate::rules::OutcomeResolver;

/// A simulated combatant.
pub struct Agent {
    /// Stable identity, distinct for every agent.
    id: AgentId,
    /// The agent's kind, fixed for its lifetime.
    kind: Kind,
    /// Packed [`Position`], see [`Position::pack`].
    position: AtomicU64,
    /// Liveness flag; `true` until the agent loses a fight.
    alive: AtomicBool,
    /// Listeners told about every fight this agent wins or loses.
    observers: Vec<Arc<dyn FightObserver>>,
    /// Serializes fight resolution involving this agent.
    combat: Mutex<()>,
}

impl Agent {
    /// Create a live agent of `kind` at `position`, with no observers.
    pub fn new(kind: Kind, position: Position) -> Self {
        Self::with_id(AgentId::new(), kind, position)
    }

    /// Create a live agent with an explicit identifier.
    pub fn with_id(id: AgentId, kind: Kind, position: Position) -> Self {
        Self {
            id,
            kind,
            position: AtomicU64::new(position.pack()),
            alive: AtomicBool::new(true),
            observers: Vec::new(),
            combat: Mutex::new(()),
        }
    }

    /// Register an observer. Observers are fixed once the agent is shared.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn FightObserver>) -> Self {
        self.subscribe(observer);
        self
    }

    /// Register an observer on an agent that is not shared yet.
    pub fn subscribe(&mut self, observer: Arc<dyn FightObserver>) {
        self.observers.push(observer);
    }

    /// The agent's identifier.
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// The agent's kind.
    pub const fn kind(&self) -> Kind {
        self.kind
    }

    /// Current position.
    pub fn position(&self) -> Position {
        Position::unpack(self.position.load(Ordering::Acquire))
    }

    /// Whether the agent is still alive.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Registered observers.
    pub fn observers(&self) -> &[Arc<dyn FightObserver>] {
        &self.observers
    }

    /// Squared Euclidean distance to `other`.
    pub fn distance_squared(&self, other: &Self) -> u64 {
        self.position().squared_distance(other.position())
    }

    /// Whether `other` is within `range` cells of this agent.
    pub fn is_close(&self, other: &Self, range: u32) -> bool {
        self.position().is_within(other.position(), range)
    }

    /// Move by `step`, clamped to `bounds`, and return the new position.
    ///
    /// Only the detection loop calls this; a single writer means a plain
    /// load/store pair is enough.
    pub fn move_by(&self, step: Displacement, bounds: &Bounds) -> Position {
        let next = bounds.apply(self.position(), step);
        self.position.store(next.pack(), Ordering::Release);
        next
    }

    /// Receive an attack from `attacker`. Returns `Ok(true)` if the attacker
    /// wins.
    ///
    /// This only consults `resolver`; applying the outcome is the caller's
    /// job (see [`Agent::mark_dead`]).
    ///
    /// # Errors
    ///
    /// Propagates the resolver's [`CombatError`].
    pub fn accept(
        &self,
        attacker: &Self,
        resolver: &dyn OutcomeResolver,
    ) -> Result<bool, CombatError> {
        resolver.resolve(attacker.kind, self.kind)
    }

    /// Mark the agent dead.
    ///
    /// Returns `true` only for the call that performed the transition, so
    /// at most one caller ever observes a given death.
    pub fn mark_dead(&self) -> bool {
        self.alive
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Acquire this agent's combat lock.
    pub async fn lock_combat(&self) -> MutexGuard<'_, ()> {
        self.combat.lock().await
    }
}

impl PartialEq for Agent {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Agent {}

impl core::fmt::Debug for Agent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("position", &self.position())
            .field("alive", &self.is_alive())
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}
