//! The detection loop: the producer side of the pipeline.
//!
//! One tick is a move phase followed by a detection phase:
//!
//! 1. **Move** -- every live agent takes the step its [`MovementPolicy`]
//!    proposes, clamped to the field.
//! 2. **Detect** -- every ordered pair `(a, b)` of distinct live agents with
//!    `b` inside `a`'s aggression range becomes a [`FightEvent`]`{a, b}`.
//!    Ranges belong to the attacker's kind, so a long-range elf may pick a
//!    fight with a knight who cannot yet reach back.
//!
//! Detection only reads agent state and only pushes to the queue; it never
//! waits for a fight to be resolved. Dead agents are skipped in both phases,
//! so a corpse never moves and never appears in a new event.

use std::sync::Arc;
use std::time::Duration;

use skirmish_agents::Agent;
use skirmish_types::Bounds;
use tracing::{debug, info};

use crate::config::KindsConfig;
use crate::control::{SimulationControl, SimulationEndReason};
use crate::event::FightEvent;
use crate::movement::MovementPolicy;
use crate::queue::FightQueue;

/// Summary of one detection tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number (1-based).
    pub tick: u64,
    /// Agents moved in the move phase.
    pub moved: usize,
    /// Agents alive during the detection phase.
    pub alive: usize,
    /// Fight events pushed to the queue.
    pub events: usize,
}

/// Moves agents and enqueues fights once per tick.
pub struct DetectionLoop<M> {
    agents: Arc<[Arc<Agent>]>,
    queue: Arc<FightQueue>,
    kinds: KindsConfig,
    bounds: Bounds,
    policy: M,
    tick_interval: Duration,
    tick: u64,
}

impl<M: MovementPolicy> DetectionLoop<M> {
    /// Create a detection loop over a fixed roster.
    pub fn new(
        agents: Arc<[Arc<Agent>]>,
        queue: Arc<FightQueue>,
        kinds: KindsConfig,
        bounds: Bounds,
        policy: M,
        tick_interval: Duration,
    ) -> Self {
        Self {
            agents,
            queue,
            kinds,
            bounds,
            policy,
            tick_interval,
            tick: 0,
        }
    }

    /// Move every live agent once. Returns how many moved.
    pub fn move_phase(&mut self) -> usize {
        let mut moved: usize = 0;
        for agent in self.agents.iter().filter(|agent| agent.is_alive()) {
            let step = self.policy.displacement_for(agent.kind());
            agent.move_by(step, &self.bounds);
            moved = moved.saturating_add(1);
        }
        moved
    }

    /// Build a fight event for every ordered live pair within range.
    pub fn detect(&self) -> Vec<FightEvent> {
        let mut events = Vec::new();
        for attacker in self.agents.iter() {
            let range = self.kinds.range_for(attacker.kind());
            for defender in self.agents.iter() {
                if Arc::ptr_eq(attacker, defender) {
                    continue;
                }
                if !attacker.is_alive() || !defender.is_alive() {
                    continue;
                }
                if !attacker.is_close(defender, range) {
                    continue;
                }
                if let Ok(event) = FightEvent::new(Arc::clone(attacker), Arc::clone(defender)) {
                    events.push(event);
                }
            }
        }
        events
    }

    /// Run one tick: move, detect, and enqueue.
    pub async fn run_tick(&mut self) -> TickReport {
        self.tick = self.tick.saturating_add(1);
        let moved = self.move_phase();
        let alive = self.agents.iter().filter(|agent| agent.is_alive()).count();
        let events = self.queue.push_all(self.detect()).await;
        let report = TickReport {
            tick: self.tick,
            moved,
            alive,
            events,
        };
        debug!(
            tick = report.tick,
            moved = report.moved,
            alive = report.alive,
            events = report.events,
            "Detection tick complete"
        );
        report
    }

    /// Tick until `control` requests a stop, sleeping the tick interval
    /// between ticks. Finishes the run itself when the tick limit is hit.
    ///
    /// Returns the number of ticks executed.
    pub async fn run(mut self, control: Arc<SimulationControl>) -> u64 {
        info!(
            agents = self.agents.len(),
            tick_interval_ms = self.tick_interval.as_millis(),
            "Detection loop started"
        );
        while !control.is_stop_requested() {
            let _ = self.run_tick().await;
            let total = control.record_tick();
            if control.tick_limit_reached(total) {
                info!(tick = total, max_ticks = control.max_ticks(), "Tick limit reached");
                control.finish(SimulationEndReason::MaxTicksReached).await;
                break;
            }
            if control.sleep_or_stop(self.tick_interval).await {
                break;
            }
        }
        info!(ticks = self.tick, "Detection loop stopped");
        self.tick
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use skirmish_types::{Displacement, Kind, Position};

    use super::*;
    use crate::config::SimulationBoundsConfig;
    use crate::movement::FixedStep;

    fn roster(agents: Vec<Agent>) -> Arc<[Arc<Agent>]> {
        agents.into_iter().map(Arc::new).collect()
    }

    fn detection(agents: &Arc<[Arc<Agent>]>, policy: FixedStep) -> (DetectionLoop<FixedStep>, Arc<FightQueue>) {
        let queue = Arc::new(FightQueue::new());
        let looped = DetectionLoop::new(
            Arc::clone(agents),
            Arc::clone(&queue),
            KindsConfig::default(),
            Bounds::new(100, 100),
            policy,
            Duration::from_millis(1),
        );
        (looped, queue)
    }

    #[tokio::test]
    async fn pair_within_range_is_enqueued() {
        // dragon range 30, elf range 50; 10 apart, so both directions fire
        let agents = roster(vec![
            Agent::new(Kind::Dragon, Position::new(10, 10)),
            Agent::new(Kind::Elf, Position::new(20, 10)),
        ]);
        let (mut looped, queue) = detection(&agents, FixedStep::still());

        let report = looped.run_tick().await;
        assert_eq!(report.events, 2);
        assert_eq!(queue.len().await, 2);
        let first = queue.pop_if_any().await.unwrap();
        let second = queue.pop_if_any().await.unwrap();
        assert_eq!(first.attacker().kind(), Kind::Dragon);
        assert_eq!(second.attacker().kind(), Kind::Elf);
    }

    #[tokio::test]
    async fn range_belongs_to_the_attacker() {
        // knight range 10, elf range 50; 20 apart, only the elf engages
        let agents = roster(vec![
            Agent::new(Kind::KnightErrant, Position::new(0, 0)),
            Agent::new(Kind::Elf, Position::new(20, 0)),
        ]);
        let (looped, _queue) = detection(&agents, FixedStep::still());
        let events = looped.detect();
        assert_eq!(events.len(), 1);
        assert_eq!(events.first().unwrap().attacker().kind(), Kind::Elf);
    }

    #[test]
    fn no_self_fights() {
        let agents = roster(vec![
            Agent::new(Kind::Elf, Position::new(5, 5)),
            Agent::new(Kind::Elf, Position::new(5, 5)),
            Agent::new(Kind::Elf, Position::new(5, 5)),
        ]);
        let (looped, _queue) = detection(&agents, FixedStep::still());
        let events = looped.detect();
        assert_eq!(events.len(), 6);
        assert!(events
            .iter()
            .all(|event| !Arc::ptr_eq(event.attacker(), event.defender())));
    }

    #[test]
    fn dead_agents_are_excluded() {
        let agents = roster(vec![
            Agent::new(Kind::Dragon, Position::new(50, 50)),
            Agent::new(Kind::Elf, Position::new(51, 50)),
            Agent::new(Kind::KnightErrant, Position::new(52, 50)),
        ]);
        let corpse = Arc::clone(agents.get(1).unwrap());
        assert!(corpse.mark_dead());

        let (mut looped, _queue) = detection(&agents, FixedStep::uniform(Displacement::new(3, 3)));
        assert_eq!(looped.move_phase(), 2);
        assert_eq!(corpse.position(), Position::new(51, 50));

        let events = looped.detect();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|event| {
            !Arc::ptr_eq(event.attacker(), &corpse) && !Arc::ptr_eq(event.defender(), &corpse)
        }));
    }

    #[test]
    fn moves_stay_on_the_field() {
        let agents = roster(vec![
            Agent::new(Kind::Dragon, Position::new(0, 99)),
            Agent::new(Kind::Elf, Position::new(99, 0)),
        ]);
        let (mut looped, _queue) = detection(
            &agents,
            FixedStep::new(
                Displacement::new(-500, 500),
                Displacement::new(500, -500),
                Displacement::default(),
            ),
        );
        for _ in 0..3 {
            let _ = looped.move_phase();
        }
        let bounds = Bounds::new(100, 100);
        assert!(agents.iter().all(|agent| bounds.contains(agent.position())));
        assert_eq!(agents.first().unwrap().position(), Position::new(0, 99));
        assert_eq!(agents.get(1).unwrap().position(), Position::new(99, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_at_tick_limit() {
        let agents = roster(vec![Agent::new(Kind::Dragon, Position::new(1, 1))]);
        let (looped, _queue) = detection(&agents, FixedStep::still());
        let control = Arc::new(SimulationControl::new(&SimulationBoundsConfig {
            max_ticks: 3,
            max_real_time_seconds: 0,
            stop_when_one_kind_left: false,
        }));

        let ticks = looped.run(Arc::clone(&control)).await;
        assert_eq!(ticks, 3);
        assert_eq!(control.ticks(), 3);
        assert_eq!(
            control.end_reason().await,
            Some(SimulationEndReason::MaxTicksReached)
        );
    }
}
