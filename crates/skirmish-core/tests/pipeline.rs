//! End-to-end tests for the detection → queue → worker pipeline.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use skirmish_agents::{Agent, FightObserver, RuleTable};
use skirmish_core::config::{KindsConfig, SimulationBoundsConfig, SimulationConfig};
use skirmish_core::control::{SimulationControl, SimulationEndReason};
use skirmish_core::detection::DetectionLoop;
use skirmish_core::movement::FixedStep;
use skirmish_core::queue::FightQueue;
use skirmish_core::render::render_grid;
use skirmish_core::roster::{read_roster, write_roster, RosterRecord};
use skirmish_core::runner::Simulation;
use skirmish_core::worker::{FightWorker, Resolution, WorkerStats};
use skirmish_types::{AgentId, Bounds, Kind, Position};

#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<(AgentId, AgentId, bool)>>,
}

impl FightObserver for Recorder {
    fn on_fight(&self, attacker: &Agent, defender: &Agent, attacker_won: bool) {
        self.calls
            .lock()
            .unwrap()
            .push((attacker.id(), defender.id(), attacker_won));
    }
}

fn unbounded() -> SimulationControl {
    SimulationControl::new(&SimulationBoundsConfig {
        max_ticks: 0,
        max_real_time_seconds: 0,
        stop_when_one_kind_left: false,
    })
}

fn worker(queue: &Arc<FightQueue>, stats: &Arc<WorkerStats>) -> FightWorker {
    FightWorker::new(
        Arc::clone(queue),
        Arc::new(RuleTable),
        Arc::clone(stats),
        Duration::from_millis(100),
        16,
    )
}

#[tokio::test]
async fn one_tick_one_kill_one_notification() {
    let recorder = Arc::new(Recorder::default());
    let shared: Arc<dyn FightObserver> = recorder.clone();

    // shrink the elf's reach so only the dragon's event is produced
    let mut kinds = KindsConfig::default();
    kinds.elf.aggression_range = 5;
    let dragon = Arc::new(
        Agent::new(Kind::Dragon, Position::new(10, 10)).with_observer(Arc::clone(&shared)),
    );
    let elf = Arc::new(Agent::new(Kind::Elf, Position::new(20, 10)).with_observer(shared));
    let agents: Arc<[Arc<Agent>]> = vec![Arc::clone(&dragon), Arc::clone(&elf)].into();

    let queue = Arc::new(FightQueue::new());
    let mut detection = DetectionLoop::new(
        Arc::clone(&agents),
        Arc::clone(&queue),
        kinds,
        Bounds::new(100, 100),
        FixedStep::still(),
        Duration::from_millis(10),
    );
    let report = detection.run_tick().await;
    assert_eq!(report.events, 1);

    let stats = Arc::new(WorkerStats::default());
    let control = unbounded();
    let resolution = worker(&queue, &stats).run_once(&control).await;

    assert_eq!(resolution, Some(Resolution::Killed));
    assert!(dragon.is_alive());
    assert!(!elf.is_alive());
    assert_eq!(
        *recorder.calls.lock().unwrap(),
        vec![(dragon.id(), elf.id(), true)]
    );
    assert!(queue.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn empty_queue_idles_without_touching_agents() {
    let agent = Arc::new(Agent::new(Kind::KnightErrant, Position::new(3, 4)));
    let queue = Arc::new(FightQueue::new());
    let stats = Arc::new(WorkerStats::default());
    let control = unbounded();

    let before = tokio::time::Instant::now();
    assert_eq!(worker(&queue, &stats).run_once(&control).await, None);
    assert!(before.elapsed() >= Duration::from_millis(100));

    assert!(agent.is_alive());
    assert_eq!(agent.position(), Position::new(3, 4));
    assert_eq!(stats.snapshot().resolved, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn crowded_field_kills_each_agent_at_most_once() {
    let recorder = Arc::new(Recorder::default());
    let shared: Arc<dyn FightObserver> = recorder.clone();

    let mut config = SimulationConfig::default();
    config.world.tick_interval_ms = 5;
    config.combat.workers = 4;
    config.combat.idle_wait_ms = 2;
    config.simulation.max_ticks = 0;
    config.simulation.max_real_time_seconds = 0;
    config.simulation.stop_when_one_kind_left = true;

    // everybody starts on the same spot, so every pair is in range
    let agents: Vec<Agent> = (0..30)
        .map(|i| {
            let kind = Kind::ALL.get(i % 3).copied().unwrap();
            Agent::new(kind, Position::new(50, 50)).with_observer(Arc::clone(&shared))
        })
        .collect();

    let sim = Simulation::new(config, agents, Arc::new(RuleTable), FixedStep::still()).unwrap();
    let roster = sim.agents();
    let result = sim.run().await.unwrap();

    assert_eq!(result.end_reason, SimulationEndReason::LastKindStanding);
    let dead = roster.iter().filter(|agent| !agent.is_alive()).count();
    let kills = usize::try_from(result.stats.kills).unwrap();
    assert_eq!(dead, kills);
    assert_eq!(recorder.calls.lock().unwrap().len(), kills);

    let mut victims: Vec<AgentId> = recorder
        .calls
        .lock()
        .unwrap()
        .iter()
        .map(|(_, defender, _)| *defender)
        .collect();
    victims.sort();
    victims.dedup();
    assert_eq!(victims.len(), kills);

    let survivors: std::collections::BTreeSet<Kind> =
        result.survivors.iter().map(|survivor| survivor.kind).collect();
    assert!(survivors.len() <= 1);
}

#[test]
fn saved_roster_renders_after_reload() {
    let records = vec![
        RosterRecord {
            kind: Kind::Dragon,
            position: Position::new(0, 0),
        },
        RosterRecord {
            kind: Kind::KnightErrant,
            position: Position::new(150, 150),
        },
    ];
    let mut buffer = Vec::new();
    write_roster(&mut buffer, &records).unwrap();

    let bounds = Bounds::new(100, 100);
    let reloaded = read_roster(buffer.as_slice(), bounds).unwrap();
    let agents: Vec<Arc<Agent>> = reloaded
        .into_iter()
        .map(|record| Arc::new(record.into_agent(&[])))
        .collect();

    assert_eq!(agents.get(1).unwrap().position(), Position::new(99, 99));
    assert_eq!(render_grid(&agents, bounds, 2), "[D][ ]\n[ ][K]\n");
}
