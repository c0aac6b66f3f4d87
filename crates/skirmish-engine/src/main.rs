//! Engine binary for the Skirmish simulation.
//!
//! Wires the roster, the fight pipeline, the console board and the
//! interrupt handler together, runs one simulation to completion and
//! reports the survivors.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `skirmish-config.yaml` (or `$SKIRMISH_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Load the roster file, or seed a random roster
//! 4. Start the board printout and the Ctrl-C watcher
//! 5. Run the simulation until a termination condition is met
//! 6. Log survivors and statistics, save the roster

mod console;
mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use skirmish_agents::{Agent, FightObserver, LogObserver, RuleTable};
use skirmish_core::config::{LoggingConfig, SimulationConfig};
use skirmish_core::movement::RandomWalk;
use skirmish_core::render::render_grid;
use skirmish_core::roster;
use skirmish_core::runner::{self, Simulation};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Default configuration file, relative to the working directory.
const CONFIG_FILE: &str = "skirmish-config.yaml";

/// Environment variable that overrides [`CONFIG_FILE`].
const CONFIG_ENV: &str = "SKIRMISH_CONFIG";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, config_path) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("skirmish-engine starting");
    match &config_path {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }
    info!(
        seed = config.world.seed,
        width = config.world.width,
        height = config.world.height,
        tick_interval_ms = config.world.tick_interval_ms,
        workers = config.combat.workers,
        "Simulation configured"
    );

    // 3. Build the roster. Every agent reports to the same log observer.
    let observers: Vec<Arc<dyn FightObserver>> = vec![Arc::new(LogObserver)];
    let agents = build_roster(&config, &observers)?;
    for agent in &agents {
        info!(
            agent_id = %agent.id(),
            kind = %agent.kind(),
            position = %agent.position(),
            "Agent"
        );
    }

    let simulation = Simulation::new(
        config.clone(),
        agents,
        Arc::new(RuleTable),
        RandomWalk::new(config.world.seed.wrapping_add(1), config.kinds),
    )
    .map_err(EngineError::from)?;
    let control = simulation.control();
    let field = simulation.agents();

    // 4. Background console tasks.
    let watcher = console::spawn_interrupt_watcher(Arc::clone(&control));
    let renderer = config.render.enabled.then(|| {
        tokio::spawn(console::render_loop(
            std::io::stdout(),
            Arc::clone(&field),
            config.world.bounds(),
            config.render.grid_cells,
            Duration::from_millis(config.render.interval_ms),
            Arc::clone(&control),
        ))
    });

    // 5. Run.
    let result = simulation.run().await.map_err(EngineError::from)?;
    watcher.abort();
    if let Some(renderer) = renderer {
        let _ = console::join_renderer(renderer).await;
        println!(
            "{}",
            render_grid(&field, config.world.bounds(), config.render.grid_cells)
        );
    }

    // 6. Report and persist.
    runner::log_simulation_end(&result);
    if let Some(path) = &config.roster.save_path {
        let survivors: Vec<Arc<Agent>> = field
            .iter()
            .filter(|agent| agent.is_alive())
            .map(Arc::clone)
            .collect();
        roster::save(path, &survivors).map_err(EngineError::from)?;
    }

    info!("skirmish-engine finished");
    Ok(())
}

/// Install the tracing subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Load configuration from `$SKIRMISH_CONFIG` or `skirmish-config.yaml`.
///
/// A missing default file falls back to built-in defaults; a missing file
/// named by the environment variable is an error.
fn load_config() -> Result<(SimulationConfig, Option<PathBuf>), EngineError> {
    if let Some(path) = std::env::var_os(CONFIG_ENV).map(PathBuf::from) {
        let config = SimulationConfig::from_file(&path)?;
        return Ok((config, Some(path)));
    }
    let path = Path::new(CONFIG_FILE);
    if path.exists() {
        let config = SimulationConfig::from_file(path)?;
        Ok((config, Some(path.to_path_buf())))
    } else {
        Ok((SimulationConfig::default(), None))
    }
}

/// Load the configured roster file, or seed a random roster.
fn build_roster(
    config: &SimulationConfig,
    observers: &[Arc<dyn FightObserver>],
) -> Result<Vec<Agent>, EngineError> {
    let bounds = config.world.bounds();
    if let Some(path) = &config.roster.load_path {
        let records = roster::load(path, bounds)?;
        return Ok(records
            .into_iter()
            .map(|record| record.into_agent(observers))
            .collect());
    }
    let mut rng = StdRng::seed_from_u64(config.world.seed);
    let agents = roster::seed_roster(&mut rng, config.world.initial_agents, bounds, observers);
    info!(count = agents.len(), seed = config.world.seed, "Roster seeded");
    Ok(agents)
}
