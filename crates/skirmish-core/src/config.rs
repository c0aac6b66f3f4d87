//! Configuration loading and typed config structures for the Skirmish simulation.
//!
//! The canonical configuration lives in `skirmish-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads and validates the file. Every
//! section and field has a default, so an empty file is a valid config.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use skirmish_types::{Bounds, Kind};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but describes an impossible simulation.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `skirmish-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Grid size, seeding, and tick cadence.
    #[serde(default)]
    pub world: WorldConfig,

    /// Per-kind movement and aggression.
    #[serde(default)]
    pub kinds: KindsConfig,

    /// Fight worker settings.
    #[serde(default)]
    pub combat: CombatConfig,

    /// Run boundaries.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,

    /// Console grid rendering.
    #[serde(default)]
    pub render: RenderConfig,

    /// Roster file locations.
    #[serde(default)]
    pub roster: RosterConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load and validate configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the cross-field constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| -> Result<(), ConfigError> {
            Err(ConfigError::Invalid {
                reason: reason.to_owned(),
            })
        };
        if self.world.width == 0 || self.world.height == 0 {
            return invalid("world.width and world.height must be at least 1");
        }
        if self.world.tick_interval_ms == 0 {
            return invalid("world.tick_interval_ms must be at least 1");
        }
        if self.combat.workers == 0 {
            return invalid("combat.workers must be at least 1");
        }
        if self.combat.idle_wait_ms == 0 {
            return invalid("combat.idle_wait_ms must be at least 1");
        }
        if self.render.grid_cells == 0 {
            return invalid("render.grid_cells must be at least 1");
        }
        if self.render.enabled && self.render.interval_ms == 0 {
            return invalid("render.interval_ms must be at least 1");
        }
        Ok(())
    }
}

/// Grid and cadence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Random seed for movement and roster seeding.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of columns (exclusive upper bound for `x`).
    #[serde(default = "default_extent")]
    pub width: u32,

    /// Number of rows (exclusive upper bound for `y`).
    #[serde(default = "default_extent")]
    pub height: u32,

    /// Number of agents to seed when no roster file is loaded.
    #[serde(default = "default_initial_agents")]
    pub initial_agents: u32,

    /// Real-time milliseconds between detection ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl WorldConfig {
    /// The playing field described by `width` and `height`.
    pub const fn bounds(&self) -> Bounds {
        Bounds::new(self.width, self.height)
    }

    /// The tick interval as a [`Duration`].
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            width: default_extent(),
            height: default_extent(),
            initial_agents: default_initial_agents(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// Movement and aggression numbers for one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct KindConfig {
    /// Largest per-axis step the kind takes in one tick.
    pub move_distance: u32,

    /// Distance within which the kind attacks another agent.
    pub aggression_range: u32,
}

/// Per-kind configuration table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct KindsConfig {
    /// Dragon settings.
    #[serde(default = "default_dragon")]
    pub dragon: KindConfig,

    /// Elf settings.
    #[serde(default = "default_elf")]
    pub elf: KindConfig,

    /// Knight errant settings.
    #[serde(default = "default_knight_errant")]
    pub knight_errant: KindConfig,
}

impl KindsConfig {
    /// Settings for `kind`.
    pub const fn get(&self, kind: Kind) -> &KindConfig {
        match kind {
            Kind::Dragon => &self.dragon,
            Kind::Elf => &self.elf,
            Kind::KnightErrant => &self.knight_errant,
        }
    }

    /// Aggression range for `kind`.
    pub const fn range_for(&self, kind: Kind) -> u32 {
        self.get(kind).aggression_range
    }

    /// Move distance for `kind`.
    pub const fn move_distance(&self, kind: Kind) -> u32 {
        self.get(kind).move_distance
    }
}

impl Default for KindsConfig {
    fn default() -> Self {
        Self {
            dragon: default_dragon(),
            elf: default_elf(),
            knight_errant: default_knight_errant(),
        }
    }
}

/// Fight worker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CombatConfig {
    /// Number of concurrent fight workers draining the queue.
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Longest a worker waits on an empty queue before polling again.
    #[serde(default = "default_idle_wait_ms")]
    pub idle_wait_ms: u64,

    /// How many times a faulting encounter is re-queued (0 = unlimited).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl CombatConfig {
    /// The idle wait as a [`Duration`].
    pub const fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms)
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            idle_wait_ms: default_idle_wait_ms(),
            max_retries: default_max_retries(),
        }
    }
}

/// Simulation boundary configuration.
///
/// A value of 0 for either limit means unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Maximum number of detection ticks (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,

    /// Maximum wall-clock seconds (0 = unlimited).
    #[serde(default = "default_max_real_time_seconds")]
    pub max_real_time_seconds: u64,

    /// Stop once at most one kind is left alive.
    #[serde(default = "default_true")]
    pub stop_when_one_kind_left: bool,
}

impl Default for SimulationBoundsConfig {
    fn default() -> Self {
        Self {
            max_ticks: 0,
            max_real_time_seconds: default_max_real_time_seconds(),
            stop_when_one_kind_left: true,
        }
    }
}

/// Console grid rendering configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RenderConfig {
    /// Whether the engine prints the grid while running.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Cells per side of the rendered board.
    #[serde(default = "default_grid_cells")]
    pub grid_cells: u32,

    /// Milliseconds between two renders.
    #[serde(default = "default_render_interval_ms")]
    pub interval_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            grid_cells: default_grid_cells(),
            interval_ms: default_render_interval_ms(),
        }
    }
}

/// Roster file locations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RosterConfig {
    /// Load the starting roster from this file instead of seeding.
    #[serde(default)]
    pub load_path: Option<PathBuf>,

    /// Write the surviving roster here when the run ends.
    #[serde(default)]
    pub save_path: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

const fn default_seed() -> u64 {
    42
}

const fn default_extent() -> u32 {
    100
}

const fn default_initial_agents() -> u32 {
    50
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

const fn default_dragon() -> KindConfig {
    KindConfig {
        move_distance: 50,
        aggression_range: 30,
    }
}

const fn default_elf() -> KindConfig {
    KindConfig {
        move_distance: 10,
        aggression_range: 50,
    }
}

const fn default_knight_errant() -> KindConfig {
    KindConfig {
        move_distance: 30,
        aggression_range: 10,
    }
}

const fn default_workers() -> u32 {
    1
}

const fn default_idle_wait_ms() -> u64 {
    100
}

const fn default_max_retries() -> u32 {
    16
}

const fn default_max_real_time_seconds() -> u64 {
    30
}

const fn default_grid_cells() -> u32 {
    20
}

const fn default_render_interval_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}
