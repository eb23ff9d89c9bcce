//! Simulation configuration.
//!
//! [`SimulationConfig`] gathers every tunable the realtime scheduler reads:
//! map bounds, population size, tick cadences, run length, the master seed,
//! the kill log path and the per-kind movement profiles. Configuration files
//! are JSON; every field is optional and falls back to its default.
//!
//! ```
//! use skirmish_core::config::SimulationConfig;
//!
//! let config: SimulationConfig =
//!     serde_json::from_str(r#"{ "seed": 7, "map": { "width": 40 } }"#).unwrap();
//!
//! assert_eq!(config.seed, Some(7));
//! assert_eq!(config.map.width, 40);
//! assert_eq!(config.map.height, 100);
//! assert_eq!(config.initial_entities, 50);
//! assert!(config.validate().is_ok());
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityKind, KindProfiles};
use crate::error::ConfigError;

// =============================================================================
// MapConfig
// =============================================================================

/// Map bounds and render grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Largest x coordinate an entity can move to.
    pub width: i32,
    /// Largest y coordinate an entity can move to.
    pub height: i32,
    /// Render grid cells per axis.
    pub grid_size: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            grid_size: 20,
        }
    }
}

// =============================================================================
// SimulationConfig
// =============================================================================

/// Complete configuration for a realtime run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Map bounds and render grid.
    pub map: MapConfig,
    /// Entities created when populating a fresh arena.
    pub initial_entities: usize,
    /// Mover cadence in milliseconds.
    pub move_tick_ms: u64,
    /// Reporter cadence in milliseconds. Never finer than the mover.
    pub report_tick_ms: u64,
    /// Length of a timed run in seconds.
    pub duration_secs: u64,
    /// Master seed. Each task derives its own stream from it; `None` seeds
    /// from OS entropy.
    pub seed: Option<u64>,
    /// Where kills are appended. `None` disables the kill log.
    pub kill_log: Option<PathBuf>,
    /// Movement and reach per kind.
    pub profiles: KindProfiles,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            map: MapConfig::default(),
            initial_entities: 50,
            move_tick_ms: 10,
            report_tick_ms: 1000,
            duration_secs: 30,
            seed: None,
            kill_log: Some(PathBuf::from("log.txt")),
            profiles: KindProfiles::default(),
        }
    }
}

impl SimulationConfig {
    /// Reads and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Parse`]
    /// if it is not valid JSON for this type, [`ConfigError::Invalid`] if
    /// [`validate`](Self::validate) rejects it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the scheduling and map constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Map must have room to move in.
        if self.map.width <= 0 || self.map.height <= 0 {
            return Err(ConfigError::Invalid(format!(
                "map must be positive, got {}x{}",
                self.map.width, self.map.height
            )));
        }
        // 2. Grid needs at least one cell.
        if self.map.grid_size == 0 {
            return Err(ConfigError::Invalid("grid_size must be at least 1".into()));
        }
        // 3. Mover must tick.
        if self.move_tick_ms == 0 {
            return Err(ConfigError::Invalid("move_tick_ms must be at least 1".into()));
        }
        // 4. Reporting is never finer than moving.
        if self.move_tick_ms > self.report_tick_ms {
            return Err(ConfigError::Invalid(format!(
                "move_tick_ms ({}) exceeds report_tick_ms ({})",
                self.move_tick_ms, self.report_tick_ms
            )));
        }
        // 5. Steps are magnitudes.
        for kind in EntityKind::ALL {
            let step = self.profiles.get(kind).step;
            if step < 0 {
                return Err(ConfigError::Invalid(format!(
                    "{kind} step must not be negative, got {step}"
                )));
            }
        }
        Ok(())
    }

    /// Mover cadence.
    #[must_use]
    pub fn move_tick(&self) -> Duration {
        Duration::from_millis(self.move_tick_ms)
    }

    /// Reporter cadence.
    #[must_use]
    pub fn report_tick(&self) -> Duration {
        Duration::from_millis(self.report_tick_ms)
    }

    /// Length of a timed run.
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}

// =============================================================================
// Tests
// =============================================================================
