//! Tunable simulation parameters.
//!
//! Every struct implements [`Default`] and deserializes with
//! `#[serde(default)]`, so a JSON document only needs the fields it wants to
//! override:
//!
//! ```
//! use colonysim_logic::config::SimulationConfig;
//!
//! let config = SimulationConfig::from_json(r#"{ "seed": 7, "eva": { "min_sunlight": 5.0 } }"#).unwrap();
//! assert_eq!(config.seed, 7);
//! assert_eq!(config.eva.min_sunlight, 5.0);
//! assert_eq!(config.scheduler.task_cache_interval, 10.0);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::maintenance::MaintenanceWeights;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for the engine's single RNG.
    pub seed: u64,
    pub scheduler: SchedulerConfig,
    pub eva: EvaConfig,
    pub maintenance: MaintenanceConfig,
    pub skills: SkillConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            scheduler: SchedulerConfig::default(),
            eva: EvaConfig::default(),
            maintenance: MaintenanceConfig::default(),
            skills: SkillConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Parse a (possibly partial) JSON document over the defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.task_cache_interval < 0.0 {
            return Err(ConfigError::Invalid {
                field: "scheduler.task_cache_interval",
                reason: "must not be negative".into(),
            });
        }
        if self.eva.min_sunlight < 0.0 {
            return Err(ConfigError::Invalid {
                field: "eva.min_sunlight",
                reason: "must not be negative".into(),
            });
        }
        if self.eva.site_duration <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "eva.site_duration",
                reason: "must be positive".into(),
            });
        }
        if self.skills.base_level_points <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "skills.base_level_points",
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}

/// Task cache and activity bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Millisols a worker's candidate cache stays valid.
    pub task_cache_interval: f64,
    /// Millisols a settlement's candidate cache stays valid.
    pub settlement_cache_interval: f64,
    /// Activity records kept per worker.
    pub activity_log_len: usize,
    /// Maximum queued pending tasks per worker.
    pub max_pending_tasks: usize,
    /// Upper bound on phase steps within one tick.
    pub max_phase_steps: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            task_cache_interval: 10.0,
            settlement_cache_interval: 50.0,
            activity_log_len: 64,
            max_pending_tasks: 8,
            max_phase_steps: 32,
        }
    }
}

/// EVA gating and pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaConfig {
    /// Minimum solar irradiance (W/m²) for outside work.
    pub min_sunlight: f64,
    /// Millisols spent cycling through an airlock.
    pub airlock_cycle_time: f64,
    /// Base suit accident chance in percent per millisol.
    pub base_accident_chance: f64,
    /// Millisols a worker stays on site before heading back.
    pub site_duration: f64,
    /// Minimum suit oxygen fraction.
    pub min_oxygen_fraction: f64,
    /// Below this performance rating a worker is unfit for EVA.
    pub min_performance: f64,
}

impl Default for EvaConfig {
    fn default() -> Self {
        Self {
            // 1% of the ~590 W/m² peak at the top of the atmosphere
            min_sunlight: 5.9,
            airlock_cycle_time: 10.0,
            base_accident_chance: 0.01,
            site_duration: 250.0,
            min_oxygen_fraction: 0.2,
            min_performance: 0.05,
        }
    }
}

/// Maintenance scoring and wear.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    pub weights: MaintenanceWeights,
    /// Base accident chance during maintenance, percent per millisol.
    pub base_accident_chance: f64,
    /// Wear life restored per millisol of maintenance work.
    pub wear_life_per_work: f64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            weights: MaintenanceWeights::default(),
            base_accident_chance: 0.001,
            wear_life_per_work: 2.0,
        }
    }
}

/// Skill progression.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillConfig {
    /// Points to go from level 0 to 1. Doubles each level.
    pub base_level_points: f64,
    /// Diminishing-returns rate per level.
    pub diminishing_per_level: f64,
    pub max_level: u32,
}

impl Default for SkillConfig {
    fn default() -> Self {
        Self {
            base_level_points: 25.0,
            diminishing_per_level: 0.1,
            max_level: 20,
        }
    }
}
