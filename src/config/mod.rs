//! Configuration module for dicelab.
//!
//! Settings come from `DICELAB_*` environment variables, optionally loaded
//! from a `.env` file. Every variable has a default.

mod optimizer_config;
mod simulation_config;

pub use optimizer_config::{DEFAULT_LARGE_SWEEP, OptimizerEnvConfig};
pub use simulation_config::SimulationEnvConfig;

use crate::application::optimization::OptimizerSettings;
use crate::application::simulation::{AggregatorSettings, ExecutionMode};
use anyhow::{Context, Result};
use std::env;

/// Main application configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub simulation: SimulationEnvConfig,
    pub optimizer: OptimizerEnvConfig,
}

impl Config {
    /// Load configuration from the process environment and `.env`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let simulation =
            SimulationEnvConfig::from_lookup(&lookup).context("Failed to load simulation config")?;
        let optimizer =
            OptimizerEnvConfig::from_lookup(&lookup).context("Failed to load optimizer config")?;

        Ok(Self {
            simulation,
            optimizer,
        })
    }

    pub fn aggregator_settings(&self, mode: ExecutionMode) -> AggregatorSettings {
        AggregatorSettings {
            mode,
            rng: self.simulation.rng,
            headline: self.simulation.headline,
            max_workers: self.optimizer.max_workers,
            limits: self.simulation.trial_limits(),
        }
    }

    pub fn optimizer_settings(&self) -> OptimizerSettings {
        OptimizerSettings {
            max_workers: self.optimizer.max_workers,
            rng: self.simulation.rng,
            headline: self.simulation.headline,
            limits: self.simulation.trial_limits(),
        }
    }
}
