//! Optimizer settings from environment variables.

use crate::application::simulation::DEFAULT_MAX_WORKERS;
use anyhow::{Context, Result};

/// Sweeps with more combinations than this ask for confirmation
pub const DEFAULT_LARGE_SWEEP: usize = 50_000;

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerEnvConfig {
    pub max_workers: usize,
    pub large_sweep_threshold: usize,
    pub output_dir: String,
}

impl Default for OptimizerEnvConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            large_sweep_threshold: DEFAULT_LARGE_SWEEP,
            output_dir: ".".to_string(),
        }
    }
}

impl OptimizerEnvConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let max_workers = match lookup("DICELAB_MAX_WORKERS") {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .context(format!("Invalid DICELAB_MAX_WORKERS: {}", v))?,
            None => defaults.max_workers,
        };
        let large_sweep_threshold = match lookup("DICELAB_LARGE_SWEEP") {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .context(format!("Invalid DICELAB_LARGE_SWEEP: {}", v))?,
            None => defaults.large_sweep_threshold,
        };
        let output_dir = lookup("DICELAB_OUTPUT_DIR").unwrap_or(defaults.output_dir);

        Ok(Self {
            max_workers,
            large_sweep_threshold,
            output_dir,
        })
    }
}
