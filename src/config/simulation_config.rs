//! Trial execution settings from environment variables.

use crate::application::simulation::{DEFAULT_ROLL_BATCH, TrialLimits};
use crate::domain::simulation::HeadlineStat;
use crate::infrastructure::rng::RngKind;
use anyhow::{Context, Result};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationEnvConfig {
    pub headline: HeadlineStat,
    pub rng: RngKind,
    pub roll_batch: usize,
    pub max_rounds: Option<u64>,
}

impl Default for SimulationEnvConfig {
    fn default() -> Self {
        Self {
            headline: HeadlineStat::default(),
            rng: RngKind::default(),
            roll_batch: DEFAULT_ROLL_BATCH,
            max_rounds: None,
        }
    }
}

impl SimulationEnvConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let headline = match lookup("DICELAB_HEADLINE_STAT") {
            Some(v) => HeadlineStat::from_str(&v)?,
            None => defaults.headline,
        };
        let rng = match lookup("DICELAB_RNG") {
            Some(v) => RngKind::from_str(&v)?,
            None => defaults.rng,
        };
        let roll_batch = match lookup("DICELAB_ROLL_BATCH") {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .context(format!("Invalid DICELAB_ROLL_BATCH: {}", v))?,
            None => defaults.roll_batch,
        };
        // 0 or empty disables the cap
        let max_rounds = match lookup("DICELAB_MAX_ROUNDS") {
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(
                v.trim()
                    .parse::<u64>()
                    .context(format!("Invalid DICELAB_MAX_ROUNDS: {}", v))?,
            )
            .filter(|&n| n > 0),
            None => defaults.max_rounds,
        };

        Ok(Self {
            headline,
            rng,
            roll_batch,
            max_rounds,
        })
    }

    pub fn trial_limits(&self) -> TrialLimits {
        TrialLimits {
            roll_batch: self.roll_batch,
            max_rounds: self.max_rounds,
        }
    }
}
