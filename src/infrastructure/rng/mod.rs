//! Roll generators behind [`RollSource`].

pub mod fast;
pub mod provably_fair;

pub use fast::FastRng;
pub use provably_fair::{ProvablyFairRng, roll_from_bytes};

use crate::domain::errors::SimulationError;
use crate::domain::ports::RollSource;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which generator a trial draws its rolls from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RngKind {
    #[default]
    ProvablyFair,
    Fast,
}

impl RngKind {
    /// Freshly seeded generator of this kind.
    pub fn fresh(self) -> Result<Box<dyn RollSource + Send>, SimulationError> {
        let source: Box<dyn RollSource + Send> = match self {
            RngKind::ProvablyFair => Box::new(ProvablyFairRng::from_entropy()?),
            RngKind::Fast => Box::new(FastRng::from_entropy()?),
        };
        Ok(source)
    }
}

impl FromStr for RngKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "provably_fair" | "provably-fair" | "hmac" => Ok(RngKind::ProvablyFair),
            "fast" => Ok(RngKind::Fast),
            _ => anyhow::bail!("Invalid RNG kind: {}. Must be 'provably_fair' or 'fast'", s),
        }
    }
}

impl fmt::Display for RngKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RngKind::ProvablyFair => write!(f, "provably_fair"),
            RngKind::Fast => write!(f, "fast"),
        }
    }
}
