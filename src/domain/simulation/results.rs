use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a single trial came to an end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialOutcome {
    /// Balance reached zero inside a cycle
    Busted,
    /// The configured round cap was reached first
    RoundLimit,
    /// Balance too large to grow further: non-finite after a completed cycle,
    /// or so large that the next cycle's target rounds back to it
    Saturated,
    /// Worker failed; the row carries no simulation data
    Failed,
}

/// Summary of one playthrough
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub highest_balance: f64,
    pub cycles: u64,
    pub rounds: u64,
    pub outcome: TrialOutcome,
}

impl TrialResult {
    /// Degraded row used when a trial worker fails.
    pub fn failed() -> Self {
        Self {
            highest_balance: 0.0,
            cycles: 0,
            rounds: 0,
            outcome: TrialOutcome::Failed,
        }
    }
}

/// Which central value `avg_high` reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HeadlineStat {
    Mean,
    #[default]
    Median,
}

impl FromStr for HeadlineStat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mean" => Ok(HeadlineStat::Mean),
            "median" => Ok(HeadlineStat::Median),
            _ => anyhow::bail!("Invalid headline stat: {}. Must be 'mean' or 'median'", s),
        }
    }
}

impl fmt::Display for HeadlineStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeadlineStat::Mean => write!(f, "mean"),
            HeadlineStat::Median => write!(f, "median"),
        }
    }
}

/// Descriptive statistics over a batch of trials.
///
/// Rates are percentages in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregateStats {
    pub avg_high: f64,
    pub std_high: f64,
    pub max_high: f64,
    pub avg_cycles: f64,
    pub avg_rounds: f64,
    pub cycle_success_rate: f64,
    pub bust_rate: f64,
    /// Number of trials the statistics were computed from
    pub trials: usize,
}
