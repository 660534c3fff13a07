use crate::domain::errors::SimulationError;
use serde::{Deserialize, Serialize};

/// Fraction of every wager kept by the house
pub const HOUSE_EDGE: f64 = 0.01;

/// Parameters for one simulation run.
///
/// `w` and `buffer` are stored as factors, not percentages: a 78% win
/// increase is `w = 0.78` and a 25% buffer is `buffer = 1.25`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    pub starting_balance: f64,
    pub bet_div: f64,
    pub profit_mult: f64,
    pub w: f64,
    pub l: u32,
    pub buffer: f64,
    pub n_trials: usize,
}

impl SimParams {
    /// Builds validated parameters from raw factors.
    pub fn new(
        starting_balance: f64,
        bet_div: f64,
        profit_mult: f64,
        w: f64,
        l: u32,
        buffer: f64,
        n_trials: usize,
    ) -> Result<Self, SimulationError> {
        let params = Self {
            starting_balance,
            bet_div,
            profit_mult,
            w,
            l,
            buffer,
            n_trials,
        };
        params.validate()?;
        Ok(params)
    }

    /// Builds validated parameters from the percent inputs a user types
    /// (`W% = 78`, `Buffer% = 25`).
    pub fn from_percentages(
        starting_balance: f64,
        bet_div: f64,
        profit_mult: f64,
        win_increase_pct: f64,
        l: u32,
        buffer_pct: f64,
        n_trials: usize,
    ) -> Result<Self, SimulationError> {
        Self::new(
            starting_balance,
            bet_div,
            profit_mult,
            win_increase_pct / 100.0,
            l,
            1.0 + buffer_pct / 100.0,
            n_trials,
        )
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        require_positive("starting_balance", self.starting_balance)?;
        require_positive("bet_div", self.bet_div)?;
        require_positive("profit_mult", self.profit_mult)?;
        if !self.w.is_finite() || self.w < 0.0 {
            return Err(SimulationError::invalid(format!(
                "w must be a finite fraction >= 0, got {}",
                self.w
            )));
        }
        if self.l == 0 {
            return Err(SimulationError::invalid("l must be at least 1"));
        }
        if !self.buffer.is_finite() || self.buffer < 1.0 {
            return Err(SimulationError::invalid(format!(
                "buffer must be a finite factor >= 1, got {}",
                self.buffer
            )));
        }
        if self.n_trials == 0 {
            return Err(SimulationError::invalid("n_trials must be at least 1"));
        }
        Ok(())
    }

    pub fn win_increase_pct(&self) -> f64 {
        self.w * 100.0
    }

    pub fn buffer_pct(&self) -> f64 {
        (self.buffer - 1.0) * 100.0
    }
}

pub(crate) fn require_positive(name: &str, value: f64) -> Result<(), SimulationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimulationError::invalid(format!(
            "{name} must be a positive number, got {value}"
        )))
    }
}
