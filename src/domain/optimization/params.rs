use crate::domain::errors::SimulationError;
use crate::domain::simulation::SimParams;
use crate::domain::simulation::params::require_positive;
use serde::{Deserialize, Serialize};

/// Explicit value lists swept by the optimizer.
///
/// `win_increase_pct` and `buffer_pct` are percentages, as typed by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterGrid {
    pub bet_div: Vec<f64>,
    pub profit_mult: Vec<f64>,
    pub win_increase_pct: Vec<f64>,
    pub loss_reset: Vec<u32>,
    pub buffer_pct: Vec<f64>,
}

impl Default for ParameterGrid {
    fn default() -> Self {
        Self {
            bet_div: vec![256.0, 500.0],
            profit_mult: vec![50.0, 100.0],
            win_increase_pct: vec![50.0, 100.0],
            loss_reset: vec![3, 4, 5],
            buffer_pct: vec![25.0, 30.0, 40.0],
        }
    }
}

impl ParameterGrid {
    pub fn combo_count(&self) -> usize {
        self.bet_div.len()
            * self.profit_mult.len()
            * self.win_increase_pct.len()
            * self.loss_reset.len()
            * self.buffer_pct.len()
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        let dimensions = [
            ("bet_div", self.bet_div.is_empty()),
            ("profit_mult", self.profit_mult.is_empty()),
            ("win_increase_pct", self.win_increase_pct.is_empty()),
            ("loss_reset", self.loss_reset.is_empty()),
            ("buffer_pct", self.buffer_pct.is_empty()),
        ];
        if let Some((name, _)) = dimensions.iter().find(|(_, empty)| *empty) {
            return Err(SimulationError::invalid(format!("{name} range is empty")));
        }

        for &v in &self.bet_div {
            require_positive("bet_div", v)?;
        }
        for &v in &self.profit_mult {
            require_positive("profit_mult", v)?;
        }
        for &v in self.win_increase_pct.iter().chain(&self.buffer_pct) {
            if !v.is_finite() || v < 0.0 {
                return Err(SimulationError::invalid(format!(
                    "percentages must be finite and >= 0, got {v}"
                )));
            }
        }
        if self.loss_reset.contains(&0) {
            return Err(SimulationError::invalid("loss_reset values must be at least 1"));
        }
        Ok(())
    }

    /// Cartesian product in bet_div, profit_mult, W%, L, Buffer% order.
    pub fn combinations(&self) -> Vec<Combo> {
        let mut combos = Vec::with_capacity(self.combo_count());

        for &bet_div in &self.bet_div {
            for &profit_mult in &self.profit_mult {
                for &win_increase_pct in &self.win_increase_pct {
                    for &loss_reset in &self.loss_reset {
                        for &buffer_pct in &self.buffer_pct {
                            combos.push(Combo {
                                bet_div,
                                profit_mult,
                                win_increase_pct,
                                loss_reset,
                                buffer_pct,
                            });
                        }
                    }
                }
            }
        }

        combos
    }
}

/// One concrete point of the grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Combo {
    pub bet_div: f64,
    pub profit_mult: f64,
    pub win_increase_pct: f64,
    pub loss_reset: u32,
    pub buffer_pct: f64,
}

impl Combo {
    pub fn sim_params(&self, starting_balance: f64, n_trials: usize) -> SimParams {
        SimParams {
            starting_balance,
            bet_div: self.bet_div,
            profit_mult: self.profit_mult,
            w: self.win_increase_pct / 100.0,
            l: self.loss_reset,
            buffer: 1.0 + self.buffer_pct / 100.0,
            n_trials,
        }
    }
}

/// Input to one optimizer run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptParams {
    pub starting_balance: f64,
    pub trials_per_combo: usize,
    pub grid: ParameterGrid,
}

impl OptParams {
    pub fn validate(&self) -> Result<(), SimulationError> {
        require_positive("starting_balance", self.starting_balance)?;
        if self.trials_per_combo == 0 {
            return Err(SimulationError::invalid("trials_per_combo must be at least 1"));
        }
        self.grid.validate()
    }
}
