use crate::domain::simulation::params::{HOUSE_EDGE, SimParams};
use serde::Serialize;

/// Values derived at the start of every cycle from the balance on hand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CyclePlan {
    /// Effective payout multiplier `m`
    pub multiplier: f64,
    pub bet: f64,
    pub profit_stop: f64,
    pub target: f64,
    pub win_chance: f64,
}

impl CyclePlan {
    pub fn derive(balance: f64, params: &SimParams) -> Self {
        let multiplier = Self::effective_multiplier(params);
        let bet = balance / params.bet_div;
        let profit_stop = bet * params.profit_mult;

        Self {
            multiplier,
            bet,
            profit_stop,
            target: balance + profit_stop,
            win_chance: Self::win_chance_for(multiplier),
        }
    }

    /// `(1 + w) * l * buffer`
    pub fn effective_multiplier(params: &SimParams) -> f64 {
        (1.0 + params.w) * f64::from(params.l) * params.buffer
    }

    pub fn win_chance_for(multiplier: f64) -> f64 {
        if multiplier == 0.0 {
            return 0.0;
        }
        ((1.0 - HOUSE_EDGE) / multiplier).clamp(0.0, 1.0)
    }

    /// Rolls strictly below this value win.
    pub fn win_threshold(&self) -> f64 {
        self.win_chance * 100.0
    }

    pub fn is_win(&self, roll: f64) -> bool {
        roll < self.win_threshold()
    }

    /// Net balance change of a winning roll at `stake`
    pub fn win_payout(&self, stake: f64) -> f64 {
        stake * (self.multiplier - 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(w: f64, l: u32, buffer: f64) -> SimParams {
        SimParams {
            starting_balance: 20.0,
            bet_div: 500.0,
            profit_mult: 100.0,
            w,
            l,
            buffer,
            n_trials: 1,
        }
    }

    #[test]
    fn test_plan_matches_calculator_values() {
        let plan = CyclePlan::derive(20.0, &params(0.78, 5, 1.25));

        // m = 1.78 * 5 * 1.25
        assert!((plan.multiplier - 11.125).abs() < 1e-9);
        assert!((plan.bet - 0.04).abs() < 1e-12);
        assert!((plan.profit_stop - 4.0).abs() < 1e-9);
        assert!((plan.target - 24.0).abs() < 1e-9);
        assert!((plan.win_chance - 0.99 / 11.125).abs() < 1e-12);
    }

    #[test]
    fn test_zero_multiplier_never_wins() {
        let plan = CyclePlan::derive(20.0, &params(0.5, 3, 0.0));
        assert_eq!(plan.multiplier, 0.0);
        assert_eq!(plan.win_chance, 0.0);
        assert!(!plan.is_win(0.0));
    }

    #[test]
    fn test_win_chance_is_clamped() {
        // m < 0.99 would otherwise push the chance above 1
        assert_eq!(CyclePlan::win_chance_for(0.5), 1.0);
        assert_eq!(CyclePlan::win_chance_for(-2.0), 0.0);
    }

    #[test]
    fn test_win_region_is_strict() {
        let plan = CyclePlan::derive(100.0, &params(0.0, 2, 1.0));
        assert!((plan.win_threshold() - 49.5).abs() < 1e-9);
        assert!(plan.is_win(49.49));
        assert!(!plan.is_win(49.5));
    }
}
