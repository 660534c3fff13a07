use crate::domain::errors::SimulationError;
use crate::domain::optimization::params::Combo;
use crate::domain::simulation::{AggregateStats, SimParams};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One ranked row of an optimizer sweep.
///
/// Parameters are echoed in percent space and rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboResult {
    pub bet_div: f64,
    pub profit_mult: f64,
    pub win_increase_pct: f64,
    pub loss_reset: u32,
    pub buffer_pct: f64,
    pub avg_high: f64,
    pub std_high: f64,
    pub max_high: f64,
    pub avg_cycles: f64,
    pub avg_rounds: f64,
    pub cycle_success_rate: f64,
    pub bust_rate: f64,
    pub score: f64,
    /// Set on sentinel rows produced by a failed worker
    #[serde(default)]
    pub failed: bool,
}

impl ComboResult {
    pub fn from_stats(combo: &Combo, stats: &AggregateStats, starting_balance: f64) -> Self {
        let params = combo.sim_params(starting_balance, stats.trials);

        Self {
            bet_div: round2(combo.bet_div),
            profit_mult: round2(combo.profit_mult),
            win_increase_pct: round2(params.w * 100.0),
            loss_reset: combo.loss_reset,
            buffer_pct: round2((params.buffer - 1.0) * 100.0),
            avg_high: stats.avg_high,
            std_high: stats.std_high,
            max_high: stats.max_high,
            avg_cycles: stats.avg_cycles,
            avg_rounds: stats.avg_rounds,
            cycle_success_rate: stats.cycle_success_rate,
            bust_rate: stats.bust_rate,
            score: risk_adjusted_score(stats.avg_high, stats.std_high, starting_balance),
            failed: false,
        }
    }

    /// Sentinel row: full bust rate, every other metric zeroed.
    pub fn failed(combo: &Combo) -> Self {
        Self {
            bet_div: round2(combo.bet_div),
            profit_mult: round2(combo.profit_mult),
            win_increase_pct: round2(combo.win_increase_pct),
            loss_reset: combo.loss_reset,
            buffer_pct: round2(combo.buffer_pct),
            avg_high: 0.0,
            std_high: 0.0,
            max_high: 0.0,
            avg_cycles: 0.0,
            avg_rounds: 0.0,
            cycle_success_rate: 0.0,
            bust_rate: 100.0,
            score: 0.0,
            failed: true,
        }
    }

    /// Parameters of this row, ready for a follow-up simulation.
    pub fn to_sim_params(
        &self,
        starting_balance: f64,
        n_trials: usize,
    ) -> Result<SimParams, SimulationError> {
        SimParams::from_percentages(
            starting_balance,
            self.bet_div,
            self.profit_mult,
            self.win_increase_pct,
            self.loss_reset,
            self.buffer_pct,
            n_trials,
        )
    }
}

/// `(avg_high - starting_balance) / std_high`, or 0 when there is no spread.
pub fn risk_adjusted_score(avg_high: f64, std_high: f64, starting_balance: f64) -> f64 {
    if std_high != 0.0 {
        (avg_high - starting_balance) / std_high
    } else {
        0.0
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Columns of the tabular export, in export order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultColumn {
    BetDiv,
    ProfitMult,
    WinIncreasePct,
    LossReset,
    BufferPct,
    AvgHigh,
    StdDev,
    MaxHigh,
    AvgCycles,
    AvgRounds,
    CycleSuccessPct,
    BustPct,
    Score,
}

impl ResultColumn {
    pub const ALL: [ResultColumn; 13] = [
        ResultColumn::BetDiv,
        ResultColumn::ProfitMult,
        ResultColumn::WinIncreasePct,
        ResultColumn::LossReset,
        ResultColumn::BufferPct,
        ResultColumn::AvgHigh,
        ResultColumn::StdDev,
        ResultColumn::MaxHigh,
        ResultColumn::AvgCycles,
        ResultColumn::AvgRounds,
        ResultColumn::CycleSuccessPct,
        ResultColumn::BustPct,
        ResultColumn::Score,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            ResultColumn::BetDiv => "BetDiv",
            ResultColumn::ProfitMult => "ProfitMult",
            ResultColumn::WinIncreasePct => "W%",
            ResultColumn::LossReset => "L",
            ResultColumn::BufferPct => "Buffer%",
            ResultColumn::AvgHigh => "AvgHigh",
            ResultColumn::StdDev => "StdDev",
            ResultColumn::MaxHigh => "MaxHigh",
            ResultColumn::AvgCycles => "AvgCycles",
            ResultColumn::AvgRounds => "AvgRounds",
            ResultColumn::CycleSuccessPct => "CycleSuccess%",
            ResultColumn::BustPct => "Bust%",
            ResultColumn::Score => "Score",
        }
    }

    /// Looks a column up by its export header (case-insensitive).
    pub fn from_header(header: &str) -> Option<Self> {
        let wanted = header.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.header().eq_ignore_ascii_case(wanted))
    }

    pub fn value(&self, row: &ComboResult) -> f64 {
        match self {
            ResultColumn::BetDiv => row.bet_div,
            ResultColumn::ProfitMult => row.profit_mult,
            ResultColumn::WinIncreasePct => row.win_increase_pct,
            ResultColumn::LossReset => f64::from(row.loss_reset),
            ResultColumn::BufferPct => row.buffer_pct,
            ResultColumn::AvgHigh => row.avg_high,
            ResultColumn::StdDev => row.std_high,
            ResultColumn::MaxHigh => row.max_high,
            ResultColumn::AvgCycles => row.avg_cycles,
            ResultColumn::AvgRounds => row.avg_rounds,
            ResultColumn::CycleSuccessPct => row.cycle_success_rate,
            ResultColumn::BustPct => row.bust_rate,
            ResultColumn::Score => row.score,
        }
    }
}

/// Stable sort of a result table by one column. NaN sorts as equal.
pub fn sort_by_column(rows: &mut [ComboResult], column: ResultColumn, descending: bool) {
    rows.sort_by(|a, b| {
        let ord = column
            .value(a)
            .partial_cmp(&column.value(b))
            .unwrap_or(Ordering::Equal);
        if descending { ord.reverse() } else { ord }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combo() -> Combo {
        Combo {
            bet_div: 256.0,
            profit_mult: 50.0,
            win_increase_pct: 100.0,
            loss_reset: 4,
            buffer_pct: 30.0,
        }
    }

    fn stats(avg_high: f64, std_high: f64) -> AggregateStats {
        AggregateStats {
            avg_high,
            std_high,
            max_high: avg_high * 2.0,
            avg_cycles: 1.5,
            avg_rounds: 420.0,
            cycle_success_rate: 60.0,
            bust_rate: 30.0,
            trials: 10,
        }
    }

    #[test]
    fn test_score_calculation() {
        let row = ComboResult::from_stats(&combo(), &stats(30.0, 5.0), 20.0);
        assert!((row.score - 2.0).abs() < 1e-12);
        assert!(!row.failed);
    }

    #[test]
    fn test_zero_spread_scores_zero() {
        let row = ComboResult::from_stats(&combo(), &stats(30.0, 0.0), 20.0);
        assert_eq!(row.score, 0.0);
    }

    #[test]
    fn test_echoed_parameters_match_input() {
        let row = ComboResult::from_stats(&combo(), &stats(30.0, 5.0), 20.0);
        assert_eq!(row.bet_div, 256.0);
        assert_eq!(row.profit_mult, 50.0);
        assert_eq!(row.win_increase_pct, 100.0);
        assert_eq!(row.loss_reset, 4);
        assert_eq!(row.buffer_pct, 30.0);
    }

    #[test]
    fn test_failed_row_is_degraded() {
        let row = ComboResult::failed(&combo());
        assert!(row.failed);
        assert_eq!(row.bust_rate, 100.0);
        assert_eq!(row.avg_high, 0.0);
        assert_eq!(row.score, 0.0);
    }

    #[test]
    fn test_row_applies_back_to_sim_params() {
        let row = ComboResult::from_stats(&combo(), &stats(30.0, 5.0), 20.0);
        let params = row.to_sim_params(20.0, 100).unwrap();
        assert!((params.w - 1.0).abs() < 1e-12);
        assert!((params.buffer - 1.3).abs() < 1e-12);
        assert_eq!(params.l, 4);
        assert_eq!(params.n_trials, 100);
    }

    #[test]
    fn test_sort_by_column() {
        let mut rows = vec![
            ComboResult::from_stats(&combo(), &stats(30.0, 5.0), 20.0),
            ComboResult::from_stats(&combo(), &stats(60.0, 5.0), 20.0),
            ComboResult::from_stats(&combo(), &stats(45.0, 5.0), 20.0),
        ];

        sort_by_column(&mut rows, ResultColumn::AvgHigh, false);
        let highs: Vec<f64> = rows.iter().map(|r| r.avg_high).collect();
        assert_eq!(highs, vec![30.0, 45.0, 60.0]);

        sort_by_column(&mut rows, ResultColumn::Score, true);
        assert_eq!(rows[0].avg_high, 60.0);
    }

    #[test]
    fn test_column_lookup_by_header() {
        assert_eq!(ResultColumn::from_header("bust%"), Some(ResultColumn::BustPct));
        assert_eq!(ResultColumn::from_header("W%"), Some(ResultColumn::WinIncreasePct));
        assert_eq!(ResultColumn::from_header("Sharpe"), None);
        assert_eq!(ResultColumn::ALL[0].header(), "BetDiv");
        assert_eq!(ResultColumn::ALL[12].header(), "Score");
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(25.000000000000004), 25.0);
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(1.236), 1.24);
    }
}
