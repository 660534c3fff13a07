use crate::application::simulation::trial_runner::{TrialLimits, TrialRunner};
use crate::domain::errors::SimulationError;
use crate::domain::simulation::{AggregateStats, CancelToken, HeadlineStat, SimParams, TrialResult};
use crate::infrastructure::rng::RngKind;
use crate::infrastructure::worker_pool::{run_bounded, worker_count};
use statrs::statistics::{Data, Distribution, Median};
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_WORKERS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    Sequential,
    #[default]
    Parallel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatorSettings {
    pub mode: ExecutionMode,
    pub rng: RngKind,
    pub headline: HeadlineStat,
    pub max_workers: usize,
    pub limits: TrialLimits,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::default(),
            rng: RngKind::default(),
            headline: HeadlineStat::default(),
            max_workers: DEFAULT_MAX_WORKERS,
            limits: TrialLimits::default(),
        }
    }
}

/// Runs batches of independent trials and reduces them to [`AggregateStats`].
pub struct TrialAggregator {
    settings: AggregatorSettings,
}

impl TrialAggregator {
    pub fn new(settings: AggregatorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AggregatorSettings {
        &self.settings
    }

    /// Runs `params.n_trials` trials, each with its own fresh seeds.
    ///
    /// `on_progress(done, total)` is called on the calling thread after
    /// every finished trial. A cancelled run returns the trials finished so
    /// far. A trial whose generator or worker fails is kept as a degraded
    /// [`TrialResult::failed`] row.
    pub fn run_many<P>(
        &self,
        params: &SimParams,
        cancel: &CancelToken,
        mut on_progress: P,
    ) -> Result<Vec<TrialResult>, SimulationError>
    where
        P: FnMut(usize, usize),
    {
        params.validate()?;
        let total = params.n_trials;
        let mut results = Vec::with_capacity(total);

        let parallel = self.settings.mode == ExecutionMode::Parallel && total > 1;
        if !parallel {
            for _ in 0..total {
                if cancel.is_cancelled() {
                    break;
                }
                results.push(guarded_trial(params, self.settings.rng, self.settings.limits));
                on_progress(results.len(), total);
            }
        } else {
            let workers = worker_count(self.settings.max_workers, total);
            let (params, rng, limits) = (*params, self.settings.rng, self.settings.limits);

            run_bounded(
                "trial",
                (0..total).collect(),
                workers,
                cancel,
                move |_| guarded_trial(&params, rng, limits),
                |_, outcome| {
                    results.push(outcome.unwrap_or_else(|_| TrialResult::failed()));
                    on_progress(results.len(), total);
                },
            )?;
        }

        if results.len() < total {
            info!("Trials cancelled after {}/{}", results.len(), total);
        }
        Ok(results)
    }

    /// [`run_many`](Self::run_many) followed by [`aggregate`] with the
    /// configured headline statistic.
    pub fn run_and_aggregate(
        &self,
        params: &SimParams,
        cancel: &CancelToken,
    ) -> Result<AggregateStats, SimulationError> {
        let results = self.run_many(params, cancel, |_, _| {})?;
        Ok(aggregate(&results, self.settings.headline))
    }
}

/// Runs `params.n_trials` trials with default settings and the given mode.
pub fn run_many_trials<P>(
    params: &SimParams,
    mode: ExecutionMode,
    cancel: &CancelToken,
    on_progress: P,
) -> Result<Vec<TrialResult>, SimulationError>
where
    P: FnMut(usize, usize),
{
    TrialAggregator::new(AggregatorSettings {
        mode,
        ..AggregatorSettings::default()
    })
    .run_many(params, cancel, on_progress)
}

fn guarded_trial(params: &SimParams, rng: RngKind, limits: TrialLimits) -> TrialResult {
    let mut rolls = match rng.fresh() {
        Ok(rolls) => rolls,
        Err(e) => {
            warn!("Trial skipped: {}", e);
            return TrialResult::failed();
        }
    };

    let runner = TrialRunner::new(*params).with_limits(limits);
    match catch_unwind(AssertUnwindSafe(|| runner.run(&mut rolls))) {
        Ok(result) => result,
        Err(_) => {
            warn!("Trial panicked, recording as failed");
            TrialResult::failed()
        }
    }
}

/// Reduces trial results to descriptive statistics.
///
/// `avg_high` is the mean or median of the per-trial peaks. Spread is the
/// sample standard deviation and is 0 below two trials. Empty input
/// yields all zeros.
pub fn aggregate(results: &[TrialResult], headline: HeadlineStat) -> AggregateStats {
    if results.is_empty() {
        return AggregateStats::default();
    }

    let n = results.len();
    let highs: Vec<f64> = results.iter().map(|r| r.highest_balance).collect();
    let max_high = highs.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let highs = Data::new(highs);
    let avg_high = match headline {
        HeadlineStat::Mean => highs.mean().unwrap_or(0.0),
        HeadlineStat::Median => highs.median(),
    };
    let std_high = if n > 1 {
        highs.std_dev().unwrap_or(0.0)
    } else {
        0.0
    };

    let cycles = Data::new(results.iter().map(|r| r.cycles as f64).collect::<Vec<_>>());
    let rounds = Data::new(results.iter().map(|r| r.rounds as f64).collect::<Vec<_>>());

    let successes: u64 = results.iter().map(|r| r.cycles).sum();
    let attempts = successes as f64 + n as f64;
    let busts = results.iter().filter(|r| r.cycles == 0).count();

    let stats = AggregateStats {
        avg_high,
        std_high,
        max_high,
        avg_cycles: cycles.mean().unwrap_or(0.0),
        avg_rounds: rounds.mean().unwrap_or(0.0),
        cycle_success_rate: 100.0 * successes as f64 / attempts,
        bust_rate: 100.0 * busts as f64 / n as f64,
        trials: n,
    };
    debug!(
        "Aggregated {} trials: {}={:.4}, std={:.4}, bust={:.1}%",
        n, headline, stats.avg_high, stats.std_high, stats.bust_rate
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::simulation::TrialOutcome;

    fn trial(highest_balance: f64, cycles: u64, rounds: u64) -> TrialResult {
        TrialResult {
            highest_balance,
            cycles,
            rounds,
            outcome: TrialOutcome::Busted,
        }
    }

    fn quick_params(n_trials: usize) -> SimParams {
        SimParams::new(20.0, 4.0, 1.0, 0.0, 2, 1.0, n_trials).unwrap()
    }

    #[test]
    fn test_aggregate_known_values() {
        let results = [trial(10.0, 0, 5), trial(20.0, 2, 15), trial(30.0, 1, 10)];

        let stats = aggregate(&results, HeadlineStat::Mean);
        assert!((stats.avg_high - 20.0).abs() < 1e-9);
        assert!((stats.std_high - 10.0).abs() < 1e-9);
        assert_eq!(stats.max_high, 30.0);
        assert!((stats.avg_cycles - 1.0).abs() < 1e-9);
        assert!((stats.avg_rounds - 10.0).abs() < 1e-9);
        // 3 successes out of 3 + 3 attempts
        assert!((stats.cycle_success_rate - 50.0).abs() < 1e-9);
        assert!((stats.bust_rate - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.trials, 3);
    }

    #[test]
    fn test_median_headline_ignores_outlier() {
        let results = [trial(10.0, 1, 1), trial(12.0, 1, 1), trial(1_000.0, 1, 1)];

        let stats = aggregate(&results, HeadlineStat::Median);
        assert!((stats.avg_high - 12.0).abs() < 1e-9);
        assert_eq!(stats.max_high, 1_000.0);
    }

    #[test]
    fn test_single_trial_has_no_spread() {
        let stats = aggregate(&[trial(42.0, 3, 99)], HeadlineStat::Mean);
        assert_eq!(stats.std_high, 0.0);
        assert_eq!(stats.avg_high, 42.0);
        assert_eq!(stats.bust_rate, 0.0);
        assert!((stats.cycle_success_rate - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_results_are_zero() {
        assert_eq!(aggregate(&[], HeadlineStat::Median), AggregateStats::default());
    }

    #[test]
    fn test_all_busts() {
        let results = [trial(20.0, 0, 4), trial(20.0, 0, 6)];
        let stats = aggregate(&results, HeadlineStat::Median);
        assert_eq!(stats.bust_rate, 100.0);
        assert_eq!(stats.cycle_success_rate, 0.0);
        assert_eq!(stats.std_high, 0.0);
    }

    #[test]
    fn test_sequential_and_parallel_produce_full_batches() {
        let cancel = CancelToken::new();
        for mode in [ExecutionMode::Sequential, ExecutionMode::Parallel] {
            let mut calls = Vec::new();
            let results =
                run_many_trials(&quick_params(12), mode, &cancel, |done, total| calls.push((done, total)))
                    .unwrap();

            assert_eq!(results.len(), 12);
            assert_eq!(calls.last(), Some(&(12, 12)));
            assert!(calls.windows(2).all(|w| w[1].0 == w[0].0 + 1));
            assert!(results.iter().all(|r| r.highest_balance >= 20.0));
        }
    }

    #[test]
    fn test_sequential_and_parallel_statistics_agree() {
        let stats_for = |mode| {
            let aggregator = TrialAggregator::new(AggregatorSettings {
                mode,
                rng: RngKind::Fast,
                headline: HeadlineStat::Mean,
                ..AggregatorSettings::default()
            });
            aggregator
                .run_and_aggregate(&quick_params(2_000), &CancelToken::new())
                .unwrap()
        };
        let sequential = stats_for(ExecutionMode::Sequential);
        let parallel = stats_for(ExecutionMode::Parallel);

        assert_eq!(sequential.trials, 2_000);
        assert_eq!(parallel.trials, 2_000);
        // Bust share has a standard error near 1.1 points per run
        assert!(
            (sequential.bust_rate - parallel.bust_rate).abs() < 8.0,
            "bust {} vs {}",
            sequential.bust_rate,
            parallel.bust_rate
        );
        let close = |a: f64, b: f64| (a - b).abs() <= 0.2 * a.max(b) + 0.05;
        assert!(
            close(sequential.avg_cycles, parallel.avg_cycles),
            "cycles {} vs {}",
            sequential.avg_cycles,
            parallel.avg_cycles
        );
        assert!(
            close(sequential.avg_rounds, parallel.avg_rounds),
            "rounds {} vs {}",
            sequential.avg_rounds,
            parallel.avg_rounds
        );
    }

    #[test]
    fn test_pre_cancelled_run_is_empty() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let results =
            run_many_trials(&quick_params(8), ExecutionMode::Parallel, &cancel, |_, _| {}).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_invalid_params_rejected_before_running() {
        let params = SimParams {
            n_trials: 0,
            ..quick_params(1)
        };
        let err = run_many_trials(&params, ExecutionMode::Sequential, &CancelToken::new(), |_, _| {});
        assert!(matches!(err, Err(SimulationError::InvalidParameters { .. })));
    }

    #[test]
    fn test_run_and_aggregate_uses_configured_headline() {
        let aggregator = TrialAggregator::new(AggregatorSettings {
            rng: RngKind::Fast,
            headline: HeadlineStat::Mean,
            ..AggregatorSettings::default()
        });
        let stats = aggregator
            .run_and_aggregate(&quick_params(20), &CancelToken::new())
            .unwrap();

        assert_eq!(stats.trials, 20);
        assert!(stats.avg_high >= 20.0);
        assert!(stats.max_high >= stats.avg_high);
        assert!((0.0..=100.0).contains(&stats.bust_rate));
    }
}
