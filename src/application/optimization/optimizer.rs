use crate::application::simulation::{
    AggregatorSettings, DEFAULT_MAX_WORKERS, ExecutionMode, TrialAggregator, TrialLimits,
};
use crate::domain::errors::SimulationError;
use crate::domain::optimization::{Combo, ComboResult, OptParams, ResultColumn, sort_by_column};
use crate::domain::simulation::{CancelToken, HeadlineStat};
use crate::infrastructure::rng::RngKind;
use crate::infrastructure::worker_pool::{run_bounded, worker_count};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerSettings {
    /// Upper bound on concurrently evaluated combinations
    pub max_workers: usize,
    pub rng: RngKind,
    pub headline: HeadlineStat,
    pub limits: TrialLimits,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            rng: RngKind::default(),
            headline: HeadlineStat::default(),
            limits: TrialLimits::default(),
        }
    }
}

/// Grid search over martingale parameters.
///
/// Each combination is one unit of work: its trials run sequentially on a
/// single worker, and combinations are spread over a bounded pool.
pub struct GridSearchOptimizer {
    settings: OptimizerSettings,
}

impl GridSearchOptimizer {
    pub fn new(settings: OptimizerSettings) -> Self {
        Self { settings }
    }

    pub fn worker_count(&self, combos: usize) -> usize {
        worker_count(self.settings.max_workers, combos)
    }

    /// Evaluates every combination of the grid and returns rows sorted by
    /// score, best first.
    ///
    /// `on_progress` receives the finished fraction in `[0, 1]` on the
    /// calling thread. After cancellation only combinations already started
    /// are reported. A combination whose worker fails appears as a
    /// [`ComboResult::failed`] row.
    pub fn run_optimization<P>(
        &self,
        params: &OptParams,
        cancel: &CancelToken,
        mut on_progress: P,
    ) -> Result<Vec<ComboResult>, SimulationError>
    where
        P: FnMut(f64),
    {
        params.validate()?;

        let combinations = params.grid.combinations();
        let total = combinations.len();
        let workers = self.worker_count(total);

        info!(
            "GridSearch: Starting optimization with {} parameter combinations on {} workers",
            total, workers
        );

        let aggregator = TrialAggregator::new(AggregatorSettings {
            mode: ExecutionMode::Sequential,
            rng: self.settings.rng,
            headline: self.settings.headline,
            max_workers: 1,
            limits: self.settings.limits,
        });
        let (starting_balance, n_trials) = (params.starting_balance, params.trials_per_combo);

        let mut results = Vec::with_capacity(total);
        let summary = run_bounded(
            "combo",
            combinations,
            workers,
            cancel,
            move |combo| evaluate_combo(&aggregator, combo, starting_balance, n_trials),
            |combo, outcome| {
                let row = match outcome {
                    Ok(Ok(row)) => row,
                    Ok(Err(e)) => {
                        warn!("GridSearch: Evaluation failed for {:?}: {}", combo, e);
                        ComboResult::failed(&combo)
                    }
                    Err(_) => ComboResult::failed(&combo),
                };
                debug!(
                    "GridSearch: bet_div={} profit_mult={} W%={} L={} Buffer%={} -> score={:.4}",
                    row.bet_div,
                    row.profit_mult,
                    row.win_increase_pct,
                    row.loss_reset,
                    row.buffer_pct,
                    row.score
                );
                results.push(row);
                on_progress(results.len() as f64 / total as f64);
            },
        )?;

        if summary.skipped() > 0 {
            info!(
                "GridSearch: Cancelled, {} of {} combinations evaluated",
                summary.completed, total
            );
        } else {
            info!("GridSearch: Evaluated all {} combinations", total);
        }

        rank_by_score(&mut results);
        Ok(results)
    }
}

/// Grid search with default settings.
pub fn run_optimizer<P>(
    params: &OptParams,
    cancel: &CancelToken,
    on_progress: P,
) -> Result<Vec<ComboResult>, SimulationError>
where
    P: FnMut(f64),
{
    GridSearchOptimizer::new(OptimizerSettings::default()).run_optimization(params, cancel, on_progress)
}

/// Sorts rows by score, best first.
pub fn rank_by_score(rows: &mut [ComboResult]) {
    sort_by_column(rows, ResultColumn::Score, true);
}

fn evaluate_combo(
    aggregator: &TrialAggregator,
    combo: &Combo,
    starting_balance: f64,
    n_trials: usize,
) -> Result<ComboResult, SimulationError> {
    let params = combo.sim_params(starting_balance, n_trials);
    // Trials of a combination already in flight always run to completion
    let stats = aggregator.run_and_aggregate(&params, &CancelToken::new())?;
    Ok(ComboResult::from_stats(combo, &stats, starting_balance))
}
