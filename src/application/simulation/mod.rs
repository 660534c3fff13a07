pub mod aggregator;
pub mod trial_runner;

pub use aggregator::{
    AggregatorSettings, DEFAULT_MAX_WORKERS, ExecutionMode, TrialAggregator, aggregate,
    run_many_trials,
};
pub use trial_runner::{DEFAULT_ROLL_BATCH, TrialLimits, TrialRunner, run_trial, run_trial_with};
