// Grid search over martingale parameters
pub mod grid_spec;
pub mod optimizer;
pub mod range_parser;
pub mod reporting;

pub use grid_spec::GridSpec;
pub use optimizer::{GridSearchOptimizer, OptimizerSettings, rank_by_score, run_optimizer};
pub use range_parser::{MAX_RANGE_LEN, parse_numeric_range, parse_range};
pub use reporting::{CsvLayout, OptimizationReport, OptimizeReporter};
