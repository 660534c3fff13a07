pub mod cancel;
pub mod cycle;
pub mod params;
pub mod results;

pub use cancel::CancelToken;
pub use cycle::CyclePlan;
pub use params::{HOUSE_EDGE, SimParams};
pub use results::{AggregateStats, HeadlineStat, TrialOutcome, TrialResult};
