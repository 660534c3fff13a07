pub mod mock;
pub mod progress;
pub mod rng;
pub mod shutdown;
pub mod worker_pool;

pub use progress::ProgressLog;
