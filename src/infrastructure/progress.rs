use std::time::Instant;
use tracing::info;

/// Logs a long-running job's progress once per 10% step.
pub struct ProgressLog {
    label: String,
    last_step: u32,
    started: Instant,
}

impl ProgressLog {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            last_step: 0,
            started: Instant::now(),
        }
    }

    /// Feeds a completion fraction in `[0, 1]`. Returns true when a line was logged.
    pub fn update(&mut self, fraction: f64) -> bool {
        let step = (fraction.clamp(0.0, 1.0) * 10.0).floor() as u32;
        if step <= self.last_step {
            return false;
        }
        self.last_step = step;
        info!(
            "{}: {}% done ({:.1}s elapsed)",
            self.label,
            step * 10,
            self.started.elapsed().as_secs_f64()
        );
        true
    }

    pub fn update_counts(&mut self, done: usize, total: usize) -> bool {
        if total == 0 {
            return false;
        }
        self.update(done as f64 / total as f64)
    }
}
