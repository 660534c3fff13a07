//! Bounded fan-out of independent work units onto a rayon pool.
//!
//! At most `workers` units are in flight at once. Results travel back over
//! a crossbeam channel and are handed to the caller on the calling thread,
//! so progress callbacks never run on a worker.

use crate::domain::errors::SimulationError;
use crate::domain::simulation::CancelToken;
use crossbeam_channel::{Sender, unbounded};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::{debug, error};

/// What happened to the units handed to [`run_bounded`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSummary {
    pub total: usize,
    pub dispatched: usize,
    pub completed: usize,
    pub failed: usize,
}

impl PoolSummary {
    /// Units never started because the run was cancelled
    pub fn skipped(&self) -> usize {
        self.total - self.dispatched
    }
}

/// Threads to use for `units` work units under a configured cap.
pub fn worker_count(cap: usize, units: usize) -> usize {
    let host = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    host.min(cap.max(1)).min(units).max(1)
}

/// Runs `job` over every unit with bounded concurrency.
///
/// `on_complete` receives each unit back together with its result, or the
/// panic message if the job panicked. Cancellation stops new dispatches;
/// units already in flight are drained before returning.
pub fn run_bounded<T, R, F, C>(
    label: &str,
    units: Vec<T>,
    workers: usize,
    cancel: &CancelToken,
    job: F,
    mut on_complete: C,
) -> Result<PoolSummary, SimulationError>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(&T) -> R + Send + Sync + 'static,
    C: FnMut(T, Result<R, String>),
{
    let total = units.len();
    let mut summary = PoolSummary {
        total,
        dispatched: 0,
        completed: 0,
        failed: 0,
    };
    if total == 0 {
        return Ok(summary);
    }

    let workers = workers.clamp(1, total);
    let thread_label = label.to_string();
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(move |i| format!("{thread_label}-{i}"))
        .build()
        .map_err(|e| SimulationError::WorkerPool(e.to_string()))?;
    debug!("{}: {} units on {} workers", label, total, workers);

    let job = Arc::new(job);
    let (tx, rx) = unbounded::<(T, Result<R, String>)>();
    let mut pending = units.into_iter();
    let mut in_flight = 0usize;

    loop {
        while in_flight < workers && !cancel.is_cancelled() {
            let Some(unit) = pending.next() else { break };
            dispatch(&pool, Arc::clone(&job), tx.clone(), unit);
            in_flight += 1;
            summary.dispatched += 1;
        }

        if in_flight == 0 {
            break;
        }

        let Ok((unit, outcome)) = rx.recv() else {
            return Err(SimulationError::WorkerPool(format!(
                "{label}: result channel closed with {in_flight} units in flight"
            )));
        };
        in_flight -= 1;
        summary.completed += 1;
        if let Err(message) = &outcome {
            summary.failed += 1;
            error!("{}: worker failed: {}", label, message);
        }
        on_complete(unit, outcome);
    }

    Ok(summary)
}

fn dispatch<T, R, F>(pool: &ThreadPool, job: Arc<F>, tx: Sender<(T, Result<R, String>)>, unit: T)
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(&T) -> R + Send + Sync + 'static,
{
    pool.spawn(move || {
        let outcome = catch_unwind(AssertUnwindSafe(|| job(&unit))).map_err(panic_message);
        // Receiver only goes away if the caller bailed out; nothing to report to.
        let _ = tx.send((unit, outcome));
    });
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
