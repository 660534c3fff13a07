use crate::domain::simulation::CancelToken;
use std::future::Future;
use tokio::task::JoinHandle;
use tracing::warn;

/// Exit status for a run interrupted by a second Ctrl-C (128 + SIGINT)
pub const FORCED_EXIT_CODE: i32 = 130;

/// Trips `cancel` on the first Ctrl-C and exits the process on the second.
/// Abort the handle once the work is done.
pub fn cancel_on_ctrl_c(cancel: CancelToken) -> JoinHandle<()> {
    tokio::spawn(handle_interrupts(tokio::signal::ctrl_c, cancel, || {
        std::process::exit(FORCED_EXIT_CODE);
    }))
}

async fn handle_interrupts<S, Fut, X>(mut next_signal: S, cancel: CancelToken, force_exit: X)
where
    S: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
    X: FnOnce(),
{
    if next_signal().await.is_err() {
        return;
    }
    warn!("Ctrl-C received, finishing work already in flight (press again to exit)...");
    cancel.cancel();

    if next_signal().await.is_ok() {
        warn!("Second Ctrl-C received, exiting without waiting for running trials");
        force_exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn signals(script: Vec<io::Result<()>>) -> impl FnMut() -> std::future::Ready<io::Result<()>> {
        let mut script = script.into_iter();
        move || std::future::ready(script.next().unwrap_or_else(|| Err(io::Error::other("no signal"))))
    }

    #[tokio::test]
    async fn test_first_interrupt_cancels_second_exits() {
        let cancel = CancelToken::new();
        let mut exited = false;
        handle_interrupts(signals(vec![Ok(()), Ok(())]), cancel.clone(), || exited = true).await;

        assert!(cancel.is_cancelled());
        assert!(exited);
    }

    #[tokio::test]
    async fn test_single_interrupt_only_cancels() {
        let cancel = CancelToken::new();
        let mut exited = false;
        handle_interrupts(signals(vec![Ok(())]), cancel.clone(), || exited = true).await;

        assert!(cancel.is_cancelled());
        assert!(!exited);
    }

    #[tokio::test]
    async fn test_signal_setup_failure_does_nothing() {
        let cancel = CancelToken::new();
        let mut exited = false;
        handle_interrupts(signals(vec![]), cancel.clone(), || exited = true).await;

        assert!(!cancel.is_cancelled());
        assert!(!exited);
    }

    #[tokio::test]
    async fn test_aborted_watcher_leaves_token_untouched() {
        let cancel = CancelToken::new();
        let watcher = cancel_on_ctrl_c(cancel.clone());
        watcher.abort();

        assert!(watcher.await.unwrap_err().is_cancelled());
        assert!(!cancel.is_cancelled());
    }
}
