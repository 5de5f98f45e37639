//! Cancellable countdown interval.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Periodic task that runs until its step says stop.
///
/// Dropping the handle aborts the task, so a ticker never outlives the view
/// that owns it.
#[derive(Debug)]
pub struct CooldownTicker {
    handle: JoinHandle<()>,
}

impl CooldownTicker {
    /// Run `step` every `period` (first run after one period) until it
    /// returns `false`
    pub fn spawn<F, Fut>(period: Duration, mut step: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval completes immediately.
            interval.tick().await;

            loop {
                interval.tick().await;
                if !step().await {
                    break;
                }
            }
        });

        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the countdown now
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for CooldownTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_runs_until_step_returns_false() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = count.clone();
        let ticker = CooldownTicker::spawn(Duration::from_millis(5), move || {
            let counter = counter.clone();
            async move { counter.fetch_add(1, Ordering::SeqCst) + 1 < 3 }
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(ticker.is_finished());
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_drop_stops_the_task() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = count.clone();
        let ticker = CooldownTicker::spawn(Duration::from_millis(5), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            }
        });

        tokio::time::sleep(Duration::from_millis(30)).await;
        ticker.cancel();
        // Let the abort land before sampling
        tokio::time::sleep(Duration::from_millis(10)).await;
        let after_cancel = count.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), after_cancel);
    }
}
