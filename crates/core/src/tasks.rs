//! Bounded spawner for fire-and-forget work.
//!
//! Cache writes, stale cache eviction and webhook deliveries run detached
//! from the request that caused them. [`BackgroundTasks`] caps how many of
//! them run at once, logs panics instead of losing them silently, and lets
//! the server drain outstanding work on shutdown.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;

/// Default number of background tasks allowed to run concurrently.
pub const DEFAULT_TASK_LIMIT: usize = 64;

/// Cheaply cloneable handle for spawning detached tasks.
#[derive(Clone)]
pub struct BackgroundTasks {
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
}

impl BackgroundTasks {
    /// Create a spawner allowing at most `limit` concurrently running tasks.
    pub fn new(limit: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(limit.max(1))),
            tracker: TaskTracker::new(),
        }
    }

    /// Spawn `task` in the background.
    ///
    /// The task waits for a permit before it starts. A panic inside the task
    /// is logged under `name` and otherwise swallowed.
    pub fn spawn<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        self.tracker.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                tracing::warn!(task = name, "Background task dropped, permit semaphore closed");
                return;
            };

            if let Err(e) = tokio::spawn(task).await {
                if e.is_panic() {
                    tracing::error!(task = name, "Background task panicked");
                } else {
                    tracing::warn!(task = name, error = %e, "Background task cancelled");
                }
            }
        });
    }

    /// Number of spawned tasks that have not finished yet.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Wait up to `timeout` for queued and running tasks to finish.
    ///
    /// Returns `true` when every task finished in time.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.tracker.close();
        tokio::time::timeout(timeout, self.tracker.wait())
            .await
            .is_ok()
    }
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new(DEFAULT_TASK_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn runs_spawned_work() {
        let tasks = BackgroundTasks::default();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let counter = Arc::clone(&counter);
            tasks.spawn("increment", async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert!(tasks.shutdown(Duration::from_secs(1)).await);
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn panic_does_not_escape() {
        let tasks = BackgroundTasks::new(1);
        tasks.spawn("boom", async { panic!("boom") });

        let done = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&done);
        tasks.spawn("after", async move {
            flag.store(1, Ordering::SeqCst);
        });

        assert!(tasks.shutdown(Duration::from_secs(1)).await);
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn shutdown_keeps_permits_open() {
        let tasks = BackgroundTasks::new(1);
        assert!(tasks.shutdown(Duration::from_secs(1)).await);

        let ran = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&ran);
        tasks.spawn("late", async move {
            flag.store(1, Ordering::SeqCst);
        });

        assert!(tasks.shutdown(Duration::from_secs(1)).await);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(tasks.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn limit_bounds_concurrency() {
        let tasks = BackgroundTasks::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for _ in 0..6 {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            tasks.spawn("sleepy", async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            });
        }

        assert!(tasks.shutdown(Duration::from_secs(5)).await);
        assert_eq!(peak.load(Ordering::SeqCst), 2);
    }
}
