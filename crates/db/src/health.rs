//! Database health state machine.
//!
//! The service starts out healthy. The first operation that finds the store
//! unreachable flips the state to down and starts a reconnect loop: every
//! `retry_interval` it asks the store to reconnect, until one attempt
//! succeeds and the state flips back to healthy. At most one loop runs at a
//! time. While down, [`HealthManager::retry_in`] reports how long until the
//! next attempt so clients can be told when to come back.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::store::DocumentStore;

#[derive(Debug)]
struct HealthState {
    healthy: bool,
    /// When the current reconnect countdown started.
    restart_timer_started_at: Option<Instant>,
}

pub struct HealthManager {
    state: Mutex<HealthState>,
    reconnect_guard: Arc<tokio::sync::Mutex<()>>,
    store: Arc<dyn DocumentStore>,
    retry_interval: Duration,
}

impl HealthManager {
    pub fn new(store: Arc<dyn DocumentStore>, retry_interval: Duration) -> Self {
        Self {
            state: Mutex::new(HealthState {
                healthy: true,
                restart_timer_started_at: None,
            }),
            reconnect_guard: Arc::new(tokio::sync::Mutex::new(())),
            store,
            retry_interval,
        }
    }

    fn state(&self) -> MutexGuard<'_, HealthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_healthy(&self) -> bool {
        self.state().healthy
    }

    /// Time left until the next reconnect attempt. Zero while healthy.
    pub fn retry_in(&self) -> Duration {
        let state = self.state();
        if state.healthy {
            return Duration::ZERO;
        }
        match state.restart_timer_started_at {
            Some(started) => {
                (started + self.retry_interval).saturating_duration_since(Instant::now())
            }
            None => self.retry_interval,
        }
    }

    /// [`retry_in`](Self::retry_in) in whole seconds, rounded down.
    pub fn retry_in_secs(&self) -> u64 {
        self.retry_in().as_secs()
    }

    /// Record the observed state of the store.
    ///
    /// Reporting the current state again is a no-op. Going down starts the
    /// reconnect loop.
    pub fn report_state(self: &Arc<Self>, healthy: bool) {
        {
            let mut state = self.state();
            if state.healthy == healthy {
                return;
            }
            state.healthy = healthy;
            if healthy {
                state.restart_timer_started_at = None;
            }
        }

        if healthy {
            tracing::info!(backend = self.store.backend_name(), "Database connection restored");
        } else {
            tracing::error!(
                backend = self.store.backend_name(),
                retry_secs = self.retry_interval.as_secs(),
                "Database unavailable, scheduling reconnect"
            );
            self.schedule_reconnect();
        }
    }

    /// Start the reconnect loop unless one is already running.
    ///
    /// Returns `true` when a new loop was started.
    pub fn schedule_reconnect(self: &Arc<Self>) -> bool {
        let Ok(guard) = Arc::clone(&self.reconnect_guard).try_lock_owned() else {
            tracing::debug!("Reconnect loop already running");
            return false;
        };

        let this = Arc::clone(self);
        tokio::spawn(async move {
            {
                let _guard = guard;
                this.reconnect_until_success().await;
            }
            // Guard released first so a failure reported right after recovery
            // can start a fresh loop.
            this.report_state(true);
        });
        true
    }

    async fn reconnect_until_success(&self) {
        let mut attempt: u32 = 0;
        loop {
            self.state().restart_timer_started_at = Some(Instant::now());
            tokio::time::sleep(self.retry_interval).await;
            attempt += 1;

            match self.store.reconnect().await {
                Ok(()) => {
                    tracing::info!(attempt, "Database reconnect succeeded");
                    return;
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        error = %e,
                        retry_secs = self.retry_interval.as_secs(),
                        "Database reconnect failed"
                    );
                }
            }
        }
    }
}
