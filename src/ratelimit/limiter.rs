//! Core fixed-window rate limiter implementation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, trace};

use crate::error::{CrptError, Result};

/// Shared state between callers and the replenishment task.
struct Shared {
    /// Maximum permits available per window
    limit: u32,
    /// Permits currently available, always within `[0, limit]`
    permits: Mutex<u32>,
    /// Wakes blocked callers when permits are replenished or on shutdown
    notify: Notify,
    /// Set once by `shutdown`; waiters observe it and bail out
    closed: AtomicBool,
}

/// A fixed-window rate limiter gating concurrent callers.
///
/// At most `limit` acquisitions succeed within any single window. A background
/// task resets the permit counter to `limit` every window tick; unused permits
/// from a quiet window do not carry over. Callers beyond the limit block in
/// [`acquire`](FixedWindowLimiter::acquire) until the next tick.
///
/// The replenishment task is owned by the limiter: [`shutdown`]
/// (FixedWindowLimiter::shutdown) stops it explicitly, and dropping the
/// limiter aborts it as a backstop.
pub struct FixedWindowLimiter {
    shared: Arc<Shared>,
    /// Handle of the replenishment task, taken on shutdown
    replenisher: Mutex<Option<JoinHandle<()>>>,
}

impl FixedWindowLimiter {
    /// Create a new limiter allowing `request_limit` calls per `window`.
    ///
    /// The counter starts full, so the first window admits `request_limit`
    /// callers immediately. Fails if `request_limit` is zero or the window
    /// duration is zero.
    ///
    /// Spawns the replenishment task, so this must be called from within a
    /// tokio runtime; it panics otherwise.
    pub fn new(request_limit: u32, window: Duration) -> Result<Self> {
        if request_limit == 0 {
            return Err(CrptError::Config(
                "request_limit must be greater than zero".to_string(),
            ));
        }
        if window.is_zero() {
            return Err(CrptError::Config(
                "window duration must be greater than zero".to_string(),
            ));
        }

        let shared = Arc::new(Shared {
            limit: request_limit,
            permits: Mutex::new(request_limit),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
        });

        let task_state = Arc::clone(&shared);
        let replenisher = tokio::spawn(async move {
            // First tick lands one full window after construction; the counter
            // already starts full.
            let mut ticker = time::interval_at(Instant::now() + window, window);
            loop {
                ticker.tick().await;
                {
                    let mut permits = task_state.permits.lock();
                    // Hard reset, not an increment: unused permits are discarded.
                    *permits = task_state.limit;
                }
                task_state.notify.notify_waiters();
                trace!(limit = task_state.limit, "Replenished rate limit window");
            }
        });

        debug!(
            limit = request_limit,
            window_ms = window.as_millis() as u64,
            "Created fixed-window rate limiter"
        );

        Ok(Self {
            shared,
            replenisher: Mutex::new(Some(replenisher)),
        })
    }

    /// Acquire one permit, suspending until one becomes available.
    ///
    /// Decrements the permit counter on success. Cancel-safe: a caller dropped
    /// while suspended consumes nothing. Fails with [`CrptError::Closed`] if
    /// the limiter has been shut down. There is no fairness guarantee among
    /// waiters; any suspended caller may be admitted at the next tick.
    pub async fn acquire(&self) -> Result<()> {
        loop {
            // Register interest before checking the counter so a concurrent
            // notify_waiters between the check and the await is not lost.
            let notified = self.shared.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.shared.closed.load(Ordering::Acquire) {
                return Err(CrptError::Closed);
            }

            {
                let mut permits = self.shared.permits.lock();
                if *permits > 0 {
                    *permits -= 1;
                    trace!(remaining = *permits, "Acquired rate limit permit");
                    return Ok(());
                }
            }

            debug!("Rate limit window exhausted, waiting for replenishment");
            notified.await;
        }
    }

    /// Acquire one permit, giving up after `timeout`.
    ///
    /// Elapsing surfaces as [`CrptError::Cancelled`] to this caller only; the
    /// counter is untouched and other waiters are unaffected.
    pub async fn acquire_within(&self, timeout: Duration) -> Result<()> {
        match time::timeout(timeout, self.acquire()).await {
            Ok(result) => result,
            Err(_) => {
                debug!(
                    timeout_ms = timeout.as_millis() as u64,
                    "Gave up waiting for a rate limit permit"
                );
                Err(CrptError::Cancelled)
            }
        }
    }

    /// Number of permits currently available.
    ///
    /// This is primarily useful for testing.
    pub fn available_permits(&self) -> u32 {
        *self.shared.permits.lock()
    }

    /// Maximum permits available per window.
    pub fn limit(&self) -> u32 {
        self.shared.limit
    }

    /// Stop the replenishment task and wake all blocked callers.
    ///
    /// Waiters observe [`CrptError::Closed`]. Idempotent.
    pub fn shutdown(&self) {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(handle) = self.replenisher.lock().take() {
            handle.abort();
        }
        self.shared.notify.notify_waiters();
        debug!("Rate limiter shut down");
    }
}

impl Drop for FixedWindowLimiter {
    fn drop(&mut self) {
        // Backstop so a forgotten shutdown cannot leak a live timer.
        if let Some(handle) = self.replenisher.lock().take() {
            handle.abort();
        }
    }
}
