use crate::{MapError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Minimum spacing between dispatches to one collaborator.
///
/// One limiter is shared by every cache that talks to the same service, so
/// the spacing holds across keys and across query kinds. Callers reserve the
/// next free slot under a lock and then sleep until it, which keeps
/// concurrent callers spaced as well.
#[derive(Debug)]
pub struct RateLimiter {
    name: String,
    min_interval: Duration,
    last_dispatch: Mutex<Option<Instant>>,
    closed: AtomicBool,
    notify: Notify,
}

impl RateLimiter {
    pub fn new(name: impl Into<String>, min_interval: Duration) -> Self {
        Self {
            name: name.into(),
            min_interval,
            last_dispatch: Mutex::new(None),
            closed: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Time left before a call made now could dispatch
    pub fn remaining_wait(&self) -> Duration {
        let last = *self
            .last_dispatch
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match last {
            Some(last) => (last + self.min_interval).saturating_duration_since(Instant::now()),
            None => Duration::ZERO,
        }
    }

    /// Waits for the next dispatch slot.
    ///
    /// Returns `MapError::Cancelled` if the limiter is closed before or
    /// while waiting.
    pub async fn acquire(&self) -> Result<()> {
        // Created before the closed check so a concurrent close() still wakes us
        let notified = self.notify.notified();
        if self.is_closed() {
            return Err(MapError::Cancelled);
        }

        let now = Instant::now();
        let slot = {
            let mut last = self
                .last_dispatch
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let slot = match *last {
                Some(previous) => (previous + self.min_interval).max(now),
                None => now,
            };
            *last = Some(slot);
            slot
        };

        if slot > now {
            log::debug!(
                "{}: throttling for {:?}",
                self.name,
                slot.saturating_duration_since(now)
            );
            tokio::select! {
                _ = tokio::time::sleep_until(slot) => {}
                _ = notified => return Err(MapError::Cancelled),
            }
        }

        if self.is_closed() {
            return Err(MapError::Cancelled);
        }
        Ok(())
    }

    /// Cancels every pending and future wait. Used on host teardown.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            log::debug!("{}: closed", self.name);
        }
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
