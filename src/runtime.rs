//! Runtime abstraction layer for async operations
//!
//! Spawning goes through [`AsyncSpawner`] so the animator and the services do
//! not hard-wire a runtime. Repeating timers are returned as a
//! [`TimerHandle`] whose `cancel()` is idempotent and also runs on drop, so
//! an owner can never leak a live tick source by forgetting it.

use futures::future::{BoxFuture, FutureExt};
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A trait for spawning async tasks (object-safe version)
pub trait AsyncSpawner: Send + Sync + 'static {
    /// Spawn a future and return a handle to it
    fn spawn_boxed(&self, future: BoxFuture<'static, ()>) -> Box<dyn AsyncHandle>;
}

/// Handle to a spawned async task
pub trait AsyncHandle: Send + Sync {
    /// Check if the task is finished
    fn is_finished(&self) -> bool;

    /// Cancel the task
    fn cancel(&self);
}

/// Tokio-based async spawner. Uses whatever runtime is current at spawn time.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSpawner;

impl AsyncSpawner for TokioSpawner {
    fn spawn_boxed(&self, future: BoxFuture<'static, ()>) -> Box<dyn AsyncHandle> {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => Box::new(TokioHandle(handle.spawn(future))),
            Err(e) => {
                log::error!("no tokio runtime available, task not started: {}", e);
                Box::new(NeverStarted)
            }
        }
    }
}

struct TokioHandle(tokio::task::JoinHandle<()>);

impl AsyncHandle for TokioHandle {
    fn is_finished(&self) -> bool {
        self.0.is_finished()
    }

    fn cancel(&self) {
        self.0.abort();
    }
}

struct NeverStarted;

impl AsyncHandle for NeverStarted {
    fn is_finished(&self) -> bool {
        true
    }

    fn cancel(&self) {}
}

/// Owner of a repeating timer. Cancelling twice is harmless.
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
    task: Box<dyn AsyncHandle>,
}

impl TimerHandle {
    /// Stops the timer; no tick starts after this returns
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            self.task.cancel();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// True while the timer can still fire
    pub fn is_active(&self) -> bool {
        !self.is_cancelled() && !self.task.is_finished()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Calls `tick` every `period`, first after one full period.
///
/// The timer ends when `tick` returns `ControlFlow::Break` or when the
/// returned handle is cancelled or dropped.
pub fn spawn_repeating<F>(spawner: &dyn AsyncSpawner, period: Duration, mut tick: F) -> TimerHandle
where
    F: FnMut() -> ControlFlow<()> + Send + 'static,
{
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancelled);
    let start = tokio::time::Instant::now() + period;

    let ticker = async move {
        let mut interval = tokio::time::interval_at(start, period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if flag.load(Ordering::SeqCst) {
                break;
            }
            if tick().is_break() {
                break;
            }
        }
    };

    let task = spawner.spawn_boxed(ticker.boxed());
    TimerHandle { cancelled, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn test_repeating_timer_ticks_every_period() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let timer = spawn_repeating(&TokioSpawner, Duration::from_millis(100), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        });

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(timer.is_active());

        timer.cancel();
        timer.cancel();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(!timer.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_break_ends_timer() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let _timer = spawn_repeating(&TokioSpawner, Duration::from_millis(10), move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 1 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let timer = spawn_repeating(&TokioSpawner, Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        });
        drop(timer);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_spawn_without_runtime_is_inert() {
        let timer = spawn_repeating(&TokioSpawner, Duration::from_millis(10), || {
            ControlFlow::Continue(())
        });
        assert!(!timer.is_active());
    }
}
