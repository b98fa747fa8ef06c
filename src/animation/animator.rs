//! Fixed-cadence movement of a simulated vehicle along a waypoint path.

use crate::animation::state::{progress_at, AnimationState, AnimationStatus};
use crate::core::config::{tick_period, AnimationConfig};
use crate::core::constants::DEFAULT_ANIMATION_SPEED;
use crate::core::geo::LatLng;
use crate::runtime::{spawn_repeating, AsyncSpawner, TimerHandle, TokioSpawner};
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Called with `(progress, position)` after every step
pub type ProgressCallback = Arc<dyn Fn(f64, LatLng) + Send + Sync>;
/// Called once when the last waypoint is reached
pub type CompleteCallback = Arc<dyn Fn() + Send + Sync>;

struct Inner {
    path: Vec<LatLng>,
    index: usize,
    status: AnimationStatus,
    speed: f64,
    /// Bumped on every transition that invalidates the running timer
    generation: u64,
    timer: Option<TimerHandle>,
    on_progress: Option<ProgressCallback>,
    on_complete: Option<CompleteCallback>,
    shut_down: bool,
}

impl Inner {
    fn last_index(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    fn state(&self) -> AnimationState {
        AnimationState {
            index: self.index,
            progress: progress_at(self.index, self.path.len()),
            status: self.status,
        }
    }

    /// Invalidates any pending tick and hands back the timer so the caller
    /// can drop it once the lock is released
    fn invalidate(&mut self) -> Option<TimerHandle> {
        self.generation = self.generation.wrapping_add(1);
        let timer = self.timer.take();
        if let Some(timer) = &timer {
            timer.cancel();
        }
        timer
    }

    fn advance(&mut self) -> Step {
        if self.index < self.last_index() {
            self.index += 1;
        }
        let position = self.path[self.index];

        if self.index >= self.last_index() {
            self.status = AnimationStatus::Completed;
            log::debug!("animator: completed at waypoint {}", self.index);
            Step::Finished {
                position,
                timer: self.timer.take(),
                on_progress: self.on_progress.clone(),
                on_complete: self.on_complete.clone(),
            }
        } else {
            Step::Moved {
                progress: progress_at(self.index, self.path.len()),
                position,
                on_progress: self.on_progress.clone(),
            }
        }
    }
}

/// Outcome of one tick, applied after the lock is released
enum Step {
    Ignored,
    Moved {
        progress: f64,
        position: LatLng,
        on_progress: Option<ProgressCallback>,
    },
    Finished {
        position: LatLng,
        timer: Option<TimerHandle>,
        on_progress: Option<ProgressCallback>,
        on_complete: Option<CompleteCallback>,
    },
}

/// Path-following animation scheduler.
///
/// Advances one waypoint per tick at `speed` waypoints per second. At most
/// one timer is alive per animator; every transition that leaves or
/// replaces `Running` cancels it before new state is set up. Callbacks run
/// after the internal lock is released, so they may call back into the
/// animator. Clones share the same animation.
#[derive(Clone)]
pub struct PathAnimator {
    inner: Arc<Mutex<Inner>>,
    spawner: Arc<dyn AsyncSpawner>,
}

impl PathAnimator {
    /// Create an animator on the current tokio runtime
    pub fn new(speed: f64) -> Self {
        Self::with_spawner(Arc::new(TokioSpawner), speed)
    }

    pub fn from_config(config: &AnimationConfig) -> Self {
        Self::new(config.speed)
    }

    pub fn with_spawner(spawner: Arc<dyn AsyncSpawner>, speed: f64) -> Self {
        let speed = if speed.is_finite() && speed > 0.0 {
            speed
        } else {
            log::warn!("animator: invalid speed {}, using default", speed);
            DEFAULT_ANIMATION_SPEED
        };
        Self {
            inner: Arc::new(Mutex::new(Inner {
                path: Vec::new(),
                index: 0,
                status: AnimationStatus::Idle,
                speed,
                generation: 0,
                timer: None,
                on_progress: None,
                on_complete: None,
                shut_down: false,
            })),
            spawner,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register the progress callback, replacing any previous one
    pub fn on_progress<F>(&self, callback: F)
    where
        F: Fn(f64, LatLng) + Send + Sync + 'static,
    {
        self.lock().on_progress = Some(Arc::new(callback));
    }

    /// Register the completion callback, replacing any previous one
    pub fn on_complete<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.lock().on_complete = Some(Arc::new(callback));
    }

    /// Replace the path wholesale and rewind to its first waypoint.
    ///
    /// A single-point path completes immediately; an empty path completes
    /// without any callback.
    pub fn set_path(&self, path: Vec<LatLng>) {
        let (stale_timer, on_complete) = {
            let mut inner = self.lock();
            let stale_timer = inner.invalidate();
            inner.path = path;
            inner.index = 0;
            let on_complete = match inner.path.len() {
                0 => {
                    log::warn!("animator: empty path assigned");
                    inner.status = AnimationStatus::Completed;
                    None
                }
                1 => {
                    inner.status = AnimationStatus::Completed;
                    inner.on_complete.clone()
                }
                len => {
                    log::debug!("animator: path of {} waypoints ready", len);
                    inner.status = AnimationStatus::Ready;
                    None
                }
            };
            (stale_timer, on_complete)
        };
        drop(stale_timer);

        if let Some(on_complete) = on_complete {
            on_complete();
        }
    }

    /// Begin ticking from `Ready` or `Stopped`. A no-op while running.
    pub fn start(&self) {
        let mut inner = self.lock();
        if inner.shut_down {
            log::warn!("animator: start after shutdown ignored");
            return;
        }
        if !inner.status.can_start() {
            log::debug!("animator: start ignored in {:?}", inner.status);
            return;
        }
        inner.status = AnimationStatus::Running;
        self.schedule(&mut inner);
    }

    /// Pause at the current waypoint
    pub fn stop(&self) {
        let stale_timer = {
            let mut inner = self.lock();
            if inner.status != AnimationStatus::Running {
                return;
            }
            inner.status = AnimationStatus::Stopped;
            log::debug!("animator: stopped at waypoint {}", inner.index);
            inner.invalidate()
        };
        drop(stale_timer);
    }

    /// Rewind to the first waypoint without clearing the path
    pub fn reset(&self) {
        let stale_timer = {
            let mut inner = self.lock();
            if inner.path.is_empty() {
                return;
            }
            inner.index = 0;
            inner.status = AnimationStatus::Ready;
            inner.invalidate()
        };
        drop(stale_timer);
    }

    /// Move directly to waypoint `index`, clamped to the path.
    ///
    /// A running animator keeps ticking from the new index. A completed one
    /// moved before the end becomes `Stopped` so it can be resumed.
    pub fn jump_to(&self, index: usize) {
        let mut inner = self.lock();
        if inner.path.is_empty() {
            return;
        }
        let index = index.min(inner.last_index());
        inner.index = index;
        match inner.status {
            AnimationStatus::Completed if index < inner.last_index() => {
                inner.status = AnimationStatus::Stopped;
            }
            AnimationStatus::Ready if index > 0 => {
                inner.status = AnimationStatus::Stopped;
            }
            _ => {}
        }
    }

    /// Change cadence. A running timer is restarted at the new period.
    pub fn set_speed(&self, speed: f64) {
        if !(speed.is_finite() && speed > 0.0) {
            log::warn!("animator: invalid speed {} ignored", speed);
            return;
        }
        let stale_timer = {
            let mut inner = self.lock();
            inner.speed = speed;
            if inner.status != AnimationStatus::Running {
                return;
            }
            let stale_timer = inner.invalidate();
            self.schedule(&mut inner);
            stale_timer
        };
        drop(stale_timer);
    }

    /// Cancel every timer and drop the callbacks. Used on host teardown.
    pub fn shutdown(&self) {
        let (stale_timer, callbacks) = {
            let mut inner = self.lock();
            inner.shut_down = true;
            if inner.status == AnimationStatus::Running {
                inner.status = AnimationStatus::Stopped;
            }
            let callbacks = (inner.on_progress.take(), inner.on_complete.take());
            (inner.invalidate(), callbacks)
        };
        drop(stale_timer);
        drop(callbacks);
        log::debug!("animator: shut down");
    }

    pub fn state(&self) -> AnimationState {
        self.lock().state()
    }

    pub fn status(&self) -> AnimationStatus {
        self.lock().status
    }

    pub fn progress(&self) -> f64 {
        self.state().progress
    }

    /// Current simulated position, `None` without a path
    pub fn position(&self) -> Option<LatLng> {
        let inner = self.lock();
        inner.path.get(inner.index).copied()
    }

    pub fn path(&self) -> Vec<LatLng> {
        self.lock().path.clone()
    }

    pub fn speed(&self) -> f64 {
        self.lock().speed
    }

    pub fn is_running(&self) -> bool {
        self.status() == AnimationStatus::Running
    }

    /// Whether a tick source is currently alive
    pub fn has_timer(&self) -> bool {
        self.lock().timer.as_ref().is_some_and(TimerHandle::is_active)
    }

    fn schedule(&self, inner: &mut Inner) {
        let generation = inner.generation;
        let weak = Arc::downgrade(&self.inner);
        let period = tick_period(inner.speed);
        log::debug!(
            "animator: running from waypoint {} every {:?}",
            inner.index,
            period
        );
        inner.timer = Some(spawn_repeating(self.spawner.as_ref(), period, move || {
            tick(&weak, generation)
        }));
    }
}

fn tick(inner: &Weak<Mutex<Inner>>, generation: u64) -> ControlFlow<()> {
    let Some(inner) = inner.upgrade() else {
        return ControlFlow::Break(());
    };

    let step = {
        let mut guard = inner.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.generation != generation || guard.status != AnimationStatus::Running {
            Step::Ignored
        } else {
            guard.advance()
        }
    };

    match step {
        Step::Ignored => ControlFlow::Break(()),
        Step::Moved {
            progress,
            position,
            on_progress,
        } => {
            if let Some(on_progress) = on_progress {
                on_progress(progress, position);
            }
            ControlFlow::Continue(())
        }
        Step::Finished {
            position,
            timer,
            on_progress,
            on_complete,
        } => {
            // This task is the timer; marking it cancelled only stops the next tick
            if let Some(timer) = &timer {
                timer.cancel();
            }
            if let Some(on_progress) = on_progress {
                on_progress(1.0, position);
            }
            if let Some(on_complete) = on_complete {
                on_complete();
            }
            drop(timer);
            ControlFlow::Break(())
        }
    }
}

impl std::fmt::Debug for PathAnimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("PathAnimator")
            .field("len", &inner.path.len())
            .field("state", &inner.state())
            .field("speed", &inner.speed)
            .finish()
    }
}
