use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifecycle of a [`PathAnimator`](crate::animation::PathAnimator)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationStatus {
    /// No path assigned
    Idle,
    /// Path assigned, positioned at the first waypoint
    Ready,
    Running,
    /// Paused mid-path, index kept
    Stopped,
    Completed,
}

impl AnimationStatus {
    /// Whether `start()` would begin ticking from this status
    pub fn can_start(&self) -> bool {
        matches!(self, AnimationStatus::Ready | AnimationStatus::Stopped)
    }
}

/// Snapshot of an animator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationState {
    pub index: usize,
    /// Fraction of the path covered, in `[0, 1]`
    pub progress: f64,
    pub status: AnimationStatus,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            index: 0,
            progress: 0.0,
            status: AnimationStatus::Idle,
        }
    }
}

/// `index / (len - 1)`; single-point paths are always complete
pub fn progress_at(index: usize, len: usize) -> f64 {
    match len {
        0 => 0.0,
        1 => 1.0,
        _ => (index.min(len - 1) as f64 / (len - 1) as f64).clamp(0.0, 1.0),
    }
}

/// Waypoint index a trip started `elapsed` ago would have reached.
///
/// Used to resume a trip from an externally stored start time. The result
/// is only a hint: it ignores pauses and timer drift.
pub fn resume_index(elapsed: Duration, speed: f64, len: usize) -> usize {
    if len == 0 || !speed.is_finite() || speed <= 0.0 {
        return 0;
    }
    let steps = (elapsed.as_secs_f64() * speed).floor();
    if steps >= (len - 1) as f64 {
        len - 1
    } else {
        steps as usize
    }
}
