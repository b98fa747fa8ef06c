pub mod animator;
pub mod state;

// Re-export commonly used types and functions for convenience
pub use animator::{CompleteCallback, PathAnimator, ProgressCallback};
pub use state::{progress_at, resume_index, AnimationState, AnimationStatus};
