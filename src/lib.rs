//! # ridemap
//!
//! Map core for a rider-dispatch client: projection, an immediate-mode
//! renderer, pointer-driven pan/zoom, a path-following trip animator and
//! throttled caches in front of geocoding and routing services.
//!
//! The host view owns a [`MapView`] (viewport, input, redraw bookkeeping)
//! and a [`PathAnimator`]; it pushes markers and paths in and gets
//! callbacks out. Nothing here polls a backend or persists state.

pub mod animation;
pub mod core;
pub mod input;
pub mod layers;
pub mod prelude;
pub mod rendering;
pub mod runtime;
pub mod services;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    bounds::Bounds,
    config::{MapConfig, MapProfile},
    geo::{LatLng, LatLngBounds, Point},
    map::MapView,
    projection::Projection,
    viewport::{CanvasSize, Viewport},
};

pub use animation::{AnimationState, AnimationStatus, PathAnimator};

pub use input::{events::InputEvent, events::MapEvent, handler::InputController};

pub use layers::{
    landmark::{Landmark, LandmarkKind},
    marker::{Marker, MarkerKind},
};

pub use rendering::{
    context::{DrawSurface, RecordingSurface},
    pipeline::RenderPipeline,
    renderer::{MapRenderer, RenderScene},
};

pub use services::{
    cache::ThrottledCache,
    geocoding::Geocoder,
    limiter::RateLimiter,
    routing::{Route, Router},
};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// Geocoding or routing collaborator could not answer
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A pending wait was cancelled by teardown
    #[error("Cancelled")]
    Cancelled,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

/// Error type alias for convenience
pub type Error = MapError;

/// Installs `env_logger` once; later calls are no-ops.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::builder().is_test(cfg!(test)).try_init();
}
