//! Prelude module for common ridemap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use ridemap::prelude::*;`

pub use crate::core::{
    bounds::Bounds,
    config::{
        AnimationConfig, CacheConfig, InputConfig, MapConfig, MapProfile, ProjectionConfig,
        RenderConfig, ViewportConfig,
    },
    geo::{densify, distance_meters, lerp, path_length, LatLng, LatLngBounds, Point},
    map::MapView,
    projection::Projection,
    viewport::{CanvasSize, Viewport},
};

pub use crate::layers::{
    landmark::{Landmark, LandmarkKind},
    marker::{Marker, MarkerKind},
};

pub use crate::input::{
    events::{InputEvent, MapEvent, MapEventKind},
    handler::InputController,
};

pub use crate::animation::{resume_index, AnimationState, AnimationStatus, PathAnimator};

pub use crate::runtime::{spawn_repeating, AsyncHandle, AsyncSpawner, TimerHandle, TokioSpawner};

pub use crate::rendering::{
    context::{Color, DrawSurface, RecordingSurface, Stroke},
    pipeline::{RedrawReason, RenderPipeline},
    renderer::{MapRenderer, MapTheme, RenderScene, RenderStats},
};

#[cfg(feature = "egui")]
pub use crate::rendering::egui_surface::EguiSurface;

pub use crate::services::{
    ForwardGeocode, Geocoder, NominatimGeocoder, OsrmRouter, Producer, RateLimiter,
    ReverseGeocode, Route, RouteProducer, Router, Suggest, Suggestion, ThrottledCache,
};

pub use crate::{Error as MapError, Result};

pub use std::{sync::Arc, time::Duration};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
