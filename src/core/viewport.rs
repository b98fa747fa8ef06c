use crate::core::constants::{DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, DEFAULT_ZOOM_DELTA};
use crate::core::geo::{LatLng, Point};
use serde::{Deserialize, Serialize};

/// Size of the drawing surface in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Center of the canvas in screen coordinates
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// A canvas with no usable area cannot be drawn on
    pub fn is_empty(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite()) || self.width <= 0.0 || self.height <= 0.0
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// The visible part of the map: center and integer zoom level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level, always within `[min_zoom, max_zoom]`
    zoom: u8,
    min_zoom: u8,
    max_zoom: u8,
}

impl Viewport {
    /// Creates a new viewport with the default zoom limits
    pub fn new(center: LatLng, zoom: u8) -> Self {
        Self::with_limits(center, zoom, DEFAULT_MIN_ZOOM, DEFAULT_MAX_ZOOM)
    }

    /// Creates a new viewport; swapped limits are reordered
    pub fn with_limits(center: LatLng, zoom: u8, min_zoom: u8, max_zoom: u8) -> Self {
        let (min_zoom, max_zoom) = if min_zoom <= max_zoom {
            (min_zoom, max_zoom)
        } else {
            (max_zoom, min_zoom)
        };
        let center = if center.is_valid() {
            center
        } else {
            log::warn!("invalid viewport center {:?}, using origin", center);
            LatLng::default()
        };
        Self {
            center,
            zoom: zoom.clamp(min_zoom, max_zoom),
            min_zoom,
            max_zoom,
        }
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn min_zoom(&self) -> u8 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    /// Sets the center. Invalid coordinates are ignored and `false` is returned.
    pub fn set_center(&mut self, center: LatLng) -> bool {
        if !center.is_valid() {
            log::warn!("ignoring invalid center {:?}", center);
            return false;
        }
        self.center = center;
        true
    }

    /// Sets the zoom level, clamping to the valid range. Returns whether it changed.
    pub fn set_zoom(&mut self, zoom: u8) -> bool {
        let clamped = zoom.clamp(self.min_zoom, self.max_zoom);
        let changed = clamped != self.zoom;
        self.zoom = clamped;
        changed
    }

    /// Sets the zoom limits, re-clamping the current zoom
    pub fn set_zoom_limits(&mut self, min_zoom: u8, max_zoom: u8) {
        let (min_zoom, max_zoom) = if min_zoom <= max_zoom {
            (min_zoom, max_zoom)
        } else {
            (max_zoom, min_zoom)
        };
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom = self.zoom.clamp(min_zoom, max_zoom);
    }

    pub fn zoom_in(&mut self) -> bool {
        self.set_zoom(self.zoom.saturating_add(DEFAULT_ZOOM_DELTA))
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set_zoom(self.zoom.saturating_sub(DEFAULT_ZOOM_DELTA))
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(
            LatLng::from(crate::core::constants::DEFAULT_CENTER),
            crate::core::constants::DEFAULT_ZOOM,
        )
    }
}
