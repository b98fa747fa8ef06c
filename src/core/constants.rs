//! Engine-wide defaults. Keeping them in a single place makes it easier to
//! tweak the magic numbers shared by the viewport, renderer and services.

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Pixels per degree at [`REF_ZOOM`]. Matches the equatorial density of a
/// 256-px Web Mercator tile at zoom 0.
pub const BASE_PIXELS_PER_DEGREE: f64 = 256.0 / 360.0;

/// Zoom level at which [`BASE_PIXELS_PER_DEGREE`] applies.
pub const REF_ZOOM: u8 = 0;

pub const DEFAULT_MIN_ZOOM: u8 = 3;
pub const DEFAULT_MAX_ZOOM: u8 = 19;
pub const DEFAULT_ZOOM: u8 = 15;

/// Programmatic +/- zoom step when calling `zoom_in/zoom_out`.
pub const DEFAULT_ZOOM_DELTA: u8 = 1;

/// Largest pointer travel (px) that still counts as a click.
pub const CLICK_THRESHOLD_PX: f64 = 5.0;

/// Fine background grid spacing in degrees.
pub const GRID_SPACING_DEG: f64 = 0.001;

/// Arterial road spacing in degrees.
pub const ARTERIAL_SPACING_DEG: f64 = 0.005;

/// Grid passes closer than this on screen are skipped.
pub const MIN_GRID_SPACING_PX: f64 = 6.0;

/// Entities this far outside the canvas are still drawn.
pub const CULL_MARGIN_PX: f64 = 48.0;

/// Waypoints advanced per second by the path animator.
pub const DEFAULT_ANIMATION_SPEED: f64 = 1.0;

/// Public geocoders ask for at most one request per second.
pub const GEOCODER_MIN_INTERVAL_MS: u64 = 1_000;

pub const ROUTER_MIN_INTERVAL_MS: u64 = 250;

pub const DEFAULT_CACHE_ENTRIES: usize = 256;

/// Decimal places kept when turning a coordinate into a cache key.
/// Five places is roughly one meter.
pub const CACHE_KEY_PRECISION: u32 = 5;

/// Speed assumed for straight-line fallback routes (about 30 km/h).
pub const FALLBACK_SPEED_MPS: f64 = 8.33;

/// Default map center (Taichung city hall).
pub const DEFAULT_CENTER: (f64, f64) = (24.1618, 120.6468);
