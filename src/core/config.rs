//! Configuration system for map behavior tuning
//!
//! Groups every engine-wide knob into one serializable structure. Presets
//! cover the common cases; `MapProfile::Custom` takes a hand-built value and
//! `MapConfig::from_json_str` loads one from a file.

use crate::core::constants::*;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum MapProfile {
    Balanced,
    /// Fewer draw calls for slow devices
    Lite,
    /// Denser grid and wider culling margin
    Detailed,
    Custom(MapConfig),
}

impl MapProfile {
    pub fn resolve(&self) -> MapConfig {
        match self {
            Self::Balanced => MapConfig::default(),
            Self::Lite => MapConfig {
                render: RenderConfig {
                    grid_spacing_deg: GRID_SPACING_DEG * 2.0,
                    draw_grid: false,
                    cull_margin_px: CULL_MARGIN_PX / 2.0,
                    ..RenderConfig::default()
                },
                ..MapConfig::default()
            },
            Self::Detailed => MapConfig {
                render: RenderConfig {
                    grid_spacing_deg: GRID_SPACING_DEG / 2.0,
                    cull_margin_px: CULL_MARGIN_PX * 2.0,
                    ..RenderConfig::default()
                },
                ..MapConfig::default()
            },
            Self::Custom(config) => config.clone(),
        }
    }
}

impl Default for MapProfile {
    fn default() -> Self {
        Self::Balanced
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub viewport: ViewportConfig,
    pub projection: ProjectionConfig,
    pub input: InputConfig,
    pub render: RenderConfig,
    pub animation: AnimationConfig,
    pub cache: CacheConfig,
}

impl MapConfig {
    /// Parses a JSON document; missing sections fall back to defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: MapConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rejects values that would make the engine misbehave
    pub fn validate(&self) -> Result<()> {
        if self.viewport.min_zoom > self.viewport.max_zoom {
            return Err(MapError::Config(format!(
                "min_zoom {} exceeds max_zoom {}",
                self.viewport.min_zoom, self.viewport.max_zoom
            )));
        }
        if !(self.projection.base_scale.is_finite() && self.projection.base_scale > 0.0) {
            return Err(MapError::Config("base_scale must be positive".to_string()));
        }
        if !(self.animation.speed.is_finite() && self.animation.speed > 0.0) {
            return Err(MapError::Config("animation speed must be positive".to_string()));
        }
        if self.cache.max_entries == 0 {
            return Err(MapError::Config("cache max_entries must be at least 1".to_string()));
        }
        if !(self.render.grid_spacing_deg > 0.0 && self.render.arterial_spacing_deg > 0.0) {
            return Err(MapError::Config("grid spacing must be positive".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub center: (f64, f64),
    pub zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Pixels per degree at `ref_zoom`
    pub base_scale: f64,
    pub ref_zoom: u8,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            base_scale: BASE_PIXELS_PER_DEGREE,
            ref_zoom: REF_ZOOM,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub pan_on_drag: bool,
    pub zoom_on_wheel: bool,
    /// Largest pointer travel in pixels still classified as a click
    pub click_threshold_px: f64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            pan_on_drag: true,
            zoom_on_wheel: true,
            click_threshold_px: CLICK_THRESHOLD_PX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub draw_grid: bool,
    pub grid_spacing_deg: f64,
    pub arterial_spacing_deg: f64,
    pub min_grid_spacing_px: f64,
    pub cull_margin_px: f64,
    pub draw_labels: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            draw_grid: true,
            grid_spacing_deg: GRID_SPACING_DEG,
            arterial_spacing_deg: ARTERIAL_SPACING_DEG,
            min_grid_spacing_px: MIN_GRID_SPACING_PX,
            cull_margin_px: CULL_MARGIN_PX,
            draw_labels: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Waypoints advanced per second
    pub speed: f64,
}

impl AnimationConfig {
    /// Tick period derived from `speed`
    pub fn tick_period(&self) -> Duration {
        tick_period(self.speed)
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            speed: DEFAULT_ANIMATION_SPEED,
        }
    }
}

/// `1000 / speed` milliseconds; non-positive speeds fall back to the default
pub fn tick_period(speed: f64) -> Duration {
    let speed = if speed.is_finite() && speed > 0.0 {
        speed
    } else {
        DEFAULT_ANIMATION_SPEED
    };
    Duration::from_secs_f64(1.0 / speed)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_entries: usize,
    pub geocoder_min_interval_ms: u64,
    pub router_min_interval_ms: u64,
    pub key_precision: u32,
}

impl CacheConfig {
    pub fn geocoder_min_interval(&self) -> Duration {
        Duration::from_millis(self.geocoder_min_interval_ms)
    }

    pub fn router_min_interval(&self) -> Duration {
        Duration::from_millis(self.router_min_interval_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_CACHE_ENTRIES,
            geocoder_min_interval_ms: GEOCODER_MIN_INTERVAL_MS,
            router_min_interval_ms: ROUTER_MIN_INTERVAL_MS,
            key_precision: CACHE_KEY_PRECISION,
        }
    }
}
