//! Geographic ⇄ screen mapping.
//!
//! The map uses a flat degree grid: `scale` pixels per degree in both axes,
//! doubling with every zoom level. This keeps the mapping an exact affine
//! transform, so `screen_to_world` inverts `world_to_screen` up to float
//! rounding.

use crate::core::{
    config::ProjectionConfig,
    geo::{LatLng, LatLngBounds, Point},
    viewport::{CanvasSize, Viewport},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    base_scale: f64,
    ref_zoom: u8,
}

impl Projection {
    pub fn new(base_scale: f64, ref_zoom: u8) -> Self {
        Self {
            base_scale,
            ref_zoom,
        }
    }

    pub fn from_config(config: &ProjectionConfig) -> Self {
        Self::new(config.base_scale, config.ref_zoom)
    }

    /// Pixels per degree at `zoom`: `base * 2^(zoom - ref_zoom)`
    pub fn scale(&self, zoom: u8) -> f64 {
        self.base_scale * 2_f64.powi(i32::from(zoom) - i32::from(self.ref_zoom))
    }

    /// Projects a coordinate to screen pixels (origin top-left, y down)
    pub fn world_to_screen(&self, coord: &LatLng, viewport: &Viewport, canvas: CanvasSize) -> Point {
        let scale = self.scale(viewport.zoom());
        let origin = canvas.center();
        Point::new(
            origin.x + (coord.lng - viewport.center.lng) * scale,
            origin.y - (coord.lat - viewport.center.lat) * scale,
        )
    }

    /// Inverse of [`Projection::world_to_screen`]
    pub fn screen_to_world(&self, point: &Point, viewport: &Viewport, canvas: CanvasSize) -> LatLng {
        let scale = self.scale(viewport.zoom());
        let origin = canvas.center();
        LatLng::new(
            viewport.center.lat - (point.y - origin.y) / scale,
            viewport.center.lng + (point.x - origin.x) / scale,
        )
    }

    /// Converts a screen-space drag delta into degrees.
    ///
    /// The latitude component is negated because screen y grows southward.
    pub fn screen_delta_to_world(&self, delta: &Point, zoom: u8) -> LatLng {
        let scale = self.scale(zoom);
        LatLng::new(-delta.y / scale, delta.x / scale)
    }

    /// Geographic area currently covered by the canvas
    pub fn visible_bounds(&self, viewport: &Viewport, canvas: CanvasSize) -> LatLngBounds {
        let north_west = self.screen_to_world(&Point::new(0.0, 0.0), viewport, canvas);
        let south_east =
            self.screen_to_world(&Point::new(canvas.width, canvas.height), viewport, canvas);
        LatLngBounds::new(
            LatLng::new(south_east.lat, north_west.lng),
            LatLng::new(north_west.lat, south_east.lng),
        )
    }

    /// Highest zoom within the viewport limits at which `bounds` fits the
    /// canvas with `padding` pixels on each side.
    pub fn fit_zoom(
        &self,
        bounds: &LatLngBounds,
        viewport: &Viewport,
        canvas: CanvasSize,
        padding: f64,
    ) -> u8 {
        let span = bounds.span();
        let usable_width = (canvas.width - 2.0 * padding).max(1.0);
        let usable_height = (canvas.height - 2.0 * padding).max(1.0);

        let mut best = viewport.min_zoom();
        for zoom in viewport.min_zoom()..=viewport.max_zoom() {
            let scale = self.scale(zoom);
            if span.lng * scale <= usable_width && span.lat * scale <= usable_height {
                best = zoom;
            } else {
                break;
            }
        }
        best
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::from_config(&ProjectionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_center_maps_to_canvas_center() {
        let projection = Projection::default();
        let viewport = Viewport::new(LatLng::new(24.16, 120.64), 15);
        let canvas = CanvasSize::new(800.0, 600.0);

        let p = projection.world_to_screen(&viewport.center, &viewport, canvas);
        assert!((p.x - 400.0).abs() < EPSILON);
        assert!((p.y - 300.0).abs() < EPSILON);
    }

    #[test]
    fn test_north_is_up() {
        let projection = Projection::default();
        let viewport = Viewport::new(LatLng::new(24.16, 120.64), 15);
        let canvas = CanvasSize::new(800.0, 600.0);

        let north = projection.world_to_screen(&LatLng::new(24.161, 120.64), &viewport, canvas);
        let east = projection.world_to_screen(&LatLng::new(24.16, 120.641), &viewport, canvas);
        assert!(north.y < 300.0);
        assert!(east.x > 400.0);
    }

    #[test]
    fn test_round_trip() {
        let projection = Projection::default();
        let canvas = CanvasSize::new(1024.0, 768.0);
        let centers = [
            LatLng::new(24.16, 120.64),
            LatLng::new(-33.86, 151.21),
            LatLng::new(51.5, -0.12),
        ];
        let coords = [
            LatLng::new(24.1600, 120.6400),
            LatLng::new(24.1712, 120.6233),
            LatLng::new(-33.9, 151.0),
            LatLng::new(0.0, 0.0),
        ];

        for center in centers {
            for zoom in [3_u8, 10, 15, 19] {
                let viewport = Viewport::new(center, zoom);
                for coord in coords {
                    let screen = projection.world_to_screen(&coord, &viewport, canvas);
                    let back = projection.screen_to_world(&screen, &viewport, canvas);
                    assert!(back.approx_eq(&coord, 1e-9), "{coord:?} -> {back:?} at z{zoom}");
                }
            }
        }
    }

    #[test]
    fn test_scale_doubles_per_zoom() {
        let projection = Projection::default();
        assert!((projection.scale(11) / projection.scale(10) - 2.0).abs() < EPSILON);
        assert!((projection.scale(0) - 256.0 / 360.0).abs() < EPSILON);
    }

    #[test]
    fn test_screen_delta_inverts_y() {
        let projection = Projection::default();
        let delta = projection.screen_delta_to_world(&Point::new(10.0, 10.0), 15);
        assert!(delta.lng > 0.0);
        assert!(delta.lat < 0.0);
    }

    #[test]
    fn test_fit_zoom() {
        let projection = Projection::default();
        let viewport = Viewport::new(LatLng::new(24.16, 120.64), 10);
        let canvas = CanvasSize::new(800.0, 600.0);
        let bounds = LatLngBounds::new(LatLng::new(24.16, 120.64), LatLng::new(24.18, 120.66));

        let zoom = projection.fit_zoom(&bounds, &viewport, canvas, 20.0);
        assert!(0.02 * projection.scale(zoom) <= 560.0);
        assert!(zoom == viewport.max_zoom() || 0.02 * projection.scale(zoom + 1) > 560.0);
    }

    #[test]
    fn test_visible_bounds_contains_center() {
        let projection = Projection::default();
        let viewport = Viewport::new(LatLng::new(24.16, 120.64), 15);
        let bounds = projection.visible_bounds(&viewport, CanvasSize::new(800.0, 600.0));
        assert!(bounds.contains(&viewport.center));
        assert!(bounds.north_east.lat > bounds.south_west.lat);
    }
}
