//! Immediate-mode map painter.
//!
//! Layer order, bottom to top: background, fine grid, arterial roads,
//! landmarks, route, point markers, vehicle markers, labels.

use crate::core::{
    bounds::Bounds,
    config::RenderConfig,
    geo::{LatLng, Point},
    projection::Projection,
    viewport::{CanvasSize, Viewport},
};
use crate::layers::{landmark::Landmark, marker::Marker, marker::MarkerKind};
use crate::rendering::context::{Color, DrawSurface, Stroke};

/// Colors used by [`MapRenderer`]
#[derive(Debug, Clone, PartialEq)]
pub struct MapTheme {
    pub background: Color,
    pub grid: Stroke,
    pub arterial: Stroke,
    pub landmark: Color,
    pub route: Stroke,
    pub pickup: Color,
    pub dropoff: Color,
    pub driver: Color,
    pub passenger: Color,
    pub car: Color,
    pub marker_outline: Stroke,
    pub label: Color,
    pub label_size: f32,
}

impl Default for MapTheme {
    fn default() -> Self {
        Self {
            background: Color::rgb(242, 239, 233),
            grid: Stroke::new(Color::rgba(200, 200, 200, 120), 1.0),
            arterial: Stroke::new(Color::rgb(255, 255, 255), 4.0),
            landmark: Color::rgba(170, 211, 158, 200),
            route: Stroke::new(Color::rgb(66, 133, 244), 5.0),
            pickup: Color::rgb(52, 168, 83),
            dropoff: Color::rgb(234, 67, 53),
            driver: Color::rgb(251, 188, 5),
            passenger: Color::rgb(103, 58, 183),
            car: Color::rgb(33, 33, 33),
            marker_outline: Stroke::new(Color::WHITE, 2.0),
            label: Color::rgb(60, 60, 60),
            label_size: 12.0,
        }
    }
}

impl MapTheme {
    pub fn marker_color(&self, kind: MarkerKind) -> Color {
        match kind {
            MarkerKind::Pickup => self.pickup,
            MarkerKind::Dropoff => self.dropoff,
            MarkerKind::Driver => self.driver,
            MarkerKind::Passenger => self.passenger,
            MarkerKind::Car => self.car,
        }
    }
}

/// Everything the host wants on screen for one frame
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderScene<'a> {
    pub markers: &'a [Marker],
    pub landmarks: &'a [Landmark],
    pub route: Option<&'a [LatLng]>,
}

impl<'a> RenderScene<'a> {
    pub fn new(markers: &'a [Marker]) -> Self {
        Self {
            markers,
            ..Self::default()
        }
    }

    pub fn with_landmarks(mut self, landmarks: &'a [Landmark]) -> Self {
        self.landmarks = landmarks;
        self
    }

    pub fn with_route(mut self, route: &'a [LatLng]) -> Self {
        self.route = Some(route);
        self
    }
}

/// Counters from one render pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub grid_lines: usize,
    pub arterial_lines: usize,
    pub landmarks_drawn: usize,
    pub markers_drawn: usize,
    /// Off-canvas or malformed entities that were skipped
    pub skipped: usize,
    pub labels: usize,
}

const MARKER_RADIUS: f64 = 8.0;
const VEHICLE_HALF_LENGTH: f64 = 11.0;
const VEHICLE_HALF_WIDTH: f64 = 6.0;
const LABEL_OFFSET: f64 = 18.0;

struct PendingLabel {
    position: Point,
    text: String,
}

#[derive(Debug, Clone)]
pub struct MapRenderer {
    projection: Projection,
    config: RenderConfig,
    theme: MapTheme,
}

impl MapRenderer {
    pub fn new(projection: Projection, config: RenderConfig) -> Self {
        Self {
            projection,
            config,
            theme: MapTheme::default(),
        }
    }

    pub fn with_theme(mut self, theme: MapTheme) -> Self {
        self.theme = theme;
        self
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn theme(&self) -> &MapTheme {
        &self.theme
    }

    /// Paints a full frame onto `surface`. Never fails: anything that cannot
    /// be projected is skipped.
    pub fn render(
        &self,
        surface: &mut dyn DrawSurface,
        viewport: &Viewport,
        canvas: CanvasSize,
        scene: &RenderScene<'_>,
    ) -> RenderStats {
        let mut stats = RenderStats::default();
        surface.clear(self.theme.background);
        if canvas.is_empty() {
            return stats;
        }

        let visible = Bounds::from_canvas(canvas).expand(self.config.cull_margin_px);
        let mut labels = Vec::new();

        if self.config.draw_grid {
            stats.grid_lines =
                self.draw_grid(surface, viewport, canvas, self.config.grid_spacing_deg, self.theme.grid);
        }
        stats.arterial_lines = self.draw_grid(
            surface,
            viewport,
            canvas,
            self.config.arterial_spacing_deg,
            self.theme.arterial,
        );

        for landmark in scene.landmarks {
            match self.project_visible(&landmark.position, viewport, canvas, &visible) {
                Some(center) => {
                    surface.filled_circle(center, landmark.kind.radius(), self.theme.landmark, None);
                    stats.landmarks_drawn += 1;
                    labels.push(PendingLabel {
                        position: Point::new(center.x, center.y + landmark.kind.radius() + 8.0),
                        text: landmark.label.clone(),
                    });
                }
                None => stats.skipped += 1,
            }
        }

        if let Some(route) = scene.route {
            self.draw_route(surface, viewport, canvas, route, &visible);
        }

        let mut markers: Vec<&Marker> = scene.markers.iter().collect();
        markers.sort_by_key(|marker| marker.kind.draw_order());
        for marker in markers {
            let Some(center) = self.project_visible(&marker.position, viewport, canvas, &visible)
            else {
                stats.skipped += 1;
                continue;
            };
            self.draw_marker(surface, center, marker.kind);
            stats.markers_drawn += 1;
            if let Some(label) = &marker.label {
                labels.push(PendingLabel {
                    position: Point::new(center.x, center.y - LABEL_OFFSET),
                    text: label.clone(),
                });
            }
        }

        if self.config.draw_labels {
            for label in &labels {
                surface.text(label.position, &label.text, self.theme.label_size, self.theme.label);
            }
            stats.labels = labels.len();
        }

        stats
    }

    /// Lines at whole multiples of `spacing` degrees, positioned relative to
    /// the live viewport center. Returns the number of lines drawn.
    fn draw_grid(
        &self,
        surface: &mut dyn DrawSurface,
        viewport: &Viewport,
        canvas: CanvasSize,
        spacing: f64,
        stroke: Stroke,
    ) -> usize {
        let scale = self.projection.scale(viewport.zoom());
        if spacing.is_nan() || spacing <= 0.0 || spacing * scale < self.config.min_grid_spacing_px {
            return 0;
        }

        let origin = canvas.center();
        let center = viewport.center;
        let half_width_deg = canvas.width / 2.0 / scale;
        let half_height_deg = canvas.height / 2.0 / scale;
        let mut count = 0;

        let first_lng = ((center.lng - half_width_deg) / spacing).floor() as i64;
        let last_lng = ((center.lng + half_width_deg) / spacing).ceil() as i64;
        for step in first_lng..=last_lng {
            let x = origin.x + (step as f64 * spacing - center.lng) * scale;
            surface.line(Point::new(x, 0.0), Point::new(x, canvas.height), stroke);
            count += 1;
        }

        let first_lat = ((center.lat - half_height_deg) / spacing).floor() as i64;
        let last_lat = ((center.lat + half_height_deg) / spacing).ceil() as i64;
        for step in first_lat..=last_lat {
            let y = origin.y - (step as f64 * spacing - center.lat) * scale;
            surface.line(Point::new(0.0, y), Point::new(canvas.width, y), stroke);
            count += 1;
        }

        count
    }

    fn draw_route(
        &self,
        surface: &mut dyn DrawSurface,
        viewport: &Viewport,
        canvas: CanvasSize,
        route: &[LatLng],
        visible: &Bounds,
    ) {
        let points: Vec<Point> = route
            .iter()
            .filter(|coord| coord.is_valid())
            .map(|coord| self.projection.world_to_screen(coord, viewport, canvas))
            .collect();
        if points.len() < 2 {
            return;
        }
        let on_screen = Bounds::from_points(&points).is_some_and(|extent| extent.intersects(visible));
        if on_screen {
            surface.polyline(&points, self.theme.route);
        }
    }

    fn draw_marker(&self, surface: &mut dyn DrawSurface, center: Point, kind: MarkerKind) {
        let fill = self.theme.marker_color(kind);
        if kind.is_vehicle() {
            // Upright body with a round cab so vehicles read apart from pins
            let body = [
                Point::new(center.x - VEHICLE_HALF_WIDTH, center.y - VEHICLE_HALF_LENGTH),
                Point::new(center.x + VEHICLE_HALF_WIDTH, center.y - VEHICLE_HALF_LENGTH),
                Point::new(center.x + VEHICLE_HALF_WIDTH, center.y + VEHICLE_HALF_LENGTH),
                Point::new(center.x - VEHICLE_HALF_WIDTH, center.y + VEHICLE_HALF_LENGTH),
            ];
            surface.filled_polygon(&body, fill);
            surface.filled_circle(
                center,
                VEHICLE_HALF_WIDTH - 1.0,
                self.theme.marker_outline.color,
                None,
            );
        } else {
            surface.filled_circle(center, MARKER_RADIUS, fill, Some(self.theme.marker_outline));
        }
    }

    fn project_visible(
        &self,
        coord: &LatLng,
        viewport: &Viewport,
        canvas: CanvasSize,
        visible: &Bounds,
    ) -> Option<Point> {
        if !coord.is_valid() {
            log::warn!("renderer: skipping invalid coordinate {:?}", coord);
            return None;
        }
        let point = self.projection.world_to_screen(coord, viewport, canvas);
        (point.is_finite() && visible.contains(&point)).then_some(point)
    }
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self::new(Projection::default(), RenderConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::landmark::LandmarkKind;
    use crate::rendering::context::{DrawCommand, RecordingSurface};

    fn setup() -> (MapRenderer, Viewport, CanvasSize) {
        (
            MapRenderer::default(),
            Viewport::new(LatLng::new(24.1618, 120.6468), 15),
            CanvasSize::new(800.0, 600.0),
        )
    }

    fn circle_fills(surface: &RecordingSurface) -> Vec<Color> {
        surface
            .commands()
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Circle { fill, stroke: Some(_), .. } => Some(*fill),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_frame_starts_with_clear_and_grid() {
        let (renderer, viewport, canvas) = setup();
        let mut surface = RecordingSurface::new();
        let stats = renderer.render(&mut surface, &viewport, canvas, &RenderScene::default());

        assert!(matches!(surface.commands()[0], DrawCommand::Clear(_)));
        assert!(stats.grid_lines > 0);
        assert!(stats.arterial_lines > 0);
        assert!(matches!(surface.commands()[1], DrawCommand::Line { .. }));
    }

    #[test]
    fn test_dense_grid_is_skipped_when_zoomed_out() {
        let (renderer, _, canvas) = setup();
        let viewport = Viewport::new(LatLng::new(24.1618, 120.6468), 5);
        let mut surface = RecordingSurface::new();
        let stats = renderer.render(&mut surface, &viewport, canvas, &RenderScene::default());

        assert_eq!(stats.grid_lines, 0);
        assert_eq!(stats.arterial_lines, 0);
        assert_eq!(surface.len(), 1);
    }

    #[test]
    fn test_grid_follows_live_center() {
        let (renderer, mut viewport, canvas) = setup();
        let first_line = |viewport: &Viewport| {
            let mut surface = RecordingSurface::new();
            renderer.render(&mut surface, viewport, canvas, &RenderScene::default());
            match &surface.commands()[1] {
                DrawCommand::Line { from, .. } => from.x,
                other => panic!("expected a grid line, got {:?}", other),
            }
        };

        let before = first_line(&viewport);
        let scale = renderer.projection().scale(viewport.zoom());
        viewport.set_center(LatLng::new(24.1618, 120.6468 + 3.0 / scale));
        let after = first_line(&viewport);

        // Three pixels east of the old center: lines shift three pixels west
        let spacing_px = renderer.config().grid_spacing_deg * scale;
        let shift = (before - after).rem_euclid(spacing_px);
        assert!((shift - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_vehicles_drawn_above_points() {
        let (renderer, viewport, canvas) = setup();
        let here = viewport.center;
        let markers = vec![
            Marker::car("car", here),
            Marker::pickup(here),
            Marker::dropoff(LatLng::new(here.lat + 0.001, here.lng)),
        ];
        let mut surface = RecordingSurface::new();
        let stats = renderer.render(&mut surface, &viewport, canvas, &RenderScene::new(&markers));

        assert_eq!(stats.markers_drawn, 3);
        let theme = renderer.theme();
        assert_eq!(circle_fills(&surface), vec![theme.pickup, theme.dropoff]);

        let polygon_at = surface
            .commands()
            .iter()
            .position(|command| matches!(command, DrawCommand::Polygon { .. }))
            .unwrap();
        let last_pin = surface
            .commands()
            .iter()
            .rposition(|command| matches!(command, DrawCommand::Circle { stroke: Some(_), .. }))
            .unwrap();
        assert!(polygon_at > last_pin);
    }

    #[test]
    fn test_offscreen_and_invalid_markers_are_skipped() {
        let (renderer, viewport, canvas) = setup();
        let markers = vec![
            Marker::pickup(viewport.center),
            Marker::dropoff(LatLng::new(viewport.center.lat + 1.0, viewport.center.lng)),
            Marker::car("ghost", LatLng::new(f64::NAN, 120.0)),
        ];
        let mut surface = RecordingSurface::new();
        let stats = renderer.render(&mut surface, &viewport, canvas, &RenderScene::new(&markers));

        assert_eq!(stats.markers_drawn, 1);
        assert_eq!(stats.skipped, 2);
    }

    #[test]
    fn test_marker_just_outside_canvas_is_kept_within_margin() {
        let (renderer, viewport, canvas) = setup();
        let projection = renderer.projection();
        let near = projection.screen_to_world(&Point::new(-20.0, 300.0), &viewport, canvas);
        let far = projection.screen_to_world(&Point::new(-200.0, 300.0), &viewport, canvas);
        let markers = vec![Marker::pickup(near), Marker::dropoff(far)];

        let mut surface = RecordingSurface::new();
        let stats = renderer.render(&mut surface, &viewport, canvas, &RenderScene::new(&markers));
        assert_eq!(stats.markers_drawn, 1);
    }

    #[test]
    fn test_labels_drawn_last() {
        let (renderer, viewport, canvas) = setup();
        let markers = vec![Marker::pickup(viewport.center).with_label("Pickup")];
        let landmarks = vec![Landmark::new(viewport.center, "Park Lane", LandmarkKind::Mall)];
        let route = vec![
            viewport.center,
            LatLng::new(viewport.center.lat + 0.002, viewport.center.lng + 0.002),
        ];
        let scene = RenderScene::new(&markers)
            .with_landmarks(&landmarks)
            .with_route(&route);

        let mut surface = RecordingSurface::new();
        let stats = renderer.render(&mut surface, &viewport, canvas, &scene);

        assert_eq!(stats.labels, 2);
        assert_eq!(surface.texts(), vec!["Park Lane", "Pickup"]);
        let commands = surface.commands();
        let first_text = commands
            .iter()
            .position(|command| matches!(command, DrawCommand::Text { .. }))
            .unwrap();
        assert!(commands[first_text..]
            .iter()
            .all(|command| matches!(command, DrawCommand::Text { .. })));
        assert!(commands
            .iter()
            .any(|command| matches!(command, DrawCommand::Polyline { .. })));
    }
}
