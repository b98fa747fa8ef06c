use crate::{
    core::{
        config::{MapConfig, MapProfile},
        geo::{LatLng, LatLngBounds, Point},
        projection::Projection,
        viewport::{CanvasSize, Viewport},
    },
    input::{
        events::{InputEvent, MapEvent, MapEventKind},
        handler::{zoom_response, EventManager, InputController, InputResponse},
    },
    rendering::{
        context::DrawSurface,
        pipeline::{RedrawReason, RenderPipeline},
        renderer::{MapRenderer, RenderScene, RenderStats},
    },
    Result,
};

/// The hosting view's map: viewport, canvas, input and redraw bookkeeping.
///
/// The host pushes input events and entity lists in, and receives
/// `on_map_click`, `on_center_change` and `on_zoom_change` callbacks out.
/// Callbacks run synchronously at the end of the call that caused them,
/// after the viewport has been updated.
pub struct MapView {
    viewport: Viewport,
    canvas: CanvasSize,
    config: MapConfig,
    projection: Projection,
    input: InputController,
    renderer: MapRenderer,
    pipeline: RenderPipeline,
    event_manager: EventManager,
}

impl MapView {
    pub fn new(config: MapConfig) -> Result<Self> {
        config.validate()?;
        let projection = Projection::from_config(&config.projection);
        let viewport = Viewport::with_limits(
            LatLng::from(config.viewport.center),
            config.viewport.zoom,
            config.viewport.min_zoom,
            config.viewport.max_zoom,
        );

        Ok(Self {
            viewport,
            canvas: CanvasSize::default(),
            input: InputController::new(projection, config.input.clone()),
            renderer: MapRenderer::new(projection, config.render.clone()),
            pipeline: RenderPipeline::new(),
            event_manager: EventManager::new(),
            projection,
            config,
        })
    }

    pub fn from_profile(profile: &MapProfile) -> Result<Self> {
        Self::new(profile.resolve())
    }

    pub fn with_canvas(mut self, canvas: CanvasSize) -> Self {
        self.canvas = canvas;
        self
    }

    pub fn with_renderer(mut self, renderer: MapRenderer) -> Self {
        self.renderer = renderer;
        self.pipeline.force();
        self
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn center(&self) -> LatLng {
        self.viewport.center
    }

    pub fn zoom(&self) -> u8 {
        self.viewport.zoom()
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn renderer(&self) -> &MapRenderer {
        &self.renderer
    }

    pub fn is_dragging(&self) -> bool {
        self.input.is_dragging()
    }

    pub fn zoom_in(&mut self) -> bool {
        let changed = self.viewport.zoom_in();
        self.apply(zoom_response(changed, &self.viewport));
        changed
    }

    pub fn zoom_out(&mut self) -> bool {
        let changed = self.viewport.zoom_out();
        self.apply(zoom_response(changed, &self.viewport));
        changed
    }

    /// Sets the zoom level, clamped to the viewport limits
    pub fn set_zoom(&mut self, zoom: u8) -> bool {
        let changed = self.viewport.set_zoom(zoom);
        self.apply(zoom_response(changed, &self.viewport));
        changed
    }

    /// Moves the center directly, bypassing gesture handling.
    ///
    /// Invalid coordinates are ignored. Returns whether the center changed.
    pub fn recenter(&mut self, anchor: LatLng) -> bool {
        if !anchor.is_valid() {
            log::warn!("map: ignoring recenter to {:?}", anchor);
            return false;
        }
        if anchor == self.viewport.center {
            return false;
        }
        self.viewport.set_center(anchor);
        self.apply(InputResponse {
            events: vec![MapEvent::CenterChanged { center: anchor }],
            needs_redraw: true,
        });
        true
    }

    /// Centers on `path` at the highest zoom that shows all of it
    pub fn fit_path(&mut self, path: &[LatLng], padding: f64) -> bool {
        let Some(bounds) = LatLngBounds::from_points(path) else {
            return false;
        };
        let zoom = self
            .projection
            .fit_zoom(&bounds, &self.viewport, self.canvas, padding);
        let moved = self.recenter(bounds.center());
        self.set_zoom(zoom) || moved
    }

    pub fn resize(&mut self, canvas: CanvasSize) -> bool {
        let response = self.input.handle_event(
            &InputEvent::Resize { size: canvas },
            &mut self.viewport,
            &mut self.canvas,
        );
        let changed = response.needs_redraw;
        self.apply(response);
        changed
    }

    /// Feeds one pointer or canvas event through the input controller and
    /// dispatches the resulting map events. Returns the events emitted.
    pub fn handle_input(&mut self, event: &InputEvent) -> Vec<MapEvent> {
        let response = self
            .input
            .handle_event(event, &mut self.viewport, &mut self.canvas);
        self.apply(response)
    }

    fn apply(&mut self, response: InputResponse) -> Vec<MapEvent> {
        if response.needs_redraw {
            self.pipeline.mark_viewport_changed();
        }
        for event in response.events {
            if let MapEvent::Resized { .. } = event {
                self.pipeline.mark_resized();
            }
            self.event_manager.emit(event);
        }
        self.event_manager.process_events()
    }

    pub fn on_map_click<F>(&mut self, callback: F)
    where
        F: Fn(LatLng) + Send + Sync + 'static,
    {
        self.event_manager.on(MapEventKind::Click, move |event| {
            if let MapEvent::Click { lat_lng, .. } = event {
                callback(*lat_lng);
            }
        });
    }

    pub fn on_center_change<F>(&mut self, callback: F)
    where
        F: Fn(LatLng) + Send + Sync + 'static,
    {
        self.event_manager.on(MapEventKind::CenterChanged, move |event| {
            if let MapEvent::CenterChanged { center } = event {
                callback(*center);
            }
        });
    }

    pub fn on_zoom_change<F>(&mut self, callback: F)
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        self.event_manager.on(MapEventKind::ZoomChanged, move |event| {
            if let MapEvent::ZoomChanged { zoom } = event {
                callback(*zoom);
            }
        });
    }

    /// Register a listener for any map event kind
    pub fn on<F>(&mut self, kind: MapEventKind, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.event_manager.on(kind, callback);
    }

    /// Drops every registered callback. Used on host teardown.
    pub fn clear_listeners(&mut self) {
        self.event_manager.clear_listeners();
    }

    pub fn world_to_screen(&self, coord: &LatLng) -> Point {
        self.projection
            .world_to_screen(coord, &self.viewport, self.canvas)
    }

    pub fn screen_to_world(&self, point: &Point) -> LatLng {
        self.projection
            .screen_to_world(point, &self.viewport, self.canvas)
    }

    pub fn visible_bounds(&self) -> LatLngBounds {
        self.projection.visible_bounds(&self.viewport, self.canvas)
    }

    pub fn request_redraw(&mut self) {
        self.pipeline.force();
    }

    pub fn needs_redraw(&self) -> bool {
        self.pipeline.needs_redraw()
    }

    /// Paints a frame if anything changed since the last one.
    ///
    /// `animated_position` is the simulated vehicle position, if any; a
    /// change in it alone is enough to trigger a repaint. Returns `None`
    /// when the frame was skipped.
    pub fn render(
        &mut self,
        surface: &mut dyn DrawSurface,
        scene: &RenderScene<'_>,
        animated_position: Option<LatLng>,
    ) -> Option<(Vec<RedrawReason>, RenderStats)> {
        self.pipeline
            .observe(&self.viewport, self.canvas, scene.markers, animated_position);
        let reasons = self.pipeline.take_reasons();
        if reasons.is_empty() {
            return None;
        }
        let stats = self
            .renderer
            .render(surface, &self.viewport, self.canvas, scene);
        Some((reasons, stats))
    }
}

impl Default for MapView {
    fn default() -> Self {
        let config = MapConfig::default();
        let projection = Projection::from_config(&config.projection);
        Self {
            viewport: Viewport::default(),
            canvas: CanvasSize::default(),
            input: InputController::new(projection, config.input.clone()),
            renderer: MapRenderer::new(projection, config.render.clone()),
            pipeline: RenderPipeline::new(),
            event_manager: EventManager::new(),
            projection,
            config,
        }
    }
}

impl std::fmt::Debug for MapView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapView")
            .field("viewport", &self.viewport)
            .field("canvas", &self.canvas)
            .field("events", &self.event_manager)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::marker::Marker;
    use crate::rendering::context::RecordingSurface;
    use std::sync::{Arc, Mutex};

    fn map() -> MapView {
        MapView::new(MapConfig::default()).unwrap()
    }

    #[test]
    fn test_map_creation() {
        let map = map();
        assert_eq!(map.center(), LatLng::from(crate::core::constants::DEFAULT_CENTER));
        assert_eq!(map.zoom(), crate::core::constants::DEFAULT_ZOOM);
        assert_eq!(map.canvas(), CanvasSize::default());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = MapConfig::default();
        config.viewport.min_zoom = 18;
        config.viewport.max_zoom = 2;
        assert!(MapView::new(config).is_err());
    }

    #[test]
    fn test_zoom_controls_clamp_and_notify() {
        let mut map = map();
        let zooms = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&zooms);
        map.on_zoom_change(move |zoom| sink.lock().unwrap().push(zoom));

        for _ in 0..30 {
            map.zoom_in();
        }
        assert_eq!(map.zoom(), map.viewport().max_zoom());
        for _ in 0..30 {
            map.zoom_out();
        }
        assert_eq!(map.zoom(), map.viewport().min_zoom());

        let zooms = zooms.lock().unwrap();
        let expected_changes = (map.viewport().max_zoom() - crate::core::constants::DEFAULT_ZOOM)
            + (map.viewport().max_zoom() - map.viewport().min_zoom());
        assert_eq!(zooms.len(), expected_changes as usize);
    }

    #[test]
    fn test_recenter_bypasses_gestures() {
        let mut map = map();
        let centers = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&centers);
        map.on_center_change(move |center| sink.lock().unwrap().push(center));

        let target = LatLng::new(24.15, 120.66);
        assert!(map.recenter(target));
        assert!(!map.recenter(target));
        assert!(!map.recenter(LatLng::new(f64::NAN, 0.0)));

        assert_eq!(map.center(), target);
        assert_eq!(*centers.lock().unwrap(), vec![target]);
    }

    #[test]
    fn test_click_callback_receives_projected_point() {
        let mut map = map();
        let clicks = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&clicks);
        map.on_map_click(move |coord| sink.lock().unwrap().push(coord));

        let center = map.center();
        map.handle_input(&InputEvent::PointerDown { position: Point::new(400.0, 300.0) });
        map.handle_input(&InputEvent::PointerUp { position: Point::new(400.0, 300.0) });

        let clicks = clicks.lock().unwrap();
        assert_eq!(clicks.len(), 1);
        assert!(clicks[0].approx_eq(&center, 1e-12));
    }

    #[test]
    fn test_fit_path() {
        let mut map = map();
        let path = [LatLng::new(24.14, 120.63), LatLng::new(24.18, 120.69)];
        assert!(map.fit_path(&path, 20.0));

        let visible = map.visible_bounds();
        assert!(path.iter().all(|p| visible.contains(p)));
        assert!(!map.fit_path(&[], 20.0));
    }

    #[test]
    fn test_render_only_when_something_changed() {
        let mut map = map();
        let mut surface = RecordingSurface::new();
        let markers = vec![Marker::pickup(map.center())];
        let scene = RenderScene::new(&markers);

        let (reasons, stats) = map.render(&mut surface, &scene, None).unwrap();
        assert_eq!(reasons, vec![RedrawReason::Initial]);
        assert_eq!(stats.markers_drawn, 1);
        assert!(map.render(&mut surface, &scene, None).is_none());

        map.zoom_out();
        let (reasons, _) = map.render(&mut surface, &scene, None).unwrap();
        assert_eq!(reasons, vec![RedrawReason::ViewportChanged]);

        let car = Some(LatLng::new(24.1619, 120.6469));
        let (reasons, _) = map.render(&mut surface, &scene, car).unwrap();
        assert_eq!(reasons, vec![RedrawReason::PositionChanged]);

        map.resize(CanvasSize::new(400.0, 300.0));
        let (reasons, _) = map.render(&mut surface, &scene, car).unwrap();
        assert!(reasons.contains(&RedrawReason::Resized));
    }
}
