use crate::{
    core::{
        config::InputConfig,
        geo::{LatLng, Point},
        projection::Projection,
        viewport::{CanvasSize, Viewport},
    },
    input::events::{InputEvent, MapEvent, MapEventKind},
};
use fxhash::FxHashMap;
use std::collections::VecDeque;

/// Pointer state captured on pointer-down
#[derive(Debug, Clone, Copy, PartialEq)]
struct DragState {
    start: Point,
    anchor_center: LatLng,
    /// Largest distance from `start` seen during the gesture
    max_distance: f64,
}

/// Result of feeding one input event to the controller
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputResponse {
    pub events: Vec<MapEvent>,
    pub needs_redraw: bool,
}

/// Turns pointer gestures into viewport changes.
///
/// A gesture is a pan while the pointer moves; on release it is classified
/// as a click when it never travelled past the click threshold, in which
/// case the center snaps back to where the gesture began.
#[derive(Debug, Clone)]
pub struct InputController {
    projection: Projection,
    config: InputConfig,
    drag: Option<DragState>,
}

impl InputController {
    pub fn new(projection: Projection, config: InputConfig) -> Self {
        Self {
            projection,
            config,
            drag: None,
        }
    }

    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn handle_event(
        &mut self,
        event: &InputEvent,
        viewport: &mut Viewport,
        canvas: &mut CanvasSize,
    ) -> InputResponse {
        match event {
            InputEvent::PointerDown { position } => {
                self.pointer_down(*position, viewport);
                InputResponse::default()
            }
            InputEvent::PointerMove { position } => self.pointer_move(*position, viewport),
            InputEvent::PointerUp { position } => self.pointer_up(*position, viewport, *canvas),
            InputEvent::PointerLeave => self.pointer_leave(viewport),
            InputEvent::Wheel { delta, .. } => self.wheel(*delta, viewport),
            InputEvent::Resize { size } => Self::resize(*size, canvas),
        }
    }

    fn pointer_down(&mut self, position: Point, viewport: &Viewport) {
        if !position.is_finite() {
            log::warn!("input: ignoring pointer-down at {:?}", position);
            return;
        }
        self.drag = Some(DragState {
            start: position,
            anchor_center: viewport.center,
            max_distance: 0.0,
        });
    }

    fn pointer_move(&mut self, position: Point, viewport: &mut Viewport) -> InputResponse {
        let Some(drag) = self.drag.as_mut() else {
            return InputResponse::default();
        };
        if !position.is_finite() {
            return InputResponse::default();
        }

        drag.max_distance = drag.max_distance.max(position.distance_to(&drag.start));
        if !self.config.pan_on_drag {
            return InputResponse::default();
        }

        let delta = position.subtract(&drag.start);
        let world_delta = self.projection.screen_delta_to_world(&delta, viewport.zoom());
        let center = LatLng::new(
            drag.anchor_center.lat - world_delta.lat,
            drag.anchor_center.lng - world_delta.lng,
        );
        let moved = center != viewport.center && viewport.set_center(center);
        InputResponse {
            events: Vec::new(),
            needs_redraw: moved,
        }
    }

    fn pointer_up(&mut self, position: Point, viewport: &mut Viewport, canvas: CanvasSize) -> InputResponse {
        let Some(drag) = self.drag.take() else {
            return InputResponse::default();
        };
        let travelled = if position.is_finite() {
            drag.max_distance.max(position.distance_to(&drag.start))
        } else {
            drag.max_distance
        };

        if travelled < self.config.click_threshold_px {
            let restored = viewport.center != drag.anchor_center;
            viewport.set_center(drag.anchor_center);
            let lat_lng = self.projection.screen_to_world(&position, viewport, canvas);
            let events = if lat_lng.is_valid() {
                log::debug!("input: click at {:?}", lat_lng);
                vec![MapEvent::Click {
                    lat_lng,
                    pixel: position,
                }]
            } else {
                Vec::new()
            };
            return InputResponse {
                events,
                needs_redraw: restored,
            };
        }

        self.commit(drag, viewport)
    }

    fn pointer_leave(&mut self, viewport: &Viewport) -> InputResponse {
        match self.drag.take() {
            Some(drag) => self.commit(drag, viewport),
            None => InputResponse::default(),
        }
    }

    fn commit(&self, drag: DragState, viewport: &Viewport) -> InputResponse {
        if viewport.center == drag.anchor_center {
            return InputResponse::default();
        }
        log::debug!("input: pan committed at {:?}", viewport.center);
        InputResponse {
            events: vec![MapEvent::CenterChanged {
                center: viewport.center,
            }],
            needs_redraw: true,
        }
    }

    fn wheel(&self, delta: f64, viewport: &mut Viewport) -> InputResponse {
        if !self.config.zoom_on_wheel || !delta.is_finite() || delta == 0.0 {
            return InputResponse::default();
        }
        let changed = if delta < 0.0 {
            viewport.zoom_in()
        } else {
            viewport.zoom_out()
        };
        zoom_response(changed, viewport)
    }

    fn resize(size: CanvasSize, canvas: &mut CanvasSize) -> InputResponse {
        if !(size.width.is_finite() && size.height.is_finite()) || size.width < 0.0 || size.height < 0.0 {
            log::warn!("input: ignoring resize to {:?}", size);
            return InputResponse::default();
        }
        if *canvas == size {
            return InputResponse::default();
        }
        *canvas = size;
        InputResponse {
            events: vec![MapEvent::Resized { size }],
            needs_redraw: true,
        }
    }
}

impl Default for InputController {
    fn default() -> Self {
        Self::new(Projection::default(), InputConfig::default())
    }
}

/// Response for a programmatic or wheel zoom step
pub(crate) fn zoom_response(changed: bool, viewport: &Viewport) -> InputResponse {
    if !changed {
        return InputResponse::default();
    }
    InputResponse {
        events: vec![MapEvent::ZoomChanged {
            zoom: viewport.zoom(),
        }],
        needs_redraw: true,
    }
}

/// Event listener callback type
pub type EventCallback = Box<dyn Fn(&MapEvent) + Send + Sync>;

/// Queues map events and dispatches them to listeners by kind
#[derive(Default)]
pub struct EventManager {
    listeners: FxHashMap<MapEventKind, Vec<EventCallback>>,
    event_queue: VecDeque<MapEvent>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an event listener
    pub fn on<F>(&mut self, kind: MapEventKind, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.listeners.entry(kind).or_default().push(Box::new(callback));
    }

    /// Emit an event to the queue
    pub fn emit(&mut self, event: MapEvent) {
        self.event_queue.push_back(event);
    }

    /// Dispatches every queued event in order and returns them
    pub fn process_events(&mut self) -> Vec<MapEvent> {
        let events: Vec<_> = self.event_queue.drain(..).collect();
        for event in &events {
            if let Some(callbacks) = self.listeners.get(&event.kind()) {
                for callback in callbacks {
                    callback(event);
                }
            }
        }
        events
    }

    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    /// Get number of pending events
    pub fn pending_events(&self) -> usize {
        self.event_queue.len()
    }
}

impl std::fmt::Debug for EventManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventManager")
            .field("listener_kinds", &self.listeners.keys().collect::<Vec<_>>())
            .field("pending", &self.event_queue.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn setup() -> (InputController, Viewport, CanvasSize) {
        (
            InputController::default(),
            Viewport::new(LatLng::new(24.1618, 120.6468), 15),
            CanvasSize::new(800.0, 600.0),
        )
    }

    fn feed(
        controller: &mut InputController,
        viewport: &mut Viewport,
        canvas: &mut CanvasSize,
        events: &[InputEvent],
    ) -> Vec<MapEvent> {
        events
            .iter()
            .flat_map(|event| controller.handle_event(event, viewport, canvas).events)
            .collect()
    }

    #[test]
    fn test_drag_moves_center_opposite_to_pointer() {
        let (mut controller, mut viewport, mut canvas) = setup();
        let start = viewport.center;
        let events = feed(
            &mut controller,
            &mut viewport,
            &mut canvas,
            &[
                InputEvent::PointerDown { position: Point::new(400.0, 300.0) },
                InputEvent::PointerMove { position: Point::new(500.0, 350.0) },
            ],
        );
        assert!(events.is_empty());
        assert!(controller.is_dragging());

        // Pointer went east and south, so the map center moved west and north
        assert!(viewport.center.lng < start.lng);
        assert!(viewport.center.lat > start.lat);

        // The grabbed point stays under the pointer
        let grabbed = Projection::default().screen_to_world(&Point::new(500.0, 350.0), &viewport, canvas);
        let original = Projection::default().screen_to_world(
            &Point::new(400.0, 300.0),
            &Viewport::new(start, 15),
            canvas,
        );
        assert!(grabbed.approx_eq(&original, 1e-9));

        let events = feed(
            &mut controller,
            &mut viewport,
            &mut canvas,
            &[InputEvent::PointerUp { position: Point::new(500.0, 350.0) }],
        );
        assert_eq!(events, vec![MapEvent::CenterChanged { center: viewport.center }]);
        assert!(!controller.is_dragging());
    }

    #[test]
    fn test_small_wobble_is_a_click() {
        let (mut controller, mut viewport, mut canvas) = setup();
        let start = viewport.center;
        let events = feed(
            &mut controller,
            &mut viewport,
            &mut canvas,
            &[
                InputEvent::PointerDown { position: Point::new(400.0, 300.0) },
                InputEvent::PointerMove { position: Point::new(402.0, 301.0) },
                InputEvent::PointerUp { position: Point::new(402.0, 301.0) },
            ],
        );

        assert_eq!(viewport.center, start);
        assert_eq!(events.len(), 1);
        match &events[0] {
            MapEvent::Click { lat_lng, pixel } => {
                assert_eq!(*pixel, Point::new(402.0, 301.0));
                let expected = Projection::default().screen_to_world(pixel, &viewport, canvas);
                assert!(lat_lng.approx_eq(&expected, 1e-12));
            }
            other => panic!("expected click, got {:?}", other),
        }
    }

    #[test]
    fn test_far_excursion_returning_home_is_not_a_click() {
        let (mut controller, mut viewport, mut canvas) = setup();
        let events = feed(
            &mut controller,
            &mut viewport,
            &mut canvas,
            &[
                InputEvent::PointerDown { position: Point::new(400.0, 300.0) },
                InputEvent::PointerMove { position: Point::new(480.0, 300.0) },
                InputEvent::PointerMove { position: Point::new(400.0, 300.0) },
                InputEvent::PointerUp { position: Point::new(400.0, 300.0) },
            ],
        );
        assert!(events.iter().all(|event| !matches!(event, MapEvent::Click { .. })));
    }

    #[test]
    fn test_pointer_leave_commits_drag() {
        let (mut controller, mut viewport, mut canvas) = setup();
        let events = feed(
            &mut controller,
            &mut viewport,
            &mut canvas,
            &[
                InputEvent::PointerDown { position: Point::new(400.0, 300.0) },
                InputEvent::PointerMove { position: Point::new(300.0, 300.0) },
                InputEvent::PointerLeave,
                InputEvent::PointerMove { position: Point::new(100.0, 100.0) },
            ],
        );
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], MapEvent::CenterChanged { .. }));
        assert!(!controller.is_dragging());
    }

    #[test]
    fn test_move_without_capture_is_ignored() {
        let (mut controller, mut viewport, mut canvas) = setup();
        let start = viewport.center;
        let response = controller.handle_event(
            &InputEvent::PointerMove { position: Point::new(10.0, 10.0) },
            &mut viewport,
            &mut canvas,
        );
        assert_eq!(response, InputResponse::default());
        assert_eq!(viewport.center, start);
    }

    #[test]
    fn test_wheel_steps_zoom_and_clamps() {
        let (mut controller, mut viewport, mut canvas) = setup();
        let wheel_in = InputEvent::Wheel { delta: -120.0, position: Point::new(0.0, 0.0) };
        for _ in 0..10 {
            controller.handle_event(&wheel_in, &mut viewport, &mut canvas);
        }
        assert_eq!(viewport.zoom(), viewport.max_zoom());

        let response = controller.handle_event(&wheel_in, &mut viewport, &mut canvas);
        assert!(response.events.is_empty());

        let wheel_out = InputEvent::Wheel { delta: 120.0, position: Point::new(0.0, 0.0) };
        let response = controller.handle_event(&wheel_out, &mut viewport, &mut canvas);
        assert_eq!(
            response.events,
            vec![MapEvent::ZoomChanged { zoom: viewport.max_zoom() - 1 }]
        );
    }

    #[test]
    fn test_resize_updates_canvas() {
        let (mut controller, mut viewport, mut canvas) = setup();
        let size = CanvasSize::new(1024.0, 768.0);
        let response = controller.handle_event(&InputEvent::Resize { size }, &mut viewport, &mut canvas);
        assert_eq!(canvas, size);
        assert!(response.needs_redraw);

        let bad = CanvasSize::new(f64::NAN, 10.0);
        controller.handle_event(&InputEvent::Resize { size: bad }, &mut viewport, &mut canvas);
        assert_eq!(canvas, size);
    }

    #[test]
    fn test_event_manager_dispatches_by_kind() {
        let mut manager = EventManager::new();
        let clicks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&clicks);
        manager.on(MapEventKind::Click, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        manager.emit(MapEvent::Click {
            lat_lng: LatLng::new(0.0, 0.0),
            pixel: Point::new(0.0, 0.0),
        });
        manager.emit(MapEvent::ZoomChanged { zoom: 3 });
        assert_eq!(manager.pending_events(), 2);

        let processed = manager.process_events();
        assert_eq!(processed.len(), 2);
        assert_eq!(clicks.load(Ordering::SeqCst), 1);
        assert_eq!(manager.pending_events(), 0);
    }
}
