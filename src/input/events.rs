use crate::core::{
    geo::{LatLng, Point},
    viewport::CanvasSize,
};
use serde::{Deserialize, Serialize};

/// Raw pointer and canvas input, in canvas pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    PointerDown { position: Point },
    PointerMove { position: Point },
    PointerUp { position: Point },
    /// Pointer left the canvas or the gesture was cancelled
    PointerLeave,
    /// Scroll wheel; negative `delta` zooms in
    Wheel { delta: f64, position: Point },
    Resize { size: CanvasSize },
}

impl InputEvent {
    /// Gets the primary position associated with this event, if any
    pub fn position(&self) -> Option<Point> {
        match self {
            InputEvent::PointerDown { position }
            | InputEvent::PointerMove { position }
            | InputEvent::PointerUp { position }
            | InputEvent::Wheel { position, .. } => Some(*position),
            InputEvent::PointerLeave | InputEvent::Resize { .. } => None,
        }
    }

    /// Checks if this is a mouse/pointer event
    pub fn is_pointer_event(&self) -> bool {
        !matches!(self, InputEvent::Resize { .. })
    }
}

/// Events emitted by the map to host callbacks
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// A pointer gesture that did not move far enough to pan
    Click { lat_lng: LatLng, pixel: Point },
    /// A pan gesture or recenter committed a new center
    CenterChanged { center: LatLng },
    ZoomChanged { zoom: u8 },
    Resized { size: CanvasSize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapEventKind {
    Click,
    CenterChanged,
    ZoomChanged,
    Resized,
}

impl MapEvent {
    pub fn kind(&self) -> MapEventKind {
        match self {
            MapEvent::Click { .. } => MapEventKind::Click,
            MapEvent::CenterChanged { .. } => MapEventKind::CenterChanged,
            MapEvent::ZoomChanged { .. } => MapEventKind::ZoomChanged,
            MapEvent::Resized { .. } => MapEventKind::Resized,
        }
    }
}

impl std::fmt::Display for MapEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapEventKind::Click => write!(f, "click"),
            MapEventKind::CenterChanged => write!(f, "centerchange"),
            MapEventKind::ZoomChanged => write!(f, "zoomchange"),
            MapEventKind::Resized => write!(f, "resize"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_event_position() {
        let down = InputEvent::PointerDown {
            position: Point::new(100.0, 200.0),
        };
        assert_eq!(down.position(), Some(Point::new(100.0, 200.0)));
        assert_eq!(InputEvent::PointerLeave.position(), None);
        assert!(InputEvent::PointerLeave.is_pointer_event());

        let resize = InputEvent::Resize {
            size: CanvasSize::new(320.0, 240.0),
        };
        assert!(!resize.is_pointer_event());
    }

    #[test]
    fn test_event_kind() {
        let click = MapEvent::Click {
            lat_lng: LatLng::new(24.16, 120.64),
            pixel: Point::new(1.0, 2.0),
        };
        assert_eq!(click.kind(), MapEventKind::Click);
        assert_eq!(MapEvent::ZoomChanged { zoom: 4 }.kind().to_string(), "zoomchange");
    }
}
