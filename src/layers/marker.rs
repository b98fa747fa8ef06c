use crate::core::geo::LatLng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerKind {
    Pickup,
    Dropoff,
    Driver,
    Passenger,
    Car,
}

impl MarkerKind {
    /// Vehicles and people are drawn as icons above point markers
    pub fn is_vehicle(&self) -> bool {
        matches!(self, MarkerKind::Driver | MarkerKind::Passenger | MarkerKind::Car)
    }

    /// Lower values are drawn first
    pub fn draw_order(&self) -> u8 {
        match self {
            MarkerKind::Pickup => 0,
            MarkerKind::Dropoff => 1,
            MarkerKind::Passenger => 2,
            MarkerKind::Driver => 3,
            MarkerKind::Car => 4,
        }
    }
}

impl std::fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkerKind::Pickup => write!(f, "pickup"),
            MarkerKind::Dropoff => write!(f, "dropoff"),
            MarkerKind::Driver => write!(f, "driver"),
            MarkerKind::Passenger => write!(f, "passenger"),
            MarkerKind::Car => write!(f, "car"),
        }
    }
}

/// A point of interest supplied by the host on every render pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: String,
    pub position: LatLng,
    pub kind: MarkerKind,
    pub label: Option<String>,
}

impl Marker {
    pub fn new(id: impl Into<String>, position: LatLng, kind: MarkerKind) -> Self {
        Self {
            id: id.into(),
            position,
            kind,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn pickup(position: LatLng) -> Self {
        Self::new("pickup", position, MarkerKind::Pickup)
    }

    pub fn dropoff(position: LatLng) -> Self {
        Self::new("dropoff", position, MarkerKind::Dropoff)
    }

    pub fn car(id: impl Into<String>, position: LatLng) -> Self {
        Self::new(id, position, MarkerKind::Car)
    }

    pub fn set_position(&mut self, position: LatLng) {
        self.position = position;
    }
}

/// Orders markers so point markers sit beneath vehicle icons.
///
/// The sort is stable: markers of the same kind keep the host's order.
pub fn sort_for_drawing(markers: &mut [Marker]) {
    markers.sort_by_key(|marker| marker.kind.draw_order());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicles_draw_after_points() {
        let here = LatLng::new(24.16, 120.64);
        let mut markers = vec![
            Marker::car("car-1", here),
            Marker::new("driver", here, MarkerKind::Driver),
            Marker::pickup(here),
            Marker::car("car-2", here),
            Marker::dropoff(here),
        ];
        sort_for_drawing(&mut markers);

        let ids: Vec<&str> = markers.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["pickup", "dropoff", "driver", "car-1", "car-2"]);
        assert!(markers.iter().skip(2).all(|m| m.kind.is_vehicle()));
    }

    #[test]
    fn test_marker_label() {
        let marker = Marker::pickup(LatLng::new(24.16, 120.64)).with_label("Pickup");
        assert_eq!(marker.label.as_deref(), Some("Pickup"));
        assert_eq!(marker.kind.to_string(), "pickup");
    }
}
