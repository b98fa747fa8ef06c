use crate::core::geo::LatLng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LandmarkKind {
    Park,
    Station,
    Hospital,
    School,
    Mall,
}

impl LandmarkKind {
    /// Glyph radius in pixels
    pub fn radius(&self) -> f64 {
        match self {
            LandmarkKind::Park => 10.0,
            LandmarkKind::Mall => 8.0,
            LandmarkKind::Station | LandmarkKind::Hospital | LandmarkKind::School => 6.0,
        }
    }
}

/// Static glyph drawn beneath markers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub position: LatLng,
    pub label: String,
    pub kind: LandmarkKind,
}

impl Landmark {
    pub fn new(position: LatLng, label: impl Into<String>, kind: LandmarkKind) -> Self {
        Self {
            position,
            label: label.into(),
            kind,
        }
    }
}

/// A handful of Taichung landmarks around the default center
pub fn taichung_landmarks() -> Vec<Landmark> {
    vec![
        Landmark::new(LatLng::new(24.1372, 120.6869), "Taichung Station", LandmarkKind::Station),
        Landmark::new(LatLng::new(24.1442, 120.6839), "Taichung Park", LandmarkKind::Park),
        Landmark::new(LatLng::new(24.1637, 120.6475), "Park Lane", LandmarkKind::Mall),
        Landmark::new(LatLng::new(24.1219, 120.6508), "Veterans General Hospital", LandmarkKind::Hospital),
        Landmark::new(LatLng::new(24.1789, 120.6467), "Feng Chia University", LandmarkKind::School),
    ]
}
