//! Entities drawn on top of the base grid.

pub mod landmark;
pub mod marker;

pub use landmark::{taichung_landmarks, Landmark, LandmarkKind};
pub use marker::{sort_for_drawing, Marker, MarkerKind};
