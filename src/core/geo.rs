use crate::core::constants::EARTH_RADIUS_METERS;
use serde::{Deserialize, Serialize};

/// A geographical coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validates that the coordinates are finite and within valid ranges
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Great-circle distance to another coordinate in meters (haversine)
    pub fn distance_to(&self, other: &LatLng) -> f64 {
        distance_meters(*self, *other)
    }

    /// Linear interpolation towards `other`
    pub fn lerp(&self, other: &LatLng, t: f64) -> LatLng {
        lerp(*self, *other, t)
    }

    /// Rounds both components to `decimals` places, for use as a map key.
    pub fn quantize(&self, decimals: u32) -> (i64, i64) {
        let factor = 10_f64.powi(decimals as i32);
        (
            (self.lat * factor).round() as i64,
            (self.lng * factor).round() as i64,
        )
    }

    /// Checks whether two coordinates are the same within `epsilon` degrees
    pub fn approx_eq(&self, other: &LatLng, epsilon: f64) -> bool {
        (self.lat - other.lat).abs() <= epsilon && (self.lng - other.lng).abs() <= epsilon
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl From<(f64, f64)> for LatLng {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self::new(lat, lng)
    }
}

/// Represents a point in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Represents a bounding box of geographical coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LatLngBounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Smallest bounds containing every valid point, `None` when there is none
    pub fn from_points(points: &[LatLng]) -> Option<Self> {
        let mut valid = points.iter().filter(|p| p.is_valid());
        let first = *valid.next()?;
        let mut bounds = Self::new(first, first);
        for point in valid {
            bounds.extend(point);
        }
        Some(bounds)
    }

    /// Checks if the bounds contain a point
    pub fn contains(&self, point: &LatLng) -> bool {
        point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
            && point.lng >= self.south_west.lng
            && point.lng <= self.north_east.lng
    }

    /// Extends the bounds to include a point
    pub fn extend(&mut self, point: &LatLng) {
        self.south_west.lat = self.south_west.lat.min(point.lat);
        self.south_west.lng = self.south_west.lng.min(point.lng);
        self.north_east.lat = self.north_east.lat.max(point.lat);
        self.north_east.lng = self.north_east.lng.max(point.lng);
    }

    /// Gets the center point of the bounds
    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lng + self.north_east.lng) / 2.0,
        )
    }

    /// Gets the span of the bounds
    pub fn span(&self) -> LatLng {
        LatLng::new(
            self.north_east.lat - self.south_west.lat,
            self.north_east.lng - self.south_west.lng,
        )
    }
}

/// Great-circle distance in meters using the haversine formula.
///
/// Non-finite input propagates as NaN; callers validate coordinates first.
pub fn distance_meters(a: LatLng, b: LatLng) -> f64 {
    let lat1_rad = a.lat.to_radians();
    let lat2_rad = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Linear interpolation between two coordinates, `t` in `[0, 1]`
pub fn lerp(a: LatLng, b: LatLng, t: f64) -> LatLng {
    LatLng::new(a.lat + (b.lat - a.lat) * t, a.lng + (b.lng - a.lng) * t)
}

/// Total length of a polyline in meters
pub fn path_length(path: &[LatLng]) -> f64 {
    path.windows(2).map(|leg| distance_meters(leg[0], leg[1])).sum()
}

/// Inserts evenly spaced interpolated points between consecutive waypoints
/// until the output holds at least `target_count` points.
///
/// Every original waypoint is kept, in order. Each leg receives the same
/// number of inserted points. Paths with fewer than two points, or already
/// at `target_count`, are returned unchanged.
pub fn densify(path: &[LatLng], target_count: usize) -> Vec<LatLng> {
    if path.len() < 2 || path.len() >= target_count {
        return path.to_vec();
    }

    let legs = path.len() - 1;
    let missing = target_count - path.len();
    let per_leg = missing.div_ceil(legs);

    let mut output = Vec::with_capacity(path.len() + legs * per_leg);
    for leg in path.windows(2) {
        output.push(leg[0]);
        for step in 1..=per_leg {
            let t = step as f64 / (per_leg + 1) as f64;
            output.push(lerp(leg[0], leg[1], t));
        }
    }
    if let Some(last) = path.last() {
        output.push(*last);
    }

    output
}
