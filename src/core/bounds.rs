use crate::core::{geo::Point, viewport::CanvasSize};
use serde::{Deserialize, Serialize};

/// Represents a bounding box in screen/pixel coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// Creates new bounds from two points
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Creates bounds from individual coordinates
    pub fn from_coords(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new(Point::new(min_x, min_y), Point::new(max_x, max_y))
    }

    /// The full canvas rectangle
    pub fn from_canvas(canvas: CanvasSize) -> Self {
        Self::from_coords(0.0, 0.0, canvas.width, canvas.height)
    }

    /// Gets the width of the bounds
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Gets the height of the bounds
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Grows the bounds by `margin` on every side
    pub fn expand(&self, margin: f64) -> Bounds {
        Bounds::from_coords(
            self.min.x - margin,
            self.min.y - margin,
            self.max.x + margin,
            self.max.y + margin,
        )
    }

    /// Checks if the bounds contain a point. NaN points are never contained.
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Checks if the bounds intersect with another bounds
    pub fn intersects(&self, other: &Bounds) -> bool {
        !(other.max.x < self.min.x
            || other.min.x > self.max.x
            || other.max.y < self.min.y
            || other.min.y > self.max.y)
    }

    /// Bounding box of a set of points, `None` if empty
    pub fn from_points(points: &[Point]) -> Option<Bounds> {
        let first = points.first()?;
        let mut bounds = Bounds::new(*first, *first);
        for p in &points[1..] {
            bounds.min.x = bounds.min.x.min(p.x);
            bounds.min.y = bounds.min.y.min(p.y);
            bounds.max.x = bounds.max.x.max(p.x);
            bounds.max.y = bounds.max.y.max(p.y);
        }
        Some(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_and_contains() {
        let canvas = Bounds::from_canvas(CanvasSize::new(100.0, 50.0));
        let outside = Point::new(120.0, 25.0);

        assert!(!canvas.contains(&outside));
        assert!(canvas.expand(30.0).contains(&outside));
        assert!(!canvas.expand(30.0).contains(&Point::new(f64::NAN, 10.0)));
    }

    #[test]
    fn test_intersects() {
        let a = Bounds::from_coords(0.0, 0.0, 10.0, 10.0);
        let b = Bounds::from_coords(5.0, 5.0, 15.0, 15.0);
        let c = Bounds::from_coords(20.0, 20.0, 30.0, 30.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_from_points() {
        let bounds = Bounds::from_points(&[Point::new(3.0, -1.0), Point::new(-2.0, 4.0)]).unwrap();
        assert_eq!(bounds, Bounds::from_coords(-2.0, -1.0, 3.0, 4.0));
        assert_eq!(bounds.width(), 5.0);
        assert!(Bounds::from_points(&[]).is_none());
    }
}
