//! Straight segment shared by lines and arrows.

use super::{point_to_segment_dist, ElementGeometry, ShapeStyle};
use kurbo::{Point, Rect};

/// A segment from `start` to `end`. Arrows put the head at `end`.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
    pub style: ShapeStyle,
}

impl Segment {
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
            style: ShapeStyle::default(),
        }
    }

    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }
}

impl ElementGeometry for Segment {
    fn bounds(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }

    /// Hits within `tolerance` world units of the segment (strictly less).
    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        point_to_segment_dist(point, self.start, self.end) < tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_test_tolerance() {
        let line = Segment::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        assert!(line.hit_test(Point::new(50.0, 4.9), 5.0));
        assert!(!line.hit_test(Point::new(50.0, 5.0), 5.0));
        assert!(!line.hit_test(Point::new(106.0, 0.0), 5.0));
    }

    #[test]
    fn test_degenerate_segment() {
        let dot = Segment::new(Point::new(10.0, 10.0), Point::new(10.0, 10.0));
        assert!(dot.hit_test(Point::new(12.0, 10.0), 5.0));
        assert!((dot.length()).abs() < f64::EPSILON);
    }
}
