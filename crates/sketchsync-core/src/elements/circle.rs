//! Circle element.

use super::{ElementGeometry, ShapeStyle};
use kurbo::{Point, Rect};

/// A circle given by center and radius.
#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    pub center: Point,
    pub radius: f64,
    pub style: ShapeStyle,
}

impl Circle {
    pub fn new(center: Point, radius: f64) -> Self {
        Self {
            center,
            radius,
            style: ShapeStyle::default(),
        }
    }

    /// Circle drawn from a drag: centered on the drag start, with radius
    /// half the diagonal of the dragged box.
    pub fn from_drag(start: Point, current: Point) -> Self {
        let w = (current.x - start.x).abs();
        let h = (current.y - start.y).abs();
        Self::new(start, (w * w + h * h).sqrt() / 2.0)
    }
}

impl ElementGeometry for Circle {
    fn bounds(&self) -> Rect {
        Rect::new(
            self.center.x - self.radius,
            self.center.y - self.radius,
            self.center.x + self.radius,
            self.center.y + self.radius,
        )
    }

    fn hit_test(&self, point: Point, _tolerance: f64) -> bool {
        point.distance(self.center) <= self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_drag() {
        let circle = Circle::from_drag(Point::new(10.0, 10.0), Point::new(40.0, 50.0));
        assert!((circle.center.x - 10.0).abs() < f64::EPSILON);
        assert!((circle.radius - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_test_boundary() {
        let circle = Circle::new(Point::new(0.0, 0.0), 10.0);
        assert!(circle.hit_test(Point::new(10.0, 0.0), 0.0));
        assert!(circle.hit_test(Point::new(0.0, 0.0), 0.0));
        assert!(!circle.hit_test(Point::new(7.5, 7.5), 0.0));
    }

    #[test]
    fn test_bounds() {
        let bounds = Circle::new(Point::new(50.0, 50.0), 5.0).bounds();
        assert!((bounds.x0 - 45.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 55.0).abs() < f64::EPSILON);
    }
}
