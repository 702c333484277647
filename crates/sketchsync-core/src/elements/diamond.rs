//! Diamond (rhombus) element.

use super::{point_in_polygon, ElementGeometry, ShapeStyle};
use kurbo::{Point, Rect};

/// A four-vertex polygon: top, right, bottom, left.
#[derive(Debug, Clone, PartialEq)]
pub struct Diamond {
    pub points: [Point; 4],
    pub style: ShapeStyle,
}

impl Diamond {
    pub fn new(points: [Point; 4]) -> Self {
        Self {
            points,
            style: ShapeStyle::default(),
        }
    }

    /// Rhombus inscribed in the box spanned by two corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let rect = Rect::from_points(a, b);
        let center = rect.center();
        Self::new([
            Point::new(center.x, rect.y0),
            Point::new(rect.x1, center.y),
            Point::new(center.x, rect.y1),
            Point::new(rect.x0, center.y),
        ])
    }
}

impl ElementGeometry for Diamond {
    fn bounds(&self) -> Rect {
        let mut rect = Rect::from_points(self.points[0], self.points[0]);
        for p in &self.points[1..] {
            rect = rect.union_pt(*p);
        }
        rect
    }

    fn hit_test(&self, point: Point, _tolerance: f64) -> bool {
        point_in_polygon(point, &self.points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_any_direction() {
        let down_right = Diamond::from_corners(Point::new(0.0, 0.0), Point::new(100.0, 50.0));
        let up_left = Diamond::from_corners(Point::new(100.0, 50.0), Point::new(0.0, 0.0));
        assert_eq!(down_right, up_left);
        assert_eq!(down_right.points[0], Point::new(50.0, 0.0));
        assert_eq!(down_right.points[1], Point::new(100.0, 25.0));
        assert_eq!(down_right.points[2], Point::new(50.0, 50.0));
        assert_eq!(down_right.points[3], Point::new(0.0, 25.0));
    }

    #[test]
    fn test_hit_test() {
        let diamond = Diamond::from_corners(Point::new(0.0, 0.0), Point::new(100.0, 100.0));
        assert!(diamond.hit_test(Point::new(50.0, 50.0), 0.0));
        // Inside the bounding box but outside the rhombus.
        assert!(!diamond.hit_test(Point::new(5.0, 5.0), 0.0));
        assert!(!diamond.hit_test(Point::new(150.0, 50.0), 0.0));
    }

    #[test]
    fn test_bounds() {
        let diamond = Diamond::from_corners(Point::new(10.0, 20.0), Point::new(30.0, 60.0));
        let bounds = diamond.bounds();
        assert!((bounds.x0 - 10.0).abs() < f64::EPSILON);
        assert!((bounds.y0 - 20.0).abs() < f64::EPSILON);
        assert!((bounds.x1 - 30.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 60.0).abs() < f64::EPSILON);
    }
}
