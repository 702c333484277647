//! Rectangle element.

use super::{rect_contains_inclusive, ElementGeometry, ShapeStyle};
use kurbo::{Point, Rect, Size};

/// An axis-aligned rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    /// Top-left corner.
    pub position: Point,
    pub width: f64,
    pub height: f64,
    pub style: ShapeStyle,
}

impl Rectangle {
    pub fn new(position: Point, width: f64, height: f64) -> Self {
        Self {
            position,
            width,
            height,
            style: ShapeStyle::default(),
        }
    }

    /// Create a rectangle spanning two corners in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let rect = Rect::from_points(a, b);
        Self::new(rect.origin(), rect.width(), rect.height())
    }

    pub fn as_rect(&self) -> Rect {
        Rect::from_origin_size(self.position, Size::new(self.width, self.height)).abs()
    }
}

impl ElementGeometry for Rectangle {
    fn bounds(&self) -> Rect {
        self.as_rect()
    }

    fn hit_test(&self, point: Point, _tolerance: f64) -> bool {
        rect_contains_inclusive(self.as_rect(), point)
    }
}
