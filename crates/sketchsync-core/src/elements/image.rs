//! Image element.

use super::{rect_contains_inclusive, ElementGeometry};
use kurbo::{Point, Rect, Size};

/// Fallback size for images whose dimensions are unknown.
pub const DEFAULT_IMAGE_SIZE: f64 = 200.0;

/// A placed image referencing an uploaded file by URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    /// Top-left corner.
    pub position: Point,
    pub width: f64,
    pub height: f64,
    pub url: String,
}

impl Image {
    pub fn new(position: Point, width: f64, height: f64, url: impl Into<String>) -> Self {
        Self {
            position,
            width,
            height,
            url: url.into(),
        }
    }

    pub fn as_rect(&self) -> Rect {
        Rect::from_origin_size(self.position, Size::new(self.width, self.height)).abs()
    }
}

impl ElementGeometry for Image {
    fn bounds(&self) -> Rect {
        self.as_rect()
    }

    fn hit_test(&self, point: Point, _tolerance: f64) -> bool {
        rect_contains_inclusive(self.as_rect(), point)
    }
}
