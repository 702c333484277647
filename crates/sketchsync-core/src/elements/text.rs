//! Text element.

use super::{rect_contains_inclusive, ElementGeometry, SerializableColor};
use kurbo::{Point, Rect};

/// Default font size for new text.
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

/// Approximate glyph advance as a fraction of font size, used for hit boxes.
const CHAR_WIDTH_RATIO: f64 = 0.6;

/// A single line of text anchored at its baseline origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    /// Left end of the baseline.
    pub position: Point,
    pub content: String,
    pub font_size: f64,
    pub color: SerializableColor,
}

impl Text {
    pub fn new(position: Point, content: String) -> Self {
        Self {
            position,
            content,
            font_size: DEFAULT_FONT_SIZE,
            color: SerializableColor::black(),
        }
    }

    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    /// Estimated rendered width.
    pub fn approx_width(&self) -> f64 {
        self.content.chars().count() as f64 * self.font_size * CHAR_WIDTH_RATIO
    }
}

impl ElementGeometry for Text {
    /// Box extends one font size above the baseline.
    fn bounds(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y - self.font_size,
            self.position.x + self.approx_width(),
            self.position.y,
        )
    }

    fn hit_test(&self, point: Point, _tolerance: f64) -> bool {
        rect_contains_inclusive(self.bounds(), point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_above_baseline() {
        let text = Text::new(Point::new(10.0, 100.0), "Hello".to_string());
        let bounds = text.bounds();
        assert!((bounds.x0 - 10.0).abs() < f64::EPSILON);
        assert!((bounds.y0 - 84.0).abs() < f64::EPSILON);
        assert!((bounds.x1 - 58.0).abs() < 1e-9);
        assert!((bounds.y1 - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_test() {
        let text = Text::new(Point::new(0.0, 20.0), "abc".to_string());
        assert!(text.hit_test(Point::new(5.0, 10.0), 0.0));
        assert!(!text.hit_test(Point::new(5.0, 21.0), 0.0));
        assert!(!text.hit_test(Point::new(30.0, 10.0), 0.0));
    }

    #[test]
    fn test_width_counts_chars() {
        let text = Text::new(Point::ZERO, "héllo".to_string()).with_font_size(10.0);
        assert!((text.approx_width() - 30.0).abs() < 1e-9);
    }
}
