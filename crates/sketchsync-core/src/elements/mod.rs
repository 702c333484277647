//! Element definitions for the drawing surface.

mod circle;
mod diamond;
mod image;
mod rectangle;
mod segment;
mod text;
pub mod wire;

pub use circle::Circle;
pub use diamond::Diamond;
pub use image::Image;
pub use rectangle::Rectangle;
pub use segment::Segment;
pub use text::Text;
pub use wire::{WireElement, WireError, WireProperties};

use kurbo::{Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Client-local identity of an element, stable from creation until removal.
///
/// Render nodes and in-flight persistence results are keyed by this, since
/// the backend id only exists after the first successful save.
pub type LocalId = Uuid;

/// Identifier assigned by the persistence backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub i64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of element kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Rectangle,
    Circle,
    Diamond,
    Line,
    Arrow,
    Text,
    Image,
}

impl ElementType {
    /// Name used on the wire and in tool buttons.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Rectangle => "rectangle",
            ElementType::Circle => "circle",
            ElementType::Diamond => "diamond",
            ElementType::Line => "line",
            ElementType::Arrow => "arrow",
            ElementType::Text => "text",
            ElementType::Image => "image",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn parse_hex(color: &str) -> Option<Self> {
        let hex = color.trim().strip_prefix('#')?;
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let r = channel(&hex[0..1])? * 17;
                let g = channel(&hex[1..2])? * 17;
                let b = channel(&hex[2..3])? * 17;
                Some(Self::new(r, g, b, 255))
            }
            6 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                255,
            )),
            8 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
            )),
            _ => None,
        }
    }

    /// Format as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Stroke and fill of outlined shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    pub stroke_color: SerializableColor,
    pub stroke_width: f64,
    /// `None` renders as `fill="none"`.
    pub fill_color: Option<SerializableColor>,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            stroke_color: SerializableColor::black(),
            stroke_width: 2.0,
            fill_color: None,
        }
    }
}

/// Geometry shared by every element kind.
pub trait ElementGeometry {
    /// Axis-aligned bounds in world coordinates.
    fn bounds(&self) -> Rect;

    /// Check if a world point hits this element.
    ///
    /// `tolerance` only applies to stroke-only kinds (lines and arrows).
    fn hit_test(&self, point: Point, tolerance: f64) -> bool;
}

/// Original position-bearing fields captured at the start of a drag.
#[derive(Debug, Clone, PartialEq)]
pub enum DragAnchor {
    /// Top-left corner (rectangle, image) or baseline origin (text).
    Position(Point),
    Center(Point),
    Vertices([Point; 4]),
    Endpoints(Point, Point),
}

/// Per-kind payload of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Rectangle(Rectangle),
    Circle(Circle),
    Diamond(Diamond),
    Line(Segment),
    Arrow(Segment),
    Text(Text),
    Image(Image),
}

impl ElementKind {
    pub fn element_type(&self) -> ElementType {
        match self {
            ElementKind::Rectangle(_) => ElementType::Rectangle,
            ElementKind::Circle(_) => ElementType::Circle,
            ElementKind::Diamond(_) => ElementType::Diamond,
            ElementKind::Line(_) => ElementType::Line,
            ElementKind::Arrow(_) => ElementType::Arrow,
            ElementKind::Text(_) => ElementType::Text,
            ElementKind::Image(_) => ElementType::Image,
        }
    }

    fn geometry(&self) -> &dyn ElementGeometry {
        match self {
            ElementKind::Rectangle(s) => s,
            ElementKind::Circle(s) => s,
            ElementKind::Diamond(s) => s,
            ElementKind::Line(s) | ElementKind::Arrow(s) => s,
            ElementKind::Text(s) => s,
            ElementKind::Image(s) => s,
        }
    }

    pub fn bounds(&self) -> Rect {
        self.geometry().bounds()
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.geometry().hit_test(point, tolerance)
    }

    /// Capture the position-bearing fields for a drag.
    pub fn drag_anchor(&self) -> DragAnchor {
        match self {
            ElementKind::Rectangle(r) => DragAnchor::Position(r.position),
            ElementKind::Image(i) => DragAnchor::Position(i.position),
            ElementKind::Text(t) => DragAnchor::Position(t.position),
            ElementKind::Circle(c) => DragAnchor::Center(c.center),
            ElementKind::Diamond(d) => DragAnchor::Vertices(d.points),
            ElementKind::Line(s) | ElementKind::Arrow(s) => DragAnchor::Endpoints(s.start, s.end),
        }
    }

    /// Set position fields to `anchor + delta`.
    ///
    /// Returns false if the anchor was captured from a different kind.
    pub fn move_from(&mut self, anchor: &DragAnchor, delta: Vec2) -> bool {
        match (self, anchor) {
            (ElementKind::Rectangle(r), DragAnchor::Position(p)) => r.position = *p + delta,
            (ElementKind::Image(i), DragAnchor::Position(p)) => i.position = *p + delta,
            (ElementKind::Text(t), DragAnchor::Position(p)) => t.position = *p + delta,
            (ElementKind::Circle(c), DragAnchor::Center(p)) => c.center = *p + delta,
            (ElementKind::Diamond(d), DragAnchor::Vertices(points)) => {
                d.points = points.map(|p| p + delta);
            }
            (
                ElementKind::Line(s) | ElementKind::Arrow(s),
                DragAnchor::Endpoints(start, end),
            ) => {
                s.start = *start + delta;
                s.end = *end + delta;
            }
            _ => return false,
        }
        true
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            ElementKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut Text> {
        match self {
            ElementKind::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// A drawn object on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub local_id: LocalId,
    /// Backend id; `None` until the first create succeeds.
    pub id: Option<ElementId>,
    pub kind: ElementKind,
    /// Insertion-order stacking index, never re-sorted.
    pub z_index: i64,
}

impl Element {
    /// Create a new, not yet persisted element.
    pub fn new(kind: ElementKind, z_index: i64) -> Self {
        Self {
            local_id: Uuid::new_v4(),
            id: None,
            kind,
            z_index,
        }
    }

    /// Create an element that already exists on the backend.
    pub fn persisted(id: ElementId, kind: ElementKind, z_index: i64) -> Self {
        Self {
            local_id: Uuid::new_v4(),
            id: Some(id),
            kind,
            z_index,
        }
    }

    pub fn element_type(&self) -> ElementType {
        self.kind.element_type()
    }
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}

/// Even-odd ray casting test.
pub fn point_in_polygon(point: Point, vertices: &[Point]) -> bool {
    let mut inside = false;
    let mut j = vertices.len().wrapping_sub(1);
    for (i, vi) in vertices.iter().enumerate() {
        let vj = vertices[j];
        if (vi.y > point.y) != (vj.y > point.y)
            && point.x < (vj.x - vi.x) * (point.y - vi.y) / (vj.y - vi.y) + vi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Inclusive containment; kurbo's `Rect::contains` excludes the far edges.
pub(crate) fn rect_contains_inclusive(rect: Rect, point: Point) -> bool {
    let rect = rect.abs();
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_colors() {
        assert_eq!(SerializableColor::parse_hex("#000000"), Some(SerializableColor::black()));
        assert_eq!(
            SerializableColor::parse_hex("#f00"),
            Some(SerializableColor::new(255, 0, 0, 255))
        );
        assert_eq!(
            SerializableColor::parse_hex("#11223380"),
            Some(SerializableColor::new(0x11, 0x22, 0x33, 0x80))
        );
        assert_eq!(SerializableColor::parse_hex("none"), None);
        assert_eq!(SerializableColor::parse_hex("#12"), None);
    }

    #[test]
    fn test_hex_format() {
        assert_eq!(SerializableColor::black().to_hex(), "#000000");
        assert_eq!(SerializableColor::new(1, 2, 3, 4).to_hex(), "#01020304");
    }

    #[test]
    fn test_peniko_conversion() {
        let color: Color = SerializableColor::new(10, 20, 30, 255).into();
        let back: SerializableColor = color.into();
        assert_eq!(back, SerializableColor::new(10, 20, 30, 255));
    }

    #[test]
    fn test_point_to_segment_dist() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!((point_to_segment_dist(Point::new(5.0, 3.0), a, b) - 3.0).abs() < 1e-12);
        // Beyond the end clamps to the endpoint.
        assert!((point_to_segment_dist(Point::new(13.0, 4.0), a, b) - 5.0).abs() < 1e-12);
        // Degenerate segment.
        assert!((point_to_segment_dist(Point::new(3.0, 4.0), a, a) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_point_in_polygon() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert!(point_in_polygon(Point::new(5.0, 5.0), &square));
        assert!(!point_in_polygon(Point::new(15.0, 5.0), &square));
        assert!(!point_in_polygon(Point::new(5.0, 5.0), &[]));
    }

    #[test]
    fn test_move_from_anchor() {
        let mut kind = ElementKind::Line(Segment::new(Point::new(0.0, 0.0), Point::new(10.0, 5.0)));
        let anchor = kind.drag_anchor();
        assert!(kind.move_from(&anchor, Vec2::new(3.0, -2.0)));
        match &kind {
            ElementKind::Line(s) => {
                assert_eq!(s.start, Point::new(3.0, -2.0));
                assert_eq!(s.end, Point::new(13.0, 3.0));
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_move_from_mismatched_anchor() {
        let mut kind = ElementKind::Circle(Circle::new(Point::ZERO, 5.0));
        let anchor = DragAnchor::Position(Point::ZERO);
        assert!(!kind.move_from(&anchor, Vec2::new(1.0, 1.0)));
    }
}
