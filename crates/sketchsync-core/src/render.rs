//! Render target contract.
//!
//! The surface never touches a display directly; it describes nodes and
//! hands them to a `RenderTarget`.

use crate::elements::{Element, ElementKind, LocalId, SerializableColor, ShapeStyle};
use kurbo::{Point, Rect};
use std::fmt;

/// Key of a node in the render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKey {
    Element(LocalId),
    /// The uncommitted shape while drawing.
    Preview,
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Element(id) => write!(f, "{id}"),
            NodeKey::Preview => f.write_str("preview"),
        }
    }
}

/// Drawable geometry of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeNode {
    Rect {
        rect: Rect,
        style: ShapeStyle,
    },
    Circle {
        center: Point,
        radius: f64,
        style: ShapeStyle,
    },
    Polygon {
        points: Vec<Point>,
        style: ShapeStyle,
    },
    Line {
        start: Point,
        end: Point,
        /// Draw an arrowhead at `end`.
        arrow: bool,
        style: ShapeStyle,
    },
    Text {
        position: Point,
        content: String,
        font_size: f64,
        color: SerializableColor,
    },
    Image {
        rect: Rect,
        href: String,
    },
}

impl ShapeNode {
    /// Describe an element's geometry.
    pub fn from_kind(kind: &ElementKind) -> Self {
        match kind {
            ElementKind::Rectangle(r) => ShapeNode::Rect {
                rect: r.as_rect(),
                style: r.style.clone(),
            },
            ElementKind::Circle(c) => ShapeNode::Circle {
                center: c.center,
                radius: c.radius,
                style: c.style.clone(),
            },
            ElementKind::Diamond(d) => ShapeNode::Polygon {
                points: d.points.to_vec(),
                style: d.style.clone(),
            },
            ElementKind::Line(s) | ElementKind::Arrow(s) => ShapeNode::Line {
                start: s.start,
                end: s.end,
                arrow: matches!(kind, ElementKind::Arrow(_)),
                style: s.style.clone(),
            },
            ElementKind::Text(t) => ShapeNode::Text {
                position: t.position,
                content: t.content.clone(),
                font_size: t.font_size,
                color: t.color,
            },
            ElementKind::Image(i) => ShapeNode::Image {
                rect: i.as_rect(),
                href: i.url.clone(),
            },
        }
    }
}

/// Everything a render target needs to draw one node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDescription {
    pub shape: ShapeNode,
    pub z_index: i64,
    pub selected: bool,
    pub preview: bool,
}

impl NodeDescription {
    pub fn element(element: &Element, selected: bool) -> Self {
        Self {
            shape: ShapeNode::from_kind(&element.kind),
            z_index: element.z_index,
            selected,
            preview: false,
        }
    }

    pub fn preview(kind: &ElementKind) -> Self {
        Self {
            shape: ShapeNode::from_kind(kind),
            z_index: i64::MAX,
            selected: false,
            preview: true,
        }
    }
    /// Sort key, back to front. Element nodes share the order hit testing
    /// uses; the preview stays on top.
    pub fn stacking(&self, key: NodeKey) -> (i64, NodeKey) {
        (self.z_index, key)
    }
}

/// A scene graph the surface can add nodes to and remove nodes from.
pub trait RenderTarget {
    /// Insert or replace a node.
    fn upsert_node(&mut self, key: NodeKey, node: &NodeDescription);

    /// Remove a node. Unknown keys are ignored.
    fn remove_node(&mut self, key: NodeKey);

    /// Set the visible world rectangle.
    fn set_viewport_region(&mut self, region: Rect);

    /// Whether the target is bound to a display surface.
    fn is_attached(&self) -> bool {
        true
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;

    /// Render target that records the current scene.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingTarget {
        pub nodes: HashMap<NodeKey, NodeDescription>,
        pub region: Option<Rect>,
        pub detached: bool,
    }

    impl RenderTarget for RecordingTarget {
        fn upsert_node(&mut self, key: NodeKey, node: &NodeDescription) {
            self.nodes.insert(key, node.clone());
        }

        fn remove_node(&mut self, key: NodeKey) {
            self.nodes.remove(&key);
        }

        fn set_viewport_region(&mut self, region: Rect) {
            self.region = Some(region);
        }

        fn is_attached(&self) -> bool {
            !self.detached
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Segment, Text};

    #[test]
    fn test_arrow_node() {
        let kind = ElementKind::Arrow(Segment::new(Point::ZERO, Point::new(10.0, 0.0)));
        match ShapeNode::from_kind(&kind) {
            ShapeNode::Line { arrow, .. } => assert!(arrow),
            other => panic!("unexpected node {other:?}"),
        }
        let line = ElementKind::Line(Segment::new(Point::ZERO, Point::new(10.0, 0.0)));
        assert!(matches!(
            ShapeNode::from_kind(&line),
            ShapeNode::Line { arrow: false, .. }
        ));
    }

    #[test]
    fn test_preview_description() {
        let kind = ElementKind::Text(Text::new(Point::ZERO, "x".to_string()));
        let node = NodeDescription::preview(&kind);
        assert!(node.preview);
        assert!(!node.selected);
        assert_eq!(NodeKey::Preview.to_string(), "preview");
    }
}
