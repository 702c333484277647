//! Backend JSON representation of elements.
//!
//! Properties are a flat camelCase object. Circles, diamonds and segments
//! are written with their bounding box as well as their own geometry so
//! older clients that only read `x/y/width/height` still place them.

use super::{
    Circle, Diamond, Element, ElementGeometry, ElementId, ElementKind, ElementType, Image,
    Rectangle, Segment, SerializableColor, ShapeStyle, Text,
    image::DEFAULT_IMAGE_SIZE,
    text::DEFAULT_FONT_SIZE,
};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors when converting between elements and their wire form.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("{element_type} element is missing `{field}`")]
    MissingField {
        element_type: ElementType,
        field: &'static str,
    },
    #[error("Invalid element JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// An element as stored by the backend and carried on the realtime channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ElementId>,
    #[serde(alias = "type")]
    pub element_type: ElementType,
    pub properties: WireProperties,
    #[serde(default, alias = "zIndex")]
    pub z_index: i64,
}

/// Flat property bag; which fields are present depends on the element type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cx: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    /// `"none"` means unfilled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
}

impl WireProperties {
    fn with_box(mut self, rect: Rect) -> Self {
        self.x = Some(rect.x0);
        self.y = Some(rect.y0);
        self.width = Some(rect.width());
        self.height = Some(rect.height());
        self
    }

    fn with_style(mut self, style: &ShapeStyle) -> Self {
        self.stroke_color = Some(style.stroke_color.to_hex());
        self.fill_color = Some(
            style
                .fill_color
                .map_or_else(|| "none".to_string(), |c| c.to_hex()),
        );
        self.stroke_width = Some(style.stroke_width);
        self
    }

    fn style(&self) -> ShapeStyle {
        let default = ShapeStyle::default();
        ShapeStyle {
            stroke_color: self
                .stroke_color
                .as_deref()
                .and_then(SerializableColor::parse_hex)
                .unwrap_or(default.stroke_color),
            stroke_width: self.stroke_width.unwrap_or(default.stroke_width),
            fill_color: self
                .fill_color
                .as_deref()
                .and_then(SerializableColor::parse_hex),
        }
    }

    /// Bounding box fields, if all four are present.
    fn bbox(&self) -> Option<Rect> {
        Some(Rect::new(
            self.x?,
            self.y?,
            self.x? + self.width?,
            self.y? + self.height?,
        ))
    }

    fn position(&self, element_type: ElementType) -> Result<Point, WireError> {
        let x = self.x.ok_or(WireError::MissingField {
            element_type,
            field: "x",
        })?;
        let y = self.y.ok_or(WireError::MissingField {
            element_type,
            field: "y",
        })?;
        Ok(Point::new(x, y))
    }

    fn endpoints(&self) -> Option<(Point, Point)> {
        Some((
            Point::new(self.x1?, self.y1?),
            Point::new(self.x2?, self.y2?),
        ))
    }
}

impl ElementKind {
    /// Encode the per-kind payload as wire properties.
    pub fn to_properties(&self) -> WireProperties {
        let props = WireProperties::default();
        match self {
            ElementKind::Rectangle(r) => props.with_box(r.as_rect()).with_style(&r.style),
            ElementKind::Circle(c) => {
                let mut props = props.with_box(c.bounds()).with_style(&c.style);
                props.cx = Some(c.center.x);
                props.cy = Some(c.center.y);
                props.r = Some(c.radius);
                props
            }
            ElementKind::Diamond(d) => {
                let mut props = props.with_box(d.bounds()).with_style(&d.style);
                props.points = Some(d.points.to_vec());
                props
            }
            ElementKind::Line(s) | ElementKind::Arrow(s) => {
                let mut props = props.with_box(s.bounds()).with_style(&s.style);
                props.x1 = Some(s.start.x);
                props.y1 = Some(s.start.y);
                props.x2 = Some(s.end.x);
                props.y2 = Some(s.end.y);
                props
            }
            ElementKind::Text(t) => WireProperties {
                x: Some(t.position.x),
                y: Some(t.position.y),
                text: Some(t.content.clone()),
                font_size: Some(t.font_size),
                color: Some(t.color.to_hex()),
                ..props
            },
            ElementKind::Image(i) => WireProperties {
                image_url: Some(i.url.clone()),
                ..props.with_box(i.as_rect())
            },
        }
    }

    /// Decode a payload for the given type.
    ///
    /// Circles missing their own geometry read the center from `x`/`y` and
    /// the radius from the box size. Diamonds and segments derive theirs
    /// from the bounding box.
    pub fn from_properties(
        element_type: ElementType,
        props: &WireProperties,
    ) -> Result<Self, WireError> {
        let missing = |field| WireError::MissingField {
            element_type,
            field,
        };
        let kind = match element_type {
            ElementType::Rectangle => {
                let rect = props.bbox().ok_or_else(|| missing("width"))?;
                let mut shape = Rectangle::new(rect.origin(), rect.width(), rect.height());
                shape.style = props.style();
                ElementKind::Rectangle(shape)
            }
            ElementType::Circle => {
                // Legacy payloads put the center in `x`/`y`.
                let cx = props.cx.or(props.x).ok_or_else(|| missing("cx"))?;
                let cy = props.cy.or(props.y).ok_or_else(|| missing("cy"))?;
                let r = match (props.r, props.width, props.height) {
                    (Some(r), _, _) => r,
                    (None, Some(w), Some(h)) => w.min(h).abs() / 2.0,
                    _ => return Err(missing("r")),
                };
                let mut shape = Circle::new(Point::new(cx, cy), r);
                shape.style = props.style();
                ElementKind::Circle(shape)
            }
            ElementType::Diamond => {
                let mut shape = match props.points.as_deref() {
                    Some([a, b, c, d]) => Diamond::new([*a, *b, *c, *d]),
                    _ => {
                        let rect = props.bbox().ok_or_else(|| missing("points"))?;
                        Diamond::from_corners(rect.origin(), Point::new(rect.x1, rect.y1))
                    }
                };
                shape.style = props.style();
                ElementKind::Diamond(shape)
            }
            ElementType::Line | ElementType::Arrow => {
                let (start, end) = match props.endpoints() {
                    Some(endpoints) => endpoints,
                    None => {
                        let rect = props.bbox().ok_or_else(|| missing("x2"))?;
                        (rect.origin(), Point::new(rect.x1, rect.y1))
                    }
                };
                let mut shape = Segment::new(start, end);
                shape.style = props.style();
                if element_type == ElementType::Arrow {
                    ElementKind::Arrow(shape)
                } else {
                    ElementKind::Line(shape)
                }
            }
            ElementType::Text => {
                let position = props.position(element_type)?;
                let content = props.text.clone().ok_or_else(|| missing("text"))?;
                let mut text = Text::new(position, content)
                    .with_font_size(props.font_size.unwrap_or(DEFAULT_FONT_SIZE));
                if let Some(color) = props.color.as_deref().and_then(SerializableColor::parse_hex) {
                    text.color = color;
                }
                ElementKind::Text(text)
            }
            ElementType::Image => {
                let position = props.position(element_type)?;
                let url = props.image_url.clone().ok_or_else(|| missing("imageUrl"))?;
                ElementKind::Image(Image::new(
                    position,
                    props.width.unwrap_or(DEFAULT_IMAGE_SIZE),
                    props.height.unwrap_or(DEFAULT_IMAGE_SIZE),
                    url,
                ))
            }
        };
        Ok(kind)
    }
}

impl Element {
    /// Encode for the backend and the realtime channel.
    pub fn to_wire(&self) -> WireElement {
        WireElement {
            id: self.id,
            element_type: self.element_type(),
            properties: self.kind.to_properties(),
            z_index: self.z_index,
        }
    }

    /// Decode a persisted element. A fresh local id is assigned.
    pub fn from_wire(wire: &WireElement) -> Result<Self, WireError> {
        let kind = ElementKind::from_properties(wire.element_type, &wire.properties)?;
        Ok(Self {
            id: wire.id,
            ..Element::new(kind, wire.z_index)
        })
    }
}

impl WireElement {
    pub fn from_json(json: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_backend_rectangle() {
        let json = r##"{
            "id": 7,
            "element_type": "rectangle",
            "properties": {"x": 10, "y": 20, "width": 30, "height": 40,
                           "strokeColor": "#ff0000", "fillColor": "none", "strokeWidth": 3},
            "z_index": 2
        }"##;
        let wire = WireElement::from_json(json).unwrap();
        let element = Element::from_wire(&wire).unwrap();
        assert_eq!(element.id, Some(ElementId(7)));
        assert_eq!(element.z_index, 2);
        match &element.kind {
            ElementKind::Rectangle(r) => {
                assert_eq!(r.position, Point::new(10.0, 20.0));
                assert!((r.width - 30.0).abs() < f64::EPSILON);
                assert_eq!(r.style.stroke_color, SerializableColor::new(255, 0, 0, 255));
                assert_eq!(r.style.fill_color, None);
                assert!((r.style.stroke_width - 3.0).abs() < f64::EPSILON);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_decode_client_object_with_type_key() {
        let json = r#"{"id": 3, "type": "line",
            "properties": {"x1": 0, "y1": 0, "x2": 10, "y2": 5}, "z_index": 0}"#;
        let element = Element::from_wire(&WireElement::from_json(json).unwrap()).unwrap();
        assert_eq!(element.element_type(), ElementType::Line);
    }

    #[test]
    fn test_legacy_circle_from_box() {
        let json = r#"{"element_type": "circle",
            "properties": {"x": 30, "y": 40, "width": 20, "height": 16}}"#;
        let element = Element::from_wire(&WireElement::from_json(json).unwrap()).unwrap();
        match element.kind {
            ElementKind::Circle(c) => {
                assert_eq!(c.center, Point::new(30.0, 40.0));
                assert!((c.radius - 8.0).abs() < f64::EPSILON);
            }
            other => panic!("unexpected kind {other:?}"),
        }
        assert_eq!(element.id, None);
    }

    #[test]
    fn test_legacy_arrow_from_box() {
        let props = WireProperties {
            x: Some(1.0),
            y: Some(2.0),
            width: Some(3.0),
            height: Some(4.0),
            ..Default::default()
        };
        let kind = ElementKind::from_properties(ElementType::Arrow, &props).unwrap();
        match kind {
            ElementKind::Arrow(s) => {
                assert_eq!(s.start, Point::new(1.0, 2.0));
                assert_eq!(s.end, Point::new(4.0, 6.0));
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_missing_text_is_error() {
        let props = WireProperties {
            x: Some(0.0),
            y: Some(0.0),
            ..Default::default()
        };
        let err = ElementKind::from_properties(ElementType::Text, &props).unwrap_err();
        assert!(matches!(err, WireError::MissingField { field: "text", .. }));
    }

    #[test]
    fn test_encode_text_defaults() {
        let kind = ElementKind::Text(Text::new(Point::new(5.0, 6.0), "Hi".to_string()));
        let json = serde_json::to_value(kind.to_properties()).unwrap();
        assert_eq!(json["text"], "Hi");
        assert_eq!(json["fontSize"], 16.0);
        assert_eq!(json["color"], "#000000");
        assert!(json.get("width").is_none());
    }

    #[test]
    fn test_encode_diamond_keeps_box_and_points() {
        let kind = ElementKind::Diamond(Diamond::from_corners(
            Point::new(0.0, 0.0),
            Point::new(40.0, 20.0),
        ));
        let props = kind.to_properties();
        assert_eq!(props.width, Some(40.0));
        assert_eq!(props.points.as_ref().map(Vec::len), Some(4));
        assert_eq!(props.fill_color.as_deref(), Some("none"));
        let back = ElementKind::from_properties(ElementType::Diamond, &props).unwrap();
        assert_eq!(back, kind);
    }

    #[test]
    fn test_image_size_fallback() {
        let props = WireProperties {
            x: Some(0.0),
            y: Some(0.0),
            image_url: Some("/static/uploads/a.png".to_string()),
            ..Default::default()
        };
        match ElementKind::from_properties(ElementType::Image, &props).unwrap() {
            ElementKind::Image(i) => {
                assert!((i.width - DEFAULT_IMAGE_SIZE).abs() < f64::EPSILON);
                assert!((i.height - DEFAULT_IMAGE_SIZE).abs() < f64::EPSILON);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_unknown_type_rejected() {
        let json = r#"{"element_type": "star", "properties": {}}"#;
        assert!(WireElement::from_json(json).is_err());
    }
}
