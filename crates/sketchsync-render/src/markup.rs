//! SVG markup for render nodes.

use kurbo::{Point, Rect};
use sketchsync_core::elements::ShapeStyle;
use sketchsync_core::render::{NodeDescription, NodeKey, ShapeNode};
use std::fmt::{self, Write};
use thiserror::Error;

/// Id of the shared arrowhead marker definition.
pub const ARROWHEAD_ID: &str = "arrowhead";

/// Render errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to write markup: {0}")]
    Format(#[from] fmt::Error),
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// `viewBox` attribute value for a visible world region.
pub fn view_box(region: Rect) -> String {
    format!(
        "{} {} {} {}",
        region.x0,
        region.y0,
        region.width(),
        region.height()
    )
}

/// `<defs>` block holding the arrowhead marker.
pub fn write_defs(svg: &mut String) -> RenderResult<()> {
    writeln!(svg, "  <defs>")?;
    writeln!(
        svg,
        r#"    <marker id="{ARROWHEAD_ID}" markerWidth="10" markerHeight="10" refX="9" refY="3" orient="auto">"#
    )?;
    writeln!(svg, r##"      <polygon points="0 0, 10 3, 0 6" fill="#000000"/>"##)?;
    writeln!(svg, "    </marker>")?;
    writeln!(svg, "  </defs>")?;
    Ok(())
}

/// Group element for one node.
pub fn write_node(svg: &mut String, key: NodeKey, node: &NodeDescription) -> RenderResult<()> {
    let class = if node.preview {
        "drawing-preview"
    } else if node.selected {
        "canvas-element selected"
    } else {
        "canvas-element"
    };
    writeln!(svg, r#"  <g data-node="{key}" class="{class}">"#)?;
    write!(svg, "    ")?;
    write_shape(svg, &node.shape)?;
    writeln!(svg)?;
    writeln!(svg, "  </g>")?;
    Ok(())
}

/// Markup of a single node, for hosts that patch a live document.
pub fn node_markup(key: NodeKey, node: &NodeDescription) -> RenderResult<String> {
    let mut svg = String::new();
    write_node(&mut svg, key, node)?;
    Ok(svg)
}

fn write_shape(svg: &mut String, shape: &ShapeNode) -> RenderResult<()> {
    match shape {
        ShapeNode::Rect { rect, style } => write!(
            svg,
            r#"<rect x="{}" y="{}" width="{}" height="{}" {}/>"#,
            rect.x0,
            rect.y0,
            rect.width(),
            rect.height(),
            stroke_attrs(style)
        )?,
        ShapeNode::Circle {
            center,
            radius,
            style,
        } => write!(
            svg,
            r#"<circle cx="{}" cy="{}" r="{}" {}/>"#,
            center.x,
            center.y,
            radius,
            stroke_attrs(style)
        )?,
        ShapeNode::Polygon { points, style } => write!(
            svg,
            r#"<polygon points="{}" {}/>"#,
            polygon_points(points),
            stroke_attrs(style)
        )?,
        ShapeNode::Line {
            start,
            end,
            arrow,
            style,
        } => {
            write!(
                svg,
                r#"<line x1="{}" y1="{}" x2="{}" y2="{}" {}"#,
                start.x,
                start.y,
                end.x,
                end.y,
                stroke_attrs(style)
            )?;
            if *arrow {
                write!(svg, r#" marker-end="url(#{ARROWHEAD_ID})""#)?;
            }
            write!(svg, "/>")?;
        }
        ShapeNode::Text {
            position,
            content,
            font_size,
            color,
        } => write!(
            svg,
            r#"<text x="{}" y="{}" font-size="{}" fill="{}">{}</text>"#,
            position.x,
            position.y,
            font_size,
            color.to_hex(),
            escape_xml(content)
        )?,
        ShapeNode::Image { rect, href } => write!(
            svg,
            r#"<image x="{}" y="{}" width="{}" height="{}" href="{}"/>"#,
            rect.x0,
            rect.y0,
            rect.width(),
            rect.height(),
            escape_xml(href)
        )?,
    }
    Ok(())
}

fn stroke_attrs(style: &ShapeStyle) -> String {
    let fill = style
        .fill_color
        .map(|c| c.to_hex())
        .unwrap_or_else(|| "none".to_string());
    format!(
        r#"stroke="{}" stroke-width="{}" fill="{}""#,
        style.stroke_color.to_hex(),
        style.stroke_width,
        fill
    )
}

fn polygon_points(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
