//! In-memory SVG scene graph.

use crate::markup::{self, RenderResult};
use kurbo::Rect;
use sketchsync_core::render::{NodeDescription, NodeKey, RenderTarget};
use std::collections::HashMap;
use std::fmt::Write;

/// Scene graph that serializes to a standalone SVG document.
///
/// Nodes stack by `(z_index, key)`, matching the surface's hit-test order.
#[derive(Debug, Default)]
pub struct SvgScene {
    nodes: HashMap<NodeKey, NodeDescription>,
    region: Rect,
}

impl SvgScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, key: NodeKey) -> Option<&NodeDescription> {
        self.nodes.get(&key)
    }

    pub fn region(&self) -> Rect {
        self.region
    }

    /// Nodes back to front.
    pub fn ordered(&self) -> Vec<(NodeKey, &NodeDescription)> {
        let mut nodes: Vec<_> = self.nodes.iter().map(|(key, node)| (*key, node)).collect();
        nodes.sort_by_key(|(key, node)| node.stacking(*key));
        nodes
    }

    /// Serialize the scene.
    pub fn to_svg(&self) -> RenderResult<String> {
        let mut svg = String::new();
        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{}">"#,
            markup::view_box(self.region)
        )?;
        markup::write_defs(&mut svg)?;
        for (key, node) in self.ordered() {
            markup::write_node(&mut svg, key, node)?;
        }
        writeln!(svg, "</svg>")?;
        Ok(svg)
    }
}

impl RenderTarget for SvgScene {
    fn upsert_node(&mut self, key: NodeKey, node: &NodeDescription) {
        self.nodes.insert(key, node.clone());
    }

    fn remove_node(&mut self, key: NodeKey) {
        if self.nodes.remove(&key).is_none() {
            log::debug!("Remove of unknown node {}", key);
        }
    }

    fn set_viewport_region(&mut self, region: Rect) {
        self.region = region;
    }
}
