//! SketchSync Render Library
//!
//! SVG render target for the SketchSync canvas. `SvgScene` keeps the node
//! graph the surface builds and serializes it to a standalone document;
//! `markup` renders single nodes for hosts that patch a live DOM.

pub mod markup;
mod scene;

pub use markup::{ARROWHEAD_ID, RenderError, RenderResult};
pub use scene::SvgScene;
