//! SketchSync Core Library
//!
//! Platform-agnostic state engine for the SketchSync collaborative canvas:
//! elements, viewport, tools, history, persistence queueing and realtime sync.

pub mod config;
pub mod document;
pub mod drag;
pub mod driver;
pub mod elements;
pub mod history;
pub mod input;
pub mod persistence;
pub mod presence;
pub mod render;
pub mod schedule;
pub mod surface;
pub mod sync;
pub mod text_edit;
pub mod tools;
pub mod viewport;

pub use config::{SurfaceConfig, SurfaceError};
pub use document::{CanvasId, ElementSet};
pub use elements::{Element, ElementId, ElementKind, ElementType, LocalId, WireElement};
pub use history::History;
pub use input::{KeyEvent, Modifiers, PointerEvent};
pub use persistence::{MemoryPersistence, PersistError, PersistRequest, PersistenceClient};
pub use presence::{ActiveUser, Avatar, Presence, UserId};
pub use render::{NodeDescription, NodeKey, RenderTarget, ShapeNode};
pub use surface::DrawingSurface;
pub use sync::{ClientMessage, LoopbackChannel, RealtimeChannel, ServerMessage};
pub use tools::ToolKind;
pub use viewport::Viewport;
