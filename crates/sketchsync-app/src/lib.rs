//! SketchSync Application
//!
//! Host shells for the drawing surface: a scripted native session backed by
//! in-memory collaborators, and a wasm-bindgen handle for the browser page.

#[cfg(feature = "native")]
mod app;

#[cfg(feature = "native")]
pub use app::{App, AppConfig, AppError, ScriptStep};

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::CanvasEditor;
