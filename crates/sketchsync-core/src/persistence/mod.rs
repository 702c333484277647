//! Persistence client contract.
//!
//! The surface never awaits these calls itself. It queues `PersistRequest`s
//! and the host (see `driver`) runs them and feeds results back.

mod memory;

pub use memory::MemoryPersistence;

use crate::document::CanvasId;
use crate::elements::{ElementId, ElementType, LocalId, WireProperties};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Persistence errors.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request rejected with status {0}")]
    Rejected(u16),
    #[error("Element not found: {0}")]
    NotFound(ElementId),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for PersistError {
    fn from(err: serde_json::Error) -> Self {
        PersistError::Serialization(err.to_string())
    }
}

/// Result type for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Response of an image upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub url: String,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

/// Backend calls for element storage.
///
/// Note: On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait PersistenceClient: Send + Sync {
    /// Create an element, returning its assigned id.
    fn create(
        &self,
        canvas_id: CanvasId,
        element_type: ElementType,
        properties: &WireProperties,
        z_index: i64,
    ) -> BoxFuture<'_, PersistResult<ElementId>>;

    /// Replace an element's properties.
    fn update(
        &self,
        id: ElementId,
        properties: &WireProperties,
        z_index: i64,
    ) -> BoxFuture<'_, PersistResult<()>>;

    fn delete(&self, id: ElementId) -> BoxFuture<'_, PersistResult<()>>;

    /// Upload image bytes for a canvas.
    fn upload_image(
        &self,
        canvas_id: CanvasId,
        bytes: Vec<u8>,
    ) -> BoxFuture<'_, PersistResult<UploadedImage>>;
}

/// Backend calls for element storage (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait PersistenceClient {
    /// Create an element, returning its assigned id.
    fn create(
        &self,
        canvas_id: CanvasId,
        element_type: ElementType,
        properties: &WireProperties,
        z_index: i64,
    ) -> BoxFuture<'_, PersistResult<ElementId>>;

    /// Replace an element's properties.
    fn update(
        &self,
        id: ElementId,
        properties: &WireProperties,
        z_index: i64,
    ) -> BoxFuture<'_, PersistResult<()>>;

    fn delete(&self, id: ElementId) -> BoxFuture<'_, PersistResult<()>>;

    /// Upload image bytes for a canvas.
    fn upload_image(
        &self,
        canvas_id: CanvasId,
        bytes: Vec<u8>,
    ) -> BoxFuture<'_, PersistResult<UploadedImage>>;
}

/// A backend call queued by the surface.
///
/// Requests carry the local id so results can be applied to whatever the
/// element set looks like when they complete.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistRequest {
    Create {
        local_id: LocalId,
        element_type: ElementType,
        properties: WireProperties,
        z_index: i64,
    },
    Update {
        local_id: LocalId,
        id: ElementId,
        properties: WireProperties,
        z_index: i64,
    },
    Delete {
        id: ElementId,
    },
    UploadImage {
        bytes: Vec<u8>,
        /// World point the image is placed at.
        at: Point,
    },
}

impl PersistRequest {
    pub fn name(&self) -> &'static str {
        match self {
            PersistRequest::Create { .. } => "create",
            PersistRequest::Update { .. } => "update",
            PersistRequest::Delete { .. } => "delete",
            PersistRequest::UploadImage { .. } => "upload_image",
        }
    }
}
