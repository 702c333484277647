//! In-memory persistence backend.

use super::{BoxFuture, PersistError, PersistResult, PersistenceClient, UploadedImage};
use crate::document::CanvasId;
use crate::elements::{ElementId, ElementType, WireElement, WireProperties};
use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

/// In-memory backend for tests and the offline demo.
pub struct MemoryPersistence {
    elements: RwLock<BTreeMap<ElementId, (CanvasId, WireElement)>>,
    next_id: AtomicI64,
    offline: AtomicBool,
}

impl Default for MemoryPersistence {
    fn default() -> Self {
        Self {
            elements: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            offline: AtomicBool::new(false),
        }
    }
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with a network error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> PersistResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(PersistError::Network("offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn lock_error<E: std::fmt::Display>(e: E) -> PersistError {
        PersistError::Network(format!("Lock error: {}", e))
    }

    /// Stored elements of one canvas, in id order.
    pub fn elements(&self, canvas_id: CanvasId) -> Vec<WireElement> {
        match self.elements.read() {
            Ok(elements) => elements
                .values()
                .filter(|(canvas, _)| *canvas == canvas_id)
                .map(|(_, element)| element.clone())
                .collect(),
            Err(e) => {
                log::error!("Memory persistence lock poisoned: {}", e);
                Vec::new()
            }
        }
    }

    pub fn get(&self, id: ElementId) -> Option<WireElement> {
        let elements = self.elements.read().ok()?;
        elements.get(&id).map(|(_, element)| element.clone())
    }
}

impl PersistenceClient for MemoryPersistence {
    fn create(
        &self,
        canvas_id: CanvasId,
        element_type: ElementType,
        properties: &WireProperties,
        z_index: i64,
    ) -> BoxFuture<'_, PersistResult<ElementId>> {
        let properties = properties.clone();
        Box::pin(async move {
            self.check_online()?;
            let id = ElementId(self.next_id.fetch_add(1, Ordering::SeqCst));
            let element = WireElement {
                id: Some(id),
                element_type,
                properties,
                z_index,
            };
            let mut elements = self.elements.write().map_err(Self::lock_error)?;
            elements.insert(id, (canvas_id, element));
            Ok(id)
        })
    }

    fn update(
        &self,
        id: ElementId,
        properties: &WireProperties,
        z_index: i64,
    ) -> BoxFuture<'_, PersistResult<()>> {
        let properties = properties.clone();
        Box::pin(async move {
            self.check_online()?;
            let mut elements = self.elements.write().map_err(Self::lock_error)?;
            let (_, element) = elements.get_mut(&id).ok_or(PersistError::NotFound(id))?;
            element.properties = properties;
            element.z_index = z_index;
            Ok(())
        })
    }

    fn delete(&self, id: ElementId) -> BoxFuture<'_, PersistResult<()>> {
        Box::pin(async move {
            self.check_online()?;
            let mut elements = self.elements.write().map_err(Self::lock_error)?;
            elements
                .remove(&id)
                .map(|_| ())
                .ok_or(PersistError::NotFound(id))
        })
    }

    fn upload_image(
        &self,
        canvas_id: CanvasId,
        bytes: Vec<u8>,
    ) -> BoxFuture<'_, PersistResult<UploadedImage>> {
        Box::pin(async move {
            self.check_online()?;
            if bytes.is_empty() {
                return Err(PersistError::Rejected(400));
            }
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            Ok(UploadedImage {
                url: format!("/static/uploads/canvas_{}/image_{}.png", canvas_id, n),
                width: None,
                height: None,
            })
        })
    }
}
