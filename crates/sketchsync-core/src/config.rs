//! Surface configuration loaded from the page bootstrap JSON.

use crate::document::CanvasId;
use crate::drag::MOVE_NOISE_THRESHOLD;
use crate::elements::WireElement;
use crate::history::MAX_HISTORY;
use crate::presence::ActiveUser;
use crate::viewport::{MAX_ZOOM, MIN_ZOOM};
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Initialization errors.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Render target is missing or detached")]
    MissingRenderTarget,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Everything needed to open a canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SurfaceConfig {
    pub id: CanvasId,
    pub name: String,
    /// Persisted elements, in stacking order.
    pub elements: Vec<WireElement>,
    pub current_user: ActiveUser,
    pub max_history: usize,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Hit distance for lines and arrows, in world units.
    pub line_hit_tolerance: f64,
    pub move_noise_threshold: f64,
    pub persist_debounce_ms: u64,
    pub text_commit_grace_ms: u64,
    pub default_font_size: f64,
    pub default_image_size: f64,
    pub container_origin: Point,
    pub container_size: Size,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            id: CanvasId::default(),
            name: "Untitled".to_string(),
            elements: Vec::new(),
            current_user: ActiveUser {
                id: Default::default(),
                name: String::new(),
                profile_picture: None,
            },
            max_history: MAX_HISTORY,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            line_hit_tolerance: 5.0,
            move_noise_threshold: MOVE_NOISE_THRESHOLD,
            persist_debounce_ms: 150,
            text_commit_grace_ms: 200,
            default_font_size: 16.0,
            default_image_size: 200.0,
            container_origin: Point::ZERO,
            container_size: Size::new(800.0, 600.0),
        }
    }
}

impl SurfaceConfig {
    /// Parse and validate.
    pub fn from_json(json: &str) -> Result<Self, SurfaceError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SurfaceError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SurfaceError> {
        if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom) {
            return Err(SurfaceError::InvalidConfig(format!(
                "zoom bounds [{}, {}] are invalid",
                self.min_zoom, self.max_zoom
            )));
        }
        if self.max_history == 0 {
            return Err(SurfaceError::InvalidConfig(
                "maxHistory must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn persist_debounce(&self) -> Duration {
        Duration::from_millis(self.persist_debounce_ms)
    }

    pub fn text_commit_grace(&self) -> Duration {
        Duration::from_millis(self.text_commit_grace_ms)
    }
}
