//! Viewport module for pan/zoom transforms.
//!
//! Screen points are container-relative after subtracting `container_origin`;
//! the mapping is `screen = world * zoom + pan_offset + container_origin`.

use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Smallest allowed zoom factor.
pub const MIN_ZOOM: f64 = 0.1;
/// Largest allowed zoom factor.
pub const MAX_ZOOM: f64 = 5.0;

/// Zoom multiplier for the zoom-in button.
pub const ZOOM_IN_STEP: f64 = 1.2;
/// Zoom multiplier for the zoom-out button.
pub const ZOOM_OUT_STEP: f64 = 0.8;

/// Wheel zoom factors (scrolling down zooms out).
pub const WHEEL_ZOOM_OUT: f64 = 0.9;
pub const WHEEL_ZOOM_IN: f64 = 1.1;

/// The current pan/zoom transform of the drawing surface.
///
/// Never persisted: every client has its own viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// Scale factor, clamped to `[min_zoom, max_zoom]`.
    pub zoom: f64,
    /// Pan offset in screen pixels.
    pub pan_offset: Vec2,
    /// Position of the drawing container on the page.
    pub container_origin: Point,
    /// Size of the drawing container in screen pixels.
    pub container_size: Size,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_offset: Vec2::ZERO,
            container_origin: Point::ZERO,
            container_size: Size::new(800.0, 600.0),
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        }
    }
}

impl Viewport {
    /// Create a viewport for a container at `origin` with the given size.
    pub fn new(container_origin: Point, container_size: Size) -> Self {
        Self {
            container_origin,
            container_size,
            ..Self::default()
        }
    }

    /// Override the zoom bounds (used by configuration).
    pub fn with_zoom_bounds(mut self, min_zoom: f64, max_zoom: f64) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom = self.zoom.clamp(min_zoom, max_zoom);
        self
    }

    /// World-to-screen transform (page coordinates).
    pub fn transform(&self) -> Affine {
        Affine::translate(self.container_origin.to_vec2() + self.pan_offset)
            * Affine::scale(self.zoom)
    }

    /// Screen-to-world transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom)
            * Affine::translate(-(self.container_origin.to_vec2() + self.pan_offset))
    }

    /// Convert a page-space screen point to world coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    /// Convert a world point to page-space screen coordinates.
    ///
    /// Used to place the inline text editor over a world position.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Pan by a raw screen-space delta (not scaled by zoom).
    pub fn pan(&mut self, delta: Vec2) {
        self.pan_offset += delta;
    }

    /// Zoom by `factor`, keeping the world point under `screen_point` fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let world_point = self.screen_to_world(screen_point);
        self.zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);

        let local = screen_point - self.container_origin;
        self.pan_offset = local - world_point.to_vec2() * self.zoom;
    }

    /// Zoom in one step around the current pan offset.
    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_IN_STEP).min(self.max_zoom);
    }

    /// Zoom out one step around the current pan offset.
    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom * ZOOM_OUT_STEP).max(self.min_zoom);
    }

    /// Zoom at the cursor for a wheel event.
    pub fn wheel(&mut self, screen_point: Point, delta_y: f64) {
        let factor = if delta_y > 0.0 { WHEEL_ZOOM_OUT } else { WHEEL_ZOOM_IN };
        self.zoom_at(screen_point, factor);
    }

    /// The visible world rectangle handed to the render target.
    pub fn region(&self) -> Rect {
        let origin = Point::new(
            -self.pan_offset.x / self.zoom,
            -self.pan_offset.y / self.zoom,
        );
        let size = Size::new(
            self.container_size.width / self.zoom,
            self.container_size.height / self.zoom,
        );
        Rect::from_origin_size(origin, size)
    }

    /// Human readable zoom percentage, e.g. `"120%"`.
    pub fn zoom_label(&self) -> String {
        format!("{}%", (self.zoom * 100.0).round() as i64)
    }
}
