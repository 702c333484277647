//! Moving an element with the select tool.

use crate::elements::{DragAnchor, ElementKind, LocalId};
use crate::schedule::{Debounce, Instant};
use kurbo::{Point, Vec2};
use std::time::Duration;

/// Default jitter threshold for drag moves, in world units.
pub const MOVE_NOISE_THRESHOLD: f64 = 0.1;

/// Default quiet period before a moved element is persisted.
pub const PERSIST_DEBOUNCE: Duration = Duration::from_millis(150);

/// One drag of one element, from pointer-down to pointer-up.
#[derive(Debug, Clone)]
pub struct DragSession {
    local_id: LocalId,
    /// World point of the pointer-down.
    start: Point,
    /// Captured on the first applied move.
    original: Option<DragAnchor>,
    last_delta: Vec2,
    noise_threshold: f64,
    persist: Debounce<LocalId>,
}

impl DragSession {
    pub fn new(local_id: LocalId, start: Point, noise_threshold: f64, debounce: Duration) -> Self {
        Self {
            local_id,
            start,
            original: None,
            last_delta: Vec2::ZERO,
            noise_threshold,
            persist: Debounce::new(debounce),
        }
    }

    pub fn local_id(&self) -> LocalId {
        self.local_id
    }

    /// Whether any move has been applied.
    pub fn moved(&self) -> bool {
        self.original.is_some()
    }

    /// Move the element so its position is `original + (pointer - start)`.
    ///
    /// Returns false when the move is within the noise threshold of the
    /// last applied one.
    pub fn drag_to(&mut self, kind: &mut ElementKind, pointer: Point, now: Instant) -> bool {
        let delta = pointer - self.start;
        if (delta.x - self.last_delta.x).abs() <= self.noise_threshold
            && (delta.y - self.last_delta.y).abs() <= self.noise_threshold
        {
            return false;
        }
        let original = self.original.get_or_insert_with(|| kind.drag_anchor());
        if !kind.move_from(original, delta) {
            log::warn!("Drag anchor does not match element {}", self.local_id);
            return false;
        }
        self.last_delta = delta;
        self.persist.trigger(now, self.local_id);
        true
    }

    /// Element due for a debounced persist.
    pub fn poll_persist(&mut self, now: Instant) -> Option<LocalId> {
        self.persist.poll(now)
    }

    /// End the drag. Returns the element id if it moved and needs a final persist.
    pub fn finish(mut self) -> Option<LocalId> {
        self.persist.cancel();
        self.moved().then_some(self.local_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Circle, Rectangle};
    use uuid::Uuid;

    fn rect_kind() -> ElementKind {
        ElementKind::Rectangle(Rectangle::new(Point::new(10.0, 10.0), 20.0, 20.0))
    }

    fn position(kind: &ElementKind) -> Point {
        match kind {
            ElementKind::Rectangle(r) => r.position,
            ElementKind::Circle(c) => c.center,
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_drag_applies_delta_from_start() {
        let now = Instant::now();
        let mut kind = rect_kind();
        let mut drag = DragSession::new(Uuid::new_v4(), Point::new(15.0, 15.0), 0.1, PERSIST_DEBOUNCE);
        assert!(drag.drag_to(&mut kind, Point::new(20.0, 25.0), now));
        assert!(drag.drag_to(&mut kind, Point::new(30.0, 15.0), now));
        assert_eq!(position(&kind), Point::new(25.0, 10.0));
    }

    #[test]
    fn test_drag_there_and_back_restores_position() {
        let now = Instant::now();
        let mut kind = ElementKind::Circle(Circle::new(Point::new(3.0, 4.0), 5.0));
        let start = Point::new(3.0, 4.0);
        let mut drag = DragSession::new(Uuid::new_v4(), start, 0.1, PERSIST_DEBOUNCE);
        assert!(drag.drag_to(&mut kind, start + Vec2::new(17.5, -8.25), now));
        assert!(drag.drag_to(&mut kind, start, now));
        assert_eq!(position(&kind), Point::new(3.0, 4.0));
    }

    #[test]
    fn test_noise_suppressed() {
        let now = Instant::now();
        let mut kind = rect_kind();
        let mut drag = DragSession::new(Uuid::new_v4(), Point::new(0.0, 0.0), 0.1, PERSIST_DEBOUNCE);
        assert!(!drag.drag_to(&mut kind, Point::new(0.05, -0.05), now));
        assert!(!drag.moved());
        assert!(drag.drag_to(&mut kind, Point::new(5.0, 0.0), now));
        assert!(!drag.drag_to(&mut kind, Point::new(5.08, 0.02), now));
        assert_eq!(position(&kind), Point::new(15.0, 10.0));
    }

    #[test]
    fn test_debounced_persist() {
        let now = Instant::now();
        let id = Uuid::new_v4();
        let mut kind = rect_kind();
        let mut drag = DragSession::new(id, Point::ZERO, 0.1, PERSIST_DEBOUNCE);
        drag.drag_to(&mut kind, Point::new(1.0, 0.0), now);
        drag.drag_to(&mut kind, Point::new(2.0, 0.0), now + Duration::from_millis(100));
        assert_eq!(drag.poll_persist(now + Duration::from_millis(200)), None);
        assert_eq!(drag.poll_persist(now + Duration::from_millis(250)), Some(id));
        assert_eq!(drag.poll_persist(now + Duration::from_millis(500)), None);
    }

    #[test]
    fn test_finish() {
        let id = Uuid::new_v4();
        let idle = DragSession::new(id, Point::ZERO, 0.1, PERSIST_DEBOUNCE);
        assert_eq!(idle.finish(), None);

        let mut kind = rect_kind();
        let mut moved = DragSession::new(id, Point::ZERO, 0.1, PERSIST_DEBOUNCE);
        moved.drag_to(&mut kind, Point::new(3.0, 3.0), Instant::now());
        assert_eq!(moved.finish(), Some(id));
    }
}
