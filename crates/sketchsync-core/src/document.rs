//! The working set of elements on a canvas.

use crate::elements::{Element, ElementId, LocalId};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Backend identifier of a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanvasId(pub i64);

impl fmt::Display for CanvasId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// All elements of one canvas, keyed by local id, with stacking order.
///
/// Elements stack by `(z_index, local_id)`, the same key render targets
/// draw by, so hit testing always finds the shape drawn on top.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementSet {
    elements: HashMap<LocalId, Element>,
    /// Back to front.
    order: Vec<LocalId>,
}

impl ElementSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_elements(elements: impl IntoIterator<Item = Element>) -> Self {
        let mut set = Self::new();
        for element in elements {
            set.push(element);
        }
        set
    }

    /// Insert an element at its stacking position. Replaces an element with
    /// the same local id.
    pub fn push(&mut self, element: Element) -> LocalId {
        let local_id = element.local_id;
        self.order.retain(|id| *id != local_id);
        let index = self.stack_position(element.z_index, local_id);
        self.order.insert(index, local_id);
        self.elements.insert(local_id, element);
        local_id
    }

    /// Restack an element under a new z-index.
    pub fn set_z_index(&mut self, local_id: LocalId, z_index: i64) {
        if let Some(mut element) = self.remove(local_id) {
            element.z_index = z_index;
            self.push(element);
        }
    }

    fn stack_position(&self, z_index: i64, local_id: LocalId) -> usize {
        self.order.partition_point(|id| {
            self.elements
                .get(id)
                .is_some_and(|e| (e.z_index, e.local_id) < (z_index, local_id))
        })
    }

    pub fn remove(&mut self, local_id: LocalId) -> Option<Element> {
        let element = self.elements.remove(&local_id)?;
        self.order.retain(|id| *id != local_id);
        Some(element)
    }

    pub fn get(&self, local_id: LocalId) -> Option<&Element> {
        self.elements.get(&local_id)
    }

    pub fn get_mut(&mut self, local_id: LocalId) -> Option<&mut Element> {
        self.elements.get_mut(&local_id)
    }

    /// Find an element by its backend id.
    pub fn find_by_id(&self, id: ElementId) -> Option<&Element> {
        self.elements.values().find(|e| e.id == Some(id))
    }

    /// Local id of the element with the given backend id.
    pub fn local_id_of(&self, id: ElementId) -> Option<LocalId> {
        self.find_by_id(id).map(|e| e.local_id)
    }

    pub fn contains(&self, local_id: LocalId) -> bool {
        self.elements.contains_key(&local_id)
    }

    /// Elements back to front.
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.order.iter().filter_map(|id| self.elements.get(id))
    }

    /// Topmost element hit by a world point.
    pub fn element_at(&self, point: Point, line_tolerance: f64) -> Option<&Element> {
        self.order
            .iter()
            .rev()
            .filter_map(|id| self.elements.get(id))
            .find(|e| e.kind.hit_test(point, line_tolerance))
    }

    /// Stacking index for a newly created element.
    pub fn next_z_index(&self) -> i64 {
        self.elements
            .values()
            .map(|e| e.z_index + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Circle, ElementKind, Rectangle};

    fn rect(x: f64, y: f64, w: f64, h: f64, z: i64) -> Element {
        Element::new(
            ElementKind::Rectangle(Rectangle::new(Point::new(x, y), w, h)),
            z,
        )
    }

    #[test]
    fn test_element_at_topmost_first() {
        let mut set = ElementSet::new();
        let bottom = set.push(rect(0.0, 0.0, 100.0, 100.0, 0));
        let top = set.push(rect(50.0, 50.0, 100.0, 100.0, 1));
        assert_eq!(set.element_at(Point::new(75.0, 75.0), 5.0).map(|e| e.local_id), Some(top));
        assert_eq!(set.element_at(Point::new(10.0, 10.0), 5.0).map(|e| e.local_id), Some(bottom));
        assert!(set.element_at(Point::new(500.0, 500.0), 5.0).is_none());
    }

    #[test]
    fn test_lower_z_insert_stacks_below() {
        let mut set = ElementSet::new();
        set.push(rect(0.0, 0.0, 50.0, 50.0, 0));
        set.push(rect(100.0, 100.0, 10.0, 10.0, 1));
        let top = set.push(rect(0.0, 0.0, 50.0, 50.0, 2));
        // Arrives late, e.g. from another editor.
        let late = set.push(rect(0.0, 0.0, 50.0, 50.0, 1));

        assert_eq!(set.element_at(Point::new(25.0, 25.0), 5.0).map(|e| e.local_id), Some(top));
        let z: Vec<_> = set.iter().map(|e| e.z_index).collect();
        assert_eq!(z, vec![0, 1, 1, 2]);

        set.set_z_index(late, 3);
        assert_eq!(set.element_at(Point::new(25.0, 25.0), 5.0).map(|e| e.local_id), Some(late));
        assert_eq!(set.iter().last().map(|e| e.local_id), Some(late));
    }

    #[test]
    fn test_rectangle_scenario() {
        let mut set = ElementSet::new();
        set.push(Element::new(
            ElementKind::Rectangle(Rectangle::from_corners(
                Point::new(10.0, 10.0),
                Point::new(60.0, 40.0),
            )),
            0,
        ));
        assert!(set.element_at(Point::new(30.0, 20.0), 5.0).is_some());
        assert!(set.element_at(Point::new(5.0, 5.0), 5.0).is_none());
    }

    #[test]
    fn test_circle_scenario() {
        let set = ElementSet::from_elements([Element::new(
            ElementKind::Circle(Circle::new(Point::ZERO, 10.0)),
            0,
        )]);
        assert!(set.element_at(Point::new(7.0, 7.0), 5.0).is_some());
        assert!(set.element_at(Point::new(8.0, 8.0), 5.0).is_none());
    }

    #[test]
    fn test_remove_and_lookup_by_id() {
        let mut persisted = rect(0.0, 0.0, 10.0, 10.0, 0);
        persisted.id = Some(ElementId(42));
        let mut set = ElementSet::from_elements([persisted, rect(0.0, 0.0, 1.0, 1.0, 1)]);
        let local = set.local_id_of(ElementId(42)).unwrap();
        assert!(set.remove(local).is_some());
        assert!(set.remove(local).is_none());
        assert!(set.find_by_id(ElementId(42)).is_none());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_next_z_index() {
        let mut set = ElementSet::new();
        assert_eq!(set.next_z_index(), 0);
        set.push(rect(0.0, 0.0, 1.0, 1.0, 0));
        let second = set.push(rect(0.0, 0.0, 1.0, 1.0, 1));
        set.push(rect(0.0, 0.0, 1.0, 1.0, 2));
        set.remove(second);
        assert_eq!(set.next_z_index(), 3);
    }

    #[test]
    fn test_iter_preserves_order() {
        let a = rect(0.0, 0.0, 1.0, 1.0, 0);
        let b = rect(5.0, 5.0, 1.0, 1.0, 1);
        let ids = [a.local_id, b.local_id];
        let set = ElementSet::from_elements([a, b]);
        let order: Vec<_> = set.iter().map(|e| e.local_id).collect();
        assert_eq!(order, ids);
    }
}
