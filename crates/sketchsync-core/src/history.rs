//! Snapshot-based undo/redo.

use crate::document::ElementSet;
use crate::elements::{ElementId, LocalId};
use std::collections::VecDeque;

/// Default number of snapshots to keep.
pub const MAX_HISTORY: usize = 50;

/// Linear snapshot stack with a cursor.
///
/// The snapshot at the cursor always equals the live element set after a
/// commit, undo or redo.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: VecDeque<ElementSet>,
    cursor: usize,
    max_len: usize,
}

impl History {
    /// Start a history whose first snapshot is `initial`.
    pub fn new(initial: &ElementSet, max_len: usize) -> Self {
        let mut snapshots = VecDeque::new();
        snapshots.push_back(initial.clone());
        Self {
            snapshots,
            cursor: 0,
            max_len: max_len.max(1),
        }
    }

    /// Record the current state, discarding any redo branch.
    pub fn commit(&mut self, current: &ElementSet) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push_back(current.clone());
        while self.snapshots.len() > self.max_len {
            self.snapshots.pop_front();
        }
        self.cursor = self.snapshots.len() - 1;
    }

    /// Step back. Returns a copy of the restored snapshot.
    pub fn undo(&mut self) -> Option<ElementSet> {
        if self.cursor == 0 {
            log::debug!("Nothing to undo");
            return None;
        }
        self.cursor -= 1;
        self.snapshots.get(self.cursor).cloned()
    }

    /// Step forward. Returns a copy of the restored snapshot.
    pub fn redo(&mut self) -> Option<ElementSet> {
        if self.cursor + 1 >= self.snapshots.len() {
            log::debug!("Nothing to redo");
            return None;
        }
        self.cursor += 1;
        self.snapshots.get(self.cursor).cloned()
    }

    /// Record a backend id in every snapshot holding the element.
    pub fn assign_id(&mut self, local_id: LocalId, id: ElementId) {
        for snapshot in &mut self.snapshots {
            if let Some(element) = snapshot.get_mut(local_id) {
                element.id = Some(id);
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }
}
