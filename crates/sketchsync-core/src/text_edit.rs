//! Inline text editing overlay.

use crate::elements::LocalId;
use crate::schedule::{Instant, ScheduledTask};
use crate::viewport::Viewport;
use kurbo::Point;
use std::time::Duration;

/// Delay between losing focus and committing, so a click that caused the
/// blur lands first.
pub const TEXT_COMMIT_GRACE: Duration = Duration::from_millis(200);

/// What a finished edit does to the element set.
#[derive(Debug, Clone, PartialEq)]
pub enum TextCommit {
    /// New text at a world point.
    Create { anchor: Point, content: String },
    /// Replace the content of an existing text element.
    Update { local_id: LocalId, content: String },
    /// Existing element was emptied.
    Delete { local_id: LocalId },
    /// Empty new text.
    Nothing,
}

/// An open text input over the canvas.
#[derive(Debug, Clone)]
pub struct TextEditSession {
    editing: Option<LocalId>,
    /// World point the input was opened at.
    anchor: Point,
    buffer: String,
    blur_commit: ScheduledTask<()>,
}

impl TextEditSession {
    /// Open a blank input for new text.
    pub fn create(anchor: Point) -> Self {
        Self {
            editing: None,
            anchor,
            buffer: String::new(),
            blur_commit: ScheduledTask::new(),
        }
    }

    /// Open an input pre-filled with an existing element's text.
    pub fn edit(local_id: LocalId, anchor: Point, content: impl Into<String>) -> Self {
        Self {
            editing: Some(local_id),
            anchor,
            buffer: content.into(),
            blur_commit: ScheduledTask::new(),
        }
    }

    pub fn editing(&self) -> Option<LocalId> {
        self.editing
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
    }

    /// Where to place the input on the page.
    pub fn screen_position(&self, viewport: &Viewport) -> Point {
        viewport.world_to_screen(self.anchor)
    }

    /// The input lost focus; commit after the grace period.
    pub fn blur(&mut self, now: Instant, grace: Duration) {
        self.blur_commit.schedule(now + grace, ());
    }

    /// The input regained focus before the grace period ran out.
    pub fn refocus(&mut self) {
        self.blur_commit.cancel();
    }

    /// Whether a blur commit is due.
    pub fn commit_due(&mut self, now: Instant) -> bool {
        self.blur_commit.take_due(now).is_some()
    }

    /// Resolve the edit.
    pub fn commit(self) -> TextCommit {
        let content = self.buffer.trim();
        match (self.editing, content.is_empty()) {
            (Some(local_id), true) => TextCommit::Delete { local_id },
            (Some(local_id), false) => TextCommit::Update {
                local_id,
                content: content.to_string(),
            },
            (None, true) => TextCommit::Nothing,
            (None, false) => TextCommit::Create {
                anchor: self.anchor,
                content: content.to_string(),
            },
        }
    }
}
