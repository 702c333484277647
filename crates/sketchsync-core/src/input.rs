//! Pointer and keyboard events delivered by the host.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer event in page-space screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    Down { position: Point },
    Move { position: Point },
    Up { position: Point },
    Wheel { position: Point, delta_y: f64 },
}

impl PointerEvent {
    pub fn position(&self) -> Point {
        match self {
            PointerEvent::Down { position }
            | PointerEvent::Move { position }
            | PointerEvent::Up { position }
            | PointerEvent::Wheel { position, .. } => *position,
        }
    }
}

/// Keyboard event; keys use DOM `KeyboardEvent.key` names (`" "`, `"z"`, `"Enter"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KeyEvent {
    Pressed {
        key: String,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Released {
        key: String,
    },
}

/// Keyboard commands understood by the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Undo,
    Redo,
    /// Space held: temporary pan.
    PanHold,
    CommitText,
    CancelText,
}

impl Shortcut {
    /// Resolve a key press.
    pub fn from_key(key: &str, modifiers: Modifiers) -> Option<Self> {
        if modifiers.command() {
            return match key.to_ascii_lowercase().as_str() {
                "z" if modifiers.shift => Some(Shortcut::Redo),
                "z" => Some(Shortcut::Undo),
                "y" => Some(Shortcut::Redo),
                _ => None,
            };
        }
        match key {
            " " | "Space" => Some(Shortcut::PanHold),
            "Enter" => Some(Shortcut::CommitText),
            "Escape" => Some(Shortcut::CancelText),
            _ => None,
        }
    }
}

pub(crate) fn is_space(key: &str) -> bool {
    matches!(key, " " | "Space")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd() -> Modifiers {
        Modifiers {
            ctrl: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_undo_redo_shortcuts() {
        assert_eq!(Shortcut::from_key("z", cmd()), Some(Shortcut::Undo));
        assert_eq!(
            Shortcut::from_key("Z", Modifiers { shift: true, ..cmd() }),
            Some(Shortcut::Redo)
        );
        assert_eq!(Shortcut::from_key("y", cmd()), Some(Shortcut::Redo));
        let meta = Modifiers {
            meta: true,
            ..Default::default()
        };
        assert_eq!(Shortcut::from_key("z", meta), Some(Shortcut::Undo));
        assert_eq!(Shortcut::from_key("z", Modifiers::default()), None);
    }

    #[test]
    fn test_plain_keys() {
        assert_eq!(Shortcut::from_key(" ", Modifiers::default()), Some(Shortcut::PanHold));
        assert_eq!(Shortcut::from_key("Enter", Modifiers::default()), Some(Shortcut::CommitText));
        assert_eq!(Shortcut::from_key("Escape", Modifiers::default()), Some(Shortcut::CancelText));
        assert_eq!(Shortcut::from_key("a", Modifiers::default()), None);
    }

    #[test]
    fn test_pointer_event_json() {
        let event: PointerEvent =
            serde_json::from_str(r#"{"type":"wheel","position":{"x":1.0,"y":2.0},"delta_y":-3.0}"#)
                .unwrap();
        assert_eq!(event.position(), Point::new(1.0, 2.0));
        assert!(matches!(event, PointerEvent::Wheel { delta_y, .. } if delta_y < 0.0));
    }

    #[test]
    fn test_key_event_json() {
        let event: KeyEvent = serde_json::from_str(r#"{"type":"pressed","key":"z","modifiers":{"ctrl":true}}"#).unwrap();
        assert_eq!(
            event,
            KeyEvent::Pressed {
                key: "z".to_string(),
                modifiers: cmd()
            }
        );
    }
}
