//! Scripted editing session against in-memory collaborators.

use kurbo::Point;
use serde::Deserialize;
use sketchsync_core::driver::{self, flush_persistence, pump_realtime};
use sketchsync_core::elements::{Diamond, Element, ElementId, ElementKind};
use sketchsync_core::input::{KeyEvent, Modifiers, PointerEvent};
use sketchsync_core::persistence::MemoryPersistence;
use sketchsync_core::presence::{ActiveUser, UserId};
use sketchsync_core::schedule::Instant;
use sketchsync_core::{
    DrawingSurface, LoopbackChannel, ServerMessage, SurfaceConfig, SurfaceError, ToolKind,
};
use sketchsync_render::{RenderError, SvgScene};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to open canvas: {0}")]
    Surface(#[from] SurfaceError),
    #[error("Failed to render: {0}")]
    Render(#[from] RenderError),
    #[error("Invalid session file: {0}")]
    Session(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One scripted input.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptStep {
    Tool { name: String },
    Pointer(PointerEvent),
    Key(KeyEvent),
    /// Replace the text input's value.
    Type { text: String },
    Blur,
    /// Advance the clock and fire due timers.
    Wait { ms: u64 },
    Undo,
    Redo,
    ZoomIn,
    ZoomOut,
    ToggleLock,
    UploadImage { bytes: Vec<u8> },
    /// Deliver a message as if from another client.
    Remote(ServerMessage),
}

/// Session description: the canvas to open and the inputs to replay.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub surface: SurfaceConfig,
    pub script: Vec<ScriptStep>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            surface: SurfaceConfig {
                name: "Demo".to_string(),
                current_user: ActiveUser {
                    id: UserId(1),
                    name: "demo".to_string(),
                    profile_picture: None,
                },
                ..Default::default()
            },
            script: demo_script(),
        }
    }
}

/// A surface rendered to SVG, persisting to memory and talking to a
/// loopback channel.
pub struct App {
    surface: DrawingSurface<SvgScene>,
    backend: MemoryPersistence,
    channel: LoopbackChannel,
    clock: Instant,
}

impl App {
    pub fn new(config: SurfaceConfig) -> Result<Self, AppError> {
        let surface = DrawingSurface::new(config, SvgScene::new())?;
        let mut channel = LoopbackChannel::new();
        if let Err(e) = driver::connect(&surface, &mut channel) {
            log::error!("Failed to join canvas: {}", e);
        }
        Ok(Self {
            surface,
            backend: MemoryPersistence::new(),
            channel,
            clock: Instant::now(),
        })
    }

    /// Run a session file (or the built-in demo) and write the SVG to
    /// `args[2]` or stdout.
    pub fn run_cli() -> Result<(), AppError> {
        let mut args = std::env::args().skip(1);
        let config = match args.next() {
            Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
            None => AppConfig::default(),
        };
        let output = args.next().map(PathBuf::from);

        let mut app = App::new(config.surface)?;
        app.run(&config.script);
        let svg = app.to_svg()?;
        match output {
            Some(path) => {
                std::fs::write(&path, svg)?;
                log::info!("Wrote {}", path.display());
            }
            None => println!("{svg}"),
        }
        Ok(())
    }

    pub fn surface(&self) -> &DrawingSurface<SvgScene> {
        &self.surface
    }

    pub fn backend(&self) -> &MemoryPersistence {
        &self.backend
    }

    pub fn channel(&self) -> &LoopbackChannel {
        &self.channel
    }

    pub fn run(&mut self, script: &[ScriptStep]) {
        for step in script {
            self.step(step);
        }
        log::info!(
            "Session finished with {} elements, {} published events",
            self.surface.elements().len(),
            self.channel.published().len()
        );
    }

    pub fn step(&mut self, step: &ScriptStep) {
        let now = self.clock;
        match step {
            ScriptStep::Tool { name } => match ToolKind::from_name(name) {
                Some(tool) => self.surface.set_tool(tool),
                None => log::warn!("Unknown tool {}", name),
            },
            ScriptStep::Pointer(event) => self.surface.handle_pointer(*event, now),
            ScriptStep::Key(event) => {
                self.surface.handle_key(event);
            }
            ScriptStep::Type { text } => self.surface.text_input(text),
            ScriptStep::Blur => self.surface.text_blur(now),
            ScriptStep::Wait { ms } => {
                self.clock += Duration::from_millis(*ms);
                self.surface.tick(self.clock);
            }
            ScriptStep::Undo => {
                self.surface.undo();
            }
            ScriptStep::Redo => {
                self.surface.redo();
            }
            ScriptStep::ZoomIn => self.surface.zoom_in(),
            ScriptStep::ZoomOut => self.surface.zoom_out(),
            ScriptStep::ToggleLock => self.surface.toggle_lock(),
            ScriptStep::UploadImage { bytes } => self.surface.begin_image_upload(bytes.clone()),
            ScriptStep::Remote(message) => self.channel.deliver(message.clone()),
        }
        self.sync();
    }

    /// Run queued backend calls and exchange realtime events.
    pub fn sync(&mut self) {
        pollster::block_on(flush_persistence(&mut self.surface, &self.backend));
        pump_realtime(&mut self.surface, &mut self.channel);
    }

    pub fn to_svg(&self) -> Result<String, AppError> {
        Ok(self.surface.target().to_svg()?)
    }
}

fn pointer(kind: fn(Point) -> PointerEvent, x: f64, y: f64) -> ScriptStep {
    ScriptStep::Pointer(kind(Point::new(x, y)))
}

fn down(position: Point) -> PointerEvent {
    PointerEvent::Down { position }
}

fn drag_to(position: Point) -> PointerEvent {
    PointerEvent::Move { position }
}

fn up(position: Point) -> PointerEvent {
    PointerEvent::Up { position }
}

fn tool(name: &str) -> ScriptStep {
    ScriptStep::Tool {
        name: name.to_string(),
    }
}

/// Built-in session: a few shapes, a label, a move, and a remote edit.
fn demo_script() -> Vec<ScriptStep> {
    let guest = ActiveUser {
        id: UserId(2),
        name: "guest".to_string(),
        profile_picture: None,
    };
    let remote_diamond = Element::persisted(
        ElementId(1000),
        ElementKind::Diamond(Diamond::from_corners(
            Point::new(400.0, 100.0),
            Point::new(480.0, 160.0),
        )),
        100,
    )
    .to_wire();

    vec![
        tool("rectangle"),
        pointer(down, 100.0, 100.0),
        pointer(drag_to, 200.0, 150.0),
        pointer(up, 260.0, 180.0),
        tool("circle"),
        pointer(down, 350.0, 300.0),
        pointer(up, 350.0, 300.0),
        pointer(down, 350.0, 300.0),
        pointer(drag_to, 380.0, 340.0),
        pointer(up, 380.0, 340.0),
        tool("arrow"),
        pointer(down, 260.0, 140.0),
        pointer(drag_to, 330.0, 290.0),
        pointer(up, 330.0, 290.0),
        tool("text"),
        pointer(down, 110.0, 130.0),
        ScriptStep::Type {
            text: "Start <here>".to_string(),
        },
        ScriptStep::Key(KeyEvent::Pressed {
            key: "Enter".to_string(),
            modifiers: Modifiers::default(),
        }),
        tool("select"),
        pointer(down, 250.0, 170.0),
        pointer(drag_to, 270.0, 175.0),
        ScriptStep::Wait { ms: 200 },
        pointer(drag_to, 280.0, 180.0),
        pointer(up, 280.0, 180.0),
        ScriptStep::Undo,
        ScriptStep::Redo,
        ScriptStep::Remote(ServerMessage::UserJoined {
            user: guest.clone(),
        }),
        ScriptStep::Remote(ServerMessage::ElementAdded {
            element: remote_diamond,
            user_id: guest.id,
        }),
        ScriptStep::ZoomOut,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use sketchsync_core::{CanvasId, ClientMessage};

    #[test]
    fn test_demo_session() {
        let config = AppConfig::default();
        let mut app = App::new(config.surface).unwrap();
        app.run(&config.script);

        // Rectangle, circle, arrow, text and the remote diamond.
        assert_eq!(app.surface().elements().len(), 5);
        assert_eq!(app.backend().elements(CanvasId::default()).len(), 4);
        assert_eq!(app.surface().presence().len(), 1);
        assert_eq!(app.surface().zoom_label(), "80%");

        let published = app.channel().published();
        assert!(matches!(published[0], ClientMessage::JoinCanvas { .. }));
        let added = published
            .iter()
            .filter(|m| matches!(m, ClientMessage::ElementAdded { .. }))
            .count();
        assert_eq!(added, 4);
        assert!(published
            .iter()
            .any(|m| matches!(m, ClientMessage::ElementUpdated { .. })));

        let svg = app.to_svg().unwrap();
        assert!(svg.contains("<rect"));
        assert!(svg.contains("<circle"));
        assert!(svg.contains("<polygon points=\"440,100"));
        assert!(svg.contains("Start &lt;here&gt;"));
        assert!(svg.contains("url(#arrowhead)"));
    }

    #[test]
    fn test_session_file() {
        let json = r#"{
            "surface": {"id": 4, "currentUser": {"id": 9, "name": "cli"}},
            "script": [
                {"action": "tool", "name": "line"},
                {"action": "pointer", "type": "down", "position": {"x": 0, "y": 0}},
                {"action": "pointer", "type": "move", "position": {"x": 30, "y": 40}},
                {"action": "pointer", "type": "up", "position": {"x": 30, "y": 40}},
                {"action": "key", "type": "pressed", "key": "z", "modifiers": {"ctrl": true}},
                {"action": "key", "type": "pressed", "key": "y", "modifiers": {"ctrl": true}},
                {"action": "wait", "ms": 10}
            ]
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        let mut app = App::new(config.surface).unwrap();
        app.run(&config.script);
        assert_eq!(app.surface().elements().len(), 1);
        assert_eq!(app.backend().elements(CanvasId(4)).len(), 1);
        assert!(app.surface().can_undo());
    }

    #[test]
    fn test_unknown_tool_is_ignored() {
        let mut app = App::new(SurfaceConfig::default()).unwrap();
        app.step(&tool("lasso"));
        assert_eq!(app.surface().tool(), ToolKind::Select);
    }
}
