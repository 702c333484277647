//! Tool selection and shape drawing.

use crate::elements::{Circle, Diamond, ElementKind, ElementType, Rectangle, Segment};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Select,
    /// Pan the viewport ("hand").
    #[serde(rename = "hand")]
    Pan,
    Rectangle,
    Circle,
    Diamond,
    Line,
    Arrow,
    Text,
    Eraser,
    /// Pointer-down records where the next uploaded image is placed.
    Image,
    /// Suppresses all pointer-driven mutation.
    #[serde(rename = "lock")]
    Locked,
}

impl ToolKind {
    /// Parse a tool button name.
    pub fn from_name(name: &str) -> Option<Self> {
        let tool = match name {
            "select" => ToolKind::Select,
            "hand" | "pan" => ToolKind::Pan,
            "rectangle" => ToolKind::Rectangle,
            "circle" => ToolKind::Circle,
            "diamond" => ToolKind::Diamond,
            "line" => ToolKind::Line,
            "arrow" => ToolKind::Arrow,
            "text" => ToolKind::Text,
            "eraser" => ToolKind::Eraser,
            "image" => ToolKind::Image,
            "lock" | "locked" => ToolKind::Locked,
            _ => return None,
        };
        Some(tool)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Select => "select",
            ToolKind::Pan => "hand",
            ToolKind::Rectangle => "rectangle",
            ToolKind::Circle => "circle",
            ToolKind::Diamond => "diamond",
            ToolKind::Line => "line",
            ToolKind::Arrow => "arrow",
            ToolKind::Text => "text",
            ToolKind::Eraser => "eraser",
            ToolKind::Image => "image",
            ToolKind::Locked => "lock",
        }
    }

    /// Element type drawn by a draw-shape tool.
    pub fn shape_type(&self) -> Option<ElementType> {
        match self {
            ToolKind::Rectangle => Some(ElementType::Rectangle),
            ToolKind::Circle => Some(ElementType::Circle),
            ToolKind::Diamond => Some(ElementType::Diamond),
            ToolKind::Line => Some(ElementType::Line),
            ToolKind::Arrow => Some(ElementType::Arrow),
            _ => None,
        }
    }
}

/// Compute the geometry drawn between two world points.
pub fn build_shape(element_type: ElementType, start: Point, end: Point) -> Option<ElementKind> {
    let kind = match element_type {
        ElementType::Rectangle => ElementKind::Rectangle(Rectangle::from_corners(start, end)),
        ElementType::Circle => ElementKind::Circle(Circle::from_drag(start, end)),
        ElementType::Diamond => ElementKind::Diamond(Diamond::from_corners(start, end)),
        ElementType::Line => ElementKind::Line(Segment::new(start, end)),
        ElementType::Arrow => ElementKind::Arrow(Segment::new(start, end)),
        ElementType::Text | ElementType::Image => return None,
    };
    Some(kind)
}

/// State of a draw-shape interaction.
#[derive(Debug, Clone, Default)]
pub enum ToolState {
    #[default]
    Idle,
    Active {
        element_type: ElementType,
        start: Point,
        current: Point,
        /// Whether the pointer moved since `begin`.
        moved: bool,
    },
}

/// Manages the current tool and its drawing state.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    pub current_tool: ToolKind,
    pub state: ToolState,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the current tool, abandoning any drawing in progress.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.current_tool = tool;
        self.state = ToolState::Idle;
    }

    /// Begin drawing at a world point. Does nothing for non-shape tools.
    pub fn begin(&mut self, point: Point) {
        if let Some(element_type) = self.current_tool.shape_type() {
            self.state = ToolState::Active {
                element_type,
                start: point,
                current: point,
                moved: false,
            };
        }
    }

    /// Update the current interaction.
    pub fn update(&mut self, point: Point) {
        if let ToolState::Active { current, moved, .. } = &mut self.state {
            *current = point;
            *moved = true;
        }
    }

    /// End the interaction and return the drawn geometry.
    ///
    /// A press without any movement draws nothing.
    pub fn end(&mut self, point: Point) -> Option<ElementKind> {
        match std::mem::take(&mut self.state) {
            ToolState::Active {
                element_type,
                start,
                moved: true,
                ..
            } => build_shape(element_type, start, point),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.state = ToolState::Idle;
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ToolState::Active { .. })
    }

    /// Live preview from the start and current points.
    pub fn preview_shape(&self) -> Option<ElementKind> {
        match &self.state {
            ToolState::Active {
                element_type,
                start,
                current,
                moved: true,
            } => build_shape(*element_type, *start, *current),
            _ => None,
        }
    }
}
