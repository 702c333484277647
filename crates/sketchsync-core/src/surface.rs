//! The drawing surface: canvas state plus input handlers.
//!
//! All handlers run to completion synchronously. Network work is queued
//! as `PersistRequest`s and `ClientMessage`s for the host to perform, and
//! completions are fed back through the `on_*` methods.

use crate::config::{SurfaceConfig, SurfaceError};
use crate::document::{CanvasId, ElementSet};
use crate::drag::DragSession;
use crate::elements::{
    Element, ElementId, ElementKind, Image, LocalId, Text, WireElement,
};
use crate::history::History;
use crate::input::{is_space, KeyEvent, PointerEvent, Shortcut};
use crate::persistence::{PersistRequest, PersistResult, UploadedImage};
use crate::presence::{ActiveUser, Presence};
use crate::render::{NodeDescription, NodeKey, RenderTarget};
use crate::schedule::Instant;
use crate::sync::{ClientMessage, ServerMessage};
use crate::text_edit::{TextCommit, TextEditSession};
use crate::tools::{ToolKind, ToolManager};
use crate::viewport::Viewport;
use kurbo::{Point, Size};
use std::collections::HashSet;

/// Pointer gesture in progress, other than shape drawing.
#[derive(Debug, Default)]
enum Gesture {
    #[default]
    Idle,
    Panning {
        last: Point,
    },
    Dragging(DragSession),
}

/// Owns one canvas's elements, selection, tool, viewport and history.
pub struct DrawingSurface<R: RenderTarget> {
    config: SurfaceConfig,
    elements: ElementSet,
    selected: Option<LocalId>,
    tools: ToolManager,
    locked: bool,
    space_held: bool,
    viewport: Viewport,
    history: History,
    gesture: Gesture,
    text_edit: Option<TextEditSession>,
    presence: Presence,
    target: R,
    /// Element nodes currently in the render target.
    rendered: HashSet<LocalId>,
    persist_queue: Vec<PersistRequest>,
    outgoing: Vec<ClientMessage>,
    /// Updated while their create was in flight.
    awaiting_id: HashSet<LocalId>,
    /// Deleted while their create was in flight.
    deleted_before_id: HashSet<LocalId>,
    /// Elements whose create is queued or in flight.
    creating: HashSet<LocalId>,
    /// World point of the last pointer-down, where uploaded images land.
    last_down: Point,
}

impl<R: RenderTarget> DrawingSurface<R> {
    /// Open a canvas and render its initial elements.
    pub fn new(mut config: SurfaceConfig, target: R) -> Result<Self, SurfaceError> {
        if let Err(e) = config.validate() {
            log::error!("Cannot open canvas {}: {}", config.id, e);
            return Err(e);
        }
        if !target.is_attached() {
            log::error!("Cannot open canvas {}: render target missing", config.id);
            return Err(SurfaceError::MissingRenderTarget);
        }

        let wire = std::mem::take(&mut config.elements);
        let elements = ElementSet::from_elements(wire.iter().filter_map(|w| {
            Element::from_wire(w)
                .inspect_err(|e| log::warn!("Skipping stored element {:?}: {}", w.id, e))
                .ok()
        }));
        let history = History::new(&elements, config.max_history);
        let viewport = Viewport::new(config.container_origin, config.container_size)
            .with_zoom_bounds(config.min_zoom, config.max_zoom);
        let presence = Presence::new(config.current_user.id);

        let mut surface = Self {
            config,
            elements,
            selected: None,
            tools: ToolManager::new(),
            locked: false,
            space_held: false,
            viewport,
            history,
            gesture: Gesture::Idle,
            text_edit: None,
            presence,
            target,
            rendered: HashSet::new(),
            persist_queue: Vec::new(),
            outgoing: Vec::new(),
            awaiting_id: HashSet::new(),
            deleted_before_id: HashSet::new(),
            creating: HashSet::new(),
            last_down: Point::ZERO,
        };
        surface.sync_viewport();
        surface.rerender_all();
        log::info!(
            "Opened canvas {} ({}) with {} elements",
            surface.config.id,
            surface.config.name,
            surface.elements.len()
        );
        Ok(surface)
    }

    // --- Accessors ---

    pub fn canvas_id(&self) -> CanvasId {
        self.config.id
    }

    pub fn current_user(&self) -> &ActiveUser {
        &self.config.current_user
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn elements(&self) -> &ElementSet {
        &self.elements
    }

    pub fn selected(&self) -> Option<LocalId> {
        self.selected
    }

    pub fn tool(&self) -> ToolKind {
        self.tools.current_tool
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn zoom_label(&self) -> String {
        self.viewport.zoom_label()
    }

    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    pub fn text_edit(&self) -> Option<&TextEditSession> {
        self.text_edit.as_ref()
    }

    pub fn target(&self) -> &R {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut R {
        &mut self.target
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Topmost element under a world point.
    pub fn element_at(&self, world: Point) -> Option<&Element> {
        self.elements.element_at(world, self.config.line_hit_tolerance)
    }

    /// Where the inline text input should be placed on the page.
    pub fn text_edit_position(&self) -> Option<Point> {
        self.text_edit
            .as_ref()
            .map(|session| session.screen_position(&self.viewport))
    }

    // --- Tools ---

    /// Activate a tool. Ignored while locked, except for the lock tool.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if tool == ToolKind::Locked {
            self.toggle_lock();
            return;
        }
        if self.locked {
            log::debug!("Canvas locked, ignoring tool {}", tool.name());
            return;
        }
        self.cancel_drawing();
        self.gesture = Gesture::Idle;
        self.tools.set_tool(tool);
    }

    /// Lock or unlock the canvas. Unlocking returns to the select tool.
    pub fn toggle_lock(&mut self) {
        self.locked = !self.locked;
        self.cancel_drawing();
        self.gesture = Gesture::Idle;
        self.tools.set_tool(if self.locked {
            ToolKind::Locked
        } else {
            ToolKind::Select
        });
    }

    // --- Viewport ---

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
        self.sync_viewport();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
        self.sync_viewport();
    }

    /// The drawing container moved or resized.
    pub fn set_container(&mut self, origin: Point, size: Size) {
        self.viewport.container_origin = origin;
        self.viewport.container_size = size;
        self.sync_viewport();
    }

    fn sync_viewport(&mut self) {
        self.target.set_viewport_region(self.viewport.region());
    }

    // --- Pointer input ---

    pub fn handle_pointer(&mut self, event: PointerEvent, now: Instant) {
        match event {
            PointerEvent::Down { position } => self.pointer_down(position, now),
            PointerEvent::Move { position } => self.pointer_move(position, now),
            PointerEvent::Up { position } => self.pointer_up(position),
            PointerEvent::Wheel { position, delta_y } => self.wheel(position, delta_y),
        }
    }

    pub fn pointer_down(&mut self, screen: Point, _now: Instant) {
        if self.locked {
            return;
        }
        if self.text_edit.is_some() {
            self.commit_text();
        }

        let world = self.viewport.screen_to_world(screen);
        self.last_down = world;
        let tool = self.tools.current_tool;

        if tool == ToolKind::Pan || (self.space_held && tool != ToolKind::Text) {
            self.gesture = Gesture::Panning { last: screen };
            return;
        }

        let hit = self.element_at(world).map(|e| e.local_id);
        match tool {
            ToolKind::Select => {
                self.select(hit);
                if let Some(local_id) = hit {
                    self.gesture = Gesture::Dragging(DragSession::new(
                        local_id,
                        world,
                        self.config.move_noise_threshold,
                        self.config.persist_debounce(),
                    ));
                }
            }
            ToolKind::Text => {
                let existing = hit
                    .and_then(|id| self.elements.get(id))
                    .and_then(|e| e.kind.as_text().map(|t| (e.local_id, t.content.clone())));
                self.text_edit = Some(match existing {
                    Some((local_id, content)) => TextEditSession::edit(local_id, world, content),
                    None => TextEditSession::create(world),
                });
            }
            ToolKind::Eraser => {
                if let Some(local_id) = hit {
                    self.delete_element(local_id);
                }
            }
            ToolKind::Rectangle
            | ToolKind::Circle
            | ToolKind::Diamond
            | ToolKind::Line
            | ToolKind::Arrow => self.tools.begin(world),
            ToolKind::Image | ToolKind::Pan | ToolKind::Locked => {}
        }
    }

    pub fn pointer_move(&mut self, screen: Point, now: Instant) {
        if self.locked {
            return;
        }
        let world = self.viewport.screen_to_world(screen);

        match &mut self.gesture {
            Gesture::Panning { last } => {
                let delta = screen - *last;
                *last = screen;
                self.viewport.pan(delta);
                self.sync_viewport();
            }
            Gesture::Dragging(session) => {
                let local_id = session.local_id();
                let moved = self
                    .elements
                    .get_mut(local_id)
                    .map(|element| session.drag_to(&mut element.kind, world, now));
                match moved {
                    Some(true) => self.render_element(local_id),
                    Some(false) => {}
                    None => {
                        log::debug!("Dragged element {} disappeared", local_id);
                        self.gesture = Gesture::Idle;
                    }
                }
            }
            Gesture::Idle => {
                if self.tools.is_active() {
                    self.tools.update(world);
                    if let Some(kind) = self.tools.preview_shape() {
                        self.target
                            .upsert_node(NodeKey::Preview, &NodeDescription::preview(&kind));
                    }
                }
            }
        }
    }

    pub fn pointer_up(&mut self, screen: Point) {
        if self.locked {
            return;
        }
        let world = self.viewport.screen_to_world(screen);

        match std::mem::take(&mut self.gesture) {
            Gesture::Panning { .. } => {}
            Gesture::Dragging(session) => {
                if let Some(local_id) = session.finish() {
                    self.persist_element(local_id);
                    self.commit_history();
                }
            }
            Gesture::Idle => {
                if self.tools.is_active() {
                    let shape = self.tools.end(world);
                    self.target.remove_node(NodeKey::Preview);
                    if let Some(kind) = shape {
                        self.create_element(kind);
                    }
                }
            }
        }
    }

    /// Zoom at the cursor.
    pub fn wheel(&mut self, screen: Point, delta_y: f64) {
        self.viewport.wheel(screen, delta_y);
        self.sync_viewport();
    }

    fn cancel_drawing(&mut self) {
        if self.tools.is_active() {
            self.tools.cancel();
            self.target.remove_node(NodeKey::Preview);
        }
    }

    // --- Keyboard ---

    /// Handle a key event. Returns true if the host should suppress the
    /// browser default.
    pub fn handle_key(&mut self, event: &KeyEvent) -> bool {
        let (key, modifiers) = match event {
            KeyEvent::Released { key } => {
                if is_space(key) {
                    self.space_held = false;
                }
                return false;
            }
            KeyEvent::Pressed { key, modifiers } => (key, *modifiers),
        };
        let editing = self.text_edit.is_some();
        match Shortcut::from_key(key, modifiers) {
            Some(Shortcut::Undo) if !editing => {
                self.undo();
                true
            }
            Some(Shortcut::Redo) if !editing => {
                self.redo();
                true
            }
            Some(Shortcut::PanHold) if !editing => {
                self.space_held = true;
                true
            }
            Some(Shortcut::CommitText) if editing => {
                self.commit_text();
                true
            }
            Some(Shortcut::CancelText) if editing => {
                self.cancel_text();
                true
            }
            _ => false,
        }
    }

    // --- Selection and rendering ---

    fn select(&mut self, local_id: Option<LocalId>) {
        let previous = std::mem::replace(&mut self.selected, local_id);
        if previous == local_id {
            return;
        }
        for id in [previous, local_id].into_iter().flatten() {
            self.render_element(id);
        }
    }

    fn render_element(&mut self, local_id: LocalId) {
        if let Some(element) = self.elements.get(local_id) {
            let node = NodeDescription::element(element, self.selected == Some(local_id));
            self.target.upsert_node(NodeKey::Element(local_id), &node);
            self.rendered.insert(local_id);
        }
    }

    fn unrender_element(&mut self, local_id: LocalId) {
        if self.rendered.remove(&local_id) {
            self.target.remove_node(NodeKey::Element(local_id));
        }
    }

    fn rerender_all(&mut self) {
        for local_id in std::mem::take(&mut self.rendered) {
            self.target.remove_node(NodeKey::Element(local_id));
        }
        let ids: Vec<LocalId> = self.elements.iter().map(|e| e.local_id).collect();
        for local_id in ids {
            self.render_element(local_id);
        }
    }

    // --- Mutations ---

    fn commit_history(&mut self) {
        self.history.commit(&self.elements);
    }

    fn create_element(&mut self, kind: ElementKind) -> LocalId {
        let element = Element::new(kind, self.elements.next_z_index());
        let local_id = element.local_id;
        self.queue_create(&element);
        self.elements.push(element);
        self.render_element(local_id);
        self.commit_history();
        local_id
    }

    fn queue_create(&mut self, element: &Element) {
        self.creating.insert(element.local_id);
        self.persist_queue.push(PersistRequest::Create {
            local_id: element.local_id,
            element_type: element.element_type(),
            properties: element.kind.to_properties(),
            z_index: element.z_index,
        });
    }

    /// Queue an update, or defer it until the element has an id.
    fn persist_element(&mut self, local_id: LocalId) {
        let Some(element) = self.elements.get(local_id) else {
            return;
        };
        let Some(id) = element.id else {
            self.awaiting_id.insert(local_id);
            return;
        };
        let request = PersistRequest::Update {
            local_id,
            id,
            properties: element.kind.to_properties(),
            z_index: element.z_index,
        };
        self.persist_queue.retain(|r| {
            !matches!(r, PersistRequest::Update { local_id: queued, .. } if *queued == local_id)
        });
        self.persist_queue.push(request);
    }

    /// Remove an element and queue its deletion.
    fn delete_element(&mut self, local_id: LocalId) -> bool {
        let Some(element) = self.elements.remove(local_id) else {
            return false;
        };
        self.unrender_element(local_id);
        self.forget_local(local_id);

        let queued_create = self.persist_queue.iter().position(
            |r| matches!(r, PersistRequest::Create { local_id: queued, .. } if *queued == local_id),
        );
        self.persist_queue.retain(|r| {
            !matches!(r, PersistRequest::Update { local_id: queued, .. } if *queued == local_id)
        });
        match (element.id, queued_create) {
            (Some(id), _) => self.persist_queue.push(PersistRequest::Delete { id }),
            (None, Some(index)) => {
                self.persist_queue.remove(index);
                self.creating.remove(&local_id);
            }
            (None, None) => {
                self.deleted_before_id.insert(local_id);
            }
        }
        self.awaiting_id.remove(&local_id);
        self.commit_history();
        true
    }

    /// Drop selection and gesture state that refers to a removed element.
    fn forget_local(&mut self, local_id: LocalId) {
        if self.selected == Some(local_id) {
            self.selected = None;
        }
        if matches!(&self.gesture, Gesture::Dragging(s) if s.local_id() == local_id) {
            self.gesture = Gesture::Idle;
        }
    }

    // --- History ---

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(set) => {
                self.restore(set);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(set) => {
                self.restore(set);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, set: ElementSet) {
        self.cancel_drawing();
        self.gesture = Gesture::Idle;
        self.elements = set;
        if self.selected.is_some_and(|id| !self.elements.contains(id)) {
            self.selected = None;
        }
        self.deleted_before_id
            .retain(|local_id| !self.elements.contains(*local_id));

        // Elements brought back before they were ever saved need a create again.
        let unsaved: Vec<Element> = self
            .elements
            .iter()
            .filter(|e| e.id.is_none() && !self.creating.contains(&e.local_id))
            .cloned()
            .collect();
        for element in &unsaved {
            self.queue_create(element);
        }
        self.rerender_all();
    }

    // --- Text editing ---

    /// The text input's value changed.
    pub fn text_input(&mut self, text: &str) {
        if let Some(session) = &mut self.text_edit {
            session.set_text(text);
        }
    }

    /// The text input lost focus.
    pub fn text_blur(&mut self, now: Instant) {
        let grace = self.config.text_commit_grace();
        if let Some(session) = &mut self.text_edit {
            session.blur(now, grace);
        }
    }

    /// The text input regained focus.
    pub fn text_focus(&mut self) {
        if let Some(session) = &mut self.text_edit {
            session.refocus();
        }
    }

    /// Close the text input and apply its content.
    pub fn commit_text(&mut self) {
        let Some(session) = self.text_edit.take() else {
            return;
        };
        match session.commit() {
            TextCommit::Create { anchor, content } => {
                let text = Text::new(anchor, content).with_font_size(self.config.default_font_size);
                self.create_element(ElementKind::Text(text));
            }
            TextCommit::Update { local_id, content } => {
                let changed = match self.elements.get_mut(local_id).and_then(|e| e.kind.as_text_mut()) {
                    Some(text) if text.content != content => {
                        text.content = content;
                        true
                    }
                    _ => false,
                };
                if changed {
                    self.render_element(local_id);
                    self.persist_element(local_id);
                    self.commit_history();
                }
            }
            TextCommit::Delete { local_id } => {
                self.delete_element(local_id);
            }
            TextCommit::Nothing => {}
        }
    }

    /// Close the text input, discarding edits.
    pub fn cancel_text(&mut self) {
        self.text_edit = None;
    }

    // --- Timers ---

    /// Fire due timers: debounced drag persistence and blur commits.
    pub fn tick(&mut self, now: Instant) {
        let due = match &mut self.gesture {
            Gesture::Dragging(session) => session.poll_persist(now),
            _ => None,
        };
        if let Some(local_id) = due {
            self.persist_element(local_id);
        }
        if self.text_edit.as_mut().is_some_and(|s| s.commit_due(now)) {
            self.commit_text();
        }
    }

    // --- Images ---

    /// Queue an upload; the image is placed at the last pointer-down point.
    pub fn begin_image_upload(&mut self, bytes: Vec<u8>) {
        if self.locked {
            log::debug!("Canvas locked, ignoring image upload");
            return;
        }
        self.persist_queue.push(PersistRequest::UploadImage {
            bytes,
            at: self.last_down,
        });
    }

    pub fn on_image_uploaded(&mut self, at: Point, result: PersistResult<UploadedImage>) {
        match result {
            Ok(uploaded) => {
                let size = self.config.default_image_size;
                let image = Image::new(
                    at,
                    uploaded.width.unwrap_or(size),
                    uploaded.height.unwrap_or(size),
                    uploaded.url,
                );
                self.create_element(ElementKind::Image(image));
            }
            Err(e) => log::error!("Error uploading image: {}", e),
        }
    }

    // --- Persistence ---

    /// Drain queued backend calls.
    pub fn take_persist_requests(&mut self) -> Vec<PersistRequest> {
        std::mem::take(&mut self.persist_queue)
    }

    pub fn has_pending_requests(&self) -> bool {
        !self.persist_queue.is_empty()
    }

    pub fn on_created(&mut self, local_id: LocalId, result: PersistResult<ElementId>) {
        self.creating.remove(&local_id);
        let id = match result {
            Ok(id) => id,
            Err(e) => {
                log::error!("Error saving element: {}", e);
                self.awaiting_id.remove(&local_id);
                self.deleted_before_id.remove(&local_id);
                return;
            }
        };
        self.history.assign_id(local_id, id);

        // Looked up first: an erased element may be back on the canvas by now.
        let Some(element) = self.elements.get_mut(local_id) else {
            self.awaiting_id.remove(&local_id);
            if self.deleted_before_id.remove(&local_id) {
                self.persist_queue.push(PersistRequest::Delete { id });
            } else {
                log::debug!("Created element {} is no longer on the canvas", id);
            }
            return;
        };
        self.deleted_before_id.remove(&local_id);
        element.id = Some(id);
        let wire = element.to_wire();
        self.publish_added(wire);

        if self.awaiting_id.remove(&local_id) {
            self.persist_element(local_id);
        }
    }

    pub fn on_updated(&mut self, local_id: LocalId, result: PersistResult<()>) {
        if let Err(e) = result {
            log::error!("Error updating element: {}", e);
            return;
        }
        if let Some(element) = self.elements.get(local_id) {
            self.outgoing.push(ClientMessage::ElementUpdated {
                canvas_id: self.config.id,
                element: element.to_wire(),
            });
        }
    }

    pub fn on_deleted(&mut self, id: ElementId, result: PersistResult<()>) {
        match result {
            Ok(()) => self.outgoing.push(ClientMessage::ElementDeleted {
                canvas_id: self.config.id,
                element_id: id,
            }),
            Err(e) => log::error!("Error deleting element {}: {}", id, e),
        }
    }

    fn publish_added(&mut self, element: WireElement) {
        self.outgoing.push(ClientMessage::ElementAdded {
            canvas_id: self.config.id,
            element,
        });
    }

    // --- Realtime ---

    /// Drain messages to publish on the realtime channel.
    pub fn take_outgoing(&mut self) -> Vec<ClientMessage> {
        std::mem::take(&mut self.outgoing)
    }

    /// Apply a raw inbound message. Malformed messages are logged and dropped.
    pub fn handle_server_json(&mut self, json: &str) {
        match ServerMessage::from_json(json) {
            Ok(message) => self.handle_server_message(message),
            Err(e) => log::warn!("Ignoring malformed realtime message: {}", e),
        }
    }

    /// Apply an inbound realtime event. Echoes of our own writes are ignored.
    pub fn handle_server_message(&mut self, message: ServerMessage) {
        if message.origin() == Some(self.config.current_user.id) {
            log::debug!("Ignoring echo of local change");
            return;
        }
        match message {
            ServerMessage::UserJoined { user } => {
                self.presence.add(user);
            }
            ServerMessage::UserLeft { user_id } => {
                self.presence.remove(user_id);
            }
            ServerMessage::ActiveUsers { users } => {
                for user in users {
                    self.presence.add(user);
                }
            }
            ServerMessage::ElementAdded { element, .. } => self.apply_remote(element, true),
            ServerMessage::ElementUpdated { element, .. } => self.apply_remote(element, false),
            ServerMessage::ElementDeleted { element_id, .. } => {
                if let Some(local_id) = self.elements.local_id_of(element_id) {
                    self.elements.remove(local_id);
                    self.unrender_element(local_id);
                    self.forget_local(local_id);
                }
            }
        }
    }

    fn apply_remote(&mut self, wire: WireElement, added: bool) {
        let Some(id) = wire.id else {
            log::warn!("Ignoring remote {} without id", wire.element_type);
            return;
        };
        let kind = match ElementKind::from_properties(wire.element_type, &wire.properties) {
            Ok(kind) => kind,
            Err(e) => {
                log::warn!("Ignoring remote element {}: {}", id, e);
                return;
            }
        };
        match self.elements.local_id_of(id) {
            Some(local_id) => {
                if let Some(element) = self.elements.get_mut(local_id) {
                    element.kind = kind;
                }
                self.elements.set_z_index(local_id, wire.z_index);
                self.render_element(local_id);
            }
            None if added => {
                let local_id = self.elements.push(Element::persisted(id, kind, wire.z_index));
                self.render_element(local_id);
            }
            None => log::debug!("Update for unknown element {}", id),
        }
    }
}
