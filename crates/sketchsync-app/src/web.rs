//! WebAssembly entry point and browser bindings.
//!
//! The page owns the network: persistence calls go to a JS object whose
//! `create`, `update`, `delete` and `uploadImage` functions return promises,
//! and realtime events are published through a JS callback and fed back in
//! with `receiveMessage`.

use kurbo::{Point, Rect, Size};
use sketchsync_core::document::CanvasId;
use sketchsync_core::driver;
use sketchsync_core::elements::{ElementId, ElementType, WireProperties};
use sketchsync_core::input::{KeyEvent, Modifiers};
use sketchsync_core::persistence::{
    BoxFuture, PersistError, PersistResult, PersistenceClient, UploadedImage,
};
use sketchsync_core::presence::ActiveUser;
use sketchsync_core::render::{NodeDescription, NodeKey, RenderTarget};
use sketchsync_core::schedule::Instant;
use sketchsync_core::sync::{ChannelError, ClientMessage, RealtimeChannel, ServerMessage};
use sketchsync_core::{DrawingSurface, SurfaceConfig, ToolKind};
use sketchsync_render::markup::{self, ARROWHEAD_ID};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::ops::Bound;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

/// Initialize logging and the panic hook.
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::error_1(&JsValue::from_str(&format!("Failed to initialize logger: {e}")));
    }
    log::info!("SketchSync loaded");
}

/// Render target backed by an `<svg>` element in the page.
///
/// Node groups are kept in stacking order among the svg's children.
struct DomSvgTarget {
    svg: web_sys::Element,
    slots: HashMap<NodeKey, (i64, NodeKey)>,
    order: BTreeSet<(i64, NodeKey)>,
}

impl DomSvgTarget {
    fn find(id: &str) -> Option<Self> {
        let document = web_sys::window()?.document()?;
        let svg = document.get_element_by_id(id)?;
        Some(Self {
            svg,
            slots: HashMap::new(),
            order: BTreeSet::new(),
        })
    }

    fn node(&self, key: NodeKey) -> Option<web_sys::Element> {
        self.svg
            .query_selector(&format!(r#"[data-node="{key}"]"#))
            .ok()
            .flatten()
    }

    /// Add the arrowhead marker unless the page already has one.
    fn ensure_defs(&self) {
        let existing = self
            .svg
            .query_selector(&format!("#{ARROWHEAD_ID}"))
            .ok()
            .flatten();
        if existing.is_some() {
            return;
        }
        let mut defs = String::new();
        let result = markup::write_defs(&mut defs)
            .map_err(|e| JsValue::from_str(&e.to_string()))
            .and_then(|()| self.svg.insert_adjacent_html("afterbegin", &defs));
        if let Err(e) = result {
            log::error!("Failed to add marker definitions: {:?}", e);
        }
    }
}

impl RenderTarget for DomSvgTarget {
    fn upsert_node(&mut self, key: NodeKey, node: &NodeDescription) {
        let html = match markup::node_markup(key, node) {
            Ok(html) => html,
            Err(e) => {
                log::error!("Failed to render node {}: {}", key, e);
                return;
            }
        };
        let slot = node.stacking(key);
        if let Some(previous) = self.slots.insert(key, slot) {
            if previous == slot {
                if let Some(existing) = self.node(key) {
                    existing.set_outer_html(&html);
                    return;
                }
            }
            self.order.remove(&previous);
            if let Some(existing) = self.node(key) {
                existing.remove();
            }
        }
        self.order.insert(slot);

        let above = self
            .order
            .range((Bound::Excluded(slot), Bound::Unbounded))
            .next()
            .and_then(|&(_, sibling)| self.node(sibling));
        let result = match above {
            Some(sibling) => sibling.insert_adjacent_html("beforebegin", &html),
            None => self.svg.insert_adjacent_html("beforeend", &html),
        };
        if let Err(e) = result {
            log::error!("Failed to insert node {}: {:?}", key, e);
        }
    }

    fn remove_node(&mut self, key: NodeKey) {
        if let Some(slot) = self.slots.remove(&key) {
            self.order.remove(&slot);
        }
        if let Some(existing) = self.node(key) {
            existing.remove();
        }
    }

    fn set_viewport_region(&mut self, region: Rect) {
        if let Err(e) = self.svg.set_attribute("viewBox", &markup::view_box(region)) {
            log::error!("Failed to set viewBox: {:?}", e);
        }
    }

    fn is_attached(&self) -> bool {
        self.svg.is_connected()
    }
}

/// Persistence client calling promise-returning functions on a JS object.
struct JsPersistence {
    handlers: JsValue,
}

impl JsPersistence {
    async fn request(&self, name: &str, args: &[JsValue]) -> PersistResult<JsValue> {
        let function = js_sys::Reflect::get(&self.handlers, &JsValue::from_str(name))
            .map_err(js_error)?
            .dyn_into::<js_sys::Function>()
            .map_err(|_| PersistError::Network(format!("no `{name}` handler")))?;
        let args: js_sys::Array = args.iter().collect();
        let promise = function
            .apply(&self.handlers, &args)
            .map_err(js_error)?
            .dyn_into::<js_sys::Promise>()
            .map_err(js_error)?;
        JsFuture::from(promise).await.map_err(js_error)
    }
}

/// Rejections carrying a number are HTTP statuses.
fn js_error(value: JsValue) -> PersistError {
    match value.as_f64() {
        Some(status) => PersistError::Rejected(status as u16),
        None => PersistError::Network(value.as_string().unwrap_or_else(|| format!("{value:?}"))),
    }
}

impl PersistenceClient for JsPersistence {
    fn create(
        &self,
        canvas_id: CanvasId,
        element_type: ElementType,
        properties: &WireProperties,
        z_index: i64,
    ) -> BoxFuture<'_, PersistResult<ElementId>> {
        let body = serde_json::to_string(properties);
        Box::pin(async move {
            let args = [
                JsValue::from_f64(canvas_id.0 as f64),
                JsValue::from_str(element_type.as_str()),
                JsValue::from_str(&body?),
                JsValue::from_f64(z_index as f64),
            ];
            let value = self.request("create", &args).await?;
            value
                .as_f64()
                .map(|id| ElementId(id as i64))
                .ok_or_else(|| PersistError::Serialization("create returned no id".to_string()))
        })
    }

    fn update(
        &self,
        id: ElementId,
        properties: &WireProperties,
        z_index: i64,
    ) -> BoxFuture<'_, PersistResult<()>> {
        let body = serde_json::to_string(properties);
        Box::pin(async move {
            let args = [
                JsValue::from_f64(id.0 as f64),
                JsValue::from_str(&body?),
                JsValue::from_f64(z_index as f64),
            ];
            self.request("update", &args).await.map(|_| ())
        })
    }

    fn delete(&self, id: ElementId) -> BoxFuture<'_, PersistResult<()>> {
        Box::pin(async move {
            self.request("delete", &[JsValue::from_f64(id.0 as f64)])
                .await
                .map(|_| ())
        })
    }

    fn upload_image(
        &self,
        canvas_id: CanvasId,
        bytes: Vec<u8>,
    ) -> BoxFuture<'_, PersistResult<UploadedImage>> {
        Box::pin(async move {
            let args = [
                JsValue::from_f64(canvas_id.0 as f64),
                js_sys::Uint8Array::from(bytes.as_slice()).into(),
            ];
            let value = self.request("uploadImage", &args).await?;
            let json = value.as_string().ok_or_else(|| {
                PersistError::Serialization("uploadImage must resolve to JSON".to_string())
            })?;
            Ok(serde_json::from_str(&json)?)
        })
    }
}

/// Realtime channel publishing through a JS callback.
struct JsChannel {
    publish: js_sys::Function,
    inbox: Vec<ServerMessage>,
}

impl RealtimeChannel for JsChannel {
    fn join(&mut self, canvas_id: CanvasId, user: &ActiveUser) -> Result<(), ChannelError> {
        self.publish(&ClientMessage::JoinCanvas {
            canvas_id,
            user: user.clone(),
        })
    }

    fn publish(&mut self, message: &ClientMessage) -> Result<(), ChannelError> {
        let json = message.to_json()?;
        self.publish
            .call1(&JsValue::NULL, &JsValue::from_str(&json))
            .map(|_| ())
            .map_err(|e| {
                log::warn!("Publish callback failed: {:?}", e);
                ChannelError::Closed
            })
    }

    fn poll(&mut self) -> Vec<ServerMessage> {
        std::mem::take(&mut self.inbox)
    }
}

/// Handles shared with in-flight persistence tasks.
#[derive(Clone)]
struct Shared {
    surface: Rc<RefCell<DrawingSurface<DomSvgTarget>>>,
    backend: Rc<JsPersistence>,
    channel: Rc<RefCell<JsChannel>>,
}

impl Shared {
    /// Exchange realtime events and start queued backend calls.
    fn sync(&self) {
        let requests = {
            let mut surface = self.surface.borrow_mut();
            let mut channel = self.channel.borrow_mut();
            driver::pump_realtime(&mut *surface, &mut *channel);
            surface.take_persist_requests()
        };
        for request in requests {
            let shared = self.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let canvas_id = shared.surface.borrow().canvas_id();
                let outcome = driver::execute(shared.backend.as_ref(), canvas_id, request).await;
                outcome.apply(&mut *shared.surface.borrow_mut());
                shared.sync();
            });
        }
    }
}

/// Drawing surface handle exposed to page scripts.
#[wasm_bindgen]
pub struct CanvasEditor {
    shared: Shared,
}

impl CanvasEditor {
    /// Run a handler, then sync with the backends.
    fn with_surface<T>(&self, f: impl FnOnce(&mut DrawingSurface<DomSvgTarget>) -> T) -> T {
        let result = f(&mut *self.shared.surface.borrow_mut());
        self.shared.sync();
        result
    }
}

#[wasm_bindgen]
impl CanvasEditor {
    /// Open a canvas inside the `<svg>` with id `svg_id`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        config_json: &str,
        svg_id: &str,
        persistence: JsValue,
        publish: js_sys::Function,
    ) -> Result<CanvasEditor, JsValue> {
        let config = SurfaceConfig::from_json(config_json).map_err(|e| {
            log::error!("{}", e);
            JsValue::from_str(&e.to_string())
        })?;
        let Some(target) = DomSvgTarget::find(svg_id) else {
            log::error!("Render target #{} not found", svg_id);
            return Err(JsValue::from_str("render target not found"));
        };
        target.ensure_defs();
        let surface =
            DrawingSurface::new(config, target).map_err(|e| JsValue::from_str(&e.to_string()))?;

        let mut channel = JsChannel {
            publish,
            inbox: Vec::new(),
        };
        if let Err(e) = driver::connect(&surface, &mut channel) {
            log::error!("Failed to join canvas: {}", e);
        }
        Ok(Self {
            shared: Shared {
                surface: Rc::new(RefCell::new(surface)),
                backend: Rc::new(JsPersistence {
                    handlers: persistence,
                }),
                channel: Rc::new(RefCell::new(channel)),
            },
        })
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&self, x: f64, y: f64) {
        self.with_surface(|s| s.pointer_down(Point::new(x, y), Instant::now()));
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&self, x: f64, y: f64) {
        self.with_surface(|s| s.pointer_move(Point::new(x, y), Instant::now()));
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&self, x: f64, y: f64) {
        self.with_surface(|s| s.pointer_up(Point::new(x, y)));
    }

    pub fn wheel(&self, x: f64, y: f64, delta_y: f64) {
        self.with_surface(|s| s.wheel(Point::new(x, y), delta_y));
    }

    /// Returns true when the page should call `preventDefault`.
    #[wasm_bindgen(js_name = keyDown)]
    pub fn key_down(&self, key: String, ctrl: bool, shift: bool, alt: bool, meta: bool) -> bool {
        let event = KeyEvent::Pressed {
            key,
            modifiers: Modifiers {
                shift,
                ctrl,
                alt,
                meta,
            },
        };
        self.with_surface(|s| s.handle_key(&event))
    }

    #[wasm_bindgen(js_name = keyUp)]
    pub fn key_up(&self, key: String) {
        self.with_surface(|s| s.handle_key(&KeyEvent::Released { key }));
    }

    /// Returns false for unknown tool names.
    #[wasm_bindgen(js_name = setTool)]
    pub fn set_tool(&self, name: &str) -> bool {
        match ToolKind::from_name(name) {
            Some(tool) => {
                self.with_surface(|s| s.set_tool(tool));
                true
            }
            None => {
                log::warn!("Unknown tool {}", name);
                false
            }
        }
    }

    pub fn tool(&self) -> String {
        self.shared.surface.borrow().tool().name().to_string()
    }

    #[wasm_bindgen(js_name = toggleLock)]
    pub fn toggle_lock(&self) {
        self.with_surface(|s| s.toggle_lock());
    }

    #[wasm_bindgen(js_name = isLocked)]
    pub fn is_locked(&self) -> bool {
        self.shared.surface.borrow().is_locked()
    }

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&self) {
        self.with_surface(|s| s.zoom_in());
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&self) {
        self.with_surface(|s| s.zoom_out());
    }

    #[wasm_bindgen(js_name = zoomLabel)]
    pub fn zoom_label(&self) -> String {
        self.shared.surface.borrow().zoom_label()
    }

    /// The drawing container moved or was resized.
    #[wasm_bindgen(js_name = setContainer)]
    pub fn set_container(&self, x: f64, y: f64, width: f64, height: f64) {
        self.with_surface(|s| s.set_container(Point::new(x, y), Size::new(width, height)));
    }

    pub fn undo(&self) -> bool {
        self.with_surface(|s| s.undo())
    }

    pub fn redo(&self) -> bool {
        self.with_surface(|s| s.redo())
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.shared.surface.borrow().can_undo()
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.shared.surface.borrow().can_redo()
    }

    #[wasm_bindgen(js_name = textInput)]
    pub fn text_input(&self, value: &str) {
        self.with_surface(|s| s.text_input(value));
    }

    #[wasm_bindgen(js_name = textBlur)]
    pub fn text_blur(&self) {
        self.with_surface(|s| s.text_blur(Instant::now()));
    }

    #[wasm_bindgen(js_name = textFocus)]
    pub fn text_focus(&self) {
        self.with_surface(|s| s.text_focus());
    }

    /// Page position `[x, y]` for the text input, if an edit is open.
    #[wasm_bindgen(js_name = textEditPosition)]
    pub fn text_edit_position(&self) -> Option<Vec<f64>> {
        self.shared
            .surface
            .borrow()
            .text_edit_position()
            .map(|p| vec![p.x, p.y])
    }

    /// Current value of the open text edit.
    #[wasm_bindgen(js_name = textEditValue)]
    pub fn text_edit_value(&self) -> Option<String> {
        self.shared
            .surface
            .borrow()
            .text_edit()
            .map(|session| session.text().to_string())
    }

    #[wasm_bindgen(js_name = uploadImage)]
    pub fn upload_image(&self, bytes: Vec<u8>) {
        self.with_surface(|s| s.begin_image_upload(bytes));
    }

    /// Feed one inbound realtime message (`{"event", "data"}` JSON).
    #[wasm_bindgen(js_name = receiveMessage)]
    pub fn receive_message(&self, json: &str) {
        match ServerMessage::from_json(json) {
            Ok(message) => self.shared.channel.borrow_mut().inbox.push(message),
            Err(e) => log::warn!("Ignoring malformed realtime message: {}", e),
        }
        self.shared.sync();
    }

    /// Fire due timers. Call from `requestAnimationFrame` or an interval.
    pub fn tick(&self) {
        self.with_surface(|s| s.tick(Instant::now()));
    }

    /// Presence avatars as JSON.
    #[wasm_bindgen(js_name = avatarsJson)]
    pub fn avatars_json(&self) -> String {
        let avatars = self.shared.surface.borrow().presence().avatars();
        serde_json::to_string(&avatars).unwrap_or_else(|_| "[]".to_string())
    }
}
