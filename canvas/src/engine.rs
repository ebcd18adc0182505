//! Interaction engine: turns pointer, wheel and keyboard input into scene edits.
//!
//! DESIGN
//! ======
//! [`EngineCore`] owns the [`SceneStore`], the [`Surface`] and the current
//! gesture ([`InputState`]). Every pointer handler resolves the event's scene
//! coordinates through the surface, looks up the step to take in
//! [`input::transition`], performs it, and then mirrors whatever the surface
//! emitted (selection changes, live moves, text-edit toggles) back into the
//! store. Handlers return [`Action`]s for the host: cursor changes, redraw
//! requests, and notifications about created/updated/deleted objects.
//!
//! `EngineCore` has no browser dependencies so it can be tested natively.
//! [`Engine`] wraps it together with the `<canvas>` element and paints via
//! [`crate::render`].
//!
//! ERROR HANDLING
//! ==============
//! Handlers never fail. Lookups that miss (an object removed mid-gesture, a
//! store/surface desync) are logged and the event is dropped.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::collections::HashMap;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::camera::{Camera, Point};
use crate::consts::{
    DEFAULT_RECT_SIZE, IMAGE_PREVIEW_PX, KEYBOARD_ZOOM_STEP, SAVE_DEBOUNCE_MS, SIZE_READOUT_OFFSET_PX,
    WHEEL_ZOOM_EXP_BASE,
};
use crate::debounce::Clock;
use crate::doc::{ObjectId, ObjectKind, ObjectPatch, Page, SceneObject, new_object_id};
use crate::error::SurfaceError;
use crate::hit::Bounds;
use crate::input::{
    self, Button, InputState, Key, Modifiers, PendingCreate, Phase, Tool, Transition, WheelDelta, cursor_for,
};
use crate::render;
use crate::store::{LayerEntry, LayerRef, PendingImage, SceneStore, SelectionSummary, ViewportPatch};
use crate::surface::{PointerKind, Surface, SurfaceEvent, SurfaceHandle};

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ObjectCreated(SceneObject),
    ObjectUpdated { id: ObjectId, fields: ObjectPatch },
    ObjectDeleted { id: ObjectId },
    /// The host should show its text editor for this object.
    EditTextRequested { id: ObjectId, text: String },
    EditTextFinished { id: ObjectId },
    SelectionChanged(Vec<LayerRef>),
    ToolChanged(Tool),
    ViewportChanged(Camera),
    SetCursor(String),
    RenderNeeded,
}

/// Tunables for the engine.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Quiet period before a burst of edits is handed to save listeners.
    pub save_debounce_ms: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { save_debounce_ms: SAVE_DEBOUNCE_MS }
    }
}

/// Live dimensions shown next to the cursor while a rectangle is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeReadout {
    pub width: f64,
    pub height: f64,
    /// Top-left of the tooltip in screen space.
    pub screen: Point,
}

/// Floating thumbnail that follows the cursor while an image is pending.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePreview {
    pub url: String,
    /// Top-left of the thumbnail in screen space.
    pub screen: Point,
    pub size: f64,
}

/// Core engine state: all logic that doesn't depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
pub struct EngineCore {
    pub store: SceneStore,
    pub surface: Surface,
    pub input: InputState,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub dpr: f64,
    /// Space was released mid-drag; leave pan mode on pointer-up.
    pan_release_deferred: bool,
    cursor: String,
    size_readout: Option<SizeReadout>,
    image_preview: Option<ImagePreview>,
}

impl EngineCore {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::from_store(SceneStore::new(config.save_debounce_ms))
    }

    /// An engine whose store runs on `clock`.
    #[must_use]
    pub fn with_clock(config: EngineConfig, clock: Box<dyn Clock>) -> Self {
        Self::from_store(SceneStore::with_clock(config.save_debounce_ms, clock))
    }

    fn from_store(store: SceneStore) -> Self {
        Self {
            store,
            surface: Surface::new(),
            input: InputState::Idle,
            viewport_width: 0.0,
            viewport_height: 0.0,
            dpr: 1.0,
            pan_release_deferred: false,
            cursor: Tool::Cursor.cursor().to_owned(),
            size_readout: None,
            image_preview: None,
        }
    }

    // =============================================================
    // Lifecycle
    // =============================================================

    /// Mount the surface and populate it from the current page.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::InvalidSize`] if the size is not a positive finite number.
    pub fn mount(&mut self, width: f64, height: f64) -> Result<SurfaceHandle, SurfaceError> {
        let handle = self.surface.mount(width, height)?;
        self.viewport_width = width;
        self.viewport_height = height;
        self.reload_surface();
        Ok(handle)
    }

    /// Release the surface and drop any pending save notification.
    pub fn unmount(&mut self) {
        if let Some(handle) = self.surface.handle() {
            self.surface.dispose(handle);
        }
        self.store.cancel_pending();
        self.input = InputState::Idle;
        self.size_readout = None;
        self.image_preview = None;
    }

    /// Track a resize of the host element.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.viewport_width = width_css;
        self.viewport_height = height_css;
        self.dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        self.surface.resize(width_css, height_css);
    }

    /// Replace all pages (document load) and rebuild the surface.
    pub fn load_pages(&mut self, pages: Vec<Page>) -> Vec<Action> {
        self.store.replace_pages(pages);
        self.reload_surface();
        vec![Action::SelectionChanged(Vec::new()), Action::RenderNeeded]
    }

    /// Switch the edited page.
    pub fn set_current_page(&mut self, index: usize) -> Vec<Action> {
        if !self.store.set_current_page(index) {
            return Vec::new();
        }
        self.reload_surface();
        vec![Action::SelectionChanged(Vec::new()), Action::RenderNeeded]
    }

    fn reload_surface(&mut self) {
        self.input = InputState::Idle;
        self.surface.load_objects(self.store.objects());
        self.surface.set_camera(self.store.viewport());
        self.surface.drain_events();
    }

    /// Deliver the debounced save notification if it is due. Call once per frame.
    pub fn tick(&mut self) -> bool {
        self.store.flush_due()
    }

    // =============================================================
    // Tool / inspector inputs
    // =============================================================

    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        self.store.set_selected_tool(tool);
        if tool != Tool::Image {
            self.image_preview = None;
        }
        let mut actions = vec![Action::ToolChanged(tool)];
        self.push_cursor(&mut actions);
        actions
    }

    /// Fill the pending-image slot from the image picker.
    pub fn set_pending_image(&mut self, image: Option<PendingImage>) {
        if image.is_none() {
            self.image_preview = None;
        }
        self.store.set_selected_image(image);
    }

    /// Inspector write path: patch an object in the store and refresh its drawable.
    ///
    /// A text edit that changes layout and names no size gets the re-estimated
    /// box added, so the store only ever applies what the patch carries.
    pub fn update_object(&mut self, id: &str, patch: &ObjectPatch) -> Vec<Action> {
        let patch = self.with_text_size(id, patch);
        if !self.store.update_object(id, &patch) {
            return Vec::new();
        }
        if let Some(obj) = self.store.object(id) {
            self.surface.sync_drawable(obj);
        }
        vec![Action::ObjectUpdated { id: id.to_owned(), fields: patch }, Action::RenderNeeded]
    }

    fn with_text_size(&self, id: &str, patch: &ObjectPatch) -> ObjectPatch {
        let mut patch = patch.clone();
        if !patch.resizes_text() || patch.width.is_some() || patch.height.is_some() {
            return patch;
        }
        let Some(mut preview) = self.store.object(id).cloned() else {
            return patch;
        };
        preview.apply_patch(&patch);
        if let ObjectKind::Text(style) = &preview.kind {
            let (width, height) = style.estimate_size();
            patch.width = Some(width);
            patch.height = Some(height);
        }
        patch
    }

    /// The host editor lost focus or was confirmed.
    pub fn finish_text_editing(&mut self) -> Vec<Action> {
        self.surface.exit_text_editing();
        self.drain_surface()
    }

    /// Commit text typed in the host editor.
    pub fn set_text(&mut self, id: &str, text: &str) -> Vec<Action> {
        self.update_object(id, &ObjectPatch { text: Some(text.to_owned()), ..Default::default() })
    }

    pub fn set_page_background(&mut self, hex: &str, rgba: &str, alpha: f64) -> Vec<Action> {
        self.store.set_current_page_background(hex, rgba, alpha);
        vec![Action::RenderNeeded]
    }

    /// Layers-panel click: replace the selection, or toggle with meta/ctrl.
    pub fn select_layer(&mut self, id: &str, modifiers: Modifiers) -> Vec<Action> {
        let Some(layer) = self.store.object(id).map(LayerRef::of) else {
            log::warn!("select_layer: unknown object {id}");
            return Vec::new();
        };
        let next: Vec<ObjectId> = if modifiers.command() {
            toggled(self.surface.active(), &layer.id)
        } else {
            vec![layer.id]
        };
        if next.is_empty() {
            self.surface.clear_active();
        } else {
            self.surface.set_active(&next);
        }
        self.drain_surface()
    }

    /// Remove every selected object.
    pub fn delete_selection(&mut self) -> Vec<Action> {
        let ids: Vec<ObjectId> = self.store.selection().iter().map(|l| l.id.clone()).collect();
        let mut actions = Vec::new();
        for id in ids {
            if self.store.remove_object(&id).is_some() {
                self.surface.remove_drawable(&id);
                actions.push(Action::ObjectDeleted { id });
            }
        }
        if actions.is_empty() {
            return actions;
        }
        self.surface.clear_active();
        actions.extend(self.drain_surface());
        actions.push(Action::SelectionChanged(self.store.selection().to_vec()));
        actions
    }

    // =============================================================
    // Pointer input
    // =============================================================

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        if button != Button::Primary || !self.surface.is_mounted() {
            return Vec::new();
        }
        let ev = self.surface.pointer(PointerKind::Down, screen_pt);
        let step = input::transition(self.store.tool(), Phase::Down, self.store.is_panning(), &self.input);
        log::debug!("pointer down: {step:?}");
        let mut actions = match step {
            Transition::BeginPan => {
                self.input = InputState::Panning { last_screen: ev.screen };
                Vec::new()
            }
            Transition::CursorPress => self.cursor_press(ev.scene, modifiers),
            Transition::CreateText => self.create_text(ev.scene),
            Transition::BeginRectangle => self.begin_rectangle(ev.scene),
            Transition::PlaceImage => self.place_image(ev.scene),
            _ => Vec::new(),
        };
        self.push_cursor(&mut actions);
        actions
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        if !self.surface.is_mounted() {
            return Vec::new();
        }
        let ev = self.surface.pointer(PointerKind::Move, screen_pt);
        let step = input::transition(self.store.tool(), Phase::Move, self.store.is_panning(), &self.input);
        let mut actions = match (step, self.input.clone()) {
            (Transition::PanBy, InputState::Panning { last_screen }) => {
                self.input = InputState::Panning { last_screen: ev.screen };
                let delta = ev.screen.sub(last_screen);
                let camera = self.surface.camera().pan_by(delta.x, delta.y);
                self.apply_camera(camera, None)
            }
            (Transition::DragSelection, InputState::DraggingObjects { last_scene, .. }) => {
                let delta = ev.scene.sub(last_scene);
                if delta == Point::default() {
                    Vec::new()
                } else {
                    self.input = InputState::DraggingObjects { last_scene: ev.scene, moved: true };
                    self.store.set_hovered_layer(None);
                    self.surface.translate_active(delta.x, delta.y);
                    self.drain_surface()
                }
            }
            (Transition::ExtendMarquee, InputState::Marquee { anchor, additive, .. }) => {
                self.input = InputState::Marquee { anchor, current: ev.scene, additive };
                vec![Action::RenderNeeded]
            }
            (Transition::ResizeRectangle, InputState::DrawingRectangle(mut pending)) => {
                pending.end = ev.scene;
                let (left, top, width, height) = pending.bounds();
                self.size_readout = Some(SizeReadout {
                    width,
                    height,
                    screen: Point::new(ev.screen.x + SIZE_READOUT_OFFSET_PX, ev.screen.y + SIZE_READOUT_OFFSET_PX),
                });
                let target = pending.target.clone();
                self.input = InputState::DrawingRectangle(pending);
                self.resize_object(&target, left, top, width, height)
            }
            (Transition::Hover, _) => self.hover(ev.screen, ev.scene),
            _ => Vec::new(),
        };
        self.push_cursor(&mut actions);
        actions
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        if button != Button::Primary || !self.surface.is_mounted() {
            return Vec::new();
        }
        let ev = self.surface.pointer(PointerKind::Up, screen_pt);
        let step = input::transition(self.store.tool(), Phase::Up, self.store.is_panning(), &self.input);
        log::debug!("pointer up: {step:?}");
        let state = std::mem::take(&mut self.input);
        let mut actions = match (step, state) {
            (Transition::EndPan, _) => {
                if self.pan_release_deferred {
                    self.pan_release_deferred = false;
                    self.store.set_is_panning(false);
                }
                Vec::new()
            }
            (Transition::EndDrag, InputState::DraggingObjects { .. }) => vec![Action::RenderNeeded],
            (Transition::EndMarquee, InputState::Marquee { anchor, current, additive }) => {
                self.finish_marquee(Bounds::from_corners(anchor, current), additive)
            }
            (Transition::CommitRectangle, InputState::DrawingRectangle(mut pending)) => {
                pending.end = ev.scene;
                self.commit_rectangle(&pending)
            }
            (_, other) => {
                self.input = other;
                Vec::new()
            }
        };
        self.push_cursor(&mut actions);
        actions
    }

    /// Pointer left the canvas: drop hover and the image preview.
    pub fn on_pointer_out(&mut self) -> Vec<Action> {
        self.store.set_hovered_layer(None);
        self.surface.clear_hover();
        self.image_preview = None;
        vec![Action::RenderNeeded]
    }

    /// Ctrl/Cmd + wheel zooms around the pointer; a plain wheel pans.
    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        if !self.surface.is_mounted() {
            return Vec::new();
        }
        let ev = self.surface.pointer(PointerKind::Wheel, screen_pt);
        let camera = self.surface.camera();
        if modifiers.command() {
            let factor = WHEEL_ZOOM_EXP_BASE.powf(-delta.dy);
            self.apply_camera(camera.zoom_at(ev.screen, factor), Some(ev.screen))
        } else {
            self.apply_camera(camera.pan_by(-delta.dx, -delta.dy), None)
        }
    }

    // =============================================================
    // Keyboard input
    // =============================================================

    /// `editable_focus` is true when the DOM focus is in an input or contenteditable.
    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers, editable_focus: bool) -> Vec<Action> {
        if self.surface.editing().is_some() {
            if key.is("Escape") {
                self.surface.exit_text_editing();
                return self.drain_surface();
            }
            return Vec::new();
        }
        if editable_focus {
            return Vec::new();
        }

        if key.is_space() {
            self.pan_release_deferred = false;
            if self.store.is_panning() {
                return Vec::new();
            }
            self.store.set_is_panning(true);
            self.store.set_hovered_layer(None);
            self.surface.clear_hover();
            let mut actions = vec![Action::RenderNeeded];
            self.push_cursor(&mut actions);
            return actions;
        }

        if modifiers.command() {
            let center = Point::new(self.viewport_width / 2.0, self.viewport_height / 2.0);
            let camera = self.surface.camera();
            return match key.0.as_str() {
                "+" | "=" => self.apply_camera(camera.zoom_at(center, KEYBOARD_ZOOM_STEP), Some(center)),
                "-" | "_" => self.apply_camera(camera.zoom_at(center, 1.0 / KEYBOARD_ZOOM_STEP), Some(center)),
                "0" => self.apply_camera(Camera::reset(), Some(Point::default())),
                k if k.eq_ignore_ascii_case("a") => self.select_all(),
                _ => Vec::new(),
            };
        }

        if key.is("Escape") {
            self.surface.clear_active();
            return self.drain_surface();
        }
        if key.is("Delete") || key.is("Backspace") {
            return self.delete_selection();
        }
        Vec::new()
    }

    pub fn on_key_up(&mut self, key: &Key, _modifiers: Modifiers) -> Vec<Action> {
        if !key.is_space() || !self.store.is_panning() {
            return Vec::new();
        }
        if matches!(self.input, InputState::Panning { .. }) {
            self.pan_release_deferred = true;
            return Vec::new();
        }
        self.store.set_is_panning(false);
        let mut actions = Vec::new();
        self.push_cursor(&mut actions);
        actions
    }

    // =============================================================
    // Gesture steps
    // =============================================================

    fn cursor_press(&mut self, scene: Point, modifiers: Modifiers) -> Vec<Action> {
        let hit = self.surface.drawable_at(scene).map(|d| d.id.clone());
        if self.surface.editing().is_some() && self.surface.editing() != hit.as_deref() {
            self.surface.exit_text_editing();
        }
        match hit {
            Some(id) if modifiers.additive() => {
                let next = toggled(self.surface.active(), &id);
                self.surface.set_active(&next);
            }
            Some(id) => {
                if !self.surface.is_active(&id) {
                    self.surface.set_active(&[id]);
                }
                self.input = InputState::DraggingObjects { last_scene: scene, moved: false };
            }
            None => {
                if !modifiers.additive() {
                    self.surface.clear_active();
                }
                self.input = InputState::Marquee { anchor: scene, current: scene, additive: modifiers.additive() };
            }
        }
        self.drain_surface()
    }

    fn create_text(&mut self, scene: Point) -> Vec<Action> {
        let obj = SceneObject::text(new_object_id(), scene.x, scene.y);
        let mut actions = self.insert_object(obj.clone());
        if actions.is_empty() {
            return actions;
        }
        self.surface.set_active(std::slice::from_ref(&obj.id));
        self.surface.enter_text_editing(&obj.id);
        actions.extend(self.drain_surface());
        actions.extend(self.set_tool(Tool::Cursor));
        actions
    }

    fn begin_rectangle(&mut self, scene: Point) -> Vec<Action> {
        let obj = SceneObject::rectangle(new_object_id(), scene.x, scene.y, 0.0, 0.0);
        let mut actions = self.insert_object(obj.clone());
        if actions.is_empty() {
            return actions;
        }
        self.surface.set_active(std::slice::from_ref(&obj.id));
        actions.extend(self.drain_surface());
        self.input = InputState::DrawingRectangle(PendingCreate { start: scene, end: scene, target: obj.id });
        actions
    }

    fn commit_rectangle(&mut self, pending: &PendingCreate) -> Vec<Action> {
        self.size_readout = None;
        let (left, top, width, height) = if pending.is_click() {
            let half = DEFAULT_RECT_SIZE / 2.0;
            (pending.start.x - half, pending.start.y - half, DEFAULT_RECT_SIZE, DEFAULT_RECT_SIZE)
        } else {
            pending.bounds()
        };
        let mut actions = self.resize_object(&pending.target, left, top, width, height);
        actions.extend(self.set_tool(Tool::Cursor));
        actions
    }

    fn place_image(&mut self, scene: Point) -> Vec<Action> {
        let Some(image) = self.store.selected_image().cloned() else {
            log::warn!("image tool: no pending image to place");
            return Vec::new();
        };
        let obj = SceneObject::image(
            new_object_id(),
            &image.name,
            &image.url,
            scene.x - image.width / 2.0,
            scene.y - image.height / 2.0,
            image.width,
            image.height,
        );
        let mut actions = self.insert_object(obj.clone());
        if actions.is_empty() {
            return actions;
        }
        self.surface.set_active(std::slice::from_ref(&obj.id));
        actions.extend(self.drain_surface());
        self.set_pending_image(None);
        actions.extend(self.set_tool(Tool::Cursor));
        actions
    }

    fn finish_marquee(&mut self, area: Bounds, additive: bool) -> Vec<Action> {
        if area.width <= 0.0 && area.height <= 0.0 {
            return vec![Action::RenderNeeded];
        }
        let mut next: Vec<ObjectId> = if additive { self.surface.active().to_vec() } else { Vec::new() };
        for id in self.surface.drawables_in(&area) {
            if !next.contains(&id) {
                next.push(id);
            }
        }
        self.surface.set_active(&next);
        let mut actions = self.drain_surface();
        actions.push(Action::RenderNeeded);
        actions
    }

    fn select_all(&mut self) -> Vec<Action> {
        let ids = self.surface.selectable_ids();
        self.surface.set_active(&ids);
        self.drain_surface()
    }

    fn hover(&mut self, screen: Point, scene: Point) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.store.tool() == Tool::Image {
            if let Some(image) = self.store.selected_image() {
                let half = IMAGE_PREVIEW_PX / 2.0;
                self.image_preview = Some(ImagePreview {
                    url: image.url.clone(),
                    screen: Point::new(screen.x - half, screen.y - half),
                    size: IMAGE_PREVIEW_PX,
                });
                actions.push(Action::RenderNeeded);
            }
        }

        let target = self.surface.drawable_at(scene).map(|d| d.id.clone());
        let current = self.store.hovered().map(|h| h.id.clone());
        if target == current {
            return actions;
        }
        let shown = match target.and_then(|id| self.store.object(&id).map(LayerRef::of)) {
            Some(layer) => {
                let accepted = self.store.set_hovered_layer(Some(layer.clone()));
                accepted && self.surface.show_hover(&layer.id)
            }
            None => false,
        };
        if !shown {
            self.store.set_hovered_layer(None);
            self.surface.clear_hover();
        }
        if actions.is_empty() {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    // =============================================================
    // Helpers
    // =============================================================

    fn insert_object(&mut self, obj: SceneObject) -> Vec<Action> {
        if !self.store.add_object(obj.clone()) {
            return Vec::new();
        }
        if self.surface.add_drawable(&obj).is_none() {
            log::warn!("surface rejected drawable {}", obj.id);
        }
        vec![Action::ObjectCreated(obj), Action::RenderNeeded]
    }

    fn resize_object(&mut self, id: &str, left: f64, top: f64, width: f64, height: f64) -> Vec<Action> {
        let patch = ObjectPatch::geometry(left, top, width, height);
        if !self.store.update_object(id, &patch) {
            log::warn!("resize: object {id} vanished mid-gesture");
            self.size_readout = None;
            return Vec::new();
        }
        self.surface.set_geometry(id, left, top, width, height);
        vec![Action::ObjectUpdated { id: id.to_owned(), fields: patch }, Action::RenderNeeded]
    }

    fn apply_camera(&mut self, camera: Camera, pointer: Option<Point>) -> Vec<Action> {
        self.surface.set_camera(camera);
        self.store.set_zoom(ViewportPatch::from_camera(camera, pointer));
        vec![Action::ViewportChanged(camera), Action::RenderNeeded]
    }

    /// Mirror surface events into the store.
    fn drain_surface(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        let mut selection_changed = false;
        let multi = self.surface.active().len() > 1;
        for event in self.surface.drain_events() {
            match event {
                SurfaceEvent::SelectionCreated { added } => {
                    let layers = self.layer_refs(&added);
                    self.store.set_selected_layers(layers);
                    selection_changed = true;
                }
                SurfaceEvent::SelectionUpdated { added, removed } => {
                    self.store.unselect_layers(&removed);
                    for layer in self.layer_refs(&added) {
                        if !self.store.is_selected(&layer.id) {
                            self.store.toggle_selected_layer(layer);
                        }
                    }
                    selection_changed = true;
                }
                SurfaceEvent::SelectionCleared { .. } => {
                    self.store.clear_selection();
                    selection_changed = true;
                }
                SurfaceEvent::ObjectMoving { id, left, top, dx, dy } => {
                    let patch = if multi {
                        let Some(obj) = self.store.object(&id) else {
                            log::warn!("drag: object {id} missing from store");
                            continue;
                        };
                        ObjectPatch::position(obj.left + dx, obj.top + dy)
                    } else {
                        ObjectPatch::position(left, top)
                    };
                    if self.store.update_object(&id, &patch) {
                        actions.push(Action::ObjectUpdated { id, fields: patch });
                    }
                }
                SurfaceEvent::TextEditingEntered { id } => {
                    let text = self.store.object(&id).map(text_of).unwrap_or_default();
                    actions.push(Action::EditTextRequested { id, text });
                }
                SurfaceEvent::TextEditingExited { id } => {
                    actions.push(Action::EditTextFinished { id });
                }
            }
        }
        if selection_changed {
            actions.push(Action::SelectionChanged(self.store.selection().to_vec()));
        }
        if !actions.is_empty() {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    fn layer_refs(&self, ids: &[ObjectId]) -> Vec<LayerRef> {
        ids.iter().filter_map(|id| self.store.object(id).map(LayerRef::of)).collect()
    }

    fn push_cursor(&mut self, actions: &mut Vec<Action>) {
        let cursor = cursor_for(self.store.tool(), self.store.is_panning(), &self.input);
        if self.cursor != cursor {
            cursor.clone_into(&mut self.cursor);
            actions.push(Action::SetCursor(cursor.to_owned()));
        }
    }

    // =============================================================
    // Queries
    // =============================================================

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.surface.camera()
    }

    #[must_use]
    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    #[must_use]
    pub fn selection(&self) -> &[LayerRef] {
        self.store.selection()
    }

    #[must_use]
    pub fn object(&self, id: &str) -> Option<&SceneObject> {
        self.store.object(id)
    }

    #[must_use]
    pub fn layers(&self) -> Vec<LayerEntry> {
        self.store.layers()
    }

    #[must_use]
    pub fn selection_summary(&self) -> Option<SelectionSummary> {
        self.store.selection_summary()
    }

    #[must_use]
    pub fn size_readout(&self) -> Option<SizeReadout> {
        self.size_readout
    }

    #[must_use]
    pub fn image_preview(&self) -> Option<&ImagePreview> {
        self.image_preview.as_ref()
    }

    /// Scene-space marquee rectangle while drag-selecting.
    #[must_use]
    pub fn marquee(&self) -> Option<Bounds> {
        match self.input {
            InputState::Marquee { anchor, current, .. } => Some(Bounds::from_corners(anchor, current)),
            _ => None,
        }
    }
}

fn toggled(active: &[ObjectId], id: &str) -> Vec<ObjectId> {
    if active.iter().any(|a| a == id) {
        active.iter().filter(|a| *a != id).cloned().collect()
    } else {
        let mut next = active.to_vec();
        next.push(id.to_owned());
        next
    }
}

fn text_of(obj: &SceneObject) -> String {
    match &obj.kind {
        ObjectKind::Text(style) => style.text.clone(),
        _ => String::new(),
    }
}

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    images: HashMap<String, HtmlImageElement>,
    pub core: EngineCore,
}

impl Engine {
    /// Create a new engine bound to the given canvas element.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement, config: EngineConfig) -> Self {
        Self { canvas, images: HashMap::new(), core: EngineCore::new(config) }
    }

    /// Mount the surface at the element's current CSS size.
    ///
    /// # Errors
    ///
    /// Returns a [`SurfaceError`] if the element has no usable size or no 2D context.
    pub fn mount(&mut self) -> Result<SurfaceHandle, SurfaceError> {
        self.context()?;
        let width = f64::from(self.canvas.client_width());
        let height = f64::from(self.canvas.client_height());
        self.core.mount(width, height)
    }

    pub fn unmount(&mut self) {
        self.core.unmount();
        self.images.clear();
    }

    fn context(&self) -> Result<CanvasRenderingContext2d, SurfaceError> {
        match self.canvas.get_context("2d") {
            Ok(Some(obj)) => obj.dyn_into::<CanvasRenderingContext2d>().map_err(|_| SurfaceError::ContextUnavailable),
            _ => Err(SurfaceError::ContextUnavailable),
        }
    }

    // --- Viewport ---

    /// Update viewport dimensions and device pixel ratio, resizing the backing store.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.core.set_viewport(width_css, height_css, dpr);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            self.canvas.set_width((width_css * self.core.dpr).round().max(1.0) as u32);
            self.canvas.set_height((height_css * self.core.dpr).round().max(1.0) as u32);
        }
    }

    // --- Delegated input ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_down(screen_pt, button, modifiers)
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_move(screen_pt, modifiers)
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_up(screen_pt, button, modifiers)
    }

    pub fn on_pointer_out(&mut self) -> Vec<Action> {
        self.core.on_pointer_out()
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_wheel(screen_pt, delta, modifiers)
    }

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers, editable_focus: bool) -> Vec<Action> {
        self.core.on_key_down(key, modifiers, editable_focus)
    }

    pub fn on_key_up(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_key_up(key, modifiers)
    }

    /// Flush a due save notification. Call from the animation frame loop.
    pub fn tick(&mut self) -> bool {
        self.core.tick()
    }

    // --- Render ---

    /// Draw the current state to the canvas.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the 2D context is unavailable or a draw call fails.
    pub fn render(&mut self) -> Result<(), JsValue> {
        let ctx = self.context().map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.load_images()?;
        let frame = render::Frame {
            surface: &self.core.surface,
            background: self.core.store.current_page().map(|p| p.background_color.rgba.as_str()),
            editing: self.core.surface.editing(),
            marquee: self.core.marquee(),
            size_readout: self.core.size_readout(),
            image_preview: self.core.image_preview(),
            viewport_w: self.core.viewport_width,
            viewport_h: self.core.viewport_height,
            dpr: self.core.dpr,
        };
        render::draw(&ctx, &frame, &self.images)
    }

    /// Start loading any image source the surface references but the cache lacks.
    fn load_images(&mut self) -> Result<(), JsValue> {
        let mut wanted: Vec<String> = self
            .core
            .surface
            .drawables()
            .iter()
            .filter_map(|d| match &d.shape {
                crate::surface::Shape::Image { src, .. } => Some(src.clone()),
                _ => None,
            })
            .collect();
        if let Some(preview) = self.core.image_preview() {
            wanted.push(preview.url.clone());
        }
        for src in wanted {
            if self.images.contains_key(&src) {
                continue;
            }
            let img = HtmlImageElement::new()?;
            img.set_src(&src);
            self.images.insert(src, img);
        }
        Ok(())
    }
}
