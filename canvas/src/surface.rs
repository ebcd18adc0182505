//! Render surface adapter: the live drawables mirroring store objects.
//!
//! DESIGN
//! ======
//! The surface is a retained list of [`Drawable`]s in paint order, keyed by
//! the same id as the store's [`SceneObject`]s. It never reads the store; the
//! engine pushes objects in (`load_objects`, `add_drawable`, `sync_drawable`)
//! and reads events out (`drain_events`). That one-way flow is what keeps the
//! surface and the store from feeding each other's change notifications.
//!
//! Every non-synthetic drawable gets the same selection chrome when it is
//! created or loaded: corner-only handles, an 8px corner size and the accent
//! border color. The hover outline is a synthetic drawable with the reserved
//! id [`HOVER_OVERLAY_ID`]; it is never selectable and never persisted.
//!
//! ERROR HANDLING
//! ==============
//! `mount` is the only fallible operation. Every other call on an unmounted
//! surface is a no-op that logs a warning, and lookups of unknown ids return
//! `false`/`None`.

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;

use crate::camera::{Camera, Point};
use crate::consts::{
    ACCENT_COLOR, BORDER_SCALE_FACTOR, HANDLE_FILL, HANDLE_SIZE_PX, HOVER_COLOR, HOVER_OVERLAY_ID, HOVER_STROKE_PX,
};
use crate::doc::{BorderRadius, ClipRect, ObjectId, ObjectKind, SceneObject, TextStyle};
use crate::error::SurfaceError;
use crate::hit::{self, Bounds};

/// Selection chrome applied to every user drawable.
#[derive(Debug, Clone, PartialEq)]
pub struct HandleStyle {
    pub corner_color: &'static str,
    pub corner_stroke_color: &'static str,
    pub corner_size: f64,
    pub transparent_corners: bool,
    pub border_color: &'static str,
    pub border_scale_factor: f64,
    pub border_opacity_when_moving: f64,
    /// Edge-midpoint and rotation controls that are not shown.
    pub hidden_controls: &'static [&'static str],
    /// Border color while a text drawable is being edited.
    pub editing_border_color: Option<&'static str>,
}

impl HandleStyle {
    /// Corner-only handles with the accent border.
    #[must_use]
    pub fn standard(is_text: bool) -> Self {
        Self {
            corner_color: HANDLE_FILL,
            corner_stroke_color: ACCENT_COLOR,
            corner_size: HANDLE_SIZE_PX,
            transparent_corners: false,
            border_color: ACCENT_COLOR,
            border_scale_factor: BORDER_SCALE_FACTOR,
            border_opacity_when_moving: 0.0,
            hidden_controls: &["mt", "mb", "ml", "mr", "mtr"],
            editing_border_color: is_text.then_some(ACCENT_COLOR),
        }
    }
}

/// Variant-specific paint data of a drawable.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rectangle { fill: String },
    Text(TextStyle),
    Image { src: String, clip: ClipRect },
    /// Stroke-only outline drawn around the hovered object.
    Outline { stroke: &'static str, stroke_width: f64 },
}

/// A live, paintable counterpart of a scene object.
#[derive(Debug, Clone, PartialEq)]
pub struct Drawable {
    pub id: ObjectId,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub opacity: f64,
    pub border_radius: Option<BorderRadius>,
    pub shape: Shape,
    /// `None` for synthetic drawables.
    pub chrome: Option<HandleStyle>,
    pub selectable: bool,
    /// Overlay owned by the surface itself rather than the store.
    pub synthetic: bool,
}

impl Drawable {
    /// Build a drawable for `obj`, deriving a missing image clip from the bitmap size.
    #[must_use]
    pub fn from_object(obj: &SceneObject) -> Self {
        let shape = match &obj.kind {
            ObjectKind::Rectangle { fill } => Shape::Rectangle { fill: fill.clone() },
            ObjectKind::Text(style) => Shape::Text(style.clone()),
            ObjectKind::Image(image) => Shape::Image {
                src: image.src.clone(),
                clip: image.clip_path.unwrap_or(ClipRect {
                    width: obj.width,
                    height: obj.height,
                    radius: obj.corner_radius(),
                }),
            },
        };
        Self {
            id: obj.id.clone(),
            left: obj.left,
            top: obj.top,
            width: obj.width,
            height: obj.height,
            opacity: obj.opacity,
            border_radius: obj.border_radius,
            chrome: Some(HandleStyle::standard(matches!(shape, Shape::Text(_)))),
            shape,
            selectable: true,
            synthetic: false,
        }
    }

    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.left, self.top, self.width, self.height)
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self.shape, Shape::Text(_))
    }
}

/// Kind of positioned pointer event arriving from the DOM. Pointer-out has
/// no position and goes straight to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    Wheel,
}

/// A DOM pointer event with both coordinate spaces resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub screen: Point,
    pub scene: Point,
}

/// Notifications for the interaction engine.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    SelectionCreated { added: Vec<ObjectId> },
    SelectionUpdated { added: Vec<ObjectId>, removed: Vec<ObjectId> },
    SelectionCleared { removed: Vec<ObjectId> },
    /// Live position of a drawable during a drag.
    ObjectMoving { id: ObjectId, left: f64, top: f64, dx: f64, dy: f64 },
    TextEditingEntered { id: ObjectId },
    TextEditingExited { id: ObjectId },
}

/// Token for one mount of the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceHandle(u64);

#[derive(Debug, Clone, Copy)]
struct Mount {
    handle: SurfaceHandle,
    width: f64,
    height: f64,
}

/// The retained drawable list plus viewport and selection state.
#[derive(Debug, Default)]
pub struct Surface {
    mount: Option<Mount>,
    mounts: u64,
    drawables: Vec<Drawable>,
    active: Vec<ObjectId>,
    camera: Camera,
    hover_target: Option<ObjectId>,
    editing: Option<ObjectId>,
    events: Vec<SurfaceEvent>,
}

impl Surface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =============================================================
    // Lifecycle
    // =============================================================

    /// Acquire the surface at the given pixel size.
    ///
    /// A previous mount is disposed first, so drawables never leak across mounts.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::InvalidSize`] for a zero, negative or non-finite size.
    pub fn mount(&mut self, width: f64, height: f64) -> Result<SurfaceHandle, SurfaceError> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(SurfaceError::InvalidSize { width, height });
        }
        if let Some(previous) = self.mount {
            self.dispose(previous.handle);
        }
        self.mounts += 1;
        let handle = SurfaceHandle(self.mounts);
        self.mount = Some(Mount { handle, width, height });
        log::debug!("surface: mounted {width}x{height}");
        Ok(handle)
    }

    /// Release every drawable and reset state. Safe to call repeatedly; a stale handle is ignored.
    pub fn dispose(&mut self, handle: SurfaceHandle) -> bool {
        match self.mount {
            Some(m) if m.handle == handle => {
                self.mount = None;
                self.drawables.clear();
                self.active.clear();
                self.hover_target = None;
                self.editing = None;
                self.events.clear();
                self.camera = Camera::default();
                log::debug!("surface: disposed");
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mount.is_some()
    }

    #[must_use]
    pub fn handle(&self) -> Option<SurfaceHandle> {
        self.mount.map(|m| m.handle)
    }

    /// Mounted pixel size.
    #[must_use]
    pub fn size(&self) -> Option<(f64, f64)> {
        self.mount.map(|m| (m.width, m.height))
    }

    /// Track a resize of the host element. Invalid sizes are ignored.
    pub fn resize(&mut self, width: f64, height: f64) {
        let Some(m) = self.mount.as_mut() else {
            log::warn!("surface: resize while unmounted");
            return;
        };
        if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
            m.width = width;
            m.height = height;
        }
    }

    fn ensure_mounted(&self, op: &str) -> bool {
        if self.mount.is_none() {
            log::warn!("surface: {op} while unmounted");
            return false;
        }
        true
    }

    // =============================================================
    // Drawables
    // =============================================================

    #[must_use]
    pub fn drawables(&self) -> &[Drawable] {
        &self.drawables
    }

    #[must_use]
    pub fn drawable(&self, id: &str) -> Option<&Drawable> {
        self.drawables.iter().find(|d| d.id == id)
    }

    fn drawable_mut(&mut self, id: &str) -> Option<&mut Drawable> {
        self.drawables.iter_mut().find(|d| d.id == id)
    }

    /// Replace every drawable with `objects`, keeping their paint order.
    ///
    /// Nested children are flattened depth-first and paint above their parent.
    pub fn load_objects(&mut self, objects: &[SceneObject]) {
        if !self.ensure_mounted("load_objects") {
            return;
        }
        self.drawables.clear();
        self.active.clear();
        self.hover_target = None;
        self.editing = None;
        push_flattened(&mut self.drawables, objects);
    }

    /// Add a drawable on top. Returns its id, or `None` if unmounted or the id is taken.
    pub fn add_drawable(&mut self, obj: &SceneObject) -> Option<ObjectId> {
        if !self.ensure_mounted("add_drawable") {
            return None;
        }
        if self.drawable(&obj.id).is_some() {
            log::warn!("surface: drawable {} already exists", obj.id);
            return None;
        }
        let drawable = Drawable::from_object(obj);
        let id = drawable.id.clone();
        match self.hover_overlay_index() {
            // Keep the hover outline above everything else.
            Some(idx) => self.drawables.insert(idx, drawable),
            None => self.drawables.push(drawable),
        }
        Some(id)
    }

    /// Remove a drawable. It is also dropped from the active set without emitting an event.
    pub fn remove_drawable(&mut self, id: &str) -> bool {
        if !self.ensure_mounted("remove_drawable") {
            return false;
        }
        let Some(idx) = self.drawables.iter().position(|d| d.id == id && !d.synthetic) else {
            return false;
        };
        self.drawables.remove(idx);
        self.active.retain(|a| a != id);
        if self.hover_target.as_deref() == Some(id) {
            self.clear_hover();
        }
        if self.editing.as_deref() == Some(id) {
            self.editing = None;
        }
        true
    }

    /// Refresh a drawable from its scene object.
    pub fn sync_drawable(&mut self, obj: &SceneObject) -> bool {
        if !self.ensure_mounted("sync_drawable") {
            return false;
        }
        let Some(d) = self.drawable_mut(&obj.id) else {
            return false;
        };
        let chrome = d.chrome.take();
        *d = Drawable::from_object(obj);
        d.chrome = chrome;
        self.refresh_hover();
        true
    }

    /// Set a drawable's geometry, as during a live resize.
    pub fn set_geometry(&mut self, id: &str, left: f64, top: f64, width: f64, height: f64) -> bool {
        let Some(d) = self.drawable_mut(id) else {
            return false;
        };
        d.left = left;
        d.top = top;
        d.width = width;
        d.height = height;
        if let Shape::Image { clip, .. } = &mut d.shape {
            clip.width = width;
            clip.height = height;
        }
        self.refresh_hover();
        true
    }

    /// Topmost selectable drawable under a scene point.
    #[must_use]
    pub fn drawable_at(&self, scene: Point) -> Option<&Drawable> {
        hit::topmost_at(&self.drawables, scene)
    }

    /// Ids of selectable drawables overlapping `area`.
    #[must_use]
    pub fn drawables_in(&self, area: &Bounds) -> Vec<ObjectId> {
        hit::intersecting(&self.drawables, area)
    }

    /// Ids of every user (non-synthetic) drawable in paint order.
    #[must_use]
    pub fn selectable_ids(&self) -> Vec<ObjectId> {
        self.drawables.iter().filter(|d| d.selectable && !d.synthetic).map(|d| d.id.clone()).collect()
    }

    // =============================================================
    // Active selection
    // =============================================================

    #[must_use]
    pub fn active(&self) -> &[ObjectId] {
        &self.active
    }

    #[must_use]
    pub fn is_active(&self, id: &str) -> bool {
        self.active.iter().any(|a| a == id)
    }

    /// Make exactly `ids` the active selection, emitting the matching selection event.
    pub fn set_active(&mut self, ids: &[ObjectId]) {
        if !self.ensure_mounted("set_active") {
            return;
        }
        let mut next: Vec<ObjectId> = Vec::with_capacity(ids.len());
        for id in ids {
            let known = self.drawable(id).is_some_and(|d| d.selectable && !d.synthetic);
            if known && !next.contains(id) {
                next.push(id.clone());
            }
        }
        let added: Vec<ObjectId> = next.iter().filter(|id| !self.active.contains(id)).cloned().collect();
        let removed: Vec<ObjectId> = self.active.iter().filter(|id| !next.contains(id)).cloned().collect();
        if added.is_empty() && removed.is_empty() {
            return;
        }
        let was_empty = self.active.is_empty();
        self.active = next;
        if self.hover_target.as_ref().is_some_and(|h| self.active.contains(h)) {
            self.clear_hover();
        }
        let event = if self.active.is_empty() {
            SurfaceEvent::SelectionCleared { removed }
        } else if was_empty {
            SurfaceEvent::SelectionCreated { added }
        } else {
            SurfaceEvent::SelectionUpdated { added, removed }
        };
        self.events.push(event);
    }

    /// Deselect everything.
    pub fn clear_active(&mut self) {
        self.set_active(&[]);
    }

    /// Offset every active drawable, emitting one `ObjectMoving` per drawable.
    ///
    /// The hover outline is hidden for the duration of a move.
    pub fn translate_active(&mut self, dx: f64, dy: f64) {
        if !self.ensure_mounted("translate_active") {
            return;
        }
        self.clear_hover();
        for id in self.active.clone() {
            if let Some(d) = self.drawable_mut(&id) {
                d.left += dx;
                d.top += dy;
                let (left, top) = (d.left, d.top);
                self.events.push(SurfaceEvent::ObjectMoving { id, left, top, dx, dy });
            }
        }
    }

    // =============================================================
    // Viewport
    // =============================================================

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    /// Apply a full camera state.
    pub fn set_camera(&mut self, camera: Camera) {
        if !self.ensure_mounted("set_camera") {
            return;
        }
        self.camera = camera;
        self.refresh_hover();
    }

    /// Change the zoom value only. Object geometry is untouched.
    pub fn apply_zoom(&mut self, zoom: f64) {
        let camera = Camera { zoom: crate::camera::clamp_zoom(zoom), ..self.camera };
        self.set_camera(camera);
    }

    /// Set the absolute pan offset. Object geometry is untouched.
    pub fn apply_pan(&mut self, delta: Point) {
        let camera = Camera { pan_x: delta.x, pan_y: delta.y, ..self.camera };
        self.set_camera(camera);
    }

    /// Resolve a DOM pointer position into both coordinate spaces.
    #[must_use]
    pub fn pointer(&self, kind: PointerKind, screen: Point) -> PointerEvent {
        PointerEvent { kind, screen, scene: self.camera.screen_to_scene(screen) }
    }

    // =============================================================
    // Hover overlay
    // =============================================================

    #[must_use]
    pub fn hover_target(&self) -> Option<&str> {
        self.hover_target.as_deref()
    }

    /// Outline `id`. Active or unknown drawables are not outlined.
    pub fn show_hover(&mut self, id: &str) -> bool {
        if !self.ensure_mounted("show_hover") {
            return false;
        }
        if self.is_active(id) || self.drawable(id).is_none_or(|d| d.synthetic) {
            return false;
        }
        self.hover_target = Some(id.to_owned());
        self.refresh_hover();
        true
    }

    pub fn clear_hover(&mut self) {
        self.hover_target = None;
        self.drawables.retain(|d| d.id != HOVER_OVERLAY_ID);
    }

    fn hover_overlay_index(&self) -> Option<usize> {
        self.drawables.iter().position(|d| d.id == HOVER_OVERLAY_ID)
    }

    /// Rebuild the outline from its target's geometry and the current zoom.
    fn refresh_hover(&mut self) {
        let Some(target) = self.hover_target.clone() else {
            return;
        };
        let Some(bounds) = self.drawable(&target).map(Drawable::bounds) else {
            self.clear_hover();
            return;
        };
        let outline = Drawable {
            id: HOVER_OVERLAY_ID.to_owned(),
            left: bounds.left,
            top: bounds.top,
            width: bounds.width,
            height: bounds.height,
            opacity: 1.0,
            border_radius: None,
            shape: Shape::Outline { stroke: HOVER_COLOR, stroke_width: HOVER_STROKE_PX / self.camera.zoom },
            chrome: None,
            selectable: false,
            synthetic: true,
        };
        match self.hover_overlay_index() {
            Some(idx) => self.drawables[idx] = outline,
            None => self.drawables.push(outline),
        }
    }

    // =============================================================
    // Text editing
    // =============================================================

    #[must_use]
    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    /// Put a text drawable into edit mode, leaving any other one first.
    pub fn enter_text_editing(&mut self, id: &str) -> bool {
        if !self.ensure_mounted("enter_text_editing") {
            return false;
        }
        if !self.drawable(id).is_some_and(Drawable::is_text) {
            log::warn!("surface: {id} is not an editable text drawable");
            return false;
        }
        if self.editing.as_deref() == Some(id) {
            return true;
        }
        self.exit_text_editing();
        self.editing = Some(id.to_owned());
        self.events.push(SurfaceEvent::TextEditingEntered { id: id.to_owned() });
        true
    }

    pub fn exit_text_editing(&mut self) -> bool {
        let Some(id) = self.editing.take() else {
            return false;
        };
        self.events.push(SurfaceEvent::TextEditingExited { id });
        true
    }

    // =============================================================
    // Events
    // =============================================================

    /// Take every event emitted since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<SurfaceEvent> {
        std::mem::take(&mut self.events)
    }
}

fn push_flattened(out: &mut Vec<Drawable>, objects: &[SceneObject]) {
    for obj in objects {
        out.push(Drawable::from_object(obj));
        push_flattened(out, &obj.children);
    }
}
