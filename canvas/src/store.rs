//! Scene store: the single source of truth for pages, selection, hover, tool
//! and viewport state.
//!
//! DESIGN
//! ======
//! All mutations are synchronous and immediately visible through the query
//! methods. Persistence is decoupled through a subscriber list: mutations that
//! change document content arm a trailing-edge [`Debouncer`], and
//! [`SceneStore::flush_due`] hands the *current* page set to every listener
//! once the quiet period has elapsed. Because listeners read state at fire
//! time, a save always reflects the last mutation of a burst.
//!
//! Objects are kept in paint order (later = on top). New objects are appended,
//! so the most recently created object is topmost. The layers panel order is
//! the reverse, see [`SceneStore::layers`].
//!
//! Selection and hover are mutually exclusive per object: selecting an object
//! clears it as the hover target, and hovering a selected object is ignored.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use crate::camera::{Camera, Point, clamp_zoom};
use crate::debounce::{Clock, Debouncer, platform_clock};
use crate::doc::{BackgroundColor, ObjectId, ObjectPatch, ObjectType, Page, SceneObject};
use crate::input::Tool;

/// An `{id, type}` reference to an object, as held in the selection set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerRef {
    pub id: ObjectId,
    pub object_type: ObjectType,
}

impl LayerRef {
    #[must_use]
    pub fn of(obj: &SceneObject) -> Self {
        Self { id: obj.id.clone(), object_type: obj.object_type() }
    }
}

/// An image chosen in the picker, waiting to be placed with the image tool.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingImage {
    pub name: String,
    pub url: String,
    /// Natural bitmap width.
    pub width: f64,
    /// Natural bitmap height.
    pub height: f64,
}

/// Partial update of the current page's viewport.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewportPatch {
    pub value: Option<f64>,
    pub pointer: Option<Point>,
    pub delta: Option<Point>,
}

impl ViewportPatch {
    /// Patch carrying a full camera state.
    #[must_use]
    pub fn from_camera(camera: Camera, pointer: Option<Point>) -> Self {
        Self { value: Some(camera.zoom), pointer, delta: Some(camera.pan()) }
    }
}

/// One row of the layers panel.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerEntry {
    pub id: ObjectId,
    pub name: String,
    pub object_type: ObjectType,
    pub selected: bool,
    pub children: Vec<LayerEntry>,
}

/// An inspector field across a multi-selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uniform<T> {
    /// Every selected object has this value.
    Same(T),
    /// The selected objects disagree.
    Mixed,
}

/// Values shown by the layout and appearance inspectors.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSummary {
    pub count: usize,
    pub x: Uniform<f64>,
    pub y: Uniform<f64>,
    pub width: Uniform<f64>,
    pub height: Uniform<f64>,
    pub opacity: Uniform<f64>,
    pub corner_radius: Uniform<f64>,
}

/// Handle returned by [`SceneStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Change listener; receives the whole page set, never a diff.
pub type Listener = Box<dyn FnMut(&[Page])>;

/// In-memory state container for the editor.
pub struct SceneStore {
    pages: Vec<Page>,
    current_page: usize,
    selection: Vec<LayerRef>,
    hovered: Option<LayerRef>,
    tool: Tool,
    is_panning: bool,
    selected_image: Option<PendingImage>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    debounce: Debouncer,
    clock: Box<dyn Clock>,
}

impl SceneStore {
    /// A store with one empty page, using the platform clock.
    #[must_use]
    pub fn new(debounce_ms: f64) -> Self {
        Self::with_clock(debounce_ms, platform_clock())
    }

    /// A store driven by an explicit clock.
    #[must_use]
    pub fn with_clock(debounce_ms: f64, clock: Box<dyn Clock>) -> Self {
        Self {
            pages: vec![Page::new("Page 1")],
            current_page: 0,
            selection: Vec::new(),
            hovered: None,
            tool: Tool::Cursor,
            is_panning: false,
            selected_image: None,
            listeners: Vec::new(),
            next_subscription: 0,
            debounce: Debouncer::new(debounce_ms),
            clock,
        }
    }

    /// Current time from the store's clock, in epoch milliseconds.
    #[must_use]
    pub fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    // =============================================================
    // Pages
    // =============================================================

    #[must_use]
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    #[must_use]
    pub fn current_page(&self) -> Option<&Page> {
        self.pages.get(self.current_page)
    }

    fn current_page_mut(&mut self) -> Option<&mut Page> {
        self.pages.get_mut(self.current_page)
    }

    #[must_use]
    pub fn current_page_index(&self) -> usize {
        self.current_page
    }

    /// Objects of the current page in paint order.
    #[must_use]
    pub fn objects(&self) -> &[SceneObject] {
        self.current_page().map_or(&[], |p| p.objects.as_slice())
    }

    /// Switch the interactively edited page. Clears selection and hover.
    pub fn set_current_page(&mut self, index: usize) -> bool {
        if index >= self.pages.len() {
            log::warn!("set_current_page: no page at index {index}");
            return false;
        }
        self.current_page = index;
        self.selection.clear();
        self.hovered = None;
        true
    }

    /// Bulk-replace every page, as on document load.
    ///
    /// Hydration does not schedule a save. Selection and hover are dropped
    /// since they may reference objects that no longer exist.
    pub fn replace_pages(&mut self, pages: Vec<Page>) {
        self.pages = pages;
        self.current_page = 0;
        self.selection.clear();
        self.hovered = None;
    }

    pub fn set_current_page_background(&mut self, hex: &str, rgba: &str, alpha: f64) {
        let Some(page) = self.current_page_mut() else {
            log::warn!("set_current_page_background: no current page");
            return;
        };
        page.background_color = BackgroundColor { hex: hex.to_owned(), rgba: rgba.to_owned(), alpha: alpha.clamp(0.0, 1.0) };
        self.schedule_save();
    }

    // =============================================================
    // Objects
    // =============================================================

    #[must_use]
    pub fn object(&self, id: &str) -> Option<&SceneObject> {
        self.current_page()?.find(id)
    }

    /// Insert a new object on top of the current page.
    ///
    /// Returns `false` (and leaves the page untouched) if the id is already in use.
    pub fn add_object(&mut self, obj: SceneObject) -> bool {
        let Some(page) = self.current_page_mut() else {
            log::warn!("add_object: no current page");
            return false;
        };
        if page.find(&obj.id).is_some() {
            log::warn!("add_object: duplicate id {}", obj.id);
            return false;
        }
        page.objects.push(obj);
        self.schedule_save();
        true
    }

    /// Merge `patch` into the object with `id`, wherever it sits in the tree.
    ///
    /// Unknown ids are a logged no-op. A hit always re-arms the save timer.
    pub fn update_object(&mut self, id: &str, patch: &ObjectPatch) -> bool {
        let Some(obj) = self.current_page_mut().and_then(|p| p.find_mut(id)) else {
            log::warn!("update_object: unknown object {id}");
            return false;
        };
        obj.apply_patch(patch);
        self.schedule_save();
        true
    }

    /// Remove an object and forget it from selection and hover.
    pub fn remove_object(&mut self, id: &str) -> Option<SceneObject> {
        let Some(removed) = self.current_page_mut().and_then(|p| p.remove(id)) else {
            log::warn!("remove_object: unknown object {id}");
            return None;
        };
        self.forget(&removed);
        self.schedule_save();
        Some(removed)
    }

    fn forget(&mut self, removed: &SceneObject) {
        self.selection.retain(|s| s.id != removed.id);
        if self.hovered.as_ref().is_some_and(|h| h.id == removed.id) {
            self.hovered = None;
        }
        for child in &removed.children {
            self.forget(child);
        }
    }

    // =============================================================
    // Selection and hover
    // =============================================================

    #[must_use]
    pub fn selection(&self) -> &[LayerRef] {
        &self.selection
    }

    #[must_use]
    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.iter().any(|s| s.id == id)
    }

    /// The selected objects, in selection order.
    #[must_use]
    pub fn selected_objects(&self) -> Vec<&SceneObject> {
        self.selection.iter().filter_map(|s| self.object(&s.id)).collect()
    }

    /// Replace the selection. Unknown ids and duplicates are dropped.
    pub fn set_selected_layers(&mut self, layers: Vec<LayerRef>) {
        let mut next: Vec<LayerRef> = Vec::with_capacity(layers.len());
        for layer in layers {
            if self.object(&layer.id).is_none() {
                log::warn!("set_selected_layers: unknown object {}", layer.id);
                continue;
            }
            if !next.iter().any(|s| s.id == layer.id) {
                next.push(layer);
            }
        }
        self.selection = next;
        self.drop_hover_if_selected();
    }

    /// Remove `layer` from the selection if present, otherwise append it.
    pub fn toggle_selected_layer(&mut self, layer: LayerRef) {
        if let Some(idx) = self.selection.iter().position(|s| s.id == layer.id) {
            self.selection.remove(idx);
            return;
        }
        if self.object(&layer.id).is_none() {
            log::warn!("toggle_selected_layer: unknown object {}", layer.id);
            return;
        }
        self.selection.push(layer);
        self.drop_hover_if_selected();
    }

    pub fn unselect_layers(&mut self, ids: &[ObjectId]) {
        self.selection.retain(|s| !ids.contains(&s.id));
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    #[must_use]
    pub fn hovered(&self) -> Option<&LayerRef> {
        self.hovered.as_ref()
    }

    /// Set or clear the hover target. Returns `false` if the request was suppressed.
    pub fn set_hovered_layer(&mut self, layer: Option<LayerRef>) -> bool {
        match layer {
            None => {
                self.hovered = None;
                true
            }
            Some(layer) if self.is_selected(&layer.id) => false,
            Some(layer) if self.object(&layer.id).is_none() => {
                log::warn!("set_hovered_layer: unknown object {}", layer.id);
                false
            }
            Some(layer) => {
                self.hovered = Some(layer);
                true
            }
        }
    }

    fn drop_hover_if_selected(&mut self) {
        if let Some(ref h) = self.hovered
            && self.selection.iter().any(|s| s.id == h.id)
        {
            self.hovered = None;
        }
    }

    // =============================================================
    // Tool and viewport
    // =============================================================

    #[must_use]
    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn set_selected_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    #[must_use]
    pub fn is_panning(&self) -> bool {
        self.is_panning
    }

    pub fn set_is_panning(&mut self, panning: bool) {
        self.is_panning = panning;
    }

    #[must_use]
    pub fn selected_image(&self) -> Option<&PendingImage> {
        self.selected_image.as_ref()
    }

    pub fn set_selected_image(&mut self, image: Option<PendingImage>) {
        self.selected_image = image;
    }

    /// Camera for the current page's stored zoom state.
    #[must_use]
    pub fn viewport(&self) -> Camera {
        self.current_page().map_or_else(Camera::default, |p| p.zoom.camera())
    }

    /// Merge a viewport patch into the current page. The zoom value is clamped.
    pub fn set_zoom(&mut self, patch: ViewportPatch) {
        let Some(page) = self.current_page_mut() else {
            log::warn!("set_zoom: no current page");
            return;
        };
        if let Some(value) = patch.value {
            page.zoom.value = clamp_zoom(value);
        }
        if let Some(pointer) = patch.pointer {
            page.zoom.pointer = pointer;
        }
        if let Some(delta) = patch.delta {
            page.zoom.delta = delta;
        }
    }

    // =============================================================
    // Inspector queries
    // =============================================================

    /// Layer tree of the current page, topmost first.
    #[must_use]
    pub fn layers(&self) -> Vec<LayerEntry> {
        self.layer_entries(self.objects())
    }

    fn layer_entries(&self, objects: &[SceneObject]) -> Vec<LayerEntry> {
        objects
            .iter()
            .rev()
            .map(|obj| LayerEntry {
                id: obj.id.clone(),
                name: obj.display_name(),
                object_type: obj.object_type(),
                selected: self.is_selected(&obj.id),
                children: self.layer_entries(&obj.children),
            })
            .collect()
    }

    /// Inspector values for the current selection, `None` when nothing is selected.
    #[must_use]
    pub fn selection_summary(&self) -> Option<SelectionSummary> {
        let selected = self.selected_objects();
        if selected.is_empty() {
            return None;
        }
        Some(SelectionSummary {
            count: selected.len(),
            x: uniform(selected.iter().map(|o| o.left)),
            y: uniform(selected.iter().map(|o| o.top)),
            width: uniform(selected.iter().map(|o| o.width)),
            height: uniform(selected.iter().map(|o| o.height)),
            opacity: uniform(selected.iter().map(|o| o.opacity)),
            corner_radius: uniform(selected.iter().map(|o| o.corner_radius())),
        })
    }

    // =============================================================
    // Change notification
    // =============================================================

    /// Register a listener for debounced page-set notifications.
    pub fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    #[must_use]
    pub fn has_pending_save(&self) -> bool {
        self.debounce.is_pending()
    }

    /// Drop a pending notification without delivering it.
    pub fn cancel_pending(&mut self) {
        self.debounce.cancel();
    }

    /// Deliver the pending notification if its quiet period has elapsed.
    ///
    /// Returns `true` if listeners were notified.
    pub fn flush_due(&mut self) -> bool {
        let now = self.clock.now_ms();
        if !self.debounce.poll(now) {
            return false;
        }
        log::debug!("store: notifying {} listener(s)", self.listeners.len());
        for (_, listener) in &mut self.listeners {
            listener(&self.pages);
        }
        true
    }

    fn schedule_save(&mut self) {
        let now = self.clock.now_ms();
        self.debounce.trigger(now);
    }
}

fn uniform(mut values: impl Iterator<Item = f64>) -> Uniform<f64> {
    let Some(first) = values.next() else {
        return Uniform::Mixed;
    };
    if values.all(|v| (v - first).abs() < 1e-9) { Uniform::Same(first) } else { Uniform::Mixed }
}
