//! Document model: pages, scene objects, sparse patches, and their wire format.
//!
//! This module defines what a design document *is* (`Document`, `Page`,
//! `SceneObject`, `ObjectKind`) and how it is edited incrementally
//! (`ObjectPatch`). The same types travel over the wire to the document
//! service, so every field has an explicit serde name matching the persisted
//! JSON (`backgroundColor`, `fontSize`, `clipPath`, ...).
//!
//! Loading is lenient: a missing geometry field defaults to zero, a
//! non-numeric one (e.g. `"auto"`) is treated as missing, and an object whose
//! type tag is unknown is skipped with a warning instead of failing the page.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::camera::{Camera, Point, clamp_zoom};
use crate::consts::{
    DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE, DEFAULT_LINE_HEIGHT, DEFAULT_RECT_FILL, DEFAULT_TEXT_FILL,
    GLYPH_WIDTH_RATIO,
};

/// Stable identifier of a scene object, unique within a page.
pub type ObjectId = String;

/// Generate a fresh client-side object id.
#[must_use]
pub fn new_object_id() -> ObjectId {
    Uuid::new_v4().to_string()
}

// =============================================================
// Page
// =============================================================

/// Page background as picked in the page inspector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundColor {
    /// `#rrggbb` form.
    pub hex: String,
    /// CSS `rgba(...)` form, alpha included.
    pub rgba: String,
    /// Alpha in `[0, 1]`.
    pub alpha: f64,
}

impl Default for BackgroundColor {
    fn default() -> Self {
        Self { hex: "#fafafa".into(), rgba: "RGBA(250, 250, 250, 1)".into(), alpha: 1.0 }
    }
}

/// Persisted viewport of a page.
///
/// `delta` is the absolute pan offset; `pointer` is the last zoom anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageZoom {
    #[serde(default = "default_one")]
    pub value: f64,
    #[serde(default)]
    pub pointer: Point,
    #[serde(default)]
    pub delta: Point,
}

impl Default for PageZoom {
    fn default() -> Self {
        Self { value: 1.0, pointer: Point::default(), delta: Point::default() }
    }
}

impl PageZoom {
    /// The camera this zoom state describes. The stored value is re-clamped.
    #[must_use]
    pub fn camera(&self) -> Camera {
        Camera { pan_x: self.delta.x, pan_y: self.delta.y, zoom: clamp_zoom(self.value) }
    }
}

/// One page of a document. `objects` is in paint order: later entries are drawn on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub background_color: BackgroundColor,
    #[serde(default)]
    pub zoom: PageZoom,
    #[serde(default, deserialize_with = "lenient_objects")]
    pub objects: Vec<SceneObject>,
}

impl Page {
    /// An empty page with the default background and zoom.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_owned(),
            background_color: BackgroundColor::default(),
            zoom: PageZoom::default(),
            objects: Vec::new(),
        }
    }

    /// Find an object by id, searching nested children too.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&SceneObject> {
        find_in(&self.objects, id)
    }

    /// Mutable variant of [`Page::find`].
    pub fn find_mut(&mut self, id: &str) -> Option<&mut SceneObject> {
        find_in_mut(&mut self.objects, id)
    }

    /// Remove an object by id from wherever it sits in the tree.
    pub fn remove(&mut self, id: &str) -> Option<SceneObject> {
        remove_in(&mut self.objects, id)
    }

    /// Ids of every object on the page, depth-first, in paint order.
    #[must_use]
    pub fn object_ids(&self) -> Vec<ObjectId> {
        let mut out = Vec::new();
        collect_ids(&self.objects, &mut out);
        out
    }
}

fn find_in<'a>(objects: &'a [SceneObject], id: &str) -> Option<&'a SceneObject> {
    for obj in objects {
        if obj.id == id {
            return Some(obj);
        }
        if let Some(found) = find_in(&obj.children, id) {
            return Some(found);
        }
    }
    None
}

fn find_in_mut<'a>(objects: &'a mut [SceneObject], id: &str) -> Option<&'a mut SceneObject> {
    for obj in objects {
        if obj.id == id {
            return Some(obj);
        }
        if let Some(found) = find_in_mut(&mut obj.children, id) {
            return Some(found);
        }
    }
    None
}

fn remove_in(objects: &mut Vec<SceneObject>, id: &str) -> Option<SceneObject> {
    if let Some(idx) = objects.iter().position(|o| o.id == id) {
        return Some(objects.remove(idx));
    }
    objects.iter_mut().find_map(|o| remove_in(&mut o.children, id))
}

fn collect_ids(objects: &[SceneObject], out: &mut Vec<ObjectId>) {
    for obj in objects {
        out.push(obj.id.clone());
        collect_ids(&obj.children, out);
    }
}

// =============================================================
// Document
// =============================================================

/// A whole design document as exchanged with the document service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl Document {
    /// The payload of a brand-new draft: one empty "Page 1".
    #[must_use]
    pub fn draft(now_ms: i64) -> Self {
        Self {
            id: String::new(),
            name: "New Draft".into(),
            pages: vec![Page::new("Page 1")],
            created_at: now_ms,
            updated_at: now_ms,
        }
    }
}

// =============================================================
// Scene objects
// =============================================================

/// Per-corner radii.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BorderRadius {
    #[serde(default)]
    pub r: f64,
    #[serde(default)]
    pub l: f64,
    #[serde(default)]
    pub t: f64,
    #[serde(default)]
    pub b: f64,
}

impl BorderRadius {
    /// Same radius on all four corners.
    #[must_use]
    pub fn uniform(radius: f64) -> Self {
        let radius = radius.max(0.0);
        Self { r: radius, l: radius, t: radius, b: radius }
    }

    /// The largest of the four radii.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.r.max(self.l).max(self.t).max(self.b)
    }

    /// `Some(radius)` when all four corners agree.
    #[must_use]
    pub fn as_uniform(&self) -> Option<f64> {
        #[allow(clippy::float_cmp)]
        let same = self.r == self.l && self.l == self.t && self.t == self.b;
        same.then_some(self.r)
    }
}

/// Clip rectangle of an image, centered on the image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipRect {
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub radius: f64,
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    /// CSS / Canvas2D name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Justify => "justify",
        }
    }
}

/// Named font weights offered by the typography inspector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Light,
    Regular,
    Medium,
    Semibold,
    Bold,
}

impl FontWeight {
    /// Numeric CSS weight.
    #[must_use]
    pub fn numeric(self) -> u16 {
        match self {
            Self::Light => 300,
            Self::Regular => 400,
            Self::Medium => 500,
            Self::Semibold => 600,
            Self::Bold => 700,
        }
    }

    /// Inverse of [`FontWeight::numeric`]; `None` for weights off the scale.
    #[must_use]
    pub fn from_numeric(weight: u16) -> Option<Self> {
        match weight {
            300 => Some(Self::Light),
            400 => Some(Self::Regular),
            500 => Some(Self::Medium),
            600 => Some(Self::Semibold),
            700 => Some(Self::Bold),
            _ => None,
        }
    }

    /// Lowercase display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Regular => "regular",
            Self::Medium => "medium",
            Self::Semibold => "semibold",
            Self::Bold => "bold",
        }
    }

    /// Parse a display name, case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "regular" => Some(Self::Regular),
            "medium" => Some(Self::Medium),
            "semibold" => Some(Self::Semibold),
            "bold" => Some(Self::Bold),
            _ => None,
        }
    }
}

/// Content and typography of a text object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_size", deserialize_with = "lenient_font_size")]
    pub font_size: f64,
    #[serde(default = "default_font_weight")]
    pub font_weight: u16,
    #[serde(default = "default_line_height")]
    pub line_height: f64,
    /// Tracking in thousandths of an em.
    #[serde(default)]
    pub char_spacing: f64,
    #[serde(default)]
    pub text_align: TextAlign,
    #[serde(default = "default_text_fill")]
    pub fill: String,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_family: default_font_family(),
            font_size: DEFAULT_FONT_SIZE,
            font_weight: default_font_weight(),
            line_height: DEFAULT_LINE_HEIGHT,
            char_spacing: 0.0,
            text_align: TextAlign::Left,
            fill: default_text_fill(),
        }
    }
}

impl TextStyle {
    /// Approximate box size of the laid-out text.
    ///
    /// Glyph advance is estimated from the font size; the renderer measures
    /// exactly, this is only used for geometry kept in the store.
    #[must_use]
    pub fn estimate_size(&self) -> (f64, f64) {
        let longest = self.text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
        let line_count = self.text.lines().count().max(1);
        #[allow(clippy::cast_precision_loss)]
        let (longest, line_count) = (longest as f64, line_count as f64);
        let advance = self.font_size * GLYPH_WIDTH_RATIO + self.font_size * self.char_spacing / 1000.0;
        let width = (longest * advance).max(1.0);
        let height = line_count * self.font_size * self.line_height;
        (width, height)
    }

    /// CSS font shorthand for Canvas2D.
    #[must_use]
    pub fn css_font(&self) -> String {
        format!("{} {}px {}", self.font_weight, self.font_size, self.font_family)
    }
}

/// Source and clipping of an image object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSource {
    #[serde(default)]
    pub src: String,
    /// Absent in older documents; derived from the bitmap size on load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip_path: Option<ClipRect>,
}

/// Variant-specific payload of a scene object, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ObjectKind {
    #[serde(rename = "rect", alias = "rectangle")]
    Rectangle {
        #[serde(default = "default_rect_fill")]
        fill: String,
    },
    #[serde(rename = "i-text", alias = "text")]
    Text(TextStyle),
    #[serde(rename = "image")]
    Image(ImageSource),
}

/// Coarse object type, as carried in selection entries and layer listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Rectangle,
    Text,
    Image,
}

/// A drawable object on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneObject {
    pub id: ObjectId,
    /// Layer name shown in the layers panel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub left: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub top: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub width: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub height: f64,
    #[serde(default = "default_one")]
    pub opacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<BorderRadius>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "lenient_objects")]
    pub children: Vec<SceneObject>,
    #[serde(flatten)]
    pub kind: ObjectKind,
}

impl SceneObject {
    /// A rectangle with the default fill.
    #[must_use]
    pub fn rectangle(id: ObjectId, left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            id,
            name: Some("Rectangle".into()),
            left,
            top,
            width,
            height,
            opacity: 1.0,
            border_radius: None,
            children: Vec::new(),
            kind: ObjectKind::Rectangle { fill: default_rect_fill() },
        }
    }

    /// An empty text object with the default style, anchored at its top-left corner.
    #[must_use]
    pub fn text(id: ObjectId, left: f64, top: f64) -> Self {
        let style = TextStyle::default();
        let (width, height) = style.estimate_size();
        Self {
            id,
            name: None,
            left,
            top,
            width,
            height,
            opacity: 1.0,
            border_radius: None,
            children: Vec::new(),
            kind: ObjectKind::Text(style),
        }
    }

    /// An image with a clip rectangle matching its natural size.
    #[must_use]
    pub fn image(id: ObjectId, name: &str, src: &str, left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            id,
            name: Some(name.to_owned()),
            left,
            top,
            width,
            height,
            opacity: 1.0,
            border_radius: None,
            children: Vec::new(),
            kind: ObjectKind::Image(ImageSource {
                src: src.to_owned(),
                clip_path: Some(ClipRect { width, height, radius: 0.0 }),
            }),
        }
    }

    /// The coarse type of this object.
    #[must_use]
    pub fn object_type(&self) -> ObjectType {
        match self.kind {
            ObjectKind::Rectangle { .. } => ObjectType::Rectangle,
            ObjectKind::Text(_) => ObjectType::Text,
            ObjectKind::Image(_) => ObjectType::Image,
        }
    }

    /// Name displayed in the layers panel.
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_owned();
        }
        match &self.kind {
            ObjectKind::Rectangle { .. } => "Rectangle".into(),
            ObjectKind::Text(style) if !style.text.trim().is_empty() => style.text.trim().to_owned(),
            ObjectKind::Text(_) => "Text".into(),
            ObjectKind::Image(_) => "Image".into(),
        }
    }

    /// Corner radius shown by the appearance inspector.
    #[must_use]
    pub fn corner_radius(&self) -> f64 {
        self.border_radius.map_or(0.0, |r| r.max())
    }

    /// Merge a patch into this object. Returns `true` if any field changed.
    ///
    /// A pure merge: `id`, the type tag and every field the patch leaves out
    /// are untouched (an image's clip follows its own size). Variant-specific
    /// fields that do not apply to this object's variant are ignored.
    pub fn apply_patch(&mut self, patch: &ObjectPatch) -> bool {
        let before = self.clone();

        if let Some(v) = patch.left {
            self.left = v;
        }
        if let Some(v) = patch.top {
            self.top = v;
        }
        if let Some(v) = patch.width {
            self.width = v.max(0.0);
        }
        if let Some(v) = patch.height {
            self.height = v.max(0.0);
        }
        if let Some(v) = patch.opacity {
            self.opacity = v.clamp(0.0, 1.0);
        }
        if let Some(r) = patch.border_radius {
            self.border_radius = Some(r);
        }
        if let Some(ref name) = patch.name {
            self.name = Some(name.clone());
        }

        match &mut self.kind {
            ObjectKind::Rectangle { fill } => {
                if let Some(ref v) = patch.fill {
                    fill.clone_from(v);
                }
            }
            ObjectKind::Text(style) => apply_text_patch(style, patch),
            ObjectKind::Image(image) => {
                if let Some(ref v) = patch.src {
                    image.src.clone_from(v);
                }
                let radius = self.border_radius.map_or(0.0, |r| r.max());
                if patch.width.is_some() || patch.height.is_some() || patch.border_radius.is_some() {
                    image.clip_path = Some(ClipRect { width: self.width, height: self.height, radius });
                }
            }
        }

        *self != before
    }
}

fn apply_text_patch(style: &mut TextStyle, patch: &ObjectPatch) {
    if let Some(ref v) = patch.text {
        style.text.clone_from(v);
    }
    if let Some(ref v) = patch.font_family {
        style.font_family.clone_from(v);
    }
    if let Some(v) = patch.font_size {
        style.font_size = v.max(1.0);
    }
    if let Some(v) = patch.font_weight {
        style.font_weight = v;
    }
    if let Some(v) = patch.line_height {
        style.line_height = v;
    }
    if let Some(v) = patch.char_spacing {
        style.char_spacing = v;
    }
    if let Some(v) = patch.text_align {
        style.text_align = v;
    }
    if let Some(ref v) = patch.fill {
        style.fill.clone_from(v);
    }
}

// =============================================================
// Patches
// =============================================================

/// Sparse update for a scene object. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<BorderRadius>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Rectangle or text fill.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub char_spacing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    /// Image source URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
}

impl ObjectPatch {
    /// Move to an absolute position.
    #[must_use]
    pub fn position(left: f64, top: f64) -> Self {
        Self { left: Some(left), top: Some(top), ..Default::default() }
    }

    /// Set position and size together.
    #[must_use]
    pub fn geometry(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left: Some(left), top: Some(top), width: Some(width), height: Some(height), ..Default::default() }
    }

    /// Same radius on every corner.
    #[must_use]
    pub fn corner_radius(radius: f64) -> Self {
        Self { border_radius: Some(BorderRadius::uniform(radius)), ..Default::default() }
    }

    /// Whether the patch changes anything that affects laid-out text size.
    #[must_use]
    pub fn resizes_text(&self) -> bool {
        self.text.is_some()
            || self.font_family.is_some()
            || self.font_size.is_some()
            || self.line_height.is_some()
            || self.char_spacing.is_some()
    }

    /// Whether the patch carries no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// =============================================================
// Lenient deserialization
// =============================================================

fn default_one() -> f64 {
    1.0
}

fn default_rect_fill() -> String {
    DEFAULT_RECT_FILL.to_owned()
}

fn default_text_fill() -> String {
    DEFAULT_TEXT_FILL.to_owned()
}

fn default_font_family() -> String {
    DEFAULT_FONT_FAMILY.to_owned()
}

fn default_font_size() -> f64 {
    DEFAULT_FONT_SIZE
}

fn default_font_weight() -> u16 {
    FontWeight::Regular.numeric()
}

fn default_line_height() -> f64 {
    DEFAULT_LINE_HEIGHT
}

/// Accept any JSON value; non-numbers become `0.0`.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64().unwrap_or_default())
}

fn lenient_font_size<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|v| *v > 0.0).unwrap_or(DEFAULT_FONT_SIZE))
}

/// Deserialize an object list, skipping entries that cannot be understood.
fn lenient_objects<'de, D>(deserializer: D) -> Result<Vec<SceneObject>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    let mut objects = Vec::with_capacity(raw.len());
    for value in raw {
        match serde_json::from_value::<SceneObject>(value) {
            Ok(obj) => objects.push(obj),
            Err(e) => log::warn!("skipping unreadable scene object: {e}"),
        }
    }
    Ok(objects)
}
