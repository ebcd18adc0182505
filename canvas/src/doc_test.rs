#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;

fn rect(id: &str) -> SceneObject {
    SceneObject::rectangle(id.into(), 10.0, 20.0, 100.0, 80.0)
}

// =============================================================
// ObjectKind serde
// =============================================================

#[test]
fn rectangle_serializes_with_rect_tag() {
    let value = serde_json::to_value(rect("a")).unwrap();
    assert_eq!(value["type"], "rect");
    assert_eq!(value["fill"], "#D9D9D9");
    assert_eq!(value["name"], "Rectangle");
    assert!(value.get("children").is_none());
    assert!(value.get("borderRadius").is_none());
}

#[test]
fn text_serializes_with_itext_tag() {
    let obj = SceneObject::text("t".into(), 0.0, 0.0);
    let value = serde_json::to_value(obj).unwrap();
    assert_eq!(value["type"], "i-text");
    assert_eq!(value["fontSize"], 12.0);
    assert_eq!(value["fill"], "#000");
    assert_eq!(value["textAlign"], "left");
    assert_eq!(value["opacity"], 1.0);
}

#[test]
fn text_alias_tag_is_accepted() {
    let obj: SceneObject = serde_json::from_value(json!({
        "id": "t1", "type": "text", "text": "hello", "left": 1, "top": 2
    }))
    .unwrap();
    assert_eq!(obj.object_type(), ObjectType::Text);
    let ObjectKind::Text(style) = &obj.kind else { panic!("expected text") };
    assert_eq!(style.text, "hello");
    assert_eq!(style.font_family, "Inter");
}

#[test]
fn image_roundtrip_keeps_clip_path() {
    let obj = SceneObject::image("i".into(), "cat.png", "https://x/cat.png", 0.0, 0.0, 40.0, 30.0);
    let json = serde_json::to_string(&obj).unwrap();
    assert!(json.contains("\"clipPath\""));
    let back: SceneObject = serde_json::from_str(&json).unwrap();
    assert_eq!(back, obj);
}

#[test]
fn object_type_serializes_lowercase() {
    assert_eq!(serde_json::to_value(ObjectType::Rectangle).unwrap(), "rectangle");
    assert_eq!(serde_json::to_value(ObjectType::Image).unwrap(), "image");
}

// =============================================================
// Lenient loading
// =============================================================

#[test]
fn missing_geometry_defaults_to_zero() {
    let obj: SceneObject = serde_json::from_value(json!({ "id": "r", "type": "rect" })).unwrap();
    assert_eq!((obj.left, obj.top, obj.width, obj.height), (0.0, 0.0, 0.0, 0.0));
    assert_eq!(obj.opacity, 1.0);
}

#[test]
fn non_numeric_geometry_is_treated_as_missing() {
    let obj: SceneObject =
        serde_json::from_value(json!({ "id": "r", "type": "rect", "width": "auto", "height": null })).unwrap();
    assert_eq!(obj.width, 0.0);
    assert_eq!(obj.height, 0.0);
}

#[test]
fn image_without_clip_path_loads() {
    let obj: SceneObject =
        serde_json::from_value(json!({ "id": "i", "type": "image", "src": "a.png", "width": 5, "height": 6 })).unwrap();
    let ObjectKind::Image(image) = &obj.kind else { panic!("expected image") };
    assert!(image.clip_path.is_none());
}

#[test]
fn page_skips_unknown_object_types() {
    let page: Page = serde_json::from_value(json!({
        "id": "p",
        "name": "Page 1",
        "objects": [
            { "id": "a", "type": "rect" },
            { "id": "b", "type": "ellipse" },
            { "id": "c", "type": "i-text", "text": "x" }
        ]
    }))
    .unwrap();
    let ids: Vec<_> = page.objects.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c"]);
}

#[test]
fn page_defaults_background_and_zoom() {
    let page: Page = serde_json::from_value(json!({ "id": "p" })).unwrap();
    assert_eq!(page.background_color, BackgroundColor::default());
    assert_eq!(page.zoom, PageZoom::default());
    assert!(page.objects.is_empty());
}

#[test]
fn page_zoom_camera_reclamps_value() {
    let zoom = PageZoom { value: 50.0, pointer: Point::default(), delta: Point::new(3.0, 4.0) };
    let cam = zoom.camera();
    assert_eq!(cam.zoom, crate::consts::MAX_ZOOM);
    assert_eq!((cam.pan_x, cam.pan_y), (3.0, 4.0));
}

// =============================================================
// Page tree queries
// =============================================================

fn nested_page() -> Page {
    let mut page = Page::new("Page 1");
    let mut parent = rect("parent");
    parent.children.push(rect("child"));
    page.objects.push(parent);
    page.objects.push(rect("sibling"));
    page
}

#[test]
fn find_searches_children() {
    let page = nested_page();
    assert!(page.find("child").is_some());
    assert!(page.find("nope").is_none());
}

#[test]
fn remove_nested_child() {
    let mut page = nested_page();
    let removed = page.remove("child").unwrap();
    assert_eq!(removed.id, "child");
    assert!(page.find("child").is_none());
    assert!(page.find("parent").is_some());
}

#[test]
fn object_ids_are_depth_first() {
    assert_eq!(nested_page().object_ids(), vec!["parent", "child", "sibling"]);
}

#[test]
fn children_roundtrip_through_json() {
    let page = nested_page();
    let back: Page = serde_json::from_str(&serde_json::to_string(&page).unwrap()).unwrap();
    assert_eq!(back, page);
}

// =============================================================
// Document
// =============================================================

#[test]
fn draft_has_single_default_page() {
    let doc = Document::draft(1_700_000_000_000);
    assert_eq!(doc.name, "New Draft");
    assert_eq!(doc.pages.len(), 1);
    assert_eq!(doc.pages[0].name, "Page 1");
    assert_eq!(doc.pages[0].background_color.hex, "#fafafa");
    assert_eq!(doc.pages[0].background_color.rgba, "RGBA(250, 250, 250, 1)");
    assert_eq!(doc.created_at, doc.updated_at);
}

#[test]
fn document_uses_camel_case_timestamps() {
    let value = serde_json::to_value(Document::draft(5)).unwrap();
    assert_eq!(value["createdAt"], 5);
    assert_eq!(value["updatedAt"], 5);
    assert_eq!(value["pages"][0]["backgroundColor"]["alpha"], 1.0);
}

// =============================================================
// Patches
// =============================================================

#[test]
fn apply_position_patch() {
    let mut obj = rect("a");
    assert!(obj.apply_patch(&ObjectPatch::position(50.0, 60.0)));
    assert_eq!((obj.left, obj.top), (50.0, 60.0));
    assert_eq!(obj.width, 100.0);
}

#[test]
fn apply_identical_patch_reports_no_change() {
    let mut obj = rect("a");
    assert!(!obj.apply_patch(&ObjectPatch::position(10.0, 20.0)));
}

#[test]
fn opacity_is_clamped() {
    let mut obj = rect("a");
    obj.apply_patch(&ObjectPatch { opacity: Some(1.7), ..Default::default() });
    assert_eq!(obj.opacity, 1.0);
    obj.apply_patch(&ObjectPatch { opacity: Some(-0.2), ..Default::default() });
    assert_eq!(obj.opacity, 0.0);
}

#[test]
fn fill_applies_to_rectangle_and_text() {
    let mut r = rect("a");
    r.apply_patch(&ObjectPatch { fill: Some("#ff0000".into()), ..Default::default() });
    assert_eq!(r.kind, ObjectKind::Rectangle { fill: "#ff0000".into() });

    let mut t = SceneObject::text("t".into(), 0.0, 0.0);
    t.apply_patch(&ObjectPatch { fill: Some("#00ff00".into()), ..Default::default() });
    let ObjectKind::Text(style) = &t.kind else { panic!("expected text") };
    assert_eq!(style.fill, "#00ff00");
}

#[test]
fn text_fields_ignored_on_rectangle() {
    let mut r = rect("a");
    assert!(!r.apply_patch(&ObjectPatch { text: Some("x".into()), font_size: Some(30.0), ..Default::default() }));
}

#[test]
fn text_style_patch_leaves_geometry_alone() {
    let mut t = SceneObject::text("t".into(), 0.0, 0.0);
    t.apply_patch(&ObjectPatch { text: Some("hello".into()), ..Default::default() });
    let (width, height) = (t.width, t.height);
    assert!(t.apply_patch(&ObjectPatch { font_size: Some(24.0), ..Default::default() }));
    assert_eq!((t.width, t.height), (width, height));
    let ObjectKind::Text(style) = &t.kind else { panic!("expected text") };
    assert_eq!(style.font_size, 24.0);
}

#[test]
fn resizes_text_only_for_layout_fields() {
    assert!(ObjectPatch { font_size: Some(2.0), ..Default::default() }.resizes_text());
    assert!(ObjectPatch { text: Some("x".into()), ..Default::default() }.resizes_text());
    assert!(!ObjectPatch { fill: Some("#000".into()), ..Default::default() }.resizes_text());
    assert!(!ObjectPatch::position(1.0, 2.0).resizes_text());
}

#[test]
fn image_resize_recomputes_clip() {
    let mut img = SceneObject::image("i".into(), "a", "a.png", 0.0, 0.0, 40.0, 30.0);
    img.apply_patch(&ObjectPatch { width: Some(80.0), ..Default::default() });
    let ObjectKind::Image(image) = &img.kind else { panic!("expected image") };
    assert_eq!(image.clip_path, Some(ClipRect { width: 80.0, height: 30.0, radius: 0.0 }));
}

#[test]
fn corner_radius_updates_image_clip() {
    let mut img = SceneObject::image("i".into(), "a", "a.png", 0.0, 0.0, 40.0, 30.0);
    img.apply_patch(&ObjectPatch::corner_radius(6.0));
    assert_eq!(img.corner_radius(), 6.0);
    let ObjectKind::Image(image) = &img.kind else { panic!("expected image") };
    assert_eq!(image.clip_path.map(|c| c.radius), Some(6.0));
}

#[test]
fn patch_serializes_only_present_fields() {
    let value = serde_json::to_value(ObjectPatch::position(1.0, 2.0)).unwrap();
    assert_eq!(value, json!({ "left": 1.0, "top": 2.0 }));
    assert!(ObjectPatch::default().is_empty());
    assert!(!ObjectPatch::position(0.0, 0.0).is_empty());
}

// =============================================================
// Misc
// =============================================================

#[test]
fn display_name_falls_back_by_type() {
    let mut r = rect("a");
    r.name = None;
    assert_eq!(r.display_name(), "Rectangle");
    let mut t = SceneObject::text("t".into(), 0.0, 0.0);
    assert_eq!(t.display_name(), "Text");
    t.apply_patch(&ObjectPatch { text: Some("  Title ".into()), ..Default::default() });
    assert_eq!(t.display_name(), "Title");
}

#[test]
fn font_weight_scale() {
    assert_eq!(FontWeight::Semibold.numeric(), 600);
    assert_eq!(FontWeight::from_numeric(300), Some(FontWeight::Light));
    assert_eq!(FontWeight::from_numeric(450), None);
    assert_eq!(FontWeight::from_name("BOLD"), Some(FontWeight::Bold));
    assert_eq!(FontWeight::Medium.name(), "medium");
}

#[test]
fn border_radius_uniform_detection() {
    assert_eq!(BorderRadius::uniform(4.0).as_uniform(), Some(4.0));
    let mixed = BorderRadius { r: 1.0, l: 2.0, t: 1.0, b: 1.0 };
    assert_eq!(mixed.as_uniform(), None);
    assert_eq!(mixed.max(), 2.0);
}

#[test]
fn new_object_ids_are_unique() {
    assert_ne!(new_object_id(), new_object_id());
}
