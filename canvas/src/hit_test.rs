#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::SceneObject;

fn drawable(id: &str, left: f64, top: f64, w: f64, h: f64) -> Drawable {
    Drawable::from_object(&SceneObject::rectangle(id.into(), left, top, w, h))
}

// =============================================================
// Bounds
// =============================================================

#[test]
fn from_corners_normalises() {
    let b = Bounds::from_corners(Point::new(10.0, 40.0), Point::new(0.0, 20.0));
    assert_eq!(b, Bounds::new(0.0, 20.0, 10.0, 20.0));
    assert_eq!(b.right(), 10.0);
    assert_eq!(b.bottom(), 40.0);
}

#[test]
fn contains_includes_edges() {
    let b = Bounds::new(0.0, 0.0, 10.0, 10.0);
    assert!(b.contains(Point::new(0.0, 0.0)));
    assert!(b.contains(Point::new(10.0, 10.0)));
    assert!(!b.contains(Point::new(10.5, 5.0)));
}

#[test]
fn intersects_overlapping_and_touching() {
    let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
    assert!(a.intersects(&Bounds::new(5.0, 5.0, 10.0, 10.0)));
    assert!(a.intersects(&Bounds::new(10.0, 0.0, 5.0, 5.0)));
    assert!(!a.intersects(&Bounds::new(11.0, 0.0, 5.0, 5.0)));
    assert!(a.intersects(&Bounds::new(2.0, 2.0, 1.0, 1.0)));
}

// =============================================================
// Drawable queries
// =============================================================

#[test]
fn topmost_prefers_later_drawables() {
    let list = vec![drawable("a", 0.0, 0.0, 50.0, 50.0), drawable("b", 25.0, 25.0, 50.0, 50.0)];
    assert_eq!(topmost_at(&list, Point::new(30.0, 30.0)).map(|d| d.id.as_str()), Some("b"));
    assert_eq!(topmost_at(&list, Point::new(5.0, 5.0)).map(|d| d.id.as_str()), Some("a"));
    assert!(topmost_at(&list, Point::new(100.0, 100.0)).is_none());
}

#[test]
fn unselectable_drawables_are_skipped() {
    let mut top = drawable("overlay", 0.0, 0.0, 50.0, 50.0);
    top.selectable = false;
    let list = vec![drawable("a", 0.0, 0.0, 50.0, 50.0), top];
    assert_eq!(topmost_at(&list, Point::new(1.0, 1.0)).map(|d| d.id.as_str()), Some("a"));
    assert_eq!(intersecting(&list, &Bounds::new(0.0, 0.0, 5.0, 5.0)), vec!["a".to_string()]);
}

#[test]
fn intersecting_returns_paint_order() {
    let list = vec![
        drawable("a", 0.0, 0.0, 10.0, 10.0),
        drawable("far", 500.0, 500.0, 10.0, 10.0),
        drawable("b", 8.0, 8.0, 10.0, 10.0),
    ];
    let hits = intersecting(&list, &Bounds::from_corners(Point::new(-5.0, -5.0), Point::new(9.0, 9.0)));
    assert_eq!(hits, vec!["a".to_string(), "b".to_string()]);
}
