//! Hit-testing against surface drawables.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::Point;
use crate::doc::ObjectId;
use crate::surface::Drawable;

/// Axis-aligned rectangle in scene space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    #[must_use]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// The rectangle spanned by two opposite corners, in either order.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self { left: a.x.min(b.x), top: a.y.min(b.y), width: (a.x - b.x).abs(), height: (a.y - b.y).abs() }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Edge-inclusive containment.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right() && p.y >= self.top && p.y <= self.bottom()
    }

    /// Edge-inclusive overlap test.
    #[must_use]
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.left <= other.right() && other.left <= self.right() && self.top <= other.bottom() && other.top <= self.bottom()
    }
}

/// The topmost selectable drawable under `p`, if any.
#[must_use]
pub fn topmost_at(drawables: &[Drawable], p: Point) -> Option<&Drawable> {
    drawables.iter().rev().find(|d| d.selectable && d.bounds().contains(p))
}

/// Ids of every selectable drawable overlapping `area`, in paint order.
#[must_use]
pub fn intersecting(drawables: &[Drawable], area: &Bounds) -> Vec<ObjectId> {
    drawables
        .iter()
        .filter(|d| d.selectable && d.bounds().intersects(area))
        .map(|d| d.id.clone())
        .collect()
}
