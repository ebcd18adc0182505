//! Viewport math: pan/zoom state and screen/scene coordinate conversion.
//!
//! The viewport is the affine transform `scene * zoom + pan = screen`, where
//! `pan` is measured in screen pixels. All zoom changes go through
//! [`Camera::zoom_at`], which clamps first and then solves for the pan that
//! keeps the anchor point visually fixed.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_ZOOM, MIN_ZOOM};

/// A point in either screen or scene space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - other`.
    #[must_use]
    pub fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

/// Clamp a requested zoom factor into `[MIN_ZOOM, MAX_ZOOM]`.
#[must_use]
pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() {
        return 1.0;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Camera state for pan/zoom on the infinite canvas.
///
/// `pan_x` / `pan_y` are in CSS pixels.
/// `zoom` is a scale factor (1.0 = no zoom).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, zoom: 1.0 }
    }
}

impl Camera {
    /// Convert a screen-space point (CSS pixels) to scene coordinates.
    #[must_use]
    pub fn screen_to_scene(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.pan_x) / self.zoom,
            y: (screen.y - self.pan_y) / self.zoom,
        }
    }

    /// Convert a scene-space point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn scene_to_screen(&self, scene: Point) -> Point {
        Point {
            x: scene.x * self.zoom + self.pan_x,
            y: scene.y * self.zoom + self.pan_y,
        }
    }

    /// The pan offset as a point.
    #[must_use]
    pub fn pan(&self) -> Point {
        Point::new(self.pan_x, self.pan_y)
    }

    /// Multiply the zoom by `factor` around the screen-space `pointer`.
    ///
    /// The result is clamped before the pan is recomputed, so the scene point
    /// under `pointer` stays put even when the clamp kicks in.
    #[must_use]
    pub fn zoom_at(&self, pointer: Point, factor: f64) -> Camera {
        self.zoom_to(pointer, self.zoom * factor)
    }

    /// Set an absolute zoom value around the screen-space `pointer`.
    #[must_use]
    pub fn zoom_to(&self, pointer: Point, zoom: f64) -> Camera {
        let next = clamp_zoom(zoom);
        let anchor = self.screen_to_scene(pointer);
        Camera {
            pan_x: pointer.x - anchor.x * next,
            pan_y: pointer.y - anchor.y * next,
            zoom: next,
        }
    }

    /// Translate the pan offset by a screen-space delta.
    #[must_use]
    pub fn pan_by(&self, dx: f64, dy: f64) -> Camera {
        Camera { pan_x: self.pan_x + dx, pan_y: self.pan_y + dy, zoom: self.zoom }
    }

    /// Zoom 1, pan at the origin.
    #[must_use]
    pub fn reset() -> Camera {
        Camera::default()
    }
}
