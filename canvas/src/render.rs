//! Rendering: draws the surface's drawables and overlays to a 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! It receives a read-only [`Frame`] and produces pixels; it does not mutate
//! any application state.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.
//! The top-level caller ([`crate::engine::Engine::render`]) handles the result.

use std::collections::HashMap;

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use crate::camera::Camera;
use crate::consts::{ACCENT_COLOR, MARQUEE_BORDER, MARQUEE_FILL};
use crate::doc::{BorderRadius, TextAlign, TextStyle};
use crate::engine::{ImagePreview, SizeReadout};
use crate::hit::Bounds;
use crate::surface::{Drawable, HandleStyle, Shape, Surface};

/// Placeholder fill for images that have not finished loading.
const IMAGE_PLACEHOLDER: &str = "#e5e7eb";

/// Everything needed to paint one frame.
pub struct Frame<'a> {
    pub surface: &'a Surface,
    /// Page background as a CSS color.
    pub background: Option<&'a str>,
    /// Text drawable currently in edit mode.
    pub editing: Option<&'a str>,
    pub marquee: Option<Bounds>,
    pub size_readout: Option<SizeReadout>,
    pub image_preview: Option<&'a ImagePreview>,
    /// CSS pixels.
    pub viewport_w: f64,
    /// CSS pixels.
    pub viewport_h: f64,
    pub dpr: f64,
}

/// Draw the full scene: background, drawables, selection chrome, overlays.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn draw(
    ctx: &CanvasRenderingContext2d,
    frame: &Frame<'_>,
    images: &HashMap<String, HtmlImageElement>,
) -> Result<(), JsValue> {
    let camera = frame.surface.camera();

    // Layer 1: clear, background, and scene transform.
    ctx.set_transform(frame.dpr, 0.0, 0.0, frame.dpr, 0.0, 0.0)?;
    ctx.clear_rect(0.0, 0.0, frame.viewport_w, frame.viewport_h);
    if let Some(bg) = frame.background {
        ctx.set_fill_style_str(bg);
        ctx.fill_rect(0.0, 0.0, frame.viewport_w, frame.viewport_h);
    }
    ctx.save();
    ctx.translate(camera.pan_x, camera.pan_y)?;
    ctx.scale(camera.zoom, camera.zoom)?;

    // Layer 2: drawables in paint order (bottom first).
    for d in frame.surface.drawables() {
        draw_drawable(ctx, d, images)?;
    }

    // Layer 3: selection chrome.
    let active = frame.surface.active();
    let show_handles = active.len() == 1;
    for id in active {
        if let Some(d) = frame.surface.drawable(id) {
            draw_selection(ctx, d, &camera, show_handles, frame.editing == Some(id.as_str()))?;
        }
    }

    if let Some(m) = frame.marquee {
        draw_marquee(ctx, m, camera.zoom);
    }
    ctx.restore();

    // Layer 4: screen-space overlays.
    if let Some(readout) = frame.size_readout {
        draw_size_readout(ctx, readout)?;
    }
    if let Some(preview) = frame.image_preview {
        draw_image_preview(ctx, preview, images)?;
    }
    Ok(())
}

// =============================================================
// Drawable dispatch
// =============================================================

fn draw_drawable(
    ctx: &CanvasRenderingContext2d,
    d: &Drawable,
    images: &HashMap<String, HtmlImageElement>,
) -> Result<(), JsValue> {
    ctx.save();
    ctx.set_global_alpha(d.opacity.clamp(0.0, 1.0));
    let result = match &d.shape {
        Shape::Rectangle { fill } => {
            rounded_rect_path(ctx, d.left, d.top, d.width, d.height, d.border_radius)?;
            ctx.set_fill_style_str(fill);
            ctx.fill();
            Ok(())
        }
        Shape::Text(style) => draw_text(ctx, d, style),
        Shape::Image { src, clip } => {
            // The clip rectangle is centered on the image.
            let cx = d.left + d.width / 2.0;
            let cy = d.top + d.height / 2.0;
            let radius = (clip.radius > 0.0).then(|| BorderRadius::uniform(clip.radius));
            rounded_rect_path(ctx, cx - clip.width / 2.0, cy - clip.height / 2.0, clip.width, clip.height, radius)?;
            ctx.clip();
            draw_bitmap(ctx, images.get(src), d.left, d.top, d.width, d.height)
        }
        Shape::Outline { stroke, stroke_width } => {
            ctx.set_stroke_style_str(stroke);
            ctx.set_line_width(*stroke_width);
            ctx.stroke_rect(d.left, d.top, d.width, d.height);
            Ok(())
        }
    };
    ctx.restore();
    result
}

fn draw_bitmap(
    ctx: &CanvasRenderingContext2d,
    img: Option<&HtmlImageElement>,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
) -> Result<(), JsValue> {
    match img {
        Some(img) if img.complete() && img.natural_width() > 0 => {
            ctx.draw_image_with_html_image_element_and_dw_and_dh(img, x, y, w, h)
        }
        _ => {
            ctx.set_fill_style_str(IMAGE_PLACEHOLDER);
            ctx.fill_rect(x, y, w, h);
            Ok(())
        }
    }
}

// =============================================================
// Text
// =============================================================

fn draw_text(ctx: &CanvasRenderingContext2d, d: &Drawable, style: &TextStyle) -> Result<(), JsValue> {
    if style.text.is_empty() {
        return Ok(());
    }
    ctx.set_fill_style_str(&style.fill);
    ctx.set_font(&style.css_font());
    ctx.set_text_baseline("top");

    let (align, x) = match style.text_align {
        TextAlign::Left | TextAlign::Justify => ("left", d.left),
        TextAlign::Center => ("center", d.left + d.width / 2.0),
        TextAlign::Right => ("right", d.left + d.width),
    };
    ctx.set_text_align(align);

    let line_height = style.font_size * style.line_height;
    #[allow(clippy::cast_precision_loss)]
    for (idx, line) in style.text.lines().enumerate() {
        ctx.fill_text(line, x, d.top + idx as f64 * line_height)?;
    }
    Ok(())
}

// =============================================================
// Selection UI
// =============================================================

fn draw_selection(
    ctx: &CanvasRenderingContext2d,
    d: &Drawable,
    camera: &Camera,
    show_handles: bool,
    editing: bool,
) -> Result<(), JsValue> {
    let Some(chrome) = d.chrome.as_ref() else {
        return Ok(());
    };
    let zoom = camera.zoom;

    ctx.save();
    let border = if editing { chrome.editing_border_color.unwrap_or(chrome.border_color) } else { chrome.border_color };
    ctx.set_stroke_style_str(border);
    ctx.set_line_width(chrome.border_scale_factor / zoom);
    ctx.stroke_rect(d.left, d.top, d.width, d.height);
    ctx.restore();

    if show_handles && !editing {
        draw_corner_handles(ctx, d, chrome, zoom)?;
    }
    Ok(())
}

/// Corner-only handles; edge midpoints and the rotation control are hidden.
fn draw_corner_handles(
    ctx: &CanvasRenderingContext2d,
    d: &Drawable,
    chrome: &HandleStyle,
    zoom: f64,
) -> Result<(), JsValue> {
    let size = chrome.corner_size / zoom;
    let half = size / 2.0;
    let corners = [
        (d.left, d.top),
        (d.left + d.width, d.top),
        (d.left + d.width, d.top + d.height),
        (d.left, d.top + d.height),
    ];

    ctx.save();
    ctx.set_fill_style_str(chrome.corner_color);
    ctx.set_stroke_style_str(chrome.corner_stroke_color);
    ctx.set_line_width(1.0 / zoom);
    for (x, y) in corners {
        if !chrome.transparent_corners {
            ctx.fill_rect(x - half, y - half, size, size);
        }
        ctx.stroke_rect(x - half, y - half, size, size);
    }
    ctx.restore();
    Ok(())
}

fn draw_marquee(ctx: &CanvasRenderingContext2d, marquee: Bounds, zoom: f64) {
    ctx.save();
    ctx.set_fill_style_str(MARQUEE_FILL);
    ctx.set_stroke_style_str(MARQUEE_BORDER);
    ctx.set_line_width(1.0 / zoom);
    ctx.fill_rect(marquee.left, marquee.top, marquee.width, marquee.height);
    ctx.stroke_rect(marquee.left, marquee.top, marquee.width, marquee.height);
    ctx.restore();
}

// =============================================================
// Screen-space overlays
// =============================================================

fn draw_size_readout(ctx: &CanvasRenderingContext2d, readout: SizeReadout) -> Result<(), JsValue> {
    let label = format!("{:.0} × {:.0}", readout.width, readout.height);
    ctx.save();
    ctx.set_font("11px sans-serif");
    ctx.set_text_align("left");
    ctx.set_text_baseline("middle");
    let text_w = ctx.measure_text(&label).map_or(64.0, |m| m.width());
    let (x, y) = (readout.screen.x, readout.screen.y);
    ctx.set_fill_style_str(ACCENT_COLOR);
    ctx.fill_rect(x, y, text_w + 12.0, 20.0);
    ctx.set_fill_style_str("#fff");
    ctx.fill_text(&label, x + 6.0, y + 10.0)?;
    ctx.restore();
    Ok(())
}

fn draw_image_preview(
    ctx: &CanvasRenderingContext2d,
    preview: &ImagePreview,
    images: &HashMap<String, HtmlImageElement>,
) -> Result<(), JsValue> {
    ctx.save();
    ctx.set_global_alpha(0.8);
    let result = draw_bitmap(ctx, images.get(&preview.url), preview.screen.x, preview.screen.y, preview.size, preview.size);
    ctx.restore();
    result
}

// =============================================================
// Helpers
// =============================================================

/// Trace a rectangle with per-corner radii (`l` top-left, `t` top-right,
/// `r` bottom-right, `b` bottom-left), clamped to half the shorter side.
fn rounded_rect_path(
    ctx: &CanvasRenderingContext2d,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    radius: Option<BorderRadius>,
) -> Result<(), JsValue> {
    ctx.begin_path();
    let Some(r) = radius.filter(|r| r.max() > 0.0) else {
        ctx.rect(x, y, w, h);
        return Ok(());
    };
    let limit = (w.min(h) / 2.0).max(0.0);
    let (tl, tr, br, bl) = (r.l.min(limit), r.t.min(limit), r.r.min(limit), r.b.min(limit));

    ctx.move_to(x + tl, y);
    ctx.line_to(x + w - tr, y);
    ctx.arc_to(x + w, y, x + w, y + tr, tr)?;
    ctx.line_to(x + w, y + h - br);
    ctx.arc_to(x + w, y + h, x + w - br, y + h, br)?;
    ctx.line_to(x + bl, y + h);
    ctx.arc_to(x, y + h, x, y + h - bl, bl)?;
    ctx.line_to(x, y + tl);
    ctx.arc_to(x, y, x + tl, y, tl)?;
    ctx.close_path();
    Ok(())
}
