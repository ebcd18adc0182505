//! Shared numeric and style constants for the canvas crate.

// ── Viewport ────────────────────────────────────────────────────

/// Smallest zoom factor the viewport will accept.
pub const MIN_ZOOM: f64 = 0.05;

/// Largest zoom factor the viewport will accept.
pub const MAX_ZOOM: f64 = 8.0;

/// Base of the exponential wheel-zoom curve: factor = base^(-deltaY).
pub const WHEEL_ZOOM_EXP_BASE: f64 = 1.005;

/// Multiplicative step for the keyboard zoom shortcuts.
pub const KEYBOARD_ZOOM_STEP: f64 = 1.2;

// ── Persistence ─────────────────────────────────────────────────

/// Quiet period before a burst of edits is handed to the save listener.
pub const SAVE_DEBOUNCE_MS: f64 = 1000.0;

// ── Creation defaults ───────────────────────────────────────────

/// Side length of a rectangle created by a click without drag.
pub const DEFAULT_RECT_SIZE: f64 = 100.0;

/// Fill of a freshly drawn rectangle.
pub const DEFAULT_RECT_FILL: &str = "#D9D9D9";

/// Fill of a freshly created text object.
pub const DEFAULT_TEXT_FILL: &str = "#000";

/// Font size of a freshly created text object.
pub const DEFAULT_FONT_SIZE: f64 = 12.0;

/// Font family of a freshly created text object.
pub const DEFAULT_FONT_FAMILY: &str = "Inter";

/// Line height multiplier of a freshly created text object.
pub const DEFAULT_LINE_HEIGHT: f64 = 1.16;

/// Rough advance width of one glyph, as a fraction of the font size.
pub const GLYPH_WIDTH_RATIO: f64 = 0.6;

// ── Chrome ──────────────────────────────────────────────────────

/// Accent color for selection borders, handle strokes and text-edit borders.
pub const ACCENT_COLOR: &str = "#3b82f6";

/// Fill of the corner handles.
pub const HANDLE_FILL: &str = "#FFF";

/// Corner handle edge length in screen pixels.
pub const HANDLE_SIZE_PX: f64 = 8.0;

/// Multiplier applied to the selection border width.
pub const BORDER_SCALE_FACTOR: f64 = 1.5;

/// Outline color drawn around the hovered object.
pub const HOVER_COLOR: &str = "#60a5fa";

/// Hover outline width in screen pixels; divided by zoom in scene space.
pub const HOVER_STROKE_PX: f64 = 2.0;

/// Reserved drawable id of the hover outline overlay.
pub const HOVER_OVERLAY_ID: &str = "hover-element";

/// Marquee fill while drag-selecting.
pub const MARQUEE_FILL: &str = "rgba(0, 120, 215, 0.2)";

/// Marquee border while drag-selecting.
pub const MARQUEE_BORDER: &str = "#60a5fa";

/// Edge length of the floating image placement preview, in screen pixels.
pub const IMAGE_PREVIEW_PX: f64 = 70.0;

/// Offset of the size readout tooltip from the cursor, in screen pixels.
pub const SIZE_READOUT_OFFSET_PX: f64 = 12.0;
