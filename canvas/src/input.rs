//! Input model: tools, modifier keys, mouse buttons, and the gesture state machine.
//!
//! This module defines the types consumed by the interaction engine. `Tool`
//! and `Modifiers` capture the user's intent at the time of a pointer event.
//! `InputState` is the active gesture being tracked between pointer-down and
//! pointer-up. [`transition`] is the dispatch table: given the active tool,
//! the pointer phase, the panning flag and the current gesture, it names the
//! step the engine must perform. Keeping the table here, free of store and
//! surface access, lets every gesture be tested on its own.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::camera::Point;
use crate::doc::ObjectId;

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Pointer / selection tool (default).
    #[default]
    Cursor,
    /// Click to place a text object.
    Text,
    /// Currently behaves exactly like [`Tool::Text`].
    Frame,
    /// Drag to size a rectangle; a click makes a default-sized one.
    Rectangle,
    /// Click to place the pending image.
    Image,
}

impl Tool {
    /// Whether this tool creates a text object on press.
    #[must_use]
    pub fn creates_text(self) -> bool {
        matches!(self, Self::Text | Self::Frame)
    }

    /// CSS cursor shown over the canvas while this tool is active.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::Cursor => "default",
            Self::Text => "text",
            Self::Frame | Self::Rectangle | Self::Image => "crosshair",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cursor => "cursor",
            Self::Text => "text",
            Self::Frame => "frame",
            Self::Rectangle => "rectangle",
            Self::Image => "image",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "cursor" => Some(Self::Cursor),
            "text" => Some(Self::Text),
            "frame" => Some(Self::Frame),
            "rectangle" => Some(Self::Rectangle),
            "image" => Some(Self::Image),
            _ => None,
        }
    }
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on other platforms, Cmd on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }

    /// Whether a click should toggle into a multi-selection instead of replacing it.
    #[must_use]
    pub fn additive(self) -> bool {
        self.shift || self.meta || self.ctrl
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key as reported by the browser's `KeyboardEvent.key` (e.g. `" "`, `"Escape"`, `"a"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn is_space(&self) -> bool {
        self.0 == " " || self.0 == "Space" || self.0 == "Spacebar"
    }

    /// Case-insensitive comparison against a named key.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name)
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// Transient drag-to-size state while a rectangle is being drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCreate {
    /// Scene point of the pointer-down.
    pub start: Point,
    /// Scene point of the latest pointer event.
    pub end: Point,
    /// The object being sized.
    pub target: ObjectId,
}

impl PendingCreate {
    /// `(left, top, width, height)` spanned by start and end.
    #[must_use]
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        (
            self.start.x.min(self.end.x),
            self.start.y.min(self.end.y),
            (self.end.x - self.start.x).abs(),
            (self.end.y - self.start.y).abs(),
        )
    }

    /// Pointer never moved away from the start point.
    #[must_use]
    pub fn is_click(&self) -> bool {
        self.start == self.end
    }
}

/// Internal state for the input state machine.
///
/// Each active variant carries the gesture context needed to compute deltas
/// and emit final mutations on pointer-up.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Space is held and the pointer is down: dragging pans the viewport.
    Panning {
        /// Screen-space position of the previous pointer event.
        last_screen: Point,
    },
    /// The current selection is being moved.
    DraggingObjects {
        /// Scene-space pointer position at the previous event.
        last_scene: Point,
        /// Whether any movement happened since pointer-down.
        moved: bool,
    },
    /// Rubber-band selection on empty canvas.
    Marquee {
        /// Scene point where the drag started.
        anchor: Point,
        /// Scene point of the latest pointer event.
        current: Point,
        /// Add to the existing selection instead of replacing it.
        additive: bool,
    },
    /// A rectangle is being drawn.
    DrawingRectangle(PendingCreate),
}

impl InputState {
    /// Whether a pointer gesture is currently in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Pointer event phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Down,
    Move,
    Up,
}

/// The step the engine takes for a `(tool, phase)` pair in the current gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing to do.
    Ignore,
    /// Space is held: begin dragging the viewport.
    BeginPan,
    /// Press with the cursor tool: select, toggle, drag or marquee depending on hit.
    CursorPress,
    /// Create a text object and enter edit mode.
    CreateText,
    /// Create a zero-size rectangle and start a pending-create gesture.
    BeginRectangle,
    /// Place the pending image centered on the pointer.
    PlaceImage,
    /// Idle pointer movement: update hover and previews.
    Hover,
    PanBy,
    DragSelection,
    ExtendMarquee,
    ResizeRectangle,
    EndPan,
    EndDrag,
    EndMarquee,
    CommitRectangle,
}

/// The dispatch table.
///
/// Panning overrides tool dispatch on press, so no object is created while
/// space is held. A press during an active gesture is ignored.
#[must_use]
pub fn transition(tool: Tool, phase: Phase, panning: bool, state: &InputState) -> Transition {
    match (phase, state) {
        (Phase::Down, InputState::Idle) if panning => Transition::BeginPan,
        (Phase::Down, InputState::Idle) => match tool {
            Tool::Cursor => Transition::CursorPress,
            Tool::Text | Tool::Frame => Transition::CreateText,
            Tool::Rectangle => Transition::BeginRectangle,
            Tool::Image => Transition::PlaceImage,
        },
        (Phase::Down, _) => Transition::Ignore,

        (Phase::Move, InputState::Idle) if panning => Transition::Ignore,
        (Phase::Move, InputState::Idle) => Transition::Hover,
        (Phase::Move, InputState::Panning { .. }) => Transition::PanBy,
        (Phase::Move, InputState::DraggingObjects { .. }) => Transition::DragSelection,
        (Phase::Move, InputState::Marquee { .. }) => Transition::ExtendMarquee,
        (Phase::Move, InputState::DrawingRectangle(_)) => Transition::ResizeRectangle,

        (Phase::Up, InputState::Idle) => Transition::Ignore,
        (Phase::Up, InputState::Panning { .. }) => Transition::EndPan,
        (Phase::Up, InputState::DraggingObjects { .. }) => Transition::EndDrag,
        (Phase::Up, InputState::Marquee { .. }) => Transition::EndMarquee,
        (Phase::Up, InputState::DrawingRectangle(_)) => Transition::CommitRectangle,
    }
}

/// CSS cursor for the canvas given tool and pan state.
#[must_use]
pub fn cursor_for(tool: Tool, panning: bool, state: &InputState) -> &'static str {
    if panning {
        return if matches!(state, InputState::Panning { .. }) { "grabbing" } else { "grab" };
    }
    tool.cursor()
}
