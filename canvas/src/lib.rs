//! Vector design canvas core.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It owns the
//! editing session of a design document: the scene store with pages,
//! selection and viewport state; the render surface that mirrors stored
//! objects as drawables; the interaction engine that turns pointer, wheel and
//! keyboard input into scene edits; and the bridge that debounces edits into
//! saves. The host layer wires DOM events to [`engine::Engine`] and shows the
//! panels fed by the store's queries.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`store`] | Pages, selection, hover, tool and viewport state; save notifications |
//! | [`surface`] | Drawables, active selection, hover outline and text-edit mode |
//! | [`doc`] | Document, page and scene object types (wire format) |
//! | [`camera`] | Pan/zoom camera and coordinate conversions |
//! | [`input`] | Tools, input event types and the gesture transition table |
//! | [`hit`] | Bounds and hit-testing against drawables |
//! | [`render`] | Canvas2D painter |
//! | [`persist`] | Store-to-backend save bridge and one-shot hydration |
//! | [`remote`] | HTTP document client (browser only) |
//! | [`debounce`] | Clocks and the trailing-edge save timer |
//! | [`error`] | Error types |
//! | [`consts`] | Shared numeric and style constants |

pub mod camera;
pub mod consts;
pub mod debounce;
pub mod doc;
pub mod engine;
pub mod error;
pub mod hit;
pub mod input;
pub mod persist;
pub mod remote;
pub mod render;
pub mod store;
pub mod surface;

/// Route `log` output to the browser console and panics to `console.error`.
///
/// Safe to call more than once; later calls keep the first logger.
#[cfg(target_arch = "wasm32")]
pub fn init_logging(level: log::Level) {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(level) {
        log::debug!("logger already installed: {e}");
    }
}
