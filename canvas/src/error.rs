//! Error types for the canvas core.
//!
//! The core has very few failure paths: lookups that miss are logged no-ops,
//! and persisted data is loaded leniently. What remains are precondition
//! failures when mounting a surface and transport failures when talking to
//! the document service.

use thiserror::Error;

/// Failure to acquire a render surface.
#[derive(Debug, Error, PartialEq)]
pub enum SurfaceError {
    /// The target has a zero, negative, or non-finite pixel size.
    #[error("invalid surface size {width}x{height}")]
    InvalidSize { width: f64, height: f64 },
    /// The host canvas element has no 2D context.
    #[error("canvas 2d context unavailable")]
    ContextUnavailable,
}

/// Failure of a request to the document service.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("document service responded with status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Decode(String),
}
