// THEORY:
// Every failure the reduction engine can report is detected synchronously at the
// start of a frame, before any per-cell work begins. A failed frame is not fatal:
// the control loop is expected to treat it as "no points" and keep running.

use thiserror::Error;

/// Errors raised while building or partitioning a `Scene`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// Grid cell counts are zero, exceed the frame, or extraction parameters are out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Depth and color dimensions disagree, or the frame does not divide evenly into cells.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// The depth image has no pixels.
    #[error("empty input: depth image is {width}x{height}")]
    EmptyInput { width: u32, height: u32 },
}

pub type Result<T> = std::result::Result<T, SceneError>;
