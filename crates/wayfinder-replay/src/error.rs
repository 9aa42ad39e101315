//! Error types for wayfinder-replay.

use thiserror::Error;

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while controlling playback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Speed multipliers must be finite and strictly positive.
    #[error("invalid playback speed: {0}")]
    InvalidSpeed(f64),

    /// `play` needs a Tokio runtime to schedule ticks on.
    #[error("playback requires a running Tokio runtime")]
    NoRuntime,
}
