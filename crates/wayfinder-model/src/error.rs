//! Error types for the route domain model.

use thiserror::Error;

/// Result type for model construction and payload mapping.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised while building domain values from backend data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// Latitude or longitude outside the valid range.
    #[error("invalid coordinate: lat={lat}, lng={lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },

    /// A graph node violates its invariants.
    #[error("invalid node {id}: {reason}")]
    InvalidNode { id: String, reason: String },

    /// A route payload violates the route invariants.
    #[error("invalid route data: {0}")]
    InvalidRoute(String),

    /// The payload carried no path nodes at all.
    #[error("payload contains no path")]
    NoPath,

    /// Algorithm identifier not recognised.
    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    /// Exploration step action not recognised.
    #[error("unknown step action: {0}")]
    UnknownAction(String),
}
