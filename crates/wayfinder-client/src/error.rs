//! Error types for wayfinder-client.

use thiserror::Error;
use wayfinder_model::{ModelError, NodeId};

/// Result type for repository and orchestration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the backend client and the route finder.
#[derive(Debug, Error)]
pub enum Error {
    /// The backend found no route between the two nodes.
    #[error("no path found from {start} to {end}")]
    NoPathFound { start: NodeId, end: NodeId },

    /// The backend answered, but the route violates the route invariants.
    #[error("invalid route data: {0}")]
    InvalidRouteData(String),

    /// The node list could not be turned into graph nodes.
    #[error("invalid graph data: {0}")]
    InvalidGraphData(String),

    /// Seeding produced fewer than two nodes.
    #[error("graph has {found} node(s), at least 2 are required")]
    EmptyGraph { found: usize },

    /// No consecutive node pair yielded a route.
    #[error("no connected node pair found after {tried} attempt(s)")]
    NoConnectedPairFound { tried: usize },

    /// Automatic routing was requested before a successful seed.
    #[error("graph not seeded: seed a graph before requesting an automatic route")]
    GraphNotSeeded,

    /// The backend answered with a non-success status.
    #[error("backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// Connection, timeout or protocol failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Invalid client configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::Backend { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Map a route-mapping failure for the pair that was requested.
    pub(crate) fn from_route_model(error: ModelError, start: &NodeId, end: &NodeId) -> Self {
        match error {
            ModelError::NoPath => Error::NoPathFound {
                start: start.clone(),
                end: end.clone(),
            },
            other => Error::InvalidRouteData(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        let server = Error::Backend {
            status: 503,
            message: "down".to_string(),
        };
        let client = Error::Backend {
            status: 400,
            message: "bad".to_string(),
        };
        assert!(server.is_retryable());
        assert!(!client.is_retryable());
        assert!(!Error::GraphNotSeeded.is_retryable());
    }

    #[test]
    fn model_errors_map_to_taxonomy() {
        let (a, b) = (NodeId::from(1), NodeId::from(2));
        let err = Error::from_route_model(ModelError::NoPath, &a, &b);
        assert!(matches!(err, Error::NoPathFound { .. }));
        assert_eq!(err.to_string(), "no path found from 1 to 2");

        let err = Error::from_route_model(ModelError::InvalidRoute("short".into()), &a, &b);
        assert!(matches!(err, Error::InvalidRouteData(_)));
    }
}
