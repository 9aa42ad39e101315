//! Abstract access to the pathfinding backend.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wayfinder_model::{Algorithm, GraphNode, NodeId, Route};

use crate::error::Result;

/// Which sample graph the backend should build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphKind {
    #[default]
    Simple,
    Enhanced,
}

impl GraphKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphKind::Simple => "simple",
            GraphKind::Enhanced => "enhanced",
        }
    }
}

impl fmt::Display for GraphKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend acknowledgement of a seed request. Opaque to the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeedResult(pub serde_json::Value);

/// Operations the route finder needs from a pathfinding backend.
///
/// Implementations map backend failures onto [`crate::Error`]: a missing
/// route is `NoPathFound`, a route that fails validation is
/// `InvalidRouteData`.
#[async_trait]
pub trait RouteRepository: Send + Sync {
    /// Compute a route between two nodes.
    async fn find_route(&self, start: &NodeId, end: &NodeId, algorithm: Algorithm)
        -> Result<Route>;

    /// Fetch every node of the current graph.
    async fn graph_nodes(&self) -> Result<Vec<GraphNode>>;

    /// Ask the backend to (re)build its graph.
    async fn seed_graph(&self, kind: GraphKind) -> Result<SeedResult>;
}

#[async_trait]
impl<T: RouteRepository + ?Sized> RouteRepository for Arc<T> {
    async fn find_route(
        &self,
        start: &NodeId,
        end: &NodeId,
        algorithm: Algorithm,
    ) -> Result<Route> {
        (**self).find_route(start, end, algorithm).await
    }

    async fn graph_nodes(&self) -> Result<Vec<GraphNode>> {
        (**self).graph_nodes().await
    }

    async fn seed_graph(&self, kind: GraphKind) -> Result<SeedResult> {
        (**self).seed_graph(kind).await
    }
}
