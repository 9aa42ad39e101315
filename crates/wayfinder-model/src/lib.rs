//! Wayfinder Route Model
//!
//! Domain values for replaying a pathfinding run on a map.
//!
//! # Entities
//!
//! - **GraphNode**: a vertex of the demonstration graph (position,
//!   congestion, blocked flag)
//! - **ExplorationStep**: one recorded algorithm event (start, visit,
//!   process, skip), used for visualisation only
//! - **Route**: the winning path, its exploration trace and metrics
//!
//! Routes reference graph nodes by [`NodeId`]; they never own them. The
//! [`payload`] module is the single place where the backend's JSON is
//! interpreted.

mod error;
mod ids;
mod node;
pub mod payload;
mod route;
mod snapshot;
mod step;

pub use error::{ModelError, Result};
pub use ids::{Coordinate, NodeId};
pub use node::{CongestionStatus, GraphNode, MAX_CONGESTION};
pub use payload::{graph_nodes_from_payload, RawGraphNode, RawRoute};
pub use route::{format_distance, format_duration, Algorithm, PathNode, Route};
pub use snapshot::ExplorationSnapshot;
pub use step::{validate_sequence, ExplorationStep, StepAction};
