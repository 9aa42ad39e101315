//! Computed routes: the winning path plus the exploration trace behind it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::ids::{Coordinate, NodeId};
use crate::step::{validate_sequence, ExplorationStep};

/// Pathfinding algorithm run by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    #[default]
    #[serde(rename = "dijkstra")]
    Dijkstra,
    #[serde(rename = "astar", alias = "a*", alias = "a_star")]
    AStar,
}

impl Algorithm {
    /// Query-string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Dijkstra => "dijkstra",
            Algorithm::AStar => "astar",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dijkstra" => Ok(Algorithm::Dijkstra),
            "astar" | "a*" | "a_star" => Ok(Algorithm::AStar),
            _ => Err(ModelError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// A node on the chosen path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathNode {
    pub id: NodeId,
    pub coordinate: Coordinate,
}

/// Result of one pathfinding request.
///
/// Constructed only through [`Route::new`] or the payload mapping, both of
/// which enforce validity, so a `Route` held by callers is always valid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    algorithm: Algorithm,
    exploration_steps: Vec<ExplorationStep>,
    path: Vec<PathNode>,
    total_distance: f64,
    total_time: f64,
    iterations: u32,
    path_geometry: Option<Vec<Coordinate>>,
}

impl Route {
    /// Build a route, checking every route invariant.
    pub fn new(
        algorithm: Algorithm,
        exploration_steps: Vec<ExplorationStep>,
        path: Vec<PathNode>,
        total_distance: f64,
        total_time: f64,
        iterations: u32,
        path_geometry: Option<Vec<Coordinate>>,
    ) -> Result<Self> {
        if !total_time.is_finite() || total_time < 0.0 {
            return Err(ModelError::InvalidRoute(format!(
                "total time {total_time} is not a non-negative number"
            )));
        }
        if total_distance.is_nan() {
            return Err(ModelError::InvalidRoute("total distance is NaN".to_string()));
        }
        validate_sequence(&exploration_steps)?;

        let route = Self {
            algorithm,
            exploration_steps,
            path,
            total_distance,
            total_time,
            iterations,
            path_geometry,
        };
        if !route.is_valid() {
            return Err(ModelError::InvalidRoute(format!(
                "{} path nodes, distance {}",
                route.path.len(),
                route.total_distance
            )));
        }
        Ok(route)
    }

    /// At least two path nodes and a positive finite distance.
    pub fn is_valid(&self) -> bool {
        self.path.len() >= 2 && self.total_distance.is_finite() && self.total_distance > 0.0
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Exploration trace in the order the algorithm produced it.
    pub fn exploration_steps(&self) -> &[ExplorationStep] {
        &self.exploration_steps
    }

    pub fn path_nodes(&self) -> &[PathNode] {
        &self.path
    }

    /// Path node ids in path order.
    pub fn path(&self) -> Vec<&NodeId> {
        self.path.iter().map(|n| &n.id).collect()
    }

    pub fn start(&self) -> &NodeId {
        &self.path[0].id
    }

    pub fn end(&self) -> &NodeId {
        &self.path[self.path.len() - 1].id
    }

    /// Total distance in meters.
    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    /// Total travel time in seconds.
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn path_geometry(&self) -> Option<&[Coordinate]> {
        self.path_geometry.as_deref()
    }

    /// Coordinates to draw: the detailed geometry if present, else the
    /// path nodes themselves.
    pub fn path_coordinates(&self) -> Vec<Coordinate> {
        match &self.path_geometry {
            Some(geometry) if !geometry.is_empty() => geometry.clone(),
            _ => self.path.iter().map(|n| n.coordinate).collect(),
        }
    }

    pub fn formatted_distance(&self) -> String {
        format_distance(self.total_distance)
    }

    pub fn formatted_time(&self) -> String {
        format_duration(self.total_time)
    }
}

/// `"500 m"` below one kilometer, `"1.5 km"` above.
pub fn format_distance(meters: f64) -> String {
    let rounded = meters.round();
    if rounded < 1000.0 {
        format!("{} m", rounded as u64)
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

/// `"45s"`, `"1m 0s"` or `"2h 5m"` depending on magnitude.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    if total < 60 {
        format!("{total}s")
    } else if total < 3600 {
        format!("{}m {}s", total / 60, total % 60)
    } else {
        format!("{}h {}m", total / 3600, (total % 3600) / 60)
    }
}
