//! Canonical schema of the pathfinding backend's JSON and its mapping
//! into domain values.
//!
//! The backend is loosely typed: optional fields, `id`/`nodeId` aliases,
//! ids as numbers or strings. Every such variation is absorbed here and
//! nowhere else. Defaulting rules:
//!
//! - display name: `name`, else `nodeName`, else `"Node {id}"`
//! - `congestionLevel` missing -> 0, `isBlocked` missing -> false
//! - path node id: `nodeId`, else `id`
//! - step `node`: bare id, or object carrying an id and optional position
//! - step `distance` / `timestamp` missing or null -> 0
//! - route `algorithm` missing -> the requested algorithm
//! - route `iterations` missing -> number of exploration steps
//! - `totalDistance` / `totalTime` are required
//! - empty `nodeDetails` means no path exists

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ModelError, Result};
use crate::ids::{Coordinate, NodeId};
use crate::node::GraphNode;
use crate::route::{Algorithm, PathNode, Route};
use crate::step::{ExplorationStep, StepAction};

/// A node as returned by `GET /graph/nodes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGraphNode {
    pub id: NodeId,
    pub lat: f64,
    #[serde(alias = "lon")]
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub congestion_level: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_blocked: Option<bool>,
}

impl TryFrom<RawGraphNode> for GraphNode {
    type Error = ModelError;

    fn try_from(raw: RawGraphNode) -> Result<Self> {
        let level = raw.congestion_level.unwrap_or(0);
        let level = u8::try_from(level).map_err(|_| ModelError::InvalidNode {
            id: raw.id.to_string(),
            reason: format!("congestion level {level} out of range"),
        })?;

        let mut node = GraphNode::new(raw.id, raw.lat, raw.lng)?
            .with_congestion(level)?
            .blocked(raw.is_blocked.unwrap_or(false));
        if let Some(name) = raw.name.or(raw.node_name) {
            node = node.with_name(name);
        }
        if let Some(location) = raw.location_name {
            node = node.with_location_name(location);
        }
        Ok(node)
    }
}

/// Map a whole node list, failing on the first invalid or repeated node.
pub fn graph_nodes_from_payload(raw: Vec<RawGraphNode>) -> Result<Vec<GraphNode>> {
    let mut seen = HashSet::with_capacity(raw.len());
    raw.into_iter()
        .map(|raw| {
            let node = GraphNode::try_from(raw)?;
            if !seen.insert(node.id.clone()) {
                return Err(ModelError::InvalidNode {
                    id: node.id.to_string(),
                    reason: "duplicate id".to_string(),
                });
            }
            Ok(node)
        })
        .collect()
}

/// A position given either as `[lat, lng]` or `{ "lat": .., "lng": .. }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCoordinate {
    Pair([f64; 2]),
    Object {
        lat: f64,
        #[serde(alias = "lon")]
        lng: f64,
    },
}

impl RawCoordinate {
    fn into_coordinate(self) -> Result<Coordinate> {
        match self {
            RawCoordinate::Pair([lat, lng]) => Coordinate::new(lat, lng),
            RawCoordinate::Object { lat, lng } => Coordinate::new(lat, lng),
        }
    }
}

/// Object form of a node reference inside a step or `nodeDetails`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNodeDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, alias = "lon", skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

impl RawNodeDetail {
    fn resolve_id(&self) -> Option<NodeId> {
        self.node_id.clone().or_else(|| self.id.clone())
    }

    fn position(&self) -> Result<Option<Coordinate>> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Coordinate::new(lat, lng).map(Some),
            _ => Ok(None),
        }
    }
}

/// A step's node: a bare id or an embedded node object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNodeRef {
    Id(NodeId),
    Detail(RawNodeDetail),
}

/// One exploration step as sent by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStep {
    pub step_number: u32,
    pub action: String,
    pub node: RawNodeRef,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<f64>,
}

impl RawStep {
    fn into_step(self) -> Result<ExplorationStep> {
        let action: StepAction = self.action.parse()?;
        let (node, position) = match self.node {
            RawNodeRef::Id(id) => (id, None),
            RawNodeRef::Detail(detail) => {
                let id = detail.resolve_id().ok_or_else(|| {
                    ModelError::InvalidRoute(format!("step {} has no node id", self.step_number))
                })?;
                (id, detail.position()?)
            }
        };
        Ok(ExplorationStep {
            step_number: self.step_number,
            action,
            node,
            position,
            distance: self.distance.unwrap_or(0.0),
            timestamp: self.timestamp.unwrap_or(0.0),
        })
    }
}

/// Response body of `GET /route`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRoute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(default)]
    pub exploration_steps: Vec<RawStep>,
    #[serde(default)]
    pub node_details: Vec<RawNodeDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_geometry: Option<Vec<RawCoordinate>>,
}

impl Route {
    /// Map a backend route payload into a validated [`Route`].
    ///
    /// `requested` is used when the payload does not name its algorithm.
    pub fn from_payload(raw: RawRoute, requested: Algorithm) -> Result<Route> {
        if raw.node_details.is_empty() {
            return Err(ModelError::NoPath);
        }

        let algorithm = match raw.algorithm.as_deref() {
            Some(name) => name.parse()?,
            None => requested,
        };
        if algorithm != requested {
            warn!(%requested, returned = %algorithm, "backend answered with a different algorithm");
        }

        let path = raw
            .node_details
            .into_iter()
            .enumerate()
            .map(|(index, detail)| {
                let id = detail.resolve_id().ok_or_else(|| {
                    ModelError::InvalidRoute(format!("path node {index} has no id"))
                })?;
                let coordinate = detail.position()?.ok_or_else(|| {
                    ModelError::InvalidRoute(format!("path node {id} has no position"))
                })?;
                Ok(PathNode { id, coordinate })
            })
            .collect::<Result<Vec<_>>>()?;

        let steps = raw
            .exploration_steps
            .into_iter()
            .map(RawStep::into_step)
            .collect::<Result<Vec<_>>>()?;

        let total_distance = raw
            .total_distance
            .ok_or_else(|| ModelError::InvalidRoute("missing totalDistance".to_string()))?;
        let total_time = raw
            .total_time
            .ok_or_else(|| ModelError::InvalidRoute("missing totalTime".to_string()))?;
        let iterations = raw.iterations.unwrap_or(steps.len() as u32);

        let geometry = raw
            .path_geometry
            .map(|points| {
                points
                    .into_iter()
                    .map(RawCoordinate::into_coordinate)
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?;

        Route::new(
            algorithm,
            steps,
            path,
            total_distance,
            total_time,
            iterations,
            geometry,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn repeated_node_ids_are_rejected() {
        let raw: Vec<RawGraphNode> = serde_json::from_value(json!([
            {"id": 1, "lat": 40.0, "lng": -3.0},
            {"id": "1", "lat": 41.0, "lng": -3.0}
        ]))
        .unwrap();
        let err = graph_nodes_from_payload(raw).unwrap_err();
        assert!(matches!(err, ModelError::InvalidNode { ref reason, .. } if reason == "duplicate id"));
    }

    fn route_json() -> serde_json::Value {
        json!({
            "algorithm": "dijkstra",
            "explorationSteps": [
                {"stepNumber": 0, "action": "start", "node": 2, "distance": 0, "timestamp": 1000},
                {"stepNumber": 1, "action": "visit", "node": {"id": 3, "lat": 40.1, "lng": -3.2}, "distance": 500},
                {"stepNumber": 2, "action": "PROCESS", "node": "3", "distance": null}
            ],
            "nodeDetails": [
                {"nodeId": 2, "lat": 40.0, "lng": -3.0},
                {"id": 3, "lat": 40.1, "lng": -3.2}
            ],
            "totalDistance": 500,
            "totalTime": 60,
            "pathGeometry": [[40.0, -3.0], {"lat": 40.05, "lng": -3.1}, [40.1, -3.2]]
        })
    }

    fn parse(value: serde_json::Value) -> Result<Route> {
        let raw: RawRoute = serde_json::from_value(value).unwrap();
        Route::from_payload(raw, Algorithm::Dijkstra)
    }

    #[test]
    fn maps_full_payload() {
        let route = parse(route_json()).unwrap();
        assert!(route.is_valid());
        assert_eq!(route.algorithm(), Algorithm::Dijkstra);
        assert_eq!(route.exploration_steps().len(), 3);
        assert_eq!(route.iterations(), 3);
        assert_eq!(route.path_geometry().map(<[_]>::len), Some(3));
        assert_eq!(route.formatted_distance(), "500 m");
        assert_eq!(route.formatted_time(), "1m 0s");

        let step = &route.exploration_steps()[1];
        assert_eq!(step.action, StepAction::Visit);
        assert_eq!(step.node, NodeId::from(3));
        assert!(step.position.is_some());
        assert_eq!(route.exploration_steps()[2].distance, 0.0);
    }

    #[test]
    fn path_preserves_node_detail_order() {
        let route = parse(route_json()).unwrap();
        let ids: Vec<String> = route.path().iter().map(|id| id.to_string()).collect();
        assert_eq!(ids, vec!["2", "3"]);
    }

    #[test]
    fn node_id_key_wins_over_id() {
        let mut value = route_json();
        value["nodeDetails"][0] = json!({"nodeId": 9, "id": 2, "lat": 40.0, "lng": -3.0});
        let route = parse(value).unwrap();
        assert_eq!(route.start(), &NodeId::from(9));
    }

    #[test]
    fn empty_node_details_means_no_path() {
        let mut value = route_json();
        value["nodeDetails"] = json!([]);
        assert_eq!(parse(value).unwrap_err(), ModelError::NoPath);
    }

    #[test]
    fn single_path_node_is_invalid() {
        let mut value = route_json();
        value["nodeDetails"] = json!([{"id": 2, "lat": 40.0, "lng": -3.0}]);
        assert!(matches!(parse(value), Err(ModelError::InvalidRoute(_))));
    }

    #[test]
    fn zero_distance_is_invalid() {
        let mut value = route_json();
        value["totalDistance"] = json!(0);
        assert!(matches!(parse(value), Err(ModelError::InvalidRoute(_))));
    }

    #[test]
    fn missing_distance_is_invalid() {
        let mut value = route_json();
        value.as_object_mut().unwrap().remove("totalDistance");
        assert!(matches!(parse(value), Err(ModelError::InvalidRoute(_))));
    }

    #[test]
    fn misnumbered_steps_are_invalid() {
        let mut value = route_json();
        value["explorationSteps"][1]["stepNumber"] = json!(5);
        assert!(matches!(parse(value), Err(ModelError::InvalidRoute(_))));
    }

    #[test]
    fn missing_algorithm_uses_requested() {
        let mut value = route_json();
        value.as_object_mut().unwrap().remove("algorithm");
        let raw: RawRoute = serde_json::from_value(value).unwrap();
        let route = Route::from_payload(raw, Algorithm::AStar).unwrap();
        assert_eq!(route.algorithm(), Algorithm::AStar);
    }

    #[test]
    fn graph_node_defaults() {
        let raw: RawGraphNode =
            serde_json::from_value(json!({"id": 1, "lat": 10.0, "lng": 20.0})).unwrap();
        let node = GraphNode::try_from(raw).unwrap();
        assert_eq!(node.name, "Node 1");
        assert_eq!(node.congestion_level, 0);
        assert!(node.is_passable());
        assert!(node.location_name.is_none());
    }

    #[test]
    fn graph_node_name_fallbacks() {
        let raw: RawGraphNode = serde_json::from_value(json!({
            "id": "x", "lat": 1.0, "lng": 2.0, "nodeName": "Plaza",
            "locationName": "Centro", "congestionLevel": 75, "isBlocked": true
        }))
        .unwrap();
        let node = GraphNode::try_from(raw).unwrap();
        assert_eq!(node.name, "Plaza");
        assert_eq!(node.location_name.as_deref(), Some("Centro"));
        assert_eq!(node.congestion_status(), crate::CongestionStatus::High);
        assert!(!node.is_passable());
    }

    #[test]
    fn graph_node_rejects_bad_congestion() {
        let raw: RawGraphNode = serde_json::from_value(json!({
            "id": 1, "lat": 1.0, "lng": 2.0, "congestionLevel": 140
        }))
        .unwrap();
        assert!(GraphNode::try_from(raw).is_err());
        let raw: RawGraphNode = serde_json::from_value(json!({
            "id": 1, "lat": 1.0, "lng": 2.0, "congestionLevel": -1
        }))
        .unwrap();
        assert!(GraphNode::try_from(raw).is_err());
    }
}
