//! Graph vertices as delivered by a graph snapshot.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::ids::{Coordinate, NodeId};

/// Highest congestion level the backend reports.
pub const MAX_CONGESTION: u8 = 100;

/// Congestion bucket used for colouring nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CongestionStatus {
    /// Level below 30
    Low,
    /// Level below 70
    Medium,
    /// Level 70 and above
    High,
}

impl CongestionStatus {
    /// Bucket a congestion level.
    pub fn from_level(level: u8) -> Self {
        match level {
            0..=29 => CongestionStatus::Low,
            30..=69 => CongestionStatus::Medium,
            _ => CongestionStatus::High,
        }
    }
}

/// A vertex of the demonstration graph.
///
/// Immutable for the lifetime of one route-finding session; a re-seed
/// replaces the whole node list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub coordinate: Coordinate,
    pub name: String,
    pub location_name: Option<String>,
    pub congestion_level: u8,
    pub is_blocked: bool,
}

impl GraphNode {
    /// Create a node with no congestion and no blockage.
    pub fn new(id: impl Into<NodeId>, lat: f64, lng: f64) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(ModelError::InvalidNode {
                id: id.to_string(),
                reason: "empty identifier".to_string(),
            });
        }
        let coordinate = Coordinate::new(lat, lng)?;
        Ok(Self {
            name: format!("Node {id}"),
            id,
            coordinate,
            location_name: None,
            congestion_level: 0,
            is_blocked: false,
        })
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_location_name(mut self, location: impl Into<String>) -> Self {
        self.location_name = Some(location.into());
        self
    }

    /// Set the congestion level, rejecting values above 100.
    pub fn with_congestion(mut self, level: u8) -> Result<Self> {
        if level > MAX_CONGESTION {
            return Err(ModelError::InvalidNode {
                id: self.id.to_string(),
                reason: format!("congestion level {level} exceeds {MAX_CONGESTION}"),
            });
        }
        self.congestion_level = level;
        Ok(self)
    }

    #[must_use]
    pub fn blocked(mut self, blocked: bool) -> Self {
        self.is_blocked = blocked;
        self
    }

    pub fn congestion_status(&self) -> CongestionStatus {
        CongestionStatus::from_level(self.congestion_level)
    }

    pub fn is_passable(&self) -> bool {
        !self.is_blocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn bucket_boundaries() {
        assert_eq!(CongestionStatus::from_level(0), CongestionStatus::Low);
        assert_eq!(CongestionStatus::from_level(29), CongestionStatus::Low);
        assert_eq!(CongestionStatus::from_level(30), CongestionStatus::Medium);
        assert_eq!(CongestionStatus::from_level(69), CongestionStatus::Medium);
        assert_eq!(CongestionStatus::from_level(70), CongestionStatus::High);
        assert_eq!(CongestionStatus::from_level(100), CongestionStatus::High);
    }

    #[test]
    fn default_name_uses_id() {
        let node = GraphNode::new(4, 10.0, 20.0).unwrap();
        assert_eq!(node.name, "Node 4");
        assert!(node.is_passable());
    }

    #[test]
    fn blocked_node_is_not_passable() {
        let node = GraphNode::new("a", 0.0, 0.0).unwrap().blocked(true);
        assert!(!node.is_passable());
    }

    #[test]
    fn rejects_empty_id_and_bad_congestion() {
        assert!(GraphNode::new("", 0.0, 0.0).is_err());
        let node = GraphNode::new("a", 0.0, 0.0).unwrap();
        assert!(node.with_congestion(101).is_err());
    }

    #[test]
    fn rejects_out_of_range_position() {
        let err = GraphNode::new("a", 91.0, 0.0).unwrap_err();
        assert!(matches!(err, ModelError::InvalidCoordinate { .. }));
    }

    #[test]
    fn status_serializes_uppercase() {
        let json = serde_json::to_string(&CongestionStatus::Medium).unwrap();
        assert_eq!(json, "\"MEDIUM\"");
    }

    proptest! {
        #[test]
        fn buckets_are_monotonic(a in 0u8..=100, b in 0u8..=100) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let rank = |s: CongestionStatus| match s {
                CongestionStatus::Low => 0,
                CongestionStatus::Medium => 1,
                CongestionStatus::High => 2,
            };
            prop_assert!(rank(CongestionStatus::from_level(lo)) <= rank(CongestionStatus::from_level(hi)));
        }
    }
}
