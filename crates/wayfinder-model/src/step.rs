//! Recorded events of a pathfinding run, used for replay only.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::ids::{Coordinate, NodeId};

/// What the algorithm did with a node at a given step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepAction {
    /// The origin of the search
    Start,
    /// Node discovered and pushed to the frontier
    Visit,
    /// Node popped and expanded
    Process,
    /// Node popped but already settled
    Skip,
}

impl StepAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepAction::Start => "start",
            StepAction::Visit => "visit",
            StepAction::Process => "process",
            StepAction::Skip => "skip",
        }
    }
}

impl FromStr for StepAction {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(StepAction::Start),
            "visit" => Ok(StepAction::Visit),
            "process" => Ok(StepAction::Process),
            "skip" => Ok(StepAction::Skip),
            _ => Err(ModelError::UnknownAction(s.to_string())),
        }
    }
}

/// One recorded algorithm event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorationStep {
    pub step_number: u32,
    pub action: StepAction,
    pub node: NodeId,
    /// Position of the node when the backend embedded it in the step.
    pub position: Option<Coordinate>,
    /// Cumulative distance from the origin at this step, in meters.
    pub distance: f64,
    pub timestamp: f64,
}

impl ExplorationStep {
    pub fn new(step_number: u32, action: StepAction, node: impl Into<NodeId>) -> Self {
        Self {
            step_number,
            action,
            node: node.into(),
            position: None,
            distance: 0.0,
            timestamp: 0.0,
        }
    }

    #[must_use]
    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = distance;
        self
    }

    #[must_use]
    pub fn at(mut self, position: Coordinate) -> Self {
        self.position = Some(position);
        self
    }
}

/// Check the ordering invariants of an exploration sequence.
///
/// Step numbers must be exactly `0..n-1` and the only `Start` must be
/// step 0. An empty sequence passes.
pub fn validate_sequence(steps: &[ExplorationStep]) -> Result<()> {
    for (index, step) in steps.iter().enumerate() {
        if step.step_number as usize != index {
            return Err(ModelError::InvalidRoute(format!(
                "step at position {index} is numbered {}",
                step.step_number
            )));
        }
        let is_start = step.action == StepAction::Start;
        if index == 0 && !is_start {
            return Err(ModelError::InvalidRoute(
                "exploration does not begin with a start step".to_string(),
            ));
        }
        if index > 0 && is_start {
            return Err(ModelError::InvalidRoute(format!(
                "second start step at position {index}"
            )));
        }
        if !step.distance.is_finite() || step.distance < 0.0 {
            return Err(ModelError::InvalidRoute(format!(
                "step {index} has invalid distance {}",
                step.distance
            )));
        }
    }
    Ok(())
}
