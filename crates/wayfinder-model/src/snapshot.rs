//! Exploration state rebuilt from a prefix of the step sequence.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ids::NodeId;
use crate::step::{ExplorationStep, StepAction};

/// What the search had touched after a given number of steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplorationSnapshot {
    /// Number of steps applied
    pub applied: usize,
    pub start: Option<NodeId>,
    pub visited: BTreeSet<NodeId>,
    pub processed: BTreeSet<NodeId>,
    pub skipped: BTreeSet<NodeId>,
    /// Cumulative distance reported by the last applied step
    pub distance: f64,
}

impl ExplorationSnapshot {
    /// Rebuild state from steps up to (but not including) `up_to`.
    pub fn from_steps(steps: &[ExplorationStep], up_to: usize) -> Self {
        let mut snapshot = Self::default();
        for step in steps.iter().take(up_to) {
            snapshot.apply(step);
        }
        snapshot
    }

    /// Fold one step into the snapshot.
    pub fn apply(&mut self, step: &ExplorationStep) {
        self.applied += 1;
        self.distance = step.distance;
        match step.action {
            StepAction::Start => {
                self.start = Some(step.node.clone());
                self.visited.insert(step.node.clone());
            }
            StepAction::Visit => {
                self.visited.insert(step.node.clone());
            }
            StepAction::Process => {
                self.visited.insert(step.node.clone());
                self.processed.insert(step.node.clone());
            }
            StepAction::Skip => {
                self.skipped.insert(step.node.clone());
            }
        }
    }

    /// Visited nodes that have not been expanded yet.
    pub fn frontier(&self) -> BTreeSet<NodeId> {
        self.visited.difference(&self.processed).cloned().collect()
    }
}
