//! Bridge between playback and a map-rendering collaborator.
//!
//! The renderer is always passed in by the caller; this crate never looks
//! one up from global state.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use wayfinder_model::{Coordinate, ExplorationStep, GraphNode, NodeId, Route, StepAction};

use crate::playback::AnimationController;
use crate::subscribers::Subscription;

/// Drawing surface for exploration highlights and route paths.
pub trait MapRenderer: Send + Sync {
    /// Highlight one node for one replayed step.
    fn highlight(&self, event: &HighlightEvent);

    /// Draw the final path.
    fn draw_path(&self, path: &[Coordinate]);

    /// Remove everything previously drawn.
    fn clear(&self) {}
}

/// Per-step highlight instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightEvent {
    pub node: NodeId,
    pub position: Option<Coordinate>,
    pub action: StepAction,
    pub color: &'static str,
    pub radius: u32,
}

impl HighlightEvent {
    /// Style a step. `fallback` is used when the step carries no position.
    pub fn for_step(step: &ExplorationStep, fallback: Option<Coordinate>) -> Self {
        let (color, radius) = style(step.action);
        Self {
            node: step.node.clone(),
            position: step.position.or(fallback),
            action: step.action,
            color,
            radius,
        }
    }
}

fn style(action: StepAction) -> (&'static str, u32) {
    match action {
        StepAction::Start => ("#22c55e", 10),
        StepAction::Visit => ("#f59e0b", 6),
        StepAction::Process => ("#3b82f6", 7),
        StepAction::Skip => ("#9ca3af", 4),
    }
}

/// Forward every replayed step to `renderer` as a highlight.
///
/// `nodes` supplies positions for steps that only carry an id.
pub fn attach_renderer(
    controller: &AnimationController,
    renderer: Arc<dyn MapRenderer>,
    nodes: &[GraphNode],
) -> Subscription {
    let positions: HashMap<NodeId, Coordinate> = nodes
        .iter()
        .map(|node| (node.id.clone(), node.coordinate))
        .collect();
    controller.subscribe(move |step| {
        let event = HighlightEvent::for_step(step, positions.get(&step.node).copied());
        renderer.highlight(&event);
    })
}

/// Clear the surface and draw a route's path.
pub fn render_route(renderer: &dyn MapRenderer, route: &Route) {
    renderer.clear();
    renderer.draw_path(&route.path_coordinates());
}
