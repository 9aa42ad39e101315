//! Route-finding orchestration.
//!
//! [`RouteFinder`] drives the seed -> discover -> route workflow against a
//! [`RouteRepository`] and keeps an observable [`FinderSnapshot`].
//!
//! The graph (nodes and safe pair) and the current route are guarded by
//! separate generations. A response that arrives after a newer request
//! for the same part started is handed back to its caller but never
//! written into the shared state. Seeding also supersedes any route in
//! flight, since that route belongs to the previous graph.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use wayfinder_model::{Algorithm, GraphNode, NodeId, Route};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::HttpRouteRepository;
use crate::repository::{GraphKind, RouteRepository};

/// Workflow phase of a [`RouteFinder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinderPhase {
    #[default]
    Idle,
    Seeding,
    Seeded,
    Routing,
    HasRoute,
    Error,
}

impl FinderPhase {
    pub fn is_loading(&self) -> bool {
        matches!(self, FinderPhase::Seeding | FinderPhase::Routing)
    }
}

/// Two consecutive graph nodes known to be connected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SafePair {
    pub start: NodeId,
    pub end: NodeId,
}

/// Point-in-time view of a finder's state.
#[derive(Debug, Clone)]
pub struct FinderSnapshot {
    pub phase: FinderPhase,
    pub route: Option<Arc<Route>>,
    pub nodes: Arc<[GraphNode]>,
    pub loading: bool,
    pub error: Option<String>,
    pub available_node_ids: Option<SafePair>,
}

/// Both algorithms run on the same pair.
#[derive(Debug, Clone)]
pub struct AlgorithmComparison {
    pub pair: SafePair,
    pub dijkstra: Route,
    pub astar: Route,
}

impl AlgorithmComparison {
    /// Dijkstra iterations minus A* iterations.
    pub fn iteration_delta(&self) -> i64 {
        i64::from(self.dijkstra.iterations()) - i64::from(self.astar.iterations())
    }

    /// Dijkstra exploration steps minus A* exploration steps.
    pub fn exploration_delta(&self) -> i64 {
        self.dijkstra.exploration_steps().len() as i64
            - self.astar.exploration_steps().len() as i64
    }

    /// Whether both algorithms chose the same node sequence.
    pub fn same_path(&self) -> bool {
        self.dijkstra.path() == self.astar.path()
    }
}

#[derive(Debug)]
struct FinderState {
    phase: FinderPhase,
    seeding: bool,
    route: Option<Arc<Route>>,
    nodes: Arc<[GraphNode]>,
    error: Option<String>,
    safe_pair: Option<SafePair>,
}

impl FinderState {
    fn new() -> Self {
        Self {
            phase: FinderPhase::Idle,
            seeding: false,
            route: None,
            nodes: no_nodes(),
            error: None,
            safe_pair: None,
        }
    }

    /// Phase to show when no route request is pending or stored.
    fn resting_phase(&self) -> FinderPhase {
        if self.seeding {
            FinderPhase::Seeding
        } else if self.safe_pair.is_some() {
            FinderPhase::Seeded
        } else {
            FinderPhase::Idle
        }
    }
}

fn no_nodes() -> Arc<[GraphNode]> {
    Arc::from(Vec::<GraphNode>::new())
}

/// Coordinates seeding, safe-pair discovery and routing.
pub struct RouteFinder<R> {
    repository: R,
    default_algorithm: Algorithm,
    state: RwLock<FinderState>,
    graph_generation: AtomicU64,
    route_generation: AtomicU64,
}

impl RouteFinder<HttpRouteRepository> {
    /// HTTP-backed finder using the configured backend and default algorithm.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let repository = HttpRouteRepository::new(config)?;
        Ok(Self::new(repository).with_default_algorithm(config.default_algorithm))
    }
}

impl<R: RouteRepository> RouteFinder<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            default_algorithm: Algorithm::default(),
            state: RwLock::new(FinderState::new()),
            graph_generation: AtomicU64::new(0),
            route_generation: AtomicU64::new(0),
        }
    }

    /// Algorithm used by [`find_route_auto_default`](Self::find_route_auto_default).
    #[must_use]
    pub fn with_default_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.default_algorithm = algorithm;
        self
    }

    pub fn default_algorithm(&self) -> Algorithm {
        self.default_algorithm
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Current state.
    pub async fn snapshot(&self) -> FinderSnapshot {
        let state = self.state.read().await;
        FinderSnapshot {
            phase: state.phase,
            route: state.route.clone(),
            nodes: state.nodes.clone(),
            loading: state.seeding || state.phase.is_loading(),
            error: state.error.clone(),
            available_node_ids: state.safe_pair.clone(),
        }
    }

    /// Seed the backend graph, fetch its nodes and discover a routable pair.
    ///
    /// Only a newer seed makes this result stale; route requests issued
    /// meanwhile do not.
    pub async fn seed_graph(&self, kind: GraphKind) -> Result<SafePair> {
        let generation = {
            let mut state = self.state.write().await;
            let generation = self.graph_generation.fetch_add(1, Ordering::SeqCst) + 1;
            self.route_generation.fetch_add(1, Ordering::SeqCst);
            state.phase = FinderPhase::Seeding;
            state.seeding = true;
            state.error = None;
            state.route = None;
            state.safe_pair = None;
            state.nodes = no_nodes();
            generation
        };
        info!(%kind, "seeding graph");

        let discovered = match self.fetch_seeded_nodes(kind).await {
            Ok(nodes) => {
                let pair = find_safe_pair(&self.repository, &nodes).await;
                Ok((nodes, pair))
            }
            Err(e) => Err(e),
        };

        let mut state = self.state.write().await;
        if self.graph_generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "discarding stale seed result");
            return discovered.and_then(|(_, pair)| pair);
        }
        state.seeding = false;

        let (nodes, pair) = match discovered {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "seeding failed");
                state.error = Some(e.to_string());
                state.phase = FinderPhase::Error;
                return Err(e);
            }
        };
        state.nodes = Arc::from(nodes);
        match pair {
            Ok(pair) => {
                info!(start = %pair.start, end = %pair.end, "graph seeded");
                state.safe_pair = Some(pair.clone());
                // A route request issued during seeding owns the phase.
                if state.phase == FinderPhase::Seeding {
                    state.phase = FinderPhase::Seeded;
                }
                Ok(pair)
            }
            Err(e) => {
                warn!(error = %e, "no routable pair in seeded graph");
                state.error = Some(e.to_string());
                state.phase = FinderPhase::Error;
                Err(e)
            }
        }
    }

    async fn fetch_seeded_nodes(&self, kind: GraphKind) -> Result<Vec<GraphNode>> {
        self.repository.seed_graph(kind).await?;
        let nodes = self.repository.graph_nodes().await?;
        if nodes.len() < 2 {
            return Err(Error::EmptyGraph { found: nodes.len() });
        }
        Ok(nodes)
    }

    /// Route between two explicit nodes and make it the current route.
    pub async fn find_route(
        &self,
        start: &NodeId,
        end: &NodeId,
        algorithm: Algorithm,
    ) -> Result<Arc<Route>> {
        let generation = {
            let mut state = self.state.write().await;
            let generation = self.route_generation.fetch_add(1, Ordering::SeqCst) + 1;
            state.phase = FinderPhase::Routing;
            state.error = None;
            state.route = None;
            generation
        };

        let result = self.repository.find_route(start, end, algorithm).await;

        let mut state = self.state.write().await;
        if self.route_generation.load(Ordering::SeqCst) != generation {
            debug!(generation, %start, %end, "discarding stale route result");
            return result.map(Arc::new);
        }
        match result {
            Ok(route) => {
                info!(
                    %start, %end, %algorithm,
                    distance = %route.formatted_distance(),
                    steps = route.exploration_steps().len(),
                    "route found"
                );
                let route = Arc::new(route);
                state.route = Some(route.clone());
                state.phase = FinderPhase::HasRoute;
                Ok(route)
            }
            Err(e) => {
                warn!(%start, %end, error = %e, "route request failed");
                state.error = Some(e.to_string());
                state.phase = FinderPhase::Error;
                Err(e)
            }
        }
    }

    /// Route between the pair found during seeding.
    pub async fn find_route_auto(&self, algorithm: Algorithm) -> Result<Arc<Route>> {
        let pair = self.state.read().await.safe_pair.clone();
        match pair {
            Some(pair) => self.find_route(&pair.start, &pair.end, algorithm).await,
            None => {
                let error = Error::GraphNotSeeded;
                self.state.write().await.error = Some(error.to_string());
                Err(error)
            }
        }
    }

    /// [`find_route_auto`](Self::find_route_auto) with the default algorithm.
    pub async fn find_route_auto_default(&self) -> Result<Arc<Route>> {
        self.find_route_auto(self.default_algorithm).await
    }

    /// Drop the current route and any error without re-seeding.
    ///
    /// A route request in flight is superseded; a seed in flight is not.
    pub async fn clear_route(&self) {
        let mut state = self.state.write().await;
        self.route_generation.fetch_add(1, Ordering::SeqCst);
        state.route = None;
        state.error = None;
        state.phase = state.resting_phase();
    }

    /// Route the safe pair with both algorithms, one after the other.
    ///
    /// Leaves the current route untouched.
    pub async fn compare_algorithms(&self) -> Result<AlgorithmComparison> {
        let pair = self
            .state
            .read()
            .await
            .safe_pair
            .clone()
            .ok_or(Error::GraphNotSeeded)?;

        let dijkstra = self
            .repository
            .find_route(&pair.start, &pair.end, Algorithm::Dijkstra)
            .await?;
        let astar = self
            .repository
            .find_route(&pair.start, &pair.end, Algorithm::AStar)
            .await?;

        let comparison = AlgorithmComparison {
            pair,
            dijkstra,
            astar,
        };
        info!(
            iteration_delta = comparison.iteration_delta(),
            exploration_delta = comparison.exploration_delta(),
            same_path = comparison.same_path(),
            "compared algorithms"
        );
        Ok(comparison)
    }
}

/// Find the first consecutive node pair the backend can route.
///
/// Pairs `(nodes[i], nodes[i + 1])` are tried in order, one request at a
/// time, using Dijkstra. Failed trials are skipped.
pub async fn find_safe_pair<R>(repository: &R, nodes: &[GraphNode]) -> Result<SafePair>
where
    R: RouteRepository + ?Sized,
{
    if nodes.len() < 2 {
        return Err(Error::EmptyGraph { found: nodes.len() });
    }

    let mut tried = 0;
    for window in nodes.windows(2) {
        let (start, end) = (&window[0].id, &window[1].id);
        tried += 1;
        match repository.find_route(start, end, Algorithm::Dijkstra).await {
            Ok(_) => {
                debug!(%start, %end, tried, "found routable pair");
                return Ok(SafePair {
                    start: start.clone(),
                    end: end.clone(),
                });
            }
            Err(e) => debug!(%start, %end, error = %e, "pair not routable"),
        }
    }
    Err(Error::NoConnectedPairFound { tried })
}
