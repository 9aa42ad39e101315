//! Scriptable in-process pathfinding backend.
//!
//! Serves the same endpoints as the real service under `/api`, with node
//! lists and route replies fixed up front, and records every request it
//! receives.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use wayfinder_client::ClientConfig;

/// Reply for one `(start, end)` route request.
#[derive(Debug, Clone)]
pub enum RouteReply {
    /// 200 with this body.
    Json(Value),
    /// Non-success status with a JSON `{"error": ..}` body.
    Status(u16, String),
}

/// Mock backend definition.
#[derive(Debug, Default)]
pub struct MockBackend {
    nodes: Value,
    routes: HashMap<(String, String), RouteReply>,
    requests: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            nodes: json!([]),
            ..Self::default()
        }
    }

    /// Body returned by `GET /api/graph/nodes`.
    pub fn with_nodes(mut self, nodes: Value) -> Self {
        self.nodes = nodes;
        self
    }

    /// Reply for `GET /api/route?start=..&end=..`. Unlisted pairs get a 404.
    pub fn with_route(mut self, start: &str, end: &str, reply: RouteReply) -> Self {
        self.routes
            .insert((start.to_string(), end.to_string()), reply);
        self
    }

    /// Bind an ephemeral local port and serve in the background.
    pub async fn spawn(self) -> std::io::Result<RunningBackend> {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(self);
        let app = router(state.clone());

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::warn!(error = %e, "mock backend stopped");
            }
        });
        tracing::debug!(%addr, "mock backend listening");

        Ok(RunningBackend {
            base_url: format!("http://{addr}/api"),
            state,
            handle,
        })
    }

    fn record(&self, entry: String) {
        self.requests.lock().push(entry);
    }
}

/// A served [`MockBackend`]. Stops serving when dropped.
pub struct RunningBackend {
    base_url: String,
    state: Arc<MockBackend>,
    handle: JoinHandle<()>,
}

impl RunningBackend {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::with_base_url(self.base_url.clone())
    }

    /// Requests received so far, as `"METHOD path?query"` lines.
    pub fn requests(&self) -> Vec<String> {
        self.state.requests.lock().clone()
    }
}

impl Drop for RunningBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn router(state: Arc<MockBackend>) -> Router {
    Router::new()
        .route("/api/graph/seed", post(seed_handler))
        .route("/api/graph/nodes", get(nodes_handler))
        .route("/api/route", get(route_handler))
        .with_state(state)
}

#[derive(Deserialize)]
struct SeedQuery {
    kind: Option<String>,
}

async fn seed_handler(
    State(state): State<Arc<MockBackend>>,
    Query(query): Query<SeedQuery>,
) -> Json<Value> {
    let kind = query.kind.unwrap_or_else(|| "simple".to_string());
    state.record(format!("POST /graph/seed?kind={kind}"));
    Json(json!({ "status": "seeded", "kind": kind }))
}

async fn nodes_handler(State(state): State<Arc<MockBackend>>) -> Json<Value> {
    state.record("GET /graph/nodes".to_string());
    Json(state.nodes.clone())
}

#[derive(Deserialize)]
struct RouteQuery {
    start: String,
    end: String,
    algorithm: String,
}

async fn route_handler(
    State(state): State<Arc<MockBackend>>,
    Query(query): Query<RouteQuery>,
) -> Response {
    state.record(format!(
        "GET /route?start={}&end={}&algorithm={}",
        query.start, query.end, query.algorithm
    ));

    match state.routes.get(&(query.start, query.end)) {
        Some(RouteReply::Json(body)) => Json(body.clone()).into_response(),
        Some(RouteReply::Status(code, message)) => {
            let status = StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(json!({ "error": message }))).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({ "error": "No path found" }))).into_response(),
    }
}

/// Route body in the backend's wire format.
///
/// `path` lists `(id, lat, lng)`; the exploration visits each path node in
/// order after a start step.
pub fn route_payload(algorithm: &str, path: &[(u64, f64, f64)], distance: f64, time: f64) -> Value {
    let steps: Vec<Value> = path
        .iter()
        .enumerate()
        .map(|(i, (id, lat, lng))| {
            let action = if i == 0 { "start" } else { "process" };
            json!({
                "stepNumber": i,
                "action": action,
                "node": { "id": id, "lat": lat, "lng": lng },
                "distance": i as f64 * distance / path.len().max(1) as f64,
            })
        })
        .collect();
    let details: Vec<Value> = path
        .iter()
        .map(|(id, lat, lng)| json!({ "nodeId": id, "lat": lat, "lng": lng }))
        .collect();

    json!({
        "algorithm": algorithm,
        "explorationSteps": steps,
        "nodeDetails": details,
        "totalDistance": distance,
        "totalTime": time,
        "iterations": path.len(),
    })
}
