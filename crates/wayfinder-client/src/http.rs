//! HTTP implementation of [`RouteRepository`].
//!
//! Endpoints, relative to the configured base URL:
//! - `POST /graph/seed?kind=simple|enhanced`
//! - `GET  /graph/nodes`
//! - `GET  /route?start=..&end=..&algorithm=..`

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, warn};
use wayfinder_model::{
    graph_nodes_from_payload, Algorithm, GraphNode, NodeId, RawGraphNode, RawRoute, Route,
};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::repository::{GraphKind, RouteRepository, SeedResult};

/// Pathfinding backend reached over HTTP with JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpRouteRepository {
    http: Client,
    base_url: String,
}

impl HttpRouteRepository {
    /// Build a client for the configured backend.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build from environment configuration.
    pub fn from_env() -> Result<Self> {
        Self::new(&ClientConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl RouteRepository for HttpRouteRepository {
    async fn find_route(
        &self,
        start: &NodeId,
        end: &NodeId,
        algorithm: Algorithm,
    ) -> Result<Route> {
        debug!(%start, %end, %algorithm, "requesting route");

        let response = self
            .http
            .get(self.url("/route"))
            .query(&[
                ("start", start.as_str()),
                ("end", end.as_str()),
                ("algorithm", algorithm.as_str()),
            ])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(%start, %end, "backend reports no path");
            return Err(Error::NoPathFound {
                start: start.clone(),
                end: end.clone(),
            });
        }
        let response = ensure_success(response).await?;

        let body = response.bytes().await?;
        let raw: RawRoute = serde_json::from_slice(&body)?;
        Route::from_payload(raw, algorithm).map_err(|e| {
            let error = Error::from_route_model(e, start, end);
            if matches!(error, Error::InvalidRouteData(_)) {
                warn!(%start, %end, error = %error, "backend returned an unusable route");
            }
            error
        })
    }

    async fn graph_nodes(&self) -> Result<Vec<GraphNode>> {
        let response = self.http.get(self.url("/graph/nodes")).send().await?;
        let response = ensure_success(response).await?;

        let body = response.bytes().await?;
        let raw: Vec<RawGraphNode> = serde_json::from_slice(&body)?;
        let nodes =
            graph_nodes_from_payload(raw).map_err(|e| Error::InvalidGraphData(e.to_string()))?;

        debug!(count = nodes.len(), "fetched graph nodes");
        Ok(nodes)
    }

    async fn seed_graph(&self, kind: GraphKind) -> Result<SeedResult> {
        debug!(%kind, "seeding graph");

        let response = self
            .http
            .post(self.url("/graph/seed"))
            .query(&[("kind", kind.as_str())])
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(SeedResult::default());
        }
        Ok(SeedResult(serde_json::from_slice(&body)?))
    }
}

/// Turn a non-2xx response into [`Error::Backend`].
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = backend_message(&text)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "request failed".to_string());

    warn!(status = status.as_u16(), %message, "backend request failed");
    Err(Error::Backend {
        status: status.as_u16(),
        message,
    })
}

/// Extract a human-readable message from an error body.
///
/// Accepts `{"error": ".."}`, `{"message": ".."}` or plain text.
fn backend_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "message"] {
            if let Some(serde_json::Value::String(message)) = map.get(key) {
                return Some(message.clone());
            }
        }
    }
    Some(body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let repo = HttpRouteRepository::new(&ClientConfig::with_base_url("http://localhost:5000/api/"))
            .unwrap();
        assert_eq!(repo.base_url(), "http://localhost:5000/api");
        assert_eq!(repo.url("/graph/nodes"), "http://localhost:5000/api/graph/nodes");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = HttpRouteRepository::new(&ClientConfig::with_base_url("")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn backend_message_prefers_json_fields() {
        assert_eq!(
            backend_message(r#"{"error": "graph not built"}"#).as_deref(),
            Some("graph not built")
        );
        assert_eq!(
            backend_message(r#"{"message": "busy"}"#).as_deref(),
            Some("busy")
        );
        assert_eq!(backend_message("  oops \n").as_deref(), Some("oops"));
        assert_eq!(backend_message("   "), None);
    }
}
