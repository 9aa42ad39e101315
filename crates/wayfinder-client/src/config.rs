//! Backend client configuration.
//!
//! Read from environment variables:
//! - `WAYFINDER_BACKEND_URL`: pathfinding service root (default: `http://localhost:5000/api`)
//! - `WAYFINDER_TIMEOUT_SECS`: per-request timeout (default: 30)
//! - `WAYFINDER_ALGORITHM`: algorithm used by automatic routing (default: `dijkstra`)

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;
use wayfinder_model::Algorithm;

use crate::error::{Error, Result};

/// Default backend root.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000/api";

/// Configuration for the pathfinding backend client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend root URL, without trailing slash
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Algorithm used when the caller does not pick one
    pub default_algorithm: Algorithm,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ClientConfig {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        let base_url = std::env::var("WAYFINDER_BACKEND_URL")
            .unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());

        let timeout_secs = match std::env::var("WAYFINDER_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(value = %raw, "ignoring invalid WAYFINDER_TIMEOUT_SECS");
                30
            }),
            Err(_) => 30,
        };

        let default_algorithm = match std::env::var("WAYFINDER_ALGORITHM") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(value = %raw, "ignoring invalid WAYFINDER_ALGORITHM");
                Algorithm::default()
            }),
            Err(_) => Algorithm::default(),
        };

        Self {
            base_url,
            timeout_secs,
            default_algorithm,
        }
    }

    /// Config pointing at an explicit backend, other fields defaulted.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: 30,
            default_algorithm: Algorithm::default(),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("base_url {:?}: {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "base_url must be http or https, got {}",
                url.scheme()
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_url_is_valid() {
        let config = ClientConfig::with_base_url("http://127.0.0.1:8080/api");
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.default_algorithm, Algorithm::Dijkstra);
    }

    #[test]
    fn rejects_bad_url_and_timeout() {
        assert!(ClientConfig::with_base_url("not a url").validate().is_err());
        assert!(ClientConfig::with_base_url("ftp://host/api").validate().is_err());

        let mut config = ClientConfig::with_base_url("http://localhost");
        config.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    // Every case touching the client variables lives here so that parallel
    // tests never observe a half-set environment.
    #[test]
    fn from_env_overrides_and_fallbacks() {
        std::env::set_var("WAYFINDER_BACKEND_URL", "https://routes.example.org/api");
        std::env::set_var("WAYFINDER_TIMEOUT_SECS", " 5 ");
        std::env::set_var("WAYFINDER_ALGORITHM", "a*");
        let config = ClientConfig::from_env();
        assert_eq!(config.base_url, "https://routes.example.org/api");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.default_algorithm, Algorithm::AStar);
        assert!(config.validate().is_ok());

        std::env::set_var("WAYFINDER_TIMEOUT_SECS", "forever");
        std::env::set_var("WAYFINDER_ALGORITHM", "bellman-ford");
        let config = ClientConfig::from_env();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.default_algorithm, Algorithm::Dijkstra);

        std::env::remove_var("WAYFINDER_BACKEND_URL");
        std::env::remove_var("WAYFINDER_TIMEOUT_SECS");
        std::env::remove_var("WAYFINDER_ALGORITHM");
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BACKEND_URL);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.default_algorithm, Algorithm::Dijkstra);
    }
}
