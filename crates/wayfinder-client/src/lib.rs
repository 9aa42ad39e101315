//! Wayfinder Backend Client
//!
//! Talks to the pathfinding service and orchestrates the seed, discover and
//! route workflow.
//!
//! # Architecture
//!
//! - **Repository**: [`RouteRepository`] abstracts the backend;
//!   [`HttpRouteRepository`] is the JSON-over-HTTP implementation
//! - **Finder**: [`RouteFinder`] seeds a graph, finds a connected node pair
//!   and keeps the current route in an observable snapshot
//!
//! # Usage
//!
//! ```ignore
//! let finder = RouteFinder::new(HttpRouteRepository::from_env()?);
//! finder.seed_graph(GraphKind::Simple).await?;
//! let route = finder.find_route_auto(Algorithm::Dijkstra).await?;
//! println!("{} in {}", route.formatted_distance(), route.formatted_time());
//! ```

mod config;
mod error;
mod finder;
mod http;
mod repository;

pub use config::{ClientConfig, DEFAULT_BACKEND_URL};
pub use error::{Error, Result};
pub use finder::{
    find_safe_pair, AlgorithmComparison, FinderPhase, FinderSnapshot, RouteFinder, SafePair,
};
pub use http::HttpRouteRepository;
pub use repository::{GraphKind, RouteRepository, SeedResult};
