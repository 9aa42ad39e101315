//! Wayfinder Exploration Replay
//!
//! Step-by-step replay of a pathfinding run with playback controls.
//!
//! # Architecture
//!
//! - **Playback**: a cancellable tick task walks the exploration steps at
//!   `base_delay / speed`
//! - **Subscribers**: ordered callbacks notified once per step
//! - **Render**: adapter turning steps into map highlight events for an
//!   injected [`MapRenderer`]
//!
//! # Usage
//!
//! ```ignore
//! let controller = AnimationController::for_route(&route, &ReplayConfig::from_env());
//! let _sub = attach_renderer(&controller, renderer, &nodes);
//! controller.play()?;
//! ```

mod config;
mod error;
mod playback;
mod render;
mod subscribers;

pub use config::{ReplayConfig, DEFAULT_BASE_DELAY};
pub use error::{Error, Result};
pub use playback::{AnimationController, PlaybackSpeed, PlaybackState, PlaybackStatus};
pub use render::{attach_renderer, render_route, HighlightEvent, MapRenderer};
pub use subscribers::{StepCallback, Subscription, SubscriptionId};
