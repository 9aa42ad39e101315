//! Timed playback of an exploration step sequence.
//!
//! While playing, a single Tokio task ticks the controller: it hands the
//! step at the cursor to every subscriber, advances, then sleeps
//! `base_delay / speed` before the next tick. `pause`, `reset`, `seek` and
//! `load` bump an epoch and abort that task, so a tick that was already
//! scheduled can never notify after cancellation.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace};
use wayfinder_model::{ExplorationSnapshot, ExplorationStep, Route};

use crate::config::ReplayConfig;
use crate::error::{Error, Result};
use crate::subscribers::{StepCallback, SubscriberRegistry, Subscription};

/// Playback speed multiplier.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaybackSpeed(f64);

impl PlaybackSpeed {
    /// 0.25x speed
    pub const QUARTER: Self = Self(0.25);
    /// 0.5x speed
    pub const HALF: Self = Self(0.5);
    /// Normal speed (1x)
    pub const NORMAL: Self = Self(1.0);
    /// 2x speed
    pub const DOUBLE: Self = Self(2.0);
    /// 4x speed
    pub const QUADRUPLE: Self = Self(4.0);
    /// 10x speed
    pub const TEN_X: Self = Self(10.0);

    /// Create a speed, rejecting zero, negative and non-finite values.
    pub fn new(multiplier: f64) -> Result<Self> {
        if multiplier.is_finite() && multiplier > 0.0 {
            Ok(Self(multiplier))
        } else {
            Err(Error::InvalidSpeed(multiplier))
        }
    }

    /// Get the speed multiplier.
    pub fn multiplier(&self) -> f64 {
        self.0
    }

    /// Delay between two steps at this speed, saturating at `Duration::MAX`.
    pub fn step_delay(&self, base: Duration) -> Duration {
        Duration::try_from_secs_f64(base.as_secs_f64() / self.0).unwrap_or(Duration::MAX)
    }
}

impl Default for PlaybackSpeed {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// Current state of playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Playback is at the beginning and not running
    Idle,
    /// Playback is running forward
    Playing,
    /// Playback is paused
    Paused,
    /// Every step has been delivered
    Finished,
}

struct Cursor {
    steps: Arc<[ExplorationStep]>,
    current_step: usize,
    state: PlaybackState,
    speed: PlaybackSpeed,
    epoch: u64,
    task: Option<JoinHandle<()>>,
}

impl Cursor {
    /// Invalidate the running tick task, if any.
    fn cancel(&mut self) {
        self.epoch += 1;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct Shared {
    cursor: Mutex<Cursor>,
    subscribers: Arc<Mutex<SubscriberRegistry>>,
    state_tx: watch::Sender<PlaybackState>,
    base_delay: Duration,
}

impl Shared {
    fn set_state(&self, cursor: &mut Cursor, state: PlaybackState) {
        if cursor.state != state {
            trace!(from = ?cursor.state, to = ?state, "playback transition");
            cursor.state = state;
            self.state_tx.send_replace(state);
        }
    }
}

/// Replays exploration steps on a fixed cadence.
///
/// Cloning yields another handle to the same playback.
#[derive(Clone)]
pub struct AnimationController {
    shared: Arc<Shared>,
}

impl AnimationController {
    /// Create a controller with the default cadence.
    pub fn new(steps: Vec<ExplorationStep>) -> Self {
        Self::with_config(steps, &ReplayConfig::default())
    }

    /// Create a controller with an explicit configuration.
    pub fn with_config(steps: Vec<ExplorationStep>, config: &ReplayConfig) -> Self {
        let speed = PlaybackSpeed::new(config.initial_speed).unwrap_or_default();
        let (state_tx, _) = watch::channel(PlaybackState::Idle);
        Self {
            shared: Arc::new(Shared {
                cursor: Mutex::new(Cursor {
                    steps: steps.into(),
                    current_step: 0,
                    state: PlaybackState::Idle,
                    speed,
                    epoch: 0,
                    task: None,
                }),
                subscribers: Arc::new(Mutex::new(SubscriberRegistry::default())),
                state_tx,
                base_delay: config.base_delay,
            }),
        }
    }

    /// Create a controller replaying a route's exploration trace.
    pub fn for_route(route: &Route, config: &ReplayConfig) -> Self {
        Self::with_config(route.exploration_steps().to_vec(), config)
    }

    /// Replace the step sequence, cancelling any running playback.
    /// Subscribers are kept.
    pub fn load(&self, steps: Vec<ExplorationStep>) {
        let mut cursor = self.shared.cursor.lock();
        cursor.cancel();
        cursor.steps = steps.into();
        cursor.current_step = 0;
        self.shared.set_state(&mut cursor, PlaybackState::Idle);
        debug!(total = cursor.steps.len(), "loaded exploration steps");
    }

    /// Get the index of the next step to deliver.
    pub fn current_step(&self) -> usize {
        self.shared.cursor.lock().current_step
    }

    /// Get the total number of steps.
    pub fn total_steps(&self) -> usize {
        self.shared.cursor.lock().steps.len()
    }

    /// Get the current playback state.
    pub fn state(&self) -> PlaybackState {
        self.shared.cursor.lock().state
    }

    /// Get the current playback speed.
    pub fn speed(&self) -> PlaybackSpeed {
        self.shared.cursor.lock().speed
    }

    /// Get the delay between steps at 1x speed.
    pub fn base_delay(&self) -> Duration {
        self.shared.base_delay
    }

    /// Percentage of steps delivered, 0 when there are none.
    pub fn progress(&self) -> f64 {
        let cursor = self.shared.cursor.lock();
        if cursor.steps.is_empty() {
            0.0
        } else {
            cursor.current_step as f64 / cursor.steps.len() as f64 * 100.0
        }
    }

    /// Receiver that observes every state transition.
    pub fn watch_state(&self) -> watch::Receiver<PlaybackState> {
        self.shared.state_tx.subscribe()
    }

    /// Register a callback for every delivered step.
    ///
    /// A callback registered while a tick is notifying is first called on
    /// the following tick.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ExplorationStep) + Send + Sync + 'static,
    {
        let callback: StepCallback = Arc::new(callback);
        let id = self.shared.subscribers.lock().insert(callback);
        Subscription::new(id, &self.shared.subscribers)
    }

    /// Get the number of registered callbacks.
    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.lock().len()
    }

    /// Start or resume playback from the current step.
    ///
    /// Has no effect while already playing or once finished; call
    /// [`reset`](Self::reset) to replay from the start.
    pub fn play(&self) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| Error::NoRuntime)?;

        let mut cursor = self.shared.cursor.lock();
        match cursor.state {
            PlaybackState::Playing | PlaybackState::Finished => return Ok(()),
            PlaybackState::Idle | PlaybackState::Paused => {}
        }
        if cursor.current_step >= cursor.steps.len() {
            self.shared.set_state(&mut cursor, PlaybackState::Finished);
            return Ok(());
        }

        cursor.cancel();
        let epoch = cursor.epoch;
        self.shared.set_state(&mut cursor, PlaybackState::Playing);
        debug!(from = cursor.current_step, speed = cursor.speed.multiplier(), "playback started");
        cursor.task = Some(runtime.spawn(run_ticks(Arc::downgrade(&self.shared), epoch)));
        Ok(())
    }

    /// Pause playback, keeping the current step.
    pub fn pause(&self) {
        let mut cursor = self.shared.cursor.lock();
        if cursor.state == PlaybackState::Playing {
            cursor.cancel();
            self.shared.set_state(&mut cursor, PlaybackState::Paused);
            debug!(at = cursor.current_step, "playback paused");
        }
    }

    /// Stop playback and return to the first step.
    pub fn reset(&self) {
        let mut cursor = self.shared.cursor.lock();
        cursor.cancel();
        cursor.current_step = 0;
        self.shared.set_state(&mut cursor, PlaybackState::Idle);
    }

    /// Set the speed multiplier; applies from the next scheduled delay.
    pub fn set_speed(&self, multiplier: f64) -> Result<()> {
        let speed = PlaybackSpeed::new(multiplier)?;
        self.shared.cursor.lock().speed = speed;
        Ok(())
    }

    /// Move the cursor, clamped to the sequence. A running playback is
    /// paused first.
    pub fn seek(&self, step: usize) {
        let mut cursor = self.shared.cursor.lock();
        cursor.cancel();
        cursor.current_step = step.min(cursor.steps.len());
        let state = if !cursor.steps.is_empty() && cursor.current_step == cursor.steps.len() {
            PlaybackState::Finished
        } else if cursor.current_step == 0 && cursor.state == PlaybackState::Idle {
            PlaybackState::Idle
        } else {
            PlaybackState::Paused
        };
        self.shared.set_state(&mut cursor, state);
    }

    /// Deliver exactly one step while not playing.
    ///
    /// Returns the delivered step, or `None` when playing or at the end.
    pub fn step_forward(&self) -> Option<ExplorationStep> {
        let step = {
            let mut cursor = self.shared.cursor.lock();
            if cursor.state == PlaybackState::Playing {
                return None;
            }
            let step = cursor.steps.get(cursor.current_step)?.clone();
            cursor.current_step += 1;
            let state = if cursor.current_step >= cursor.steps.len() {
                PlaybackState::Finished
            } else {
                PlaybackState::Paused
            };
            self.shared.set_state(&mut cursor, state);
            step
        };
        notify(&self.shared, &step);
        Some(step)
    }

    /// Exploration state after the steps delivered so far.
    pub fn snapshot(&self) -> ExplorationSnapshot {
        let cursor = self.shared.cursor.lock();
        ExplorationSnapshot::from_steps(&cursor.steps, cursor.current_step)
    }

    /// Serializable view of the playback.
    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus::from(self)
    }
}

impl std::fmt::Debug for AnimationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cursor = self.shared.cursor.lock();
        f.debug_struct("AnimationController")
            .field("current_step", &cursor.current_step)
            .field("total_steps", &cursor.steps.len())
            .field("state", &cursor.state)
            .field("speed", &cursor.speed)
            .finish()
    }
}

fn notify(shared: &Shared, step: &ExplorationStep) {
    let callbacks = shared.subscribers.lock().snapshot();
    for callback in callbacks {
        callback(step);
    }
}

async fn run_ticks(shared: Weak<Shared>, epoch: u64) {
    loop {
        // Dropping every controller handle ends the replay.
        let Some(strong) = shared.upgrade() else {
            return;
        };

        let step = {
            let mut cursor = strong.cursor.lock();
            if cursor.epoch != epoch || cursor.state != PlaybackState::Playing {
                return;
            }
            let Some(step) = cursor.steps.get(cursor.current_step).cloned() else {
                strong.set_state(&mut cursor, PlaybackState::Finished);
                cursor.task = None;
                return;
            };
            cursor.current_step += 1;
            step
        };

        trace!(step = step.step_number, node = %step.node, "tick");
        notify(&strong, &step);

        let delay = {
            let mut cursor = strong.cursor.lock();
            if cursor.epoch != epoch {
                return;
            }
            if cursor.current_step >= cursor.steps.len() {
                strong.set_state(&mut cursor, PlaybackState::Finished);
                cursor.task = None;
                debug!(total = cursor.steps.len(), "playback finished");
                return;
            }
            cursor.speed.step_delay(strong.base_delay)
        };
        drop(strong);

        tokio::time::sleep(delay).await;
    }
}

/// Playback status for sending to a front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub current_step: usize,
    pub total_steps: usize,
    pub state: PlaybackState,
    pub speed: PlaybackSpeed,
    pub progress: f64,
}

impl From<&AnimationController> for PlaybackStatus {
    fn from(controller: &AnimationController) -> Self {
        let cursor = controller.shared.cursor.lock();
        let total = cursor.steps.len();
        let progress = if total == 0 {
            0.0
        } else {
            cursor.current_step as f64 / total as f64 * 100.0
        };
        Self {
            current_step: cursor.current_step,
            total_steps: total,
            state: cursor.state,
            speed: cursor.speed,
            progress,
        }
    }
}
