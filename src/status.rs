use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::{mpsc, watch};

use crate::session::SessionMetrics;

/// Lifecycle state of the cloud session.
///
/// Exactly one is current at any time; the supervisor publishes every change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// A connect attempt is in flight.
    #[default]
    Connecting,
    /// The session died; a reconnect cycle is about to start.
    Disconnected,
    /// The cloud rejected the credentials. Terminal.
    LoginFailed,
    /// Subscribed and polling.
    Connected,
    /// Sleeping out the fixed delay before the next reconnect attempt.
    RetryWait,
    /// Recovery was abandoned. Terminal; no transition currently produces it.
    Failed,
}

impl SessionState {
    /// Whether the state ends automatic recovery for this run.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::LoginFailed | SessionState::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::Connecting => "Connecting",
            SessionState::Disconnected => "Disconnected",
            SessionState::LoginFailed => "LoginFailed",
            SessionState::Connected => "Connected",
            SessionState::RetryWait => "RetryWait",
            SessionState::Failed => "Failed",
        };
        f.write_str(label)
    }
}

/// One status publish: the state label, the metrics current at publish time,
/// and whether downstream consumers should refresh even though the label did
/// not change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusUpdate {
    pub state: SessionState,
    pub metrics: SessionMetrics,
    pub force: bool,
}

impl StatusUpdate {
    pub fn new(state: SessionState, metrics: SessionMetrics) -> Self {
        Self {
            state,
            metrics,
            force: false,
        }
    }

    /// The periodic data-fresh heartbeat carries the force flag.
    pub fn forced(state: SessionState, metrics: SessionMetrics) -> Self {
        Self {
            state,
            metrics,
            force: true,
        }
    }

    /// Renders the payload for key-value status registers, with the state as
    /// its display label.
    pub fn to_value(&self) -> Value {
        json!({
            "state": self.state.to_string(),
            "metrics": self.metrics,
            "force": self.force,
        })
    }
}

/// Where the supervisor reports lifecycle transitions.
///
/// Publishes are fire-and-forget: the supervisor never blocks on, nor fails
/// because of, a slow or dropped consumer. Publishing the same state twice
/// is expected and harmless.
pub trait StatusSink: Send + Sync {
    fn publish(&self, update: StatusUpdate);
}

/// Latest-value distribution, for hosts that only render the current state.
impl StatusSink for watch::Sender<StatusUpdate> {
    fn publish(&self, update: StatusUpdate) {
        // Nobody listening is fine; the supervisor keeps running.
        let _ = self.send(update);
    }
}

/// Full-history distribution, for hosts that consume every transition.
impl StatusSink for mpsc::UnboundedSender<StatusUpdate> {
    fn publish(&self, update: StatusUpdate) {
        let _ = self.send(update);
    }
}

impl<S: StatusSink + ?Sized> StatusSink for Arc<S> {
    fn publish(&self, update: StatusUpdate) {
        (**self).publish(update);
    }
}
