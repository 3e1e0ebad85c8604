//! Steady-state polling.
//!
//! Once a session is connected and subscribed, the pump polls it on a fixed
//! cadence and keeps two counters: consecutive failures, which force a
//! reinitialize once they pass the tolerated maximum, and successes since the
//! last heartbeat, which trigger a forced status publish so consumers refresh
//! data that changed without a state transition.

use tokio::time::sleep;
use tracing::{debug, error, info, instrument};

use crate::api::CloudApi;
use crate::config::SupervisorConfig;
use crate::error::{classify, Outcome, SessionError};
use crate::session::Session;
use crate::status::{SessionState, StatusSink, StatusUpdate};

/// Verdict after one poll iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PumpState {
    /// Keep polling on the same session.
    Running,
    /// The session is beyond saving; tear it down and reconnect.
    ExitReinitialize,
}

/// Counter state for one pump run. Reset whenever a fresh session starts.
pub(crate) struct MessagePump {
    errors: u32,
    heartbeat: u32,
    max_errors: u32,
    heartbeat_period: u32,
}

impl MessagePump {
    pub(crate) fn new(config: &SupervisorConfig) -> Self {
        Self {
            errors: 0,
            heartbeat: 0,
            max_errors: config.max_errors,
            heartbeat_period: config.heartbeat_period,
        }
    }

    /// Records a successful poll. Returns true when the heartbeat period
    /// elapsed and a forced publish is due.
    pub(crate) fn on_success(&mut self) -> bool {
        self.errors = 0;
        self.heartbeat += 1;
        if self.heartbeat >= self.heartbeat_period {
            self.heartbeat = 0;
            true
        } else {
            false
        }
    }

    /// Records a failed poll and decides whether the session survives it.
    pub(crate) fn on_failure(&mut self, err: &SessionError) -> PumpState {
        self.errors += 1;
        match classify(err) {
            Outcome::Unauthorized => {
                info!("session no longer authorized, reconnecting: {err}");
                PumpState::ExitReinitialize
            }
            Outcome::HttpTransient if self.errors < self.max_errors => {
                info!(errors = self.errors, "transient poll failure: {err}");
                PumpState::Running
            }
            outcome => {
                error!(kind = %outcome, errors = self.errors, "poll failed: {err}");
                if self.errors > self.max_errors {
                    PumpState::ExitReinitialize
                } else {
                    PumpState::Running
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn error_count(&self) -> u32 {
        self.errors
    }
}

/// Polls the session until it needs to be reinitialized.
///
/// Failed iterations retry immediately; only the caller publishes the
/// resulting Disconnected transition, so a pump exit and the state change
/// stay in one place.
#[instrument(name = "pump", skip_all)]
pub(crate) async fn run<A: CloudApi, S: StatusSink>(
    session: &mut Session<A>,
    sink: &S,
    config: &SupervisorConfig,
) {
    let mut pump = MessagePump::new(config);
    sleep(config.poll_interval).await;
    loop {
        match session.poll_once().await {
            Ok(()) => {
                if pump.on_success() {
                    debug!("heartbeat refresh");
                    sink.publish(StatusUpdate::forced(
                        SessionState::Connected,
                        session.metrics(),
                    ));
                }
                sleep(config.poll_interval).await;
            }
            Err(err) => {
                if pump.on_failure(&err) == PumpState::ExitReinitialize {
                    return;
                }
            }
        }
    }
}
