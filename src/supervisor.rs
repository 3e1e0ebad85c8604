//! Top-level session lifecycle.
//!
//! The supervisor owns the session and drives it through its phases: connect,
//! one-time zone discovery, steady-state polling, and reconnect cycles. It
//! publishes every state transition and only ever finishes when the cloud
//! rejects the credentials.

use std::convert::Infallible;

use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{error, info, instrument, warn};

use crate::api::CloudApi;
use crate::config::{Credentials, SupervisorConfig};
use crate::error::{classify, Outcome, SessionError};
use crate::models::System;
use crate::pump;
use crate::retry::{self, RetryExit};
use crate::session::Session;
use crate::status::{SessionState, StatusSink, StatusUpdate};

/// The one way a supervisor run ends on its own.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("cloud login rejected, check the account identifier and credential secret: {0}")]
    LoginRejected(#[source] SessionError),
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Discover,
    Pump,
    Retry,
}

/// Drives one cloud session for the lifetime of the process.
///
/// Built around an injected [`CloudApi`] implementation and an injected
/// [`StatusSink`], so hosts decide how to talk to the cloud and where status
/// goes. Dropping the returned future is the shutdown path.
///
/// ```rust,ignore
/// let (status_tx, status_rx) = tokio::sync::watch::channel(StatusUpdate::default());
/// let (zones_tx, zones_rx) = tokio::sync::oneshot::channel();
///
/// let supervisor = Supervisor::new(api, Credentials::from_env()?, status_tx)
///     .with_discovery(zones_tx);
/// let handle = tokio::spawn(supervisor.run());
///
/// // Provision entities once the first zone snapshot lands.
/// let systems = zones_rx.await?;
/// ```
pub struct Supervisor<A, S> {
    session: Session<A>,
    sink: S,
    config: SupervisorConfig,
    discovery: Option<oneshot::Sender<Vec<System>>>,
    discovered: bool,
}

impl<A: CloudApi, S: StatusSink> Supervisor<A, S> {
    pub fn new(api: A, credentials: Credentials, sink: S) -> Self {
        Self {
            session: Session::new(api, credentials),
            sink,
            config: SupervisorConfig::default(),
            discovery: None,
            discovered: false,
        }
    }

    pub fn with_config(mut self, config: SupervisorConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a one-shot receiver for the first complete zone snapshot.
    ///
    /// Fires at most once per supervisor, after the first discovery pass,
    /// and never again across reconnects.
    pub fn with_discovery(mut self, notify: oneshot::Sender<Vec<System>>) -> Self {
        self.discovery = Some(notify);
        self
    }

    /// Runs the lifecycle until the cloud rejects the credentials.
    #[instrument(name = "supervisor", skip_all, err)]
    pub async fn run(mut self) -> Result<Infallible, SupervisorError> {
        self.publish(SessionState::Connecting);
        let mut phase = match self.session.connect_and_subscribe_all().await {
            Ok(()) => {
                info!("connected");
                self.publish(SessionState::Connected);
                Phase::Discover
            }
            Err(err) => self.recover_or_halt(err)?,
        };

        loop {
            phase = match phase {
                Phase::Discover => self.discover().await?,
                Phase::Pump => {
                    pump::run(&mut self.session, &self.sink, &self.config).await;
                    self.publish(SessionState::Disconnected);
                    Phase::Retry
                }
                Phase::Retry => {
                    match retry::run(&mut self.session, &self.sink, &self.config).await {
                        RetryExit::Reconnected => Phase::Discover,
                        RetryExit::LoginRejected(err) => {
                            error!("giving up, login rejected: {err}");
                            return Err(SupervisorError::LoginRejected(err));
                        }
                    }
                }
            };
        }
    }

    async fn discover(&mut self) -> Result<Phase, SupervisorError> {
        if self.discovered {
            return Ok(Phase::Pump);
        }
        match self
            .session
            .wait_for_zone_discovery(self.config.discovery_interval)
            .await
        {
            Ok(systems) => {
                info!(systems = systems.len(), "zone discovery complete");
                self.discovered = true;
                if let Some(notify) = self.discovery.take() {
                    // The receiver may be long gone; provisioning is optional.
                    let _ = notify.send(systems);
                }
                Ok(Phase::Pump)
            }
            Err(err) => self.recover_or_halt(err),
        }
    }

    /// Decides what a failed connect or discovery pass means: login
    /// rejections end the run, everything else enters the reconnect cycle.
    fn recover_or_halt(&self, err: SessionError) -> Result<Phase, SupervisorError> {
        match classify(&err) {
            Outcome::LoginFailure => {
                self.publish(SessionState::LoginFailed);
                error!("login rejected: {err}");
                Err(SupervisorError::LoginRejected(err))
            }
            kind => {
                warn!(%kind, "connect failed, entering retry: {err}");
                Ok(Phase::Retry)
            }
        }
    }

    fn publish(&self, state: SessionState) {
        self.sink
            .publish(StatusUpdate::new(state, self.session.metrics()));
    }
}
