use std::time::Duration;

use serde::Serialize;
use tokio::time::sleep;
use tracing::debug;

use crate::api::CloudApi;
use crate::config::Credentials;
use crate::error::SessionError;
use crate::models::System;

/// Counters published with every status update.
///
/// Observability state, not session state: the counters survive reconnects,
/// unlike the connection itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionMetrics {
    /// Poll iterations that completed.
    pub success_count: u64,
    /// Poll iterations that failed.
    pub error_count: u64,
    /// Successful connects after the first.
    pub reconnect_count: u64,
}

impl SessionMetrics {
    pub fn total_polls(&self) -> u64 {
        self.success_count + self.error_count
    }

    /// Fraction of polls that succeeded; 1.0 when nothing ran yet.
    pub fn success_rate(&self) -> f64 {
        if self.total_polls() == 0 {
            return 1.0;
        }
        self.success_count as f64 / self.total_polls() as f64
    }
}

/// One authenticated connection epoch to the device cloud.
///
/// Owns the client and the immutable credentials; reconnecting reuses both.
/// Each operation returns the client's error untouched, classification is
/// the caller's concern.
pub struct Session<A> {
    api: A,
    credentials: Credentials,
    metrics: SessionMetrics,
    connected_once: bool,
}

impl<A: CloudApi> Session<A> {
    pub fn new(api: A, credentials: Credentials) -> Self {
        Self {
            api,
            credentials,
            metrics: SessionMetrics::default(),
            connected_once: false,
        }
    }

    /// Logs in and subscribes to every known device-system.
    pub async fn connect_and_subscribe_all(&mut self) -> Result<(), SessionError> {
        self.api.connect(&self.credentials).await?;
        for system in self.api.systems() {
            self.api.subscribe(&system.id).await?;
        }
        if self.connected_once {
            self.metrics.reconnect_count += 1;
        }
        self.connected_once = true;
        Ok(())
    }

    /// One fetch-and-apply cycle of device state.
    pub async fn poll_once(&mut self) -> Result<(), SessionError> {
        match self.api.message_pump().await {
            Ok(()) => {
                self.metrics.success_count += 1;
                Ok(())
            }
            Err(err) => {
                self.metrics.error_count += 1;
                Err(err)
            }
        }
    }

    /// Polls until every known system reports at least one zone, then
    /// returns the system snapshot.
    ///
    /// Zone metadata arrives asynchronously after subscription, so each
    /// iteration sleeps one interval and pumps once before recounting.
    /// Completes immediately when no systems are known; runs until cancelled
    /// if a system never reports zones.
    pub async fn wait_for_zone_discovery(
        &mut self,
        interval: Duration,
    ) -> Result<Vec<System>, SessionError> {
        let total = self.api.systems().len();
        let mut ready = 0;
        while ready < total {
            debug!(ready, total, "waiting for zone discovery");
            sleep(interval).await;
            self.poll_once().await?;
            ready = self.api.systems().iter().filter(|s| s.has_zones()).count();
        }
        Ok(self.api.systems())
    }

    /// Snapshot of the client's current device model.
    pub fn systems(&self) -> Vec<System> {
        self.api.systems()
    }

    pub fn metrics(&self) -> SessionMetrics {
        self.metrics
    }
}
