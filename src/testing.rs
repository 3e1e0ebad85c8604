//! Test doubles for the crate's collaborator traits.
//!
//! [`MockCloud`] stands in for [`CloudApi`] and [`MockSink`] for
//! [`StatusSink`]. Both record every interaction and are driven by scripted
//! results, so lifecycle tests can force exact failure sequences without a
//! network. Results are queued per method; once a queue runs dry the mock
//! answers `Ok(())`, unless a sticky failure was installed.
//!
//! The cloud mock is used through an [`Arc`] so the test keeps a handle for
//! scripting and inspection while the session owns its own clone:
//!
//! ```rust,ignore
//! let cloud = Arc::new(MockCloud::new());
//! cloud.add_system(System::new("sys-1"));
//! cloud.push_poll(Err(SessionError::Http("503 service unavailable".into())));
//!
//! let sink = Arc::new(MockSink::new());
//! let supervisor = Supervisor::new(cloud.clone(), credentials, sink.clone());
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::api::CloudApi;
use crate::config::Credentials;
use crate::error::SessionError;
use crate::models::{System, SystemId, Zone};
use crate::status::{SessionState, StatusSink, StatusUpdate};

/// One recorded call against [`MockCloud`], in invocation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Connect,
    Subscribe(SystemId),
    Poll,
}

/// Scriptable [`CloudApi`] implementation.
#[derive(Default)]
pub struct MockCloud {
    connect_results: Mutex<VecDeque<Result<(), SessionError>>>,
    subscribe_results: Mutex<VecDeque<Result<(), SessionError>>>,
    poll_results: Mutex<VecDeque<Result<(), SessionError>>>,
    sticky_connect_failure: Mutex<Option<SessionError>>,
    sticky_poll_failure: Mutex<Option<SessionError>>,
    systems: Mutex<Vec<System>>,
    zone_schedule: Mutex<VecDeque<(SystemId, Zone)>>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockCloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a system the mock reports from then on.
    pub fn add_system(&self, system: System) {
        self.systems.lock().unwrap().push(system);
    }

    /// Queues the result of the next unscripted connect attempt.
    pub fn push_connect(&self, result: Result<(), SessionError>) {
        self.connect_results.lock().unwrap().push_back(result);
    }

    /// Queues the result of the next unscripted subscribe call.
    pub fn push_subscribe(&self, result: Result<(), SessionError>) {
        self.subscribe_results.lock().unwrap().push_back(result);
    }

    /// Queues the result of the next unscripted poll.
    pub fn push_poll(&self, result: Result<(), SessionError>) {
        self.poll_results.lock().unwrap().push_back(result);
    }

    /// Every connect past the queued results fails with a clone of `err`.
    pub fn always_fail_connect(&self, err: SessionError) {
        *self.sticky_connect_failure.lock().unwrap() = Some(err);
    }

    /// Every poll past the queued results fails with a clone of `err`.
    pub fn always_fail_poll(&self, err: SessionError) {
        *self.sticky_poll_failure.lock().unwrap() = Some(err);
    }

    /// Delivers `zone` to `system` on a later successful poll, one scheduled
    /// zone per poll in schedule order.
    pub fn schedule_zone(&self, system: impl Into<SystemId>, zone: Zone) {
        self.zone_schedule
            .lock()
            .unwrap()
            .push_back((system.into(), zone));
    }

    /// Everything called on the mock so far.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: MockCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_result(
        queue: &Mutex<VecDeque<Result<(), SessionError>>>,
        sticky: Option<&Mutex<Option<SessionError>>>,
    ) -> Result<(), SessionError> {
        if let Some(result) = queue.lock().unwrap().pop_front() {
            return result;
        }
        if let Some(sticky) = sticky {
            if let Some(err) = sticky.lock().unwrap().clone() {
                return Err(err);
            }
        }
        Ok(())
    }

    fn deliver_scheduled_zone(&self) {
        if let Some((system_id, zone)) = self.zone_schedule.lock().unwrap().pop_front() {
            let mut systems = self.systems.lock().unwrap();
            if let Some(system) = systems.iter_mut().find(|system| system.id == system_id) {
                system.zones.push(zone);
            }
        }
    }
}

#[async_trait]
impl CloudApi for Arc<MockCloud> {
    async fn connect(&mut self, _credentials: &Credentials) -> Result<(), SessionError> {
        self.record(MockCall::Connect);
        MockCloud::next_result(&self.connect_results, Some(&self.sticky_connect_failure))
    }

    async fn subscribe(&mut self, system: &SystemId) -> Result<(), SessionError> {
        self.record(MockCall::Subscribe(system.clone()));
        MockCloud::next_result(&self.subscribe_results, None)
    }

    async fn message_pump(&mut self) -> Result<(), SessionError> {
        self.record(MockCall::Poll);
        let result = MockCloud::next_result(&self.poll_results, Some(&self.sticky_poll_failure));
        if result.is_ok() {
            self.deliver_scheduled_zone();
        }
        result
    }

    fn systems(&self) -> Vec<System> {
        self.systems.lock().unwrap().clone()
    }
}

/// [`StatusSink`] that records every published update.
#[derive(Default)]
pub struct MockSink {
    updates: Mutex<Vec<StatusUpdate>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every update published so far.
    pub fn updates(&self) -> Vec<StatusUpdate> {
        self.updates.lock().unwrap().clone()
    }

    /// The state labels only, for transition-order assertions.
    pub fn states(&self) -> Vec<SessionState> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .map(|update| update.state)
            .collect()
    }
}

impl StatusSink for MockSink {
    fn publish(&self, update: StatusUpdate) {
        self.updates.lock().unwrap().push(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials::new("account", "secret").unwrap()
    }

    #[tokio::test]
    async fn queued_results_come_back_in_order() {
        let cloud = Arc::new(MockCloud::new());
        cloud.push_connect(Err(SessionError::Http("502 bad gateway".into())));
        cloud.push_connect(Ok(()));
        cloud.push_subscribe(Err(SessionError::Timeout("subscribe stalled".into())));

        let mut api = cloud.clone();
        assert!(api.connect(&credentials()).await.is_err());
        assert!(api.connect(&credentials()).await.is_ok());
        // Queue dry from here on.
        assert!(api.connect(&credentials()).await.is_ok());

        let system = SystemId::from("sys-1");
        assert!(api.subscribe(&system).await.is_err());
        assert!(api.subscribe(&system).await.is_ok());

        assert_eq!(
            cloud.calls(),
            vec![
                MockCall::Connect,
                MockCall::Connect,
                MockCall::Connect,
                MockCall::Subscribe(system.clone()),
                MockCall::Subscribe(system),
            ]
        );
    }

    #[tokio::test]
    async fn sticky_failures_outlast_the_queue() {
        let cloud = Arc::new(MockCloud::new());
        cloud.push_poll(Ok(()));
        cloud.always_fail_poll(SessionError::Unauthorized("token expired".into()));

        let mut api = cloud.clone();
        assert!(api.message_pump().await.is_ok());
        assert!(api.message_pump().await.is_err());
        assert!(api.message_pump().await.is_err());
    }

    #[tokio::test]
    async fn scheduled_zones_arrive_one_per_successful_poll() {
        let cloud = Arc::new(MockCloud::new());
        cloud.add_system(System::new("sys-1"));
        cloud.schedule_zone(
            "sys-1",
            Zone {
                id: 1,
                name: "Living room".into(),
            },
        );
        cloud.schedule_zone(
            "sys-1",
            Zone {
                id: 2,
                name: "Kitchen".into(),
            },
        );
        cloud.push_poll(Ok(()));
        cloud.push_poll(Err(SessionError::Http("503 service unavailable".into())));

        let mut api = cloud.clone();
        api.message_pump().await.unwrap();
        assert_eq!(api.systems()[0].zones.len(), 1);

        // Failed polls deliver nothing.
        assert!(api.message_pump().await.is_err());
        assert_eq!(api.systems()[0].zones.len(), 1);

        api.message_pump().await.unwrap();
        assert_eq!(api.systems()[0].zones.len(), 2);
    }
}
