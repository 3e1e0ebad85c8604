//! Reconnect cycle for a dead session.
//!
//! Runs until a connect attempt succeeds or the cloud rejects the
//! credentials outright. Transient and unknown failures never end the loop;
//! they only start another wait.

use tokio::time::sleep;
use tracing::{error, info, instrument};

use crate::api::CloudApi;
use crate::config::SupervisorConfig;
use crate::error::{classify, Outcome, SessionError};
use crate::session::Session;
use crate::status::{SessionState, StatusSink, StatusUpdate};

/// Why the reconnect loop stopped.
#[derive(Debug)]
pub(crate) enum RetryExit {
    /// A connect attempt succeeded; the session is live again.
    Reconnected,
    /// The cloud rejected the credentials. Retrying cannot fix this.
    LoginRejected(SessionError),
}

/// Reconnects the session, waiting out the retry interval between attempts.
#[instrument(name = "retry", skip_all)]
pub(crate) async fn run<A: CloudApi, S: StatusSink>(
    session: &mut Session<A>,
    sink: &S,
    config: &SupervisorConfig,
) -> RetryExit {
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        sink.publish(StatusUpdate::new(
            SessionState::RetryWait,
            session.metrics(),
        ));
        sleep(config.retry_interval).await;

        sink.publish(StatusUpdate::new(
            SessionState::Connecting,
            session.metrics(),
        ));
        info!(attempt, "reconnecting");
        match session.connect_and_subscribe_all().await {
            Ok(()) => {
                sink.publish(StatusUpdate::new(
                    SessionState::Connected,
                    session.metrics(),
                ));
                info!(attempt, "reconnected");
                return RetryExit::Reconnected;
            }
            Err(err) => match classify(&err) {
                Outcome::LoginFailure => {
                    sink.publish(StatusUpdate::new(
                        SessionState::LoginFailed,
                        session.metrics(),
                    ));
                    return RetryExit::LoginRejected(err);
                }
                kind => {
                    error!(%kind, attempt, "reconnect failed: {err}");
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;
    use crate::config::Credentials;
    use crate::testing::{MockCall, MockCloud, MockSink};

    fn test_config() -> SupervisorConfig {
        SupervisorConfig {
            poll_interval: Duration::from_millis(1),
            retry_interval: Duration::from_millis(1),
            discovery_interval: Duration::from_millis(1),
            ..SupervisorConfig::default()
        }
    }

    fn credentials() -> Credentials {
        Credentials::new("account", "secret").unwrap()
    }

    fn http() -> SessionError {
        SessionError::Http("connect reset by peer".into())
    }

    #[tokio::test]
    async fn retries_transients_until_success() {
        let cloud = Arc::new(MockCloud::new());
        cloud.push_connect(Err(http()));
        cloud.push_connect(Err(http()));
        let mut session = Session::new(cloud.clone(), credentials());
        let sink = MockSink::new();

        let exit = run(&mut session, &sink, &test_config()).await;

        assert!(matches!(exit, RetryExit::Reconnected));
        assert_eq!(
            sink.states(),
            vec![
                SessionState::RetryWait,
                SessionState::Connecting,
                SessionState::RetryWait,
                SessionState::Connecting,
                SessionState::RetryWait,
                SessionState::Connecting,
                SessionState::Connected,
            ]
        );
    }

    #[tokio::test]
    async fn login_rejection_stops_the_loop() {
        let cloud = Arc::new(MockCloud::new());
        cloud.push_connect(Err(SessionError::Login("bad secret".into())));
        let mut session = Session::new(cloud.clone(), credentials());
        let sink = MockSink::new();

        let exit = run(&mut session, &sink, &test_config()).await;

        assert!(matches!(exit, RetryExit::LoginRejected(_)));
        assert_eq!(sink.states().last(), Some(&SessionState::LoginFailed));
    }

    #[tokio::test]
    async fn unauthorized_during_connect_keeps_retrying() {
        let cloud = Arc::new(MockCloud::new());
        cloud.push_connect(Err(SessionError::Unauthorized("stale token".into())));
        let mut session = Session::new(cloud.clone(), credentials());
        let sink = MockSink::new();

        let exit = run(&mut session, &sink, &test_config()).await;

        assert!(matches!(exit, RetryExit::Reconnected));
        let connects = cloud
            .calls()
            .into_iter()
            .filter(|call| *call == MockCall::Connect)
            .count();
        assert_eq!(connects, 2);
    }

    #[tokio::test]
    async fn never_terminates_on_transient_failures() {
        let cloud = Arc::new(MockCloud::new());
        cloud.always_fail_connect(http());
        let mut session = Session::new(cloud.clone(), credentials());
        let sink = MockSink::new();

        let bounded = timeout(
            Duration::from_millis(50),
            run(&mut session, &sink, &test_config()),
        )
        .await;

        assert!(bounded.is_err());
    }
}
