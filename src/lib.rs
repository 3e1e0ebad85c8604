//! Supervised session lifecycle for cloud-connected home climate systems.
//!
//! A [`Supervisor`] owns one cloud session and keeps it alive for the
//! lifetime of the process: it connects with the configured credentials,
//! subscribes every reported system, waits once for the zone topology to
//! arrive, then polls on a fixed cadence. Dead sessions are rebuilt through
//! a retry cycle; only a rejected login ends the run.
//!
//! The cloud itself sits behind the [`CloudApi`] trait and status reporting
//! behind [`StatusSink`], so hosts plug in their own transport and their own
//! state consumer. Every transition between [`SessionState`]s is published
//! with a metrics snapshot, plus a periodic forced refresh while polling
//! stays healthy.
//!
//! ```rust,ignore
//! use zonelink::{Credentials, StatusUpdate, Supervisor};
//!
//! let credentials = Credentials::from_env()?;
//! let (status_tx, mut status_rx) = tokio::sync::watch::channel(StatusUpdate::default());
//! let (zones_tx, zones_rx) = tokio::sync::oneshot::channel();
//!
//! let supervisor = Supervisor::new(api, credentials, status_tx).with_discovery(zones_tx);
//! let lifecycle = tokio::spawn(supervisor.run());
//!
//! // Fires once, after the first complete zone snapshot.
//! let systems = zones_rx.await?;
//! provision_entities(&systems);
//!
//! while status_rx.changed().await.is_ok() {
//!     render(*status_rx.borrow());
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod models;
mod pump;
mod retry;
pub mod session;
pub mod status;
pub mod supervisor;
pub mod testing;

pub use api::CloudApi;
pub use config::{ConfigError, Credentials, Secret, SupervisorConfig};
pub use error::{classify, Outcome, SessionError};
pub use models::{System, SystemId, Zone};
pub use session::{Session, SessionMetrics};
pub use status::{SessionState, StatusSink, StatusUpdate};
pub use supervisor::{Supervisor, SupervisorError};
