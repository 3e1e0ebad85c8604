use async_trait::async_trait;

use crate::config::Credentials;
use crate::error::SessionError;
use crate::models::{System, SystemId};

/// The remote device-cloud client the lifecycle drives.
///
/// Implementations own the wire protocol, the authenticated connection, and
/// the in-memory device model; this crate decides when each operation runs.
/// Receivers are `&mut self`: exactly one loop drives the session at a time,
/// and ownership holds that invariant without locks.
#[async_trait]
pub trait CloudApi: Send {
    /// Authenticates with the cloud and establishes a fresh connection.
    ///
    /// Called again after every connection loss. Implementations must discard
    /// any state left over from a previous connection, including one that
    /// failed partway through subscribing.
    async fn connect(&mut self, credentials: &Credentials) -> Result<(), SessionError>;

    /// Subscribes to state updates for one device-system.
    async fn subscribe(&mut self, system: &SystemId) -> Result<(), SessionError>;

    /// Runs one fetch-and-apply cycle, folding pending cloud messages into
    /// the in-memory device model.
    async fn message_pump(&mut self) -> Result<(), SessionError>;

    /// Snapshot of every device-system the account knows, with whatever zone
    /// metadata has arrived so far.
    fn systems(&self) -> Vec<System>;
}
