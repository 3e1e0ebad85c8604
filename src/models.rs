use std::fmt::Display;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// Cloud-assigned identifier of one device-system.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemId(String);

impl Deref for SystemId {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for SystemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for SystemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SystemId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<SystemId> for String {
    fn from(value: SystemId) -> Self {
        value.0
    }
}

/// One climate zone of a device-system.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    pub id: u32,
    pub name: String,
}

/// Snapshot of one device-system as the client currently knows it.
///
/// Zone metadata arrives asynchronously after subscription; a freshly
/// subscribed system reports an empty zone list until its first messages
/// are pumped.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct System {
    pub id: SystemId,
    pub zones: Vec<Zone>,
}

impl System {
    /// A system whose zone list has not arrived yet.
    pub fn new(id: impl Into<SystemId>) -> Self {
        Self {
            id: id.into(),
            zones: Vec::new(),
        }
    }

    pub fn has_zones(&self) -> bool {
        !self.zones.is_empty()
    }
}
