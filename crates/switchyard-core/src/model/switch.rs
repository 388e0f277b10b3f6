// ── Switch domain types ──

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

/// Unique, immutable identifier of a managed switch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SwitchId(String);

impl SwitchId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SwitchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SwitchId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Which vendor family a device belongs to. Decides the session client
/// implementation bound at registration time; nothing else ever branches
/// on it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SwitchFamily {
    /// Structured CGI/JSON command API.
    Vimins,
    /// HTML web UI, scraped.
    Sodola,
}

/// Static description of one managed switch, fixed at startup.
#[derive(Debug, Clone)]
pub struct SwitchDescriptor {
    pub id: SwitchId,
    pub name: String,
    pub address: Url,
    pub family: SwitchFamily,
    pub model: Option<String>,
    pub username: String,
    pub password: SecretString,
    /// Per-device operation timeout. Bounds every call in a fan-out.
    pub timeout: Duration,
}

/// Last-known reachability of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reachability {
    Online,
    Offline,
}

/// Mutable per-device status, written by the health monitor and by any
/// operation that observes an auth/connection failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchRuntime {
    pub reachability: Reachability,
    pub last_health_check: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl Default for SwitchRuntime {
    fn default() -> Self {
        Self {
            reachability: Reachability::Offline,
            last_health_check: None,
            last_error: None,
        }
    }
}

impl SwitchRuntime {
    pub fn mark_online(&mut self) {
        self.reachability = Reachability::Online;
        self.last_health_check = Some(Utc::now());
        self.last_error = None;
    }

    pub fn mark_offline(&mut self, error: impl Into<String>) {
        self.reachability = Reachability::Offline;
        self.last_health_check = Some(Utc::now());
        self.last_error = Some(error.into());
    }
}
