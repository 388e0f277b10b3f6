//! Static configuration for the switchyard engine.
//!
//! TOML inventory + `SWITCHYARD_` environment overrides, credential
//! resolution (env var or plaintext), and translation to
//! `switchyard_core` types. The inventory is read once at startup; the
//! engine never reloads it.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use switchyard_core::context::EngineSettings;
use switchyard_core::model::{
    SwitchDescriptor, SwitchFamily, SwitchId, UplinkEdge, UplinkEndpoint, VlanTemplate,
};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for switch '{switch}'")]
    NoCredentials { switch: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineDefaults,

    /// The managed switch inventory. At least one entry is required.
    #[serde(default)]
    pub switches: Vec<SwitchProfile>,

    /// Configured inter-switch links.
    #[serde(default)]
    pub uplinks: Vec<UplinkProfile>,

    /// Optional VLAN templates.
    #[serde(default)]
    pub templates: Vec<TemplateProfile>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct EngineDefaults {
    /// VLAN ids that may never be created or deleted.
    #[serde(default = "default_reserved_vlans")]
    pub reserved_vlans: Vec<u16>,

    #[serde(default = "default_health_interval")]
    pub health_interval_secs: u64,

    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,

    #[serde(default = "default_history_capacity")]
    pub backup_history_capacity: usize,

    /// Default per-device timeout, overridable per switch.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for EngineDefaults {
    fn default() -> Self {
        Self {
            reserved_vlans: default_reserved_vlans(),
            health_interval_secs: default_health_interval(),
            backup_dir: default_backup_dir(),
            backup_history_capacity: default_history_capacity(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_reserved_vlans() -> Vec<u16> {
    vec![1]
}
fn default_health_interval() -> u64 {
    60
}
fn default_backup_dir() -> PathBuf {
    PathBuf::from("backups")
}
fn default_history_capacity() -> usize {
    10
}
fn default_timeout() -> u64 {
    10
}

/// One managed switch.
#[derive(Debug, Deserialize, Serialize)]
pub struct SwitchProfile {
    /// Unique identifier, referenced by every operation.
    pub id: String,

    /// Display name. Defaults to the id.
    pub name: Option<String>,

    /// Management base URL (e.g., "http://192.168.1.20").
    pub address: String,

    /// Vendor family: "vimins" or "sodola".
    pub family: String,

    pub model: Option<String>,

    pub username: String,

    /// Password in plaintext (prefer `password_env`).
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    /// Override the engine-wide per-device timeout.
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UplinkProfile {
    pub switch_a: String,
    pub port_a: String,
    pub switch_b: String,
    pub port_b: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TemplateProfile {
    pub name: String,
    pub id_range_start: u16,
    pub id_range_end: u16,
    pub security_policy: Option<String>,
    pub mtu_hint: Option<u32>,
    #[serde(default)]
    pub trunk_all_uplinks: bool,
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from a TOML file plus `SWITCHYARD_` environment
/// overrides (double underscore separates nesting levels, so
/// `SWITCHYARD_ENGINE__HEALTH_INTERVAL_SECS=30` overrides
/// `[engine] health_interval_secs`).
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SWITCHYARD_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve a switch's password: env var first, then plaintext.
pub fn resolve_password(profile: &SwitchProfile) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Some(ref password) = profile.password {
        return Ok(SecretString::from(password.clone()));
    }

    Err(ConfigError::NoCredentials {
        switch: profile.id.clone(),
    })
}

// ── Translation to core types ───────────────────────────────────────

impl Config {
    /// Validate and convert the inventory into switch descriptors.
    ///
    /// Fatal conditions: empty inventory, duplicate ids, unparseable
    /// family or address, unresolvable credentials.
    pub fn to_inventory(&self) -> Result<Vec<SwitchDescriptor>, ConfigError> {
        if self.switches.is_empty() {
            return Err(ConfigError::Validation {
                field: "switches".into(),
                reason: "at least one switch must be configured".into(),
            });
        }

        let mut seen = HashSet::new();
        let mut inventory = Vec::with_capacity(self.switches.len());
        for profile in &self.switches {
            if !seen.insert(profile.id.as_str()) {
                return Err(ConfigError::Validation {
                    field: "switches".into(),
                    reason: format!("duplicate switch id '{}'", profile.id),
                });
            }
            inventory.push(self.to_descriptor(profile)?);
        }
        Ok(inventory)
    }

    fn to_descriptor(&self, profile: &SwitchProfile) -> Result<SwitchDescriptor, ConfigError> {
        let family =
            SwitchFamily::from_str(&profile.family).map_err(|_| ConfigError::Validation {
                field: format!("switches.{}.family", profile.id),
                reason: format!("expected 'vimins' or 'sodola', got '{}'", profile.family),
            })?;

        let address: url::Url = profile
            .address
            .parse()
            .map_err(|_| ConfigError::Validation {
                field: format!("switches.{}.address", profile.id),
                reason: format!("invalid URL: {}", profile.address),
            })?;

        let password = resolve_password(profile)?;
        let timeout = Duration::from_secs(profile.timeout_secs.unwrap_or(self.engine.timeout_secs));

        Ok(SwitchDescriptor {
            id: SwitchId::new(&profile.id),
            name: profile.name.clone().unwrap_or_else(|| profile.id.clone()),
            address,
            family,
            model: profile.model.clone(),
            username: profile.username.clone(),
            password,
            timeout,
        })
    }

    /// Engine-level settings (reserved set, uplinks, backup policy).
    pub fn to_engine_settings(&self) -> EngineSettings {
        EngineSettings {
            reserved_vlans: self.engine.reserved_vlans.iter().copied().collect::<BTreeSet<_>>(),
            uplinks: self
                .uplinks
                .iter()
                .map(|u| UplinkEdge {
                    a: UplinkEndpoint {
                        switch_id: SwitchId::new(&u.switch_a),
                        port_id: u.port_a.clone(),
                    },
                    b: UplinkEndpoint {
                        switch_id: SwitchId::new(&u.switch_b),
                        port_id: u.port_b.clone(),
                    },
                })
                .collect(),
            backup_dir: self.engine.backup_dir.clone(),
            backup_history_capacity: self.engine.backup_history_capacity,
            health_interval: Duration::from_secs(self.engine.health_interval_secs),
        }
    }

    pub fn to_templates(&self) -> Vec<VlanTemplate> {
        self.templates
            .iter()
            .map(|t| VlanTemplate {
                name: t.name.clone(),
                id_range_start: t.id_range_start,
                id_range_end: t.id_range_end,
                security_policy: t.security_policy.clone(),
                mtu_hint: t.mtu_hint,
                trunk_all_uplinks: t.trunk_all_uplinks,
            })
            .collect()
    }
}

// ── Tests ───────────────────────────────────────────────────────────
