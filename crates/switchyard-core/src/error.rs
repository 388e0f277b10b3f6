// ── Core error types ──
//
// Domain-facing errors from switchyard-core. Consumers never see raw
// HTTP failures: the `From<switchyard_api::Error>` impl translates
// transport-layer errors into this taxonomy. Multi-target failure detail
// travels inside `PartialFailure` so callers always learn which devices
// succeeded, which failed, and whether the rollback itself misfired.

use serde::Serialize;
use thiserror::Error;

use crate::model::SwitchId;

/// Per-target failure detail inside a multi-device operation.
#[derive(Debug, Clone, Serialize)]
pub struct TargetFailure {
    pub switch_id: SwitchId,
    pub error: String,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Preconditions ────────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// VLAN id already present on a create target. Raised before any
    /// mutation; nothing to roll back.
    #[error("VLAN {vlan_id} already exists on switch {switch_id}")]
    Conflict { vlan_id: u16, switch_id: SwitchId },

    /// VLAN still has port memberships on a delete target (and the
    /// caller did not force).
    #[error("VLAN {vlan_id} has {member_count} port membership(s) on switch {switch_id}")]
    Dependency {
        vlan_id: u16,
        switch_id: SwitchId,
        member_count: usize,
    },

    // ── Device-level ─────────────────────────────────────────────────
    #[error("Authentication failed on {switch_id}: {message}")]
    Authentication { switch_id: SwitchId, message: String },

    #[error("Cannot reach switch {switch_id}: {message}")]
    Connection { switch_id: SwitchId, message: String },

    #[error("Switch {switch_id} timed out after {timeout_secs}s")]
    Timeout {
        switch_id: SwitchId,
        timeout_secs: u64,
    },

    #[error("Switch {switch_id} rejected the operation: {message}")]
    DeviceRejected { switch_id: SwitchId, message: String },

    // ── Registry ─────────────────────────────────────────────────────
    #[error("Unknown switch: {switch_id}")]
    NotFound { switch_id: SwitchId },

    /// Known id, but no live client (construction failed at startup).
    #[error("Switch {switch_id} is registered but unavailable: {reason}")]
    Unavailable { switch_id: SwitchId, reason: String },

    #[error("Backup not found: {backup_id}")]
    BackupNotFound { backup_id: String },

    // ── Multi-target aggregates ──────────────────────────────────────
    /// Some targets failed after others succeeded. For creates, the
    /// succeeded subset was rolled back best-effort; `rollback_errors`
    /// lists targets where even the rollback failed, meaning the network
    /// may now be inconsistent.
    #[error("{operation} failed on {} of {total} target(s){}", failures.len(),
            if rollback_errors.is_empty() { String::new() }
            else { format!(" ({} rollback failure(s) -- state may be inconsistent)", rollback_errors.len()) })]
    PartialFailure {
        operation: String,
        total: usize,
        failures: Vec<TargetFailure>,
        rolled_back: Vec<SwitchId>,
        rollback_errors: Vec<TargetFailure>,
    },

    // ── Configuration / internal ─────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Stable machine-readable kind, used at the operation boundary.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::Conflict { .. } => "conflict_error",
            Self::Dependency { .. } => "dependency_error",
            Self::Authentication { .. } => "authentication_error",
            Self::Connection { .. } => "connection_error",
            Self::Timeout { .. } => "timeout_error",
            Self::DeviceRejected { .. } => "device_error",
            Self::NotFound { .. } => "not_found",
            Self::Unavailable { .. } => "unavailable",
            Self::BackupNotFound { .. } => "not_found",
            Self::PartialFailure { .. } => "partial_failure",
            Self::Config { .. } => "config_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Tag a device-layer error with the switch it came from.
    pub fn from_api(switch_id: &SwitchId, err: switchyard_api::Error) -> Self {
        match err {
            switchyard_api::Error::Authentication { message } => Self::Authentication {
                switch_id: switch_id.clone(),
                message,
            },
            switchyard_api::Error::SessionExpired => Self::Authentication {
                switch_id: switch_id.clone(),
                message: "session expired".into(),
            },
            switchyard_api::Error::Timeout { timeout_secs } => Self::Timeout {
                switch_id: switch_id.clone(),
                timeout_secs,
            },
            switchyard_api::Error::Transport(e) => Self::Connection {
                switch_id: switch_id.clone(),
                message: e.to_string(),
            },
            switchyard_api::Error::InvalidUrl(e) => Self::Config {
                message: format!("invalid device URL: {e}"),
            },
            switchyard_api::Error::Protocol { message } => Self::DeviceRejected {
                switch_id: switch_id.clone(),
                message,
            },
            switchyard_api::Error::Deserialization { message, .. } => Self::DeviceRejected {
                switch_id: switch_id.clone(),
                message: format!("unparseable device response: {message}"),
            },
        }
    }

    /// True for errors that should flip the device to offline.
    pub fn marks_offline(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Timeout { .. } | Self::Authentication { .. }
        )
    }
}
