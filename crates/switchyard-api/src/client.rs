// The uniform capability surface over both switch families.
//
// Orchestration code depends only on this trait. Vendor selection
// happens exactly once, when a device is registered and the matching
// implementation is constructed.

use async_trait::async_trait;

use crate::error::Error;
use crate::models::{
    DeviceBackup, HealthReport, PortSettings, PortStatusReport, SystemInfo, VlanConfigReport,
    VlanPortSettings,
};

/// One authenticated session against one physical switch.
///
/// Implementations own their HTTP client, cookie/session state, and
/// vendor wire format. Contract notes that hold for every implementer:
///
/// - Every operation other than `authenticate` calls `ensure_session`
///   first, re-authenticating only when the session is absent or stale.
/// - A 401/403-class response invalidates the session immediately so the
///   next call logs in again.
/// - Read operations return partial results: a failed sub-query is
///   recorded in the report's `partial_errors`, never raised.
/// - `health_check` never errors -- it feeds a monitoring loop that must
///   keep running, so failures ride along inside the report.
#[async_trait]
pub trait DeviceSessionClient: Send + Sync {
    /// Establish a session. Safe to call repeatedly; an already-valid
    /// session is replaced by a fresh login.
    async fn authenticate(&self) -> Result<(), Error>;

    /// Re-authenticate only if the session is missing or expired.
    /// Concurrent callers against one expired session trigger at most
    /// one login; the rest wait on its outcome.
    async fn ensure_session(&self) -> Result<(), Error>;

    // ── Reads ───────────────────────────────────────────────────────

    async fn get_system_info(&self) -> Result<SystemInfo, Error>;

    async fn get_port_status(&self) -> Result<PortStatusReport, Error>;

    async fn get_vlan_config(&self) -> Result<VlanConfigReport, Error>;

    // ── Writes ──────────────────────────────────────────────────────

    async fn configure_port(&self, port_id: &str, settings: &PortSettings) -> Result<(), Error>;

    async fn create_vlan(
        &self,
        vlan_id: u16,
        name: &str,
        description: &str,
    ) -> Result<(), Error>;

    /// Remove a VLAN from the device. Each family has its own underlying
    /// call (Vimins: a dedicated delete command; Sodola: the VLAN form's
    /// delete action) -- the difference stays behind this method.
    async fn delete_vlan(&self, vlan_id: u16) -> Result<(), Error>;

    async fn configure_vlan_port(
        &self,
        port_id: &str,
        settings: &VlanPortSettings,
    ) -> Result<(), Error>;

    // ── Backup / restore ────────────────────────────────────────────

    async fn backup_configuration(&self) -> Result<DeviceBackup, Error>;

    async fn restore_configuration(&self, backup: &DeviceBackup) -> Result<(), Error>;

    // ── Monitoring ──────────────────────────────────────────────────

    /// Lightweight composite check: authenticated flag plus best-effort
    /// system and port reads. Infallible by contract.
    async fn health_check(&self) -> HealthReport;
}
