// ── External operation facade ──
//
// The callable surface consumed by whatever transport fronts the
// engine. Every operation takes a flat parameter record and returns an
// `OpOutcome`; raised `CoreError`s are caught here and rendered with
// their machine-readable kind, so the core never leaks a panic or a
// bare error across the boundary.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::backup::BackupManager;
use crate::diagnostics::Diagnostics;
use crate::error::CoreError;
use crate::model::SwitchId;
use crate::registry::{SwitchFilter, SwitchRegistry};
use crate::vlan::VlanOrchestrator;

/// Uniform operation result: success flag, human-readable message,
/// structured payload. Errors carry `error_kind` inside `data`.
#[derive(Debug, Clone, Serialize)]
pub struct OpOutcome {
    pub success: bool,
    pub message: String,
    pub data: serde_json::Value,
}

impl OpOutcome {
    fn ok(message: impl Into<String>, data: impl Serialize) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: serde_json::to_value(data).unwrap_or_default(),
        }
    }

    fn err(error: &CoreError) -> Self {
        Self {
            success: false,
            message: error.to_string(),
            data: json!({ "error_kind": error.kind() }),
        }
    }
}

// ── Parameter records ───────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CreateVlanParams {
    pub vlan_id: u16,
    pub vlan_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub target_switches: Option<Vec<SwitchId>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteVlanParams {
    pub vlan_id: u16,
    #[serde(default)]
    pub target_switches: Option<Vec<SwitchId>>,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListVlansParams {
    #[serde(default)]
    pub switch_id: Option<SwitchId>,
    #[serde(default)]
    pub include_details: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortVlanParams {
    pub switch_id: SwitchId,
    pub port_id: String,
    pub vlan_id: u16,
    #[serde(default)]
    pub tagged: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrunkPortParams {
    pub switch_id: SwitchId,
    pub port_id: String,
    pub allowed_vlans: Vec<u16>,
    #[serde(default)]
    pub native_vlan: Option<u16>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackupParams {
    #[serde(default)]
    pub switch_ids: Option<Vec<SwitchId>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestoreParams {
    pub switch_id: SwitchId,
    pub backup_id: String,
}

// ── The facade ──────────────────────────────────────────────────────

/// Explicit dependency bundle, constructed once at startup and passed
/// into every handler. No ambient globals.
pub struct Operations {
    registry: Arc<SwitchRegistry>,
    orchestrator: VlanOrchestrator,
    diagnostics: Diagnostics,
    backups: BackupManager,
}

impl Operations {
    pub fn new(
        registry: Arc<SwitchRegistry>,
        orchestrator: VlanOrchestrator,
        diagnostics: Diagnostics,
        backups: BackupManager,
    ) -> Self {
        Self {
            registry,
            orchestrator,
            diagnostics,
            backups,
        }
    }

    // ── VLAN lifecycle ──────────────────────────────────────────────

    pub async fn create_vlan(&self, params: CreateVlanParams) -> OpOutcome {
        let description = params.description.unwrap_or_default();
        match self
            .orchestrator
            .create_vlan(
                params.vlan_id,
                &params.vlan_name,
                &description,
                params.target_switches,
            )
            .await
        {
            Ok(report) => OpOutcome::ok(
                format!(
                    "VLAN {} created on {} switch(es)",
                    report.vlan_id,
                    report.created_on.len()
                ),
                report,
            ),
            Err(e) => OpOutcome::err(&e),
        }
    }

    pub async fn delete_vlan(&self, params: DeleteVlanParams) -> OpOutcome {
        match self
            .orchestrator
            .delete_vlan(params.vlan_id, params.target_switches, params.force)
            .await
        {
            Ok(report) => OpOutcome::ok(
                format!(
                    "VLAN {} deleted from {} switch(es)",
                    report.vlan_id,
                    report.deleted_on.len()
                ),
                report,
            ),
            Err(e) => OpOutcome::err(&e),
        }
    }

    pub async fn list_vlans(&self, params: ListVlansParams) -> OpOutcome {
        match self.orchestrator.list_vlans(params.switch_id.as_ref()).await {
            Ok(view) => {
                let count = view.vlans.len();
                let data = if params.include_details {
                    json!({
                        "vlans": view.vlans.values().collect::<Vec<_>>(),
                        "failures": view.failures,
                    })
                } else {
                    json!({
                        "vlans": view
                            .vlans
                            .values()
                            .map(crate::model::VlanSummary::from)
                            .collect::<Vec<_>>(),
                        "failures": view.failures,
                    })
                };
                OpOutcome {
                    success: true,
                    message: format!("{count} VLAN(s)"),
                    data,
                }
            }
            Err(e) => OpOutcome::err(&e),
        }
    }

    // ── Port membership ─────────────────────────────────────────────

    pub async fn assign_port_to_vlan(&self, params: PortVlanParams) -> OpOutcome {
        match self
            .orchestrator
            .assign_port_to_vlan(
                &params.switch_id,
                &params.port_id,
                params.vlan_id,
                params.tagged,
            )
            .await
        {
            Ok(()) => OpOutcome::ok(
                format!(
                    "port {} on {} assigned to VLAN {}",
                    params.port_id, params.switch_id, params.vlan_id
                ),
                (),
            ),
            Err(e) => OpOutcome::err(&e),
        }
    }

    pub async fn remove_port_from_vlan(&self, params: PortVlanParams) -> OpOutcome {
        match self
            .orchestrator
            .remove_port_from_vlan(&params.switch_id, &params.port_id, params.vlan_id)
            .await
        {
            Ok(()) => OpOutcome::ok(
                format!(
                    "port {} on {} removed from VLAN {}",
                    params.port_id, params.switch_id, params.vlan_id
                ),
                (),
            ),
            Err(e) => OpOutcome::err(&e),
        }
    }

    pub async fn set_port_pvid(&self, params: PortVlanParams) -> OpOutcome {
        match self
            .orchestrator
            .set_port_pvid(&params.switch_id, &params.port_id, params.vlan_id)
            .await
        {
            Ok(()) => OpOutcome::ok(
                format!(
                    "PVID {} set on port {} of {}",
                    params.vlan_id, params.port_id, params.switch_id
                ),
                (),
            ),
            Err(e) => OpOutcome::err(&e),
        }
    }

    pub async fn configure_trunk_port(&self, params: TrunkPortParams) -> OpOutcome {
        match self
            .orchestrator
            .configure_trunk_port(
                &params.switch_id,
                &params.port_id,
                &params.allowed_vlans,
                params.native_vlan,
            )
            .await
        {
            Ok(()) => OpOutcome::ok(
                format!(
                    "trunk configured on port {} of {} ({} VLANs)",
                    params.port_id,
                    params.switch_id,
                    params.allowed_vlans.len()
                ),
                (),
            ),
            Err(e) => OpOutcome::err(&e),
        }
    }

    // ── Auditing and topology ───────────────────────────────────────

    pub async fn validate_vlan_consistency(&self, vlan_id: Option<u16>) -> OpOutcome {
        match self.orchestrator.validate_consistency(vlan_id).await {
            Ok(report) => {
                let message = if report.consistent {
                    "consistent".to_owned()
                } else {
                    format!("{} inconsistencies found", report.inconsistencies.len())
                };
                OpOutcome::ok(message, report)
            }
            Err(e) => OpOutcome::err(&e),
        }
    }

    pub async fn get_vlan_topology_map(&self, vlan_id: u16) -> OpOutcome {
        match self.orchestrator.topology_map(vlan_id).await {
            Ok(map) => OpOutcome::ok(format!("topology map for VLAN {vlan_id}"), map),
            Err(e) => OpOutcome::err(&e),
        }
    }

    // ── Status and diagnostics ──────────────────────────────────────

    pub fn get_all_switches(&self) -> OpOutcome {
        let switches = self.diagnostics.all_switches(SwitchFilter::default());
        OpOutcome::ok(format!("{} switch(es)", switches.len()), switches)
    }

    pub fn get_switch_status(&self, switch_id: &SwitchId) -> OpOutcome {
        match self.diagnostics.switch_status(switch_id) {
            Ok(status) => OpOutcome::ok(format!("status of {switch_id}"), status),
            Err(e) => OpOutcome::err(&e),
        }
    }

    pub async fn get_port_status(&self, switch_id: &SwitchId) -> OpOutcome {
        match self.diagnostics.port_status(switch_id).await {
            Ok(report) => OpOutcome::ok(
                format!("{} port(s) on {switch_id}", report.ports.len()),
                report,
            ),
            Err(e) => OpOutcome::err(&e),
        }
    }

    pub async fn network_health_report(&self) -> OpOutcome {
        let report = self.diagnostics.network_health_report().await;
        OpOutcome::ok(
            format!("{} of {} switch(es) online", report.online, report.total),
            report,
        )
    }

    // ── Backup / restore ────────────────────────────────────────────

    pub async fn backup_switch_configuration(&self, params: BackupParams) -> OpOutcome {
        match self.backups.backup_switches(params.switch_ids).await {
            Ok(report) => {
                let success = report.failures.is_empty();
                let message = format!(
                    "{} backup(s) captured, {} failed",
                    report.completed.len(),
                    report.failures.len()
                );
                OpOutcome {
                    success,
                    message,
                    data: serde_json::to_value(report).unwrap_or_default(),
                }
            }
            Err(e) => OpOutcome::err(&e),
        }
    }

    pub async fn restore_switch_configuration(&self, params: RestoreParams) -> OpOutcome {
        match self
            .backups
            .restore_switch(&params.switch_id, &params.backup_id)
            .await
        {
            Ok(()) => OpOutcome::ok(
                format!("backup {} restored to {}", params.backup_id, params.switch_id),
                (),
            ),
            Err(e) => OpOutcome::err(&e),
        }
    }

    pub fn list_backup_history(&self, switch_id: &SwitchId) -> OpOutcome {
        match self.backups.history(switch_id) {
            Ok(history) => OpOutcome::ok(format!("{} backup(s)", history.len()), history),
            Err(e) => OpOutcome::err(&e),
        }
    }

    /// The registry behind this facade (health monitor wiring).
    pub fn registry(&self) -> &Arc<SwitchRegistry> {
        &self.registry
    }
}
