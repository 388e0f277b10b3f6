// ── VLAN lifecycle orchestrator ──
//
// Per-call protocol, not a persistent state machine. Create is the only
// operation with a compensation phase:
//
//   validate id -> availability check on all targets -> fan out create
//   -> on any failure: fan out delete to the succeeded subset
//   (best-effort rollback) -> aggregate error naming failed targets.
//
// Preconditions (bad id, conflict, dependency) abort before any device
// is mutated. Rollback is best-effort by design: a failed rollback is
// reported as a secondary error list, never retried indefinitely.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use switchyard_api::models::VlanPortSettings;
use tracing::{info, warn};

use crate::audit;
use crate::error::{CoreError, TargetFailure};
use crate::model::{SwitchId, UplinkEdge, VLAN_ID_MAX, VLAN_ID_MIN};
use crate::registry::SwitchRegistry;
use crate::vlan::consistency::{self, ConsistencyReport};
use crate::vlan::topology_map::{self, TopologyMap};
use crate::vlan::view::{self, NetworkVlanView};

/// Result of a successful multi-target create.
#[derive(Debug, Clone, Serialize)]
pub struct CreateVlanReport {
    pub vlan_id: u16,
    pub created_on: Vec<SwitchId>,
}

/// Result of a successful multi-target delete.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteVlanReport {
    pub vlan_id: u16,
    pub deleted_on: Vec<SwitchId>,
}

pub struct VlanOrchestrator {
    registry: Arc<SwitchRegistry>,
    /// VLAN ids that may never be created or deleted (the device
    /// default VLAN, typically).
    reserved: BTreeSet<u16>,
    uplinks: Vec<UplinkEdge>,
}

impl VlanOrchestrator {
    pub fn new(
        registry: Arc<SwitchRegistry>,
        reserved: BTreeSet<u16>,
        uplinks: Vec<UplinkEdge>,
    ) -> Self {
        Self {
            registry,
            reserved,
            uplinks,
        }
    }

    // ── Multi-target lifecycle ──────────────────────────────────────

    /// Create a VLAN on every target (all switches when `targets` is
    /// `None`), atomically as far as the devices allow: any per-target
    /// create failure rolls the succeeded subset back.
    pub async fn create_vlan(
        &self,
        vlan_id: u16,
        name: &str,
        description: &str,
        targets: Option<Vec<SwitchId>>,
    ) -> Result<CreateVlanReport, CoreError> {
        self.validate_vlan_id(vlan_id)?;
        if name.trim().is_empty() {
            return Err(CoreError::Validation {
                message: "VLAN name must not be empty".into(),
            });
        }
        let targets = self.registry.resolve_targets(targets)?;

        // Availability check: no device is mutated until every target
        // has confirmed the id is free.
        let current = view::collect_strict(&self.registry, targets.clone()).await?;
        if let Some(existing) = current.vlans.get(&vlan_id) {
            if let Some(owner) = existing.present_on.first() {
                return Err(CoreError::Conflict {
                    vlan_id,
                    switch_id: owner.clone(),
                });
            }
        }

        // Forward phase.
        let name_owned = name.to_owned();
        let desc_owned = description.to_owned();
        let results = self
            .registry
            .fan_out(targets.clone(), |entry| {
                let name = name_owned.clone();
                let desc = desc_owned.clone();
                async move {
                    entry
                        .client()?
                        .create_vlan(vlan_id, &name, &desc)
                        .await
                        .map_err(|e| CoreError::from_api(&entry.descriptor.id, e))
                }
            })
            .await;

        let mut succeeded = Vec::new();
        let mut failures = Vec::new();
        for (switch_id, result) in results {
            match result {
                Ok(()) => {
                    audit::record(&switch_id, "create_vlan", "success");
                    succeeded.push(switch_id);
                }
                Err(e) => {
                    audit::record(&switch_id, "create_vlan", &format!("failure: {e}"));
                    self.note_device_failure(&switch_id, &e);
                    failures.push(TargetFailure {
                        switch_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        if failures.is_empty() {
            info!(vlan_id, targets = succeeded.len(), "VLAN created");
            return Ok(CreateVlanReport {
                vlan_id,
                created_on: succeeded,
            });
        }

        // Rollback phase: only targets confirmed to have succeeded the
        // forward phase. Best-effort; its own failures are secondary.
        warn!(
            vlan_id,
            failed = failures.len(),
            rollback_targets = succeeded.len(),
            "create failed on some targets; rolling back"
        );
        let (rolled_back, rollback_errors) = self.rollback_create(vlan_id, &succeeded).await;

        Err(CoreError::PartialFailure {
            operation: "create_vlan".into(),
            total: targets.len(),
            failures,
            rolled_back,
            rollback_errors,
        })
    }

    async fn rollback_create(
        &self,
        vlan_id: u16,
        succeeded: &[SwitchId],
    ) -> (Vec<SwitchId>, Vec<TargetFailure>) {
        let results = self
            .registry
            .fan_out(succeeded.to_vec(), |entry| async move {
                entry
                    .client()?
                    .delete_vlan(vlan_id)
                    .await
                    .map_err(|e| CoreError::from_api(&entry.descriptor.id, e))
            })
            .await;

        let mut rolled_back = Vec::new();
        let mut rollback_errors = Vec::new();
        for (switch_id, result) in results {
            match result {
                Ok(()) => {
                    audit::record(&switch_id, "rollback_create_vlan", "success");
                    rolled_back.push(switch_id);
                }
                Err(e) => {
                    audit::record(&switch_id, "rollback_create_vlan", &format!("failure: {e}"));
                    warn!(vlan_id, switch = %switch_id, error = %e, "rollback delete failed");
                    rollback_errors.push(TargetFailure {
                        switch_id,
                        error: e.to_string(),
                    });
                }
            }
        }
        (rolled_back, rollback_errors)
    }

    /// Delete a VLAN from every target. Unless `force`, any target still
    /// reporting port memberships for the id aborts the whole delete
    /// before any device is touched. Delete has no rollback phase;
    /// per-target failures are aggregated instead.
    pub async fn delete_vlan(
        &self,
        vlan_id: u16,
        targets: Option<Vec<SwitchId>>,
        force: bool,
    ) -> Result<DeleteVlanReport, CoreError> {
        self.validate_vlan_id(vlan_id)?;
        let targets = self.registry.resolve_targets(targets)?;

        if !force {
            let current = view::collect_strict(&self.registry, targets.clone()).await?;
            if let Some(vlan) = current.vlans.get(&vlan_id) {
                for switch_id in &targets {
                    let member_count = vlan
                        .memberships
                        .iter()
                        .filter(|m| &m.switch_id == switch_id)
                        .count();
                    if member_count > 0 {
                        return Err(CoreError::Dependency {
                            vlan_id,
                            switch_id: switch_id.clone(),
                            member_count,
                        });
                    }
                }
            }
        }

        let results = self
            .registry
            .fan_out(targets.clone(), |entry| async move {
                entry
                    .client()?
                    .delete_vlan(vlan_id)
                    .await
                    .map_err(|e| CoreError::from_api(&entry.descriptor.id, e))
            })
            .await;

        let mut deleted = Vec::new();
        let mut failures = Vec::new();
        for (switch_id, result) in results {
            match result {
                Ok(()) => {
                    audit::record(&switch_id, "delete_vlan", "success");
                    deleted.push(switch_id);
                }
                Err(e) => {
                    audit::record(&switch_id, "delete_vlan", &format!("failure: {e}"));
                    self.note_device_failure(&switch_id, &e);
                    failures.push(TargetFailure {
                        switch_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        if failures.is_empty() {
            info!(vlan_id, targets = deleted.len(), "VLAN deleted");
            Ok(DeleteVlanReport {
                vlan_id,
                deleted_on: deleted,
            })
        } else {
            Err(CoreError::PartialFailure {
                operation: "delete_vlan".into(),
                total: targets.len(),
                failures,
                rolled_back: Vec::new(),
                rollback_errors: Vec::new(),
            })
        }
    }

    // ── Single-target port operations ───────────────────────────────

    /// Add a port to a VLAN. Untagged assignment is access-port
    /// shorthand: it also moves the port's PVID to the VLAN.
    pub async fn assign_port_to_vlan(
        &self,
        switch_id: &SwitchId,
        port_id: &str,
        vlan_id: u16,
        tagged: bool,
    ) -> Result<(), CoreError> {
        self.validate_vlan_id(vlan_id)?;
        let mut settings = VlanPortSettings::join(vlan_id, tagged);
        if !tagged {
            settings = settings.with_pvid(vlan_id);
        }
        self.write_vlan_port(switch_id, port_id, &settings, "assign_port_to_vlan")
            .await
    }

    pub async fn remove_port_from_vlan(
        &self,
        switch_id: &SwitchId,
        port_id: &str,
        vlan_id: u16,
    ) -> Result<(), CoreError> {
        self.validate_vlan_id(vlan_id)?;
        self.write_vlan_port(
            switch_id,
            port_id,
            &VlanPortSettings::leave(vlan_id),
            "remove_port_from_vlan",
        )
        .await
    }

    /// Set a port's PVID. The PVID VLAN becomes the port's untagged
    /// membership.
    pub async fn set_port_pvid(
        &self,
        switch_id: &SwitchId,
        port_id: &str,
        vlan_id: u16,
    ) -> Result<(), CoreError> {
        self.validate_vlan_id(vlan_id)?;
        self.write_vlan_port(
            switch_id,
            port_id,
            &VlanPortSettings::join(vlan_id, false).with_pvid(vlan_id),
            "set_port_pvid",
        )
        .await
    }

    /// Configure a trunk: tag every allowed VLAN onto the port, then set
    /// the native VLAN untagged with PVID. Stops at the first vendor
    /// failure, surfaced verbatim.
    pub async fn configure_trunk_port(
        &self,
        switch_id: &SwitchId,
        port_id: &str,
        allowed_vlans: &[u16],
        native_vlan: Option<u16>,
    ) -> Result<(), CoreError> {
        if allowed_vlans.is_empty() {
            return Err(CoreError::Validation {
                message: "trunk configuration requires at least one allowed VLAN".into(),
            });
        }
        for &vlan_id in allowed_vlans {
            self.validate_vlan_id(vlan_id)?;
        }
        if let Some(native) = native_vlan {
            self.validate_vlan_id(native)?;
        }

        for &vlan_id in allowed_vlans {
            self.write_vlan_port(
                switch_id,
                port_id,
                &VlanPortSettings::join(vlan_id, true),
                "configure_trunk_port",
            )
            .await?;
        }
        if let Some(native) = native_vlan {
            self.write_vlan_port(
                switch_id,
                port_id,
                &VlanPortSettings::join(native, false).with_pvid(native),
                "configure_trunk_port",
            )
            .await?;
        }
        Ok(())
    }

    async fn write_vlan_port(
        &self,
        switch_id: &SwitchId,
        port_id: &str,
        settings: &VlanPortSettings,
        operation: &str,
    ) -> Result<(), CoreError> {
        let client = self.registry.client(switch_id)?;
        match client.configure_vlan_port(port_id, settings).await {
            Ok(()) => {
                audit::record(switch_id, operation, "success");
                Ok(())
            }
            Err(e) => {
                let err = CoreError::from_api(switch_id, e);
                audit::record(switch_id, operation, &format!("failure: {err}"));
                self.note_device_failure(switch_id, &err);
                Err(err)
            }
        }
    }

    // ── Read-only views ─────────────────────────────────────────────

    /// The merged VLAN view across the given targets (all switches when
    /// `None`). Per-target read failures ride along in the view.
    pub async fn list_vlans(
        &self,
        switch_id: Option<&SwitchId>,
    ) -> Result<NetworkVlanView, CoreError> {
        let targets = match switch_id {
            Some(id) => {
                self.registry.get(id)?;
                vec![id.clone()]
            }
            None => self.registry.switch_ids(),
        };
        Ok(view::collect(&self.registry, targets).await)
    }

    /// Cross-switch consistency audit. Read-only and side-effect-free.
    pub async fn validate_consistency(
        &self,
        vlan_id: Option<u16>,
    ) -> Result<ConsistencyReport, CoreError> {
        if let Some(id) = vlan_id {
            self.validate_vlan_id_range(id)?;
        }
        let current = view::collect(&self.registry, self.registry.switch_ids()).await;
        let report = consistency::evaluate(&current, vlan_id);
        audit::record_check(
            "validate_vlan_consistency",
            if report.consistent {
                "consistent"
            } else {
                "inconsistent"
            },
        );
        Ok(report)
    }

    /// VLAN presence per switch cross-referenced against the static
    /// uplink topology.
    pub async fn topology_map(&self, vlan_id: u16) -> Result<TopologyMap, CoreError> {
        self.validate_vlan_id_range(vlan_id)?;
        let current = view::collect(&self.registry, self.registry.switch_ids()).await;
        Ok(topology_map::build(
            vlan_id,
            &current,
            self.registry.switch_ids(),
            &self.uplinks,
        ))
    }

    // ── Preconditions ───────────────────────────────────────────────

    fn validate_vlan_id(&self, vlan_id: u16) -> Result<(), CoreError> {
        self.validate_vlan_id_range(vlan_id)?;
        if self.reserved.contains(&vlan_id) {
            return Err(CoreError::Validation {
                message: format!("VLAN {vlan_id} is reserved"),
            });
        }
        Ok(())
    }

    #[allow(clippy::unused_self)]
    fn validate_vlan_id_range(&self, vlan_id: u16) -> Result<(), CoreError> {
        if !(VLAN_ID_MIN..=VLAN_ID_MAX).contains(&vlan_id) {
            return Err(CoreError::Validation {
                message: format!(
                    "VLAN id {vlan_id} outside valid range {VLAN_ID_MIN}-{VLAN_ID_MAX}"
                ),
            });
        }
        Ok(())
    }

    fn note_device_failure(&self, switch_id: &SwitchId, error: &CoreError) {
        if error.marks_offline() {
            if let Ok(entry) = self.registry.get(switch_id) {
                entry.mark_offline(error.to_string());
            }
        }
    }
}
