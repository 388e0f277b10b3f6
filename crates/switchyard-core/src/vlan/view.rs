// ── Merged network-wide VLAN view ──
//
// Rebuilt on demand from every queried device; the devices are the
// source of truth. Read failures never abort the merge, they ride along
// per target.

use std::collections::BTreeMap;

use crate::error::{CoreError, TargetFailure};
use crate::model::{PortMembership, SwitchId, Vlan};
use crate::registry::SwitchRegistry;

/// The VLAN tables of many switches merged by VLAN id.
#[derive(Debug, Clone, Default)]
pub struct NetworkVlanView {
    pub vlans: BTreeMap<u16, Vlan>,
    /// Targets that answered.
    pub queried: Vec<SwitchId>,
    /// Targets whose VLAN read failed outright.
    pub failures: Vec<TargetFailure>,
}

impl NetworkVlanView {
    pub fn vlan(&self, vlan_id: u16) -> Option<&Vlan> {
        self.vlans.get(&vlan_id)
    }
}

/// Query every target's VLAN table concurrently and merge by VLAN id.
/// A failed target lands in `failures`; the merge keeps going.
pub(crate) async fn collect(registry: &SwitchRegistry, targets: Vec<SwitchId>) -> NetworkVlanView {
    let results = fetch(registry, targets).await;

    let mut view = NetworkVlanView::default();
    for (switch_id, result) in results {
        match result {
            Ok(report) => merge_report(&mut view, switch_id, report),
            Err(e) => view.failures.push(TargetFailure {
                switch_id,
                error: e.to_string(),
            }),
        }
    }
    view
}

/// Fail-fast variant for precondition phases: the first target whose
/// read fails aborts with that device's error, before any mutation.
pub(crate) async fn collect_strict(
    registry: &SwitchRegistry,
    targets: Vec<SwitchId>,
) -> Result<NetworkVlanView, CoreError> {
    let results = fetch(registry, targets).await;

    let mut view = NetworkVlanView::default();
    for (switch_id, result) in results {
        merge_report(&mut view, switch_id, result?);
    }
    Ok(view)
}

async fn fetch(
    registry: &SwitchRegistry,
    targets: Vec<SwitchId>,
) -> Vec<(SwitchId, Result<switchyard_api::models::VlanConfigReport, CoreError>)> {
    registry
        .fan_out(targets, |entry| async move {
            entry
                .client()?
                .get_vlan_config()
                .await
                .map_err(|e| CoreError::from_api(&entry.descriptor.id, e))
        })
        .await
}

fn merge_report(
    view: &mut NetworkVlanView,
    switch_id: SwitchId,
    report: switchyard_api::models::VlanConfigReport,
) {
    for device_vlan in report.vlans {
        let vlan = view
            .vlans
            .entry(device_vlan.vlan_id)
            .or_insert_with(|| Vlan::new(device_vlan.vlan_id));
        vlan.present_on.push(switch_id.clone());
        if let Some(name) = device_vlan.name {
            vlan.names.insert(switch_id.clone(), name);
        }
        if let Some(description) = device_vlan.description {
            vlan.descriptions.insert(switch_id.clone(), description);
        }
        for member in device_vlan.members {
            vlan.memberships.push(PortMembership {
                switch_id: switch_id.clone(),
                port_id: member.port_id,
                tagged: member.tagged,
                pvid: member.pvid,
            });
        }
    }
    view.queried.push(switch_id);
}
