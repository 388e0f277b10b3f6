// The external facade: error rendering at the boundary and the backup
// round trip.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use common::{registry_with, FakeSwitch};
use switchyard_core::backup::{BackupManager, FsBackupStore};
use switchyard_core::diagnostics::Diagnostics;
use switchyard_core::ops::{BackupParams, CreateVlanParams, ListVlansParams, RestoreParams};
use switchyard_core::vlan::VlanOrchestrator;
use switchyard_core::{Operations, SwitchId};

fn operations(fakes: &[Arc<FakeSwitch>], backup_dir: &std::path::Path) -> Operations {
    let registry = registry_with(fakes);
    let orchestrator =
        VlanOrchestrator::new(Arc::clone(&registry), BTreeSet::from([1]), Vec::new());
    let diagnostics = Diagnostics::new(Arc::clone(&registry));
    let backups = BackupManager::new(
        Arc::clone(&registry),
        Arc::new(FsBackupStore::new(backup_dir)),
        3,
    );
    Operations::new(registry, orchestrator, diagnostics, backups)
}

#[tokio::test]
async fn validation_error_is_rendered_with_kind() {
    let a = FakeSwitch::new("sw-a");
    let dir = tempfile::tempdir().expect("tempdir");
    let ops = operations(&[Arc::clone(&a)], dir.path());

    let outcome = ops
        .create_vlan(CreateVlanParams {
            vlan_id: 0,
            vlan_name: "bad".into(),
            description: None,
            target_switches: None,
        })
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.data["error_kind"], "validation_error");
    assert!(outcome.message.contains("valid range"));
}

#[tokio::test]
async fn create_then_list_through_the_facade() {
    let a = FakeSwitch::new("sw-a");
    let b = FakeSwitch::new("sw-b");
    let dir = tempfile::tempdir().expect("tempdir");
    let ops = operations(&[Arc::clone(&a), Arc::clone(&b)], dir.path());

    let outcome = ops
        .create_vlan(CreateVlanParams {
            vlan_id: 100,
            vlan_name: "BACKUP".into(),
            description: Some("backup net".into()),
            target_switches: None,
        })
        .await;
    assert!(outcome.success, "{}", outcome.message);

    let listed = ops
        .list_vlans(ListVlansParams {
            switch_id: None,
            include_details: false,
        })
        .await;
    assert!(listed.success);
    let vlans = listed.data["vlans"].as_array().expect("vlan array");
    assert_eq!(vlans.len(), 1);
    assert_eq!(vlans[0]["id"], 100);
    assert_eq!(vlans[0]["switch_count"], 2);
}

#[tokio::test]
async fn unknown_switch_is_not_found_at_the_boundary() {
    let a = FakeSwitch::new("sw-a");
    let dir = tempfile::tempdir().expect("tempdir");
    let ops = operations(&[Arc::clone(&a)], dir.path());

    let outcome = ops.get_switch_status(&SwitchId::new("sw-zz"));
    assert!(!outcome.success);
    assert_eq!(outcome.data["error_kind"], "not_found");
}

#[tokio::test]
async fn backup_restore_round_trip() {
    let a = FakeSwitch::new("sw-a");
    a.seed_vlan(100, "lab", &[]).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let ops = operations(&[Arc::clone(&a)], dir.path());

    let outcome = ops
        .backup_switch_configuration(BackupParams { switch_ids: None })
        .await;
    assert!(outcome.success, "{}", outcome.message);
    let backup_id = outcome.data["completed"][0]["backup_id"]
        .as_str()
        .expect("backup id")
        .to_owned();

    let history = ops.list_backup_history(&SwitchId::new("sw-a"));
    assert!(history.success);
    assert_eq!(history.data.as_array().map(Vec::len), Some(1));

    // Mutate the device, then restore the capture.
    a.seed_vlan(999, "scratch", &[]).await;
    let restored = ops
        .restore_switch_configuration(RestoreParams {
            switch_id: SwitchId::new("sw-a"),
            backup_id,
        })
        .await;
    assert!(restored.success, "{}", restored.message);
    assert!(a.has_vlan(100).await);
    assert!(!a.has_vlan(999).await);
}

#[tokio::test]
async fn restore_rejects_foreign_backup() {
    let a = FakeSwitch::new("sw-a");
    let b = FakeSwitch::new("sw-b");
    let dir = tempfile::tempdir().expect("tempdir");
    let ops = operations(&[Arc::clone(&a), Arc::clone(&b)], dir.path());

    let outcome = ops
        .backup_switch_configuration(BackupParams {
            switch_ids: Some(vec![SwitchId::new("sw-a")]),
        })
        .await;
    let backup_id = outcome.data["completed"][0]["backup_id"]
        .as_str()
        .expect("backup id")
        .to_owned();

    let restored = ops
        .restore_switch_configuration(RestoreParams {
            switch_id: SwitchId::new("sw-b"),
            backup_id,
        })
        .await;
    assert!(!restored.success);
    assert_eq!(restored.data["error_kind"], "validation_error");
}

#[tokio::test]
async fn network_health_report_counts_devices() {
    let a = FakeSwitch::new("sw-a");
    let b = FakeSwitch::new("sw-b");
    let dir = tempfile::tempdir().expect("tempdir");
    let ops = operations(&[Arc::clone(&a), Arc::clone(&b)], dir.path());

    let outcome = ops.network_health_report().await;
    assert!(outcome.success);
    assert_eq!(outcome.data["total"], 2);
    assert_eq!(outcome.data["online"], 2);
    assert_eq!(outcome.data["offline"], 0);
}
