// Multi-switch VLAN lifecycle against programmable fake devices.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use common::{registry_with, FakeSwitch};
use switchyard_core::vlan::{MismatchKind, VlanOrchestrator};
use switchyard_core::{CoreError, SwitchId};

fn orchestrator(registry: Arc<switchyard_core::SwitchRegistry>) -> VlanOrchestrator {
    VlanOrchestrator::new(registry, BTreeSet::from([1]), Vec::new())
}

#[tokio::test]
async fn invalid_vlan_id_touches_zero_devices() {
    let a = FakeSwitch::new("sw-a");
    let orch = orchestrator(registry_with(&[Arc::clone(&a)]));

    for bad_id in [0u16, 4095] {
        let err = orch
            .create_vlan(bad_id, "lab", "", None)
            .await
            .expect_err("out-of-range id must be rejected");
        assert!(matches!(err, CoreError::Validation { .. }));
    }

    // Reserved set rejected the same way.
    let err = orch
        .create_vlan(1, "default", "", None)
        .await
        .expect_err("reserved id must be rejected");
    assert!(matches!(err, CoreError::Validation { .. }));

    assert_eq!(a.call_count().await, 0, "no device call before validation");
}

#[tokio::test]
async fn create_round_trips_through_list() {
    let a = FakeSwitch::new("sw-a");
    let b = FakeSwitch::new("sw-b");
    let orch = orchestrator(registry_with(&[Arc::clone(&a), Arc::clone(&b)]));

    let report = orch
        .create_vlan(100, "BACKUP", "backup net", None)
        .await
        .expect("create succeeds");
    assert_eq!(report.created_on.len(), 2);

    let view = orch.list_vlans(None).await.expect("list succeeds");
    let vlan = view.vlan(100).expect("vlan visible after create");
    assert_eq!(vlan.present_on.len(), 2);
    let names: Vec<&String> = vlan.names.values().collect();
    assert!(names.iter().all(|n| n.as_str() == "BACKUP"));
}

#[tokio::test]
async fn conflict_aborts_before_any_mutation() {
    let a = FakeSwitch::new("sw-a");
    let b = FakeSwitch::new("sw-b");
    b.seed_vlan(100, "existing", &[]).await;
    let orch = orchestrator(registry_with(&[Arc::clone(&a), Arc::clone(&b)]));

    let err = orch
        .create_vlan(100, "dup", "", None)
        .await
        .expect_err("conflicting id must abort");
    assert!(matches!(err, CoreError::Conflict { vlan_id: 100, .. }));

    // Only the availability read ran; no create reached either device.
    assert!(!a.calls().await.contains(&"create_vlan".to_owned()));
    assert!(!b.calls().await.contains(&"create_vlan".to_owned()));
    assert!(!a.has_vlan(100).await);
}

#[tokio::test]
async fn failed_create_rolls_back_succeeded_targets() {
    let a = FakeSwitch::new("sw-a");
    let b = FakeSwitch::new("sw-b");
    let c = FakeSwitch::new("sw-c");
    c.fail_on("create_vlan").await;
    let orch = orchestrator(registry_with(&[
        Arc::clone(&a),
        Arc::clone(&b),
        Arc::clone(&c),
    ]));

    let err = orch
        .create_vlan(200, "lab", "", None)
        .await
        .expect_err("partial create must fail");

    match err {
        CoreError::PartialFailure {
            total,
            failures,
            rolled_back,
            rollback_errors,
            ..
        } => {
            assert_eq!(total, 3);
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].switch_id, SwitchId::new("sw-c"));
            assert_eq!(rolled_back.len(), 2);
            assert!(rollback_errors.is_empty());
        }
        other => panic!("expected PartialFailure, got {other:?}"),
    }

    // Rolled back everywhere it succeeded, never created on the failer.
    assert!(!a.has_vlan(200).await);
    assert!(!b.has_vlan(200).await);
    assert!(!c.has_vlan(200).await);
}

#[tokio::test]
async fn rollback_failure_is_reported_as_secondary() {
    let a = FakeSwitch::new("sw-a");
    let b = FakeSwitch::new("sw-b");
    a.fail_on("delete_vlan").await; // rollback on sw-a will fail
    b.fail_on("create_vlan").await;
    let orch = orchestrator(registry_with(&[Arc::clone(&a), Arc::clone(&b)]));

    let err = orch
        .create_vlan(300, "lab", "", None)
        .await
        .expect_err("partial create must fail");

    match err {
        CoreError::PartialFailure {
            rollback_errors, ..
        } => {
            assert_eq!(rollback_errors.len(), 1);
            assert_eq!(rollback_errors[0].switch_id, SwitchId::new("sw-a"));
        }
        other => panic!("expected PartialFailure, got {other:?}"),
    }

    // The system is knowingly inconsistent: the failed rollback left
    // the VLAN behind on sw-a.
    assert!(a.has_vlan(300).await);
}

#[tokio::test]
async fn delete_blocked_by_membership_unless_forced() {
    let a = FakeSwitch::new("sw-a");
    let b = FakeSwitch::new("sw-b");
    a.seed_vlan(100, "lab", &[("3", false)]).await;
    b.seed_vlan(100, "lab", &[]).await;
    let orch = orchestrator(registry_with(&[Arc::clone(&a), Arc::clone(&b)]));

    let err = orch
        .delete_vlan(100, None, false)
        .await
        .expect_err("membership must block delete");
    match err {
        CoreError::Dependency {
            vlan_id,
            switch_id,
            member_count,
        } => {
            assert_eq!(vlan_id, 100);
            assert_eq!(switch_id, SwitchId::new("sw-a"));
            assert_eq!(member_count, 1);
        }
        other => panic!("expected Dependency, got {other:?}"),
    }
    assert!(a.has_vlan(100).await, "blocked delete must not mutate");

    let report = orch
        .delete_vlan(100, None, true)
        .await
        .expect("forced delete succeeds");
    assert_eq!(report.deleted_on.len(), 2);
    assert!(!a.has_vlan(100).await);
    assert!(!b.has_vlan(100).await);
}

#[tokio::test]
async fn fan_out_isolates_one_failing_device() {
    let a = FakeSwitch::new("sw-a");
    let b = FakeSwitch::new("sw-b");
    let c = FakeSwitch::new("sw-c");
    b.fail_on("delete_vlan").await;
    a.seed_vlan(400, "lab", &[]).await;
    b.seed_vlan(400, "lab", &[]).await;
    c.seed_vlan(400, "lab", &[]).await;
    let orch = orchestrator(registry_with(&[
        Arc::clone(&a),
        Arc::clone(&b),
        Arc::clone(&c),
    ]));

    let err = orch
        .delete_vlan(400, None, true)
        .await
        .expect_err("one failed target surfaces as partial failure");

    match err {
        CoreError::PartialFailure { failures, .. } => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].switch_id, SwitchId::new("sw-b"));
        }
        other => panic!("expected PartialFailure, got {other:?}"),
    }

    // The other two targets completed despite sw-b's failure.
    assert!(!a.has_vlan(400).await);
    assert!(!c.has_vlan(400).await);
}

#[tokio::test]
async fn slow_device_times_out_without_stalling_others() {
    let a = FakeSwitch::new("sw-a");
    let b = FakeSwitch::new("sw-b");
    b.delay_calls(Duration::from_secs(30)).await;
    let registry = registry_with(&[Arc::clone(&a), Arc::clone(&b)]);

    tokio::time::pause();
    let results = registry
        .fan_out(registry.switch_ids(), |entry| async move {
            entry
                .client()?
                .delete_vlan(500)
                .await
                .map_err(|e| CoreError::from_api(&entry.descriptor.id, e))
        })
        .await;

    assert!(results[0].1.is_ok());
    assert!(matches!(results[1].1, Err(CoreError::Timeout { .. })));
}

#[tokio::test]
async fn consistency_flags_name_mismatch_across_switches() {
    let a = FakeSwitch::new("sw-a");
    let b = FakeSwitch::new("sw-b");
    a.seed_vlan(100, "BACKUP", &[]).await;
    b.seed_vlan(100, "BKUP", &[]).await;
    let orch = orchestrator(registry_with(&[Arc::clone(&a), Arc::clone(&b)]));

    let report = orch
        .validate_consistency(Some(100))
        .await
        .expect("audit runs");

    assert!(!report.consistent);
    assert_eq!(report.inconsistencies.len(), 1);
    let found = &report.inconsistencies[0];
    assert_eq!(found.kind, MismatchKind::NameMismatch);
    let values: Vec<&str> = found.values.iter().map(|v| v.value.as_str()).collect();
    assert!(values.contains(&"BACKUP"));
    assert!(values.contains(&"BKUP"));
}

#[tokio::test]
async fn explicit_unknown_target_is_not_found() {
    let a = FakeSwitch::new("sw-a");
    let orch = orchestrator(registry_with(&[Arc::clone(&a)]));

    let err = orch
        .create_vlan(100, "lab", "", Some(vec![SwitchId::new("sw-zz")]))
        .await
        .expect_err("unknown target must fail");
    assert!(matches!(err, CoreError::NotFound { .. }));
    assert_eq!(a.call_count().await, 0);
}
