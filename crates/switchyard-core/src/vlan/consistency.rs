// ── Cross-switch consistency audit ──
//
// The same VLAN id on two switches is the same logical network by
// definition, so the switches must agree on what it is called. The
// audit groups the merged view by id and flags any id where different
// switches report different names or descriptions. Read-only.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::TargetFailure;
use crate::model::{SwitchId, Vlan, VlanSummary};
use crate::vlan::view::NetworkVlanView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MismatchKind {
    NameMismatch,
    DescriptionMismatch,
}

/// One switch's value for a disputed field.
#[derive(Debug, Clone, Serialize)]
pub struct MismatchValue {
    pub switch_id: SwitchId,
    pub value: String,
}

/// One VLAN id on which the switches disagree.
#[derive(Debug, Clone, Serialize)]
pub struct Inconsistency {
    pub vlan_id: u16,
    pub kind: MismatchKind,
    pub values: Vec<MismatchValue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsistencyReport {
    pub consistent: bool,
    pub inconsistencies: Vec<Inconsistency>,
    /// Per-VLAN aggregate: which switches hold it, total port count.
    pub summaries: Vec<VlanSummary>,
    /// Switches whose VLAN table could not be read for this audit.
    pub unreachable: Vec<TargetFailure>,
}

/// Evaluate the audit over an already-collected view, optionally
/// restricted to one VLAN id.
pub(crate) fn evaluate(view: &NetworkVlanView, vlan_id: Option<u16>) -> ConsistencyReport {
    let mut inconsistencies = Vec::new();
    let mut summaries = Vec::new();

    for vlan in view.vlans.values() {
        if vlan_id.is_some_and(|id| id != vlan.id) {
            continue;
        }
        summaries.push(VlanSummary::from(vlan));
        if let Some(found) = field_mismatch(vlan, MismatchKind::NameMismatch, &vlan.names) {
            inconsistencies.push(found);
        }
        if let Some(found) =
            field_mismatch(vlan, MismatchKind::DescriptionMismatch, &vlan.descriptions)
        {
            inconsistencies.push(found);
        }
    }

    ConsistencyReport {
        consistent: inconsistencies.is_empty(),
        inconsistencies,
        summaries,
        unreachable: view.failures.clone(),
    }
}

/// A field is inconsistent when the set of distinct reported values has
/// more than one member. Switches that report nothing for the field do
/// not count as disagreement.
fn field_mismatch(
    vlan: &Vlan,
    kind: MismatchKind,
    per_switch: &BTreeMap<SwitchId, String>,
) -> Option<Inconsistency> {
    let mut distinct: Vec<&str> = per_switch.values().map(String::as_str).collect();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() <= 1 {
        return None;
    }

    Some(Inconsistency {
        vlan_id: vlan.id,
        kind,
        values: per_switch
            .iter()
            .map(|(switch_id, value)| MismatchValue {
                switch_id: switch_id.clone(),
                value: value.clone(),
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vlan_with_names(id: u16, names: &[(&str, &str)]) -> Vlan {
        let mut vlan = Vlan::new(id);
        for (switch, name) in names {
            vlan.present_on.push(SwitchId::new(*switch));
            vlan.names.insert(SwitchId::new(*switch), (*name).to_owned());
        }
        vlan
    }

    fn view_of(vlans: Vec<Vlan>) -> NetworkVlanView {
        let mut view = NetworkVlanView::default();
        for vlan in vlans {
            view.vlans.insert(vlan.id, vlan);
        }
        view
    }

    #[test]
    fn agreeing_names_are_consistent() {
        let view = view_of(vec![vlan_with_names(
            100,
            &[("sw-a", "backup"), ("sw-b", "backup")],
        )]);
        let report = evaluate(&view, None);
        assert!(report.consistent);
        assert!(report.inconsistencies.is_empty());
        assert_eq!(report.summaries.len(), 1);
    }

    #[test]
    fn name_disagreement_is_flagged_with_both_values() {
        let view = view_of(vec![vlan_with_names(
            100,
            &[("sw-a", "BACKUP"), ("sw-b", "BKUP")],
        )]);
        let report = evaluate(&view, Some(100));

        assert!(!report.consistent);
        assert_eq!(report.inconsistencies.len(), 1);
        let found = &report.inconsistencies[0];
        assert_eq!(found.kind, MismatchKind::NameMismatch);
        let values: Vec<&str> = found.values.iter().map(|v| v.value.as_str()).collect();
        assert!(values.contains(&"BACKUP"));
        assert!(values.contains(&"BKUP"));
    }

    #[test]
    fn filter_skips_other_vlans() {
        let view = view_of(vec![
            vlan_with_names(100, &[("sw-a", "one"), ("sw-b", "two")]),
            vlan_with_names(200, &[("sw-a", "ok"), ("sw-b", "ok")]),
        ]);
        let report = evaluate(&view, Some(200));
        assert!(report.consistent);
        assert_eq!(report.summaries.len(), 1);
        assert_eq!(report.summaries[0].id, 200);
    }

    #[test]
    fn missing_field_is_not_disagreement() {
        // sw-b reports the VLAN without a name; only sw-a names it.
        let mut vlan = vlan_with_names(300, &[("sw-a", "storage")]);
        vlan.present_on.push(SwitchId::new("sw-b"));
        let report = evaluate(&view_of(vec![vlan]), None);
        assert!(report.consistent);
    }
}
