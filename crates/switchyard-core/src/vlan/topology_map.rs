// ── VLAN propagation over the static uplink graph ──
//
// Not topology discovery: the uplink edges come from configuration. An
// edge carries the VLAN only when both endpoint switches report it.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{SwitchId, UplinkEdge};
use crate::vlan::view::NetworkVlanView;

#[derive(Debug, Clone, Serialize)]
pub struct UplinkPropagation {
    pub edge: UplinkEdge,
    pub propagated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopologyMap {
    pub vlan_id: u16,
    /// Presence per registered switch, including switches without the
    /// VLAN (false) so gaps are visible.
    pub presence: BTreeMap<SwitchId, bool>,
    pub uplinks: Vec<UplinkPropagation>,
}

pub(crate) fn build(
    vlan_id: u16,
    view: &NetworkVlanView,
    all_switches: Vec<SwitchId>,
    uplinks: &[UplinkEdge],
) -> TopologyMap {
    let present_on: Vec<&SwitchId> = view
        .vlan(vlan_id)
        .map(|v| v.present_on.iter().collect())
        .unwrap_or_default();

    let mut presence = BTreeMap::new();
    for switch_id in all_switches {
        let here = present_on.contains(&&switch_id);
        presence.insert(switch_id, here);
    }

    let uplinks = uplinks
        .iter()
        .map(|edge| UplinkPropagation {
            propagated: presence.get(&edge.a.switch_id).copied().unwrap_or(false)
                && presence.get(&edge.b.switch_id).copied().unwrap_or(false),
            edge: edge.clone(),
        })
        .collect();

    TopologyMap {
        vlan_id,
        presence,
        uplinks,
    }
}
