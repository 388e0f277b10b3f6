// ── VLAN domain types ──
//
// A `Vlan` here is the merged, network-wide view reconstructed on demand
// from every switch -- the devices are the source of truth, nothing is
// persisted centrally. The same id on two switches is the same logical
// network by definition; the consistency checker enforces that their
// names and descriptions agree.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::switch::SwitchId;

/// Valid 802.1Q VLAN id range.
pub const VLAN_ID_MIN: u16 = 1;
pub const VLAN_ID_MAX: u16 = 4094;

/// One port's membership in a VLAN, network-wide addressing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMembership {
    pub switch_id: SwitchId,
    pub port_id: String,
    pub tagged: bool,
    /// PVID for untagged/access memberships.
    pub pvid: Option<u16>,
}

/// The merged network-wide view of one VLAN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vlan {
    pub id: u16,
    /// Name as reported per switch -- kept per-reporter so the
    /// consistency checker can flag disagreement.
    pub names: BTreeMap<SwitchId, String>,
    pub descriptions: BTreeMap<SwitchId, String>,
    pub memberships: Vec<PortMembership>,
    /// Which switches report this VLAN at all.
    pub present_on: Vec<SwitchId>,
}

impl Vlan {
    pub fn new(id: u16) -> Self {
        Self {
            id,
            names: BTreeMap::new(),
            descriptions: BTreeMap::new(),
            memberships: Vec::new(),
            present_on: Vec::new(),
        }
    }

    /// The consensus name, when all reporters agree; otherwise the
    /// first reporter's value (display fallback -- disagreement is the
    /// consistency checker's business).
    pub fn display_name(&self) -> Option<&str> {
        self.names.values().next().map(String::as_str)
    }

    pub fn total_port_count(&self) -> usize {
        self.memberships.len()
    }
}

/// Compact per-VLAN summary used in listings and consistency reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VlanSummary {
    pub id: u16,
    pub name: Option<String>,
    pub switch_count: usize,
    pub port_count: usize,
    pub switches: Vec<SwitchId>,
}

impl From<&Vlan> for VlanSummary {
    fn from(vlan: &Vlan) -> Self {
        Self {
            id: vlan.id,
            name: vlan.display_name().map(str::to_owned),
            switch_count: vlan.present_on.len(),
            port_count: vlan.total_port_count(),
            switches: vlan.present_on.clone(),
        }
    }
}
