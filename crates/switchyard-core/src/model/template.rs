// ── VLAN templates ──
//
// Read-only policy bundles loaded at startup. Template-driven
// deployment is out of scope for now; templates exist so listings and
// future deploy flows share one shape.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VlanTemplate {
    pub name: String,
    pub id_range_start: u16,
    pub id_range_end: u16,
    /// Free-form policy tag (e.g. "guest", "iot", "storage").
    pub security_policy: Option<String>,
    pub mtu_hint: Option<u32>,
    /// When a deploy flow exists, whether the VLAN should be tagged onto
    /// every configured uplink automatically.
    #[serde(default)]
    pub trunk_all_uplinks: bool,
}

impl VlanTemplate {
    pub fn contains(&self, vlan_id: u16) -> bool {
        (self.id_range_start..=self.id_range_end).contains(&vlan_id)
    }
}
