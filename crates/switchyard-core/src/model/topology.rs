// ── Static uplink topology ──
//
// Inter-switch links are configured, not discovered. The topology map
// only answers "is this VLAN carried across this edge", which needs
// nothing more than the two endpoints.

use serde::{Deserialize, Serialize};

use super::switch::SwitchId;

/// One end of an inter-switch link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UplinkEndpoint {
    pub switch_id: SwitchId,
    pub port_id: String,
}

/// A configured inter-switch link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UplinkEdge {
    pub a: UplinkEndpoint,
    pub b: UplinkEndpoint,
}

impl UplinkEdge {
    pub fn touches(&self, switch_id: &SwitchId) -> bool {
        &self.a.switch_id == switch_id || &self.b.switch_id == switch_id
    }
}
