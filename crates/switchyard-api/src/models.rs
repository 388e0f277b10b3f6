// Vendor-neutral data shapes returned by device session clients.
//
// Read reports are deliberately Option-heavy: embedded devices routinely
// fail one sub-endpoint while others succeed, so every aggregate read
// carries whatever was recovered plus a list of the sub-queries that
// failed. Absence of a field is data, not an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// System-level device information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemInfo {
    pub model: Option<String>,
    pub firmware_version: Option<String>,
    pub mac_address: Option<String>,
    pub hostname: Option<String>,
    pub uptime: Option<String>,
    /// Vendor-specific fields kept verbatim for diagnostics and backups.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
    /// Sub-queries that failed during this read.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partial_errors: Vec<String>,
}

/// Per-port link/admin status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortStatus {
    pub port_id: String,
    pub enabled: Option<bool>,
    pub link_up: Option<bool>,
    pub speed: Option<String>,
    pub pvid: Option<u16>,
}

/// Aggregate port status for one device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortStatusReport {
    pub ports: Vec<PortStatus>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partial_errors: Vec<String>,
}

/// One VLAN's membership on one port, as the device reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortVlanMembership {
    pub port_id: String,
    pub tagged: bool,
    /// PVID for untagged/access ports. Tagged members leave it unset.
    pub pvid: Option<u16>,
}

/// One VLAN as a single device knows it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceVlan {
    pub vlan_id: u16,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub members: Vec<PortVlanMembership>,
}

/// Aggregate VLAN table for one device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VlanConfigReport {
    pub vlans: Vec<DeviceVlan>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partial_errors: Vec<String>,
}

/// Settings for a plain port-configuration write.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortSettings {
    pub enabled: Option<bool>,
    pub speed: Option<String>,
    pub flow_control: Option<bool>,
    pub description: Option<String>,
}

/// Settings for a VLAN-membership write on one port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VlanPortSettings {
    pub vlan_id: u16,
    pub tagged: bool,
    /// When set, also rewrites the port's PVID.
    pub pvid: Option<u16>,
    /// False removes the port from the VLAN instead of adding it.
    #[serde(default = "default_member")]
    pub member: bool,
}

fn default_member() -> bool {
    true
}

impl VlanPortSettings {
    /// Add the port to a VLAN, tagged or untagged.
    pub fn join(vlan_id: u16, tagged: bool) -> Self {
        Self {
            vlan_id,
            tagged,
            pvid: None,
            member: true,
        }
    }

    /// Remove the port from a VLAN.
    pub fn leave(vlan_id: u16) -> Self {
        Self {
            vlan_id,
            tagged: false,
            pvid: None,
            member: false,
        }
    }

    pub fn with_pvid(mut self, pvid: u16) -> Self {
        self.pvid = Some(pvid);
        self
    }
}

/// Result of a [`health_check`](crate::DeviceSessionClient::health_check).
///
/// Never produced through a `Result`: the health loop must keep running,
/// so any internal failure rides along in `error` instead of raising.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub authenticated: bool,
    pub reachable: bool,
    pub system_info_ok: bool,
    pub port_status_ok: bool,
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl HealthReport {
    /// A report for a device we could not reach at all.
    pub fn unreachable(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            reachable: false,
            system_info_ok: false,
            port_status_ok: false,
            error: Some(error.into()),
            checked_at: Utc::now(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.authenticated && self.reachable && self.error.is_none()
    }
}

/// Full readable configuration of one device at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceBackup {
    pub captured_at: DateTime<Utc>,
    pub system: SystemInfo,
    pub ports: PortStatusReport,
    pub vlans: VlanConfigReport,
    /// Vendor-specific extras not covered by the common shapes.
    #[serde(default)]
    pub raw: serde_json::Value,
}
