// Vimins read commands
//
// Aggregate reads are stitched from several device commands; each
// command failure is recorded per-field instead of failing the whole
// read, because these devices routinely serve one command and choke on
// the next.

use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use crate::client::DeviceSessionClient;
use crate::error::Error;
use crate::models::{
    DeviceVlan, HealthReport, PortStatus, PortStatusReport, PortVlanMembership, SystemInfo,
    VlanConfigReport,
};
use crate::vimins::ViminsClient;

#[derive(Debug, Deserialize)]
struct SysInfoData {
    model: Option<String>,
    firmware: Option<String>,
    mac: Option<String>,
    hostname: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SysStatusData {
    uptime: Option<String>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PortLinkData {
    #[serde(default)]
    ports: Vec<PortLinkEntry>,
}

#[derive(Debug, Deserialize)]
struct PortLinkEntry {
    port: String,
    link: Option<String>,
    speed: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PortConfigData {
    #[serde(default)]
    ports: Vec<PortConfigEntry>,
}

#[derive(Debug, Deserialize)]
struct PortConfigEntry {
    port: String,
    enabled: Option<bool>,
    pvid: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct VlanListData {
    #[serde(default)]
    vlans: Vec<VlanListEntry>,
}

#[derive(Debug, Deserialize)]
struct VlanListEntry {
    vid: u16,
    name: Option<String>,
    desc: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VlanMemberData {
    #[serde(default)]
    entries: Vec<VlanMemberEntry>,
}

#[derive(Debug, Deserialize)]
struct VlanMemberEntry {
    vid: u16,
    port: String,
    #[serde(default)]
    tagged: bool,
    pvid: Option<u16>,
}

impl ViminsClient {
    /// `cmd=sys_info` + `cmd=sys_status`, merged.
    pub(crate) async fn fetch_system_info(&self) -> SystemInfo {
        let mut info = SystemInfo::default();

        match self.get_command("sys_info").await {
            Ok(data) => match serde_json::from_value::<SysInfoData>(data) {
                Ok(sys) => {
                    info.model = sys.model;
                    info.firmware_version = sys.firmware;
                    info.mac_address = sys.mac;
                    info.hostname = sys.hostname;
                }
                Err(e) => info.partial_errors.push(format!("sys_info: {e}")),
            },
            Err(e) => info.partial_errors.push(format!("sys_info: {e}")),
        }

        match self.get_command("sys_status").await {
            Ok(data) => match serde_json::from_value::<SysStatusData>(data) {
                Ok(status) => {
                    info.uptime = status.uptime;
                    info.extra = status.extra;
                }
                Err(e) => info.partial_errors.push(format!("sys_status: {e}")),
            },
            Err(e) => info.partial_errors.push(format!("sys_status: {e}")),
        }

        info
    }

    /// `cmd=port_status` (link) + `cmd=port_config` (admin/PVID), merged
    /// by port id.
    pub(crate) async fn fetch_port_status(&self) -> PortStatusReport {
        let mut report = PortStatusReport::default();

        match self.get_command("port_status").await {
            Ok(data) => match serde_json::from_value::<PortLinkData>(data) {
                Ok(links) => {
                    for entry in links.ports {
                        report.ports.push(PortStatus {
                            port_id: entry.port,
                            enabled: None,
                            link_up: entry.link.map(|l| l.eq_ignore_ascii_case("up")),
                            speed: entry.speed,
                            pvid: None,
                        });
                    }
                }
                Err(e) => report.partial_errors.push(format!("port_status: {e}")),
            },
            Err(e) => report.partial_errors.push(format!("port_status: {e}")),
        }

        match self.get_command("port_config").await {
            Ok(data) => match serde_json::from_value::<PortConfigData>(data) {
                Ok(configs) => {
                    for entry in configs.ports {
                        if let Some(port) =
                            report.ports.iter_mut().find(|p| p.port_id == entry.port)
                        {
                            port.enabled = entry.enabled;
                            port.pvid = entry.pvid;
                        } else {
                            report.ports.push(PortStatus {
                                port_id: entry.port,
                                enabled: entry.enabled,
                                link_up: None,
                                speed: None,
                                pvid: entry.pvid,
                            });
                        }
                    }
                }
                Err(e) => report.partial_errors.push(format!("port_config: {e}")),
            },
            Err(e) => report.partial_errors.push(format!("port_config: {e}")),
        }

        report
    }

    /// `cmd=vlan_list` (id/name/description) + `cmd=vlan_membership`
    /// (per-port entries), merged by VLAN id.
    pub(crate) async fn fetch_vlan_config(&self) -> VlanConfigReport {
        let mut report = VlanConfigReport::default();

        match self.get_command("vlan_list").await {
            Ok(data) => match serde_json::from_value::<VlanListData>(data) {
                Ok(list) => {
                    for entry in list.vlans {
                        report.vlans.push(DeviceVlan {
                            vlan_id: entry.vid,
                            name: entry.name,
                            description: entry.desc,
                            members: Vec::new(),
                        });
                    }
                }
                Err(e) => report.partial_errors.push(format!("vlan_list: {e}")),
            },
            Err(e) => report.partial_errors.push(format!("vlan_list: {e}")),
        }

        match self.get_command("vlan_membership").await {
            Ok(data) => match serde_json::from_value::<VlanMemberData>(data) {
                Ok(members) => {
                    for entry in members.entries {
                        let membership = PortVlanMembership {
                            port_id: entry.port,
                            tagged: entry.tagged,
                            pvid: entry.pvid,
                        };
                        if let Some(vlan) =
                            report.vlans.iter_mut().find(|v| v.vlan_id == entry.vid)
                        {
                            vlan.members.push(membership);
                        } else {
                            // Membership for a VLAN the list command missed --
                            // keep it rather than drop data on the floor.
                            report.vlans.push(DeviceVlan {
                                vlan_id: entry.vid,
                                name: None,
                                description: None,
                                members: vec![membership],
                            });
                        }
                    }
                }
                Err(e) => report
                    .partial_errors
                    .push(format!("vlan_membership: {e}")),
            },
            Err(e) => report
                .partial_errors
                .push(format!("vlan_membership: {e}")),
        }

        report
    }

    /// Composite health probe. Infallible: failures ride in the report.
    pub(crate) async fn run_health_check(&self) -> HealthReport {
        if let Err(e) = self.ensure_session().await {
            let mut report = HealthReport::unreachable(e.to_string());
            report.reachable = !matches!(e, Error::Transport(_) | Error::Timeout { .. });
            return report;
        }

        let system = self.fetch_system_info().await;
        let ports = self.fetch_port_status().await;

        let mut errors: Vec<String> = Vec::new();
        errors.extend(system.partial_errors.iter().cloned());
        errors.extend(ports.partial_errors.iter().cloned());

        debug!(errors = errors.len(), "vimins health check complete");

        HealthReport {
            authenticated: self.session.is_authenticated().await,
            reachable: true,
            system_info_ok: system.partial_errors.is_empty(),
            port_status_ok: ports.partial_errors.is_empty(),
            error: if errors.is_empty() {
                None
            } else {
                Some(errors.join("; "))
            },
            checked_at: Utc::now(),
        }
    }
}
