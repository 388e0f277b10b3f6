// Sodola page readers
//
// Each read walks a candidate page list, scans whatever tables come
// back, and merges partial findings. A missing page is skipped; a page
// that fetches but yields nothing contributes nothing. The report's
// `partial_errors` records transport-level failures only -- an empty
// scan is a valid (if unhelpful) answer from these devices.

use chrono::Utc;
use tracing::debug;

use crate::client::DeviceSessionClient;
use crate::error::Error;
use crate::models::{
    DeviceVlan, HealthReport, PortStatus, PortStatusReport, PortVlanMembership, SystemInfo,
    VlanConfigReport,
};
use crate::sodola::html::{self, HtmlTable};
use crate::sodola::SodolaClient;

/// Pages that may carry system information.
const SYSTEM_PAGES: [&str; 3] = ["info.htm", "systeminfo.htm", "home.htm"];
/// Pages that may carry the port status table.
const PORT_PAGES: [&str; 3] = ["port.htm", "portstatus.htm", "port_status.htm"];
/// Pages that may carry VLAN tables.
const VLAN_PAGES: [&str; 3] = ["vlan.htm", "vlanconfig.htm", "8021qvlan.htm"];

/// Labels probed on system pages, mapped onto `SystemInfo` fields.
const SYSTEM_LABELS: [(&str, SystemField); 5] = [
    ("MAC Address", SystemField::Mac),
    ("Firmware Version", SystemField::Firmware),
    ("System Name", SystemField::Hostname),
    ("Model", SystemField::Model),
    ("Uptime", SystemField::Uptime),
];

#[derive(Clone, Copy)]
enum SystemField {
    Mac,
    Firmware,
    Hostname,
    Model,
    Uptime,
}

impl SodolaClient {
    /// Label/value scrape across the system page candidates. First page
    /// to answer a label wins; later pages only fill remaining gaps.
    pub(crate) async fn scrape_system_info(&self) -> SystemInfo {
        let mut info = SystemInfo::default();

        for page in SYSTEM_PAGES {
            match self.fetch_page(page).await {
                Ok(Some(body)) => {
                    for (label, field) in SYSTEM_LABELS {
                        let Some(value) = html::labeled_value(&body, label) else {
                            continue;
                        };
                        let slot = match field {
                            SystemField::Mac => &mut info.mac_address,
                            SystemField::Firmware => &mut info.firmware_version,
                            SystemField::Hostname => &mut info.hostname,
                            SystemField::Model => &mut info.model,
                            SystemField::Uptime => &mut info.uptime,
                        };
                        if slot.is_none() {
                            *slot = Some(value);
                        }
                    }
                }
                Ok(None) => debug!(page, "system page absent, skipping"),
                Err(e) => info.partial_errors.push(format!("{page}: {e}")),
            }
        }

        info
    }

    /// Port table scrape. Rows are merged by port id across pages.
    pub(crate) async fn scrape_port_status(&self) -> PortStatusReport {
        let mut report = PortStatusReport::default();

        for page in PORT_PAGES {
            match self.fetch_page(page).await {
                Ok(Some(body)) => {
                    for table in html::scan_tables(&body) {
                        merge_port_table(&mut report, &table);
                    }
                }
                Ok(None) => debug!(page, "port page absent, skipping"),
                Err(e) => report.partial_errors.push(format!("{page}: {e}")),
            }
        }

        report
    }

    /// VLAN table scrape. Tables carrying a VLAN id column become VLAN
    /// entries with port memberships; port/PVID tables refine PVIDs.
    pub(crate) async fn scrape_vlan_config(&self) -> VlanConfigReport {
        let mut report = VlanConfigReport::default();

        for page in VLAN_PAGES {
            match self.fetch_page(page).await {
                Ok(Some(body)) => {
                    for table in html::scan_tables(&body) {
                        merge_vlan_table(&mut report, &table);
                    }
                }
                Ok(None) => debug!(page, "vlan page absent, skipping"),
                Err(e) => report.partial_errors.push(format!("{page}: {e}")),
            }
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

        let system = self.scrape_system_info().await;
        let ports = self.scrape_port_status().await;

        let mut errors: Vec<String> = Vec::new();
        errors.extend(system.partial_errors.iter().cloned());
        errors.extend(ports.partial_errors.iter().cloned());

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

// ── Table interpretation ────────────────────────────────────────────

fn merge_port_table(report: &mut PortStatusReport, table: &HtmlTable) {
    // Only tables with a port column describe ports.
    if !table.headers.iter().any(|h| h.contains("port")) {
        return;
    }

    for row in &table.rows {
        let Some(port_id) = HtmlTable::cell(row, &["port", "port id", "port no"]) else {
            continue;
        };
        let port_id = port_id.to_owned();

        let link_up = HtmlTable::cell(row, &["link", "link status", "status"])
            .map(|v| v.eq_ignore_ascii_case("up"));
        let enabled = HtmlTable::cell(row, &["state", "enable", "admin"])
            .map(|v| v.eq_ignore_ascii_case("enable") || v.eq_ignore_ascii_case("enabled"));
        let speed = HtmlTable::cell(row, &["speed", "speed/duplex"]).map(str::to_owned);
        let pvid = HtmlTable::cell(row, &["pvid"]).and_then(|v| v.parse().ok());

        if let Some(existing) = report.ports.iter_mut().find(|p| p.port_id == port_id) {
            existing.link_up = existing.link_up.or(link_up);
            existing.enabled = existing.enabled.or(enabled);
            existing.speed = existing.speed.take().or(speed);
            existing.pvid = existing.pvid.or(pvid);
        } else {
            report.ports.push(PortStatus {
                port_id,
                enabled,
                link_up,
                speed,
                pvid,
            });
        }
    }
}

fn merge_vlan_table(report: &mut VlanConfigReport, table: &HtmlTable) {
    // A VLAN table needs an id column; anything else (pure port tables)
    // is ignored here.
    let has_vid = table
        .headers
        .iter()
        .any(|h| h == "vid" || h.contains("vlan id") || h == "vlan");
    if !has_vid {
        return;
    }

    for row in &table.rows {
        let Some(vid) = HtmlTable::cell(row, &["vid", "vlan id", "vlan"])
            .and_then(|v| v.parse::<u16>().ok())
        else {
            continue;
        };

        let name = HtmlTable::cell(row, &["name", "vlan name"]).map(str::to_owned);
        let description = HtmlTable::cell(row, &["description", "desc"]).map(str::to_owned);

        let mut members = Vec::new();
        if let Some(tagged) = HtmlTable::cell(row, &["tagged ports", "tagged"]) {
            for port in expand_port_list(tagged) {
                members.push(PortVlanMembership {
                    port_id: port,
                    tagged: true,
                    pvid: None,
                });
            }
        }
        if let Some(untagged) = HtmlTable::cell(row, &["untagged ports", "untagged"]) {
            for port in expand_port_list(untagged) {
                members.push(PortVlanMembership {
                    port_id: port,
                    tagged: false,
                    pvid: Some(vid),
                });
            }
        }

        if let Some(existing) = report.vlans.iter_mut().find(|v| v.vlan_id == vid) {
            existing.name = existing.name.take().or(name);
            existing.description = existing.description.take().or(description);
            for member in members {
                if !existing
                    .members
                    .iter()
                    .any(|m| m.port_id == member.port_id && m.tagged == member.tagged)
                {
                    existing.members.push(member);
                }
            }
        } else {
            report.vlans.push(DeviceVlan {
                vlan_id: vid,
                name,
                description,
                members,
            });
        }
    }
}

/// Expand a firmware port list like `"1-4,7"` into port ids.
/// Unparseable chunks are dropped, matching the scan's degrade-only rule.
fn expand_port_list(list: &str) -> Vec<String> {
    let mut out = Vec::new();
    for chunk in list.split(',') {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            continue;
        }
        if let Some((lo, hi)) = chunk.split_once('-') {
            if let (Ok(lo), Ok(hi)) = (lo.trim().parse::<u32>(), hi.trim().parse::<u32>()) {
                if lo <= hi && hi - lo <= 512 {
                    for p in lo..=hi {
                        out.push(p.to_string());
                    }
                }
            }
        } else if chunk.parse::<u32>().is_ok() {
            out.push(chunk.to_owned());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_ranges_and_singles() {
        assert_eq!(expand_port_list("1-3,7"), vec!["1", "2", "3", "7"]);
        assert_eq!(expand_port_list(" 5 "), vec!["5"]);
    }

    #[test]
    fn drops_garbage_chunks() {
        assert_eq!(expand_port_list("1,junk,3-2,4"), vec!["1", "4"]);
        assert!(expand_port_list("").is_empty());
    }
}
