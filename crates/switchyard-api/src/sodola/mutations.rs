// Sodola form writes and backup/restore.
//
// Every mutation is a form submit against a CGI endpoint; the device
// answers HTTP 200 regardless, so rejection is detected by scanning the
// response body for error markers.

use chrono::Utc;
use tracing::debug;

use crate::error::Error;
use crate::models::{DeviceBackup, PortSettings, VlanPortSettings};
use crate::sodola::SodolaClient;

const VLAN_CGI: &str = "vlan.cgi";
const PORT_CGI: &str = "port.cgi";
const CONFIG_CGI: &str = "config.cgi";

impl SodolaClient {
    pub(crate) async fn submit_port_config(
        &self,
        port_id: &str,
        settings: &PortSettings,
    ) -> Result<(), Error> {
        let mut fields: Vec<(&str, String)> = vec![
            ("action", "set".to_owned()),
            ("port", port_id.to_owned()),
        ];
        if let Some(enabled) = settings.enabled {
            fields.push(("state", if enabled { "1" } else { "0" }.to_owned()));
        }
        if let Some(ref speed) = settings.speed {
            fields.push(("speed", speed.clone()));
        }
        if let Some(flow) = settings.flow_control {
            fields.push(("flow", if flow { "1" } else { "0" }.to_owned()));
        }

        let body = self.submit_form(PORT_CGI, &fields).await?;
        Self::check_write_response(PORT_CGI, &body)
    }

    pub(crate) async fn submit_vlan_add(
        &self,
        vlan_id: u16,
        name: &str,
        description: &str,
    ) -> Result<(), Error> {
        debug!(vlan_id, name, "creating VLAN");
        let body = self
            .submit_form(
                VLAN_CGI,
                &[
                    ("action", "add".to_owned()),
                    ("vid", vlan_id.to_string()),
                    ("name", name.to_owned()),
                    ("desc", description.to_owned()),
                ],
            )
            .await?;
        Self::check_write_response(VLAN_CGI, &body)
    }

    /// This family has no delete command -- removal is the VLAN form's
    /// delete action.
    pub(crate) async fn submit_vlan_delete(&self, vlan_id: u16) -> Result<(), Error> {
        debug!(vlan_id, "deleting VLAN");
        let body = self
            .submit_form(
                VLAN_CGI,
                &[
                    ("action", "delete".to_owned()),
                    ("vid", vlan_id.to_string()),
                ],
            )
            .await?;
        Self::check_write_response(VLAN_CGI, &body)
    }

    pub(crate) async fn submit_vlan_port(
        &self,
        port_id: &str,
        settings: &VlanPortSettings,
    ) -> Result<(), Error> {
        let mut fields: Vec<(&str, String)> = vec![
            ("action", "setport".to_owned()),
            ("port", port_id.to_owned()),
            ("vid", settings.vlan_id.to_string()),
            ("tagged", if settings.tagged { "1" } else { "0" }.to_owned()),
            ("member", if settings.member { "1" } else { "0" }.to_owned()),
        ];
        if let Some(pvid) = settings.pvid {
            fields.push(("pvid", pvid.to_string()));
        }

        let body = self.submit_form(VLAN_CGI, &fields).await?;
        Self::check_write_response(VLAN_CGI, &body)
    }

    /// Capture the common shapes plus the raw config page where the
    /// firmware exposes one.
    pub(crate) async fn capture_backup(&self) -> Result<DeviceBackup, Error> {
        let system = self.scrape_system_info().await;
        let ports = self.scrape_port_status().await;
        let vlans = self.scrape_vlan_config().await;

        let raw = match self.fetch_page("config.htm").await {
            Ok(Some(body)) => serde_json::Value::String(body),
            _ => serde_json::Value::Null,
        };

        Ok(DeviceBackup {
            captured_at: Utc::now(),
            system,
            ports,
            vlans,
            raw,
        })
    }

    /// Replay a captured configuration through the config form.
    pub(crate) async fn replay_backup(&self, backup: &DeviceBackup) -> Result<(), Error> {
        let payload = serde_json::to_string(backup).map_err(|e| Error::Protocol {
            message: format!("backup serialization failed: {e}"),
        })?;

        debug!(captured_at = %backup.captured_at, "restoring configuration");
        let body = self
            .submit_form(
                CONFIG_CGI,
                &[("action", "restore".to_owned()), ("payload", payload)],
            )
            .await?;
        Self::check_write_response(CONFIG_CGI, &body)
    }
}
