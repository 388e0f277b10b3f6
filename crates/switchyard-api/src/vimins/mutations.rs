// Vimins write commands and backup/restore.

use chrono::Utc;
use tracing::debug;

use crate::error::Error;
use crate::models::{DeviceBackup, PortSettings, VlanPortSettings};
use crate::vimins::ViminsClient;

impl ViminsClient {
    /// `cmd=port_config` write.
    pub(crate) async fn write_port_config(
        &self,
        port_id: &str,
        settings: &PortSettings,
    ) -> Result<(), Error> {
        let mut fields: Vec<(&str, String)> = vec![("port", port_id.to_owned())];
        if let Some(enabled) = settings.enabled {
            fields.push(("enabled", if enabled { "1" } else { "0" }.to_owned()));
        }
        if let Some(ref speed) = settings.speed {
            fields.push(("speed", speed.clone()));
        }
        if let Some(flow) = settings.flow_control {
            fields.push(("flow_control", if flow { "1" } else { "0" }.to_owned()));
        }
        if let Some(ref desc) = settings.description {
            fields.push(("desc", desc.clone()));
        }

        self.post_command("port_config", &fields).await?;
        Ok(())
    }

    /// `cmd=vlan_add`.
    pub(crate) async fn write_vlan_add(
        &self,
        vlan_id: u16,
        name: &str,
        description: &str,
    ) -> Result<(), Error> {
        debug!(vlan_id, name, "creating VLAN");
        self.post_command(
            "vlan_add",
            &[
                ("vid", vlan_id.to_string()),
                ("name", name.to_owned()),
                ("desc", description.to_owned()),
            ],
        )
        .await?;
        Ok(())
    }

    /// `cmd=vlan_del` -- this family has a dedicated delete command.
    pub(crate) async fn write_vlan_delete(&self, vlan_id: u16) -> Result<(), Error> {
        debug!(vlan_id, "deleting VLAN");
        self.post_command("vlan_del", &[("vid", vlan_id.to_string())])
            .await?;
        Ok(())
    }

    /// `cmd=vlan_port` -- per-port membership and PVID.
    pub(crate) async fn write_vlan_port(
        &self,
        port_id: &str,
        settings: &VlanPortSettings,
    ) -> Result<(), Error> {
        let mut fields: Vec<(&str, String)> = vec![
            ("port", port_id.to_owned()),
            ("vid", settings.vlan_id.to_string()),
            ("tagged", if settings.tagged { "1" } else { "0" }.to_owned()),
            ("member", if settings.member { "1" } else { "0" }.to_owned()),
        ];
        if let Some(pvid) = settings.pvid {
            fields.push(("pvid", pvid.to_string()));
        }

        self.post_command("vlan_port", &fields).await?;
        Ok(())
    }

    /// Capture everything the device will tell us, plus the raw config
    /// dump where the firmware offers one.
    pub(crate) async fn capture_backup(&self) -> Result<DeviceBackup, Error> {
        let system = self.fetch_system_info().await;
        let ports = self.fetch_port_status().await;
        let vlans = self.fetch_vlan_config().await;

        // The dump command is missing on older firmware; treat that as
        // "no extras", not a failed backup.
        let raw = self
            .get_command("config_dump")
            .await
            .unwrap_or(serde_json::Value::Null);

        Ok(DeviceBackup {
            captured_at: Utc::now(),
            system,
            ports,
            vlans,
            raw,
        })
    }

    /// Replay a captured configuration through `cmd=config_restore`.
    pub(crate) async fn replay_backup(&self, backup: &DeviceBackup) -> Result<(), Error> {
        let payload = serde_json::to_string(backup).map_err(|e| Error::Protocol {
            message: format!("backup serialization failed: {e}"),
        })?;

        debug!(captured_at = %backup.captured_at, "restoring configuration");
        self.post_command("config_restore", &[("payload", payload)])
            .await?;
        Ok(())
    }
}
