// Vimins-family session client.
//
// These switches expose a CGI command protocol: every logical query is a
// named command fetched with a GET, every mutation a form-encoded POST,
// both wrapped in a `{code, msg, data}` JSON envelope. Login completes
// asynchronously on the device, so authentication polls a status command
// until the device reports the session live.

mod auth;
mod client;
mod mutations;
mod queries;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use url::Url;

use crate::client::DeviceSessionClient;
use crate::error::Error;
use crate::models::{
    DeviceBackup, HealthReport, PortSettings, PortStatusReport, SystemInfo, VlanConfigReport,
    VlanPortSettings,
};
use crate::session::SessionGuard;
use crate::transport::TransportConfig;

/// Session client for the Vimins structured-API switch family.
pub struct ViminsClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: SecretString,
    session: SessionGuard,
    timeout: Duration,
}

impl ViminsClient {
    /// Build a client for one device. Does not touch the network;
    /// the first operation (or an explicit `authenticate`) logs in.
    pub fn new(
        base_url: Url,
        username: String,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            username,
            password,
            session: SessionGuard::default(),
            timeout: transport.timeout,
        })
    }

    /// Build a client with a pre-built `reqwest::Client` (tests).
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        username: String,
        password: SecretString,
    ) -> Self {
        Self {
            http,
            base_url,
            username,
            password,
            session: SessionGuard::default(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl DeviceSessionClient for ViminsClient {
    async fn authenticate(&self) -> Result<(), Error> {
        let mut state = self.session.begin().await;
        state.invalidate();
        self.login().await?;
        state.mark_authenticated();
        Ok(())
    }

    async fn ensure_session(&self) -> Result<(), Error> {
        // Lock held across the login so concurrent callers on an expired
        // session wait here instead of racing a second login.
        let mut state = self.session.begin().await;
        if state.is_valid() {
            return Ok(());
        }
        self.login().await?;
        state.mark_authenticated();
        Ok(())
    }

    async fn get_system_info(&self) -> Result<SystemInfo, Error> {
        self.ensure_session().await?;
        Ok(self.fetch_system_info().await)
    }

    async fn get_port_status(&self) -> Result<PortStatusReport, Error> {
        self.ensure_session().await?;
        Ok(self.fetch_port_status().await)
    }

    async fn get_vlan_config(&self) -> Result<VlanConfigReport, Error> {
        self.ensure_session().await?;
        Ok(self.fetch_vlan_config().await)
    }

    async fn configure_port(&self, port_id: &str, settings: &PortSettings) -> Result<(), Error> {
        self.ensure_session().await?;
        self.write_port_config(port_id, settings).await
    }

    async fn create_vlan(&self, vlan_id: u16, name: &str, description: &str) -> Result<(), Error> {
        self.ensure_session().await?;
        self.write_vlan_add(vlan_id, name, description).await
    }

    async fn delete_vlan(&self, vlan_id: u16) -> Result<(), Error> {
        self.ensure_session().await?;
        self.write_vlan_delete(vlan_id).await
    }

    async fn configure_vlan_port(
        &self,
        port_id: &str,
        settings: &VlanPortSettings,
    ) -> Result<(), Error> {
        self.ensure_session().await?;
        self.write_vlan_port(port_id, settings).await
    }

    async fn backup_configuration(&self) -> Result<DeviceBackup, Error> {
        self.ensure_session().await?;
        self.capture_backup().await
    }

    async fn restore_configuration(&self, backup: &DeviceBackup) -> Result<(), Error> {
        self.ensure_session().await?;
        self.replay_backup(backup).await
    }

    async fn health_check(&self) -> HealthReport {
        self.run_health_check().await
    }
}
