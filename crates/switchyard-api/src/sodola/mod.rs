// Sodola-family session client.
//
// No structured API: these switches serve an embedded web UI and nothing
// else, so every read is an authenticated page fetch plus a structural
// scan of whatever tables come back, and every write is a form submit.
// Page layout varies across firmware revisions -- which page holds which
// table is not guaranteed -- so reads walk candidate page lists and merge
// partial findings instead of trusting any single URL.

mod auth;
mod client;
pub mod html;
mod mutations;
mod pages;

use std::sync::atomic::{AtomicBool, Ordering};
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

/// Session client for the Sodola HTML-interface switch family.
pub struct SodolaClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: SecretString,
    session: SessionGuard,
    timeout: Duration,
    /// True when the device accepted HTTP Basic credentials; false when
    /// we fell back to the HTML login form (session cookie in the jar).
    basic_auth: AtomicBool,
}

impl SodolaClient {
    /// Build a client for one device. A cookie jar is always attached:
    /// the form-login fallback depends on `Set-Cookie` round-tripping.
    pub fn new(
        base_url: Url,
        username: String,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let http = config.build_client()?;
        Ok(Self {
            http,
            base_url,
            username,
            password,
            session: SessionGuard::default(),
            timeout: config.timeout,
            basic_auth: AtomicBool::new(false),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn uses_basic_auth(&self) -> bool {
        self.basic_auth.load(Ordering::Relaxed)
    }

    pub(crate) fn set_basic_auth(&self, on: bool) {
        self.basic_auth.store(on, Ordering::Relaxed);
    }
}

#[async_trait]
impl DeviceSessionClient for SodolaClient {
    async fn authenticate(&self) -> Result<(), Error> {
        let mut state = self.session.begin().await;
        state.invalidate();
        self.login().await?;
        state.mark_authenticated();
        Ok(())
    }

    async fn ensure_session(&self) -> Result<(), Error> {
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
        Ok(self.scrape_system_info().await)
    }

    async fn get_port_status(&self) -> Result<PortStatusReport, Error> {
        self.ensure_session().await?;
        Ok(self.scrape_port_status().await)
    }

    async fn get_vlan_config(&self) -> Result<VlanConfigReport, Error> {
        self.ensure_session().await?;
        Ok(self.scrape_vlan_config().await)
    }

    async fn configure_port(&self, port_id: &str, settings: &PortSettings) -> Result<(), Error> {
        self.ensure_session().await?;
        self.submit_port_config(port_id, settings).await
    }

    async fn create_vlan(&self, vlan_id: u16, name: &str, description: &str) -> Result<(), Error> {
        self.ensure_session().await?;
        self.submit_vlan_add(vlan_id, name, description).await
    }

    async fn delete_vlan(&self, vlan_id: u16) -> Result<(), Error> {
        self.ensure_session().await?;
        self.submit_vlan_delete(vlan_id).await
    }

    async fn configure_vlan_port(
        &self,
        port_id: &str,
        settings: &VlanPortSettings,
    ) -> Result<(), Error> {
        self.ensure_session().await?;
        self.submit_vlan_port(port_id, settings).await
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
