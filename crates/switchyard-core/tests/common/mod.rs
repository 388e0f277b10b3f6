// Shared test fixtures: a programmable in-memory device client and
// registry builders.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use secrecy::SecretString;
use switchyard_api::models::{
    DeviceBackup, DeviceVlan, HealthReport, PortSettings, PortStatus, PortStatusReport,
    PortVlanMembership, SystemInfo, VlanConfigReport, VlanPortSettings,
};
use switchyard_api::{DeviceSessionClient, Error};
use switchyard_core::registry::SwitchRegistry;
use switchyard_core::{SwitchDescriptor, SwitchFamily, SwitchId};
use tokio::sync::Mutex;
use url::Url;

/// In-memory stand-in for one switch. Operations can be told to fail by
/// name; every call is recorded for assertion.
pub struct FakeSwitch {
    pub id: SwitchId,
    vlans: Mutex<Vec<DeviceVlan>>,
    fail_ops: Mutex<HashSet<&'static str>>,
    calls: Mutex<Vec<String>>,
    auth_calls: AtomicUsize,
    /// Artificial per-call delay, for timeout tests.
    delay: Mutex<Option<Duration>>,
}

impl FakeSwitch {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: SwitchId::new(id),
            vlans: Mutex::new(Vec::new()),
            fail_ops: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            auth_calls: AtomicUsize::new(0),
            delay: Mutex::new(None),
        })
    }

    pub async fn fail_on(&self, op: &'static str) {
        self.fail_ops.lock().await.insert(op);
    }

    pub async fn delay_calls(&self, delay: Duration) {
        *self.delay.lock().await = Some(delay);
    }

    pub async fn seed_vlan(&self, vlan_id: u16, name: &str, members: &[(&str, bool)]) {
        self.vlans.lock().await.push(DeviceVlan {
            vlan_id,
            name: Some(name.to_owned()),
            description: None,
            members: members
                .iter()
                .map(|(port, tagged)| PortVlanMembership {
                    port_id: (*port).to_owned(),
                    tagged: *tagged,
                    pvid: None,
                })
                .collect(),
        });
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    pub fn auth_count(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    pub async fn has_vlan(&self, vlan_id: u16) -> bool {
        self.vlans.lock().await.iter().any(|v| v.vlan_id == vlan_id)
    }

    async fn record(&self, op: &str) -> Result<(), Error> {
        if let Some(delay) = *self.delay.lock().await {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().await.push(op.to_owned());
        if self.fail_ops.lock().await.contains(op) {
            return Err(Error::Protocol {
                message: format!("{op} rejected by device"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceSessionClient for FakeSwitch {
    async fn authenticate(&self) -> Result<(), Error> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        self.record("authenticate").await
    }

    async fn ensure_session(&self) -> Result<(), Error> {
        self.record("ensure_session").await
    }

    async fn get_system_info(&self) -> Result<SystemInfo, Error> {
        self.record("get_system_info").await?;
        Ok(SystemInfo::default())
    }

    async fn get_port_status(&self) -> Result<PortStatusReport, Error> {
        self.record("get_port_status").await?;
        Ok(PortStatusReport {
            ports: vec![PortStatus {
                port_id: "1".into(),
                enabled: Some(true),
                link_up: Some(true),
                speed: Some("1000".into()),
                pvid: Some(1),
            }],
            partial_errors: Vec::new(),
        })
    }

    async fn get_vlan_config(&self) -> Result<VlanConfigReport, Error> {
        self.record("get_vlan_config").await?;
        Ok(VlanConfigReport {
            vlans: self.vlans.lock().await.clone(),
            partial_errors: Vec::new(),
        })
    }

    async fn configure_port(&self, _port_id: &str, _settings: &PortSettings) -> Result<(), Error> {
        self.record("configure_port").await
    }

    async fn create_vlan(&self, vlan_id: u16, name: &str, description: &str) -> Result<(), Error> {
        self.record("create_vlan").await?;
        self.vlans.lock().await.push(DeviceVlan {
            vlan_id,
            name: Some(name.to_owned()),
            description: Some(description.to_owned()),
            members: Vec::new(),
        });
        Ok(())
    }

    async fn delete_vlan(&self, vlan_id: u16) -> Result<(), Error> {
        self.record("delete_vlan").await?;
        self.vlans.lock().await.retain(|v| v.vlan_id != vlan_id);
        Ok(())
    }

    async fn configure_vlan_port(
        &self,
        port_id: &str,
        settings: &VlanPortSettings,
    ) -> Result<(), Error> {
        self.record("configure_vlan_port").await?;
        let mut vlans = self.vlans.lock().await;
        if let Some(vlan) = vlans.iter_mut().find(|v| v.vlan_id == settings.vlan_id) {
            if settings.member {
                vlan.members.push(PortVlanMembership {
                    port_id: port_id.to_owned(),
                    tagged: settings.tagged,
                    pvid: settings.pvid,
                });
            } else {
                vlan.members.retain(|m| m.port_id != port_id);
            }
        }
        Ok(())
    }

    async fn backup_configuration(&self) -> Result<DeviceBackup, Error> {
        self.record("backup_configuration").await?;
        Ok(DeviceBackup {
            captured_at: Utc::now(),
            system: SystemInfo::default(),
            ports: PortStatusReport::default(),
            vlans: VlanConfigReport {
                vlans: self.vlans.lock().await.clone(),
                partial_errors: Vec::new(),
            },
            raw: serde_json::Value::Null,
        })
    }

    async fn restore_configuration(&self, backup: &DeviceBackup) -> Result<(), Error> {
        self.record("restore_configuration").await?;
        *self.vlans.lock().await = backup.vlans.vlans.clone();
        Ok(())
    }

    async fn health_check(&self) -> HealthReport {
        let _ = self.record("health_check").await;
        HealthReport {
            authenticated: true,
            reachable: true,
            system_info_ok: true,
            port_status_ok: true,
            error: None,
            checked_at: Utc::now(),
        }
    }
}

#[allow(clippy::unwrap_used)]
pub fn descriptor(id: &str) -> SwitchDescriptor {
    SwitchDescriptor {
        id: SwitchId::new(id),
        name: format!("switch {id}"),
        address: Url::parse(&format!("http://{id}.example.test")).unwrap(),
        family: SwitchFamily::Vimins,
        model: None,
        username: "admin".into(),
        password: SecretString::from("secret"),
        timeout: Duration::from_secs(2),
    }
}

/// Registry with one fake per id, in the given order.
pub fn registry_with(fakes: &[Arc<FakeSwitch>]) -> Arc<SwitchRegistry> {
    let registry = Arc::new(SwitchRegistry::new());
    for fake in fakes {
        registry.register_with_client(
            descriptor(fake.id.as_str()),
            Arc::clone(fake) as Arc<dyn DeviceSessionClient>,
        );
    }
    registry
}
