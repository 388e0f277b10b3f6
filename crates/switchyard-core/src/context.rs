// ── Engine lifecycle ──
//
// Wires the registry, orchestrator, diagnostics and backup manager
// together from a static device inventory, runs initial authentication,
// and owns the background health monitor. The only fatal startup
// condition is an empty inventory; individual devices failing to come
// up stay registered as offline.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::backup::{BackupManager, FsBackupStore, DEFAULT_HISTORY_CAPACITY};
use crate::diagnostics::Diagnostics;
use crate::error::CoreError;
use crate::health::{self, DEFAULT_HEALTH_INTERVAL};
use crate::model::{SwitchDescriptor, UplinkEdge};
use crate::ops::Operations;
use crate::registry::SwitchRegistry;
use crate::vlan::VlanOrchestrator;

/// Engine-level settings not tied to any one device.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// VLAN ids that may never be created or deleted.
    pub reserved_vlans: BTreeSet<u16>,
    pub uplinks: Vec<UplinkEdge>,
    pub backup_dir: PathBuf,
    pub backup_history_capacity: usize,
    pub health_interval: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            reserved_vlans: BTreeSet::from([1]),
            uplinks: Vec::new(),
            backup_dir: PathBuf::from("backups"),
            backup_history_capacity: DEFAULT_HISTORY_CAPACITY,
            health_interval: DEFAULT_HEALTH_INTERVAL,
        }
    }
}

/// The assembled engine: one registry, one facade, one health monitor.
pub struct Engine {
    registry: Arc<SwitchRegistry>,
    operations: Arc<Operations>,
    cancel: CancellationToken,
    health_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Engine {
    /// Register the inventory, attempt initial authentication on every
    /// device, and start the health monitor.
    pub async fn start(
        inventory: Vec<SwitchDescriptor>,
        settings: EngineSettings,
    ) -> Result<Self, CoreError> {
        if inventory.is_empty() {
            return Err(CoreError::Config {
                message: "no switches configured".into(),
            });
        }

        let registry = Arc::new(SwitchRegistry::new());
        for descriptor in inventory {
            registry.register(descriptor);
        }
        info!(switches = registry.len(), "registry populated");
        registry.initialize().await;

        let orchestrator = VlanOrchestrator::new(
            Arc::clone(&registry),
            settings.reserved_vlans,
            settings.uplinks,
        );
        let diagnostics = Diagnostics::new(Arc::clone(&registry));
        let store = Arc::new(FsBackupStore::new(settings.backup_dir));
        let backups = BackupManager::new(
            Arc::clone(&registry),
            store,
            settings.backup_history_capacity,
        );
        let operations = Arc::new(Operations::new(
            Arc::clone(&registry),
            orchestrator,
            diagnostics,
            backups,
        ));

        let cancel = CancellationToken::new();
        let health_handle = health::spawn_health_monitor(
            Arc::clone(&registry),
            settings.health_interval,
            cancel.child_token(),
        );

        Ok(Self {
            registry,
            operations,
            cancel,
            health_handle: Mutex::new(Some(health_handle)),
        })
    }

    pub fn operations(&self) -> Arc<Operations> {
        Arc::clone(&self.operations)
    }

    pub fn registry(&self) -> &Arc<SwitchRegistry> {
        &self.registry
    }

    /// Stop the health monitor and wait for it to exit.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        if let Some(handle) = self.health_handle.lock().await.take() {
            let _ = handle.await;
        }
        info!("engine stopped");
    }
}
