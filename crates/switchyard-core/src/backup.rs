// ── Configuration backup and restore ──
//
// Backups are full readable device captures, written through a pluggable
// store (filesystem in production, in-memory in tests) and indexed by a
// bounded per-switch history. Evicting a history entry also removes the
// stored payload, best-effort.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::audit;
use crate::error::{CoreError, TargetFailure};
use crate::model::{BackupHistory, BackupRecord, BackupSummary, SwitchId};
use crate::registry::SwitchRegistry;

pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Persistence sink for backup artifacts. Write and read-by-id, nothing
/// more; listing lives in the in-memory history.
#[async_trait]
pub trait BackupStore: Send + Sync {
    async fn write(&self, record: &BackupRecord) -> Result<(), CoreError>;

    /// Read a record back. Unknown ids fail with `BackupNotFound`.
    async fn read(&self, backup_id: &str) -> Result<BackupRecord, CoreError>;

    /// Remove a record. Removing an unknown id is not an error.
    async fn remove(&self, backup_id: &str) -> Result<(), CoreError>;
}

/// One JSON file per record under a flat directory.
pub struct FsBackupStore {
    dir: PathBuf,
}

impl FsBackupStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, backup_id: &str) -> PathBuf {
        self.dir.join(format!("{backup_id}.json"))
    }
}

#[async_trait]
impl BackupStore for FsBackupStore {
    async fn write(&self, record: &BackupRecord) -> Result<(), CoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CoreError::Internal(format!("backup directory: {e}")))?;
        let body = serde_json::to_vec_pretty(record)
            .map_err(|e| CoreError::Internal(format!("backup serialization: {e}")))?;
        tokio::fs::write(self.path_for(&record.id), body)
            .await
            .map_err(|e| CoreError::Internal(format!("backup write: {e}")))?;
        Ok(())
    }

    async fn read(&self, backup_id: &str) -> Result<BackupRecord, CoreError> {
        let path = self.path_for(backup_id);
        let body = match tokio::fs::read(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CoreError::BackupNotFound {
                    backup_id: backup_id.to_owned(),
                });
            }
            Err(e) => return Err(CoreError::Internal(format!("backup read: {e}"))),
        };
        serde_json::from_slice(&body)
            .map_err(|e| CoreError::Internal(format!("backup deserialization: {e}")))
    }

    async fn remove(&self, backup_id: &str) -> Result<(), CoreError> {
        match tokio::fs::remove_file(self.path_for(backup_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoreError::Internal(format!("backup removal: {e}"))),
        }
    }
}

/// One completed backup inside a run report.
#[derive(Debug, Clone, Serialize)]
pub struct BackupEntry {
    pub switch_id: SwitchId,
    pub backup_id: String,
    pub created_at: DateTime<Utc>,
}

/// Per-target breakdown of one backup fan-out. Backup has nothing to
/// roll back, so failures are reported here rather than raised.
#[derive(Debug, Clone, Serialize)]
pub struct BackupRunReport {
    pub completed: Vec<BackupEntry>,
    pub failures: Vec<TargetFailure>,
}

pub struct BackupManager {
    registry: Arc<SwitchRegistry>,
    store: Arc<dyn BackupStore>,
    histories: DashMap<SwitchId, BackupHistory>,
    capacity: usize,
}

impl BackupManager {
    pub fn new(registry: Arc<SwitchRegistry>, store: Arc<dyn BackupStore>, capacity: usize) -> Self {
        Self {
            registry,
            store,
            histories: DashMap::new(),
            capacity,
        }
    }

    /// Capture a backup of every target (all switches when `None`),
    /// concurrently. Each capture is written through the store and
    /// recorded in the switch's bounded history.
    pub async fn backup_switches(
        &self,
        targets: Option<Vec<SwitchId>>,
    ) -> Result<BackupRunReport, CoreError> {
        let targets = self.registry.resolve_targets(targets)?;

        let results = self
            .registry
            .fan_out(targets, |entry| async move {
                entry
                    .client()?
                    .backup_configuration()
                    .await
                    .map_err(|e| CoreError::from_api(&entry.descriptor.id, e))
            })
            .await;

        let mut report = BackupRunReport {
            completed: Vec::new(),
            failures: Vec::new(),
        };
        for (switch_id, result) in results {
            match result {
                Ok(payload) => {
                    let record = BackupRecord::new(switch_id.clone(), payload);
                    match self.commit(record).await {
                        Ok(entry) => {
                            audit::record(&switch_id, "backup_configuration", "success");
                            report.completed.push(entry);
                        }
                        Err(e) => {
                            audit::record(
                                &switch_id,
                                "backup_configuration",
                                &format!("failure: {e}"),
                            );
                            report.failures.push(TargetFailure {
                                switch_id,
                                error: e.to_string(),
                            });
                        }
                    }
                }
                Err(e) => {
                    audit::record(&switch_id, "backup_configuration", &format!("failure: {e}"));
                    report.failures.push(TargetFailure {
                        switch_id,
                        error: e.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    /// Persist one record and index it, evicting (and deleting) the
    /// oldest beyond capacity.
    async fn commit(&self, record: BackupRecord) -> Result<BackupEntry, CoreError> {
        self.store.write(&record).await?;

        let evicted = self
            .histories
            .entry(record.switch_id.clone())
            .or_insert_with(|| BackupHistory::new(self.capacity))
            .push(&record);

        if let Some(old_id) = evicted {
            debug!(backup_id = %old_id, "evicting oldest backup");
            if let Err(e) = self.store.remove(&old_id).await {
                warn!(backup_id = %old_id, error = %e, "evicted backup removal failed");
            }
        }

        info!(switch = %record.switch_id, backup_id = %record.id, "backup captured");
        Ok(BackupEntry {
            switch_id: record.switch_id,
            backup_id: record.id,
            created_at: record.created_at,
        })
    }

    /// Replay a stored backup onto its switch. The record must belong to
    /// the given switch.
    pub async fn restore_switch(
        &self,
        switch_id: &SwitchId,
        backup_id: &str,
    ) -> Result<(), CoreError> {
        let client = self.registry.client(switch_id)?;
        let record = self.store.read(backup_id).await?;
        if &record.switch_id != switch_id {
            return Err(CoreError::Validation {
                message: format!(
                    "backup {backup_id} belongs to switch {}, not {switch_id}",
                    record.switch_id
                ),
            });
        }

        match client.restore_configuration(&record.payload).await {
            Ok(()) => {
                audit::record(switch_id, "restore_configuration", "success");
                info!(switch = %switch_id, backup_id, "configuration restored");
                Ok(())
            }
            Err(e) => {
                let err = CoreError::from_api(switch_id, e);
                audit::record(switch_id, "restore_configuration", &format!("failure: {err}"));
                Err(err)
            }
        }
    }

    /// Recent backups for one switch, oldest first.
    pub fn history(&self, switch_id: &SwitchId) -> Result<Vec<BackupSummary>, CoreError> {
        self.registry.get(switch_id)?;
        Ok(self
            .histories
            .get(switch_id)
            .map(|h| h.entries().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use switchyard_api::models::{DeviceBackup, PortStatusReport, SystemInfo, VlanConfigReport};

    fn record(switch: &str) -> BackupRecord {
        BackupRecord::new(
            SwitchId::new(switch),
            DeviceBackup {
                captured_at: Utc::now(),
                system: SystemInfo::default(),
                ports: PortStatusReport::default(),
                vlans: VlanConfigReport::default(),
                raw: serde_json::Value::Null,
            },
        )
    }

    #[tokio::test]
    async fn fs_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBackupStore::new(dir.path());

        let original = record("sw-a");
        store.write(&original).await.unwrap();

        let loaded = store.read(&original.id).await.unwrap();
        assert_eq!(loaded.id, original.id);
        assert_eq!(loaded.switch_id, original.switch_id);
    }

    #[tokio::test]
    async fn fs_store_missing_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBackupStore::new(dir.path());

        let err = store.read("no-such-backup").await.unwrap_err();
        assert!(matches!(err, CoreError::BackupNotFound { .. }));
    }

    #[tokio::test]
    async fn fs_store_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBackupStore::new(dir.path());

        let original = record("sw-a");
        store.write(&original).await.unwrap();
        store.remove(&original.id).await.unwrap();
        store.remove(&original.id).await.unwrap();

        assert!(matches!(
            store.read(&original.id).await.unwrap_err(),
            CoreError::BackupNotFound { .. }
        ));
    }
}
