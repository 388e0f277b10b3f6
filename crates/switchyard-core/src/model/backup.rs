// ── Backup records and bounded history ──

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use switchyard_api::models::DeviceBackup;
use uuid::Uuid;

use super::switch::SwitchId;

/// A point-in-time capture of one switch's readable configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRecord {
    pub id: String,
    pub switch_id: SwitchId,
    pub created_at: DateTime<Utc>,
    pub payload: DeviceBackup,
}

impl BackupRecord {
    pub fn new(switch_id: SwitchId, payload: DeviceBackup) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            switch_id,
            created_at: Utc::now(),
            payload,
        }
    }
}

/// Fixed-capacity recent-backup index for one switch, oldest evicted
/// first. Only metadata lives here; payloads are in the backup store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupHistory {
    capacity: usize,
    entries: VecDeque<BackupSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

impl BackupHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    /// Record a backup, evicting the oldest entry beyond capacity.
    /// Returns the evicted backup id, if any.
    pub fn push(&mut self, record: &BackupRecord) -> Option<String> {
        self.entries.push_back(BackupSummary {
            id: record.id.clone(),
            created_at: record.created_at,
        });
        if self.entries.len() > self.capacity {
            self.entries.pop_front().map(|e| e.id)
        } else {
            None
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &BackupSummary> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
