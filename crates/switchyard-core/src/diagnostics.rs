// ── Read-only diagnostics ──
//
// Registry status views and device-read passthroughs for the external
// interface. Nothing here mutates a device.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use switchyard_api::models::{HealthReport, PortStatusReport, SystemInfo};

use crate::error::CoreError;
use crate::health;
use crate::model::{Reachability, SwitchFamily, SwitchId};
use crate::registry::{SwitchEntry, SwitchFilter, SwitchRegistry};

/// Snapshot of one switch's identity and last-known status.
#[derive(Debug, Clone, Serialize)]
pub struct SwitchStatus {
    pub switch_id: SwitchId,
    pub name: String,
    pub family: SwitchFamily,
    pub model: Option<String>,
    pub address: String,
    pub reachability: Reachability,
    pub last_health_check: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl SwitchStatus {
    fn from_entry(entry: &SwitchEntry) -> Self {
        let runtime = entry.runtime();
        Self {
            switch_id: entry.descriptor.id.clone(),
            name: entry.descriptor.name.clone(),
            family: entry.descriptor.family,
            model: entry.descriptor.model.clone(),
            address: entry.descriptor.address.to_string(),
            reachability: runtime.reachability,
            last_health_check: runtime.last_health_check,
            last_error: runtime.last_error.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SwitchHealth {
    pub switch_id: SwitchId,
    pub report: HealthReport,
}

/// Network-wide health summary from one fresh sweep.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkHealthReport {
    pub total: usize,
    pub online: usize,
    pub offline: usize,
    pub switches: Vec<SwitchHealth>,
}

pub struct Diagnostics {
    registry: Arc<SwitchRegistry>,
}

impl Diagnostics {
    pub fn new(registry: Arc<SwitchRegistry>) -> Self {
        Self { registry }
    }

    /// Every registered switch with its last-known status, optionally
    /// filtered by family or reachability.
    pub fn all_switches(&self, filter: SwitchFilter) -> Vec<SwitchStatus> {
        self.registry
            .list(filter)
            .iter()
            .map(|entry| SwitchStatus::from_entry(entry))
            .collect()
    }

    pub fn switch_status(&self, switch_id: &SwitchId) -> Result<SwitchStatus, CoreError> {
        let entry = self.registry.get(switch_id)?;
        Ok(SwitchStatus::from_entry(&entry))
    }

    /// Live port-status read. Partial sub-query failures ride along in
    /// the report rather than raising.
    pub async fn port_status(&self, switch_id: &SwitchId) -> Result<PortStatusReport, CoreError> {
        let client = self.registry.client(switch_id)?;
        client
            .get_port_status()
            .await
            .map_err(|e| CoreError::from_api(switch_id, e))
    }

    /// Live system-info read, same partial-read contract.
    pub async fn system_info(&self, switch_id: &SwitchId) -> Result<SystemInfo, CoreError> {
        let client = self.registry.client(switch_id)?;
        client
            .get_system_info()
            .await
            .map_err(|e| CoreError::from_api(switch_id, e))
    }

    /// Run one health sweep now and summarize it. Also refreshes every
    /// entry's runtime status as a side effect of the sweep.
    pub async fn network_health_report(&self) -> NetworkHealthReport {
        let reports = health::sweep(&self.registry).await;
        let online = reports.iter().filter(|(_, r)| r.is_healthy()).count();
        NetworkHealthReport {
            total: reports.len(),
            online,
            offline: reports.len() - online,
            switches: reports
                .into_iter()
                .map(|(switch_id, report)| SwitchHealth { switch_id, report })
                .collect(),
        }
    }
}
