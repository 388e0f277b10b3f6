// ── Background health monitor ──
//
// Periodic sweep over every registered switch. Each device gets one
// composite health check; a device that lost its session gets exactly
// one inline re-authentication attempt before being marked offline.
// Sweeps run all devices concurrently and a failing device never
// disturbs the others.

use std::sync::Arc;
use std::time::Duration;

use switchyard_api::models::HealthReport;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::SwitchId;
use crate::registry::SwitchRegistry;

pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(60);

/// Spawn the periodic health monitor. Stops when `cancel` fires.
pub fn spawn_health_monitor(
    registry: Arc<SwitchRegistry>,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(health_monitor_task(registry, period, cancel))
}

async fn health_monitor_task(
    registry: Arc<SwitchRegistry>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                debug!("health sweep tick");
                sweep(&registry).await;
            }
        }
    }
}

/// One full health sweep: check every device concurrently, update each
/// entry's runtime status, and return the per-device reports.
///
/// A device reporting unauthenticated gets one re-login attempt within
/// the same sweep; if that brings it back the fresh report wins.
pub async fn sweep(registry: &SwitchRegistry) -> Vec<(SwitchId, HealthReport)> {
    let results = registry
        .fan_out(registry.switch_ids(), |entry| async move {
            let client = entry.client()?;
            let mut report = client.health_check().await;
            // One recovery attempt per sweep, never more.
            if !report.authenticated && client.authenticate().await.is_ok() {
                report = client.health_check().await;
            }
            Ok::<_, CoreError>(report)
        })
        .await;

    let mut reports = Vec::with_capacity(results.len());
    for (switch_id, result) in results {
        let report = match result {
            Ok(report) => report,
            Err(e) => HealthReport::unreachable(e.to_string()),
        };

        if let Ok(entry) = registry.get(&switch_id) {
            if report.is_healthy() {
                entry.mark_online();
            } else {
                let reason = report
                    .error
                    .clone()
                    .unwrap_or_else(|| "health check failed".into());
                warn!(switch = %switch_id, error = %reason, "switch unhealthy");
                entry.mark_offline(reason);
            }
        }
        reports.push((switch_id, report));
    }
    reports
}
