// ── Structured operation audit log ──
//
// One record per mutating device operation and per consistency check,
// emitted on a dedicated tracing target so subscribers can route them
// separately from diagnostic chatter. Emission is fire-and-forget; no
// operation ever depends on a record being delivered.

use crate::model::SwitchId;

pub const AUDIT_TARGET: &str = "switchyard::audit";

/// Record the outcome of one mutating operation against one device.
pub fn record(switch_id: &SwitchId, operation: &str, outcome: &str) {
    tracing::info!(
        target: AUDIT_TARGET,
        switch = %switch_id,
        operation,
        outcome,
        "device operation"
    );
}

/// Record the outcome of a network-wide check (no single device).
pub fn record_check(operation: &str, outcome: &str) {
    tracing::info!(
        target: AUDIT_TARGET,
        operation,
        outcome,
        "network check"
    );
}
