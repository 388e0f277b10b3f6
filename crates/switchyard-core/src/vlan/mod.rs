// ── VLAN orchestration ──
//
// Multi-switch VLAN lifecycle built on top of the registry fan-out:
// create with best-effort rollback, dependency-checked delete, per-port
// membership writes, read-only consistency auditing, and propagation
// mapping over the static uplink topology.

mod consistency;
mod orchestrator;
mod topology_map;
mod view;

pub use consistency::{ConsistencyReport, Inconsistency, MismatchKind, MismatchValue};
pub use orchestrator::{CreateVlanReport, DeleteVlanReport, VlanOrchestrator};
pub use topology_map::{TopologyMap, UplinkPropagation};
pub use view::NetworkVlanView;
