//! Cross-switch VLAN orchestration over `switchyard-api` device clients.
//!
//! This crate owns the business logic of the workspace:
//!
//! - **[`Engine`]** — Lifecycle facade: [`start()`](Engine::start)
//!   registers the device inventory, runs initial authentication, and
//!   spawns the background health monitor;
//!   [`shutdown()`](Engine::shutdown) stops it cleanly.
//!
//! - **[`SwitchRegistry`]** — Concurrent device inventory (`DashMap` +
//!   `ArcSwap` runtime status) with the per-device-timeout fan-out
//!   primitive every multi-target operation builds on.
//!
//! - **[`VlanOrchestrator`]** ([`vlan`]) — Multi-switch VLAN lifecycle:
//!   create with best-effort rollback, dependency-checked delete,
//!   per-port membership writes, consistency auditing, and propagation
//!   mapping over the static uplink topology.
//!
//! - **[`Operations`]** ([`ops`]) — The flat-parameter operation facade
//!   consumed by an external transport; every `CoreError` is rendered
//!   into an [`OpOutcome`](ops::OpOutcome) at this boundary.
//!
//! - **Backups** ([`backup`]) — Device capture/restore through a
//!   pluggable [`BackupStore`](backup::BackupStore) with bounded
//!   per-switch history.

pub mod audit;
pub mod backup;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod health;
pub mod model;
pub mod ops;
pub mod registry;
pub mod vlan;

// ── Primary re-exports ──────────────────────────────────────────────
pub use context::{Engine, EngineSettings};
pub use error::{CoreError, TargetFailure};
pub use ops::{OpOutcome, Operations};
pub use registry::{SwitchEntry, SwitchFilter, SwitchRegistry};
pub use vlan::VlanOrchestrator;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    BackupHistory, BackupRecord, BackupSummary, PortMembership, Reachability, SwitchDescriptor,
    SwitchFamily, SwitchId, SwitchRuntime, UplinkEdge, UplinkEndpoint, Vlan, VlanSummary,
    VlanTemplate,
};
