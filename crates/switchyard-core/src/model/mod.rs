// ── Domain types ──

mod backup;
mod switch;
mod template;
mod topology;
mod vlan;

pub use backup::{BackupHistory, BackupRecord, BackupSummary};
pub use switch::{Reachability, SwitchDescriptor, SwitchFamily, SwitchId, SwitchRuntime};
pub use template::VlanTemplate;
pub use topology::{UplinkEdge, UplinkEndpoint};
pub use vlan::{PortMembership, Vlan, VlanSummary, VLAN_ID_MAX, VLAN_ID_MIN};
