// ── Switch registry ──
//
// Lock-free concurrent storage for every managed device: its static
// descriptor, the vendor-bound session client, and lock-free runtime
// status. Vendor selection happens exactly once, here, at registration;
// everything downstream works against `dyn DeviceSessionClient`.

use std::future::Future;
use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use switchyard_api::transport::TransportConfig;
use switchyard_api::{DeviceSessionClient, SodolaClient, ViminsClient};
use tracing::{info, warn};

use crate::error::CoreError;
use crate::model::{Reachability, SwitchDescriptor, SwitchFamily, SwitchId, SwitchRuntime};

/// One registered switch: descriptor, bound client, runtime status.
///
/// `client` is `None` when construction failed at registration time
/// (bad URL, typically). The entry stays in the registry so listings
/// and status reports still see the device; operations against it get
/// `Unavailable`.
pub struct SwitchEntry {
    pub descriptor: SwitchDescriptor,
    client: Option<Arc<dyn DeviceSessionClient>>,
    init_error: Option<String>,
    runtime: ArcSwap<SwitchRuntime>,
}

impl std::fmt::Debug for SwitchEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwitchEntry")
            .field("descriptor", &self.descriptor)
            .field("init_error", &self.init_error)
            .finish_non_exhaustive()
    }
}

impl SwitchEntry {
    /// Current runtime status (cheap lock-free read).
    pub fn runtime(&self) -> Arc<SwitchRuntime> {
        self.runtime.load_full()
    }

    pub fn reachability(&self) -> Reachability {
        self.runtime.load().reachability
    }

    pub fn mark_online(&self) {
        let mut rt = SwitchRuntime::clone(&self.runtime.load());
        rt.mark_online();
        self.runtime.store(Arc::new(rt));
    }

    pub fn mark_offline(&self, error: impl Into<String>) {
        let mut rt = SwitchRuntime::clone(&self.runtime.load());
        rt.mark_offline(error);
        self.runtime.store(Arc::new(rt));
    }

    /// The session client, or `Unavailable` when construction failed.
    pub fn client(&self) -> Result<Arc<dyn DeviceSessionClient>, CoreError> {
        self.client
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| CoreError::Unavailable {
                switch_id: self.descriptor.id.clone(),
                reason: self
                    .init_error
                    .clone()
                    .unwrap_or_else(|| "client construction failed".into()),
            })
    }
}

/// Optional filters for registry listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwitchFilter {
    pub family: Option<SwitchFamily>,
    pub reachability: Option<Reachability>,
}

/// The device inventory. Fixed membership after startup; runtime status
/// mutates freely under concurrent readers.
pub struct SwitchRegistry {
    entries: DashMap<SwitchId, Arc<SwitchEntry>>,
}

impl Default for SwitchRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SwitchRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Register a device, binding the family-specific client. A failed
    /// construction still registers the entry (offline, unavailable) so
    /// the device is visible in listings and health reports.
    pub fn register(&self, descriptor: SwitchDescriptor) {
        let (client, init_error) = match build_client(&descriptor) {
            Ok(c) => (Some(c), None),
            Err(e) => {
                warn!(
                    switch = %descriptor.id,
                    error = %e,
                    "client construction failed; registering as unavailable"
                );
                (None, Some(e.to_string()))
            }
        };

        let entry = SwitchEntry {
            descriptor,
            client,
            init_error,
            runtime: ArcSwap::from_pointee(SwitchRuntime::default()),
        };
        self.entries
            .insert(entry.descriptor.id.clone(), Arc::new(entry));
    }

    /// Register a device with a caller-supplied client. Test seam; also
    /// how a future vendor family would slot in without touching the
    /// registry.
    pub fn register_with_client(
        &self,
        descriptor: SwitchDescriptor,
        client: Arc<dyn DeviceSessionClient>,
    ) {
        let entry = SwitchEntry {
            descriptor,
            client: Some(client),
            init_error: None,
            runtime: ArcSwap::from_pointee(SwitchRuntime::default()),
        };
        self.entries
            .insert(entry.descriptor.id.clone(), Arc::new(entry));
    }

    /// Attempt an initial login on every registered device, concurrently.
    /// Failures mark the device offline but never abort startup.
    pub async fn initialize(&self) {
        let results = self
            .fan_out(self.switch_ids(), |entry| async move {
                entry.client()?.authenticate().await.map_err(|e| {
                    CoreError::from_api(&entry.descriptor.id, e)
                })
            })
            .await;

        for (switch_id, result) in results {
            match result {
                Ok(()) => {
                    info!(switch = %switch_id, "initial authentication succeeded");
                    if let Some(entry) = self.entries.get(&switch_id) {
                        entry.mark_online();
                    }
                }
                Err(e) => {
                    warn!(switch = %switch_id, error = %e, "initial authentication failed");
                    if let Some(entry) = self.entries.get(&switch_id) {
                        entry.mark_offline(e.to_string());
                    }
                }
            }
        }
    }

    /// Look up a registered switch. Unknown id is `NotFound`; a known id
    /// whose client never constructed surfaces `Unavailable` from
    /// `SwitchEntry::client`.
    pub fn get(&self, switch_id: &SwitchId) -> Result<Arc<SwitchEntry>, CoreError> {
        self.entries
            .get(switch_id)
            .map(|r| Arc::clone(r.value()))
            .ok_or_else(|| CoreError::NotFound {
                switch_id: switch_id.clone(),
            })
    }

    /// Shorthand for `get` + `client`.
    pub fn client(&self, switch_id: &SwitchId) -> Result<Arc<dyn DeviceSessionClient>, CoreError> {
        self.get(switch_id)?.client()
    }

    /// All entries matching the filter, ordered by switch id.
    pub fn list(&self, filter: SwitchFilter) -> Vec<Arc<SwitchEntry>> {
        let mut entries: Vec<Arc<SwitchEntry>> = self
            .entries
            .iter()
            .map(|r| Arc::clone(r.value()))
            .filter(|e| {
                filter.family.is_none_or(|f| e.descriptor.family == f)
                    && filter.reachability.is_none_or(|r| e.reachability() == r)
            })
            .collect();
        entries.sort_by(|a, b| a.descriptor.id.cmp(&b.descriptor.id));
        entries
    }

    /// Resolve an optional explicit target list: `None` means every
    /// registered switch; explicit ids must all be known, deduplicated
    /// preserving order. An empty resolution is a validation error.
    pub fn resolve_targets(
        &self,
        targets: Option<Vec<SwitchId>>,
    ) -> Result<Vec<SwitchId>, CoreError> {
        let resolved = match targets {
            Some(ids) => {
                let mut seen = std::collections::BTreeSet::new();
                let mut out = Vec::new();
                for id in ids {
                    self.get(&id)?;
                    if seen.insert(id.clone()) {
                        out.push(id);
                    }
                }
                out
            }
            None => self.switch_ids(),
        };
        if resolved.is_empty() {
            return Err(CoreError::Validation {
                message: "no target switches".into(),
            });
        }
        Ok(resolved)
    }

    /// All registered ids, ordered.
    pub fn switch_ids(&self) -> Vec<SwitchId> {
        let mut ids: Vec<SwitchId> = self.entries.iter().map(|r| r.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run one async operation against many switches concurrently, each
    /// bounded by its own descriptor timeout. One slow or dead device
    /// never stalls the rest; each target's outcome is reported
    /// independently, in the order the targets were given.
    pub async fn fan_out<T, F, Fut>(
        &self,
        targets: Vec<SwitchId>,
        op: F,
    ) -> Vec<(SwitchId, Result<T, CoreError>)>
    where
        F: Fn(Arc<SwitchEntry>) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let op = &op;
        let futures: Vec<_> = targets
            .into_iter()
            .map(|switch_id| {
                let looked_up = self.get(&switch_id);
                async move {
                    let result = match looked_up {
                        Err(e) => Err(e),
                        Ok(entry) => {
                            let timeout = entry.descriptor.timeout;
                            match tokio::time::timeout(timeout, op(entry)).await {
                                Ok(inner) => inner,
                                Err(_) => Err(CoreError::Timeout {
                                    switch_id: switch_id.clone(),
                                    timeout_secs: timeout.as_secs(),
                                }),
                            }
                        }
                    };
                    (switch_id, result)
                }
            })
            .collect();

        futures::future::join_all(futures).await
    }
}

fn build_client(
    descriptor: &SwitchDescriptor,
) -> Result<Arc<dyn DeviceSessionClient>, switchyard_api::Error> {
    let transport = TransportConfig::with_timeout(descriptor.timeout);
    let client: Arc<dyn DeviceSessionClient> = match descriptor.family {
        SwitchFamily::Vimins => Arc::new(ViminsClient::new(
            descriptor.address.clone(),
            descriptor.username.clone(),
            descriptor.password.clone(),
            &transport,
        )?),
        SwitchFamily::Sodola => Arc::new(SodolaClient::new(
            descriptor.address.clone(),
            descriptor.username.clone(),
            descriptor.password.clone(),
            &transport,
        )?),
    };
    Ok(client)
}
