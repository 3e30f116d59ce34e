//! In-memory registry implementation.
//!
//! Thread-safe via parking_lot. Entries are keyed by `(path, version)` with a
//! latest pointer per path, mirroring a versioned content store: publishing a
//! new version updates both the versioned entry and the head. A path can be
//! marked pending while a backing fetch is in flight; `publish` clears the
//! marker.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use widget_types::{CodeRecord, WidgetPath};

use crate::registry::{CodeRegistry, EpochCallback, InvalidationCallback, SubscriptionId};

#[derive(Default)]
struct PathEntry {
    /// Versioned code, keyed by publication version.
    versions: BTreeMap<u64, String>,
    /// Latest published code, version-pinned or not.
    head: Option<String>,
    /// A backing fetch is in flight; resolve reports `Pending`.
    pending: bool,
}

/// Thread-safe in-memory [`CodeRegistry`].
#[derive(Default)]
pub struct InMemoryRegistry {
    entries: RwLock<HashMap<WidgetPath, PathEntry>>,
    path_subs: RwLock<HashMap<WidgetPath, Vec<(SubscriptionId, InvalidationCallback)>>>,
    epoch_subs: RwLock<HashMap<String, Vec<(SubscriptionId, EpochCallback)>>>,
    epochs: RwLock<HashMap<String, u64>>,
    next_sub: AtomicU64,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish code for `path`. A versioned publish also becomes the new
    /// head. Fires every invalidation callback subscribed to the path.
    pub fn publish(&self, path: &WidgetPath, version: Option<u64>, code: &str) {
        {
            let mut entries = self.entries.write();
            let entry = entries.entry(path.clone()).or_default();
            if let Some(version) = version {
                entry.versions.insert(version, code.to_string());
            }
            entry.head = Some(code.to_string());
            entry.pending = false;
        }
        debug!(path = %path, ?version, "published widget code");
        self.notify_path(path);
    }

    /// Mark `path` as still loading. Cleared by the next `publish`.
    pub fn mark_pending(&self, path: &WidgetPath) {
        self.entries.write().entry(path.clone()).or_default().pending = true;
    }

    /// Number of active subscriptions for `path` (the reference count of the
    /// shared cache entry).
    pub fn subscriber_count(&self, path: &WidgetPath) -> usize {
        self.path_subs
            .read()
            .get(path)
            .map(|subs| subs.len())
            .unwrap_or(0)
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_sub.fetch_add(1, Ordering::Relaxed))
    }

    /// Fire path callbacks outside any lock: callbacks enqueue controller
    /// events and must not observe the registry mid-update.
    fn notify_path(&self, path: &WidgetPath) {
        let callbacks: Vec<InvalidationCallback> = {
            let subs = self.path_subs.read();
            subs.get(path)
                .map(|entries| entries.iter().map(|(_, cb)| cb.clone()).collect())
                .unwrap_or_default()
        };
        for callback in callbacks {
            callback();
        }
    }
}

impl CodeRegistry for InMemoryRegistry {
    fn resolve(&self, path: &WidgetPath, version: Option<u64>) -> CodeRecord {
        let entries = self.entries.read();
        let Some(entry) = entries.get(path) else {
            return CodeRecord::NotFound;
        };
        if entry.pending {
            return CodeRecord::Pending;
        }
        let code = match version {
            Some(version) => entry.versions.get(&version),
            None => entry.head.as_ref(),
        };
        match code {
            Some(code) => CodeRecord::Code(code.clone()),
            None => CodeRecord::NotFound,
        }
    }

    fn subscribe(&self, path: &WidgetPath, callback: InvalidationCallback) -> SubscriptionId {
        let id = self.next_id();
        self.path_subs
            .write()
            .entry(path.clone())
            .or_default()
            .push((id, callback));
        id
    }

    fn subscribe_epoch(&self, network: &str, callback: EpochCallback) -> SubscriptionId {
        let id = self.next_id();
        self.epoch_subs
            .write()
            .entry(network.to_string())
            .or_default()
            .push((id, callback));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        let mut path_subs = self.path_subs.write();
        path_subs.retain(|_, subs| {
            subs.retain(|(sub_id, _)| *sub_id != id);
            !subs.is_empty()
        });
        drop(path_subs);

        let mut epoch_subs = self.epoch_subs.write();
        epoch_subs.retain(|_, subs| {
            subs.retain(|(sub_id, _)| *sub_id != id);
            !subs.is_empty()
        });
    }

    fn invalidate_scope(&self, network: &str, scope_key: &str) {
        let epoch = {
            let mut epochs = self.epochs.write();
            let epoch = epochs.entry(network.to_string()).or_insert(0);
            *epoch += 1;
            *epoch
        };
        debug!(network, scope_key, epoch, "scoped cache invalidation");

        let epoch_callbacks: Vec<EpochCallback> = {
            let subs = self.epoch_subs.read();
            subs.get(network)
                .map(|entries| entries.iter().map(|(_, cb)| cb.clone()).collect())
                .unwrap_or_default()
        };
        for callback in epoch_callbacks {
            callback(epoch);
        }

        let scoped_paths: Vec<WidgetPath> = {
            let subs = self.path_subs.read();
            subs.keys()
                .filter(|path| path.account_id() == scope_key)
                .cloned()
                .collect()
        };
        for path in scoped_paths {
            self.notify_path(&path);
        }
    }

    fn epoch(&self, network: &str) -> u64 {
        self.epochs.read().get(network).copied().unwrap_or(0)
    }
}
