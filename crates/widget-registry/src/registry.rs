//! The registry contract consumed by controllers and the mediator.

use std::sync::Arc;

use widget_types::{CodeRecord, WidgetPath};

/// Callback fired when the code under a subscribed path changes.
pub type InvalidationCallback = Arc<dyn Fn() + Send + Sync>;

/// Callback fired when a network's cache epoch advances; receives the new
/// epoch value.
pub type EpochCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// Token identifying one active subscription. Owned and released by the
/// subscriber (the controller releases its tokens on disposal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// Content registry for widget code, keyed by path and version.
///
/// Implementations must be thread-safe handles: callbacks may be registered
/// from one controller and fired while another publishes. Callbacks must only
/// enqueue work (the controller model is a single-threaded event queue) and
/// must never call back into the registry.
pub trait CodeRegistry: Send + Sync {
    /// Resolve `path` at `version` (`None` means latest).
    fn resolve(&self, path: &WidgetPath, version: Option<u64>) -> CodeRecord;

    /// Register an invalidation callback for `path`. Fan-out is to ALL active
    /// subscribers of the path, not just one.
    fn subscribe(&self, path: &WidgetPath, callback: InvalidationCallback) -> SubscriptionId;

    /// Observe the cache epoch of `network`. The callback fires on every
    /// scoped invalidation of that network.
    fn subscribe_epoch(&self, network: &str, callback: EpochCallback) -> SubscriptionId;

    /// Release a subscription. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);

    /// Force re-resolution for every path owned by `scope_key` on `network`
    /// and advance the network's cache epoch. Called after a privileged
    /// operation affecting that scope.
    fn invalidate_scope(&self, network: &str, scope_key: &str);

    /// Current cache epoch of `network`; monotonically non-decreasing.
    fn epoch(&self, network: &str) -> u64;
}
