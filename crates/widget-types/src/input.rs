//! The execution envelope: input assembled before every candidate run.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::state::StateSlot;

/// Opaque token identifying one sandbox instance.
///
/// Freshly generated whenever a new instance is created; execution inputs are
/// only comparable within the same instance version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceVersion(Uuid);

impl InstanceVersion {
    pub fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for InstanceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Read-only ambient data refreshed when identity or network changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Whether ambient identity resolution is still in flight.
    pub loading: bool,
    /// Authenticated account, if any. Privileged operations require one.
    pub account_id: Option<String>,
    /// Display source of the executing widget, when known.
    pub widget_src: Option<String>,
    /// Effective network identifier.
    pub network_id: String,
}

impl ExecutionContext {
    /// Context with no authenticated account on the given network.
    pub fn unauthenticated(network_id: impl Into<String>) -> Self {
        Self {
            loading: false,
            account_id: None,
            widget_src: None,
            network_id: network_id.into(),
        }
    }
}

/// Everything a sandbox instance sees for one execution.
///
/// Recomputed before every candidate execution; execution is skipped when the
/// candidate is structurally equal (deep) to the previous input for the same
/// `instance_version`. Cloning produces a deep copy (`serde_json::Value`
/// clones are deep), which is what the differ snapshots as its comparison
/// baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionInput {
    /// Caller-provided properties.
    pub props: Value,
    /// Ambient read-only context.
    pub context: ExecutionContext,
    /// Snapshot of the instance's local-state slot.
    pub state: StateSlot,
    /// Monotonic cache-invalidation counter.
    pub cache_epoch: u64,
    /// The instance this input is addressed to.
    pub instance_version: InstanceVersion,
    /// Host-provided ambient values surfaced to the widget.
    pub host_bindings: Value,
}

impl ExecutionInput {
    /// Deep copy used as the differ's comparison baseline, so later external
    /// mutation of caller-owned objects cannot corrupt the comparison.
    pub fn snapshot(&self) -> Self {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(version: InstanceVersion) -> ExecutionInput {
        ExecutionInput {
            props: json!({"title": "hello"}),
            context: ExecutionContext::unauthenticated("mainnet"),
            state: StateSlot::default(),
            cache_epoch: 0,
            instance_version: version,
            host_bindings: Value::Null,
        }
    }

    #[test]
    fn test_instance_versions_are_unique() {
        assert_ne!(InstanceVersion::fresh(), InstanceVersion::fresh());
    }

    #[test]
    fn test_instance_version_serializes_transparently() {
        let version = InstanceVersion::fresh();
        let encoded = serde_json::to_string(&version).expect("serialize");
        assert_eq!(encoded, format!("\"{version}\""));
        let decoded: InstanceVersion = serde_json::from_str(&encoded).expect("deserialize");
        assert_eq!(decoded, version);
    }

    #[test]
    fn test_snapshot_is_deep_equal() {
        let version = InstanceVersion::fresh();
        let original = input(version);
        let copy = original.snapshot();
        assert_eq!(original, copy);
    }

    #[test]
    fn test_epoch_participates_in_equality() {
        let version = InstanceVersion::fresh();
        let a = input(version);
        let mut b = a.snapshot();
        b.cache_epoch = 1;
        assert_ne!(a, b);
    }
}
