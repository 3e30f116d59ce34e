//! The bridge between a sandbox instance and its persistent state slot.

use widget_types::{InstanceVersion, StateSlot};

/// Owns the local-state slot for exactly one sandbox instance.
///
/// The slot is reset to empty exactly once, at instance creation; it is
/// discarded with the bridge when the instance is disposed. Applying a slot
/// is a dependency change: the controller re-enters input assembly, which is
/// the feedback loop letting sandboxed code schedule its own re-execution.
#[derive(Debug)]
pub struct StateBridge {
    slot: StateSlot,
    instance: InstanceVersion,
}

impl StateBridge {
    /// Fresh empty slot bound to `instance`.
    pub fn new(instance: InstanceVersion) -> Self {
        Self {
            slot: StateSlot::default(),
            instance,
        }
    }

    pub fn instance(&self) -> InstanceVersion {
        self.instance
    }

    /// Snapshot of the current slot for input assembly.
    pub fn snapshot(&self) -> StateSlot {
        self.slot.clone()
    }

    /// Replace the trace/value pair.
    pub fn apply(&mut self, slot: StateSlot) {
        self.slot = slot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use widget_types::EffectRecord;

    #[test]
    fn test_new_bridge_starts_empty() {
        let bridge = StateBridge::new(InstanceVersion::fresh());
        assert!(bridge.snapshot().is_empty());
    }

    #[test]
    fn test_apply_replaces_the_pair() {
        let mut bridge = StateBridge::new(InstanceVersion::fresh());
        bridge.apply(StateSlot {
            trace: vec![EffectRecord {
                slot: 0,
                data: json!(1),
            }],
            value: json!({"count": 1}),
        });
        let snapshot = bridge.snapshot();
        assert_eq!(snapshot.trace.len(), 1);
        assert_eq!(snapshot.value, json!({"count": 1}));
    }
}
