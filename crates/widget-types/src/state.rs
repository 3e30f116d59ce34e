//! The persistent local-state slot carried across repeated executions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One stateful-effect record in a widget's declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectRecord {
    /// Position of the effect in the widget's declaration order.
    pub slot: usize,
    /// Payload captured for this effect.
    pub data: Value,
}

/// The local-state slot passed by reference into every execution of a given
/// sandbox instance.
///
/// Lifetime is tied 1:1 to its instance: reset to empty exactly once at
/// instance creation, discarded on disposal, mutated only through the state
/// setter invoked from inside execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSlot {
    /// Ordered stateful-effect records.
    pub trace: Vec<EffectRecord>,
    /// Arbitrary widget-owned value.
    pub value: Value,
}

impl StateSlot {
    pub fn is_empty(&self) -> bool {
        self.trace.is_empty() && self.value.is_null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_slot_is_empty() {
        let slot = StateSlot::default();
        assert!(slot.is_empty());
        assert_eq!(slot.value, Value::Null);
    }

    #[test]
    fn test_slot_equality_is_structural() {
        let a = StateSlot {
            trace: vec![EffectRecord {
                slot: 0,
                data: json!({"count": 1}),
            }],
            value: json!({"count": 1}),
        };
        let b = a.clone();
        assert_eq!(a, b);
    }
}
