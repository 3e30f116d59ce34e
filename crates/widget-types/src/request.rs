//! Privileged request payloads and their normalization defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fixed gas baseline applied when a transaction omits gas: 30 Tgas.
pub const BASE_GAS: u64 = 30_000_000_000_000;

/// A transaction request as emitted by sandboxed code, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub contract_name: String,
    pub method_name: String,
    #[serde(default)]
    pub args: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposit: Option<u128>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<u64>,
}

/// A normalized transaction request: deposit defaulted to zero, gas to the
/// fixed [`BASE_GAS`] baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub contract_name: String,
    pub method_name: String,
    pub args: Value,
    pub deposit: u128,
    pub gas: u64,
}

impl From<RawTransaction> for TransactionRequest {
    fn from(raw: RawTransaction) -> Self {
        Self {
            contract_name: raw.contract_name,
            method_name: raw.method_name,
            args: raw.args,
            deposit: raw.deposit.unwrap_or(0),
            gas: raw.gas.unwrap_or(BASE_GAS),
        }
    }
}

/// Host-reported result of a confirmed transaction batch.
///
/// A present `receiver_id` triggers exactly one cache invalidation scoped to
/// that receiver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionOutcome {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<String>,
    #[serde(default)]
    pub outcome: Value,
}

/// Payload of a data-commit request. Resolution callbacks are attached by the
/// mediator in widget-host-core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitData {
    pub data: Value,
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalization_defaults() {
        let raw = RawTransaction {
            contract_name: "x.near".into(),
            method_name: "f".into(),
            args: json!({}),
            deposit: None,
            gas: None,
        };
        let normalized = TransactionRequest::from(raw);
        assert_eq!(normalized.deposit, 0);
        assert_eq!(normalized.gas, BASE_GAS);
    }

    #[test]
    fn test_explicit_values_survive_normalization() {
        let raw = RawTransaction {
            contract_name: "x.near".into(),
            method_name: "f".into(),
            args: json!({"k": 1}),
            deposit: Some(7),
            gas: Some(1_000),
        };
        let normalized = TransactionRequest::from(raw);
        assert_eq!(normalized.deposit, 7);
        assert_eq!(normalized.gas, 1_000);
        assert_eq!(normalized.args, json!({"k": 1}));
    }
}
