//! The identity tuple that keys sandbox instances.

use serde::{Deserialize, Serialize};

use crate::reference::ConfigOverride;

/// The tuple whose change triggers sandbox recreation.
///
/// Exactly one sandbox instance is live per controller at any time (or none),
/// keyed by this identity. `resolved_src` differs from the raw reference when
/// inline code is allowed to retain a display name; otherwise inline code has
/// no display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedIdentity {
    /// Resolved code text.
    pub code: String,
    /// Display name of the widget source, when known.
    pub resolved_src: Option<String>,
    /// Nesting depth of this widget within the host tree.
    pub depth: u32,
    /// Ordered configuration override sequence.
    pub configs: Vec<ConfigOverride>,
    /// Effective network (last-write winner over `configs`).
    pub network: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> ConfirmedIdentity {
        ConfirmedIdentity {
            code: "return 1+1".into(),
            resolved_src: Some("alice.near/widget/Foo".into()),
            depth: 0,
            configs: vec![],
            network: "mainnet".into(),
        }
    }

    #[test]
    fn test_code_change_breaks_identity() {
        let a = identity();
        let mut b = a.clone();
        assert_eq!(a, b);
        b.code = "return 2+2".into();
        assert_ne!(a, b);
    }

    #[test]
    fn test_config_change_breaks_identity() {
        let a = identity();
        let mut b = a.clone();
        b.configs.push(ConfigOverride {
            network_id: Some("testnet".into()),
            props: None,
        });
        assert_ne!(a, b);
    }
}
