//! Widget addressing: paths, references, and configuration overrides.
//!
//! A widget is addressed either by a versioned path resolved through the code
//! registry (`alice.near/widget/Foo@42`) or by inline code supplied directly
//! by the caller. References are immutable per assembly; the controller
//! recomputes them whenever the caller's source, code, or configuration list
//! changes.

use std::fmt;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A validated `account/section/name` widget path.
///
/// The first segment is the owning account, used as the scope key for cache
/// invalidation after privileged operations touching that account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetPath(String);

impl WidgetPath {
    /// Validate and wrap a raw path string.
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let segments: Vec<&str> = raw.split('/').collect();
        if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
            bail!(
                "invalid widget path {:?}: expected account/section/name",
                raw
            );
        }
        Ok(Self(raw))
    }

    /// The owning account (first path segment).
    pub fn account_id(&self) -> &str {
        self.0.split('/').next().unwrap_or("")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WidgetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a widget's code is addressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WidgetReference {
    /// Registry-resolved code at `path`, optionally pinned to a version.
    /// An absent version means "latest".
    Path {
        path: WidgetPath,
        version: Option<u64>,
    },
    /// Inline code supplied by the caller. `src` is an optional display name
    /// that is only surfaced when the host explicitly enables the
    /// inline-src-override mode.
    Inline { code: String, src: Option<String> },
}

impl WidgetReference {
    /// Parse a raw source string of the form `account/section/name[@version]`.
    pub fn parse(src: &str) -> Result<Self> {
        let (path, version) = match src.rsplit_once('@') {
            Some((path, version)) => {
                let version: u64 = version
                    .parse()
                    .with_context(|| format!("invalid widget version in {:?}", src))?;
                (path, Some(version))
            }
            None => (src, None),
        };
        Ok(Self::Path {
            path: WidgetPath::new(path)?,
            version,
        })
    }

    /// Build an inline-code reference.
    pub fn inline(code: impl Into<String>, src: Option<String>) -> Self {
        Self::Inline {
            code: code.into(),
            src,
        }
    }

    /// The canonical `path[@version]` display string for path references.
    ///
    /// Inline references return the raw caller-supplied display name; whether
    /// it is actually surfaced is the resolver's decision.
    pub fn display_src(&self) -> Option<String> {
        match self {
            Self::Path {
                path,
                version: Some(version),
            } => Some(format!("{path}@{version}")),
            Self::Path { path, .. } => Some(path.to_string()),
            Self::Inline { src, .. } => src.clone(),
        }
    }

    /// The owning account for scoped cache invalidation, if addressable.
    pub fn account_id(&self) -> Option<&str> {
        match self {
            Self::Path { path, .. } => Some(path.account_id()),
            Self::Inline { .. } => None,
        }
    }
}

/// One entry of the ordered configuration override sequence that accompanies
/// every widget reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigOverride {
    /// Network this widget should execute against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    /// Extra configuration payload forwarded to the sandbox.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Value>,
}

/// Select the effective network from an override sequence.
///
/// The LAST entry that specifies a network identifier wins (last-write
/// precedence over the ordered sequence); `fallback` applies when none does.
pub fn select_network(configs: &[ConfigOverride], fallback: &str) -> String {
    configs
        .iter()
        .rev()
        .find_map(|config| config.network_id.clone())
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path_with_version() {
        let reference = WidgetReference::parse("alice.near/widget/Foo@42").unwrap();
        match &reference {
            WidgetReference::Path { path, version } => {
                assert_eq!(path.as_str(), "alice.near/widget/Foo");
                assert_eq!(path.account_id(), "alice.near");
                assert_eq!(*version, Some(42));
            }
            other => panic!("unexpected reference: {other:?}"),
        }
        assert_eq!(
            reference.display_src().as_deref(),
            Some("alice.near/widget/Foo@42")
        );
    }

    #[test]
    fn test_parse_path_without_version_means_latest() {
        let reference = WidgetReference::parse("alice.near/widget/Foo").unwrap();
        match &reference {
            WidgetReference::Path { version, .. } => assert_eq!(*version, None),
            other => panic!("unexpected reference: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_malformed_paths() {
        assert!(WidgetReference::parse("alice.near/widget").is_err());
        assert!(WidgetReference::parse("alice.near//Foo").is_err());
        assert!(WidgetReference::parse("alice.near/widget/Foo@latest").is_err());
    }

    #[test]
    fn test_inline_reference_carries_optional_display_name() {
        let anonymous = WidgetReference::inline("return 1", None);
        assert_eq!(anonymous.display_src(), None);
        assert_eq!(anonymous.account_id(), None);

        let named = WidgetReference::inline("return 1", Some("host/widget/Embedded".into()));
        assert_eq!(named.display_src().as_deref(), Some("host/widget/Embedded"));
    }

    #[test]
    fn test_select_network_last_write_wins() {
        let configs = vec![
            ConfigOverride {
                network_id: Some("testnet".into()),
                props: None,
            },
            ConfigOverride::default(),
            ConfigOverride {
                network_id: Some("mainnet".into()),
                props: None,
            },
            ConfigOverride::default(),
        ];
        assert_eq!(select_network(&configs, "devnet"), "mainnet");
        assert_eq!(select_network(&[], "devnet"), "devnet");
    }
}
