//! Registry snapshots.
//!
//! A snapshot is a JSON array of published widget entries, enough to seed an
//! [`InMemoryRegistry`] for offline runs:
//!
//! ```json
//! [
//!   { "path": "alice.near/widget/Counter", "code": "return 1+1" },
//!   { "path": "alice.near/widget/Counter", "version": 2, "code": "return 2+2" }
//! ]
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use widget_registry::InMemoryRegistry;
use widget_types::WidgetPath;

/// One published widget in a snapshot file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// `account/section/name` path the code is published under.
    pub path: String,
    /// Publication version; unversioned entries only set the head.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    /// Widget source text.
    pub code: String,
}

/// Parse a snapshot file and publish every entry into a fresh registry.
pub fn load_registry(path: &Path) -> Result<Arc<InMemoryRegistry>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    let entries: Vec<SnapshotEntry> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing snapshot {}", path.display()))?;

    let registry = Arc::new(InMemoryRegistry::new());
    for entry in &entries {
        let widget_path = WidgetPath::new(&entry.path)
            .with_context(|| format!("invalid widget path {:?}", entry.path))?;
        registry.publish(&widget_path, entry.version, &entry.code);
    }
    debug!(
        entries = entries.len(),
        snapshot = %path.display(),
        "registry seeded from snapshot"
    );
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use widget_registry::CodeRegistry;
    use widget_types::CodeRecord;

    #[test]
    fn test_loads_versioned_and_head_entries() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("snapshot.json");
        fs::write(
            &file,
            r#"[
                { "path": "alice.near/widget/Counter", "version": 1, "code": "return 1" },
                { "path": "alice.near/widget/Counter", "version": 2, "code": "return 2" }
            ]"#,
        )
        .unwrap();

        let registry = load_registry(&file).unwrap();
        let path = WidgetPath::new("alice.near/widget/Counter").unwrap();
        assert_eq!(
            registry.resolve(&path, Some(1)),
            CodeRecord::Code("return 1".into())
        );
        assert_eq!(
            registry.resolve(&path, None),
            CodeRecord::Code("return 2".into())
        );
    }

    #[test]
    fn test_rejects_malformed_paths() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("snapshot.json");
        fs::write(
            &file,
            r#"[{ "path": "not-a-path", "code": "return 1" }]"#,
        )
        .unwrap();
        assert!(load_registry(&file).is_err());
    }
}
