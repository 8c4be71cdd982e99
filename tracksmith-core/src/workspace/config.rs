//! The persisted workspace declaration (tracksmith.yaml)

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use super::error::ConfigError;
use crate::plugin::{Source, TargetPlugin};

/// An omitted event version reads as version 1 everywhere.
pub const DEFAULT_VERSION: i64 = 1;

/// One declared event and its pinned version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Opaque catalog identifier
    pub id: String,

    /// Pinned version; omitted means 1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
}

impl Event {
    pub fn new(id: impl Into<String>, version: Option<i64>) -> Self {
        Self {
            id: id.into(),
            version,
        }
    }

    /// The version this event is pinned at, with the omitted-means-1 default
    /// applied.
    pub fn effective_version(&self) -> i64 {
        self.version.unwrap_or(DEFAULT_VERSION)
    }
}

/// Root persisted entity. Owned exclusively by the registry; everything else
/// sees snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceConfig {
    /// Remote workspace id, set on first successful sync
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,

    /// Generation target; immutable after creation
    pub source: Source,

    /// Target descriptor, one variant matching `source`
    pub plugin: TargetPlugin,

    /// Declared events; insertion order preserved, ids unique
    #[serde(default)]
    pub events: Vec<Event>,
}

impl WorkspaceConfig {
    pub fn new(source: Source, plugin: TargetPlugin) -> Self {
        Self {
            workspace_id: None,
            source,
            plugin,
            events: Vec::new(),
        }
    }

    /// Invariants the serde decode cannot express: unique event ids, and a
    /// plugin variant that agrees with the `source` field.
    pub(crate) fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for event in &self.events {
            if !seen.insert(event.id.as_str()) {
                return Err(ConfigError::DuplicateEventId {
                    id: event.id.clone(),
                });
            }
        }

        if self.plugin.source() != self.source {
            return Err(ConfigError::Malformed {
                path: path.to_path_buf(),
                detail: format!(
                    "plugin variant '{}' does not match source '{}'",
                    self.plugin.source().key(),
                    self.source.key()
                ),
            });
        }

        Ok(())
    }

    pub fn contains_event(&self, id: &str) -> bool {
        self.events.iter().any(|event| event.id == id)
    }
}
