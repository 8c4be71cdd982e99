//! Local configuration registry
//!
//! The registry is the sole owner of the workspace config, in memory and on
//! disk. Every mutation is a read-modify-persist cycle behind one async
//! mutex, and every persist is a full-document replace staged through a temp
//! file in the same directory, so a crash mid-write leaves either the old or
//! the new document on disk.

use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::config::{Event, WorkspaceConfig};
use super::error::ConfigError;
use crate::plugin::{Source, TargetPlugin};

/// Default configuration file name, relative to the working directory
pub const CONFIG_FILE: &str = "tracksmith.yaml";

/// Serialized-access store for one workspace configuration file
#[derive(Debug)]
pub struct ConfigRegistry {
    path: PathBuf,
    state: Mutex<WorkspaceConfig>,
}

impl ConfigRegistry {
    /// Open an existing configuration file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        if !path.exists() {
            return Err(ConfigError::NotFound { path });
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            action: "read",
            path: path.clone(),
            source,
        })?;

        let config: WorkspaceConfig =
            serde_yaml_ng::from_str(&content).map_err(|e| ConfigError::Malformed {
                path: path.clone(),
                detail: e.to_string(),
            })?;
        config.validate(&path)?;

        debug!(
            "Loaded workspace config from {} ({} events)",
            path.display(),
            config.events.len()
        );

        Ok(Self {
            path,
            state: Mutex::new(config),
        })
    }

    /// Create a fresh configuration file. Refuses to overwrite an existing
    /// one.
    pub fn create_default(
        path: impl Into<PathBuf>,
        source: Source,
        plugin: TargetPlugin,
    ) -> Result<Self, ConfigError> {
        let path = path.into();
        if path.exists() {
            return Err(ConfigError::AlreadyExists { path });
        }

        let config = WorkspaceConfig::new(source, plugin);
        config.validate(&path)?;
        Self::persist(&path, &config)?;

        info!("Created workspace config at {}", path.display());

        Ok(Self {
            path,
            state: Mutex::new(config),
        })
    }

    /// Full-document replace: serialize, stage into a temp file next to the
    /// target, rename into place.
    fn persist(path: &Path, config: &WorkspaceConfig) -> Result<(), ConfigError> {
        let content =
            serde_yaml_ng::to_string(config).map_err(|e| ConfigError::Serialize {
                detail: e.to_string(),
            })?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            action: "create directory for",
            path: path.to_path_buf(),
            source,
        })?;

        let mut staged =
            tempfile::NamedTempFile::new_in(dir).map_err(|source| ConfigError::Io {
                action: "stage",
                path: path.to_path_buf(),
                source,
            })?;
        staged
            .write_all(content.as_bytes())
            .map_err(|source| ConfigError::Io {
                action: "write",
                path: path.to_path_buf(),
                source,
            })?;
        staged.persist(path).map_err(|e| ConfigError::Io {
            action: "replace",
            path: path.to_path_buf(),
            source: e.error,
        })?;

        Ok(())
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the full config, for the rendering stage.
    pub async fn config(&self) -> WorkspaceConfig {
        self.state.lock().await.clone()
    }

    /// Snapshot of the declared events, in insertion order.
    pub async fn events(&self) -> Vec<Event> {
        self.state.lock().await.events.clone()
    }

    pub async fn workspace_id(&self) -> Option<String> {
        self.state.lock().await.workspace_id.clone()
    }

    pub async fn set_workspace_id(&self, id: Option<String>) -> Result<(), ConfigError> {
        let mut state = self.state.lock().await;
        state.workspace_id = id;
        Self::persist(&self.path, &state)
    }

    pub async fn plugin(&self) -> TargetPlugin {
        self.state.lock().await.plugin.clone()
    }

    pub async fn source(&self) -> Source {
        self.state.lock().await.source
    }

    /// Append one event. Fails if the id is already declared; the stored
    /// entry is untouched in that case.
    pub async fn add_event(&self, event: Event) -> Result<(), ConfigError> {
        let mut state = self.state.lock().await;
        if state.contains_event(&event.id) {
            return Err(ConfigError::EventAlreadyExists { id: event.id });
        }
        state.events.push(event);
        Self::persist(&self.path, &state)
    }

    /// Idempotent set union: events whose id is already declared are skipped
    /// silently. Persists at most once for the whole batch, and not at all
    /// when nothing was added. Returns the number of newly added events.
    pub async fn add_events(&self, events: Vec<Event>) -> Result<usize, ConfigError> {
        let mut state = self.state.lock().await;
        let mut added = 0;
        for event in events {
            if state.contains_event(&event.id) {
                debug!("Skipping already-declared event '{}'", event.id);
                continue;
            }
            state.events.push(event);
            added += 1;
        }
        if added > 0 {
            Self::persist(&self.path, &state)?;
        }
        Ok(added)
    }

    /// Overwrite the pinned version of a declared event.
    pub async fn update_event(&self, id: &str, version: i64) -> Result<(), ConfigError> {
        let mut state = self.state.lock().await;
        let event = state
            .events
            .iter_mut()
            .find(|event| event.id == id)
            .ok_or_else(|| ConfigError::EventNotFound { id: id.to_string() })?;
        event.version = Some(version);
        Self::persist(&self.path, &state)
    }

    /// Remove a declared event.
    pub async fn remove_event(&self, id: &str) -> Result<(), ConfigError> {
        let mut state = self.state.lock().await;
        let before = state.events.len();
        state.events.retain(|event| event.id != id);
        if state.events.len() == before {
            return Err(ConfigError::EventNotFound { id: id.to_string() });
        }
        Self::persist(&self.path, &state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::PluginOptions;
    use tempfile::TempDir;

    fn test_registry(dir: &TempDir) -> ConfigRegistry {
        let plugin =
            TargetPlugin::new(Source::Ios, PluginOptions::default(), dir.path()).unwrap();
        ConfigRegistry::create_default(dir.path().join(CONFIG_FILE), Source::Ios, plugin).unwrap()
    }

    #[test]
    fn test_open_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = ConfigRegistry::open(dir.path().join(CONFIG_FILE)).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_create_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let registry = test_registry(&dir);

        let plugin =
            TargetPlugin::new(Source::Ios, PluginOptions::default(), dir.path()).unwrap();
        let err = ConfigRegistry::create_default(registry.path(), Source::Ios, plugin)
            .unwrap_err();
        assert!(matches!(err, ConfigError::AlreadyExists { .. }));
    }

    #[test]
    fn test_open_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "source: [not, a, string]\n").unwrap();

        let err = ConfigRegistry::open(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[test]
    fn test_open_rejects_duplicate_event_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let yaml = concat!(
            "source: iOS\n",
            "plugin:\n",
            "  ios:\n",
            "    outputFilePath: TrackingEvents.swift\n",
            "    typeName: TrackingEvents\n",
            "    includeDocumentation: true\n",
            "    emitWrapper: false\n",
            "events:\n",
            "  - id: signup\n",
            "  - id: signup\n",
        );
        std::fs::write(&path, yaml).unwrap();

        let err = ConfigRegistry::open(&path).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateEventId { id } if id == "signup"));
    }

    #[tokio::test]
    async fn test_add_event_rejects_duplicate_and_keeps_version() {
        let dir = TempDir::new().unwrap();
        let registry = test_registry(&dir);

        registry.add_event(Event::new("signup", Some(2))).await.unwrap();
        let err = registry
            .add_event(Event::new("signup", Some(9)))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::EventAlreadyExists { id } if id == "signup"));

        let events = registry.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].version, Some(2));
    }

    #[tokio::test]
    async fn test_add_events_is_a_set_union() {
        let dir = TempDir::new().unwrap();
        let registry = test_registry(&dir);

        registry.add_event(Event::new("signup", Some(1))).await.unwrap();

        let added = registry
            .add_events(vec![
                Event::new("signup", Some(5)),
                Event::new("checkout", Some(2)),
                Event::new("refund", None),
            ])
            .await
            .unwrap();
        assert_eq!(added, 2);

        let events = registry.events().await;
        assert_eq!(events.len(), 3);
        // the already-declared event keeps its pinned version
        assert_eq!(events[0].version, Some(1));
    }

    #[tokio::test]
    async fn test_add_events_empty_batch_does_not_write() {
        let dir = TempDir::new().unwrap();
        let registry = test_registry(&dir);
        registry.add_event(Event::new("signup", Some(1))).await.unwrap();

        let before = std::fs::metadata(registry.path()).unwrap().modified().unwrap();
        let added = registry
            .add_events(vec![Event::new("signup", Some(9))])
            .await
            .unwrap();
        assert_eq!(added, 0);
        let after = std::fs::metadata(registry.path()).unwrap().modified().unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_update_and_remove() {
        let dir = TempDir::new().unwrap();
        let registry = test_registry(&dir);

        registry.add_event(Event::new("signup", None)).await.unwrap();
        registry.update_event("signup", 7).await.unwrap();
        assert_eq!(registry.events().await[0].version, Some(7));

        registry.remove_event("signup").await.unwrap();
        assert!(registry.events().await.is_empty());

        let err = registry.update_event("signup", 8).await.unwrap_err();
        assert!(matches!(err, ConfigError::EventNotFound { .. }));
        let err = registry.remove_event("signup").await.unwrap_err();
        assert!(matches!(err, ConfigError::EventNotFound { .. }));
    }

    #[tokio::test]
    async fn test_mutations_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        {
            let registry = test_registry(&dir);
            registry.add_event(Event::new("signup", Some(3))).await.unwrap();
            registry
                .set_workspace_id(Some("ws-42".to_string()))
                .await
                .unwrap();
        }

        let reopened = ConfigRegistry::open(&path).unwrap();
        assert_eq!(reopened.workspace_id().await.as_deref(), Some("ws-42"));
        let events = reopened.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "signup");
        assert_eq!(events[0].version, Some(3));
    }

    /// Each update_event persists on its own: after one update lands, a
    /// failure on the next leaves the first on disk.
    #[cfg(unix)]
    #[tokio::test]
    async fn test_per_event_persist_is_not_transactional() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let registry = test_registry(&dir);
        registry.add_event(Event::new("a", Some(1))).await.unwrap();
        registry.add_event(Event::new("b", Some(1))).await.unwrap();

        registry.update_event("a", 2).await.unwrap();

        // make the directory unwritable so the next persist cannot stage
        std::fs::set_permissions(dir.path(), std::fs::Permissions::from_mode(0o555)).unwrap();
        let err = registry.update_event("b", 2).await.unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        std::fs::set_permissions(dir.path(), std::fs::Permissions::from_mode(0o755)).unwrap();

        let reopened = ConfigRegistry::open(registry.path()).unwrap();
        let events = reopened.events().await;
        assert_eq!(events[0].version, Some(2));
        assert_eq!(events[1].version, Some(1));
    }
}
