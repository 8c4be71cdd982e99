//! Reconciliation engine
//!
//! Keeps locally pinned event versions aligned with the remote catalog. All
//! four entry points share one comparison rule: a local version different
//! from the remote latest gets overwritten with the remote value, an
//! identical one is left alone. The catalog is authoritative, so a remote
//! version lower than the local pin is applied verbatim.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::{CatalogClient, CatalogError, CategoryFilter, EventSnapshot};
use crate::workspace::{ConfigError, ConfigRegistry, Event};

/// Reconciliation errors
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A requested pin that is negative or ahead of the remote latest
    #[error("Version {requested} is not valid for event '{id}'; the latest version is {latest}")]
    VersionNotValid {
        id: String,
        requested: i64,
        latest: i64,
    },

    /// The category filter matched nothing remotely
    #[error("No events found in the remote catalog for this filter")]
    NoEventsFound,

    /// Update-all invoked on a workspace with no declared events
    #[error("There are no events to update; add one first")]
    NoEventsToUpdate,

    /// A batch update named ids that are not declared locally; lists every
    /// missing id, not just the first
    #[error("These events are not added to this workspace: {}", ids.join(", "))]
    EventsNotAdded { ids: Vec<String> },
}

/// Outcome of a batch add
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchAddReport {
    pub added: usize,
    pub already_present: usize,
}

/// One locally declared event whose pin differs from the remote latest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutdatedEvent {
    pub id: String,
    pub local: i64,
    pub remote: i64,
}

/// One applied version change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatedEvent {
    pub id: String,
    pub from: i64,
    pub to: i64,
}

/// Outcome of an update run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    pub updated: Vec<UpdatedEvent>,
    pub up_to_date: usize,
}

/// The engine. Dependencies are injected at construction; there is no
/// process-wide container.
pub struct Reconciler {
    registry: Arc<ConfigRegistry>,
    catalog: Arc<dyn CatalogClient>,
}

impl Reconciler {
    pub fn new(registry: Arc<ConfigRegistry>, catalog: Arc<dyn CatalogClient>) -> Self {
        Self { registry, catalog }
    }

    /// Declare one event, pinned at `requested` or at the remote latest.
    pub async fn add(
        &self,
        event_id: &str,
        requested: Option<i64>,
    ) -> Result<Event, ReconcileError> {
        let latest = self.catalog.latest(event_id).await?;

        let version = match requested {
            None => latest.version,
            Some(v) if v < 0 || v > latest.version => {
                return Err(ReconcileError::VersionNotValid {
                    id: event_id.to_string(),
                    requested: v,
                    latest: latest.version,
                });
            }
            Some(v) => v,
        };

        let event = Event::new(event_id, Some(version));
        self.registry.add_event(event.clone()).await?;
        info!("Added event '{event_id}' at version {version}");
        Ok(event)
    }

    /// Declare every event the filter matches. Already-declared ids are
    /// skipped, not errors.
    pub async fn add_by_category(
        &self,
        filter: &CategoryFilter,
    ) -> Result<BatchAddReport, ReconcileError> {
        let snapshots = self.catalog.events_for(filter).await?;
        if snapshots.is_empty() {
            return Err(ReconcileError::NoEventsFound);
        }

        let total = snapshots.len();
        let events: Vec<Event> = snapshots
            .into_iter()
            .map(|snapshot| Event::new(snapshot.event_id, Some(snapshot.version)))
            .collect();

        let added = self.registry.add_events(events).await?;
        info!(
            "Added {added} of {total} events from the catalog ({} already present)",
            total - added
        );
        Ok(BatchAddReport {
            added,
            already_present: total - added,
        })
    }

    /// Report every declared event whose pin differs from the remote latest.
    /// Pure read; mutates nothing.
    pub async fn outdated(&self) -> Result<Vec<OutdatedEvent>, ReconcileError> {
        let mut stale = Vec::new();
        for event in self.registry.events().await {
            let remote = self.catalog.latest(&event.id).await?;
            let local = event.effective_version();
            if local != remote.version {
                stale.push(OutdatedEvent {
                    id: event.id,
                    local,
                    remote: remote.version,
                });
            }
        }
        debug!("{} outdated events", stale.len());
        Ok(stale)
    }

    /// Re-pin events at their remote latest versions.
    ///
    /// One id takes the single-lookup path; an empty set means every declared
    /// event; two or more ids are pre-validated against the local declaration
    /// before any network call, and the failure lists every missing id.
    ///
    /// Updates persist per event as they are applied; a failure partway
    /// through leaves earlier updates in place.
    pub async fn update(&self, ids: &[String]) -> Result<UpdateReport, ReconcileError> {
        if let [id] = ids {
            return self.update_single(id).await;
        }

        let local = self.registry.events().await;

        if ids.is_empty() && local.is_empty() {
            return Err(ReconcileError::NoEventsToUpdate);
        }

        if ids.len() >= 2 {
            let missing: Vec<String> = ids
                .iter()
                .filter(|id| !local.iter().any(|event| &event.id == *id))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(ReconcileError::EventsNotAdded { ids: missing });
            }
        }

        let query: Vec<EventSnapshot> = local
            .iter()
            .map(|event| EventSnapshot {
                event_id: event.id.clone(),
                version: event.effective_version(),
            })
            .collect();
        let latest = self.catalog.latest_batch(&query).await?;

        let mut updated = Vec::new();
        let mut up_to_date = 0;
        for event in &local {
            if !ids.is_empty() && !ids.contains(&event.id) {
                continue;
            }
            let Some(remote) = latest.iter().find(|s| s.event_id == event.id) else {
                debug!("Catalog returned no version for '{}'; skipping", event.id);
                continue;
            };
            let from = event.effective_version();
            if from == remote.version {
                up_to_date += 1;
                continue;
            }
            self.registry.update_event(&event.id, remote.version).await?;
            updated.push(UpdatedEvent {
                id: event.id.clone(),
                from,
                to: remote.version,
            });
        }

        info!(
            "Updated {} events, {} already up to date",
            updated.len(),
            up_to_date
        );
        Ok(UpdateReport { updated, up_to_date })
    }

    async fn update_single(&self, id: &str) -> Result<UpdateReport, ReconcileError> {
        let local = self.registry.events().await;
        let Some(event) = local.iter().find(|event| event.id == id) else {
            return Err(ConfigError::EventNotFound { id: id.to_string() }.into());
        };

        let remote = self.catalog.latest(id).await?;
        let from = event.effective_version();
        if from == remote.version {
            return Ok(UpdateReport {
                updated: Vec::new(),
                up_to_date: 1,
            });
        }

        self.registry.update_event(id, remote.version).await?;
        info!("Updated event '{id}' from version {from} to {}", remote.version);
        Ok(UpdateReport {
            updated: vec![UpdatedEvent {
                id: id.to_string(),
                from,
                to: remote.version,
            }],
            up_to_date: 0,
        })
    }

    /// Undeclare one event. The caller is responsible for any post-removal
    /// resync of generated output.
    pub async fn remove(&self, event_id: &str) -> Result<(), ReconcileError> {
        self.registry.remove_event(event_id).await?;
        info!("Removed event '{event_id}'");
        Ok(())
    }
}
