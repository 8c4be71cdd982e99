//! Remote event catalog collaborator
//!
//! The catalog is the authoritative source of event definitions and version
//! numbers. This module defines the read-only client seam the reconciliation
//! engine talks to, plus the HTTP implementation of it. Nothing here is
//! retried: a lookup either succeeds, maps a 404 to a missing event, or
//! surfaces the underlying failure.

mod http;

pub use http::HttpCatalog;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One event at its remote version. Read-only remote truth; this side never
/// mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSnapshot {
    pub event_id: String,
    pub version: i64,
}

/// Narrows an add-all operation to part of the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    /// Events in the category with this id
    Id(String),
    /// Events in the category with this name
    Name(String),
    /// Every event visible to the workspace
    All,
}

/// Remote lookup errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The catalog has no event with this id (HTTP 404)
    #[error("Event '{id}' does not exist in the remote catalog")]
    EventNotFound { id: String },

    /// Any other status or transport failure
    #[error("Catalog request failed: {message}")]
    Request { message: String },
}

/// Client seam for the remote catalog
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Latest version of one event.
    async fn latest(&self, event_id: &str) -> Result<EventSnapshot, CatalogError>;

    /// Latest versions for a set of events in one round trip.
    async fn latest_batch(
        &self,
        events: &[EventSnapshot],
    ) -> Result<Vec<EventSnapshot>, CatalogError>;

    /// Events matching a category filter, at their latest versions.
    async fn events_for(
        &self,
        filter: &CategoryFilter,
    ) -> Result<Vec<EventSnapshot>, CatalogError>;
}
