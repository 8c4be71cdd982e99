//! HTTP implementation of the catalog client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{CatalogClient, CatalogError, CategoryFilter, EventSnapshot};

/// Catalog client over the REST API
pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpCatalog {
    /// Build a client for `base_url`, authenticating with a bearer `token`.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tracksmith/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CatalogError::Request {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn request_error(e: reqwest::Error) -> CatalogError {
        CatalogError::Request {
            message: e.to_string(),
        }
    }

    fn status_error(status: reqwest::StatusCode, url: &str) -> CatalogError {
        CatalogError::Request {
            message: format!("HTTP {status} from {url}"),
        }
    }
}

#[derive(Serialize)]
struct LatestListRequest<'a> {
    events: &'a [EventSnapshot],
}

#[derive(Deserialize)]
struct LatestListResponse {
    events: Vec<EventSnapshot>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventListRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    category_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category_name: Option<&'a str>,
}

impl<'a> EventListRequest<'a> {
    fn from_filter(filter: &'a CategoryFilter) -> Self {
        match filter {
            CategoryFilter::Id(id) => Self {
                category_id: Some(id),
                category_name: None,
            },
            CategoryFilter::Name(name) => Self {
                category_id: None,
                category_name: Some(name),
            },
            CategoryFilter::All => Self {
                category_id: None,
                category_name: None,
            },
        }
    }
}

#[async_trait]
impl CatalogClient for HttpCatalog {
    async fn latest(&self, event_id: &str) -> Result<EventSnapshot, CatalogError> {
        let url = format!("{}/events/{event_id}/latest", self.base_url);
        debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(Self::request_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::EventNotFound {
                id: event_id.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(Self::status_error(response.status(), &url));
        }

        response.json().await.map_err(Self::request_error)
    }

    async fn latest_batch(
        &self,
        events: &[EventSnapshot],
    ) -> Result<Vec<EventSnapshot>, CatalogError> {
        let url = format!("{}/events/latest/list", self.base_url);
        debug!("POST {url} ({} events)", events.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&LatestListRequest { events })
            .send()
            .await
            .map_err(Self::request_error)?;

        if !response.status().is_success() {
            return Err(Self::status_error(response.status(), &url));
        }

        let body: LatestListResponse = response.json().await.map_err(Self::request_error)?;
        Ok(body.events)
    }

    async fn events_for(
        &self,
        filter: &CategoryFilter,
    ) -> Result<Vec<EventSnapshot>, CatalogError> {
        let url = format!("{}/events/list", self.base_url);
        debug!("POST {url} ({filter:?})");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&EventListRequest::from_filter(filter))
            .send()
            .await
            .map_err(Self::request_error)?;

        if !response.status().is_success() {
            return Err(Self::status_error(response.status(), &url));
        }

        response.json().await.map_err(Self::request_error)
    }
}
