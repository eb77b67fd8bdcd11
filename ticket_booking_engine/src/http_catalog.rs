//! HTTP client for the catalog service's internal API.
use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT},
    Client,
    StatusCode,
};
use serde::Deserialize;

use crate::{
    db_types::{Event, EventId},
    traits::{CatalogClient, CatalogError},
};

pub const DEFAULT_CATALOG_URL: &str = "http://localhost:8001";
pub const DEFAULT_CATALOG_TIMEOUT: Duration = Duration::from_secs(30);
const INTERNAL_API_PREFIX: &str = "internal/v1";
const CLIENT_USER_AGENT: &str = "EventServiceClient/1.0";

#[derive(Debug, Clone)]
pub struct HttpCatalogConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for HttpCatalogConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_CATALOG_URL.to_string(), timeout: DEFAULT_CATALOG_TIMEOUT }
    }
}

/// Catalog responses are wrapped in a `{"success": bool, "data": ...}` envelope.
#[derive(Debug, Deserialize)]
struct CatalogEnvelope<T> {
    success: bool,
    data: Option<T>,
}

#[derive(Clone)]
pub struct HttpCatalogClient {
    config: HttpCatalogConfig,
    client: Arc<Client>,
}

impl std::fmt::Debug for HttpCatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HttpCatalogClient({})", self.config.base_url)
    }
}

impl HttpCatalogClient {
    pub fn new(config: HttpCatalogConfig) -> Result<Self, CatalogError> {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| CatalogError::Unavailable(format!("Could not build HTTP client. {e}")))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{INTERNAL_API_PREFIX}/{}/", self.config.base_url.trim_end_matches('/'), path.trim_matches('/'))
    }
}

impl CatalogClient for HttpCatalogClient {
    async fn get_event(&self, event_id: EventId) -> Result<Option<Event>, CatalogError> {
        let url = self.url(&format!("events/{event_id}"));
        trace!("📦️ Fetching event #{event_id} from {url}");
        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!("📦️ Catalog request to {url} failed. {e}");
            CatalogError::Unavailable(e.to_string())
        })?;
        let status = response.status();
        info!("📦️ Catalog request: GET {url} - Status: {status}");
        match status {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let envelope = response
                    .json::<CatalogEnvelope<Event>>()
                    .await
                    .map_err(|e| CatalogError::InvalidResponse(e.to_string()))?;
                match envelope {
                    CatalogEnvelope { success: true, data } => Ok(data),
                    CatalogEnvelope { success: false, .. } => {
                        Err(CatalogError::InvalidResponse(format!("Catalog reported failure for event #{event_id}")))
                    },
                }
            },
            s => {
                let message = response.text().await.unwrap_or_default();
                error!("📦️ Catalog service error: {s} - {message}");
                Err(CatalogError::Unavailable(format!("Catalog returned {s}")))
            },
        }
    }
}
