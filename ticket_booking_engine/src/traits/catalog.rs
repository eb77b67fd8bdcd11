use thiserror::Error;

use crate::db_types::{Event, EventId};

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("The catalog service could not be reached. {0}")]
    Unavailable(String),
    #[error("The catalog service returned an unexpected response. {0}")]
    InvalidResponse(String),
    #[error("Catalog database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

/// Read-only access to event metadata owned by the catalog.
#[allow(async_fn_in_trait)]
pub trait CatalogClient {
    /// Fetches the event, including all of its ticket types. Returns `Ok(None)` if the event does not exist.
    async fn get_event(&self, event_id: EventId) -> Result<Option<Event>, CatalogError>;
}
