use ticket_booking_engine::{
    db_types::{Event, EventId},
    http_catalog::HttpCatalogClient,
    traits::{CatalogClient, CatalogError},
    SqliteDatabase,
};

/// The catalog the server reads event metadata from, chosen at start-up.
#[derive(Debug, Clone)]
pub enum CatalogBackend {
    /// The catalog tables in the service's own database.
    Local(SqliteDatabase),
    /// The catalog service's internal API.
    Remote(HttpCatalogClient),
}

impl CatalogClient for CatalogBackend {
    async fn get_event(&self, event_id: EventId) -> Result<Option<Event>, CatalogError> {
        match self {
            Self::Local(db) => db.get_event(event_id).await,
            Self::Remote(client) => client.get_event(event_id).await,
        }
    }
}
