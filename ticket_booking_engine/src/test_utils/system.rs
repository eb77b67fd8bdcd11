use std::time::Duration;

use log::*;

use crate::{
    booking_api::{
        AvailabilityApi,
        AvailabilityCache,
        BookingFlowApi,
        BookingFlowConfig,
        CacheConfig,
        InventoryApi,
        PaymentReconciliationApi,
        ReservationApi,
        ReservationConfig,
    },
    db_types::{Event, EventStatus, Money, NewEvent, NewTicketType, TicketType},
    events::EventProducers,
    test_utils::prepare_env::{drop_database, prepare_test_env, random_db_path},
    SqliteDatabase,
};

/// The standard test event: a published concert with a 75.00 VIP tier (10 tickets) and a 50.00 General tier
/// (100 tickets).
#[derive(Debug, Clone)]
pub struct SeededEvent {
    pub event: Event,
    pub vip: TicketType,
    pub general: TicketType,
}

pub async fn seed_concert(db: &SqliteDatabase) -> SeededEvent {
    let event = db.insert_event(NewEvent::new("Spring Concert", EventStatus::Published)).await.expect("insert event");
    let vip = NewTicketType::new(event.id, "VIP", Money::from_units(75), 10).with_description("Front rows");
    let vip = db.insert_ticket_type(vip).await.expect("insert VIP");
    let general = NewTicketType::new(event.id, "General", Money::from_units(50), 100);
    let general = db.insert_ticket_type(general).await.expect("insert General");
    debug!("🚀️ Seeded event #{} with VIP #{} and General #{}", event.id, vip.id, general.id);
    SeededEvent { event, vip, general }
}

#[derive(Debug, Clone)]
pub struct TestSystemConfig {
    pub cache: CacheConfig,
    pub call_timeout: Duration,
    pub release_on_confirmed_cancel: bool,
}

impl Default for TestSystemConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            call_timeout: ReservationConfig::default().call_timeout,
            release_on_confirmed_cancel: BookingFlowConfig::default().release_on_confirmed_cancel,
        }
    }
}

/// A complete engine on a throwaway SQLite database. The database doubles as the catalog.
#[derive(Debug)]
pub struct TestSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub cache: AvailabilityCache,
    pub availability: AvailabilityApi<SqliteDatabase, SqliteDatabase>,
    pub reservations: ReservationApi<SqliteDatabase, SqliteDatabase>,
    pub flow: BookingFlowApi<SqliteDatabase>,
    pub reconciliation: PaymentReconciliationApi<SqliteDatabase>,
}

impl TestSystem {
    pub async fn new() -> Self {
        Self::with_config(TestSystemConfig::default(), EventProducers::default()).await
    }

    pub async fn with_config(config: TestSystemConfig, producers: EventProducers) -> Self {
        let db_path = random_db_path();
        prepare_test_env(&db_path).await;
        let db = SqliteDatabase::new_with_url(&db_path, 5).await.expect("Error creating connection to database");
        let cache = AvailabilityCache::new(config.cache);
        let inventory = InventoryApi::new(db.clone(), cache.clone());
        let availability = AvailabilityApi::new(db.clone(), inventory.clone()).with_call_timeout(config.call_timeout);
        let reservation_config = ReservationConfig { call_timeout: config.call_timeout };
        let reservations = ReservationApi::new(db.clone(), inventory.clone(), reservation_config, producers.clone());
        let flow_config = BookingFlowConfig { release_on_confirmed_cancel: config.release_on_confirmed_cancel };
        let flow = BookingFlowApi::new(inventory, flow_config, producers);
        let reconciliation = PaymentReconciliationApi::new(flow.clone());
        Self { db_path, db, cache, availability, reservations, flow, reconciliation }
    }

    /// Closes the pool (shared by every API handle) and deletes the database file.
    pub async fn tear_down(self) {
        let mut db = self.db;
        if let Err(e) = db.close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        drop_database(&self.db_path).await;
    }
}
