use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use futures::FutureExt;
use log::*;
use ticket_booking_engine::{
    booking_api::{AvailabilityCache, InventoryApi},
    events::{EventHandlers, EventHooks, EventProducers},
    http_catalog::HttpCatalogClient,
    AvailabilityApi,
    BookingFlowApi,
    PaymentReconciliationApi,
    ReservationApi,
    SqliteDatabase,
};

use crate::{
    catalog_backend::CatalogBackend,
    config::ServerConfig,
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    routes::{
        health,
        AvailabilityRoute,
        BookingByIdRoute,
        CancelBookingRoute,
        CreateBookingRoute,
        MyBookingsRoute,
        PaymentWebhookRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(format!("Migrations failed. {e}")))?;
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, logging_hooks());
    let producers = handlers.producers();
    handlers.start_handlers();
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let catalog = match &config.catalog {
        Some(catalog_config) => HttpCatalogClient::new(catalog_config.clone())
            .map(CatalogBackend::Remote)
            .map_err(|e| ServerError::InitializeError(e.to_string()))?,
        None => CatalogBackend::Local(db.clone()),
    };
    // One cache for all workers, so that an invalidation is seen by every worker
    let cache = AvailabilityCache::new(config.cache);
    let inventory = InventoryApi::new(db.clone(), cache);
    let flow_api = BookingFlowApi::new(inventory.clone(), config.booking_flow_config(), producers.clone());
    let _worker = start_expiry_worker(flow_api.clone(), config.unpaid_booking_timeout);
    let call_timeout = config.external_call_timeout;
    let reservation_config = config.reservation_config();
    let srv = HttpServer::new(move || {
        let availability_api =
            AvailabilityApi::new(catalog.clone(), inventory.clone()).with_call_timeout(call_timeout);
        let reservation_api =
            ReservationApi::new(catalog.clone(), inventory.clone(), reservation_config, producers.clone());
        let reconciliation_api = PaymentReconciliationApi::new(flow_api.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("tbs::access_log"))
            .app_data(web::Data::new(availability_api))
            .app_data(web::Data::new(reservation_api))
            .app_data(web::Data::new(flow_api.clone()))
            .app_data(web::Data::new(reconciliation_api))
            .app_data(json_config())
            .app_data(path_config())
            .service(health)
            .service(AvailabilityRoute::<CatalogBackend, SqliteDatabase>::new())
            .service(CreateBookingRoute::<CatalogBackend, SqliteDatabase>::new())
            .service(MyBookingsRoute::<SqliteDatabase>::new())
            .service(BookingByIdRoute::<SqliteDatabase>::new())
            .service(CancelBookingRoute::<SqliteDatabase>::new())
            .service(PaymentWebhookRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Malformed JSON bodies are reported in the standard error format.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into())
}

/// Path segments that cannot be parsed (e.g. a non-numeric event id) are reported in the standard error format.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| ServerError::InvalidRequestPath(err.to_string()).into())
}

fn logging_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_booking_created(|ev| {
            async move {
                let booking = &ev.booking;
                info!("🪝️ Booking {} created for {}. Total {}", booking.id, booking.user_id, booking.total_amount)
            }
            .boxed()
        })
        .on_booking_confirmed(|ev| async move { info!("🪝️ Booking {} confirmed", ev.booking.id) }.boxed())
        .on_booking_cancelled(|ev| {
            async move {
                info!(
                    "🪝️ Booking {} cancelled (was {}). Tickets released: {}",
                    ev.booking.id, ev.previous_status, ev.inventory_released
                )
            }
            .boxed()
        });
    hooks
}
