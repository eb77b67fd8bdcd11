use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use ticket_booking_engine::{
    booking_api::{AvailabilityCache, CacheConfig, InventoryApi},
    db_types::TicketTypeId,
    traits::CatalogError,
    AvailabilityApi,
};

use super::{
    helpers::{concert, send_request},
    mocks::{MockBackend, MockCatalog},
};
use crate::routes::AvailabilityRoute;

fn configure(catalog: MockCatalog, backend: MockBackend) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let inventory = InventoryApi::new(backend, AvailabilityCache::new(CacheConfig::default()));
        let api = AvailabilityApi::new(catalog, inventory);
        cfg.service(AvailabilityRoute::<MockCatalog, MockBackend>::new()).app_data(web::Data::new(api));
    }
}

#[actix_web::test]
async fn lists_active_ticket_types() {
    let _ = env_logger::try_init();
    let mut catalog = MockCatalog::new();
    catalog.expect_get_event().returning(|_| Ok(Some(concert())));
    let mut backend = MockBackend::new();
    backend.expect_available().withf(|t| *t == TicketTypeId(1)).times(1).returning(|_| Ok(8));
    backend.expect_available().withf(|t| *t == TicketTypeId(2)).times(1).returning(|_| Ok(100));
    let req = TestRequest::get().uri("/events/1/tickets/available");
    let (status, body) = send_request(req, configure(catalog, backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"data":[{"ticket_type_id":1,"available":8},{"ticket_type_id":2,"available":100}]}"#);
}

#[actix_web::test]
async fn unknown_event() {
    let _ = env_logger::try_init();
    let mut catalog = MockCatalog::new();
    catalog.expect_get_event().returning(|_| Ok(None));
    let mut backend = MockBackend::new();
    backend.expect_available().never();
    let req = TestRequest::get().uri("/events/99/tickets/available");
    let (status, body) = send_request(req, configure(catalog, backend)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains(r#""code":"NOT_FOUND""#), "{body}");
}

#[actix_web::test]
async fn catalog_outage_is_a_service_error() {
    let _ = env_logger::try_init();
    let mut catalog = MockCatalog::new();
    catalog.expect_get_event().returning(|_| Err(CatalogError::Unavailable("connection refused".into())));
    let req = TestRequest::get().uri("/events/1/tickets/available");
    let (status, body) = send_request(req, configure(catalog, MockBackend::new())).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.contains(r#""code":"EXTERNAL_SERVICE_ERROR""#), "{body}");
}

#[actix_web::test]
async fn event_id_must_be_numeric() {
    let _ = env_logger::try_init();
    let req = TestRequest::get().uri("/events/spring/tickets/available");
    let (status, body) = send_request(req, configure(MockCatalog::new(), MockBackend::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains(r#""code":"VALIDATION_ERROR""#), "{body}");
}
