use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use serde_json::Value;
use ticket_booking_engine::{
    booking_api::{AvailabilityCache, BookingFlowConfig, CacheConfig, InventoryApi, ReservationConfig},
    db_types::{BookingStatus, TicketTypeId},
    events::EventProducers,
    traits::InventoryError,
    BookingFlowApi,
    ReservationApi,
};

use super::{
    helpers::{as_user, concert, persisted, send_request, vip_booking},
    mocks::{MockBackend, MockCatalog},
};
use crate::routes::{BookingByIdRoute, CancelBookingRoute, CreateBookingRoute, MyBookingsRoute};

fn inventory(backend: MockBackend) -> InventoryApi<MockBackend> {
    InventoryApi::new(backend, AvailabilityCache::new(CacheConfig::default()))
}

fn configure_create(catalog: MockCatalog, backend: MockBackend) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api =
            ReservationApi::new(catalog, inventory(backend), ReservationConfig::default(), EventProducers::default());
        cfg.service(CreateBookingRoute::<MockCatalog, MockBackend>::new()).app_data(web::Data::new(api));
    }
}

fn configure_flow(backend: MockBackend) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = BookingFlowApi::new(inventory(backend), BookingFlowConfig::default(), EventProducers::default());
        cfg.service(MyBookingsRoute::<MockBackend>::new())
            .service(BookingByIdRoute::<MockBackend>::new())
            .service(CancelBookingRoute::<MockBackend>::new())
            .app_data(web::Data::new(api));
    }
}

fn booking_request() -> TestRequest {
    TestRequest::post().uri("/bookings").insert_header(("Content-Type", "application/json")).set_payload(
        r#"{"event_id": 1,
            "ticket_selections": [{"ticket_type": 1, "quantity": 2}, {"ticket_type": 2, "quantity": 3}]}"#,
    )
}

//----------------------------------------------   Create  ----------------------------------------------------

#[actix_web::test]
async fn create_booking_requires_a_caller() {
    let _ = env_logger::try_init();
    let config = configure_create(MockCatalog::new(), MockBackend::new());
    let (status, body) = send_request(booking_request(), config).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains(r#""code":"UNAUTHORIZED""#), "{body}");
}

#[actix_web::test]
async fn create_booking() {
    let _ = env_logger::try_init();
    let mut catalog = MockCatalog::new();
    catalog.expect_get_event().returning(|_| Ok(Some(concert())));
    let mut backend = MockBackend::new();
    backend.expect_reserve().withf(|t, q| *t == TicketTypeId(1) && *q == 2).times(1).returning(|_, _| Ok(6));
    backend.expect_reserve().withf(|t, q| *t == TicketTypeId(2) && *q == 3).times(1).returning(|_, _| Ok(97));
    backend.expect_insert_booking().times(1).returning(|b| Ok(persisted(b)));
    backend.expect_release().never();
    let req = as_user(booking_request(), "alice");
    let (status, body) = send_request(req, configure_create(catalog, backend)).await;
    assert_eq!(status, StatusCode::CREATED);
    let booking: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(booking["user_id"], "alice");
    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["total_amount"], "300.00");
    assert_eq!(booking["tickets"][0]["subtotal"], "150.00");
    assert_eq!(booking["tickets"][1]["subtotal"], "150.00");
}

#[actix_web::test]
async fn sold_out_ticket_type_rolls_back_the_booking() {
    let _ = env_logger::try_init();
    let mut catalog = MockCatalog::new();
    catalog.expect_get_event().returning(|_| Ok(Some(concert())));
    let mut backend = MockBackend::new();
    backend.expect_reserve().withf(|t, _| *t == TicketTypeId(1)).times(1).returning(|_, _| Ok(6));
    backend.expect_reserve().withf(|t, _| *t == TicketTypeId(2)).times(1).returning(|t, q| {
        Err(InventoryError::InsufficientInventory { ticket_type: t, requested: q, available: 1 })
    });
    // The VIP tickets that were already taken go back
    backend.expect_release().withf(|t, q| *t == TicketTypeId(1) && *q == 2).times(1).returning(|_, _| Ok(8));
    backend.expect_insert_booking().never();
    let req = as_user(booking_request(), "alice");
    let (status, body) = send_request(req, configure_create(catalog, backend)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains(r#""code":"INSUFFICIENT_INVENTORY""#), "{body}");
}

#[actix_web::test]
async fn malformed_booking_requests() {
    let _ = env_logger::try_init();
    let req = as_user(TestRequest::post().uri("/bookings"), "alice")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(r#"{"event_id": 1, "ticket_selections": "#);
    let (status, body) = send_request(req, configure_create(MockCatalog::new(), MockBackend::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains(r#""code":"VALIDATION_ERROR""#), "{body}");

    let req = as_user(TestRequest::post().uri("/bookings"), "alice")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(r#"{"event_id": 1, "ticket_selections": [{"ticket_type": 1, "quantity": 0}]}"#);
    let (status, body) = send_request(req, configure_create(MockCatalog::new(), MockBackend::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("quantity"), "{body}");
}

//----------------------------------------------   Fetch  ----------------------------------------------------

#[actix_web::test]
async fn my_bookings() {
    let _ = env_logger::try_init();
    let mut backend = MockBackend::new();
    backend.expect_fetch_bookings_for_user().times(1).returning(|user| {
        Ok(vec![vip_booking("b-2", user, BookingStatus::Pending), vip_booking("b-1", user, BookingStatus::Confirmed)])
    });
    let req = as_user(TestRequest::get().uri("/bookings"), "alice");
    let (status, body) = send_request(req, configure_flow(backend)).await;
    assert_eq!(status, StatusCode::OK);
    let bookings: Value = serde_json::from_str(&body).unwrap();
    let ids = bookings.as_array().unwrap().iter().map(|b| b["booking_id"].as_str().unwrap()).collect::<Vec<_>>();
    assert_eq!(ids, ["b-2", "b-1"]);
}

#[actix_web::test]
async fn other_users_bookings_are_not_found() {
    let _ = env_logger::try_init();
    let mut backend = MockBackend::new();
    backend.expect_fetch_booking().returning(|id| Ok(Some(vip_booking(id.as_str(), "alice", BookingStatus::Pending))));
    let req = as_user(TestRequest::get().uri("/bookings/b-1"), "alice");
    let (status, _) = send_request(req, configure_flow(backend)).await;
    assert_eq!(status, StatusCode::OK);

    let mut backend = MockBackend::new();
    backend.expect_fetch_booking().returning(|id| Ok(Some(vip_booking(id.as_str(), "alice", BookingStatus::Pending))));
    let req = as_user(TestRequest::get().uri("/bookings/b-1"), "mallory");
    let (status, body) = send_request(req, configure_flow(backend)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains(r#""code":"NOT_FOUND""#), "{body}");
}

//----------------------------------------------   Cancel  ----------------------------------------------------

#[actix_web::test]
async fn cancel_pending_booking() {
    let _ = env_logger::try_init();
    let mut backend = MockBackend::new();
    backend.expect_fetch_booking().returning(|id| Ok(Some(vip_booking(id.as_str(), "alice", BookingStatus::Pending))));
    backend
        .expect_update_booking_status()
        .withf(|_, from, to, owed| *from == BookingStatus::Pending && *to == BookingStatus::Cancelled && *owed)
        .times(1)
        .returning(|id, _, to, _| Ok(Some(vip_booking(id.as_str(), "alice", to))));
    backend.expect_claim_ticket_return().times(1).returning(|_, _| Ok(true));
    backend.expect_release().withf(|t, q| *t == TicketTypeId(1) && *q == 2).times(1).returning(|_, _| Ok(10));
    let req = as_user(TestRequest::post().uri("/bookings/b-1/cancel"), "alice");
    let (status, body) = send_request(req, configure_flow(backend)).await;
    assert_eq!(status, StatusCode::OK);
    let booking: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(booking["status"], "cancelled");
}

#[actix_web::test]
async fn cancelling_twice_releases_once() {
    let _ = env_logger::try_init();
    let mut backend = MockBackend::new();
    backend
        .expect_fetch_booking()
        .returning(|id| Ok(Some(vip_booking(id.as_str(), "alice", BookingStatus::Cancelled))));
    backend.expect_update_booking_status().never();
    // The first cancellation already returned the tickets
    backend.expect_claim_ticket_return().times(1).returning(|_, _| Ok(false));
    backend.expect_release().never();
    let req = as_user(TestRequest::post().uri("/bookings/b-1/cancel"), "alice");
    let (status, body) = send_request(req, configure_flow(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""status":"cancelled""#), "{body}");
}

#[actix_web::test]
async fn cancellation_reports_tickets_that_could_not_be_returned() {
    let _ = env_logger::try_init();
    let mut backend = MockBackend::new();
    backend.expect_fetch_booking().returning(|id| Ok(Some(vip_booking(id.as_str(), "alice", BookingStatus::Pending))));
    backend
        .expect_update_booking_status()
        .times(1)
        .returning(|id, _, to, _| Ok(Some(vip_booking(id.as_str(), "alice", to))));
    backend.expect_claim_ticket_return().times(1).returning(|_, _| Ok(true));
    backend.expect_release().times(1).returning(|_, _| Err(InventoryError::DatabaseError("disk I/O error".into())));
    // The claim is handed back so that the release is tried again
    backend.expect_revoke_ticket_return().withf(|_, t| *t == TicketTypeId(1)).times(1).returning(|_, _| Ok(()));
    let req = as_user(TestRequest::post().uri("/bookings/b-1/cancel"), "alice");
    let (status, body) = send_request(req, configure_flow(backend)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains(r#""code":"INTERNAL_ERROR""#), "{body}");
}
