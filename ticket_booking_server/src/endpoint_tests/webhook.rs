use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use ticket_booking_engine::{
    booking_api::{AvailabilityCache, BookingFlowConfig, CacheConfig, InventoryApi},
    db_types::BookingStatus,
    events::EventProducers,
    traits::{BookingStoreError, InsertNotificationResult, InventoryError},
    BookingFlowApi,
    PaymentReconciliationApi,
};

use super::{
    helpers::{send_request, vip_booking},
    mocks::MockBackend,
};
use crate::routes::PaymentWebhookRoute;

fn configure(backend: MockBackend) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let inventory = InventoryApi::new(backend, AvailabilityCache::new(CacheConfig::default()));
        let flow = BookingFlowApi::new(inventory, BookingFlowConfig::default(), EventProducers::default());
        let api = PaymentReconciliationApi::new(flow);
        cfg.service(PaymentWebhookRoute::<MockBackend>::new()).app_data(web::Data::new(api));
    }
}

fn notification(status: &str) -> TestRequest {
    TestRequest::post()
        .uri("/payments/webhook")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(format!(r#"{{"booking_id": "b-1", "payment_status": "{status}", "payment_id": "pay_001"}}"#))
}

fn backend_with(status: BookingStatus) -> MockBackend {
    let mut backend = MockBackend::new();
    backend.expect_fetch_booking().returning(move |id| Ok(Some(vip_booking(id.as_str(), "alice", status))));
    backend.expect_record_payment_notification().returning(|_| Ok(InsertNotificationResult::Inserted(1)));
    backend
}

#[actix_web::test]
async fn successful_payment_confirms_the_booking() {
    let _ = env_logger::try_init();
    let mut backend = backend_with(BookingStatus::Pending);
    backend
        .expect_update_booking_status()
        .withf(|_, from, to, owed| *from == BookingStatus::Pending && *to == BookingStatus::Confirmed && !*owed)
        .times(1)
        .returning(|id, _, to, _| Ok(Some(vip_booking(id.as_str(), "alice", to))));
    backend.expect_release().never();
    let (status, body) = send_request(notification("completed"), configure(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Booking b-1 is now confirmed"}"#);
}

#[actix_web::test]
async fn replayed_success_is_acknowledged_without_changes() {
    let _ = env_logger::try_init();
    let mut backend = backend_with(BookingStatus::Confirmed);
    backend.expect_update_booking_status().never();
    let (status, body) = send_request(notification(" COMPLETED "), configure(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Booking b-1 is already confirmed"}"#);
}

#[actix_web::test]
async fn failed_payment_cancels_and_releases() {
    let _ = env_logger::try_init();
    let mut backend = backend_with(BookingStatus::Pending);
    backend
        .expect_update_booking_status()
        .withf(|_, from, to, owed| *from == BookingStatus::Pending && *to == BookingStatus::Cancelled && *owed)
        .times(1)
        .returning(|id, _, to, _| Ok(Some(vip_booking(id.as_str(), "alice", to))));
    backend.expect_claim_ticket_return().times(1).returning(|_, _| Ok(true));
    backend.expect_release().times(1).returning(|_, _| Ok(10));
    let (status, body) = send_request(notification("declined"), configure(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Booking b-1 is now cancelled"}"#);
}

#[actix_web::test]
async fn processing_payments_are_acknowledged() {
    let _ = env_logger::try_init();
    let mut backend = backend_with(BookingStatus::Pending);
    backend.expect_update_booking_status().never();
    let (status, body) = send_request(notification("processing"), configure(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Payment acknowledged. Booking b-1 is pending"}"#);
}

#[actix_web::test]
async fn failure_after_confirmation_is_refused_but_acknowledged() {
    let _ = env_logger::try_init();
    let mut backend = backend_with(BookingStatus::Confirmed);
    backend.expect_update_booking_status().never();
    backend.expect_release().never();
    let (status, body) = send_request(notification("failed"), configure(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with(r#"{"success":false"#), "{body}");
}

#[actix_web::test]
async fn business_failures_are_acknowledged() {
    let _ = env_logger::try_init();
    // Unknown status
    let (status, body) = send_request(notification("teleported"), configure(MockBackend::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""success":false"#), "{body}");

    // Unknown booking
    let mut backend = MockBackend::new();
    backend.expect_fetch_booking().returning(|_| Ok(None));
    backend.expect_record_payment_notification().never();
    let (status, body) = send_request(notification("completed"), configure(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""success":false"#), "{body}");

    // Not JSON at all
    let req = TestRequest::post().uri("/payments/webhook").set_payload("status=completed");
    let (status, body) = send_request(req, configure(MockBackend::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""success":false"#), "{body}");
}

#[actix_web::test]
async fn backend_failures_ask_for_a_retry() {
    let _ = env_logger::try_init();
    let mut backend = MockBackend::new();
    backend.expect_fetch_booking().returning(|_| Err(BookingStoreError::DatabaseError("database is locked".into())));
    let (status, body) = send_request(notification("completed"), configure(backend)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains(r#""success":false"#), "{body}");
}

#[actix_web::test]
async fn redelivered_failures_retry_owed_releases() {
    let _ = env_logger::try_init();
    // An earlier delivery cancelled the booking but could not return its tickets
    let mut backend = backend_with(BookingStatus::Cancelled);
    backend.expect_update_booking_status().never();
    backend.expect_claim_ticket_return().times(1).returning(|_, _| Ok(true));
    backend.expect_release().times(1).returning(|_, _| Err(InventoryError::DatabaseError("database is locked".into())));
    backend.expect_revoke_ticket_return().times(1).returning(|_, _| Ok(()));
    let (status, body) = send_request(notification("declined"), configure(backend)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{body}");

    let mut backend = backend_with(BookingStatus::Cancelled);
    backend.expect_claim_ticket_return().times(1).returning(|_, _| Ok(true));
    backend.expect_release().times(1).returning(|_, _| Ok(10));
    let (status, body) = send_request(notification("declined"), configure(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Booking b-1 is already cancelled"}"#);
}
