use actix_web::{http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use chrono::{TimeZone, Utc};
use log::debug;
use tbs_common::Money;
use ticket_booking_engine::db_types::{
    Booking,
    BookingId,
    BookingStatus,
    Event,
    EventId,
    NewBooking,
    TicketLine,
    TicketTypeId,
};

use crate::{
    caller::USER_ID_HEADER,
    server::{json_config, path_config},
};

/// Sends `req` to an app set up by `configure`, returning the status and body of the response.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().app_data(json_config()).app_data(path_config()).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}

pub fn as_user(req: TestRequest, user_id: &str) -> TestRequest {
    req.insert_header((USER_ID_HEADER, user_id))
}

/// A published event with a 75.00 VIP tier (id 1) and a 50.00 General tier (id 2).
pub fn concert() -> Event {
    let json = r#"{
        "id": 1, "title": "Spring Concert", "status": "published",
        "ticket_types": [
            {"id": 1, "event_id": 1, "name": "VIP", "price": "75.00", "quantity_total": 10, "quantity_sold": 2},
            {"id": 2, "event_id": 1, "name": "General", "price": "50.00", "quantity_total": 100},
            {"id": 3, "event_id": 1, "name": "Backstage", "price": "500.00", "quantity_total": 2, "is_active": false}
        ]
    }"#;
    serde_json::from_str(json).expect("valid event")
}

pub fn timestamp() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 20, 12, 0, 0).unwrap()
}

/// What the booking store would return after persisting `booking`.
pub fn persisted(booking: NewBooking) -> Booking {
    let total_amount = booking.total_amount();
    let tickets = booking
        .lines()
        .iter()
        .enumerate()
        .map(|(i, line)| TicketLine {
            id: i as i64 + 1,
            booking_id: booking.id.clone(),
            ticket_type_id: line.ticket_type_id,
            ticket_type_name: line.ticket_type_name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            subtotal: line.subtotal(),
        })
        .collect();
    Booking {
        id: booking.id,
        event_id: booking.event_id,
        user_id: booking.user_id,
        status: BookingStatus::Pending,
        total_amount,
        payment_url: None,
        created_at: timestamp(),
        updated_at: timestamp(),
        tickets,
    }
}

/// A booking for 2 VIP tickets owned by `user_id`.
pub fn vip_booking(id: &str, user_id: &str, status: BookingStatus) -> Booking {
    Booking {
        id: BookingId::from(id),
        event_id: EventId(1),
        user_id: user_id.to_string(),
        status,
        total_amount: Money::from_units(150),
        payment_url: None,
        created_at: timestamp(),
        updated_at: timestamp(),
        tickets: vec![TicketLine {
            id: 1,
            booking_id: BookingId::from(id),
            ticket_type_id: TicketTypeId(1),
            ticket_type_name: "VIP".into(),
            quantity: 2,
            unit_price: Money::from_units(75),
            subtotal: Money::from_units(150),
        }],
    }
}
