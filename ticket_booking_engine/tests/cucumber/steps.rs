use std::time::Duration;

use cucumber::{then, when};
use ticket_booking_engine::{
    booking_api::{BookingRequest, ErrorKind, TicketSelection},
    db_types::{BookingStatus, Money, PaymentNotification},
};

use crate::cucumber::BookingWorld;

#[when(expr = "{word} books {int} VIP and {int} General tickets")]
async fn book_tickets(world: &mut BookingWorld, user: String, vip: i64, general: i64) {
    let concert = world.concert();
    let mut selections = Vec::new();
    if vip > 0 {
        selections.push(TicketSelection::new(concert.vip.id, vip));
    }
    if general > 0 {
        selections.push(TicketSelection::new(concert.general.id, general));
    }
    let request = BookingRequest::new(concert.event.id, selections);
    let result = world.system().reservations.create_booking(&user, request).await;
    match result {
        Ok(booking) => {
            world.bookings.insert(user, booking);
            world.last_error = None;
        },
        Err(e) => world.last_error = Some(e),
    }
}

#[when(expr = "the payment provider reports {string} for {word}'s booking with payment id {word}")]
async fn payment_notification(world: &mut BookingWorld, status: String, user: String, payment_id: String) {
    let booking_id = world.booking_for(&user).id.clone();
    let notification = PaymentNotification::new(booking_id, status, payment_id);
    let result = world.system().reconciliation.process_payment_notification(notification).await;
    world.last_error = result.err();
}

#[when(expr = "{word} cancels the booking")]
async fn cancel_booking(world: &mut BookingWorld, user: String) {
    let booking_id = world.booking_for(&user).id.clone();
    let result = world.system().flow.cancel_booking(&booking_id, &user).await;
    world.last_error = result.err();
}

#[when("unpaid bookings expire")]
async fn expire_bookings(world: &mut BookingWorld) {
    // Timestamps have one-second resolution
    tokio::time::sleep(Duration::from_millis(1100)).await;
    world.system().flow.expire_stale_bookings(chrono::Duration::zero()).await.expect("Error expiring bookings");
}

#[then(expr = "{word}'s booking is {word} with a total of {word}")]
async fn check_booking(world: &mut BookingWorld, user: String, status: String, total: String) {
    let id = world.booking_for(&user).id.clone();
    let booking = world.system().flow.fetch_booking(&id).await.expect("Error fetching booking");
    let status = status.parse::<BookingStatus>().expect("Not a booking status");
    let total = total.parse::<Money>().expect("Not an amount");
    assert_eq!(booking.status, status);
    assert_eq!(booking.total_amount, total);
    assert_eq!(Some(booking.total_amount), Money::checked_sum(booking.tickets.iter().map(|t| t.subtotal)));
}

#[then(expr = "{int} VIP and {int} General tickets are sold")]
async fn check_sold(world: &mut BookingWorld, vip: i64, general: i64) {
    let concert = world.concert();
    let db = &world.system().db;
    let vip_sold = db.fetch_ticket_type(concert.vip.id).await.unwrap().unwrap().quantity_sold;
    let general_sold = db.fetch_ticket_type(concert.general.id).await.unwrap().unwrap().quantity_sold;
    assert_eq!((vip_sold, general_sold), (vip, general));
}

#[then(expr = "the request fails with {word}")]
async fn check_error(world: &mut BookingWorld, kind: String) {
    let err = world.last_error.take().expect("Expected the last request to fail");
    let expected = match kind.as_str() {
        "ValidationError" => ErrorKind::Validation,
        "NotFound" => ErrorKind::NotFound,
        "Conflict" => ErrorKind::Conflict,
        "InsufficientInventory" => ErrorKind::InsufficientInventory,
        "ExternalServiceError" => ErrorKind::ExternalService,
        _ => panic!("Unknown error kind {kind}"),
    };
    assert_eq!(err.kind(), expected, "{err}");
}

#[then("no error is reported")]
async fn no_error(world: &mut BookingWorld) {
    assert!(world.last_error.is_none(), "Unexpected error: {:?}", world.last_error);
}
