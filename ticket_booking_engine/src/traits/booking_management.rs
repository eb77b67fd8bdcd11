use chrono::Duration;
use thiserror::Error;

use crate::{
    db_types::{Booking, BookingId, BookingStatus, Money, NewBooking, PaymentNotification, TicketTypeId},
    traits::InsertNotificationResult,
};

#[derive(Debug, Clone, Error)]
pub enum BookingStoreError {
    #[error("Booking {0} already exists")]
    BookingAlreadyExists(BookingId),
    #[error("Booking has no line items")]
    EmptyBooking,
    #[error("Persisted total {persisted} for booking {id} does not match the sum of its line items, {expected}")]
    TotalMismatch { id: BookingId, persisted: Money, expected: Money },
    #[error("Booking database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for BookingStoreError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

/// Persistence for the booking aggregate.
#[allow(async_fn_in_trait)]
pub trait BookingManagement {
    /// Stores the booking and all of its line items in a single atomic transaction, in the `Pending` state.
    /// The persisted total is checked against the line items before the transaction commits.
    async fn insert_booking(&self, booking: NewBooking) -> Result<Booking, BookingStoreError>;

    /// Fetches a booking, with its line items.
    async fn fetch_booking(&self, id: &BookingId) -> Result<Option<Booking>, BookingStoreError>;

    /// Fetches all bookings owned by the given user, most recent first.
    async fn fetch_bookings_for_user(&self, user_id: &str) -> Result<Vec<Booking>, BookingStoreError>;

    /// Compare-and-set on the booking status. The status is changed to `to` only if it is currently `from`.
    /// If `tickets_owed` is set, the same write marks the booking's tickets as owed back to inventory (see
    /// [`claim_ticket_return`](Self::claim_ticket_return)).
    /// Returns the updated booking if this call made the change, and `None` otherwise.
    async fn update_booking_status(
        &self,
        id: &BookingId,
        from: BookingStatus,
        to: BookingStatus,
        tickets_owed: bool,
    ) -> Result<Option<Booking>, BookingStoreError>;

    /// Claims the right to return one line item's tickets to inventory. A line can only be claimed once, and only when
    /// its booking is cancelled with tickets owed. Returns true if this call made the claim.
    async fn claim_ticket_return(&self, id: &BookingId, ticket_type: TicketTypeId) -> Result<bool, BookingStoreError>;

    /// Withdraws a claim after the release it guarded failed, so that the release can be tried again later.
    async fn revoke_ticket_return(&self, id: &BookingId, ticket_type: TicketTypeId) -> Result<(), BookingStoreError>;

    /// Cancelled bookings that still have line items owed back to inventory and not yet claimed.
    async fn fetch_bookings_awaiting_return(&self) -> Result<Vec<Booking>, BookingStoreError>;

    /// Fetches `Pending` bookings that have not been updated for longer than `older_than`.
    async fn fetch_stale_pending_bookings(&self, older_than: Duration) -> Result<Vec<Booking>, BookingStoreError>;

    /// Appends the notification to the payment notification log. Re-deliveries of the same
    /// `(payment_id, payment_status)` pair are detected and not stored twice.
    async fn record_payment_notification(
        &self,
        notification: &PaymentNotification,
    ) -> Result<InsertNotificationResult, BookingStoreError>;
}
