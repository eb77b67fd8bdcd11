//! `SqliteDatabase` is a concrete implementation of a ticket booking engine backend.
//!
//! It keeps the catalog (events and ticket types), the inventory counters, and the bookings in one SQLite database,
//! and implements all the traits defined in the [`crate::traits`] module.
use std::fmt::Debug;

use chrono::Duration;
use log::*;
use sqlx::SqlitePool;

use super::db::{bookings, db_url, events, new_pool, payment_notifications, ticket_types};
use crate::{
    db_types::{
        Booking,
        BookingId,
        BookingStatus,
        Event,
        EventId,
        NewBooking,
        NewEvent,
        NewTicketType,
        PaymentNotification,
        TicketType,
        TicketTypeId,
    },
    traits::{
        BookingManagement,
        BookingStoreError,
        CatalogClient,
        CatalogError,
        InsertNotificationResult,
        InventoryError,
        InventoryManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in the `TBS_DATABASE_URL` environment variable.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        trace!("🗃️ Created new SQLite connection pool for {url}");
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Applies any outstanding schema migrations.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }

    pub async fn insert_event(&self, event: NewEvent) -> Result<Event, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        let event = events::insert_event(event, &mut conn).await?;
        debug!("🗃️ Event #{} [{}] created", event.id, event.title);
        Ok(event)
    }

    pub async fn insert_ticket_type(&self, ticket_type: NewTicketType) -> Result<TicketType, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        let ticket_type = ticket_types::insert_ticket_type(ticket_type, &mut conn).await?;
        debug!(
            "🗃️ Ticket type #{} [{}] created for event #{} with {} tickets",
            ticket_type.id, ticket_type.name, ticket_type.event_id, ticket_type.quantity_total
        );
        Ok(ticket_type)
    }

    pub async fn fetch_ticket_type(&self, id: TicketTypeId) -> Result<Option<TicketType>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        ticket_types::fetch_ticket_type(id, &mut conn).await
    }

    pub async fn payment_notification_count(&self, booking_id: &BookingId) -> Result<i64, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        payment_notifications::count_for_booking(booking_id.as_str(), &mut conn).await
    }
}

impl CatalogClient for SqliteDatabase {
    async fn get_event(&self, event_id: EventId) -> Result<Option<Event>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let event = events::fetch_event(event_id, &mut conn).await?;
        Ok(event)
    }
}

impl InventoryManagement for SqliteDatabase {
    async fn reserve(&self, ticket_type: TicketTypeId, quantity: i64) -> Result<i64, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        ticket_types::reserve(ticket_type, quantity, &mut conn).await
    }

    async fn release(&self, ticket_type: TicketTypeId, quantity: i64) -> Result<i64, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        ticket_types::release(ticket_type, quantity, &mut conn).await
    }

    async fn available(&self, ticket_type: TicketTypeId) -> Result<i64, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        ticket_types::available(ticket_type, &mut conn).await
    }
}

impl BookingManagement for SqliteDatabase {
    /// Takes a new booking, and in a single atomic transaction,
    /// * stores the booking row in the `pending` state,
    /// * stores every line item (the schema enforces `subtotal = quantity * unit_price` and one line per ticket
    ///   type),
    /// * re-reads the sum of the persisted subtotals and refuses to commit if it differs from the booking total.
    async fn insert_booking(&self, booking: NewBooking) -> Result<Booking, BookingStoreError> {
        if booking.lines().is_empty() {
            return Err(BookingStoreError::EmptyBooking);
        }
        let mut tx = self.pool.begin().await?;
        let inserted = bookings::insert_booking(&booking, &mut tx).await?;
        let mut tickets = Vec::with_capacity(booking.lines().len());
        for line in booking.lines() {
            let ticket = bookings::insert_ticket_line(&booking.id, line, &mut tx).await?;
            tickets.push(ticket);
        }
        let expected = bookings::sum_of_subtotals(&booking.id, &mut tx).await?;
        if expected != inserted.total_amount {
            error!(
                "🗃️ Booking {} total {} does not match its line items ({expected}). The booking is not saved.",
                booking.id, inserted.total_amount
            );
            return Err(BookingStoreError::TotalMismatch {
                id: booking.id,
                persisted: inserted.total_amount,
                expected,
            });
        }
        tx.commit().await?;
        debug!("🗃️ Booking {} saved with {} line items", inserted.id, tickets.len());
        Ok(inserted.with_tickets(tickets))
    }

    async fn fetch_booking(&self, id: &BookingId) -> Result<Option<Booking>, BookingStoreError> {
        let mut conn = self.pool.acquire().await?;
        let booking = bookings::fetch_booking(id, &mut conn).await?;
        Ok(booking)
    }

    async fn fetch_bookings_for_user(&self, user_id: &str) -> Result<Vec<Booking>, BookingStoreError> {
        let mut conn = self.pool.acquire().await?;
        let bookings = bookings::fetch_bookings_for_user(user_id, &mut conn).await?;
        Ok(bookings)
    }

    async fn update_booking_status(
        &self,
        id: &BookingId,
        from: BookingStatus,
        to: BookingStatus,
        tickets_owed: bool,
    ) -> Result<Option<Booking>, BookingStoreError> {
        let mut conn = self.pool.acquire().await?;
        let booking = bookings::update_status(id, from, to, tickets_owed, &mut conn).await?;
        Ok(booking)
    }

    async fn claim_ticket_return(&self, id: &BookingId, ticket_type: TicketTypeId) -> Result<bool, BookingStoreError> {
        let mut conn = self.pool.acquire().await?;
        let claimed = bookings::claim_ticket_return(id, ticket_type, &mut conn).await?;
        Ok(claimed)
    }

    async fn revoke_ticket_return(&self, id: &BookingId, ticket_type: TicketTypeId) -> Result<(), BookingStoreError> {
        let mut conn = self.pool.acquire().await?;
        bookings::revoke_ticket_return(id, ticket_type, &mut conn).await?;
        Ok(())
    }

    async fn fetch_bookings_awaiting_return(&self) -> Result<Vec<Booking>, BookingStoreError> {
        let mut conn = self.pool.acquire().await?;
        let bookings = bookings::fetch_bookings_awaiting_return(&mut conn).await?;
        Ok(bookings)
    }

    async fn fetch_stale_pending_bookings(&self, older_than: Duration) -> Result<Vec<Booking>, BookingStoreError> {
        let mut conn = self.pool.acquire().await?;
        let bookings = bookings::fetch_stale_pending_bookings(older_than, &mut conn).await?;
        Ok(bookings)
    }

    async fn record_payment_notification(
        &self,
        notification: &PaymentNotification,
    ) -> Result<InsertNotificationResult, BookingStoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = payment_notifications::idempotent_insert(notification, &mut conn).await?;
        Ok(result)
    }
}
