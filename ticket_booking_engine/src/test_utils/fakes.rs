//! Deterministic stand-ins for collaborators, used to exercise failure paths.
use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
        Mutex,
    },
    time::Duration,
};

use chrono::Duration as ChronoDuration;

use crate::{
    db_types::{Booking, BookingId, BookingStatus, Event, EventId, NewBooking, PaymentNotification, TicketTypeId},
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

//--------------------------------------    FakeCatalog    ---------------------------------------------------------
/// An in-memory catalog. It can be switched off, or made slow, to simulate an unreachable catalog service.
#[derive(Debug, Clone, Default)]
pub struct FakeCatalog {
    events: Arc<Mutex<HashMap<EventId, Event>>>,
    unavailable: Arc<AtomicBool>,
    delay: Arc<Mutex<Option<Duration>>>,
}

impl FakeCatalog {
    pub fn with_event(self, event: Event) -> Self {
        self.insert(event);
        self
    }

    pub fn insert(&self, event: Event) {
        self.events.lock().expect("catalog lock poisoned").insert(event.id, event);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().expect("catalog lock poisoned") = delay;
    }
}

impl CatalogClient for FakeCatalog {
    async fn get_event(&self, event_id: EventId) -> Result<Option<Event>, CatalogError> {
        let delay = *self.delay.lock().expect("catalog lock poisoned");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CatalogError::Unavailable("connection refused".into()));
        }
        Ok(self.events.lock().expect("catalog lock poisoned").get(&event_id).cloned())
    }
}

//--------------------------------------   FlakyInventory  ---------------------------------------------------------
/// Wraps a real backend and makes inventory calls for selected ticket types fail or run slowly. Everything else is
/// passed through untouched.
#[derive(Debug, Clone)]
pub struct FlakyInventory<B> {
    inner: B,
    failing: Arc<Mutex<HashSet<TicketTypeId>>>,
    stalled: Arc<Mutex<HashSet<TicketTypeId>>>,
    slow_to_answer: Arc<Mutex<HashSet<TicketTypeId>>>,
    failing_releases: Arc<Mutex<HashSet<TicketTypeId>>>,
    stall_for: Duration,
}

impl<B> FlakyInventory<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            failing: Arc::new(Mutex::new(HashSet::new())),
            stalled: Arc::new(Mutex::new(HashSet::new())),
            slow_to_answer: Arc::new(Mutex::new(HashSet::new())),
            failing_releases: Arc::new(Mutex::new(HashSet::new())),
            stall_for: Duration::from_millis(500),
        }
    }

    /// How long stalled and slow calls take. The default is half a second.
    pub fn with_stall(mut self, stall_for: Duration) -> Self {
        self.stall_for = stall_for;
        self
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Reservations of this ticket type fail with a store error.
    pub fn fail_reservations_of(&self, ticket_type: TicketTypeId) {
        self.failing.lock().expect("inventory lock poisoned").insert(ticket_type);
    }

    /// Reservations of this ticket type hang before reaching the store.
    pub fn stall_reservations_of(&self, ticket_type: TicketTypeId) {
        self.stalled.lock().expect("inventory lock poisoned").insert(ticket_type);
    }

    /// Reservations of this ticket type are applied by the store straight away, but the answer arrives late.
    pub fn delay_reservation_replies_of(&self, ticket_type: TicketTypeId) {
        self.slow_to_answer.lock().expect("inventory lock poisoned").insert(ticket_type);
    }

    /// Releases of this ticket type fail with a store error, without reaching the store.
    pub fn fail_releases_of(&self, ticket_type: TicketTypeId) {
        self.failing_releases.lock().expect("inventory lock poisoned").insert(ticket_type);
    }

    pub fn heal(&self) {
        self.failing.lock().expect("inventory lock poisoned").clear();
        self.stalled.lock().expect("inventory lock poisoned").clear();
        self.slow_to_answer.lock().expect("inventory lock poisoned").clear();
        self.failing_releases.lock().expect("inventory lock poisoned").clear();
    }
}

impl<B: InventoryManagement> InventoryManagement for FlakyInventory<B> {
    async fn reserve(&self, ticket_type: TicketTypeId, quantity: i64) -> Result<i64, InventoryError> {
        if self.failing.lock().expect("inventory lock poisoned").contains(&ticket_type) {
            return Err(InventoryError::DatabaseError(format!("injected failure for ticket type {ticket_type}")));
        }
        let stalled = self.stalled.lock().expect("inventory lock poisoned").contains(&ticket_type);
        if stalled {
            tokio::time::sleep(self.stall_for).await;
        }
        let result = self.inner.reserve(ticket_type, quantity).await;
        let slow = self.slow_to_answer.lock().expect("inventory lock poisoned").contains(&ticket_type);
        if slow {
            tokio::time::sleep(self.stall_for).await;
        }
        result
    }

    async fn release(&self, ticket_type: TicketTypeId, quantity: i64) -> Result<i64, InventoryError> {
        if self.failing_releases.lock().expect("inventory lock poisoned").contains(&ticket_type) {
            let message = format!("injected release failure for ticket type {ticket_type}");
            return Err(InventoryError::DatabaseError(message));
        }
        self.inner.release(ticket_type, quantity).await
    }

    async fn available(&self, ticket_type: TicketTypeId) -> Result<i64, InventoryError> {
        self.inner.available(ticket_type).await
    }
}

impl<B: BookingManagement> BookingManagement for FlakyInventory<B> {
    async fn insert_booking(&self, booking: NewBooking) -> Result<Booking, BookingStoreError> {
        self.inner.insert_booking(booking).await
    }

    async fn fetch_booking(&self, id: &BookingId) -> Result<Option<Booking>, BookingStoreError> {
        self.inner.fetch_booking(id).await
    }

    async fn fetch_bookings_for_user(&self, user_id: &str) -> Result<Vec<Booking>, BookingStoreError> {
        self.inner.fetch_bookings_for_user(user_id).await
    }

    async fn update_booking_status(
        &self,
        id: &BookingId,
        from: BookingStatus,
        to: BookingStatus,
        tickets_owed: bool,
    ) -> Result<Option<Booking>, BookingStoreError> {
        self.inner.update_booking_status(id, from, to, tickets_owed).await
    }

    async fn claim_ticket_return(&self, id: &BookingId, ticket_type: TicketTypeId) -> Result<bool, BookingStoreError> {
        self.inner.claim_ticket_return(id, ticket_type).await
    }

    async fn revoke_ticket_return(&self, id: &BookingId, ticket_type: TicketTypeId) -> Result<(), BookingStoreError> {
        self.inner.revoke_ticket_return(id, ticket_type).await
    }

    async fn fetch_bookings_awaiting_return(&self) -> Result<Vec<Booking>, BookingStoreError> {
        self.inner.fetch_bookings_awaiting_return().await
    }

    async fn fetch_stale_pending_bookings(
        &self,
        older_than: ChronoDuration,
    ) -> Result<Vec<Booking>, BookingStoreError> {
        self.inner.fetch_stale_pending_bookings(older_than).await
    }

    async fn record_payment_notification(
        &self,
        notification: &PaymentNotification,
    ) -> Result<InsertNotificationResult, BookingStoreError> {
        self.inner.record_payment_notification(notification).await
    }
}
