//! Turns booking requests into `Pending` bookings.
//!
//! A booking usually spans several ticket types, and each ticket type's counter is reserved on its own. The
//! orchestrator therefore runs a small saga: every successful reservation is written to a [`ReservationLog`], and if
//! any later step fails (not enough tickets, a timeout, a store error, or the booking insert itself) the log is
//! replayed backwards and each reservation is released before the error is returned. The caller either gets a
//! complete `Pending` booking or an error with no inventory held.
//!
//! A reservation that overruns its time limit is not abandoned. Its outcome is awaited first, and if it went through
//! after all, it is released along with the rest.
//!
//! Selections are reserved in ticket type id order, so concurrent multi-line bookings always touch the counters in the
//! same order.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    booking_api::{
        booking_objects::{BookingRequest, ReservationConfig, TicketSelection},
        errors::BookingError,
        inventory_api::InventoryApi,
        reservation_log::ReservationLog,
    },
    db_types::{Booking, Event, NewBooking, NewTicketLine},
    events::{BookingCreatedEvent, EventProducers},
    helpers::{bounded_call, call_with_deadline, Deadline},
    traits::{BookingManagement, CatalogClient, InventoryManagement},
};

#[derive(Clone)]
pub struct ReservationApi<C, B> {
    catalog: C,
    inventory: InventoryApi<B>,
    config: ReservationConfig,
    producers: EventProducers,
}

impl<C, B> Debug for ReservationApi<C, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReservationApi ({:?})", self.config)
    }
}

impl<C, B> ReservationApi<C, B> {
    pub fn new(catalog: C, inventory: InventoryApi<B>, config: ReservationConfig, producers: EventProducers) -> Self {
        Self { catalog, inventory, config, producers }
    }

    pub fn inventory(&self) -> &InventoryApi<B> {
        &self.inventory
    }
}

impl<C, B> ReservationApi<C, B>
where
    C: CatalogClient,
    B: InventoryManagement + BookingManagement,
{
    /// Reserves every selected ticket and stores a `Pending` booking for `user_id`, or reserves nothing at all.
    pub async fn create_booking(&self, user_id: &str, request: BookingRequest) -> Result<Booking, BookingError> {
        if user_id.trim().is_empty() {
            return Err(BookingError::validation("user_id", "A booking must belong to a user"));
        }
        request.validate()?;
        let event_id = request.event_id;
        let event = bounded_call(self.config.call_timeout, "catalog lookup", self.catalog.get_event(event_id))
            .await?
            .ok_or(BookingError::EventNotFound(event_id))?;
        ensure_bookable(&event)?;
        let now = Utc::now();
        let mut lines = request
            .ticket_selections
            .iter()
            .map(|selection| resolve_selection(&event, selection, now))
            .collect::<Result<Vec<_>, _>>()?;
        lines.sort_by_key(|line| line.ticket_type_id);
        let new_booking = NewBooking::new(event_id, user_id, lines)
            .ok_or_else(|| BookingError::validation("ticket_selections", "The booking total is too large"))?;

        let mut log = ReservationLog::new(event_id);
        if let Err(e) = self.reserve_all(new_booking.lines(), &mut log).await {
            info!("🔄️ Booking attempt by {user_id} for event {event_id} failed. Rolling back. {e}");
            self.compensate(&mut log).await;
            return Err(e);
        }

        let booking = match self.inventory.db().insert_booking(new_booking).await {
            Ok(booking) => booking,
            Err(e) => {
                error!("🔄️ Could not store booking for {user_id} after reserving its tickets. Rolling back. {e}");
                self.compensate(&mut log).await;
                return Err(e.into());
            },
        };
        info!(
            "🔄️ Booking {} created for {user_id}: {} line(s), total {}",
            booking.id,
            booking.tickets.len(),
            booking.total_amount
        );
        self.producers.publish_booking_created(BookingCreatedEvent::new(booking.clone())).await;
        Ok(booking)
    }

    async fn reserve_all(&self, lines: &[NewTicketLine], log: &mut ReservationLog) -> Result<(), BookingError> {
        let event_id = log.event_id();
        let limit = self.config.call_timeout;
        for line in lines {
            let reserve = self.inventory.reserve(event_id, line.ticket_type_id, line.quantity);
            let remaining = match call_with_deadline(limit, reserve).await {
                Deadline::Met(result) => result?,
                Deadline::Missed(pending) => {
                    warn!(
                        "🔄️ Reserving {} x {} took longer than {}ms. Waiting for the outcome before rolling back",
                        line.quantity,
                        line.ticket_type_name,
                        limit.as_millis()
                    );
                    if pending.await.is_ok() {
                        log.record(line.ticket_type_id, line.quantity);
                    }
                    return Err(BookingError::ExternalServiceError(format!(
                        "inventory reservation timed out after {}ms",
                        limit.as_millis()
                    )));
                },
            };
            log.record(line.ticket_type_id, line.quantity);
            trace!("🔄️ Reserved {} x {}. {remaining} left", line.quantity, line.ticket_type_name);
        }
        Ok(())
    }

    /// Releases everything in the log, newest first. A failed release is logged and skipped so that the remaining
    /// entries are still returned to inventory. A slow release is waited out rather than abandoned.
    async fn compensate(&self, log: &mut ReservationLog) {
        let event_id = log.event_id();
        let count = log.len();
        for (ticket_type, quantity) in log.drain_reverse() {
            let release = self.inventory.release(event_id, ticket_type, quantity);
            let result = match call_with_deadline(self.config.call_timeout, release).await {
                Deadline::Met(result) => result,
                Deadline::Missed(pending) => {
                    warn!("🔄️ Releasing {quantity} x ticket type {ticket_type} is slow. Still waiting");
                    pending.await
                },
            };
            match result {
                Ok(available) => debug!("🔄️ Released {quantity} x ticket type {ticket_type}. {available} available"),
                Err(e) => error!(
                    "🔄️ Could not release {quantity} x ticket type {ticket_type} for event {event_id}. These tickets \
                     are stranded and must be returned by hand. {e}"
                ),
            }
        }
        if count > 0 {
            debug!("🔄️ Rolled back {count} reservation(s) for event {event_id}");
        }
    }
}

/// Fails with a conflict unless the event is published and has at least one active ticket type.
pub(crate) fn ensure_bookable(event: &Event) -> Result<(), BookingError> {
    if !event.is_published() {
        return Err(BookingError::EventNotBookable(event.id, format!("The event is {}", event.status)));
    }
    if event.active_ticket_types().next().is_none() {
        return Err(BookingError::EventNotBookable(event.id, "There are no ticket types on sale".into()));
    }
    Ok(())
}

fn resolve_selection(
    event: &Event,
    selection: &TicketSelection,
    now: DateTime<Utc>,
) -> Result<NewTicketLine, BookingError> {
    let id = selection.ticket_type;
    let ticket_type = event.ticket_type(id).ok_or(BookingError::TicketTypeNotFound(id))?;
    if !ticket_type.is_active {
        return Err(BookingError::TicketTypeUnavailable(id, format!("{} is not active", ticket_type.name)));
    }
    if !ticket_type.in_sale_window(now) {
        return Err(BookingError::TicketTypeUnavailable(id, format!("{} is outside its sale window", ticket_type.name)));
    }
    if let Some(limit) = ticket_type.per_person_limit {
        if selection.quantity > limit {
            return Err(BookingError::validation(
                "quantity",
                format!("At most {limit} {} tickets may be booked at once", ticket_type.name),
            ));
        }
    }
    NewTicketLine::new(ticket_type, selection.quantity).ok_or_else(|| {
        let message = format!("The price of {} {} tickets is too large", selection.quantity, ticket_type.name);
        BookingError::validation("quantity", message)
    })
}
