use std::{fmt::Debug, time::Duration};

use log::*;

use crate::{
    booking_api::{
        booking_objects::{TicketAvailability, DEFAULT_EXTERNAL_CALL_TIMEOUT},
        errors::BookingError,
        inventory_api::InventoryApi,
        reservation_api::ensure_bookable,
    },
    db_types::EventId,
    helpers::bounded_call,
    traits::{CatalogClient, InventoryManagement},
};

/// Read-only availability queries for display. Every count returned here may be up to one cache TTL out of date.
#[derive(Clone)]
pub struct AvailabilityApi<C, B> {
    catalog: C,
    inventory: InventoryApi<B>,
    call_timeout: Duration,
}

impl<C, B> Debug for AvailabilityApi<C, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AvailabilityApi")
    }
}

impl<C, B> AvailabilityApi<C, B> {
    pub fn new(catalog: C, inventory: InventoryApi<B>) -> Self {
        Self { catalog, inventory, call_timeout: DEFAULT_EXTERNAL_CALL_TIMEOUT }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }
}

impl<C, B> AvailabilityApi<C, B>
where
    C: CatalogClient,
    B: InventoryManagement,
{
    /// Lists the number of tickets left for every active ticket type of a bookable event.
    pub async fn availability(&self, event_id: EventId) -> Result<Vec<TicketAvailability>, BookingError> {
        let event = bounded_call(self.call_timeout, "catalog lookup", self.catalog.get_event(event_id))
            .await?
            .ok_or(BookingError::EventNotFound(event_id))?;
        ensure_bookable(&event)?;
        let mut result = Vec::with_capacity(event.ticket_types.len());
        for ticket_type in event.active_ticket_types() {
            let available = bounded_call(
                self.call_timeout,
                "availability read",
                self.inventory.available(event_id, ticket_type.id),
            )
            .await?;
            result.push(TicketAvailability { ticket_type_id: ticket_type.id, available });
        }
        trace!("📦️ Availability for event {event_id}: {result:?}");
        Ok(result)
    }
}
