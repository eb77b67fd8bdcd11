use std::{collections::HashSet, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    booking_api::errors::BookingError,
    db_types::{EventId, TicketTypeId},
};

pub const DEFAULT_EXTERNAL_CALL_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketSelection {
    pub ticket_type: TicketTypeId,
    pub quantity: i64,
}

impl TicketSelection {
    pub fn new(ticket_type: TicketTypeId, quantity: i64) -> Self {
        Self { ticket_type, quantity }
    }
}

/// A request to book tickets for an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub event_id: EventId,
    pub ticket_selections: Vec<TicketSelection>,
}

impl BookingRequest {
    pub fn new(event_id: EventId, ticket_selections: Vec<TicketSelection>) -> Self {
        Self { event_id, ticket_selections }
    }

    /// Checks the shape of the request. This does not touch the catalog or the inventory.
    pub fn validate(&self) -> Result<(), BookingError> {
        if self.ticket_selections.is_empty() {
            return Err(BookingError::validation("ticket_selections", "At least one ticket selection is required"));
        }
        let mut seen = HashSet::with_capacity(self.ticket_selections.len());
        for selection in &self.ticket_selections {
            if selection.quantity < 1 {
                return Err(BookingError::validation(
                    "quantity",
                    format!("Quantity for ticket type {} must be at least 1", selection.ticket_type),
                ));
            }
            if !seen.insert(selection.ticket_type) {
                return Err(BookingError::validation(
                    "ticket_selections",
                    format!("Ticket type {} is selected more than once", selection.ticket_type),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketAvailability {
    pub ticket_type_id: TicketTypeId,
    pub available: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct ReservationConfig {
    /// Upper bound on every call the reservation orchestrator makes to the catalog or the inventory store.
    pub call_timeout: Duration,
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self { call_timeout: DEFAULT_EXTERNAL_CALL_TIMEOUT }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BookingFlowConfig {
    /// When true, cancelling a confirmed booking puts its tickets back on sale.
    pub release_on_confirmed_cancel: bool,
}

impl Default for BookingFlowConfig {
    fn default() -> Self {
        Self { release_on_confirmed_cancel: true }
    }
}
