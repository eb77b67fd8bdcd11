use thiserror::Error;

use crate::db_types::TicketTypeId;

#[derive(Debug, Clone, Error)]
pub enum InventoryError {
    #[error("Quantity must be a positive number. Got {0}")]
    InvalidQuantity(i64),
    #[error("Ticket type {0} does not exist")]
    TicketTypeNotFound(TicketTypeId),
    #[error("Insufficient inventory for ticket type {ticket_type}. Requested {requested}, but only {available} left")]
    InsufficientInventory { ticket_type: TicketTypeId, requested: i64, available: i64 },
    #[error("Cannot release {requested} tickets of type {ticket_type}: only {sold} are sold")]
    ReleaseUnderflow { ticket_type: TicketTypeId, requested: i64, sold: i64 },
    #[error("Inventory database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for InventoryError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

/// The authoritative inventory store.
///
/// Implementations must make `reserve` linearizable per ticket type: the capacity check and the increment happen in
/// one atomic step, so concurrent callers can never jointly sell more than `quantity_total`.
#[allow(async_fn_in_trait)]
pub trait InventoryManagement {
    /// Atomically increments `quantity_sold` by `quantity`, but only if the result stays within `quantity_total`.
    /// Returns the number of tickets still available after the reservation.
    async fn reserve(&self, ticket_type: TicketTypeId, quantity: i64) -> Result<i64, InventoryError>;

    /// Decrements `quantity_sold` by `quantity`. Releasing more than has been sold is a defect and is refused
    /// without modifying the counter. Returns the number of tickets available after the release.
    async fn release(&self, ticket_type: TicketTypeId, quantity: i64) -> Result<i64, InventoryError>;

    /// `quantity_total - quantity_sold` for the ticket type.
    async fn available(&self, ticket_type: TicketTypeId) -> Result<i64, InventoryError>;
}
