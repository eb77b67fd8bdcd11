use thiserror::Error;

use crate::{
    booking_api::booking_flow::BookingTrigger,
    db_types::{BookingId, BookingStatus, EventId, TicketTypeId},
    traits::{BookingStoreError, CatalogError, InventoryError},
};

/// Broad error categories. The HTTP layer maps these onto status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    InsufficientInventory,
    ExternalService,
    Internal,
}

#[derive(Debug, Clone, Error)]
pub enum BookingError {
    #[error("Invalid {field}. {message}")]
    ValidationError { field: String, message: String },
    #[error("Event {0} does not exist")]
    EventNotFound(EventId),
    #[error("Ticket type {0} does not exist for this event")]
    TicketTypeNotFound(TicketTypeId),
    #[error("Booking {0} does not exist")]
    BookingNotFound(BookingId),
    #[error("Event {0} is not available for booking. {1}")]
    EventNotBookable(EventId, String),
    #[error("Ticket type {0} is not on sale. {1}")]
    TicketTypeUnavailable(TicketTypeId, String),
    #[error("Booking {id} is {status} and cannot accept a {trigger} transition")]
    InvalidTransition { id: BookingId, status: BookingStatus, trigger: BookingTrigger },
    #[error("Insufficient inventory for ticket type {ticket_type}. Requested {requested}, but only {available} left")]
    InsufficientInventory { ticket_type: TicketTypeId, requested: i64, available: i64 },
    #[error("External service error. {0}")]
    ExternalServiceError(String),
    #[error("Data integrity violation. {0}")]
    IntegrityError(String),
    #[error("Database error. {0}")]
    DatabaseError(String),
}

impl BookingError {
    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::ValidationError { field: field.into(), message: message.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ValidationError { .. } => ErrorKind::Validation,
            Self::EventNotFound(_) | Self::TicketTypeNotFound(_) | Self::BookingNotFound(_) => ErrorKind::NotFound,
            Self::EventNotBookable(..) | Self::TicketTypeUnavailable(..) | Self::InvalidTransition { .. } => {
                ErrorKind::Conflict
            },
            Self::InsufficientInventory { .. } => ErrorKind::InsufficientInventory,
            Self::ExternalServiceError(_) => ErrorKind::ExternalService,
            Self::IntegrityError(_) | Self::DatabaseError(_) => ErrorKind::Internal,
        }
    }
}

impl From<InventoryError> for BookingError {
    fn from(e: InventoryError) -> Self {
        match e {
            InventoryError::InvalidQuantity(_) => Self::validation("quantity", e.to_string()),
            InventoryError::TicketTypeNotFound(id) => Self::TicketTypeNotFound(id),
            InventoryError::InsufficientInventory { ticket_type, requested, available } => {
                Self::InsufficientInventory { ticket_type, requested, available }
            },
            InventoryError::ReleaseUnderflow { .. } => Self::IntegrityError(e.to_string()),
            InventoryError::DatabaseError(s) => Self::DatabaseError(s),
        }
    }
}

impl From<CatalogError> for BookingError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Unavailable(_) | CatalogError::InvalidResponse(_) => {
                Self::ExternalServiceError(e.to_string())
            },
            CatalogError::DatabaseError(s) => Self::DatabaseError(s),
        }
    }
}

impl From<BookingStoreError> for BookingError {
    fn from(e: BookingStoreError) -> Self {
        match e {
            BookingStoreError::BookingAlreadyExists(_) | BookingStoreError::TotalMismatch { .. } => {
                Self::IntegrityError(e.to_string())
            },
            BookingStoreError::EmptyBooking => Self::validation("ticket_selections", e.to_string()),
            BookingStoreError::DatabaseError(s) => Self::DatabaseError(s),
        }
    }
}
