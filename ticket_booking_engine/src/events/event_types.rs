use serde::{Deserialize, Serialize};

use crate::db_types::{Booking, BookingStatus};

/// A new booking was committed in the `Pending` state. Payment initiation subscribes to this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingCreatedEvent {
    pub booking: Booking,
}

impl BookingCreatedEvent {
    pub fn new(booking: Booking) -> Self {
        Self { booking }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfirmedEvent {
    pub booking: Booking,
}

impl BookingConfirmedEvent {
    pub fn new(booking: Booking) -> Self {
        Self { booking }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingCancelledEvent {
    pub booking: Booking,
    pub previous_status: BookingStatus,
    /// True if the booking's tickets were returned to inventory as part of the cancellation.
    pub inventory_released: bool,
}

impl BookingCancelledEvent {
    pub fn new(booking: Booking, previous_status: BookingStatus, inventory_released: bool) -> Self {
        Self { booking, previous_status, inventory_released }
    }
}
