use serde::{Deserialize, Serialize};

use crate::{booking_api::booking_flow::BookingTrigger, db_types::{Booking, BookingStatus}};

/// What a vendor payment status means for the booking it refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentOutcome {
    /// The payment went through. Confirm the booking.
    Confirm,
    /// The payment will never go through. Cancel the booking.
    Cancel,
    /// The payment is still in flight. Record it and leave the booking alone.
    Acknowledge,
}

/// Vendor status strings and their outcomes. Anything not listed here is rejected.
const VENDOR_STATUS_MAP: [(&str, PaymentOutcome); 10] = [
    ("completed", PaymentOutcome::Confirm),
    ("successful", PaymentOutcome::Confirm),
    ("paid", PaymentOutcome::Confirm),
    ("confirmed", PaymentOutcome::Confirm),
    ("failed", PaymentOutcome::Cancel),
    ("cancelled", PaymentOutcome::Cancel),
    ("expired", PaymentOutcome::Cancel),
    ("declined", PaymentOutcome::Cancel),
    ("pending", PaymentOutcome::Acknowledge),
    ("processing", PaymentOutcome::Acknowledge),
];

impl PaymentOutcome {
    /// Maps a vendor status onto an outcome. Matching ignores case and surrounding whitespace.
    pub fn from_vendor_status(status: &str) -> Option<Self> {
        let status = status.trim().to_ascii_lowercase();
        VENDOR_STATUS_MAP.iter().find(|(s, _)| *s == status).map(|(_, outcome)| *outcome)
    }

    /// The lifecycle trigger this outcome fires, if any.
    pub fn trigger(&self) -> Option<BookingTrigger> {
        match self {
            Self::Confirm => Some(BookingTrigger::PaymentSucceeded),
            Self::Cancel => Some(BookingTrigger::PaymentFailed),
            Self::Acknowledge => None,
        }
    }
}

/// The result of processing a payment notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationOutcome {
    /// The booking moved from one state to another as a result of this notification.
    Applied { from: BookingStatus, to: BookingStatus, booking: Booking },
    /// The booking was already in the state the notification asks for. Nothing changed.
    Unchanged(Booking),
    /// The payment is still in progress. The notification was recorded, but the booking did not change.
    Acknowledged(Booking),
}

impl ReconciliationOutcome {
    pub fn booking(&self) -> &Booking {
        match self {
            Self::Applied { booking, .. } | Self::Unchanged(booking) | Self::Acknowledged(booking) => booking,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}
