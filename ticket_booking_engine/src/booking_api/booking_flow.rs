//! The booking lifecycle.
//!
//! ```text
//!              PaymentSucceeded
//!   Pending ─────────────────────▶ Confirmed
//!      │                               │
//!      │ PaymentFailed / Expired       │ CancellationRequested
//!      │ CancellationRequested         │
//!      ▼                               ▼
//!   Cancelled ◀────────────────────────┘
//! ```
//!
//! `Cancelled` has no outgoing transitions. Re-applying a trigger whose target state the booking is already in is a
//! no-op. Every other combination is a conflict: for example, a late payment failure never undoes a confirmation, and
//! a successful payment never revives a cancelled booking.
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::BookingStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingTrigger {
    /// The payment collaborator reported a successful payment.
    PaymentSucceeded,
    /// The payment collaborator reported a failed, declined, cancelled or expired payment.
    PaymentFailed,
    /// The booking sat in `Pending` for longer than the unpaid-booking timeout.
    Expired,
    /// The booking's owner (or an operator) asked for the booking to be cancelled or refunded.
    CancellationRequested,
}

impl Display for BookingTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PaymentSucceeded => write!(f, "payment succeeded"),
            Self::PaymentFailed => write!(f, "payment failed"),
            Self::Expired => write!(f, "expiry"),
            Self::CancellationRequested => write!(f, "cancellation"),
        }
    }
}

impl BookingTrigger {
    /// The state this trigger drives a booking towards.
    pub fn target(&self) -> BookingStatus {
        match self {
            Self::PaymentSucceeded => BookingStatus::Confirmed,
            Self::PaymentFailed | Self::Expired | Self::CancellationRequested => BookingStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Move the booking from the first state to the second.
    Apply(BookingStatus, BookingStatus),
    /// The booking is already where the trigger would take it.
    NoOp(BookingStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionConflict {
    pub status: BookingStatus,
    pub trigger: BookingTrigger,
}

/// Decides what `trigger` does to a booking that is currently `status`.
pub fn next_transition(status: BookingStatus, trigger: BookingTrigger) -> Result<Transition, TransitionConflict> {
    use BookingStatus::*;
    use BookingTrigger::*;
    match (status, trigger) {
        (Pending, PaymentSucceeded) => Ok(Transition::Apply(Pending, Confirmed)),
        (Pending, PaymentFailed | Expired | CancellationRequested) => Ok(Transition::Apply(Pending, Cancelled)),
        (Confirmed, CancellationRequested) => Ok(Transition::Apply(Confirmed, Cancelled)),
        (Confirmed, PaymentSucceeded) => Ok(Transition::NoOp(Confirmed)),
        (Cancelled, PaymentFailed | Expired | CancellationRequested) => Ok(Transition::NoOp(Cancelled)),
        (Confirmed, PaymentFailed | Expired) | (Cancelled, PaymentSucceeded) => {
            Err(TransitionConflict { status, trigger })
        },
    }
}

/// Cancelling a pending booking always returns its tickets. Whether a confirmed booking's tickets go back on sale
/// is a policy decision passed in by the caller.
pub fn releases_inventory(from: BookingStatus, to: BookingStatus, release_on_confirmed_cancel: bool) -> bool {
    match (from, to) {
        (BookingStatus::Pending, BookingStatus::Cancelled) => true,
        (BookingStatus::Confirmed, BookingStatus::Cancelled) => release_on_confirmed_cancel,
        _ => false,
    }
}
