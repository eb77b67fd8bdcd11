use std::fmt::Debug;

use log::*;

use crate::{
    booking_api::{
        booking_flow::{next_transition, releases_inventory, BookingTrigger, Transition},
        booking_objects::BookingFlowConfig,
        errors::BookingError,
        inventory_api::InventoryApi,
    },
    db_types::{Booking, BookingId, BookingStatus},
    events::{BookingCancelledEvent, BookingConfirmedEvent, EventProducers},
    traits::{BookingManagement, InventoryError, InventoryManagement},
};

/// A booking can change state at most twice, so a caller that keeps losing the compare-and-set race this many times
/// is looking at a corrupted row.
const MAX_TRANSITION_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// This call moved the booking from `from` to `to`.
    Applied { from: BookingStatus, to: BookingStatus, booking: Booking, inventory_released: bool },
    /// The booking was already in the target state.
    Unchanged(Booking),
}

impl TransitionOutcome {
    pub fn booking(&self) -> &Booking {
        match self {
            Self::Applied { booking, .. } | Self::Unchanged(booking) => booking,
        }
    }
}

/// `BookingFlowApi` moves bookings through their lifecycle.
///
/// Status changes are persisted with a compare-and-set, so when two deliveries race for the same booking exactly one
/// of them makes the change. A cancellation that puts tickets back on sale marks them as owed in that same write.
/// Each line item is then returned under a per-line claim, so it goes back to inventory exactly once even if the
/// release has to be retried by a replayed notification or by [`return_owed_tickets`](Self::return_owed_tickets).
#[derive(Clone)]
pub struct BookingFlowApi<B> {
    inventory: InventoryApi<B>,
    config: BookingFlowConfig,
    producers: EventProducers,
}

impl<B> Debug for BookingFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BookingFlowApi ({:?})", self.config)
    }
}

impl<B> BookingFlowApi<B> {
    pub fn new(inventory: InventoryApi<B>, config: BookingFlowConfig, producers: EventProducers) -> Self {
        Self { inventory, config, producers }
    }

    pub fn db(&self) -> &B {
        self.inventory.db()
    }

    pub fn config(&self) -> &BookingFlowConfig {
        &self.config
    }
}

impl<B> BookingFlowApi<B>
where B: BookingManagement + InventoryManagement
{
    pub async fn fetch_booking(&self, id: &BookingId) -> Result<Booking, BookingError> {
        self.db().fetch_booking(id).await?.ok_or_else(|| BookingError::BookingNotFound(id.clone()))
    }

    /// Fetches a booking on behalf of a user. Bookings belonging to someone else are reported as missing.
    pub async fn fetch_booking_for_user(&self, id: &BookingId, user_id: &str) -> Result<Booking, BookingError> {
        let booking = self.fetch_booking(id).await?;
        if !booking.is_owned_by(user_id) {
            debug!("🔄️ {user_id} asked for booking {id}, which belongs to someone else");
            return Err(BookingError::BookingNotFound(id.clone()));
        }
        Ok(booking)
    }

    pub async fn bookings_for_user(&self, user_id: &str) -> Result<Vec<Booking>, BookingError> {
        let bookings = self.db().fetch_bookings_for_user(user_id).await?;
        Ok(bookings)
    }

    /// Cancels a booking at the request of its owner.
    pub async fn cancel_booking(&self, id: &BookingId, user_id: &str) -> Result<TransitionOutcome, BookingError> {
        self.fetch_booking_for_user(id, user_id).await?;
        self.apply_trigger(id, BookingTrigger::CancellationRequested).await
    }

    /// Applies `trigger` to the booking.
    ///
    /// * If the booking is already where the trigger would take it, `Unchanged` is returned. A cancelled booking whose
    ///   tickets are still owed to inventory gets them returned first.
    /// * If the trigger is not allowed from the booking's current state, an `InvalidTransition` error is returned.
    /// * Otherwise the new state is persisted, tickets are returned to inventory if the transition calls for it, and
    ///   the matching lifecycle event is published.
    ///
    /// If tickets cannot be returned because the store is failing, the error is returned even though the status
    /// change itself was saved. Repeating the call retries the release.
    pub async fn apply_trigger(
        &self,
        id: &BookingId,
        trigger: BookingTrigger,
    ) -> Result<TransitionOutcome, BookingError> {
        let mut booking = self.fetch_booking(id).await?;
        for _ in 0..MAX_TRANSITION_ATTEMPTS {
            let (from, to) = match next_transition(booking.status, trigger) {
                Ok(Transition::Apply(from, to)) => (from, to),
                Ok(Transition::NoOp(status)) => {
                    debug!("🔄️ Booking {id} is already {status}. Ignoring {trigger}");
                    if status == BookingStatus::Cancelled {
                        self.return_tickets(&booking).await?;
                    }
                    return Ok(TransitionOutcome::Unchanged(booking));
                },
                Err(conflict) => {
                    warn!("🔄️ Booking {id} is {} and cannot accept a {trigger} transition", conflict.status);
                    return Err(BookingError::InvalidTransition { id: id.clone(), status: conflict.status, trigger });
                },
            };
            let tickets_owed = releases_inventory(from, to, self.config.release_on_confirmed_cancel);
            match self.db().update_booking_status(id, from, to, tickets_owed).await? {
                Some(updated) => return self.on_transition(from, to, tickets_owed, updated).await,
                None => {
                    debug!("🔄️ Booking {id} changed state while applying {trigger}. Re-evaluating");
                    booking = self.fetch_booking(id).await?;
                },
            }
        }
        error!("🔄️ Gave up applying {trigger} to booking {id} after {MAX_TRANSITION_ATTEMPTS} attempts");
        Err(BookingError::IntegrityError(format!("The status of booking {id} keeps changing")))
    }

    /// Cancels every `Pending` booking that has not been paid within `older_than`, returning the bookings that were
    /// cancelled by this call.
    pub async fn expire_stale_bookings(&self, older_than: chrono::Duration) -> Result<Vec<Booking>, BookingError> {
        let stale = self.db().fetch_stale_pending_bookings(older_than).await?;
        if stale.is_empty() {
            return Ok(Vec::new());
        }
        debug!("🔄️ {} unpaid booking(s) are older than {} minutes", stale.len(), older_than.num_minutes());
        let mut expired = Vec::with_capacity(stale.len());
        for booking in stale {
            match self.apply_trigger(&booking.id, BookingTrigger::Expired).await {
                Ok(TransitionOutcome::Applied { booking, .. }) => expired.push(booking),
                Ok(TransitionOutcome::Unchanged(_)) => {},
                // Most likely paid between the query and the update
                Err(BookingError::InvalidTransition { .. }) => {},
                Err(e) => warn!("🔄️ Could not expire booking {}. {e}", booking.id),
            }
        }
        info!("🔄️ Expired {} unpaid booking(s)", expired.len());
        Ok(expired)
    }

    /// Retries the release of tickets owed by cancelled bookings, typically after the store failed part way through
    /// a cancellation. Returns the bookings that had tickets returned by this call.
    pub async fn return_owed_tickets(&self) -> Result<Vec<Booking>, BookingError> {
        let owed = self.db().fetch_bookings_awaiting_return().await?;
        let mut settled = Vec::with_capacity(owed.len());
        for booking in owed {
            match self.return_tickets(&booking).await {
                Ok(0) => {},
                Ok(n) => {
                    info!("🔄️ Returned {n} line item(s) of cancelled booking {} to inventory", booking.id);
                    settled.push(booking);
                },
                Err(e) => warn!("🔄️ Tickets for cancelled booking {} are still owed to inventory. {e}", booking.id),
            }
        }
        Ok(settled)
    }

    async fn on_transition(
        &self,
        from: BookingStatus,
        to: BookingStatus,
        tickets_owed: bool,
        booking: Booking,
    ) -> Result<TransitionOutcome, BookingError> {
        info!("🔄️ Booking {} moved from {from} to {to}", booking.id);
        let returned = if tickets_owed { self.return_tickets(&booking).await } else { Ok(0) };
        let inventory_released = matches!(returned, Ok(n) if n == booking.tickets.len() && n > 0);
        match to {
            BookingStatus::Confirmed => {
                self.producers.publish_booking_confirmed(BookingConfirmedEvent::new(booking.clone())).await;
            },
            BookingStatus::Cancelled => {
                let event = BookingCancelledEvent::new(booking.clone(), from, inventory_released);
                self.producers.publish_booking_cancelled(event).await;
            },
            BookingStatus::Pending => {},
        }
        returned?;
        Ok(TransitionOutcome::Applied { from, to, booking, inventory_released })
    }

    /// Returns the booking's line items to inventory. Each line is claimed before it is released, so lines that were
    /// already returned, or that another caller is returning right now, are skipped.
    ///
    /// When the store fails, the claim is withdrawn so the line can be retried, the remaining lines are still
    /// attempted, and the first failure is returned. A release that the store refuses outright (more tickets than
    /// were sold) cannot succeed on a retry, so it is logged and the claim stands.
    ///
    /// Returns the number of lines returned by this call.
    async fn return_tickets(&self, booking: &Booking) -> Result<usize, BookingError> {
        let mut returned = 0;
        let mut failure = None;
        for line in &booking.tickets {
            if !self.db().claim_ticket_return(&booking.id, line.ticket_type_id).await? {
                trace!("🔄️ {} from booking {} is not owed to inventory", line.ticket_type_name, booking.id);
                continue;
            }
            match self.inventory.release(booking.event_id, line.ticket_type_id, line.quantity).await {
                Ok(available) => {
                    returned += 1;
                    debug!(
                        "🔄️ Returned {} x {} from booking {}. {available} available",
                        line.quantity, line.ticket_type_name, booking.id
                    );
                },
                Err(InventoryError::DatabaseError(e)) => {
                    error!(
                        "🔄️ Could not return {} x ticket type {} from booking {} to inventory. Will retry. {e}",
                        line.quantity, line.ticket_type_id, booking.id
                    );
                    if let Err(revoke) = self.db().revoke_ticket_return(&booking.id, line.ticket_type_id).await {
                        error!(
                            "🔄️ Return of ticket type {} for booking {} is stuck and must be fixed by hand. {revoke}",
                            line.ticket_type_id, booking.id
                        );
                    }
                    failure.get_or_insert(BookingError::DatabaseError(e));
                },
                Err(e) => error!(
                    "🔄️ Inventory refused the return of {} x ticket type {} from booking {}. {e}",
                    line.quantity, line.ticket_type_id, booking.id
                ),
            }
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(returned),
        }
    }
}
