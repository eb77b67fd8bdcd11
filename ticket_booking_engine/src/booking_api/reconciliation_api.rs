use std::fmt::Debug;

use log::*;

use crate::{
    booking_api::{
        booking_flow_api::{BookingFlowApi, TransitionOutcome},
        errors::BookingError,
        payment_objects::{PaymentOutcome, ReconciliationOutcome},
    },
    db_types::PaymentNotification,
    traits::{BookingManagement, InventoryManagement},
};

/// `PaymentReconciliationApi` applies payment notifications from the payment collaborator to bookings.
///
/// Notifications can arrive more than once and out of order. Every notification is appended to the notification log
/// (re-deliveries are detected there), and the booking status is only changed through [`BookingFlowApi`], whose
/// compare-and-set guarantees that replays never release inventory twice.
#[derive(Clone)]
pub struct PaymentReconciliationApi<B> {
    flow: BookingFlowApi<B>,
}

impl<B> Debug for PaymentReconciliationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentReconciliationApi")
    }
}

impl<B> PaymentReconciliationApi<B> {
    pub fn new(flow: BookingFlowApi<B>) -> Self {
        Self { flow }
    }

    pub fn flow(&self) -> &BookingFlowApi<B> {
        &self.flow
    }
}

impl<B> PaymentReconciliationApi<B>
where B: BookingManagement + InventoryManagement
{
    pub async fn process_payment_notification(
        &self,
        notification: PaymentNotification,
    ) -> Result<ReconciliationOutcome, BookingError> {
        let outcome = PaymentOutcome::from_vendor_status(&notification.payment_status).ok_or_else(|| {
            BookingError::validation(
                "payment_status",
                format!("'{}' is not a recognised payment status", notification.payment_status),
            )
        })?;
        if notification.payment_id.trim().is_empty() {
            return Err(BookingError::validation("payment_id", "A payment id is required"));
        }
        let id = &notification.booking_id;
        let booking = self.flow.fetch_booking(id).await?;
        let recorded = self.flow.db().record_payment_notification(&notification).await?;
        if recorded.is_duplicate() {
            info!(
                "🔄️💰️ Payment {} ({}) for booking {id} has been seen before. Checking the booking state anyway",
                notification.payment_id, notification.payment_status
            );
        }
        if let Some(amount) = notification.amount {
            if amount != booking.total_amount {
                warn!(
                    "🔄️💰️ Payment {} for booking {id} is for {amount}, but the booking total is {}",
                    notification.payment_id, booking.total_amount
                );
            }
        }
        let Some(trigger) = outcome.trigger() else {
            debug!("🔄️💰️ Payment {} for booking {id} is still in progress", notification.payment_id);
            return Ok(ReconciliationOutcome::Acknowledged(booking));
        };
        let result = match self.flow.apply_trigger(id, trigger).await? {
            TransitionOutcome::Applied { from, to, booking, .. } => {
                ReconciliationOutcome::Applied { from, to, booking }
            },
            TransitionOutcome::Unchanged(booking) => ReconciliationOutcome::Unchanged(booking),
        };
        Ok(result)
    }
}
