use chrono::Duration;
use log::*;
use ticket_booking_engine::{db_types::Booking, BookingFlowApi, SqliteDatabase};
use tokio::task::JoinHandle;

const EXPIRY_CHECK_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

/// Starts the expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Once a minute, every pending booking older than `unpaid_expiry` is cancelled and its tickets go back on sale. The
/// same pass retries returning tickets for any cancellation whose release failed earlier.
pub fn start_expiry_worker(api: BookingFlowApi<SqliteDatabase>, unpaid_expiry: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(EXPIRY_CHECK_INTERVAL);
        info!("🕰️ Unpaid booking expiry worker started");
        loop {
            timer.tick().await;
            trace!("🕰️ Running unpaid booking expiry job");
            match api.expire_stale_bookings(unpaid_expiry).await {
                Ok(expired) if expired.is_empty() => {},
                Ok(expired) => {
                    info!("🕰️ {} bookings expired", expired.len());
                    debug!("🕰️ Expired bookings: {}", booking_list(&expired));
                },
                Err(e) => {
                    error!("🕰️ Error running unpaid booking expiry job: {e}");
                },
            }
            match api.return_owed_tickets().await {
                Ok(returned) if returned.is_empty() => {},
                Ok(returned) => info!("🕰️ Returned owed tickets for {}", booking_list(&returned)),
                Err(e) => error!("🕰️ Error returning owed tickets to inventory: {e}"),
            }
        }
    })
}

fn booking_list(bookings: &[Booking]) -> String {
    bookings
        .iter()
        .map(|b| format!("[{}] user: {} total: {}", b.id, b.user_id, b.total_amount))
        .collect::<Vec<String>>()
        .join(", ")
}
