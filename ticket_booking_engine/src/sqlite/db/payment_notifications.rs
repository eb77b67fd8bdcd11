use sqlx::SqliteConnection;
use tbs_common::DEFAULT_CURRENCY_CODE;

use crate::{db_types::PaymentNotification, traits::InsertNotificationResult};

/// Appends the notification to the log. If the same `(payment_id, payment_status)` pair has been seen before, the
/// id of the existing entry is returned instead.
pub async fn idempotent_insert(
    notification: &PaymentNotification,
    conn: &mut SqliteConnection,
) -> Result<InsertNotificationResult, sqlx::Error> {
    let status = notification.payment_status.trim().to_ascii_lowercase();
    let currency = notification.currency.clone().unwrap_or_else(|| DEFAULT_CURRENCY_CODE.to_string());
    let inserted: Result<i64, sqlx::Error> = sqlx::query_scalar(
        r#"
            INSERT INTO payment_notifications (booking_id, payment_id, payment_status, transaction_id, amount, currency)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id;
        "#,
    )
    .bind(&notification.booking_id)
    .bind(&notification.payment_id)
    .bind(&status)
    .bind(&notification.transaction_id)
    .bind(notification.amount)
    .bind(currency)
    .fetch_one(&mut *conn)
    .await;
    match inserted {
        Ok(id) => Ok(InsertNotificationResult::Inserted(id)),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            let id = sqlx::query_scalar(
                "SELECT id FROM payment_notifications WHERE payment_id = $1 AND payment_status = $2",
            )
            .bind(&notification.payment_id)
            .bind(&status)
            .fetch_one(conn)
            .await?;
            Ok(InsertNotificationResult::AlreadyExists(id))
        },
        Err(e) => Err(e),
    }
}

pub async fn count_for_booking(booking_id: &str, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM payment_notifications WHERE booking_id = $1")
        .bind(booking_id)
        .fetch_one(conn)
        .await
}
