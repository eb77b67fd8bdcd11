use chrono::Duration;
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{Booking, BookingId, BookingStatus, Money, NewBooking, NewTicketLine, TicketLine, TicketTypeId},
    traits::BookingStoreError,
};

/// Inserts the booking row in the `pending` state. This is not atomic on its own; embed it in a transaction along
/// with the line items (see [`insert_ticket_line`]) and pass `&mut *tx` as the connection.
pub async fn insert_booking(booking: &NewBooking, conn: &mut SqliteConnection) -> Result<Booking, BookingStoreError> {
    let result = sqlx::query_as(
        r#"
            INSERT INTO bookings (id, event_id, user_id, status, total_amount)
            VALUES ($1, $2, $3, 'pending', $4)
            RETURNING *;
        "#,
    )
    .bind(&booking.id)
    .bind(booking.event_id)
    .bind(&booking.user_id)
    .bind(booking.total_amount())
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => {
            BookingStoreError::BookingAlreadyExists(booking.id.clone())
        },
        _ => BookingStoreError::from(e),
    })?;
    Ok(result)
}

pub async fn insert_ticket_line(
    booking_id: &BookingId,
    line: &NewTicketLine,
    conn: &mut SqliteConnection,
) -> Result<TicketLine, BookingStoreError> {
    let line = sqlx::query_as(
        r#"
            INSERT INTO tickets (booking_id, ticket_type_id, ticket_type_name, quantity, unit_price, subtotal)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(booking_id)
    .bind(line.ticket_type_id)
    .bind(&line.ticket_type_name)
    .bind(line.quantity)
    .bind(line.unit_price)
    .bind(line.subtotal())
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Line item {line:?} stored for booking {booking_id}");
    Ok(line)
}

/// The sum of the persisted line item subtotals for the booking.
pub async fn sum_of_subtotals(booking_id: &BookingId, conn: &mut SqliteConnection) -> Result<Money, sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(subtotal), 0) FROM tickets WHERE booking_id = $1")
        .bind(booking_id)
        .fetch_one(conn)
        .await?;
    Ok(Money::from_cents(total))
}

pub async fn fetch_booking(id: &BookingId, conn: &mut SqliteConnection) -> Result<Option<Booking>, sqlx::Error> {
    let booking: Option<Booking> =
        sqlx::query_as("SELECT * FROM bookings WHERE id = $1").bind(id).fetch_optional(&mut *conn).await?;
    match booking {
        Some(booking) => {
            let tickets = fetch_tickets_for_booking(id, conn).await?;
            Ok(Some(booking.with_tickets(tickets)))
        },
        None => Ok(None),
    }
}

pub async fn fetch_tickets_for_booking(
    id: &BookingId,
    conn: &mut SqliteConnection,
) -> Result<Vec<TicketLine>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM tickets WHERE booking_id = $1 ORDER BY ticket_type_id").bind(id).fetch_all(conn).await
}

pub async fn fetch_bookings_for_user(user_id: &str, conn: &mut SqliteConnection) -> Result<Vec<Booking>, sqlx::Error> {
    let bookings: Vec<Booking> =
        sqlx::query_as("SELECT * FROM bookings WHERE user_id = $1 ORDER BY created_at DESC, rowid DESC")
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await?;
    let mut result = Vec::with_capacity(bookings.len());
    for booking in bookings {
        let tickets = fetch_tickets_for_booking(&booking.id, conn).await?;
        result.push(booking.with_tickets(tickets));
    }
    Ok(result)
}

/// Compare-and-set on the booking status. Only one of any number of concurrent callers can move a booking out of
/// `from`; everyone else gets `None`.
pub async fn update_status(
    id: &BookingId,
    from: BookingStatus,
    to: BookingStatus,
    tickets_owed: bool,
    conn: &mut SqliteConnection,
) -> Result<Option<Booking>, sqlx::Error> {
    let booking: Option<Booking> = sqlx::query_as(
        r#"
            UPDATE bookings SET status = $1, tickets_owed = $4, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status = $3
            RETURNING *;
        "#,
    )
    .bind(to)
    .bind(id)
    .bind(from)
    .bind(tickets_owed)
    .fetch_optional(&mut *conn)
    .await?;
    match booking {
        Some(booking) => {
            debug!("🗃️ Booking {id} moved from {from} to {to}");
            let tickets = fetch_tickets_for_booking(id, conn).await?;
            Ok(Some(booking.with_tickets(tickets)))
        },
        None => Ok(None),
    }
}

pub async fn fetch_stale_pending_bookings(
    older_than: Duration,
    conn: &mut SqliteConnection,
) -> Result<Vec<Booking>, sqlx::Error> {
    let bookings: Vec<Booking> = sqlx::query_as(
        r#"
            SELECT * FROM bookings
            WHERE status = 'pending' AND (unixepoch(CURRENT_TIMESTAMP) - unixepoch(updated_at)) > $1
            ORDER BY created_at;
        "#,
    )
    .bind(older_than.num_seconds())
    .fetch_all(&mut *conn)
    .await?;
    let mut result = Vec::with_capacity(bookings.len());
    for booking in bookings {
        let tickets = fetch_tickets_for_booking(&booking.id, conn).await?;
        result.push(booking.with_tickets(tickets));
    }
    Ok(result)
}

/// Records that a line item is being returned to inventory. The insert only happens for a cancelled booking with
/// tickets owed, and the primary key on `ticket_returns` lets it happen once per line.
pub async fn claim_ticket_return(
    id: &BookingId,
    ticket_type: TicketTypeId,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            INSERT OR IGNORE INTO ticket_returns (booking_id, ticket_type_id)
            SELECT t.booking_id, t.ticket_type_id FROM tickets t JOIN bookings b ON b.id = t.booking_id
            WHERE t.booking_id = $1 AND t.ticket_type_id = $2 AND b.status = 'cancelled' AND b.tickets_owed = 1;
        "#,
    )
    .bind(id)
    .bind(ticket_type)
    .execute(conn)
    .await?;
    let claimed = result.rows_affected() == 1;
    trace!("🗃️ Return of ticket type {ticket_type} for booking {id} claimed: {claimed}");
    Ok(claimed)
}

pub async fn revoke_ticket_return(
    id: &BookingId,
    ticket_type: TicketTypeId,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM ticket_returns WHERE booking_id = $1 AND ticket_type_id = $2")
        .bind(id)
        .bind(ticket_type)
        .execute(conn)
        .await?;
    debug!("🗃️ Return of ticket type {ticket_type} for booking {id} withdrawn");
    Ok(())
}

pub async fn fetch_bookings_awaiting_return(conn: &mut SqliteConnection) -> Result<Vec<Booking>, sqlx::Error> {
    let bookings: Vec<Booking> = sqlx::query_as(
        r#"
            SELECT b.* FROM bookings b
            WHERE b.status = 'cancelled' AND b.tickets_owed = 1 AND EXISTS (
                SELECT 1 FROM tickets t
                WHERE t.booking_id = b.id AND NOT EXISTS (
                    SELECT 1 FROM ticket_returns r
                    WHERE r.booking_id = t.booking_id AND r.ticket_type_id = t.ticket_type_id
                )
            )
            ORDER BY b.updated_at;
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;
    let mut result = Vec::with_capacity(bookings.len());
    for booking in bookings {
        let tickets = fetch_tickets_for_booking(&booking.id, conn).await?;
        result.push(booking.with_tickets(tickets));
    }
    Ok(result)
}
