use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{EventId, NewTicketType, TicketType, TicketTypeId},
    traits::InventoryError,
};

pub async fn insert_ticket_type(
    ticket_type: NewTicketType,
    conn: &mut SqliteConnection,
) -> Result<TicketType, sqlx::Error> {
    let ticket_type = sqlx::query_as(
        r#"
            INSERT INTO ticket_types (
                event_id,
                name,
                description,
                price,
                quantity_total,
                quantity_sold,
                is_active,
                sales_start,
                sales_end,
                per_person_limit
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *;
        "#,
    )
    .bind(ticket_type.event_id)
    .bind(ticket_type.name)
    .bind(ticket_type.description)
    .bind(ticket_type.price)
    .bind(ticket_type.quantity_total)
    .bind(ticket_type.quantity_sold)
    .bind(ticket_type.is_active)
    .bind(ticket_type.sales_start)
    .bind(ticket_type.sales_end)
    .bind(ticket_type.per_person_limit)
    .fetch_one(conn)
    .await?;
    Ok(ticket_type)
}

pub async fn fetch_ticket_type(
    id: TicketTypeId,
    conn: &mut SqliteConnection,
) -> Result<Option<TicketType>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM ticket_types WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_ticket_types_for_event(
    event_id: EventId,
    conn: &mut SqliteConnection,
) -> Result<Vec<TicketType>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM ticket_types WHERE event_id = $1 ORDER BY id").bind(event_id).fetch_all(conn).await
}

/// Reserves `quantity` tickets in a single conditional UPDATE. The capacity check lives in the WHERE clause, so there
/// is no window between reading the counter and writing it.
pub async fn reserve(id: TicketTypeId, quantity: i64, conn: &mut SqliteConnection) -> Result<i64, InventoryError> {
    if quantity <= 0 {
        return Err(InventoryError::InvalidQuantity(quantity));
    }
    let remaining: Option<i64> = sqlx::query_scalar(
        r#"
            UPDATE ticket_types SET quantity_sold = quantity_sold + $1
            WHERE id = $2 AND quantity_sold + $1 <= quantity_total
            RETURNING quantity_total - quantity_sold;
        "#,
    )
    .bind(quantity)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    match remaining {
        Some(remaining) => {
            trace!("🗃️ Reserved {quantity} of ticket type {id}. {remaining} remaining");
            Ok(remaining)
        },
        None => match fetch_ticket_type(id, conn).await? {
            Some(tt) => Err(InventoryError::InsufficientInventory {
                ticket_type: id,
                requested: quantity,
                available: tt.available(),
            }),
            None => Err(InventoryError::TicketTypeNotFound(id)),
        },
    }
}

/// Returns `quantity` tickets to the pool. Refuses, without touching the counter, to drive `quantity_sold` negative.
pub async fn release(id: TicketTypeId, quantity: i64, conn: &mut SqliteConnection) -> Result<i64, InventoryError> {
    if quantity <= 0 {
        return Err(InventoryError::InvalidQuantity(quantity));
    }
    let available: Option<i64> = sqlx::query_scalar(
        r#"
            UPDATE ticket_types SET quantity_sold = quantity_sold - $1
            WHERE id = $2 AND quantity_sold >= $1
            RETURNING quantity_total - quantity_sold;
        "#,
    )
    .bind(quantity)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    match available {
        Some(available) => {
            trace!("🗃️ Released {quantity} of ticket type {id}. {available} available");
            Ok(available)
        },
        None => match fetch_ticket_type(id, conn).await? {
            Some(tt) => {
                Err(InventoryError::ReleaseUnderflow { ticket_type: id, requested: quantity, sold: tt.quantity_sold })
            },
            None => Err(InventoryError::TicketTypeNotFound(id)),
        },
    }
}

pub async fn available(id: TicketTypeId, conn: &mut SqliteConnection) -> Result<i64, InventoryError> {
    fetch_ticket_type(id, conn).await?.map(|tt| tt.available()).ok_or(InventoryError::TicketTypeNotFound(id))
}
