use sqlx::SqliteConnection;

use super::ticket_types;
use crate::db_types::{Event, EventId, NewEvent};

pub async fn insert_event(event: NewEvent, conn: &mut SqliteConnection) -> Result<Event, sqlx::Error> {
    let event = sqlx::query_as(
        r#"
            INSERT INTO events (title, status, start_time) VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(event.title)
    .bind(event.status)
    .bind(event.start_time)
    .fetch_one(conn)
    .await?;
    Ok(event)
}

/// Fetches the event together with all of its ticket types, or `None` if the event does not exist.
pub async fn fetch_event(id: EventId, conn: &mut SqliteConnection) -> Result<Option<Event>, sqlx::Error> {
    let event: Option<Event> =
        sqlx::query_as("SELECT * FROM events WHERE id = $1").bind(id).fetch_optional(&mut *conn).await?;
    match event {
        Some(mut event) => {
            event.ticket_types = ticket_types::fetch_ticket_types_for_event(id, conn).await?;
            Ok(Some(event))
        },
        None => Ok(None),
    }
}
