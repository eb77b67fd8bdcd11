//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! Each table gets its own module of plain functions that accept a `&mut SqliteConnection` argument. Callers can
//! obtain a connection from a pool, or open an atomic transaction and pass `&mut *tx` through, without the functions
//! having to know the difference.
use std::{env, str::FromStr};

use log::{debug, info};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod bookings;
pub mod events;
pub mod payment_notifications;
pub mod ticket_types;

const SQLITE_DB_URL: &str = "sqlite://data/ticket_booking.db";

pub fn db_url() -> String {
    let result = env::var("TBS_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ TBS_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

/// Opens a connection pool. The database file, and the directory it lives in, are created if they do not exist yet.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    if let Some(dir) = options.clone().get_filename().parent().filter(|p| !p.as_os_str().is_empty()) {
        if !dir.exists() {
            debug!("🗃️ Creating database directory {}", dir.display());
            std::fs::create_dir_all(dir)?;
        }
    }
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn missing_database_files_are_created() {
        let dir = env::temp_dir().join(format!("tbs_pool_{}", rand::random::<u64>()));
        let path = dir.join("bookings.db");
        let url = format!("sqlite://{}", path.display());
        let pool = new_pool(&url, 1).await.unwrap();
        assert!(path.exists());
        pool.close().await;
        let _ = std::fs::remove_dir_all(dir);
    }
}
