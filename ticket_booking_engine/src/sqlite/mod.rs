//! SQLite backend for the ticket booking engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
