//! # Backend contracts
//!
//! This module defines the interfaces that the booking engine needs from its collaborators. The engine is written
//! against these traits only, so backends (the bundled SQLite store, the HTTP catalog client, or test fakes) can be
//! swapped without touching the reservation or reconciliation logic.
//!
//! * [`CatalogClient`] reads event and ticket-type metadata from the catalog.
//! * [`InventoryManagement`] is the authoritative inventory store. It exposes atomic `reserve` and `release`
//!   operations over per-ticket-type counters.
//! * [`BookingManagement`] persists bookings, their line items and the payment notifications received for them.
//! * [`BookingBackend`] is shorthand for a backend that provides both inventory and booking storage.
mod booking_management;
mod catalog;
mod data_objects;
mod inventory_management;

pub use booking_management::{BookingManagement, BookingStoreError};
pub use catalog::{CatalogClient, CatalogError};
pub use data_objects::InsertNotificationResult;
pub use inventory_management::{InventoryError, InventoryManagement};

/// Everything the booking lifecycle needs from a single backend: the inventory counters and the booking store.
pub trait BookingBackend: BookingManagement + InventoryManagement {}

impl<T> BookingBackend for T where T: BookingManagement + InventoryManagement {}
