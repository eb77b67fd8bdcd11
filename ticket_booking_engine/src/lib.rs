//! Ticket Booking Engine
//!
//! The ticket booking engine sells a finite number of tickets per ticket type without ever overselling, and keeps each
//! booking's state in line with what the payment collaborator reports, even when payment notifications are duplicated
//! or arrive out of order.
//!
//! The library is divided into three main sections:
//! 1. Backend contracts ([`mod@traits`]) and data types ([`mod@db_types`]). The bundled [`SqliteDatabase`] implements
//!    all of the backend traits. [`http_catalog::HttpCatalogClient`] reads event metadata from a remote catalog
//!    service instead.
//! 2. The public API ([`mod@booking_api`]): inventory and availability, the reservation orchestrator, the booking
//!    lifecycle and payment reconciliation.
//! 3. Lifecycle events ([`mod@events`]). Bookings being created, confirmed or cancelled are published to any hooks
//!    that subscribe to them.
pub mod booking_api;
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod http_catalog;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use booking_api::{
    AvailabilityApi,
    AvailabilityCache,
    BookingError,
    BookingFlowApi,
    InventoryApi,
    PaymentReconciliationApi,
    ReservationApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{BookingBackend, BookingManagement, CatalogClient, InventoryManagement};
