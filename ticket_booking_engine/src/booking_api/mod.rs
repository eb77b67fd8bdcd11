//! # Ticket booking engine public API
//!
//! The `booking_api` module exposes the programmatic API for the booking engine. Like the backends, it is modular:
//!
//! * [`inventory_api`] fronts the inventory store with the availability cache. Writes go straight to the store and
//!   invalidate the cache; display reads are served cache-aside.
//! * [`availability_api`] answers "how many tickets of each type are left for this event?".
//! * [`reservation_api`] turns a booking request into a `Pending` booking, reserving every ticket line or none of
//!   them.
//! * [`booking_flow_api`] drives bookings through their lifecycle and returns tickets to inventory when a booking is
//!   cancelled.
//! * [`reconciliation_api`] applies payment notifications from the payment collaborator to bookings, idempotently.
//!
//! # API usage
//!
//! Each API is created by supplying backends that implement the traits it needs:
//!
//! ```rust,ignore
//! use ticket_booking_engine::{booking_api::*, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let inventory = InventoryApi::new(db.clone(), AvailabilityCache::default());
//! let api = ReservationApi::new(db.clone(), db, inventory, ReservationConfig::default(), producers);
//! let booking = api.create_booking("alice", request).await?;
//! ```
pub mod availability_api;
pub mod availability_cache;
pub mod booking_flow;
pub mod booking_flow_api;
pub mod booking_objects;
pub mod errors;
pub mod inventory_api;
pub mod payment_objects;
pub mod reconciliation_api;
pub mod reservation_api;
pub mod reservation_log;

pub use availability_api::AvailabilityApi;
pub use availability_cache::{AvailabilityCache, CacheConfig};
pub use booking_flow::{BookingTrigger, Transition};
pub use booking_flow_api::{BookingFlowApi, TransitionOutcome};
pub use booking_objects::{BookingFlowConfig, BookingRequest, ReservationConfig, TicketAvailability, TicketSelection};
pub use errors::{BookingError, ErrorKind};
pub use inventory_api::InventoryApi;
pub use payment_objects::{PaymentOutcome, ReconciliationOutcome};
pub use reconciliation_api::PaymentReconciliationApi;
pub use reservation_api::ReservationApi;
pub use reservation_log::ReservationLog;
