//! # Ticket booking server
//! This crate hosts the HTTP service in front of the ticket booking engine. It is responsible for:
//! Identifying the caller from the `X-User-Id` header set by the authenticating gateway.
//! Turning booking requests into reservations, and reporting availability for display.
//! Accepting payment notifications from the payment provider and reconciling bookings against them.
//! Cancelling bookings that are not paid for in time.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/events/{event_id}/tickets/available`: Tickets left per ticket type.
//! * `/bookings`: Create a booking (POST) or list the caller's bookings (GET).
//! * `/bookings/{booking_id}`: Fetch one of the caller's bookings.
//! * `/bookings/{booking_id}/cancel`: Cancel one of the caller's bookings.
//! * `/payments/webhook`: Payment status notifications from the payment provider.

pub mod caller;
pub mod catalog_backend;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
