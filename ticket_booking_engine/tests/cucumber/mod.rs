pub mod booking_world;
pub mod setups;
pub mod steps;

pub use booking_world::BookingWorld;
