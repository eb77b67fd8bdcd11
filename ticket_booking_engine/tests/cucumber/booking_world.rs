use std::collections::HashMap;

use cucumber::World;
use ticket_booking_engine::{
    booking_api::BookingError,
    db_types::Booking,
    test_utils::system::{SeededEvent, TestSystem},
};

#[derive(Default, Debug, World)]
pub struct BookingWorld {
    pub system: Option<TestSystem>,
    pub concert: Option<SeededEvent>,
    /// The most recent booking made by each user
    pub bookings: HashMap<String, Booking>,
    pub last_error: Option<BookingError>,
}

impl BookingWorld {
    pub fn system(&self) -> &TestSystem {
        self.system.as_ref().expect("TestSystem not initialised")
    }

    pub fn concert(&self) -> &SeededEvent {
        self.concert.as_ref().expect("No event has been set up")
    }

    pub fn booking_for(&self, user: &str) -> &Booking {
        self.bookings.get(user).unwrap_or_else(|| panic!("{user} has not made a booking"))
    }
}
