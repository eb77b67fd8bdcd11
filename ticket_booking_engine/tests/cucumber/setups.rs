use cucumber::given;
use ticket_booking_engine::test_utils::system::{seed_concert, TestSystem};

use crate::cucumber::BookingWorld;

#[given("a fresh install")]
async fn fresh_database(world: &mut BookingWorld) {
    let system = TestSystem::new().await;
    world.system = Some(system);
}

#[given("the spring concert is on sale")]
async fn spring_concert(world: &mut BookingWorld) {
    let concert = seed_concert(&world.system().db).await;
    world.concert = Some(concert);
}
