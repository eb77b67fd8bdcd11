use std::time::Duration;

use ticket_booking_engine::{
    booking_api::{BookingError, CacheConfig, ErrorKind, TicketAvailability},
    db_types::{EventId, EventStatus, Money, NewEvent, NewTicketType},
    events::EventProducers,
    test_utils::system::{seed_concert, TestSystem, TestSystemConfig},
    InventoryManagement,
};

async fn system_with_cache(cache: CacheConfig) -> TestSystem {
    let config = TestSystemConfig { cache, ..Default::default() };
    TestSystem::with_config(config, EventProducers::default()).await
}

#[tokio::test]
async fn stale_reads_are_bounded_by_the_ttl() {
    let system = system_with_cache(CacheConfig { cache_enabled: true, ttl_seconds: 1 }).await;
    let seeded = seed_concert(&system.db).await;
    let (event, vip) = (seeded.event.id, seeded.vip.id);
    let inventory = system.reservations.inventory();

    inventory.reserve(event, vip, 5).await.unwrap();
    assert_eq!(inventory.available(event, vip).await.unwrap(), 5);
    // A sale that does not go through the cache-aware API, e.g. from another instance
    system.db.reserve(vip, 2).await.unwrap();
    assert_eq!(inventory.available(event, vip).await.unwrap(), 5, "Served from cache until the entry expires");
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(inventory.available(event, vip).await.unwrap(), 3);
    system.tear_down().await;
}

#[tokio::test]
async fn writes_through_the_api_invalidate_the_cache() {
    let system = system_with_cache(CacheConfig::default()).await;
    let seeded = seed_concert(&system.db).await;
    let (event, vip) = (seeded.event.id, seeded.vip.id);
    let inventory = system.reservations.inventory();

    assert_eq!(inventory.available(event, vip).await.unwrap(), 10);
    assert_eq!(system.cache.get((event, vip)), Some(10));
    inventory.reserve(event, vip, 4).await.unwrap();
    assert_eq!(system.cache.get((event, vip)), None);
    assert_eq!(inventory.available(event, vip).await.unwrap(), 6);
    inventory.release(event, vip, 1).await.unwrap();
    assert_eq!(inventory.available(event, vip).await.unwrap(), 7);
    system.tear_down().await;
}

#[tokio::test]
async fn a_disabled_cache_always_reads_the_store() {
    let system = system_with_cache(CacheConfig::disabled()).await;
    let seeded = seed_concert(&system.db).await;
    let (event, vip) = (seeded.event.id, seeded.vip.id);
    let inventory = system.reservations.inventory();

    assert_eq!(inventory.available(event, vip).await.unwrap(), 10);
    system.db.reserve(vip, 3).await.unwrap();
    assert_eq!(inventory.available(event, vip).await.unwrap(), 7);
    assert!(system.cache.is_empty());
    system.tear_down().await;
}

#[tokio::test]
async fn availability_lists_active_ticket_types() {
    let system = system_with_cache(CacheConfig::default()).await;
    let seeded = seed_concert(&system.db).await;
    let retired = NewTicketType::new(seeded.event.id, "Retired", Money::from_units(1), 5).inactive();
    system.db.insert_ticket_type(retired).await.unwrap();
    system.db.reserve(seeded.general.id, 40).await.unwrap();

    let availability = system.availability.availability(seeded.event.id).await.unwrap();
    assert_eq!(availability, vec![
        TicketAvailability { ticket_type_id: seeded.vip.id, available: 10 },
        TicketAvailability { ticket_type_id: seeded.general.id, available: 60 },
    ]);
    system.tear_down().await;
}

#[tokio::test]
async fn availability_for_unbookable_events() {
    let system = system_with_cache(CacheConfig::default()).await;
    let err = system.availability.availability(EventId(31337)).await.unwrap_err();
    assert!(matches!(err, BookingError::EventNotFound(_)));

    let cancelled = system.db.insert_event(NewEvent::new("Rained out", EventStatus::Cancelled)).await.unwrap();
    let tt = NewTicketType::new(cancelled.id, "GA", Money::from_units(10), 5);
    system.db.insert_ticket_type(tt).await.unwrap();
    let err = system.availability.availability(cancelled.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let empty = system.db.insert_event(NewEvent::new("No tickets yet", EventStatus::Published)).await.unwrap();
    let err = system.availability.availability(empty.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    system.tear_down().await;
}
