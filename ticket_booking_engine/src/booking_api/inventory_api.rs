use std::fmt::Debug;

use log::*;

use crate::{
    booking_api::availability_cache::{AvailabilityCache, CacheLookup},
    db_types::{EventId, TicketTypeId},
    traits::{InventoryError, InventoryManagement},
};

/// `InventoryApi` fronts the inventory store with the availability cache.
///
/// `reserve` and `release` always go straight to the store and invalidate the cached entry once the store has
/// accepted the write. `available` is a cache-aside read, meant for display only.
#[derive(Clone)]
pub struct InventoryApi<B> {
    db: B,
    cache: AvailabilityCache,
}

impl<B> Debug for InventoryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InventoryApi ({:?})", self.cache.config())
    }
}

impl<B> InventoryApi<B> {
    pub fn new(db: B, cache: AvailabilityCache) -> Self {
        Self { db, cache }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn cache(&self) -> &AvailabilityCache {
        &self.cache
    }
}

impl<B> InventoryApi<B>
where B: InventoryManagement
{
    pub async fn reserve(
        &self,
        event_id: EventId,
        ticket_type: TicketTypeId,
        quantity: i64,
    ) -> Result<i64, InventoryError> {
        let remaining = self.db.reserve(ticket_type, quantity).await?;
        self.cache.invalidate((event_id, ticket_type));
        debug!("📦️ Reserved {quantity} x ticket type {ticket_type} for event {event_id}. {remaining} remaining");
        Ok(remaining)
    }

    pub async fn release(
        &self,
        event_id: EventId,
        ticket_type: TicketTypeId,
        quantity: i64,
    ) -> Result<i64, InventoryError> {
        let available = self.db.release(ticket_type, quantity).await?;
        self.cache.invalidate((event_id, ticket_type));
        debug!("📦️ Released {quantity} x ticket type {ticket_type} for event {event_id}. {available} available");
        Ok(available)
    }

    /// Availability for display. Served from the cache when there is a live entry, otherwise read from the store and
    /// cached.
    pub async fn available(&self, event_id: EventId, ticket_type: TicketTypeId) -> Result<i64, InventoryError> {
        let key = (event_id, ticket_type);
        match self.cache.lookup(key) {
            CacheLookup::Hit(available) => Ok(available),
            CacheLookup::Miss(ticket) => {
                let available = self.db.available(ticket_type).await?;
                self.cache.populate(ticket, available);
                Ok(available)
            },
        }
    }
}
