//! Short-lived, read-through cache of ticket availability.
//!
//! Entries are keyed by `(event, ticket type)` and hold the number of tickets available at the time they were
//! loaded. They are for display only. Reservation decisions always go to the inventory store.
//!
//! Every write to the inventory store invalidates the matching entry. Each slot carries a generation number that is
//! bumped on invalidation; a reader that started loading before a write cannot put its (now stale) value back, so a
//! write never extends the staleness window beyond the TTL.
use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use log::*;
use tokio::time::Instant;

use crate::db_types::{EventId, TicketTypeId};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

pub type CacheKey = (EventId, TicketTypeId);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub cache_enabled: bool,
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { cache_enabled: true, ttl_seconds: DEFAULT_CACHE_TTL.as_secs() }
    }
}

impl CacheConfig {
    pub fn disabled() -> Self {
        Self { cache_enabled: false, ..Default::default() }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    generation: u64,
    entry: Option<(i64, Instant)>,
}

/// The result of a cache lookup. A miss carries the generation the caller must present when populating the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLookup {
    Hit(i64),
    Miss(CacheTicket),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTicket {
    key: CacheKey,
    generation: u64,
}

#[derive(Debug, Clone)]
pub struct AvailabilityCache {
    config: CacheConfig,
    slots: Arc<DashMap<CacheKey, Slot>>,
}

impl Default for AvailabilityCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl AvailabilityCache {
    pub fn new(config: CacheConfig) -> Self {
        if config.cache_enabled {
            info!("📦️ Availability cache enabled with a TTL of {}s", config.ttl_seconds);
        } else {
            info!("📦️ Availability cache is disabled. All availability reads go to the inventory store");
        }
        Self { config, slots: Arc::new(DashMap::new()) }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.cache_enabled && self.config.ttl_seconds > 0
    }

    pub fn lookup(&self, key: CacheKey) -> CacheLookup {
        if !self.is_enabled() {
            return CacheLookup::Miss(CacheTicket { key, generation: 0 });
        }
        let now = Instant::now();
        let mut slot = self.slots.entry(key).or_default();
        match slot.entry {
            Some((available, expires_at)) if now < expires_at => {
                trace!("📦️ Cache hit for {key:?}: {available}");
                CacheLookup::Hit(available)
            },
            Some(_) => {
                trace!("📦️ Cache entry for {key:?} has expired");
                slot.entry = None;
                CacheLookup::Miss(CacheTicket { key, generation: slot.generation })
            },
            None => CacheLookup::Miss(CacheTicket { key, generation: slot.generation }),
        }
    }

    /// Convenience wrapper around [`Self::lookup`] for callers that don't intend to populate the entry.
    pub fn get(&self, key: CacheKey) -> Option<i64> {
        match self.lookup(key) {
            CacheLookup::Hit(v) => Some(v),
            CacheLookup::Miss(_) => None,
        }
    }

    /// Stores a freshly loaded value, unless the entry was invalidated after the ticket was issued.
    /// Returns true if the value was stored.
    pub fn populate(&self, ticket: CacheTicket, available: i64) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let mut slot = self.slots.entry(ticket.key).or_default();
        if slot.generation != ticket.generation {
            debug!("📦️ Not caching availability for {:?}: the entry was invalidated while loading", ticket.key);
            return false;
        }
        slot.entry = Some((available, Instant::now() + self.config.ttl()));
        true
    }

    /// Overwrites the entry with a value the caller knows to be current, such as the count returned by a reservation.
    pub fn insert(&self, key: CacheKey, available: i64) {
        if !self.is_enabled() {
            return;
        }
        let mut slot = self.slots.entry(key).or_default();
        slot.generation = slot.generation.wrapping_add(1);
        slot.entry = Some((available, Instant::now() + self.config.ttl()));
    }

    pub fn invalidate(&self, key: CacheKey) {
        if !self.is_enabled() {
            return;
        }
        let mut slot = self.slots.entry(key).or_default();
        slot.generation = slot.generation.wrapping_add(1);
        slot.entry = None;
        trace!("📦️ Cache entry for {key:?} invalidated");
    }

    pub fn clear(&self) {
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.entry.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
