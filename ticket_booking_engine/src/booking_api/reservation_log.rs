use crate::db_types::{EventId, TicketTypeId};

/// The compensation log for a single booking attempt.
///
/// Every successful reservation is recorded here. If a later step fails, the entries are drained in reverse order and
/// each one is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationLog {
    event_id: EventId,
    entries: Vec<(TicketTypeId, i64)>,
}

impl ReservationLog {
    pub fn new(event_id: EventId) -> Self {
        Self { event_id, entries: Vec::new() }
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn record(&mut self, ticket_type: TicketTypeId, quantity: i64) {
        self.entries.push((ticket_type, quantity));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empties the log, most recent reservation first.
    pub fn drain_reverse(&mut self) -> impl Iterator<Item = (TicketTypeId, i64)> + '_ {
        self.entries.drain(..).rev()
    }
}
