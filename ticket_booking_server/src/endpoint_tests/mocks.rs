use chrono::Duration;
use mockall::mock;
use ticket_booking_engine::{
    db_types::{Booking, BookingId, BookingStatus, Event, EventId, NewBooking, PaymentNotification, TicketTypeId},
    traits::{
        BookingManagement,
        BookingStoreError,
        CatalogClient,
        CatalogError,
        InsertNotificationResult,
        InventoryError,
        InventoryManagement,
    },
};

mock! {
    pub Catalog {}
    impl CatalogClient for Catalog {
        async fn get_event(&self, event_id: EventId) -> Result<Option<Event>, CatalogError>;
    }
}

mock! {
    pub Backend {}
    impl InventoryManagement for Backend {
        async fn reserve(&self, ticket_type: TicketTypeId, quantity: i64) -> Result<i64, InventoryError>;
        async fn release(&self, ticket_type: TicketTypeId, quantity: i64) -> Result<i64, InventoryError>;
        async fn available(&self, ticket_type: TicketTypeId) -> Result<i64, InventoryError>;
    }
    impl BookingManagement for Backend {
        async fn insert_booking(&self, booking: NewBooking) -> Result<Booking, BookingStoreError>;
        async fn fetch_booking(&self, id: &BookingId) -> Result<Option<Booking>, BookingStoreError>;
        async fn fetch_bookings_for_user(&self, user_id: &str) -> Result<Vec<Booking>, BookingStoreError>;
        async fn update_booking_status(
            &self,
            id: &BookingId,
            from: BookingStatus,
            to: BookingStatus,
            tickets_owed: bool,
        ) -> Result<Option<Booking>, BookingStoreError>;
        async fn claim_ticket_return(&self, id: &BookingId, ticket_type: TicketTypeId)
            -> Result<bool, BookingStoreError>;
        async fn revoke_ticket_return(&self, id: &BookingId, ticket_type: TicketTypeId)
            -> Result<(), BookingStoreError>;
        async fn fetch_bookings_awaiting_return(&self) -> Result<Vec<Booking>, BookingStoreError>;
        async fn fetch_stale_pending_bookings(&self, older_than: Duration) -> Result<Vec<Booking>, BookingStoreError>;
        async fn record_payment_notification(
            &self,
            notification: &PaymentNotification,
        ) -> Result<InsertNotificationResult, BookingStoreError>;
    }
}
