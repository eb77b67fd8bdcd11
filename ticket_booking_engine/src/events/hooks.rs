use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    BookingCancelledEvent,
    BookingConfirmedEvent,
    BookingCreatedEvent,
    EventHandler,
    EventProducer,
    Handler,
};

type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Default, Clone)]
pub struct EventProducers {
    pub booking_created_producer: Vec<EventProducer<BookingCreatedEvent>>,
    pub booking_confirmed_producer: Vec<EventProducer<BookingConfirmedEvent>>,
    pub booking_cancelled_producer: Vec<EventProducer<BookingCancelledEvent>>,
}

impl EventProducers {
    pub async fn publish_booking_created(&self, event: BookingCreatedEvent) {
        for emitter in &self.booking_created_producer {
            emitter.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_booking_confirmed(&self, event: BookingConfirmedEvent) {
        for emitter in &self.booking_confirmed_producer {
            emitter.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_booking_cancelled(&self, event: BookingCancelledEvent) {
        for emitter in &self.booking_cancelled_producer {
            emitter.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_booking_created: Option<EventHandler<BookingCreatedEvent>>,
    pub on_booking_confirmed: Option<EventHandler<BookingConfirmedEvent>>,
    pub on_booking_cancelled: Option<EventHandler<BookingCancelledEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_booking_created = hooks.on_booking_created.map(|f| EventHandler::new(buffer_size, f));
        let on_booking_confirmed = hooks.on_booking_confirmed.map(|f| EventHandler::new(buffer_size, f));
        let on_booking_cancelled = hooks.on_booking_cancelled.map(|f| EventHandler::new(buffer_size, f));
        Self { on_booking_created, on_booking_confirmed, on_booking_cancelled }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_booking_created {
            result.booking_created_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_booking_confirmed {
            result.booking_confirmed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_booking_cancelled {
            result.booking_cancelled_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns a task for every registered hook. Each task ends when the last producer for its event is dropped.
    pub fn start_handlers(self) {
        if let Some(handler) = self.on_booking_created {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_booking_confirmed {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_booking_cancelled {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_booking_created: Option<Handler<BookingCreatedEvent>>,
    pub on_booking_confirmed: Option<Handler<BookingConfirmedEvent>>,
    pub on_booking_cancelled: Option<Handler<BookingCancelledEvent>>,
}

impl EventHooks {
    pub fn on_booking_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(BookingCreatedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_booking_created = Some(Arc::new(f));
        self
    }

    pub fn on_booking_confirmed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(BookingConfirmedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_booking_confirmed = Some(Arc::new(f));
        self
    }

    pub fn on_booking_cancelled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(BookingCancelledEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_booking_cancelled = Some(Arc::new(f));
        self
    }
}
