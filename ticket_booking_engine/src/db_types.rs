use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
pub use tbs_common::Money;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------     EventId       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Type)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct EventId(pub i64);

impl From<i64> for EventId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------   TicketTypeId    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Type)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct TicketTypeId(pub i64);

impl From<i64> for TicketTypeId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for TicketTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------     BookingId     ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Type)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct BookingId(pub String);

impl BookingId {
    /// Generates a fresh, globally unique booking id.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<String> for BookingId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for BookingId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------    EventStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// The event is still being set up by the organiser. Not bookable.
    Draft,
    /// The event is on sale.
    Published,
    /// The event has been called off. Not bookable.
    Cancelled,
}

impl Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Published => write!(f, "published"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for EventStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ConversionError(format!("Invalid event status: {s}"))),
        }
    }
}

//--------------------------------------    TicketType     ---------------------------------------------------------
/// A sellable category of admission for an event.
///
/// `quantity_sold` is only ever changed through the atomic reserve/release operations of the inventory store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TicketType {
    pub id: TicketTypeId,
    #[serde(alias = "event")]
    pub event_id: EventId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    pub quantity_total: i64,
    #[serde(default)]
    pub quantity_sold: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub sales_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sales_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub per_person_limit: Option<i64>,
}

fn default_true() -> bool {
    true
}

impl TicketType {
    pub fn available(&self) -> i64 {
        (self.quantity_total - self.quantity_sold).max(0)
    }

    /// True if `now` falls inside the sale window. Open-ended windows are unbounded on that side.
    pub fn in_sale_window(&self, now: DateTime<Utc>) -> bool {
        let started = self.sales_start.map(|start| start <= now).unwrap_or(true);
        let not_ended = self.sales_end.map(|end| now < end).unwrap_or(true);
        started && not_ended
    }
}

//--------------------------------------      Event        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub status: EventStatus,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[sqlx(skip)]
    #[serde(default)]
    pub ticket_types: Vec<TicketType>,
}

impl Event {
    pub fn is_published(&self) -> bool {
        matches!(self.status, EventStatus::Published)
    }

    pub fn ticket_type(&self, id: TicketTypeId) -> Option<&TicketType> {
        self.ticket_types.iter().find(|t| t.id == id)
    }

    pub fn active_ticket_types(&self) -> impl Iterator<Item = &TicketType> {
        self.ticket_types.iter().filter(|t| t.is_active)
    }
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub status: EventStatus,
    pub start_time: Option<DateTime<Utc>>,
}

impl NewEvent {
    pub fn new<S: Into<String>>(title: S, status: EventStatus) -> Self {
        Self { title: title.into(), status, start_time: None }
    }

    pub fn with_start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self
    }
}

#[derive(Debug, Clone)]
pub struct NewTicketType {
    pub event_id: EventId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub quantity_total: i64,
    pub quantity_sold: i64,
    pub is_active: bool,
    pub sales_start: Option<DateTime<Utc>>,
    pub sales_end: Option<DateTime<Utc>>,
    pub per_person_limit: Option<i64>,
}

impl NewTicketType {
    pub fn new<S: Into<String>>(event_id: EventId, name: S, price: Money, quantity_total: i64) -> Self {
        Self {
            event_id,
            name: name.into(),
            description: String::default(),
            price,
            quantity_total,
            quantity_sold: 0,
            is_active: true,
            sales_start: None,
            sales_end: None,
            per_person_limit: None,
        }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_quantity_sold(mut self, sold: i64) -> Self {
        self.quantity_sold = sold;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn with_sale_window(mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.sales_start = start;
        self.sales_end = end;
        self
    }

    pub fn with_per_person_limit(mut self, limit: i64) -> Self {
        self.per_person_limit = Some(limit);
        self
    }
}

//--------------------------------------   BookingStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Inventory is reserved and the booking is awaiting payment.
    Pending,
    /// Payment has been received.
    Confirmed,
    /// The booking was cancelled, declined or expired. There are no transitions out of this state.
    Cancelled,
}

impl Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for BookingStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ConversionError(format!("Invalid booking status: {s}"))),
        }
    }
}

//--------------------------------------    TicketLine     ---------------------------------------------------------
/// A persisted booking line item. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TicketLine {
    #[serde(skip)]
    pub id: i64,
    #[serde(skip)]
    pub booking_id: BookingId,
    #[serde(rename = "ticket_type")]
    pub ticket_type_id: TicketTypeId,
    pub ticket_type_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicketLine {
    pub ticket_type_id: TicketTypeId,
    pub ticket_type_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    subtotal: Money,
}

impl NewTicketLine {
    /// A line for `quantity` tickets at the ticket type's current price. Returns `None` if the subtotal is too large
    /// to represent.
    pub fn new(ticket_type: &TicketType, quantity: i64) -> Option<Self> {
        let subtotal = ticket_type.price.checked_mul(quantity)?;
        Some(Self {
            ticket_type_id: ticket_type.id,
            ticket_type_name: ticket_type.name.clone(),
            quantity,
            unit_price: ticket_type.price,
            subtotal,
        })
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }
}

//--------------------------------------      Booking      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Booking {
    #[serde(rename = "booking_id")]
    pub id: BookingId,
    pub event_id: EventId,
    pub user_id: String,
    pub status: BookingStatus,
    pub total_amount: Money,
    pub payment_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(default)]
    pub tickets: Vec<TicketLine>,
}

impl Booking {
    pub fn with_tickets(mut self, tickets: Vec<TicketLine>) -> Self {
        self.tickets = tickets;
        self
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// A booking that has not been persisted yet. The total is derived from the line items and cannot be set directly.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub id: BookingId,
    pub event_id: EventId,
    pub user_id: String,
    lines: Vec<NewTicketLine>,
    total_amount: Money,
}

impl NewBooking {
    /// Returns `None` if the sum of the line items is too large to represent.
    pub fn new<S: Into<String>>(event_id: EventId, user_id: S, lines: Vec<NewTicketLine>) -> Option<Self> {
        let total_amount = Money::checked_sum(lines.iter().map(NewTicketLine::subtotal))?;
        Some(Self { id: BookingId::random(), event_id, user_id: user_id.into(), lines, total_amount })
    }

    pub fn lines(&self) -> &[NewTicketLine] {
        &self.lines
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }
}

//--------------------------------------  PaymentNotification  -----------------------------------------------------
/// A payment status notification, as delivered by the external payment collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentNotification {
    pub booking_id: BookingId,
    pub payment_status: String,
    pub payment_id: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub amount: Option<Money>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl PaymentNotification {
    pub fn new<S: Into<String>>(booking_id: BookingId, payment_status: S, payment_id: S) -> Self {
        Self {
            booking_id,
            payment_status: payment_status.into(),
            payment_id: payment_id.into(),
            transaction_id: None,
            amount: None,
            currency: None,
        }
    }

    pub fn with_transaction_id<S: Into<String>>(mut self, transaction_id: S) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }
}
