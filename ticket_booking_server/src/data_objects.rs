use std::fmt::Display;

use serde::{Deserialize, Serialize};
use ticket_booking_engine::booking_api::TicketAvailability;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityResponse {
    pub data: Vec<TicketAvailability>,
}
