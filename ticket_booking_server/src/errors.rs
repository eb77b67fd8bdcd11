use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use thiserror::Error;
use ticket_booking_engine::booking_api::{BookingError, ErrorKind};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("The X-User-Id header is missing or invalid")]
    MissingUserId,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error(transparent)]
    Booking(#[from] BookingError),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ServerError {
    /// The machine-readable code included in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingUserId => "UNAUTHORIZED",
            Self::InvalidRequestBody(_) | Self::InvalidRequestPath(_) => "VALIDATION_ERROR",
            Self::Booking(e) => match e.kind() {
                ErrorKind::Validation => "VALIDATION_ERROR",
                ErrorKind::NotFound => "NOT_FOUND",
                ErrorKind::Conflict => "CONFLICT",
                ErrorKind::InsufficientInventory => "INSUFFICIENT_INVENTORY",
                ErrorKind::ExternalService => "EXTERNAL_SERVICE_ERROR",
                ErrorKind::Internal => "INTERNAL_ERROR",
            },
            Self::InitializeError(_) | Self::IOError(_) | Self::Unspecified(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingUserId => StatusCode::UNAUTHORIZED,
            Self::InvalidRequestBody(_) | Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::Booking(e) => match e.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Conflict | ErrorKind::InsufficientInventory => StatusCode::CONFLICT,
                ErrorKind::ExternalService => StatusCode::SERVICE_UNAVAILABLE,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InitializeError(_) | Self::IOError(_) | Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        // Internal details stay in the log
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("💻️ {self}");
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(status)
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": { "code": self.code(), "message": message } }).to_string())
    }
}
