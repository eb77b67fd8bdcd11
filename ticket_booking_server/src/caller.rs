//! Caller identity.
//!
//! Authentication happens upstream. The authenticating gateway forwards the verified user id in the `X-User-Id`
//! header, and handlers that act on behalf of a user take a [`Caller`] argument to get at it.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use log::debug;

use crate::errors::ServerError;

pub const USER_ID_HEADER: &str = "X-User-Id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
}

impl Caller {
    pub fn from_request_headers(req: &HttpRequest) -> Result<Self, ServerError> {
        let user_id = req
            .headers()
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                debug!("💻️ Request to {} has no usable {USER_ID_HEADER} header", req.path());
                ServerError::MissingUserId
            })?;
        Ok(Self { user_id: user_id.to_string() })
    }
}

impl FromRequest for Caller {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_request_headers(req))
    }
}
