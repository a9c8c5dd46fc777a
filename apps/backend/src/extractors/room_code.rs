use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};

use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::utils::join_code::normalize_room_code;

/// Normalized room code from the `{code}` path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomCode(pub String);

impl RoomCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromRequest for RoomCode {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let raw = req.match_info().get("code").unwrap_or_default();
        ready(normalize_room_code(raw).map(RoomCode).ok_or_else(|| {
            AppError::bad_request(
                ErrorCode::InvalidRoomCode,
                format!("Invalid room code: {raw}"),
            )
        }))
    }
}
