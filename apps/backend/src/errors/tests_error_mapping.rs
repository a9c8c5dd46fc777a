// Domain error to HTTP mapping, without routes or a store.
use actix_web::body::to_bytes;
use actix_web::ResponseError;

use crate::errors::domain::{
    ConflictKind, DomainError, ForbiddenKind, InfraErrorKind, NotFoundKind, ValidationKind,
};
use crate::{AppError, ErrorCode};

fn http(err: DomainError) -> (ErrorCode, u16) {
    let app: AppError = err.into();
    (app.code(), app.status().as_u16())
}

#[test]
fn invalid_input_is_400() {
    assert_eq!(
        http(DomainError::validation(ValidationKind::InvalidMove, "occupied")),
        (ErrorCode::InvalidMove, 400)
    );
    assert_eq!(
        http(DomainError::validation(
            ValidationKind::InvalidSettings,
            "max_players"
        )),
        (ErrorCode::ValidationError, 400)
    );
    assert_eq!(
        http(DomainError::validation(
            ValidationKind::IncorrectSolution,
            "wrong"
        )),
        (ErrorCode::IncorrectSolution, 400)
    );
}

#[test]
fn host_and_membership_rejections_are_403() {
    assert_eq!(
        http(DomainError::forbidden(ForbiddenKind::NotHost, "host only")),
        (ErrorCode::NotHost, 403)
    );
    assert_eq!(
        http(DomainError::forbidden(ForbiddenKind::PlayerNotInRoom, "who?")),
        (ErrorCode::PlayerNotInRoom, 403)
    );
}

#[test]
fn state_conflicts_are_409() {
    for (kind, code) in [
        (ConflictKind::RoomFull, ErrorCode::RoomFull),
        (ConflictKind::NotYourTurn, ErrorCode::NotYourTurn),
        (ConflictKind::GamePaused, ErrorCode::GamePaused),
        (
            ConflictKind::TurnTimeoutExceeded,
            ErrorCode::TurnTimeoutExceeded,
        ),
        (ConflictKind::OptimisticLock, ErrorCode::OptimisticLock),
    ] {
        assert_eq!(http(DomainError::conflict(kind, "nope")), (code, 409));
    }
}

#[test]
fn missing_documents_are_404() {
    assert_eq!(
        http(DomainError::not_found(NotFoundKind::Room, "gone")),
        (ErrorCode::RoomNotFound, 404)
    );
    assert_eq!(
        http(DomainError::not_found(NotFoundKind::Session, "gone")),
        (ErrorCode::SessionNotFound, 404)
    );
}

#[test]
fn infra_failures_are_5xx() {
    assert_eq!(
        http(DomainError::infra(InfraErrorKind::DbUnavailable, "down")),
        (ErrorCode::DbUnavailable, 503)
    );
    assert_eq!(
        http(DomainError::infra(
            InfraErrorKind::Other("constraint".into()),
            "boom"
        )),
        (ErrorCode::DbError, 500)
    );
    assert_eq!(
        http(DomainError::infra(InfraErrorKind::DataCorruption, "bad json")),
        (ErrorCode::InternalError, 500)
    );
}

#[actix_web::test]
async fn problem_details_body_carries_code_and_trace_id() {
    let err = AppError::conflict(ErrorCode::RoomFull, "Room ABC234 is full");
    let resp = err.error_response();
    assert_eq!(resp.status().as_u16(), 409);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/problem+json"
    );
    assert!(resp.headers().contains_key("x-trace-id"));

    let body = to_bytes(resp.into_body()).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["code"], "ROOM_FULL");
    assert_eq!(json["title"], "Room Full");
    assert_eq!(json["status"], 409);
    assert_eq!(json["error"], "Room ABC234 is full");
    assert_eq!(json["trace_id"], "unknown");
}
