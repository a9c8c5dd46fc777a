use actix_web::{web, HttpRequest, HttpResponse};

use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::extractors::current_player::session_credentials;
use crate::state::app_state::AppState;
use crate::ws::start_session;

/// GET /ws
///
/// Credentials are checked before the upgrade so a missing session is a
/// plain 401 problem response rather than a socket that closes at once.
async fn upgrade(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let Some((session_id, name)) = session_credentials(&req) else {
        return Err(AppError::session_required(
            "session_id and name are required to open a socket",
        ));
    };
    let identity = app_state.identity.resolve(&session_id, &name).await?;

    start_session(&req, stream, identity, app_state)
        .map_err(|e| AppError::bad_request(ErrorCode::BadRequest, e.to_string()))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(upgrade));
}
