//! Guest sessions.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::domain::session::{PlayerSession, PlayerStats, SessionKind};
use crate::error::AppError;
use crate::extractors::{CurrentPlayer, ValidatedJson};
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
struct CreateSessionRequest {
    display_name: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub display_name: String,
    pub kind: SessionKind,
    pub stats: PlayerStats,
}

impl From<PlayerSession> for SessionResponse {
    fn from(s: PlayerSession) -> Self {
        Self {
            session_id: s.session_id,
            display_name: s.display_name,
            kind: s.kind,
            stats: s.stats,
        }
    }
}

/// POST /api/sessions
///
/// Issues a fresh guest session id; clients send it back as `x-session-id`.
async fn create_session(
    body: ValidatedJson<CreateSessionRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let session = app_state.identity.create_guest(&body.display_name).await?;
    Ok(HttpResponse::Created().json(SessionResponse::from(session)))
}

/// GET /api/sessions/me
async fn me(
    player: CurrentPlayer,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let session = app_state.identity.session(player.id()).await?;
    Ok(HttpResponse::Ok().json(SessionResponse::from(session)))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::post().to(create_session))
        .route("/me", web::get().to(me));
}
