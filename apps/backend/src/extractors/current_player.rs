use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use serde::Deserialize;

use crate::domain::session::Identity;
use crate::error::AppError;
use crate::state::app_state::AppState;

pub const SESSION_HEADER: &str = "x-session-id";
pub const NAME_HEADER: &str = "x-display-name";

/// The caller, resolved from the `x-session-id` / `x-display-name` headers.
///
/// Browsers cannot set headers on a WebSocket upgrade, so the `session_id`
/// and `name` query parameters are accepted as a fallback. A session is
/// created on first contact; a missing id or name is `SESSION_REQUIRED`.
#[derive(Debug, Clone)]
pub struct CurrentPlayer(pub Identity);

impl CurrentPlayer {
    pub fn id(&self) -> &str {
        &self.0.player_id
    }

    pub fn into_inner(self) -> Identity {
        self.0
    }
}

#[derive(Debug, Default, Deserialize)]
struct SessionQuery {
    session_id: Option<String>,
    name: Option<String>,
}

fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Session id and display name, headers first, then query string.
pub(crate) fn session_credentials(req: &HttpRequest) -> Option<(String, String)> {
    let query = web::Query::<SessionQuery>::from_query(req.query_string())
        .map(web::Query::into_inner)
        .unwrap_or_default();

    let session_id = header_value(req, SESSION_HEADER)
        .or_else(|| query.session_id.filter(|s| !s.trim().is_empty()))?;
    let name = header_value(req, NAME_HEADER).or(query.name)?;
    Some((session_id, name))
}

impl FromRequest for CurrentPlayer {
    type Error = AppError;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let credentials = session_credentials(req);
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let Some((session_id, name)) = credentials else {
                return Err(AppError::session_required(
                    "x-session-id and x-display-name are required",
                ));
            };
            let state = state.ok_or_else(|| AppError::internal("AppState not available"))?;
            let identity = state.identity.resolve(&session_id, &name).await?;
            Ok(CurrentPlayer(identity))
        })
    }
}
