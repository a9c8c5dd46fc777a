//! Room HTTP surface.
//!
//! Every mutation goes through the room hub, so HTTP calls share one ordered
//! write path with websocket actions and timers. Responses carry the room as
//! seen by the caller.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::domain::events::RoomSnapshot;
use crate::domain::room::GameSettings;
use crate::domain::sudoku::{Cell, Grid};
use crate::domain::transitions::{Move, RoomAction};
use crate::error::AppError;
use crate::extractors::{CurrentPlayer, RoomCode, ValidatedJson};
use crate::state::app_state::AppState;
use crate::supervisor::CommandOutcome;

#[derive(Debug, Serialize)]
struct RoomResponse {
    /// `None` when the action removed the room (last player left)
    room: Option<RoomSnapshot>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    conflicts: Vec<Cell>,
}

impl RoomResponse {
    fn for_viewer(outcome: CommandOutcome, viewer: &str) -> Self {
        Self {
            room: outcome
                .room
                .as_ref()
                .map(|room| RoomSnapshot::of(room, Some(viewer))),
            conflicts: outcome.conflicts,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReadyRequest {
    #[serde(default = "default_ready")]
    ready: bool,
}

fn default_ready() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct CompleteRequest {
    grid: Grid,
}

/// POST /api/rooms
async fn create_room(
    player: CurrentPlayer,
    settings: ValidatedJson<GameSettings>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let room = app_state
        .rooms
        .create_room(&player.0, settings.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(RoomSnapshot::of(&room, Some(player.id()))))
}

/// GET /api/rooms/{code}
///
/// Read-only; served from the store without waking the room worker.
async fn get_room(
    code: RoomCode,
    player: CurrentPlayer,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let room = app_state.rooms.load(code.as_str()).await?;
    Ok(HttpResponse::Ok().json(RoomSnapshot::of(&room, Some(player.id()))))
}

async fn run(
    app_state: &AppState,
    code: &RoomCode,
    player: &CurrentPlayer,
    action: RoomAction,
) -> Result<HttpResponse, AppError> {
    let outcome = app_state.hub.act(code.as_str(), action).await?;
    Ok(HttpResponse::Ok().json(RoomResponse::for_viewer(outcome, player.id())))
}

/// POST /api/rooms/{code}/join
///
/// A caller already seated gets the current room back. Their presence is
/// owned by the websocket gateway, so it is left untouched here.
async fn join(
    code: RoomCode,
    player: CurrentPlayer,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let room = app_state.rooms.load(code.as_str()).await?;
    if room.is_member(player.id()) {
        let outcome = CommandOutcome {
            room: Some(room),
            conflicts: Vec::new(),
        };
        return Ok(HttpResponse::Ok().json(RoomResponse::for_viewer(outcome, player.id())));
    }
    let action = RoomAction::Join {
        identity: player.0.clone(),
    };
    run(&app_state, &code, &player, action).await
}

async fn leave(
    code: RoomCode,
    player: CurrentPlayer,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let action = RoomAction::Leave {
        player_id: player.id().to_string(),
    };
    run(&app_state, &code, &player, action).await
}

async fn ready(
    code: RoomCode,
    player: CurrentPlayer,
    body: ValidatedJson<ReadyRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let action = RoomAction::SetReady {
        player_id: player.id().to_string(),
        ready: body.ready,
    };
    run(&app_state, &code, &player, action).await
}

async fn start(
    code: RoomCode,
    player: CurrentPlayer,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let action = RoomAction::Start {
        player_id: player.id().to_string(),
        puzzle: None,
    };
    run(&app_state, &code, &player, action).await
}

async fn make_move(
    code: RoomCode,
    player: CurrentPlayer,
    body: ValidatedJson<Move>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let action = RoomAction::Move {
        player_id: player.id().to_string(),
        mv: body.into_inner(),
    };
    run(&app_state, &code, &player, action).await
}

async fn complete(
    code: RoomCode,
    player: CurrentPlayer,
    body: ValidatedJson<CompleteRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let action = RoomAction::Complete {
        player_id: player.id().to_string(),
        grid: body.grid,
    };
    run(&app_state, &code, &player, action).await
}

async fn give_up(
    code: RoomCode,
    player: CurrentPlayer,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let action = RoomAction::GiveUp {
        player_id: player.id().to_string(),
    };
    run(&app_state, &code, &player, action).await
}

async fn pause(
    code: RoomCode,
    player: CurrentPlayer,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let action = RoomAction::Pause {
        player_id: player.id().to_string(),
    };
    run(&app_state, &code, &player, action).await
}

async fn resume(
    code: RoomCode,
    player: CurrentPlayer,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let action = RoomAction::Resume {
        player_id: player.id().to_string(),
    };
    run(&app_state, &code, &player, action).await
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::post().to(create_room))
        .route("/{code}", web::get().to(get_room))
        .route("/{code}/join", web::post().to(join))
        .route("/{code}/leave", web::post().to(leave))
        .route("/{code}/ready", web::post().to(ready))
        .route("/{code}/start", web::post().to(start))
        .route("/{code}/move", web::post().to(make_move))
        .route("/{code}/complete", web::post().to(complete))
        .route("/{code}/give-up", web::post().to(give_up))
        .route("/{code}/pause", web::post().to(pause))
        .route("/{code}/resume", web::post().to(resume));
}
