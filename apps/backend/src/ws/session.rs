use std::sync::Arc;
use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::events::{Outbound, RoomEvent, RoomSnapshot};
use crate::domain::room::{GameKind, Room};
use crate::domain::session::Identity;
use crate::domain::transitions::RoomAction;
use crate::errors::domain::{DomainError, NotFoundKind};
use crate::state::app_state::AppState;
use crate::supervisor::{EventSink, RoomCommand, RoomHub};
use crate::utils::join_code::normalize_room_code;
use crate::ws::hub::{Departure, Frame, Shutdown, WsRegistry};
use crate::ws::protocol::{ClientMsg, ServerMsg, WsErrorCode, PROTOCOL_VERSION};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(40);

pub fn start_session(
    req: &HttpRequest,
    stream: web::Payload,
    identity: Identity,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let session = WsSession::new(Uuid::new_v4(), identity, &app_state);
    ws::start(session, req, stream)
}

pub struct WsSession {
    conn_id: Uuid,
    identity: Identity,
    registry: Arc<WsRegistry>,
    hub: Arc<RoomHub>,

    /// Room group this connection is in
    room: Option<(String, GameKind)>,

    last_heartbeat: Instant,
    heartbeat_handle: Option<actix::SpawnHandle>,

    hello_done: bool,
}

impl WsSession {
    fn new(conn_id: Uuid, identity: Identity, app_state: &AppState) -> Self {
        Self {
            conn_id,
            identity,
            registry: app_state.websocket_registry(),
            hub: app_state.hub.clone(),
            room: None,
            last_heartbeat: Instant::now(),
            heartbeat_handle: None,
            hello_done: false,
        }
    }

    fn send_json(ctx: &mut ws::WebsocketContext<Self>, msg: &ServerMsg) {
        match serde_json::to_string(msg) {
            Ok(payload) => ctx.text(payload),
            Err(err) => warn!(error = %err, "[WS SESSION] failed to serialize outbound message"),
        }
    }

    fn send_error(ctx: &mut ws::WebsocketContext<Self>, code: &str, message: impl Into<String>) {
        Self::send_json(
            ctx,
            &ServerMsg::Error {
                code: code.to_string(),
                message: message.into(),
            },
        );
    }

    fn send_error_and_close(
        &self,
        ctx: &mut ws::WebsocketContext<Self>,
        code: WsErrorCode,
        message: impl Into<String>,
    ) {
        Self::send_error(ctx, code.as_str(), message);
        ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
        ctx.stop();
    }

    fn start_heartbeat(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let handle = ctx.run_interval(HEARTBEAT_INTERVAL, |actor, ctx| {
            if Instant::now().duration_since(actor.last_heartbeat) > CLIENT_TIMEOUT {
                warn!(
                    conn_id = %actor.conn_id,
                    player_id = %actor.identity.player_id,
                    "[WS SESSION] heartbeat timed out"
                );
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
                ctx.stop();
                return;
            }
            ctx.ping(b"keepalive");
        });
        self.heartbeat_handle = Some(handle);
    }

    /// Tell the room worker a player's last connection left its group.
    fn report_departure(&self, departure: Option<Departure>) {
        let Some(dep) = departure.filter(|d| d.last) else {
            return;
        };
        let hub = self.hub.clone();
        actix_web::rt::spawn(async move {
            hub.notify(
                &dep.room_code,
                RoomCommand::Presence {
                    player_id: dep.player_id,
                    connected: false,
                },
            )
            .await;
        });
    }

    fn join_room(&mut self, raw_code: String, ctx: &mut ws::WebsocketContext<Self>) {
        let hub = self.hub.clone();
        let identity = self.identity.clone();

        ctx.spawn(
            async move {
                let code = normalize_room_code(&raw_code).ok_or_else(|| {
                    DomainError::not_found(NotFoundKind::Room, format!("Room {raw_code} not found"))
                })?;
                let mut room = hub.rooms().load(&code).await?;
                if !room.is_member(&identity.player_id) {
                    let outcome = hub
                        .act(
                            &code,
                            RoomAction::Join {
                                identity: identity.clone(),
                            },
                        )
                        .await?;
                    room = outcome.room.ok_or_else(|| {
                        DomainError::not_found(NotFoundKind::Room, format!("Room {code} not found"))
                    })?;
                }
                Ok::<(String, Room), DomainError>((code, room))
            }
            .into_actor(self)
            .map(move |res, actor, ctx| match res {
                Ok((code, room)) => {
                    let previous = actor.registry.join_group(actor.conn_id, &code);
                    actor.report_departure(previous);
                    actor.room = Some((code.clone(), room.kind()));

                    let hub = actor.hub.clone();
                    let player_id = actor.identity.player_id.clone();
                    let presence_code = code.clone();
                    actix_web::rt::spawn(async move {
                        hub.notify(
                            &presence_code,
                            RoomCommand::Presence {
                                player_id,
                                connected: true,
                            },
                        )
                        .await;
                    });

                    // Ordering guarantee: ack then room_state
                    Self::send_json(ctx, &ServerMsg::Ack { message: "joined" });
                    Self::send_json(
                        ctx,
                        &ServerMsg::RoomState {
                            room: code,
                            snapshot: RoomSnapshot::of(&room, Some(&actor.identity.player_id)),
                        },
                    );
                }
                Err(err) => {
                    debug!(
                        conn_id = %actor.conn_id,
                        code = %err.code(),
                        "[WS SESSION] join_room rejected"
                    );
                    Self::send_error(ctx, err.code().as_str(), err.detail());
                }
            }),
        );
    }

    fn leave_room(&mut self) {
        let departure = self.registry.leave_group(self.conn_id);
        self.report_departure(departure);
        self.room = None;
    }

    /// Route a game action through the room worker. Failures go back to
    /// this connection only.
    fn act(
        &mut self,
        build: impl FnOnce(String) -> RoomAction,
        ctx: &mut ws::WebsocketContext<Self>,
    ) {
        let Some((code, _)) = self.room.clone() else {
            Self::send_error(ctx, WsErrorCode::NotInRoom.as_str(), "Join a room first");
            return;
        };
        let action = build(self.identity.player_id.clone());
        let leaving = matches!(action, RoomAction::Leave { .. });
        let hub = self.hub.clone();

        ctx.spawn(
            async move { hub.act(&code, action).await }
                .into_actor(self)
                .map(move |res, actor, ctx| match res {
                    Ok(_) => {
                        if leaving {
                            actor.registry.leave_group(actor.conn_id);
                            actor.room = None;
                        }
                    }
                    Err(err) => Self::send_error(ctx, err.code().as_str(), err.detail()),
                }),
        );
    }

    /// Cursor and preview events go straight to the other group members.
    fn relay(&mut self, event: RoomEvent, ctx: &mut ws::WebsocketContext<Self>) {
        let Some((code, kind)) = &self.room else {
            Self::send_error(ctx, WsErrorCode::NotInRoom.as_str(), "Join a room first");
            return;
        };
        let out = Outbound::to_others(self.identity.player_id.clone(), event);
        self.registry.publish(code, *kind, &[out]);
    }

    fn handle_command(&mut self, cmd: ClientMsg, ctx: &mut ws::WebsocketContext<Self>) {
        let player_id = self.identity.player_id.clone();
        match cmd {
            ClientMsg::Hello { .. } => {}
            ClientMsg::JoinRoom { code } => self.join_room(code, ctx),
            ClientMsg::LeaveRoom => {
                self.leave_room();
                Self::send_json(ctx, &ServerMsg::Ack { message: "left" });
            }
            ClientMsg::Ready { ready } => {
                self.act(|player_id| RoomAction::SetReady { player_id, ready }, ctx)
            }
            ClientMsg::Start => self.act(
                |player_id| RoomAction::Start {
                    player_id,
                    puzzle: None,
                },
                ctx,
            ),
            ClientMsg::Move { mv } => self.act(|player_id| RoomAction::Move { player_id, mv }, ctx),
            ClientMsg::Complete { grid } => {
                self.act(|player_id| RoomAction::Complete { player_id, grid }, ctx)
            }
            ClientMsg::GiveUp => self.act(|player_id| RoomAction::GiveUp { player_id }, ctx),
            ClientMsg::Pause => self.act(|player_id| RoomAction::Pause { player_id }, ctx),
            ClientMsg::Resume => self.act(|player_id| RoomAction::Resume { player_id }, ctx),
            ClientMsg::Leave => self.act(|player_id| RoomAction::Leave { player_id }, ctx),
            ClientMsg::Cursor { row, col } => {
                self.relay(RoomEvent::Cursor { player_id, row, col }, ctx)
            }
            ClientMsg::CellPreview { row, col, value } => self.relay(
                RoomEvent::CellPreview {
                    player_id,
                    row,
                    col,
                    value,
                },
                ctx,
            ),
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(
            conn_id = %self.conn_id,
            player_id = %self.identity.player_id,
            "[WS SESSION] started"
        );
        self.registry.register_connection(
            self.conn_id,
            self.identity.player_id.clone(),
            ctx.address().recipient::<Frame>(),
            ctx.address().recipient::<Shutdown>(),
        );
        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        let departure = self.registry.unregister_connection(self.conn_id);
        self.report_departure(departure);
        info!(
            conn_id = %self.conn_id,
            player_id = %self.identity.player_id,
            "[WS SESSION] stopped"
        );
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&payload);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();

                let parsed: Result<ClientMsg, _> = serde_json::from_str(&text);
                let cmd = match parsed {
                    Ok(cmd) => cmd,
                    Err(err) => {
                        Self::send_error(
                            ctx,
                            WsErrorCode::BadRequest.as_str(),
                            format!("Malformed message: {err}"),
                        );
                        return;
                    }
                };

                if let ClientMsg::Hello { protocol } = cmd {
                    if protocol != PROTOCOL_VERSION {
                        self.send_error_and_close(
                            ctx,
                            WsErrorCode::BadProtocol,
                            "Unsupported protocol version",
                        );
                        return;
                    }
                    self.hello_done = true;
                    Self::send_json(
                        ctx,
                        &ServerMsg::HelloAck {
                            protocol: PROTOCOL_VERSION,
                            player_id: self.identity.player_id.clone(),
                        },
                    );
                    return;
                }

                if !self.hello_done {
                    self.send_error_and_close(ctx, WsErrorCode::BadRequest, "Must send hello first");
                    return;
                }
                self.handle_command(cmd, ctx);
            }
            Ok(ws::Message::Binary(_)) => {
                self.last_heartbeat = Instant::now();
                self.send_error_and_close(ctx, WsErrorCode::BadRequest, "Binary not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {
                self.last_heartbeat = Instant::now();
            }
            Err(err) => {
                warn!(
                    conn_id = %self.conn_id,
                    player_id = %self.identity.player_id,
                    error = %err,
                    "[WS SESSION] protocol error"
                );
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
                ctx.stop();
            }
        }
    }
}

impl Handler<Frame> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: Frame, ctx: &mut Self::Context) -> Self::Result {
        ctx.text(msg.0.as_ref());
    }
}

impl Handler<Shutdown> for WsSession {
    type Result = ();

    fn handle(&mut self, _msg: Shutdown, ctx: &mut Self::Context) -> Self::Result {
        if let Some(handle) = self.heartbeat_handle.take() {
            ctx.cancel_future(handle);
        }
        ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Away)));
        ctx.stop();
    }
}
