//! Connection registry and room groups for websocket sessions.
//!
//! Process-local: a room's group only sees connections on this node.

use std::collections::HashSet;
use std::sync::Arc;

use actix::prelude::*;
use dashmap::DashMap;
use tracing::{debug, warn};
use uuid::Uuid;

use super::protocol::ServerMsg;
use crate::domain::events::{Audience, Outbound};
use crate::domain::room::GameKind;
use crate::domain::session::PlayerId;
use crate::supervisor::EventSink;

/// Pre-serialized text frame.
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct Frame(pub Arc<str>);

#[derive(Message, Clone, Copy)]
#[rtype(result = "()")]
pub struct Shutdown;

struct Connection {
    player_id: PlayerId,
    frames: Recipient<Frame>,
    shutdown: Recipient<Shutdown>,
    room: Option<String>,
}

/// A connection left a room group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub room_code: String,
    pub player_id: PlayerId,
    /// No other connection of the same player remains in the group
    pub last: bool,
}

#[derive(Default)]
pub struct WsRegistry {
    connections: DashMap<Uuid, Connection>,
    groups: DashMap<String, HashSet<Uuid>>,
}

impl WsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_connection(
        &self,
        conn_id: Uuid,
        player_id: PlayerId,
        frames: Recipient<Frame>,
        shutdown: Recipient<Shutdown>,
    ) {
        self.connections.insert(
            conn_id,
            Connection {
                player_id,
                frames,
                shutdown,
                room: None,
            },
        );
    }

    pub fn unregister_connection(&self, conn_id: Uuid) -> Option<Departure> {
        let departure = self.leave_group(conn_id);
        self.connections.remove(&conn_id);
        departure
    }

    /// Move the connection into `code`'s group, leaving any previous one.
    ///
    /// Returns the departure from the previous group, if any.
    pub fn join_group(&self, conn_id: Uuid, code: &str) -> Option<Departure> {
        let previous = match self.group_of(conn_id) {
            Some(current) if current == code => return None,
            Some(_) => self.leave_group(conn_id),
            None => None,
        };
        if let Some(mut conn) = self.connections.get_mut(&conn_id) {
            conn.room = Some(code.to_string());
        } else {
            return previous;
        }
        self.groups
            .entry(code.to_string())
            .or_default()
            .insert(conn_id);
        debug!(conn_id = %conn_id, room_code = %code, "Joined room group");
        previous
    }

    pub fn leave_group(&self, conn_id: Uuid) -> Option<Departure> {
        let (code, player_id) = {
            let mut conn = self.connections.get_mut(&conn_id)?;
            let code = conn.room.take()?;
            (code, conn.player_id.clone())
        };
        if let Some(mut members) = self.groups.get_mut(&code) {
            members.remove(&conn_id);
        }
        self.groups.remove_if(&code, |_, members| members.is_empty());

        let last = !self.is_present(&code, &player_id);
        debug!(conn_id = %conn_id, room_code = %code, last, "Left room group");
        Some(Departure {
            room_code: code,
            player_id,
            last,
        })
    }

    pub fn group_of(&self, conn_id: Uuid) -> Option<String> {
        self.connections.get(&conn_id).and_then(|c| c.room.clone())
    }

    /// Whether any connection of `player_id` is in the room group.
    pub fn is_present(&self, code: &str, player_id: &str) -> bool {
        self.members(code).into_iter().any(|id| {
            self.connections
                .get(&id)
                .is_some_and(|c| c.player_id == player_id)
        })
    }

    pub fn group_size(&self, code: &str) -> usize {
        self.groups.get(code).map_or(0, |m| m.len())
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Close every session. Used on graceful server stop.
    pub fn shutdown_all(&self) {
        for conn in self.connections.iter() {
            conn.shutdown.do_send(Shutdown);
        }
    }

    fn members(&self, code: &str) -> Vec<Uuid> {
        self.groups
            .get(code)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default()
    }

    fn send_to_group(&self, code: &str, audience: &Audience, frame: Frame) {
        for conn_id in self.members(code) {
            let Some(conn) = self.connections.get(&conn_id) else {
                continue;
            };
            if audience.includes(&conn.player_id) {
                conn.frames.do_send(frame.clone());
            }
        }
    }
}

impl EventSink for WsRegistry {
    fn publish(&self, room_code: &str, kind: GameKind, events: &[Outbound]) {
        for out in events {
            let msg = ServerMsg::Event {
                event: out.event.wire_name(kind),
                room: room_code.to_string(),
                payload: out.event.payload(),
            };
            match serde_json::to_string(&msg) {
                Ok(text) => self.send_to_group(room_code, &out.audience, Frame(text.into())),
                Err(e) => warn!(room_code = %room_code, error = %e, "Failed to serialize event"),
            }
        }
    }
}
