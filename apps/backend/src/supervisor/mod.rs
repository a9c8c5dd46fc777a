//! Room hub: routes every room mutation to that room's worker task.
//!
//! HTTP handlers, websocket sessions, presence changes, timers and the bot
//! all reach the state machine through `RoomHub::execute`, so writes to one
//! room never interleave. Workers are spawned on first use and retire after
//! `idle` with no pending timers. The worker map is in-process only.

mod timers;
mod worker;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

pub use timers::{RoomTimers, TimerKey};

use crate::ai::CaroAi;
use crate::domain::events::Outbound;
use crate::domain::room::{GameKind, Room};
use crate::domain::session::PlayerId;
use crate::domain::sudoku::Cell;
use crate::domain::transitions::{Applied, RoomAction};
use crate::errors::domain::{DomainError, InfraErrorKind};
use crate::services::RoomService;
use worker::RoomWorker;

const QUEUE_DEPTH: usize = 64;

/// Receives the events a worker produced, in the order it produced them.
pub trait EventSink: Send + Sync {
    fn publish(&self, room_code: &str, kind: GameKind, events: &[Outbound]);
}

/// Discards events. For setups without a realtime gateway.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _room_code: &str, _kind: GameKind, _events: &[Outbound]) {}
}

#[derive(Debug)]
pub enum RoomCommand {
    Act(RoomAction),
    /// A player's last connection left the room group, or one came back
    Presence { player_id: PlayerId, connected: bool },
}

#[derive(Debug, Clone)]
pub struct CommandOutcome {
    /// `None` once the room has been removed
    pub room: Option<Room>,
    pub conflicts: Vec<Cell>,
}

impl From<Applied> for CommandOutcome {
    fn from(applied: Applied) -> Self {
        Self {
            room: (!applied.deleted).then_some(applied.room),
            conflicts: applied.conflicts,
        }
    }
}

type Reply = oneshot::Sender<Result<CommandOutcome, DomainError>>;

pub(crate) struct Envelope {
    cmd: RoomCommand,
    reply: Option<Reply>,
}

pub(crate) struct WorkerHandle {
    generation: u64,
    tx: mpsc::Sender<Envelope>,
}

pub struct WorkerContext {
    pub rooms: Arc<RoomService>,
    pub sink: Arc<dyn EventSink>,
    pub bot: Arc<dyn CaroAi>,
    pub idle: Duration,
}

pub struct RoomHub {
    workers: Arc<DashMap<String, WorkerHandle>>,
    next_generation: AtomicU64,
    ctx: Arc<WorkerContext>,
}

impl RoomHub {
    pub fn new(ctx: WorkerContext) -> Self {
        Self {
            workers: Arc::new(DashMap::new()),
            next_generation: AtomicU64::new(1),
            ctx: Arc::new(ctx),
        }
    }

    pub fn rooms(&self) -> &Arc<RoomService> {
        &self.ctx.rooms
    }

    /// Run a command on the room's worker and wait for its result.
    pub async fn execute(
        &self,
        code: &str,
        cmd: RoomCommand,
    ) -> Result<CommandOutcome, DomainError> {
        let (tx, rx) = oneshot::channel();
        self.send(
            code,
            Envelope {
                cmd,
                reply: Some(tx),
            },
        )
        .await?;
        rx.await.map_err(|_| worker_gone(code))?
    }

    pub async fn act(&self, code: &str, action: RoomAction) -> Result<CommandOutcome, DomainError> {
        self.execute(code, RoomCommand::Act(action)).await
    }

    /// Queue a command without waiting for it.
    pub async fn notify(&self, code: &str, cmd: RoomCommand) {
        if let Err(e) = self.send(code, Envelope { cmd, reply: None }).await {
            warn!(room_code = %code, error = %e, "Dropped room command");
        }
    }

    pub fn active_workers(&self) -> usize {
        self.workers.len()
    }

    async fn send(&self, code: &str, mut envelope: Envelope) -> Result<(), DomainError> {
        // A worker may retire between lookup and send; respawn once.
        for _ in 0..2 {
            let (generation, tx) = self.sender(code);
            match tx.send(envelope).await {
                Ok(()) => return Ok(()),
                Err(mpsc::error::SendError(back)) => {
                    self.workers
                        .remove_if(code, |_, handle| handle.generation == generation);
                    envelope = back;
                }
            }
        }
        Err(worker_gone(code))
    }

    fn sender(&self, code: &str) -> (u64, mpsc::Sender<Envelope>) {
        let handle = self.workers.entry(code.to_string()).or_insert_with(|| {
            let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
            let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
            let worker = RoomWorker::new(
                code.to_string(),
                generation,
                self.ctx.clone(),
                self.workers.clone(),
            );
            tokio::spawn(worker.run(rx));
            WorkerHandle { generation, tx }
        });
        (handle.generation, handle.tx.clone())
    }
}

fn worker_gone(code: &str) -> DomainError {
    DomainError::infra(
        InfraErrorKind::Other("RoomWorker".into()),
        format!("Room worker for {code} is unavailable"),
    )
}
