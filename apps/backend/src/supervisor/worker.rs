//! One task per active room. Commands, timer expiries and bot replies are
//! applied strictly one at a time.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use time::OffsetDateTime;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::timers::{RoomTimers, TimerKey};
use super::{CommandOutcome, Envelope, RoomCommand, WorkerContext, WorkerHandle};
use crate::domain::room::Room;
use crate::domain::session::PlayerId;
use crate::domain::transitions::{turn_deadline, Applied, Move, RoomAction};
use crate::errors::domain::DomainError;

pub(super) struct RoomWorker {
    code: String,
    generation: u64,
    ctx: Arc<WorkerContext>,
    workers: Arc<DashMap<String, WorkerHandle>>,
    timers: RoomTimers,
}

impl RoomWorker {
    pub(super) fn new(
        code: String,
        generation: u64,
        ctx: Arc<WorkerContext>,
        workers: Arc<DashMap<String, WorkerHandle>>,
    ) -> Self {
        Self {
            code,
            generation,
            ctx,
            workers,
            timers: RoomTimers::new(),
        }
    }

    pub(super) async fn run(mut self, mut rx: mpsc::Receiver<Envelope>) {
        debug!(room_code = %self.code, generation = self.generation, "Room worker started");
        self.restore().await;

        loop {
            let next = self.timers.next_deadline();
            tokio::select! {
                biased;
                _ = tokio::time::sleep_until(next.unwrap_or_else(Instant::now)), if next.is_some() => {
                    self.fire_due().await;
                }
                msg = rx.recv() => match msg {
                    Some(envelope) => self.handle(envelope).await,
                    None => break,
                },
                _ = tokio::time::sleep(self.ctx.idle), if self.timers.is_empty() => {
                    self.retire(&mut rx).await;
                    break;
                }
            }
        }
        debug!(room_code = %self.code, generation = self.generation, "Room worker stopped");
    }

    /// Re-arm clocks from the stored room after a (re)spawn.
    async fn restore(&mut self) {
        let room = match self.ctx.rooms.load(&self.code).await {
            Ok(room) => room,
            Err(_) => return,
        };
        if !room.is_finished() {
            let grace = self.ctx.rooms.rules().grace;
            for p in room.players.iter().filter(|p| !p.connected && !p.is_bot) {
                self.timers
                    .arm(TimerKey::Grace(p.id.clone()), Instant::now() + grace);
            }
        }
        self.sync_timers(&room);
    }

    /// Stop accepting work, then finish whatever was already queued.
    async fn retire(&mut self, rx: &mut mpsc::Receiver<Envelope>) {
        let generation = self.generation;
        self.workers
            .remove_if(&self.code, |_, handle| handle.generation == generation);
        rx.close();
        while let Some(envelope) = rx.recv().await {
            self.handle(envelope).await;
        }
        while let Some(at) = self.timers.next_deadline() {
            tokio::time::sleep_until(at).await;
            self.fire_due().await;
        }
        debug!(room_code = %self.code, "Room worker retired after idling");
    }

    async fn handle(&mut self, envelope: Envelope) {
        // Deadlines that passed while the command was queued win.
        self.fire_due().await;

        let result = match envelope.cmd {
            RoomCommand::Act(action) => self.run_action(action).await,
            RoomCommand::Presence {
                player_id,
                connected,
            } => self.presence(player_id, connected).await,
        };
        if let Some(reply) = envelope.reply {
            let _ = reply.send(result);
        }
    }

    async fn run_action(&mut self, action: RoomAction) -> Result<CommandOutcome, DomainError> {
        let name = action.name();
        match self.ctx.rooms.execute(&self.code, action).await {
            Ok(applied) => {
                self.after_apply(&applied);
                Ok(CommandOutcome::from(applied))
            }
            Err(e) => {
                debug!(room_code = %self.code, action = name, code = %e.code(), "Action rejected");
                Err(e)
            }
        }
    }

    fn after_apply(&mut self, applied: &Applied) {
        if !applied.events.is_empty() {
            self.ctx
                .sink
                .publish(&self.code, applied.room.kind(), &applied.events);
        }
        if applied.deleted {
            self.timers.clear();
        } else {
            self.sync_timers(&applied.room);
        }
    }

    /// Align the turn clock and bot reply with the room state.
    fn sync_timers(&mut self, room: &Room) {
        let rules = self.ctx.rooms.rules();
        let running = room
            .caro()
            .and_then(|game| turn_deadline(game, rules).map(|deadline| (game, deadline)));

        match running {
            Some((game, deadline)) => {
                let at = self.instant_for(deadline);
                self.timers.arm(TimerKey::Turn, at);
                let bot_to_move = room
                    .player_with_symbol(game.turn)
                    .is_some_and(|p| p.is_bot);
                if !bot_to_move {
                    self.timers.cancel(&TimerKey::Bot);
                } else if !self.timers.is_armed(&TimerKey::Bot) {
                    self.timers
                        .arm(TimerKey::Bot, Instant::now() + rules.bot_delay);
                }
            }
            None => {
                self.timers.cancel(&TimerKey::Turn);
                self.timers.cancel(&TimerKey::Bot);
            }
        }

        if room.is_finished() {
            self.timers.clear();
        }
    }

    fn instant_for(&self, deadline: OffsetDateTime) -> Instant {
        let left = deadline - self.ctx.rooms.clock().now();
        let left = if left.is_positive() {
            left.unsigned_abs()
        } else {
            Duration::ZERO
        };
        Instant::now() + left
    }

    async fn fire_due(&mut self) {
        for key in self.timers.take_due(Instant::now()) {
            match key {
                TimerKey::Turn => self.timer_action(RoomAction::ExpireTurn).await,
                TimerKey::Grace(player_id) => {
                    info!(room_code = %self.code, player_id = %player_id, "Disconnect grace expired");
                    self.timer_action(RoomAction::ExpireGrace { player_id })
                        .await
                }
                TimerKey::Bot => self.bot_reply().await,
            }
        }
    }

    async fn timer_action(&mut self, action: RoomAction) {
        let name = action.name();
        if let Err(e) = self.run_action(action).await {
            warn!(room_code = %self.code, action = name, error = %e, "Timer action failed");
        }
    }

    async fn presence(
        &mut self,
        player_id: PlayerId,
        connected: bool,
    ) -> Result<CommandOutcome, DomainError> {
        let key = TimerKey::Grace(player_id.clone());
        if connected {
            self.timers.cancel(&key);
            return self
                .run_action(RoomAction::SetConnected {
                    player_id,
                    connected,
                })
                .await;
        }

        let outcome = self
            .run_action(RoomAction::SetConnected {
                player_id: player_id.clone(),
                connected,
            })
            .await?;
        let pending = outcome
            .room
            .as_ref()
            .is_some_and(|room| !room.is_finished() && room.is_member(&player_id));
        if pending {
            let grace = self.ctx.rooms.rules().grace;
            debug!(room_code = %self.code, player_id = %player_id, ?grace, "Disconnect grace armed");
            self.timers.arm(key, Instant::now() + grace);
        }
        Ok(outcome)
    }

    /// Ask the bot for its move and play it through the normal path.
    ///
    /// The search is depth and breadth bounded, so it runs on the worker.
    async fn bot_reply(&mut self) {
        let room = match self.ctx.rooms.load(&self.code).await {
            Ok(room) => room,
            Err(e) => {
                warn!(room_code = %self.code, error = %e, "Bot could not load room");
                return;
            }
        };
        let Some(game) = room.caro() else {
            return;
        };
        let Some(bot) = room.players.iter().find(|p| p.is_bot) else {
            return;
        };
        let Some(symbol) = bot.symbol() else {
            return;
        };
        if game.turn != symbol || game.pause.is_some() {
            return;
        }

        match self.ctx.bot.choose_move(&game.board, symbol) {
            Ok((row, col)) => {
                debug!(room_code = %self.code, row, col, "Bot reply");
                let action = RoomAction::Move {
                    player_id: bot.id.clone(),
                    mv: Move::Place {
                        row: row as i32,
                        col: col as i32,
                    },
                };
                self.timer_action(action).await;
            }
            Err(e) => warn!(room_code = %self.code, error = %e, "Bot failed to choose a move"),
        }
    }
}
