//! Room state machine.
//!
//! Every mutation of a room goes through `apply`, which runs one operation
//! against a copy of the room. On error the copy is dropped, so a rejected
//! action never leaves a partial change or emits an event.

use std::time::Duration;

use serde::Deserialize;
use time::OffsetDateTime;

use super::caro::{check_winner, is_board_full, Board, Symbol, BOARD_SIZE};
use super::events::{Outbound, PlayerView, RoomEvent, RoomSnapshot, TimeoutCause};
use super::progress::elapsed_ms;
use super::room::{
    ActiveGame, CaroGame, CaroMove, EndReason, FinishedGame, GameKind, GameSettings, PauseInfo,
    Finisher, Player, RaceSeat, Room, RoomStatus, Seat, SudokuGame,
};
use super::rules::RoomRules;
use super::session::{Identity, PlayerId};
use super::sudoku::{find_conflicts, progress_percent, Cell, Grid, Puzzle, SIZE};
use crate::errors::domain::{ConflictKind, DomainError, ForbiddenKind, ValidationKind};

/// A player's move. Sudoku rooms accept `set_value` and `toggle_note`;
/// Caro rooms accept `place`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Move {
    SetValue { row: i32, col: i32, value: i32 },
    ToggleNote { row: i32, col: i32, value: i32 },
    Place { row: i32, col: i32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoomAction {
    Join { identity: Identity },
    SetReady { player_id: PlayerId, ready: bool },
    Start { player_id: PlayerId, puzzle: Option<Puzzle> },
    Move { player_id: PlayerId, mv: Move },
    Complete { player_id: PlayerId, grid: Grid },
    GiveUp { player_id: PlayerId },
    Leave { player_id: PlayerId },
    Pause { player_id: PlayerId },
    Resume { player_id: PlayerId },
    /// Turn clock fired
    ExpireTurn,
    /// Disconnect grace fired for this player
    ExpireGrace { player_id: PlayerId },
    SetConnected { player_id: PlayerId, connected: bool },
}

impl RoomAction {
    pub fn name(&self) -> &'static str {
        match self {
            RoomAction::Join { .. } => "join",
            RoomAction::SetReady { .. } => "ready",
            RoomAction::Start { .. } => "start",
            RoomAction::Move { .. } => "move",
            RoomAction::Complete { .. } => "complete",
            RoomAction::GiveUp { .. } => "give_up",
            RoomAction::Leave { .. } => "leave",
            RoomAction::Pause { .. } => "pause",
            RoomAction::Resume { .. } => "resume",
            RoomAction::ExpireTurn => "expire_turn",
            RoomAction::ExpireGrace { .. } => "expire_grace",
            RoomAction::SetConnected { .. } => "set_connected",
        }
    }
}

/// Result of a successful transition.
#[derive(Debug, Clone)]
pub struct Applied {
    pub room: Room,
    pub events: Vec<Outbound>,
    /// Sudoku peer conflicts for the mover's last entry
    pub conflicts: Vec<Cell>,
    /// The room emptied and should be removed from the store
    pub deleted: bool,
}

impl Applied {
    /// Whether the room document changed and must be saved.
    pub fn changed(&self, before: &Room) -> bool {
        self.deleted || self.room != *before
    }
}

#[derive(Debug)]
pub enum LeaveOutcome {
    Remaining(Vec<Outbound>),
    Deleted(Vec<Outbound>),
}

/// Run `action` against a copy of `room`.
pub fn apply(
    room: &Room,
    action: RoomAction,
    rules: &RoomRules,
    now: OffsetDateTime,
) -> Result<Applied, DomainError> {
    let mut next = room.clone();
    let mut conflicts = Vec::new();
    let mut deleted = false;

    let events = match action {
        RoomAction::Join { identity } => join(&mut next, &identity, now)?,
        RoomAction::SetReady { player_id, ready } => set_ready(&mut next, &player_id, ready)?,
        RoomAction::Start { player_id, puzzle } => {
            start(&mut next, &player_id, puzzle, rules, now)?
        }
        RoomAction::Move { player_id, mv } => {
            let (events, found) = apply_move(&mut next, &player_id, mv, now)?;
            conflicts = found;
            events
        }
        RoomAction::Complete { player_id, grid } => {
            complete_sudoku(&mut next, &player_id, &grid, now)?
        }
        RoomAction::GiveUp { player_id } => give_up(&mut next, &player_id, now)?,
        RoomAction::Leave { player_id } => match leave(&mut next, &player_id, now)? {
            LeaveOutcome::Remaining(events) => events,
            LeaveOutcome::Deleted(events) => {
                deleted = true;
                events
            }
        },
        RoomAction::Pause { player_id } => pause(&mut next, &player_id, rules, now)?,
        RoomAction::Resume { player_id } => resume(&mut next, &player_id, rules, now)?,
        RoomAction::ExpireTurn => expire_turn(&mut next, rules, now)?,
        RoomAction::ExpireGrace { player_id } => {
            match expire_grace(&mut next, &player_id, now)? {
                LeaveOutcome::Remaining(events) => events,
                LeaveOutcome::Deleted(events) => {
                    deleted = true;
                    events
                }
            }
        }
        RoomAction::SetConnected {
            player_id,
            connected,
        } => set_connected(&mut next, &player_id, connected)?,
    };

    if next != *room {
        next.updated_at = now;
    }
    Ok(Applied {
        room: next,
        events,
        conflicts,
        deleted,
    })
}

fn require_member(room: &Room, player_id: &str) -> Result<(), DomainError> {
    if room.is_member(player_id) {
        Ok(())
    } else {
        Err(DomainError::forbidden(
            ForbiddenKind::PlayerNotInRoom,
            format!("Player is not in room {}", room.code),
        ))
    }
}

fn require_waiting(room: &Room) -> Result<(), DomainError> {
    match room.status {
        RoomStatus::Waiting => Ok(()),
        RoomStatus::Playing { .. } => Err(DomainError::conflict(
            ConflictKind::GameAlreadyStarted,
            "Game has already started",
        )),
        RoomStatus::Finished(_) => Err(already_finished()),
    }
}

fn require_playing(room: &Room) -> Result<(), DomainError> {
    match &room.status {
        RoomStatus::Playing { .. } => Ok(()),
        RoomStatus::Waiting => Err(DomainError::conflict(
            ConflictKind::GameNotStarted,
            "Game has not started",
        )),
        RoomStatus::Finished(_) => Err(already_finished()),
    }
}

fn already_finished() -> DomainError {
    DomainError::conflict(ConflictKind::AlreadyFinished, "Game is already finished")
}

fn wrong_kind(action: &str) -> DomainError {
    DomainError::validation(
        ValidationKind::WrongGameKind,
        format!("{action} is not available for this game"),
    )
}

fn invalid_move(detail: impl Into<String>) -> DomainError {
    DomainError::validation(ValidationKind::InvalidMove, detail)
}

/// Move `Playing` to `Finished`, keeping the final game state.
fn finish(
    room: &mut Room,
    winner_id: Option<PlayerId>,
    reason: EndReason,
    now: OffsetDateTime,
) -> Outbound {
    let status = std::mem::replace(&mut room.status, RoomStatus::Waiting);
    let (started_at, game) = match status {
        RoomStatus::Playing { started_at, game } => (Some(started_at), Some(game)),
        RoomStatus::Waiting => (None, None),
        RoomStatus::Finished(f) => (f.started_at, f.game),
    };
    room.status = RoomStatus::Finished(FinishedGame {
        started_at,
        ended_at: now,
        winner_id: winner_id.clone(),
        reason,
        game,
    });
    Outbound::room(RoomEvent::GameEnded { winner_id, reason })
}

/// Add a player, or resolve a returning visitor to their existing slot.
pub fn join(
    room: &mut Room,
    identity: &Identity,
    now: OffsetDateTime,
) -> Result<Vec<Outbound>, DomainError> {
    if let Some(existing) = room.player_mut(&identity.player_id) {
        if existing.connected {
            return Ok(Vec::new());
        }
        existing.connected = true;
        return Ok(vec![Outbound::room(RoomEvent::PlayerReconnected {
            player_id: identity.player_id.clone(),
        })]);
    }
    require_waiting(room)?;
    if room.is_full() {
        return Err(DomainError::conflict(ConflictKind::RoomFull, "Room is full"));
    }

    let seat = match room.settings {
        GameSettings::Sudoku { .. } => Seat::Sudoku(RaceSeat::default()),
        GameSettings::Caro { .. } => Seat::Caro {
            symbol: room.free_symbol(),
        },
    };
    let player = Player {
        id: identity.player_id.clone(),
        display_name: identity.display_name.clone(),
        connected: true,
        ready: false,
        is_bot: false,
        joined_at: now,
        seat,
    };
    let view = PlayerView::of(&player, &room.host_id);
    room.players.push(player);
    Ok(vec![Outbound::room(RoomEvent::PlayerJoined { player: view })])
}

pub fn set_ready(
    room: &mut Room,
    player_id: &str,
    ready: bool,
) -> Result<Vec<Outbound>, DomainError> {
    require_waiting(room)?;
    require_member(room, player_id)?;
    if room.is_host(player_id) {
        return Err(DomainError::conflict(
            ConflictKind::HostAlwaysReady,
            "The host is always ready",
        ));
    }
    if let Some(p) = room.player_mut(player_id) {
        p.ready = ready;
    }
    Ok(vec![Outbound::room(RoomEvent::PlayerReady {
        player_id: player_id.to_string(),
        ready,
    })])
}

pub fn start(
    room: &mut Room,
    player_id: &str,
    puzzle: Option<Puzzle>,
    rules: &RoomRules,
    now: OffsetDateTime,
) -> Result<Vec<Outbound>, DomainError> {
    require_waiting(room)?;
    require_member(room, player_id)?;
    if !room.is_host(player_id) {
        return Err(DomainError::forbidden(
            ForbiddenKind::NotHost,
            "Only the host can start the game",
        ));
    }
    if !room.can_start() {
        return Err(DomainError::conflict(
            ConflictKind::NotReady,
            "Not enough ready players to start",
        ));
    }

    let game = match room.settings {
        GameSettings::Sudoku { .. } => {
            let puzzle = puzzle.ok_or_else(|| {
                DomainError::validation(
                    ValidationKind::Other("PuzzleRequired".into()),
                    "A puzzle is required to start a Sudoku race",
                )
            })?;
            for p in &mut room.players {
                p.seat = Seat::Sudoku(RaceSeat::starting_from(&puzzle.given));
            }
            ActiveGame::Sudoku(SudokuGame {
                puzzle_id: puzzle.id,
                difficulty: puzzle.difficulty,
                given: puzzle.given,
                solution: puzzle.solution,
                finishers: Vec::new(),
            })
        }
        GameSettings::Caro { .. } => ActiveGame::Caro(CaroGame {
            board: Board::new(),
            turn: Symbol::X,
            turn_started_at: now,
            pause: None,
            last_move: None,
            move_count: 0,
        }),
    };
    room.status = RoomStatus::Playing {
        started_at: now,
        game,
    };

    Ok(vec![
        Outbound::room(RoomEvent::GameStarting {
            countdown: rules.countdown.as_secs(),
        }),
        Outbound::room(RoomEvent::GameStarted {
            snapshot: Box::new(RoomSnapshot::of(room, None)),
        }),
    ])
}

fn cell_index(row: i32, col: i32, size: usize) -> Result<(usize, usize), DomainError> {
    let in_range = |v: i32| v >= 0 && (v as usize) < size;
    if in_range(row) && in_range(col) {
        Ok((row as usize, col as usize))
    } else {
        Err(invalid_move(format!("Cell ({row}, {col}) is out of range")))
    }
}

/// Apply a Sudoku entry or Caro placement. Returns the events and, for
/// Sudoku values, the peer cells conflicting with the entry.
pub fn apply_move(
    room: &mut Room,
    player_id: &str,
    mv: Move,
    now: OffsetDateTime,
) -> Result<(Vec<Outbound>, Vec<Cell>), DomainError> {
    // The worker fires a due turn timer before the move, so a late move
    // finds the game already finished by timeout.
    if let RoomStatus::Finished(f) = &room.status {
        if f.reason == EndReason::Timeout {
            return Err(DomainError::conflict(
                ConflictKind::TurnTimeoutExceeded,
                "Turn time ran out before the move arrived",
            ));
        }
    }
    require_playing(room)?;
    require_member(room, player_id)?;

    match mv {
        Move::SetValue { row, col, value } => {
            sudoku_set_value(room, player_id, row, col, value)
        }
        Move::ToggleNote { row, col, value } => {
            sudoku_toggle_note(room, player_id, row, col, value).map(|ev| (ev, Vec::new()))
        }
        Move::Place { row, col } => {
            caro_place(room, player_id, row, col, now).map(|ev| (ev, Vec::new()))
        }
    }
}

/// Borrow the running Sudoku game and the caller's seat together.
fn race_parts<'a>(
    room: &'a mut Room,
    player_id: &str,
) -> Result<(&'a mut SudokuGame, &'a mut RaceSeat), DomainError> {
    let game = match &mut room.status {
        RoomStatus::Playing {
            game: ActiveGame::Sudoku(g),
            ..
        } => g,
        _ => return Err(wrong_kind("This action")),
    };
    let seat = room
        .players
        .iter_mut()
        .find(|p| p.id == player_id)
        .and_then(Player::race_mut)
        .ok_or_else(|| {
            DomainError::forbidden(ForbiddenKind::PlayerNotInRoom, "Player has no race seat")
        })?;
    Ok((game, seat))
}

fn sudoku_set_value(
    room: &mut Room,
    player_id: &str,
    row: i32,
    col: i32,
    value: i32,
) -> Result<(Vec<Outbound>, Vec<Cell>), DomainError> {
    let (r, c) = cell_index(row, col, SIZE)?;
    if !(0..=9).contains(&value) {
        return Err(invalid_move(format!("Value {value} is out of range")));
    }
    let value = value as u8;

    let (game, seat) = race_parts(room, player_id)?;
    if seat.is_terminal() {
        return Err(already_finished());
    }
    if game.given[r][c] != 0 {
        return Err(invalid_move("Given cells cannot be changed"));
    }

    seat.grid[r][c] = value;
    if value != 0 {
        seat.notes[r][c] = 0;
    }
    let correct = value != 0 && game.solution[r][c] == value;
    if value != 0 && !correct {
        seat.errors += 1;
    }
    let conflicts = find_conflicts(&seat.grid, r, c, value);
    seat.progress = progress_percent(&seat.grid, &game.given, &game.solution);

    let events = vec![
        Outbound::to_player(
            player_id,
            RoomEvent::CellUpdate {
                player_id: player_id.to_string(),
                row: r,
                col: c,
                value,
                notes: seat.notes[r][c],
                correct,
                conflicts: conflicts.clone(),
            },
        ),
        Outbound::room(RoomEvent::ProgressUpdate {
            player_id: player_id.to_string(),
            progress: seat.progress,
            errors: seat.errors,
        }),
    ];
    Ok((events, conflicts))
}

fn sudoku_toggle_note(
    room: &mut Room,
    player_id: &str,
    row: i32,
    col: i32,
    value: i32,
) -> Result<Vec<Outbound>, DomainError> {
    let (r, c) = cell_index(row, col, SIZE)?;
    if !(1..=9).contains(&value) {
        return Err(invalid_move(format!("Note {value} is out of range")));
    }
    let (game, seat) = race_parts(room, player_id)?;
    if seat.is_terminal() {
        return Err(already_finished());
    }
    if game.given[r][c] != 0 {
        return Err(invalid_move("Given cells cannot hold notes"));
    }
    seat.notes[r][c] ^= 1 << value;

    Ok(vec![Outbound::to_player(
        player_id,
        RoomEvent::CellUpdate {
            player_id: player_id.to_string(),
            row: r,
            col: c,
            value: seat.grid[r][c],
            notes: seat.notes[r][c],
            correct: seat.grid[r][c] != 0 && seat.grid[r][c] == game.solution[r][c],
            conflicts: Vec::new(),
        },
    )])
}

/// Instant the current Caro turn runs out, if a turn clock is running.
pub fn turn_deadline(game: &CaroGame, rules: &RoomRules) -> Option<OffsetDateTime> {
    if game.pause.is_some() {
        return None;
    }
    Some(game.turn_started_at + rules.turn_len)
}

fn caro_place(
    room: &mut Room,
    player_id: &str,
    row: i32,
    col: i32,
    now: OffsetDateTime,
) -> Result<Vec<Outbound>, DomainError> {
    let symbol = room
        .player(player_id)
        .and_then(Player::symbol)
        .ok_or_else(|| wrong_kind("Placing a stone"))?;

    let game = match &mut room.status {
        RoomStatus::Playing {
            game: ActiveGame::Caro(g),
            ..
        } => g,
        _ => return Err(wrong_kind("Placing a stone")),
    };
    if game.pause.is_some() {
        return Err(DomainError::conflict(ConflictKind::GamePaused, "Game is paused"));
    }
    if game.turn != symbol {
        return Err(DomainError::conflict(ConflictKind::NotYourTurn, "Not your turn"));
    }
    let (r, c) = cell_index(row, col, BOARD_SIZE)?;
    if !game.board.is_empty_at(r, c) {
        return Err(invalid_move(format!("Cell ({r}, {c}) is occupied")));
    }

    game.board.place(r, c, symbol);
    game.move_count += 1;
    game.last_move = Some(CaroMove {
        row: r,
        col: c,
        symbol,
    });

    let outcome = if check_winner(&game.board, r, c, symbol) {
        Some((Some(player_id.to_string()), EndReason::FiveInRow))
    } else if is_board_full(&game.board) {
        Some((None, EndReason::Draw))
    } else {
        game.turn = symbol.opponent();
        game.turn_started_at = now;
        None
    };
    let move_count = game.move_count;

    let mut events = vec![Outbound::room(RoomEvent::MoveMade {
        player_id: player_id.to_string(),
        row: r,
        col: c,
        symbol,
        next_turn: outcome.is_none().then_some(symbol.opponent()),
        move_count,
    })];
    if let Some((winner, reason)) = outcome {
        events.push(finish(room, winner, reason, now));
    }
    Ok(events)
}

/// Finish the race once every racer still seated is terminal.
///
/// Winner: earliest finish relative to the start, then fewer errors, then
/// join order. Racers who completed and then left still count. No completed
/// racer means no winner.
fn maybe_finish_race(room: &mut Room, now: OffsetDateTime) -> Option<Outbound> {
    let all_terminal = room
        .players
        .iter()
        .filter_map(Player::race)
        .all(RaceSeat::is_terminal);
    if !all_terminal {
        return None;
    }
    let game = room.sudoku()?;
    let winner = game
        .finishers
        .iter()
        .enumerate()
        .min_by_key(|(order, f)| (f.elapsed_ms, f.errors, f.joined_at, *order))
        .map(|(_, f)| f.player_id.clone());
    let reason = if winner.is_some() {
        EndReason::Completed
    } else {
        EndReason::AllGaveUp
    };
    Some(finish(room, winner, reason, now))
}

pub fn complete_sudoku(
    room: &mut Room,
    player_id: &str,
    grid: &Grid,
    now: OffsetDateTime,
) -> Result<Vec<Outbound>, DomainError> {
    require_playing(room)?;
    require_member(room, player_id)?;
    let started_at = room.started_at().unwrap_or(now);
    let joined_at = room.player(player_id).map_or(now, |p| p.joined_at);

    let (game, seat) = race_parts(room, player_id)?;
    if seat.is_terminal() {
        return Err(already_finished());
    }
    if *grid != game.solution {
        return Err(DomainError::validation(
            ValidationKind::IncorrectSolution,
            "Submitted grid does not match the solution",
        ));
    }
    seat.grid = *grid;
    seat.progress = 100;
    seat.finished_at = Some(now);
    let errors = seat.errors;
    let elapsed = elapsed_ms(started_at, now);
    game.finishers.push(Finisher {
        player_id: player_id.to_string(),
        elapsed_ms: elapsed,
        errors,
        joined_at,
    });
    let rank = game.finishers.len();

    let mut events = vec![
        Outbound::room(RoomEvent::ProgressUpdate {
            player_id: player_id.to_string(),
            progress: 100,
            errors,
        }),
        Outbound::room(RoomEvent::PlayerCompleted {
            player_id: player_id.to_string(),
            elapsed_ms: elapsed,
            rank,
        }),
    ];
    events.extend(maybe_finish_race(room, now));
    Ok(events)
}

fn opponent_of(room: &Room, player_id: &str) -> Option<PlayerId> {
    room.players
        .iter()
        .find(|p| p.id != player_id)
        .map(|p| p.id.clone())
}

pub fn give_up(
    room: &mut Room,
    player_id: &str,
    now: OffsetDateTime,
) -> Result<Vec<Outbound>, DomainError> {
    require_playing(room)?;
    require_member(room, player_id)?;

    let gave_up = Outbound::room(RoomEvent::PlayerGaveUp {
        player_id: player_id.to_string(),
    });
    if room.caro().is_some() {
        let winner = opponent_of(room, player_id);
        let ended = finish(room, winner, EndReason::GaveUp, now);
        return Ok(vec![gave_up, ended]);
    }

    let (_, seat) = race_parts(room, player_id)?;
    if seat.is_terminal() {
        return Err(already_finished());
    }
    seat.gave_up = true;
    let mut events = vec![gave_up];
    events.extend(maybe_finish_race(room, now));
    Ok(events)
}

/// Remove a player from the roster.
///
/// Leaving a running Caro game forfeits it. Leaving a Sudoku race drops the
/// racer and may finish the race. Host passes to the next player in join
/// order. A room with no human left is deleted.
pub fn leave(
    room: &mut Room,
    player_id: &str,
    now: OffsetDateTime,
) -> Result<LeaveOutcome, DomainError> {
    require_member(room, player_id)?;
    let mut events = Vec::new();

    let forfeits = room.caro().is_some();
    if forfeits {
        let winner = opponent_of(room, player_id);
        events.push(finish(room, winner, EndReason::OpponentLeft, now));
    }

    room.players.retain(|p| p.id != player_id);

    let mut new_host = None;
    if room.host_id == player_id {
        if let Some(next) = room.players.iter_mut().find(|p| !p.is_bot) {
            next.ready = true;
            room.host_id = next.id.clone();
            new_host = Some(next.id.clone());
        }
    }

    events.insert(
        0,
        Outbound::room(RoomEvent::PlayerLeft {
            player_id: player_id.to_string(),
            new_host,
        }),
    );

    if room.is_abandoned() {
        return Ok(LeaveOutcome::Deleted(events));
    }
    if room.sudoku().is_some() {
        events.extend(maybe_finish_race(room, now));
    }
    Ok(LeaveOutcome::Remaining(events))
}

fn remaining_ms(game: &CaroGame, rules: &RoomRules, now: OffsetDateTime) -> u64 {
    let turn_ms = rules.turn_len.as_millis() as u64;
    turn_ms.saturating_sub(elapsed_ms(game.turn_started_at, now))
}

fn caro_game_mut<'a>(room: &'a mut Room, action: &str) -> Result<&'a mut CaroGame, DomainError> {
    require_playing(room)?;
    match &mut room.status {
        RoomStatus::Playing {
            game: ActiveGame::Caro(g),
            ..
        } => Ok(g),
        _ => Err(wrong_kind(action)),
    }
}

pub fn pause(
    room: &mut Room,
    player_id: &str,
    rules: &RoomRules,
    now: OffsetDateTime,
) -> Result<Vec<Outbound>, DomainError> {
    if room.kind() != GameKind::Caro {
        return Err(wrong_kind("Pause"));
    }
    require_member(room, player_id)?;
    let game = caro_game_mut(room, "Pause")?;
    if game.pause.is_some() {
        return Err(DomainError::conflict(ConflictKind::AlreadyPaused, "Game is already paused"));
    }
    let remaining = remaining_ms(game, rules, now);
    game.pause = Some(PauseInfo {
        paused_by: player_id.to_string(),
        paused_at: now,
        remaining_ms: remaining,
    });
    Ok(vec![Outbound::room(RoomEvent::GamePaused {
        paused_by: player_id.to_string(),
        remaining_ms: remaining,
    })])
}

pub fn resume(
    room: &mut Room,
    player_id: &str,
    rules: &RoomRules,
    now: OffsetDateTime,
) -> Result<Vec<Outbound>, DomainError> {
    if room.kind() != GameKind::Caro {
        return Err(wrong_kind("Resume"));
    }
    require_member(room, player_id)?;
    let game = caro_game_mut(room, "Resume")?;
    let Some(pause) = game.pause.as_ref() else {
        return Err(DomainError::conflict(ConflictKind::NotPaused, "Game is not paused"));
    };
    if pause.paused_by != player_id {
        return Err(DomainError::forbidden(
            ForbiddenKind::NotPausedByYou,
            "Only the player who paused can resume",
        ));
    }
    let remaining = pause.remaining_ms;
    let used = rules
        .turn_len
        .saturating_sub(Duration::from_millis(remaining));
    game.turn_started_at = now - used;
    game.pause = None;
    Ok(vec![Outbound::room(RoomEvent::GameResumed {
        resumed_by: player_id.to_string(),
        remaining_ms: remaining,
    })])
}

/// Forfeit the current turn owner when the turn clock has run out.
///
/// Stale expiries (paused, finished, or the turn moved on) are no-ops.
pub fn expire_turn(
    room: &mut Room,
    rules: &RoomRules,
    now: OffsetDateTime,
) -> Result<Vec<Outbound>, DomainError> {
    let Some(game) = room.caro() else {
        return Ok(Vec::new());
    };
    match turn_deadline(game, rules) {
        Some(deadline) if now >= deadline => {}
        _ => return Ok(Vec::new()),
    }
    let turn = game.turn;
    let Some(loser) = room.player_with_symbol(turn).map(|p| p.id.clone()) else {
        return Ok(Vec::new());
    };
    let winner = room.player_with_symbol(turn.opponent()).map(|p| p.id.clone());
    let timeout = Outbound::room(RoomEvent::PlayerTimeout {
        player_id: loser,
        cause: TimeoutCause::Turn,
    });
    let ended = finish(room, winner, EndReason::Timeout, now);
    Ok(vec![timeout, ended])
}

/// Remove a player whose disconnect grace ran out. No-op if they came back.
pub fn expire_grace(
    room: &mut Room,
    player_id: &str,
    now: OffsetDateTime,
) -> Result<LeaveOutcome, DomainError> {
    let still_gone = room.player(player_id).is_some_and(|p| !p.connected);
    if !still_gone || room.is_finished() {
        return Ok(LeaveOutcome::Remaining(Vec::new()));
    }
    let timeout = Outbound::room(RoomEvent::PlayerTimeout {
        player_id: player_id.to_string(),
        cause: TimeoutCause::Disconnect,
    });
    Ok(match leave(room, player_id, now)? {
        LeaveOutcome::Remaining(mut events) => {
            events.insert(0, timeout);
            LeaveOutcome::Remaining(events)
        }
        LeaveOutcome::Deleted(mut events) => {
            events.insert(0, timeout);
            LeaveOutcome::Deleted(events)
        }
    })
}

pub fn set_connected(
    room: &mut Room,
    player_id: &str,
    connected: bool,
) -> Result<Vec<Outbound>, DomainError> {
    require_member(room, player_id)?;
    let Some(player) = room.player_mut(player_id) else {
        return Ok(Vec::new());
    };
    if player.connected == connected {
        return Ok(Vec::new());
    }
    player.connected = connected;
    let player_id = player_id.to_string();
    let event = if connected {
        RoomEvent::PlayerReconnected { player_id }
    } else {
        RoomEvent::PlayerDisconnected { player_id }
    };
    Ok(vec![Outbound::room(event)])
}
