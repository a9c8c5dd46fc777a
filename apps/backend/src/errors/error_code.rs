//! Error codes for the Arena backend API.
//!
//! This module defines all error codes used throughout the application.
//! Add new codes here; never pass ad-hoc strings as error codes.
//!
//! All error codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings
//! that appear in HTTP responses and websocket error frames.

use core::fmt;

use serde::{Serialize, Serializer};

/// Centralized error codes for the Arena backend API.
///
/// Clients branch on these strings, so a variant's wire value must never
/// change once released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Identity
    /// Request carried no session id / display name
    SessionRequired,
    /// Session id was not found
    SessionNotFound,

    // Resource Not Found
    /// Room code does not resolve to a room
    RoomNotFound,
    /// Sudoku race progress record missing
    ProgressNotFound,
    /// General not found error
    NotFound,

    // Room preconditions
    /// Room already holds the maximum number of players
    RoomFull,
    /// Room has left the waiting state
    GameAlreadyStarted,
    /// Room has not started yet
    GameNotStarted,
    /// Caller is not the host
    NotHost,
    /// Start requested before the ready condition holds
    NotReady,
    /// Host readiness is implicit and cannot be toggled
    HostAlwaysReady,
    /// Caller does not occupy a slot in the room
    PlayerNotInRoom,
    /// Caro move out of turn
    NotYourTurn,
    /// Occupied cell, given cell, or out-of-range input
    InvalidMove,
    /// Room (or the caller's race) is already over
    AlreadyFinished,
    /// Move arrived after the turn clock ran out
    TurnTimeoutExceeded,
    /// Action is not valid while the turn clock is paused
    GamePaused,
    /// Pause requested while already paused
    AlreadyPaused,
    /// Resume requested while not paused
    NotPaused,
    /// Resume requested by someone other than the pausing player
    NotPausedByYou,
    /// Action does not exist for this game kind
    WrongGameKind,
    /// Submitted Sudoku grid does not match the solution
    IncorrectSolution,

    // Request Validation
    /// General validation error
    ValidationError,
    /// General bad request error
    BadRequest,
    /// Invalid room code format
    InvalidRoomCode,

    // Concurrency
    /// Document changed between load and save
    OptimisticLock,
    /// Could not allocate a unique room code
    JoinCodeConflict,

    // System Errors
    /// Database error
    DbError,
    /// Database unavailable
    DbUnavailable,
    /// Internal server error
    InternalError,
    /// Configuration error
    ConfigError,
    /// Stored document could not be decoded
    DataCorruption,
}

impl ErrorCode {
    /// Returns the canonical SCREAMING_SNAKE_CASE string for this error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SessionRequired => "SESSION_REQUIRED",
            Self::SessionNotFound => "SESSION_NOT_FOUND",

            Self::RoomNotFound => "ROOM_NOT_FOUND",
            Self::ProgressNotFound => "PROGRESS_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",

            Self::RoomFull => "ROOM_FULL",
            Self::GameAlreadyStarted => "GAME_ALREADY_STARTED",
            Self::GameNotStarted => "GAME_NOT_STARTED",
            Self::NotHost => "NOT_HOST",
            Self::NotReady => "NOT_READY",
            Self::HostAlwaysReady => "HOST_ALWAYS_READY",
            Self::PlayerNotInRoom => "PLAYER_NOT_IN_ROOM",
            Self::NotYourTurn => "NOT_YOUR_TURN",
            Self::InvalidMove => "INVALID_MOVE",
            Self::AlreadyFinished => "ALREADY_FINISHED",
            Self::TurnTimeoutExceeded => "TURN_TIMEOUT_EXCEEDED",
            Self::GamePaused => "GAME_PAUSED",
            Self::AlreadyPaused => "ALREADY_PAUSED",
            Self::NotPaused => "NOT_PAUSED",
            Self::NotPausedByYou => "NOT_PAUSED_BY_YOU",
            Self::WrongGameKind => "WRONG_GAME_KIND",
            Self::IncorrectSolution => "INCORRECT_SOLUTION",

            Self::ValidationError => "VALIDATION_ERROR",
            Self::BadRequest => "BAD_REQUEST",
            Self::InvalidRoomCode => "INVALID_ROOM_CODE",

            Self::OptimisticLock => "OPTIMISTIC_LOCK",
            Self::JoinCodeConflict => "JOIN_CODE_CONFLICT",

            Self::DbError => "DB_ERROR",
            Self::DbUnavailable => "DB_UNAVAILABLE",
            Self::InternalError => "INTERNAL_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::DataCorruption => "DATA_CORRUPTION",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
