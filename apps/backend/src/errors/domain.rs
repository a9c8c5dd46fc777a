//! Domain-level error type used across the state machine, services and stores.
//!
//! This error type is HTTP- and DB-agnostic. Handlers should return
//! `Result<T, crate::error::AppError>` and convert from `DomainError`
//! using the provided `From<DomainError> for AppError` implementation.

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

use super::ErrorCode;

/// Infra error kinds to distinguish operational failures
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InfraErrorKind {
    Timeout,
    DbUnavailable,
    DataCorruption,
    Other(String),
}

/// Domain-level not found entities
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotFoundKind {
    Room,
    Session,
    Progress,
    Other(String),
}

/// Malformed or rule-breaking input
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationKind {
    InvalidMove,
    IncorrectSolution,
    WrongGameKind,
    InvalidSettings,
    Other(String),
}

/// Caller lacks the role the action requires
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ForbiddenKind {
    NotHost,
    PlayerNotInRoom,
    NotPausedByYou,
}

/// Action conflicts with the current room state
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConflictKind {
    RoomFull,
    GameAlreadyStarted,
    GameNotStarted,
    AlreadyFinished,
    NotYourTurn,
    NotReady,
    HostAlwaysReady,
    GamePaused,
    AlreadyPaused,
    NotPaused,
    TurnTimeoutExceeded,
    OptimisticLock,
    JoinCodeConflict,
    Other(String),
}

/// Central domain error type
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Input/user validation or business rule violation
    Validation(ValidationKind, String),
    /// Caller is not allowed to perform the action
    Forbidden(ForbiddenKind, String),
    /// Semantic conflict with the current state
    Conflict(ConflictKind, String),
    /// Missing resource in domain terms
    NotFound(NotFoundKind, String),
    /// Infrastructure/operational failures
    Infra(InfraErrorKind, String),
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DomainError::Validation(kind, d) => write!(f, "validation error {kind:?}: {d}"),
            DomainError::Forbidden(kind, d) => write!(f, "forbidden {kind:?}: {d}"),
            DomainError::Conflict(kind, d) => write!(f, "conflict {kind:?}: {d}"),
            DomainError::NotFound(kind, d) => write!(f, "not found {kind:?}: {d}"),
            DomainError::Infra(kind, d) => write!(f, "infra {kind:?}: {d}"),
        }
    }
}

impl Error for DomainError {}

impl DomainError {
    pub fn validation(kind: ValidationKind, detail: impl Into<String>) -> Self {
        Self::Validation(kind, detail.into())
    }
    pub fn forbidden(kind: ForbiddenKind, detail: impl Into<String>) -> Self {
        Self::Forbidden(kind, detail.into())
    }
    pub fn conflict(kind: ConflictKind, detail: impl Into<String>) -> Self {
        Self::Conflict(kind, detail.into())
    }
    pub fn not_found(kind: NotFoundKind, detail: impl Into<String>) -> Self {
        Self::NotFound(kind, detail.into())
    }
    pub fn infra(kind: InfraErrorKind, detail: impl Into<String>) -> Self {
        Self::Infra(kind, detail.into())
    }

    /// Wire code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            DomainError::Validation(kind, _) => match kind {
                ValidationKind::InvalidMove => ErrorCode::InvalidMove,
                ValidationKind::IncorrectSolution => ErrorCode::IncorrectSolution,
                ValidationKind::WrongGameKind => ErrorCode::WrongGameKind,
                ValidationKind::InvalidSettings | ValidationKind::Other(_) => {
                    ErrorCode::ValidationError
                }
            },
            DomainError::Forbidden(kind, _) => match kind {
                ForbiddenKind::NotHost => ErrorCode::NotHost,
                ForbiddenKind::PlayerNotInRoom => ErrorCode::PlayerNotInRoom,
                ForbiddenKind::NotPausedByYou => ErrorCode::NotPausedByYou,
            },
            DomainError::Conflict(kind, _) => match kind {
                ConflictKind::RoomFull => ErrorCode::RoomFull,
                ConflictKind::GameAlreadyStarted => ErrorCode::GameAlreadyStarted,
                ConflictKind::GameNotStarted => ErrorCode::GameNotStarted,
                ConflictKind::AlreadyFinished => ErrorCode::AlreadyFinished,
                ConflictKind::NotYourTurn => ErrorCode::NotYourTurn,
                ConflictKind::NotReady => ErrorCode::NotReady,
                ConflictKind::HostAlwaysReady => ErrorCode::HostAlwaysReady,
                ConflictKind::GamePaused => ErrorCode::GamePaused,
                ConflictKind::AlreadyPaused => ErrorCode::AlreadyPaused,
                ConflictKind::NotPaused => ErrorCode::NotPaused,
                ConflictKind::TurnTimeoutExceeded => ErrorCode::TurnTimeoutExceeded,
                ConflictKind::OptimisticLock => ErrorCode::OptimisticLock,
                ConflictKind::JoinCodeConflict => ErrorCode::JoinCodeConflict,
                ConflictKind::Other(_) => ErrorCode::ValidationError,
            },
            DomainError::NotFound(kind, _) => match kind {
                NotFoundKind::Room => ErrorCode::RoomNotFound,
                NotFoundKind::Session => ErrorCode::SessionNotFound,
                NotFoundKind::Progress => ErrorCode::ProgressNotFound,
                NotFoundKind::Other(_) => ErrorCode::NotFound,
            },
            DomainError::Infra(kind, _) => match kind {
                InfraErrorKind::DbUnavailable | InfraErrorKind::Timeout => ErrorCode::DbUnavailable,
                InfraErrorKind::DataCorruption => ErrorCode::DataCorruption,
                InfraErrorKind::Other(_) => ErrorCode::DbError,
            },
        }
    }

    /// True for the version-mismatch conflict the room service retries once.
    pub fn is_optimistic_lock(&self) -> bool {
        matches!(self, DomainError::Conflict(ConflictKind::OptimisticLock, _))
    }

    pub fn detail(&self) -> &str {
        match self {
            DomainError::Validation(_, d)
            | DomainError::Forbidden(_, d)
            | DomainError::Conflict(_, d)
            | DomainError::NotFound(_, d)
            | DomainError::Infra(_, d) => d,
        }
    }
}
