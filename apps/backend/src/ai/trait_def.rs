//! Caro bot trait definition.

use std::fmt;

use crate::domain::caro::{Board, Symbol};
use crate::error::AppError;

/// Errors that can occur while the bot picks a move.
#[derive(Debug)]
pub enum AiError {
    /// Bot encountered an internal error
    Internal(String),
    /// No legal move exists
    NoMoves,
}

impl fmt::Display for AiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiError::Internal(msg) => write!(f, "AI internal error: {msg}"),
            AiError::NoMoves => write!(f, "AI has no legal move"),
        }
    }
}

impl std::error::Error for AiError {}

impl From<AiError> for AppError {
    fn from(err: AiError) -> Self {
        AppError::internal(format!("AI error: {err}"))
    }
}

/// A Caro opponent.
///
/// Implementations receive the current board and the symbol they play and
/// must return an empty cell.
pub trait CaroAi: Send + Sync {
    fn choose_move(&self, board: &Board, me: Symbol) -> Result<(usize, usize), AiError>;
}
