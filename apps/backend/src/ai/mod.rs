//! Caro bot: picks replies for the bot seat of `vs_bot` rooms.

mod minimax;
mod trait_def;

pub use minimax::MinimaxBot;
pub use trait_def::{AiError, CaroAi};
