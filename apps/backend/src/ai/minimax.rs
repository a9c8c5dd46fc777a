//! Bounded-depth minimax bot with alpha-beta pruning.
//!
//! Only cells within two steps of an existing stone are considered, and at
//! each ply the candidates are pre-sorted by a cheap local score and cut to
//! `breadth`. Equal-valued root moves are broken at random.

use std::sync::Mutex;

use rand::prelude::*;

use super::trait_def::{AiError, CaroAi};
use crate::domain::caro::{check_winner, is_board_full, Board, Symbol, BOARD_SIZE};

const WIN_SCORE: i64 = 10_000_000;
const DIRECTIONS: [(i32, i32); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

pub struct MinimaxBot {
    depth: u8,
    breadth: usize,
    rng: Mutex<StdRng>,
}

impl MinimaxBot {
    pub const NAME: &'static str = "MinimaxBot";

    /// `seed` makes tie-breaking reproducible in tests.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        Self {
            depth: 3,
            breadth: 10,
            rng: Mutex::new(rng),
        }
    }

    pub fn with_limits(mut self, depth: u8, breadth: usize) -> Self {
        self.depth = depth.max(1);
        self.breadth = breadth.max(1);
        self
    }
}

impl Default for MinimaxBot {
    fn default() -> Self {
        Self::new(None)
    }
}

impl CaroAi for MinimaxBot {
    fn choose_move(&self, board: &Board, me: Symbol) -> Result<(usize, usize), AiError> {
        if is_board_full(board) {
            return Err(AiError::NoMoves);
        }
        let center = BOARD_SIZE / 2;
        if board.stone_count() == 0 {
            return Ok((center, center));
        }

        let mut work = board.clone();
        let candidates = ordered_candidates(&work, me, self.breadth);

        // Take a win, or block one, without searching.
        for &(r, c) in &candidates {
            if wins_at(&mut work, r, c, me) {
                return Ok((r, c));
            }
        }
        for &(r, c) in &candidates {
            if wins_at(&mut work, r, c, me.opponent()) {
                return Ok((r, c));
            }
        }

        let mut best_score = i64::MIN;
        let mut best: Vec<(usize, usize)> = Vec::new();
        for &(r, c) in &candidates {
            work.place(r, c, me);
            let score = alphabeta(
                &mut work,
                self.depth - 1,
                i64::MIN / 2,
                i64::MAX / 2,
                false,
                me,
                (r, c),
                self.breadth,
            );
            work.clear(r, c);
            if score > best_score {
                best_score = score;
                best.clear();
                best.push((r, c));
            } else if score == best_score {
                best.push((r, c));
            }
        }

        let mut rng = self
            .rng
            .lock()
            .map_err(|e| AiError::Internal(format!("RNG lock poisoned: {e}")))?;
        best.choose(&mut *rng)
            .copied()
            .ok_or_else(|| AiError::Internal("No candidate move".into()))
    }
}

fn wins_at(board: &mut Board, r: usize, c: usize, symbol: Symbol) -> bool {
    board.place(r, c, symbol);
    let won = check_winner(board, r, c, symbol);
    board.clear(r, c);
    won
}

#[allow(clippy::too_many_arguments)]
fn alphabeta(
    board: &mut Board,
    depth: u8,
    mut alpha: i64,
    mut beta: i64,
    maximizing: bool,
    me: Symbol,
    last: (usize, usize),
    breadth: usize,
) -> i64 {
    let last_symbol = if maximizing { me.opponent() } else { me };
    if check_winner(board, last.0, last.1, last_symbol) {
        // Prefer faster wins and slower losses.
        let score = WIN_SCORE + depth as i64;
        return if last_symbol == me { score } else { -score };
    }
    if depth == 0 || is_board_full(board) {
        return evaluate(board, me);
    }

    let to_move = if maximizing { me } else { me.opponent() };
    let candidates = ordered_candidates(board, to_move, breadth);
    if maximizing {
        let mut value = i64::MIN / 2;
        for (r, c) in candidates {
            board.place(r, c, to_move);
            value = value.max(alphabeta(board, depth - 1, alpha, beta, false, me, (r, c), breadth));
            board.clear(r, c);
            alpha = alpha.max(value);
            if alpha >= beta {
                break;
            }
        }
        value
    } else {
        let mut value = i64::MAX / 2;
        for (r, c) in candidates {
            board.place(r, c, to_move);
            value = value.min(alphabeta(board, depth - 1, alpha, beta, true, me, (r, c), breadth));
            board.clear(r, c);
            beta = beta.min(value);
            if alpha >= beta {
                break;
            }
        }
        value
    }
}

/// Empty cells within two steps of a stone, best local score first.
fn ordered_candidates(board: &Board, to_move: Symbol, breadth: usize) -> Vec<(usize, usize)> {
    let mut scored: Vec<((usize, usize), i64)> = board
        .empty_cells()
        .filter(|&(r, c)| near_stone(board, r, c))
        .map(|(r, c)| {
            let attack = local_score(board, r, c, to_move);
            let defend = local_score(board, r, c, to_move.opponent());
            ((r, c), attack + defend)
        })
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.truncate(breadth);
    scored.into_iter().map(|(cell, _)| cell).collect()
}

fn near_stone(board: &Board, r: usize, c: usize) -> bool {
    for dr in -2i32..=2 {
        for dc in -2i32..=2 {
            let (nr, nc) = (r as i32 + dr, c as i32 + dc);
            if (dr, dc) != (0, 0)
                && Board::in_bounds(nr, nc)
                && board.get(nr as usize, nc as usize).is_some()
            {
                return true;
            }
        }
    }
    false
}

/// Score of the runs `symbol` would own through `(r, c)` if it played there.
fn local_score(board: &Board, r: usize, c: usize, symbol: Symbol) -> i64 {
    DIRECTIONS
        .iter()
        .map(|&(dr, dc)| {
            let mut len = 1;
            let mut open = 0;
            for sign in [1, -1] {
                let (mut nr, mut nc) = (r as i32 + dr * sign, c as i32 + dc * sign);
                loop {
                    if !Board::in_bounds(nr, nc) {
                        break;
                    }
                    match board.get(nr as usize, nc as usize) {
                        Some(s) if s == symbol => len += 1,
                        Some(_) => break,
                        None => {
                            open += 1;
                            break;
                        }
                    }
                    nr += dr * sign;
                    nc += dc * sign;
                }
            }
            run_value(len, open)
        })
        .sum()
}

fn run_value(len: usize, open_ends: u8) -> i64 {
    match (len.min(5), open_ends) {
        (5, _) => 1_000_000,
        (_, 0) => 0,
        (4, 2) => 100_000,
        (4, _) => 10_000,
        (3, 2) => 5_000,
        (3, _) => 500,
        (2, 2) => 200,
        (2, _) => 20,
        _ => 1,
    }
}

/// Static evaluation from `me`'s point of view.
fn evaluate(board: &Board, me: Symbol) -> i64 {
    let mine = side_score(board, me);
    let theirs = side_score(board, me.opponent());
    mine - theirs * 11 / 10
}

fn side_score(board: &Board, symbol: Symbol) -> i64 {
    let mut total = 0;
    for r in 0..BOARD_SIZE {
        for c in 0..BOARD_SIZE {
            if board.get(r, c) != Some(symbol) {
                continue;
            }
            for &(dr, dc) in &DIRECTIONS {
                // Count each run once, from its first stone.
                let (pr, pc) = (r as i32 - dr, c as i32 - dc);
                let prev = Board::in_bounds(pr, pc)
                    .then(|| board.get(pr as usize, pc as usize))
                    .flatten();
                if prev == Some(symbol) {
                    continue;
                }
                let mut open = u8::from(Board::in_bounds(pr, pc) && prev.is_none());
                let mut len = 0;
                let (mut nr, mut nc) = (r as i32, c as i32);
                while Board::in_bounds(nr, nc) && board.get(nr as usize, nc as usize) == Some(symbol) {
                    len += 1;
                    nr += dr;
                    nc += dc;
                }
                if Board::in_bounds(nr, nc) && board.get(nr as usize, nc as usize).is_none() {
                    open += 1;
                }
                total += run_value(len, open);
            }
        }
    }
    total
}
