//! Caro (Gomoku) board and rule checks.
//!
//! All functions here are pure: no I/O, no clocks.

use serde::{Deserialize, Serialize};

pub const BOARD_SIZE: usize = 15;
pub const WIN_LENGTH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    pub fn opponent(self) -> Symbol {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }
}

/// 15×15 shared board; `None` is an empty cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: [[Option<Symbol>; BOARD_SIZE]; BOARD_SIZE],
}

impl Default for Board {
    fn default() -> Self {
        Self {
            cells: [[None; BOARD_SIZE]; BOARD_SIZE],
        }
    }
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_bounds(row: i32, col: i32) -> bool {
        row >= 0 && col >= 0 && (row as usize) < BOARD_SIZE && (col as usize) < BOARD_SIZE
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Symbol> {
        self.cells.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    pub fn is_empty_at(&self, row: usize, col: usize) -> bool {
        row < BOARD_SIZE && col < BOARD_SIZE && self.cells[row][col].is_none()
    }

    pub fn place(&mut self, row: usize, col: usize, symbol: Symbol) {
        self.cells[row][col] = Some(symbol);
    }

    pub fn clear(&mut self, row: usize, col: usize) {
        self.cells[row][col] = None;
    }

    pub fn stone_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }

    pub fn empty_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..BOARD_SIZE).flat_map(move |r| {
            (0..BOARD_SIZE).filter_map(move |c| self.cells[r][c].is_none().then_some((r, c)))
        })
    }
}

const DIRECTIONS: [(i32, i32); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Length of the contiguous run of `symbol` through `(row, col)` along
/// `(dr, dc)`, plus whether each end is blocked by the opponent.
///
/// The board edge is not a block: only an opposing stone closes an end.
fn run_through(
    board: &Board,
    row: usize,
    col: usize,
    symbol: Symbol,
    (dr, dc): (i32, i32),
) -> (usize, bool, bool) {
    let walk = |sign: i32| -> (usize, bool) {
        let mut len = 0;
        let mut r = row as i32 + dr * sign;
        let mut c = col as i32 + dc * sign;
        while Board::in_bounds(r, c) {
            match board.get(r as usize, c as usize) {
                Some(s) if s == symbol => len += 1,
                Some(_) => return (len, true),
                None => return (len, false),
            }
            r += dr * sign;
            c += dc * sign;
        }
        (len, false)
    };

    let (forward, forward_blocked) = walk(1);
    let (backward, backward_blocked) = walk(-1);
    (1 + forward + backward, backward_blocked, forward_blocked)
}

/// Whether the stone just placed at `(row, col)` wins for `symbol`.
///
/// A run of five or more wins unless the opponent caps it on both ends.
pub fn check_winner(board: &Board, row: usize, col: usize, symbol: Symbol) -> bool {
    if board.get(row, col) != Some(symbol) {
        return false;
    }
    DIRECTIONS.iter().any(|&dir| {
        let (len, start_blocked, end_blocked) = run_through(board, row, col, symbol, dir);
        len >= WIN_LENGTH && !(start_blocked && end_blocked)
    })
}

pub fn is_board_full(board: &Board) -> bool {
    board.empty_cells().next().is_none()
}
