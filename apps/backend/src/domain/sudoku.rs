//! Sudoku grid types and rule checks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::domain::{DomainError, ValidationKind};

pub const SIZE: usize = 9;
const BOX: usize = 3;

/// 9×9 grid; `0` is an empty cell.
pub type Grid = [[u8; SIZE]; SIZE];

/// Pencil marks per cell as a bitmask (bit `v` set means note `v`).
pub type Notes = [[u16; SIZE]; SIZE];

pub const EMPTY_GRID: Grid = [[0; SIZE]; SIZE];
pub const EMPTY_NOTES: Notes = [[0; SIZE]; SIZE];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    /// Number of givens a generated puzzle aims for.
    pub fn clue_target(self) -> usize {
        match self {
            Difficulty::Easy => 40,
            Difficulty::Medium => 32,
            Difficulty::Hard => 27,
            Difficulty::Expert => 24,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "expert" => Ok(Difficulty::Expert),
            other => Err(DomainError::validation(
                ValidationKind::InvalidSettings,
                format!("Unknown difficulty '{other}'"),
            )),
        }
    }
}

/// A generated puzzle with its unique solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    pub id: String,
    pub difficulty: Difficulty,
    pub given: Grid,
    pub solution: Grid,
}

fn peers(row: usize, col: usize) -> impl Iterator<Item = Cell> {
    let box_row = row / BOX * BOX;
    let box_col = col / BOX * BOX;
    let in_row = (0..SIZE).map(move |c| Cell { row, col: c });
    let in_col = (0..SIZE).map(move |r| Cell { row: r, col });
    let in_box = (0..BOX).flat_map(move |dr| {
        (0..BOX).map(move |dc| Cell {
            row: box_row + dr,
            col: box_col + dc,
        })
    });
    in_row
        .chain(in_col)
        .chain(in_box)
        .filter(move |c| !(c.row == row && c.col == col))
}

/// Peer cells (same row, column or box) holding `value`, excluding the cell itself.
///
/// Each peer appears once even when it shares both a line and the box.
pub fn find_conflicts(grid: &Grid, row: usize, col: usize, value: u8) -> Vec<Cell> {
    if value == 0 || row >= SIZE || col >= SIZE {
        return Vec::new();
    }
    let mut out: Vec<Cell> = Vec::new();
    for cell in peers(row, col) {
        if grid[cell.row][cell.col] == value && !out.contains(&cell) {
            out.push(cell);
        }
    }
    out
}

pub fn is_complete(grid: &Grid, solution: &Grid) -> bool {
    grid == solution
}

/// Percentage (0–100) of non-given cells holding their solution value.
pub fn progress_percent(grid: &Grid, given: &Grid, solution: &Grid) -> u8 {
    let mut open = 0u32;
    let mut correct = 0u32;
    for r in 0..SIZE {
        for c in 0..SIZE {
            if given[r][c] != 0 {
                continue;
            }
            open += 1;
            if grid[r][c] != 0 && grid[r][c] == solution[r][c] {
                correct += 1;
            }
        }
    }
    if open == 0 {
        return 100;
    }
    (correct * 100 / open) as u8
}

pub fn count_givens(grid: &Grid) -> usize {
    grid.iter().flatten().filter(|&&v| v != 0).count()
}

fn can_place(grid: &Grid, row: usize, col: usize, value: u8) -> bool {
    peers(row, col).all(|c| grid[c.row][c.col] != value)
}

/// Whether `grid` is a fully filled, rule-abiding Sudoku.
pub fn is_valid_solution(grid: &Grid) -> bool {
    for r in 0..SIZE {
        for c in 0..SIZE {
            let v = grid[r][c];
            if !(1..=9).contains(&v) || !can_place(grid, r, c, v) {
                return false;
            }
        }
    }
    true
}

/// Count solutions of `grid` by backtracking, stopping once `limit` is reached.
pub fn count_solutions(grid: &Grid, limit: usize) -> usize {
    let mut work = *grid;
    let mut found = 0;
    count_into(&mut work, limit, &mut found);
    found
}

fn count_into(grid: &mut Grid, limit: usize, found: &mut usize) {
    if *found >= limit {
        return;
    }
    // Branch on the empty cell with the fewest candidates.
    let mut best: Option<(usize, usize, Vec<u8>)> = None;
    for r in 0..SIZE {
        for c in 0..SIZE {
            if grid[r][c] != 0 {
                continue;
            }
            let candidates: Vec<u8> = (1..=9).filter(|&v| can_place(grid, r, c, v)).collect();
            if candidates.is_empty() {
                return;
            }
            let better = best
                .as_ref()
                .map_or(true, |(_, _, b)| candidates.len() < b.len());
            if better {
                best = Some((r, c, candidates));
            }
        }
    }
    let Some((r, c, candidates)) = best else {
        *found += 1;
        return;
    };
    for v in candidates {
        grid[r][c] = v;
        count_into(grid, limit, found);
        if *found >= limit {
            break;
        }
    }
    grid[r][c] = 0;
}
