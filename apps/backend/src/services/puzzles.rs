//! Sudoku puzzle provider.
//!
//! `GeneratedPuzzles` fills a random valid grid, then removes cells in random
//! order as long as the solver still finds exactly one solution, stopping at
//! the difficulty's clue target.

use async_trait::async_trait;
use rand::prelude::*;
use tracing::debug;
use uuid::Uuid;

use crate::domain::sudoku::{count_givens, count_solutions, Difficulty, Grid, Puzzle, EMPTY_GRID, SIZE};
use crate::errors::domain::{DomainError, InfraErrorKind};

#[async_trait]
pub trait PuzzleProvider: Send + Sync {
    async fn generate(&self, difficulty: Difficulty) -> Result<Puzzle, DomainError>;
}

/// Generates fresh puzzles on the blocking pool.
#[derive(Debug, Clone, Default)]
pub struct GeneratedPuzzles {
    seed: Option<u64>,
}

impl GeneratedPuzzles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic generation for tests.
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }
}

#[async_trait]
impl PuzzleProvider for GeneratedPuzzles {
    async fn generate(&self, difficulty: Difficulty) -> Result<Puzzle, DomainError> {
        let seed = self.seed;
        let puzzle = tokio::task::spawn_blocking(move || {
            let mut rng = match seed {
                Some(s) => StdRng::seed_from_u64(s),
                None => StdRng::from_os_rng(),
            };
            generate_puzzle(difficulty, &mut rng)
        })
        .await
        .map_err(|e| {
            DomainError::infra(
                InfraErrorKind::Other("PuzzleGeneration".into()),
                format!("Puzzle generation task failed: {e}"),
            )
        })?;
        debug!(
            puzzle_id = %puzzle.id,
            difficulty = %difficulty,
            clues = count_givens(&puzzle.given),
            "Generated puzzle"
        );
        Ok(puzzle)
    }
}

/// Always hands out the same puzzle (with a fresh id).
#[derive(Debug, Clone)]
pub struct FixedPuzzle {
    given: Grid,
    solution: Grid,
}

impl FixedPuzzle {
    pub fn new(given: Grid, solution: Grid) -> Self {
        Self { given, solution }
    }
}

#[async_trait]
impl PuzzleProvider for FixedPuzzle {
    async fn generate(&self, difficulty: Difficulty) -> Result<Puzzle, DomainError> {
        Ok(Puzzle {
            id: Uuid::new_v4().to_string(),
            difficulty,
            given: self.given,
            solution: self.solution,
        })
    }
}

pub fn generate_puzzle<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Puzzle {
    let mut solution = EMPTY_GRID;
    fill(&mut solution, 0, rng);

    let mut given = solution;
    let mut cells: Vec<(usize, usize)> = (0..SIZE)
        .flat_map(|r| (0..SIZE).map(move |c| (r, c)))
        .collect();
    cells.shuffle(rng);

    let target = difficulty.clue_target();
    let mut clues = SIZE * SIZE;
    for (r, c) in cells {
        if clues <= target {
            break;
        }
        let kept = given[r][c];
        given[r][c] = 0;
        if count_solutions(&given, 2) == 1 {
            clues -= 1;
        } else {
            given[r][c] = kept;
        }
    }

    Puzzle {
        id: Uuid::new_v4().to_string(),
        difficulty,
        given,
        solution,
    }
}

/// Randomized backtracking fill, cell by cell in row-major order.
fn fill<R: Rng + ?Sized>(grid: &mut Grid, index: usize, rng: &mut R) -> bool {
    if index == SIZE * SIZE {
        return true;
    }
    let (r, c) = (index / SIZE, index % SIZE);
    let mut digits: Vec<u8> = (1..=9).collect();
    digits.shuffle(rng);
    for d in digits {
        if allowed(grid, r, c, d) {
            grid[r][c] = d;
            if fill(grid, index + 1, rng) {
                return true;
            }
            grid[r][c] = 0;
        }
    }
    false
}

fn allowed(grid: &Grid, r: usize, c: usize, d: u8) -> bool {
    let (br, bc) = (r / 3 * 3, c / 3 * 3);
    (0..SIZE).all(|i| grid[r][i] != d && grid[i][c] != d)
        && (0..3).all(|i| (0..3).all(|j| grid[br + i][bc + j] != d))
}
