//! Property tests for room and rule invariants.

use proptest::prelude::*;

use super::caro::{check_winner, Board, Symbol, BOARD_SIZE};
use super::room::RoomStatus;
use super::sudoku::fixtures::SOLUTION;
use super::sudoku::{find_conflicts, SIZE};
use super::test_helpers::{join, ok, started_caro, step, sudoku_room, T0};
use super::transitions::{Move, RoomAction};

proptest! {
    #[test]
    fn roster_never_exceeds_max(max in 2u8..=4, joins in 0usize..8) {
        let mut room = sudoku_room(max);
        for i in 0..joins {
            if let Ok(applied) = step(&room, join(&format!("p{i}")), T0) {
                room = applied.room;
            }
            prop_assert!(room.players.len() <= max as usize);
        }
    }

    #[test]
    fn solved_grid_values_never_conflict(row in 0usize..SIZE, col in 0usize..SIZE) {
        prop_assert!(find_conflicts(&SOLUTION, row, col, SOLUTION[row][col]).is_empty());
    }

    #[test]
    fn caro_turn_strictly_alternates(cells in proptest::collection::vec((0i32..15, 0i32..15), 1..40)) {
        let mut room = started_caro();
        let mut expected = Symbol::X;
        for (row, col) in cells {
            let Some(game) = room.caro() else { break };
            prop_assert_eq!(game.turn, expected);
            let mover = room.player_with_symbol(expected).unwrap().id.clone();
            let action = RoomAction::Move { player_id: mover, mv: Move::Place { row, col } };
            if let Ok(applied) = step(&room, action, T0) {
                room = applied.room;
                if matches!(room.status, RoomStatus::Playing { .. }) {
                    expected = expected.opponent();
                }
            }
        }
    }

    #[test]
    fn exactly_five_flanked_by_opponent_never_wins(
        start_col in 1usize..(BOARD_SIZE - 5),
        row in 0usize..BOARD_SIZE,
    ) {
        let mut board = Board::new();
        for c in start_col..start_col + 5 {
            board.place(row, c, Symbol::X);
        }
        board.place(row, start_col - 1, Symbol::O);
        board.place(row, start_col + 5, Symbol::O);
        for c in start_col..start_col + 5 {
            prop_assert!(!check_winner(&board, row, c, Symbol::X));
        }
    }
}

#[test]
fn repeated_join_is_idempotent() {
    let room = ok(&sudoku_room(4), join("bob"), T0);
    let again = ok(&room, join("bob"), T0);
    assert_eq!(again.players.iter().filter(|p| p.id == "bob").count(), 1);
}
