//! Room code generation.
//!
//! Codes are uppercase alphanumerics drawn from an alphabet without the
//! look-alike characters `I`, `O`, `0` and `1`. Sudoku rooms get 6
//! characters, Caro rooms 8.

use rand::Rng;

use crate::domain::room::GameKind;

const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const SUDOKU_CODE_LEN: usize = 6;
pub const CARO_CODE_LEN: usize = 8;

pub fn code_len(kind: GameKind) -> usize {
    match kind {
        GameKind::Sudoku => SUDOKU_CODE_LEN,
        GameKind::Caro => CARO_CODE_LEN,
    }
}

/// Generate a random room code for the given game kind.
///
/// Uniqueness is not guaranteed here; the room service retries against the store.
pub fn generate_room_code(kind: GameKind) -> String {
    let mut rng = rand::rng();
    (0..code_len(kind))
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Uppercase and validate a client-supplied code. Returns `None` when the
/// shape cannot belong to any room.
pub fn normalize_room_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_ascii_uppercase();
    let len_ok = code.len() == SUDOKU_CODE_LEN || code.len() == CARO_CODE_LEN;
    (len_ok && code.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())).then_some(code)
}
