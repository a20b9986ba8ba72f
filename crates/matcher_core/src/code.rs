//! crates/matcher_core/src/code.rs
//!
//! Generation and validation of the 4-character session codes.
//! `0` and `1` are left out of the alphabet so codes read back unambiguously.

use rand::Rng;

/// The symbols a session code is drawn from.
pub const ALPHABET: &[u8; 8] = b"23456789";

/// Number of characters in a session code.
pub const CODE_LEN: usize = 4;

/// Draws `CODE_LEN` independent characters uniformly from [`ALPHABET`].
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// True if `candidate` is exactly `CODE_LEN` characters, all from [`ALPHABET`].
pub fn is_valid(candidate: &str) -> bool {
    candidate.len() == CODE_LEN && candidate.bytes().all(|b| ALPHABET.contains(&b))
}
