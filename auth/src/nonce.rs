//! Cryptographically random nonce generation.
//!
//! The raw nonce produced here is the replay-protection secret of the
//! Apple handshake: its SHA-256 digest is sent outward as the challenge,
//! and the raw value is later handed to the backend inside the credential
//! so the backend can verify the external assertion was minted for this
//! flow.

use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::{LinkError, Result};

/// Fixed nonce alphabet: digits, ASCII letters of both cases, `-`, `.`
/// and `_`. The ordering is arbitrary but fixed, so a byte value below
/// `ALPHABET.len()` always maps to the same character.
pub const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-._";

/// Generate a random string of exactly `length` characters drawn
/// uniformly from [`ALPHABET`].
///
/// Bytes are drawn from the OS secure random source in batches; a byte is
/// kept only when its value maps cleanly onto the alphabet (rejection
/// sampling, which avoids modulo bias). Bytes that do not map are
/// discarded and more are drawn.
///
/// # Errors
///
/// Returns [`LinkError::RandomSource`] if the OS random source itself
/// fails. This is fatal: the caller must abort the flow rather than fall
/// back to a weaker source.
///
/// # Panics
///
/// Panics if `length` is zero; a zero-length nonce provides no replay
/// protection and indicates a caller bug.
pub fn generate(length: usize) -> Result<String> {
    assert!(length > 0, "nonce length must be positive");

    let mut nonce = String::with_capacity(length);
    let mut batch = [0u8; 16];

    while nonce.len() < length {
        OsRng
            .try_fill_bytes(&mut batch)
            .map_err(|_| LinkError::RandomSource)?;

        for &byte in &batch {
            if nonce.len() == length {
                break;
            }
            if usize::from(byte) < ALPHABET.len() {
                nonce.push(char::from(ALPHABET[usize::from(byte)]));
            }
        }
    }

    Ok(nonce)
}
