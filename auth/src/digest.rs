//! Nonce digest for the external challenge.

use sha2::{Digest, Sha256};

/// SHA-256 digest of `input`'s UTF-8 bytes, lowercase hex encoded.
///
/// This is the value sent *outward* to the external provider as the
/// challenge. The raw input stays local and is later sent to the backend,
/// which verifies the external assertion's nonce hash matches without the
/// raw value ever being exposed to the provider in advance.
///
/// # Examples
///
/// ```
/// # use relink_auth::digest::sha256_hex;
/// assert_eq!(
///     sha256_hex("abc"),
///     "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
/// );
/// ```
#[must_use]
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(sha256_hex("nonce-value"), sha256_hex("nonce-value"));
    }

    #[test]
    fn digest_is_fixed_length_hex() {
        let digest = sha256_hex("anything");
        assert_eq!(digest.len(), 64);
        assert!(digest.bytes().all(|b| b.is_ascii_hexdigit()));
        assert_eq!(digest, digest.to_lowercase());
    }

    #[test]
    fn distinct_inputs_yield_distinct_digests() {
        let corpus = ["", "a", "b", "ab", "ba", "nonce", "nonce ", "NONCE"];
        let digests: HashSet<String> = corpus.iter().map(|s| sha256_hex(s)).collect();
        assert_eq!(digests.len(), corpus.len());
    }
}
