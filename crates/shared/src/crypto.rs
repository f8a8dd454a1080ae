//! Hashing utilities for nonce fingerprinting.
//!
//! Client nonces are opaque strings of arbitrary length; the replay guard
//! stores a fixed-width SHA-256 fingerprint instead of the raw value.

use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
