// ============================================
// File: crates/hyperbloom-core/src/crypto/hash.rs
// ============================================
//! # Keyed Hashing
//!
//! ## Creation Reason
//! Provides the keyed BLAKE2b-256 hash used for paired-nonce
//! handshake hashes, trust-link hashes and discovery-key derivation.
//!
//! ## Main Functionality
//! - `keyed_hash`: 32-byte keyed hash of one input
//! - `keyed_hash_pair`: 32-byte keyed hash of two concatenated inputs
//!   without an intermediate allocation
//!
//! ## Domain Separation
//! Callers pass a domain key ([`HASH_KEY`](super::HASH_KEY) or
//! [`DISCOVERY_HASH_KEY`](super::DISCOVERY_HASH_KEY)); the same input
//! under different keys yields unrelated digests.
//!
//! ## Last Modified
//! v0.1.0 - Initial keyed-hash implementation

use blake2::digest::consts::U32;
use blake2::digest::{FixedOutput, KeyInit, Update};
use blake2::Blake2bMac;

use super::HASH_SIZE;

/// Keyed BLAKE2b with 32-byte output.
type Blake2bMac256 = Blake2bMac<U32>;

/// Computes the keyed 32-byte hash of `input`.
///
/// # Panics
/// Panics if `key` is empty or longer than 64 bytes; both domain keys
/// used by this crate are short compile-time constants.
#[must_use]
pub fn keyed_hash(key: &[u8], input: &[u8]) -> [u8; HASH_SIZE] {
    let mut mac = Blake2bMac256::new_from_slice(key).expect("hash key must be 1..=64 bytes");
    mac.update(input);
    mac.finalize_fixed().into()
}

/// Computes the keyed 32-byte hash of `a ‖ b`.
#[must_use]
pub fn keyed_hash_pair(key: &[u8], a: &[u8], b: &[u8]) -> [u8; HASH_SIZE] {
    let mut mac = Blake2bMac256::new_from_slice(key).expect("hash key must be 1..=64 bytes");
    mac.update(a);
    mac.update(b);
    mac.finalize_fixed().into()
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyed_hash_deterministic() {
        let a = keyed_hash(b"key", b"input");
        let b = keyed_hash(b"key", b"input");
        assert_eq!(a, b);
        assert_eq!(a.len(), HASH_SIZE);
    }

    #[test]
    fn test_keyed_hash_key_separation() {
        assert_ne!(keyed_hash(b"key-a", b"input"), keyed_hash(b"key-b", b"input"));
    }

    #[test]
    fn test_keyed_hash_input_sensitivity() {
        assert_ne!(keyed_hash(b"key", b"input-a"), keyed_hash(b"key", b"input-b"));
    }

    #[test]
    fn test_pair_matches_concatenation() {
        let joined = [b"nonce-a".as_ref(), b"nonce-b".as_ref()].concat();
        assert_eq!(
            keyed_hash_pair(b"key", b"nonce-a", b"nonce-b"),
            keyed_hash(b"key", &joined)
        );
    }

    #[test]
    fn test_pair_order_matters() {
        assert_ne!(
            keyed_hash_pair(b"key", b"a", b"b"),
            keyed_hash_pair(b"key", b"b", b"a")
        );
    }
}
