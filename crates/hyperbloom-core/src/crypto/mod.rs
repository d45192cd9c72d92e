// ============================================
// File: crates/hyperbloom-core/src/crypto/mod.rs
// ============================================
//! # Cryptography Module
//!
//! ## Creation Reason
//! Centralizes all cryptographic operations for the HyperBloom
//! protocol behind a narrow, injectable adapter, using audited
//! RustCrypto / dalek implementations.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`keys`]: Ed25519 key types and discovery-key derivation
//! - [`hash`]: keyed BLAKE2b-256 hashing
//! - [`keystream`]: XSalsa20 positional keystream
//!
//! ### The [`Crypto`] adapter
//! Sessions never call a crypto crate directly; they go through this
//! trait so tests can inject deterministic randomness.
//!
//! ## Cryptographic Design
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Handshake Phase                          │
//! │  A                                              B           │
//! │  │  Open{feed, nonceA}  ─────────────────────► │           │
//! │  │ ◄─────────────────────  Open{feed, nonceB}  │           │
//! │  │                                              │           │
//! │  │  pairedHash = H(HASH_KEY, nonceA ‖ nonceB)  │           │
//! │  │  sign(pairedHash, chain-terminal secret)     │           │
//! │  │                                              │           │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    Transport Phase                          │
//! │                                                             │
//! │  out bytes XOR XSalsa20(feedKey, localNonce)                │
//! │  in  bytes XOR XSalsa20(feedKey, remoteNonce)               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - ALL implementations use RustCrypto / dalek (audited)
//! - NEVER roll your own crypto
//! - Keystreams advance monotonically and are never rewound
//!
//! ## Last Modified
//! v0.1.0 - Initial crypto implementation

pub mod hash;
pub mod keys;
pub mod keystream;

pub use keys::{discovery_key, PublicKey, SecretKey};
pub use keystream::XSalsaKeystream;

use rand::RngCore;

// ============================================
// Constants
// ============================================

/// Size of an Ed25519 public key in bytes.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of an Ed25519 secret key in bytes (seed ‖ public, libsodium
/// keypair layout).
pub const SECRET_KEY_SIZE: usize = 64;

/// Size of an Ed25519 detached signature in bytes.
pub const SIGNATURE_SIZE: usize = 64;

/// Size of an XSalsa20 nonce in bytes.
pub const NONCE_SIZE: usize = 24;

/// Size of a keyed-hash output in bytes.
pub const HASH_SIZE: usize = 32;

/// Keyed-hash domain key for handshake and trust-link hashes.
pub const HASH_KEY: &[u8] = b"hyperbloom";

/// Keyed-hash domain key for deriving the discovery key from the feed
/// public key.
pub const DISCOVERY_HASH_KEY: &[u8] = b"hyperbloom discovery";

// ============================================
// Keystream Trait
// ============================================

/// A stateful byte sink that XORs a cipher stream in place.
///
/// Position advances monotonically with every call; implementations
/// must never rewind.
pub trait Keystream {
    /// XORs the next `buf.len()` keystream bytes into `buf` in place.
    fn xor(&mut self, buf: &mut [u8]);
}

// ============================================
// Crypto Trait
// ============================================

/// Injected cryptography adapter.
///
/// # Purpose
/// Abstracts the signature, keyed-hash, keystream and randomness
/// primitives so that:
/// - Tests can run with deterministic randomness
/// - Alternative backends can be slotted in without touching the
///   engine
pub trait Crypto {
    /// Keystream type produced by [`Crypto::keystream`].
    type Keystream: Keystream;

    /// Signs `message` with the given secret key (detached, 64 bytes).
    fn sign(&self, message: &[u8], secret: &SecretKey) -> [u8; SIGNATURE_SIZE];

    /// Verifies a detached signature under `public`.
    fn verify(&self, message: &[u8], signature: &[u8; SIGNATURE_SIZE], public: &PublicKey) -> bool;

    /// Keyed 32-byte hash of `input`.
    fn hash(&self, key: &[u8], input: &[u8]) -> [u8; HASH_SIZE];

    /// Keyed 32-byte hash of `a ‖ b`.
    fn hash_pair(&self, key: &[u8], a: &[u8], b: &[u8]) -> [u8; HASH_SIZE];

    /// Creates a keystream for the given key and nonce.
    fn keystream(&self, key: &[u8; PUBLIC_KEY_SIZE], nonce: &[u8; NONCE_SIZE]) -> Self::Keystream;

    /// Fills `buf` with cryptographically secure random bytes.
    fn fill_random(&self, buf: &mut [u8]);
}

// ============================================
// DefaultCrypto
// ============================================

/// Production crypto adapter: ed25519-dalek signatures, keyed
/// BLAKE2b-256 hashing, XSalsa20 keystreams and OS randomness.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCrypto;

impl DefaultCrypto {
    /// Creates the production crypto adapter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Crypto for DefaultCrypto {
    type Keystream = XSalsaKeystream;

    fn sign(&self, message: &[u8], secret: &SecretKey) -> [u8; SIGNATURE_SIZE] {
        secret.sign(message)
    }

    fn verify(&self, message: &[u8], signature: &[u8; SIGNATURE_SIZE], public: &PublicKey) -> bool {
        public.verify(message, signature)
    }

    fn hash(&self, key: &[u8], input: &[u8]) -> [u8; HASH_SIZE] {
        hash::keyed_hash(key, input)
    }

    fn hash_pair(&self, key: &[u8], a: &[u8], b: &[u8]) -> [u8; HASH_SIZE] {
        hash::keyed_hash_pair(key, a, b)
    }

    fn keystream(&self, key: &[u8; PUBLIC_KEY_SIZE], nonce: &[u8; NONCE_SIZE]) -> Self::Keystream {
        XSalsaKeystream::new(key, nonce)
    }

    fn fill_random(&self, buf: &mut [u8]) {
        rand::rngs::OsRng.fill_bytes(buf);
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_crypto_sign_verify() {
        let crypto = DefaultCrypto::new();
        let secret = SecretKey::generate();
        let public = secret.public_key();

        let digest = crypto.hash(HASH_KEY, b"message");
        let signature = crypto.sign(&digest, &secret);
        assert!(crypto.verify(&digest, &signature, &public));

        let other = crypto.hash(HASH_KEY, b"other");
        assert!(!crypto.verify(&other, &signature, &public));
    }

    #[test]
    fn test_hash_pair_equals_concatenation() {
        let crypto = DefaultCrypto::new();
        let joined = [b"left".as_ref(), b"right".as_ref()].concat();
        assert_eq!(
            crypto.hash_pair(HASH_KEY, b"left", b"right"),
            crypto.hash(HASH_KEY, &joined)
        );
    }

    #[test]
    fn test_domain_keys_differ() {
        let crypto = DefaultCrypto::new();
        assert_ne!(
            crypto.hash(HASH_KEY, b"input"),
            crypto.hash(DISCOVERY_HASH_KEY, b"input")
        );
    }

    #[test]
    fn test_fill_random() {
        let crypto = DefaultCrypto::new();
        let mut a = [0u8; 24];
        let mut b = [0u8; 24];
        crypto.fill_random(&mut a);
        crypto.fill_random(&mut b);
        assert_ne!(a, b);
    }
}
