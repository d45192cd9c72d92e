// ============================================
// File: crates/hyperbloom-core/src/crypto/keystream.rs
// ============================================
//! # XSalsa20 Keystream
//!
//! ## Creation Reason
//! Wraps the XSalsa20 stream cipher as a positional keystream. Each
//! stream direction owns exactly one instance, keyed by the feed
//! public key and the direction's `Open` nonce.
//!
//! ## Main Functionality
//! - `XSalsaKeystream`: stateful in-place XOR sink
//!
//! ## Position Semantics
//! The cipher position advances with every `xor` call and is never
//! rewound. Bytes must therefore be XOR'd exactly once, in emission
//! order - the frame parser's pending-ciphertext handling depends on
//! this.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Never construct two keystreams with the same (key, nonce) for
//!   different data - keystream reuse breaks confidentiality
//!
//! ## Last Modified
//! v0.1.0 - Initial keystream implementation

use salsa20::cipher::{KeyIvInit, StreamCipher};
use salsa20::XSalsa20;

use super::{Keystream, NONCE_SIZE, PUBLIC_KEY_SIZE};

// ============================================
// XSalsaKeystream
// ============================================

/// Positional XSalsa20 keystream applying the cipher in place.
pub struct XSalsaKeystream {
    cipher: XSalsa20,
}

impl XSalsaKeystream {
    /// Creates a keystream for one stream direction.
    ///
    /// # Arguments
    /// * `key` - the 32-byte feed public key
    /// * `nonce` - the 24-byte nonce carried in that direction's `Open`
    #[must_use]
    pub fn new(key: &[u8; PUBLIC_KEY_SIZE], nonce: &[u8; NONCE_SIZE]) -> Self {
        Self {
            cipher: XSalsa20::new(key.into(), nonce.into()),
        }
    }
}

impl Keystream for XSalsaKeystream {
    fn xor(&mut self, buf: &mut [u8]) {
        self.cipher.apply_keystream(buf);
    }
}

impl std::fmt::Debug for XSalsaKeystream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Cipher state is key-derived; never print it
        f.debug_struct("XSalsaKeystream").finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================
