// ============================================
// File: crates/hyperbloom-core/src/crypto/keys.rs
// ============================================
//! # Cryptographic Key Types
//!
//! ## Creation Reason
//! Defines the key types used throughout the HyperBloom protocol with
//! proper security properties (zeroization, redacted debug output,
//! constant-time comparison).
//!
//! ## Main Functionality
//! - `SecretKey`: 64-byte Ed25519 signing key (libsodium keypair
//!   layout: seed ‖ public key)
//! - `PublicKey`: 32-byte verification key
//! - `discovery_key`: keyed-hash derivation of the publishable feed
//!   identifier
//!
//! ## Key Lifecycle
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  Feed keypair (long-term)                                  │
//! │  ├─ Public key roots the trust chain                       │
//! │  ├─ Public key seeds the XSalsa20 stream cipher            │
//! │  └─ Discovery key = H(DISCOVERY_HASH_KEY, public key)      │
//! │                                                            │
//! │  Writer keypair (per delegation)                           │
//! │  ├─ Granted authority by a trust link                      │
//! │  └─ Signs the paired-nonce handshake hash                  │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Secret key material MUST be zeroed after use
//! - Never log or serialize secret keys
//! - Public keys arriving in trust links may be invalid curve points;
//!   `verify` treats those as verification failure, not a panic
//!
//! ## Last Modified
//! v0.1.0 - Initial key type definitions

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use super::{hash, DISCOVERY_HASH_KEY, HASH_SIZE, PUBLIC_KEY_SIZE, SECRET_KEY_SIZE, SIGNATURE_SIZE};
use crate::error::{CoreError, Result};

// ============================================
// SecretKey (Ed25519)
// ============================================

/// Ed25519 signing key in the 64-byte libsodium keypair layout.
///
/// # Security
/// - The inner signing key is zeroed on drop (ed25519-dalek)
/// - Debug output never reveals key material
///
/// # Example
/// ```
/// use hyperbloom_core::crypto::SecretKey;
///
/// let secret = SecretKey::generate();
/// let signature = secret.sign(b"hello");
/// assert!(secret.public_key().verify(b"hello", &signature));
/// ```
pub struct SecretKey {
    signing: SigningKey,
}

impl SecretKey {
    /// Generates a new random secret key.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    /// Creates a secret key from its 64-byte keypair encoding.
    ///
    /// # Errors
    /// Returns `InvalidKey` if the length is wrong or the embedded
    /// public half does not match the seed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SECRET_KEY_SIZE {
            return Err(CoreError::invalid_key(format!(
                "secret key must be {SECRET_KEY_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        let mut raw = [0u8; SECRET_KEY_SIZE];
        raw.copy_from_slice(bytes);
        let signing = SigningKey::from_keypair_bytes(&raw)
            .map_err(|_| CoreError::invalid_key("secret key is not a valid Ed25519 keypair"));
        raw.zeroize();
        Ok(Self { signing: signing? })
    }

    /// Exports the 64-byte keypair encoding.
    ///
    /// # Security Warning
    /// Handle the returned bytes with extreme care; zero them after
    /// use.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; SECRET_KEY_SIZE] {
        self.signing.to_keypair_bytes()
    }

    /// Returns the public verification key.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing.verifying_key().to_bytes())
    }

    /// Signs a message, producing a 64-byte detached signature.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_SIZE] {
        self.signing.sign(message).to_bytes()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print private key material
        f.debug_struct("SecretKey")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

// ============================================
// PublicKey
// ============================================

/// Ed25519 public verification key.
///
/// Safe to share. Stored as raw bytes so that keys arriving in trust
/// links can be carried around before (and regardless of) curve-point
/// validation, which happens inside [`PublicKey::verify`].
#[derive(Clone, Copy)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    /// Creates a public key from raw bytes.
    ///
    /// # Errors
    /// Returns `InvalidKey` if the length is not 32.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PUBLIC_KEY_SIZE {
            return Err(CoreError::invalid_key(format!(
                "public key must be {PUBLIC_KEY_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        let mut key = [0u8; PUBLIC_KEY_SIZE];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    /// Creates a public key from a fixed-size array.
    #[must_use]
    pub const fn from_array(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the raw key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// Returns the raw key bytes (owned).
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.0
    }

    /// Verifies a detached signature over `message`.
    ///
    /// Invalid curve points fail verification rather than erroring:
    /// a trust link carrying garbage bytes is an untrusted peer, not a
    /// crash.
    #[must_use]
    pub fn verify(&self, message: &[u8], signature: &[u8; SIGNATURE_SIZE]) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(&self.0) else {
            return false;
        };
        let signature = Signature::from_bytes(signature);
        key.verify(message, &signature).is_ok()
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for PublicKey {}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PublicKey({:02x}{:02x}{:02x}{:02x}...)",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", BASE64.encode(self.0))
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&BASE64.encode(self.0))
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bytes = if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            BASE64.decode(&s).map_err(serde::de::Error::custom)?
        } else {
            <Vec<u8>>::deserialize(deserializer)?
        };
        Self::from_bytes(&bytes)
            .map_err(|_| serde::de::Error::invalid_length(bytes.len(), &"32 bytes"))
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// ============================================
// Discovery Key
// ============================================

/// Derives the publishable discovery key from the feed public key.
///
/// `discovery = H(DISCOVERY_HASH_KEY, feedKey)` - safe to announce on
/// lookup networks without revealing the feed key itself.
#[must_use]
pub fn discovery_key(feed_key: &PublicKey) -> [u8; HASH_SIZE] {
    hash::keyed_hash(DISCOVERY_HASH_KEY, feed_key.as_bytes())
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_key_generation() {
        let k1 = SecretKey::generate();
        let k2 = SecretKey::generate();
        assert_ne!(k1.public_key(), k2.public_key());
    }

    #[test]
    fn test_sign_verify() {
        let secret = SecretKey::generate();
        let public = secret.public_key();

        let signature = secret.sign(b"test message");
        assert!(public.verify(b"test message", &signature));
        assert!(!public.verify(b"wrong message", &signature));
    }

    #[test]
    fn test_secret_key_roundtrip() {
        let secret = SecretKey::generate();
        let bytes = secret.to_bytes();
        let restored = SecretKey::from_bytes(&bytes).unwrap();
        assert_eq!(secret.public_key(), restored.public_key());
    }

    #[test]
    fn test_secret_key_invalid() {
        // Wrong length
        assert!(SecretKey::from_bytes(&[0u8; 32]).is_err());

        // Mismatched public half
        let secret = SecretKey::generate();
        let mut bytes = secret.to_bytes();
        bytes[40] ^= 0xff;
        assert!(SecretKey::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_public_key_invalid_point_fails_verification() {
        // All-0xFF is not a valid curve point; must fail, not panic
        let bogus = PublicKey::from_array([0xff; PUBLIC_KEY_SIZE]);
        assert!(!bogus.verify(b"anything", &[0u8; SIGNATURE_SIZE]));
    }

    #[test]
    fn test_discovery_key_is_deterministic() {
        let secret = SecretKey::generate();
        let public = secret.public_key();

        assert_eq!(discovery_key(&public), discovery_key(&public));
        assert_ne!(discovery_key(&public), public.to_bytes());
    }

    #[test]
    fn test_public_key_serde_roundtrip() {
        let public = SecretKey::generate().public_key();
        let json = serde_json::to_string(&public).unwrap();
        let restored: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(public, restored);
    }
}
