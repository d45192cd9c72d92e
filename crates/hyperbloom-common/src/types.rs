// ============================================
// File: crates/hyperbloom-common/src/types.rs
// ============================================
//! # Core Type Definitions
//!
//! ## Creation Reason
//! Centralizes the identifier types used throughout the HyperBloom
//! protocol, ensuring type safety and consistent representations.
//!
//! ## Main Functionality
//! - `PeerId`: Unique per-session peer identifier (32 bytes)
//! - Type conversions and serialization implementations
//!
//! ## Main Logical Flow
//! 1. A `PeerId` is generated (or supplied) when a session is created
//! 2. Exchanged inside the handshake message
//! 3. Exposed to the application once the session is secure
//!
//! ## ⚠️ Important Note for Next Developer
//! - PeerId is not secret, but random ids must come from a
//!   cryptographically secure generator to avoid collisions
//! - Maintain backward-compatible serialization formats
//!
//! ## Last Modified
//! v0.1.0 - Initial type definitions

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::CommonError;

// ============================================
// Constants
// ============================================

/// Size of a peer identifier in bytes.
pub const PEER_ID_SIZE: usize = 32;

// ============================================
// PeerId
// ============================================

/// Unique identifier for a protocol peer within a session.
///
/// # Properties
/// - Fixed 32-byte size (256 bits)
/// - Generated fresh per session unless supplied by the caller
/// - Carried in the handshake message and exposed at the `secure`
///   milestone
///
/// # Example
/// ```
/// use hyperbloom_common::types::PeerId;
///
/// let id = PeerId::generate();
/// let restored = PeerId::from_bytes(id.as_bytes()).unwrap();
/// assert_eq!(id, restored);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerId([u8; PEER_ID_SIZE]);

impl PeerId {
    /// Creates a `PeerId` from raw bytes.
    ///
    /// # Errors
    /// Returns `InvalidLength` if `bytes` is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CommonError> {
        if bytes.len() != PEER_ID_SIZE {
            return Err(CommonError::invalid_length("id", PEER_ID_SIZE, bytes.len()));
        }
        let mut id = [0u8; PEER_ID_SIZE];
        id.copy_from_slice(bytes);
        Ok(Self(id))
    }

    /// Creates a `PeerId` from a fixed-size array.
    #[must_use]
    pub const fn from_array(bytes: [u8; PEER_ID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Generates a new cryptographically random `PeerId`.
    #[must_use]
    pub fn generate() -> Self {
        let mut id = [0u8; PEER_ID_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut id);
        Self(id)
    }

    /// Returns the raw bytes of the identifier.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; PEER_ID_SIZE] {
        &self.0
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only show first 4 bytes in debug output
        write!(
            f,
            "PeerId({:02x}{:02x}{:02x}{:02x}...)",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", BASE64.encode(self.0))
    }
}

impl FromStr for PeerId {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = BASE64
            .decode(s)
            .map_err(|e| CommonError::invalid_input("id", e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

impl Serialize for PeerId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
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

impl<'de> Deserialize<'de> for PeerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            Self::from_bytes(&bytes)
                .map_err(|_| serde::de::Error::invalid_length(bytes.len(), &"32 bytes"))
        }
    }
}

impl AsRef<[u8]> for PeerId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// ============================================
// Tests
// ============================================
