// ============================================
// File: crates/hyperbloom-core/src/error.rs
// ============================================
//! # Core Error Types
//!
//! ## Creation Reason
//! Defines error types for codec, cryptographic and trust-chain
//! operations in the HyperBloom core crate.
//!
//! ## Main Functionality
//! - `CoreError`: Primary error enum for core operations
//! - Classification helpers (`is_codec_error`, `is_trust_error`)
//!
//! ## Error Categories
//! 1. **Codec Errors**: varint overflow, truncation, malformed fields
//! 2. **Crypto Errors**: invalid key material
//! 3. **Trust Errors**: link and chain verification failures
//!
//! ## ⚠️ Important Note for Next Developer
//! - NEVER include key material or nonces in error messages
//! - All errors must be loggable without leaking secrets
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

use hyperbloom_common::error::CommonError;

// ============================================
// Result Type Alias
// ============================================

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

// ============================================
// CoreError
// ============================================

/// Core error types for codec, crypto and trust operations.
#[derive(Error, Debug)]
pub enum CoreError {
    // ========================================
    // Codec Errors
    // ========================================

    /// A varint exceeded 5 bytes / 32 bits.
    #[error("Varint overflow: encoding exceeds 5 bytes or 32 bits")]
    VarintOverflow,

    /// Buffer ended before a complete value could be read.
    #[error("Truncated message: needed {needed} more bytes")]
    Truncated {
        /// How many additional bytes were required
        needed: usize,
    },

    /// Message violates the wire schema.
    #[error("Malformed message: {reason}")]
    MalformedMessage {
        /// What's wrong with the message
        reason: String,
    },

    /// A required field was absent from a decoded message.
    #[error("Malformed message: {message} is missing required field '{field}'")]
    MissingField {
        /// Message name
        message: &'static str,
        /// Field name
        field: &'static str,
    },

    // ========================================
    // Crypto Errors
    // ========================================

    /// Key material failed validation.
    #[error("Invalid key: {reason}")]
    InvalidKey {
        /// Why the key was rejected
        reason: String,
    },

    // ========================================
    // Trust Errors
    // ========================================

    /// Chain exceeds the maximum number of links.
    #[error("Trust chain too long: {len} links exceeds maximum of {max}")]
    ChainTooLong {
        /// Number of links supplied
        len: usize,
        /// Maximum allowed links
        max: usize,
    },

    /// A trust link declares an unsupported version.
    #[error("Unsupported trust link version: {version}")]
    UnsupportedLinkVersion {
        /// Version carried by the link
        version: u32,
    },

    /// A trust link's signature did not verify under its authority.
    #[error("Trust link signature verification failed at index {index}")]
    LinkSignature {
        /// Position of the offending link within the chain
        index: usize,
    },

    /// The chain's terminal public key does not match the secret key
    /// claiming it.
    #[error("Chain terminal key does not match the supplied secret key")]
    ChainKeyMismatch,

    // ========================================
    // Wrapped Errors
    // ========================================

    /// Error from the common crate.
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl CoreError {
    /// Creates a `MalformedMessage` error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedMessage {
            reason: reason.into(),
        }
    }

    /// Creates a `MissingField` error.
    pub const fn missing_field(message: &'static str, field: &'static str) -> Self {
        Self::MissingField { message, field }
    }

    /// Creates an `InvalidKey` error.
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            reason: reason.into(),
        }
    }

    /// Returns `true` if this is a wire-decoding error.
    #[must_use]
    pub const fn is_codec_error(&self) -> bool {
        matches!(
            self,
            Self::VarintOverflow
                | Self::Truncated { .. }
                | Self::MalformedMessage { .. }
                | Self::MissingField { .. }
        )
    }

    /// Returns `true` if this is a trust-chain verification error.
    #[must_use]
    pub const fn is_trust_error(&self) -> bool {
        matches!(
            self,
            Self::ChainTooLong { .. }
                | Self::UnsupportedLinkVersion { .. }
                | Self::LinkSignature { .. }
                | Self::ChainKeyMismatch
        )
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::VarintOverflow;
        assert!(err.to_string().contains("Varint"));

        let err = CoreError::missing_field("Handshake", "signature");
        assert!(err.to_string().contains("Handshake"));
        assert!(err.to_string().contains("signature"));
    }

    #[test]
    fn test_error_classification() {
        assert!(CoreError::VarintOverflow.is_codec_error());
        assert!(!CoreError::VarintOverflow.is_trust_error());

        let err = CoreError::ChainTooLong { len: 6, max: 5 };
        assert!(err.is_trust_error());
        assert!(!err.is_codec_error());
    }

    #[test]
    fn test_common_error_conversion() {
        let common = CommonError::invalid_input("field", "bad value");
        let core: CoreError = common.into();
        assert!(matches!(core, CoreError::Common(_)));
    }
}
