// ============================================
// File: crates/hyperbloom-engine/src/error.rs
// ============================================
//! # Engine Error Types
//!
//! ## Creation Reason
//! Defines the error taxonomy of the wire engine: everything that can
//! terminate a session, plus the non-fatal caller-misuse rejection.
//!
//! ## Main Functionality
//! - `EngineError`: engine-level error enum
//! - Classification helpers (`is_fatal`, `is_caller_error`)
//!
//! ## Error Categories
//! 1. **Framing**: bad magic, oversized frames, buffer overflow
//! 2. **Protocol**: ordering violations, field-level violations
//! 3. **Trust**: untrusted peers, invalid chains
//! 4. **Caller**: synchronous API misuse (non-fatal)
//!
//! Codec-level failures (varint overflow, malformed messages) surface
//! through the transparent [`CoreError`] wrapper.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Every fatal error renders the session inert; there is no
//!   recovery path by design
//! - Never include key material or nonces in error messages
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

use hyperbloom_common::error::CommonError;
use hyperbloom_core::error::CoreError;

// ============================================
// Result Type Alias
// ============================================

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

// ============================================
// EngineError
// ============================================

/// Engine error taxonomy.
///
/// Every variant is fatal to the session except `CallerMisuse` and
/// `SessionClosed`, which are surfaced synchronously from the send
/// APIs.
#[derive(Error, Debug)]
pub enum EngineError {
    // ========================================
    // Framing Errors
    // ========================================

    /// The first four inbound bytes were not the protocol magic.
    #[error("Bad magic: stream does not open with the protocol magic")]
    BadMagic,

    /// A frame declared a length beyond the maximum.
    #[error("Frame too large: declared {declared} bytes exceeds maximum of {max}")]
    FrameTooLarge {
        /// Length declared by the frame prefix
        declared: usize,
        /// Maximum accepted frame length
        max: usize,
    },

    /// The backpressure buffer exceeded the maximum frame size.
    #[error("Message too big: {buffered} bytes buffered without a complete frame")]
    MessageTooBig {
        /// Bytes buffered when the limit was hit
        buffered: usize,
    },

    // ========================================
    // Protocol Errors
    // ========================================

    /// The remote `Open` names a different feed.
    #[error("Feed mismatch: remote Open is for a different feed")]
    FeedMismatch,

    /// The remote `Open` nonce has the wrong length.
    #[error("Invalid nonce: expected 24 bytes, got {actual}")]
    InvalidNonce {
        /// Nonce length received
        actual: usize,
    },

    /// The first decoded message after `Open` was not a handshake.
    #[error("Handshake expected: first message was id {id}")]
    HandshakeExpected {
        /// Wire id of the offending message
        id: u32,
    },

    /// A second handshake arrived on the same stream.
    #[error("Duplicate handshake received")]
    DuplicateHandshake,

    /// A field-level protocol invariant was violated.
    #[error("Protocol violation: {reason}")]
    ProtocolViolation {
        /// What invariant was broken
        reason: String,
    },

    // ========================================
    // Trust Errors
    // ========================================

    /// The remote handshake signature or chain failed verification.
    #[error("Untrusted peer: {reason}")]
    UntrustedPeer {
        /// Which verification step failed
        reason: String,
    },

    /// The local chain self-check or a chain update failed.
    #[error("Invalid chain: {reason}")]
    InvalidChain {
        /// Which verification step failed
        reason: String,
    },

    // ========================================
    // Caller Errors (non-fatal)
    // ========================================

    /// A send API was called with invalid fields; rejected before
    /// queuing. The session is unaffected.
    #[error("Caller misuse for '{field}': {reason}")]
    CallerMisuse {
        /// Offending field or parameter
        field: String,
        /// What's wrong with it
        reason: String,
    },

    /// An API was called on a destroyed session.
    #[error("Session is closed")]
    SessionClosed,

    // ========================================
    // Wrapped Errors
    // ========================================

    /// Codec-level failure (varint overflow, malformed message, ...).
    #[error(transparent)]
    Codec(#[from] CoreError),
}

impl EngineError {
    /// Creates a `ProtocolViolation` error.
    pub fn violation(reason: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            reason: reason.into(),
        }
    }

    /// Creates an `UntrustedPeer` error.
    pub fn untrusted(reason: impl Into<String>) -> Self {
        Self::UntrustedPeer {
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidChain` error.
    pub fn invalid_chain(reason: impl Into<String>) -> Self {
        Self::InvalidChain {
            reason: reason.into(),
        }
    }

    /// Returns `true` if this error came from the caller, not the
    /// wire; the session survives these.
    #[must_use]
    pub const fn is_caller_error(&self) -> bool {
        matches!(self, Self::CallerMisuse { .. } | Self::SessionClosed)
    }

    /// Returns `true` if this error terminates the session.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_caller_error()
    }

    /// Returns `true` if this error might indicate an attack and
    /// warrants additional monitoring.
    #[must_use]
    pub const fn is_suspicious(&self) -> bool {
        matches!(
            self,
            Self::BadMagic
                | Self::UntrustedPeer { .. }
                | Self::DuplicateHandshake
                | Self::HandshakeExpected { .. }
        )
    }
}

// CommonError is how message validation reports problems; at the API
// boundary it becomes caller misuse.
impl From<CommonError> for EngineError {
    fn from(err: CommonError) -> Self {
        match err {
            CommonError::InvalidInput { field, reason } => Self::CallerMisuse { field, reason },
            CommonError::InvalidLength {
                field,
                expected,
                actual,
            } => Self::CallerMisuse {
                field,
                reason: format!("expected {expected} bytes, got {actual}"),
            },
        }
    }
}

// ============================================
// Tests
// ============================================
