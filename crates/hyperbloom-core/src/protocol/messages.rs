// ============================================
// File: crates/hyperbloom-core/src/protocol/messages.rs
// ============================================
//! # Protocol Message Definitions
//!
//! ## Creation Reason
//! Defines the structure of all messages exchanged between HyperBloom
//! peers, together with their field-level validation rules.
//!
//! ## Main Functionality
//! - `MessageType`: numeric wire identity of each message
//! - `Open`: the single plaintext key-exchange frame
//! - `Handshake`, `Sync`, `FilterOptions`, `Data`, `Request`, `Link`:
//!   the encrypted message family
//! - `Message`: tagged union dispatched by the engine
//!
//! ## Message Ids
//! | Id | Message |
//! |----|---------------|
//! | -  | Open (no id; recognized by stream position) |
//! | 0  | Handshake |
//! | 1  | Sync |
//! | 2  | FilterOptions |
//! | 3  | Data |
//! | 4  | Request |
//! | 5  | Link |
//!
//! ## ⚠️ Important Note for Next Developer
//! - Ids are wire identity - add new messages at the end only
//! - Unknown ids are skipped by the frame parser, never an error
//! - Validation lives here so that senders and receivers apply the
//!   exact same rules
//!
//! ## Last Modified
//! v0.1.0 - Initial message definitions

use std::collections::HashSet;

use bytes::Bytes;

use hyperbloom_common::error::CommonError;
use hyperbloom_common::types::PeerId;

use crate::crypto::SIGNATURE_SIZE;

// ============================================
// MessageType
// ============================================

/// Numeric wire identity of an encrypted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageType {
    /// Mutual authentication message; must be first in each direction.
    Handshake = 0,
    /// Bloom-filter round for set reconciliation.
    Sync = 1,
    /// Filter sizing negotiation.
    FilterOptions = 2,
    /// Value payloads.
    Data = 3,
    /// Explicit range request.
    Request = 4,
    /// Trust-chain shortening link.
    Link = 5,
}

impl MessageType {
    /// Converts a wire id to a `MessageType`.
    ///
    /// # Returns
    /// `None` if the id is unknown (the parser skips such frames).
    #[must_use]
    pub const fn from_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(Self::Handshake),
            1 => Some(Self::Sync),
            2 => Some(Self::FilterOptions),
            3 => Some(Self::Data),
            4 => Some(Self::Request),
            5 => Some(Self::Link),
            _ => None,
        }
    }

    /// Returns the numeric wire id.
    #[must_use]
    pub const fn as_id(&self) -> u32 {
        *self as u32
    }

    /// Checks if this message is delivered to the application.
    ///
    /// `Handshake` and `Link` are consumed by the engine itself.
    #[must_use]
    pub const fn is_application(&self) -> bool {
        matches!(
            self,
            Self::Sync | Self::FilterOptions | Self::Data | Self::Request
        )
    }

    /// Human-readable message name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Handshake => "handshake",
            Self::Sync => "sync",
            Self::FilterOptions => "filter-options",
            Self::Data => "data",
            Self::Request => "request",
            Self::Link => "link",
        }
    }
}

// ============================================
// Open
// ============================================

/// The single plaintext frame opening each direction of the stream.
///
/// Carries the discovery key (proving which feed the peer wants to
/// talk about without revealing the feed key) and the 24-byte nonce
/// seeding that direction's XSalsa20 keystream.
///
/// Field lengths are validated by the frame parser, not the decoder,
/// so that nonce-length violations surface as their own error kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Open {
    /// Discovery key of the feed (32 bytes on the wire).
    pub feed: Bytes,
    /// Keystream nonce for the sender's direction (24 bytes).
    pub nonce: Bytes,
}

// ============================================
// Handshake
// ============================================

/// Mutual authentication message (id 0).
///
/// The signature covers the sender's paired-nonce hash and is made by
/// the private key at the end of the sender's trust chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    /// Sender's per-session peer id.
    pub id: PeerId,
    /// Reserved extension strings (order-preserved, currently unused).
    pub extensions: Vec<String>,
    /// Detached signature over the sender's paired hash.
    pub signature: [u8; SIGNATURE_SIZE],
    /// Opaque encoded trust links, feed-rooted order.
    pub chain: Vec<Bytes>,
}

// ============================================
// Sync
// ============================================

/// A Bloom-filter reconciliation round (id 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sync {
    /// Raw filter bits.
    pub filter: Bytes,
    /// Filter size parameter.
    pub size: u32,
    /// Number of hash functions.
    pub n: u32,
    /// Filter hash seed.
    pub seed: u32,
    /// Optional cap on responses (nonzero when present).
    pub limit: Option<u32>,
    /// Optional key range the filter covers.
    pub range: Option<SyncRange>,
}

/// Key range attached to a [`Sync`] message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRange {
    /// Inclusive start key.
    pub start: Bytes,
    /// Optional exclusive end key.
    pub end: Option<Bytes>,
}

impl Sync {
    /// Validates sender-supplied fields before encoding.
    pub fn validate(&self) -> Result<(), CommonError> {
        if self.filter.is_empty() {
            return Err(CommonError::invalid_input("filter", "must not be empty"));
        }
        if self.limit == Some(0) {
            return Err(CommonError::invalid_input(
                "limit",
                "must be nonzero when present",
            ));
        }
        if let Some(range) = &self.range {
            if range.start.is_empty() {
                return Err(CommonError::invalid_input(
                    "range.start",
                    "must not be empty",
                ));
            }
        }
        Ok(())
    }
}

// ============================================
// FilterOptions
// ============================================

/// Filter sizing negotiation (id 2).
///
/// The historical schema declared both fields under tag 1; this
/// implementation assigns distinct tags (`size` = 1, `n` = 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOptions {
    /// Proposed filter size.
    pub size: u32,
    /// Proposed number of hash functions.
    pub n: u32,
}

// ============================================
// Data
// ============================================

/// Value payloads (id 3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Data {
    /// Values, each non-empty, without duplicates.
    pub values: Vec<Bytes>,
}

impl Data {
    /// Validates the value list.
    ///
    /// Applied both before encoding (caller misuse) and after decoding
    /// (protocol violation): the list must be non-empty, contain no
    /// empty values and no duplicates.
    pub fn validate(&self) -> Result<(), CommonError> {
        if self.values.is_empty() {
            return Err(CommonError::invalid_input("values", "must not be empty"));
        }
        let mut seen: HashSet<&[u8]> = HashSet::with_capacity(self.values.len());
        for value in &self.values {
            if value.is_empty() {
                return Err(CommonError::invalid_input(
                    "values",
                    "must not contain empty entries",
                ));
            }
            if !seen.insert(value.as_ref()) {
                return Err(CommonError::invalid_input(
                    "values",
                    "must not contain duplicate entries",
                ));
            }
        }
        Ok(())
    }
}

// ============================================
// Request
// ============================================

/// Explicit range request (id 4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Inclusive start key.
    pub start: Bytes,
    /// Optional exclusive end key.
    pub end: Option<Bytes>,
    /// Optional result cap (nonzero when present).
    pub limit: Option<u32>,
}

impl Request {
    /// Validates sender-supplied fields; also applied after decoding.
    pub fn validate(&self) -> Result<(), CommonError> {
        if self.start.is_empty() {
            return Err(CommonError::invalid_input("start", "must not be empty"));
        }
        if self.limit == Some(0) {
            return Err(CommonError::invalid_input(
                "limit",
                "must be nonzero when present",
            ));
        }
        Ok(())
    }
}

// ============================================
// Link
// ============================================

/// Trust-chain shortening link (id 5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// One opaque encoded trust link.
    pub link: Bytes,
}

// ============================================
// Message
// ============================================

/// Tagged union over the encrypted message family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Mutual authentication (id 0).
    Handshake(Handshake),
    /// Filter round (id 1).
    Sync(Sync),
    /// Filter negotiation (id 2).
    FilterOptions(FilterOptions),
    /// Value payloads (id 3).
    Data(Data),
    /// Range request (id 4).
    Request(Request),
    /// Chain shortening (id 5).
    Link(Link),
}

impl Message {
    /// Returns the wire identity of this message.
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        match self {
            Self::Handshake(_) => MessageType::Handshake,
            Self::Sync(_) => MessageType::Sync,
            Self::FilterOptions(_) => MessageType::FilterOptions,
            Self::Data(_) => MessageType::Data,
            Self::Request(_) => MessageType::Request,
            Self::Link(_) => MessageType::Link,
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_roundtrip() {
        for id in 0..6 {
            let msg_type = MessageType::from_id(id).unwrap();
            assert_eq!(msg_type.as_id(), id);
        }
    }

    #[test]
    fn test_message_type_unknown() {
        assert!(MessageType::from_id(6).is_none());
        assert!(MessageType::from_id(u32::MAX).is_none());
    }

    #[test]
    fn test_message_type_classification() {
        assert!(!MessageType::Handshake.is_application());
        assert!(!MessageType::Link.is_application());
        assert!(MessageType::Sync.is_application());
        assert!(MessageType::Data.is_application());
    }

    #[test]
    fn test_data_validation() {
        let empty = Data { values: vec![] };
        assert!(empty.validate().is_err());

        let empty_entry = Data {
            values: vec![Bytes::from_static(b"")],
        };
        assert!(empty_entry.validate().is_err());

        let duplicate = Data {
            values: vec![Bytes::from_static(b"a"), Bytes::from_static(b"a")],
        };
        assert!(duplicate.validate().is_err());

        let ok = Data {
            values: vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")],
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_request_validation() {
        let missing_start = Request {
            start: Bytes::new(),
            end: None,
            limit: None,
        };
        assert!(missing_start.validate().is_err());

        let zero_limit = Request {
            start: Bytes::from_static(b"a"),
            end: None,
            limit: Some(0),
        };
        assert!(zero_limit.validate().is_err());

        let ok = Request {
            start: Bytes::from_static(b"a"),
            end: Some(Bytes::from_static(b"z")),
            limit: Some(10),
        };
        assert!(ok.validate().is_ok());

        let no_limit = Request {
            start: Bytes::from_static(b"a"),
            end: None,
            limit: None,
        };
        assert!(no_limit.validate().is_ok());
    }

    #[test]
    fn test_sync_validation() {
        let ok = Sync {
            filter: Bytes::from_static(&[0xff; 8]),
            size: 64,
            n: 4,
            seed: 7,
            limit: None,
            range: None,
        };
        assert!(ok.validate().is_ok());

        let empty_filter = Sync {
            filter: Bytes::new(),
            ..ok.clone()
        };
        assert!(empty_filter.validate().is_err());

        let zero_limit = Sync {
            limit: Some(0),
            ..ok.clone()
        };
        assert!(zero_limit.validate().is_err());

        let empty_range_start = Sync {
            range: Some(SyncRange {
                start: Bytes::new(),
                end: None,
            }),
            ..ok
        };
        assert!(empty_range_start.validate().is_err());
    }
}
