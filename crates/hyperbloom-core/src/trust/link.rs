// ============================================
// File: crates/hyperbloom-core/src/trust/link.rs
// ============================================
//! # Trust Links
//!
//! ## Creation Reason
//! Defines the signed delegation assertion that grants a public key
//! write authority over a feed, plus its opaque wire encoding and
//! issuance.
//!
//! ## Main Functionality
//! - `TrustLink`: `{version, publicKey, nonce, signature, expiration}`
//! - `Expiration`: a timestamp or "never", ordered so that `min`
//!   picks the earliest deadline
//! - `TrustLink::issue`: creates and signs a new link
//!
//! ## Signed Data
//! ```text
//! digest = H(HASH_KEY, version (1 byte) ‖ publicKey (32) ‖ nonce (32))
//! signature = sign(digest, preceding authority's secret key)
//! ```
//! The expiration is deliberately outside the signed data; it is
//! advisory metadata recorded during verification.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Links travel opaque inside `Handshake.chain` and `Link.link`;
//!   the engine never parses them - this module does
//! - Only version 1 exists; verification rejects anything else
//!
//! ## Last Modified
//! v0.1.0 - Initial trust-link implementation

use std::fmt;

use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::crypto::{Crypto, PublicKey, SecretKey, HASH_KEY, HASH_SIZE, SIGNATURE_SIZE};
use crate::error::{CoreError, Result};
use crate::protocol::wire::{
    read_len_delimited, read_tag, read_uvarint, read_uvarint64, skip_field, write_bytes_field,
    write_tag, write_uint_field, write_uvarint64, WIRE_LEN, WIRE_VARINT,
};

use super::LINK_NONCE_SIZE;

// ============================================
// Constants
// ============================================

/// The only trust-link version this implementation accepts.
pub const LINK_VERSION: u32 = 1;

// ============================================
// Expiration
// ============================================

/// Expiration of a delegation, in milliseconds since the Unix epoch,
/// or `Never` for an open-ended grant.
///
/// Ordered so that `Never` compares greater than any timestamp;
/// `Iterator::min` over link expirations therefore yields the
/// earliest deadline in a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expiration {
    /// The delegation never expires.
    Never,
    /// The delegation expires at the given millisecond timestamp.
    At(u64),
}

impl Expiration {
    /// Returns `true` for an open-ended grant.
    #[must_use]
    pub const fn is_never(&self) -> bool {
        matches!(self, Self::Never)
    }
}

impl Ord for Expiration {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self, other) {
            (Self::Never, Self::Never) => Ordering::Equal,
            (Self::Never, Self::At(_)) => Ordering::Greater,
            (Self::At(_), Self::Never) => Ordering::Less,
            (Self::At(a), Self::At(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Expiration {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Expiration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => write!(f, "never"),
            Self::At(ms) => write!(f, "{ms}"),
        }
    }
}

// ============================================
// TrustLink
// ============================================

/// A signed assertion delegating write authority to `public_key`.
///
/// Each link is signed by the preceding authority: the feed key for
/// the first link, the previous link's `public_key` for every
/// subsequent one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustLink {
    /// Assertion format version (always 1).
    pub version: u32,
    /// The public key being granted authority.
    pub public_key: PublicKey,
    /// Random uniqueness nonce (32 bytes).
    pub nonce: [u8; LINK_NONCE_SIZE],
    /// Signature by the preceding authority over the link digest.
    pub signature: [u8; SIGNATURE_SIZE],
    /// Advisory expiration of the grant.
    pub expiration: Expiration,
}

impl TrustLink {
    /// Issues a new link delegating to `delegate`, signed by
    /// `authority`.
    #[must_use]
    pub fn issue<C: Crypto>(
        crypto: &C,
        authority: &SecretKey,
        delegate: PublicKey,
        expiration: Expiration,
    ) -> Self {
        let mut nonce = [0u8; LINK_NONCE_SIZE];
        crypto.fill_random(&mut nonce);

        let mut link = Self {
            version: LINK_VERSION,
            public_key: delegate,
            nonce,
            signature: [0u8; SIGNATURE_SIZE],
            expiration,
        };
        let digest = link.digest(crypto);
        link.signature = crypto.sign(&digest, authority);
        link
    }

    /// Constructs the data covered by the link signature.
    ///
    /// # Wire Format
    /// ```text
    /// version (1 byte) ‖ public_key (32 bytes) ‖ nonce (32 bytes)
    /// ```
    #[must_use]
    pub fn sign_data(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(1 + 32 + LINK_NONCE_SIZE);
        data.push(self.version as u8);
        data.extend_from_slice(self.public_key.as_bytes());
        data.extend_from_slice(&self.nonce);
        data
    }

    /// Computes the keyed digest the signature covers.
    #[must_use]
    pub fn digest<C: Crypto>(&self, crypto: &C) -> [u8; HASH_SIZE] {
        crypto.hash(HASH_KEY, &self.sign_data())
    }

    /// Encodes the link to its opaque wire form.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        write_uint_field(1, self.version, &mut buf);
        write_bytes_field(2, self.public_key.as_bytes(), &mut buf);
        write_bytes_field(3, &self.nonce, &mut buf);
        write_bytes_field(4, &self.signature, &mut buf);
        if let Expiration::At(ms) = self.expiration {
            write_tag(5, WIRE_VARINT, &mut buf);
            write_uvarint64(ms, &mut buf);
        }
        buf.freeze()
    }

    /// Decodes a link from its opaque wire form.
    ///
    /// # Errors
    /// `MalformedMessage` / `MissingField` on any schema violation.
    pub fn decode(mut buf: &[u8]) -> Result<Self> {
        let mut version = None;
        let mut public_key = None;
        let mut nonce = None;
        let mut signature = None;
        let mut expiration = Expiration::Never;

        while !buf.is_empty() {
            let (field, wire) = read_tag(&mut buf)?;
            match (field, wire) {
                (1, WIRE_VARINT) => version = Some(read_uvarint(&mut buf)?),
                (2, WIRE_LEN) => {
                    let raw = read_len_delimited(&mut buf)?;
                    public_key = Some(PublicKey::from_bytes(raw).map_err(|_| {
                        CoreError::malformed(format!(
                            "link public key must be 32 bytes, got {}",
                            raw.len()
                        ))
                    })?);
                }
                (3, WIRE_LEN) => {
                    let raw = read_len_delimited(&mut buf)?;
                    if raw.len() != LINK_NONCE_SIZE {
                        return Err(CoreError::malformed(format!(
                            "link nonce must be {LINK_NONCE_SIZE} bytes, got {}",
                            raw.len()
                        )));
                    }
                    let mut fixed = [0u8; LINK_NONCE_SIZE];
                    fixed.copy_from_slice(raw);
                    nonce = Some(fixed);
                }
                (4, WIRE_LEN) => {
                    let raw = read_len_delimited(&mut buf)?;
                    if raw.len() != SIGNATURE_SIZE {
                        return Err(CoreError::malformed(format!(
                            "link signature must be {SIGNATURE_SIZE} bytes, got {}",
                            raw.len()
                        )));
                    }
                    let mut fixed = [0u8; SIGNATURE_SIZE];
                    fixed.copy_from_slice(raw);
                    signature = Some(fixed);
                }
                (5, WIRE_VARINT) => expiration = Expiration::At(read_uvarint64(&mut buf)?),
                _ => skip_field(wire, &mut buf)?,
            }
        }

        Ok(Self {
            version: version.ok_or(CoreError::missing_field("TrustLink", "version"))?,
            public_key: public_key.ok_or(CoreError::missing_field("TrustLink", "publicKey"))?,
            nonce: nonce.ok_or(CoreError::missing_field("TrustLink", "nonce"))?,
            signature: signature.ok_or(CoreError::missing_field("TrustLink", "signature"))?,
            expiration,
        })
    }
}

// Links persist in their opaque wire form: base64 when human-readable,
// raw bytes otherwise.
impl Serialize for TrustLink {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
        let encoded = self.encode();
        if serializer.is_human_readable() {
            serializer.serialize_str(&BASE64.encode(&encoded))
        } else {
            serializer.serialize_bytes(&encoded)
        }
    }
}

impl<'de> Deserialize<'de> for TrustLink {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
        let bytes = if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            BASE64.decode(&s).map_err(serde::de::Error::custom)?
        } else {
            <Vec<u8>>::deserialize(deserializer)?
        };
        Self::decode(&bytes).map_err(serde::de::Error::custom)
    }
}

// ============================================
// Tests
// ============================================
