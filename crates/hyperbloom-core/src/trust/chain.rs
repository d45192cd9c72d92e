// ============================================
// File: crates/hyperbloom-core/src/trust/chain.rs
// ============================================
//! # Trust Chain Verification
//!
//! ## Creation Reason
//! Implements the chain walk that turns a sequence of trust links
//! into a single answer: which public key currently holds write
//! authority, and until when.
//!
//! ## Main Functionality
//! - `verify_chain`: walk + per-link signature verification
//! - `self_check`: the start-time proof that a session's secret key
//!   matches its chain's terminal authority
//! - `decode_chain` / `encode_chain`: opaque-bytes conversion
//!
//! ## Chain Walk
//! ```text
//! current = feedKey
//! for each link:
//!     require link.version == 1
//!     require verify(H(HASH_KEY, version ‖ publicKey ‖ nonce),
//!                    link.signature, current)
//!     current = link.publicKey
//! terminal = current          (the feed key for an empty chain)
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - An expired link still verifies; expirations are recorded, not
//!   enforced, at this layer
//! - Chain length is checked before any signature work
//!
//! ## Last Modified
//! v0.1.0 - Initial chain verification

use bytes::Bytes;
use tracing::trace;

use crate::crypto::{Crypto, PublicKey, SecretKey};
use crate::error::{CoreError, Result};

use super::link::{Expiration, TrustLink, LINK_VERSION};
use super::{MAX_CHAIN_LENGTH, ZERO_HASH};

// ============================================
// ChainSummary
// ============================================

/// Outcome of a successful chain walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainSummary {
    /// The public key holding write authority at the end of the walk.
    pub terminal: PublicKey,
    /// The earliest expiration across all links (`Never` for an empty
    /// chain or one without deadlines).
    pub min_expiration: Expiration,
}

// ============================================
// Verification
// ============================================

/// Walks a chain from the feed key, verifying every link signature.
///
/// # Errors
/// - `ChainTooLong` if more than [`MAX_CHAIN_LENGTH`] links
/// - `UnsupportedLinkVersion` for any version other than 1
/// - `LinkSignature` if a link fails to verify under its authority
pub fn verify_chain<C: Crypto>(
    crypto: &C,
    feed_key: &PublicKey,
    chain: &[TrustLink],
) -> Result<ChainSummary> {
    if chain.len() > MAX_CHAIN_LENGTH {
        return Err(CoreError::ChainTooLong {
            len: chain.len(),
            max: MAX_CHAIN_LENGTH,
        });
    }

    let mut current = *feed_key;
    let mut min_expiration = Expiration::Never;

    for (index, link) in chain.iter().enumerate() {
        if link.version != LINK_VERSION {
            return Err(CoreError::UnsupportedLinkVersion {
                version: link.version,
            });
        }
        let digest = link.digest(crypto);
        if !crypto.verify(&digest, &link.signature, &current) {
            return Err(CoreError::LinkSignature { index });
        }
        min_expiration = min_expiration.min(link.expiration);
        current = link.public_key;
    }

    trace!(links = chain.len(), terminal = %current, "chain walk complete");

    Ok(ChainSummary {
        terminal: current,
        min_expiration,
    })
}

/// Proves that `secret` holds the authority a chain delegates.
///
/// Signs the all-zero hash and verifies it under the walk's terminal
/// public key. Run at `start` time against the local chain and when
/// adopting a shortened chain.
///
/// # Errors
/// Any chain-walk error, or `ChainKeyMismatch` when the terminal key
/// is not `secret`'s public key.
pub fn self_check<C: Crypto>(
    crypto: &C,
    feed_key: &PublicKey,
    chain: &[TrustLink],
    secret: &SecretKey,
) -> Result<ChainSummary> {
    let summary = verify_chain(crypto, feed_key, chain)?;
    let signature = crypto.sign(&ZERO_HASH, secret);
    if !crypto.verify(&ZERO_HASH, &signature, &summary.terminal) {
        return Err(CoreError::ChainKeyMismatch);
    }
    Ok(summary)
}

// ============================================
// Opaque-bytes Conversion
// ============================================

/// Decodes a sequence of opaque wire links.
pub fn decode_chain(encoded: &[Bytes]) -> Result<Vec<TrustLink>> {
    encoded.iter().map(|raw| TrustLink::decode(raw)).collect()
}

/// Encodes a chain back to its opaque wire form.
#[must_use]
pub fn encode_chain(chain: &[TrustLink]) -> Vec<Bytes> {
    chain.iter().map(TrustLink::encode).collect()
}

// ============================================
// Tests
// ============================================
