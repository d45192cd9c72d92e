// ============================================
// File: crates/hyperbloom-core/src/trust/mod.rs
// ============================================
//! # Trust Module
//!
//! ## Creation Reason
//! Implements the bounded signature chains that establish which
//! private keys may authenticate as writers of a feed. The wire
//! engine treats chain elements as opaque bytes; only this module
//! parses them.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`link`]: the `TrustLink` assertion, its opaque encoding and
//!   issuance
//! - [`chain`]: chain walking, verification and the start-time
//!   self-check
//!
//! ## Trust Model
//! ```text
//! feed key ──signs──► link₁.publicKey ──signs──► link₂.publicKey ...
//!
//! A chain of 0..=5 links. The terminal public key (the feed key for
//! an empty chain) must sign the handshake's paired-nonce hash.
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Chain ISSUANCE policy (who may delegate, expirations) lives with
//!   the application; this module only verifies and issues single
//!   shortening links on request
//! - Expirations are informational during verification: the walk
//!   records the minimum but never rejects an expired link
//!
//! ## Last Modified
//! v0.1.0 - Initial trust implementation

pub mod chain;
pub mod link;

pub use chain::{decode_chain, encode_chain, self_check, verify_chain, ChainSummary};
pub use link::{Expiration, TrustLink, LINK_VERSION};

use crate::crypto::HASH_SIZE;

// ============================================
// Constants
// ============================================

/// Maximum number of links in a trust chain.
pub const MAX_CHAIN_LENGTH: usize = 5;

/// Size of a trust-link nonce in bytes.
pub const LINK_NONCE_SIZE: usize = 32;

/// The all-zero hash signed during the start-time chain self-check.
pub const ZERO_HASH: [u8; HASH_SIZE] = [0u8; HASH_SIZE];
