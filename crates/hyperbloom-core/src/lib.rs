// ============================================
// File: crates/hyperbloom-core/src/lib.rs
// ============================================
//! # HyperBloom Core - Protocol & Cryptography Library
//!
//! ## Creation Reason
//! Provides the pure (stateless, I/O-free) protocol definitions and
//! cryptographic operations for the HyperBloom set-reconciliation wire
//! protocol. The stateful engine in `hyperbloom-engine` is built on
//! top of this crate.
//!
//! ## Main Functionality
//!
//! ### Protocol Module ([`protocol`])
//! - Message type definitions (`Open`, `Handshake`, `Sync`, ...)
//! - Varint and tagged-field wire primitives
//! - Binary codec for frame serialization
//!
//! ### Crypto Module ([`crypto`])
//! - Key types (`SecretKey`, `PublicKey`) and discovery-key derivation
//! - Injected [`crypto::Crypto`] adapter (sign, verify, keyed hash,
//!   XSalsa20 keystream, randomness)
//!
//! ### Trust Module ([`trust`])
//! - Trust links (signed delegation assertions) and their opaque
//!   wire encoding
//! - Bounded chain verification and link issuance
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │           hyperbloom-engine                 │
//! │                  │                          │
//! │                  ▼                          │
//! │           hyperbloom-core                   │
//! │           You are here                      │
//! │                  │                          │
//! │                  ▼                          │
//! │           hyperbloom-common                 │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Security Guarantees
//! - **Confidentiality**: XSalsa20 per-direction keystreams
//! - **Authenticity**: Ed25519 detached signatures over keyed hashes
//! - **Authority**: bounded signature chains rooted at the feed key
//!
//! ## ⚠️ Important Note for Next Developer
//! - ALL cryptographic code uses audited RustCrypto / dalek crates
//! - NEVER implement custom crypto primitives
//! - Secret keys MUST be zeroed on drop
//! - Wire-format changes break every deployed peer - don't
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod crypto;
pub mod error;
pub mod protocol;
pub mod trust;

// Re-export commonly used items
pub use crypto::{Crypto, DefaultCrypto, Keystream, PublicKey, SecretKey};
pub use error::{CoreError, Result};
pub use protocol::{Message, MessageType, Open};
pub use trust::{ChainSummary, Expiration, TrustLink};
