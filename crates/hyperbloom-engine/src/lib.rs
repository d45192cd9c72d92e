// ============================================
// File: crates/hyperbloom-engine/src/lib.rs
// ============================================
//! # HyperBloom Engine - Framing, Session & Handshake
//!
//! ## Creation Reason
//! Implements the stateful half of the HyperBloom wire protocol: the
//! byte-driven frame parser, the session state machine with its
//! deferred-credential handshake, the pre-secure send queue and the
//! trust-chain shortening exchange.
//!
//! ## Main Functionality
//!
//! ### Session ([`session`])
//! The sans-io duplex engine: bytes in via `ingest`, bytes out via
//! `take_outbound`, milestones via `poll_event`.
//!
//! ### Frame parser ([`parser`])
//! Extracts frames across the mid-stream plaintext-to-ciphertext
//! boundary, pausing until the session installs the inbound
//! keystream.
//!
//! ### Handshake logic ([`handshake`])
//! Paired-nonce signatures, chain verification and shortening.
//!
//! ### Duplex driver ([`duplex`])
//! Runs a session over any tokio `AsyncRead + AsyncWrite` transport.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │           hyperbloom-engine                 │
//! │           You are here                      │
//! │                  │                          │
//! │                  ▼                          │
//! │           hyperbloom-core                   │
//! │                  │                          │
//! │                  ▼                          │
//! │           hyperbloom-common                 │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```no_run
//! use hyperbloom_core::crypto::SecretKey;
//! use hyperbloom_engine::{Session, StartOptions};
//!
//! let feed = SecretKey::generate();
//! let mut session = Session::new();
//! session.start(StartOptions::new(feed.public_key(), feed)).unwrap();
//!
//! // feed inbound bytes ...
//! // session.ingest(&chunk)?;
//! // ... forward session.take_outbound() to the transport,
//! // and react to session.poll_event().
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The engine is single-threaded cooperative by design; wrap it in
//!   the duplex driver (or your own pump) rather than adding locks
//! - Fatal errors are unrecoverable; create a new session
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod duplex;
pub mod error;
pub mod event;
pub mod handshake;
pub mod parser;
pub mod session;

// Re-export commonly used items
pub use error::{EngineError, Result};
pub use event::{Event, RemoteIdentity, SendId};
pub use session::{Session, StartOptions};
