// ============================================
// File: crates/hyperbloom-common/src/lib.rs
// ============================================
//! # HyperBloom Common - Shared Foundation Types
//!
//! ## Creation Reason
//! Provides the foundational error and identifier types shared by the
//! HyperBloom protocol crates, keeping the core and engine crates free
//! of duplicated plumbing.
//!
//! ## Main Functionality
//! - [`error`]: Base error enum and `Result` alias
//! - [`types`]: `PeerId` and size constants for wire identifiers
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │           hyperbloom-engine                 │
//! │                  │                          │
//! │                  ▼                          │
//! │           hyperbloom-core                   │
//! │                  │                          │
//! │                  ▼                          │
//! │           hyperbloom-common                 │
//! │           You are here                      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - This crate must stay dependency-light; it is pulled in everywhere
//! - Never add protocol logic here - only shared vocabulary types
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;

pub use error::{CommonError, Result};
pub use types::{PeerId, PEER_ID_SIZE};
