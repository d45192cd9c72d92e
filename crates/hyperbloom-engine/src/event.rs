// ============================================
// File: crates/hyperbloom-engine/src/event.rs
// ============================================
//! # Session Events
//!
//! ## Creation Reason
//! Defines the ordered event surface through which the engine reports
//! protocol milestones and delivers decoded messages.
//!
//! ## Main Functionality
//! - `Event`: everything a session can tell its embedder
//! - `RemoteIdentity`: the peer's verified identity at `Secure`
//! - `SendId`: delivery ticket returned by the send APIs
//!
//! ## Ordering Guarantee
//! Events are queued in protocol order and drained by
//! `Session::poll_event`; decoded messages are delivered in wire
//! order, and `Sent` tickets fire after the frame has been handed to
//! the outbound buffer.
//!
//! ## Last Modified
//! v0.1.0 - Initial event definitions

use hyperbloom_common::types::PeerId;
use hyperbloom_core::protocol::{Message, Open};
use hyperbloom_core::trust::{Expiration, TrustLink};

// ============================================
// SendId
// ============================================

/// Ticket identifying one send API call.
///
/// The matching [`Event::Sent`] fires once the frame has been handed
/// to the outbound buffer. Tickets pending in the queue when the
/// session is destroyed are dropped without an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SendId(pub(crate) u64);

// ============================================
// RemoteIdentity
// ============================================

/// The remote peer's identity, populated at the `Secure` milestone.
#[derive(Debug, Clone)]
pub struct RemoteIdentity {
    /// The peer's per-session id.
    pub id: PeerId,
    /// The peer's verified trust chain.
    pub chain: Vec<TrustLink>,
    /// Reserved extension strings announced by the peer.
    pub extensions: Vec<String>,
    /// Earliest expiration across the peer's chain.
    pub min_expiration: Expiration,
}

// ============================================
// Event
// ============================================

/// An engine event, drained via `Session::poll_event`.
#[derive(Debug, Clone)]
pub enum Event {
    /// The remote `Open` frame was decoded. Credentials may now be
    /// supplied via `start` if they weren't already.
    Open(Open),
    /// The remote handshake verified; the session is secure and
    /// queued sends are flushing.
    Secure(RemoteIdentity),
    /// A decoded application message (`Sync`, `FilterOptions`,
    /// `Data` or `Request`), in wire order.
    Message(Message),
    /// The local chain was replaced by a verified shorter chain.
    ChainUpdate(Vec<TrustLink>),
    /// The frame for this ticket was handed to the outbound buffer.
    Sent(SendId),
    /// The session is destroyed; no further events will follow.
    Closed,
}

impl Event {
    /// Human-readable event name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Open(_) => "open",
            Self::Secure(_) => "secure",
            Self::Message(_) => "message",
            Self::ChainUpdate(_) => "chain-update",
            Self::Sent(_) => "sent",
            Self::Closed => "close",
        }
    }
}
