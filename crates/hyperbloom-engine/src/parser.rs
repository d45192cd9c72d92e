// ============================================
// File: crates/hyperbloom-engine/src/parser.rs
// ============================================
//! # Frame Parser
//!
//! ## Creation Reason
//! Extracts one frame at a time from an arbitrary inbound byte stream.
//! The parser straddles the plaintext-to-ciphertext boundary: the
//! `Open` frame arrives in the clear, everything after it is XOR'd
//! with a keystream the session can only construct once credentials
//! are available.
//!
//! ## State Machine
//! ```text
//! Magic ──► OpenLength ──► OpenBody ──► Paused ──resume──► FrameLength
//!                                                          │       ▲
//!                                                          ▼       │
//!                                                        FrameBody ┘
//! ```
//!
//! ## Main Functionality
//! - `FrameParser::push`: ingest a chunk, emit decoded frames
//! - `FrameParser::resume`: install the inbound keystream and replay
//!   the ciphertext buffered while paused
//!
//! ## The Pause Edge
//! Bytes that arrive in the same chunk as (or after) the `Open` frame
//! are ciphertext under a key derived from credentials the session
//! may not have yet. They are buffered RAW; `resume` XORs them once
//! and re-enters the loop. The keystream is never rewound, so every
//! byte is decrypted exactly once.
//!
//! ## Dispatch Rules
//! - Unknown ids are skipped silently (forward compatibility)
//! - The first KNOWN id must be `Handshake`; a second one is fatal
//!
//! ## ⚠️ Important Note for Next Developer
//! - Any fatal error wedges the parser permanently; there is no
//!   recovery by design
//! - The `Paused` buffer is bounded by `MAX_FRAME_SIZE` - that's the
//!   backpressure guarantee while credentials are pending
//!
//! ## Last Modified
//! v0.1.0 - Initial parser implementation

use bytes::{Buf, BytesMut};
use tracing::{debug, trace};

use hyperbloom_core::crypto::{Keystream, NONCE_SIZE};
use hyperbloom_core::error::CoreError;
use hyperbloom_core::protocol::wire::{peek_uvarint, read_uvarint, MAX_VARINT_LEN};
use hyperbloom_core::protocol::{codec, Message, MessageType, Open, MAGIC, MAX_FRAME_SIZE};

use crate::error::{EngineError, Result};

// ============================================
// ParserEvent
// ============================================

/// A decoded inbound frame, in wire order.
#[derive(Debug)]
pub enum ParserEvent {
    /// The plaintext key-exchange frame.
    Open(Open),
    /// An encrypted-family message (handshake ordering already
    /// enforced).
    Message(Message),
}

// ============================================
// ParseState
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Waiting for the 4 magic bytes.
    Magic,
    /// Waiting for the Open frame length varint.
    OpenLength,
    /// Waiting for the Open frame body.
    OpenBody,
    /// Open decoded; buffering raw ciphertext until `resume`.
    Paused,
    /// Waiting for a frame length varint.
    FrameLength,
    /// Waiting for a frame body.
    FrameBody,
    /// A fatal error occurred; all further input is ignored.
    Failed,
}

// ============================================
// FrameParser
// ============================================

/// Byte-driven frame extraction state machine.
///
/// Generic over the keystream so tests can inject deterministic
/// crypto through the same adapter the session uses.
pub struct FrameParser<K: Keystream> {
    state: ParseState,
    /// Decrypted (or plaintext, before `Open`) working buffer.
    buf: BytesMut,
    /// Raw ciphertext captured while paused.
    pending: BytesMut,
    /// Body length awaited in `OpenBody` / `FrameBody`.
    awaiting: usize,
    /// Inbound keystream; installed at `resume`.
    keystream: Option<K>,
    /// True until the first known-id frame (which must be the
    /// handshake) has been dispatched.
    expect_handshake: bool,
    seen_handshake: bool,
}

impl<K: Keystream> FrameParser<K> {
    /// Creates a parser positioned at the start of a stream.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ParseState::Magic,
            buf: BytesMut::new(),
            pending: BytesMut::new(),
            awaiting: 0,
            keystream: None,
            expect_handshake: true,
            seen_handshake: false,
        }
    }

    /// Returns `true` once a fatal error has wedged the parser.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.state == ParseState::Failed
    }

    /// Returns `true` while waiting for the session to `resume`.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state == ParseState::Paused
    }

    /// Ingests one inbound chunk, appending decoded frames to
    /// `events`.
    ///
    /// # Errors
    /// Any framing or decoding failure; the parser is wedged
    /// afterwards.
    pub fn push(&mut self, chunk: &[u8], events: &mut Vec<ParserEvent>) -> Result<()> {
        match self.state {
            ParseState::Failed => Ok(()),
            ParseState::Paused => {
                // The inbound key is still unknown; buffer raw. One
                // maximum-size frame plus its length prefix must fit.
                if self.pending.len() + chunk.len() > MAX_FRAME_SIZE + MAX_VARINT_LEN {
                    return Err(self.fail(EngineError::MessageTooBig {
                        buffered: self.pending.len() + chunk.len(),
                    }));
                }
                self.pending.extend_from_slice(chunk);
                Ok(())
            }
            _ => {
                let start = self.buf.len();
                self.buf.extend_from_slice(chunk);
                if let Some(keystream) = &mut self.keystream {
                    keystream.xor(&mut self.buf[start..]);
                }
                self.process(events)
            }
        }
    }

    /// Installs the inbound keystream, decrypts the ciphertext
    /// buffered while paused and re-enters the parse loop.
    ///
    /// # Errors
    /// Any failure decoding the replayed bytes.
    pub fn resume(&mut self, mut keystream: K, events: &mut Vec<ParserEvent>) -> Result<()> {
        debug_assert_eq!(self.state, ParseState::Paused, "resume outside pause");

        let mut pending = std::mem::take(&mut self.pending);
        keystream.xor(&mut pending[..]);
        self.buf = pending;
        self.keystream = Some(keystream);
        self.state = ParseState::FrameLength;

        debug!(replayed = self.buf.len(), "parser resumed");
        self.process(events)
    }

    /// Marks the parser failed and passes the error through.
    fn fail(&mut self, err: EngineError) -> EngineError {
        self.state = ParseState::Failed;
        err
    }

    /// Advances the state machine while enough bytes are buffered.
    fn process(&mut self, events: &mut Vec<ParserEvent>) -> Result<()> {
        loop {
            match self.state {
                ParseState::Magic => {
                    if self.buf.len() < MAGIC.len() {
                        break;
                    }
                    let magic = self.buf.split_to(MAGIC.len());
                    if magic[..] != MAGIC {
                        return Err(self.fail(EngineError::BadMagic));
                    }
                    self.state = ParseState::OpenLength;
                }

                ParseState::OpenLength | ParseState::FrameLength => {
                    let parsed = match peek_uvarint(&self.buf) {
                        Ok(parsed) => parsed,
                        Err(err) => return Err(self.fail(err.into())),
                    };
                    let Some((len, consumed)) = parsed else { break };
                    if len as usize > MAX_FRAME_SIZE {
                        return Err(self.fail(EngineError::FrameTooLarge {
                            declared: len as usize,
                            max: MAX_FRAME_SIZE,
                        }));
                    }
                    self.buf.advance(consumed);
                    self.awaiting = len as usize;
                    self.state = if self.state == ParseState::OpenLength {
                        ParseState::OpenBody
                    } else {
                        ParseState::FrameBody
                    };
                }

                ParseState::OpenBody => {
                    if self.buf.len() < self.awaiting {
                        break;
                    }
                    let body = self.buf.split_to(self.awaiting);
                    let open = self.decode_open(&body)?;

                    // Everything still buffered is ciphertext under a
                    // key we don't hold yet; park it raw.
                    self.pending = std::mem::take(&mut self.buf);
                    self.state = ParseState::Paused;
                    trace!(pending = self.pending.len(), "open decoded, parser paused");
                    events.push(ParserEvent::Open(open));
                    break;
                }

                ParseState::FrameBody => {
                    if self.buf.len() < self.awaiting {
                        break;
                    }
                    let body = self.buf.split_to(self.awaiting);
                    self.dispatch(&body, events)?;
                    self.state = ParseState::FrameLength;
                }

                ParseState::Paused | ParseState::Failed => break,
            }
        }
        Ok(())
    }

    /// Decodes and validates the `Open` body.
    fn decode_open(&mut self, body: &[u8]) -> Result<Open> {
        let open = match codec::decode_open(body) {
            Ok(open) => open,
            Err(err) => return Err(self.fail(err.into())),
        };
        if open.feed.len() != hyperbloom_core::crypto::HASH_SIZE {
            let err = CoreError::malformed(format!(
                "open feed must be {} bytes, got {}",
                hyperbloom_core::crypto::HASH_SIZE,
                open.feed.len()
            ));
            return Err(self.fail(err.into()));
        }
        if open.nonce.len() != NONCE_SIZE {
            return Err(self.fail(EngineError::InvalidNonce {
                actual: open.nonce.len(),
            }));
        }
        Ok(open)
    }

    /// Decodes one frame body and applies the dispatch rules.
    fn dispatch(&mut self, body: &[u8], events: &mut Vec<ParserEvent>) -> Result<()> {
        let mut cursor = body;
        let id = match read_uvarint(&mut cursor) {
            Ok(id) => id,
            Err(err) => return Err(self.fail(err.into())),
        };

        let Some(msg_type) = MessageType::from_id(id) else {
            // Unknown ids are skipped after paying for their bytes.
            trace!(id, len = body.len(), "skipping unknown frame id");
            return Ok(());
        };

        if msg_type == MessageType::Handshake {
            if self.seen_handshake {
                return Err(self.fail(EngineError::DuplicateHandshake));
            }
            self.seen_handshake = true;
            self.expect_handshake = false;
        } else if self.expect_handshake {
            return Err(self.fail(EngineError::HandshakeExpected { id }));
        }

        let msg = match codec::decode_body(msg_type, cursor) {
            Ok(msg) => msg,
            Err(err) => return Err(self.fail(err.into())),
        };
        trace!(msg = msg_type.name(), len = body.len(), "frame decoded");
        events.push(ParserEvent::Message(msg));
        Ok(())
    }
}

impl<K: Keystream> Default for FrameParser<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Keystream> std::fmt::Debug for FrameParser<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameParser")
            .field("state", &self.state)
            .field("buffered", &self.buf.len())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================
