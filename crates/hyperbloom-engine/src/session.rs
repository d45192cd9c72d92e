// ============================================
// File: crates/hyperbloom-engine/src/session.rs
// ============================================
//! # Session
//!
//! ## Creation Reason
//! Owns one duplex protocol session: identity and credentials, the
//! frame parser, the outbound keystream, handshake pairing state, the
//! pre-secure send queue and the event surface.
//!
//! ## Session Lifecycle
//! ```text
//! ┌──────────┐  start()   ┌───────────┐  remote Open  ┌──────────┐
//! │ Created  │ ─────────► │ OpenSent  │ ────────────► │  Paired  │
//! └────┬─────┘            └───────────┘               └────┬─────┘
//!      │ remote Open (credentials may arrive later)        │
//!      ▼                                                   ▼
//! ┌──────────────┐   start()    ┌──────────┐  handshake  ┌────────┐
//! │ OpenReceived │ ───────────► │  Paired  │ ──────────► │ Secure │
//! └──────────────┘              └──────────┘  verified   └───┬────┘
//!                                                           │
//!                                             destroy / fatal error
//!                                                           ▼
//!                                                      ┌────────┐
//!                                                      │ Closed │
//!                                                      └────────┘
//! ```
//!
//! ## Main Functionality
//! - `Session::start`: supply credentials, emit the plaintext `Open`
//! - `Session::ingest`: consume inbound bytes (fatal errors returned)
//! - Send APIs (`sync`, `filter_options`, `data`, `request`):
//!   validated synchronously, queued until `Secure`
//! - `Session::poll_event` / `Session::take_outbound`: the sans-io
//!   duplex surface
//!
//! ## Ordering Guarantees
//! - Outbound bytes start with MAGIC; everything after the `Open`
//!   frame is XOR'd with the outbound keystream in emission order
//! - Queued sends flush FIFO at the `Secure` edge, after the engine's
//!   own handshake and any chain-shortening link
//!
//! ## ⚠️ Important Note for Next Developer
//! - Handshake nonces are zeroed the moment the paired hashes exist;
//!   nothing may touch them afterwards
//! - `destroy` drops queued sends WITHOUT emitting their `Sent`
//!   events - that is the documented contract
//!
//! ## Last Modified
//! v0.1.0 - Initial session implementation

use std::collections::VecDeque;

use bytes::{Bytes, BytesMut};
use tracing::{debug, info, warn};
use zeroize::Zeroize;

use hyperbloom_common::types::PeerId;
use hyperbloom_core::crypto::{
    self, Crypto, DefaultCrypto, Keystream, PublicKey, SecretKey, HASH_KEY, HASH_SIZE, NONCE_SIZE,
};
use hyperbloom_core::protocol::messages::{
    Data, FilterOptions, Handshake, Link, Message, Open, Request, Sync,
};
use hyperbloom_core::protocol::codec;
use hyperbloom_core::trust::{chain as trust_chain, TrustLink};

use crate::error::{EngineError, Result};
use crate::event::{Event, RemoteIdentity, SendId};
use crate::handshake;
use crate::parser::{FrameParser, ParserEvent};

// ============================================
// StartOptions
// ============================================

/// Credentials supplied to [`Session::start`].
#[derive(Debug)]
pub struct StartOptions {
    /// The feed's 32-byte public key; roots the trust chain and seeds
    /// both stream ciphers.
    pub feed_key: PublicKey,
    /// The 64-byte signing key holding the chain's terminal authority.
    pub secret_key: SecretKey,
    /// The local trust chain (0..=5 links, pre-verified at start).
    pub chain: Vec<TrustLink>,
    /// Explicit discovery key; derived from `feed_key` when absent.
    pub discovery_key: Option<[u8; HASH_SIZE]>,
}

impl StartOptions {
    /// Creates options with an empty chain and a derived discovery
    /// key.
    #[must_use]
    pub fn new(feed_key: PublicKey, secret_key: SecretKey) -> Self {
        Self {
            feed_key,
            secret_key,
            chain: Vec::new(),
            discovery_key: None,
        }
    }

    /// Sets the local trust chain.
    #[must_use]
    pub fn with_chain(mut self, chain: Vec<TrustLink>) -> Self {
        self.chain = chain;
        self
    }

    /// Supplies an explicit discovery key.
    #[must_use]
    pub fn with_discovery_key(mut self, discovery_key: [u8; HASH_SIZE]) -> Self {
        self.discovery_key = Some(discovery_key);
        self
    }
}

// ============================================
// Credentials
// ============================================

/// Validated credentials held after `start`.
struct Credentials {
    feed_key: PublicKey,
    secret_key: SecretKey,
    chain: Vec<TrustLink>,
    discovery: [u8; HASH_SIZE],
}

// ============================================
// Session
// ============================================

/// One duplex protocol session.
///
/// Sans-io: bytes go in through [`Session::ingest`], come out through
/// [`Session::take_outbound`], and milestones surface through
/// [`Session::poll_event`]. All methods run on the caller's thread;
/// there is no internal locking.
pub struct Session<C: Crypto = DefaultCrypto> {
    crypto: C,
    id: PeerId,
    parser: FrameParser<C::Keystream>,
    out_keystream: Option<C::Keystream>,
    outbound: VecDeque<Bytes>,
    events: VecDeque<Event>,

    creds: Option<Credentials>,
    local_nonce: Option<[u8; NONCE_SIZE]>,
    remote_nonce: Option<[u8; NONCE_SIZE]>,
    /// Remote `Open.feed`, held until credentials allow the match
    /// check.
    remote_feed: Option<Bytes>,
    /// The remote's view of the paired hash; what its handshake
    /// signature must cover.
    reverse_paired_hash: Option<[u8; HASH_SIZE]>,
    handshake_sent: bool,

    secure: bool,
    remote: Option<RemoteIdentity>,

    queue: VecDeque<(SendId, Message)>,
    next_send_id: u64,
    destroyed: bool,
}

impl Session<DefaultCrypto> {
    /// Creates a session with the production crypto adapter and a
    /// random peer id. Credentials arrive later via [`Session::start`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_crypto(DefaultCrypto::new())
    }
}

impl Default for Session<DefaultCrypto> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Crypto> Session<C> {
    /// Creates a session with an injected crypto adapter.
    #[must_use]
    pub fn with_crypto(crypto: C) -> Self {
        let mut id = [0u8; 32];
        crypto.fill_random(&mut id);
        Self {
            crypto,
            id: PeerId::from_array(id),
            parser: FrameParser::new(),
            out_keystream: None,
            outbound: VecDeque::new(),
            events: VecDeque::new(),
            creds: None,
            local_nonce: None,
            remote_nonce: None,
            remote_feed: None,
            reverse_paired_hash: None,
            handshake_sent: false,
            secure: false,
            remote: None,
            queue: VecDeque::new(),
            next_send_id: 0,
            destroyed: false,
        }
    }

    /// Overrides the random peer id; only meaningful before `start`.
    #[must_use]
    pub fn with_id(mut self, id: PeerId) -> Self {
        self.id = id;
        self
    }

    // ========================================
    // Accessors
    // ========================================

    /// The local peer id carried in the handshake.
    #[must_use]
    pub fn id(&self) -> PeerId {
        self.id
    }

    /// `true` once the remote handshake has verified.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// `true` once the session has been destroyed (or failed).
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// The verified remote identity, available from `Secure`.
    #[must_use]
    pub fn remote(&self) -> Option<&RemoteIdentity> {
        self.remote.as_ref()
    }

    /// The current local trust chain, available from `start`.
    #[must_use]
    pub fn chain(&self) -> Option<&[TrustLink]> {
        self.creds.as_ref().map(|c| c.chain.as_slice())
    }

    /// The discovery key this session answers to, available from
    /// `start`.
    #[must_use]
    pub fn discovery_key(&self) -> Option<&[u8; HASH_SIZE]> {
        self.creds.as_ref().map(|c| &c.discovery)
    }

    // ========================================
    // Lifecycle
    // ========================================

    /// Supplies credentials and emits the plaintext `Open` frame.
    ///
    /// May be called before or after the remote `Open` arrives; in
    /// the latter case pairing completes immediately.
    ///
    /// # Errors
    /// - `CallerMisuse` if called twice
    /// - `InvalidChain` (fatal) if the chain self-check fails
    /// - `FeedMismatch` (fatal) if a previously received remote
    ///   `Open` names a different feed
    pub fn start(&mut self, options: StartOptions) -> Result<()> {
        if self.destroyed {
            return Err(EngineError::SessionClosed);
        }
        if self.creds.is_some() {
            return Err(EngineError::CallerMisuse {
                field: "start".into(),
                reason: "session already started".into(),
            });
        }

        let StartOptions {
            feed_key,
            secret_key,
            chain,
            discovery_key,
        } = options;

        // The chain must prove it delegates to our own secret key
        // before anything touches the wire.
        if let Err(err) = trust_chain::self_check(&self.crypto, &feed_key, &chain, &secret_key) {
            return Err(self.fail(EngineError::invalid_chain(format!(
                "chain self-check failed: {err}"
            ))));
        }

        let discovery = discovery_key.unwrap_or_else(|| crypto::discovery_key(&feed_key));
        if let Some(remote_feed) = &self.remote_feed {
            if remote_feed[..] != discovery {
                return Err(self.fail(EngineError::FeedMismatch));
            }
        }

        let mut local_nonce = [0u8; NONCE_SIZE];
        self.crypto.fill_random(&mut local_nonce);

        let open = Open {
            feed: Bytes::copy_from_slice(&discovery),
            nonce: Bytes::copy_from_slice(&local_nonce),
        };
        self.outbound.push_back(codec::encode_open(&open).freeze());
        self.out_keystream = Some(self.crypto.keystream(feed_key.as_bytes(), &local_nonce));
        self.local_nonce = Some(local_nonce);

        info!(
            discovery = %hex::encode(&discovery[..4]),
            links = chain.len(),
            "session started"
        );

        self.creds = Some(Credentials {
            feed_key,
            secret_key,
            chain,
            discovery,
        });

        if let Err(err) = self.maybe_pair() {
            return Err(self.fail(err));
        }
        Ok(())
    }

    /// Consumes one inbound chunk of arbitrary size.
    ///
    /// # Errors
    /// Any fatal protocol error; the session is inert afterwards and
    /// a `Closed` event has been queued.
    pub fn ingest(&mut self, chunk: &[u8]) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        let mut parsed = Vec::new();
        let push_result = self.parser.push(chunk, &mut parsed);

        // Frames decoded before a mid-chunk failure are still valid
        // and delivered in wire order.
        if let Err(err) = self.dispatch(parsed) {
            return Err(self.fail(err));
        }
        if let Err(err) = push_result {
            return Err(self.fail(err));
        }
        Ok(())
    }

    /// Destroys the session: releases keystreams, abandons queued
    /// sends (their `Sent` events never fire) and queues `Closed`.
    /// Idempotent.
    pub fn destroy(&mut self) {
        self.teardown();
    }

    // ========================================
    // Duplex Surface
    // ========================================

    /// Dequeues the next event, in protocol order.
    pub fn poll_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    /// Dequeues the next outbound chunk.
    pub fn take_outbound(&mut self) -> Option<Bytes> {
        self.outbound.pop_front()
    }

    // ========================================
    // Send APIs
    // ========================================

    /// Sends (or queues) a `Sync` message.
    ///
    /// # Errors
    /// `CallerMisuse` on field violations, `SessionClosed` after
    /// destroy. Both are non-fatal.
    pub fn sync(&mut self, msg: Sync) -> Result<SendId> {
        if self.destroyed {
            return Err(EngineError::SessionClosed);
        }
        msg.validate()?;
        Ok(self.send(Message::Sync(msg)))
    }

    /// Sends (or queues) a `FilterOptions` message.
    ///
    /// # Errors
    /// `SessionClosed` after destroy.
    pub fn filter_options(&mut self, msg: FilterOptions) -> Result<SendId> {
        if self.destroyed {
            return Err(EngineError::SessionClosed);
        }
        Ok(self.send(Message::FilterOptions(msg)))
    }

    /// Sends (or queues) a `Data` message.
    ///
    /// # Errors
    /// `CallerMisuse` on empty, empty-entry or duplicate values;
    /// `SessionClosed` after destroy.
    pub fn data(&mut self, msg: Data) -> Result<SendId> {
        if self.destroyed {
            return Err(EngineError::SessionClosed);
        }
        msg.validate()?;
        Ok(self.send(Message::Data(msg)))
    }

    /// Sends (or queues) a `Request` message.
    ///
    /// # Errors
    /// `CallerMisuse` on a missing start key or an explicit zero
    /// limit; `SessionClosed` after destroy.
    pub fn request(&mut self, msg: Request) -> Result<SendId> {
        if self.destroyed {
            return Err(EngineError::SessionClosed);
        }
        msg.validate()?;
        Ok(self.send(Message::Request(msg)))
    }

    fn send(&mut self, msg: Message) -> SendId {
        let send_id = SendId(self.next_send_id);
        self.next_send_id += 1;

        if self.secure {
            self.write_frame(&msg);
            self.events.push_back(Event::Sent(send_id));
        } else {
            self.queue.push_back((send_id, msg));
            debug!(queued = self.queue.len(), "send deferred until secure");
        }
        send_id
    }

    // ========================================
    // Inbound Dispatch
    // ========================================

    fn dispatch(&mut self, parsed: Vec<ParserEvent>) -> Result<()> {
        for event in parsed {
            if self.destroyed {
                break;
            }
            match event {
                ParserEvent::Open(open) => self.on_open(open)?,
                ParserEvent::Message(msg) => self.on_message(msg)?,
            }
        }
        Ok(())
    }

    fn on_open(&mut self, open: Open) -> Result<()> {
        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&open.nonce);
        self.remote_nonce = Some(nonce);

        if let Some(creds) = &self.creds {
            if open.feed[..] != creds.discovery {
                return Err(EngineError::FeedMismatch);
            }
        } else {
            // Credentials are still pending; remember the feed for
            // the check at start().
            self.remote_feed = Some(open.feed.clone());
        }

        debug!(feed = %hex::encode(&open.feed[..4]), "remote open received");
        self.events.push_back(Event::Open(open));
        self.maybe_pair()
    }

    /// Completes nonce pairing once credentials and both nonces are
    /// known: computes the paired hashes, zeroes the nonces, emits
    /// the local handshake and resumes the parser.
    fn maybe_pair(&mut self) -> Result<()> {
        if self.handshake_sent || self.destroyed {
            return Ok(());
        }
        let (Some(local_nonce), Some(remote_nonce)) = (self.local_nonce, self.remote_nonce) else {
            return Ok(());
        };
        let Some(creds) = &self.creds else {
            return Ok(());
        };

        let paired = self
            .crypto
            .hash_pair(HASH_KEY, &local_nonce, &remote_nonce);
        let reverse = self
            .crypto
            .hash_pair(HASH_KEY, &remote_nonce, &local_nonce);
        let in_keystream = self
            .crypto
            .keystream(creds.feed_key.as_bytes(), &remote_nonce);
        let hs = handshake::local_handshake(
            &self.crypto,
            self.id,
            &creds.secret_key,
            &creds.chain,
            &paired,
        );

        self.reverse_paired_hash = Some(reverse);

        // The nonces are never referenced again.
        if let Some(mut nonce) = self.local_nonce.take() {
            nonce.zeroize();
        }
        if let Some(mut nonce) = self.remote_nonce.take() {
            nonce.zeroize();
        }

        self.write_frame(&Message::Handshake(hs));
        self.handshake_sent = true;
        debug!("local handshake emitted, resuming parser");

        let mut parsed = Vec::new();
        self.parser.resume(in_keystream, &mut parsed)?;
        self.dispatch(parsed)
    }

    fn on_message(&mut self, msg: Message) -> Result<()> {
        match msg {
            Message::Handshake(hs) => self.on_handshake(hs),
            Message::Link(link) => self.on_link(link),
            Message::Data(data) => {
                data.validate()
                    .map_err(|err| EngineError::violation(err.to_string()))?;
                self.events.push_back(Event::Message(Message::Data(data)));
                Ok(())
            }
            Message::Sync(sync) => {
                sync.validate()
                    .map_err(|err| EngineError::violation(err.to_string()))?;
                self.events.push_back(Event::Message(Message::Sync(sync)));
                Ok(())
            }
            Message::Request(request) => {
                request
                    .validate()
                    .map_err(|err| EngineError::violation(err.to_string()))?;
                self.events
                    .push_back(Event::Message(Message::Request(request)));
                Ok(())
            }
            Message::FilterOptions(opts) => {
                self.events
                    .push_back(Event::Message(Message::FilterOptions(opts)));
                Ok(())
            }
        }
    }

    fn on_handshake(&mut self, hs: Handshake) -> Result<()> {
        let (feed_key, local_len) = {
            let Some(creds) = &self.creds else {
                return Err(EngineError::violation("handshake before credentials"));
            };
            (creds.feed_key, creds.chain.len())
        };
        let Some(reverse) = self.reverse_paired_hash else {
            return Err(EngineError::violation("handshake before nonce pairing"));
        };

        let (identity, summary) =
            handshake::verify_remote(&self.crypto, &feed_key, &reverse, &hs)?;
        let remote_len = identity.chain.len();

        info!(peer = %identity.id, links = remote_len, "session secure");
        self.secure = true;
        self.remote = Some(identity.clone());
        self.events.push_back(Event::Secure(identity));

        // One-shot shortening offer, before any queued user traffic.
        if handshake::should_shorten(local_len, remote_len) {
            if let Some(creds) = &self.creds {
                let link = handshake::shortening_link(&self.crypto, &creds.secret_key, &summary);
                let msg = Message::Link(Link { link: link.encode() });
                self.write_frame(&msg);
                debug!(remote_links = remote_len, "shortening link offered");
            }
        }

        self.flush_queue();
        Ok(())
    }

    fn on_link(&mut self, msg: Link) -> Result<()> {
        let link = TrustLink::decode(&msg.link)
            .map_err(|err| EngineError::invalid_chain(format!("link decode failed: {err}")))?;

        let adopted = {
            let Some(remote) = &self.remote else {
                return Err(EngineError::violation("link before secure"));
            };
            let Some(creds) = &self.creds else {
                return Err(EngineError::violation("link before credentials"));
            };
            handshake::adopt_link(
                &self.crypto,
                &creds.feed_key,
                &creds.secret_key,
                creds.chain.len(),
                &remote.chain,
                link,
            )?
        };

        if let Some(chain) = adopted {
            if let Some(creds) = self.creds.as_mut() {
                creds.chain = chain.clone();
            }
            self.events.push_back(Event::ChainUpdate(chain));
        }
        Ok(())
    }

    // ========================================
    // Outbound
    // ========================================

    /// Encodes, encrypts and enqueues one frame.
    fn write_frame(&mut self, msg: &Message) {
        let mut frame: BytesMut = codec::encode_frame(msg);
        let keystream = self
            .out_keystream
            .as_mut()
            .expect("outbound keystream installed at start");
        keystream.xor(&mut frame[..]);
        self.outbound.push_back(frame.freeze());
    }

    /// Flushes the pre-secure queue FIFO.
    fn flush_queue(&mut self) {
        let queue = std::mem::take(&mut self.queue);
        let flushed = queue.len();
        for (send_id, msg) in queue {
            self.write_frame(&msg);
            self.events.push_back(Event::Sent(send_id));
        }
        if flushed > 0 {
            debug!(flushed, "send queue drained");
        }
    }

    // ========================================
    // Teardown
    // ========================================

    fn fail(&mut self, err: EngineError) -> EngineError {
        warn!(error = %err, "session failed");
        self.teardown();
        err
    }

    fn teardown(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.queue.clear();
        self.out_keystream = None;
        if let Some(mut nonce) = self.local_nonce.take() {
            nonce.zeroize();
        }
        if let Some(mut nonce) = self.remote_nonce.take() {
            nonce.zeroize();
        }
        self.events.push_back(Event::Closed);
    }
}

impl<C: Crypto> std::fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("secure", &self.secure)
            .field("destroyed", &self.destroyed)
            .field("queued", &self.queue.len())
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BufMut;
    use hyperbloom_core::crypto::discovery_key;

    fn started_pair() -> (Session, Session, SecretKey) {
        let feed = SecretKey::generate();
        let mut a = Session::new();
        let mut b = Session::new();
        a.start(StartOptions::new(
            feed.public_key(),
            SecretKey::from_bytes(&feed.to_bytes()).unwrap(),
        ))
        .unwrap();
        b.start(StartOptions::new(
            feed.public_key(),
            SecretKey::from_bytes(&feed.to_bytes()).unwrap(),
        ))
        .unwrap();
        (a, b, feed)
    }

    fn pump(a: &mut Session, b: &mut Session) {
        loop {
            let mut progressed = false;
            while let Some(chunk) = a.take_outbound() {
                b.ingest(&chunk).unwrap();
                progressed = true;
            }
            while let Some(chunk) = b.take_outbound() {
                a.ingest(&chunk).unwrap();
                progressed = true;
            }
            if !progressed {
                break;
            }
        }
    }

    #[test]
    fn test_open_event_before_credentials() {
        let (mut a, _, _) = started_pair();
        let mut late = Session::new();

        while let Some(chunk) = a.take_outbound() {
            late.ingest(&chunk).unwrap();
        }

        // No credentials yet: the open event still fires
        assert!(matches!(late.poll_event(), Some(Event::Open(_))));
        assert!(!late.is_secure());
    }

    #[test]
    fn test_feed_mismatch_after_start() {
        let (mut a, _, _) = started_pair();

        let other_feed = SecretKey::generate();
        let mut c = Session::new();
        c.start(StartOptions::new(
            other_feed.public_key(),
            SecretKey::from_bytes(&other_feed.to_bytes()).unwrap(),
        ))
        .unwrap();

        let chunk = a.take_outbound().unwrap();
        let err = c.ingest(&chunk).unwrap_err();
        assert!(matches!(err, EngineError::FeedMismatch));
        assert!(c.is_destroyed());
    }

    #[test]
    fn test_feed_mismatch_at_deferred_start() {
        let (mut a, _, _) = started_pair();

        let mut late = Session::new();
        while let Some(chunk) = a.take_outbound() {
            late.ingest(&chunk).unwrap();
        }

        let other_feed = SecretKey::generate();
        let err = late
            .start(StartOptions::new(
                other_feed.public_key(),
                SecretKey::from_bytes(&other_feed.to_bytes()).unwrap(),
            ))
            .unwrap_err();
        assert!(matches!(err, EngineError::FeedMismatch));
    }

    #[test]
    fn test_start_twice_is_caller_misuse() {
        let (mut a, _, feed) = started_pair();
        let err = a
            .start(StartOptions::new(
                feed.public_key(),
                SecretKey::from_bytes(&feed.to_bytes()).unwrap(),
            ))
            .unwrap_err();
        assert!(err.is_caller_error());
        assert!(!a.is_destroyed());
    }

    #[test]
    fn test_untrusted_peer_bad_handshake_signature() {
        let feed = SecretKey::generate();
        let mut a = Session::new();
        a.start(StartOptions::new(
            feed.public_key(),
            SecretKey::from_bytes(&feed.to_bytes()).unwrap(),
        ))
        .unwrap();

        // Hand-roll a remote peer whose handshake signature is junk.
        let crypto = DefaultCrypto::new();
        let remote_nonce = [0x77u8; NONCE_SIZE];
        let open = Open {
            feed: Bytes::copy_from_slice(&discovery_key(&feed.public_key())),
            nonce: Bytes::copy_from_slice(&remote_nonce),
        };
        let mut wire = BytesMut::new();
        wire.put_slice(&codec::encode_open(&open));

        let mut stream = crypto.keystream(feed.public_key().as_bytes(), &remote_nonce);
        let mut frame = codec::encode_frame(&Message::Handshake(Handshake {
            id: PeerId::generate(),
            extensions: vec![],
            signature: [0u8; 64],
            chain: vec![],
        }));
        stream.xor(&mut frame[..]);
        wire.put_slice(&frame);

        let err = a.ingest(&wire).unwrap_err();
        assert!(matches!(err, EngineError::UntrustedPeer { .. }));
        assert!(a.is_destroyed());
    }

    #[test]
    fn test_chain_too_long_rejected_at_start() {
        let crypto = DefaultCrypto::new();
        let feed = SecretKey::generate();
        let mut authority = SecretKey::from_bytes(&feed.to_bytes()).unwrap();
        let mut chain = Vec::new();
        for _ in 0..6 {
            let next = SecretKey::generate();
            chain.push(TrustLink::issue(
                &crypto,
                &authority,
                next.public_key(),
                hyperbloom_core::trust::Expiration::Never,
            ));
            authority = next;
        }

        let mut session = Session::new();
        let err = session
            .start(StartOptions::new(feed.public_key(), authority).with_chain(chain))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidChain { .. }));
    }

    #[test]
    fn test_wrong_secret_rejected_at_start() {
        let feed = SecretKey::generate();
        let stranger = SecretKey::generate();

        let mut session = Session::new();
        let err = session
            .start(StartOptions::new(feed.public_key(), stranger))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidChain { .. }));
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let (mut a, _, _) = started_pair();
        a.destroy();
        a.destroy();
        a.destroy();

        let closed: Vec<_> = std::iter::from_fn(|| a.poll_event())
            .filter(|e| matches!(e, Event::Closed))
            .collect();
        assert_eq!(closed.len(), 1);
        assert!(matches!(
            a.request(Request {
                start: Bytes::from_static(b"a"),
                end: None,
                limit: None,
            }),
            Err(EngineError::SessionClosed)
        ));
    }

    #[test]
    fn test_destroy_abandons_queue_without_sent_events() {
        let (mut a, _, _) = started_pair();
        a.request(Request {
            start: Bytes::from_static(b"a"),
            end: None,
            limit: None,
        })
        .unwrap();
        a.destroy();

        while let Some(event) = a.poll_event() {
            assert!(!matches!(event, Event::Sent(_)));
        }
    }

    #[test]
    fn test_secure_and_wire_order() {
        let (mut a, mut b, _) = started_pair();
        pump(&mut a, &mut b);

        assert!(a.is_secure());
        assert!(b.is_secure());
        assert_eq!(a.remote().unwrap().id, b.id());
        assert_eq!(b.remote().unwrap().id, a.id());
    }

    #[test]
    fn test_ingest_after_destroy_is_noop() {
        let (mut a, mut b, _) = started_pair();
        b.destroy();
        while let Some(chunk) = a.take_outbound() {
            b.ingest(&chunk).unwrap();
        }
        assert!(b.poll_event().is_some()); // Closed only
    }
}
