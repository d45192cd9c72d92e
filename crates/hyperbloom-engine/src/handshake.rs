// ============================================
// File: crates/hyperbloom-engine/src/handshake.rs
// ============================================
//! # Handshake & Trust Orchestration
//!
//! ## Creation Reason
//! Collects the authentication half of the protocol in one place:
//! paired-hash signatures, remote handshake verification and the
//! one-shot chain-shortening exchange. The session drives the state;
//! this module makes the trust decisions.
//!
//! ## Handshake Flow
//! ```text
//! A                                                B
//! │  Open{feed, nonceA}  ────────────────────────► │
//! │ ◄────────────────────────  Open{feed, nonceB}  │
//! │                                                │
//! │  pairedHash(A)  = H(HASH_KEY, nonceA ‖ nonceB) │
//! │  pairedHash(B)  = H(HASH_KEY, nonceB ‖ nonceA) │
//! │                                                │
//! │  Handshake{id, chain,                          │
//! │    sign(pairedHash(A), chainTerminalSecret)} ─►│
//! │ ◄─ Handshake{id, chain,                        │
//! │      sign(pairedHash(B), ...)}                 │
//! │                                                │
//! │  verify B's signature against pairedHash(B)    │
//! │  (A's reverse paired hash) under the key the   │
//! │  chain walk terminates at                      │
//! ```
//!
//! ## Chain Shortening
//! After `secure`, a peer whose chain-plus-one-link would be strictly
//! shorter than the remote's chain issues a single delegation from
//! its own authority to the remote's terminal key and sends it as a
//! `Link`. The receiving side adopts `sender.chain ‖ link` only when
//! that candidate is shorter than its current chain and passes the
//! same self-check as `start`.
//!
//! ## ⚠️ Important Note for Next Developer
//! - The signature is verified against the REVERSE paired hash: the
//!   remote signed its own nonce first
//! - Shortening is best-effort; ignoring a Link is never an error,
//!   failing to verify an adopted one is fatal
//!
//! ## Last Modified
//! v0.1.0 - Initial handshake logic

use tracing::{debug, warn};

use hyperbloom_common::types::PeerId;
use hyperbloom_core::crypto::{Crypto, PublicKey, SecretKey, HASH_SIZE};
use hyperbloom_core::protocol::messages::Handshake;
use hyperbloom_core::trust::{
    chain as trust_chain, ChainSummary, TrustLink,
};

use crate::error::{EngineError, Result};
use crate::event::RemoteIdentity;

// ============================================
// Local Handshake
// ============================================

/// Builds the local handshake message.
///
/// The signature covers the local paired hash
/// `H(HASH_KEY, localNonce ‖ remoteNonce)` under the secret key at
/// the end of the local chain.
#[must_use]
pub fn local_handshake<C: Crypto>(
    crypto: &C,
    id: PeerId,
    secret: &SecretKey,
    chain: &[TrustLink],
    paired_hash: &[u8; HASH_SIZE],
) -> Handshake {
    Handshake {
        id,
        extensions: Vec::new(),
        signature: crypto.sign(paired_hash, secret),
        chain: trust_chain::encode_chain(chain),
    }
}

// ============================================
// Remote Verification
// ============================================

/// Verifies a remote handshake: decodes its chain, walks it from the
/// feed key and checks the signature over the reverse paired hash
/// under the terminal authority.
///
/// # Errors
/// `UntrustedPeer` on any decoding or verification failure.
pub fn verify_remote<C: Crypto>(
    crypto: &C,
    feed_key: &PublicKey,
    reverse_paired_hash: &[u8; HASH_SIZE],
    handshake: &Handshake,
) -> Result<(RemoteIdentity, ChainSummary)> {
    let chain = trust_chain::decode_chain(&handshake.chain)
        .map_err(|err| EngineError::untrusted(format!("chain decode failed: {err}")))?;

    let summary = trust_chain::verify_chain(crypto, feed_key, &chain)
        .map_err(|err| EngineError::untrusted(format!("chain walk failed: {err}")))?;

    if !crypto.verify(reverse_paired_hash, &handshake.signature, &summary.terminal) {
        warn!(peer = %handshake.id, "handshake signature rejected");
        return Err(EngineError::untrusted(
            "handshake signature does not verify under the chain terminal",
        ));
    }

    debug!(
        peer = %handshake.id,
        links = chain.len(),
        "remote handshake verified"
    );

    let identity = RemoteIdentity {
        id: handshake.id,
        chain,
        extensions: handshake.extensions.clone(),
        min_expiration: summary.min_expiration,
    };
    Ok((identity, summary))
}

// ============================================
// Chain Shortening
// ============================================

/// Decides whether the local side should offer the remote a shorter
/// chain: true when the local chain plus one link would be strictly
/// shorter than the remote's current chain.
#[must_use]
pub const fn should_shorten(local_len: usize, remote_len: usize) -> bool {
    remote_len > local_len + 1
}

/// Issues the shortening link: a delegation from the local authority
/// straight to the remote chain's terminal key, inheriting the
/// earliest expiration observed across the remote chain.
#[must_use]
pub fn shortening_link<C: Crypto>(
    crypto: &C,
    secret: &SecretKey,
    remote_summary: &ChainSummary,
) -> TrustLink {
    TrustLink::issue(
        crypto,
        secret,
        remote_summary.terminal,
        remote_summary.min_expiration,
    )
}

/// Evaluates an incoming shortening link.
///
/// The candidate chain is `remote.chain ‖ link`. It is ignored unless
/// strictly shorter than the current local chain, and adopted only
/// after passing the same self-check as `start`.
///
/// # Returns
/// - `Ok(Some(chain))` - verified replacement chain
/// - `Ok(None)` - link ignored (no improvement)
///
/// # Errors
/// `InvalidChain` when a shorter candidate fails verification.
pub fn adopt_link<C: Crypto>(
    crypto: &C,
    feed_key: &PublicKey,
    secret: &SecretKey,
    local_len: usize,
    remote_chain: &[TrustLink],
    link: TrustLink,
) -> Result<Option<Vec<TrustLink>>> {
    if local_len <= remote_chain.len() + 1 {
        debug!(
            local = local_len,
            remote = remote_chain.len(),
            "ignoring link: no shortening gained"
        );
        return Ok(None);
    }

    let mut candidate = remote_chain.to_vec();
    candidate.push(link);

    trust_chain::self_check(crypto, feed_key, &candidate, secret)
        .map_err(|err| EngineError::invalid_chain(format!("shortened chain rejected: {err}")))?;

    debug!(
        from = local_len,
        to = candidate.len(),
        "adopting shortened chain"
    );
    Ok(Some(candidate))
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use hyperbloom_core::crypto::{DefaultCrypto, HASH_KEY};
    use hyperbloom_core::trust::Expiration;

    fn paired_hashes(
        crypto: &DefaultCrypto,
        local: &[u8; 24],
        remote: &[u8; 24],
    ) -> ([u8; HASH_SIZE], [u8; HASH_SIZE]) {
        (
            crypto.hash_pair(HASH_KEY, local, remote),
            crypto.hash_pair(HASH_KEY, remote, local),
        )
    }

    #[test]
    fn test_handshake_roundtrip_empty_chain() {
        let crypto = DefaultCrypto::new();
        let feed = SecretKey::generate();
        let nonce_a = [1u8; 24];
        let nonce_b = [2u8; 24];

        // A signs its own paired hash ...
        let (paired_a, _) = paired_hashes(&crypto, &nonce_a, &nonce_b);
        let hs = local_handshake(&crypto, PeerId::generate(), &feed, &[], &paired_a);

        // ... which from B's side is the reverse paired hash.
        let (_, reverse_b) = paired_hashes(&crypto, &nonce_b, &nonce_a);
        let (identity, summary) =
            verify_remote(&crypto, &feed.public_key(), &reverse_b, &hs).unwrap();
        assert!(identity.chain.is_empty());
        assert_eq!(summary.terminal, feed.public_key());
    }

    #[test]
    fn test_bad_signature_rejected() {
        let crypto = DefaultCrypto::new();
        let feed = SecretKey::generate();
        let paired = crypto.hash_pair(HASH_KEY, &[1u8; 24], &[2u8; 24]);

        let mut hs = local_handshake(&crypto, PeerId::generate(), &feed, &[], &paired);
        hs.signature[0] ^= 0xff;

        let reverse = crypto.hash_pair(HASH_KEY, &[2u8; 24], &[1u8; 24]);
        assert!(matches!(
            verify_remote(&crypto, &feed.public_key(), &reverse, &hs),
            Err(EngineError::UntrustedPeer { .. })
        ));
    }

    #[test]
    fn test_wrong_terminal_rejected() {
        let crypto = DefaultCrypto::new();
        let feed = SecretKey::generate();
        let impostor = SecretKey::generate();
        let paired = crypto.hash_pair(HASH_KEY, &[1u8; 24], &[2u8; 24]);

        // Signed by a key with no chain delegating to it
        let hs = local_handshake(&crypto, PeerId::generate(), &impostor, &[], &paired);

        let reverse = crypto.hash_pair(HASH_KEY, &[2u8; 24], &[1u8; 24]);
        assert!(matches!(
            verify_remote(&crypto, &feed.public_key(), &reverse, &hs),
            Err(EngineError::UntrustedPeer { .. })
        ));
    }

    #[test]
    fn test_should_shorten_rule() {
        // remote chain must be longer than local + 1 to gain anything
        assert!(should_shorten(3, 5));
        assert!(should_shorten(0, 2));
        assert!(!should_shorten(3, 4));
        assert!(!should_shorten(3, 3));
        assert!(!should_shorten(5, 3));
        assert!(!should_shorten(0, 1));
    }

    #[test]
    fn test_shorten_and_adopt() {
        let crypto = DefaultCrypto::new();
        let feed = SecretKey::generate();
        let feed_public = feed.public_key();

        // "Long" authority: feed -> k1 -> k2 (A holds k2)
        let k1 = SecretKey::generate();
        let k2 = SecretKey::generate();
        let long_chain = vec![
            TrustLink::issue(&crypto, &feed, k1.public_key(), Expiration::Never),
            TrustLink::issue(&crypto, &k1, k2.public_key(), Expiration::Never),
        ];

        // "Short" authority: B is the feed itself, empty chain.
        let summary = trust_chain::verify_chain(&crypto, &feed_public, &long_chain).unwrap();
        assert!(should_shorten(0, long_chain.len()));
        let link = shortening_link(&crypto, &feed, &summary);

        // A adopts feed's (empty) chain plus the link: length 1.
        let adopted = adopt_link(&crypto, &feed_public, &k2, long_chain.len(), &[], link)
            .unwrap()
            .unwrap();
        assert_eq!(adopted.len(), 1);
        assert!(trust_chain::self_check(&crypto, &feed_public, &adopted, &k2).is_ok());
    }

    #[test]
    fn test_adopt_ignores_non_improvement() {
        let crypto = DefaultCrypto::new();
        let feed = SecretKey::generate();
        let link = TrustLink::issue(&crypto, &feed, feed.public_key(), Expiration::Never);

        // local chain of 1 cannot improve on remote 0 + link
        let result = adopt_link(&crypto, &feed.public_key(), &feed, 1, &[], link).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_adopt_rejects_bad_candidate() {
        let crypto = DefaultCrypto::new();
        let feed = SecretKey::generate();
        let stranger = SecretKey::generate();

        // Link delegates to a key the local secret does not hold
        let link = TrustLink::issue(&crypto, &feed, stranger.public_key(), Expiration::Never);
        assert!(matches!(
            adopt_link(&crypto, &feed.public_key(), &feed, 5, &[], link),
            Err(EngineError::InvalidChain { .. })
        ));
    }
}
