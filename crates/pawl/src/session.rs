//! The Double Ratchet session state machine.
//!
//! A [`Session`] coordinates two interlocking ratchets: a Diffie-Hellman
//! ratchet that advances whenever the peer shows a new ephemeral key, and a
//! symmetric chain ratchet that advances on every message. Message keys
//! skipped over by out-of-order delivery are parked in a bounded store so
//! late messages still decrypt.
//!
//! # Concurrency
//!
//! All public operations take `&self` and hold an internal lock for their
//! full duration, so interleaved calls from multiple threads are
//! linearizable in lock-acquisition order. No operation blocks on anything
//! but the lock; the work inside is CPU-bound.
//!
//! # Failure atomicity
//!
//! `receive` checkpoints the session state after the skipped-key lookup and
//! restores it on any failure, including an authentication failure after
//! the ratchet already advanced. A flood of garbage ciphertexts therefore
//! cannot wedge the receiving chain: the next genuine message still
//! decrypts.

use std::sync::{Mutex, MutexGuard, PoisonError};

use zeroize::Zeroize;

use crate::{
    chain::ChainRatchet,
    crypto::{aead, kdf},
    dh::DhRatchet,
    error::RatchetError,
    message::{CipheredMessage, Header, UncipheredMessage},
    skipped::{SkippedKeyId, SkippedKeyStore},
    state::{SessionSnapshot, SkippedEntry},
};

/// Maximum number of message keys a single `receive` may skip and store.
///
/// Bounds both memory use and the work an attacker can force with a forged
/// header index.
pub const MAX_SKIP: u32 = 1000;

/// A two-party Double Ratchet session.
///
/// Construct one on each side from the key material produced by an initial
/// key agreement: the local party's private key, the remote party's public
/// key, and an optional salt that both sides must share. Neither side needs
/// to know whether it is the initiator; the two directions' chains are
/// separated by comparing public key encodings.
pub struct Session {
    state: Mutex<SessionState>,
}

impl Session {
    /// Create a session from raw key material.
    ///
    /// `local_private` is a 32-byte P-256 scalar, `remote_public` a
    /// SEC1-encoded point. Both peers must pass the same `salt` (or none).
    ///
    /// # Errors
    ///
    /// - `InvalidKey` if either key fails to parse
    pub fn new(
        local_private: &[u8],
        remote_public: &[u8],
        salt: Option<&[u8]>,
    ) -> Result<Self, RatchetError> {
        let dh = DhRatchet::from_bytes(local_private, remote_public)?;

        let shared = dh.exchange();
        let secret = shared.raw_secret_bytes().as_slice();

        // Derive distinct send/receive chains on the two sides so a peer's
        // messages can never be reflected back at it. The lexicographically
        // lesser public key owns the first info label.
        let local_pub = dh.local_public_bytes();
        let remote_pub = dh.remote_public_bytes();
        let (info_send, info_recv) = if local_pub < remote_pub {
            (kdf::INFO_CHAIN_FIRST, kdf::INFO_CHAIN_SECOND)
        } else {
            (kdf::INFO_CHAIN_SECOND, kdf::INFO_CHAIN_FIRST)
        };

        let root_key = kdf::derive_initial(secret, salt, kdf::INFO_ROOT);
        let send = ChainRatchet::new(kdf::derive_initial(secret, salt, info_send));
        let recv = ChainRatchet::new(kdf::derive_initial(secret, salt, info_recv));

        Ok(Self {
            state: Mutex::new(SessionState {
                root_key,
                send,
                recv,
                prev_n: 0,
                dh,
                skipped: SkippedKeyStore::new(),
            }),
        })
    }

    /// Restore a session from bytes produced by [`serialize`](Self::serialize).
    ///
    /// No ephemeral is regenerated; the restored session behaves exactly
    /// like the one that was serialized.
    ///
    /// # Errors
    ///
    /// - `Serialization` if the bytes are not a valid snapshot
    /// - `InvalidKey` if the embedded key material fails to parse
    pub fn deserialize(bytes: &[u8]) -> Result<Self, RatchetError> {
        let snapshot = SessionSnapshot::decode(bytes)?;

        let dh = DhRatchet::from_bytes(&snapshot.local_private, &snapshot.remote_public)?;

        let mut skipped = SkippedKeyStore::new();
        for entry in &snapshot.skipped {
            skipped.insert(
                SkippedKeyId { dh: entry.dh.clone(), n: entry.n, pn: entry.pn },
                crate::chain::MessageKey::from_parts(entry.key, entry.n),
            );
        }

        Ok(Self {
            state: Mutex::new(SessionState {
                root_key: snapshot.root_key,
                send: ChainRatchet::from_parts(snapshot.send_chain_key, snapshot.send_n),
                recv: ChainRatchet::from_parts(snapshot.recv_chain_key, snapshot.recv_n),
                prev_n: snapshot.prev_n,
                dh,
                skipped,
            }),
        })
    }

    /// Encrypt a message, advancing the sending chain by one step.
    ///
    /// # Errors
    ///
    /// - `CounterOverflow` if the sending chain is exhausted
    /// - `Crypto` if the AEAD rejects the input
    pub fn send(&self, plaintext: &[u8], ad: &[u8]) -> Result<CipheredMessage, RatchetError> {
        let mut state = self.lock();

        let message_key = state.send.advance()?;
        let header = Header {
            dh: state.dh.local_public_bytes(),
            n: message_key.index(),
            pn: state.prev_n,
        };

        let ciphertext = aead::encrypt(message_key.key(), plaintext, ad)?;

        Ok(CipheredMessage { header, ciphertext })
    }

    /// Decrypt a received message.
    ///
    /// Late messages are served from the skipped-key store; a header with an
    /// unseen ratchet key triggers exactly one Diffie-Hellman ratchet step
    /// before the chain advances. Each message key decrypts at most once, so
    /// replaying a ciphertext always fails.
    ///
    /// # Errors
    ///
    /// - `DecryptionFailed` if authentication fails
    /// - `OutOfOrder` if the message's key was already consumed
    /// - `TooManySkipped` if honoring the header would skip more than
    ///   [`MAX_SKIP`] keys
    /// - `InvalidKey` if the header carries a malformed ratchet key
    ///
    /// All failures leave the session state exactly as it was.
    pub fn receive(
        &self,
        message: &CipheredMessage,
        ad: &[u8],
    ) -> Result<UncipheredMessage, RatchetError> {
        let mut state = self.lock();

        if let Some(plaintext) = state.try_skipped(&message.header, &message.ciphertext, ad)? {
            return Ok(UncipheredMessage { plaintext });
        }

        let checkpoint = state.clone();
        match state.receive_on_chain(message, ad) {
            Ok(plaintext) => Ok(UncipheredMessage { plaintext }),
            Err(err) => {
                *state = checkpoint;
                Err(err)
            },
        }
    }

    /// Snapshot the full session state as portable bytes.
    ///
    /// The output contains live secrets; treat it like a private key.
    ///
    /// # Errors
    ///
    /// - `Serialization` if encoding fails
    pub fn serialize(&self) -> Result<Vec<u8>, RatchetError> {
        let state = self.lock();

        let snapshot = SessionSnapshot {
            root_key: state.root_key,
            send_chain_key: *state.send.chain_key(),
            recv_chain_key: *state.recv.chain_key(),
            send_n: state.send.index(),
            recv_n: state.recv.index(),
            prev_n: state.prev_n,
            local_private: state.dh.local_private_bytes(),
            remote_public: state.dh.remote_public_bytes(),
            skipped: state
                .skipped
                .iter()
                .map(|(id, key)| SkippedEntry {
                    dh: id.dh.clone(),
                    n: id.n,
                    pn: id.pn,
                    key: *key.key(),
                })
                .collect(),
        };

        snapshot.encode()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // A poisoning panic cannot originate here, so adopt the inner state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn rotate_sending_chain(&self) {
        self.lock().rotate_sending_chain();
    }

    #[cfg(test)]
    fn skipped_len(&self) -> usize {
        self.lock().skipped.len()
    }
}

#[derive(Clone)]
struct SessionState {
    root_key: [u8; 32],
    send: ChainRatchet,
    recv: ChainRatchet,
    prev_n: u32,
    dh: DhRatchet,
    skipped: SkippedKeyStore,
}

impl SessionState {
    /// Serve a late message from the skipped-key store.
    ///
    /// A hit that fails authentication keeps the entry, so a corrupted copy
    /// of a late message does not destroy the key the genuine copy needs.
    fn try_skipped(
        &mut self,
        header: &Header,
        ciphertext: &[u8],
        ad: &[u8],
    ) -> Result<Option<Vec<u8>>, RatchetError> {
        let id = SkippedKeyId { dh: header.dh.clone(), n: header.n, pn: header.pn };

        let Some(key) = self.skipped.get(&id) else {
            return Ok(None);
        };

        let plaintext = aead::decrypt(key.key(), ciphertext, ad)?;
        self.skipped.remove(&id);
        tracing::trace!(n = header.n, "consumed skipped message key");

        Ok(Some(plaintext))
    }

    /// The ratcheting receive path; assumes the skipped store already missed.
    fn receive_on_chain(
        &mut self,
        message: &CipheredMessage,
        ad: &[u8],
    ) -> Result<Vec<u8>, RatchetError> {
        let header = &message.header;

        if header.dh != self.dh.remote_public_bytes() {
            // Park the keys the retiring chain still owes us, then ratchet.
            self.skip_message_keys(header.pn)?;
            self.dh_ratchet(&header.dh)?;
        }

        self.skip_message_keys(header.n)?;

        let message_key = self.recv.advance()?;
        aead::decrypt(message_key.key(), &message.ciphertext, ad)
    }

    /// Advance the receiving chain to `target`, parking every intermediate
    /// message key in the skipped store.
    fn skip_message_keys(&mut self, target: u32) -> Result<(), RatchetError> {
        let until = self.recv.index();

        if target < until {
            return Err(RatchetError::OutOfOrder { current: until, requested: target });
        }
        if target - until >= MAX_SKIP {
            return Err(RatchetError::TooManySkipped { current: until, requested: target });
        }

        if target > until {
            let remote = self.dh.remote_public_bytes();
            while self.recv.index() < target {
                let key = self.recv.advance()?;
                let id = SkippedKeyId { dh: remote.clone(), n: key.index(), pn: self.prev_n };
                self.skipped.insert(id, key);
            }
            tracing::trace!(
                from = until,
                to = target,
                stored = self.skipped.len(),
                "stored skipped message keys"
            );
        }

        Ok(())
    }

    /// One Diffie-Hellman ratchet step for a newly observed remote key.
    ///
    /// Re-seeds the receiving chain against the peer's new ephemeral, then
    /// refreshes the local ephemeral and re-seeds the sending chain, folding
    /// both shared secrets into the root key in turn.
    fn dh_ratchet(&mut self, remote_bytes: &[u8]) -> Result<(), RatchetError> {
        let remote = DhRatchet::parse_public(remote_bytes)?;

        self.prev_n = self.recv.index();
        self.dh.set_remote(remote);

        let dh_out = self.dh.exchange();
        let (next_root, recv_seed) =
            kdf::derive_root_keys(&self.root_key, dh_out.raw_secret_bytes().as_slice());
        self.replace_root(next_root);
        self.recv.reseed(recv_seed);

        self.dh.refresh();

        let dh_out = self.dh.exchange();
        let (next_root, send_seed) =
            kdf::derive_root_keys(&self.root_key, dh_out.raw_secret_bytes().as_slice());
        self.replace_root(next_root);
        self.send.reseed(send_seed);

        tracing::debug!(prev_n = self.prev_n, "DH ratchet step");
        Ok(())
    }

    fn replace_root(&mut self, next: [u8; 32]) {
        self.root_key.zeroize();
        self.root_key = next;
    }

    /// Rotate the local ephemeral and restart the sending chain, as the
    /// peer's first receive of the new key will mirror on its side.
    #[cfg(test)]
    fn rotate_sending_chain(&mut self) {
        self.dh.refresh();

        let dh_out = self.dh.exchange();
        let (next_root, send_seed) =
            kdf::derive_root_keys(&self.root_key, dh_out.raw_secret_bytes().as_slice());
        self.replace_root(next_root);

        self.prev_n = self.send.index();
        self.send.reseed(send_seed);
    }
}

impl Drop for SessionState {
    fn drop(&mut self) {
        self.root_key.zeroize();
    }
}
