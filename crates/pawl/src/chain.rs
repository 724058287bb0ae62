//! Symmetric chain ratchet for per-message key derivation.
//!
//! # Security Properties
//!
//! - Forward Secrecy: the old chain key is zeroized when advancing
//! - Key Uniqueness: each index produces a unique message key
//! - Determinism: the same seed always produces the same key sequence

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::error::RatchetError;

type HmacSha256 = Hmac<Sha256>;

/// HMAC input for deriving a message key
const MESSAGE_KEY_TAG: &[u8] = &[0x01];

/// HMAC input for deriving the next chain key
const CHAIN_KEY_TAG: &[u8] = &[0x02];

/// A message key derived from the chain.
///
/// Used for a single AEAD operation and then discarded.
#[derive(Clone)]
pub(crate) struct MessageKey {
    /// 32-byte symmetric key for AES-256-GCM
    key: [u8; 32],
    /// Chain index this key was derived at
    index: u32,
}

impl MessageKey {
    pub(crate) fn from_parts(key: [u8; 32], index: u32) -> Self {
        Self { key, index }
    }

    /// 32-byte symmetric key for the AEAD.
    pub(crate) fn key(&self) -> &[u8; 32] {
        &self.key
    }

    /// Chain index this key was derived at.
    pub(crate) fn index(&self) -> u32 {
        self.index
    }
}

impl Drop for MessageKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// One direction of the symmetric ratchet: a chain key plus the count of
/// message keys already produced from it.
///
/// Each [`advance()`](Self::advance) call derives the message key for the
/// current index and the next chain key, overwrites the old chain key, and
/// increments the counter. [`reseed()`](Self::reseed) restarts the chain
/// from a root-KDF output at a Diffie-Hellman ratchet step.
#[derive(Clone)]
pub(crate) struct ChainRatchet {
    /// Current chain key (32 bytes)
    chain_key: [u8; 32],
    /// Index of the next message key to be produced
    index: u32,
}

impl ChainRatchet {
    /// Start a chain from a derived seed at index zero.
    pub(crate) fn new(seed: [u8; 32]) -> Self {
        Self { chain_key: seed, index: 0 }
    }

    /// Restore a chain from serialized state.
    pub(crate) fn from_parts(chain_key: [u8; 32], index: u32) -> Self {
        Self { chain_key, index }
    }

    /// Index of the next message key this chain will produce.
    pub(crate) fn index(&self) -> u32 {
        self.index
    }

    /// Current chain key, for serialization only.
    pub(crate) fn chain_key(&self) -> &[u8; 32] {
        &self.chain_key
    }

    /// Replace the chain key and restart the counter at zero.
    pub(crate) fn reseed(&mut self, seed: [u8; 32]) {
        self.chain_key.zeroize();
        self.chain_key = seed;
        self.index = 0;
    }

    /// Advance the chain and return the message key for the current index.
    ///
    /// # Errors
    ///
    /// - `CounterOverflow` if the chain has already produced `u32::MAX` keys
    pub(crate) fn advance(&mut self) -> Result<MessageKey, RatchetError> {
        if self.index == u32::MAX {
            return Err(RatchetError::CounterOverflow { current: self.index });
        }

        let message_key = self.derive(MESSAGE_KEY_TAG);
        let next_chain_key = self.derive(CHAIN_KEY_TAG);

        self.chain_key.zeroize();
        self.chain_key = next_chain_key;

        let index = self.index;
        self.index = self.index.wrapping_add(1);

        Ok(MessageKey { key: message_key, index })
    }

    fn derive(&self, tag: &[u8]) -> [u8; 32] {
        let Ok(mut mac) = HmacSha256::new_from_slice(&self.chain_key) else {
            unreachable!("HMAC-SHA256 accepts any key size");
        };
        mac.update(tag);
        let result = mac.finalize().into_bytes();

        let mut key = [0u8; 32];
        key.copy_from_slice(&result);
        key
    }
}

impl Drop for ChainRatchet {
    fn drop(&mut self) {
        self.chain_key.zeroize();
    }
}
