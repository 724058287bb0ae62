//! Error types for Double Ratchet session operations.
//!
//! Strongly-typed errors for the two layers that can fail: key material
//! handling (parsing, derivation, encryption) and message ordering (skipped
//! chains, replays). We avoid stringly-typed errors at the boundary so
//! callers can distinguish a tampered ciphertext from a stale one.

use thiserror::Error;

/// Errors from session operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RatchetError {
    /// Private or public key material is malformed or not on the curve
    #[error("invalid key: {reason}")]
    InvalidKey {
        /// What was wrong with the key material
        reason: String,
    },

    /// Decryption failed (authentication tag mismatch, truncated input)
    #[error("decryption failed: {reason}")]
    DecryptionFailed {
        /// Reason for decryption failure
        reason: String,
    },

    /// Message index is behind the receiving chain and its key is gone
    #[error("message out of order: chain is at {current}, message is {requested}")]
    OutOfOrder {
        /// Current receiving-chain index
        current: u32,
        /// Index carried by the message
        requested: u32,
    },

    /// Advancing to the requested index would skip too many message keys
    #[error("too many skipped messages: chain is at {current}, message is {requested}")]
    TooManySkipped {
        /// Current receiving-chain index
        current: u32,
        /// Index carried by the message
        requested: u32,
    },

    /// A chain counter would overflow
    #[error("chain counter overflow at {current}")]
    CounterOverflow {
        /// Counter value when overflow was detected
        current: u32,
    },

    /// Malformed serialized session or message
    #[error("serialization failed: {reason}")]
    Serialization {
        /// Decode or encode failure detail
        reason: String,
    },

    /// Unexpected failure from an underlying primitive
    #[error("crypto failure: {reason}")]
    Crypto {
        /// Failure detail
        reason: String,
    },
}

impl RatchetError {
    /// Returns true if this error is fatal (unrecoverable).
    ///
    /// Fatal errors indicate broken key material or a bug. Non-fatal errors
    /// describe a single rejected message; the session state is rolled back
    /// and remains usable for future traffic.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::InvalidKey { .. } => true,
            Self::CounterOverflow { .. } => true,
            Self::Crypto { .. } => true,

            // The message is dropped but the session survives.
            Self::DecryptionFailed { .. } => false,
            Self::OutOfOrder { .. } => false,
            Self::TooManySkipped { .. } => false,
            Self::Serialization { .. } => false,
        }
    }
}
