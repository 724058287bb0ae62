//! Wire-facing message types.
//!
//! The library emits and accepts `CipheredMessage` values; transports choose
//! their own framing. For transports without an opinion, CBOR helpers give a
//! portable encoding: self-describing, compact, and tolerant of fields added
//! by future revisions.

use serde::{Deserialize, Serialize};

use crate::error::RatchetError;

/// Plaintext metadata accompanying every ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// SEC1 bytes of the sender's current ratchet public key
    pub dh: Vec<u8>,
    /// Index of this message within the sender's current chain (0-based)
    pub n: u32,
    /// Number of messages in the sender's previous chain
    pub pn: u32,
}

/// An encrypted message: header plus opaque ciphertext.
///
/// The ciphertext carries its own nonce: `nonce || cipher bytes || tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipheredMessage {
    /// Ratchet header, authenticated implicitly by the message key schedule
    pub header: Header,
    /// AEAD output, nonce-prefixed
    pub ciphertext: Vec<u8>,
}

impl CipheredMessage {
    /// Encode to the portable CBOR wire form.
    ///
    /// # Errors
    ///
    /// - `Serialization` if encoding fails
    pub fn encode(&self) -> Result<Vec<u8>, RatchetError> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(self, &mut buf)
            .map_err(|e| RatchetError::Serialization { reason: e.to_string() })?;
        Ok(buf)
    }

    /// Decode from the portable CBOR wire form.
    ///
    /// # Errors
    ///
    /// - `Serialization` if the bytes are not a valid encoding
    pub fn decode(bytes: &[u8]) -> Result<Self, RatchetError> {
        ciborium::de::from_reader(bytes)
            .map_err(|e| RatchetError::Serialization { reason: e.to_string() })
    }
}

/// A decrypted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UncipheredMessage {
    /// The recovered plaintext
    pub plaintext: Vec<u8>,
}
