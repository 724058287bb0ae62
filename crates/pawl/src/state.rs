//! Portable serialized form of a session.
//!
//! The snapshot captures everything a session needs to resume: root key,
//! both chain keys, counters, the local private scalar, the remote public
//! point, and every skipped message key. CBOR keeps the format
//! self-describing, so decoders ignore fields added by later revisions.
//! Snapshots hold live secrets and zeroize themselves on drop.

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::RatchetError;

/// Serialized session state.
#[derive(Serialize, Deserialize)]
pub(crate) struct SessionSnapshot {
    pub root_key: [u8; 32],
    pub send_chain_key: [u8; 32],
    pub recv_chain_key: [u8; 32],
    pub send_n: u32,
    pub recv_n: u32,
    pub prev_n: u32,
    pub local_private: Vec<u8>,
    pub remote_public: Vec<u8>,
    pub skipped: Vec<SkippedEntry>,
}

/// One skipped message key in serialized form.
#[derive(Serialize, Deserialize)]
pub(crate) struct SkippedEntry {
    pub dh: Vec<u8>,
    pub n: u32,
    pub pn: u32,
    pub key: [u8; 32],
}

impl SessionSnapshot {
    pub(crate) fn encode(&self) -> Result<Vec<u8>, RatchetError> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(self, &mut buf)
            .map_err(|e| RatchetError::Serialization { reason: e.to_string() })?;
        Ok(buf)
    }

    pub(crate) fn decode(bytes: &[u8]) -> Result<Self, RatchetError> {
        ciborium::de::from_reader(bytes)
            .map_err(|e| RatchetError::Serialization { reason: e.to_string() })
    }
}

impl Drop for SessionSnapshot {
    fn drop(&mut self) {
        self.root_key.zeroize();
        self.send_chain_key.zeroize();
        self.recv_chain_key.zeroize();
        self.local_private.zeroize();
    }
}

impl Drop for SkippedEntry {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> SessionSnapshot {
        SessionSnapshot {
            root_key: [1u8; 32],
            send_chain_key: [2u8; 32],
            recv_chain_key: [3u8; 32],
            send_n: 4,
            recv_n: 5,
            prev_n: 6,
            local_private: vec![7u8; 32],
            remote_public: vec![4u8; 65],
            skipped: vec![SkippedEntry { dh: vec![4u8; 65], n: 1, pn: 0, key: [8u8; 32] }],
        }
    }

    #[test]
    fn snapshot_round_trip() {
        let original = snapshot();
        let decoded = SessionSnapshot::decode(&original.encode().unwrap()).unwrap();

        assert_eq!(decoded.root_key, original.root_key);
        assert_eq!(decoded.send_chain_key, original.send_chain_key);
        assert_eq!(decoded.recv_chain_key, original.recv_chain_key);
        assert_eq!(decoded.send_n, original.send_n);
        assert_eq!(decoded.recv_n, original.recv_n);
        assert_eq!(decoded.prev_n, original.prev_n);
        assert_eq!(decoded.local_private, original.local_private);
        assert_eq!(decoded.remote_public, original.remote_public);
        assert_eq!(decoded.skipped.len(), 1);
        assert_eq!(decoded.skipped[0].key, original.skipped[0].key);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            SessionSnapshot::decode(b"random garbage"),
            Err(RatchetError::Serialization { .. })
        ));
        assert!(matches!(
            SessionSnapshot::decode(&[]),
            Err(RatchetError::Serialization { .. })
        ));
    }
}
