//! Store of message keys skipped over for not-yet-arrived messages.
//!
//! Keys are fingerprinted by the sender's ratchet public key and the message
//! index within that chain, so a late message finds its key regardless of
//! how many ratchet steps have happened since. Equality is by content.
//! Bounding happens at insertion time in the session's skip logic, not here.

use std::collections::HashMap;

use crate::chain::MessageKey;

/// Fingerprint of a single skipped message key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct SkippedKeyId {
    /// SEC1 bytes of the sender's ratchet public key for that chain
    pub dh: Vec<u8>,
    /// Message index within the chain
    pub n: u32,
    /// Previous-chain length the sender advertised for that chain
    pub pn: u32,
}

/// Mapping from message fingerprints to precomputed message keys.
#[derive(Clone, Default)]
pub(crate) struct SkippedKeyStore {
    keys: HashMap<SkippedKeyId, MessageKey>,
}

impl SkippedKeyStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, id: SkippedKeyId, key: MessageKey) {
        self.keys.insert(id, key);
    }

    /// Look up a key without consuming it.
    pub(crate) fn get(&self, id: &SkippedKeyId) -> Option<&MessageKey> {
        self.keys.get(id)
    }

    /// Delete a consumed key; the key material is zeroized on drop.
    pub(crate) fn remove(&mut self, id: &SkippedKeyId) {
        self.keys.remove(id);
    }

    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&SkippedKeyId, &MessageKey)> {
        self.keys.iter()
    }
}
