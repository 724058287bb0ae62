//! Key derivation using HKDF-SHA256.
//!
//! Two derivations feed the session: the initial derivation in session
//! construction (shared secret plus optional salt fans out into the root key
//! and the two direction-specific chain keys) and the root-key step taken at
//! every Diffie-Hellman ratchet. Chain stepping itself is plain HMAC and
//! lives in [`crate::chain`].

use hkdf::Hkdf;
use sha2::Sha256;

use crate::error::RatchetError;

/// Info label for root-key derivation
pub const INFO_ROOT: &[u8] = b"DoubleRatchet-Root";

/// Info label for the chain seeded by the lexicographically lesser party
pub const INFO_CHAIN_FIRST: &[u8] = b"DoubleRatchet-Chain-1";

/// Info label for the chain seeded by the lexicographically greater party
pub const INFO_CHAIN_SECOND: &[u8] = b"DoubleRatchet-Chain-2";

/// Derive `out.len()` bytes from a secret with HKDF-SHA256.
///
/// An absent salt is equivalent to an empty one (both expand to a
/// zero-filled salt of hash length per RFC 5869). Output lengths from zero
/// up to 255 hash lengths are valid.
///
/// # Errors
///
/// - `Crypto` if the requested output length exceeds what HKDF can produce
pub fn derive(
    secret: &[u8],
    salt: Option<&[u8]>,
    info: &[u8],
    out: &mut [u8],
) -> Result<(), RatchetError> {
    Hkdf::<Sha256>::new(salt, secret).expand(info, out).map_err(|_| RatchetError::Crypto {
        reason: "requested HKDF output length is too large".to_string(),
    })
}

/// Derive one 32-byte key for session construction.
pub(crate) fn derive_initial(secret: &[u8], salt: Option<&[u8]>, info: &[u8]) -> [u8; 32] {
    let mut key = [0u8; 32];
    let Ok(()) = Hkdf::<Sha256>::new(salt, secret).expand(info, &mut key) else {
        unreachable!("32 bytes is a valid HKDF-SHA256 output length");
    };
    key
}

/// Root-key step: mix a fresh DH output into the root key.
///
/// The current root key acts as the HKDF salt and the DH shared secret as
/// the input keying material. The 64-byte output splits into the next root
/// key and the seed for the chain being replaced. Deterministic in its
/// inputs.
pub(crate) fn derive_root_keys(root_key: &[u8; 32], dh_out: &[u8]) -> ([u8; 32], [u8; 32]) {
    let mut okm = [0u8; 64];
    let Ok(()) = Hkdf::<Sha256>::new(Some(root_key), dh_out).expand(INFO_ROOT, &mut okm) else {
        unreachable!("64 bytes is a valid HKDF-SHA256 output length");
    };

    let mut next_root = [0u8; 32];
    let mut next_chain = [0u8; 32];
    next_root.copy_from_slice(&okm[..32]);
    next_chain.copy_from_slice(&okm[32..]);

    (next_root, next_chain)
}
