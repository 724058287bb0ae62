//! Message encryption using AES-256-GCM.
//!
//! Each message key is used for exactly one encryption. The nonce is drawn
//! from the OS entropy source and prepended to the output, so a ciphertext
//! is self-describing: `nonce || cipher bytes || tag`.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit, Payload},
};
use rand_core::{OsRng, RngCore};

use crate::error::RatchetError;

/// Size of an AEAD key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of the GCM nonce in bytes
pub const NONCE_SIZE: usize = 12;

/// Size of the GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Encrypt plaintext under a single-use message key.
///
/// The associated data is authenticated but not encrypted. Returns
/// `nonce || ciphertext || tag`.
///
/// # Errors
///
/// - `Crypto` if the cipher rejects the input (plaintext too large)
pub fn encrypt(key: &[u8; KEY_SIZE], plaintext: &[u8], ad: &[u8]) -> Result<Vec<u8>, RatchetError> {
    let cipher = Aes256Gcm::new(key.into());

    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), Payload { msg: plaintext, aad: ad })
        .map_err(|_| RatchetError::Crypto {
            reason: "AEAD encryption rejected input".to_string(),
        })?;

    let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);

    Ok(out)
}

/// Decrypt `nonce || ciphertext || tag` under a single-use message key.
///
/// # Errors
///
/// - `DecryptionFailed` if the input is shorter than a nonce
/// - `DecryptionFailed` if authentication fails (wrong key, tampered
///   ciphertext, mismatched associated data)
pub fn decrypt(key: &[u8; KEY_SIZE], data: &[u8], ad: &[u8]) -> Result<Vec<u8>, RatchetError> {
    if data.len() < NONCE_SIZE {
        return Err(RatchetError::DecryptionFailed {
            reason: "ciphertext shorter than nonce".to_string(),
        });
    }

    let (nonce, ciphertext) = data.split_at(NONCE_SIZE);
    let cipher = Aes256Gcm::new(key.into());

    cipher.decrypt(Nonce::from_slice(nonce), Payload { msg: ciphertext, aad: ad }).map_err(|_| {
        RatchetError::DecryptionFailed { reason: "authentication failed".to_string() }
    })
}
