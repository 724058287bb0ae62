//! Cryptographic primitives for the session core.
//!
//! Fixed algorithm suite, no negotiation:
//! - AES-256-GCM AEAD (random 96-bit nonce, 128-bit tag)
//! - HKDF-SHA256 key derivation
//! - HMAC-SHA256 chain stepping (see [`crate::chain`])
//! - NIST P-256 ECDH (see [`crate::dh`])

pub mod aead;
pub mod kdf;
