//! Diffie-Hellman half of the ratchet, over NIST P-256.
//!
//! Owns the local ephemeral private key and the most recently observed
//! remote ephemeral public key. Public keys travel as SEC1 uncompressed
//! points, private keys as 32-byte big-endian scalars.

use p256::{
    PublicKey, SecretKey,
    ecdh::{self, SharedSecret},
};
use rand_core::OsRng;

use crate::error::RatchetError;

/// Local ephemeral key pair plus the peer's current ratchet public key.
#[derive(Clone)]
pub(crate) struct DhRatchet {
    local: SecretKey,
    remote: PublicKey,
}

impl DhRatchet {
    /// Build a ratchet from serialized key material.
    ///
    /// # Errors
    ///
    /// - `InvalidKey` if the private scalar or the public point is malformed
    pub(crate) fn from_bytes(local: &[u8], remote: &[u8]) -> Result<Self, RatchetError> {
        let local = SecretKey::from_slice(local).map_err(|_| RatchetError::InvalidKey {
            reason: "private key is not a valid P-256 scalar".to_string(),
        })?;
        let remote = Self::parse_public(remote)?;

        Ok(Self { local, remote })
    }

    /// Parse a SEC1-encoded public key, rejecting off-curve points.
    pub(crate) fn parse_public(bytes: &[u8]) -> Result<PublicKey, RatchetError> {
        PublicKey::from_sec1_bytes(bytes).map_err(|_| RatchetError::InvalidKey {
            reason: "public key is not a valid P-256 point".to_string(),
        })
    }

    /// Replace the local private key with a fresh ephemeral.
    pub(crate) fn refresh(&mut self) {
        self.local = SecretKey::random(&mut OsRng);
    }

    /// Record the peer's new ratchet public key.
    pub(crate) fn set_remote(&mut self, remote: PublicKey) {
        self.remote = remote;
    }

    /// Shared secret between the local private key and the stored remote.
    ///
    /// Deterministic for fixed inputs; both sides of the pair agree
    /// bit-for-bit.
    pub(crate) fn exchange(&self) -> SharedSecret {
        ecdh::diffie_hellman(self.local.to_nonzero_scalar(), self.remote.as_affine())
    }

    /// SEC1 uncompressed encoding of the local public key.
    pub(crate) fn local_public_bytes(&self) -> Vec<u8> {
        self.local.public_key().to_sec1_bytes().into_vec()
    }

    /// SEC1 uncompressed encoding of the stored remote public key.
    pub(crate) fn remote_public_bytes(&self) -> Vec<u8> {
        self.remote.to_sec1_bytes().into_vec()
    }

    /// Big-endian scalar encoding of the local private key, for
    /// serialization only.
    pub(crate) fn local_private_bytes(&self) -> Vec<u8> {
        self.local.to_bytes().as_slice().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keypair() -> (SecretKey, PublicKey) {
        let secret = SecretKey::random(&mut OsRng);
        let public = secret.public_key();
        (secret, public)
    }

    #[test]
    fn exchange_agrees_on_both_sides() {
        let (a_secret, a_public) = keypair();
        let (b_secret, b_public) = keypair();

        let a = DhRatchet::from_bytes(a_secret.to_bytes().as_slice(), &b_public.to_sec1_bytes()).unwrap();
        let b = DhRatchet::from_bytes(b_secret.to_bytes().as_slice(), &a_public.to_sec1_bytes()).unwrap();

        assert_eq!(a.exchange().raw_secret_bytes(), b.exchange().raw_secret_bytes());
    }

    #[test]
    fn exchange_is_deterministic() {
        let (a_secret, _) = keypair();
        let (_, b_public) = keypair();

        let dh = DhRatchet::from_bytes(a_secret.to_bytes().as_slice(), &b_public.to_sec1_bytes()).unwrap();

        assert_eq!(dh.exchange().raw_secret_bytes(), dh.exchange().raw_secret_bytes());
    }

    #[test]
    fn refresh_replaces_the_public_key() {
        let (a_secret, _) = keypair();
        let (_, b_public) = keypair();

        let mut dh = DhRatchet::from_bytes(a_secret.to_bytes().as_slice(), &b_public.to_sec1_bytes()).unwrap();
        let before = dh.local_public_bytes();

        dh.refresh();

        assert_ne!(dh.local_public_bytes(), before);
    }

    #[test]
    fn malformed_private_key_is_rejected() {
        let (_, b_public) = keypair();
        let remote = b_public.to_sec1_bytes();

        assert!(matches!(
            DhRatchet::from_bytes(&[0u8; 32], &remote),
            Err(RatchetError::InvalidKey { .. })
        ));
        assert!(matches!(
            DhRatchet::from_bytes(b"short", &remote),
            Err(RatchetError::InvalidKey { .. })
        ));
    }

    #[test]
    fn malformed_public_key_is_rejected() {
        let (a_secret, _) = keypair();
        let local = a_secret.to_bytes();

        assert!(matches!(
            DhRatchet::from_bytes(&local, &[]),
            Err(RatchetError::InvalidKey { .. })
        ));
        assert!(matches!(
            DhRatchet::from_bytes(&local, b"not a point"),
            Err(RatchetError::InvalidKey { .. })
        ));

        // Correct length and prefix, but coordinates not on the curve.
        let mut off_curve = [0xAAu8; 65];
        off_curve[0] = 0x04;
        assert!(matches!(
            DhRatchet::from_bytes(&local, &off_curve),
            Err(RatchetError::InvalidKey { .. })
        ));
    }

    #[test]
    fn key_encodings_round_trip() {
        let (a_secret, a_public) = keypair();
        let (_, b_public) = keypair();

        let dh = DhRatchet::from_bytes(a_secret.to_bytes().as_slice(), &b_public.to_sec1_bytes()).unwrap();

        assert_eq!(dh.local_private_bytes(), a_secret.to_bytes().to_vec());
        assert_eq!(dh.local_public_bytes(), a_public.to_sec1_bytes().to_vec());
        assert_eq!(dh.remote_public_bytes(), b_public.to_sec1_bytes().to_vec());

        // Uncompressed SEC1 point: 0x04 prefix plus two 32-byte coordinates.
        assert_eq!(dh.local_public_bytes().len(), 65);
        assert_eq!(dh.local_public_bytes()[0], 0x04);
    }
}
