//! Fuzz target for the session receive path.
//!
//! Feeds a live session adversarial deliveries: garbage ratchet keys, valid
//! but unrelated curve points, forged counters, and arbitrary ciphertexts.
//!
//! # Invariants
//!
//! - Receive never panics, whatever the header or ciphertext contains
//! - Every malformed delivery returns an error
//! - After any number of malformed deliveries, a genuine message from the
//!   peer still decrypts (failures roll state back)

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use p256::SecretKey;
use pawl::{CipheredMessage, Header, Session};

#[derive(Debug, Arbitrary)]
struct ReceiveScenario {
    deliveries: Vec<Delivery>,
}

#[derive(Debug, Arbitrary)]
struct Delivery {
    ratchet_key: RatchetKey,
    n: u32,
    pn: u32,
    ciphertext: Vec<u8>,
}

#[derive(Debug, Arbitrary)]
enum RatchetKey {
    /// The peer's genuine initial ratchet key
    Genuine,
    /// A well-formed point unrelated to the conversation
    UnrelatedPoint([u8; 32]),
    /// Arbitrary bytes, almost never a valid point
    Garbage(Vec<u8>),
}

const ALICE_SCALAR: [u8; 32] = [0x11; 32];
const BOB_SCALAR: [u8; 32] = [0x22; 32];

fuzz_target!(|scenario: ReceiveScenario| {
    let alice_secret = SecretKey::from_slice(&ALICE_SCALAR).unwrap();
    let bob_secret = SecretKey::from_slice(&BOB_SCALAR).unwrap();
    let alice_public = alice_secret.public_key().to_sec1_bytes();

    let bob = Session::new(bob_secret.to_bytes().as_slice(), &alice_public, None).unwrap();

    for delivery in scenario.deliveries {
        let dh = match delivery.ratchet_key {
            RatchetKey::Genuine => alice_public.to_vec(),
            RatchetKey::UnrelatedPoint(scalar) => match SecretKey::from_slice(&scalar) {
                Ok(secret) => secret.public_key().to_sec1_bytes().to_vec(),
                Err(_) => scalar.to_vec(),
            },
            RatchetKey::Garbage(bytes) => bytes,
        };

        let forged = CipheredMessage {
            header: Header { dh, n: delivery.n, pn: delivery.pn },
            ciphertext: delivery.ciphertext,
        };

        // Forged ciphertexts never authenticate; only the error kind varies.
        assert!(bob.receive(&forged, b"fuzz").is_err());
    }

    // The session must have survived the onslaught.
    let alice = Session::new(
        alice_secret.to_bytes().as_slice(),
        &bob_secret.public_key().to_sec1_bytes(),
        None,
    )
    .unwrap();
    let genuine = alice.send(b"still standing", b"").unwrap();
    let received = bob.receive(&genuine, b"").unwrap();
    assert_eq!(received.plaintext, b"still standing");
});
