//! Property-based tests for the session core.
//!
//! These verify the fundamental laws of the system:
//!
//! 1. **Round-trip**: receive(send(m)) == m for all messages and AD
//! 2. **Order independence**: any delivery permutation within a chain works
//! 3. **Determinism**: the KDFs are pure functions of their inputs
//! 4. **Nonce freshness**: equal inputs never produce equal ciphertexts
//! 5. **Snapshot equivalence**: a restored session is indistinguishable

use p256::SecretKey;
use pawl::{Session, crypto};
use proptest::prelude::*;
use rand_core::OsRng;

fn session_pair() -> (Session, Session) {
    let alice_secret = SecretKey::random(&mut OsRng);
    let bob_secret = SecretKey::random(&mut OsRng);

    let alice = Session::new(
        alice_secret.to_bytes().as_slice(),
        &bob_secret.public_key().to_sec1_bytes(),
        None,
    )
    .unwrap();
    let bob = Session::new(
        bob_secret.to_bytes().as_slice(),
        &alice_secret.public_key().to_sec1_bytes(),
        None,
    )
    .unwrap();

    (alice, bob)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn prop_send_receive_roundtrip(
        plaintext in prop::collection::vec(any::<u8>(), 0..1000),
        ad in prop::collection::vec(any::<u8>(), 0..100),
    ) {
        let (alice, bob) = session_pair();

        let message = alice.send(&plaintext, &ad).unwrap();
        let received = bob.receive(&message, &ad).unwrap();

        prop_assert_eq!(received.plaintext, plaintext);
    }

    #[test]
    fn prop_any_permutation_within_a_chain_decrypts(
        order in (1usize..20).prop_flat_map(|k| {
            Just((0..k).collect::<Vec<usize>>()).prop_shuffle()
        }),
    ) {
        let (alice, bob) = session_pair();

        let messages: Vec<_> = (0..order.len())
            .map(|i| alice.send(format!("msg {i}").as_bytes(), b"").unwrap())
            .collect();

        for &i in &order {
            let received = bob.receive(&messages[i], b"").unwrap();
            prop_assert_eq!(received.plaintext, format!("msg {i}").into_bytes());
        }
    }

    #[test]
    fn prop_restored_session_is_equivalent(
        early in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..200), 0..5),
        late in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..200), 1..5),
    ) {
        let (alice, bob) = session_pair();

        for plaintext in &early {
            let message = alice.send(plaintext, b"").unwrap();
            bob.receive(&message, b"").unwrap();
        }

        let restored = Session::deserialize(&bob.serialize().unwrap()).unwrap();

        for plaintext in &late {
            let message = alice.send(plaintext, b"").unwrap();
            let received = restored.receive(&message, b"").unwrap();
            prop_assert_eq!(&received.plaintext, plaintext);

            let echo = restored.send(plaintext, b"").unwrap();
            let received = alice.receive(&echo, b"").unwrap();
            prop_assert_eq!(&received.plaintext, plaintext);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_kdf_is_deterministic(
        secret in prop::collection::vec(any::<u8>(), 1..64),
        salt in prop::option::of(prop::collection::vec(any::<u8>(), 0..32)),
        info in prop::collection::vec(any::<u8>(), 0..32),
    ) {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];

        crypto::kdf::derive(&secret, salt.as_deref(), &info, &mut a).unwrap();
        crypto::kdf::derive(&secret, salt.as_deref(), &info, &mut b).unwrap();

        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_aead_never_repeats_a_ciphertext(
        key in prop::array::uniform32(any::<u8>()),
        plaintext in prop::collection::vec(any::<u8>(), 0..200),
        ad in prop::collection::vec(any::<u8>(), 0..50),
    ) {
        let a = crypto::aead::encrypt(&key, &plaintext, &ad).unwrap();
        let b = crypto::aead::encrypt(&key, &plaintext, &ad).unwrap();

        prop_assert_ne!(a, b, "random nonces must make ciphertexts distinct");
    }

    #[test]
    fn prop_aead_roundtrip(
        key in prop::array::uniform32(any::<u8>()),
        plaintext in prop::collection::vec(any::<u8>(), 0..500),
        ad in prop::collection::vec(any::<u8>(), 0..50),
    ) {
        let ciphertext = crypto::aead::encrypt(&key, &plaintext, &ad).unwrap();
        let decrypted = crypto::aead::decrypt(&key, &ciphertext, &ad).unwrap();

        prop_assert_eq!(decrypted, plaintext);
    }
}
