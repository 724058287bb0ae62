//! Pawl: a Double Ratchet session library.
//!
//! A [`Session`] is one end of a two-party, stateful, authenticated
//! encryption channel. Each side seeds its session from an initial key
//! agreement and then calls [`Session::send`] and [`Session::receive`];
//! everything else (chain stepping, ratchet steps, out-of-order recovery,
//! replay rejection) happens inside.
//!
//! # Key Lifecycle
//!
//! Two ratchets drive the key schedule. The Diffie-Hellman ratchet folds a
//! fresh shared secret into the root key whenever the peer shows a new
//! ephemeral key; the symmetric ratchet steps a chain key once per message.
//!
//! ```text
//! Initial shared secret
//!        │
//!        ▼
//! HKDF → Root Key ──(DH ratchet step)──▶ next Root Key ...
//!        │
//!        ▼
//! Chain Key ──HMAC──▶ next Chain Key ...
//!        │
//!        ▼
//! Message Key → AES-256-GCM → Ciphertext
//! ```
//!
//! Message keys are used for exactly one AEAD operation. Keys skipped over
//! by out-of-order delivery are parked (bounded by [`MAX_SKIP`]) until
//! their message arrives or the session is dropped.
//!
//! # Security
//!
//! Forward Secrecy:
//! - Chain advancement: old chain keys are zeroized after deriving the next
//! - Message key disposal: keys are zeroized after their single use
//!
//! Post-Compromise Security:
//! - Each DH ratchet step mixes a fresh ECDH output into the root key, so
//!   an attacker who captured earlier state loses the session once the
//!   peers complete one uncompromised round trip
//!
//! Authenticity:
//! - AES-256-GCM authenticates ciphertext and caller-supplied associated
//!   data; any mismatch rejects the message without advancing state
//!
//! # Out of scope
//!
//! Identity keys, the initial key agreement that produces the seed
//! material, transports, and persistence all live outside this crate; the
//! session only consumes their outputs ([`Session::new`],
//! [`Session::deserialize`]).

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod chain;
pub mod crypto;
mod dh;
pub mod error;
pub mod message;
pub mod session;
mod skipped;
mod state;

pub use error::RatchetError;
pub use message::{CipheredMessage, Header, UncipheredMessage};
pub use session::{MAX_SKIP, Session};
