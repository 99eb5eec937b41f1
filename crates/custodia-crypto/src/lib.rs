//! Cryptographic primitives for the Custodia chain-of-custody ledger.
//!
//! Provides domain-separated BLAKE3 hashing for ledger records, SHA-256
//! digests for evidence content, Ed25519 signing and verification behind
//! actor keyrings, and the authenticated-encryption envelope used for
//! evidence payloads at rest.
//!
//! All crypto operations wrap established libraries; there is no custom
//! cryptography here.

pub mod envelope;
pub mod hasher;
pub mod keyring;
pub mod signer;

pub use envelope::{CipherError, EvidenceCipher, ENVELOPE_MARKER};
pub use hasher::{sha256_digest, ContentHasher, HasherError};
pub use keyring::{ActorKeyring, DirKeyring, EventSigner, SigningError};
pub use signer::{KeyError, Signature, SigningKey, VerifyingKey};
