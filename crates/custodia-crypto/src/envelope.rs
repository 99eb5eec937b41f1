use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Marker prefix identifying an encrypted evidence envelope.
///
/// Stored bytes that do not start with this marker are legacy plaintext
/// from before encryption-at-rest was introduced and are passed through
/// unchanged on read.
pub const ENVELOPE_MARKER: &[u8] = b"CSTENV1:";

const NONCE_LEN: usize = 12;

/// Authenticated-encryption envelope for evidence payloads at rest.
///
/// Envelope layout: `marker || nonce (12 bytes) || ciphertext+tag`.
/// A fresh random nonce is drawn per encryption. The key is a single
/// symmetric secret with an external lifecycle; the cipher never writes
/// it anywhere.
pub struct EvidenceCipher {
    cipher: ChaCha20Poly1305,
    fingerprint: String,
}

impl EvidenceCipher {
    /// Build a cipher from a 32-byte key.
    pub fn new(key_bytes: &[u8; 32]) -> Self {
        let cipher = ChaCha20Poly1305::new(Key::from_slice(key_bytes));
        let fingerprint = hex::encode(Sha256::digest(key_bytes));
        Self {
            cipher,
            fingerprint,
        }
    }

    /// Build a cipher from a hex-encoded 32-byte key.
    pub fn from_hex(s: &str) -> Result<Self, CipherError> {
        let bytes = hex::decode(s.trim())
            .map_err(|e| CipherError::InvalidKey(format!("invalid hex: {e}")))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| CipherError::InvalidKey(format!("expected 32 bytes, got {}", v.len())))?;
        Ok(Self::new(&arr))
    }

    /// Generate a fresh random key, returning the cipher and the key bytes.
    ///
    /// The caller owns persisting the key; the cipher keeps no copy beyond
    /// the expanded cipher state.
    pub fn generate() -> (Self, [u8; 32]) {
        let mut key_bytes = [0u8; 32];
        OsRng.fill_bytes(&mut key_bytes);
        (Self::new(&key_bytes), key_bytes)
    }

    /// Encrypt plaintext into a marked envelope.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| CipherError::Encryption)?;

        let mut envelope = Vec::with_capacity(ENVELOPE_MARKER.len() + NONCE_LEN + ciphertext.len());
        envelope.extend_from_slice(ENVELOPE_MARKER);
        envelope.extend_from_slice(&nonce_bytes);
        envelope.extend_from_slice(&ciphertext);
        Ok(envelope)
    }

    /// Decrypt stored bytes.
    ///
    /// Bytes without the envelope marker are legacy plaintext and come back
    /// unchanged; reading never fails solely because a file predates
    /// encryption. Marked envelopes are authenticated and decrypted, and a
    /// tag mismatch (tamper or wrong key) is a `DecryptionError`.
    pub fn decrypt(&self, stored: &[u8]) -> Result<Vec<u8>, CipherError> {
        let body = match stored.strip_prefix(ENVELOPE_MARKER) {
            Some(body) => body,
            None => return Ok(stored.to_vec()),
        };

        if body.len() < NONCE_LEN {
            return Err(CipherError::Decryption(
                "envelope shorter than nonce".into(),
            ));
        }
        let (nonce_bytes, ciphertext) = body.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        self.cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CipherError::Decryption("authentication tag mismatch".into()))
    }

    /// Whether stored bytes carry the envelope marker.
    pub fn is_encrypted(stored: &[u8]) -> bool {
        stored.starts_with(ENVELOPE_MARKER)
    }

    /// SHA-256 fingerprint of the key (hex), for operational display.
    pub fn key_fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

impl std::fmt::Debug for EvidenceCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EvidenceCipher(fp:{})", &self.fingerprint[..8])
    }
}

/// Errors from envelope operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("encryption failed")]
    Encryption,

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("invalid cipher key: {0}")]
    InvalidKey(String),
}
