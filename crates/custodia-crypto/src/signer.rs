use serde::{Deserialize, Serialize};

/// Ed25519 signing key (private).
pub struct SigningKey(ed25519_dalek::SigningKey);

/// Ed25519 verifying key (public), embedded in every ledger record.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyingKey(ed25519_dalek::VerifyingKey);

/// Ed25519 signature over a record hash.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde(with = "signature_serde")] ed25519_dalek::Signature);

impl SigningKey {
    /// Generate a new random signing key.
    pub fn generate() -> Self {
        let mut csprng = rand::thread_rng();
        Self(ed25519_dalek::SigningKey::generate(&mut csprng))
    }

    /// Create from a raw 32-byte seed.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(&bytes))
    }

    /// Parse from a hex-encoded 32-byte seed.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s.trim()).map_err(|e| KeyError::InvalidHex(e.to_string()))?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| KeyError::InvalidKey)?;
        Ok(Self::from_bytes(arr))
    }

    /// The corresponding public verifying key.
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey(self.0.verifying_key())
    }

    /// Sign a message. Ed25519 signing is deterministic: the same key and
    /// message always produce the same signature.
    pub fn sign(&self, message: &[u8]) -> Signature {
        use ed25519_dalek::Signer;
        Signature(self.0.sign(message))
    }

    /// Raw seed bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    /// Hex-encoded seed, for key-file storage.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.as_bytes())
    }
}

impl VerifyingKey {
    /// Verify a signature on a message.
    ///
    /// Pure check with no side effects. Returns `false` for any invalid
    /// input rather than erroring, so chain validation can treat a bad
    /// signature as just another broken record.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        use ed25519_dalek::Verifier;
        self.0.verify(message, &signature.0).is_ok()
    }

    /// Raw public key bytes.
    pub fn as_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Full hex-encoded public key.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.to_bytes())
    }

    /// Create from raw 32-byte public key.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, KeyError> {
        let key =
            ed25519_dalek::VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidKey)?;
        Ok(Self(key))
    }
}

impl Signature {
    /// Raw 64-byte signature.
    pub fn to_bytes(&self) -> [u8; 64] {
        self.0.to_bytes()
    }

    /// Create from raw 64 bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(ed25519_dalek::Signature::from_bytes(&bytes))
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SigningKey(<redacted>)")
    }
}

impl std::fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VerifyingKey({})", hex::encode(&self.0.to_bytes()[..8]))
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({}...)", hex::encode(&self.0.to_bytes()[..8]))
    }
}

/// Errors from key material handling.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid key bytes")]
    InvalidKey,
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

mod signature_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(sig: &ed25519_dalek::Signature, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&sig.to_bytes())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<ed25519_dalek::Signature, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: Vec<u8> = Vec::deserialize(deserializer)?;
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 64-byte signature"))?;
        Ok(ed25519_dalek::Signature::from_bytes(&arr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_record_hash_verifies() {
        let sk = SigningKey::generate();
        let vk = sk.verifying_key();
        let record_hash = [0xabu8; 32];
        let sig = sk.sign(&record_hash);
        assert!(vk.verify(&record_hash, &sig));
    }

    #[test]
    fn altered_record_hash_fails_verification() {
        let sk = SigningKey::generate();
        let sig = sk.sign(&[0xabu8; 32]);
        assert!(!sk.verifying_key().verify(&[0xacu8; 32], &sig));
    }

    #[test]
    fn another_actors_key_fails_verification() {
        let officer = SigningKey::generate();
        let analyst = SigningKey::generate();
        let sig = officer.sign(&[0xabu8; 32]);
        assert!(!analyst.verifying_key().verify(&[0xabu8; 32], &sig));
    }

    #[test]
    fn signing_is_deterministic() {
        let sk = SigningKey::generate();
        let a = sk.sign(b"same input");
        let b = sk.sign(b"same input");
        assert_eq!(a, b);
    }

    #[test]
    fn seed_roundtrip() {
        let sk = SigningKey::generate();
        let sk2 = SigningKey::from_bytes(*sk.as_bytes());
        assert_eq!(sk.verifying_key(), sk2.verifying_key());
    }

    #[test]
    fn seed_hex_roundtrip() {
        let sk = SigningKey::generate();
        let sk2 = SigningKey::from_hex(&sk.to_hex()).unwrap();
        assert_eq!(sk.verifying_key(), sk2.verifying_key());
    }

    #[test]
    fn seed_hex_tolerates_trailing_newline() {
        let sk = SigningKey::generate();
        let sk2 = SigningKey::from_hex(&format!("{}\n", sk.to_hex())).unwrap();
        assert_eq!(sk.verifying_key(), sk2.verifying_key());
    }

    #[test]
    fn bad_seed_hex_is_rejected() {
        assert!(SigningKey::from_hex("not hex").is_err());
        assert!(matches!(
            SigningKey::from_hex("abcd"),
            Err(KeyError::InvalidKey)
        ));
    }

    #[test]
    fn pubkey_bytes_roundtrip() {
        let vk = SigningKey::generate().verifying_key();
        let vk2 = VerifyingKey::from_bytes(vk.as_bytes()).unwrap();
        assert_eq!(vk, vk2);
    }

    #[test]
    fn signature_serde_roundtrip() {
        let sig = SigningKey::generate().sign(b"test");
        let json = serde_json::to_string(&sig).unwrap();
        let parsed: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(sig, parsed);
    }

    #[test]
    fn pubkey_serde_roundtrip() {
        let vk = SigningKey::generate().verifying_key();
        let json = serde_json::to_string(&vk).unwrap();
        let parsed: VerifyingKey = serde_json::from_str(&json).unwrap();
        assert_eq!(vk, parsed);
    }

    #[test]
    fn tampered_signature_fails() {
        let sk = SigningKey::generate();
        let sig = sk.sign(b"message");
        let mut bytes = sig.to_bytes();
        bytes[0] ^= 0x01;
        let tampered = Signature::from_bytes(bytes);
        assert!(!sk.verifying_key().verify(b"message", &tampered));
    }

    #[test]
    fn debug_redacts_signing_key() {
        let sk = SigningKey::generate();
        let debug = format!("{sk:?}");
        assert!(debug.contains("redacted"));
        assert!(!debug.contains(&sk.to_hex()));
    }
}
