use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// SHA-256 digest of evidence content.
///
/// The canonical digest of an evidence item is computed once over the
/// original plaintext bytes at intake and never recomputed. Later
/// integrity checks compare freshly computed digests against it.
///
/// Serializes as a 64-character lowercase hex string, matching how the
/// digest appears in court paperwork and persisted ledger records.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sha256Digest([u8; 32]);

impl Sha256Digest {
    /// Create from a raw 32-byte digest.
    pub fn from_raw(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full hex-encoded string (64 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short identifier (first 8 hex characters).
    pub fn short_id(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string (64 hex characters).
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let arr: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| TypeError::InvalidLength {
            expected: 32,
            actual: v.len(),
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha256Digest({})", self.short_id())
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Sha256Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Sha256Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}

/// Hash of a ledger record, linking it into the custody chain.
///
/// Each appended record stores its own `record_hash` plus the `prev_hash`
/// of its predecessor. The first record's `prev_hash` is [`RecordHash::GENESIS`].
///
/// Serializes as a 64-character lowercase hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordHash([u8; 32]);

impl RecordHash {
    /// Sentinel `prev_hash` carried by the first record in a chain.
    pub const GENESIS: Self = Self([0u8; 32]);

    /// Create from a raw 32-byte hash.
    pub fn from_raw(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw hash bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full hex-encoded string (64 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short identifier (first 8 hex characters).
    pub fn short_id(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string (64 hex characters).
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let arr: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| TypeError::InvalidLength {
            expected: 32,
            actual: v.len(),
        })?;
        Ok(Self(arr))
    }

    /// Whether this is the genesis sentinel.
    pub fn is_genesis(&self) -> bool {
        *self == Self::GENESIS
    }
}

impl fmt::Debug for RecordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_genesis() {
            write!(f, "RecordHash(genesis)")
        } else {
            write!(f, "RecordHash({})", self.short_id())
        }
    }
}

impl fmt::Display for RecordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for RecordHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RecordHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_roundtrip() {
        let digest = Sha256Digest::from_raw([0xAB; 32]);
        let parsed = Sha256Digest::from_hex(&digest.to_hex()).unwrap();
        assert_eq!(digest, parsed);
    }

    #[test]
    fn sha256_rejects_bad_hex() {
        assert!(matches!(
            Sha256Digest::from_hex("zzzz"),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn sha256_rejects_short_input() {
        assert!(matches!(
            Sha256Digest::from_hex("abcd"),
            Err(TypeError::InvalidLength {
                expected: 32,
                actual: 2
            })
        ));
    }

    #[test]
    fn sha256_serde_uses_hex_string() {
        let digest = Sha256Digest::from_raw([1; 32]);
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"{}\"", digest.to_hex()));
        let parsed: Sha256Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(digest, parsed);
    }

    #[test]
    fn genesis_is_all_zero() {
        assert_eq!(RecordHash::GENESIS.as_bytes(), &[0u8; 32]);
        assert!(RecordHash::GENESIS.is_genesis());
        assert!(!RecordHash::from_raw([1; 32]).is_genesis());
    }

    #[test]
    fn record_hash_hex_roundtrip() {
        let hash = RecordHash::from_raw([0x5C; 32]);
        let parsed = RecordHash::from_hex(&hash.to_hex()).unwrap();
        assert_eq!(hash, parsed);
    }

    #[test]
    fn record_hash_serde_roundtrip() {
        let hash = RecordHash::from_raw([9; 32]);
        let json = serde_json::to_string(&hash).unwrap();
        let parsed: RecordHash = serde_json::from_str(&json).unwrap();
        assert_eq!(hash, parsed);
    }

    #[test]
    fn debug_marks_genesis() {
        let debug = format!("{:?}", RecordHash::GENESIS);
        assert!(debug.contains("genesis"));
    }
}
