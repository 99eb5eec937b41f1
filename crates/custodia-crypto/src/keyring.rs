use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use custodia_types::{ActorId, RecordHash};

use crate::signer::{Signature, SigningKey, VerifyingKey};

/// Signing seam used by the ledger's append path.
///
/// Implementations hold or access per-actor keypairs. Signing happens over
/// the 32-byte record hash, after the hash has been computed, so the
/// signature is bound to the event's position in the chain.
pub trait EventSigner: Send + Sync {
    /// The public key that `sign` would use for this actor.
    ///
    /// Resolved before hashing: the public key is part of the hashed record,
    /// so it must be known before the record hash exists.
    fn verifying_key(&self, actor: &ActorId) -> Result<VerifyingKey, SigningError>;

    /// Sign a record hash on behalf of an actor.
    fn sign(&self, actor: &ActorId, record_hash: &RecordHash)
        -> Result<(Signature, VerifyingKey), SigningError>;

    /// Get the actor's public key, provisioning a fresh keypair if none
    /// exists yet.
    fn ensure_key(&self, actor: &ActorId) -> Result<VerifyingKey, SigningError>;
}

/// Errors from signing operations.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    /// The actor has no registered keypair.
    #[error("no signing key registered for actor {0}")]
    KeyNotFound(ActorId),

    /// The key store itself cannot be reached or read.
    #[error("key store unavailable: {0}")]
    Unavailable(String),
}

/// In-memory keyring mapping actors to Ed25519 keypairs.
#[derive(Default)]
pub struct ActorKeyring {
    keys: RwLock<HashMap<ActorId, SigningKey>>,
}

impl ActorKeyring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a keypair for an actor, replacing any existing one.
    pub fn register(&self, actor: ActorId, key: SigningKey) -> Result<(), SigningError> {
        let mut keys = self
            .keys
            .write()
            .map_err(|_| SigningError::Unavailable("keyring lock poisoned".into()))?;
        keys.insert(actor, key);
        Ok(())
    }

    /// Whether the actor has a registered keypair.
    pub fn contains(&self, actor: &ActorId) -> bool {
        self.keys
            .read()
            .map(|keys| keys.contains_key(actor))
            .unwrap_or(false)
    }
}

impl EventSigner for ActorKeyring {
    fn verifying_key(&self, actor: &ActorId) -> Result<VerifyingKey, SigningError> {
        let keys = self
            .keys
            .read()
            .map_err(|_| SigningError::Unavailable("keyring lock poisoned".into()))?;
        keys.get(actor)
            .map(SigningKey::verifying_key)
            .ok_or_else(|| SigningError::KeyNotFound(actor.clone()))
    }

    fn sign(
        &self,
        actor: &ActorId,
        record_hash: &RecordHash,
    ) -> Result<(Signature, VerifyingKey), SigningError> {
        let keys = self
            .keys
            .read()
            .map_err(|_| SigningError::Unavailable("keyring lock poisoned".into()))?;
        let key = keys
            .get(actor)
            .ok_or_else(|| SigningError::KeyNotFound(actor.clone()))?;
        Ok((key.sign(record_hash.as_bytes()), key.verifying_key()))
    }

    fn ensure_key(&self, actor: &ActorId) -> Result<VerifyingKey, SigningError> {
        let mut keys = self
            .keys
            .write()
            .map_err(|_| SigningError::Unavailable("keyring lock poisoned".into()))?;
        let key = keys
            .entry(actor.clone())
            .or_insert_with(SigningKey::generate);
        Ok(key.verifying_key())
    }
}

impl std::fmt::Debug for ActorKeyring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.keys.read().map(|k| k.len()).unwrap_or(0);
        write!(f, "ActorKeyring({count} keys)")
    }
}

/// Directory-backed keyring: one hex-encoded seed file per actor.
///
/// Layout is `<dir>/<actor_id>.key`, each file holding a 64-character hex
/// seed. Missing file means the actor has no key; unreadable or corrupt
/// files surface as the key store being unavailable, never as a silent
/// skip of signing.
pub struct DirKeyring {
    dir: PathBuf,
}

impl DirKeyring {
    /// Open a keyring rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, SigningError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|e| SigningError::Unavailable(format!("creating key dir: {e}")))?;
        Ok(Self { dir })
    }

    fn key_path(&self, actor: &ActorId) -> PathBuf {
        self.dir.join(format!("{}.key", actor.as_str()))
    }

    fn load(&self, actor: &ActorId) -> Result<SigningKey, SigningError> {
        let path = self.key_path(actor);
        let hex = match fs::read_to_string(&path) {
            Ok(hex) => hex,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SigningError::KeyNotFound(actor.clone()))
            }
            Err(e) => {
                return Err(SigningError::Unavailable(format!(
                    "reading {}: {e}",
                    path.display()
                )))
            }
        };
        SigningKey::from_hex(&hex).map_err(|e| {
            SigningError::Unavailable(format!("corrupt key file {}: {e}", path.display()))
        })
    }

    /// Whether the actor has a persisted key file.
    pub fn contains(&self, actor: &ActorId) -> bool {
        self.key_path(actor).is_file()
    }
}

impl EventSigner for DirKeyring {
    fn verifying_key(&self, actor: &ActorId) -> Result<VerifyingKey, SigningError> {
        Ok(self.load(actor)?.verifying_key())
    }

    fn sign(
        &self,
        actor: &ActorId,
        record_hash: &RecordHash,
    ) -> Result<(Signature, VerifyingKey), SigningError> {
        let key = self.load(actor)?;
        Ok((key.sign(record_hash.as_bytes()), key.verifying_key()))
    }

    /// Generates and persists a fresh keypair on first use.
    fn ensure_key(&self, actor: &ActorId) -> Result<VerifyingKey, SigningError> {
        match self.load(actor) {
            Ok(key) => Ok(key.verifying_key()),
            Err(SigningError::KeyNotFound(_)) => {
                let key = SigningKey::generate();
                let path = self.key_path(actor);
                fs::write(&path, key.to_hex()).map_err(|e| {
                    SigningError::Unavailable(format!("writing {}: {e}", path.display()))
                })?;
                Ok(key.verifying_key())
            }
            Err(e) => Err(e),
        }
    }
}

impl std::fmt::Debug for DirKeyring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DirKeyring({})", self.dir.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(id: &str) -> ActorId {
        ActorId::new(id)
    }

    // ---- in-memory keyring ----

    #[test]
    fn sign_with_registered_key() {
        let keyring = ActorKeyring::new();
        keyring.register(actor("officer1"), SigningKey::generate()).unwrap();

        let hash = RecordHash::from_raw([3; 32]);
        let (sig, vk) = keyring.sign(&actor("officer1"), &hash).unwrap();
        assert!(vk.verify(hash.as_bytes(), &sig));
    }

    #[test]
    fn sign_without_key_fails() {
        let keyring = ActorKeyring::new();
        let hash = RecordHash::from_raw([3; 32]);
        assert!(matches!(
            keyring.sign(&actor("ghost"), &hash),
            Err(SigningError::KeyNotFound(_))
        ));
    }

    #[test]
    fn verifying_key_matches_sign_output() {
        let keyring = ActorKeyring::new();
        keyring.register(actor("a"), SigningKey::generate()).unwrap();

        let vk = keyring.verifying_key(&actor("a")).unwrap();
        let (_, vk_from_sign) = keyring
            .sign(&actor("a"), &RecordHash::from_raw([0; 32]))
            .unwrap();
        assert_eq!(vk, vk_from_sign);
    }

    #[test]
    fn ensure_key_is_stable() {
        let keyring = ActorKeyring::new();
        let vk1 = keyring.ensure_key(&actor("a")).unwrap();
        let vk2 = keyring.ensure_key(&actor("a")).unwrap();
        assert_eq!(vk1, vk2);
        assert!(keyring.contains(&actor("a")));
    }

    #[test]
    fn register_replaces_key() {
        let keyring = ActorKeyring::new();
        let vk1 = keyring.ensure_key(&actor("a")).unwrap();
        keyring.register(actor("a"), SigningKey::generate()).unwrap();
        let vk2 = keyring.verifying_key(&actor("a")).unwrap();
        assert_ne!(vk1, vk2);
    }

    // ---- directory-backed keyring ----

    #[test]
    fn dir_keyring_persists_keys() {
        let dir = tempfile::tempdir().unwrap();
        let vk1 = {
            let keyring = DirKeyring::open(dir.path()).unwrap();
            keyring.ensure_key(&actor("officer1")).unwrap()
        };
        // Reopen and confirm the same key comes back.
        let keyring = DirKeyring::open(dir.path()).unwrap();
        let vk2 = keyring.verifying_key(&actor("officer1")).unwrap();
        assert_eq!(vk1, vk2);
    }

    #[test]
    fn dir_keyring_missing_key_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let keyring = DirKeyring::open(dir.path()).unwrap();
        assert!(matches!(
            keyring.verifying_key(&actor("nobody")),
            Err(SigningError::KeyNotFound(_))
        ));
        assert!(!keyring.contains(&actor("nobody")));
    }

    #[test]
    fn dir_keyring_corrupt_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let keyring = DirKeyring::open(dir.path()).unwrap();
        std::fs::write(dir.path().join("broken.key"), "not hex at all").unwrap();
        assert!(matches!(
            keyring.verifying_key(&actor("broken")),
            Err(SigningError::Unavailable(_))
        ));
    }

    #[test]
    fn dir_keyring_signs_like_memory_keyring() {
        let dir = tempfile::tempdir().unwrap();
        let keyring = DirKeyring::open(dir.path()).unwrap();
        keyring.ensure_key(&actor("analyst1")).unwrap();

        let hash = RecordHash::from_raw([9; 32]);
        let (sig, vk) = keyring.sign(&actor("analyst1"), &hash).unwrap();
        assert!(vk.verify(hash.as_bytes(), &sig));
    }
}
