use secrecy::SecretString;

use crate::core::errors::{KeepError, Result};
use crate::core::traits::key_entity::{KeyEntity, Unlockable};

/// An ordered collection of key entities, loaded verbatim from a file.
///
/// Filtering never mutates the ring; it returns a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyRing<K> {
    entities: Vec<K>,
}

impl<K> KeyRing<K> {
    pub fn new(entities: Vec<K>) -> Self {
        Self { entities }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, K> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn into_vec(self) -> Vec<K> {
        self.entities
    }
}

impl<K> Default for KeyRing<K> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<'a, K> IntoIterator for &'a KeyRing<K> {
    type Item = &'a K;
    type IntoIter = std::slice::Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

impl<K: KeyEntity + Clone> KeyRing<K> {
    /// Keep the entities whose short id equals one of the whitespace-separated
    /// `identifiers`.
    ///
    /// Matching is exact on the short identifier; ring order is preserved and
    /// an entity appears at most once however many identifiers name it.
    pub fn filter(&self, identifiers: &str) -> KeyRing<K> {
        let wanted: Vec<&str> = identifiers.split_whitespace().collect();
        let entities = self
            .entities
            .iter()
            .filter(|entity| {
                let short_id = entity.short_id();
                wanted.iter().any(|id| *id == short_id)
            })
            .cloned()
            .collect();
        KeyRing { entities }
    }
}

/// A private key together with the passphrase proven to unlock it.
///
/// The only way to obtain one is `UnlockedKey::new`, which checks the
/// passphrase, so holding this value means the key is usable for signing.
pub struct UnlockedKey<K> {
    key: K,
    passphrase: SecretString,
}

impl<K: Unlockable> UnlockedKey<K> {
    pub fn new(key: K, passphrase: SecretString) -> Result<Self> {
        if key.requires_passphrase() && !key.unlocks_with(&passphrase) {
            return Err(KeepError::KeyLocked {
                key: key.short_id(),
            });
        }
        Ok(Self { key, passphrase })
    }
}

impl<K> UnlockedKey<K> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn passphrase(&self) -> &SecretString {
        &self.passphrase
    }
}

impl<K: KeyEntity> std::fmt::Debug for UnlockedKey<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnlockedKey")
            .field("key", &self.key.short_id())
            .field("passphrase", &"[REDACTED]")
            .finish()
    }
}
