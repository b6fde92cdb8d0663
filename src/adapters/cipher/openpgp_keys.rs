use pgp::composed::{SignedPublicKey, SignedSecretKey};
use pgp::types::{KeyId, PublicKeyTrait, SecretKeyTrait};
use secrecy::{ExposeSecret, SecretString};

use crate::core::traits::key_entity::{KeyEntity, Unlockable};

/// Last 4 bytes of a key id as uppercase hex, e.g. `1A2B3C4D`.
pub fn short_key_id(id: &KeyId) -> String {
    let bytes = id.as_ref();
    hex::encode_upper(&bytes[bytes.len().saturating_sub(4)..])
}

fn fingerprint_hex(key: &impl PublicKeyTrait) -> String {
    hex::encode_upper(key.fingerprint().as_bytes())
}

/// Key ids of the primary key and every sub-key, primary first.
pub fn secret_key_ids(key: &SignedSecretKey) -> Vec<KeyId> {
    std::iter::once(key.key_id())
        .chain(key.secret_subkeys.iter().map(|sub| sub.key.key_id()))
        .collect()
}

/// Whether any part of `key` may decrypt session keys.
pub fn can_decrypt(key: &SignedSecretKey) -> bool {
    key.primary_key.is_encryption_key()
        || key
            .secret_subkeys
            .iter()
            .any(|sub| sub.key.is_encryption_key())
}

impl KeyEntity for SignedSecretKey {
    fn short_id(&self) -> String {
        short_key_id(&self.key_id())
    }

    fn fingerprint(&self) -> String {
        fingerprint_hex(&self.primary_key)
    }

    fn user_id(&self) -> Option<String> {
        self.details.users.first().map(|u| u.id.id().to_string())
    }
}

impl Unlockable for SignedSecretKey {
    fn requires_passphrase(&self) -> bool {
        self.primary_key.secret_params().is_encrypted()
            || self
                .secret_subkeys
                .iter()
                .any(|sub| sub.key.secret_params().is_encrypted())
    }

    fn unlocks_with(&self, passphrase: &SecretString) -> bool {
        let password = || passphrase.expose_secret().to_string();
        self.primary_key.unlock(password, |_| Ok(())).is_ok()
            && self
                .secret_subkeys
                .iter()
                .all(|sub| sub.key.unlock(password, |_| Ok(())).is_ok())
    }
}

impl KeyEntity for SignedPublicKey {
    fn short_id(&self) -> String {
        short_key_id(&self.key_id())
    }

    fn fingerprint(&self) -> String {
        fingerprint_hex(&self.primary_key)
    }

    fn user_id(&self) -> Option<String> {
        self.details.users.first().map(|u| u.id.id().to_string())
    }
}
