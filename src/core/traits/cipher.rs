use std::path::Path;

use crate::core::errors::{KeepError, Result};
use crate::core::models::decoded_message::DecodedMessage;
use crate::core::models::key_ring::{KeyRing, UnlockedKey};
use crate::core::traits::key_entity::{KeyEntity, Unlockable};
use crate::core::traits::passphrase::PassphraseSource;

/// Port for the credential codec.
///
/// Implementations live in `adapters::cipher` (e.g. OpenPgpBackend).
/// The core layer only depends on this trait, never on a concrete engine.
pub trait CredentialCipher {
    type SecretKey: Unlockable + Clone;
    type PublicKey: KeyEntity + Clone;

    /// Decrypt an armored message.
    ///
    /// `secret_ring` supplies decryption candidates; the signer is looked up
    /// in `public_ring` and, failing that, in `secret_ring`. A signature that
    /// is present but does not verify is an error, never a result.
    fn decrypt(
        &self,
        armored: &[u8],
        secret_ring: &KeyRing<Self::SecretKey>,
        public_ring: &KeyRing<Self::PublicKey>,
        source: &mut dyn PassphraseSource,
    ) -> Result<DecodedMessage>;

    /// Encrypt `plaintext` to every key of `recipients`, optionally signed.
    fn encrypt(
        &self,
        plaintext: &[u8],
        recipients: &KeyRing<Self::PublicKey>,
        signer: Option<&UnlockedKey<Self::SecretKey>>,
    ) -> Result<Vec<u8>>;

    /// Human-readable name of this backend (e.g. "openpgp").
    fn name(&self) -> &str;

    /// Read `path` and decrypt it.
    fn decode_file(
        &self,
        path: &Path,
        secret_ring: &KeyRing<Self::SecretKey>,
        public_ring: &KeyRing<Self::PublicKey>,
        source: &mut dyn PassphraseSource,
    ) -> Result<DecodedMessage> {
        let armored = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => KeepError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => KeepError::Io(e),
        })?;
        self.decrypt(&armored, secret_ring, public_ring, source)
    }
}
