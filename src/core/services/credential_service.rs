use std::path::PathBuf;

use tracing::{debug, warn};

use crate::core::errors::{KeepError, Result};
use crate::core::models::account::Account;
use crate::core::models::key_ring::{KeyRing, UnlockedKey};
use crate::core::traits::account_store::AccountStore;
use crate::core::traits::cipher::CredentialCipher;
use crate::core::traits::passphrase::PassphraseSource;

/// Orchestrates account reads and writes by combining a
/// `CredentialCipher` with an `AccountStore`.
pub struct CredentialService<C: CredentialCipher, S: AccountStore> {
    pub cipher: C,
    pub store: S,
}

impl<C: CredentialCipher, S: AccountStore> CredentialService<C, S> {
    /// Pick the account matching `pattern`.
    ///
    /// A single match is used as is. With several matches `position`
    /// selects one by index into the sorted list.
    pub fn find_account(&self, pattern: &str, position: Option<usize>) -> Result<String> {
        let mut names = self.store.list(pattern)?;
        match (names.len(), position) {
            (0, _) => Err(KeepError::AccountNotFound {
                pattern: pattern.to_string(),
            }),
            (1, _) => Ok(names.remove(0)),
            (n, Some(index)) if index < n => Ok(names.swap_remove(index)),
            _ => Err(KeepError::AmbiguousAccount {
                pattern: pattern.to_string(),
                listing: numbered_listing(&names),
            }),
        }
    }

    /// Decrypt and parse the account stored under `name`.
    pub fn read_account(
        &self,
        name: &str,
        secret_ring: &KeyRing<C::SecretKey>,
        public_ring: &KeyRing<C::PublicKey>,
        source: &mut dyn PassphraseSource,
    ) -> Result<Account> {
        let path = self.store.path_for(name)?;
        debug!(path = %path.display(), cipher = self.cipher.name(), "decoding account");
        let message = self
            .cipher
            .decode_file(&path, secret_ring, public_ring, source)?;
        Account::from_decoded(name, message)
    }

    /// Serialize and encrypt `account` without storing it.
    ///
    /// An empty recipient ring is accepted and yields a message nobody can
    /// decrypt.
    pub fn encode_account(
        &self,
        account: &Account,
        recipients: &KeyRing<C::PublicKey>,
        signer: Option<&UnlockedKey<C::SecretKey>>,
    ) -> Result<Vec<u8>> {
        if recipients.is_empty() {
            warn!(account = account.name(), "encrypting to zero recipients");
        }
        self.cipher.encrypt(&account.to_bytes(), recipients, signer)
    }

    /// Encrypt `account` and write it as a new file. Existing accounts are
    /// never replaced.
    pub fn add_account(
        &self,
        account: &Account,
        recipients: &KeyRing<C::PublicKey>,
        signer: Option<&UnlockedKey<C::SecretKey>>,
    ) -> Result<PathBuf> {
        let path = self.store.path_for(account.name())?;
        if path.exists() {
            return Err(KeepError::AccountExists { path });
        }
        let armored = self.encode_account(account, recipients, signer)?;
        self.store.write_new(account.name(), &armored)
    }
}

/// `index - name` lines, as printed by `keep list`.
pub fn numbered_listing(names: &[String]) -> String {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{i} - {name}"))
        .collect::<Vec<_>>()
        .join("\n")
}
