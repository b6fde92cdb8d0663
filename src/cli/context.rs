use std::path::{Path, PathBuf};

use pgp::composed::{SignedPublicKey, SignedSecretKey};
use tracing::{debug, warn};

use crate::adapters::accounts::file_account_store::FileAccountStore;
use crate::adapters::cipher::openpgp_backend::OpenPgpBackend;
use crate::adapters::keyring::file_keyring::{load_public_ring, load_secret_ring};
use crate::adapters::passphrase::PassphraseSettings;
use crate::cli::Cli;
use crate::config::profile_store::ProfileStore;
use crate::core::errors::{KeepError, Result};
use crate::core::models::key_ring::KeyRing;
use crate::core::models::profile::Profile;
use crate::core::services::credential_service::CredentialService;

/// Everything a command needs, resolved once from the command line, the
/// profile store and the environment.
pub struct AppContext {
    pub profile: Profile,
    pub passphrase: PassphraseSettings,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config_path = match &cli.config {
            Some(path) => PathBuf::from(path),
            None => ProfileStore::default_path()?,
        };
        let store = ProfileStore::load_or_init(&config_path)?;
        let mut profile = store.select(cli.profile.as_deref())?;

        if let Some(dir) = &cli.dir {
            profile.account_dir = dir.clone();
        }
        if let Some(recipients) = &cli.recipients {
            profile.recipient_key_ids = recipients.clone();
        }
        debug!(profile = %profile.name, account_dir = %profile.account_dir, "using profile");

        Ok(Self {
            profile,
            passphrase: PassphraseSettings::from_env(),
        })
    }

    pub fn service(&self) -> CredentialService<OpenPgpBackend, FileAccountStore> {
        CredentialService {
            cipher: OpenPgpBackend::new(),
            store: FileAccountStore::new(PathBuf::from(&self.profile.account_dir)),
        }
    }

    pub fn secret_ring(&self) -> Result<KeyRing<SignedSecretKey>> {
        load_secret_ring(Path::new(&self.profile.secring_dir))
    }

    pub fn public_ring(&self) -> Result<KeyRing<SignedPublicKey>> {
        load_public_ring(Path::new(&self.profile.pubring_dir))
    }

    /// The public ring for signer lookup, or an empty one when the file is
    /// missing. Secret keys still serve as signers in that case.
    pub fn public_ring_or_empty(&self) -> Result<KeyRing<SignedPublicKey>> {
        match self.public_ring() {
            Ok(ring) => Ok(ring),
            Err(KeepError::FileNotFound { path }) => {
                warn!(path = %path.display(), "public key-ring not found, checking signers against the secret key-ring only");
                Ok(KeyRing::default())
            }
            Err(e) => Err(e),
        }
    }
}
