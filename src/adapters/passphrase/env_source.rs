use secrecy::{ExposeSecret, SecretString};

use crate::core::errors::Result;
use crate::core::traits::passphrase::{KeyPrompt, PassphraseSource, StrategyKind};

/// Environment variable whose value replaces every passphrase prompt.
pub const PASSPHRASE_ENV_VAR: &str = "GPGPASSPHRASE";

/// Offers the same fixed passphrase for every key.
///
/// Meant for scripts and tests. A wrong value is simply rejected for
/// each candidate, so the caller ends up with an exhausted error instead
/// of a hang.
pub struct EnvSource {
    passphrase: SecretString,
}

impl EnvSource {
    pub fn new(passphrase: SecretString) -> Self {
        Self { passphrase }
    }
}

impl PassphraseSource for EnvSource {
    fn kind(&self) -> StrategyKind {
        StrategyKind::EnvironmentOverride
    }

    fn passphrase_for(&mut self, _key: &KeyPrompt) -> Result<Option<SecretString>> {
        Ok(Some(SecretString::from(
            self.passphrase.expose_secret().to_string(),
        )))
    }
}
