use secrecy::SecretString;

use crate::core::errors::Result;

/// Which of the interchangeable strategies produced a passphrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    EnvironmentOverride,
    AgentBacked,
    InteractivePrompt,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EnvironmentOverride => write!(f, "environment"),
            Self::AgentBacked => write!(f, "gpg-agent"),
            Self::InteractivePrompt => write!(f, "terminal"),
        }
    }
}

/// What a passphrase source is asked about: one candidate key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPrompt {
    pub short_id: String,
    pub fingerprint: String,
    pub user_id: Option<String>,
}

/// Port for obtaining the passphrase of one specific key.
///
/// Implementations live in `adapters::passphrase`. The resolver calls
/// `passphrase_for` at most once per candidate and `reject` after a
/// passphrase failed to unlock that candidate.
pub trait PassphraseSource {
    fn kind(&self) -> StrategyKind;

    /// Passphrase for `key`, or `None` when the source has nothing to offer
    /// for it (cache miss, empty answer) and the next candidate should be tried.
    fn passphrase_for(&mut self, key: &KeyPrompt) -> Result<Option<SecretString>>;

    /// Recovery after `passphrase_for(key)` produced a wrong passphrase.
    fn reject(&mut self, _key: &KeyPrompt) -> Result<()> {
        Ok(())
    }
}
