#[cfg(unix)]
pub mod agent_source;
pub mod env_source;
pub mod terminal_source;

use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::adapters::console::std_console::StdConsole;
use crate::core::errors::Result;
use crate::core::traits::passphrase::{KeyPrompt, PassphraseSource, StrategyKind};
#[cfg(unix)]
use agent_source::UnixAgentSource;
use env_source::{EnvSource, PASSPHRASE_ENV_VAR};
use terminal_source::TerminalSource;

/// Process environment relevant to passphrase lookup, captured once at
/// startup and handed down explicitly.
#[derive(Debug, Default)]
pub struct PassphraseSettings {
    /// Fixed passphrase from `GPGPASSPHRASE`.
    pub override_passphrase: Option<SecretString>,
    /// Where a gpg-agent may be listening.
    pub agent_socket: Option<PathBuf>,
    /// Terminal the agent's pinentry should use (`GPG_TTY`).
    pub tty: Option<String>,
}

impl PassphraseSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            override_passphrase: lookup(PASSPHRASE_ENV_VAR).map(SecretString::from),
            agent_socket: agent_socket(&lookup),
            tty: lookup("GPG_TTY").filter(|tty| !tty.is_empty()),
        }
    }
}

/// `GPG_AGENT_INFO` (socket path before the first `:`), then
/// `$GNUPGHOME/S.gpg-agent`, then `~/.gnupg/S.gpg-agent`.
fn agent_socket(lookup: &impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    if let Some(info) = lookup("GPG_AGENT_INFO") {
        if let Some(path) = info.split(':').next().filter(|p| !p.is_empty()) {
            return Some(PathBuf::from(path));
        }
    }

    let gnupg_home = match lookup("GNUPGHOME").filter(|h| !h.is_empty()) {
        Some(home) => PathBuf::from(home),
        None => lookup("HOME")
            .map(PathBuf::from)
            .or_else(dirs::home_dir)?
            .join(".gnupg"),
    };
    Some(gnupg_home.join("S.gpg-agent"))
}

/// The passphrase strategy chosen for one resolution call.
///
/// The `GPGPASSPHRASE` override wins and the agent is then never contacted.
/// Otherwise a reachable gpg-agent is used, then the terminal. The agent
/// connection lives exactly as long as this value.
pub enum PassphraseStrategy {
    #[cfg(unix)]
    Agent(UnixAgentSource),
    Environment(EnvSource),
    Interactive(TerminalSource),
}

impl PassphraseStrategy {
    pub fn select(settings: &PassphraseSettings) -> Self {
        if let Some(passphrase) = &settings.override_passphrase {
            info!("Overriding passphrase prompt with {PASSPHRASE_ENV_VAR}");
            return Self::Environment(EnvSource::new(SecretString::from(
                passphrase.expose_secret().to_string(),
            )));
        }

        #[cfg(unix)]
        if let Some(socket) = &settings.agent_socket {
            match UnixAgentSource::connect(socket, settings.tty.as_deref()) {
                Ok(agent) => {
                    info!(socket = %socket.display(), "using gpg-agent");
                    return Self::Agent(agent);
                }
                Err(e) => debug!(error = %e, "gpg-agent not available"),
            }
        }

        Self::Interactive(TerminalSource::new(StdConsole))
    }

    fn source(&mut self) -> &mut dyn PassphraseSource {
        match self {
            #[cfg(unix)]
            Self::Agent(source) => source,
            Self::Environment(source) => source,
            Self::Interactive(source) => source,
        }
    }
}

impl PassphraseSource for PassphraseStrategy {
    fn kind(&self) -> StrategyKind {
        match self {
            #[cfg(unix)]
            Self::Agent(source) => source.kind(),
            Self::Environment(source) => source.kind(),
            Self::Interactive(source) => source.kind(),
        }
    }

    fn passphrase_for(&mut self, key: &KeyPrompt) -> Result<Option<SecretString>> {
        self.source().passphrase_for(key)
    }

    fn reject(&mut self, key: &KeyPrompt) -> Result<()> {
        self.source().reject(key)
    }
}
