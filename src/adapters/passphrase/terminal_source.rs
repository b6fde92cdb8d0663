use secrecy::SecretString;
use tracing::debug;

use crate::adapters::console::std_console::StdConsole;
use crate::core::errors::Result;
use crate::core::traits::console::Console;
use crate::core::traits::passphrase::{KeyPrompt, PassphraseSource, StrategyKind};

/// Asks the user for each candidate key's passphrase, echo disabled.
pub struct TerminalSource<C: Console = StdConsole> {
    console: C,
}

impl<C: Console> TerminalSource<C> {
    pub fn new(console: C) -> Self {
        Self { console }
    }
}

impl<C: Console> PassphraseSource for TerminalSource<C> {
    fn kind(&self) -> StrategyKind {
        StrategyKind::InteractivePrompt
    }

    fn passphrase_for(&mut self, key: &KeyPrompt) -> Result<Option<SecretString>> {
        debug!(key = %key.short_id, "prompting for passphrase");
        let answer = self
            .console
            .read_secret(&format!("Passphrase to unlock your key ({}) : ", key.short_id))?;
        Ok(Some(SecretString::from(answer)))
    }
}
