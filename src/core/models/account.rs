use zeroize::{Zeroize, Zeroizing};

use crate::core::errors::{KeepError, Result};
use crate::core::models::decoded_message::{DecodedMessage, SignatureStatus, SignerIdentity};
use crate::core::services::password_generator::{DEFAULT_PASSWORD_LENGTH, generate_password};
use crate::core::traits::console::Console;

/// Answer to the password prompt that asks for a generated password.
pub const GENERATE_KEYWORD: &str = "gen";

/// A stored credential.
///
/// `name` matches the base name of the file the account lives in. The
/// three other fields serialize, in the order password, username, notes,
/// to three lines of clear text. No field may contain a line break; the
/// format has no escaping, so construction rejects them.
///
/// Accounts are immutable once built. Provenance is only set when the
/// account was decoded from a file.
#[derive(Clone, PartialEq)]
pub struct Account {
    name: String,
    username: String,
    password: String,
    notes: String,
    provenance: Option<SignatureStatus>,
}

impl Account {
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        notes: impl Into<String>,
    ) -> Result<Self> {
        let account = Self {
            name: name.into(),
            username: username.into(),
            password: password.into(),
            notes: notes.into(),
            provenance: None,
        };
        account.validate()?;
        Ok(account)
    }

    /// Parse the clear-text layout `password\nusername\nnotes`.
    ///
    /// A single trailing newline is tolerated; anything else beyond the
    /// third line is rejected.
    pub fn from_clear_text(name: impl Into<String>, clear_text: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(clear_text).map_err(|_| KeepError::InvalidAccount {
            detail: "decrypted content is not valid UTF-8".into(),
        })?;

        let mut lines = text.splitn(3, '\n');
        let (Some(password), Some(username), Some(notes)) =
            (lines.next(), lines.next(), lines.next())
        else {
            return Err(KeepError::InvalidAccount {
                detail: "expected three lines: password, username, notes".into(),
            });
        };
        let notes = notes.strip_suffix('\n').unwrap_or(notes);

        Self::new(name, username, password, notes)
    }

    /// Build an account from a decoded file, recording its signature status.
    pub fn from_decoded(name: impl Into<String>, message: DecodedMessage) -> Result<Self> {
        let mut account = Self::from_clear_text(name, &message.clear_text)?;
        account.provenance = Some(message.signature);
        Ok(account)
    }

    /// Collect an account interactively.
    ///
    /// Name, username and notes are echoed; the password is read with echo
    /// disabled. Answering `gen` to the password prompt generates one.
    pub fn from_console(console: &mut dyn Console) -> Result<Self> {
        let name = console.read_line("Enter Account Name: ")?;
        let username = console.read_line("Enter Username: ")?;
        let notes = console.read_line("Enter Notes: ")?;
        let mut password =
            console.read_secret("Enter Password (`gen` to generate a random one): ")?;

        if password.trim() == GENERATE_KEYWORD {
            password.zeroize();
            password = generate_password(DEFAULT_PASSWORD_LENGTH);
        }

        let account = Self::new(name.trim(), username.trim(), password.trim(), notes.trim());
        password.zeroize();
        account
    }

    /// The clear-text layout that gets encrypted.
    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(format!("{}\n{}\n{}", self.password, self.username, self.notes).into_bytes())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Signature status, for accounts decoded from a file.
    pub fn provenance(&self) -> Option<&SignatureStatus> {
        self.provenance.as_ref()
    }

    pub fn is_signed(&self) -> bool {
        self.provenance.as_ref().is_some_and(SignatureStatus::is_signed)
    }

    pub fn signer(&self) -> Option<&SignerIdentity> {
        self.provenance.as_ref().and_then(SignatureStatus::signer)
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(KeepError::InvalidAccount {
                detail: "account name must not be empty".into(),
            });
        }

        let fields = [
            ("name", &self.name),
            ("username", &self.username),
            ("password", &self.password),
            ("notes", &self.notes),
        ];
        for (label, value) in fields {
            if value.contains(['\n', '\r']) {
                return Err(KeepError::InvalidAccount {
                    detail: format!("{label} must not contain a line break"),
                });
            }
        }
        Ok(())
    }
}

impl Drop for Account {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("notes", &self.notes)
            .field("provenance", &self.provenance)
            .finish()
    }
}
