use std::path::PathBuf;

/// All domain errors for keep.
///
/// Each variant provides enough context to diagnose the issue
/// without needing a debugger. Passphrases and clear text never
/// appear in any message.
#[derive(Debug, thiserror::Error)]
pub enum KeepError {
    #[error(
        "File not found: {path}\n\n  \
         Check that the path is correct and the file exists.\n  \
         Run 'keep list' to see the available accounts."
    )]
    FileNotFound { path: PathBuf },

    #[error(
        "Key-ring {path} could not be parsed: {detail}\n\n  \
         keep reads binary OpenPGP key-rings (secring.gpg / pubring.gpg).\n  \
         GnuPG >= 2.1 stores keys in pubring.kbx; export them with:\n    \
         → gpg --export > pubring.gpg\n    \
         → gpg --export-secret-keys > secring.gpg"
    )]
    KeyRingParse { path: PathBuf, detail: String },

    #[error("Malformed credential file: {detail}")]
    ArmorFormat { detail: String },

    #[error(
        "Decryption failed: no candidate key could be unlocked ({tried} tried)\n\n  \
         Solutions:\n    \
         → Check the passphrase (or the GPGPASSPHRASE variable if it is set)\n    \
         → Check that SecringDir in your profile points at the right key-ring\n    \
         → Ask the author to encrypt the account to one of your keys"
    )]
    DecryptionExhausted { tried: usize },

    #[error("Decryption failed: {reason}")]
    DecryptionFailed { reason: String },

    #[error(
        "Signature verification failed for key {signer}: {detail}\n\n  \
         The credential claims to be signed but the signature does not match.\n  \
         The file may have been tampered with; its content was NOT returned."
    )]
    SignatureInvalid { signer: String, detail: String },

    #[error("Encryption failed: {reason}")]
    EncryptionFailed { reason: String },

    #[error("Key {key} is locked: the supplied passphrase does not unlock it")]
    KeyLocked { key: String },

    #[error(
        "Exactly one signer key id must be given, {found} key(s) matched\n\n  \
         Check SignerKeyID in your profile against 'gpg --list-secret-keys --keyid-format short'."
    )]
    SignerSelection { found: usize },

    #[error("gpg-agent error: {detail}")]
    Agent { detail: String },

    #[error("Invalid account: {detail}")]
    InvalidAccount { detail: String },

    #[error("Account {path} already exists")]
    AccountExists { path: PathBuf },

    #[error("No account name match: {pattern}")]
    AccountNotFound { pattern: String },

    #[error("There is more than one match for '{pattern}'\n\n{listing}")]
    AmbiguousAccount { pattern: String, listing: String },

    #[error(
        "Profile '{name}' not found\n\n  \
         Available profiles: {available}"
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    #[error("Clipboard error: {detail}")]
    Clipboard { detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Coarse failure classes callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A file or the agent could not be reached.
    Io,
    /// Malformed armor, container, or key-ring.
    Format,
    /// No candidate key could be unlocked, or the engine refused to decrypt.
    Decrypt,
    /// A signature is present but does not verify.
    Signature,
    /// Signing with a locked key, or recipient resolution failed.
    Encrypt,
    /// Profiles and settings.
    Config,
    /// Account content or account directory problems.
    Account,
}

impl KeepError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FileNotFound { .. } | Self::Agent { .. } | Self::Io(_) => ErrorCategory::Io,
            Self::KeyRingParse { .. } | Self::ArmorFormat { .. } => ErrorCategory::Format,
            Self::DecryptionExhausted { .. } | Self::DecryptionFailed { .. } => {
                ErrorCategory::Decrypt
            }
            Self::SignatureInvalid { .. } => ErrorCategory::Signature,
            Self::EncryptionFailed { .. } | Self::KeyLocked { .. } | Self::SignerSelection { .. } => {
                ErrorCategory::Encrypt
            }
            Self::ProfileNotFound { .. } | Self::InvalidConfig { .. } | Self::Clipboard { .. } => {
                ErrorCategory::Config
            }
            Self::InvalidAccount { .. }
            | Self::AccountExists { .. }
            | Self::AccountNotFound { .. }
            | Self::AmbiguousAccount { .. } => ErrorCategory::Account,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, KeepError>;
