pub mod accounts;
pub mod cipher;
pub mod clipboard;
pub mod console;
pub mod keyring;
pub mod passphrase;
