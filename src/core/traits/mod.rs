pub mod account_store;
pub mod cipher;
pub mod clipboard;
pub mod console;
pub mod key_entity;
pub mod passphrase;
