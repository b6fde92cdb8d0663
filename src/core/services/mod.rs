pub mod clipboard_restore;
pub mod credential_service;
pub mod passphrase_resolver;
pub mod password_generator;
