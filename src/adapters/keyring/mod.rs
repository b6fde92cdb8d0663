pub mod file_keyring;
