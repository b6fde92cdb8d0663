pub mod openpgp_backend;
pub mod openpgp_keys;
